use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const PROGRESS_MAX: u8 = 100;

pub type RunId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState(u8);

impl ProgressState {
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn ratio(self) -> f64 {
        self.0 as f64 / PROGRESS_MAX as f64
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn advance_to(&mut self, value: u8) {
        self.0 = self.0.max(value.min(PROGRESS_MAX));
    }

    pub fn complete(&mut self) {
        self.0 = PROGRESS_MAX;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTick {
    pub run: RunId,
    pub value: u8,
}

// Aborted on cancel or drop
pub struct ProgressReporter {
    run: RunId,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    pub fn start(
        run: RunId,
        period: Duration,
        ceiling: u8,
        tx: mpsc::UnboundedSender<ProgressTick>,
    ) -> Self {
        let ceiling = ceiling.min(PROGRESS_MAX - 1);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for value in 1..=ceiling {
                interval.tick().await;
                if tx.send(ProgressTick { run, value }).is_err() {
                    break;
                }
            }
        });

        Self { run, handle }
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressTick>) -> Vec<ProgressTick> {
        let mut ticks = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            ticks.push(tick);
        }
        ticks
    }

    #[test]
    fn state_is_monotonic_and_bounded() {
        let mut state = ProgressState::default();
        state.advance_to(10);
        state.advance_to(5);
        assert_eq!(state.value(), 10);
        state.advance_to(250);
        assert_eq!(state.value(), 100);
        state.reset();
        assert_eq!(state.value(), 0);
        state.complete();
        assert_eq!(state.ratio(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_period_and_stops_at_ceiling() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = ProgressReporter::start(1, Duration::from_millis(100), 95, tx);

        tokio::time::sleep(Duration::from_millis(450)).await;
        let values: Vec<u8> = drain(&mut rx).into_iter().map(|t| t.value).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let ticks = drain(&mut rx);
        assert_eq!(ticks.len(), 90);
        assert!(ticks.iter().all(|t| t.run == 1 && t.value <= 95));
        assert_eq!(ticks.last().map(|t| t.value), Some(95));
        assert!(reporter.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = ProgressReporter::start(7, Duration::from_millis(100), 95, tx);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(drain(&mut rx).len(), 3);

        reporter.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(reporter.run(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_reporter_leaves_one_active() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let first = ProgressReporter::start(1, Duration::from_millis(100), 95, tx.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;

        let second = ProgressReporter::start(2, Duration::from_millis(100), 95, tx);
        drop(first);
        drain(&mut rx);
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        let ticks = drain(&mut rx);
        assert!(!ticks.is_empty());
        assert!(ticks.iter().all(|t| t.run == 2));
        assert_eq!(second.run(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ceiling_never_reaches_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _reporter = ProgressReporter::start(1, Duration::from_millis(10), 100, tx);
        tokio::time::sleep(Duration::from_secs(5)).await;
        let max = drain(&mut rx).into_iter().map(|t| t.value).max();
        assert_eq!(max, Some(99));
    }
}
