use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::speedtest::{bits_to_mbps, round2, MeasurementError, MeasurementOutcome, SpeedBackend};

pub struct MeasurementRunner;

impl MeasurementRunner {
    pub fn start<B: SpeedBackend>(mut backend: B) -> oneshot::Receiver<MeasurementOutcome> {
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let outcome = measure(&mut backend).await;
            let _ = tx.send(outcome);
        });

        rx
    }
}

/// Non-blocking check for the outcome. A channel closed without a value
/// still yields exactly one outcome, as a failure.
pub fn try_take_outcome(rx: &mut oneshot::Receiver<MeasurementOutcome>) -> Option<MeasurementOutcome> {
    match rx.try_recv() {
        Ok(outcome) => Some(outcome),
        Err(oneshot::error::TryRecvError::Empty) => None,
        Err(oneshot::error::TryRecvError::Closed) => Some(MeasurementOutcome::Failure {
            message: "measurement ended without a result".to_string(),
        }),
    }
}

pub async fn measure<B: SpeedBackend>(backend: &mut B) -> MeasurementOutcome {
    match run_sequence(backend).await {
        Ok(outcome) => outcome,
        Err(err) => err.into(),
    }
}

async fn run_sequence<B: SpeedBackend>(backend: &mut B) -> Result<MeasurementOutcome, MeasurementError> {
    let server = backend.select_best_server().await?;
    info!(server = %server.base_url, latency_ms = server.latency_ms, "selected server");
    let ping_ms = server.latency_ms;

    let download_mbps = bits_to_mbps(backend.download().await?);
    debug!(download_mbps, "download measured");

    let upload_mbps = bits_to_mbps(backend.upload().await?);
    debug!(upload_mbps, "upload measured");

    Ok(MeasurementOutcome::Success {
        ping_ms: round2(ping_ms),
        download_mbps: round2(download_mbps),
        upload_mbps: round2(upload_mbps),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speedtest::Server;
    use anyhow::{anyhow, Result};
    use futures::future::BoxFuture;
    use std::sync::{Arc, Mutex};

    struct FakeBackend {
        pub server: Result<f64, String>,
        pub download: Result<f64, String>,
        pub upload: Result<f64, String>,
        pub calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl FakeBackend {
        fn ok(ping_ms: f64, download_bps: f64, upload_bps: f64) -> Self {
            Self {
                server: Ok(ping_ms),
                download: Ok(download_bps),
                upload: Ok(upload_bps),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn record(&self, step: &'static str) {
            self.calls.lock().unwrap().push(step);
        }
    }

    impl SpeedBackend for FakeBackend {
        fn select_best_server(&mut self) -> BoxFuture<'_, Result<Server>> {
            self.record("server");
            let result = self.server.clone();
            Box::pin(async move {
                let latency_ms = result.map_err(|e| anyhow!(e))?;
                Ok(Server {
                    base_url: "http://fake".to_string(),
                    latency_ms,
                })
            })
        }

        fn download(&mut self) -> BoxFuture<'_, Result<f64>> {
            self.record("download");
            let result = self.download.clone();
            Box::pin(async move { result.map_err(|e| anyhow!(e)) })
        }

        fn upload(&mut self) -> BoxFuture<'_, Result<f64>> {
            self.record("upload");
            let result = self.upload.clone();
            Box::pin(async move { result.map_err(|e| anyhow!(e)) })
        }
    }

    #[tokio::test]
    async fn successful_sequence_rounds_and_converts() {
        let mut backend = FakeBackend::ok(15.678, 50_000_000.0, 10_000_000.0);
        let outcome = measure(&mut backend).await;
        assert_eq!(
            outcome,
            MeasurementOutcome::Success {
                ping_ms: 15.68,
                download_mbps: 50.0,
                upload_mbps: 10.0,
            }
        );
        assert_eq!(*backend.calls.lock().unwrap(), vec!["server", "download", "upload"]);
    }

    #[tokio::test]
    async fn uneven_throughput_is_rounded() {
        let mut backend = FakeBackend::ok(8.0, 93_456_789.0, 12_344_999.0);
        let outcome = measure(&mut backend).await;
        assert_eq!(
            outcome,
            MeasurementOutcome::Success {
                ping_ms: 8.0,
                download_mbps: 93.46,
                upload_mbps: 12.34,
            }
        );
    }

    #[tokio::test]
    async fn no_server_is_a_failure() {
        let mut backend = FakeBackend::ok(0.0, 0.0, 0.0);
        backend.server = Err("no server found".to_string());
        let outcome = measure(&mut backend).await;
        assert_eq!(
            outcome,
            MeasurementOutcome::Failure {
                message: "no server found".to_string()
            }
        );
        assert_eq!(*backend.calls.lock().unwrap(), vec!["server"]);
    }

    #[tokio::test]
    async fn download_error_skips_upload() {
        let mut backend = FakeBackend::ok(12.0, 0.0, 1_000_000.0);
        backend.download = Err("connection reset".to_string());
        let outcome = measure(&mut backend).await;
        assert_eq!(
            outcome,
            MeasurementOutcome::Failure {
                message: "connection reset".to_string()
            }
        );
        assert_eq!(*backend.calls.lock().unwrap(), vec!["server", "download"]);
    }

    #[tokio::test]
    async fn start_delivers_one_outcome() {
        let backend = FakeBackend::ok(20.0, 100_000_000.0, 40_000_000.0);
        let calls = backend.calls.clone();
        let outcome = MeasurementRunner::start(backend).await.unwrap();
        assert!(matches!(outcome, MeasurementOutcome::Success { .. }));
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn closed_channel_becomes_failure() {
        let (tx, mut rx) = oneshot::channel::<MeasurementOutcome>();
        assert_eq!(try_take_outcome(&mut rx), None);
        drop(tx);
        assert_eq!(
            try_take_outcome(&mut rx),
            Some(MeasurementOutcome::Failure {
                message: "measurement ended without a result".to_string()
            })
        );
    }
}
