mod app;
mod logging;
mod progress;
mod runner;
mod settings;
mod speedtest;
mod ui;

use anyhow::Result;
use app::{poll_event, App, AppAction};
use crossterm::event::Event;
use progress::{ProgressReporter, ProgressTick};
use ratatui::DefaultTerminal;
use runner::{try_take_outcome, MeasurementRunner};
use settings::Settings;
use speedtest::{CloudflareBackend, MeasurementOutcome};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use ui::draw_ui;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;
    let _guard = logging::init_logging(&settings.logging)?;

    let mut terminal = ratatui::init();
    terminal.clear()?;

    let result = run_app(&mut terminal, settings).await;

    ratatui::restore();
    result
}

async fn run_app(terminal: &mut DefaultTerminal, settings: Settings) -> Result<()> {
    let mut app = App::new(settings);
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<ProgressTick>();
    let mut reporter: Option<ProgressReporter> = None;
    let mut outcome_rx: Option<oneshot::Receiver<MeasurementOutcome>> = None;

    loop {
        terminal.draw(|frame| draw_ui(frame, &app))?;

        // Progress ticks
        while let Ok(tick) = tick_rx.try_recv() {
            app.apply_tick(tick);
        }

        // Measurement outcome
        if let Some(rx) = outcome_rx.as_mut() {
            if let Some(outcome) = try_take_outcome(rx) {
                if let Some(reporter) = reporter.take() {
                    if !reporter.is_finished() {
                        tracing::debug!(run = reporter.run(), "cancelling progress reporter");
                        reporter.cancel();
                    }
                }
                app.consume_outcome(outcome);
                outcome_rx = None;
            }
        }

        // Handle input
        if let Some(Event::Key(key)) = poll_event(Duration::from_millis(30))? {
            if let Some(action) = app.handle_key_event(key) {
                match action {
                    AppAction::Quit => break,
                    AppAction::StartTest => {
                        if let Some(run) = app.begin_run() {
                            reporter = Some(ProgressReporter::start(
                                run,
                                app.settings.progress_period(),
                                app.settings.progress_ceiling,
                                tick_tx.clone(),
                            ));
                            outcome_rx = Some(MeasurementRunner::start(CloudflareBackend::new(
                                &app.settings,
                            )));
                        }
                    }
                    AppAction::Reset => {
                        if !app.reset() {
                            tracing::debug!("reset refused while a test is running");
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
