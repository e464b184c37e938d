use crate::progress::{ProgressState, ProgressTick, RunId};
use crate::settings::{Settings, SettingsField};
use crate::speedtest::MeasurementOutcome;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;
use tracing::{info, warn};

pub const PENDING: &str = "Testing...";
pub const ERROR: &str = "Error";
pub const SPEED_PLACEHOLDER: &str = "-- Mbps";
pub const PING_PLACEHOLDER: &str = "-- ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Main,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Complete,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDisplay {
    pub download: String,
    pub upload: String,
    pub ping: String,
}

impl MetricDisplay {
    fn placeholder() -> Self {
        Self {
            download: SPEED_PLACEHOLDER.to_string(),
            upload: SPEED_PLACEHOLDER.to_string(),
            ping: PING_PLACEHOLDER.to_string(),
        }
    }

    fn filled(text: &str) -> Self {
        Self {
            download: text.to_string(),
            upload: text.to_string(),
            ping: text.to_string(),
        }
    }
}

pub struct App {
    pub status: RunStatus,
    pub metrics: MetricDisplay,
    pub progress: ProgressState,
    pub controls_enabled: bool,
    pub should_quit: bool,

    pub view: AppView,
    pub settings: Settings,
    pub selected_setting: SettingsField,

    run: RunId,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            status: RunStatus::Idle,
            metrics: MetricDisplay::placeholder(),
            progress: ProgressState::default(),
            controls_enabled: true,
            should_quit: false,
            view: AppView::Main,
            settings,
            selected_setting: SettingsField::PingCount,
            run: 0,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.status == RunStatus::Running
    }

    pub fn begin_run(&mut self) -> Option<RunId> {
        if self.in_flight() {
            return None;
        }

        self.run += 1;
        self.status = RunStatus::Running;
        self.controls_enabled = false;
        self.metrics = MetricDisplay::filled(PENDING);
        self.progress.reset();

        info!(run = self.run, "speed test started");
        Some(self.run)
    }

    pub fn apply_tick(&mut self, tick: ProgressTick) {
        if !self.in_flight() || tick.run != self.run {
            return;
        }
        self.progress
            .advance_to(tick.value.min(self.settings.progress_ceiling));
    }

    pub fn consume_outcome(&mut self, outcome: MeasurementOutcome) {
        if !self.in_flight() {
            warn!(run = self.run, "outcome arrived with no run in flight");
            return;
        }

        match outcome {
            MeasurementOutcome::Success {
                ping_ms,
                download_mbps,
                upload_mbps,
            } => {
                info!(run = self.run, ping_ms, download_mbps, upload_mbps, "speed test complete");
                self.metrics = MetricDisplay {
                    download: format!("{} Mbps", format_metric(download_mbps)),
                    upload: format!("{} Mbps", format_metric(upload_mbps)),
                    ping: format!("{} ms", format_metric(ping_ms)),
                };
                self.status = RunStatus::Complete;
            }
            MeasurementOutcome::Failure { message } => {
                warn!(run = self.run, error = %message, "speed test failed");
                self.metrics = MetricDisplay::filled(ERROR);
                self.status = RunStatus::Failed;
            }
        }

        self.progress.complete();
        self.controls_enabled = true;
    }

    pub fn reset(&mut self) -> bool {
        if self.in_flight() {
            return false;
        }
        self.metrics = MetricDisplay::placeholder();
        self.progress.reset();
        self.status = RunStatus::Idle;
        true
    }

    pub fn handle_key_event(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match self.view {
            AppView::Main => self.handle_main_key(key),
            AppView::Settings => self.handle_settings_key(key),
        }
    }

    fn handle_main_key(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Some(AppAction::Quit)
            }
            KeyCode::Char('s') if self.controls_enabled => {
                self.view = AppView::Settings;
                None
            }
            KeyCode::Enter if self.controls_enabled => Some(AppAction::StartTest),
            KeyCode::Char('r') if self.controls_enabled => Some(AppAction::Reset),
            _ => None,
        }
    }

    fn handle_settings_key(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => {
                self.view = AppView::Main;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_setting = self.selected_setting.prev();
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected_setting = self.selected_setting.next();
            }
            KeyCode::Left | KeyCode::Char('h') => self.settings.decrease(self.selected_setting),
            KeyCode::Right | KeyCode::Char('l') => self.settings.increase(self.selected_setting),
            _ => {}
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    StartTest,
    Reset,
}

// 50.0, 15.68
pub fn format_metric(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
