use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "ROCKETSPEED_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "rocketspeed.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ping_count: usize,
    pub download_size_mb: u64,
    pub upload_size_mb: u64,
    pub servers: Vec<String>,
    pub progress_tick_ms: u64,
    pub progress_ceiling: u8,
    pub logging: Logging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    // empty disables file logging
    pub file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ping_count: 30,
            download_size_mb: 100,
            upload_size_mb: 50,
            servers: vec!["https://speed.cloudflare.com".to_string()],
            progress_tick_ms: 100,
            progress_ceiling: 95,
            logging: Logging::default(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "rocketspeed.log".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_in(Path::new("."), std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    // $ROCKETSPEED_CONFIG, then <dir>/rocketspeed.toml, then defaults
    pub fn load_in(dir: &Path, user: Option<PathBuf>) -> Result<Self> {
        match resolve_config_path(dir, user) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("parsing config: {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(raw)?;
        Ok(settings.clamped())
    }

    fn clamped(mut self) -> Self {
        self.ping_count = self.ping_count.clamp(5, 100);
        self.download_size_mb = self.download_size_mb.clamp(25, 500);
        self.upload_size_mb = self.upload_size_mb.clamp(25, 250);
        self.progress_tick_ms = self.progress_tick_ms.max(1);
        self.progress_ceiling = self.progress_ceiling.min(99);
        self
    }

    pub fn download_size_bytes(&self) -> u64 {
        self.download_size_mb * 1_000_000
    }

    pub fn upload_size_bytes(&self) -> usize {
        (self.upload_size_mb * 1_000_000) as usize
    }

    pub fn progress_period(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }

    pub fn increase(&mut self, field: SettingsField) {
        match field {
            SettingsField::PingCount => {
                self.ping_count = (self.ping_count + 5).min(100);
            }
            SettingsField::DownloadSize => {
                self.download_size_mb = (self.download_size_mb + 25).min(500);
            }
            SettingsField::UploadSize => {
                self.upload_size_mb = (self.upload_size_mb + 25).min(250);
            }
        }
    }

    pub fn decrease(&mut self, field: SettingsField) {
        match field {
            SettingsField::PingCount => {
                self.ping_count = self.ping_count.saturating_sub(5).max(5);
            }
            SettingsField::DownloadSize => {
                self.download_size_mb = self.download_size_mb.saturating_sub(25).max(25);
            }
            SettingsField::UploadSize => {
                self.upload_size_mb = self.upload_size_mb.saturating_sub(25).max(25);
            }
        }
    }
}

fn resolve_config_path(dir: &Path, user: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p);
    }
    let default = dir.join(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    PingCount,
    DownloadSize,
    UploadSize,
}

impl SettingsField {
    pub fn next(self) -> Self {
        match self {
            SettingsField::PingCount => SettingsField::DownloadSize,
            SettingsField::DownloadSize => SettingsField::UploadSize,
            SettingsField::UploadSize => SettingsField::PingCount,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            SettingsField::PingCount => SettingsField::UploadSize,
            SettingsField::DownloadSize => SettingsField::PingCount,
            SettingsField::UploadSize => SettingsField::DownloadSize,
        }
    }
}
