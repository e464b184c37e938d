use anyhow::{anyhow, Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::Logging;

/// File-only subscriber; stdout belongs to the TUI. Keep the guard alive until exit.
pub fn init_logging(cfg: &Logging) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    let (file_layer, guard) = if cfg.file.is_empty() {
        (None, None)
    } else {
        let path = Path::new(&cfg.file);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create log dir: {}", parent.display()))?;
        }
        let file = open_log_file(path)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

// Appends so earlier runs' diagnostics survive a restart
fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn log_file_is_appended_across_launches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rocketspeed.log");

        writeln!(open_log_file(&path).unwrap(), "first launch").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second launch").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first launch\nsecond launch\n");
    }
}
