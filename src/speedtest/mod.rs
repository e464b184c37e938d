pub mod download;
pub mod ping;
pub mod upload;

use anyhow::{bail, Result};
use futures::future::BoxFuture;
use std::time::Duration;

use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementOutcome {
    Success {
        ping_ms: f64,
        download_mbps: f64,
        upload_mbps: f64,
    },
    Failure {
        message: String,
    },
}

impl From<MeasurementError> for MeasurementOutcome {
    fn from(err: MeasurementError) -> Self {
        MeasurementOutcome::Failure {
            message: err.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MeasurementError {
    pub message: String,
}

impl From<anyhow::Error> for MeasurementError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    pub base_url: String,
    pub latency_ms: f64,
}

pub trait SpeedBackend: Send + 'static {
    fn select_best_server(&mut self) -> BoxFuture<'_, Result<Server>>;

    // Throughput results are in bits per second
    fn download(&mut self) -> BoxFuture<'_, Result<f64>>;

    fn upload(&mut self) -> BoxFuture<'_, Result<f64>>;
}

pub fn bits_to_mbps(bits_per_sec: f64) -> f64 {
    bits_per_sec / 1_000_000.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct CloudflareBackend {
    servers: Vec<String>,
    ping_count: usize,
    download_size: u64,
    upload_size: usize,
    selected: Option<Server>,
}

impl CloudflareBackend {
    pub fn new(settings: &Settings) -> Self {
        Self {
            servers: settings.servers.clone(),
            ping_count: settings.ping_count,
            download_size: settings.download_size_bytes(),
            upload_size: settings.upload_size_bytes(),
            selected: None,
        }
    }

    fn selected_url(&self) -> Result<String> {
        match &self.selected {
            Some(server) => Ok(server.base_url.clone()),
            None => bail!("no server selected"),
        }
    }
}

impl SpeedBackend for CloudflareBackend {
    fn select_best_server(&mut self) -> BoxFuture<'_, Result<Server>> {
        Box::pin(async move {
            let server = ping::select_best_server(&self.servers, self.ping_count).await?;
            self.selected = Some(server.clone());
            Ok(server)
        })
    }

    fn download(&mut self) -> BoxFuture<'_, Result<f64>> {
        Box::pin(async move {
            let base_url = self.selected_url()?;
            download::DownloadTest::new(base_url, self.download_size).run().await
        })
    }

    fn upload(&mut self) -> BoxFuture<'_, Result<f64>> {
        Box::pin(async move {
            let base_url = self.selected_url()?;
            let upload_size = self.upload_size;
            // payload generation is CPU-bound
            let test =
                tokio::task::spawn_blocking(move || upload::UploadTest::new(base_url, upload_size))
                    .await?;
            test.run().await
        })
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}
