use anyhow::{Context, Result};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::debug;

use super::http_client;

pub struct DownloadTest {
    base_url: String,
    download_size: u64,
}

impl DownloadTest {
    pub fn new(base_url: String, download_size: u64) -> Self {
        Self {
            base_url,
            download_size,
        }
    }

    pub async fn run(&self) -> Result<f64> {
        let client = http_client(Duration::from_secs(120))?;

        let url = format!("{}/__down?bytes={}", self.base_url, self.download_size);
        let response = client
            .get(&url)
            .send()
            .await
            .context("download request failed")?
            .error_for_status()?;
        let mut stream = response.bytes_stream();

        let start = Instant::now();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("download interrupted")?;
            downloaded += chunk.len() as u64;
        }

        let elapsed = start.elapsed();
        debug!(bytes = downloaded, elapsed_ms = elapsed.as_millis() as u64, "download finished");

        Ok(throughput_bps(downloaded, elapsed))
    }
}

pub(crate) fn throughput_bps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 * 8.0 / secs
}
