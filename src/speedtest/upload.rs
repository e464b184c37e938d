use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::debug;

use super::download::throughput_bps;
use super::http_client;

const CHUNK_SIZE: usize = 1_000_000; // 1MB chunks

pub struct UploadTest {
    base_url: String,
    data: Vec<u8>,
}

impl UploadTest {
    pub fn new(base_url: String, upload_size: usize) -> Self {
        let mut rng = rand::rngs::StdRng::from_entropy();
        let mut data = vec![0u8; upload_size];
        rng.fill(&mut data[..]);
        Self { base_url, data }
    }

    pub async fn run(&self) -> Result<f64> {
        let client = http_client(Duration::from_secs(120))?;
        let url = format!("{}/__up", self.base_url);

        let start = Instant::now();
        let mut uploaded: u64 = 0;

        for chunk in self.data.chunks(CHUNK_SIZE) {
            client
                .post(&url)
                .body(chunk.to_vec())
                .send()
                .await
                .context("upload request failed")?
                .error_for_status()?;
            uploaded += chunk.len() as u64;
        }

        let elapsed = start.elapsed();
        debug!(bytes = uploaded, elapsed_ms = elapsed.as_millis() as u64, "upload finished");

        Ok(throughput_bps(uploaded, elapsed))
    }
}
