use anyhow::{bail, Result};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{http_client, Server};

pub struct PingTest {
    samples: Vec<f64>,
    ping_count: usize,
}

impl PingTest {
    pub fn new(ping_count: usize) -> Self {
        Self {
            samples: Vec::new(),
            ping_count,
        }
    }

    // Mean round trip in ms, None if nothing answered
    pub async fn run(&mut self, base_url: &str) -> Result<Option<f64>> {
        let client = http_client(Duration::from_secs(5))?;
        let url = format!("{}/__down?bytes=0", base_url);

        self.samples.clear();

        for _ in 0..self.ping_count {
            let start = Instant::now();
            if let Ok(response) = client.get(&url).send().await {
                if response.status().is_success() {
                    self.samples.push(start.elapsed().as_secs_f64() * 1000.0);
                }
            }
        }

        Ok(mean(&self.samples))
    }
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

pub async fn select_best_server(candidates: &[String], ping_count: usize) -> Result<Server> {
    let mut best: Option<Server> = None;

    for base_url in candidates {
        let mut test = PingTest::new(ping_count);
        match test.run(base_url).await? {
            Some(latency_ms) => {
                debug!(server = %base_url, latency_ms, "probed server");
                if best.as_ref().map_or(true, |b| latency_ms < b.latency_ms) {
                    best = Some(Server {
                        base_url: base_url.clone(),
                        latency_ms,
                    });
                }
            }
            None => warn!(server = %base_url, "server did not answer"),
        }
    }

    match best {
        Some(server) => Ok(server),
        None => bail!("no server found"),
    }
}
