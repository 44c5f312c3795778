use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub storage_path: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("TABLESIDE_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".into());
        Url::parse(&base_url).context("invalid TABLESIDE_API_URL")?;

        let request_timeout_secs = std::env::var("TABLESIDE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);
        let poll_interval_secs = std::env::var("TABLESIDE_POLL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10);
        let storage_path = std::env::var("TABLESIDE_STORAGE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".tableside/storage.json"));

        Ok(Self {
            base_url,
            request_timeout_secs,
            poll_interval_secs,
            storage_path,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_from_seconds() {
        let config = ClientConfig {
            base_url: "http://localhost:8080/api".into(),
            request_timeout_secs: 30,
            poll_interval_secs: 10,
            storage_path: PathBuf::from("/tmp/storage.json"),
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
    }
}
