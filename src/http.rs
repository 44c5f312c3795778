use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;
use url::Url;

use anyhow::Context;

use crate::config::ClientConfig;
use crate::error::{classify, ApiError};

/// JSON transport to the ordering API. Object-safe so the synchronization
/// clients can run against a scripted fake in tests.
#[async_trait]
pub trait Api: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, ApiError>;
    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError>;
    async fn delete(&self, path: &str, body: Value) -> Result<Value, ApiError>;
}

/// reqwest-backed [`Api`] implementation.
pub struct HttpApi {
    client: reqwest::Client,
    base: String,
    session_expired: watch::Sender<bool>,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let base: Url = config.base_url.parse().context("invalid API base url")?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("build http client")?;
        let (session_expired, _) = watch::channel(false);
        Ok(Self {
            client,
            base: base.as_str().trim_end_matches('/').to_string(),
            session_expired,
        })
    }

    /// Receiver that flips to `true` on the first 401 from any endpoint.
    pub fn session_expired(&self) -> watch::Receiver<bool> {
        self.session_expired.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    async fn handle(&self, response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // 401 invalidates the whole session, not just this call
            let _ = self.session_expired.send(true);
            return Err(ApiError::Unauthorized);
        }
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        let value = serde_json::from_str(&body).unwrap_or(Value::Null);
        Err(classify(status.as_u16(), value))
    }
}

#[async_trait]
impl Api for HttpApi {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        debug!(%path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        self.handle(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        debug!(%path, "POST");
        let response = self.client.post(self.url(path)).json(&body).send().await?;
        self.handle(response).await
    }

    async fn delete(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        debug!(%path, "DELETE");
        let response = self
            .client
            .delete(self.url(path))
            .json(&body)
            .send()
            .await?;
        self.handle(response).await
    }
}

/// Group and order endpoints wrap payloads as `{ "success": .., "data": .. }`;
/// cart endpoints return their fields at the top level. Unwraps `data` when
/// present, otherwise decodes the value as-is.
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    let inner = if let Value::Object(mut map) = value {
        match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        }
    } else {
        value
    };
    Ok(serde_json::from_value(inner)?)
}
