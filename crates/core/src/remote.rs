use crate::retry::RetryPolicy;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `{success, data, error}` envelope used by every upstream endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Diagnostics carried alongside a failed remote call.
#[derive(Debug, Clone)]
pub struct RemoteServiceError {
    pub service: &'static str,
    pub stage: &'static str,
    pub detail: String,
    pub raw_response_json: Option<Value>,
}

impl fmt::Display for RemoteServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "remote error (service={}, stage={}): {}",
            self.service, self.stage, self.detail
        )
    }
}

impl std::error::Error for RemoteServiceError {}

/// Shared JSON-POST client: one base URL, one timeout, one retry policy.
#[derive(Debug, Clone)]
pub struct RemoteApiClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl RemoteApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            retry,
        })
    }

    pub fn from_base_url(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let timeout_secs = std::env::var("FORTUNE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(
            base_url,
            Duration::from_secs(timeout_secs),
            RetryPolicy::from_env("FORTUNE_API"),
        )
    }

    fn url(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// POSTs `payload` and unwraps the success envelope, retrying per policy.
    pub async fn post_envelope<P, T>(
        &self,
        service: &'static str,
        path: &str,
        payload: &P,
    ) -> anyhow::Result<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.retry
            .run(service, || self.post_once(service, path, payload))
            .await
    }

    async fn post_once<P, T>(&self, service: &'static str, path: &str, payload: &P) -> anyhow::Result<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let res = self
            .http
            .post(self.url(path))
            .json(payload)
            .send()
            .await
            .with_context(|| format!("{service} request failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read {service} response body"))?;
        let raw_json = serde_json::from_str::<Value>(&text).ok();

        if !status.is_success() {
            return Err(RemoteServiceError {
                service,
                stage: "http",
                detail: format!("status={status}"),
                raw_response_json: raw_json,
            }
            .into());
        }

        let envelope = serde_json::from_str::<ApiEnvelope<T>>(&text)
            .with_context(|| format!("{service} response is not a valid envelope: {text}"))?;

        if !envelope.success {
            return Err(RemoteServiceError {
                service,
                stage: "envelope",
                detail: envelope
                    .error
                    .unwrap_or_else(|| "request failed".to_string()),
                raw_response_json: raw_json,
            }
            .into());
        }

        match envelope.data {
            Some(data) => Ok(data),
            None => Err(RemoteServiceError {
                service,
                stage: "envelope",
                detail: "success response is missing data".to_string(),
                raw_response_json: raw_json,
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_parses_success_and_failure_shapes() {
        let ok: ApiEnvelope<Vec<u8>> =
            serde_json::from_value(json!({"success": true, "data": [1, 2]})).unwrap();
        assert!(ok.success);
        assert_eq!(ok.data, Some(vec![1, 2]));

        let err: ApiEnvelope<Vec<u8>> =
            serde_json::from_value(json!({"success": false, "error": "boom"})).unwrap();
        assert!(!err.success);
        assert_eq!(err.data, None);
        assert_eq!(err.error.as_deref(), Some("boom"));
    }

    #[test]
    fn url_join_tolerates_trailing_slashes() {
        let client = RemoteApiClient::new(
            "https://api.example.com/",
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
        .unwrap();
        assert_eq!(
            client.url("/api/fortune"),
            "https://api.example.com/api/fortune"
        );
        assert_eq!(
            client.url("api/fortune"),
            "https://api.example.com/api/fortune"
        );
    }
}
