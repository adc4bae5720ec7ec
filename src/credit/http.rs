//! HTTP bureau client.
//!
//! # Responsibilities
//! - Query `GET {base_url}/reports/{subject}` with a per-call timeout
//! - Tag each request with a UUID `x-request-id`
//! - Map transport, status and decoding failures onto [`FetchError`]

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::clock::Clock;
use crate::credit::source::{CreditSource, FetchError};
use crate::credit::types::{CreditReport, SubjectKey};

/// Body returned by the bureau.
#[derive(Debug, Deserialize)]
struct BureauResponse {
    score: u16,
    #[serde(default)]
    subject_key: Option<String>,
    #[serde(default)]
    bureau: Option<String>,
    #[serde(flatten)]
    raw: BTreeMap<String, serde_json::Value>,
}

/// Credit source backed by a JSON-over-HTTP bureau.
#[derive(Clone)]
pub struct HttpCreditSource {
    client: reqwest::Client,
    base_url: Url,
    clock: Arc<dyn Clock>,
}

impl HttpCreditSource {
    /// Create a client for the bureau at `base_url`.
    pub fn new(base_url: &str, clock: Arc<dyn Clock>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Self::with_client(base_url, client, clock)
    }

    /// Create a bureau client over a preconfigured `reqwest::Client`.
    pub fn with_client(
        base_url: &str,
        client: reqwest::Client,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FetchError> {
        let base_url: Url = base_url
            .parse()
            .map_err(|e| FetchError::Unavailable(format!("invalid bureau URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Unavailable(format!(
                "bureau URL '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            clock,
        })
    }

    fn report_url(&self, subject: &SubjectKey) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Unavailable("bureau URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("reports")
            .push(subject.as_str());
        Ok(url)
    }

    fn map_transport_error(err: reqwest::Error, deadline: Duration) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(deadline)
        } else if err.is_decode() {
            FetchError::Invalid(err.to_string())
        } else {
            FetchError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl CreditSource for HttpCreditSource {
    async fn fetch(
        &self,
        subject: &SubjectKey,
        deadline: Duration,
    ) -> Result<CreditReport, FetchError> {
        let url = self.report_url(subject)?;
        let request_id = Uuid::new_v4();

        tracing::debug!(subject = %subject, %request_id, "Requesting credit report");

        let response = self
            .client
            .get(url)
            .header("x-request-id", request_id.to_string())
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, deadline))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(subject = %subject, %request_id, status = %status, "Bureau returned error status");
            return Err(FetchError::Unavailable(format!("bureau returned {}", status)));
        }

        let body: BureauResponse = response
            .json()
            .await
            .map_err(|e| Self::map_transport_error(e, deadline))?;

        let subject_key = match body.subject_key {
            Some(key) => SubjectKey::from(key),
            None => subject.clone(),
        };

        Ok(CreditReport {
            subject_key,
            score: body.score,
            retrieved_at: self.clock.now(),
            bureau: body.bureau.unwrap_or_else(|| self.base_url.host_str().unwrap_or("bureau").to_string()),
            raw: body.raw,
        })
    }

    fn name(&self) -> &str {
        "http_bureau"
    }
}

impl std::fmt::Debug for HttpCreditSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCreditSource")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
