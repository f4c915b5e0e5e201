//! HTTP policy oracle
//!
//! Delegates the compliance check to an external service:
//! `POST <endpoint>` with `{"prompt": "..."}` and a `PolicyOutcome` JSON
//! body in response. Transport and status errors propagate to the caller,
//! which handles them under its fail-closed policy.

use crate::error::Result;
use crate::pipeline::types::PolicyOutcome;
use crate::policy::PolicyOracle;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PolicyCheckRequest<'a> {
    prompt: &'a str,
}

/// Policy oracle backed by an external compliance service
#[derive(Debug, Clone)]
pub struct HttpPolicyOracle {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPolicyOracle {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PolicyOracle for HttpPolicyOracle {
    async fn check(&self, text: &str) -> Result<PolicyOutcome> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&PolicyCheckRequest { prompt: text })
            .send()
            .await?
            .error_for_status()?;

        let outcome = response.json::<PolicyOutcome>().await?;
        Ok(outcome)
    }
}
