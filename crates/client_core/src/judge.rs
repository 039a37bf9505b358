//! Judge submission client: trait seam, HTTP implementation, null object.

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::SubmitRequest;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("judge rejected submission: {detail}")]
    Rejected { detail: String },
}

#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn submit(&self, request: SubmitRequest) -> Result<(), JudgeError>;
}

pub struct MissingJudgeClient;

#[async_trait]
impl JudgeClient for MissingJudgeClient {
    async fn submit(&self, request: SubmitRequest) -> Result<(), JudgeError> {
        Err(JudgeError::Rejected {
            detail: format!(
                "judge endpoint is not configured (problem {})",
                request.problem
            ),
        })
    }
}

/// Submits over HTTP to `{base_url}/submit`. The judge acknowledges a
/// submission with a success status and a body of the literal JSON `true`;
/// any other status/body combination is a rejection.
pub struct HttpJudgeClient {
    http: Client,
    base_url: String,
}

impl HttpJudgeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl JudgeClient for HttpJudgeClient {
    async fn submit(&self, request: SubmitRequest) -> Result<(), JudgeError> {
        let response = self
            .http
            .post(format!("{}/submit", self.base_url))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let acknowledged = status.is_success()
            && serde_json::from_str::<serde_json::Value>(&body).ok()
                == Some(serde_json::Value::Bool(true));
        if acknowledged {
            debug!(problem = %request.problem, "judge accepted submission");
            return Ok(());
        }

        let detail = if body.is_empty() {
            format!("status {status}")
        } else {
            format!("status {status}: {body}")
        };
        Err(JudgeError::Rejected { detail })
    }
}
