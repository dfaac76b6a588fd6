//! Semantic query matching against the hosted ranking oracle
//!
//! The oracle returns candidate ids ordered most relevant first. It requires
//! an authenticated session; without one, or when the call fails, matching
//! degrades to plain text search and the caller only sees a skipped stage.

use crate::config::{HttpConfig, SemanticConfig};
use crate::error::{ExpboardError, Result};
use crate::outcome::{SkipReason, StageOutcome};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    #[error("Semantic search timed out")]
    Timeout,

    #[error("Semantic search transport error: {0}")]
    Transport(String),

    #[error("Semantic search returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode semantic search response: {0}")]
    Decode(String),

    #[error("Invalid session token")]
    InvalidToken,
}

impl From<reqwest::Error> for SemanticError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SemanticError::Timeout
        } else if err.is_decode() {
            SemanticError::Decode(err.to_string())
        } else {
            SemanticError::Transport(err.to_string())
        }
    }
}

/// Request body sent to the oracle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticRequest {
    pub query: String,
    #[serde(rename = "locationHint", skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SemanticResponse {
    #[serde(default)]
    matching_job_ids: Vec<String>,
}

/// Relevance-ranking backend
#[async_trait]
pub trait SemanticOracle: Send + Sync {
    async fn rank(
        &self,
        token: &str,
        request: &SemanticRequest,
    ) -> std::result::Result<Vec<String>, SemanticError>;
}

/// Oracle reached over HTTP with bearer authentication
pub struct HttpSemanticOracle {
    client: Client,
    endpoint: String,
}

impl HttpSemanticOracle {
    pub fn new(endpoint: impl Into<String>, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(http.timeout())
            .user_agent(http.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SemanticOracle for HttpSemanticOracle {
    async fn rank(
        &self,
        token: &str,
        request: &SemanticRequest,
    ) -> std::result::Result<Vec<String>, SemanticError> {
        let auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| SemanticError::InvalidToken)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, auth)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(SemanticError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SemanticResponse = response.json().await?;
        Ok(parsed.matching_job_ids)
    }
}

/// Session-aware front for a [`SemanticOracle`]
pub struct SemanticMatcher {
    oracle: Arc<dyn SemanticOracle>,
    session_token: Option<String>,
    enabled: bool,
}

impl SemanticMatcher {
    pub fn new(oracle: Arc<dyn SemanticOracle>, session_token: Option<String>) -> Self {
        Self {
            oracle,
            session_token: session_token.filter(|t| !t.trim().is_empty()),
            enabled: true,
        }
    }

    /// Matcher using the HTTP oracle and the token named in the configuration
    pub fn from_config(config: &SemanticConfig, http: &HttpConfig) -> Result<Self> {
        let oracle = HttpSemanticOracle::new(config.endpoint.clone(), http).map_err(|e| {
            ExpboardError::Config(format!("Failed to build semantic client: {}", e))
        })?;
        let mut matcher = Self::new(Arc::new(oracle), config.session_token());
        matcher.enabled = config.enabled;
        Ok(matcher)
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_token.is_some()
    }

    pub fn set_session(&mut self, token: Option<String>) {
        self.session_token = token.filter(|t| !t.trim().is_empty());
    }

    /// Rank candidates for `query`.
    ///
    /// `Resolved` always holds a non-empty id list; an empty answer from the
    /// oracle is `Unresolved`.
    pub async fn match_query(
        &self,
        query: &str,
        location_hint: Option<&str>,
    ) -> StageOutcome<Vec<String>> {
        let query = query.trim();
        if query.is_empty() {
            return StageOutcome::Skipped(SkipReason::EmptyInput);
        }
        if !self.enabled {
            return StageOutcome::Skipped(SkipReason::Disabled);
        }
        let Some(token) = self.session_token.as_deref() else {
            debug!("No session, skipping semantic search");
            return StageOutcome::Skipped(SkipReason::Unauthenticated);
        };

        let request = SemanticRequest {
            query: query.to_string(),
            location_hint: location_hint
                .map(str::trim)
                .filter(|hint| !hint.is_empty())
                .map(str::to_string),
        };

        match self.oracle.rank(token, &request).await {
            Ok(ids) if ids.is_empty() => StageOutcome::Unresolved,
            Ok(ids) => {
                debug!("Semantic search matched {} candidates", ids.len());
                StageOutcome::Resolved(ids)
            }
            Err(e) => {
                warn!("Semantic search failed: {}", e);
                StageOutcome::Skipped(SkipReason::Unavailable(e.to_string()))
            }
        }
    }

    /// Ranked ids, empty whenever the stage did not produce a result
    pub async fn match_ids(&self, query: &str, location_hint: Option<&str>) -> Vec<String> {
        self.match_query(query, location_hint)
            .await
            .resolved()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeOracle {
        calls: AtomicUsize,
        answer: std::result::Result<Vec<String>, SemanticError>,
        last_request: Mutex<Option<SemanticRequest>>,
    }

    impl FakeOracle {
        fn answering(answer: std::result::Result<Vec<String>, SemanticError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                answer,
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl SemanticOracle for FakeOracle {
        async fn rank(
            &self,
            _token: &str,
            request: &SemanticRequest,
        ) -> std::result::Result<Vec<String>, SemanticError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.answer.clone()
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_skips_call() {
        let oracle = FakeOracle::answering(Ok(vec!["1".to_string()]));
        let matcher = SemanticMatcher::new(oracle.clone(), None);

        assert_eq!(
            matcher.match_query("numbers", None).await,
            StageOutcome::Skipped(SkipReason::Unauthenticated)
        );
        assert!(matcher.match_ids("numbers", None).await.is_empty());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let oracle = FakeOracle::answering(Ok(vec!["1".to_string()]));
        let matcher = SemanticMatcher::new(oracle.clone(), Some("token".to_string()));

        assert_eq!(
            matcher.match_query("   ", None).await,
            StageOutcome::Skipped(SkipReason::EmptyInput)
        );
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ranked_ids_and_location_hint() {
        let oracle = FakeOracle::answering(Ok(vec!["2".to_string(), "7".to_string()]));
        let matcher = SemanticMatcher::new(oracle.clone(), Some("token".to_string()));

        let outcome = matcher.match_query("numbers", Some(" Austin ")).await;
        assert_eq!(
            outcome,
            StageOutcome::Resolved(vec!["2".to_string(), "7".to_string()])
        );

        let sent = oracle.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.location_hint.as_deref(), Some("Austin"));
    }

    #[tokio::test]
    async fn test_empty_answer_is_unresolved() {
        let oracle = FakeOracle::answering(Ok(vec![]));
        let matcher = SemanticMatcher::new(oracle, Some("token".to_string()));

        assert_eq!(
            matcher.match_query("numbers", None).await,
            StageOutcome::Unresolved
        );
    }

    #[tokio::test]
    async fn test_failure_is_absorbed() {
        let oracle = FakeOracle::answering(Err(SemanticError::Timeout));
        let matcher = SemanticMatcher::new(oracle, Some("token".to_string()));

        let outcome = matcher.match_query("numbers", None).await;
        assert_eq!(outcome.failure(), Some("Semantic search timed out"));
        assert!(matcher.match_ids("numbers", None).await.is_empty());
    }

    #[test]
    fn test_blank_token_is_no_session() {
        let oracle = FakeOracle::answering(Ok(vec![]));
        let matcher = SemanticMatcher::new(oracle, Some("  ".to_string()));
        assert!(!matcher.is_authenticated());
    }

    #[test]
    fn test_request_body_shape() {
        let with_hint = SemanticRequest {
            query: "data".to_string(),
            location_hint: Some("Austin".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&with_hint).unwrap(),
            serde_json::json!({ "query": "data", "locationHint": "Austin" })
        );

        let without_hint = SemanticRequest {
            query: "data".to_string(),
            location_hint: None,
        };
        assert_eq!(
            serde_json::to_value(&without_hint).unwrap(),
            serde_json::json!({ "query": "data" })
        );
    }
}
