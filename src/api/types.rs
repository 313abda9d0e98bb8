//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentError, AskReply};
use crate::weather::WeatherRecord;

/// Request to ask a weather question.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    /// The user's natural-language question
    pub query: String,
}

/// Outcome of one submission, shaped for the page's three output regions
/// (error banner, AI-answer panel, weather panel).
///
/// `answer` and `weather` may coexist; `error` excludes both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskResponse {
    /// Final natural-language answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// Structured weather record, when a lookup happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherRecord>,

    /// User-visible error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<AskReply, AgentError>> for AskResponse {
    fn from(outcome: Result<AskReply, AgentError>) -> Self {
        match outcome {
            Ok(reply) => Self {
                answer: Some(reply.answer),
                weather: reply.weather,
                error: None,
            },
            Err(err) => Self {
                answer: None,
                weather: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
