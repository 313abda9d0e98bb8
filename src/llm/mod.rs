//! LLM completion client: transcript types and the OpenAI-backed implementation.
//!
//! The agent talks to the model through the [`LlmClient`] trait so the loop
//! can be exercised against scripted clients in tests. Transcripts are
//! append-only: the caller builds the full message list for every round.

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Non-success status from the completion endpoint, or a transport failure.
    #[error("Completion request failed: {0}")]
    Api(String),

    /// The success payload did not have the expected shape.
    #[error("Unexpected completion response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Api(err.to_string())
    }
}

/// Message roles in a chat transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single transcript entry sent to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool invocations carried by an assistant message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Id of the call a tool message answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,

    #[serde(rename = "type")]
    pub call_type: String,

    pub function: FunctionCall,
}

/// The function half of a tool call: a name plus a JSON-encoded argument string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// The assistant message produced by one completion round.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantReply {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// A declared tool schema in OpenAI function format
/// (`{"type": "function", "function": {...}}`).
pub type ToolSchema = Value;

/// Chat completion provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion round over the given transcript.
    ///
    /// When `tools` is supplied the model is left free to decide whether to
    /// call one (`tool_choice: "auto"`).
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<AssistantReply, LlmError>;
}
