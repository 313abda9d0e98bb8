//! Core agent loop implementation.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::{AssistantReply, ChatMessage, LlmClient, LlmError, OpenAiClient, Role, ToolCall};
use crate::weather::{OpenWeatherClient, WeatherError, WeatherLookup, WeatherRecord};

use super::prompt::{tool_schemas, SYSTEM_PROMPT, WEATHER_TOOL_NAME};

/// Fallback answer when the model requests a tool outside the declared catalog.
pub const UNKNOWN_TOOL_NOTICE: &str =
    "The model requested an unknown tool; try rephrasing your question.";

/// Everything that can go wrong while answering one question.
///
/// The `Display` text of each variant is the user-visible message the page
/// shows in its error banner.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Please enter a weather question.")]
    EmptyQuery,

    #[error("OpenAI API key is not configured. Set the OPENAI_API_KEY environment variable.")]
    MissingOpenAiKey,

    #[error(
        "OpenWeatherMap API key is not configured. Set the OPENWEATHER_API_KEY environment variable."
    )]
    MissingWeatherKey,

    #[error("The model sent malformed tool arguments: {0}")]
    BadToolArguments(String),

    #[error("The model returned an empty response.")]
    EmptyCompletion,

    #[error(transparent)]
    Completion(#[from] LlmError),

    #[error(transparent)]
    Weather(#[from] WeatherError),
}

/// Result of a successful run: the final answer, plus the weather record
/// when a lookup happened.
#[derive(Debug, Clone)]
pub struct AskReply {
    pub answer: String,
    pub weather: Option<WeatherRecord>,
}

/// Arguments of a `get_current_weather` call.
#[derive(Debug, Deserialize)]
struct WeatherArgs {
    city: String,
}

/// The weather question agent.
pub struct Agent {
    model: String,
    llm: Option<Arc<dyn LlmClient>>,
    weather: Option<Arc<dyn WeatherLookup>>,
}

impl Agent {
    /// Create an agent from configuration.
    ///
    /// A client exists only for each provider with a configured key; a
    /// missing key surfaces as a configuration error when that provider is
    /// actually needed, never earlier.
    pub fn new(config: &Config) -> Self {
        let llm = config
            .openai_api_key
            .as_ref()
            .map(|key| Arc::new(OpenAiClient::new(key.clone())) as Arc<dyn LlmClient>);
        let weather = config
            .weather_api_key
            .as_ref()
            .map(|key| Arc::new(OpenWeatherClient::new(key.clone())) as Arc<dyn WeatherLookup>);

        Self {
            model: config.model.clone(),
            llm,
            weather,
        }
    }

    /// Create an agent over explicit clients (tests, compatible endpoints).
    pub fn with_clients(
        model: impl Into<String>,
        llm: Option<Arc<dyn LlmClient>>,
        weather: Option<Arc<dyn WeatherLookup>>,
    ) -> Self {
        Self {
            model: model.into(),
            llm,
            weather,
        }
    }

    /// Answer one weather question: one completion round, then at most one
    /// tool round.
    pub async fn ask(&self, query: &str) -> Result<AskReply, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::EmptyQuery);
        }
        let llm = self.llm.as_ref().ok_or(AgentError::MissingOpenAiKey)?;

        let mut messages = vec![
            ChatMessage {
                role: Role::System,
                content: Some(SYSTEM_PROMPT.to_string()),
                tool_calls: None,
                tool_call_id: None,
            },
            ChatMessage {
                role: Role::User,
                content: Some(query.to_string()),
                tool_calls: None,
                tool_call_id: None,
            },
        ];
        let tools = tool_schemas();

        debug!("First completion for query: {}", query);
        let response = llm
            .chat_completion(&self.model, &messages, Some(&tools))
            .await?;

        let Some(tool_call) = first_tool_call(&response).cloned() else {
            // No tool requested - the first response is the final answer.
            return match response.content {
                Some(content) => Ok(AskReply {
                    answer: content,
                    weather: None,
                }),
                None => Err(AgentError::EmptyCompletion),
            };
        };

        if tool_call.function.name != WEATHER_TOOL_NAME {
            warn!("Model requested unknown tool: {}", tool_call.function.name);
            return Ok(AskReply {
                answer: UNKNOWN_TOOL_NOTICE.to_string(),
                weather: None,
            });
        }

        let args: WeatherArgs = serde_json::from_str(&tool_call.function.arguments)
            .map_err(|e| AgentError::BadToolArguments(e.to_string()))?;
        let weather_client = self.weather.as_ref().ok_or(AgentError::MissingWeatherKey)?;

        debug!("Looking up weather for city: {}", args.city);
        let record = weather_client.fetch_weather(&args.city).await?;

        // Feed the tool result back for the final natural-language answer.
        let call_id = tool_call.id.clone();
        messages.push(ChatMessage {
            role: Role::Assistant,
            content: response.content,
            // Only the honored call is echoed: the endpoint requires a
            // result message for every call present on an assistant message.
            tool_calls: Some(vec![tool_call]),
            tool_call_id: None,
        });
        messages.push(ChatMessage {
            role: Role::Tool,
            content: Some(serde_json::to_string(&record).unwrap_or_default()),
            tool_calls: None,
            tool_call_id: Some(call_id),
        });

        debug!("Second completion with tool result for {}", record.city_name);
        let final_response = llm
            .chat_completion(&self.model, &messages, Some(&tools))
            .await?;

        match final_response.content {
            Some(content) => Ok(AskReply {
                answer: content,
                weather: Some(record),
            }),
            None => Err(AgentError::EmptyCompletion),
        }
    }
}

/// First tool call on a reply, if any. Calls beyond the first are dropped
/// with a warning naming them.
fn first_tool_call(reply: &AssistantReply) -> Option<&ToolCall> {
    let calls = reply.tool_calls.as_deref()?;
    let (first, rest) = calls.split_first()?;
    if !rest.is_empty() {
        warn!(
            "Dropping {} extra tool call(s): {}",
            rest.len(),
            rest.iter()
                .map(|call| call.function.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FunctionCall;
    use std::sync::Mutex;
    use tokio_test::assert_ok;

    /// Scripted LLM client that records every transcript it receives.
    struct ScriptedLlm {
        replies: Mutex<Vec<Result<AssistantReply, LlmError>>>,
        transcripts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<AssistantReply, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                transcripts: Mutex::new(Vec::new()),
            })
        }

        fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
            self.transcripts.lock().expect("transcripts lock").clone()
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat_completion(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _tools: Option<&[crate::llm::ToolSchema]>,
        ) -> Result<AssistantReply, LlmError> {
            self.transcripts
                .lock()
                .expect("transcripts lock")
                .push(messages.to_vec());
            self.replies.lock().expect("replies lock").remove(0)
        }
    }

    /// Scripted weather provider that records requested cities.
    struct ScriptedWeather {
        results: Mutex<Vec<Result<WeatherRecord, WeatherError>>>,
        cities: Mutex<Vec<String>>,
    }

    impl ScriptedWeather {
        fn new(results: Vec<Result<WeatherRecord, WeatherError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results),
                cities: Mutex::new(Vec::new()),
            })
        }

        fn cities(&self) -> Vec<String> {
            self.cities.lock().expect("cities lock").clone()
        }
    }

    #[async_trait::async_trait]
    impl WeatherLookup for ScriptedWeather {
        async fn fetch_weather(&self, city: &str) -> Result<WeatherRecord, WeatherError> {
            self.cities
                .lock()
                .expect("cities lock")
                .push(city.to_string());
            self.results.lock().expect("results lock").remove(0)
        }
    }

    fn text_reply(text: &str) -> AssistantReply {
        AssistantReply {
            content: Some(text.to_string()),
            tool_calls: None,
        }
    }

    fn tool_reply(calls: &[(&str, &str, &str)]) -> AssistantReply {
        AssistantReply {
            content: None,
            tool_calls: Some(
                calls
                    .iter()
                    .map(|(id, name, arguments)| ToolCall {
                        id: id.to_string(),
                        call_type: "function".to_string(),
                        function: FunctionCall {
                            name: name.to_string(),
                            arguments: arguments.to_string(),
                        },
                    })
                    .collect(),
            ),
        }
    }

    fn london_record() -> WeatherRecord {
        WeatherRecord {
            temperature: 15.0,
            description: "clear sky".to_string(),
            humidity: 60,
            wind_speed: 3.1,
            city_name: "London".to_string(),
        }
    }

    fn agent(llm: &Arc<ScriptedLlm>, weather: Option<&Arc<ScriptedWeather>>) -> Agent {
        Agent::with_clients(
            "gpt-test",
            Some(Arc::clone(llm) as Arc<dyn LlmClient>),
            weather.map(|w| Arc::clone(w) as Arc<dyn WeatherLookup>),
        )
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_before_any_call() {
        let llm = ScriptedLlm::new(vec![]);
        let agent = agent(&llm, None);

        for query in ["", "   ", " \n\t "] {
            let err = agent.ask(query).await.expect_err("expected validation error");
            assert!(matches!(err, AgentError::EmptyQuery));
        }

        assert!(llm.transcripts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_openai_key_is_rejected_before_any_call() {
        let agent = Agent::with_clients("gpt-test", None, None);

        let err = agent
            .ask("What's the weather in London?")
            .await
            .expect_err("expected configuration error");

        assert!(matches!(err, AgentError::MissingOpenAiKey));
        assert!(err
            .to_string()
            .starts_with("OpenAI API key is not configured"));
    }

    #[tokio::test]
    async fn test_direct_answer_passes_through_verbatim() {
        let llm = ScriptedLlm::new(vec![Ok(text_reply("Weather is the state of the atmosphere."))]);
        let weather = ScriptedWeather::new(vec![]);
        let agent = agent(&llm, Some(&weather));

        let reply = assert_ok!(agent.ask("What is weather?").await);

        assert_eq!(reply.answer, "Weather is the state of the atmosphere.");
        assert!(reply.weather.is_none());
        assert!(weather.cities().is_empty());

        // One round, system prompt first, question last.
        let transcripts = llm.transcripts();
        assert_eq!(transcripts.len(), 1);
        assert_eq!(transcripts[0][0].role, Role::System);
        assert_eq!(transcripts[0][0].content.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(transcripts[0][1].role, Role::User);
        assert_eq!(transcripts[0][1].content.as_deref(), Some("What is weather?"));
    }

    #[tokio::test]
    async fn test_tool_round_fetches_weather_and_answers() {
        let llm = ScriptedLlm::new(vec![
            Ok(tool_reply(&[(
                "call_1",
                WEATHER_TOOL_NAME,
                r#"{"city":"London"}"#,
            )])),
            Ok(text_reply("It's 15°C in London with clear sky.")),
        ]);
        let weather = ScriptedWeather::new(vec![Ok(london_record())]);
        let agent = agent(&llm, Some(&weather));

        let reply = assert_ok!(agent.ask("What's the weather in London?").await);

        assert_eq!(reply.answer, "It's 15°C in London with clear sky.");
        assert_eq!(reply.weather, Some(london_record()));
        assert_eq!(weather.cities(), vec!["London".to_string()]);

        // Exactly two completion rounds, in order, the lookup between them.
        let transcripts = llm.transcripts();
        assert_eq!(transcripts.len(), 2);

        // Second round: [system, user, assistant tool-call, tool result].
        let second = &transcripts[1];
        assert_eq!(second.len(), 4);
        assert_eq!(second[0].role, Role::System);
        assert_eq!(second[1].role, Role::User);
        assert_eq!(second[2].role, Role::Assistant);
        assert_eq!(second[3].role, Role::Tool);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));

        // Round-trip: the tool message parses back into the identical record.
        let serialized = second[3].content.as_deref().expect("tool content");
        let parsed: WeatherRecord = serde_json::from_str(serialized).expect("parse tool result");
        assert_eq!(parsed, london_record());
        assert!(serialized.contains("\"windSpeed\""));
        assert!(serialized.contains("\"cityName\""));
    }

    #[tokio::test]
    async fn test_unknown_tool_yields_fallback_without_lookup() {
        let llm = ScriptedLlm::new(vec![Ok(tool_reply(&[(
            "call_1",
            "get_stock_price",
            r#"{"city":"London"}"#,
        )]))]);
        let weather = ScriptedWeather::new(vec![Ok(london_record())]);
        let agent = agent(&llm, Some(&weather));

        let reply = assert_ok!(agent.ask("What's the weather in London?").await);

        assert_eq!(reply.answer, UNKNOWN_TOOL_NOTICE);
        assert!(reply.weather.is_none());
        assert!(weather.cities().is_empty());
        assert_eq!(llm.transcripts().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_second_completion() {
        let llm = ScriptedLlm::new(vec![Ok(tool_reply(&[(
            "call_1",
            WEATHER_TOOL_NAME,
            r#"{"city":"Atlantis"}"#,
        )]))]);
        let weather =
            ScriptedWeather::new(vec![Err(WeatherError::CityNotFound("Atlantis".to_string()))]);
        let agent = agent(&llm, Some(&weather));

        let err = agent
            .ask("Weather in Atlantis?")
            .await
            .expect_err("expected lookup error");

        assert_eq!(err.to_string(), "City \"Atlantis\" not found.");
        assert_eq!(llm.transcripts().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_weather_key_surfaces_on_tool_request() {
        let llm = ScriptedLlm::new(vec![Ok(tool_reply(&[(
            "call_1",
            WEATHER_TOOL_NAME,
            r#"{"city":"London"}"#,
        )]))]);
        let agent = agent(&llm, None);

        let err = agent
            .ask("What's the weather in London?")
            .await
            .expect_err("expected configuration error");

        assert!(matches!(err, AgentError::MissingWeatherKey));
    }

    #[tokio::test]
    async fn test_extra_tool_calls_are_not_executed() {
        let llm = ScriptedLlm::new(vec![
            Ok(tool_reply(&[
                ("call_1", WEATHER_TOOL_NAME, r#"{"city":"London"}"#),
                ("call_2", WEATHER_TOOL_NAME, r#"{"city":"Paris"}"#),
            ])),
            Ok(text_reply("London is clear.")),
        ]);
        let weather = ScriptedWeather::new(vec![Ok(london_record())]);
        let agent = agent(&llm, Some(&weather));

        let reply = assert_ok!(agent.ask("Weather in London and Paris?").await);

        assert_eq!(weather.cities(), vec!["London".to_string()]);
        assert_eq!(reply.weather, Some(london_record()));

        // The echoed assistant message carries only the honored call.
        let second = &llm.transcripts()[1];
        let echoed = second[2].tool_calls.as_ref().expect("echoed calls");
        assert_eq!(echoed.len(), 1);
        assert_eq!(echoed[0].id, "call_1");
    }

    #[tokio::test]
    async fn test_malformed_tool_arguments_are_rejected() {
        let llm = ScriptedLlm::new(vec![Ok(tool_reply(&[(
            "call_1",
            WEATHER_TOOL_NAME,
            "{not json",
        )]))]);
        let weather = ScriptedWeather::new(vec![Ok(london_record())]);
        let agent = agent(&llm, Some(&weather));

        let err = agent
            .ask("Weather in London?")
            .await
            .expect_err("expected argument error");

        assert!(matches!(err, AgentError::BadToolArguments(_)));
        assert!(weather.cities().is_empty());
    }

    #[tokio::test]
    async fn test_empty_first_reply_is_an_error() {
        let llm = ScriptedLlm::new(vec![Ok(AssistantReply::default())]);
        let agent = agent(&llm, None);

        let err = agent
            .ask("Weather in London?")
            .await
            .expect_err("expected empty completion error");

        assert!(matches!(err, AgentError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let llm = ScriptedLlm::new(vec![Err(LlmError::Api("rate limited".to_string()))]);
        let agent = agent(&llm, None);

        let err = agent
            .ask("Weather in London?")
            .await
            .expect_err("expected completion error");

        assert_eq!(err.to_string(), "Completion request failed: rate limited");
    }
}
