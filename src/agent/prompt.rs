//! System prompt and tool declaration for the weather assistant.

use serde_json::json;

use crate::llm::ToolSchema;

/// Name of the single tool the model may call.
pub const WEATHER_TOOL_NAME: &str = "get_current_weather";

/// Fixed system instruction prepended to every completion call.
pub const SYSTEM_PROMPT: &str = "You are a helpful weather assistant. When the user names a city, \
use the get_current_weather tool to fetch live conditions before answering. \
Answer in clear, conversational language and mention the concrete values you were given.";

/// The declared tool schemas, in OpenAI function format.
///
/// Fixed at process start; the catalog contains exactly one function.
pub fn tool_schemas() -> Vec<ToolSchema> {
    vec![json!({
        "type": "function",
        "function": {
            "name": WEATHER_TOOL_NAME,
            "description": "Get the current weather for a city. Returns temperature (°C), conditions, humidity (%), and wind speed (m/s).",
            "parameters": {
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The city name, e.g. \"London\" or \"New York\""
                    }
                },
                "required": ["city"]
            }
        }
    })]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_schema_declares_required_city() {
        let schemas = tool_schemas();
        assert_eq!(schemas.len(), 1);

        let function = &schemas[0]["function"];
        assert_eq!(function["name"], WEATHER_TOOL_NAME);
        assert_eq!(function["parameters"]["required"][0], "city");
    }
}
