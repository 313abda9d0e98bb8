//! # Weather Chat
//!
//! A small service backing a browser-based weather assistant.
//!
//! This library provides:
//! - An HTTP API the page calls to submit questions and read results
//! - A bounded tool-call loop between an LLM and a live weather provider
//! - Typed clients for the OpenAI and OpenWeatherMap HTTP APIs
//!
//! ## Architecture
//!
//! One user question flows through at most two completion rounds:
//! 1. The question is sent to the model with one declared tool,
//!    `get_current_weather`
//! 2. If the model requests the tool, live conditions are fetched from
//!    OpenWeatherMap
//! 3. The tool result is fed back to the model for a final natural-language
//!    answer, surfaced together with the structured weather record
//!
//! ## Example
//!
//! ```rust,ignore
//! use weather_chat::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(&config);
//! let reply = agent.ask("What's the weather in London?").await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod weather;

pub use config::Config;
