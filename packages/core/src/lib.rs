//! Core of promptgate: prompt templates, schema-driven output parsing and a
//! Gemini client, composed by [`PromptService`].

pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod prompt;
pub mod schema;
pub mod service;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub use client::test_support::MockModelClient;
pub use client::{
    ContentPart, GeminiClient, Message, MessageContent, ModelClient, ModelResponse, Role,
    TextPart,
};
pub use config::ModelConfig;
pub use error::{Result, ServiceError};
pub use normalize::extract_text;
pub use prompt::PromptTemplate;
pub use schema::{describe, OutputParseError, OutputSchema, StructuredOutputParser};
pub use service::{review_schema, PromptService};
pub use types::ParsedReview;
