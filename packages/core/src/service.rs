use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::{Message, ModelClient};
use crate::error::{Result, ServiceError};
use crate::normalize::extract_text;
use crate::prompt::PromptTemplate;
use crate::schema::{describe, OutputSchema, StructuredOutputParser};
use crate::types::ParsedReview;

/// Fields extracted from a product review, with the descriptions shown to
/// the model.
pub const REVIEW_FIELDS: [(&str, &str); 3] = [
    ("gift", "Was the item purchased as a gift? True/False."),
    (
        "delivery_days",
        "Number of days for delivery, or -1 if unknown.",
    ),
    ("price_value", "Sentences about value or price, as a list."),
];

pub fn review_schema() -> OutputSchema {
    OutputSchema::from_names_and_descriptions(REVIEW_FIELDS)
}

/// Prompt orchestration over a single model client.
///
/// Immutable after construction and shared across requests.
pub struct PromptService {
    client: Arc<dyn ModelClient>,
    translation: PromptTemplate,
    review: PromptTemplate,
    review_instructions: String,
    review_parser: StructuredOutputParser,
}

impl PromptService {
    pub fn new(client: Arc<dyn ModelClient>) -> Result<Self> {
        let (review_instructions, review_parser) = describe(&review_schema());
        Ok(Self {
            client,
            translation: PromptTemplate::translation()?,
            review: PromptTemplate::review()?,
            review_instructions,
            review_parser,
        })
    }

    /// Rewrite `text` in the requested `style`.
    pub async fn translate_text(&self, text: &str, style: &str) -> Result<String> {
        require("text", text)?;
        require("style", style)?;

        info!(style, text_len = text.len(), "translating text");

        let messages = self
            .translation
            .format_messages(&[("text", text), ("style", style)])?;
        self.invoke_text(&messages).await
    }

    /// Extract `gift`, `delivery_days` and `price_value` from a review.
    ///
    /// Model failures propagate. Output that does not match the schema is
    /// returned as [`ParsedReview::Raw`] instead of failing.
    pub async fn parse_review(&self, review: &str) -> Result<ParsedReview> {
        require("review", review)?;

        info!(review_len = review.len(), "parsing review");

        let messages = self.review.format_messages(&[
            ("text", review),
            ("format_instructions", self.review_instructions.as_str()),
        ])?;
        let content = self.invoke_text(&messages).await?;

        match self.review_parser.parse(&content) {
            Ok(fields) => {
                debug!(fields = fields.len(), "review parsed");
                Ok(ParsedReview::Fields(fields))
            }
            Err(e) => {
                let err = ServiceError::from(e);
                warn!(error = %err, "returning raw model output");
                Ok(ParsedReview::Raw { raw: content })
            }
        }
    }

    /// Send `prompt` to the model as-is.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        require("prompt", prompt)?;

        info!(prompt_len = prompt.len(), "direct completion");

        self.invoke_text(&[Message::user(prompt)]).await
    }

    async fn invoke_text(&self, messages: &[Message]) -> Result<String> {
        let response = self.client.invoke(messages).await?;
        debug!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "model usage"
        );
        Ok(extract_text(&response.content))
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(format!(
            "\"{field}\" is required"
        )));
    }
    Ok(())
}
