//! Schema-driven structured output.
//!
//! An [`OutputSchema`] lists the fields the model should answer with. The
//! format instructions sent to the model and the parser that reads its answer
//! are both derived from the same schema value via [`describe`].

use serde_json::{Map, Value};
use thiserror::Error;

/// Failure to decode model output against an [`OutputSchema`].
#[derive(Debug, Error)]
pub enum OutputParseError {
    #[error("output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("expected key `{0}` to be present")]
    MissingKey(String),
}

/// One named field of the expected output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseField {
    pub name: String,
    pub description: String,
}

/// Ordered field name → description mapping. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSchema {
    fields: Vec<ResponseField>,
}

impl OutputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names_and_descriptions<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |schema, (name, description)| {
                schema.field(name, description)
            })
    }

    /// Add a field. Re-adding an existing name replaces its description and
    /// keeps its position.
    pub fn field(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let description = description.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.description = description,
            None => self.fields.push(ResponseField { name, description }),
        }
        self
    }

    pub fn fields(&self) -> &[ResponseField] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Produce the format instructions and the matching parser for `schema`.
pub fn describe(schema: &OutputSchema) -> (String, StructuredOutputParser) {
    let parser = StructuredOutputParser::from_schema(schema.clone());
    (parser.format_instructions(), parser)
}

/// Parses model output that follows the instructions built from its schema.
#[derive(Debug, Clone)]
pub struct StructuredOutputParser {
    schema: OutputSchema,
}

impl StructuredOutputParser {
    pub fn from_schema(schema: OutputSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    pub fn format_instructions(&self) -> String {
        let mut out = String::from(
            "The output should be a markdown code snippet formatted in the following schema, \
             including the leading and trailing \"```json\" and \"```\":\n\n```json\n{\n",
        );
        for field in &self.schema.fields {
            out.push_str(&format!(
                "  \"{}\": string  // {}\n",
                field.name, field.description
            ));
        }
        out.push_str("}\n```");
        out
    }

    /// Decode `text` into a map holding exactly the schema's fields, in
    /// schema order.
    ///
    /// Accepts surrounding prose and whitespace, an optional ```` ```json ````
    /// fence, and raw newlines inside string values. Anything that is not a
    /// JSON object with every schema field is rejected.
    pub fn parse(&self, text: &str) -> Result<Map<String, Value>, OutputParseError> {
        let trimmed = text.trim();
        let candidate = fenced_body(trimmed).unwrap_or(trimmed).trim();

        let value: Value = match serde_json::from_str(candidate) {
            Ok(v) => v,
            Err(first_error) => serde_json::from_str(&escape_control_chars_in_strings(candidate))
                .map_err(|_| OutputParseError::InvalidJson(first_error))?,
        };

        let Value::Object(mut object) = value else {
            return Err(OutputParseError::NotAnObject);
        };

        let mut fields = Map::new();
        for field in &self.schema.fields {
            let value = object
                .remove(&field.name)
                .ok_or_else(|| OutputParseError::MissingKey(field.name.clone()))?;
            fields.insert(field.name.clone(), value);
        }
        Ok(fields)
    }
}

/// Body of a ```` ``` ```` fenced block, without its language tag.
///
/// The block runs from the first fence to the last one, or to the end of the
/// text when the fence is never closed (truncated answers).
fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body = match after_fence.rfind("```") {
        Some(end) => &after_fence[..end],
        None => after_fence,
    };

    let body = match body.split_once('\n') {
        Some((tag, rest)) if is_language_tag(tag) => rest,
        _ => body,
    };

    // Single-line form: ```json {"a": 1}```
    let body = match body.trim_start().strip_prefix("json") {
        Some(rest) if rest.starts_with(|c: char| c.is_whitespace() || c == '{') => rest,
        _ => body,
    };

    Some(body)
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Escape raw control characters that appear inside JSON string literals.
fn escape_control_chars_in_strings(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }

    out
}
