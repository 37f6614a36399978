use crate::client::{Message, Role};
use crate::error::{Result, ServiceError};

const TRANSLATE_TEMPLATE: &str = include_str!("../prompts/translate.txt");
const PARSE_REVIEW_TEMPLATE: &str = include_str!("../prompts/parse_review.txt");

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A prompt with `{name}` placeholders.
///
/// `{{` and `}}` produce literal braces. The template is parsed once, so a
/// malformed template fails at construction and rendering only has to look
/// up values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn new(template: &str) -> Result<Self> {
        Ok(Self {
            segments: parse_segments(template)?,
        })
    }

    /// Template asking for `text` to be rewritten in a given `style`.
    pub fn translation() -> Result<Self> {
        Self::new(TRANSLATE_TEMPLATE)
    }

    /// Template asking for review fields, followed by `format_instructions`.
    pub fn review() -> Result<Self> {
        Self::new(PARSE_REVIEW_TEMPLATE)
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Variable(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every placeholder. Values are inserted verbatim and are not
    /// scanned for placeholders themselves.
    pub fn render(&self, variables: &[(&str, &str)]) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = variables
                        .iter()
                        .find(|(key, _)| *key == name.as_str())
                        .map(|(_, value)| *value)
                        .ok_or_else(|| ServiceError::MissingVariable(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// Render into a single user message.
    pub fn format_messages(&self, variables: &[(&str, &str)]) -> Result<Vec<Message>> {
        Ok(vec![Message {
            role: Role::User,
            content: self.render(variables)?,
        }])
    }
}

fn parse_segments(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => {
                            return Err(ServiceError::InvalidTemplate(format!(
                                "unclosed placeholder at byte {pos}"
                            )))
                        }
                        Some((_, ch)) => name.push(ch),
                    }
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(ServiceError::InvalidTemplate(format!(
                        "empty placeholder at byte {pos}"
                    )));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name.to_string()));
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '}' => {
                return Err(ServiceError::InvalidTemplate(format!(
                    "unmatched `}}` at byte {pos}"
                )))
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}
