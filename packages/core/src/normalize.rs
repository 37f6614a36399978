use crate::client::{ContentPart, MessageContent};

/// Flatten model response content into plain text. Never fails; shapes it
/// does not understand become an empty string.
pub fn extract_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(p) => p.text.as_str(),
                ContentPart::Other(_) => "",
            })
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string(),
        MessageContent::Part(part) => part.text.clone(),
        MessageContent::Unrecognized(_) => String::new(),
    }
}
