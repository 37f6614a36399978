use serde::{Deserialize, Deserializer, Serialize};

// Absent and null fields deserialize as empty strings so they are rejected by
// the same validation as empty ones.
fn empty_if_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub text: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub style: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseReviewRequest {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub review: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub completion: String,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_absent_fields_are_empty() {
        let req: TranslateRequest =
            serde_json::from_str(r#"{"text": null, "style": "formal"}"#).expect("deserialize");
        assert_eq!(req.text, "");
        assert_eq!(req.style, "formal");

        let req: ParseReviewRequest = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(req.review, "");

        let req: CompletionRequest =
            serde_json::from_str(r#"{"prompt": null}"#).expect("deserialize");
        assert_eq!(req.prompt, "");
    }
}
