use thiserror::Error;

use crate::schema::OutputParseError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("invalid prompt template: {0}")]
    InvalidTemplate(String),

    #[error("missing value for prompt variable `{0}`")]
    MissingVariable(String),

    #[error("LLM API request failed: {0}")]
    LlmApiRequest(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    LlmApiError { status: u16, message: String },

    #[error("failed to parse LLM response: {0}")]
    LlmResponseParse(String),

    #[error("structured output parsing failed: {0}")]
    OutputParse(#[from] OutputParseError),
}

impl ServiceError {
    /// Whether the error came from talking to the model provider.
    pub fn is_model_invocation(&self) -> bool {
        matches!(
            self,
            ServiceError::LlmApiRequest(_)
                | ServiceError::LlmApiError { .. }
                | ServiceError::LlmResponseParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServiceError::MissingCredential("GEMINI_API_KEY".into());
        assert_eq!(
            err.to_string(),
            "missing credential: GEMINI_API_KEY is not set"
        );

        let err = ServiceError::LlmApiError {
            status: 403,
            message: "API key not valid".into(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_model_invocation_classification() {
        assert!(ServiceError::LlmResponseParse("bad json".into()).is_model_invocation());
        assert!(ServiceError::LlmApiError {
            status: 500,
            message: String::new()
        }
        .is_model_invocation());
        assert!(!ServiceError::InvalidArgument("text".into()).is_model_invocation());
        assert!(!ServiceError::OutputParse(OutputParseError::NotAnObject).is_model_invocation());
    }
}
