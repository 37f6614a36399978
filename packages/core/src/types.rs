use serde::Serialize;
use serde_json::{Map, Value};

/// Result of review parsing.
///
/// Serialized untagged: either the field mapping itself or `{"raw": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedReview {
    /// Extracted values keyed by schema field name, in schema order.
    Fields(Map<String, Value>),
    /// The model's answer could not be parsed; its normalized text.
    Raw { raw: String },
}

impl ParsedReview {
    pub fn is_raw(&self) -> bool {
        matches!(self, ParsedReview::Raw { .. })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            ParsedReview::Fields(fields) => fields.get(field),
            ParsedReview::Raw { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shapes() {
        let mut fields = Map::new();
        fields.insert("gift".into(), json!(true));
        fields.insert("delivery_days".into(), json!(2));
        let parsed = ParsedReview::Fields(fields);
        assert_eq!(
            serde_json::to_string(&parsed).expect("serialize"),
            r#"{"gift":true,"delivery_days":2}"#
        );
        assert_eq!(parsed.get("gift"), Some(&json!(true)));

        let raw = ParsedReview::Raw {
            raw: "no idea".into(),
        };
        assert!(raw.is_raw());
        assert_eq!(
            serde_json::to_value(&raw).expect("serialize"),
            json!({"raw": "no idea"})
        );
    }
}
