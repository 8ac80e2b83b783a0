//! Validation outcome and its user-facing rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Structural,
    Shape,
    Syntax,
    Runtime,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Structural => "structural",
            ErrorKind::Shape => "shape",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Runtime => "runtime",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub message: String,
    /// Excerpt or snippet supporting the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ValidationOutcome {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            error_kind: None,
            message: "accepted".to_string(),
            details: None,
        }
    }

    pub fn rejected(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            error_kind: Some(kind),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Multi-line text for terminals and log panes.
    pub fn format_report(&self) -> String {
        let mut out = match self.error_kind {
            None => "✓ accepted".to_string(),
            Some(kind) => format!("✗ rejected ({} error): {}", kind, self.message),
        };
        if let Some(details) = &self.details {
            for line in details.lines() {
                out.push_str("\n    ");
                out.push_str(line);
            }
        }
        out
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_kind {
            None => f.write_str("accepted"),
            Some(kind) => write!(f, "{} error: {}", kind, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case_without_empty_fields() {
        let json = serde_json::to_value(ValidationOutcome::accepted()).unwrap();
        assert_eq!(json, serde_json::json!({"accepted": true, "message": "accepted"}));
        let rejected = ValidationOutcome::rejected(ErrorKind::Syntax, "SyntaxError: x");
        let json = serde_json::to_value(&rejected).unwrap();
        assert_eq!(json["errorKind"], "syntax");
    }

    #[test]
    fn test_format_report_indents_details() {
        let outcome = ValidationOutcome::rejected(ErrorKind::Syntax, "SyntaxError: unexpected token")
            .with_details("  1 | a\n> 2 | b(");
        let text = outcome.format_report();
        assert!(text.starts_with("✗ rejected (syntax error): SyntaxError"));
        assert!(text.contains("\n    > 2 | b("));
        assert_eq!(outcome.to_string(), "syntax error: SyntaxError: unexpected token");
    }
}
