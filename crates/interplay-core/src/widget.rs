//! Built-in widget identities.
//!
//! An identity selects extra seed-data shape checks and the element ids the
//! rendered document must contain. Unknown identities get neither.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WidgetKind {
    TrueFalse,
    MultipleChoice,
    Custom(String),
}

impl WidgetKind {
    pub fn parse(identity: &str) -> Self {
        match identity.trim().to_lowercase().replace('_', "-").as_str() {
            "true-false" | "truefalse" => WidgetKind::TrueFalse,
            "multiple-choice" | "multiplechoice" | "mcq" => WidgetKind::MultipleChoice,
            _ => WidgetKind::Custom(identity.trim().to_string()),
        }
    }

    pub fn identity(&self) -> &str {
        match self {
            WidgetKind::TrueFalse => "true-false",
            WidgetKind::MultipleChoice => "multiple-choice",
            WidgetKind::Custom(name) => name,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, WidgetKind::Custom(_))
    }

    /// Element ids a rendered instance must expose.
    pub fn required_element_ids(&self) -> &'static [&'static str] {
        match self {
            WidgetKind::TrueFalse => &["statement-list", "submit-button"],
            WidgetKind::MultipleChoice => &["question", "options", "submit-button"],
            WidgetKind::Custom(_) => &[],
        }
    }
}

impl From<String> for WidgetKind {
    fn from(s: String) -> Self {
        WidgetKind::parse(&s)
    }
}

impl From<WidgetKind> for String {
    fn from(kind: WidgetKind) -> Self {
        kind.identity().to_string()
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builtin_aliases() {
        assert_eq!(WidgetKind::parse("true_false"), WidgetKind::TrueFalse);
        assert_eq!(WidgetKind::parse("Multiple-Choice"), WidgetKind::MultipleChoice);
        assert_eq!(
            WidgetKind::parse("flashcards"),
            WidgetKind::Custom("flashcards".to_string())
        );
    }

    #[test]
    fn test_custom_has_no_required_elements() {
        assert!(WidgetKind::parse("memory-game").required_element_ids().is_empty());
        assert!(WidgetKind::TrueFalse
            .required_element_ids()
            .contains(&"submit-button"));
    }

    #[test]
    fn test_serde_uses_identity_string() {
        let json = serde_json::to_string(&WidgetKind::TrueFalse).unwrap();
        assert_eq!(json, "\"true-false\"");
        let back: WidgetKind = serde_json::from_str("\"multiple-choice\"").unwrap();
        assert_eq!(back, WidgetKind::MultipleChoice);
    }
}
