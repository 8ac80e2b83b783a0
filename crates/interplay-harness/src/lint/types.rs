//! Lint result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The first typo found in a structure fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintFinding {
    pub rule_id: String,
    /// 1-based line in the structure fragment
    pub line_number: usize,
    pub description: String,
    /// Exact text the rule matched
    pub matched: String,
    pub code_snippet: String,
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}: `{}` [{}]",
            self.description, self.line_number, self.matched, self.rule_id
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintResult {
    pub finding: Option<LintFinding>,
}

impl LintResult {
    pub fn is_clean(&self) -> bool {
        self.finding.is_none()
    }
}
