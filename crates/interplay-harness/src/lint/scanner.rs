//! Structure linter

use super::default_rules::get_default_rules;
use super::rules::{LintRule, LintRulesConfig};
use super::types::{LintFinding, LintResult};
use regex::Regex;

/// Finds the first known typo in a structure fragment.
pub struct StructureLinter {
    rules: Vec<(LintRule, Regex)>,
}

impl Default for StructureLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureLinter {
    /// Linter with the built-in typo table
    pub fn new() -> Self {
        Self {
            rules: Self::compile_rules(&get_default_rules()),
        }
    }

    pub fn with_config(config: &LintRulesConfig) -> Self {
        let mut rules = if config.use_default_rules {
            get_default_rules()
        } else {
            Vec::new()
        };
        rules.extend(config.rules.clone());
        rules.retain(|r| !config.disabled_rules.contains(&r.id));
        Self {
            rules: Self::compile_rules(&rules),
        }
    }

    fn compile_rules(rules: &[LintRule]) -> Vec<(LintRule, Regex)> {
        rules
            .iter()
            .filter(|r| r.enabled)
            .filter_map(|rule| match rule.compile() {
                Ok(regex) => Some((rule.clone(), regex)),
                Err(e) => {
                    tracing::warn!("Failed to compile lint rule '{}': {}", rule.id, e);
                    None
                }
            })
            .collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Scan line by line; the earliest line wins, then table order. Text
    /// inside `<!-- -->` comments is ignored.
    pub fn scan(&self, structure: &str) -> LintResult {
        let masked = mask_comments(structure);
        for (line_idx, (line, visible)) in structure.lines().zip(masked.lines()).enumerate() {
            for (rule, regex) in &self.rules {
                if let Some(m) = regex.find(visible) {
                    return LintResult {
                        finding: Some(LintFinding {
                            rule_id: rule.id.clone(),
                            line_number: line_idx + 1,
                            description: rule.description.clone(),
                            matched: m.as_str().trim().to_string(),
                            code_snippet: line.trim().to_string(),
                        }),
                    };
                }
            }
        }
        LintResult::default()
    }
}

/// Blank out comment spans, keeping newlines so line numbers survive. An
/// unterminated comment runs to the end of the fragment.
fn mask_comments(structure: &str) -> String {
    let mut out = String::with_capacity(structure.len());
    let mut rest = structure;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        let comment = &rest[start..];
        let end = comment[4..]
            .find("-->")
            .map(|i| i + 4 + 3)
            .unwrap_or(comment.len());
        out.extend(comment[..end].chars().map(|c| if c == '\n' { '\n' } else { ' ' }));
        rest = &comment[end..];
    }
    out.push_str(rest);
    out
}
