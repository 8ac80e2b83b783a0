//! Structural lint
//!
//! Matches the structure fragment against a table of known authoring typos.
//! Rules are regexes; custom rules and disabled ids come from a YAML file.

mod default_rules;
mod rules;
mod scanner;
mod types;

pub use default_rules::get_default_rules;
pub use rules::{LintRule, LintRulesConfig, CONFIG_FILE_NAMES};
pub use scanner::StructureLinter;
pub use types::{LintFinding, LintResult};
