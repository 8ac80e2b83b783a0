//! Two-phase validation.
//!
//! Static phase: structural lint, seed shape, behavior syntax. Nothing runs.
//! Execution phase: the synthesized document is rendered in an isolated
//! evaluator against a stub document. Checks short-circuit on the first
//! rejection.

use crate::engine::{IsolatedEvaluator, QuickJsEvaluator, RenderRequest};
use crate::error::{HarnessError, Result};
use crate::lint::{LintRulesConfig, StructureLinter};
use crate::outcome::{ErrorKind, ValidationOutcome};
use crate::shape::{check_shape, parse_seed};
use interplay_artifact::sanitize::sanitize_fragment;
use interplay_artifact::{synthesize, ConfigSchema, DisplayMode, Document};
use interplay_core::config::HarnessConfig;
use interplay_core::fragments::FragmentSet;
use interplay_core::widget::WidgetKind;
use serde_json::Value;

pub struct ValidationHarness {
    config: HarnessConfig,
    linter: StructureLinter,
    evaluator: Box<dyn IsolatedEvaluator>,
}

impl Default for ValidationHarness {
    fn default() -> Self {
        Self::new(HarnessConfig::default())
    }
}

impl ValidationHarness {
    pub fn new(config: HarnessConfig) -> Self {
        let rules = LintRulesConfig::load_or_default(config.lint_rules_path.as_deref(), None);
        Self {
            linter: StructureLinter::with_config(&rules),
            evaluator: Box::new(QuickJsEvaluator::from_config(&config)),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(HarnessConfig::from_env())
    }

    pub fn with_linter(mut self, linter: StructureLinter) -> Self {
        self.linter = linter;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Box<dyn IsolatedEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Lint, shape and syntax. Accepted means the execution phase may run.
    pub fn static_phase(
        &self,
        fragments: &FragmentSet,
        widget: &WidgetKind,
        live_seed: Option<&Value>,
    ) -> Result<ValidationOutcome> {
        let structure = sanitize_fragment(fragments.structure());
        if let Some(finding) = self.linter.scan(&structure).finding {
            tracing::debug!(rule = %finding.rule_id, line = finding.line_number, "structural lint rejected");
            return Ok(ValidationOutcome::rejected(
                ErrorKind::Structural,
                format!(
                    "{} at line {}: `{}`",
                    finding.description, finding.line_number, finding.matched
                ),
            )
            .with_details(finding.code_snippet));
        }

        let seed = match parse_seed(fragments, live_seed) {
            Ok(seed) => seed,
            Err(message) => return Ok(ValidationOutcome::rejected(ErrorKind::Shape, message)),
        };
        if let Err(e) = ConfigSchema::parse(fragments.config_schema()) {
            return Ok(ValidationOutcome::rejected(ErrorKind::Shape, e.to_string()));
        }
        if let Err(message) = check_shape(widget, &seed) {
            return Ok(ValidationOutcome::rejected(
                ErrorKind::Shape,
                format!("{} seed data: {}", widget, message),
            ));
        }

        let behavior = sanitize_fragment(fragments.behavior());
        if !behavior.trim().is_empty() {
            match self.evaluator.check_syntax(&behavior) {
                Ok(None) => {}
                Ok(Some(err)) => {
                    let mut outcome = ValidationOutcome::rejected(ErrorKind::Syntax, err.to_string());
                    if let Some(excerpt) = err.excerpt {
                        outcome = outcome.with_details(excerpt);
                    }
                    return Ok(outcome);
                }
                Err(e @ (HarnessError::Timeout(_) | HarnessError::OutOfMemory(_))) => {
                    return Ok(ValidationOutcome::rejected(
                        ErrorKind::Syntax,
                        format!("syntax check aborted: {}", e),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(ValidationOutcome::accepted())
    }

    /// Render `document` in isolation and look up the widget's required ids.
    pub fn execution_phase(&self, document: &Document, widget: &WidgetKind) -> Result<ValidationOutcome> {
        let request = RenderRequest::from_document(document);
        let report = match self.evaluator.render(&request) {
            Ok(report) => report,
            Err(e @ (HarnessError::Timeout(_) | HarnessError::OutOfMemory(_))) => {
                return Ok(ValidationOutcome::rejected(ErrorKind::Runtime, e.to_string()));
            }
            Err(e) => return Err(e),
        };

        if let Some(message) = report.failure() {
            let mut outcome = ValidationOutcome::rejected(ErrorKind::Runtime, message);
            let details: Vec<&str> = report
                .diagnostic
                .as_ref()
                .map(|d| d.stack.lines().filter(|l| !l.trim().is_empty()).collect())
                .unwrap_or_default();
            if !details.is_empty() {
                outcome = outcome.with_details(details.join("\n"));
            }
            return Ok(outcome);
        }

        for id in widget.required_element_ids() {
            if !report.has_element(id) {
                return Ok(ValidationOutcome::rejected(
                    ErrorKind::Runtime,
                    format!("Required element absent: #{}", id),
                ));
            }
        }
        Ok(ValidationOutcome::accepted())
    }

    /// Both phases against an already synthesized document.
    pub fn validate_document(
        &self,
        fragments: &FragmentSet,
        widget: &WidgetKind,
        live_seed: Option<&Value>,
        document: &Document,
    ) -> Result<ValidationOutcome> {
        let outcome = self.static_phase(fragments, widget, live_seed)?;
        if !outcome.is_accepted() {
            return Ok(outcome);
        }
        self.execution_phase(document, widget)
    }

    /// Both phases, synthesizing the document from `fragments`.
    pub fn validate(
        &self,
        fragments: &FragmentSet,
        widget: &WidgetKind,
        live_seed: Option<&Value>,
        mode: &DisplayMode,
    ) -> Result<ValidationOutcome> {
        let outcome = self.static_phase(fragments, widget, live_seed)?;
        if !outcome.is_accepted() {
            return Ok(outcome);
        }
        let seed = live_seed.cloned();
        let document = synthesize(fragments, seed.as_ref(), mode)?;
        self.execution_phase(&document, widget)
    }
}
