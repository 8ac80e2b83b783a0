//! Authoring session.
//!
//! Owns the working fragment set, the last known good artifact and the
//! displayable resources published from it. Only artifacts the harness
//! accepted are ever published. Dropping the session releases every resource.

use crate::error::{HarnessError, Result};
use crate::harness::ValidationHarness;
use crate::outcome::ValidationOutcome;
use interplay_artifact::{Artifact, ArtifactCache, DisplayMode, ResourceHandle, ResourceProvider, Synthesizer};
use interplay_core::fragments::FragmentSet;
use interplay_core::info_log;
use interplay_core::widget::WidgetKind;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Checkpoint {
    fragments: FragmentSet,
    artifact: Artifact,
}

pub struct AuthoringSession<P: ResourceProvider> {
    id: String,
    widget: WidgetKind,
    mode: DisplayMode,
    live_seed: Option<Value>,
    draft: FragmentSet,
    last_known_good: Option<Checkpoint>,
    synthesizer: Synthesizer,
    harness: ValidationHarness,
    cache: ArtifactCache<P>,
}

impl<P: ResourceProvider> AuthoringSession<P> {
    pub fn new(widget: WidgetKind, fragments: FragmentSet, harness: ValidationHarness, provider: P) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(session = %id, widget = %widget, "authoring session opened");
        Self {
            id,
            widget,
            mode: DisplayMode::default(),
            live_seed: None,
            draft: fragments,
            last_known_good: None,
            synthesizer: Synthesizer::new(),
            harness,
            cache: ArtifactCache::new(provider),
        }
    }

    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Live content-record data; supersedes the fragments' sample seed.
    pub fn with_live_seed(mut self, seed: Value) -> Self {
        self.live_seed = Some(seed);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn widget(&self) -> &WidgetKind {
        &self.widget
    }

    pub fn draft(&self) -> &FragmentSet {
        &self.draft
    }

    pub fn cache(&self) -> &ArtifactCache<P> {
        &self.cache
    }

    /// Replace the working fragments. Nothing is validated or published.
    pub fn edit(&mut self, fragments: FragmentSet) {
        self.draft = fragments;
    }

    pub fn edit_with(&mut self, f: impl FnOnce(&mut FragmentSet)) {
        f(&mut self.draft);
    }

    /// True when the draft differs from the last accepted fragments.
    pub fn is_dirty(&self) -> bool {
        self.last_known_good
            .as_ref()
            .map_or(true, |c| c.fragments != self.draft)
    }

    pub fn last_known_good(&self) -> Option<&Artifact> {
        self.last_known_good.as_ref().map(|c| &c.artifact)
    }

    /// Synthesize and validate the draft. Accepted drafts become the last
    /// known good version; an unchanged document keeps its version token.
    pub fn validate(&mut self) -> Result<ValidationOutcome> {
        let artifact = self
            .synthesizer
            .build(&self.draft, self.live_seed.as_ref(), &self.mode)?;
        let outcome = self.harness.validate_document(
            &self.draft,
            &self.widget,
            self.live_seed.as_ref(),
            artifact.document(),
        )?;
        if !outcome.is_accepted() {
            tracing::debug!(session = %self.id, "draft rejected: {}", outcome);
            return Ok(outcome);
        }

        let unchanged = self
            .last_known_good
            .as_ref()
            .is_some_and(|c| c.artifact.digest() == artifact.digest());
        if unchanged {
            if let Some(checkpoint) = self.last_known_good.as_mut() {
                checkpoint.fragments = self.draft.clone();
            }
        } else {
            info_log!(session = %self.id, version = %artifact.version(), "accepted new version");
            self.last_known_good = Some(Checkpoint {
                fragments: self.draft.clone(),
                artifact,
            });
        }
        Ok(outcome)
    }

    /// Displayable resource of the last known good artifact on `surface`.
    pub fn publish(&self, surface: &str) -> Result<Arc<ResourceHandle>> {
        let checkpoint = self
            .last_known_good
            .as_ref()
            .ok_or(HarnessError::NothingToPublish)?;
        Ok(self.cache.get_displayable_resource(surface, &checkpoint.artifact)?)
    }

    /// Discard the draft in favor of the last known good fragments.
    pub fn revert(&mut self) -> bool {
        match &self.last_known_good {
            Some(checkpoint) => {
                self.draft = checkpoint.fragments.clone();
                true
            }
            None => false,
        }
    }
}

impl<P: ResourceProvider> Drop for AuthoringSession<P> {
    fn drop(&mut self) {
        let released = self.cache.dispose_all();
        tracing::debug!(session = %self.id, released, "authoring session closed");
    }
}
