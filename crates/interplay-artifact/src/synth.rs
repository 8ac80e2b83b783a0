//! Fragment set + seed + display mode → self-contained document.

use crate::bootstrap::{
    BRIDGE_CLIENT_JS, DIAGNOSTIC_JS, MEDIA_CONTROLS_JS, OVERLAY_CSS, PREVIEW_STUBS_JS,
};
use crate::document::{embed_json, Block, Document, DocumentBuilder, Underlay};
use crate::error::SynthesisError;
use crate::sanitize::sanitize_fragment;
use crate::seed::{partition_seed, resolve_seed, ConfigSchema};
use crate::version::{VersionClock, VersionToken};
use interplay_core::fragments::FragmentSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

const DEFAULT_TITLE: &str = "Interaction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    fn tag(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ArtifactVariant {
    Standard,
    /// Foreign page in an iframe under the interactive overlay.
    PageOverlay { url: String },
    /// Audio/video element under the overlay; behavior gets `window.player`.
    MediaOverlay { url: String, media: MediaKind },
}

impl ArtifactVariant {
    pub fn is_overlay(&self) -> bool {
        !matches!(self, Self::Standard)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMode {
    pub variant: ArtifactVariant,
    /// Non-networked capability stubs instead of the postMessage bridge.
    /// Overlay variants always get the stubs.
    pub preview: bool,
    pub title: Option<String>,
}

impl Default for DisplayMode {
    fn default() -> Self {
        Self {
            variant: ArtifactVariant::Standard,
            preview: false,
            title: None,
        }
    }
}

impl DisplayMode {
    pub fn preview() -> Self {
        Self {
            preview: true,
            ..Self::default()
        }
    }

    pub fn with_variant(mut self, variant: ArtifactVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Whether capabilities are served by in-document stubs.
    pub fn uses_local_capabilities(&self) -> bool {
        self.preview || self.variant.is_overlay()
    }
}

/// Assemble the document. Pure: identical inputs give byte-identical output.
pub fn synthesize(
    fragments: &FragmentSet,
    live_seed: Option<&Value>,
    mode: &DisplayMode,
) -> Result<Document, SynthesisError> {
    let seed = resolve_seed(fragments.seed_data(), live_seed)?;
    let schema = ConfigSchema::parse(fragments.config_schema())?;
    let partition = partition_seed(&seed, &schema);

    let title = mode.title.as_deref().unwrap_or(DEFAULT_TITLE);
    let mut builder = DocumentBuilder::new(title);

    let underlay = match &mode.variant {
        ArtifactVariant::Standard => None,
        ArtifactVariant::PageOverlay { url } => Some(Underlay::Page {
            url: checked_url(url)?,
        }),
        ArtifactVariant::MediaOverlay { url, media } => Some(Underlay::Media {
            url: checked_url(url)?,
            tag: media.tag(),
        }),
    };
    if let Some(underlay) = underlay {
        builder = builder.style(OVERLAY_CSS).block(Block::Underlay(underlay));
    }

    let style = sanitize_fragment(fragments.style());
    if !style.trim().is_empty() {
        builder = builder.style(style);
    }
    let structure = sanitize_fragment(fragments.structure());
    if !structure.trim().is_empty() {
        builder = builder.structure(structure);
    }

    builder = builder
        .block(Block::Data {
            config_json: embed_json(&Value::Object(partition.config))?,
            data_json: embed_json(&Value::Object(partition.data))?,
        })
        .bootstrap("diagnostic", DIAGNOSTIC_JS);
    builder = if mode.uses_local_capabilities() {
        builder.bootstrap("preview", PREVIEW_STUBS_JS)
    } else {
        builder.bootstrap("bridge", BRIDGE_CLIENT_JS)
    };
    if matches!(mode.variant, ArtifactVariant::MediaOverlay { .. }) {
        builder = builder.bootstrap("media", MEDIA_CONTROLS_JS);
    }

    let behavior = sanitize_fragment(fragments.behavior());
    if !behavior.trim().is_empty() {
        builder = builder.behavior(behavior);
    }
    Ok(builder.build())
}

fn checked_url(url: &str) -> Result<String, SynthesisError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(SynthesisError::DisplayMode(
            "overlay variant requires a non-empty url".to_string(),
        ));
    }
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("data:text/html") {
        return Err(SynthesisError::DisplayMode(format!(
            "unsupported underlay url scheme: {}",
            url
        )));
    }
    Ok(url.to_string())
}

/// Immutable synthesized artifact identified by its version token.
#[derive(Debug, Clone)]
pub struct Artifact {
    version: VersionToken,
    digest: String,
    html: String,
    document: Document,
}

impl Artifact {
    pub fn new(version: VersionToken, document: Document) -> Self {
        let html = document.render();
        let digest = hex::encode(Sha256::digest(html.as_bytes()));
        Self {
            version,
            digest,
            html,
            document,
        }
    }

    pub fn version(&self) -> VersionToken {
        self.version
    }

    /// SHA-256 of the rendered document, hex.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Stamps synthesized documents with strictly increasing version tokens.
#[derive(Debug, Default)]
pub struct Synthesizer {
    clock: VersionClock,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(
        &self,
        fragments: &FragmentSet,
        live_seed: Option<&Value>,
        mode: &DisplayMode,
    ) -> Result<Artifact, SynthesisError> {
        let document = synthesize(fragments, live_seed, mode)?;
        let artifact = Artifact::new(self.clock.next(), document);
        tracing::debug!(
            version = %artifact.version(),
            digest = %&artifact.digest()[..12],
            "synthesized artifact"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fragments() -> FragmentSet {
        FragmentSet::new()
            .with_structure("<div id=\"app\">\r\n</div>")
            .with_style("#app{color:blue}")
            .with_behavior("document.getElementById('app').textContent = window.__INTERACTION_DATA__.title;")
            .with_seed_data(r#"{"title":"Cells","timeLimit":30}"#)
            .with_config_schema(r#"{"properties":{"timeLimit":{"default":60},"theme":{"default":"light"}}}"#)
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let mode = DisplayMode::default();
        let a = synthesize(&fragments(), None, &mode).unwrap().render();
        let b = synthesize(&fragments(), None, &mode).unwrap().render();
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_inputs_same_digest_different_versions() {
        let synth = Synthesizer::new();
        let mode = DisplayMode::default();
        let first = synth.build(&fragments(), None, &mode).unwrap();
        let second = synth.build(&fragments(), None, &mode).unwrap();
        assert_eq!(first.digest(), second.digest());
        assert!(second.version() > first.version());
        assert_eq!(first.digest().len(), 64);
    }

    #[test]
    fn test_seed_partition_lands_in_globals() {
        let html = synthesize(&fragments(), None, &DisplayMode::default())
            .unwrap()
            .render();
        assert!(html.contains(r#"window.__INTERACTION_CONFIG__ = {"theme":"light","timeLimit":30};"#));
        assert!(html.contains(r#"window.__INTERACTION_DATA__ = {"title":"Cells"};"#));
        assert!(!html.contains('\r'));
    }

    #[test]
    fn test_live_seed_supersedes_sample() {
        let live = json!({"title": "Live"});
        let html = synthesize(&fragments(), Some(&live), &DisplayMode::default())
            .unwrap()
            .render();
        assert!(html.contains(r#"window.__INTERACTION_DATA__ = {"title":"Live"};"#));
    }

    #[test]
    fn test_layout_order_and_error_boundary() {
        let html = synthesize(&fragments(), None, &DisplayMode::default())
            .unwrap()
            .render();
        let style = html.find("#app{color:blue}").unwrap();
        let structure = html.find("<div id=\"app\">").unwrap();
        let data = html.find("__INTERACTION_CONFIG__ =").unwrap();
        let bridge = html.find("window.interaction = {").unwrap();
        let behavior = html.find("textContent = window.__INTERACTION_DATA__").unwrap();
        assert!(style < structure && structure < data && data < bridge && bridge < behavior);
        assert!(html[behavior..].contains("window.__interactionShowDiagnostic(err)"));
        assert!(html.contains("parent.postMessage"));
    }

    #[test]
    fn test_preview_mode_has_no_network_bridge() {
        let html = synthesize(&fragments(), None, &DisplayMode::preview())
            .unwrap()
            .render();
        assert!(html.contains("__interactionPreview"));
        assert!(!html.contains("parent.postMessage"));
    }

    #[test]
    fn test_media_overlay_gets_player_stubs() {
        let mode = DisplayMode::default().with_variant(ArtifactVariant::MediaOverlay {
            url: "https://cdn.example.com/clip.mp4".into(),
            media: MediaKind::Video,
        });
        let html = synthesize(&fragments(), None, &mode).unwrap().render();
        assert!(html.contains("<video id=\"__interaction_media\""));
        assert!(html.contains("window.player = {"));

        let page = DisplayMode::default().with_variant(ArtifactVariant::PageOverlay {
            url: "https://example.com".into(),
        });
        let html = synthesize(&fragments(), None, &page).unwrap().render();
        assert!(html.contains("<iframe id=\"__interaction_underlay\""));
        assert!(!html.contains("window.player = {"));
    }

    #[test]
    fn test_overlays_get_local_capability_stubs() {
        let media = DisplayMode::default().with_variant(ArtifactVariant::MediaOverlay {
            url: "https://cdn.example.com/talk.mp3".into(),
            media: MediaKind::Audio,
        });
        let page = DisplayMode::default().with_variant(ArtifactVariant::PageOverlay {
            url: "https://example.com/article".into(),
        });
        for mode in [&media, &page] {
            assert!(mode.uses_local_capabilities());
            let html = synthesize(&fragments(), None, mode).unwrap().render();
            assert!(html.contains("__interactionPreview"));
            assert!(!html.contains("parent.postMessage"));
        }
        assert!(!DisplayMode::default().uses_local_capabilities());
    }

    #[test]
    fn test_overlay_requires_url() {
        let mode = DisplayMode::default().with_variant(ArtifactVariant::PageOverlay { url: " ".into() });
        assert!(matches!(
            synthesize(&fragments(), None, &mode),
            Err(SynthesisError::DisplayMode(_))
        ));
    }

    #[test]
    fn test_empty_fragment_set_still_synthesizes() {
        let html = synthesize(&FragmentSet::new(), None, &DisplayMode::default())
            .unwrap()
            .render();
        assert!(html.contains("window.__INTERACTION_DATA__ = {};"));
    }
}
