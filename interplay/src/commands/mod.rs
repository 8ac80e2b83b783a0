//! Command handlers. Each loads fragments from disk, builds the display mode
//! and drives the library crates.

pub mod preview;
pub mod serve;
pub mod synthesize;
pub mod validate;

use crate::cli::{ArtifactArgs, MediaArg};
use anyhow::{Context, Result};
use interplay_artifact::{ArtifactVariant, DisplayMode, MediaKind};
use interplay_core::fragments::FragmentSet;
use interplay_core::widget::WidgetKind;
use serde_json::Value;
use std::fs;

/// Everything a command needs from [`ArtifactArgs`].
pub struct Inputs {
    pub fragments: FragmentSet,
    pub widget: WidgetKind,
    pub live_seed: Option<Value>,
    pub mode: DisplayMode,
}

pub fn load_inputs(args: &ArtifactArgs) -> Result<Inputs> {
    let fragments = FragmentSet::load_from_dir(&args.dir)?;
    let live_seed = match &args.seed {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read seed data: {}", path.display()))?;
            Some(
                serde_json::from_str(&text)
                    .with_context(|| format!("Seed data is not valid JSON: {}", path.display()))?,
            )
        }
        None => None,
    };
    Ok(Inputs {
        fragments,
        widget: WidgetKind::parse(&args.widget),
        live_seed,
        mode: display_mode(args),
    })
}

pub fn display_mode(args: &ArtifactArgs) -> DisplayMode {
    let variant = match (&args.page_url, &args.media_url) {
        (Some(url), _) => ArtifactVariant::PageOverlay { url: url.clone() },
        (None, Some(url)) => ArtifactVariant::MediaOverlay {
            url: url.clone(),
            media: match args.media {
                MediaArg::Video => MediaKind::Video,
                MediaArg::Audio => MediaKind::Audio,
            },
        },
        (None, None) => ArtifactVariant::Standard,
    };
    let mut mode = DisplayMode {
        variant,
        preview: args.preview,
        title: None,
    };
    if let Some(title) = &args.title {
        mode = mode.with_title(title.clone());
    }
    mode
}
