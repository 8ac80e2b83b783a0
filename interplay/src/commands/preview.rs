//! `interplay preview`: write an accepted artifact where a browser can open it.

use super::load_inputs;
use crate::cli::ArtifactArgs;
use anyhow::{Context, Result};
use interplay_artifact::{DirectoryProvider, ResourceProvider, Synthesizer};
use interplay_core::config::CacheConfig;
use interplay_harness::ValidationHarness;
use std::path::PathBuf;

/// Surface name for files written by this command.
const PREVIEW_SURFACE: &str = "preview";

pub fn run(args: &ArtifactArgs, out_dir: Option<PathBuf>) -> Result<()> {
    let inputs = load_inputs(args)?;
    let artifact = Synthesizer::new()
        .build(&inputs.fragments, inputs.live_seed.as_ref(), &inputs.mode)
        .with_context(|| format!("Failed to synthesize {}", args.dir.display()))?;

    let harness = ValidationHarness::from_env();
    let outcome = harness.validate_document(
        &inputs.fragments,
        &inputs.widget,
        inputs.live_seed.as_ref(),
        artifact.document(),
    )?;
    if !outcome.is_accepted() {
        eprintln!("{}", outcome.format_report());
        anyhow::bail!("not previewing a rejected artifact");
    }

    let root = out_dir.unwrap_or_else(|| CacheConfig::from_env().resource_dir);
    let provider = DirectoryProvider::new(&root)
        .with_context(|| format!("Failed to prepare resource dir {}", root.display()))?;
    // Written outside the cache so the file outlives this process.
    let uri = provider.create(PREVIEW_SURFACE, &artifact)?;
    println!("{}", uri);
    Ok(())
}
