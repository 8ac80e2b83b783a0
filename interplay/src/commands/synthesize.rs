//! `interplay synthesize`

use super::load_inputs;
use crate::cli::ArtifactArgs;
use anyhow::{Context, Result};
use interplay_artifact::synthesize;
use std::fs;
use std::path::Path;

pub fn run(args: &ArtifactArgs, output: Option<&Path>) -> Result<()> {
    let inputs = load_inputs(args)?;
    let document = synthesize(&inputs.fragments, inputs.live_seed.as_ref(), &inputs.mode)
        .with_context(|| format!("Failed to synthesize {}", args.dir.display()))?;
    let html = document.render();
    match output {
        Some(path) => {
            fs::write(path, &html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            interplay_core::info_log!("wrote {} ({} bytes)", path.display(), html.len());
        }
        None => print!("{}", html),
    }
    Ok(())
}
