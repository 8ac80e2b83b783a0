//! `interplay validate`

use super::load_inputs;
use crate::cli::ArtifactArgs;
use anyhow::Result;
use interplay_harness::ValidationHarness;

pub fn run(args: &ArtifactArgs, json: bool) -> Result<()> {
    let inputs = load_inputs(args)?;
    let harness = ValidationHarness::from_env();
    let outcome = harness.validate(
        &inputs.fragments,
        &inputs.widget,
        inputs.live_seed.as_ref(),
        &inputs.mode,
    )?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.format_report());
    }
    if !outcome.is_accepted() {
        anyhow::bail!("{}", outcome);
    }
    Ok(())
}
