use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Interplay - sandboxed interaction runtime
#[derive(Parser, Debug)]
#[command(name = "interplay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble a fragment directory into a self-contained HTML document
    Synthesize {
        #[command(flatten)]
        artifact: ArtifactArgs,

        /// Write the document here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Run lint, shape, syntax and render checks against a fragment directory
    Validate {
        #[command(flatten)]
        artifact: ArtifactArgs,

        /// Print the outcome as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Validate, then write the accepted document to the resource directory
    Preview {
        #[command(flatten)]
        artifact: ArtifactArgs,

        /// Resource directory (default: INTERPLAY_RESOURCE_DIR or the user cache dir)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Answer bridge requests as an in-memory preview host
    Serve {
        /// Newline-delimited JSON envelopes over stdin/stdout
        #[arg(long, default_value = "true")]
        stdio: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ArtifactArgs {
    /// Directory holding structure.html, style.css, behavior.js, seed.json, config-schema.json
    #[arg(value_name = "FRAGMENT_DIR")]
    pub dir: PathBuf,

    /// Widget identity (true-false, multiple-choice, or any custom name)
    #[arg(long, default_value = "custom")]
    pub widget: String,

    /// Live seed data JSON file; supersedes the directory's seed.json
    #[arg(long, value_name = "FILE")]
    pub seed: Option<PathBuf>,

    /// Use non-networked preview stubs instead of the postMessage bridge
    /// (overlay variants always use them)
    #[arg(long, default_value = "false")]
    pub preview: bool,

    /// Document title
    #[arg(long)]
    pub title: Option<String>,

    /// Render the interaction over this page (iframe underlay)
    #[arg(long, value_name = "URL", conflicts_with = "media_url")]
    pub page_url: Option<String>,

    /// Render the interaction over this media file
    #[arg(long, value_name = "URL")]
    pub media_url: Option<String>,

    /// Media element kind for --media-url
    #[arg(long, value_enum, default_value = "video")]
    pub media: MediaArg,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum MediaArg {
    Video,
    Audio,
}
