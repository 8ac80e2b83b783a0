use thiserror::Error;

/// Failures of the harness itself, as opposed to rejections of an artifact.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("evaluation engine error: {0}")]
    Engine(String),

    #[error("evaluation exceeded {0}ms")]
    Timeout(u64),

    #[error("evaluation exceeded {0} MB memory budget")]
    OutOfMemory(usize),

    #[error("malformed engine report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("synthesis failed: {0}")]
    Synthesis(#[from] interplay_artifact::SynthesisError),

    #[error("resource cache: {0}")]
    Cache(#[from] interplay_artifact::CacheError),

    #[error("no validated artifact to publish")]
    NothingToPublish,
}

pub type Result<T> = std::result::Result<T, HarnessError>;
