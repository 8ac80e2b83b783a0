use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Seed data is not valid JSON: {0}")]
    SeedData(String),

    #[error("Configuration schema is not valid JSON: {0}")]
    ConfigSchema(String),

    #[error("Invalid display mode: {0}")]
    DisplayMode(String),

    #[error("Failed to encode embedded data: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create resource for surface '{surface}': {source}")]
    Create {
        surface: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to dispose resource {uri}: {source}")]
    Dispose {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Resource directory unavailable: {0}")]
    Directory(#[from] std::io::Error),
}
