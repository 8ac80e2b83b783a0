//! Artifact synthesis and displayable-resource lifecycle.
//!
//! Fragments → [`synthesize`] (pure, deterministic) → [`Document`] →
//! [`Synthesizer::build`] stamps a [`VersionToken`] and digest → [`Artifact`] →
//! [`ArtifactCache`] publishes at most one live resource per surface.

pub mod bootstrap;
pub mod cache;
pub mod document;
pub mod error;
pub mod sanitize;
pub mod seed;
pub mod synth;
pub mod version;

pub use cache::{ArtifactCache, DirectoryProvider, MemoryProvider, ResourceHandle, ResourceProvider};
pub use document::{Block, Document, DocumentBuilder, ScriptUnit};
pub use error::{CacheError, SynthesisError};
pub use seed::{partition_seed, resolve_seed, ConfigSchema, SeedPartition};
pub use synth::{synthesize, Artifact, ArtifactVariant, DisplayMode, MediaKind, Synthesizer};
pub use version::{VersionClock, VersionToken};
