//! lintforge-core: assemble and run a custom lint executable
//!
//! The pipeline, in order:
//!
//! 1. resolve a dependency version against a module registry
//! 2. fetch the version's archive and extract the policy configuration
//! 3. render the build manifest for the base engine plus plugin
//! 4. run the engine's build step to produce the custom executable
//! 5. run that executable with the policy and pass-through arguments
//!
//! Every step runs once, in sequence, without retries. All scratch files live
//! in a [`WorkArea`] that is removed when the run ends.

pub mod artifact;
pub mod config;
mod error;
pub mod fakes;
pub mod manifest;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod telemetry;
pub mod version;
pub mod workspace;

pub use artifact::{entry_path, write_atomic, Archive, ArtifactFetcher};
pub use config::{BuildConfig, RegistryConfig};
pub use error::ForgeError;
pub use manifest::{render, write_manifest, BuildManifest, PluginSource};
pub use orchestrator::{execution_args, BuildOrchestrator, ExecutionOutcome};
pub use pipeline::{Pipeline, RunOutcome, RunRequest, Stage};
pub use registry::{escape_path, HttpRegistry, RegistryClient, VersionResolver};
pub use telemetry::{init_tracing, LogFormat};
pub use version::{DependencyRef, ResolvedVersion, VersionSpec};
pub use workspace::WorkArea;

/// Result type for lintforge operations
pub type Result<T> = std::result::Result<T, ForgeError>;

/// lintforge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
