//! Error taxonomy for the lintforge pipeline

use thiserror::Error;

/// Errors that can occur while resolving, fetching, building or running
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Transport failure or unexpected HTTP status
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    /// The registry has no such module or version
    #[error("{name}@{version} not found in registry")]
    NotFound { name: String, version: String },

    /// The registry answered with something that is not the expected JSON
    #[error("malformed registry response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// The registry answered for a different version than was asked for
    #[error("registry returned version {returned} for requested {requested}")]
    VersionMismatch { requested: String, returned: String },

    /// Version spec is neither "latest" nor a valid version
    #[error("invalid version {0:?}: expected \"latest\" or vMAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    /// Fetched bytes are not a readable archive
    #[error("archive for {name}@{version} is corrupt: {reason}")]
    ArchiveCorrupt {
        name: String,
        version: String,
        reason: String,
    },

    /// Requested entry is missing from the archive
    #[error("{entry} not found in archive")]
    FileNotFound { entry: String },

    /// The engine's build step failed or produced no executable
    #[error("build failed: {0}")]
    BuildFailed(String),

    /// The custom executable could not be run or exited non-zero
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForgeError {
    /// True for responses that arrived but could not be trusted.
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            ForgeError::MalformedResponse { .. } | ForgeError::VersionMismatch { .. }
        )
    }
}

impl From<reqwest::Error> for ForgeError {
    fn from(err: reqwest::Error) -> Self {
        ForgeError::Network {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            reason: err.to_string(),
        }
    }
}
