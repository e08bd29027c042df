//! Error types
//!
//! Failures that reach the caller of a discovery or generation run. Client
//! and HTTP code below this layer uses `anyhow` and is wrapped here with the
//! category or artifact that failed.

use crate::discovery::Category;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Scope or credentials could not be established
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("could not read {path}: {source}")]
    ConfigurationIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fatal-classified category failed and the run was aborted
    #[error("{category} discovery failed: {source:#}")]
    FatalDiscovery {
        category: Category,
        #[source]
        source: anyhow::Error,
    },

    /// A tolerable category failed. Only ever logged.
    #[error("{category} discovery failed (non-fatal): {source:#}")]
    TolerableDiscovery {
        category: Category,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write {artifact}: {source}")]
    Generation {
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn generation(artifact: impl Into<String>, source: std::io::Error) -> Self {
        Self::Generation {
            artifact: artifact.into(),
            source,
        }
    }
}
