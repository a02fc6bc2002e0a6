//! BEV-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, BevError>;

/// Top-level error type for the beverage identifier.
#[derive(Debug, Error)]
pub enum BevError {
    #[error("[BEV-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[BEV-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[BEV-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[BEV-2001] classification failed: {reason}")]
    Classification { reason: String },

    #[error("[BEV-2002] invalid classifier output: {details}")]
    InvalidInput { details: String },

    #[error("[BEV-2003] enrichment failed: {reason}")]
    Enrichment { reason: String },

    #[error("[BEV-2004] {port} port did not answer within {after:?}")]
    PortTimeout {
        port: &'static str,
        after: Duration,
    },

    #[error("[BEV-2101] invalid image: {details}")]
    InvalidImage { details: String },

    #[error("[BEV-3001] event {event} is not valid in step {step}")]
    InvalidTransition {
        step: &'static str,
        event: &'static str,
    },

    #[error("[BEV-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[BEV-3003] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[BEV-3004] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[BEV-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl BevError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "BEV-1001",
            Self::MissingConfig { .. } => "BEV-1002",
            Self::ConfigParse { .. } => "BEV-1003",
            Self::Classification { .. } => "BEV-2001",
            Self::InvalidInput { .. } => "BEV-2002",
            Self::Enrichment { .. } => "BEV-2003",
            Self::PortTimeout { .. } => "BEV-2004",
            Self::InvalidImage { .. } => "BEV-2101",
            Self::InvalidTransition { .. } => "BEV-3001",
            Self::Io { .. } => "BEV-3002",
            Self::Serialization { .. } => "BEV-3003",
            Self::ChannelClosed { .. } => "BEV-3004",
            Self::Runtime { .. } => "BEV-3900",
        }
    }

    /// Whether the session flow can absorb this failure and land in a
    /// well-defined step. Contract violations and configuration faults
    /// are not recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Classification { .. }
                | Self::InvalidInput { .. }
                | Self::Enrichment { .. }
                | Self::PortTimeout { .. }
                | Self::InvalidImage { .. }
                | Self::ChannelClosed { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Short user-facing description without the code prefix.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Classification { reason } => format!("Could not analyze the image: {reason}"),
            Self::InvalidInput { details } => {
                format!("The classifier returned an unusable result: {details}")
            }
            Self::Enrichment { reason } => format!("Beverage details are unavailable: {reason}"),
            Self::PortTimeout { port, after } => {
                format!("The {port} step took longer than {}s and was abandoned", after.as_secs())
            }
            Self::InvalidImage { details } => format!("That file is not a usable photo: {details}"),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for BevError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for BevError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
