//! Error types for the showroom
//!
//! Load failures are local and non-fatal: they travel inside load completions
//! and leave the scene untouched. Configuration errors are raised at startup,
//! before anything reaches the render loop.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to fetch or decode an asset
///
/// Carries the locator that was requested and a human-readable reason so it
/// can be surfaced to the host as a typed failure event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The model file could not be fetched or decoded
    #[error("failed to load model '{locator}': {reason}")]
    Model { locator: String, reason: String },

    /// The environment map could not be fetched or decoded
    #[error("failed to load environment '{locator}': {reason}")]
    Environment { locator: String, reason: String },
}

impl LoadError {
    pub fn model(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self::Model {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub fn environment(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self::Environment {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    /// Locator of the asset that failed
    pub fn locator(&self) -> &str {
        match self {
            Self::Model { locator, .. } | Self::Environment { locator, .. } => locator,
        }
    }

    /// Why the load failed
    pub fn reason(&self) -> &str {
        match self {
            Self::Model { reason, .. } | Self::Environment { reason, .. } => reason,
        }
    }
}

/// Invalid catalog configuration, detected at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("catalog must contain at least one entry")]
    EmptyCatalog,

    #[error("entry '{name}' has a non-positive exposure ({value})")]
    NonPositiveExposure { name: String, value: f32 },

    #[error("entry '{name}' has a non-positive light intensity ({value})")]
    NonPositiveLightIntensity { name: String, value: f32 },

    #[error("'{name}' has an empty locator")]
    EmptyLocator { name: String },

    #[error("catalog contains more than one entry named '{0}'")]
    DuplicateName(String),

    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exposes_locator_and_reason() {
        let err = LoadError::model("assets/car.gltf", "file not found");
        assert_eq!(err.locator(), "assets/car.gltf");
        assert_eq!(err.reason(), "file not found");
        assert_eq!(
            err.to_string(),
            "failed to load model 'assets/car.gltf': file not found"
        );

        let err = LoadError::environment("sky.hdr", "bad header");
        assert_eq!(err.locator(), "sky.hdr");
        assert!(err.to_string().starts_with("failed to load environment"));
    }
}
