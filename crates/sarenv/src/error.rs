//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias.
//! Variants cover unsupported climate/terrain configurations, invalid region geometry,
//! invalid feature weights, empty probability surfaces, feature acquisition failures,
//! malformed dataset artifacts, IO and JSON errors.
use thiserror::Error;

use crate::config::{Climate, EnvironmentType};

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported configuration: no feature categories for {climate} / {environment_type}")]
    UnsupportedConfiguration {
        climate: Climate,
        environment_type: EnvironmentType,
    },

    #[error("unsupported configuration: unknown label '{0}'")]
    UnsupportedName(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("probability surface is empty")]
    EmptySurface,

    #[error("region contains no features")]
    EmptyRegion,

    #[error("feature source error: {0}")]
    FeatureSource(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns `true` for both flavours of unsupported configuration.
    pub fn is_unsupported_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedConfiguration { .. } | Error::UnsupportedName(_)
        )
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        matches!(err, Error::Other(_))
            .then_some(())
            .expect("expected Other variant");
    }

    #[test]
    fn unsupported_configuration_names_the_pair() {
        let err = Error::UnsupportedConfiguration {
            climate: Climate::Dry,
            environment_type: EnvironmentType::Mountainous,
        };
        assert!(err.is_unsupported_configuration());
        assert_eq!(
            err.to_string(),
            "unsupported configuration: no feature categories for dry / mountainous"
        );
    }

    #[test]
    fn unknown_label_counts_as_unsupported() {
        let err = Error::UnsupportedName("arctic".into());
        assert!(err.is_unsupported_configuration());
        assert!(!Error::EmptySurface.is_unsupported_configuration());
    }
}
