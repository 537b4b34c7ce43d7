//! Errors raised while loading `livepack.toml`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML")]
    Toml(#[from] toml::de::Error),

    /// Every problem found by validation, reported together.
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}
