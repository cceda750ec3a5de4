//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `leakopt.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A transition or rule refers to a threshold group not on the ladder.
    #[error("unknown threshold group '{0}'")]
    UnknownGroup(String),

    /// A rule targets a library that has no transition entry.
    #[error("unknown library '{0}'")]
    UnknownLibrary(String),

    /// A library that can move in some direction has no rule for it.
    #[error("library '{library}' has no '{direction}' rule")]
    MissingRule {
        /// The library lacking the rule.
        library: String,
        /// `"up"` or `"down"`.
        direction: &'static str,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
