//! Error types for netlist loading and checking.

/// Result type for netlist operations.
pub type NetlistResult<T> = Result<T, NetlistError>;

/// Errors raised while loading a netlist or building its timing graph.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// The netlist file could not be read or written.
    #[error("failed to access netlist: {0}")]
    Io(#[from] std::io::Error),

    /// The netlist is not valid JSON or does not match the schema.
    #[error("failed to parse netlist: {0}")]
    Parse(serde_json::Error),

    /// Two instances share a name.
    #[error("duplicate instance '{0}'")]
    DuplicateInstance(String),

    /// An instance refers to a library that is not declared.
    #[error("instance '{instance}' uses unknown library '{library}'")]
    UnknownLibrary {
        /// The offending instance.
        instance: String,
        /// The missing library.
        library: String,
    },

    /// An instance refers to a cell its library does not contain.
    #[error("instance '{instance}' uses unknown cell '{cell}' in library '{library}'")]
    UnknownCell {
        /// The offending instance.
        instance: String,
        /// The library searched.
        library: String,
        /// The missing reference name.
        cell: String,
    },

    /// A library's threshold group is not on the ladder.
    #[error("library '{library}' belongs to group '{group}', which is not on the ladder")]
    UnknownGroup {
        /// The offending library.
        library: String,
        /// Its group alias.
        group: String,
    },

    /// A timing arc names an instance that does not exist.
    #[error("timing arc refers to unknown instance '{0}'")]
    UnknownInstance(String),

    /// The timing arcs contain a cycle.
    #[error("timing arcs form a loop through '{0}'")]
    TimingLoop(String),

    /// The clock period is not a positive finite number.
    #[error("clock period must be positive, got {0}")]
    InvalidClockPeriod(f64),
}
