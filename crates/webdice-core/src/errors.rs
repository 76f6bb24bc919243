use thiserror::Error;

/// Error type for invalid configuration and failed runs.
///
/// Submodels never produce errors: numerical edge cases are resolved by the
/// documented closed forms. Everything here is raised at construction time or
/// when the optimiser is invoked.
#[derive(Error, Debug)]
pub enum DiceError {
    #[error("{0}")]
    Error(String),
    #[error("Unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("Invalid value for parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Unknown {family} variant `{name}`. Expected one of: {expected}")]
    UnknownVariant {
        family: &'static str,
        name: String,
        expected: String,
    },
    #[error("Optimisation solver `{0}` is not available in this build")]
    SolverUnavailable(String),
    #[error("Control vector has {actual} periods but the horizon has {expected}")]
    ControlLength { expected: usize, actual: usize },
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scenario file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to serialise output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type for `Result<T, DiceError>`.
pub type DiceResult<T> = Result<T, DiceError>;
