use thiserror::Error;

/// Failures raised by the reduction and block statistics core.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum Error {
    #[error("invalid configuration for {param}: {reason}")]
    Config { param: &'static str, reason: String },

    #[error("malformed table at line {line}: {reason}")]
    Shape { line: usize, reason: String },

    #[error("series has no usable frames")]
    EmptySeries,

    #[error("insufficient data for {what}: needs at least {needed}, found {found}")]
    InsufficientData {
        what: &'static str,
        needed: usize,
        found: usize,
    },
}

impl Error {
    pub(crate) fn config(param: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            param,
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(line: usize, reason: impl Into<String>) -> Self {
        Self::Shape {
            line,
            reason: reason.into(),
        }
    }
}
