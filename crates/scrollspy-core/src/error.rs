#![forbid(unsafe_code)]

//! Error types for observer creation and option validation.

use core::fmt;

/// Failure reported by the platform visibility-observation capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverError {
    /// The platform refused to create the observer (e.g. malformed root margin).
    Create(String),
    /// Registering a target with an existing observer failed.
    Observe(String),
}

impl fmt::Display for ObserverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(msg) => write!(f, "failed to create observer: {msg}"),
            Self::Observe(msg) => write!(f, "failed to observe target: {msg}"),
        }
    }
}

impl std::error::Error for ObserverError {}

/// Offset values rejected by [`ScrollspyOptions::validate`](crate::ScrollspyOptions::validate).
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsError {
    NegativeOffset(f64),
    NonFiniteOffset(f64),
    NonNumericOffset(String),
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeOffset(v) => write!(f, "offset must be >= 0, got {v}"),
            Self::NonFiniteOffset(v) => write!(f, "offset must be finite, got {v}"),
            Self::NonNumericOffset(raw) => write!(f, "offset must be a number, got {raw:?}"),
        }
    }
}

impl std::error::Error for OptionsError {}
