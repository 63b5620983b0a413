//! Typed errors raised by the symmetry-detection pipeline.
//!
//! Only failures that abort a task are errors. A map without detectable symmetry, a requested
//! symmetry that cannot be confirmed, or generators that fail to close into a finite group are
//! reported as ordinary values by the stages that encounter them.

use thiserror::Error;

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;

/// No input structures were supplied.
pub const ES_NO_STRUCTURES: &str = "ES00028";
/// The axis comparison tolerance is negative.
pub const ES_NEGATIVE_AXIS_TOLERANCE: &str = "ES00053";
/// The resolution is not a positive finite number.
pub const ES_INVALID_RESOLUTION: &str = "ES00100";
/// A threshold lies outside its domain.
pub const ES_INVALID_THRESHOLD: &str = "ES00101";
/// The map is too small to hold the minimal number of shells.
pub const ES_MAP_TOO_SMALL: &str = "ES00102";
/// The requested symmetry type is not one of `C`, `D`, `T`, `O` or `I`.
pub const ES_INVALID_REQUESTED_SYMMETRY: &str = "ES00103";
/// The requested fold is inconsistent with the requested symmetry type.
pub const ES_INVALID_REQUESTED_FOLD: &str = "ES00104";
/// The volume map itself is malformed.
pub const ES_INVALID_MAP: &str = "ES00105";
/// The requested symmetry, or any symmetry at all, could not be detected. This is a warning.
pub const WS_SYMMETRY_NOT_FOUND: &str = "WS00041";
/// A buffer size cannot be represented.
pub const EA_SIZE_OVERFLOW: &str = "EA00001";
/// A buffer could not be allocated.
pub const EA_ALLOCATION_FAILED: &str = "EA00002";

/// An enumerated type for fatal errors in the symmetry-detection pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapSymError {
    /// Missing or invalid settings, detected eagerly before any computation.
    #[error("[{code}] Configuration error: {message}")]
    Configuration {
        /// The stable code identifying the error.
        code: &'static str,
        /// A human-readable description.
        message: String,
    },

    /// A transform workspace or a coefficient buffer could not be allocated.
    #[error("[{code}] Allocation failure: {message}")]
    Allocation {
        /// The stable code identifying the error.
        code: &'static str,
        /// A human-readable description.
        message: String,
    },
}

impl MapSymError {
    /// Constructs a configuration error.
    pub fn configuration(code: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
        }
    }

    /// Constructs an allocation error.
    pub fn allocation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Allocation {
            code,
            message: message.into(),
        }
    }

    /// Returns the stable code of this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { code, .. } | Self::Allocation { code, .. } => *code,
        }
    }
}

/// Allocates a vector of `len` copies of `value`, reporting an allocation failure instead of
/// aborting.
///
/// # Errors
///
/// Returns [`MapSymError::Allocation`] if the memory cannot be reserved.
pub fn try_filled_vec<T: Clone>(len: usize, value: T, what: &str) -> Result<Vec<T>, MapSymError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|err| {
        MapSymError::allocation(
            EA_ALLOCATION_FAILED,
            format!("Unable to allocate {len} elements for {what}: {err}."),
        )
    })?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Multiplies buffer dimensions, reporting an overflow as an allocation error.
///
/// # Errors
///
/// Returns [`MapSymError::Allocation`] if the product does not fit in a `usize`.
pub fn checked_size(dims: &[usize], what: &str) -> Result<usize, MapSymError> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            MapSymError::allocation(
                EA_SIZE_OVERFLOW,
                format!("The size of {what} with dimensions {dims:?} overflows."),
            )
        })
}
