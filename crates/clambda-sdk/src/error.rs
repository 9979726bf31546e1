//! Error types for the bridge
//!
//! Internally every gateway call returns a [`BridgeResult`], so callers can tell
//! a legitimate zero apart from a failed call. The flat public surface collapses
//! errors into the legacy defaults described by [`Degraded`].

use crate::handle::GcRef;

/// Result type for gateway calls
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// No resolver is installed
    #[error("rust_lookup not initialized: module is not active")]
    NotActive,

    /// The resolver does not know the operation
    #[error("Function not found: {symbol}")]
    SymbolNotFound {
        /// Lookup name that failed
        symbol: &'static str,
    },

    /// A handle was not of the expected kind
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected kind name
        expected: &'static str,
        /// Actual kind name
        got: &'static str,
    },

    /// Tuple index outside `0..len`
    #[error("Index {index} out of range for tuple of length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
        /// Tuple length
        len: i64,
    },

    /// The host answered with the null sentinel
    #[error("{symbol} returned a null handle")]
    NullResult {
        /// Operation that returned null
        symbol: &'static str,
    },

    /// Argument could not be marshalled across the boundary
    #[error("Argument error: {0}")]
    ArgumentError(String),
}

impl BridgeError {
    /// True for failures to reach the host at all
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::NotActive | BridgeError::SymbolNotFound { .. }
        )
    }
}

/// The value a flat call returns in place of an error.
pub trait Degraded {
    /// The documented default
    fn degraded() -> Self;
}

impl Degraded for GcRef {
    fn degraded() -> Self {
        GcRef::null()
    }
}

impl Degraded for bool {
    fn degraded() -> Self {
        false
    }
}

impl Degraded for i64 {
    fn degraded() -> Self {
        0
    }
}

impl Degraded for f64 {
    fn degraded() -> Self {
        0.0
    }
}

impl<T> Degraded for Option<T> {
    fn degraded() -> Self {
        None
    }
}

/// Collapse a tagged result into the legacy convention, reporting the failure.
pub(crate) fn degrade<T: Degraded>(result: BridgeResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(target: "clambda", "{}", err);
            T::degraded()
        }
    }
}
