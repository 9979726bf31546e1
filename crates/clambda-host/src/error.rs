//! Host-side errors

use thiserror::Error;

/// Errors raised while loading or driving an extension module
#[derive(Debug, Error)]
pub enum LoadError {
    /// Library file not found or could not be loaded
    #[error("Library not found: {path}")]
    NotFound {
        /// Path that was attempted
        path: String,
    },

    /// Symbol not found in library
    #[error("Symbol not found: {symbol} in {library}")]
    SymbolNotFound {
        /// Symbol name that was not found
        symbol: String,
        /// Library path
        library: String,
    },

    /// The activation entry point misbehaved
    #[error("Invalid module initialization: {0}")]
    InvalidInit(String),

    /// Platform-specific error
    #[error("Platform error: {0}")]
    PlatformError(String),

    /// Invalid path encoding
    #[error("Invalid UTF-8 in path: {0}")]
    InvalidPath(String),

    /// A function was called on a module that is not active
    #[error("Module {library} is not active")]
    NotActive {
        /// Library path
        library: String,
    },

    /// A module function returned the null sentinel
    #[error("{function} returned null")]
    NullResult {
        /// Exported symbol that was called
        function: String,
    },

    /// The name maps onto a lifecycle or manifest entry point
    #[error("{symbol} is a reserved entry point, not a module function")]
    ReservedSymbol {
        /// Symbol the name resolved to
        symbol: String,
    },

    /// The module's manifest does not list the function
    #[error("{function} is not exported by {library}")]
    UnknownFunction {
        /// Requested function name
        function: String,
        /// Library path
        library: String,
    },
}
