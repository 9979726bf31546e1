//! CLambda SDK - bridge for writing extension modules
//!
//! An extension module (a "clambda") is a shared library that manipulates values
//! living in the host runtime's managed heap without linking against the host.
//! The host hands the module a lookup function when it activates it; every
//! operation afterwards is resolved by name through that function and invoked
//! indirectly.
//!
//! # Example
//!
//! ```ignore
//! use clambda_sdk::{Bridge, GcRef, GcSystem, Tuple};
//!
//! fn double(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
//!     let Ok(tuple) = Tuple::wrap(bridge, args, gc) else {
//!         return GcRef::null();
//!     };
//!     match tuple.get_f64(0) {
//!         Ok(x) => bridge.new_float(x * 2.0, gc),
//!         Err(_) => GcRef::null(),
//!     }
//! }
//!
//! clambda_sdk::export_module!();
//! clambda_sdk::export_functions! {
//!     clambda_double => double,
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod gateway;
pub mod handle;
pub mod lifetime;
mod macros;
pub mod module;
pub mod resolver;
pub mod symbol;
pub mod tuple;
pub mod value;

pub use error::{BridgeError, BridgeResult, Degraded};
pub use gateway::Bridge;
pub use handle::{GcRef, GcSystem};
pub use lifetime::{Borrowed, Retained};
pub use module::{activate, activate_with, bridge, deactivate, state, ModuleState};
pub use resolver::{BridgeOptions, LookupFn, Resolution, Resolver};
pub use symbol::Symbol;
pub use tuple::Tuple;
pub use value::ValueKind;

/// Name of the activation entry point every extension module exports
pub const ENTRY_SYMBOL: &str = "clambda_entry";

/// Name of the deactivation entry point every extension module exports
pub const DESTROY_SYMBOL: &str = "clambda_destroy";

/// Name of the manifest symbol listing a module's exported functions
pub const MANIFEST_SYMBOL: &str = "clambda_functions";

/// Prefix of every exported module function symbol
pub const FUNCTION_PREFIX: &str = "clambda_";
