//! Reference host for clambda extension modules
//!
//! Owns the managed heap modules allocate into, publishes the native
//! operations by name through [`host_lookup`], and loads extension libraries.
//!
//! # Example
//!
//! ```ignore
//! use clambda_host::{Extension, Heap};
//!
//! let heap = Heap::new();
//! let ext = Extension::load("./libclambda_math.so")?;
//! let x = heap.float(16.0);
//! let args = heap.tuple(&[x]);
//! let result = ext.call("sqrt", args, &heap)?;
//! println!("{}", heap.describe(result));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod heap;
pub mod loader;
pub mod ops;
pub mod registry;

pub use error::LoadError;
pub use heap::{Heap, Object};
pub use loader::{Extension, Library};
pub use registry::host_lookup;

/// Activate the in-process module side of `clambda-sdk` against this host.
///
/// Used when a module is linked statically instead of loaded as a library.
pub fn activate_in_process() {
    // SAFETY: host_lookup honors the resolver contract for the process lifetime.
    unsafe { clambda_sdk::activate(host_lookup) };
}

/// A bridge bound directly to this host, independent of the global module slot
pub fn bridge() -> clambda_sdk::Bridge {
    // SAFETY: as above.
    unsafe { clambda_sdk::Bridge::new(host_lookup) }
}
