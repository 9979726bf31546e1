//! Module lifecycle
//!
//! ```text
//! Uninitialized --activate--> Active --deactivate--> Inactive
//!                               ^                       |
//!                               +-------activate--------+
//! ```
//!
//! The resolver lives in a process-wide slot guarded by a read-mostly lock.
//! Activation must happen before any concurrent use of the module begins; the
//! lock keeps reads sound but does not order activation against callers.
//! Deactivation does not touch outstanding handles.

use std::ffi::c_void;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::gateway::Bridge;
use crate::resolver::{BridgeOptions, LookupFn, Resolver};

/// Lifecycle state of the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Never activated
    Uninitialized,
    /// A resolver is installed
    Active,
    /// Deactivated; behaves exactly like `Uninitialized`
    Inactive,
}

struct Slot {
    state: ModuleState,
    resolver: Option<Arc<Resolver>>,
}

static SLOT: RwLock<Slot> = parking_lot::const_rwlock(Slot {
    state: ModuleState::Uninitialized,
    resolver: None,
});

/// Install the host's resolver with default options.
///
/// # Safety
///
/// See [`Resolver::new`]. Must happen-before every call that expects the
/// module to be active.
pub unsafe fn activate(lookup: LookupFn) {
    activate_with(lookup, BridgeOptions::default());
}

/// Install the host's resolver.
///
/// Re-activating replaces the previous resolver.
///
/// # Safety
///
/// See [`activate`].
pub unsafe fn activate_with(lookup: LookupFn, options: BridgeOptions) {
    let resolver = Arc::new(Resolver::with_options(lookup, options));
    let mut slot = SLOT.write();
    slot.resolver = Some(resolver);
    slot.state = ModuleState::Active;
    tracing::debug!(target: "clambda", resolution = ?options.resolution, "module activated");
}

/// Clear the resolver. Every later gateway call degrades.
pub fn deactivate() {
    let mut slot = SLOT.write();
    slot.resolver = None;
    if slot.state == ModuleState::Active {
        slot.state = ModuleState::Inactive;
    }
    tracing::debug!(target: "clambda", "module deactivated");
}

/// Current lifecycle state
pub fn state() -> ModuleState {
    SLOT.read().state
}

/// True while a resolver is installed
pub fn is_active() -> bool {
    state() == ModuleState::Active
}

/// Snapshot of the installed resolver as a [`Bridge`].
///
/// Detached when the module is not active. The snapshot keeps working with
/// the resolver it captured even if the module is deactivated meanwhile.
pub fn bridge() -> Bridge {
    match &SLOT.read().resolver {
        Some(resolver) => Bridge::from_resolver(Arc::clone(resolver)),
        None => Bridge::detached(),
    }
}

/// Body of the `clambda_entry` export.
///
/// A null lookup pointer leaves the module inactive. Always returns null.
///
/// # Safety
///
/// `lookup` must be null or a function with the [`LookupFn`] signature that
/// honors the [`Resolver::new`] contract.
#[doc(hidden)]
pub unsafe fn entry(lookup: *mut c_void, options: BridgeOptions) -> *mut c_void {
    if lookup.is_null() {
        tracing::warn!(target: "clambda", "clambda_entry called without a lookup function");
        deactivate();
    } else {
        let lookup = std::mem::transmute::<*mut c_void, LookupFn>(lookup);
        activate_with(lookup, options);
    }
    std::ptr::null_mut()
}

/// Report a panic caught at an exported function boundary.
#[doc(hidden)]
pub fn report_panic(symbol: &str) -> crate::handle::GcRef {
    tracing::error!(target: "clambda", "{} panicked", symbol);
    crate::handle::GcRef::null()
}
