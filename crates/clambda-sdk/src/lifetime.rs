//! Lifetime protocol: explicit retain / release
//!
//! The bridge never pairs these calls for you. [`Retained`] is the scoped form:
//! it retains on construction and releases on drop, so a handle that must
//! outlive the call that produced it is held by exactly one owner.

use std::ffi::c_int;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;

use crate::error::{degrade, BridgeError, BridgeResult};
use crate::gateway::{native_call, Bridge};
use crate::handle::GcRef;
use crate::symbol::Symbol;

impl Bridge {
    /// Increment the referent's reference count
    pub fn try_retain(&self, handle: GcRef) -> BridgeResult<bool> {
        let done: c_int = native_call!(self, Symbol::CloneRef, fn(GcRef) -> c_int, (handle))?;
        Ok(done != 0)
    }

    /// Increment the reference count; false on failure
    pub fn retain(&self, handle: GcRef) -> bool {
        degrade(self.try_retain(handle))
    }

    /// Decrement the referent's reference count. The host may reclaim the
    /// object once the count reaches zero.
    pub fn try_release(&self, handle: GcRef) -> BridgeResult<bool> {
        let done: c_int = native_call!(self, Symbol::DropRef, fn(GcRef) -> c_int, (handle))?;
        Ok(done != 0)
    }

    /// Decrement the reference count; false on failure
    pub fn release(&self, handle: GcRef) -> bool {
        degrade(self.try_release(handle))
    }
}

/// Owner of one retain on a handle.
///
/// Dropping it issues the matching release.
#[derive(Debug)]
pub struct Retained<'b> {
    bridge: &'b Bridge,
    handle: GcRef,
}

impl<'b> Retained<'b> {
    /// Retain `handle` and take ownership of that retain
    pub fn new(bridge: &'b Bridge, handle: GcRef) -> BridgeResult<Self> {
        if !bridge.try_retain(handle)? {
            return Err(BridgeError::ArgumentError(format!(
                "{} refused {:?}",
                Symbol::CloneRef,
                handle
            )));
        }
        Ok(Retained { bridge, handle })
    }

    /// Adopt a retain the caller already holds (for example a fresh
    /// constructor result the host issued with a count of one).
    ///
    /// # Safety
    ///
    /// The caller must own one outstanding retain on `handle` and must not
    /// release it elsewhere.
    pub unsafe fn adopt(bridge: &'b Bridge, handle: GcRef) -> Self {
        Retained { bridge, handle }
    }

    /// The retained handle
    pub fn handle(&self) -> GcRef {
        self.handle
    }

    /// A non-owning view that cannot outlive this owner
    pub fn borrow(&self) -> Borrowed<'_> {
        Borrowed {
            handle: self.handle,
            _owner: PhantomData,
        }
    }

    /// Give up ownership without releasing. The caller now owes the release.
    pub fn into_raw(self) -> GcRef {
        let this = ManuallyDrop::new(self);
        this.handle
    }
}

impl Drop for Retained<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.bridge.try_release(self.handle) {
            tracing::warn!(target: "clambda", "release of {:?} failed: {}", self.handle, err);
        }
    }
}

/// Non-owning view of a handle whose lifetime is held elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct Borrowed<'a> {
    handle: GcRef,
    _owner: PhantomData<&'a GcRef>,
}

impl Borrowed<'_> {
    /// The viewed handle
    pub fn handle(&self) -> GcRef {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_lifetime_defaults() {
        let bridge = Bridge::detached();
        assert!(!bridge.retain(GcRef::null()));
        assert!(!bridge.release(GcRef::null()));
    }

    #[test]
    fn test_retained_requires_reachable_host() {
        let bridge = Bridge::detached();
        assert_eq!(
            Retained::new(&bridge, GcRef::null()).err(),
            Some(BridgeError::NotActive)
        );
    }

    #[test]
    fn test_into_raw_skips_release() {
        let bridge = Bridge::detached();
        // Adopting on a detached bridge is harmless: no call is made until drop,
        // and into_raw suppresses that.
        let owned = unsafe { Retained::adopt(&bridge, GcRef::null()) };
        assert!(owned.borrow().handle().is_null());
        assert!(owned.into_raw().is_null());
    }
}
