//! Reference handles crossing the module boundary
//!
//! A [`GcRef`] is the host's fat pointer split into its two words: the object
//! data address and the address of the object's type descriptor. It carries no
//! ownership. Copying a handle never clones the referent; only
//! [`Bridge::retain`](crate::Bridge::retain) extends its lifetime.

use std::ffi::c_void;
use std::fmt;
use std::ptr;

/// Opaque reference to a value owned by the host heap.
///
/// Both words null is the "no value" sentinel returned by every degraded
/// handle-producing call. Equality is identity: two handles are equal when
/// both addresses match, regardless of what the referents contain.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GcRef {
    /// Address of the object data
    pub data: *mut c_void,
    /// Address of the object's type descriptor
    pub vtable: *mut c_void,
}

// Handles are plain addresses; the host heap decides what may touch the referent.
unsafe impl Send for GcRef {}
unsafe impl Sync for GcRef {}

impl GcRef {
    /// The null sentinel
    #[inline]
    pub const fn null() -> Self {
        GcRef {
            data: ptr::null_mut(),
            vtable: ptr::null_mut(),
        }
    }

    /// Build a handle from its two words
    #[inline]
    pub const fn from_raw_parts(data: *mut c_void, vtable: *mut c_void) -> Self {
        GcRef { data, vtable }
    }

    /// True for the null sentinel (and for any handle with a null data word)
    #[inline]
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }
}

impl Default for GcRef {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for GcRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "GcRef::Null")
        } else {
            write!(f, "GcRef({:p}, {:p})", self.data, self.vtable)
        }
    }
}

/// Allocation context token ("gc_system").
///
/// Identifies which host heap a constructor allocates into. The module never
/// dereferences it; it is only passed back to the host.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GcSystem(*mut c_void);

unsafe impl Send for GcSystem {}
unsafe impl Sync for GcSystem {}

impl GcSystem {
    /// A context that names no heap
    pub const fn null() -> Self {
        GcSystem(ptr::null_mut())
    }

    /// Wrap the raw pointer received from the host
    pub const fn from_ptr(ptr: *mut c_void) -> Self {
        GcSystem(ptr)
    }

    /// The raw pointer to pass back to the host
    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }

    /// True if no heap is named
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}
