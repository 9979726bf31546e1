//! Reference-counted managed heap
//!
//! This is the "gc_system" a module allocates into. Every object starts with a
//! reference count of one, owned by whoever asked for the allocation. Containers
//! (tuples, key-value pairs, named values, wrappers) hold one reference on each
//! child. When a count reaches zero the object is reclaimed and its children are
//! released in turn.
//!
//! A handle's `vtable` word points at a static per-kind descriptor, so a kind
//! check never dereferences the data word.
//!
//! Element and slot accessors (`vm_tuple_get`, `get_vm_value`, `get_vm_key`)
//! hand out borrowed handles: they stay valid while the container holds them.
//! Reference cycles are never reclaimed.

use std::collections::HashSet;
use std::ffi::c_void;
use std::fmt::Write as _;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use clambda_sdk::{GcRef, GcSystem, ValueKind};
use parking_lot::{Mutex, MutexGuard};

/// Payload of a heap object
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean
    Boolean(bool),
    /// The null value
    Null,
    /// Byte sequence
    Bytes(Vec<u8>),
    /// Ordered elements
    Tuple(Vec<GcRef>),
    /// Key-value pair
    KeyVal {
        /// Key slot
        key: GcRef,
        /// Value slot
        value: GcRef,
    },
    /// Named value
    Named {
        /// Name slot
        key: GcRef,
        /// Value slot
        value: GcRef,
    },
    /// Single-slot wrapper
    Wrapper {
        /// Wrapped value
        value: GcRef,
    },
}

impl Object {
    /// Kind of this payload
    pub fn kind(&self) -> ValueKind {
        match self {
            Object::Int(_) => ValueKind::Int,
            Object::Float(_) => ValueKind::Float,
            Object::String(_) => ValueKind::String,
            Object::Boolean(_) => ValueKind::Boolean,
            Object::Null => ValueKind::Null,
            Object::Bytes(_) => ValueKind::Bytes,
            Object::Tuple(_) => ValueKind::Tuple,
            Object::KeyVal { .. } => ValueKind::KeyVal,
            Object::Named { .. } => ValueKind::Named,
            Object::Wrapper { .. } => ValueKind::Wrapper,
        }
    }

    /// Handles this payload holds a reference on
    pub fn children(&self) -> Vec<GcRef> {
        let children = match self {
            Object::Tuple(items) => items.clone(),
            Object::KeyVal { key, value } | Object::Named { key, value } => vec![*key, *value],
            Object::Wrapper { value } => vec![*value],
            _ => Vec::new(),
        };
        children.into_iter().filter(|c| !c.is_null()).collect()
    }
}

// ============================================================================
// Kind descriptors
// ============================================================================

struct KindDescriptor {
    kind: ValueKind,
}

static DESCRIPTORS: [KindDescriptor; 10] = [
    KindDescriptor { kind: ValueKind::Int },
    KindDescriptor { kind: ValueKind::Float },
    KindDescriptor { kind: ValueKind::String },
    KindDescriptor { kind: ValueKind::Boolean },
    KindDescriptor { kind: ValueKind::Null },
    KindDescriptor { kind: ValueKind::Bytes },
    KindDescriptor { kind: ValueKind::Tuple },
    KindDescriptor { kind: ValueKind::KeyVal },
    KindDescriptor { kind: ValueKind::Named },
    KindDescriptor { kind: ValueKind::Wrapper },
];

fn descriptor(kind: ValueKind) -> *mut c_void {
    &DESCRIPTORS[kind.index()] as *const KindDescriptor as *mut c_void
}

/// Kind named by a handle's descriptor word. Never touches the data word.
pub fn kind_of(handle: GcRef) -> Option<ValueKind> {
    if handle.is_null() {
        return None;
    }
    DESCRIPTORS
        .iter()
        .find(|d| ptr::eq(*d as *const KindDescriptor as *const c_void, handle.vtable))
        .map(|d| d.kind)
}

// ============================================================================
// Objects
// ============================================================================

pub(crate) struct HeapObject {
    core: *const HeapCore,
    refcount: AtomicUsize,
    body: Mutex<Object>,
}

impl HeapObject {
    pub(crate) fn body(&self) -> MutexGuard<'_, Object> {
        self.body.lock()
    }
}

/// Resolve a handle to its object.
///
/// # Safety
///
/// A non-null handle with a known descriptor must point at a live object.
pub(crate) unsafe fn object<'a>(handle: GcRef) -> Option<&'a HeapObject> {
    kind_of(handle)?;
    Some(&*(handle.data as *const HeapObject))
}

/// Increment a handle's reference count.
///
/// # Safety
///
/// `handle` must be null or refer to a live object.
pub unsafe fn retain(handle: GcRef) -> bool {
    match object(handle) {
        Some(obj) => {
            obj.refcount.fetch_add(1, Ordering::AcqRel);
            true
        }
        None => false,
    }
}

/// Decrement a handle's reference count, reclaiming the object at zero.
///
/// # Safety
///
/// `handle` must be null or refer to a live object. After the last release
/// the handle dangles.
pub unsafe fn release(handle: GcRef) -> bool {
    let Some(obj) = object(handle) else {
        return false;
    };
    match obj
        .refcount
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1))
    {
        Ok(1) => {
            reclaim(handle.data as *mut HeapObject);
            true
        }
        Ok(_) => true,
        Err(_) => false,
    }
}

unsafe fn reclaim(ptr: *mut HeapObject) {
    let HeapObject { core, body, .. } = *Box::from_raw(ptr);
    // The heap frees every object before its core, so the core outlives us.
    (*core).live.lock().remove(&(ptr as usize));
    for child in body.into_inner().children() {
        release(child);
    }
}

// ============================================================================
// Heap
// ============================================================================

/// State every object points back to. The allocation context handed to
/// modules is the address of this value, which is boxed and never moves.
pub(crate) struct HeapCore {
    live: Mutex<HashSet<usize>>,
}

impl HeapCore {
    pub(crate) fn alloc(&self, object: Object) -> GcRef {
        let kind = object.kind();
        for child in object.children() {
            // SAFETY: children are handles the caller vouches for.
            unsafe { retain(child) };
        }
        let boxed = Box::new(HeapObject {
            core: self as *const HeapCore,
            refcount: AtomicUsize::new(1),
            body: Mutex::new(object),
        });
        let ptr = Box::into_raw(boxed);
        self.live.lock().insert(ptr as usize);
        GcRef::from_raw_parts(ptr.cast(), descriptor(kind))
    }
}

/// The host's managed heap.
pub struct Heap {
    core: Box<HeapCore>,
}

impl Heap {
    /// Create an empty heap
    pub fn new() -> Self {
        Heap {
            core: Box::new(HeapCore {
                live: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Allocation context to hand to module functions
    pub fn gc_system(&self) -> GcSystem {
        GcSystem::from_ptr(&*self.core as *const HeapCore as *mut c_void)
    }

    /// Allocate an object with a reference count of one
    pub fn alloc(&self, object: Object) -> GcRef {
        self.core.alloc(object)
    }

    /// Allocate an integer
    pub fn int(&self, value: i64) -> GcRef {
        self.alloc(Object::Int(value))
    }

    /// Allocate a float
    pub fn float(&self, value: f64) -> GcRef {
        self.alloc(Object::Float(value))
    }

    /// Allocate a string
    pub fn string(&self, value: &str) -> GcRef {
        self.alloc(Object::String(value.to_string()))
    }

    /// Allocate a tuple holding `items`
    pub fn tuple(&self, items: &[GcRef]) -> GcRef {
        self.alloc(Object::Tuple(items.to_vec()))
    }

    /// Number of objects not yet reclaimed
    pub fn live_objects(&self) -> usize {
        self.core.live.lock().len()
    }

    /// True if `handle` refers to a live object of this heap
    pub fn contains(&self, handle: GcRef) -> bool {
        kind_of(handle).is_some() && self.core.live.lock().contains(&(handle.data as usize))
    }

    /// Current reference count
    pub fn refcount(&self, handle: GcRef) -> Option<usize> {
        if !self.contains(handle) {
            return None;
        }
        // SAFETY: membership in the live set means the object exists.
        unsafe { object(handle) }.map(|o| o.refcount.load(Ordering::Acquire))
    }

    /// Copy of an object's payload
    pub fn get(&self, handle: GcRef) -> Option<Object> {
        if !self.contains(handle) {
            return None;
        }
        unsafe { object(handle) }.map(|o| o.body().clone())
    }

    /// Increment a reference count. False for handles this heap does not own.
    pub fn retain(&self, handle: GcRef) -> bool {
        self.contains(handle) && unsafe { retain(handle) }
    }

    /// Decrement a reference count. False for handles this heap does not own.
    pub fn release(&self, handle: GcRef) -> bool {
        self.contains(handle) && unsafe { release(handle) }
    }

    /// Human-readable rendering of a value
    pub fn describe(&self, handle: GcRef) -> String {
        let mut out = String::new();
        self.describe_into(handle, 0, &mut out);
        out
    }

    fn describe_into(&self, handle: GcRef, depth: usize, out: &mut String) {
        if handle.is_null() {
            out.push_str("<null>");
            return;
        }
        if depth > 16 {
            out.push_str("...");
            return;
        }
        let Some(object) = self.get(handle) else {
            out.push_str("<invalid>");
            return;
        };
        match object {
            Object::Int(v) => {
                let _ = write!(out, "{}", v);
            }
            Object::Float(v) => {
                let _ = write!(out, "{:?}", v);
            }
            Object::String(s) => {
                let _ = write!(out, "{:?}", s);
            }
            Object::Boolean(b) => {
                let _ = write!(out, "{}", b);
            }
            Object::Null => out.push_str("null"),
            Object::Bytes(bytes) => {
                let _ = write!(out, "b{:?}", bytes);
            }
            Object::Tuple(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.describe_into(*item, depth + 1, out);
                }
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Object::KeyVal { key, value } => {
                self.describe_into(key, depth + 1, out);
                out.push_str(": ");
                self.describe_into(value, depth + 1, out);
            }
            Object::Named { key, value } => {
                self.describe_into(key, depth + 1, out);
                out.push_str(" => ");
                self.describe_into(value, depth + 1, out);
            }
            Object::Wrapper { value } => {
                out.push_str("wrapper(");
                self.describe_into(value, depth + 1, out);
                out.push(')');
            }
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        let remaining: Vec<usize> = self.core.live.lock().drain().collect();
        if !remaining.is_empty() {
            tracing::debug!(target: "clambda", count = remaining.len(), "freeing objects still alive at heap drop");
        }
        for addr in remaining {
            // SAFETY: every address in the live set came from Box::into_raw and
            // was removed from the set exactly when freed.
            drop(unsafe { Box::from_raw(addr as *mut HeapObject) });
        }
    }
}

/// Resolve the allocation context passed through the C boundary.
///
/// # Safety
///
/// `gc` must be null or come from [`Heap::gc_system`] of a heap that is
/// still alive.
pub(crate) unsafe fn core_from<'a>(gc: *mut c_void) -> Option<&'a HeapCore> {
    (gc as *const HeapCore).as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_kind() {
        let heap = Heap::new();
        let h = heap.float(2.5);
        assert_eq!(kind_of(h), Some(ValueKind::Float));
        assert_eq!(heap.get(h), Some(Object::Float(2.5)));
        assert_eq!(heap.refcount(h), Some(1));
        assert_eq!(heap.live_objects(), 1);
    }

    #[test]
    fn test_null_sentinel_has_no_kind() {
        assert_eq!(kind_of(GcRef::null()), None);
        let heap = Heap::new();
        assert!(!heap.contains(GcRef::null()));
        assert!(!heap.retain(GcRef::null()));
    }

    #[test]
    fn test_release_reclaims_at_zero() {
        let heap = Heap::new();
        let h = heap.int(7);
        assert!(heap.retain(h));
        assert_eq!(heap.refcount(h), Some(2));
        assert!(heap.release(h));
        assert!(heap.contains(h));
        assert!(heap.release(h));
        assert!(!heap.contains(h));
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_container_keeps_children_alive() {
        let heap = Heap::new();
        let a = heap.float(1.0);
        let b = heap.float(2.0);
        let t = heap.tuple(&[a, b]);
        assert_eq!(heap.refcount(a), Some(2));

        heap.release(a);
        heap.release(b);
        assert!(heap.contains(a));
        assert_eq!(heap.live_objects(), 3);

        heap.release(t);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_describe() {
        let heap = Heap::new();
        let k = heap.string("x");
        let v = heap.int(3);
        let kv = heap.alloc(Object::KeyVal { key: k, value: v });
        let one = heap.float(16.0);
        let t = heap.tuple(&[one]);
        assert_eq!(heap.describe(kv), "\"x\": 3");
        assert_eq!(heap.describe(t), "(16.0,)");
        assert_eq!(heap.describe(GcRef::null()), "<null>");
    }

    #[test]
    fn test_self_containing_tuple_describes() {
        let heap = Heap::new();
        let t = heap.tuple(&[]);
        if let Some(obj) = unsafe { object(t) } {
            if let Object::Tuple(items) = &mut *obj.body() {
                items.push(t);
            }
        }
        assert!(heap.describe(t).contains("..."));
    }
}
