//! Native operations published to modules
//!
//! Every function here has the C signature a module expects for the matching
//! lookup name. They never unwind: bad input yields the null sentinel, `0` or
//! `0.0`.

use std::ffi::{c_char, c_double, c_int, c_longlong, c_void, CStr, CString};
use std::slice;

use clambda_sdk::{GcRef, ValueKind};

use crate::heap::{self, core_from, kind_of, Object};

unsafe fn alloc(gc: *mut c_void, object: Object) -> GcRef {
    match core_from(gc) {
        Some(core) => core.alloc(object),
        None => {
            tracing::debug!(target: "clambda", kind = %object.kind(), "allocation without a gc system");
            GcRef::null()
        }
    }
}

fn flag(value: bool) -> c_int {
    c_int::from(value)
}

// ============================================================================
// Constructors
// ============================================================================

/// `new_vm_int64`
pub unsafe extern "C" fn new_vm_int64(value: c_longlong, gc: *mut c_void) -> GcRef {
    alloc(gc, Object::Int(value))
}

/// `new_vm_float64`
pub unsafe extern "C" fn new_vm_float64(value: c_double, gc: *mut c_void) -> GcRef {
    alloc(gc, Object::Float(value))
}

/// `new_vm_string`. Invalid UTF-8 is replaced.
pub unsafe extern "C" fn new_vm_string(value: *const c_char, gc: *mut c_void) -> GcRef {
    if value.is_null() {
        return GcRef::null();
    }
    let text = CStr::from_ptr(value).to_string_lossy().into_owned();
    alloc(gc, Object::String(text))
}

/// `new_vm_boolean`
pub unsafe extern "C" fn new_vm_boolean(value: c_int, gc: *mut c_void) -> GcRef {
    alloc(gc, Object::Boolean(value != 0))
}

/// `new_vm_null`
pub unsafe extern "C" fn new_vm_null(gc: *mut c_void) -> GcRef {
    alloc(gc, Object::Null)
}

/// `new_vm_bytes`. The bytes are copied.
pub unsafe extern "C" fn new_vm_bytes(value: *const u8, len: c_int, gc: *mut c_void) -> GcRef {
    let Ok(len) = usize::try_from(len) else {
        return GcRef::null();
    };
    let bytes = if len == 0 {
        Vec::new()
    } else if value.is_null() {
        return GcRef::null();
    } else {
        slice::from_raw_parts(value, len).to_vec()
    };
    alloc(gc, Object::Bytes(bytes))
}

/// `new_vm_tuple`
pub unsafe extern "C" fn new_vm_tuple(gc: *mut c_void) -> GcRef {
    alloc(gc, Object::Tuple(Vec::new()))
}

/// `new_vm_keyval`
pub unsafe extern "C" fn new_vm_keyval(key: GcRef, value: GcRef, gc: *mut c_void) -> GcRef {
    alloc(gc, Object::KeyVal { key, value })
}

/// `new_vm_named`
pub unsafe extern "C" fn new_vm_named(key: GcRef, value: GcRef, gc: *mut c_void) -> GcRef {
    alloc(gc, Object::Named { key, value })
}

/// `new_vm_wrapper`
pub unsafe extern "C" fn new_vm_wrapper(value: GcRef, gc: *mut c_void) -> GcRef {
    alloc(gc, Object::Wrapper { value })
}

// ============================================================================
// Predicates
// ============================================================================

macro_rules! predicates {
    ($($name:ident => $kind:ident,)+) => {
        $(
            #[doc = concat!("`", stringify!($name), "`. False for the null sentinel.")]
            pub unsafe extern "C" fn $name(handle: GcRef) -> c_int {
                flag(kind_of(handle) == Some(ValueKind::$kind))
            }
        )+
    };
}

predicates! {
    is_vm_int => Int,
    is_vm_float => Float,
    is_vm_string => String,
    is_vm_boolean => Boolean,
    is_vm_null => Null,
    is_vm_bytes => Bytes,
    is_vm_tuple => Tuple,
    is_vm_keyval => KeyVal,
    is_vm_named => Named,
    is_vm_wrapper => Wrapper,
}

// ============================================================================
// Accessors
// ============================================================================

unsafe fn with_object<T>(handle: GcRef, default: T, f: impl FnOnce(&mut Object) -> T) -> T {
    match heap::object(handle) {
        Some(obj) => {
            let mut body = obj.body();
            f(&mut *body)
        }
        None => default,
    }
}

/// `get_vm_int_value`. 0 for anything but an integer.
pub unsafe extern "C" fn get_vm_int_value(handle: GcRef) -> c_longlong {
    with_object(handle, 0, |o| match o {
        Object::Int(v) => *v,
        _ => 0,
    })
}

/// `get_vm_float_value`. Integers are widened.
pub unsafe extern "C" fn get_vm_float_value(handle: GcRef) -> c_double {
    with_object(handle, 0.0, |o| match o {
        Object::Float(v) => *v,
        Object::Int(v) => *v as f64,
        _ => 0.0,
    })
}

/// `get_vm_string_value`. The caller frees the result with `free_vm_string`.
/// The copy stops at an embedded NUL.
pub unsafe extern "C" fn get_vm_string_value(handle: GcRef) -> *mut c_char {
    let text = with_object(handle, None, |o| match o {
        Object::String(s) => Some(s.clone()),
        _ => None,
    });
    let Some(text) = text else {
        return std::ptr::null_mut();
    };
    let bytes: Vec<u8> = text.bytes().take_while(|b| *b != 0).collect();
    match CString::new(bytes) {
        Ok(c) => c.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// `free_vm_string`
pub unsafe extern "C" fn free_vm_string(value: *mut c_char) {
    if !value.is_null() {
        drop(CString::from_raw(value));
    }
}

/// `get_vm_boolean_value`
pub unsafe extern "C" fn get_vm_boolean_value(handle: GcRef) -> c_int {
    with_object(handle, 0, |o| match o {
        Object::Boolean(b) => flag(*b),
        _ => 0,
    })
}

/// `get_vm_key`. Borrowed from the node.
pub unsafe extern "C" fn get_vm_key(handle: GcRef) -> GcRef {
    with_object(handle, GcRef::null(), |o| match o {
        Object::KeyVal { key, .. } | Object::Named { key, .. } => *key,
        _ => GcRef::null(),
    })
}

/// `get_vm_value`. Borrowed from the node.
pub unsafe extern "C" fn get_vm_value(handle: GcRef) -> GcRef {
    with_object(handle, GcRef::null(), |o| match o {
        Object::KeyVal { value, .. } | Object::Named { value, .. } | Object::Wrapper { value } => *value,
        _ => GcRef::null(),
    })
}

/// `set_vm_value`. The node retains the new value and releases the old one.
/// A null value is refused and leaves the slot untouched.
pub unsafe extern "C" fn set_vm_value(target: GcRef, value: GcRef) -> c_int {
    if value.is_null() {
        return 0;
    }
    if !matches!(
        kind_of(target),
        Some(ValueKind::KeyVal | ValueKind::Named | ValueKind::Wrapper)
    ) {
        return 0;
    }
    heap::retain(value);
    let old = with_object(target, GcRef::null(), |o| match o {
        Object::KeyVal { value: slot, .. } | Object::Named { value: slot, .. } | Object::Wrapper { value: slot } => {
            std::mem::replace(slot, value)
        }
        _ => GcRef::null(),
    });
    heap::release(old);
    1
}

// ============================================================================
// Collections
// ============================================================================

/// `vm_tuple_append`. The tuple retains the element.
pub unsafe extern "C" fn vm_tuple_append(tuple: GcRef, value: GcRef) -> c_int {
    if kind_of(tuple) != Some(ValueKind::Tuple) || value.is_null() {
        return 0;
    }
    heap::retain(value);
    with_object(tuple, 0, |o| match o {
        Object::Tuple(items) => {
            items.push(value);
            1
        }
        _ => 0,
    })
}

/// `vm_tuple_get`. Borrowed from the tuple; null when out of range.
pub unsafe extern "C" fn vm_tuple_get(tuple: GcRef, index: c_int, _gc: *mut c_void) -> GcRef {
    let Ok(index) = usize::try_from(index) else {
        return GcRef::null();
    };
    with_object(tuple, GcRef::null(), |o| match o {
        Object::Tuple(items) => items.get(index).copied().unwrap_or_default(),
        _ => GcRef::null(),
    })
}

/// `get_len`. Tuple elements, byte count, or string length in bytes; 0 otherwise.
pub unsafe extern "C" fn get_len(handle: GcRef) -> c_longlong {
    with_object(handle, 0, |o| match o {
        Object::Tuple(items) => items.len() as c_longlong,
        Object::Bytes(bytes) => bytes.len() as c_longlong,
        Object::String(s) => s.len() as c_longlong,
        _ => 0,
    })
}

// ============================================================================
// Lifetime
// ============================================================================

/// `clone_ref`
pub unsafe extern "C" fn clone_ref(handle: GcRef) -> c_int {
    flag(heap::retain(handle))
}

/// `drop_ref`
pub unsafe extern "C" fn drop_ref(handle: GcRef) -> c_int {
    flag(heap::release(handle))
}
