//! Name table behind the host's lookup function

use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr};

use clambda_sdk::Symbol;
use once_cell::sync::Lazy;

use crate::ops;

/// Address of a native operation
#[derive(Clone, Copy)]
struct EntryPoint(*mut c_void);

// SAFETY: function addresses are immutable and valid for the process lifetime.
unsafe impl Send for EntryPoint {}
unsafe impl Sync for EntryPoint {}

static TABLE: Lazy<HashMap<&'static str, EntryPoint>> = Lazy::new(|| {
    Symbol::ALL
        .iter()
        .map(|symbol| (symbol.name(), EntryPoint(entry_point(*symbol))))
        .collect()
});

/// Address of the host implementation of `symbol`
pub fn entry_point(symbol: Symbol) -> *mut c_void {
    match symbol {
        Symbol::NewInt64 => ops::new_vm_int64 as *mut c_void,
        Symbol::NewFloat64 => ops::new_vm_float64 as *mut c_void,
        Symbol::NewString => ops::new_vm_string as *mut c_void,
        Symbol::NewBoolean => ops::new_vm_boolean as *mut c_void,
        Symbol::NewNull => ops::new_vm_null as *mut c_void,
        Symbol::NewBytes => ops::new_vm_bytes as *mut c_void,
        Symbol::NewTuple => ops::new_vm_tuple as *mut c_void,
        Symbol::NewKeyVal => ops::new_vm_keyval as *mut c_void,
        Symbol::NewNamed => ops::new_vm_named as *mut c_void,
        Symbol::NewWrapper => ops::new_vm_wrapper as *mut c_void,
        Symbol::IsInt => ops::is_vm_int as *mut c_void,
        Symbol::IsFloat => ops::is_vm_float as *mut c_void,
        Symbol::IsString => ops::is_vm_string as *mut c_void,
        Symbol::IsBoolean => ops::is_vm_boolean as *mut c_void,
        Symbol::IsNull => ops::is_vm_null as *mut c_void,
        Symbol::IsBytes => ops::is_vm_bytes as *mut c_void,
        Symbol::IsTuple => ops::is_vm_tuple as *mut c_void,
        Symbol::IsKeyVal => ops::is_vm_keyval as *mut c_void,
        Symbol::IsNamed => ops::is_vm_named as *mut c_void,
        Symbol::IsWrapper => ops::is_vm_wrapper as *mut c_void,
        Symbol::IntValue => ops::get_vm_int_value as *mut c_void,
        Symbol::FloatValue => ops::get_vm_float_value as *mut c_void,
        Symbol::StringValue => ops::get_vm_string_value as *mut c_void,
        Symbol::BooleanValue => ops::get_vm_boolean_value as *mut c_void,
        Symbol::FreeString => ops::free_vm_string as *mut c_void,
        Symbol::TupleAppend => ops::vm_tuple_append as *mut c_void,
        Symbol::TupleGet => ops::vm_tuple_get as *mut c_void,
        Symbol::GetValue => ops::get_vm_value as *mut c_void,
        Symbol::GetKey => ops::get_vm_key as *mut c_void,
        Symbol::SetValue => ops::set_vm_value as *mut c_void,
        Symbol::GetLen => ops::get_len as *mut c_void,
        Symbol::CloneRef => ops::clone_ref as *mut c_void,
        Symbol::DropRef => ops::drop_ref as *mut c_void,
    }
}

/// Find an operation by name
pub fn lookup(name: &str) -> Option<*mut c_void> {
    TABLE.get(name).map(|entry| entry.0)
}

/// Names the host publishes
pub fn names() -> impl Iterator<Item = &'static str> {
    Symbol::ALL.iter().map(|s| s.name())
}

/// The lookup function handed to modules at activation.
///
/// Returns null for unknown names and for a null or non-UTF-8 name.
///
/// # Safety
///
/// `name` must be null or a NUL-terminated string.
pub unsafe extern "C" fn host_lookup(name: *const c_char) -> *mut c_void {
    if name.is_null() {
        return std::ptr::null_mut();
    }
    let Ok(name) = CStr::from_ptr(name).to_str() else {
        return std::ptr::null_mut();
    };
    match lookup(name) {
        Some(address) => address,
        None => {
            tracing::debug!(target: "clambda", "Function not found: {}", name);
            std::ptr::null_mut()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_symbol_is_published() {
        for symbol in Symbol::ALL {
            let address = unsafe { host_lookup(symbol.name_with_nul().as_ptr().cast()) };
            assert!(!address.is_null(), "{} missing", symbol);
        }
        assert_eq!(names().count(), Symbol::COUNT);
    }

    #[test]
    fn test_unknown_names() {
        assert!(lookup("vm_nonexistent").is_none());
        assert!(unsafe { host_lookup(c"vm_nonexistent".as_ptr()) }.is_null());
        assert!(unsafe { host_lookup(std::ptr::null()) }.is_null());
    }

    #[test]
    fn test_addresses_are_distinct() {
        let a = lookup("is_vm_int");
        let b = lookup("is_vm_float");
        assert!(a.is_some());
        assert_ne!(a, b);
    }
}
