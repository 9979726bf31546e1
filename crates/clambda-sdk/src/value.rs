//! Value protocol: constructors, kind predicates and accessors
//!
//! Each operation comes in two shapes. `try_*` returns a [`BridgeResult`] so the
//! caller can tell a failed call from a legitimate zero. The plain form returns
//! the legacy default (null handle, `0`, `0.0`, `false`, `None`) and reports
//! the failure on the diagnostic channel.
//!
//! Accessors do not check the kind of their argument before delegating to the
//! host. Check with a predicate first.

use std::ffi::{c_char, c_double, c_int, c_longlong, c_void, CStr, CString};
use std::fmt;

use crate::error::{degrade, BridgeError, BridgeResult};
use crate::gateway::{native_call, Bridge};
use crate::handle::{GcRef, GcSystem};
use crate::symbol::Symbol;

/// Dynamic kind of a host value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    String,
    /// Boolean
    Boolean,
    /// The null value
    Null,
    /// Byte sequence
    Bytes,
    /// Growable ordered sequence
    Tuple,
    /// Key-value pair
    KeyVal,
    /// Named value
    Named,
    /// Single-slot wrapper
    Wrapper,
}

impl ValueKind {
    /// Every kind, in classification order
    pub const ALL: [ValueKind; 10] = [
        ValueKind::Int,
        ValueKind::Float,
        ValueKind::String,
        ValueKind::Boolean,
        ValueKind::Null,
        ValueKind::Bytes,
        ValueKind::Tuple,
        ValueKind::KeyVal,
        ValueKind::Named,
        ValueKind::Wrapper,
    ];

    /// Position in [`ValueKind::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lower-case kind name
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::Null => "null",
            ValueKind::Bytes => "bytes",
            ValueKind::Tuple => "tuple",
            ValueKind::KeyVal => "keyval",
            ValueKind::Named => "named",
            ValueKind::Wrapper => "wrapper",
        }
    }

    /// The host predicate that recognizes this kind
    pub const fn predicate(self) -> Symbol {
        match self {
            ValueKind::Int => Symbol::IsInt,
            ValueKind::Float => Symbol::IsFloat,
            ValueKind::String => Symbol::IsString,
            ValueKind::Boolean => Symbol::IsBoolean,
            ValueKind::Null => Symbol::IsNull,
            ValueKind::Bytes => Symbol::IsBytes,
            ValueKind::Tuple => Symbol::IsTuple,
            ValueKind::KeyVal => Symbol::IsKeyVal,
            ValueKind::Named => Symbol::IsNamed,
            ValueKind::Wrapper => Symbol::IsWrapper,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Bridge {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Allocate an integer
    pub fn try_new_int(&self, value: i64, gc: GcSystem) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::NewInt64, fn(c_longlong, *mut c_void) -> GcRef, (value, gc.as_ptr()))
    }

    /// Allocate an integer, or the null sentinel
    pub fn new_int(&self, value: i64, gc: GcSystem) -> GcRef {
        degrade(self.try_new_int(value, gc))
    }

    /// Allocate a float
    pub fn try_new_float(&self, value: f64, gc: GcSystem) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::NewFloat64, fn(c_double, *mut c_void) -> GcRef, (value, gc.as_ptr()))
    }

    /// Allocate a float, or the null sentinel
    pub fn new_float(&self, value: f64, gc: GcSystem) -> GcRef {
        degrade(self.try_new_float(value, gc))
    }

    /// Allocate a string. The host copies the text.
    pub fn try_new_string(&self, value: &str, gc: GcSystem) -> BridgeResult<GcRef> {
        let text = CString::new(value)
            .map_err(|_| BridgeError::ArgumentError("string contains a NUL byte".to_string()))?;
        native_call!(self, Symbol::NewString, fn(*const c_char, *mut c_void) -> GcRef, (text.as_ptr(), gc.as_ptr()))
    }

    /// Allocate a string, or the null sentinel
    pub fn new_string(&self, value: &str, gc: GcSystem) -> GcRef {
        degrade(self.try_new_string(value, gc))
    }

    /// Allocate a boolean
    pub fn try_new_boolean(&self, value: bool, gc: GcSystem) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::NewBoolean, fn(c_int, *mut c_void) -> GcRef, (c_int::from(value), gc.as_ptr()))
    }

    /// Allocate a boolean, or the null sentinel
    pub fn new_boolean(&self, value: bool, gc: GcSystem) -> GcRef {
        degrade(self.try_new_boolean(value, gc))
    }

    /// Allocate the null value. Not the same thing as the null sentinel.
    pub fn try_new_null(&self, gc: GcSystem) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::NewNull, fn(*mut c_void) -> GcRef, (gc.as_ptr()))
    }

    /// Allocate the null value, or the null sentinel
    pub fn new_null(&self, gc: GcSystem) -> GcRef {
        degrade(self.try_new_null(gc))
    }

    /// Allocate a byte sequence. The host copies the bytes.
    pub fn try_new_bytes(&self, value: &[u8], gc: GcSystem) -> BridgeResult<GcRef> {
        let len = c_int::try_from(value.len())
            .map_err(|_| BridgeError::ArgumentError(format!("{} bytes exceed the C int range", value.len())))?;
        native_call!(self, Symbol::NewBytes, fn(*const u8, c_int, *mut c_void) -> GcRef, (value.as_ptr(), len, gc.as_ptr()))
    }

    /// Allocate a byte sequence, or the null sentinel
    pub fn new_bytes(&self, value: &[u8], gc: GcSystem) -> GcRef {
        degrade(self.try_new_bytes(value, gc))
    }

    /// Allocate an empty tuple
    pub fn try_new_tuple(&self, gc: GcSystem) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::NewTuple, fn(*mut c_void) -> GcRef, (gc.as_ptr()))
    }

    /// Allocate an empty tuple, or the null sentinel
    pub fn new_tuple(&self, gc: GcSystem) -> GcRef {
        degrade(self.try_new_tuple(gc))
    }

    /// Allocate a key-value pair
    pub fn try_new_keyval(&self, key: GcRef, value: GcRef, gc: GcSystem) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::NewKeyVal, fn(GcRef, GcRef, *mut c_void) -> GcRef, (key, value, gc.as_ptr()))
    }

    /// Allocate a key-value pair, or the null sentinel
    pub fn new_keyval(&self, key: GcRef, value: GcRef, gc: GcSystem) -> GcRef {
        degrade(self.try_new_keyval(key, value, gc))
    }

    /// Allocate a named value
    pub fn try_new_named(&self, key: GcRef, value: GcRef, gc: GcSystem) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::NewNamed, fn(GcRef, GcRef, *mut c_void) -> GcRef, (key, value, gc.as_ptr()))
    }

    /// Allocate a named value, or the null sentinel
    pub fn new_named(&self, key: GcRef, value: GcRef, gc: GcSystem) -> GcRef {
        degrade(self.try_new_named(key, value, gc))
    }

    /// Allocate a wrapper around `value`
    pub fn try_new_wrapper(&self, value: GcRef, gc: GcSystem) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::NewWrapper, fn(GcRef, *mut c_void) -> GcRef, (value, gc.as_ptr()))
    }

    /// Allocate a wrapper, or the null sentinel
    pub fn new_wrapper(&self, value: GcRef, gc: GcSystem) -> GcRef {
        degrade(self.try_new_wrapper(value, gc))
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Ask the host whether `handle` is of `kind`
    pub fn try_is_kind(&self, handle: GcRef, kind: ValueKind) -> BridgeResult<bool> {
        let answer: c_int = native_call!(self, kind.predicate(), fn(GcRef) -> c_int, (handle))?;
        Ok(answer != 0)
    }

    /// True if `handle` is of `kind`; false when the host cannot say
    pub fn is_kind(&self, handle: GcRef, kind: ValueKind) -> bool {
        degrade(self.try_is_kind(handle, kind))
    }

    /// Integer predicate
    pub fn is_int(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::Int)
    }

    /// Float predicate
    pub fn is_float(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::Float)
    }

    /// String predicate
    pub fn is_string(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::String)
    }

    /// Boolean predicate
    pub fn is_boolean(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::Boolean)
    }

    /// Null-value predicate. False for the null sentinel.
    pub fn is_null(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::Null)
    }

    /// Bytes predicate
    pub fn is_bytes(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::Bytes)
    }

    /// Tuple predicate
    pub fn is_tuple(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::Tuple)
    }

    /// Key-value predicate
    pub fn is_keyval(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::KeyVal)
    }

    /// Named-value predicate
    pub fn is_named(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::Named)
    }

    /// Wrapper predicate
    pub fn is_wrapper(&self, handle: GcRef) -> bool {
        self.is_kind(handle, ValueKind::Wrapper)
    }

    /// Classify a handle by asking each predicate in turn.
    ///
    /// `Ok(None)` means no predicate recognized it (the null sentinel, for one).
    pub fn try_kind_of(&self, handle: GcRef) -> BridgeResult<Option<ValueKind>> {
        for kind in ValueKind::ALL {
            if self.try_is_kind(handle, kind)? {
                return Ok(Some(kind));
            }
        }
        Ok(None)
    }

    /// Classify a handle; `None` if unclassifiable or the host is unreachable
    pub fn kind_of(&self, handle: GcRef) -> Option<ValueKind> {
        degrade(self.try_kind_of(handle))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Integer payload
    pub fn try_int_value(&self, handle: GcRef) -> BridgeResult<i64> {
        native_call!(self, Symbol::IntValue, fn(GcRef) -> c_longlong, (handle))
    }

    /// Integer payload, or 0
    pub fn int_value(&self, handle: GcRef) -> i64 {
        degrade(self.try_int_value(handle))
    }

    /// Float payload
    pub fn try_float_value(&self, handle: GcRef) -> BridgeResult<f64> {
        native_call!(self, Symbol::FloatValue, fn(GcRef) -> c_double, (handle))
    }

    /// Float payload, or 0.0
    pub fn float_value(&self, handle: GcRef) -> f64 {
        degrade(self.try_float_value(handle))
    }

    /// Copy of a string payload.
    ///
    /// The host hands back a C string the caller owns. It is copied into a
    /// `String` and returned to the host through `free_vm_string`. `Ok(None)`
    /// means the host produced no string.
    pub fn try_string_value(&self, handle: GcRef) -> BridgeResult<Option<String>> {
        let raw: *mut c_char = native_call!(self, Symbol::StringValue, fn(GcRef) -> *mut c_char, (handle))?;
        if raw.is_null() {
            return Ok(None);
        }
        // SAFETY: a non-null result is a NUL-terminated string owned by us.
        let text = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        let freed: BridgeResult<()> = native_call!(self, Symbol::FreeString, fn(*mut c_char) -> (), (raw));
        if let Err(err) = freed {
            tracing::warn!(target: "clambda", "leaking string returned by get_vm_string_value: {}", err);
        }
        Ok(Some(text))
    }

    /// Copy of a string payload, or `None`
    pub fn string_value(&self, handle: GcRef) -> Option<String> {
        degrade(self.try_string_value(handle))
    }

    /// Boolean payload
    pub fn try_boolean_value(&self, handle: GcRef) -> BridgeResult<bool> {
        let value: c_int = native_call!(self, Symbol::BooleanValue, fn(GcRef) -> c_int, (handle))?;
        Ok(value != 0)
    }

    /// Boolean payload, or false
    pub fn boolean_value(&self, handle: GcRef) -> bool {
        degrade(self.try_boolean_value(handle))
    }

    // ========================================================================
    // Key / value slots
    // ========================================================================

    /// Key slot of a key-value or named node
    pub fn try_get_key(&self, handle: GcRef) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::GetKey, fn(GcRef) -> GcRef, (handle))
    }

    /// Key slot, or the null sentinel
    pub fn get_key(&self, handle: GcRef) -> GcRef {
        degrade(self.try_get_key(handle))
    }

    /// Value slot of a key-value, named or wrapper node
    pub fn try_get_value(&self, handle: GcRef) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::GetValue, fn(GcRef) -> GcRef, (handle))
    }

    /// Value slot, or the null sentinel
    pub fn get_value(&self, handle: GcRef) -> GcRef {
        degrade(self.try_get_value(handle))
    }

    /// Replace the value slot in place
    pub fn try_set_value(&self, target: GcRef, value: GcRef) -> BridgeResult<bool> {
        let done: c_int = native_call!(self, Symbol::SetValue, fn(GcRef, GcRef) -> c_int, (target, value))?;
        Ok(done != 0)
    }

    /// Replace the value slot in place; false on failure
    pub fn set_value(&self, target: GcRef, value: GcRef) -> bool {
        degrade(self.try_set_value(target, value))
    }
}
