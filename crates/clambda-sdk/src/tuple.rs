//! Collection protocol over the tuple kind
//!
//! Tuples are the argument carrier for every module function, so this is the
//! protocol numeric code touches most.

use std::ffi::{c_int, c_longlong, c_void};

use crate::error::{degrade, BridgeError, BridgeResult};
use crate::gateway::{native_call, Bridge};
use crate::handle::{GcRef, GcSystem};
use crate::lifetime::Retained;
use crate::symbol::Symbol;
use crate::value::ValueKind;

impl Bridge {
    /// Append `value` to the end of `tuple`, in place
    pub fn try_tuple_append(&self, tuple: GcRef, value: GcRef) -> BridgeResult<bool> {
        let done: c_int = native_call!(self, Symbol::TupleAppend, fn(GcRef, GcRef) -> c_int, (tuple, value))?;
        Ok(done != 0)
    }

    /// Append in place; false on failure
    pub fn tuple_append(&self, tuple: GcRef, value: GcRef) -> bool {
        degrade(self.try_tuple_append(tuple, value))
    }

    /// Element at a zero-based index.
    ///
    /// The host answers with the null sentinel for a negative or out-of-range
    /// index and for a non-tuple; that answer is passed through as `Ok`.
    pub fn try_tuple_get(&self, tuple: GcRef, index: i32, gc: GcSystem) -> BridgeResult<GcRef> {
        native_call!(self, Symbol::TupleGet, fn(GcRef, c_int, *mut c_void) -> GcRef, (tuple, index, gc.as_ptr()))
    }

    /// Element at a zero-based index, or the null sentinel
    pub fn tuple_get(&self, tuple: GcRef, index: i32, gc: GcSystem) -> GcRef {
        degrade(self.try_tuple_get(tuple, index, gc))
    }

    /// Length of a sized value: tuple elements, bytes, or string bytes.
    /// Kinds without a length report 0.
    pub fn try_len(&self, handle: GcRef) -> BridgeResult<i64> {
        native_call!(self, Symbol::GetLen, fn(GcRef) -> c_longlong, (handle))
    }

    /// Length, or 0
    pub fn len(&self, handle: GcRef) -> i64 {
        degrade(self.try_len(handle))
    }

    /// Build a tuple holding `items` in order.
    ///
    /// A partially built tuple is released before an error is returned.
    pub fn try_tuple_from(&self, items: &[GcRef], gc: GcSystem) -> BridgeResult<GcRef> {
        let tuple = self.try_new_tuple(gc)?;
        if tuple.is_null() {
            return Err(BridgeError::NullResult {
                symbol: Symbol::NewTuple.name(),
            });
        }
        // SAFETY: the constructor handed us its one reference.
        let owned = unsafe { Retained::adopt(self, tuple) };
        for item in items {
            if !self.try_tuple_append(owned.handle(), *item)? {
                return Err(BridgeError::ArgumentError(format!(
                    "{} rejected element {:?}",
                    Symbol::TupleAppend,
                    item
                )));
            }
        }
        Ok(owned.into_raw())
    }

    /// Build a tuple, or the null sentinel
    pub fn tuple_from(&self, items: &[GcRef], gc: GcSystem) -> GcRef {
        degrade(self.try_tuple_from(items, gc))
    }
}

/// Checked view of a tuple handle.
///
/// All operations delegate through the bridge it was wrapped with.
pub struct Tuple<'b> {
    bridge: &'b Bridge,
    handle: GcRef,
    gc: GcSystem,
}

impl<'b> Tuple<'b> {
    /// Wrap a handle. Fails unless the host says it is a tuple.
    pub fn wrap(bridge: &'b Bridge, handle: GcRef, gc: GcSystem) -> BridgeResult<Self> {
        if !bridge.try_is_kind(handle, ValueKind::Tuple)? {
            return Err(BridgeError::TypeMismatch {
                expected: ValueKind::Tuple.name(),
                got: bridge.kind_of(handle).map_or("unknown", ValueKind::name),
            });
        }
        Ok(Tuple { bridge, handle, gc })
    }

    /// Wrap and check the element count
    pub fn with_arity(bridge: &'b Bridge, handle: GcRef, gc: GcSystem, arity: usize) -> BridgeResult<Self> {
        let tuple = Self::wrap(bridge, handle, gc)?;
        let len = tuple.len()?;
        if len != arity {
            return Err(BridgeError::ArgumentError(format!(
                "Expected {} arguments, got {}",
                arity, len
            )));
        }
        Ok(tuple)
    }

    /// The underlying handle
    pub fn handle(&self) -> GcRef {
        self.handle
    }

    /// Number of elements
    pub fn len(&self) -> BridgeResult<usize> {
        let len = self.bridge.try_len(self.handle)?;
        Ok(usize::try_from(len).unwrap_or(0))
    }

    /// True if there are no elements
    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> BridgeResult<GcRef> {
        let len = self.len()?;
        let c_index = i32::try_from(index).ok().filter(|_| index < len).ok_or(
            BridgeError::IndexOutOfRange {
                index: index as i64,
                len: len as i64,
            },
        )?;
        let element = self.bridge.try_tuple_get(self.handle, c_index, self.gc)?;
        if element.is_null() {
            return Err(BridgeError::NullResult {
                symbol: Symbol::TupleGet.name(),
            });
        }
        Ok(element)
    }

    /// Element at `index` as a float; integers are widened
    pub fn get_f64(&self, index: usize) -> BridgeResult<f64> {
        let element = self.get(index)?;
        if self.bridge.try_is_kind(element, ValueKind::Float)? {
            self.bridge.try_float_value(element)
        } else if self.bridge.try_is_kind(element, ValueKind::Int)? {
            Ok(self.bridge.try_int_value(element)? as f64)
        } else {
            Err(BridgeError::TypeMismatch {
                expected: "numeric",
                got: self.bridge.kind_of(element).map_or("unknown", ValueKind::name),
            })
        }
    }

    /// Append an element in place
    pub fn push(&self, value: GcRef) -> BridgeResult<()> {
        if self.bridge.try_tuple_append(self.handle, value)? {
            Ok(())
        } else {
            Err(BridgeError::ArgumentError(format!(
                "{} rejected element {:?}",
                Symbol::TupleAppend,
                value
            )))
        }
    }

    /// Iterate over the elements present when iteration starts
    pub fn iter(&self) -> BridgeResult<impl Iterator<Item = BridgeResult<GcRef>> + '_> {
        let len = self.len()?;
        Ok((0..len).map(move |i| self.get(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_needs_an_active_bridge() {
        let bridge = Bridge::detached();
        assert_eq!(
            Tuple::wrap(&bridge, GcRef::null(), GcSystem::null()).err(),
            Some(BridgeError::NotActive)
        );
    }

    #[test]
    fn test_detached_collection_defaults() {
        let bridge = Bridge::detached();
        let gc = GcSystem::null();
        assert!(!bridge.tuple_append(GcRef::null(), GcRef::null()));
        assert!(bridge.tuple_get(GcRef::null(), 0, gc).is_null());
        assert_eq!(bridge.len(GcRef::null()), 0);
        assert!(bridge.tuple_from(&[], gc).is_null());
    }
}
