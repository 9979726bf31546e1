//! Dynamic invocation gateway
//!
//! [`Bridge`] is the explicit state every protocol call goes through. It is
//! either attached to a [`Resolver`] or detached; a detached bridge answers
//! every call with the degraded result. The value, collection and lifetime
//! protocols are implemented as `impl Bridge` blocks in their own modules.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::error::{BridgeError, BridgeResult};
use crate::resolver::{BridgeOptions, LookupFn, Resolver};
use crate::symbol::Symbol;

/// Resolve `$symbol` through `$bridge` and call it with the given C signature.
///
/// Evaluates to `BridgeResult<$ret>`.
macro_rules! native_call {
    ($bridge:expr, $symbol:expr, fn($($ty:ty),*) -> $ret:ty, ($($arg:expr),*)) => {{
        match $bridge.resolve($symbol) {
            Ok(address) => {
                // SAFETY: the resolver contract guarantees the address is an
                // extern "C" function with this operation's signature.
                let func = unsafe {
                    std::mem::transmute::<*mut std::ffi::c_void, unsafe extern "C" fn($($ty),*) -> $ret>(
                        address.as_ptr(),
                    )
                };
                Ok(unsafe { func($($arg),*) })
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use native_call;

/// Gateway to the host's native operations.
///
/// Cloning is cheap: clones share the same resolver.
#[derive(Clone, Default, Debug)]
pub struct Bridge {
    resolver: Option<Arc<Resolver>>,
}

impl Bridge {
    /// A bridge with no resolver: every call degrades
    pub fn detached() -> Self {
        Bridge { resolver: None }
    }

    /// Attach to the host's lookup function with default options.
    ///
    /// # Safety
    ///
    /// See [`Resolver::new`].
    pub unsafe fn new(lookup: LookupFn) -> Self {
        Self::with_options(lookup, BridgeOptions::default())
    }

    /// Attach to the host's lookup function.
    ///
    /// # Safety
    ///
    /// See [`Resolver::new`].
    pub unsafe fn with_options(lookup: LookupFn, options: BridgeOptions) -> Self {
        Self::from_resolver(Arc::new(Resolver::with_options(lookup, options)))
    }

    /// Share an existing resolver
    pub fn from_resolver(resolver: Arc<Resolver>) -> Self {
        Bridge {
            resolver: Some(resolver),
        }
    }

    /// True if a resolver is installed
    pub fn is_attached(&self) -> bool {
        self.resolver.is_some()
    }

    /// The installed resolver, if any
    pub fn resolver(&self) -> Option<&Arc<Resolver>> {
        self.resolver.as_ref()
    }

    /// True if the operation can be called right now
    pub fn is_available(&self, symbol: Symbol) -> bool {
        self.resolve(symbol).is_ok()
    }

    pub(crate) fn resolve(&self, symbol: Symbol) -> BridgeResult<NonNull<c_void>> {
        self.resolver
            .as_ref()
            .ok_or(BridgeError::NotActive)?
            .resolve(symbol)
    }
}
