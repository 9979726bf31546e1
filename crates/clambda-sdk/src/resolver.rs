//! Symbol resolution through the host's lookup function
//!
//! The host supplies a single C function mapping an operation name to the
//! address of its implementation. A [`Resolver`] wraps that function and, by
//! default, memoizes every answer: the table is fixed for as long as the module
//! stays active, so caching never changes behavior.

use std::ffi::{c_char, c_void};
use std::fmt;
use std::ptr::NonNull;

use once_cell::sync::OnceCell;

use crate::error::{BridgeError, BridgeResult};
use crate::symbol::Symbol;

/// Resolver calling convention: `lookup(name) -> address or null`
pub type LookupFn = unsafe extern "C" fn(name: *const c_char) -> *mut c_void;

/// When the resolver consults the host's lookup function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Look each operation up once and remember the answer
    #[default]
    Cached,
    /// Ask the host on every call
    PerCall,
}

/// Bridge configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeOptions {
    /// Resolution strategy
    pub resolution: Resolution,
}

impl BridgeOptions {
    /// Options with the given resolution strategy
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }
}

// An entry point address. Only ever called, never dereferenced as data.
#[derive(Clone, Copy)]
struct EntryPoint(Option<NonNull<c_void>>);

unsafe impl Send for EntryPoint {}
unsafe impl Sync for EntryPoint {}

/// Maps operation names to callable entry points.
pub struct Resolver {
    lookup: LookupFn,
    resolution: Resolution,
    cache: Box<[OnceCell<EntryPoint>]>,
}

impl Resolver {
    /// Wrap the host's lookup function with default options.
    ///
    /// # Safety
    ///
    /// `lookup` must be callable with a NUL-terminated name for as long as the
    /// resolver lives, and every non-null address it returns for a [`Symbol`]
    /// must be an `extern "C"` function with that operation's documented
    /// signature.
    pub unsafe fn new(lookup: LookupFn) -> Self {
        Self::with_options(lookup, BridgeOptions::default())
    }

    /// Wrap the host's lookup function.
    ///
    /// # Safety
    ///
    /// Same contract as [`Resolver::new`].
    pub unsafe fn with_options(lookup: LookupFn, options: BridgeOptions) -> Self {
        let cache = (0..Symbol::COUNT).map(|_| OnceCell::new()).collect();
        Resolver {
            lookup,
            resolution: options.resolution,
            cache,
        }
    }

    /// The wrapped lookup function
    pub fn lookup_fn(&self) -> LookupFn {
        self.lookup
    }

    /// The resolution strategy in use
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Resolve an operation to its entry point.
    pub fn resolve(&self, symbol: Symbol) -> BridgeResult<NonNull<c_void>> {
        let entry = match self.resolution {
            Resolution::Cached => *self.cache[symbol.index()].get_or_init(|| self.lookup(symbol)),
            Resolution::PerCall => self.lookup(symbol),
        };
        entry.0.ok_or(BridgeError::SymbolNotFound {
            symbol: symbol.name(),
        })
    }

    /// True if the host publishes the operation
    pub fn is_available(&self, symbol: Symbol) -> bool {
        self.resolve(symbol).is_ok()
    }

    fn lookup(&self, symbol: Symbol) -> EntryPoint {
        let name = symbol.name_with_nul().as_ptr().cast::<c_char>();
        let address = unsafe { (self.lookup)(name) };
        tracing::trace!(target: "clambda", symbol = symbol.name(), ?address, "resolved");
        EntryPoint(NonNull::new(address))
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.cache.iter().filter(|c| c.get().is_some()).count();
        f.debug_struct("Resolver")
            .field("resolution", &self.resolution)
            .field("cached", &cached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    extern "C" fn marker() {}

    unsafe extern "C" fn only_clone_ref(name: *const c_char) -> *mut c_void {
        let name = CStr::from_ptr(name);
        if name.to_bytes() == b"clone_ref" {
            marker as *mut c_void
        } else {
            std::ptr::null_mut()
        }
    }

    #[test]
    fn test_resolve_found_and_missing() {
        let resolver = unsafe { Resolver::new(only_clone_ref) };
        assert!(resolver.resolve(Symbol::CloneRef).is_ok());
        assert_eq!(
            resolver.resolve(Symbol::DropRef),
            Err(BridgeError::SymbolNotFound {
                symbol: "drop_ref"
            })
        );
        assert!(resolver.is_available(Symbol::CloneRef));
        assert!(!resolver.is_available(Symbol::NewTuple));
    }

    #[test]
    fn test_cached_and_per_call_agree() {
        let cached = unsafe { Resolver::new(only_clone_ref) };
        let per_call = unsafe {
            Resolver::with_options(
                only_clone_ref,
                BridgeOptions::default().with_resolution(Resolution::PerCall),
            )
        };
        for symbol in Symbol::ALL {
            assert_eq!(
                cached.resolve(*symbol).is_ok(),
                per_call.resolve(*symbol).is_ok()
            );
        }
        assert_eq!(per_call.resolution(), Resolution::PerCall);
    }

    static CACHED_CALLS: AtomicUsize = AtomicUsize::new(0);
    static PER_CALL_CALLS: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn counting_cached(name: *const c_char) -> *mut c_void {
        CACHED_CALLS.fetch_add(1, Ordering::SeqCst);
        only_clone_ref(name)
    }

    unsafe extern "C" fn counting_per_call(name: *const c_char) -> *mut c_void {
        PER_CALL_CALLS.fetch_add(1, Ordering::SeqCst);
        only_clone_ref(name)
    }

    #[test]
    fn test_cached_resolution_asks_once() {
        let resolver = unsafe { Resolver::new(counting_cached) };
        for _ in 0..5 {
            let _ = resolver.resolve(Symbol::CloneRef);
            let _ = resolver.resolve(Symbol::GetLen);
        }
        assert_eq!(CACHED_CALLS.load(Ordering::SeqCst), 2);
        assert!(format!("{:?}", resolver).contains("cached: 2"));
    }

    #[test]
    fn test_per_call_resolution_asks_every_time() {
        let resolver = unsafe {
            Resolver::with_options(
                counting_per_call,
                BridgeOptions::default().with_resolution(Resolution::PerCall),
            )
        };
        for _ in 0..5 {
            let _ = resolver.resolve(Symbol::CloneRef);
        }
        assert_eq!(PER_CALL_CALLS.load(Ordering::SeqCst), 5);
    }
}
