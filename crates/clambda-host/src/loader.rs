//! Dynamic library loading for extension modules
//!
//! Cross-platform support for loading shared libraries (.so, .dylib, .dll)
//! and driving the clambda entry points they export.

use std::ffi::{c_char, c_void, CStr, CString};
use std::path::Path;

use clambda_sdk::{GcRef, DESTROY_SYMBOL, ENTRY_SYMBOL, FUNCTION_PREFIX, MANIFEST_SYMBOL};

use crate::error::LoadError;
use crate::heap::Heap;
use crate::registry::host_lookup;

type EntryFn = unsafe extern "C" fn(*mut c_void) -> *mut c_void;
type DestroyFn = unsafe extern "C" fn();
type ManifestFn = unsafe extern "C" fn() -> *const c_char;
type ModuleFn = unsafe extern "C" fn(GcRef, *mut c_void) -> GcRef;

/// Cross-platform dynamic library handle
pub struct Library {
    handle: LibraryHandle,
    path: String,
}

impl Library {
    /// Load a dynamic library from the given path.
    ///
    /// # Platform-specific behavior
    ///
    /// - **Linux / macOS**: `dlopen(RTLD_NOW | RTLD_LOCAL)`
    /// - **Windows**: `LoadLibraryW`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path_ref = path.as_ref();
        let path_str = path_ref
            .to_str()
            .ok_or_else(|| LoadError::InvalidPath(format!("{:?}", path_ref)))?;

        let handle = LibraryHandle::load(path_str)?;
        tracing::debug!(target: "clambda", path = path_str, "library loaded");

        Ok(Library {
            handle,
            path: path_str.to_string(),
        })
    }

    /// Get a function pointer by name.
    ///
    /// # Safety
    ///
    /// `T` must be a function pointer type matching the symbol's real
    /// signature, and must not be used after this library is dropped.
    pub unsafe fn get<T: Copy>(&self, symbol: &str) -> Result<T, LoadError> {
        self.handle.symbol(symbol, &self.path)
    }

    /// Get the path this library was loaded from
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A loaded clambda extension module.
///
/// The module is activated with [`host_lookup`] on [`Extension::load`] and
/// deactivated when dropped.
pub struct Extension {
    library: Library,
    entry: EntryFn,
    destroy: DestroyFn,
    manifest: Vec<String>,
    active: bool,
}

impl Extension {
    /// Open a library, resolve its lifecycle entry points, and activate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let library = Library::open(path)?;
        // SAFETY: the signatures are fixed by the module contract.
        let entry: EntryFn = unsafe { library.get(ENTRY_SYMBOL)? };
        let destroy: DestroyFn = unsafe { library.get(DESTROY_SYMBOL)? };
        let manifest = read_manifest(&library);

        let mut extension = Extension {
            library,
            entry,
            destroy,
            manifest,
            active: false,
        };
        extension.activate()?;
        Ok(extension)
    }

    /// Hand the host lookup function to the module
    pub fn activate(&mut self) -> Result<(), LoadError> {
        let result = unsafe { (self.entry)(host_lookup as *mut c_void) };
        if !result.is_null() {
            return Err(LoadError::InvalidInit(format!(
                "{} returned a non-null pointer",
                ENTRY_SYMBOL
            )));
        }
        self.active = true;
        tracing::debug!(target: "clambda", path = self.library.path(), "extension activated");
        Ok(())
    }

    /// Tell the module to drop its resolver. Idempotent.
    pub fn deactivate(&mut self) {
        if self.active {
            unsafe { (self.destroy)() };
            self.active = false;
            tracing::debug!(target: "clambda", path = self.library.path(), "extension deactivated");
        }
    }

    /// True between a successful activation and deactivation
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Path of the underlying library
    pub fn path(&self) -> &str {
        self.library.path()
    }

    /// Function names listed in the module's manifest, without the
    /// `clambda_` prefix. Empty if the module publishes no manifest.
    pub fn functions(&self) -> Vec<String> {
        self.manifest.clone()
    }

    /// Call `clambda_<name>` with an argument tuple allocated in `heap`.
    ///
    /// Only names listed in the manifest are callable when the module
    /// publishes one. The lifecycle and manifest entry points never are.
    /// The null sentinel coming back is reported as an error; the module has
    /// already logged why.
    pub fn call(&self, name: &str, args: GcRef, heap: &Heap) -> Result<GcRef, LoadError> {
        if !self.active {
            return Err(LoadError::NotActive {
                library: self.library.path().to_string(),
            });
        }
        let symbol = function_symbol(name, &self.manifest, self.library.path())?;
        // SAFETY: every clambda_<name> export has the module function signature.
        let function: ModuleFn = unsafe { self.library.get(&symbol)? };
        tracing::debug!(target: "clambda", function = %symbol, "calling extension function");
        let result = unsafe { function(args, heap.gc_system().as_ptr()) };
        if result.is_null() {
            return Err(LoadError::NullResult { function: symbol });
        }
        Ok(result)
    }
}

impl Drop for Extension {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn read_manifest(library: &Library) -> Vec<String> {
    let Ok(manifest) = (unsafe { library.get::<ManifestFn>(MANIFEST_SYMBOL) }) else {
        return Vec::new();
    };
    let raw = unsafe { manifest() };
    if raw.is_null() {
        return Vec::new();
    }
    let listing = unsafe { CStr::from_ptr(raw) }.to_string_lossy();
    parse_manifest(&listing)
}

/// Exported symbol for a module function name
fn function_symbol(name: &str, manifest: &[String], library: &str) -> Result<String, LoadError> {
    let symbol = format!("{}{}", FUNCTION_PREFIX, name);
    if [ENTRY_SYMBOL, DESTROY_SYMBOL, MANIFEST_SYMBOL].contains(&symbol.as_str()) {
        return Err(LoadError::ReservedSymbol { symbol });
    }
    if !manifest.is_empty() && !manifest.iter().any(|listed| listed == name) {
        return Err(LoadError::UnknownFunction {
            function: name.to_string(),
            library: library.to_string(),
        });
    }
    Ok(symbol)
}

fn parse_manifest(listing: &str) -> Vec<String> {
    listing
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.strip_prefix(FUNCTION_PREFIX).unwrap_or(s).to_string())
        .collect()
}

// Platform-specific implementations

#[cfg(unix)]
type LibraryHandle = UnixLibrary;

#[cfg(windows)]
type LibraryHandle = WindowsLibrary;

// ============================================================================
// Unix Implementation (Linux, macOS, BSD)
// ============================================================================

#[cfg(unix)]
struct UnixLibrary {
    handle: *mut c_void,
}

#[cfg(unix)]
impl UnixLibrary {
    fn load(path: &str) -> Result<Self, LoadError> {
        let c_path = CString::new(path)
            .map_err(|e| LoadError::PlatformError(format!("Invalid path: {}", e)))?;

        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };

        if handle.is_null() {
            return Err(LoadError::NotFound {
                path: format!("{}: {}", path, unsafe { last_dl_error() }),
            });
        }

        Ok(UnixLibrary { handle })
    }

    unsafe fn symbol<T: Copy>(&self, name: &str, lib_path: &str) -> Result<T, LoadError> {
        let c_name = CString::new(name)
            .map_err(|e| LoadError::PlatformError(format!("Invalid symbol name: {}", e)))?;

        libc::dlerror();
        let symbol = libc::dlsym(self.handle, c_name.as_ptr());

        if symbol.is_null() {
            return Err(LoadError::SymbolNotFound {
                symbol: name.to_string(),
                library: format!("{}: {}", lib_path, last_dl_error()),
            });
        }

        Ok(std::mem::transmute_copy(&symbol))
    }
}

#[cfg(unix)]
unsafe fn last_dl_error() -> String {
    let err_ptr = libc::dlerror();
    if err_ptr.is_null() {
        "Unknown error".to_string()
    } else {
        CStr::from_ptr(err_ptr).to_string_lossy().into_owned()
    }
}

#[cfg(unix)]
impl Drop for UnixLibrary {
    fn drop(&mut self) {
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

#[cfg(unix)]
unsafe impl Send for UnixLibrary {}
#[cfg(unix)]
unsafe impl Sync for UnixLibrary {}

// ============================================================================
// Windows Implementation
// ============================================================================

#[cfg(windows)]
struct WindowsLibrary {
    handle: *mut c_void,
}

#[cfg(windows)]
impl WindowsLibrary {
    fn load(path: &str) -> Result<Self, LoadError> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;

        let wide: Vec<u16> = OsStr::new(path)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let handle = unsafe { LoadLibraryW(wide.as_ptr()) };

        if handle.is_null() {
            let error = unsafe { GetLastError() };
            return Err(LoadError::NotFound {
                path: format!("{} (error code: {})", path, error),
            });
        }

        Ok(WindowsLibrary { handle })
    }

    unsafe fn symbol<T: Copy>(&self, name: &str, lib_path: &str) -> Result<T, LoadError> {
        let c_name = CString::new(name)
            .map_err(|e| LoadError::PlatformError(format!("Invalid symbol name: {}", e)))?;

        let symbol = GetProcAddress(self.handle, c_name.as_ptr());

        if symbol.is_null() {
            let error = GetLastError();
            return Err(LoadError::SymbolNotFound {
                symbol: name.to_string(),
                library: format!("{} (error code: {})", lib_path, error),
            });
        }

        Ok(std::mem::transmute_copy(&symbol))
    }
}

#[cfg(windows)]
impl Drop for WindowsLibrary {
    fn drop(&mut self) {
        unsafe {
            FreeLibrary(self.handle);
        }
    }
}

#[cfg(windows)]
unsafe impl Send for WindowsLibrary {}
#[cfg(windows)]
unsafe impl Sync for WindowsLibrary {}

#[cfg(windows)]
extern "system" {
    fn LoadLibraryW(filename: *const u16) -> *mut c_void;
    fn GetProcAddress(module: *mut c_void, procname: *const c_char) -> *mut c_void;
    fn FreeLibrary(module: *mut c_void) -> i32;
    fn GetLastError() -> u32;
}
