//! Export macros for extension modules

/// Emit the `clambda_entry` / `clambda_destroy` entry points.
///
/// ```ignore
/// clambda_sdk::export_module!();
/// // or, with options:
/// clambda_sdk::export_module!(clambda_sdk::BridgeOptions::default());
/// ```
#[macro_export]
macro_rules! export_module {
    () => {
        $crate::export_module!($crate::BridgeOptions::default());
    };
    ($options:expr) => {
        /// Activation entry point called by the host at load time
        ///
        /// # Safety
        ///
        /// `lookup` must be the host's lookup function or null.
        #[no_mangle]
        pub unsafe extern "C" fn clambda_entry(
            lookup: *mut ::std::ffi::c_void,
        ) -> *mut ::std::ffi::c_void {
            $crate::module::entry(lookup, $options)
        }

        /// Deactivation entry point called by the host at unload time
        #[no_mangle]
        pub extern "C" fn clambda_destroy() {
            $crate::module::deactivate();
        }
    };
}

/// Export module functions as `clambda_<name>` C symbols.
///
/// Each function must have the signature
/// `fn(&Bridge, GcRef, GcSystem) -> GcRef`. The generated symbol takes a
/// fresh [`Bridge`](crate::Bridge) snapshot per call, so a deactivated module
/// degrades instead of crashing. A panic is caught at the boundary and turned
/// into the null sentinel. A `clambda_functions` manifest listing the
/// exported symbols is emitted as well.
///
/// ```ignore
/// clambda_sdk::export_functions! {
///     clambda_sin => math::sin,
///     clambda_cos => math::cos,
/// }
/// ```
#[macro_export]
macro_rules! export_functions {
    ($($symbol:ident => $func:path),+ $(,)?) => {
        $(
            /// Exported module function
            ///
            /// # Safety
            ///
            /// `gc_system` must be the host's allocation context.
            #[no_mangle]
            pub unsafe extern "C" fn $symbol(
                args: $crate::GcRef,
                gc_system: *mut ::std::ffi::c_void,
            ) -> $crate::GcRef {
                let bridge = $crate::module::bridge();
                let gc = $crate::GcSystem::from_ptr(gc_system);
                match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $func(&bridge, args, gc))) {
                    Ok(result) => result,
                    Err(_) => $crate::module::report_panic(stringify!($symbol)),
                }
            }
        )+

        /// Comma-separated list of the functions this module exports
        #[no_mangle]
        pub extern "C" fn clambda_functions() -> *const ::std::ffi::c_char {
            concat!($(stringify!($symbol), ","),+, "\0").as_ptr().cast()
        }
    };
}
