//! Module lifecycle and export macros
//!
//! These tests share the process-wide resolver slot, so each one holds
//! `LOCK` for its whole body.

use std::ffi::{c_void, CStr};

use clambda_host::{host_lookup, Heap};
use clambda_sdk::{Bridge, BridgeError, GcRef, GcSystem, ModuleState, Tuple};
use parking_lot::Mutex;

static LOCK: Mutex<()> = parking_lot::const_mutex(());

fn double(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    let Ok(tuple) = Tuple::with_arity(bridge, args, gc, 1) else {
        return GcRef::null();
    };
    match tuple.get_f64(0) {
        Ok(x) => bridge.new_float(x * 2.0, gc),
        Err(_) => GcRef::null(),
    }
}

fn explode(_bridge: &Bridge, _args: GcRef, _gc: GcSystem) -> GcRef {
    panic!("boom");
}

clambda_sdk::export_module!();
clambda_sdk::export_functions! {
    clambda_double => double,
    clambda_explode => explode,
}

#[test]
fn test_inactive_module_degrades() {
    let _guard = LOCK.lock();
    clambda_sdk::deactivate();

    assert_ne!(clambda_sdk::state(), ModuleState::Active);
    let bridge = clambda_sdk::bridge();
    assert!(!bridge.is_attached());
    assert_eq!(bridge.try_new_int(1, GcSystem::null()), Err(BridgeError::NotActive));
    assert!(bridge.new_int(1, GcSystem::null()).is_null());
}

#[test]
fn test_activate_deactivate_cycle() {
    let _guard = LOCK.lock();
    let heap = Heap::new();
    let gc = heap.gc_system();

    unsafe { clambda_sdk::activate(host_lookup) };
    assert_eq!(clambda_sdk::state(), ModuleState::Active);
    let snapshot = clambda_sdk::bridge();
    assert_eq!(snapshot.int_value(snapshot.new_int(9, gc)), 9);

    clambda_sdk::deactivate();
    assert_eq!(clambda_sdk::state(), ModuleState::Inactive);
    assert!(clambda_sdk::bridge().new_int(1, gc).is_null());
    // A snapshot taken while active keeps its resolver.
    assert!(!snapshot.new_int(1, gc).is_null());

    unsafe { clambda_sdk::activate(host_lookup) };
    assert_eq!(clambda_sdk::state(), ModuleState::Active);
    assert!(!clambda_sdk::bridge().new_int(1, gc).is_null());
    clambda_sdk::deactivate();
}

#[test]
fn test_exported_entry_points() {
    let _guard = LOCK.lock();
    let heap = Heap::new();

    let result = unsafe { clambda_entry(host_lookup as *mut c_void) };
    assert!(result.is_null());
    assert_eq!(clambda_sdk::state(), ModuleState::Active);

    let x = heap.float(21.0);
    let args = heap.tuple(&[x]);
    let doubled = unsafe { clambda_double(args, heap.gc_system().as_ptr()) };
    assert_eq!(heap.describe(doubled), "42.0");

    let wrong_arity = heap.tuple(&[]);
    assert!(unsafe { clambda_double(wrong_arity, heap.gc_system().as_ptr()) }.is_null());

    clambda_destroy();
    assert_eq!(clambda_sdk::state(), ModuleState::Inactive);
    assert!(unsafe { clambda_double(args, heap.gc_system().as_ptr()) }.is_null());
}

#[test]
fn test_entry_with_null_lookup_stays_inactive() {
    let _guard = LOCK.lock();
    unsafe { clambda_entry(std::ptr::null_mut()) };
    assert_ne!(clambda_sdk::state(), ModuleState::Active);
}

#[test]
fn test_panic_is_caught_at_boundary() {
    let _guard = LOCK.lock();
    let heap = Heap::new();
    unsafe { clambda_sdk::activate(host_lookup) };
    let args = heap.tuple(&[]);
    assert!(unsafe { clambda_explode(args, heap.gc_system().as_ptr()) }.is_null());
    clambda_sdk::deactivate();
}

#[test]
fn test_manifest_lists_exports() {
    let listing = unsafe { CStr::from_ptr(clambda_functions()) };
    assert_eq!(listing.to_str().unwrap(), "clambda_double,clambda_explode,");
}
