//! The module's C entry points, driven the way a host drives a loaded library

use std::ffi::{c_void, CStr};

use clambda_host::{host_lookup, Heap};
use clambda_sdk::{GcRef, ModuleState};
use parking_lot::Mutex;

static LOCK: Mutex<()> = parking_lot::const_mutex(());

fn activate() {
    let result = unsafe { clambda_math::clambda_entry(host_lookup as *mut c_void) };
    assert!(result.is_null());
}

#[test]
fn test_entry_points_end_to_end() {
    let _guard = LOCK.lock();
    activate();
    assert_eq!(clambda_sdk::state(), ModuleState::Active);

    let heap = Heap::new();
    let gc = heap.gc_system().as_ptr();
    let args = heap.tuple(&[heap.float(9.0), heap.float(16.0)]);

    let max = unsafe { clambda_math::clambda_max(args, gc) };
    assert_eq!(heap.describe(max), "16.0");
    let min = unsafe { clambda_math::clambda_min(args, gc) };
    assert_eq!(heap.describe(min), "9.0");

    let pow_args = heap.tuple(&[heap.float(2.0), heap.float(10.0)]);
    let pow = unsafe { clambda_math::clambda_pow(pow_args, gc) };
    assert_eq!(heap.describe(pow), "1024.0");

    let zero = heap.tuple(&[heap.float(0.0)]);
    assert!(unsafe { clambda_math::clambda_log(zero, gc) }.is_null());

    clambda_math::clambda_destroy();
}

#[test]
fn test_deactivated_module_returns_null() {
    let _guard = LOCK.lock();
    activate();
    clambda_math::clambda_destroy();
    assert_eq!(clambda_sdk::state(), ModuleState::Inactive);

    let heap = Heap::new();
    let args = heap.tuple(&[heap.float(1.0)]);
    let result: GcRef = unsafe { clambda_math::clambda_abs(args, heap.gc_system().as_ptr()) };
    assert!(result.is_null());

    activate();
    let result = unsafe { clambda_math::clambda_abs(args, heap.gc_system().as_ptr()) };
    assert_eq!(heap.describe(result), "1.0");
    clambda_math::clambda_destroy();
}

#[test]
fn test_manifest_matches_function_list() {
    let listing = unsafe { CStr::from_ptr(clambda_math::clambda_functions()) };
    let exported: Vec<&str> = listing
        .to_str()
        .unwrap()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_start_matches("clambda_"))
        .collect();
    assert_eq!(exported, clambda_math::FUNCTIONS);
}
