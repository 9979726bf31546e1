//! Numeric functions called directly through a host-bound bridge

use clambda_host::Heap;
use clambda_math::functions;
use clambda_math::SqrtPolicy;
use clambda_sdk::{Bridge, GcRef, GcSystem};

type Function = fn(&Bridge, GcRef, GcSystem) -> GcRef;

fn call(function: Function, heap: &Heap, args: &[f64]) -> GcRef {
    let bridge = clambda_host::bridge();
    let items: Vec<GcRef> = args.iter().map(|x| heap.float(*x)).collect();
    let tuple = heap.tuple(&items);
    function(&bridge, tuple, heap.gc_system())
}

fn value(heap: &Heap, handle: GcRef) -> f64 {
    clambda_host::bridge().try_float_value(handle).unwrap_or_else(|err| {
        panic!("no float in {}: {}", heap.describe(handle), err)
    })
}

#[test]
fn test_max_and_min() {
    let heap = Heap::new();
    assert_eq!(value(&heap, call(functions::max, &heap, &[9.0, 16.0])), 16.0);
    assert_eq!(value(&heap, call(functions::min, &heap, &[9.0, 16.0])), 9.0);
    assert_eq!(value(&heap, call(functions::max, &heap, &[-3.0])), -3.0);
    assert_eq!(value(&heap, call(functions::min, &heap, &[4.0, -1.0, 2.5])), -1.0);
}

#[test]
fn test_max_needs_an_argument() {
    let heap = Heap::new();
    assert!(call(functions::max, &heap, &[]).is_null());
    assert!(call(functions::min, &heap, &[]).is_null());
}

#[test]
fn test_pow() {
    let heap = Heap::new();
    assert_eq!(value(&heap, call(functions::pow, &heap, &[2.0, 10.0])), 1024.0);
    assert!(call(functions::pow, &heap, &[2.0]).is_null());
}

#[test]
fn test_sqrt_policies() {
    let heap = Heap::new();
    let bridge = clambda_host::bridge();
    let gc = heap.gc_system();
    let negative = heap.tuple(&[heap.float(-4.0)]);

    let magnitude = functions::sqrt_with(SqrtPolicy::Magnitude, &bridge, negative, gc);
    assert_eq!(value(&heap, magnitude), 2.0);

    assert!(functions::sqrt_with(SqrtPolicy::Strict, &bridge, negative, gc).is_null());

    let positive = heap.tuple(&[heap.float(16.0)]);
    assert_eq!(
        value(&heap, functions::sqrt_with(SqrtPolicy::Strict, &bridge, positive, gc)),
        4.0
    );
}

#[test]
fn test_log_domain() {
    let heap = Heap::new();
    assert!(call(functions::log, &heap, &[0.0]).is_null());
    assert!(call(functions::log10, &heap, &[-10.0]).is_null());
    assert!((value(&heap, call(functions::log10, &heap, &[1000.0])) - 3.0).abs() < 1e-12);
    assert_eq!(value(&heap, call(functions::log, &heap, &[1.0])), 0.0);
}

#[test]
fn test_unary_functions() {
    let heap = Heap::new();
    let cases: [(Function, f64, f64); 9] = [
        (functions::sin, 0.0, 0.0),
        (functions::cos, 0.0, 1.0),
        (functions::tan, 0.0, 0.0),
        (functions::exp, 0.0, 1.0),
        (functions::round, 2.5, 3.0),
        (functions::round, -2.5, -3.0),
        (functions::floor, -1.5, -2.0),
        (functions::ceil, 1.2, 2.0),
        (functions::abs, -7.0, 7.0),
    ];
    for (function, input, expected) in cases {
        assert_eq!(value(&heap, call(function, &heap, &[input])), expected);
    }
}

#[test]
fn test_arity_mismatch_yields_null() {
    let heap = Heap::new();
    assert!(call(functions::sin, &heap, &[1.0, 2.0]).is_null());
    assert!(call(functions::sqrt, &heap, &[]).is_null());
}

#[test]
fn test_non_tuple_arguments_yield_null() {
    let heap = Heap::new();
    let bridge = clambda_host::bridge();
    let scalar = heap.float(1.0);
    assert!(functions::abs(&bridge, scalar, heap.gc_system()).is_null());
    assert!(functions::max(&bridge, scalar, heap.gc_system()).is_null());
}

#[test]
fn test_integers_are_widened() {
    let heap = Heap::new();
    let bridge = clambda_host::bridge();
    let args = heap.tuple(&[heap.int(9), heap.float(16.5)]);
    let result = functions::max(&bridge, args, heap.gc_system());
    assert_eq!(value(&heap, result), 16.5);
}

#[test]
fn test_non_numeric_element_reads_as_zero() {
    let heap = Heap::new();
    let bridge = clambda_host::bridge();
    let args = heap.tuple(&[heap.string("x")]);
    let result = functions::exp(&bridge, args, heap.gc_system());
    assert_eq!(value(&heap, result), 1.0);
}

#[test]
fn test_constants_ignore_arguments() {
    let heap = Heap::new();
    assert_eq!(value(&heap, call(functions::pi, &heap, &[])), std::f64::consts::PI);
    assert_eq!(value(&heap, call(functions::e, &heap, &[1.0, 2.0])), std::f64::consts::E);
}

#[test]
fn test_results_are_owned_by_caller() {
    let heap = Heap::new();
    let bridge = clambda_host::bridge();
    let x = heap.float(2.0);
    let args = heap.tuple(&[x]);
    heap.release(x);

    let result = functions::abs(&bridge, args, heap.gc_system());
    assert_eq!(heap.refcount(result), Some(1));
    heap.release(result);
    heap.release(args);
    assert_eq!(heap.live_objects(), 0);
}
