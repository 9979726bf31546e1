//! Heap ownership rules seen through the public API

use clambda_host::{Heap, Object};

#[test]
fn test_nested_containers_reclaim_together() {
    let heap = Heap::new();
    let key = heap.string("point");
    let x = heap.float(1.0);
    let y = heap.float(2.0);
    let coords = heap.tuple(&[x, y]);
    let named = heap.alloc(Object::Named { key, value: coords });
    let wrapper = heap.alloc(Object::Wrapper { value: named });

    for handle in [key, x, y, coords, named] {
        assert!(heap.release(handle));
    }
    assert_eq!(heap.live_objects(), 6);
    assert_eq!(heap.describe(wrapper), "wrapper(\"point\" => (1.0, 2.0))");

    assert!(heap.release(wrapper));
    assert_eq!(heap.live_objects(), 0);
}

#[test]
fn test_foreign_handles_are_rejected() {
    let a = Heap::new();
    let b = Heap::new();
    let handle = a.int(1);
    assert!(!b.contains(handle));
    assert!(!b.release(handle));
    assert_eq!(a.refcount(handle), Some(1));
    assert_eq!(b.describe(handle), "<invalid>");
}

#[test]
fn test_drop_frees_leftovers() {
    let heap = Heap::new();
    let cycle = heap.tuple(&[]);
    let inner = heap.tuple(&[cycle]);
    assert_eq!(heap.refcount(cycle), Some(2));
    assert_eq!(heap.get(inner), Some(Object::Tuple(vec![cycle])));
    drop(heap);
}
