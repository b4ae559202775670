use std::thread;

use memlayout::{AddressWidth, ScalarKind, TypeRegistry};

#[test]
fn concurrent_first_requests_share_one_descriptor() {
    // many threads race to forge u32[3] and ptr64<u32[3]>; all must observe one id each
    let registry = TypeRegistry::default();
    let word = registry.read().scalar(ScalarKind::U32);
    let before = registry.read().len();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                let array = registry.array_of(word, 3).expect("array");
                let pointer = registry.pointer_of(array, AddressWidth::W64).expect("pointer");
                (array, pointer)
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker"))
        .collect();

    let first = results[0];
    assert!(
        results.iter().all(|result| *result == first),
        "every thread should see the same descriptors"
    );
    assert_eq!(registry.read().len(), before + 2, "exactly one array and one pointer forged");
}

#[test]
fn registry_declarations_are_visible_to_readers() {
    let registry = TypeRegistry::default();
    let point = registry
        .declare(|builder| {
            let x = builder.scalar(ScalarKind::U32);
            let y = builder.scalar(ScalarKind::F32);
            builder.structure("POINT").field("x", x).field("y", y).finish()
        })
        .expect("POINT");
    let reader = registry.clone();
    let width = thread::spawn(move || reader.read().byte_width(point))
        .join()
        .expect("reader");
    assert_eq!(width.expect("width"), 8);
}
