#![allow(dead_code)]

use memlayout::{
    AddressWidth, RamMemory, ScalarKind, StructValue, TypeArena, TypeId, Value,
};

/// Base address of the dummy memory used by the integration tests.
pub const BASE: u64 = 0x0010_0000;

pub struct Shapes {
    pub arena: TypeArena,
    pub point: TypeId,
    pub test: TypeId,
}

/// `POINT { x: u32, y: f32 }` and `TEST { one: u32[2], two: i64, ptr: ptr<POINT> }`.
pub fn shapes(width: AddressWidth) -> Shapes {
    let mut arena = TypeArena::new();
    let x = arena.scalar(ScalarKind::U32);
    let y = arena.scalar(ScalarKind::F32);
    let point = arena
        .define_structure("POINT", &[("x", x), ("y", y)], &[])
        .expect("declare POINT");
    let pair = arena.array_of(x, 2).expect("u32[2]");
    let two = arena.scalar(ScalarKind::I64);
    let ptr = arena.pointer_of(point, width).expect("pointer");
    let test = arena
        .define_structure("TEST", &[("one", pair), ("two", two), ("ptr", ptr)], &[])
        .expect("declare TEST");
    Shapes { arena, point, test }
}

pub fn point(shapes: &Shapes, x: u32, y: f32) -> StructValue {
    StructValue::from_values(&shapes.arena, shapes.point, [Value::from(x), Value::from(y)])
        .expect("POINT value")
}

pub fn dummy_memory() -> RamMemory {
    RamMemory::new("dummy", BASE, 0x2000)
}
