//! Fluent construction helpers over a borrowed arena. Structure declaration lives with the
//! structure layout code; this module covers the leaf factories.
use crate::error::MarshalResult;

use super::arena::{StringId, TypeArena, TypeId};
use super::pointer::AddressWidth;
use super::scalar::ScalarKind;

pub struct TypeBuilder<'arena> {
    pub(super) arena: &'arena mut TypeArena,
}

impl<'arena> TypeBuilder<'arena> {
    pub fn new(arena: &'arena mut TypeArena) -> Self {
        Self { arena }
    }

    pub fn arena(&self) -> &TypeArena {
        self.arena
    }

    pub fn intern<S: AsRef<str>>(&mut self, name: S) -> StringId {
        self.arena.intern_string(name)
    }

    pub fn scalar(&self, kind: ScalarKind) -> TypeId {
        self.arena.scalar(kind)
    }

    pub fn array(&mut self, element: TypeId, length: usize) -> MarshalResult<TypeId> {
        self.arena.array_of(element, length)
    }

    pub fn pointer(&mut self, target: TypeId, width: AddressWidth) -> MarshalResult<TypeId> {
        self.arena.pointer_of(target, width)
    }

    pub fn native_pointer(&mut self, target: TypeId) -> MarshalResult<TypeId> {
        self.arena.native_pointer_of(target)
    }

    pub fn forward(&mut self, name: impl AsRef<str>) -> TypeId {
        self.arena.forward_declare(name)
    }
}

#[cfg(test)]
mod tests {
    //! Builder helpers should route through the arena caches.
    use super::*;

    #[test]
    fn builder_factories_hit_arena_caches() {
        let mut arena = TypeArena::new();
        let (array, pointer) = {
            let mut builder = TypeBuilder::new(&mut arena);
            let word = builder.scalar(ScalarKind::U32);
            let array = builder.array(word, 4).expect("array");
            let pointer = builder.pointer(array, AddressWidth::W32).expect("pointer");
            assert_eq!(
                builder.native_pointer(array).expect("pointer"),
                builder.pointer(array, AddressWidth::W64).expect("pointer")
            );
            (array, pointer)
        };
        let word = arena.scalar(ScalarKind::U32);
        assert_eq!(arena.array_of(word, 4).expect("array"), array);
        assert_eq!(arena.pointer32_of(array).expect("pointer"), pointer);
    }

    #[test]
    fn forward_then_complete_through_builder() {
        let mut arena = TypeArena::new();
        let mut builder = arena.builder();
        let node = builder.forward("NODE");
        let next = builder.native_pointer(node).expect("pointer");
        let id = builder
            .structure("NODE")
            .field("next", next)
            .completes(node)
            .finish()
            .expect("node");
        assert_eq!(id, node);
        assert_eq!(builder.arena().type_name(next), "ptr64<NODE>");
        let name = builder.intern("NODE");
        assert_eq!(builder.arena().lookup_string("NODE"), Some(name));
    }
}
