//! Human readable rendering of value trees.
//!
//! The display form of a structure lists `name=value` pairs separated by spaces, skipping
//! private (`_`-prefixed) fields, sequential fields first and overlays after. The repr form is
//! `NAME(a=1, b=2)` and includes private fields. A structure nested inside another value always
//! renders in repr form so that its boundaries stay visible.
use std::fmt;

use crate::types::TypeArena;

use super::{StructValue, Value};

pub struct ValueDisplay<'a> {
    arena: &'a TypeArena,
    value: &'a Value,
    repr: bool,
    nested: bool,
}

impl<'a> ValueDisplay<'a> {
    pub fn new(arena: &'a TypeArena, value: &'a Value, repr: bool) -> Self {
        Self {
            arena,
            value,
            repr,
            nested: false,
        }
    }
}

fn nested<'a>(arena: &'a TypeArena, value: &'a Value, repr: bool) -> ValueDisplay<'a> {
    ValueDisplay {
        arena,
        value,
        repr,
        nested: true,
    }
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Signed(v) => write!(f, "{v}"),
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Pointer(pointer) => {
                if self.repr {
                    write!(f, "{}", pointer.repr(self.arena))
                } else {
                    write!(f, "{}", pointer.display(self.arena))
                }
            }
            Value::Array(array) => {
                f.write_str("[")?;
                for (index, item) in array.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", nested(self.arena, item, self.repr))?;
                }
                f.write_str("]")
            }
            Value::Struct(value) => write_struct(f, self.arena, value, self.repr || self.nested),
        }
    }
}

fn write_struct(
    f: &mut fmt::Formatter<'_>,
    arena: &TypeArena,
    value: &StructValue,
    repr: bool,
) -> fmt::Result {
    let Ok(structure) = arena.structure(value.ty()) else {
        return f.write_str("<unknown structure>");
    };
    let fields = structure.fields(arena);
    let overlays = structure.overlays(arena);
    let overlay_values = value.overlay_values(arena).ok();

    let separator = if repr { ", " } else { " " };
    if repr {
        write!(f, "{}(", structure.name(arena))?;
    }
    let mut first = true;
    for (record, field) in fields.iter().zip(value.fields()) {
        if record.private && !repr {
            continue;
        }
        if !first {
            f.write_str(separator)?;
        }
        first = false;
        let name = arena.resolve_string(record.name_id);
        write!(f, "{name}={}", nested(arena, field, repr))?;
    }
    for (index, record) in overlays.iter().enumerate() {
        if record.private && !repr {
            continue;
        }
        if !first {
            f.write_str(separator)?;
        }
        first = false;
        let name = arena.resolve_string(record.name_id);
        match overlay_values.as_ref().and_then(|values| values.get(index)) {
            Some(overlay) => write!(f, "{name}={}", nested(arena, overlay, repr))?,
            None => write!(f, "{name}=<unpackable>")?,
        }
    }
    if repr {
        f.write_str(")")?;
    }
    Ok(())
}
