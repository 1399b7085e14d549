use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::error::JvmError;
use crate::keys::{ClassId, Symbol};
use crate::stack::Slots;
use crate::throw_exception;

pub mod method_area;

/// Handle into the object arena, 1-based so that `Option<HeapRef>` is the
/// null reference with no extra storage. Objects are never reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapRef(NonZeroU32);

impl HeapRef {
    pub fn from_index(index: usize) -> HeapRef {
        HeapRef(NonZeroU32::new(index as u32 + 1).expect("heap index overflow"))
    }

    pub fn index(self) -> usize {
        self.0.get() as usize - 1
    }

    /// Stable identity used for `Object.hashCode`.
    pub fn handle(self) -> i32 {
        self.0.get() as i32
    }
}

/// Object payload: instance field slots, one of the seven primitive
/// array kinds, or a reference array.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBody {
    Fields(Slots),
    /// `byte[]` and `boolean[]`.
    Bytes(Vec<i8>),
    Shorts(Vec<i16>),
    Chars(Vec<u16>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Refs(Vec<Option<HeapRef>>),
}

impl ObjectBody {
    pub fn array_length(&self) -> Option<usize> {
        match self {
            ObjectBody::Fields(_) => None,
            ObjectBody::Bytes(v) => Some(v.len()),
            ObjectBody::Shorts(v) => Some(v.len()),
            ObjectBody::Chars(v) => Some(v.len()),
            ObjectBody::Ints(v) => Some(v.len()),
            ObjectBody::Longs(v) => Some(v.len()),
            ObjectBody::Floats(v) => Some(v.len()),
            ObjectBody::Doubles(v) => Some(v.len()),
            ObjectBody::Refs(v) => Some(v.len()),
        }
    }

    pub fn fields(&self) -> Result<&Slots, JvmError> {
        match self {
            ObjectBody::Fields(slots) => Ok(slots),
            _ => Err(JvmError::Internal("object body is not an instance".to_string())),
        }
    }

    pub fn fields_mut(&mut self) -> Result<&mut Slots, JvmError> {
        match self {
            ObjectBody::Fields(slots) => Ok(slots),
            _ => Err(JvmError::Internal("object body is not an instance".to_string())),
        }
    }
}

/// One line of a captured backtrace (class and method in source form).
#[derive(Debug, Clone, PartialEq)]
pub struct TraceElement {
    pub class_name: String,
    pub method_name: String,
    pub file_name: Option<String>,
    pub line_number: i32,
}

/// Untyped side-channel of an object: wires a `java/lang/Class` mirror to
/// its runtime class, a `java/lang/String` to its interned identity, and
/// a throwable to its captured backtrace.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Extra {
    #[default]
    None,
    Mirror(ClassId),
    InternedString(Symbol),
    Backtrace(Vec<TraceElement>),
}

#[derive(Debug, Clone)]
pub struct Object {
    pub class: ClassId,
    pub body: ObjectBody,
    pub extra: Extra,
}

impl Object {
    pub fn new_instance(class: ClassId, slot_count: usize) -> Object {
        Object { class, body: ObjectBody::Fields(Slots::new(slot_count)), extra: Extra::None }
    }
}

/// Process-lifetime object arena plus the string literal pool. All
/// `HeapRef`s are minted here, so plain indexing is in bounds by
/// construction.
pub struct Heap {
    objects: Vec<Object>,
    string_pool: HashMap<Symbol, HeapRef>,
}

impl Heap {
    pub fn new() -> Heap {
        Heap { objects: Vec::new(), string_pool: HashMap::new() }
    }

    pub fn alloc(&mut self, object: Object) -> HeapRef {
        self.objects.push(object);
        HeapRef::from_index(self.objects.len() - 1)
    }

    pub fn get(&self, reference: HeapRef) -> &Object {
        &self.objects[reference.index()]
    }

    pub fn get_mut(&mut self, reference: HeapRef) -> &mut Object {
        &mut self.objects[reference.index()]
    }

    pub fn class_of(&self, reference: HeapRef) -> ClassId {
        self.get(reference).class
    }

    pub fn array_length(&self, reference: HeapRef) -> Result<i32, JvmError> {
        self.get(reference)
            .body
            .array_length()
            .map(|len| len as i32)
            .ok_or_else(|| JvmError::Internal("arraylength on a non-array object".to_string()))
    }

    pub fn pooled_string(&self, symbol: Symbol) -> Option<HeapRef> {
        self.string_pool.get(&symbol).copied()
    }

    pub fn pool_string(&mut self, symbol: Symbol, reference: HeapRef) {
        self.string_pool.insert(symbol, reference);
    }

    /// Shallow clone per `Object.clone`: the body is duplicated, the
    /// side-channel is not carried over.
    pub fn clone_object(&mut self, source: HeapRef) -> HeapRef {
        let object = self.get(source);
        let copy = Object { class: object.class, body: object.body.clone(), extra: Extra::None };
        self.alloc(copy)
    }

    /// `System.arraycopy` on same-kind array bodies with full bounds
    /// checking. Reference arrays are copied without per-element type
    /// checks against the destination component (the spec of the host
    /// method guards the common cases; stores through bytecode do check).
    pub fn copy_array(
        &mut self,
        src: HeapRef,
        src_pos: i32,
        dest: HeapRef,
        dest_pos: i32,
        length: i32,
    ) -> Result<(), JvmError> {
        let src_len = self.array_length(src)?;
        let dest_len = self.array_length(dest)?;
        if src_pos < 0
            || dest_pos < 0
            || length < 0
            || src_pos + length > src_len
            || dest_pos + length > dest_len
        {
            throw_exception!(
                ArrayIndexOutOfBoundsException,
                "arraycopy: last source index {} out of bounds for length {}",
                src_pos + length,
                src_len
            );
        }

        let (src_pos, dest_pos, length) = (src_pos as usize, dest_pos as usize, length as usize);

        enum BodyKind {
            Bytes,
            Shorts,
            Chars,
            Ints,
            Longs,
            Floats,
            Doubles,
            Refs,
        }
        let kind = match &self.get(src).body {
            ObjectBody::Bytes(_) => BodyKind::Bytes,
            ObjectBody::Shorts(_) => BodyKind::Shorts,
            ObjectBody::Chars(_) => BodyKind::Chars,
            ObjectBody::Ints(_) => BodyKind::Ints,
            ObjectBody::Longs(_) => BodyKind::Longs,
            ObjectBody::Floats(_) => BodyKind::Floats,
            ObjectBody::Doubles(_) => BodyKind::Doubles,
            ObjectBody::Refs(_) => BodyKind::Refs,
            ObjectBody::Fields(_) => {
                throw_exception!(ArrayStoreException, "arraycopy on a non-array object")
            }
        };

        macro_rules! copy_kind {
            ($variant:ident) => {{
                let staged: Vec<_> = match &self.get(src).body {
                    ObjectBody::$variant(values) => {
                        values[src_pos..src_pos + length].to_vec()
                    }
                    _ => throw_exception!(ArrayStoreException, "mismatched array kinds"),
                };
                match &mut self.get_mut(dest).body {
                    ObjectBody::$variant(values) => {
                        values[dest_pos..dest_pos + length].copy_from_slice(&staged)
                    }
                    _ => throw_exception!(ArrayStoreException, "mismatched array kinds"),
                }
            }};
        }

        match kind {
            BodyKind::Bytes => copy_kind!(Bytes),
            BodyKind::Shorts => copy_kind!(Shorts),
            BodyKind::Chars => copy_kind!(Chars),
            BodyKind::Ints => copy_kind!(Ints),
            BodyKind::Longs => copy_kind!(Longs),
            BodyKind::Floats => copy_kind!(Floats),
            BodyKind::Doubles => copy_kind!(Doubles),
            BodyKind::Refs => copy_kind!(Refs),
        }
        Ok(())
    }
}

impl Default for Heap {
    fn default() -> Self {
        Heap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_refs_are_one_based_stable_handles() {
        let mut heap = Heap::new();
        let first = heap.alloc(Object {
            class: ClassId::from_index(0),
            body: ObjectBody::Ints(vec![1, 2, 3]),
            extra: Extra::None,
        });
        let second = heap.alloc(Object::new_instance(ClassId::from_index(0), 2));
        assert_eq!(first.handle(), 1);
        assert_eq!(second.handle(), 2);
        assert_eq!(heap.array_length(first).unwrap(), 3);
        assert!(heap.array_length(second).is_err());
    }

    #[test]
    fn copy_array_checks_bounds_and_kinds() {
        let mut heap = Heap::new();
        let class = ClassId::from_index(0);
        let src = heap.alloc(Object {
            class,
            body: ObjectBody::Ints(vec![3, 1, 4, 1, 5]),
            extra: Extra::None,
        });
        let dest =
            heap.alloc(Object { class, body: ObjectBody::Ints(vec![0; 5]), extra: Extra::None });
        heap.copy_array(src, 1, dest, 0, 3).unwrap();
        assert_eq!(heap.get(dest).body, ObjectBody::Ints(vec![1, 4, 1, 0, 0]));

        assert!(heap.copy_array(src, 3, dest, 0, 3).is_err());

        let chars =
            heap.alloc(Object { class, body: ObjectBody::Chars(vec![0; 5]), extra: Extra::None });
        assert!(heap.copy_array(src, 0, chars, 0, 1).is_err());
    }

    #[test]
    fn clone_drops_side_channel() {
        let mut heap = Heap::new();
        let class = ClassId::from_index(3);
        let original = heap.alloc(Object {
            class,
            body: ObjectBody::Bytes(vec![1, 2]),
            extra: Extra::Mirror(class),
        });
        let copy = heap.clone_object(original);
        assert_ne!(original, copy);
        assert_eq!(heap.get(copy).body, ObjectBody::Bytes(vec![1, 2]));
        assert_eq!(heap.get(copy).extra, Extra::None);
    }
}
