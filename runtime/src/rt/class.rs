use hervor_classfile::flags::ClassFlags;

use crate::heap::HeapRef;
use crate::keys::{ClassId, FieldKey, MethodId, Symbol};
use crate::rt::InitState;
use crate::rt::constant_pool::RuntimeConstantPool;
use crate::rt::field::Field;
use crate::stack::Slots;

/// What a class name denotes: a regular (or interface) class backed by a
/// class file, a synthesized primitive, or a synthesized array class
/// carrying its element class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Instance,
    Primitive,
    Array { element: ClassId },
}

/// Runtime form of one class. Classes live in the method-area arena for
/// the process lifetime; all cross-references are ids, so the cyclic
/// class graph never becomes an ownership cycle.
pub struct Class {
    pub name: Symbol,
    /// Package prefix of `name` (empty symbol for the default package);
    /// access checks compare these directly.
    pub package: Symbol,
    pub flags: ClassFlags,
    pub kind: ClassKind,
    pub super_name: Option<Symbol>,
    pub interface_names: Vec<Symbol>,
    pub super_class: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub cp: RuntimeConstantPool,
    pub fields: Vec<Field>,
    pub methods: Vec<MethodId>,
    pub source_file: Option<Symbol>,
    /// Slot total for instances, inherited fields included.
    pub instance_slot_count: usize,
    pub static_slot_count: usize,
    pub static_vars: Slots,
    pub init_state: InitState,
    /// The `java/lang/Class` mirror; attachment is deferred during boot
    /// until `java/lang/Class` itself is loaded.
    pub mirror: Option<HeapRef>,
}

impl Class {
    pub fn is_interface(&self) -> bool {
        self.flags.is_interface()
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.is_abstract()
    }

    pub fn is_public(&self) -> bool {
        self.flags.is_public()
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ClassKind::Array { .. })
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, ClassKind::Primitive)
    }

    pub fn element_class(&self) -> Option<ClassId> {
        match self.kind {
            ClassKind::Array { element } => Some(element),
            _ => None,
        }
    }

    /// Field declared on this class itself (no inherited walk).
    pub fn find_field(&self, key: &FieldKey) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.name == key.name && field.desc == key.desc)
    }

    pub fn field(&self, index: usize) -> &Field {
        &self.fields[index]
    }
}
