use hervor_classfile::constant::{ConstantInfo, ConstantPool};
use lasso::ThreadedRodeo;
use once_cell::sync::OnceCell;

use crate::error::JvmError;
use crate::keys::{ClassId, MethodId, Symbol};
use crate::{build_exception, throw_exception};

/// Symbolic class reference. `resolved` is filled on first use and the
/// cached id is returned on every later resolution.
pub struct ClassEntry {
    pub name: Symbol,
    pub resolved: OnceCell<ClassId>,
}

/// Symbolic field reference: owning class name plus name-and-type. The
/// cache holds the declaring class and the field's index within it.
pub struct FieldRefEntry {
    pub class_name: Symbol,
    pub name: Symbol,
    pub desc: Symbol,
    pub resolved: OnceCell<(ClassId, usize)>,
}

/// Symbolic method reference, shared by plain and interface method refs.
pub struct MethodRefEntry {
    pub class_name: Symbol,
    pub name: Symbol,
    pub desc: Symbol,
    pub resolved: OnceCell<(ClassId, MethodId)>,
}

pub enum RuntimeConstant {
    Unused,
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Utf8(Symbol),
    StringLiteral(Symbol),
    Class(ClassEntry),
    FieldRef(FieldRefEntry),
    MethodRef(MethodRefEntry),
    InterfaceMethodRef(MethodRefEntry),
    NameAndType { name: Symbol, desc: Symbol },
    /// InvokeDynamic-family entries; never resolved by this VM.
    Unparsed,
}

/// Runtime constant pool: the decoded pool flattened into interned
/// symbols with lazily-resolved symbolic references. Keeps the decoded
/// pool's 1-based indexing and two-slot accounting.
pub struct RuntimeConstantPool {
    entries: Vec<RuntimeConstant>,
}

impl RuntimeConstantPool {
    pub fn empty() -> Self {
        RuntimeConstantPool { entries: Vec::new() }
    }

    pub fn new(pool: &ConstantPool, interner: &ThreadedRodeo) -> Result<Self, JvmError> {
        let mut entries = Vec::with_capacity(pool.len());
        for (index, info) in pool.entries().iter().enumerate() {
            let entry = match info {
                ConstantInfo::Unused => RuntimeConstant::Unused,
                ConstantInfo::Integer(v) => RuntimeConstant::Integer(*v),
                ConstantInfo::Float(v) => RuntimeConstant::Float(*v),
                ConstantInfo::Long(v) => RuntimeConstant::Long(*v),
                ConstantInfo::Double(v) => RuntimeConstant::Double(*v),
                ConstantInfo::Utf8(text) => RuntimeConstant::Utf8(interner.get_or_intern(text)),
                ConstantInfo::String { string_index } => {
                    RuntimeConstant::StringLiteral(interner.get_or_intern(pool.utf8(*string_index)?))
                }
                ConstantInfo::Class { .. } => RuntimeConstant::Class(ClassEntry {
                    name: interner.get_or_intern(pool.class_name(index as u16)?),
                    resolved: OnceCell::new(),
                }),
                ConstantInfo::FieldRef(member) => {
                    let (name, desc) = pool.name_and_type(member.name_and_type_index)?;
                    RuntimeConstant::FieldRef(FieldRefEntry {
                        class_name: interner.get_or_intern(pool.class_name(member.class_index)?),
                        name: interner.get_or_intern(name),
                        desc: interner.get_or_intern(desc),
                        resolved: OnceCell::new(),
                    })
                }
                ConstantInfo::MethodRef(member) | ConstantInfo::InterfaceMethodRef(member) => {
                    let (name, desc) = pool.name_and_type(member.name_and_type_index)?;
                    let entry = MethodRefEntry {
                        class_name: interner.get_or_intern(pool.class_name(member.class_index)?),
                        name: interner.get_or_intern(name),
                        desc: interner.get_or_intern(desc),
                        resolved: OnceCell::new(),
                    };
                    if matches!(info, ConstantInfo::MethodRef(_)) {
                        RuntimeConstant::MethodRef(entry)
                    } else {
                        RuntimeConstant::InterfaceMethodRef(entry)
                    }
                }
                ConstantInfo::NameAndType(info) => RuntimeConstant::NameAndType {
                    name: interner.get_or_intern(pool.utf8(info.name_index)?),
                    desc: interner.get_or_intern(pool.utf8(info.descriptor_index)?),
                },
                ConstantInfo::Unparsed { .. } => RuntimeConstant::Unparsed,
            };
            entries.push(entry);
        }
        Ok(RuntimeConstantPool { entries })
    }

    pub fn get(&self, index: u16) -> Result<&RuntimeConstant, JvmError> {
        if index == 0 {
            throw_exception!(ClassFormatError, "constant pool index 0 is unusable");
        }
        self.entries.get(index as usize).ok_or(build_exception!(
            ClassFormatError,
            "constant pool index {index} out of range"
        ))
    }

    pub fn class_entry(&self, index: u16) -> Result<&ClassEntry, JvmError> {
        match self.get(index)? {
            RuntimeConstant::Class(entry) => Ok(entry),
            _ => Err(self.mismatch(index, "Class")),
        }
    }

    pub fn field_ref(&self, index: u16) -> Result<&FieldRefEntry, JvmError> {
        match self.get(index)? {
            RuntimeConstant::FieldRef(entry) => Ok(entry),
            _ => Err(self.mismatch(index, "Fieldref")),
        }
    }

    pub fn method_ref(&self, index: u16) -> Result<&MethodRefEntry, JvmError> {
        match self.get(index)? {
            RuntimeConstant::MethodRef(entry) => Ok(entry),
            _ => Err(self.mismatch(index, "Methodref")),
        }
    }

    pub fn interface_method_ref(&self, index: u16) -> Result<&MethodRefEntry, JvmError> {
        match self.get(index)? {
            RuntimeConstant::InterfaceMethodRef(entry) => Ok(entry),
            _ => Err(self.mismatch(index, "InterfaceMethodref")),
        }
    }

    fn mismatch(&self, index: u16, expected: &str) -> JvmError {
        build_exception!(
            IncompatibleClassChangeError,
            "constant pool index {index} does not hold a {expected}"
        )
    }
}
