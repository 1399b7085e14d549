use std::sync::Arc;

use hervor_classfile::attribute::{Attribute, ExceptionTableEntry, LineNumberEntry};
use hervor_classfile::class_file::MethodInfo;
use hervor_classfile::constant::ConstantPool;
use hervor_classfile::descriptor::{FieldType, MethodDescriptor, ReturnType};
use hervor_classfile::flags::MethodFlags;
use lasso::ThreadedRodeo;

use crate::error::JvmError;
use crate::keys::{ClassId, Symbol};

/// Reserved opcode driving the native dispatch path.
pub const OPCODE_INVOKE_NATIVE: u8 = 0xFE;

const OPCODE_IRETURN: u8 = 0xAC;
const OPCODE_LRETURN: u8 = 0xAD;
const OPCODE_FRETURN: u8 = 0xAE;
const OPCODE_DRETURN: u8 = 0xAF;
const OPCODE_ARETURN: u8 = 0xB0;
const OPCODE_RETURN: u8 = 0xB1;

pub struct Method {
    pub class: ClassId,
    pub name: Symbol,
    pub desc: Symbol,
    pub flags: MethodFlags,
    pub max_stack: usize,
    pub max_locals: usize,
    pub code: Arc<[u8]>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub line_numbers: Option<Vec<LineNumberEntry>>,
    /// Class names from the `Exceptions` attribute, resolved to symbols
    /// at link time.
    pub declared_exceptions: Vec<Symbol>,
    pub descriptor: MethodDescriptor,
    /// Parameter slot total plus one for the receiver of a non-static
    /// method; `J` and `D` parameters count twice.
    pub arg_slot_count: usize,
}

impl Method {
    pub fn new(
        class: ClassId,
        info: &MethodInfo,
        pool: &ConstantPool,
        interner: &ThreadedRodeo,
    ) -> Result<Method, JvmError> {
        let desc_str = pool.utf8(info.descriptor_index)?;
        let descriptor = MethodDescriptor::parse(desc_str)?;

        let mut arg_slot_count = descriptor.param_slot_count() as usize;
        if !info.access_flags.is_static() {
            arg_slot_count += 1;
        }

        let mut declared_exceptions = Vec::new();
        for attr in &info.attributes {
            if let Attribute::Exceptions { index_table } = attr {
                for &index in index_table {
                    declared_exceptions.push(interner.get_or_intern(pool.class_name(index)?));
                }
            }
        }

        let mut method = Method {
            class,
            name: interner.get_or_intern(pool.utf8(info.name_index)?),
            desc: interner.get_or_intern(desc_str),
            flags: info.access_flags,
            max_stack: 0,
            max_locals: 0,
            code: Arc::from(&[][..]),
            exception_table: Vec::new(),
            line_numbers: None,
            declared_exceptions,
            descriptor,
            arg_slot_count,
        };

        if info.access_flags.is_native() {
            method.inject_native_code();
        } else if let Some(code) = Attribute::code(&info.attributes) {
            method.max_stack = code.max_stack as usize;
            method.max_locals = code.max_locals as usize;
            method.code = Arc::from(code.code.as_slice());
            method.exception_table = code.exception_table.clone();
            method.line_numbers = code.attributes.iter().find_map(|attr| match attr {
                Attribute::LineNumberTable(table) => Some(table.clone()),
                _ => None,
            });
        }
        Ok(method)
    }

    /// Native methods get a synthetic two-byte body so the dispatch loop
    /// handles them uniformly: the reserved opcode followed by the return
    /// opcode matching the descriptor's return type.
    fn inject_native_code(&mut self) {
        let return_op = match &self.descriptor.ret {
            ReturnType::Void => OPCODE_RETURN,
            ReturnType::Value(FieldType::Object(_)) | ReturnType::Value(FieldType::Array(_)) => {
                OPCODE_ARETURN
            }
            ReturnType::Value(FieldType::Double) => OPCODE_DRETURN,
            ReturnType::Value(FieldType::Float) => OPCODE_FRETURN,
            ReturnType::Value(FieldType::Long) => OPCODE_LRETURN,
            ReturnType::Value(_) => OPCODE_IRETURN,
        };
        self.max_stack = 4;
        self.max_locals = self.arg_slot_count;
        self.code = Arc::from(&[OPCODE_INVOKE_NATIVE, return_op][..]);
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    pub fn is_native(&self) -> bool {
        self.flags.is_native()
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.is_abstract()
    }

    /// Source line for a pc: -2 for native frames, -1 with no table.
    pub fn line_number(&self, pc: usize) -> i32 {
        if self.is_native() {
            return -2;
        }
        let Some(table) = &self.line_numbers else {
            return -1;
        };
        table
            .iter()
            .rev()
            .find(|entry| entry.start_pc as usize <= pc)
            .map(|entry| entry.line_number as i32)
            .unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use hervor_classfile::cursor::Cursor;
    use hervor_classfile::flags::MethodFlags;
    use rstest::rstest;

    use super::*;

    fn pool_with(texts: &[&str]) -> ConstantPool {
        let mut data = ((texts.len() + 1) as u16).to_be_bytes().to_vec();
        for text in texts {
            data.push(1);
            data.extend_from_slice(&(text.len() as u16).to_be_bytes());
            data.extend_from_slice(text.as_bytes());
        }
        ConstantPool::parse(&mut Cursor::new(&data)).unwrap()
    }

    #[rstest]
    #[case("()V", OPCODE_RETURN)]
    #[case("()Ljava/lang/Object;", OPCODE_ARETURN)]
    #[case("()[I", OPCODE_ARETURN)]
    #[case("()D", OPCODE_DRETURN)]
    #[case("()F", OPCODE_FRETURN)]
    #[case("()J", OPCODE_LRETURN)]
    #[case("()I", OPCODE_IRETURN)]
    #[case("()Z", OPCODE_IRETURN)]
    fn native_injection_selects_return_by_descriptor(
        #[case] desc: &str,
        #[case] return_op: u8,
    ) {
        let interner = ThreadedRodeo::default();
        let pool = pool_with(&["probe", desc]);
        let info = MethodInfo {
            access_flags: MethodFlags::NATIVE | MethodFlags::STATIC,
            name_index: 1,
            descriptor_index: 2,
            attributes: Vec::new(),
        };
        let method = Method::new(ClassId::from_index(0), &info, &pool, &interner).unwrap();
        assert_eq!(&method.code[..], &[OPCODE_INVOKE_NATIVE, return_op]);
        assert_eq!(method.max_locals, method.arg_slot_count);
        assert_eq!(method.line_number(0), -2);
    }

    #[rstest]
    #[case("()V", true, 0)]
    #[case("()V", false, 1)]
    #[case("(IJ)V", true, 3)]
    #[case("(JD)V", false, 5)]
    #[case("(Ljava/lang/String;Z)V", false, 3)]
    fn arg_slot_count_counts_receiver_and_wide_params(
        #[case] desc: &str,
        #[case] is_static: bool,
        #[case] slots: usize,
    ) {
        let interner = ThreadedRodeo::default();
        let pool = pool_with(&["m", desc]);
        let flags = if is_static { MethodFlags::STATIC } else { MethodFlags::PUBLIC };
        let info = MethodInfo {
            access_flags: flags,
            name_index: 1,
            descriptor_index: 2,
            attributes: Vec::new(),
        };
        let method = Method::new(ClassId::from_index(0), &info, &pool, &interner).unwrap();
        assert_eq!(method.arg_slot_count, slots);
    }
}
