use hervor_classfile::class_file::FieldInfo;
use hervor_classfile::constant::ConstantPool;
use hervor_classfile::descriptor::FieldType;
use hervor_classfile::flags::FieldFlags;
use lasso::ThreadedRodeo;

use crate::error::JvmError;
use crate::keys::Symbol;

pub struct Field {
    pub flags: FieldFlags,
    pub name: Symbol,
    pub desc: Symbol,
    pub field_type: FieldType,
    /// Offset into the instance slot block or the class's static block,
    /// assigned exactly once during linking.
    pub slot_id: usize,
    pub const_value_index: Option<u16>,
}

impl Field {
    /// Builds a field from its decoded form. Parsing the descriptor here
    /// is the verification the linker performs on fields.
    pub fn new(
        info: &FieldInfo,
        pool: &ConstantPool,
        interner: &ThreadedRodeo,
    ) -> Result<Field, JvmError> {
        let desc_str = pool.utf8(info.descriptor_index)?;
        let field_type = FieldType::parse(desc_str)?;
        Ok(Field {
            flags: info.access_flags,
            name: interner.get_or_intern(pool.utf8(info.name_index)?),
            desc: interner.get_or_intern(desc_str),
            field_type,
            slot_id: 0,
            const_value_index: hervor_classfile::attribute::Attribute::constant_value_index(
                &info.attributes,
            ),
        })
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    pub fn is_final(&self) -> bool {
        self.flags.is_final()
    }

    /// `long` and `double` fields claim two consecutive slot ids.
    pub fn is_long_or_double(&self) -> bool {
        self.field_type.is_long_or_double()
    }
}
