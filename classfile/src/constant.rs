use num_enum::TryFromPrimitive;
use tracing_log::log::trace;

use crate::cursor::Cursor;
use crate::error::ClassFileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ConstantTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    InvokeDynamic = 18,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantInfo {
    /// Index 0 sentinel and the reserved slot following a Long/Double.
    Unused,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef(MemberRefInfo),
    MethodRef(MemberRefInfo),
    InterfaceMethodRef(MemberRefInfo),
    NameAndType(NameAndTypeInfo),
    /// InvokeDynamic-family entries are carried as raw operand bytes; the
    /// runtime never resolves them but attribute data may index past them.
    Unparsed { tag: ConstantTag, bytes: Vec<u8> },
}

/// 1-indexed constant pool. `entries[0]` is a sentinel and every
/// Long/Double claims the following index as well (JVMS §4.4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool {
    entries: Vec<ConstantInfo>,
}

impl ConstantPool {
    pub fn parse(cursor: &mut Cursor) -> Result<Self, ClassFileError> {
        let count = cursor.read_u16()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(ConstantInfo::Unused);

        while entries.len() < count {
            let index = entries.len() as u16;
            let tag_byte = cursor.read_u8()?;
            let tag = ConstantTag::try_from(tag_byte)
                .map_err(|_| ClassFileError::UnknownConstantTag { tag: tag_byte, index })?;
            let two_slots = matches!(tag, ConstantTag::Long | ConstantTag::Double);

            let entry = match tag {
                ConstantTag::Utf8 => {
                    let length = cursor.read_u16()? as usize;
                    let bytes = cursor.take(length)?;
                    let text = cesu8::from_java_cesu8(bytes)
                        .map_err(|_| ClassFileError::MalformedUtf8(index))?;
                    ConstantInfo::Utf8(text.into_owned())
                }
                ConstantTag::Integer => ConstantInfo::Integer(cursor.read_i32()?),
                ConstantTag::Float => ConstantInfo::Float(cursor.read_f32()?),
                ConstantTag::Long => ConstantInfo::Long(cursor.read_u64()? as i64),
                ConstantTag::Double => ConstantInfo::Double(cursor.read_f64()?),
                ConstantTag::Class => ConstantInfo::Class { name_index: cursor.read_u16()? },
                ConstantTag::String => ConstantInfo::String { string_index: cursor.read_u16()? },
                ConstantTag::FieldRef => ConstantInfo::FieldRef(MemberRefInfo {
                    class_index: cursor.read_u16()?,
                    name_and_type_index: cursor.read_u16()?,
                }),
                ConstantTag::MethodRef => ConstantInfo::MethodRef(MemberRefInfo {
                    class_index: cursor.read_u16()?,
                    name_and_type_index: cursor.read_u16()?,
                }),
                ConstantTag::InterfaceMethodRef => {
                    ConstantInfo::InterfaceMethodRef(MemberRefInfo {
                        class_index: cursor.read_u16()?,
                        name_and_type_index: cursor.read_u16()?,
                    })
                }
                ConstantTag::NameAndType => ConstantInfo::NameAndType(NameAndTypeInfo {
                    name_index: cursor.read_u16()?,
                    descriptor_index: cursor.read_u16()?,
                }),
                ConstantTag::MethodHandle => ConstantInfo::Unparsed {
                    tag,
                    bytes: cursor.take(3)?.to_vec(),
                },
                ConstantTag::MethodType => ConstantInfo::Unparsed {
                    tag,
                    bytes: cursor.take(2)?.to_vec(),
                },
                ConstantTag::InvokeDynamic => ConstantInfo::Unparsed {
                    tag,
                    bytes: cursor.take(4)?.to_vec(),
                },
            };

            entries.push(entry);
            if two_slots {
                entries.push(ConstantInfo::Unused);
            }
        }

        trace!("decoded constant pool with {} entries", entries.len());
        Ok(ConstantPool { entries })
    }

    /// Number of pool slots including the index-0 sentinel, i.e. the
    /// `constant_pool_count` the file declared.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn entries(&self) -> &[ConstantInfo] {
        &self.entries
    }

    pub fn get(&self, index: u16) -> Result<&ConstantInfo, ClassFileError> {
        if index == 0 {
            return Err(ClassFileError::InvalidPoolIndex(index));
        }
        self.entries
            .get(index as usize)
            .ok_or(ClassFileError::InvalidPoolIndex(index))
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index)? {
            ConstantInfo::Utf8(text) => Ok(text),
            _ => Err(ClassFileError::UnexpectedConstant { index, expected: "Utf8" }),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index)? {
            ConstantInfo::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFileError::UnexpectedConstant { index, expected: "Class" }),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), ClassFileError> {
        match self.get(index)? {
            ConstantInfo::NameAndType(info) => {
                Ok((self.utf8(info.name_index)?, self.utf8(info.descriptor_index)?))
            }
            _ => Err(ClassFileError::UnexpectedConstant { index, expected: "NameAndType" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_bytes(count: u16, body: &[u8]) -> Vec<u8> {
        let mut data = count.to_be_bytes().to_vec();
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn long_and_double_claim_two_slots() {
        // count 6: [1]=Long (occupies 2), [3]=Double (occupies 2), [5]=Integer
        let mut body = vec![5u8];
        body.extend_from_slice(&0x0000_0001_0000_0002u64.to_be_bytes());
        body.push(6);
        body.extend_from_slice(&2.5f64.to_bits().to_be_bytes());
        body.push(3);
        body.extend_from_slice(&7i32.to_be_bytes());
        let data = pool_bytes(6, &body);

        let pool = ConstantPool::parse(&mut Cursor::new(&data)).unwrap();
        assert_eq!(pool.len(), 6);
        assert_eq!(pool.get(1).unwrap(), &ConstantInfo::Long(0x1_0000_0002));
        assert_eq!(pool.get(2).unwrap(), &ConstantInfo::Unused);
        assert_eq!(pool.get(3).unwrap(), &ConstantInfo::Double(2.5));
        assert_eq!(pool.get(4).unwrap(), &ConstantInfo::Unused);
        assert_eq!(pool.get(5).unwrap(), &ConstantInfo::Integer(7));
    }

    #[test]
    fn utf8_and_class_lookup() {
        // [1]=Utf8 "java/lang/Object", [2]=Class -> 1
        let name = b"java/lang/Object";
        let mut body = vec![1u8];
        body.extend_from_slice(&(name.len() as u16).to_be_bytes());
        body.extend_from_slice(name);
        body.extend_from_slice(&[7, 0, 1]);
        let data = pool_bytes(3, &body);

        let pool = ConstantPool::parse(&mut Cursor::new(&data)).unwrap();
        assert_eq!(pool.utf8(1).unwrap(), "java/lang/Object");
        assert_eq!(pool.class_name(2).unwrap(), "java/lang/Object");
        assert!(matches!(
            pool.class_name(1),
            Err(ClassFileError::UnexpectedConstant { index: 1, expected: "Class" })
        ));
    }

    #[test]
    fn index_zero_is_unusable() {
        let pool = ConstantPool::parse(&mut Cursor::new(&pool_bytes(1, &[]))).unwrap();
        assert!(matches!(pool.get(0), Err(ClassFileError::InvalidPoolIndex(0))));
    }

    #[test]
    fn unknown_tag_is_a_format_error() {
        let data = pool_bytes(2, &[13u8, 0, 0]);
        assert!(matches!(
            ConstantPool::parse(&mut Cursor::new(&data)),
            Err(ClassFileError::UnknownConstantTag { tag: 13, index: 1 })
        ));
    }

    #[test]
    fn invoke_dynamic_family_is_retained_raw() {
        let body = [15u8, 6, 0, 9, 18, 0, 1, 0, 2];
        let data = pool_bytes(3, &body);
        let pool = ConstantPool::parse(&mut Cursor::new(&data)).unwrap();
        assert_eq!(
            pool.get(1).unwrap(),
            &ConstantInfo::Unparsed { tag: ConstantTag::MethodHandle, bytes: vec![6, 0, 9] }
        );
        assert_eq!(
            pool.get(2).unwrap(),
            &ConstantInfo::Unparsed { tag: ConstantTag::InvokeDynamic, bytes: vec![0, 1, 0, 2] }
        );
    }
}
