use tracing_log::log::debug;

use crate::attribute::{Attribute, parse_attributes};
use crate::constant::ConstantPool;
use crate::cursor::Cursor;
use crate::error::ClassFileError;
use crate::flags::{ClassFlags, FieldFlags, MethodFlags};

const MAGIC: u32 = 0xCAFE_BABE;

/// Class file versions accepted by this VM: JDK 1.1 (45.x) through
/// Java 8 (52.0). Majors 46..=52 require minor 0.
const MIN_MAJOR: u16 = 45;
const MAX_MAJOR: u16 = 52;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: FieldFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: MethodFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

/// Decoded form of one class file, produced by a single forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub cp: ConstantPool,
    pub access_flags: ClassFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    pub fn parse(data: &[u8]) -> Result<ClassFile, ClassFileError> {
        let mut cursor = Cursor::new(data);

        let magic = cursor.read_u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }

        let minor_version = cursor.read_u16()?;
        let major_version = cursor.read_u16()?;
        let version_ok = major_version == MIN_MAJOR
            || ((MIN_MAJOR + 1..=MAX_MAJOR).contains(&major_version) && minor_version == 0);
        if !version_ok {
            return Err(ClassFileError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let cp = ConstantPool::parse(&mut cursor)?;
        let access_flags = ClassFlags::from_bits_truncate(cursor.read_u16()?);
        let this_class = cursor.read_u16()?;
        let super_class = cursor.read_u16()?;
        let interfaces = cursor.read_u16_table()?;

        let field_count = cursor.read_u16()? as usize;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            fields.push(FieldInfo {
                access_flags: FieldFlags::from_bits_truncate(cursor.read_u16()?),
                name_index: cursor.read_u16()?,
                descriptor_index: cursor.read_u16()?,
                attributes: parse_attributes(&mut cursor, &cp)?,
            });
        }

        let method_count = cursor.read_u16()? as usize;
        let mut methods = Vec::with_capacity(method_count);
        for _ in 0..method_count {
            methods.push(MethodInfo {
                access_flags: MethodFlags::from_bits_truncate(cursor.read_u16()?),
                name_index: cursor.read_u16()?,
                descriptor_index: cursor.read_u16()?,
                attributes: parse_attributes(&mut cursor, &cp)?,
            });
        }

        let attributes = parse_attributes(&mut cursor, &cp)?;

        if cursor.remaining() != 0 {
            return Err(ClassFileError::TrailingBytes(cursor.remaining()));
        }

        debug!(
            "decoded class file v{}.{}: {} pool slots, {} fields, {} methods",
            major_version,
            minor_version,
            cp.len(),
            fields.len(),
            methods.len(),
        );

        Ok(ClassFile {
            minor_version,
            major_version,
            cp,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    pub fn class_name(&self) -> Result<&str, ClassFileError> {
        self.cp.class_name(self.this_class)
    }

    /// `None` only for `java/lang/Object`, whose super index is 0.
    pub fn super_class_name(&self) -> Result<Option<&str>, ClassFileError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.cp.class_name(self.super_class).map(Some)
    }

    pub fn interface_names(&self) -> Result<Vec<&str>, ClassFileError> {
        self.interfaces
            .iter()
            .map(|&index| self.cp.class_name(index))
            .collect()
    }

    pub fn source_file(&self) -> Option<&str> {
        let index = Attribute::source_file_index(&self.attributes)?;
        self.cp.utf8(index).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Minimal well-formed class file builder used across the decoder
    /// tests: a class with one no-op method and no fields.
    pub(crate) fn minimal_class(major: u16, minor: u16) -> Vec<u8> {
        let mut data = MAGIC.to_be_bytes().to_vec();
        data.extend_from_slice(&minor.to_be_bytes());
        data.extend_from_slice(&major.to_be_bytes());

        // constant pool: [1] Utf8 "Test", [2] Class -> 1, [3] Utf8 "run",
        // [4] Utf8 "()V", [5] Utf8 "Code"
        data.extend_from_slice(&6u16.to_be_bytes());
        data.push(1);
        data.extend_from_slice(&4u16.to_be_bytes());
        data.extend_from_slice(b"Test");
        data.extend_from_slice(&[7, 0, 1]);
        for text in ["run", "()V", "Code"] {
            data.push(1);
            data.extend_from_slice(&(text.len() as u16).to_be_bytes());
            data.extend_from_slice(text.as_bytes());
        }

        data.extend_from_slice(&0x0021u16.to_be_bytes()); // ACC_PUBLIC | ACC_SUPER
        data.extend_from_slice(&2u16.to_be_bytes()); // this_class
        data.extend_from_slice(&0u16.to_be_bytes()); // super_class
        data.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        data.extend_from_slice(&0u16.to_be_bytes()); // fields

        data.extend_from_slice(&1u16.to_be_bytes()); // methods
        data.extend_from_slice(&0x0009u16.to_be_bytes()); // public static
        data.extend_from_slice(&3u16.to_be_bytes()); // name "run"
        data.extend_from_slice(&4u16.to_be_bytes()); // desc "()V"
        data.extend_from_slice(&1u16.to_be_bytes()); // one attribute
        data.extend_from_slice(&5u16.to_be_bytes()); // "Code"
        let code_body: &[u8] = &[
            0, 1, // max_stack
            0, 0, // max_locals
            0, 0, 0, 1, // code_length
            0xB1, // return
            0, 0, // exception table
            0, 0, // nested attributes
        ];
        data.extend_from_slice(&(code_body.len() as u32).to_be_bytes());
        data.extend_from_slice(code_body);

        data.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        data
    }

    #[test]
    fn parses_minimal_class() {
        let data = minimal_class(52, 0);
        let cf = ClassFile::parse(&data).unwrap();
        assert_eq!(cf.class_name().unwrap(), "Test");
        assert_eq!(cf.super_class_name().unwrap(), None);
        assert!(cf.access_flags.is_public());
        assert_eq!(cf.fields.len(), 0);
        assert_eq!(cf.methods.len(), 1);
        let code = Attribute::code(&cf.methods[0].attributes).unwrap();
        assert_eq!(code.code, vec![0xB1]);
        assert_eq!((code.max_stack, code.max_locals), (1, 0));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = minimal_class(52, 0);
        data[0] = 0xDE;
        assert!(matches!(ClassFile::parse(&data), Err(ClassFileError::BadMagic(_))));
    }

    #[rstest]
    #[case(45, 3, true)] // 45.x accepts any minor
    #[case(46, 0, true)]
    #[case(52, 0, true)]
    #[case(46, 1, false)]
    #[case(52, 1, false)]
    #[case(53, 0, false)]
    #[case(44, 0, false)]
    fn version_gate(#[case] major: u16, #[case] minor: u16, #[case] accepted: bool) {
        let result = ClassFile::parse(&minimal_class(major, minor));
        if accepted {
            assert!(result.is_ok());
        } else {
            assert!(matches!(
                result,
                Err(ClassFileError::UnsupportedVersion { major: m, minor: n }) if m == major && n == minor
            ));
        }
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut data = minimal_class(52, 0);
        data.push(0);
        assert!(matches!(ClassFile::parse(&data), Err(ClassFileError::TrailingBytes(1))));
    }

    #[test]
    fn truncation_is_a_format_error() {
        let data = minimal_class(52, 0);
        let truncated = &data[..data.len() - 6];
        assert!(matches!(
            ClassFile::parse(truncated),
            Err(ClassFileError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn unknown_attribute_kept_verbatim() {
        // Swap the method's "Code" attribute name for an unknown one; the
        // decoder must still consume its full length and keep the bytes.
        let mut data = minimal_class(52, 0);
        let pos = data.windows(4).position(|w| w == b"Code").unwrap();
        data[pos..pos + 4].copy_from_slice(b"Xode");
        let cf = ClassFile::parse(&data).unwrap();
        match &cf.methods[0].attributes[0] {
            Attribute::Raw { name_index, bytes } => {
                assert_eq!(*name_index, 5);
                assert_eq!(bytes.len(), 13);
            }
            other => panic!("expected raw attribute, got {other:?}"),
        }
    }
}
