use std::fmt::{self, Display};

use crate::cursor::CursorError;

#[derive(Debug, Clone, PartialEq)]
pub enum ClassFileError {
    UnexpectedEof { position: usize, wanted: usize },
    BadMagic(u32),
    UnsupportedVersion { major: u16, minor: u16 },
    UnknownConstantTag { tag: u8, index: u16 },
    InvalidPoolIndex(u16),
    UnexpectedConstant { index: u16, expected: &'static str },
    MalformedUtf8(u16),
    TrailingBytes(usize),
    MalformedDescriptor(String),
}

impl From<CursorError> for ClassFileError {
    fn from(value: CursorError) -> Self {
        let CursorError::UnexpectedEof { position, wanted } = value;
        ClassFileError::UnexpectedEof { position, wanted }
    }
}

impl Display for ClassFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassFileError::UnexpectedEof { position, wanted } => {
                write!(f, "truncated class file: wanted {wanted} bytes at offset {position}")
            }
            ClassFileError::BadMagic(magic) => write!(f, "bad magic number: {magic:#010x}"),
            ClassFileError::UnsupportedVersion { major, minor } => {
                write!(f, "unsupported class file version {major}.{minor}")
            }
            ClassFileError::UnknownConstantTag { tag, index } => {
                write!(f, "unknown constant pool tag {tag} at index {index}")
            }
            ClassFileError::InvalidPoolIndex(idx) => {
                write!(f, "constant pool index {idx} out of range")
            }
            ClassFileError::UnexpectedConstant { index, expected } => {
                write!(f, "constant pool index {index} does not hold a {expected}")
            }
            ClassFileError::MalformedUtf8(idx) => {
                write!(f, "malformed modified-UTF-8 constant at index {idx}")
            }
            ClassFileError::TrailingBytes(n) => {
                write!(f, "{n} trailing bytes after class file structure")
            }
            ClassFileError::MalformedDescriptor(desc) => {
                write!(f, "malformed descriptor: {desc}")
            }
        }
    }
}

impl std::error::Error for ClassFileError {}
