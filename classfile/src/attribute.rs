use crate::constant::ConstantPool;
use crate::cursor::Cursor;
use crate::error::ClassFileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Pool index of the catch class; 0 marks a finally handler.
    pub catch_type: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Code(CodeAttribute),
    ConstantValue { value_index: u16 },
    Exceptions { index_table: Vec<u16> },
    LineNumberTable(Vec<LineNumberEntry>),
    LocalVariableTable(Vec<LocalVariableEntry>),
    SourceFile { sourcefile_index: u16 },
    Deprecated,
    Synthetic,
    /// Unrecognized attributes keep their raw bytes for later passthrough
    /// (annotations and the like).
    Raw { name_index: u16, bytes: Vec<u8> },
}

/// Reads a u16-count-prefixed attribute table. Every attribute consumes
/// exactly `attribute_length` bytes whether or not it is recognized.
pub fn parse_attributes(
    cursor: &mut Cursor,
    pool: &ConstantPool,
) -> Result<Vec<Attribute>, ClassFileError> {
    let count = cursor.read_u16()? as usize;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        attributes.push(parse_attribute(cursor, pool)?);
    }
    Ok(attributes)
}

fn parse_attribute(cursor: &mut Cursor, pool: &ConstantPool) -> Result<Attribute, ClassFileError> {
    let name_index = cursor.read_u16()?;
    let length = cursor.read_u32()? as usize;
    let body = cursor.take(length)?;
    let mut inner = Cursor::new(body);

    let attribute = match pool.utf8(name_index)? {
        "Code" => Attribute::Code(parse_code(&mut inner, pool)?),
        "ConstantValue" => Attribute::ConstantValue { value_index: inner.read_u16()? },
        "Exceptions" => Attribute::Exceptions { index_table: inner.read_u16_table()? },
        "LineNumberTable" => {
            let count = inner.read_u16()? as usize;
            let mut table = Vec::with_capacity(count);
            for _ in 0..count {
                table.push(LineNumberEntry {
                    start_pc: inner.read_u16()?,
                    line_number: inner.read_u16()?,
                });
            }
            Attribute::LineNumberTable(table)
        }
        "LocalVariableTable" => {
            let count = inner.read_u16()? as usize;
            let mut table = Vec::with_capacity(count);
            for _ in 0..count {
                table.push(LocalVariableEntry {
                    start_pc: inner.read_u16()?,
                    length: inner.read_u16()?,
                    name_index: inner.read_u16()?,
                    descriptor_index: inner.read_u16()?,
                    index: inner.read_u16()?,
                });
            }
            Attribute::LocalVariableTable(table)
        }
        "SourceFile" => Attribute::SourceFile { sourcefile_index: inner.read_u16()? },
        "Deprecated" => Attribute::Deprecated,
        "Synthetic" => Attribute::Synthetic,
        _ => Attribute::Raw { name_index, bytes: body.to_vec() },
    };
    Ok(attribute)
}

fn parse_code(cursor: &mut Cursor, pool: &ConstantPool) -> Result<CodeAttribute, ClassFileError> {
    let max_stack = cursor.read_u16()?;
    let max_locals = cursor.read_u16()?;
    let code_length = cursor.read_u32()? as usize;
    let code = cursor.take(code_length)?.to_vec();

    let handler_count = cursor.read_u16()? as usize;
    let mut exception_table = Vec::with_capacity(handler_count);
    for _ in 0..handler_count {
        exception_table.push(ExceptionTableEntry {
            start_pc: cursor.read_u16()?,
            end_pc: cursor.read_u16()?,
            handler_pc: cursor.read_u16()?,
            catch_type: cursor.read_u16()?,
        });
    }

    let attributes = parse_attributes(cursor, pool)?;
    Ok(CodeAttribute { max_stack, max_locals, code, exception_table, attributes })
}

impl Attribute {
    pub fn code(attributes: &[Attribute]) -> Option<&CodeAttribute> {
        attributes.iter().find_map(|attr| match attr {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn constant_value_index(attributes: &[Attribute]) -> Option<u16> {
        attributes.iter().find_map(|attr| match attr {
            Attribute::ConstantValue { value_index } => Some(*value_index),
            _ => None,
        })
    }

    pub fn source_file_index(attributes: &[Attribute]) -> Option<u16> {
        attributes.iter().find_map(|attr| match attr {
            Attribute::SourceFile { sourcefile_index } => Some(*sourcefile_index),
            _ => None,
        })
    }
}
