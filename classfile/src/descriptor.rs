use crate::error::ClassFileError;

/// Parsed form of a field descriptor (JVMS §4.3.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn parse(descriptor: &str) -> Result<FieldType, ClassFileError> {
        let mut chars = descriptor.chars();
        let parsed = parse_field_type(&mut chars, descriptor)?;
        if chars.next().is_some() {
            return Err(ClassFileError::MalformedDescriptor(descriptor.to_string()));
        }
        Ok(parsed)
    }

    /// Slots claimed in a local-variable array or operand stack.
    pub fn slot_width(&self) -> u16 {
        match self {
            FieldType::Long | FieldType::Double => 2,
            _ => 1,
        }
    }

    pub fn is_long_or_double(&self) -> bool {
        matches!(self, FieldType::Long | FieldType::Double)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Value(FieldType),
}

/// Parsed form of a method descriptor, e.g. `(I[Ljava/lang/String;)V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub ret: ReturnType,
}

impl MethodDescriptor {
    pub fn parse(descriptor: &str) -> Result<MethodDescriptor, ClassFileError> {
        let malformed = || ClassFileError::MalformedDescriptor(descriptor.to_string());

        let mut chars = descriptor.chars();
        if chars.next() != Some('(') {
            return Err(malformed());
        }

        let mut params = Vec::new();
        loop {
            match chars.clone().next() {
                Some(')') => {
                    chars.next();
                    break;
                }
                Some(_) => params.push(parse_field_type(&mut chars, descriptor)?),
                None => return Err(malformed()),
            }
        }

        let ret = if chars.clone().next() == Some('V') {
            chars.next();
            ReturnType::Void
        } else {
            ReturnType::Value(parse_field_type(&mut chars, descriptor)?)
        };
        if chars.next().is_some() {
            return Err(malformed());
        }

        Ok(MethodDescriptor { params, ret })
    }

    /// Parameter slot total, not counting any receiver slot.
    pub fn param_slot_count(&self) -> u16 {
        self.params.iter().map(FieldType::slot_width).sum()
    }
}

fn parse_field_type(
    chars: &mut std::str::Chars,
    whole: &str,
) -> Result<FieldType, ClassFileError> {
    let malformed = || ClassFileError::MalformedDescriptor(whole.to_string());

    match chars.next().ok_or_else(malformed)? {
        'B' => Ok(FieldType::Byte),
        'C' => Ok(FieldType::Char),
        'D' => Ok(FieldType::Double),
        'F' => Ok(FieldType::Float),
        'I' => Ok(FieldType::Int),
        'J' => Ok(FieldType::Long),
        'S' => Ok(FieldType::Short),
        'Z' => Ok(FieldType::Boolean),
        'L' => {
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some(';') => break,
                    Some(c) => name.push(c),
                    None => return Err(malformed()),
                }
            }
            if name.is_empty() {
                return Err(malformed());
            }
            Ok(FieldType::Object(name))
        }
        '[' => Ok(FieldType::Array(Box::new(parse_field_type(chars, whole)?))),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("()V", 0)]
    #[case("(II)V", 2)]
    #[case("(JD)V", 4)]
    #[case("(Ljava/lang/String;[IJ)I", 4)]
    #[case("([[D)V", 1)]
    fn param_slot_counts(#[case] descriptor: &str, #[case] slots: u16) {
        let parsed = MethodDescriptor::parse(descriptor).unwrap();
        assert_eq!(parsed.param_slot_count(), slots);
    }

    #[test]
    fn parses_nested_array_of_objects() {
        let parsed = FieldType::parse("[[Ljava/lang/Object;").unwrap();
        assert_eq!(
            parsed,
            FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Object(
                "java/lang/Object".to_string()
            )))))
        );
        assert_eq!(parsed.slot_width(), 1);
    }

    #[test]
    fn return_kinds() {
        assert_eq!(MethodDescriptor::parse("()V").unwrap().ret, ReturnType::Void);
        assert_eq!(
            MethodDescriptor::parse("()[B").unwrap().ret,
            ReturnType::Value(FieldType::Array(Box::new(FieldType::Byte)))
        );
    }

    #[rstest]
    #[case("")]
    #[case("X")]
    #[case("II")]
    #[case("L;")]
    #[case("(IV")]
    #[case("()VV")]
    #[case("()Q")]
    fn rejects_malformed(#[case] descriptor: &str) {
        let field = FieldType::parse(descriptor);
        let method = MethodDescriptor::parse(descriptor);
        assert!(field.is_err() && method.is_err(), "{descriptor} should not parse");
    }
}
