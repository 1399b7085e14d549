use std::fmt::{self, Display};

use hervor_classfile::ClassFileError;

use crate::heap::HeapRef;

/// Errors surfaced while the VM runs. Java-visible conditions travel as
/// [`JvmError::Exception`] (to be materialized into a throwable object)
/// or [`JvmError::Thrown`] (an already-materialized reference); the
/// remaining variants are fatal and abort after the frame trace is
/// logged.
#[derive(Debug)]
pub enum JvmError {
    Exception(JavaException),
    Thrown(HeapRef),

    MalformedDescriptor(String),
    UnknownOpcode { opcode: u8, pc: usize },
    UnsupportedInstruction(&'static str),
    JreNotFound,
    MainClassNotFound(String),
    MainMethodNotFound(String),
    FrameStackIsEmpty,
    OperandStackUnderflow,
    UncaughtException,
    Internal(String),
}

impl From<hervor_classfile::cursor::CursorError> for JvmError {
    fn from(value: hervor_classfile::cursor::CursorError) -> Self {
        let hervor_classfile::cursor::CursorError::UnexpectedEof { position, wanted } = value;
        JvmError::Internal(format!("bytecode truncated: wanted {wanted} bytes at pc {position}"))
    }
}

impl From<ClassFileError> for JvmError {
    fn from(value: ClassFileError) -> Self {
        match value {
            ClassFileError::UnsupportedVersion { major, minor } => {
                JvmError::Exception(JavaException::with_message(
                    JavaExceptionKind::UnsupportedClassVersionError,
                    format!("{major}.{minor}"),
                ))
            }
            ClassFileError::MalformedDescriptor(desc) => JvmError::MalformedDescriptor(desc),
            other => JvmError::Exception(JavaException::with_message(
                JavaExceptionKind::ClassFormatError,
                other.to_string(),
            )),
        }
    }
}

impl Display for JvmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JvmError::Exception(ex) => write!(f, "{ex}"),
            JvmError::Thrown(_) => write!(f, "uncaught java exception"),
            JvmError::MalformedDescriptor(desc) => write!(f, "malformed descriptor: {desc}"),
            JvmError::UnknownOpcode { opcode, pc } => {
                write!(f, "unknown opcode {opcode:#04x} at pc {pc}")
            }
            JvmError::UnsupportedInstruction(name) => {
                write!(f, "unsupported instruction: {name}")
            }
            JvmError::JreNotFound => {
                write!(f, "can not find jre folder (use --jre or set JAVA_HOME)")
            }
            JvmError::MainClassNotFound(name) => write!(f, "could not find or load class {name}"),
            JvmError::MainMethodNotFound(name) => {
                write!(f, "main method not found in class {name}")
            }
            JvmError::FrameStackIsEmpty => write!(f, "frame stack is empty"),
            JvmError::OperandStackUnderflow => write!(f, "operand stack underflow"),
            JvmError::UncaughtException => write!(f, "uncaught exception"),
            JvmError::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaExceptionKind {
    ClassFormatError,
    UnsupportedClassVersionError,
    ClassNotFoundException,
    NoClassDefFoundError,
    IncompatibleClassChangeError,
    NoSuchFieldError,
    NoSuchMethodError,
    IllegalAccessError,
    InstantiationError,
    AbstractMethodError,
    UnsatisfiedLinkError,
    NullPointerException,
    ArrayIndexOutOfBoundsException,
    ArithmeticException,
    ClassCastException,
    NegativeArraySizeException,
    ArrayStoreException,
    StackOverflowError,
    InternalError,
}

impl JavaExceptionKind {
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::ClassFormatError => "java/lang/ClassFormatError",
            Self::UnsupportedClassVersionError => "java/lang/UnsupportedClassVersionError",
            Self::ClassNotFoundException => "java/lang/ClassNotFoundException",
            Self::NoClassDefFoundError => "java/lang/NoClassDefFoundError",
            Self::IncompatibleClassChangeError => "java/lang/IncompatibleClassChangeError",
            Self::NoSuchFieldError => "java/lang/NoSuchFieldError",
            Self::NoSuchMethodError => "java/lang/NoSuchMethodError",
            Self::IllegalAccessError => "java/lang/IllegalAccessError",
            Self::InstantiationError => "java/lang/InstantiationError",
            Self::AbstractMethodError => "java/lang/AbstractMethodError",
            Self::UnsatisfiedLinkError => "java/lang/UnsatisfiedLinkError",
            Self::NullPointerException => "java/lang/NullPointerException",
            Self::ArrayIndexOutOfBoundsException => "java/lang/ArrayIndexOutOfBoundsException",
            Self::ArithmeticException => "java/lang/ArithmeticException",
            Self::ClassCastException => "java/lang/ClassCastException",
            Self::NegativeArraySizeException => "java/lang/NegativeArraySizeException",
            Self::ArrayStoreException => "java/lang/ArrayStoreException",
            Self::StackOverflowError => "java/lang/StackOverflowError",
            Self::InternalError => "java/lang/InternalError",
        }
    }

    pub fn class_name_dot(self) -> String {
        self.class_name().replace('/', ".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaException {
    pub kind: JavaExceptionKind,
    pub message: Option<String>,
}

impl JavaException {
    pub fn new(kind: JavaExceptionKind) -> Self {
        JavaException { kind, message: None }
    }

    pub fn with_message(kind: JavaExceptionKind, message: impl Into<String>) -> Self {
        JavaException { kind, message: Some(message.into()) }
    }
}

impl Display for JavaException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.kind.class_name_dot()),
            None => write!(f, "{}", self.kind.class_name_dot()),
        }
    }
}

/// Builds a `JvmError::Exception` value of the named kind.
#[macro_export]
macro_rules! build_exception {
    ($kind:ident) => {
        $crate::error::JvmError::Exception($crate::error::JavaException::new(
            $crate::error::JavaExceptionKind::$kind,
        ))
    };
    ($kind:ident, $($arg:tt)+) => {
        $crate::error::JvmError::Exception($crate::error::JavaException::with_message(
            $crate::error::JavaExceptionKind::$kind,
            format!($($arg)+),
        ))
    };
}

/// Early-returns an `Err` holding the named exception.
#[macro_export]
macro_rules! throw_exception {
    ($kind:ident) => {
        return Err($crate::build_exception!($kind))
    };
    ($kind:ident, $($arg:tt)+) => {
        return Err($crate::build_exception!($kind, $($arg)+))
    };
}
