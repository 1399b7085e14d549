//! Decoder for the JVM class file format (JVMS §4), class file versions
//! 45.0 through 52.0. A single forward pass over an immutable byte buffer
//! yields a [`ClassFile`]; nothing here touches the runtime.

pub mod attribute;
pub mod class_file;
pub mod constant;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod flags;

pub use class_file::{ClassFile, FieldInfo, MethodInfo};
pub use constant::{ConstantInfo, ConstantPool};
pub use error::ClassFileError;
