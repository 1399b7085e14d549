pub mod class;
pub mod constant_pool;
pub mod field;
pub mod method;

/// One-shot initialization protocol state (JVMS §5.5, reduced to the
/// single-threaded model). Kept strictly separate from link state:
/// verification never touches this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    /// `<clinit>` frames are scheduled or running; guards re-entry from
    /// the initializer itself.
    InProgress,
    Initialized,
}

/// The nine primitive class names, loaded eagerly at boot.
pub const PRIMITIVE_NAMES: [&str; 9] =
    ["void", "boolean", "byte", "short", "int", "long", "float", "double", "char"];

/// Maps a primitive class name to its array descriptor letter.
pub fn primitive_descriptor(name: &str) -> Option<char> {
    match name {
        "void" => Some('V'),
        "boolean" => Some('Z'),
        "byte" => Some('B'),
        "short" => Some('S'),
        "int" => Some('I'),
        "long" => Some('J'),
        "float" => Some('F'),
        "double" => Some('D'),
        "char" => Some('C'),
        _ => None,
    }
}
