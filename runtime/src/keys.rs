use lasso::ThreadedRodeo;

/// Interned string handle; class names, member names and descriptors are
/// interned once and compared as symbols everywhere else.
pub type Symbol = lasso::Spur;

/// Index into the method area's class arena. Classes are never unloaded,
/// so ids stay valid for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

impl ClassId {
    pub fn from_index(index: usize) -> Self {
        ClassId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the method area's method arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u32);

impl MethodId {
    pub fn from_index(index: usize) -> Self {
        MethodId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub name: Symbol,
    pub desc: Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub name: Symbol,
    pub desc: Symbol,
}

/// Key of the native registry: owning class plus name and descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeMethodKey {
    pub class: Symbol,
    pub name: Symbol,
    pub desc: Symbol,
}

impl NativeMethodKey {
    pub fn new(class: Symbol, name: Symbol, desc: Symbol) -> Self {
        NativeMethodKey { class, name, desc }
    }

    pub fn new_with_str(class: &str, name: &str, desc: &str, interner: &ThreadedRodeo) -> Self {
        NativeMethodKey {
            class: interner.get_or_intern(class),
            name: interner.get_or_intern(name),
            desc: interner.get_or_intern(desc),
        }
    }
}
