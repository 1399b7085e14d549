//! Hand-encoded class files for loader, linker and interpreter tests.
//! The builder emits well-formed version-52 class files; the fixture
//! kit provides the handful of core classes the runtime touches while
//! linking (Object, the marker interfaces, String).

use std::fs;
use std::path::Path;

use crate::{VirtualMachine, VmConfig};

pub(crate) const ACC_PUBLIC: u16 = 0x0001;
pub(crate) const ACC_PRIVATE: u16 = 0x0002;
pub(crate) const ACC_STATIC: u16 = 0x0008;
pub(crate) const ACC_FINAL: u16 = 0x0010;
pub(crate) const ACC_INTERFACE: u16 = 0x0200;
pub(crate) const ACC_ABSTRACT: u16 = 0x0400;

enum Entry {
    Utf8(String),
    Class(u16),
    Int(i32),
    Long(i64),
    Text(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    NameAndType(u16, u16),
    /// Slot claimed by the preceding Long.
    Reserved,
}

struct FieldSpec {
    flags: u16,
    name_index: u16,
    desc_index: u16,
    constant_index: Option<u16>,
}

struct MethodSpec {
    flags: u16,
    name_index: u16,
    desc_index: u16,
    max_stack: u16,
    max_locals: u16,
    code: Vec<u8>,
    handlers: Vec<(u16, u16, u16, u16)>,
}

pub(crate) struct TestClassBuilder {
    pool: Vec<Entry>,
    flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
}

impl TestClassBuilder {
    pub fn new(name: &str, super_name: Option<&str>) -> TestClassBuilder {
        let mut builder = TestClassBuilder {
            pool: Vec::new(),
            flags: ACC_PUBLIC,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        builder.this_class = builder.class(name);
        builder.super_class = match super_name {
            Some(super_name) => builder.class(super_name),
            None => 0,
        };
        builder
    }

    pub fn flags(mut self, flags: u16) -> TestClassBuilder {
        self.flags = flags;
        self
    }

    pub fn implements(&mut self, name: &str) {
        let index = self.class(name);
        self.interfaces.push(index);
    }

    fn push(&mut self, entry: Entry) -> u16 {
        self.pool.push(entry);
        self.pool.len() as u16
    }

    fn utf8(&mut self, text: &str) -> u16 {
        for (index, entry) in self.pool.iter().enumerate() {
            if let Entry::Utf8(existing) = entry {
                if existing == text {
                    return index as u16 + 1;
                }
            }
        }
        self.push(Entry::Utf8(text.to_string()))
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        for (index, entry) in self.pool.iter().enumerate() {
            if let Entry::Class(existing) = entry {
                if *existing == name_index {
                    return index as u16 + 1;
                }
            }
        }
        self.push(Entry::Class(name_index))
    }

    fn name_and_type(&mut self, name: &str, desc: &str) -> u16 {
        let name_index = self.utf8(name);
        let desc_index = self.utf8(desc);
        self.push(Entry::NameAndType(name_index, desc_index))
    }

    pub fn field_ref(&mut self, class: &str, name: &str, desc: &str) -> u16 {
        let class_index = self.class(class);
        let nat_index = self.name_and_type(name, desc);
        self.push(Entry::FieldRef(class_index, nat_index))
    }

    pub fn method_ref(&mut self, class: &str, name: &str, desc: &str) -> u16 {
        let class_index = self.class(class);
        let nat_index = self.name_and_type(name, desc);
        self.push(Entry::MethodRef(class_index, nat_index))
    }

    pub fn int_constant(&mut self, value: i32) -> u16 {
        self.push(Entry::Int(value))
    }

    pub fn long_constant(&mut self, value: i64) -> u16 {
        let index = self.push(Entry::Long(value));
        self.push(Entry::Reserved);
        index
    }

    pub fn string_constant(&mut self, text: &str) -> u16 {
        let text_index = self.utf8(text);
        self.push(Entry::Text(text_index))
    }

    pub fn field(&mut self, flags: u16, name: &str, desc: &str) {
        let name_index = self.utf8(name);
        let desc_index = self.utf8(desc);
        self.fields.push(FieldSpec { flags, name_index, desc_index, constant_index: None });
    }

    pub fn constant_field(&mut self, flags: u16, name: &str, desc: &str, constant_index: u16) {
        self.utf8("ConstantValue");
        let name_index = self.utf8(name);
        let desc_index = self.utf8(desc);
        self.fields.push(FieldSpec {
            flags,
            name_index,
            desc_index,
            constant_index: Some(constant_index),
        });
    }

    pub fn method(
        &mut self,
        flags: u16,
        name: &str,
        desc: &str,
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
    ) {
        self.method_with_handlers(flags, name, desc, max_stack, max_locals, code, &[]);
    }

    /// Handlers are `(start_pc, end_pc, handler_pc, catch_class)`; an
    /// empty catch-class name encodes a finally entry.
    pub fn method_with_handlers(
        &mut self,
        flags: u16,
        name: &str,
        desc: &str,
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
        handlers: &[(u16, u16, u16, &str)],
    ) {
        self.utf8("Code");
        let name_index = self.utf8(name);
        let desc_index = self.utf8(desc);
        let handlers = handlers
            .iter()
            .map(|&(start, end, target, catch)| {
                let catch_index = if catch.is_empty() { 0 } else { self.class(catch) };
                (start, end, target, catch_index)
            })
            .collect();
        self.methods.push(MethodSpec {
            flags,
            name_index,
            desc_index,
            max_stack,
            max_locals,
            code,
            handlers,
        });
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = 0xCAFE_BABEu32.to_be_bytes().to_vec();
        data.extend_from_slice(&0u16.to_be_bytes()); // minor
        data.extend_from_slice(&52u16.to_be_bytes()); // major

        data.extend_from_slice(&((self.pool.len() + 1) as u16).to_be_bytes());
        let code_name_index = self.find_utf8("Code");
        let constant_value_index = self.find_utf8("ConstantValue");
        for entry in &self.pool {
            match entry {
                Entry::Utf8(text) => {
                    data.push(1);
                    data.extend_from_slice(&(text.len() as u16).to_be_bytes());
                    data.extend_from_slice(text.as_bytes());
                }
                Entry::Class(name_index) => {
                    data.push(7);
                    data.extend_from_slice(&name_index.to_be_bytes());
                }
                Entry::Int(value) => {
                    data.push(3);
                    data.extend_from_slice(&value.to_be_bytes());
                }
                Entry::Long(value) => {
                    data.push(5);
                    data.extend_from_slice(&value.to_be_bytes());
                }
                Entry::Text(text_index) => {
                    data.push(8);
                    data.extend_from_slice(&text_index.to_be_bytes());
                }
                Entry::FieldRef(class_index, nat_index) => {
                    data.push(9);
                    data.extend_from_slice(&class_index.to_be_bytes());
                    data.extend_from_slice(&nat_index.to_be_bytes());
                }
                Entry::MethodRef(class_index, nat_index) => {
                    data.push(10);
                    data.extend_from_slice(&class_index.to_be_bytes());
                    data.extend_from_slice(&nat_index.to_be_bytes());
                }
                Entry::NameAndType(name_index, desc_index) => {
                    data.push(12);
                    data.extend_from_slice(&name_index.to_be_bytes());
                    data.extend_from_slice(&desc_index.to_be_bytes());
                }
                Entry::Reserved => {}
            }
        }

        data.extend_from_slice(&self.flags.to_be_bytes());
        data.extend_from_slice(&self.this_class.to_be_bytes());
        data.extend_from_slice(&self.super_class.to_be_bytes());
        data.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            data.extend_from_slice(&interface.to_be_bytes());
        }

        data.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            data.extend_from_slice(&field.flags.to_be_bytes());
            data.extend_from_slice(&field.name_index.to_be_bytes());
            data.extend_from_slice(&field.desc_index.to_be_bytes());
            match field.constant_index {
                Some(constant_index) => {
                    data.extend_from_slice(&1u16.to_be_bytes());
                    data.extend_from_slice(&constant_value_index.to_be_bytes());
                    data.extend_from_slice(&2u32.to_be_bytes());
                    data.extend_from_slice(&constant_index.to_be_bytes());
                }
                None => data.extend_from_slice(&0u16.to_be_bytes()),
            }
        }

        data.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            data.extend_from_slice(&method.flags.to_be_bytes());
            data.extend_from_slice(&method.name_index.to_be_bytes());
            data.extend_from_slice(&method.desc_index.to_be_bytes());
            data.extend_from_slice(&1u16.to_be_bytes());
            data.extend_from_slice(&code_name_index.to_be_bytes());
            let length = 12 + method.code.len() + 8 * method.handlers.len();
            data.extend_from_slice(&(length as u32).to_be_bytes());
            data.extend_from_slice(&method.max_stack.to_be_bytes());
            data.extend_from_slice(&method.max_locals.to_be_bytes());
            data.extend_from_slice(&(method.code.len() as u32).to_be_bytes());
            data.extend_from_slice(&method.code);
            data.extend_from_slice(&(method.handlers.len() as u16).to_be_bytes());
            for &(start, end, target, catch_index) in &method.handlers {
                data.extend_from_slice(&start.to_be_bytes());
                data.extend_from_slice(&end.to_be_bytes());
                data.extend_from_slice(&target.to_be_bytes());
                data.extend_from_slice(&catch_index.to_be_bytes());
            }
            data.extend_from_slice(&0u16.to_be_bytes()); // nested attributes
        }

        data.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        data
    }

    fn find_utf8(&self, text: &str) -> u16 {
        for (index, entry) in self.pool.iter().enumerate() {
            if let Entry::Utf8(existing) = entry {
                if existing == text {
                    return index as u16 + 1;
                }
            }
        }
        0
    }
}

pub(crate) fn write_class(dir: &Path, name: &str, data: &[u8]) {
    let path = dir.join(format!("{name}.class"));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}

/// The core classes linking leans on: `java/lang/Object`, the two array
/// marker interfaces, and a `java/lang/String` with the `value:[C`
/// field the interner wires.
pub(crate) fn write_core_fixture(dir: &Path) {
    let object = TestClassBuilder::new("java/lang/Object", None).build();
    write_class(dir, "java/lang/Object", &object);

    let cloneable = {
        let builder = TestClassBuilder::new("java/lang/Cloneable", Some("java/lang/Object"));
        builder.flags(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT).build()
    };
    write_class(dir, "java/lang/Cloneable", &cloneable);

    let serializable = {
        let builder = TestClassBuilder::new("java/io/Serializable", Some("java/lang/Object"));
        builder.flags(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT).build()
    };
    write_class(dir, "java/io/Serializable", &serializable);

    let string = {
        let mut builder = TestClassBuilder::new("java/lang/String", Some("java/lang/Object"));
        builder.field(0, "value", "[C");
        builder.build()
    };
    write_class(dir, "java/lang/String", &string);
}

/// A machine whose user classpath is `dir`, with an empty JRE layout
/// created inside it so the band search has somewhere to look.
pub(crate) fn test_vm(dir: &Path) -> VirtualMachine {
    let jre = dir.join("jre");
    fs::create_dir_all(jre.join("lib").join("ext")).unwrap();
    let config = VmConfig {
        jre_path: Some(jre),
        class_path: Some(dir.display().to_string()),
        ..VmConfig::default()
    };
    VirtualMachine::new(&config).unwrap()
}
