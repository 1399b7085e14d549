use std::collections::HashMap;
use std::sync::Arc;

use hervor_classfile::ClassFile;
use hervor_classfile::flags::{ClassFlags, FieldFlags, MethodFlags};
use lasso::ThreadedRodeo;
use tracing_log::log::debug;

use crate::class_loader::ClassLoader;
use crate::error::JvmError;
use crate::heap::{Extra, Heap, HeapRef, Object, ObjectBody};
use crate::keys::{ClassId, FieldKey, MethodId, MethodKey, Symbol};
use crate::rt::class::{Class, ClassKind};
use crate::rt::constant_pool::{RuntimeConstant, RuntimeConstantPool};
use crate::rt::field::Field;
use crate::rt::method::Method;
use crate::rt::{InitState, PRIMITIVE_NAMES, primitive_descriptor};
use crate::stack::Slots;
use crate::vm::bootstrap_registry::BootstrapRegistry;
use crate::throw_exception;

/// Member visibility bits shared by the field and method access checks.
#[derive(Debug, Clone, Copy)]
pub struct MemberAccess {
    pub public: bool,
    pub protected: bool,
    pub private: bool,
}

impl From<FieldFlags> for MemberAccess {
    fn from(flags: FieldFlags) -> Self {
        MemberAccess {
            public: flags.is_public(),
            protected: flags.is_protected(),
            private: flags.is_private(),
        }
    }
}

impl From<MethodFlags> for MemberAccess {
    fn from(flags: MethodFlags) -> Self {
        MemberAccess {
            public: flags.is_public(),
            protected: flags.is_protected(),
            private: flags.is_private(),
        }
    }
}

/// Class and method arenas plus the memoized `name -> ClassId` map: the
/// single flat loader of this VM. Ids are handed out once and stay valid
/// for the process lifetime.
pub struct MethodArea {
    loader: ClassLoader,
    classes: Vec<Class>,
    methods: Vec<Method>,
    class_index: HashMap<Symbol, ClassId>,
    interner: Arc<ThreadedRodeo>,
    br: BootstrapRegistry,
    shim_method: Option<MethodId>,
}

impl MethodArea {
    pub fn new(loader: ClassLoader, interner: Arc<ThreadedRodeo>) -> MethodArea {
        let br = BootstrapRegistry::new(&interner);
        let mut method_area = MethodArea {
            loader,
            classes: Vec::with_capacity(1024),
            methods: Vec::with_capacity(8192),
            class_index: HashMap::new(),
            interner,
            br,
            shim_method: None,
        };
        method_area.preload_primitive_classes();
        method_area
    }

    /// The nine primitive classes are synthesized eagerly: public, no
    /// super, initialized from the start.
    fn preload_primitive_classes(&mut self) {
        for name in PRIMITIVE_NAMES {
            let name_sym = self.interner.get_or_intern(name);
            let class = Class {
                name: name_sym,
                package: self.package_of(name),
                flags: ClassFlags::PUBLIC,
                kind: ClassKind::Primitive,
                super_name: None,
                interface_names: Vec::new(),
                super_class: None,
                interfaces: Vec::new(),
                cp: RuntimeConstantPool::empty(),
                fields: Vec::new(),
                methods: Vec::new(),
                source_file: None,
                instance_slot_count: 0,
                static_slot_count: 0,
                static_vars: Slots::new(0),
                init_state: InitState::Initialized,
                mirror: None,
            };
            let id = self.push_class(class);
            self.class_index.insert(name_sym, id);
        }
    }

    pub fn interner(&self) -> &ThreadedRodeo {
        &self.interner
    }

    pub fn br(&self) -> &BootstrapRegistry {
        &self.br
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    pub fn lookup(&self, name: Symbol) -> Option<ClassId> {
        self.class_index.get(&name).copied()
    }

    pub fn class_name(&self, id: ClassId) -> &str {
        self.interner.resolve(&self.class(id).name)
    }

    fn push_class(&mut self, class: Class) -> ClassId {
        self.classes.push(class);
        ClassId::from_index(self.classes.len() - 1)
    }

    fn push_method(&mut self, method: Method) -> MethodId {
        self.methods.push(method);
        MethodId::from_index(self.methods.len() - 1)
    }

    fn package_of(&self, name: &str) -> Symbol {
        let package = name.rsplit_once('/').map(|(head, _)| head).unwrap_or("");
        self.interner.get_or_intern(package)
    }
}

// Loading and linking.
impl MethodArea {
    /// Idempotent load of any class-name form: primitive keyword, JVM
    /// internal name, or descriptor-form array name.
    pub fn load(&mut self, heap: &mut Heap, name: Symbol) -> Result<ClassId, JvmError> {
        if let Some(&id) = self.class_index.get(&name) {
            return Ok(id);
        }
        let name_str = self.interner.resolve(&name).to_string();
        let id = if name_str.starts_with('[') {
            self.load_array_class(heap, name, &name_str)?
        } else {
            self.load_regular_class(heap, name, &name_str)?
        };
        self.attach_mirror(heap, id);
        if name_str == "java/lang/Class" {
            self.sweep_missing_mirrors(heap);
        }
        Ok(id)
    }

    pub fn load_str(&mut self, heap: &mut Heap, name: &str) -> Result<ClassId, JvmError> {
        let name_sym = self.interner.get_or_intern(name);
        self.load(heap, name_sym)
    }

    fn load_regular_class(
        &mut self,
        heap: &mut Heap,
        name: Symbol,
        name_str: &str,
    ) -> Result<ClassId, JvmError> {
        let data = self.loader.read(name_str)?;
        let cf = ClassFile::parse(&data)?;

        // Transitive loads are depth-first: the whole super chain and the
        // direct interfaces are resident before this class gets its id.
        let super_name = match cf.super_class_name()? {
            Some(super_name) if name_str != "java/lang/Object" => {
                Some(self.interner.get_or_intern(super_name))
            }
            _ => None,
        };
        let super_class = match super_name {
            Some(super_sym) => Some(self.load(heap, super_sym)?),
            None => None,
        };
        let interface_names: Vec<Symbol> = cf
            .interface_names()?
            .into_iter()
            .map(|interface| self.interner.get_or_intern(interface))
            .collect();
        let mut interfaces = Vec::with_capacity(interface_names.len());
        for &interface in &interface_names {
            interfaces.push(self.load(heap, interface)?);
        }

        let cp = RuntimeConstantPool::new(&cf.cp, &self.interner)?;

        let id = ClassId::from_index(self.classes.len());
        let mut method_ids = Vec::with_capacity(cf.methods.len());
        for info in &cf.methods {
            let mut method = Method::new(id, info, &cf.cp, &self.interner)?;
            self.apply_load_library_hack(name, &mut method);
            method_ids.push(self.push_method(method));
        }

        let mut fields = Vec::with_capacity(cf.fields.len());
        for info in &cf.fields {
            fields.push(Field::new(info, &cf.cp, &self.interner)?);
        }
        let super_instance_slots = super_class
            .map(|super_id| self.class(super_id).instance_slot_count)
            .unwrap_or(0);
        let (instance_slot_count, static_slot_count) =
            link_field_slots(&mut fields, super_instance_slots);

        let source_file = cf.source_file().map(|source| self.interner.get_or_intern(source));
        let class = Class {
            name,
            package: self.package_of(name_str),
            flags: cf.access_flags,
            kind: ClassKind::Instance,
            super_name,
            interface_names,
            super_class,
            interfaces,
            cp,
            fields,
            methods: method_ids,
            source_file,
            instance_slot_count,
            static_slot_count,
            static_vars: Slots::new(static_slot_count),
            init_state: InitState::Uninitialized,
            mirror: None,
        };
        let id = self.push_class(class);
        self.class_index.insert(name, id);

        self.init_constant_statics(heap, id)?;
        debug!("linked class {name_str} ({} instance slots)", self.class(id).instance_slot_count);
        Ok(id)
    }

    /// `java/lang/ClassLoader.loadLibrary` is rewritten to an immediate
    /// return so the boot path never reaches JNI machinery.
    fn apply_load_library_hack(&self, class_name: Symbol, method: &mut Method) {
        if class_name == self.br.java_lang_class_loader_sym
            && method.name == self.br.load_library_sym
            && method.desc == self.br.load_library_desc
        {
            method.code = Arc::from(&[0xB1u8][..]);
        }
    }

    /// Copies `static final` literals from the pool into the class's
    /// static block, typed by the field descriptor. String literals are
    /// interned.
    fn init_constant_statics(&mut self, heap: &mut Heap, id: ClassId) -> Result<(), JvmError> {
        enum Literal {
            Int(i32),
            Long(i64),
            Float(f32),
            Double(f64),
            Text(Symbol),
        }

        let mut pending = Vec::new();
        {
            let class = self.class(id);
            for field in &class.fields {
                if !(field.is_static() && field.is_final()) {
                    continue;
                }
                let Some(value_index) = field.const_value_index else { continue };
                let desc = self.interner.resolve(&field.desc);
                let literal = match (desc, class.cp.get(value_index)?) {
                    ("Z" | "B" | "C" | "S" | "I", RuntimeConstant::Integer(v)) => Literal::Int(*v),
                    ("J", RuntimeConstant::Long(v)) => Literal::Long(*v),
                    ("F", RuntimeConstant::Float(v)) => Literal::Float(*v),
                    ("D", RuntimeConstant::Double(v)) => Literal::Double(*v),
                    ("Ljava/lang/String;", RuntimeConstant::StringLiteral(text)) => {
                        Literal::Text(*text)
                    }
                    _ => {
                        throw_exception!(
                            ClassFormatError,
                            "ConstantValue at index {value_index} does not match descriptor {desc}"
                        )
                    }
                };
                pending.push((field.slot_id, literal));
            }
        }

        for (slot_id, literal) in pending {
            let reference = match &literal {
                Literal::Text(text) => Some(self.intern_jstring(heap, *text)?),
                _ => None,
            };
            let static_vars = &mut self.class_mut(id).static_vars;
            match literal {
                Literal::Int(v) => static_vars.set_int(slot_id, v),
                Literal::Long(v) => static_vars.set_long(slot_id, v),
                Literal::Float(v) => static_vars.set_float(slot_id, v),
                Literal::Double(v) => static_vars.set_double(slot_id, v),
                Literal::Text(_) => static_vars.set_ref(slot_id, reference),
            }
        }
        Ok(())
    }

    /// Array classes are synthesized: super `java/lang/Object`,
    /// interfaces Cloneable and Serializable, element loaded eagerly,
    /// initialized from the start.
    fn load_array_class(
        &mut self,
        heap: &mut Heap,
        name: Symbol,
        name_str: &str,
    ) -> Result<ClassId, JvmError> {
        let element_name = component_class_name(&name_str[1..])?;
        let element = self.load_str(heap, &element_name)?;
        let super_class = self.load(heap, self.br.java_lang_object_sym)?;
        let interface_names =
            vec![self.br.java_lang_cloneable_sym, self.br.java_io_serializable_sym];
        let mut interfaces = Vec::with_capacity(2);
        for &interface in &interface_names {
            interfaces.push(self.load(heap, interface)?);
        }

        let class = Class {
            name,
            package: self.package_of(name_str),
            flags: ClassFlags::PUBLIC,
            kind: ClassKind::Array { element },
            super_name: Some(self.br.java_lang_object_sym),
            interface_names,
            super_class: Some(super_class),
            interfaces,
            cp: RuntimeConstantPool::empty(),
            fields: Vec::new(),
            methods: Vec::new(),
            source_file: None,
            instance_slot_count: 0,
            static_slot_count: 0,
            static_vars: Slots::new(0),
            init_state: InitState::Initialized,
            mirror: None,
        };
        let id = self.push_class(class);
        self.class_index.insert(name, id);
        Ok(id)
    }

    /// Descriptor-form array name of a component class, for `anewarray`
    /// and `multianewarray`.
    pub fn array_class_of(&mut self, heap: &mut Heap, component: ClassId) -> Result<ClassId, JvmError> {
        let component_name = self.class_name(component).to_string();
        let array_name = if let Some(letter) = primitive_descriptor(&component_name) {
            format!("[{letter}")
        } else if component_name.starts_with('[') {
            format!("[{component_name}")
        } else {
            format!("[L{component_name};")
        };
        self.load_str(heap, &array_name)
    }

    fn attach_mirror(&mut self, heap: &mut Heap, id: ClassId) {
        if self.class(id).mirror.is_some() {
            return;
        }
        let Some(class_class) = self.lookup(self.br.java_lang_class_sym) else {
            // boot: java/lang/Class itself is not resident yet; the sweep
            // after its load attaches the missing mirrors
            return;
        };
        let slot_count = self.class(class_class).instance_slot_count;
        let mirror = heap.alloc(Object {
            class: class_class,
            body: ObjectBody::Fields(Slots::new(slot_count)),
            extra: Extra::Mirror(id),
        });
        self.class_mut(id).mirror = Some(mirror);
    }

    fn sweep_missing_mirrors(&mut self, heap: &mut Heap) {
        for index in 0..self.classes.len() {
            self.attach_mirror(heap, ClassId::from_index(index));
        }
    }

    /// Runtime class behind a `java/lang/Class` mirror object.
    pub fn class_of_mirror(&self, heap: &Heap, mirror: HeapRef) -> Result<ClassId, JvmError> {
        match heap.get(mirror).extra {
            Extra::Mirror(id) => Ok(id),
            _ => Err(JvmError::Internal("object is not a class mirror".to_string())),
        }
    }
}

/// Instance fields slot from the end of the super chain's block, statics
/// from 0 within the class; `long`/`double` claim two consecutive ids.
fn link_field_slots(fields: &mut [Field], super_instance_slots: usize) -> (usize, usize) {
    let mut instance_slot = super_instance_slots;
    let mut static_slot = 0;
    for field in fields.iter_mut() {
        let slot = if field.is_static() { &mut static_slot } else { &mut instance_slot };
        field.slot_id = *slot;
        *slot += if field.is_long_or_double() { 2 } else { 1 };
    }
    (instance_slot, static_slot)
}

/// Component class name of an array name's tail (the part after `[`).
fn component_class_name(tail: &str) -> Result<String, JvmError> {
    let mut chars = tail.chars();
    let name = match chars.next() {
        Some('[') => tail.to_string(),
        Some('L') => {
            let inner = &tail[1..];
            match inner.strip_suffix(';') {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => throw_exception!(ClassFormatError, "bad array class name [{tail}"),
            }
        }
        Some(letter) => match letter {
            'Z' => "boolean".to_string(),
            'B' => "byte".to_string(),
            'S' => "short".to_string(),
            'I' => "int".to_string(),
            'J' => "long".to_string(),
            'F' => "float".to_string(),
            'D' => "double".to_string(),
            'C' => "char".to_string(),
            _ => throw_exception!(ClassFormatError, "bad array class name [{tail}"),
        },
        None => throw_exception!(ClassFormatError, "bad array class name ["),
    };
    Ok(name)
}

// String interning (S3): a literal becomes a char array wired into a
// java/lang/String instance, memoized by its utf8 symbol.
impl MethodArea {
    pub fn intern_jstring(&mut self, heap: &mut Heap, text: Symbol) -> Result<HeapRef, JvmError> {
        if let Some(pooled) = heap.pooled_string(text) {
            return Ok(pooled);
        }
        let string_class = self.load(heap, self.br.java_lang_string_sym)?;
        let char_array_class = self.load_str(heap, "[C")?;

        let units: Vec<u16> = self.interner.resolve(&text).encode_utf16().collect();
        let value = heap.alloc(Object {
            class: char_array_class,
            body: ObjectBody::Chars(units),
            extra: Extra::None,
        });

        let value_key = FieldKey { name: self.br.value_sym, desc: self.br.char_array_desc };
        let (declaring, field_index) =
            self.find_field_in_chain(string_class, &value_key).ok_or_else(|| {
                JvmError::Internal("java/lang/String has no value:[C field".to_string())
            })?;
        let slot_id = self.class(declaring).field(field_index).slot_id;

        let mut object =
            Object::new_instance(string_class, self.class(string_class).instance_slot_count);
        object.body.fields_mut()?.set_ref(slot_id, Some(value));
        object.extra = Extra::InternedString(text);
        let reference = heap.alloc(object);
        heap.pool_string(text, reference);
        Ok(reference)
    }

    /// Rust text of a `java/lang/String` object (its value char array).
    pub fn java_string_text(&self, heap: &Heap, reference: HeapRef) -> Result<String, JvmError> {
        if let Extra::InternedString(text) = heap.get(reference).extra {
            return Ok(self.interner.resolve(&text).to_string());
        }
        let class = heap.class_of(reference);
        let value_key = FieldKey { name: self.br.value_sym, desc: self.br.char_array_desc };
        let (declaring, field_index) = self
            .find_field_in_chain(class, &value_key)
            .ok_or_else(|| JvmError::Internal("object is not a string".to_string()))?;
        let slot_id = self.class(declaring).field(field_index).slot_id;
        let value = heap
            .get(reference)
            .body
            .fields()?
            .get_ref(slot_id)
            .ok_or_else(|| JvmError::Internal("string value array is null".to_string()))?;
        match &heap.get(value).body {
            ObjectBody::Chars(units) => Ok(String::from_utf16_lossy(units)),
            _ => Err(JvmError::Internal("string value is not a char array".to_string())),
        }
    }
}

// Member lookup walks and symbolic-reference resolution (JVMS §5.4.3).
impl MethodArea {
    pub fn find_method_in_class(&self, class: ClassId, key: &MethodKey) -> Option<MethodId> {
        self.class(class)
            .methods
            .iter()
            .copied()
            .find(|&id| self.method(id).name == key.name && self.method(id).desc == key.desc)
    }

    pub fn find_method_in_chain(&self, class: ClassId, key: &MethodKey) -> Option<(ClassId, MethodId)> {
        let mut current = Some(class);
        while let Some(id) = current {
            if let Some(method) = self.find_method_in_class(id, key) {
                return Some((id, method));
            }
            current = self.class(id).super_class;
        }
        None
    }

    fn find_method_in_interfaces(
        &self,
        interfaces: &[ClassId],
        key: &MethodKey,
    ) -> Option<(ClassId, MethodId)> {
        for &interface in interfaces {
            if let Some(method) = self.find_method_in_class(interface, key) {
                return Some((interface, method));
            }
            let inherited = self.class(interface).interfaces.clone();
            if let Some(found) = self.find_method_in_interfaces(&inherited, key) {
                return Some(found);
            }
        }
        None
    }

    /// Field lookup order: the class itself, its super-interfaces
    /// transitively, then the super chain.
    pub fn find_field_in_chain(&self, class: ClassId, key: &FieldKey) -> Option<(ClassId, usize)> {
        if let Some(index) = self.class(class).find_field(key) {
            return Some((class, index));
        }
        if let Some(found) = self.find_field_in_interfaces(&self.class(class).interfaces, key) {
            return Some(found);
        }
        let super_class = self.class(class).super_class?;
        self.find_field_in_chain(super_class, key)
    }

    fn find_field_in_interfaces(&self, interfaces: &[ClassId], key: &FieldKey) -> Option<(ClassId, usize)> {
        for &interface in interfaces {
            if let Some(index) = self.class(interface).find_field(key) {
                return Some((interface, index));
            }
            if let Some(found) = self.find_field_in_interfaces(&self.class(interface).interfaces, key) {
                return Some(found);
            }
        }
        None
    }

    pub fn resolve_class_ref(
        &mut self,
        heap: &mut Heap,
        from: ClassId,
        index: u16,
    ) -> Result<ClassId, JvmError> {
        if let Some(&resolved) = self.class(from).cp.class_entry(index)?.resolved.get() {
            return Ok(resolved);
        }
        let name = self.class(from).cp.class_entry(index)?.name;
        let resolved = self.load(heap, name)?;
        if !self.is_class_accessible(resolved, from) {
            throw_exception!(
                IllegalAccessError,
                "{} not accessible from {}",
                self.class_name(resolved),
                self.class_name(from)
            );
        }
        self.class(from).cp.class_entry(index)?.resolved.set(resolved).ok();
        Ok(resolved)
    }

    pub fn resolve_field_ref(
        &mut self,
        heap: &mut Heap,
        from: ClassId,
        index: u16,
    ) -> Result<(ClassId, usize), JvmError> {
        if let Some(&resolved) = self.class(from).cp.field_ref(index)?.resolved.get() {
            return Ok(resolved);
        }
        let entry = self.class(from).cp.field_ref(index)?;
        let (owner_name, key) = (entry.class_name, FieldKey { name: entry.name, desc: entry.desc });
        let owner = self.load(heap, owner_name)?;

        let Some((declaring, field_index)) = self.find_field_in_chain(owner, &key) else {
            throw_exception!(
                NoSuchFieldError,
                "{}.{}",
                self.class_name(owner),
                self.interner.resolve(&key.name)
            );
        };
        let access = MemberAccess::from(self.class(declaring).field(field_index).flags);
        self.check_member_access(declaring, access, from, key.name)?;
        self.class(from).cp.field_ref(index)?.resolved.set((declaring, field_index)).ok();
        Ok((declaring, field_index))
    }

    pub fn resolve_method_ref(
        &mut self,
        heap: &mut Heap,
        from: ClassId,
        index: u16,
    ) -> Result<(ClassId, MethodId), JvmError> {
        if let Some(&resolved) = self.class(from).cp.method_ref(index)?.resolved.get() {
            return Ok(resolved);
        }
        let entry = self.class(from).cp.method_ref(index)?;
        let (owner_name, key) = (entry.class_name, MethodKey { name: entry.name, desc: entry.desc });
        let owner = self.load(heap, owner_name)?;
        if self.class(owner).is_interface() {
            throw_exception!(
                IncompatibleClassChangeError,
                "{} is an interface",
                self.class_name(owner)
            );
        }

        let found = self.find_method_in_chain(owner, &key).or_else(|| {
            self.find_method_in_interfaces(&self.class(owner).interfaces.clone(), &key)
        });
        let Some((declaring, method)) = found else {
            throw_exception!(
                NoSuchMethodError,
                "{}.{}{}",
                self.class_name(owner),
                self.interner.resolve(&key.name),
                self.interner.resolve(&key.desc)
            );
        };
        let access = MemberAccess::from(self.method(method).flags);
        self.check_member_access(declaring, access, from, key.name)?;
        self.class(from).cp.method_ref(index)?.resolved.set((declaring, method)).ok();
        Ok((declaring, method))
    }

    pub fn resolve_interface_method_ref(
        &mut self,
        heap: &mut Heap,
        from: ClassId,
        index: u16,
    ) -> Result<(ClassId, MethodId), JvmError> {
        if let Some(&resolved) = self.class(from).cp.interface_method_ref(index)?.resolved.get() {
            return Ok(resolved);
        }
        let entry = self.class(from).cp.interface_method_ref(index)?;
        let (owner_name, key) = (entry.class_name, MethodKey { name: entry.name, desc: entry.desc });
        let owner = self.load(heap, owner_name)?;
        if !self.class(owner).is_interface() {
            throw_exception!(
                IncompatibleClassChangeError,
                "{} is not an interface",
                self.class_name(owner)
            );
        }

        let found = self.find_method_in_class(owner, &key).map(|method| (owner, method)).or_else(
            || self.find_method_in_interfaces(&self.class(owner).interfaces.clone(), &key),
        );
        let Some((declaring, method)) = found else {
            throw_exception!(
                NoSuchMethodError,
                "{}.{}{}",
                self.class_name(owner),
                self.interner.resolve(&key.name),
                self.interner.resolve(&key.desc)
            );
        };
        self.class(from).cp.interface_method_ref(index)?.resolved.set((declaring, method)).ok();
        Ok((declaring, method))
    }
}

// Access control and assignability (JVMS §5.4.4, §4.10 assignment rules).
impl MethodArea {
    pub fn is_class_accessible(&self, class: ClassId, from: ClassId) -> bool {
        self.class(class).is_public() || self.same_package(class, from)
    }

    pub fn same_package(&self, a: ClassId, b: ClassId) -> bool {
        self.class(a).package == self.class(b).package
    }

    fn check_member_access(
        &self,
        declaring: ClassId,
        access: MemberAccess,
        from: ClassId,
        member: Symbol,
    ) -> Result<(), JvmError> {
        if self.is_member_accessible(declaring, access, from) {
            return Ok(());
        }
        throw_exception!(
            IllegalAccessError,
            "{}.{} not accessible from {}",
            self.class_name(declaring),
            self.interner.resolve(&member),
            self.class_name(from)
        );
    }

    pub fn is_member_accessible(
        &self,
        declaring: ClassId,
        access: MemberAccess,
        from: ClassId,
    ) -> bool {
        if access.public {
            return true;
        }
        if access.protected {
            return from == declaring
                || self.is_subclass_of(from, declaring)
                || self.same_package(declaring, from);
        }
        if !access.private {
            return self.same_package(declaring, from);
        }
        from == declaring
    }

    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = self.class(class).super_class;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.class(id).super_class;
        }
        false
    }

    pub fn implements(&self, class: ClassId, interface: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(id) = current {
            if self.interface_set_contains(&self.class(id).interfaces, interface) {
                return true;
            }
            current = self.class(id).super_class;
        }
        false
    }

    fn interface_set_contains(&self, interfaces: &[ClassId], target: ClassId) -> bool {
        interfaces.iter().any(|&id| {
            id == target || self.interface_set_contains(&self.class(id).interfaces, target)
        })
    }

    /// `source` assignable to `target`, for checkcast / instanceof and
    /// reference array stores. Arrays lean on their synthesized super
    /// and interfaces for the non-array target rule.
    pub fn is_assignable(&self, source: ClassId, target: ClassId) -> bool {
        if source == target {
            return true;
        }
        let source_class = self.class(source);
        let target_class = self.class(target);
        match (source_class.kind, target_class.kind) {
            (ClassKind::Array { element: s }, ClassKind::Array { element: t }) => {
                if self.class(s).is_primitive() || self.class(t).is_primitive() {
                    s == t
                } else {
                    self.is_assignable(s, t)
                }
            }
            _ => {
                if target_class.is_interface() {
                    self.implements(source, target)
                } else {
                    self.is_subclass_of(source, target)
                }
            }
        }
    }
}

// Synthetic shim method (S1): a one-byte `return` body pushed under a
// callee frame when a native needs to invoke Java code and discard the
// result.
impl MethodArea {
    pub fn shim_method(&mut self) -> Result<MethodId, JvmError> {
        if let Some(id) = self.shim_method {
            return Ok(id);
        }
        let object_class = self
            .lookup(self.br.java_lang_object_sym)
            .ok_or_else(|| JvmError::Internal("shim requested before boot".to_string()))?;
        let method = Method {
            class: object_class,
            name: self.br.shim_sym,
            desc: self.br.void_desc,
            flags: hervor_classfile::flags::MethodFlags::STATIC,
            max_stack: 2,
            max_locals: 0,
            code: Arc::from(&[0xB1u8][..]),
            exception_table: Vec::new(),
            line_numbers: None,
            declared_exceptions: Vec::new(),
            descriptor: hervor_classfile::descriptor::MethodDescriptor::parse("()V")?,
            arg_slot_count: 0,
        };
        let id = self.push_method(method);
        self.shim_method = Some(id);
        Ok(id)
    }
}
