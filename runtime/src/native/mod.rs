use std::collections::HashMap;
use std::sync::Arc;

use lasso::ThreadedRodeo;

use crate::error::JvmError;
use crate::keys::{NativeMethodKey, Symbol};
use crate::thread::JavaThread;
use crate::vm::VirtualMachine;

pub mod java_io;
pub mod java_lang;
pub mod sun_misc;

/// A native binding reads its arguments from the current (injected)
/// frame's locals and pushes any result onto that frame's operand
/// stack; the injected return opcode carries it to the caller. It may
/// also push Java frames to be interpreted before its own frame's
/// return executes.
pub type NativeFn = fn(&mut VirtualMachine, &mut JavaThread) -> Result<(), JvmError>;

/// Process-wide `(class, name, descriptor) -> fn` table.
pub struct NativeRegistry {
    bindings: HashMap<NativeMethodKey, NativeFn>,
    pub(crate) string_interner: Arc<ThreadedRodeo>,
    register_natives_sym: Symbol,
    init_ids_sym: Symbol,
    void_desc_sym: Symbol,
}

impl NativeRegistry {
    pub fn new(string_interner: Arc<ThreadedRodeo>) -> NativeRegistry {
        let mut registry = NativeRegistry {
            bindings: HashMap::new(),
            register_natives_sym: string_interner.get_or_intern("registerNatives"),
            init_ids_sym: string_interner.get_or_intern("initIDs"),
            void_desc_sym: string_interner.get_or_intern("()V"),
            string_interner,
        };
        java_lang::register_natives(&mut registry);
        java_io::register_natives(&mut registry);
        sun_misc::register_natives(&mut registry);
        registry
    }

    pub fn register(&mut self, key: NativeMethodKey, binding: NativeFn) {
        self.bindings.insert(key, binding);
    }

    pub fn find(&self, key: &NativeMethodKey) -> Option<NativeFn> {
        self.bindings.get(key).copied()
    }

    /// Unbound `()V` `registerNatives`/`initIDs` methods fall back to an
    /// empty stub instead of an UnsatisfiedLinkError.
    pub fn is_stubbable(&self, key: &NativeMethodKey) -> bool {
        key.desc == self.void_desc_sym
            && (key.name == self.register_natives_sym || key.name == self.init_ids_sym)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop(_vm: &mut VirtualMachine, _thread: &mut JavaThread) -> Result<(), JvmError> {
        Ok(())
    }

    #[test]
    fn lookup_is_keyed_by_class_name_and_descriptor() {
        let interner = Arc::new(ThreadedRodeo::default());
        let mut registry = NativeRegistry::new(interner.clone());
        let key = NativeMethodKey::new_with_str("Probe", "poke", "()I", &interner);
        assert!(registry.find(&key).is_none());
        registry.register(key, nop);
        assert!(registry.find(&key).is_some());

        let other_desc = NativeMethodKey::new_with_str("Probe", "poke", "()J", &interner);
        assert!(registry.find(&other_desc).is_none());
    }

    #[test]
    fn register_natives_and_init_ids_fall_back_to_stubs() {
        let interner = Arc::new(ThreadedRodeo::default());
        let registry = NativeRegistry::new(interner.clone());
        let stub = NativeMethodKey::new_with_str("Anything", "registerNatives", "()V", &interner);
        assert!(registry.is_stubbable(&stub));
        let ids = NativeMethodKey::new_with_str("Other", "initIDs", "()V", &interner);
        assert!(registry.is_stubbable(&ids));
        let wrong_desc = NativeMethodKey::new_with_str("Other", "initIDs", "(I)V", &interner);
        assert!(!registry.is_stubbable(&wrong_desc));
        let wrong_name = NativeMethodKey::new_with_str("Other", "connect", "()V", &interner);
        assert!(!registry.is_stubbable(&wrong_name));
    }
}
