use lasso::ThreadedRodeo;

use crate::keys::{MethodKey, Symbol};

/// Symbols and keys the boot path and the hot instruction paths touch,
/// interned once at VM construction.
pub struct BootstrapRegistry {
    // Class names.
    pub java_lang_object_sym: Symbol,
    pub java_lang_class_sym: Symbol,
    pub java_lang_string_sym: Symbol,
    pub java_lang_cloneable_sym: Symbol,
    pub java_io_serializable_sym: Symbol,
    pub java_lang_class_loader_sym: Symbol,
    pub java_lang_system_sym: Symbol,
    pub java_lang_throwable_sym: Symbol,
    pub sun_misc_vm_sym: Symbol,
    pub string_array_sym: Symbol,

    // Member names.
    pub init_sym: Symbol,
    pub clinit_sym: Symbol,
    pub main_sym: Symbol,
    pub shim_sym: Symbol,
    pub value_sym: Symbol,
    pub detail_message_sym: Symbol,
    pub load_library_sym: Symbol,

    // Descriptors.
    pub void_desc: Symbol,
    pub main_desc: Symbol,
    pub string_desc: Symbol,
    pub char_array_desc: Symbol,
    pub load_library_desc: Symbol,

    // Composite keys.
    pub clinit_mk: MethodKey,
    pub main_mk: MethodKey,
}

impl BootstrapRegistry {
    pub fn new(interner: &ThreadedRodeo) -> BootstrapRegistry {
        let init_sym = interner.get_or_intern("<init>");
        let clinit_sym = interner.get_or_intern("<clinit>");
        let main_sym = interner.get_or_intern("main");
        let void_desc = interner.get_or_intern("()V");
        let main_desc = interner.get_or_intern("([Ljava/lang/String;)V");

        BootstrapRegistry {
            java_lang_object_sym: interner.get_or_intern("java/lang/Object"),
            java_lang_class_sym: interner.get_or_intern("java/lang/Class"),
            java_lang_string_sym: interner.get_or_intern("java/lang/String"),
            java_lang_cloneable_sym: interner.get_or_intern("java/lang/Cloneable"),
            java_io_serializable_sym: interner.get_or_intern("java/io/Serializable"),
            java_lang_class_loader_sym: interner.get_or_intern("java/lang/ClassLoader"),
            java_lang_system_sym: interner.get_or_intern("java/lang/System"),
            java_lang_throwable_sym: interner.get_or_intern("java/lang/Throwable"),
            sun_misc_vm_sym: interner.get_or_intern("sun/misc/VM"),
            string_array_sym: interner.get_or_intern("[Ljava/lang/String;"),

            init_sym,
            clinit_sym,
            main_sym,
            shim_sym: interner.get_or_intern("<shim>"),
            value_sym: interner.get_or_intern("value"),
            detail_message_sym: interner.get_or_intern("detailMessage"),
            load_library_sym: interner.get_or_intern("loadLibrary"),

            void_desc,
            main_desc,
            string_desc: interner.get_or_intern("Ljava/lang/String;"),
            char_array_desc: interner.get_or_intern("[C"),
            load_library_desc: interner.get_or_intern("(Ljava/lang/Class;Ljava/lang/String;Z)V"),

            clinit_mk: MethodKey { name: clinit_sym, desc: void_desc },
            main_mk: MethodKey { name: main_sym, desc: main_desc },
        }
    }
}
