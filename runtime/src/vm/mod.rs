use std::sync::Arc;

use lasso::ThreadedRodeo;
use tracing_log::log::debug;

use crate::VmConfig;
use crate::class_loader::ClassLoader;
use crate::error::{JavaExceptionKind, JvmError};
use crate::heap::{Extra, Heap, HeapRef, Object, ObjectBody};
use crate::interpreter::Interpreter;
use crate::stack::Frame;
use crate::thread::JavaThread;
use crate::vm::bootstrap_registry::BootstrapRegistry;

pub mod bootstrap_registry;

use crate::heap::method_area::MethodArea;
use crate::native::NativeRegistry;

/// The assembled machine: method area, heap, native registry and the
/// shared interner. Execution state lives in the caller's
/// [`JavaThread`].
pub struct VirtualMachine {
    pub method_area: MethodArea,
    pub heap: Heap,
    pub natives: NativeRegistry,
    pub interner: Arc<ThreadedRodeo>,
    pub verbose_inst: bool,
    pub(crate) main_thread_object: Option<HeapRef>,
}

impl VirtualMachine {
    pub fn new(config: &VmConfig) -> Result<VirtualMachine, JvmError> {
        let interner = Arc::new(ThreadedRodeo::default());
        let loader = ClassLoader::new(config)?;
        let method_area = MethodArea::new(loader, interner.clone());
        let natives = NativeRegistry::new(interner.clone());
        Ok(VirtualMachine {
            method_area,
            heap: Heap::new(),
            natives,
            interner,
            verbose_inst: config.verbose_inst,
            main_thread_object: None,
        })
    }

    pub fn br(&self) -> &BootstrapRegistry {
        self.method_area.br()
    }

    /// Boot: load and initialize `sun/misc/VM` and drive its `<clinit>`
    /// (and everything it drags in) to completion.
    pub fn boot(&mut self, thread: &mut JavaThread) -> Result<(), JvmError> {
        debug!("booting: initializing sun/misc/VM");
        let boot_sym = self.br().sun_misc_vm_sym;
        let boot_class = self.method_area.load(&mut self.heap, boot_sym)?;
        Interpreter::init_class(self, thread, boot_class)?;
        Interpreter::run(self, thread)
    }

    /// Loads the entry class, frames its
    /// `main([Ljava/lang/String;)V`, schedules the entry class's
    /// initializers on top, and interprets until the stack empties.
    pub fn exec_main(
        &mut self,
        thread: &mut JavaThread,
        main_class_name: &str,
        args: &[String],
    ) -> Result<(), JvmError> {
        let name_sym = self.interner.get_or_intern(main_class_name);
        let main_class = self.method_area.load(&mut self.heap, name_sym).map_err(|error| {
            match error {
                JvmError::Exception(ex) if ex.kind == JavaExceptionKind::ClassNotFoundException => {
                    JvmError::MainClassNotFound(main_class_name.replace('/', "."))
                }
                other => other,
            }
        })?;

        let main_method = self
            .method_area
            .find_method_in_class(main_class, &self.br().main_mk)
            .filter(|&id| self.method_area.method(id).is_static())
            .ok_or_else(|| JvmError::MainMethodNotFound(main_class_name.replace('/', ".")))?;

        let args_array = self.create_args_array(args)?;
        let method = self.method_area.method(main_method);
        let mut frame = Frame::new(
            main_method,
            main_class,
            method.code.clone(),
            method.max_locals,
            method.max_stack,
        );
        frame.locals.set_ref(0, Some(args_array));
        thread.push_frame(frame)?;

        // the entry class's <clinit> frames land on top of main and run
        // before its first instruction
        Interpreter::init_class(self, thread, main_class)?;
        Interpreter::run(self, thread)
    }

    /// Program arguments become a `String[]` of interned strings.
    fn create_args_array(&mut self, args: &[String]) -> Result<HeapRef, JvmError> {
        let array_sym = self.br().string_array_sym;
        let array_class = self.method_area.load(&mut self.heap, array_sym)?;
        let mut elements = Vec::with_capacity(args.len());
        for arg in args {
            let symbol = self.interner.get_or_intern(arg);
            elements.push(Some(self.method_area.intern_jstring(&mut self.heap, symbol)?));
        }
        Ok(self.heap.alloc(Object {
            class: array_class,
            body: ObjectBody::Refs(elements),
            extra: Extra::None,
        }))
    }
}
