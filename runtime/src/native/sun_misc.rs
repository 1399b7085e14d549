use tracing_log::log::debug;

use crate::error::JvmError;
use crate::keys::{MethodKey, NativeMethodKey};
use crate::native::NativeRegistry;
use crate::stack::Frame;
use crate::thread::JavaThread;
use crate::vm::VirtualMachine;

pub(super) fn register_natives(registry: &mut NativeRegistry) {
    registry.register(
        NativeMethodKey::new_with_str("sun/misc/VM", "initialize", "()V", &registry.string_interner),
        vm_initialize,
    );
    registry.register(
        NativeMethodKey::new_with_str(
            "sun/misc/Signal",
            "findSignal",
            "(Ljava/lang/String;)I",
            &registry.string_interner,
        ),
        signal_find_signal,
    );
    registry.register(
        NativeMethodKey::new_with_str(
            "sun/misc/Signal",
            "handle0",
            "(IJ)J",
            &registry.string_interner,
        ),
        signal_handle0,
    );
}

/// `sun.misc.VM.initialize` trampolines into
/// `java/lang/System.initializeSystemClass()V`; that method builds the
/// system properties and the standard streams, so `System.out` is real
/// by the time user code runs.
fn vm_initialize(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let system_sym = vm.method_area.br().java_lang_system_sym;
    let system = vm.method_area.load(&mut vm.heap, system_sym)?;
    let key = MethodKey {
        name: vm.interner.get_or_intern("initializeSystemClass"),
        desc: vm.method_area.br().void_desc,
    };
    let Some(initialize) = vm.method_area.find_method_in_class(system, &key) else {
        debug!("System.initializeSystemClass not present; continuing without it");
        return Ok(());
    };
    let method = vm.method_area.method(initialize);
    let frame = Frame::new(
        initialize,
        method.class,
        method.code.clone(),
        method.max_locals,
        method.max_stack,
    );
    thread.push_frame(frame)
}

/// Signals exist only far enough for `Terminator.setup()` to succeed.
fn signal_find_signal(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let number = match frame.locals.get_ref(0) {
        Some(name_ref) => match vm.method_area.java_string_text(&vm.heap, name_ref)?.as_str() {
            "HUP" => 1,
            "INT" => 2,
            "TERM" => 15,
            _ => -1,
        },
        None => -1,
    };
    thread.current_frame()?.stack.push_int(number);
    Ok(())
}

fn signal_handle0(_vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    thread.current_frame()?.stack.push_long(0);
    Ok(())
}
