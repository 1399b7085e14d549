use crate::error::JvmError;
use crate::keys::NativeMethodKey;
use crate::thread::JavaThread;
use crate::throw_exception;
use crate::vm::VirtualMachine;

/// Reserved opcode 0xFE, present only in injected native bodies: looks
/// up the binding for the current method and calls it. The instruction
/// after it is the matching return, so a value the native pushed flows
/// back to the caller through the normal return path.
pub fn invoke_native(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let method = vm.method_area.method(thread.current_frame()?.method);
    let class_name = vm.method_area.class(method.class).name;
    let key = NativeMethodKey::new(class_name, method.name, method.desc);

    if let Some(native) = vm.natives.find(&key) {
        return native(vm, thread);
    }
    if vm.natives.is_stubbable(&key) {
        return Ok(());
    }
    throw_exception!(
        UnsatisfiedLinkError,
        "{}.{}{}",
        vm.method_area.interner().resolve(&key.class),
        vm.method_area.interner().resolve(&key.name),
        vm.method_area.interner().resolve(&key.desc)
    );
}
