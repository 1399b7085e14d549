use std::io::Write;

use crate::error::JvmError;
use crate::heap::ObjectBody;
use crate::keys::{FieldKey, NativeMethodKey};
use crate::native::NativeRegistry;
use crate::thread::JavaThread;
use crate::throw_exception;
use crate::vm::VirtualMachine;

pub(super) fn register_natives(registry: &mut NativeRegistry) {
    registry.register(
        NativeMethodKey::new_with_str(
            "java/io/FileOutputStream",
            "writeBytes",
            "([BIIZ)V",
            &registry.string_interner,
        ),
        file_output_stream_write_bytes,
    );
}

/// Host-I/O bridge for the two standard streams; any other descriptor is
/// outside this VM's surface.
fn file_output_stream_write_bytes(
    vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let Some(this) = frame.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    let Some(buffer) = frame.locals.get_ref(1) else {
        throw_exception!(NullPointerException);
    };
    let offset = frame.locals.get_int(2);
    let length = frame.locals.get_int(3);

    let fd = descriptor_of_stream(vm, this)?;

    let bytes = match &vm.heap.get(buffer).body {
        ObjectBody::Bytes(values) => values,
        _ => return Err(JvmError::Internal("writeBytes buffer is not a byte array".to_string())),
    };
    if offset < 0 || length < 0 || offset as usize + length as usize > bytes.len() {
        throw_exception!(
            ArrayIndexOutOfBoundsException,
            "Index {} out of bounds for length {}",
            offset + length,
            bytes.len()
        );
    }
    let window: Vec<u8> = bytes[offset as usize..(offset + length) as usize]
        .iter()
        .map(|&byte| byte as u8)
        .collect();

    let outcome = match fd {
        1 => std::io::stdout().write_all(&window).and_then(|_| std::io::stdout().flush()),
        2 => std::io::stderr().write_all(&window).and_then(|_| std::io::stderr().flush()),
        other => {
            return Err(JvmError::Internal(format!(
                "writeBytes on unsupported file descriptor {other}"
            )));
        }
    };
    outcome.map_err(|error| JvmError::Internal(format!("host write failed: {error}")))
}

/// Follows `FileOutputStream.fd` to the wrapped `FileDescriptor.fd` int.
fn descriptor_of_stream(
    vm: &VirtualMachine,
    stream: crate::heap::HeapRef,
) -> Result<i32, JvmError> {
    let stream_class = vm.heap.class_of(stream);
    let fd_field = FieldKey {
        name: vm.interner.get_or_intern("fd"),
        desc: vm.interner.get_or_intern("Ljava/io/FileDescriptor;"),
    };
    let (declaring, field_index) = vm
        .method_area
        .find_field_in_chain(stream_class, &fd_field)
        .ok_or_else(|| JvmError::Internal("FileOutputStream.fd field not found".to_string()))?;
    let slot_id = vm.method_area.class(declaring).field(field_index).slot_id;
    let descriptor = vm
        .heap
        .get(stream)
        .body
        .fields()?
        .get_ref(slot_id)
        .ok_or_else(|| JvmError::Internal("stream has no file descriptor".to_string()))?;

    let descriptor_class = vm.heap.class_of(descriptor);
    let int_field = FieldKey {
        name: vm.interner.get_or_intern("fd"),
        desc: vm.interner.get_or_intern("I"),
    };
    let (declaring, field_index) = vm
        .method_area
        .find_field_in_chain(descriptor_class, &int_field)
        .ok_or_else(|| JvmError::Internal("FileDescriptor.fd field not found".to_string()))?;
    let slot_id = vm.method_area.class(declaring).field(field_index).slot_id;
    Ok(vm.heap.get(descriptor).body.fields()?.get_int(slot_id))
}
