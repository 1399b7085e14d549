use crate::error::JvmError;
use crate::heap::ObjectBody;
use crate::interpreter::handlers::loads::pop_array_and_index;
use crate::stack::Frame;
use crate::thread::JavaThread;
use crate::throw_exception;
use crate::vm::VirtualMachine;

pub fn istore(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.stack.pop_int()?;
    frame.locals.set_int(index as usize, value);
    Ok(())
}

pub fn lstore(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.stack.pop_long()?;
    frame.locals.set_long(index as usize, value);
    Ok(())
}

pub fn fstore(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.stack.pop_float()?;
    frame.locals.set_float(index as usize, value);
    Ok(())
}

pub fn dstore(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.stack.pop_double()?;
    frame.locals.set_double(index as usize, value);
    Ok(())
}

pub fn astore(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.stack.pop_ref()?;
    frame.locals.set_ref(index as usize, value);
    Ok(())
}

pub fn iastore(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.stack.pop_int()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &mut vm.heap.get_mut(array).body {
        ObjectBody::Ints(values) => values[index] = value,
        _ => return Err(JvmError::Internal("iastore on a non-int array".to_string())),
    }
    Ok(())
}

pub fn lastore(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.stack.pop_long()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &mut vm.heap.get_mut(array).body {
        ObjectBody::Longs(values) => values[index] = value,
        _ => return Err(JvmError::Internal("lastore on a non-long array".to_string())),
    }
    Ok(())
}

pub fn fastore(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.stack.pop_float()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &mut vm.heap.get_mut(array).body {
        ObjectBody::Floats(values) => values[index] = value,
        _ => return Err(JvmError::Internal("fastore on a non-float array".to_string())),
    }
    Ok(())
}

pub fn dastore(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.stack.pop_double()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &mut vm.heap.get_mut(array).body {
        ObjectBody::Doubles(values) => values[index] = value,
        _ => return Err(JvmError::Internal("dastore on a non-double array".to_string())),
    }
    Ok(())
}

/// Reference stores check assignability of the stored value against the
/// array's component class.
pub fn aastore(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.stack.pop_ref()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;

    if let Some(stored) = value {
        let component = vm
            .method_area
            .class(vm.heap.class_of(array))
            .element_class()
            .ok_or_else(|| JvmError::Internal("aastore on a non-array class".to_string()))?;
        let stored_class = vm.heap.class_of(stored);
        if !vm.method_area.is_assignable(stored_class, component) {
            throw_exception!(
                ArrayStoreException,
                "{}",
                vm.method_area.class_name(stored_class).replace('/', ".")
            );
        }
    }

    match &mut vm.heap.get_mut(array).body {
        ObjectBody::Refs(values) => values[index] = value,
        _ => return Err(JvmError::Internal("aastore on a non-reference array".to_string())),
    }
    Ok(())
}

/// `bastore` serves both `byte[]` and `boolean[]`, truncating.
pub fn bastore(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.stack.pop_int()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &mut vm.heap.get_mut(array).body {
        ObjectBody::Bytes(values) => values[index] = value as i8,
        _ => return Err(JvmError::Internal("bastore on a non-byte array".to_string())),
    }
    Ok(())
}

pub fn castore(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.stack.pop_int()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &mut vm.heap.get_mut(array).body {
        ObjectBody::Chars(values) => values[index] = value as u16,
        _ => return Err(JvmError::Internal("castore on a non-char array".to_string())),
    }
    Ok(())
}

pub fn sastore(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.stack.pop_int()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &mut vm.heap.get_mut(array).body {
        ObjectBody::Shorts(values) => values[index] = value as i16,
        _ => return Err(JvmError::Internal("sastore on a non-short array".to_string())),
    }
    Ok(())
}
