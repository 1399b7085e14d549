use crate::error::JvmError;
use crate::heap::{Heap, HeapRef, ObjectBody};
use crate::stack::Frame;
use crate::thread::JavaThread;
use crate::throw_exception;
use crate::vm::VirtualMachine;

pub fn iload(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.locals.get_int(index as usize);
    frame.stack.push_int(value);
    Ok(())
}

pub fn lload(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.locals.get_long(index as usize);
    frame.stack.push_long(value);
    Ok(())
}

pub fn fload(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.locals.get_float(index as usize);
    frame.stack.push_float(value);
    Ok(())
}

pub fn dload(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.locals.get_double(index as usize);
    frame.stack.push_double(value);
    Ok(())
}

pub fn aload(frame: &mut Frame, index: u16) -> Result<(), JvmError> {
    let value = frame.locals.get_ref(index as usize);
    frame.stack.push_ref(value);
    Ok(())
}

/// Pops index and array reference, with the null and bounds checks every
/// array access shares.
pub(crate) fn pop_array_and_index(
    frame: &mut Frame,
    heap: &Heap,
) -> Result<(HeapRef, usize), JvmError> {
    let index = frame.stack.pop_int()?;
    let Some(array) = frame.stack.pop_ref()? else {
        throw_exception!(NullPointerException);
    };
    let length = heap.array_length(array)?;
    if index < 0 || index >= length {
        throw_exception!(
            ArrayIndexOutOfBoundsException,
            "Index {index} out of bounds for length {length}"
        );
    }
    Ok((array, index as usize))
}

pub fn iaload(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &vm.heap.get(array).body {
        ObjectBody::Ints(values) => frame.stack.push_int(values[index]),
        _ => return Err(JvmError::Internal("iaload on a non-int array".to_string())),
    }
    Ok(())
}

pub fn laload(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &vm.heap.get(array).body {
        ObjectBody::Longs(values) => frame.stack.push_long(values[index]),
        _ => return Err(JvmError::Internal("laload on a non-long array".to_string())),
    }
    Ok(())
}

pub fn faload(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &vm.heap.get(array).body {
        ObjectBody::Floats(values) => frame.stack.push_float(values[index]),
        _ => return Err(JvmError::Internal("faload on a non-float array".to_string())),
    }
    Ok(())
}

pub fn daload(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &vm.heap.get(array).body {
        ObjectBody::Doubles(values) => frame.stack.push_double(values[index]),
        _ => return Err(JvmError::Internal("daload on a non-double array".to_string())),
    }
    Ok(())
}

pub fn aaload(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &vm.heap.get(array).body {
        ObjectBody::Refs(values) => frame.stack.push_ref(values[index]),
        _ => return Err(JvmError::Internal("aaload on a non-reference array".to_string())),
    }
    Ok(())
}

/// `baload` serves both `byte[]` and `boolean[]`, sign-extending.
pub fn baload(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &vm.heap.get(array).body {
        ObjectBody::Bytes(values) => frame.stack.push_int(values[index] as i32),
        _ => return Err(JvmError::Internal("baload on a non-byte array".to_string())),
    }
    Ok(())
}

/// `caload` zero-extends the UTF-16 unit.
pub fn caload(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &vm.heap.get(array).body {
        ObjectBody::Chars(values) => frame.stack.push_int(values[index] as i32),
        _ => return Err(JvmError::Internal("caload on a non-char array".to_string())),
    }
    Ok(())
}

pub fn saload(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let (array, index) = pop_array_and_index(frame, &vm.heap)?;
    match &vm.heap.get(array).body {
        ObjectBody::Shorts(values) => frame.stack.push_int(values[index] as i32),
        _ => return Err(JvmError::Internal("saload on a non-short array".to_string())),
    }
    Ok(())
}
