use crate::error::JvmError;
use crate::rt::constant_pool::RuntimeConstant;
use crate::stack::Frame;
use crate::thread::JavaThread;
use crate::throw_exception;
use crate::vm::VirtualMachine;

/// `ldc` / `ldc_w`: int, float, string literal, or class mirror.
pub fn ldc(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    enum Loaded {
        Int(i32),
        Float(f32),
        Text(crate::keys::Symbol),
        Class(u16),
    }
    let loaded = match vm.method_area.class(from).cp.get(index)? {
        RuntimeConstant::Integer(v) => Loaded::Int(*v),
        RuntimeConstant::Float(v) => Loaded::Float(*v),
        RuntimeConstant::StringLiteral(text) => Loaded::Text(*text),
        RuntimeConstant::Class(_) => Loaded::Class(index),
        _ => throw_exception!(ClassFormatError, "ldc operand {index} is not loadable"),
    };
    match loaded {
        Loaded::Int(v) => thread.current_frame()?.stack.push_int(v),
        Loaded::Float(v) => thread.current_frame()?.stack.push_float(v),
        Loaded::Text(text) => {
            let reference = vm.method_area.intern_jstring(&mut vm.heap, text)?;
            thread.current_frame()?.stack.push_ref(Some(reference));
        }
        Loaded::Class(index) => {
            let class = vm.method_area.resolve_class_ref(&mut vm.heap, from, index)?;
            let mirror = vm.method_area.class(class).mirror.ok_or_else(|| {
                JvmError::Internal("class mirror not attached".to_string())
            })?;
            thread.current_frame()?.stack.push_ref(Some(mirror));
        }
    }
    Ok(())
}

/// `ldc2_w`: long or double.
pub fn ldc2_w(
    vm: &mut VirtualMachine,
    thread: &mut JavaThread,
    index: u16,
) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    enum Wide {
        Long(i64),
        Double(f64),
    }
    let loaded = match vm.method_area.class(from).cp.get(index)? {
        RuntimeConstant::Long(v) => Wide::Long(*v),
        RuntimeConstant::Double(v) => Wide::Double(*v),
        _ => throw_exception!(ClassFormatError, "ldc2_w operand {index} is not long or double"),
    };
    let stack = &mut thread.current_frame()?.stack;
    match loaded {
        Wide::Long(v) => stack.push_long(v),
        Wide::Double(v) => stack.push_double(v),
    }
    Ok(())
}

pub fn aconst_null(frame: &mut Frame) -> Result<(), JvmError> {
    frame.stack.push_ref(None);
    Ok(())
}
