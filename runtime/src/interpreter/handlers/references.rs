use hervor_classfile::descriptor::FieldType;
use smallvec::SmallVec;

use crate::error::JvmError;
use crate::heap::{Extra, HeapRef, Object, ObjectBody};
use crate::interpreter::Interpreter;
use crate::interpreter::instruction::ArrayType;
use crate::keys::{ClassId, MethodId, MethodKey};
use crate::rt::InitState;
use crate::stack::Frame;
use crate::thread::JavaThread;
use crate::throw_exception;
use crate::vm::VirtualMachine;

/// Storage shape of a field, derived from its descriptor.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Int,
    Long,
    Float,
    Double,
    Ref,
}

fn field_kind(field_type: &FieldType) -> FieldKind {
    match field_type {
        FieldType::Long => FieldKind::Long,
        FieldType::Double => FieldKind::Double,
        FieldType::Float => FieldKind::Float,
        FieldType::Object(_) | FieldType::Array(_) => FieldKind::Ref,
        _ => FieldKind::Int,
    }
}

/// The initialization interleave shared by `new`, the static field
/// accessors and `invokestatic`: when the touched class is still
/// uninitialized, revert this instruction's pc, schedule the `<clinit>`
/// frames, and report `false` so the caller returns without executing
/// its effect. The instruction re-executes once the initializer frames
/// have popped.
pub(crate) fn ensure_initialized(
    vm: &mut VirtualMachine,
    thread: &mut JavaThread,
    class: ClassId,
) -> Result<bool, JvmError> {
    if vm.method_area.class(class).init_state != InitState::Uninitialized {
        return Ok(true);
    }
    let pc = thread.pc;
    thread.current_frame()?.revert_next_pc(pc);
    Interpreter::init_class(vm, thread, class)?;
    Ok(false)
}

pub fn getstatic(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let (declaring, field_index) = vm.method_area.resolve_field_ref(&mut vm.heap, from, index)?;
    let field = vm.method_area.class(declaring).field(field_index);
    if !field.is_static() {
        throw_exception!(IncompatibleClassChangeError, "expected static field");
    }
    let (kind, slot_id) = (field_kind(&field.field_type), field.slot_id);

    if !ensure_initialized(vm, thread, declaring)? {
        return Ok(());
    }

    let static_vars = &vm.method_area.class(declaring).static_vars;
    let frame = thread.current_frame()?;
    match kind {
        FieldKind::Int => frame.stack.push_int(static_vars.get_int(slot_id)),
        FieldKind::Float => frame.stack.push_float(static_vars.get_float(slot_id)),
        FieldKind::Long => frame.stack.push_long(static_vars.get_long(slot_id)),
        FieldKind::Double => frame.stack.push_double(static_vars.get_double(slot_id)),
        FieldKind::Ref => frame.stack.push_ref(static_vars.get_ref(slot_id)),
    }
    Ok(())
}

pub fn putstatic(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let (declaring, field_index) = vm.method_area.resolve_field_ref(&mut vm.heap, from, index)?;
    let field = vm.method_area.class(declaring).field(field_index);
    if !field.is_static() {
        throw_exception!(IncompatibleClassChangeError, "expected static field");
    }
    let (kind, slot_id, is_final) = (field_kind(&field.field_type), field.slot_id, field.is_final());

    if is_final {
        let current_method = vm.method_area.method(thread.current_frame()?.method);
        if from != declaring || current_method.name != vm.method_area.br().clinit_sym {
            throw_exception!(IllegalAccessError, "assignment to static final field");
        }
    }

    if !ensure_initialized(vm, thread, declaring)? {
        return Ok(());
    }

    let frame = thread.current_frame()?;
    enum Popped {
        Int(i32),
        Long(i64),
        Ref(Option<HeapRef>),
    }
    let value = match kind {
        FieldKind::Int | FieldKind::Float => Popped::Int(frame.stack.pop_int()?),
        FieldKind::Long | FieldKind::Double => Popped::Long(frame.stack.pop_long()?),
        FieldKind::Ref => Popped::Ref(frame.stack.pop_ref()?),
    };
    let static_vars = &mut vm.method_area.class_mut(declaring).static_vars;
    match value {
        Popped::Int(v) => static_vars.set_int(slot_id, v),
        Popped::Long(v) => static_vars.set_long(slot_id, v),
        Popped::Ref(v) => static_vars.set_ref(slot_id, v),
    }
    Ok(())
}

pub fn getfield(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let (declaring, field_index) = vm.method_area.resolve_field_ref(&mut vm.heap, from, index)?;
    let field = vm.method_area.class(declaring).field(field_index);
    if field.is_static() {
        throw_exception!(IncompatibleClassChangeError, "expected instance field");
    }
    let (kind, slot_id) = (field_kind(&field.field_type), field.slot_id);

    let frame = thread.current_frame()?;
    let Some(object) = frame.stack.pop_ref()? else {
        throw_exception!(NullPointerException);
    };
    let fields = vm.heap.get(object).body.fields()?;
    match kind {
        FieldKind::Int => frame.stack.push_int(fields.get_int(slot_id)),
        FieldKind::Float => frame.stack.push_float(fields.get_float(slot_id)),
        FieldKind::Long => frame.stack.push_long(fields.get_long(slot_id)),
        FieldKind::Double => frame.stack.push_double(fields.get_double(slot_id)),
        FieldKind::Ref => frame.stack.push_ref(fields.get_ref(slot_id)),
    }
    Ok(())
}

pub fn putfield(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let (declaring, field_index) = vm.method_area.resolve_field_ref(&mut vm.heap, from, index)?;
    let field = vm.method_area.class(declaring).field(field_index);
    if field.is_static() {
        throw_exception!(IncompatibleClassChangeError, "expected instance field");
    }
    let (kind, slot_id, is_final) = (field_kind(&field.field_type), field.slot_id, field.is_final());

    if is_final {
        let current_method = vm.method_area.method(thread.current_frame()?.method);
        if from != declaring || current_method.name != vm.method_area.br().init_sym {
            throw_exception!(IllegalAccessError, "assignment to final field");
        }
    }

    let frame = thread.current_frame()?;
    enum Popped {
        Int(i32),
        Long(i64),
        Ref(Option<HeapRef>),
    }
    let value = match kind {
        FieldKind::Int | FieldKind::Float => Popped::Int(frame.stack.pop_int()?),
        FieldKind::Long | FieldKind::Double => Popped::Long(frame.stack.pop_long()?),
        FieldKind::Ref => Popped::Ref(frame.stack.pop_ref()?),
    };
    let Some(object) = frame.stack.pop_ref()? else {
        throw_exception!(NullPointerException);
    };
    let fields = vm.heap.get_mut(object).body.fields_mut()?;
    match value {
        Popped::Int(v) => fields.set_int(slot_id, v),
        Popped::Long(v) => fields.set_long(slot_id, v),
        Popped::Ref(v) => fields.set_ref(slot_id, v),
    }
    Ok(())
}

/// Pops `arg_slot_count` slots off the caller in reverse into the new
/// frame's locals and pushes the frame; uniform for interpreted and
/// native (injected-body) methods.
pub fn invoke_method(
    vm: &mut VirtualMachine,
    thread: &mut JavaThread,
    method_id: MethodId,
) -> Result<(), JvmError> {
    let method = vm.method_area.method(method_id);
    let mut frame = Frame::new(
        method_id,
        method.class,
        method.code.clone(),
        method.max_locals,
        method.max_stack,
    );
    let arg_slots = method.arg_slot_count;

    let caller = thread.current_frame()?;
    for index in (0..arg_slots).rev() {
        let slot = caller.stack.pop_slot()?;
        frame.locals.set_slot(index, slot);
    }
    thread.push_frame(frame)
}

pub fn invokestatic(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let (declaring, method_id) = vm.method_area.resolve_method_ref(&mut vm.heap, from, index)?;
    if !vm.method_area.method(method_id).is_static() {
        throw_exception!(IncompatibleClassChangeError, "expected static method");
    }
    if !ensure_initialized(vm, thread, declaring)? {
        return Ok(());
    }
    invoke_method(vm, thread, method_id)
}

/// `invokespecial` binds statically: constructors, private methods, and
/// super calls use the resolved method as-is.
pub fn invokespecial(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let (_, method_id) = vm.method_area.resolve_method_ref(&mut vm.heap, from, index)?;
    let method = vm.method_area.method(method_id);
    if method.is_static() {
        throw_exception!(IncompatibleClassChangeError, "expected instance method");
    }
    if method.is_abstract() {
        throw_exception!(AbstractMethodError);
    }
    let arg_slots = method.arg_slot_count;
    if thread.current_frame()?.stack.ref_from_top(arg_slots - 1)?.is_none() {
        throw_exception!(NullPointerException);
    }
    invoke_method(vm, thread, method_id)
}

pub fn invokevirtual(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let (_, resolved_id) = vm.method_area.resolve_method_ref(&mut vm.heap, from, index)?;
    let resolved = vm.method_area.method(resolved_id);
    if resolved.is_static() {
        throw_exception!(IncompatibleClassChangeError, "expected instance method");
    }
    let arg_slots = resolved.arg_slot_count;
    let key = MethodKey { name: resolved.name, desc: resolved.desc };

    let Some(receiver) = thread.current_frame()?.stack.ref_from_top(arg_slots - 1)? else {
        throw_exception!(NullPointerException);
    };
    let receiver_class = vm.heap.class_of(receiver);
    let target = dispatch_on_receiver(vm, receiver_class, &key)?;
    invoke_method(vm, thread, target)
}

pub fn invokeinterface(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let (interface, resolved_id) =
        vm.method_area.resolve_interface_method_ref(&mut vm.heap, from, index)?;
    let resolved = vm.method_area.method(resolved_id);
    if resolved.is_static() {
        throw_exception!(IncompatibleClassChangeError, "expected instance method");
    }
    let arg_slots = resolved.arg_slot_count;
    let key = MethodKey { name: resolved.name, desc: resolved.desc };

    let Some(receiver) = thread.current_frame()?.stack.ref_from_top(arg_slots - 1)? else {
        throw_exception!(NullPointerException);
    };
    let receiver_class = vm.heap.class_of(receiver);
    if !vm.method_area.is_assignable(receiver_class, interface) {
        throw_exception!(
            IncompatibleClassChangeError,
            "{} does not implement {}",
            vm.method_area.class_name(receiver_class),
            vm.method_area.class_name(interface)
        );
    }
    let target = dispatch_on_receiver(vm, receiver_class, &key)?;
    if !vm.method_area.method(target).flags.is_public() {
        throw_exception!(IllegalAccessError, "interface dispatch to a non-public method");
    }
    invoke_method(vm, thread, target)
}

/// Runtime dispatch: walk the receiver's super chain for a matching
/// method; abstract or missing means AbstractMethodError.
fn dispatch_on_receiver(
    vm: &VirtualMachine,
    receiver_class: ClassId,
    key: &MethodKey,
) -> Result<MethodId, JvmError> {
    match vm.method_area.find_method_in_chain(receiver_class, key) {
        Some((_, target)) if !vm.method_area.method(target).is_abstract() => Ok(target),
        _ => {
            throw_exception!(
                AbstractMethodError,
                "{}.{}",
                vm.method_area.class_name(receiver_class),
                vm.method_area.interner().resolve(&key.name)
            )
        }
    }
}

pub fn new_instance(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let class = vm.method_area.resolve_class_ref(&mut vm.heap, from, index)?;
    if vm.method_area.class(class).is_interface() || vm.method_area.class(class).is_abstract() {
        throw_exception!(InstantiationError, "{}", vm.method_area.class_name(class));
    }
    if !ensure_initialized(vm, thread, class)? {
        return Ok(());
    }
    let slot_count = vm.method_area.class(class).instance_slot_count;
    let reference = vm.heap.alloc(Object::new_instance(class, slot_count));
    thread.current_frame()?.stack.push_ref(Some(reference));
    Ok(())
}

/// Zero-filled array body for an array class, shaped by its element.
pub(crate) fn alloc_array(
    vm: &mut VirtualMachine,
    class: ClassId,
    length: usize,
) -> Result<HeapRef, JvmError> {
    let element = vm
        .method_area
        .class(class)
        .element_class()
        .ok_or_else(|| JvmError::Internal("array allocation on a non-array class".to_string()))?;
    let body = match vm.method_area.class_name(element) {
        "boolean" | "byte" => ObjectBody::Bytes(vec![0; length]),
        "char" => ObjectBody::Chars(vec![0; length]),
        "short" => ObjectBody::Shorts(vec![0; length]),
        "int" => ObjectBody::Ints(vec![0; length]),
        "long" => ObjectBody::Longs(vec![0; length]),
        "float" => ObjectBody::Floats(vec![0.0; length]),
        "double" => ObjectBody::Doubles(vec![0.0; length]),
        _ => ObjectBody::Refs(vec![None; length]),
    };
    Ok(vm.heap.alloc(Object { class, body, extra: Extra::None }))
}

pub fn newarray(vm: &mut VirtualMachine, thread: &mut JavaThread, atype: ArrayType) -> Result<(), JvmError> {
    let count = thread.current_frame()?.stack.pop_int()?;
    if count < 0 {
        throw_exception!(NegativeArraySizeException, "{count}");
    }
    let descriptor = match atype {
        ArrayType::Boolean => "[Z",
        ArrayType::Char => "[C",
        ArrayType::Float => "[F",
        ArrayType::Double => "[D",
        ArrayType::Byte => "[B",
        ArrayType::Short => "[S",
        ArrayType::Int => "[I",
        ArrayType::Long => "[J",
    };
    let class = vm.method_area.load_str(&mut vm.heap, descriptor)?;
    let reference = alloc_array(vm, class, count as usize)?;
    thread.current_frame()?.stack.push_ref(Some(reference));
    Ok(())
}

pub fn anewarray(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let component = vm.method_area.resolve_class_ref(&mut vm.heap, from, index)?;
    let count = thread.current_frame()?.stack.pop_int()?;
    if count < 0 {
        throw_exception!(NegativeArraySizeException, "{count}");
    }
    let class = vm.method_area.array_class_of(&mut vm.heap, component)?;
    let reference = alloc_array(vm, class, count as usize)?;
    thread.current_frame()?.stack.push_ref(Some(reference));
    Ok(())
}

pub fn multianewarray(
    vm: &mut VirtualMachine,
    thread: &mut JavaThread,
    index: u16,
    dimensions: u8,
) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let class = vm.method_area.resolve_class_ref(&mut vm.heap, from, index)?;

    let frame = thread.current_frame()?;
    let mut counts: SmallVec<[i32; 8]> = SmallVec::with_capacity(dimensions as usize);
    for _ in 0..dimensions {
        counts.push(frame.stack.pop_int()?);
    }
    counts.reverse();
    for &count in &counts {
        if count < 0 {
            throw_exception!(NegativeArraySizeException, "{count}");
        }
    }

    let reference = new_multi_array(vm, class, &counts)?;
    thread.current_frame()?.stack.push_ref(Some(reference));
    Ok(())
}

fn new_multi_array(
    vm: &mut VirtualMachine,
    class: ClassId,
    counts: &[i32],
) -> Result<HeapRef, JvmError> {
    let length = counts[0] as usize;
    if counts.len() == 1 {
        return alloc_array(vm, class, length);
    }
    let element = vm
        .method_area
        .class(class)
        .element_class()
        .ok_or_else(|| JvmError::Internal("multianewarray ran out of array ranks".to_string()))?;
    let mut sub_arrays = Vec::with_capacity(length);
    for _ in 0..length {
        sub_arrays.push(Some(new_multi_array(vm, element, &counts[1..])?));
    }
    Ok(vm.heap.alloc(Object {
        class,
        body: ObjectBody::Refs(sub_arrays),
        extra: Extra::None,
    }))
}

pub fn arraylength(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let Some(array) = frame.stack.pop_ref()? else {
        throw_exception!(NullPointerException);
    };
    let length = vm.heap.array_length(array)?;
    frame.stack.push_int(length);
    Ok(())
}

/// Pops the throwable and hands it to the dispatch machinery as a
/// thrown reference.
pub fn athrow(thread: &mut JavaThread) -> Result<(), JvmError> {
    let Some(exception) = thread.current_frame()?.stack.pop_ref()? else {
        throw_exception!(NullPointerException);
    };
    Err(JvmError::Thrown(exception))
}

pub fn checkcast(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    // null passes silently and stays on the stack
    let Some(object) = thread.current_frame()?.stack.ref_from_top(0)? else {
        return Ok(());
    };
    let target = vm.method_area.resolve_class_ref(&mut vm.heap, from, index)?;
    let source = vm.heap.class_of(object);
    if !vm.method_area.is_assignable(source, target) {
        throw_exception!(
            ClassCastException,
            "{} cannot be cast to {}",
            vm.method_area.class_name(source).replace('/', "."),
            vm.method_area.class_name(target).replace('/', ".")
        );
    }
    Ok(())
}

pub fn instance_of(vm: &mut VirtualMachine, thread: &mut JavaThread, index: u16) -> Result<(), JvmError> {
    let from = thread.current_frame()?.class;
    let object = thread.current_frame()?.stack.pop_ref()?;
    let target = vm.method_area.resolve_class_ref(&mut vm.heap, from, index)?;
    let result = match object {
        Some(reference) => vm.method_area.is_assignable(vm.heap.class_of(reference), target),
        None => false,
    };
    thread.current_frame()?.stack.push_int(result as i32);
    Ok(())
}

/// Monitors degrade to null checks in the single-threaded model.
pub fn monitor_enter(thread: &mut JavaThread) -> Result<(), JvmError> {
    if thread.current_frame()?.stack.pop_ref()?.is_none() {
        throw_exception!(NullPointerException);
    }
    Ok(())
}

pub fn monitor_exit(thread: &mut JavaThread) -> Result<(), JvmError> {
    if thread.current_frame()?.stack.pop_ref()?.is_none() {
        throw_exception!(NullPointerException);
    }
    Ok(())
}
