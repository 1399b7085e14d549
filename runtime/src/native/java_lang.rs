use std::time::{SystemTime, UNIX_EPOCH};

use tracing_log::log::debug;

use crate::error::JvmError;
use crate::heap::Extra;
use crate::interpreter::Interpreter;
use crate::keys::{FieldKey, MethodKey, NativeMethodKey};
use crate::native::NativeRegistry;
use crate::stack::Frame;
use crate::thread::JavaThread;
use crate::throw_exception;
use crate::vm::VirtualMachine;

pub(super) fn register_natives(registry: &mut NativeRegistry) {
    let entries: &[(&str, &str, &str, crate::native::NativeFn)] = &[
        ("java/lang/Object", "getClass", "()Ljava/lang/Class;", object_get_class),
        ("java/lang/Object", "hashCode", "()I", object_hash_code),
        ("java/lang/Object", "clone", "()Ljava/lang/Object;", object_clone),
        ("java/lang/Class", "getPrimitiveClass", "(Ljava/lang/String;)Ljava/lang/Class;", class_get_primitive_class),
        ("java/lang/Class", "getName0", "()Ljava/lang/String;", class_get_name0),
        ("java/lang/Class", "desiredAssertionStatus0", "(Ljava/lang/Class;)Z", class_desired_assertion_status0),
        ("java/lang/Class", "getClassLoader0", "()Ljava/lang/ClassLoader;", class_get_class_loader0),
        ("java/lang/System", "arraycopy", "(Ljava/lang/Object;ILjava/lang/Object;II)V", system_arraycopy),
        ("java/lang/System", "initProperties", "(Ljava/util/Properties;)Ljava/util/Properties;", system_init_properties),
        ("java/lang/System", "currentTimeMillis", "()J", system_current_time_millis),
        ("java/lang/System", "nanoTime", "()J", system_nano_time),
        ("java/lang/System", "setIn0", "(Ljava/io/InputStream;)V", system_set_in0),
        ("java/lang/System", "setOut0", "(Ljava/io/PrintStream;)V", system_set_out0),
        ("java/lang/System", "setErr0", "(Ljava/io/PrintStream;)V", system_set_err0),
        ("java/lang/System", "identityHashCode", "(Ljava/lang/Object;)I", system_identity_hash_code),
        ("java/lang/Float", "floatToRawIntBits", "(F)I", float_to_raw_int_bits),
        ("java/lang/Float", "intBitsToFloat", "(I)F", int_bits_to_float),
        ("java/lang/Double", "doubleToRawLongBits", "(D)J", double_to_raw_long_bits),
        ("java/lang/Double", "longBitsToDouble", "(J)D", long_bits_to_double),
        ("java/lang/String", "intern", "()Ljava/lang/String;", string_intern),
        ("java/lang/Throwable", "fillInStackTrace", "(I)Ljava/lang/Throwable;", throwable_fill_in_stack_trace),
        ("java/lang/Thread", "currentThread", "()Ljava/lang/Thread;", thread_current_thread),
        ("java/lang/Thread", "setPriority0", "(I)V", thread_set_priority0),
        ("java/lang/Thread", "isAlive", "()Z", thread_is_alive),
        ("java/lang/Thread", "start0", "()V", thread_start0),
        ("java/security/AccessController", "doPrivileged", "(Ljava/security/PrivilegedAction;)Ljava/lang/Object;", access_controller_do_privileged),
        ("java/security/AccessController", "doPrivileged", "(Ljava/security/PrivilegedExceptionAction;)Ljava/lang/Object;", access_controller_do_privileged),
        ("java/security/AccessController", "getStackAccessControlContext", "()Ljava/security/AccessControlContext;", access_controller_get_stack_context),
    ];
    for (class, name, desc, binding) in entries {
        registry.register(
            NativeMethodKey::new_with_str(class, name, desc, &registry.string_interner),
            *binding,
        );
    }
}

fn object_get_class(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let Some(this) = frame.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    let class = vm.heap.class_of(this);
    let mirror = vm
        .method_area
        .class(class)
        .mirror
        .ok_or_else(|| JvmError::Internal("class mirror not attached".to_string()))?;
    frame.stack.push_ref(Some(mirror));
    Ok(())
}

fn object_hash_code(_vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let Some(this) = frame.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    frame.stack.push_int(this.handle());
    Ok(())
}

fn object_clone(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let Some(this) = frame.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    let copy = vm.heap.clone_object(this);
    frame.stack.push_ref(Some(copy));
    Ok(())
}

fn class_get_primitive_class(
    vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    let Some(name_ref) = thread.current_frame()?.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    let name = vm.method_area.java_string_text(&vm.heap, name_ref)?;
    let class = vm.method_area.load_str(&mut vm.heap, &name)?;
    let mirror = vm
        .method_area
        .class(class)
        .mirror
        .ok_or_else(|| JvmError::Internal("primitive mirror not attached".to_string()))?;
    thread.current_frame()?.stack.push_ref(Some(mirror));
    Ok(())
}

fn class_get_name0(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let Some(this) = thread.current_frame()?.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    let class = vm.method_area.class_of_mirror(&vm.heap, this)?;
    let dotted = vm.method_area.class_name(class).replace('/', ".");
    let symbol = vm.interner.get_or_intern(&dotted);
    let reference = vm.method_area.intern_jstring(&mut vm.heap, symbol)?;
    thread.current_frame()?.stack.push_ref(Some(reference));
    Ok(())
}

fn class_desired_assertion_status0(
    _vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    thread.current_frame()?.stack.push_int(0);
    Ok(())
}

/// Everything loads through the one flat loader, which Java sees as the
/// bootstrap loader: null.
fn class_get_class_loader0(
    _vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    thread.current_frame()?.stack.push_ref(None);
    Ok(())
}

fn system_arraycopy(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let src = frame.locals.get_ref(0);
    let src_pos = frame.locals.get_int(1);
    let dest = frame.locals.get_ref(2);
    let dest_pos = frame.locals.get_int(3);
    let length = frame.locals.get_int(4);
    let (Some(src), Some(dest)) = (src, dest) else {
        throw_exception!(NullPointerException);
    };
    vm.heap.copy_array(src, src_pos, dest, dest_pos, length)
}

const SYSTEM_PROPERTIES: &[(&str, &str)] = &[
    ("java.version", "1.8.0"),
    ("java.vendor", "hervor"),
    ("java.vendor.url", "https://github.com/hervor-vm"),
    ("java.home", "."),
    ("java.class.version", "52.0"),
    ("java.class.path", "."),
    ("os.name", "Linux"),
    ("os.arch", "amd64"),
    ("os.version", ""),
    ("file.separator", "/"),
    ("path.separator", ":"),
    ("line.separator", "\n"),
    ("user.name", ""),
    ("user.home", ""),
    ("user.dir", "."),
    ("file.encoding", "UTF-8"),
    ("sun.stdout.encoding", "UTF-8"),
    ("sun.stderr.encoding", "UTF-8"),
];

/// Returns its argument and schedules one `setProperty` call per entry,
/// each under a shim frame that swallows the returned previous value.
fn system_init_properties(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let Some(props) = thread.current_frame()?.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    thread.current_frame()?.stack.push_ref(Some(props));

    let set_property_key = MethodKey {
        name: vm.interner.get_or_intern("setProperty"),
        desc: vm
            .interner
            .get_or_intern("(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/Object;"),
    };
    let props_class = vm.heap.class_of(props);
    let Some((_, set_property)) = vm.method_area.find_method_in_chain(props_class, &set_property_key)
    else {
        return Err(JvmError::Internal("Properties.setProperty not found".to_string()));
    };

    let shim_id = vm.method_area.shim_method()?;
    for (key, value) in SYSTEM_PROPERTIES {
        let key_sym = vm.interner.get_or_intern(key);
        let value_sym = vm.interner.get_or_intern(value);
        let key_ref = vm.method_area.intern_jstring(&mut vm.heap, key_sym)?;
        let value_ref = vm.method_area.intern_jstring(&mut vm.heap, value_sym)?;

        let shim = vm.method_area.method(shim_id);
        let shim_frame =
            Frame::new(shim_id, shim.class, shim.code.clone(), shim.max_locals, shim.max_stack);
        thread.push_frame(shim_frame)?;

        let callee = vm.method_area.method(set_property);
        let mut frame = Frame::new(
            set_property,
            callee.class,
            callee.code.clone(),
            callee.max_locals,
            callee.max_stack,
        );
        frame.locals.set_ref(0, Some(props));
        frame.locals.set_ref(1, Some(key_ref));
        frame.locals.set_ref(2, Some(value_ref));
        thread.push_frame(frame)?;
    }
    debug!("scheduled {} system property writes", SYSTEM_PROPERTIES.len());
    Ok(())
}

fn system_current_time_millis(
    _vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0);
    thread.current_frame()?.stack.push_long(millis);
    Ok(())
}

fn system_nano_time(_vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as i64)
        .unwrap_or(0);
    thread.current_frame()?.stack.push_long(nanos);
    Ok(())
}

fn set_system_stream(
    vm: &mut VirtualMachine,
    thread: &mut JavaThread,
    field_name: &str,
    field_desc: &str,
) -> Result<(), JvmError> {
    let stream = thread.current_frame()?.locals.get_ref(0);
    let system_sym = vm.method_area.br().java_lang_system_sym;
    let system = vm.method_area.load(&mut vm.heap, system_sym)?;
    let key = FieldKey {
        name: vm.interner.get_or_intern(field_name),
        desc: vm.interner.get_or_intern(field_desc),
    };
    let Some((declaring, field_index)) = vm.method_area.find_field_in_chain(system, &key) else {
        return Err(JvmError::Internal(format!("System.{field_name} field not found")));
    };
    let slot_id = vm.method_area.class(declaring).field(field_index).slot_id;
    vm.method_area.class_mut(declaring).static_vars.set_ref(slot_id, stream);
    Ok(())
}

fn system_set_in0(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    set_system_stream(vm, thread, "in", "Ljava/io/InputStream;")
}

fn system_set_out0(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    set_system_stream(vm, thread, "out", "Ljava/io/PrintStream;")
}

fn system_set_err0(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    set_system_stream(vm, thread, "err", "Ljava/io/PrintStream;")
}

fn system_identity_hash_code(
    _vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.locals.get_ref(0).map(|reference| reference.handle()).unwrap_or(0);
    frame.stack.push_int(value);
    Ok(())
}

fn float_to_raw_int_bits(_vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.locals.get_float(0);
    frame.stack.push_int(value.to_bits() as i32);
    Ok(())
}

fn int_bits_to_float(_vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let bits = frame.locals.get_int(0);
    frame.stack.push_float(f32::from_bits(bits as u32));
    Ok(())
}

fn double_to_raw_long_bits(
    _vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let value = frame.locals.get_double(0);
    frame.stack.push_long(value.to_bits() as i64);
    Ok(())
}

fn long_bits_to_double(_vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let frame = thread.current_frame()?;
    let bits = frame.locals.get_long(0);
    frame.stack.push_double(f64::from_bits(bits as u64));
    Ok(())
}

/// Literal identity: an already-interned string answers itself; any
/// other string instance answers the pooled object for its text.
fn string_intern(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    let Some(this) = thread.current_frame()?.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    let interned = match vm.heap.get(this).extra {
        Extra::InternedString(_) => this,
        _ => {
            let text = vm.method_area.java_string_text(&vm.heap, this)?;
            let symbol = vm.interner.get_or_intern(&text);
            vm.method_area.intern_jstring(&mut vm.heap, symbol)?
        }
    };
    thread.current_frame()?.stack.push_ref(Some(interned));
    Ok(())
}

fn throwable_fill_in_stack_trace(
    vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    let Some(this) = thread.current_frame()?.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    let trace = Interpreter::capture_trace(vm, thread);
    vm.heap.get_mut(this).extra = Extra::Backtrace(trace);
    thread.current_frame()?.stack.push_ref(Some(this));
    Ok(())
}

const NORM_PRIORITY: i32 = 5;

/// The single interpreted thread, materialized lazily as a
/// `java/lang/Thread` with a root thread group.
fn thread_current_thread(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    if let Some(existing) = vm.main_thread_object {
        thread.current_frame()?.stack.push_ref(Some(existing));
        return Ok(());
    }

    let group_class = vm.method_area.load_str(&mut vm.heap, "java/lang/ThreadGroup")?;
    let group = vm.heap.alloc(crate::heap::Object::new_instance(
        group_class,
        vm.method_area.class(group_class).instance_slot_count,
    ));

    let thread_class = vm.method_area.load_str(&mut vm.heap, "java/lang/Thread")?;
    let mut object = crate::heap::Object::new_instance(
        thread_class,
        vm.method_area.class(thread_class).instance_slot_count,
    );

    let priority_key = FieldKey {
        name: vm.interner.get_or_intern("priority"),
        desc: vm.interner.get_or_intern("I"),
    };
    if let Some((declaring, field_index)) =
        vm.method_area.find_field_in_chain(thread_class, &priority_key)
    {
        let slot_id = vm.method_area.class(declaring).field(field_index).slot_id;
        object.body.fields_mut()?.set_int(slot_id, NORM_PRIORITY);
    }
    let group_key = FieldKey {
        name: vm.interner.get_or_intern("group"),
        desc: vm.interner.get_or_intern("Ljava/lang/ThreadGroup;"),
    };
    if let Some((declaring, field_index)) =
        vm.method_area.find_field_in_chain(thread_class, &group_key)
    {
        let slot_id = vm.method_area.class(declaring).field(field_index).slot_id;
        object.body.fields_mut()?.set_ref(slot_id, Some(group));
    }

    let reference = vm.heap.alloc(object);
    vm.main_thread_object = Some(reference);
    thread.current_frame()?.stack.push_ref(Some(reference));
    Ok(())
}

fn thread_set_priority0(_vm: &mut VirtualMachine, _thread: &mut JavaThread) -> Result<(), JvmError> {
    Ok(())
}

fn thread_is_alive(_vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
    thread.current_frame()?.stack.push_int(0);
    Ok(())
}

fn thread_start0(_vm: &mut VirtualMachine, _thread: &mut JavaThread) -> Result<(), JvmError> {
    debug!("Thread.start0 ignored: the interpreter is single-threaded");
    Ok(())
}

/// Privilege checks are not modeled: invoke the action's `run` directly.
/// Its return value lands on this native frame's stack and flows out
/// through the injected areturn.
fn access_controller_do_privileged(
    vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    let Some(action) = thread.current_frame()?.locals.get_ref(0) else {
        throw_exception!(NullPointerException);
    };
    let run_key = MethodKey {
        name: vm.interner.get_or_intern("run"),
        desc: vm.interner.get_or_intern("()Ljava/lang/Object;"),
    };
    let action_class = vm.heap.class_of(action);
    let Some((_, run)) = vm.method_area.find_method_in_chain(action_class, &run_key) else {
        throw_exception!(
            AbstractMethodError,
            "{}.run",
            vm.method_area.class_name(action_class)
        );
    };
    let method = vm.method_area.method(run);
    let mut frame =
        Frame::new(run, method.class, method.code.clone(), method.max_locals, method.max_stack);
    frame.locals.set_ref(0, Some(action));
    thread.push_frame(frame)
}

fn access_controller_get_stack_context(
    _vm: &mut VirtualMachine,
    thread: &mut JavaThread,
) -> Result<(), JvmError> {
    thread.current_frame()?.stack.push_ref(None);
    Ok(())
}
