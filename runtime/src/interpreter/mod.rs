use tracing_log::log::{error, trace};

use crate::error::{JavaException, JvmError};
use crate::heap::{Extra, HeapRef, Object, TraceElement};
use crate::interpreter::instruction::Instruction;
use crate::keys::{ClassId, FieldKey, MethodId};
use crate::rt::InitState;
use crate::stack::Frame;
use crate::thread::JavaThread;
use crate::vm::VirtualMachine;

pub mod handlers;
pub mod instruction;

use handlers::{compare, constants, control, convert, loads, math, references, reserved, stack_ops, stores};

/// Width of a method's return value on the caller's operand stack.
enum ReturnKind {
    Void,
    Single,
    Pair,
}

pub struct Interpreter;

impl Interpreter {
    /// Fetch-decode-execute until the thread's frame stack empties.
    /// Java-visible conditions go through handler search; everything
    /// else dumps the frame walk and aborts.
    pub fn run(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
        loop {
            if thread.is_stack_empty() {
                return Ok(());
            }
            match Self::step(vm, thread) {
                Ok(()) => {}
                Err(JvmError::Thrown(exception)) => {
                    Self::dispatch_exception(vm, thread, exception)?;
                }
                Err(JvmError::Exception(exception)) => {
                    let reference = match Self::materialize_exception(vm, thread, &exception) {
                        Ok(reference) => reference,
                        Err(error) => {
                            Self::log_frames(vm, thread);
                            return Err(error);
                        }
                    };
                    Self::dispatch_exception(vm, thread, reference)?;
                }
                Err(fatal) => {
                    Self::log_frames(vm, thread);
                    return Err(fatal);
                }
            }
        }
    }

    fn step(vm: &mut VirtualMachine, thread: &mut JavaThread) -> Result<(), JvmError> {
        let (pc, code) = {
            let frame = thread.current_frame()?;
            (frame.next_pc, frame.code.clone())
        };
        thread.pc = pc;

        let (instruction, next_pc) = Instruction::decode(&code, pc)?;
        thread.current_frame()?.next_pc = next_pc;

        if vm.verbose_inst {
            let frame = thread.peek_frame()?;
            let method = vm.method_area.method(frame.method);
            trace!(
                "{}.{}() #{pc} {instruction:?}",
                vm.method_area.class_name(frame.class),
                vm.method_area.interner().resolve(&method.name),
            );
        }

        Self::execute(vm, thread, instruction, pc)
    }

    fn execute(
        vm: &mut VirtualMachine,
        thread: &mut JavaThread,
        instruction: Instruction,
        pc: usize,
    ) -> Result<(), JvmError> {
        use Instruction as I;
        match instruction {
            I::Nop => Ok(()),
            I::AconstNull => constants::aconst_null(thread.current_frame()?),
            I::Iconst(value) => {
                thread.current_frame()?.stack.push_int(value);
                Ok(())
            }
            I::Lconst(value) => {
                thread.current_frame()?.stack.push_long(value);
                Ok(())
            }
            I::Fconst(value) => {
                thread.current_frame()?.stack.push_float(value);
                Ok(())
            }
            I::Dconst(value) => {
                thread.current_frame()?.stack.push_double(value);
                Ok(())
            }
            I::Bipush(value) => {
                thread.current_frame()?.stack.push_int(value as i32);
                Ok(())
            }
            I::Sipush(value) => {
                thread.current_frame()?.stack.push_int(value as i32);
                Ok(())
            }
            I::Ldc(index) => constants::ldc(vm, thread, index),
            I::Ldc2W(index) => constants::ldc2_w(vm, thread, index),

            I::Iload(index) => loads::iload(thread.current_frame()?, index),
            I::Lload(index) => loads::lload(thread.current_frame()?, index),
            I::Fload(index) => loads::fload(thread.current_frame()?, index),
            I::Dload(index) => loads::dload(thread.current_frame()?, index),
            I::Aload(index) => loads::aload(thread.current_frame()?, index),
            I::Iaload => loads::iaload(vm, thread),
            I::Laload => loads::laload(vm, thread),
            I::Faload => loads::faload(vm, thread),
            I::Daload => loads::daload(vm, thread),
            I::Aaload => loads::aaload(vm, thread),
            I::Baload => loads::baload(vm, thread),
            I::Caload => loads::caload(vm, thread),
            I::Saload => loads::saload(vm, thread),

            I::Istore(index) => stores::istore(thread.current_frame()?, index),
            I::Lstore(index) => stores::lstore(thread.current_frame()?, index),
            I::Fstore(index) => stores::fstore(thread.current_frame()?, index),
            I::Dstore(index) => stores::dstore(thread.current_frame()?, index),
            I::Astore(index) => stores::astore(thread.current_frame()?, index),
            I::Iastore => stores::iastore(vm, thread),
            I::Lastore => stores::lastore(vm, thread),
            I::Fastore => stores::fastore(vm, thread),
            I::Dastore => stores::dastore(vm, thread),
            I::Aastore => stores::aastore(vm, thread),
            I::Bastore => stores::bastore(vm, thread),
            I::Castore => stores::castore(vm, thread),
            I::Sastore => stores::sastore(vm, thread),

            I::Pop => stack_ops::pop(thread.current_frame()?),
            I::Pop2 => stack_ops::pop2(thread.current_frame()?),
            I::Dup => stack_ops::dup(thread.current_frame()?),
            I::DupX1 => stack_ops::dup_x1(thread.current_frame()?),
            I::DupX2 => stack_ops::dup_x2(thread.current_frame()?),
            I::Dup2 => stack_ops::dup2(thread.current_frame()?),
            I::Dup2X1 => stack_ops::dup2_x1(thread.current_frame()?),
            I::Dup2X2 => stack_ops::dup2_x2(thread.current_frame()?),
            I::Swap => stack_ops::swap(thread.current_frame()?),

            I::Iadd => math::iadd(thread.current_frame()?),
            I::Ladd => math::ladd(thread.current_frame()?),
            I::Fadd => math::fadd(thread.current_frame()?),
            I::Dadd => math::dadd(thread.current_frame()?),
            I::Isub => math::isub(thread.current_frame()?),
            I::Lsub => math::lsub(thread.current_frame()?),
            I::Fsub => math::fsub(thread.current_frame()?),
            I::Dsub => math::dsub(thread.current_frame()?),
            I::Imul => math::imul(thread.current_frame()?),
            I::Lmul => math::lmul(thread.current_frame()?),
            I::Fmul => math::fmul(thread.current_frame()?),
            I::Dmul => math::dmul(thread.current_frame()?),
            I::Idiv => math::idiv(thread.current_frame()?),
            I::Ldiv => math::ldiv(thread.current_frame()?),
            I::Fdiv => math::fdiv(thread.current_frame()?),
            I::Ddiv => math::ddiv(thread.current_frame()?),
            I::Irem => math::irem(thread.current_frame()?),
            I::Lrem => math::lrem(thread.current_frame()?),
            I::Frem => math::frem(thread.current_frame()?),
            I::Drem => math::drem(thread.current_frame()?),
            I::Ineg => math::ineg(thread.current_frame()?),
            I::Lneg => math::lneg(thread.current_frame()?),
            I::Fneg => math::fneg(thread.current_frame()?),
            I::Dneg => math::dneg(thread.current_frame()?),
            I::Ishl => math::ishl(thread.current_frame()?),
            I::Lshl => math::lshl(thread.current_frame()?),
            I::Ishr => math::ishr(thread.current_frame()?),
            I::Lshr => math::lshr(thread.current_frame()?),
            I::Iushr => math::iushr(thread.current_frame()?),
            I::Lushr => math::lushr(thread.current_frame()?),
            I::Iand => math::iand(thread.current_frame()?),
            I::Land => math::land(thread.current_frame()?),
            I::Ior => math::ior(thread.current_frame()?),
            I::Lor => math::lor(thread.current_frame()?),
            I::Ixor => math::ixor(thread.current_frame()?),
            I::Lxor => math::lxor(thread.current_frame()?),
            I::Iinc { index, delta } => math::iinc(thread.current_frame()?, index, delta),

            I::I2l => convert::i2l(thread.current_frame()?),
            I::I2f => convert::i2f(thread.current_frame()?),
            I::I2d => convert::i2d(thread.current_frame()?),
            I::L2i => convert::l2i(thread.current_frame()?),
            I::L2f => convert::l2f(thread.current_frame()?),
            I::L2d => convert::l2d(thread.current_frame()?),
            I::F2i => convert::f2i(thread.current_frame()?),
            I::F2l => convert::f2l(thread.current_frame()?),
            I::F2d => convert::f2d(thread.current_frame()?),
            I::D2i => convert::d2i(thread.current_frame()?),
            I::D2l => convert::d2l(thread.current_frame()?),
            I::D2f => convert::d2f(thread.current_frame()?),
            I::I2b => convert::i2b(thread.current_frame()?),
            I::I2c => convert::i2c(thread.current_frame()?),
            I::I2s => convert::i2s(thread.current_frame()?),

            I::Lcmp => compare::lcmp(thread.current_frame()?),
            I::Fcmpl => compare::fcmpl(thread.current_frame()?),
            I::Fcmpg => compare::fcmpg(thread.current_frame()?),
            I::Dcmpl => compare::dcmpl(thread.current_frame()?),
            I::Dcmpg => compare::dcmpg(thread.current_frame()?),
            I::Ifeq(offset) => compare::if_int(thread.current_frame()?, pc, offset, |v| v == 0),
            I::Ifne(offset) => compare::if_int(thread.current_frame()?, pc, offset, |v| v != 0),
            I::Iflt(offset) => compare::if_int(thread.current_frame()?, pc, offset, |v| v < 0),
            I::Ifge(offset) => compare::if_int(thread.current_frame()?, pc, offset, |v| v >= 0),
            I::Ifgt(offset) => compare::if_int(thread.current_frame()?, pc, offset, |v| v > 0),
            I::Ifle(offset) => compare::if_int(thread.current_frame()?, pc, offset, |v| v <= 0),
            I::IfIcmpeq(offset) => {
                compare::if_icmp(thread.current_frame()?, pc, offset, |a, b| a == b)
            }
            I::IfIcmpne(offset) => {
                compare::if_icmp(thread.current_frame()?, pc, offset, |a, b| a != b)
            }
            I::IfIcmplt(offset) => {
                compare::if_icmp(thread.current_frame()?, pc, offset, |a, b| a < b)
            }
            I::IfIcmpge(offset) => {
                compare::if_icmp(thread.current_frame()?, pc, offset, |a, b| a >= b)
            }
            I::IfIcmpgt(offset) => {
                compare::if_icmp(thread.current_frame()?, pc, offset, |a, b| a > b)
            }
            I::IfIcmple(offset) => {
                compare::if_icmp(thread.current_frame()?, pc, offset, |a, b| a <= b)
            }
            I::IfAcmpeq(offset) => compare::if_acmp(thread.current_frame()?, pc, offset, true),
            I::IfAcmpne(offset) => compare::if_acmp(thread.current_frame()?, pc, offset, false),
            I::Ifnull(offset) => compare::if_null(thread.current_frame()?, pc, offset, true),
            I::Ifnonnull(offset) => compare::if_null(thread.current_frame()?, pc, offset, false),

            I::Goto(offset) => control::goto(thread.current_frame()?, pc, offset),
            I::Tableswitch { default, low, high, offsets } => {
                control::tableswitch(thread.current_frame()?, pc, default, low, high, &offsets)
            }
            I::Lookupswitch { default, pairs } => {
                control::lookupswitch(thread.current_frame()?, pc, default, &pairs)
            }

            I::Ireturn | I::Freturn | I::Areturn => {
                Self::handle_return(vm, thread, ReturnKind::Single)
            }
            I::Lreturn | I::Dreturn => Self::handle_return(vm, thread, ReturnKind::Pair),
            I::Return => Self::handle_return(vm, thread, ReturnKind::Void),

            I::Getstatic(index) => references::getstatic(vm, thread, index),
            I::Putstatic(index) => references::putstatic(vm, thread, index),
            I::Getfield(index) => references::getfield(vm, thread, index),
            I::Putfield(index) => references::putfield(vm, thread, index),
            I::Invokevirtual(index) => references::invokevirtual(vm, thread, index),
            I::Invokespecial(index) => references::invokespecial(vm, thread, index),
            I::Invokestatic(index) => references::invokestatic(vm, thread, index),
            I::Invokeinterface(index) => references::invokeinterface(vm, thread, index),
            I::New(index) => references::new_instance(vm, thread, index),
            I::Newarray(atype) => references::newarray(vm, thread, atype),
            I::Anewarray(index) => references::anewarray(vm, thread, index),
            I::Multianewarray { index, dimensions } => {
                references::multianewarray(vm, thread, index, dimensions)
            }
            I::Arraylength => references::arraylength(vm, thread),
            I::Athrow => references::athrow(thread),
            I::Checkcast(index) => references::checkcast(vm, thread, index),
            I::Instanceof(index) => references::instance_of(vm, thread, index),
            I::Monitorenter => references::monitor_enter(thread),
            I::Monitorexit => references::monitor_exit(thread),

            I::InvokeNative => reserved::invoke_native(vm, thread),
        }
    }

    /// Pops the finished frame and moves the return value (if any) onto
    /// the caller's operand stack. A popped `<clinit>` completes its
    /// class's initialization.
    fn handle_return(
        vm: &mut VirtualMachine,
        thread: &mut JavaThread,
        kind: ReturnKind,
    ) -> Result<(), JvmError> {
        let mut finished = thread.pop_frame()?;
        let is_clinit =
            vm.method_area.method(finished.method).name == vm.method_area.br().clinit_sym;
        if is_clinit {
            vm.method_area.class_mut(finished.class).init_state = InitState::Initialized;
        }
        match kind {
            ReturnKind::Void => {}
            ReturnKind::Single => {
                let slot = finished.stack.pop_slot()?;
                if let Ok(caller) = thread.current_frame() {
                    caller.stack.push_slot(slot);
                }
            }
            ReturnKind::Pair => {
                let value = finished.stack.pop_long()?;
                if let Ok(caller) = thread.current_frame() {
                    caller.stack.push_long(value);
                }
            }
        }
        Ok(())
    }

    /// JVMS §5.5 initialization, single-threaded form: mark in-progress,
    /// schedule the class's own `<clinit>` frame, then recurse into the
    /// superclass *after* so its frame lands on top and runs first. The
    /// touch-site instruction has already reverted its pc and re-executes
    /// once these frames pop.
    pub fn init_class(
        vm: &mut VirtualMachine,
        thread: &mut JavaThread,
        class: ClassId,
    ) -> Result<(), JvmError> {
        if vm.method_area.class(class).init_state != InitState::Uninitialized {
            return Ok(());
        }
        vm.method_area.class_mut(class).init_state = InitState::InProgress;

        let clinit_mk = vm.method_area.br().clinit_mk;
        match vm.method_area.find_method_in_class(class, &clinit_mk) {
            Some(method_id) => {
                let method = vm.method_area.method(method_id);
                let frame = Frame::new(
                    method_id,
                    class,
                    method.code.clone(),
                    method.max_locals,
                    method.max_stack,
                );
                thread.push_frame(frame)?;
            }
            // no initializer of its own; nothing will pop to finish it
            None => vm.method_area.class_mut(class).init_state = InitState::Initialized,
        }

        let (is_interface, super_class) = {
            let class = vm.method_area.class(class);
            (class.is_interface(), class.super_class)
        };
        if !is_interface {
            if let Some(super_id) = super_class {
                if vm.method_area.class(super_id).init_state == InitState::Uninitialized {
                    Self::init_class(vm, thread, super_id)?;
                }
            }
        }
        Ok(())
    }

    /// Handler search (§ exception handling): scan the current frame's
    /// exception table, clear-push-jump on a match, otherwise pop and
    /// retry in the caller. An empty stack means the exception escapes:
    /// report it with the trace captured at throw point.
    fn dispatch_exception(
        vm: &mut VirtualMachine,
        thread: &mut JavaThread,
        exception: HeapRef,
    ) -> Result<(), JvmError> {
        let thrown_trace = match &vm.heap.get(exception).extra {
            Extra::Backtrace(trace) => trace.clone(),
            _ => Self::capture_trace(vm, thread),
        };

        loop {
            if thread.is_stack_empty() {
                Self::report_uncaught(vm, exception, &thrown_trace);
                return Err(JvmError::UncaughtException);
            }
            let (method_id, class, pc) = {
                let frame = thread.peek_frame()?;
                (frame.method, frame.class, frame.next_pc.saturating_sub(1))
            };
            if let Some(handler_pc) = Self::find_handler(vm, method_id, class, pc, exception)? {
                let frame = thread.current_frame()?;
                frame.stack.clear();
                frame.stack.push_ref(Some(exception));
                frame.next_pc = handler_pc;
                return Ok(());
            }
            thread.pop_frame()?;
        }
    }

    fn find_handler(
        vm: &mut VirtualMachine,
        method_id: MethodId,
        class: ClassId,
        pc: usize,
        exception: HeapRef,
    ) -> Result<Option<usize>, JvmError> {
        let exception_class = vm.heap.class_of(exception);
        let table = vm.method_area.method(method_id).exception_table.clone();
        for entry in table {
            if !(entry.start_pc as usize <= pc && pc < entry.end_pc as usize) {
                continue;
            }
            if entry.catch_type == 0 {
                return Ok(Some(entry.handler_pc as usize));
            }
            // catch classes resolve lazily, on the first search that
            // reaches their entry
            let catch_class = vm
                .method_area
                .resolve_class_ref(&mut vm.heap, class, entry.catch_type)
                .map_err(|error| {
                    JvmError::Internal(format!("failed to resolve catch type: {error}"))
                })?;
            if vm.method_area.is_assignable(exception_class, catch_class) {
                return Ok(Some(entry.handler_pc as usize));
            }
        }
        Ok(None)
    }

    /// Allocates a throwable of the error's class and fills in the
    /// message and backtrace directly, without running constructors.
    fn materialize_exception(
        vm: &mut VirtualMachine,
        thread: &mut JavaThread,
        exception: &JavaException,
    ) -> Result<HeapRef, JvmError> {
        let class = vm.method_area.load_str(&mut vm.heap, exception.kind.class_name())?;
        let mut object = Object::new_instance(class, vm.method_area.class(class).instance_slot_count);

        if let Some(message) = &exception.message {
            let key = FieldKey {
                name: vm.method_area.br().detail_message_sym,
                desc: vm.method_area.br().string_desc,
            };
            if let Some((declaring, field_index)) = vm.method_area.find_field_in_chain(class, &key)
            {
                let slot_id = vm.method_area.class(declaring).field(field_index).slot_id;
                let message_sym = vm.interner.get_or_intern(message);
                let message_ref = vm.method_area.intern_jstring(&mut vm.heap, message_sym)?;
                object.body.fields_mut()?.set_ref(slot_id, Some(message_ref));
            }
        }

        object.extra = Extra::Backtrace(Self::capture_trace(vm, thread));
        Ok(vm.heap.alloc(object))
    }

    /// Top-first walk of the live frames into printable trace lines.
    pub(crate) fn capture_trace(vm: &VirtualMachine, thread: &JavaThread) -> Vec<TraceElement> {
        let mut top = true;
        thread
            .frames()
            .map(|frame| {
                let method = vm.method_area.method(frame.method);
                let pc = if top { thread.pc } else { frame.next_pc.saturating_sub(1) };
                top = false;
                let class = vm.method_area.class(frame.class);
                TraceElement {
                    class_name: vm.interner.resolve(&class.name).replace('/', "."),
                    method_name: vm.interner.resolve(&method.name).to_string(),
                    file_name: class
                        .source_file
                        .map(|source| vm.interner.resolve(&source).to_string()),
                    line_number: method.line_number(pc),
                }
            })
            .collect()
    }

    fn report_uncaught(vm: &VirtualMachine, exception: HeapRef, trace: &[TraceElement]) {
        let class_name =
            vm.method_area.class_name(vm.heap.class_of(exception)).replace('/', ".");
        match Self::throwable_message(vm, exception) {
            Some(message) => eprintln!("Exception in thread \"main\" {class_name}: {message}"),
            None => eprintln!("Exception in thread \"main\" {class_name}"),
        }
        for element in trace {
            let location = if element.line_number == -2 {
                "Native Method".to_string()
            } else {
                match (&element.file_name, element.line_number) {
                    (Some(file), line) if line >= 0 => format!("{file}:{line}"),
                    (Some(file), _) => file.clone(),
                    (None, _) => "Unknown Source".to_string(),
                }
            };
            eprintln!("\tat {}.{}({location})", element.class_name, element.method_name);
        }
    }

    fn throwable_message(vm: &VirtualMachine, exception: HeapRef) -> Option<String> {
        let class = vm.heap.class_of(exception);
        let key = FieldKey {
            name: vm.method_area.br().detail_message_sym,
            desc: vm.method_area.br().string_desc,
        };
        let (declaring, field_index) = vm.method_area.find_field_in_chain(class, &key)?;
        let slot_id = vm.method_area.class(declaring).field(field_index).slot_id;
        let message = vm.heap.get(exception).body.fields().ok()?.get_ref(slot_id)?;
        vm.method_area.java_string_text(&vm.heap, message).ok()
    }

    /// Fatal-path dump: one line per live frame with line number, pc,
    /// class, method name and descriptor.
    fn log_frames(vm: &VirtualMachine, thread: &JavaThread) {
        let mut top = true;
        for frame in thread.frames() {
            let method = vm.method_area.method(frame.method);
            let pc = if top { thread.pc } else { frame.next_pc.saturating_sub(1) };
            top = false;
            error!(
                ">> line:{:4} pc:{:4} {}.{}{}",
                method.line_number(pc),
                pc,
                vm.method_area.class_name(frame.class),
                vm.method_area.interner().resolve(&method.name),
                vm.method_area.interner().resolve(&method.desc),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::testutil::{ACC_STATIC, TestClassBuilder, test_vm, write_class, write_core_fixture};
    use crate::vm::VirtualMachine;

    const MAIN_DESC: &str = "([Ljava/lang/String;)V";

    fn static_int(vm: &VirtualMachine, class_name: &str, field: &str) -> i32 {
        let class = vm.method_area.lookup(vm.interner.get_or_intern(class_name)).unwrap();
        let key = FieldKey {
            name: vm.interner.get_or_intern(field),
            desc: vm.interner.get_or_intern("I"),
        };
        let (declaring, index) = vm.method_area.find_field_in_chain(class, &key).unwrap();
        let slot_id = vm.method_area.class(declaring).field(index).slot_id;
        vm.method_area.class(declaring).static_vars.get_int(slot_id)
    }

    fn run_main(dir: &Path, class_name: &str) -> (VirtualMachine, Result<(), JvmError>) {
        let mut vm = test_vm(dir);
        let mut thread = JavaThread::new(64);
        let outcome = vm.exec_main(&mut thread, class_name, &[]);
        (vm, outcome)
    }

    #[test]
    fn superclass_initializes_before_subclass() {
        let dir = tempfile::tempdir().unwrap();
        write_core_fixture(dir.path());

        let mut alpha = TestClassBuilder::new("Alpha", Some("java/lang/Object"));
        alpha.field(ACC_STATIC, "x", "I");
        let x_ref = alpha.field_ref("Alpha", "x", "I");
        let mut clinit = vec![0x04]; // iconst_1
        clinit.push(0xB3);
        clinit.extend_from_slice(&x_ref.to_be_bytes());
        clinit.push(0xB1);
        alpha.method(ACC_STATIC, "<clinit>", "()V", 1, 0, clinit);
        write_class(dir.path(), "Alpha", &alpha.build());

        let mut beta = TestClassBuilder::new("Beta", Some("Alpha"));
        beta.field(ACC_STATIC, "y", "I");
        let x_from_beta = beta.field_ref("Alpha", "x", "I");
        let y_ref = beta.field_ref("Beta", "y", "I");
        // y = Alpha.x + 1: observes the super's initializer having run
        let mut clinit = vec![0xB2];
        clinit.extend_from_slice(&x_from_beta.to_be_bytes());
        clinit.push(0x04); // iconst_1
        clinit.push(0x60); // iadd
        clinit.push(0xB3);
        clinit.extend_from_slice(&y_ref.to_be_bytes());
        clinit.push(0xB1);
        beta.method(ACC_STATIC, "<clinit>", "()V", 2, 0, clinit);
        beta.method(ACC_STATIC, "main", MAIN_DESC, 0, 1, vec![0xB1]);
        write_class(dir.path(), "Beta", &beta.build());

        let (vm, outcome) = run_main(dir.path(), "Beta");
        outcome.unwrap();
        assert_eq!(static_int(&vm, "Alpha", "x"), 1);
        assert_eq!(static_int(&vm, "Beta", "y"), 2);
        let beta_id = vm.method_area.lookup(vm.interner.get_or_intern("Beta")).unwrap();
        assert_eq!(vm.method_area.class(beta_id).init_state, InitState::Initialized);
    }

    #[test]
    fn touch_site_reverts_and_reexecutes_after_init() {
        let dir = tempfile::tempdir().unwrap();
        write_core_fixture(dir.path());

        let mut holder = TestClassBuilder::new("Holder", Some("java/lang/Object"));
        holder.field(ACC_STATIC, "v", "I");
        let v_ref = holder.field_ref("Holder", "v", "I");
        let mut clinit = vec![0x10, 7]; // bipush 7
        clinit.push(0xB3);
        clinit.extend_from_slice(&v_ref.to_be_bytes());
        clinit.push(0xB1);
        holder.method(ACC_STATIC, "<clinit>", "()V", 1, 0, clinit);
        write_class(dir.path(), "Holder", &holder.build());

        let mut runner = TestClassBuilder::new("Runner", Some("java/lang/Object"));
        let v_from_runner = runner.field_ref("Holder", "v", "I");
        // getstatic is the first touch of Holder; it must re-execute
        // after the initializer frames pop and still see the value
        let mut main = vec![0xB2];
        main.extend_from_slice(&v_from_runner.to_be_bytes());
        main.push(0x57); // pop
        main.push(0xB1);
        runner.method(ACC_STATIC, "main", MAIN_DESC, 1, 1, main);
        write_class(dir.path(), "Runner", &runner.build());

        let (vm, outcome) = run_main(dir.path(), "Runner");
        outcome.unwrap();
        assert_eq!(static_int(&vm, "Holder", "v"), 7);
        let holder_id = vm.method_area.lookup(vm.interner.get_or_intern("Holder")).unwrap();
        assert_eq!(vm.method_area.class(holder_id).init_state, InitState::Initialized);
    }

    #[test]
    fn invokestatic_passes_args_and_returns_a_value() {
        let dir = tempfile::tempdir().unwrap();
        write_core_fixture(dir.path());

        let mut calc = TestClassBuilder::new("Calc", Some("java/lang/Object"));
        calc.field(ACC_STATIC, "result", "I");
        let add_ref = calc.method_ref("Calc", "add", "(II)I");
        let result_ref = calc.field_ref("Calc", "result", "I");
        calc.method(ACC_STATIC, "add", "(II)I", 2, 2, vec![0x1A, 0x1B, 0x60, 0xAC]);
        let mut main = vec![0x10, 30, 0x10, 12]; // bipush 30, bipush 12
        main.push(0xB8);
        main.extend_from_slice(&add_ref.to_be_bytes());
        main.push(0xB3);
        main.extend_from_slice(&result_ref.to_be_bytes());
        main.push(0xB1);
        calc.method(ACC_STATIC, "main", MAIN_DESC, 2, 1, main);
        write_class(dir.path(), "Calc", &calc.build());

        let (vm, outcome) = run_main(dir.path(), "Calc");
        outcome.unwrap();
        assert_eq!(static_int(&vm, "Calc", "result"), 42);
    }

    #[test]
    fn division_by_zero_reaches_a_matching_handler() {
        let dir = tempfile::tempdir().unwrap();
        write_core_fixture(dir.path());
        let arithmetic =
            TestClassBuilder::new("java/lang/ArithmeticException", Some("java/lang/Object"))
                .build();
        write_class(dir.path(), "java/lang/ArithmeticException", &arithmetic);

        let mut tried = TestClassBuilder::new("Tried", Some("java/lang/Object"));
        tried.field(ACC_STATIC, "result", "I");
        let result_ref = tried.field_ref("Tried", "result", "I");
        // 0: iconst_1  1: iconst_0  2: idiv  3: putstatic  6: return
        // 7: pop (the exception)  8: bipush 99  10: putstatic  13: return
        let mut main = vec![0x04, 0x03, 0x6C, 0xB3];
        main.extend_from_slice(&result_ref.to_be_bytes());
        main.push(0xB1);
        main.push(0x57);
        main.extend_from_slice(&[0x10, 99]);
        main.push(0xB3);
        main.extend_from_slice(&result_ref.to_be_bytes());
        main.push(0xB1);
        tried.method_with_handlers(
            ACC_STATIC,
            "main",
            MAIN_DESC,
            2,
            1,
            main,
            &[(0, 7, 7, "java/lang/ArithmeticException")],
        );
        write_class(dir.path(), "Tried", &tried.build());

        let (vm, outcome) = run_main(dir.path(), "Tried");
        outcome.unwrap();
        assert_eq!(static_int(&vm, "Tried", "result"), 99);
    }

    #[test]
    fn uncaught_exceptions_unwind_to_a_report() {
        let dir = tempfile::tempdir().unwrap();
        write_core_fixture(dir.path());
        let arithmetic =
            TestClassBuilder::new("java/lang/ArithmeticException", Some("java/lang/Object"))
                .build();
        write_class(dir.path(), "java/lang/ArithmeticException", &arithmetic);

        let mut doomed = TestClassBuilder::new("Doomed", Some("java/lang/Object"));
        doomed.method(ACC_STATIC, "main", MAIN_DESC, 2, 1, vec![0x04, 0x03, 0x6C, 0x57, 0xB1]);
        write_class(dir.path(), "Doomed", &doomed.build());

        let (_, outcome) = run_main(dir.path(), "Doomed");
        assert!(matches!(outcome, Err(JvmError::UncaughtException)));
    }

    #[test]
    fn invokevirtual_dispatches_on_the_receiver_class() {
        let dir = tempfile::tempdir().unwrap();
        write_core_fixture(dir.path());

        let mut animal = TestClassBuilder::new("Animal", Some("java/lang/Object"));
        animal.method(0, "sound", "()I", 1, 1, vec![0x04, 0xAC]); // iconst_1
        write_class(dir.path(), "Animal", &animal.build());

        let mut dog = TestClassBuilder::new("Dog", Some("Animal"));
        dog.method(0, "sound", "()I", 1, 1, vec![0x05, 0xAC]); // iconst_2
        write_class(dir.path(), "Dog", &dog.build());

        let mut zoo = TestClassBuilder::new("Zoo", Some("java/lang/Object"));
        zoo.field(ACC_STATIC, "result", "I");
        let dog_class = zoo.class("Dog");
        let sound_ref = zoo.method_ref("Animal", "sound", "()I");
        let result_ref = zoo.field_ref("Zoo", "result", "I");
        let mut main = vec![0xBB];
        main.extend_from_slice(&dog_class.to_be_bytes());
        main.push(0xB6);
        main.extend_from_slice(&sound_ref.to_be_bytes());
        main.push(0xB3);
        main.extend_from_slice(&result_ref.to_be_bytes());
        main.push(0xB1);
        zoo.method(ACC_STATIC, "main", MAIN_DESC, 2, 1, main);
        write_class(dir.path(), "Zoo", &zoo.build());

        let (vm, outcome) = run_main(dir.path(), "Zoo");
        outcome.unwrap();
        assert_eq!(static_int(&vm, "Zoo", "result"), 2);
    }

    #[test]
    fn instanceof_and_checkcast_use_assignability() {
        let dir = tempfile::tempdir().unwrap();
        write_core_fixture(dir.path());

        let animal = TestClassBuilder::new("Animal", Some("java/lang/Object")).build();
        write_class(dir.path(), "Animal", &animal);
        let dog = TestClassBuilder::new("Dog", Some("Animal")).build();
        write_class(dir.path(), "Dog", &dog);

        let mut check = TestClassBuilder::new("Check", Some("java/lang/Object"));
        check.field(ACC_STATIC, "result", "I");
        let dog_class = check.class("Dog");
        let animal_class = check.class("Animal");
        let result_ref = check.field_ref("Check", "result", "I");
        let mut main = vec![0xBB]; // new Dog
        main.extend_from_slice(&dog_class.to_be_bytes());
        main.push(0xC1); // instanceof Animal
        main.extend_from_slice(&animal_class.to_be_bytes());
        main.push(0xB3);
        main.extend_from_slice(&result_ref.to_be_bytes());
        main.push(0x01); // aconst_null
        main.push(0xC0); // checkcast Dog succeeds silently on null
        main.extend_from_slice(&dog_class.to_be_bytes());
        main.push(0x57); // pop
        main.push(0xB1);
        check.method(ACC_STATIC, "main", MAIN_DESC, 2, 1, main);
        write_class(dir.path(), "Check", &check.build());

        let (vm, outcome) = run_main(dir.path(), "Check");
        outcome.unwrap();
        assert_eq!(static_int(&vm, "Check", "result"), 1);
    }

    #[test]
    fn unbounded_recursion_overflows_the_frame_stack() {
        let dir = tempfile::tempdir().unwrap();
        write_core_fixture(dir.path());
        let overflow =
            TestClassBuilder::new("java/lang/StackOverflowError", Some("java/lang/Object"))
                .build();
        write_class(dir.path(), "java/lang/StackOverflowError", &overflow);

        let mut rec = TestClassBuilder::new("Rec", Some("java/lang/Object"));
        let self_ref = rec.method_ref("Rec", "spin", "()V");
        let mut spin = vec![0xB8];
        spin.extend_from_slice(&self_ref.to_be_bytes());
        spin.push(0xB1);
        rec.method(ACC_STATIC, "spin", "()V", 1, 0, spin);
        let entry_ref = rec.method_ref("Rec", "spin", "()V");
        let mut main = vec![0xB8];
        main.extend_from_slice(&entry_ref.to_be_bytes());
        main.push(0xB1);
        rec.method(ACC_STATIC, "main", MAIN_DESC, 1, 1, main);
        write_class(dir.path(), "Rec", &rec.build());

        let (_, outcome) = run_main(dir.path(), "Rec");
        assert!(matches!(outcome, Err(JvmError::UncaughtException)));
    }
}
