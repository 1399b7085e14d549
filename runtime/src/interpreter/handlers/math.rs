//! Arithmetic, shifts, and bitwise families. Integer arithmetic wraps
//! (so `Integer.MIN_VALUE / -1` yields `Integer.MIN_VALUE`); integer
//! division or remainder by zero raises ArithmeticException; float
//! operations follow IEEE-754.

use crate::error::JvmError;
use crate::stack::Frame;
use crate::throw_exception;

pub fn iadd(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_int()?;
    let v1 = frame.stack.pop_int()?;
    frame.stack.push_int(v1.wrapping_add(v2));
    Ok(())
}

pub fn ladd(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_long()?;
    let v1 = frame.stack.pop_long()?;
    frame.stack.push_long(v1.wrapping_add(v2));
    Ok(())
}

pub fn fadd(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_float()?;
    let v1 = frame.stack.pop_float()?;
    frame.stack.push_float(v1 + v2);
    Ok(())
}

pub fn dadd(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_double()?;
    let v1 = frame.stack.pop_double()?;
    frame.stack.push_double(v1 + v2);
    Ok(())
}

pub fn isub(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_int()?;
    let v1 = frame.stack.pop_int()?;
    frame.stack.push_int(v1.wrapping_sub(v2));
    Ok(())
}

pub fn lsub(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_long()?;
    let v1 = frame.stack.pop_long()?;
    frame.stack.push_long(v1.wrapping_sub(v2));
    Ok(())
}

pub fn fsub(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_float()?;
    let v1 = frame.stack.pop_float()?;
    frame.stack.push_float(v1 - v2);
    Ok(())
}

pub fn dsub(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_double()?;
    let v1 = frame.stack.pop_double()?;
    frame.stack.push_double(v1 - v2);
    Ok(())
}

pub fn imul(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_int()?;
    let v1 = frame.stack.pop_int()?;
    frame.stack.push_int(v1.wrapping_mul(v2));
    Ok(())
}

pub fn lmul(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_long()?;
    let v1 = frame.stack.pop_long()?;
    frame.stack.push_long(v1.wrapping_mul(v2));
    Ok(())
}

pub fn fmul(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_float()?;
    let v1 = frame.stack.pop_float()?;
    frame.stack.push_float(v1 * v2);
    Ok(())
}

pub fn dmul(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_double()?;
    let v1 = frame.stack.pop_double()?;
    frame.stack.push_double(v1 * v2);
    Ok(())
}

pub fn idiv(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_int()?;
    let v1 = frame.stack.pop_int()?;
    if v2 == 0 {
        throw_exception!(ArithmeticException, "/ by zero");
    }
    frame.stack.push_int(v1.wrapping_div(v2));
    Ok(())
}

pub fn ldiv(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_long()?;
    let v1 = frame.stack.pop_long()?;
    if v2 == 0 {
        throw_exception!(ArithmeticException, "/ by zero");
    }
    frame.stack.push_long(v1.wrapping_div(v2));
    Ok(())
}

pub fn fdiv(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_float()?;
    let v1 = frame.stack.pop_float()?;
    frame.stack.push_float(v1 / v2);
    Ok(())
}

pub fn ddiv(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_double()?;
    let v1 = frame.stack.pop_double()?;
    frame.stack.push_double(v1 / v2);
    Ok(())
}

pub fn irem(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_int()?;
    let v1 = frame.stack.pop_int()?;
    if v2 == 0 {
        throw_exception!(ArithmeticException, "/ by zero");
    }
    frame.stack.push_int(v1.wrapping_rem(v2));
    Ok(())
}

pub fn lrem(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_long()?;
    let v1 = frame.stack.pop_long()?;
    if v2 == 0 {
        throw_exception!(ArithmeticException, "/ by zero");
    }
    frame.stack.push_long(v1.wrapping_rem(v2));
    Ok(())
}

pub fn frem(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_float()?;
    let v1 = frame.stack.pop_float()?;
    frame.stack.push_float(v1 % v2);
    Ok(())
}

pub fn drem(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_double()?;
    let v1 = frame.stack.pop_double()?;
    frame.stack.push_double(v1 % v2);
    Ok(())
}

pub fn ineg(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_int()?;
    frame.stack.push_int(value.wrapping_neg());
    Ok(())
}

pub fn lneg(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_long()?;
    frame.stack.push_long(value.wrapping_neg());
    Ok(())
}

pub fn fneg(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_float()?;
    frame.stack.push_float(-value);
    Ok(())
}

pub fn dneg(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_double()?;
    frame.stack.push_double(-value);
    Ok(())
}

/// Int shifts use the low 5 bits of the count, long shifts the low 6.
pub fn ishl(frame: &mut Frame) -> Result<(), JvmError> {
    let count = frame.stack.pop_int()?;
    let value = frame.stack.pop_int()?;
    frame.stack.push_int(value.wrapping_shl(count as u32 & 0x1F));
    Ok(())
}

pub fn lshl(frame: &mut Frame) -> Result<(), JvmError> {
    let count = frame.stack.pop_int()?;
    let value = frame.stack.pop_long()?;
    frame.stack.push_long(value.wrapping_shl(count as u32 & 0x3F));
    Ok(())
}

pub fn ishr(frame: &mut Frame) -> Result<(), JvmError> {
    let count = frame.stack.pop_int()?;
    let value = frame.stack.pop_int()?;
    frame.stack.push_int(value.wrapping_shr(count as u32 & 0x1F));
    Ok(())
}

pub fn lshr(frame: &mut Frame) -> Result<(), JvmError> {
    let count = frame.stack.pop_int()?;
    let value = frame.stack.pop_long()?;
    frame.stack.push_long(value.wrapping_shr(count as u32 & 0x3F));
    Ok(())
}

pub fn iushr(frame: &mut Frame) -> Result<(), JvmError> {
    let count = frame.stack.pop_int()?;
    let value = frame.stack.pop_int()?;
    frame.stack.push_int(((value as u32) >> (count as u32 & 0x1F)) as i32);
    Ok(())
}

pub fn lushr(frame: &mut Frame) -> Result<(), JvmError> {
    let count = frame.stack.pop_int()?;
    let value = frame.stack.pop_long()?;
    frame.stack.push_long(((value as u64) >> (count as u32 & 0x3F)) as i64);
    Ok(())
}

pub fn iand(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_int()?;
    let v1 = frame.stack.pop_int()?;
    frame.stack.push_int(v1 & v2);
    Ok(())
}

pub fn land(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_long()?;
    let v1 = frame.stack.pop_long()?;
    frame.stack.push_long(v1 & v2);
    Ok(())
}

pub fn ior(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_int()?;
    let v1 = frame.stack.pop_int()?;
    frame.stack.push_int(v1 | v2);
    Ok(())
}

pub fn lor(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_long()?;
    let v1 = frame.stack.pop_long()?;
    frame.stack.push_long(v1 | v2);
    Ok(())
}

pub fn ixor(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_int()?;
    let v1 = frame.stack.pop_int()?;
    frame.stack.push_int(v1 ^ v2);
    Ok(())
}

pub fn lxor(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_long()?;
    let v1 = frame.stack.pop_long()?;
    frame.stack.push_long(v1 ^ v2);
    Ok(())
}

pub fn iinc(frame: &mut Frame, index: u16, delta: i16) -> Result<(), JvmError> {
    let index = index as usize;
    let value = frame.locals.get_int(index).wrapping_add(delta as i32);
    frame.locals.set_int(index, value);
    Ok(())
}
