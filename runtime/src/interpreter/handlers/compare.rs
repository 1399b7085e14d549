//! Comparison pushes and conditional branches. The `l` float variants
//! answer -1 on NaN, the `g` variants 1; branch offsets are relative to
//! the instruction's own pc.

use crate::error::JvmError;
use crate::interpreter::handlers::branch;
use crate::stack::Frame;

pub fn lcmp(frame: &mut Frame) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_long()?;
    let v1 = frame.stack.pop_long()?;
    frame.stack.push_int(match v1.cmp(&v2) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    });
    Ok(())
}

fn fcmp(frame: &mut Frame, nan_result: i32) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_float()?;
    let v1 = frame.stack.pop_float()?;
    let result = match v1.partial_cmp(&v2) {
        Some(std::cmp::Ordering::Less) => -1,
        Some(std::cmp::Ordering::Equal) => 0,
        Some(std::cmp::Ordering::Greater) => 1,
        None => nan_result,
    };
    frame.stack.push_int(result);
    Ok(())
}

pub fn fcmpl(frame: &mut Frame) -> Result<(), JvmError> {
    fcmp(frame, -1)
}

pub fn fcmpg(frame: &mut Frame) -> Result<(), JvmError> {
    fcmp(frame, 1)
}

fn dcmp(frame: &mut Frame, nan_result: i32) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_double()?;
    let v1 = frame.stack.pop_double()?;
    let result = match v1.partial_cmp(&v2) {
        Some(std::cmp::Ordering::Less) => -1,
        Some(std::cmp::Ordering::Equal) => 0,
        Some(std::cmp::Ordering::Greater) => 1,
        None => nan_result,
    };
    frame.stack.push_int(result);
    Ok(())
}

pub fn dcmpl(frame: &mut Frame) -> Result<(), JvmError> {
    dcmp(frame, -1)
}

pub fn dcmpg(frame: &mut Frame) -> Result<(), JvmError> {
    dcmp(frame, 1)
}

pub fn if_int(
    frame: &mut Frame,
    pc: usize,
    offset: i32,
    predicate: fn(i32) -> bool,
) -> Result<(), JvmError> {
    let value = frame.stack.pop_int()?;
    if predicate(value) {
        branch(frame, pc, offset)?;
    }
    Ok(())
}

pub fn if_icmp(
    frame: &mut Frame,
    pc: usize,
    offset: i32,
    predicate: fn(i32, i32) -> bool,
) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_int()?;
    let v1 = frame.stack.pop_int()?;
    if predicate(v1, v2) {
        branch(frame, pc, offset)?;
    }
    Ok(())
}

pub fn if_acmp(frame: &mut Frame, pc: usize, offset: i32, want_equal: bool) -> Result<(), JvmError> {
    let v2 = frame.stack.pop_ref()?;
    let v1 = frame.stack.pop_ref()?;
    if (v1 == v2) == want_equal {
        branch(frame, pc, offset)?;
    }
    Ok(())
}

pub fn if_null(frame: &mut Frame, pc: usize, offset: i32, want_null: bool) -> Result<(), JvmError> {
    let value = frame.stack.pop_ref()?;
    if value.is_none() == want_null {
        branch(frame, pc, offset)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::keys::{ClassId, MethodId};

    fn frame() -> Frame {
        Frame::new(MethodId::from_index(0), ClassId::from_index(0), Arc::from(&[][..]), 0, 4)
    }

    #[test]
    fn nan_separates_the_l_and_g_variants() {
        let mut frame = frame();
        frame.stack.push_float(f32::NAN);
        frame.stack.push_float(1.0);
        fcmpl(&mut frame).unwrap();
        assert_eq!(frame.stack.pop_int().unwrap(), -1);

        frame.stack.push_float(f32::NAN);
        frame.stack.push_float(1.0);
        fcmpg(&mut frame).unwrap();
        assert_eq!(frame.stack.pop_int().unwrap(), 1);
    }

    #[test]
    fn lcmp_orders_longs() {
        let mut frame = frame();
        frame.stack.push_long(i64::MIN);
        frame.stack.push_long(i64::MAX);
        lcmp(&mut frame).unwrap();
        assert_eq!(frame.stack.pop_int().unwrap(), -1);
    }

    #[test]
    fn branches_are_relative_to_instruction_pc() {
        let mut frame = frame();
        frame.next_pc = 13; // pc after a 3-byte if instruction at 10
        frame.stack.push_int(0);
        if_int(&mut frame, 10, -4, |value| value == 0).unwrap();
        assert_eq!(frame.next_pc, 6);

        frame.next_pc = 13;
        frame.stack.push_int(1);
        if_int(&mut frame, 10, -4, |value| value == 0).unwrap();
        assert_eq!(frame.next_pc, 13, "untaken branch falls through");
    }
}
