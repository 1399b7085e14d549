//! Primitive conversions. Rust's saturating float-to-int `as` casts
//! match the JVM rules exactly: NaN to 0, infinities clamped to the
//! integer extremes.

use crate::error::JvmError;
use crate::stack::Frame;

pub fn i2l(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_int()?;
    frame.stack.push_long(value as i64);
    Ok(())
}

pub fn i2f(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_int()?;
    frame.stack.push_float(value as f32);
    Ok(())
}

pub fn i2d(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_int()?;
    frame.stack.push_double(value as f64);
    Ok(())
}

pub fn l2i(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_long()?;
    frame.stack.push_int(value as i32);
    Ok(())
}

pub fn l2f(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_long()?;
    frame.stack.push_float(value as f32);
    Ok(())
}

pub fn l2d(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_long()?;
    frame.stack.push_double(value as f64);
    Ok(())
}

pub fn f2i(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_float()?;
    frame.stack.push_int(value as i32);
    Ok(())
}

pub fn f2l(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_float()?;
    frame.stack.push_long(value as i64);
    Ok(())
}

pub fn f2d(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_float()?;
    frame.stack.push_double(value as f64);
    Ok(())
}

pub fn d2i(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_double()?;
    frame.stack.push_int(value as i32);
    Ok(())
}

pub fn d2l(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_double()?;
    frame.stack.push_long(value as i64);
    Ok(())
}

pub fn d2f(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_double()?;
    frame.stack.push_float(value as f32);
    Ok(())
}

pub fn i2b(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_int()?;
    frame.stack.push_int(value as i8 as i32);
    Ok(())
}

pub fn i2c(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_int()?;
    frame.stack.push_int(value as u16 as i32);
    Ok(())
}

pub fn i2s(frame: &mut Frame) -> Result<(), JvmError> {
    let value = frame.stack.pop_int()?;
    frame.stack.push_int(value as i16 as i32);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::keys::{ClassId, MethodId};

    fn frame() -> Frame {
        Frame::new(MethodId::from_index(0), ClassId::from_index(0), Arc::from(&[][..]), 0, 4)
    }

    #[rstest]
    #[case(f32::NAN, 0)]
    #[case(f32::INFINITY, i32::MAX)]
    #[case(f32::NEG_INFINITY, i32::MIN)]
    #[case(1e20, i32::MAX)]
    #[case(-2.9, -2)]
    fn f2i_clamps_like_the_jvm(#[case] input: f32, #[case] expected: i32) {
        let mut frame = frame();
        frame.stack.push_float(input);
        f2i(&mut frame).unwrap();
        assert_eq!(frame.stack.pop_int().unwrap(), expected);
    }

    #[rstest]
    #[case(f64::NAN, 0)]
    #[case(f64::INFINITY, i64::MAX)]
    #[case(f64::NEG_INFINITY, i64::MIN)]
    fn d2l_clamps_like_the_jvm(#[case] input: f64, #[case] expected: i64) {
        let mut frame = frame();
        frame.stack.push_double(input);
        d2l(&mut frame).unwrap();
        assert_eq!(frame.stack.pop_long().unwrap(), expected);
    }

    #[rstest]
    #[case(0x1FF, -1)] // i2b sign-extends the low byte
    #[case(0x80, -128)]
    #[case(0x7F, 127)]
    fn i2b_truncates_and_sign_extends(#[case] input: i32, #[case] expected: i32) {
        let mut frame = frame();
        frame.stack.push_int(input);
        i2b(&mut frame).unwrap();
        assert_eq!(frame.stack.pop_int().unwrap(), expected);
    }

    #[test]
    fn i2c_zero_extends() {
        let mut frame = frame();
        frame.stack.push_int(-1);
        i2c(&mut frame).unwrap();
        assert_eq!(frame.stack.pop_int().unwrap(), 0xFFFF);
    }
}
