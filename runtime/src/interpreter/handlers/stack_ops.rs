//! Operand-stack shuffles (JVMS §6.5 pop/dup/swap family). Slots are
//! fixed-width, so category-2 values are just two adjacent slots moved
//! in their specified order.

use crate::error::JvmError;
use crate::stack::Frame;

pub fn pop(frame: &mut Frame) -> Result<(), JvmError> {
    frame.stack.pop_slot()?;
    Ok(())
}

pub fn pop2(frame: &mut Frame) -> Result<(), JvmError> {
    frame.stack.pop_slot()?;
    frame.stack.pop_slot()?;
    Ok(())
}

pub fn dup(frame: &mut Frame) -> Result<(), JvmError> {
    let top = frame.stack.pop_slot()?;
    frame.stack.push_slot(top);
    frame.stack.push_slot(top);
    Ok(())
}

/// [.., v2, v1] -> [.., v1, v2, v1]
pub fn dup_x1(frame: &mut Frame) -> Result<(), JvmError> {
    let v1 = frame.stack.pop_slot()?;
    let v2 = frame.stack.pop_slot()?;
    frame.stack.push_slot(v1);
    frame.stack.push_slot(v2);
    frame.stack.push_slot(v1);
    Ok(())
}

/// [.., v3, v2, v1] -> [.., v1, v3, v2, v1]
pub fn dup_x2(frame: &mut Frame) -> Result<(), JvmError> {
    let v1 = frame.stack.pop_slot()?;
    let v2 = frame.stack.pop_slot()?;
    let v3 = frame.stack.pop_slot()?;
    frame.stack.push_slot(v1);
    frame.stack.push_slot(v3);
    frame.stack.push_slot(v2);
    frame.stack.push_slot(v1);
    Ok(())
}

/// [.., v2, v1] -> [.., v2, v1, v2, v1]
pub fn dup2(frame: &mut Frame) -> Result<(), JvmError> {
    let v1 = frame.stack.pop_slot()?;
    let v2 = frame.stack.pop_slot()?;
    frame.stack.push_slot(v2);
    frame.stack.push_slot(v1);
    frame.stack.push_slot(v2);
    frame.stack.push_slot(v1);
    Ok(())
}

/// [.., v3, v2, v1] -> [.., v2, v1, v3, v2, v1]
pub fn dup2_x1(frame: &mut Frame) -> Result<(), JvmError> {
    let v1 = frame.stack.pop_slot()?;
    let v2 = frame.stack.pop_slot()?;
    let v3 = frame.stack.pop_slot()?;
    frame.stack.push_slot(v2);
    frame.stack.push_slot(v1);
    frame.stack.push_slot(v3);
    frame.stack.push_slot(v2);
    frame.stack.push_slot(v1);
    Ok(())
}

/// [.., v4, v3, v2, v1] -> [.., v2, v1, v4, v3, v2, v1]
pub fn dup2_x2(frame: &mut Frame) -> Result<(), JvmError> {
    let v1 = frame.stack.pop_slot()?;
    let v2 = frame.stack.pop_slot()?;
    let v3 = frame.stack.pop_slot()?;
    let v4 = frame.stack.pop_slot()?;
    frame.stack.push_slot(v2);
    frame.stack.push_slot(v1);
    frame.stack.push_slot(v4);
    frame.stack.push_slot(v3);
    frame.stack.push_slot(v2);
    frame.stack.push_slot(v1);
    Ok(())
}

pub fn swap(frame: &mut Frame) -> Result<(), JvmError> {
    let v1 = frame.stack.pop_slot()?;
    let v2 = frame.stack.pop_slot()?;
    frame.stack.push_slot(v1);
    frame.stack.push_slot(v2);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::keys::{ClassId, MethodId};

    fn frame_with_ints(values: &[i32]) -> Frame {
        let mut frame = Frame::new(
            MethodId::from_index(0),
            ClassId::from_index(0),
            Arc::from(&[][..]),
            0,
            8,
        );
        for &value in values {
            frame.stack.push_int(value);
        }
        frame
    }

    fn drain_ints(frame: &mut Frame) -> Vec<i32> {
        let mut values = Vec::new();
        while let Ok(value) = frame.stack.pop_int() {
            values.push(value);
        }
        values.reverse();
        values
    }

    #[test]
    fn dup_x2_inserts_under_three() {
        let mut frame = frame_with_ints(&[3, 2, 1]);
        dup_x2(&mut frame).unwrap();
        assert_eq!(drain_ints(&mut frame), vec![1, 3, 2, 1]);
    }

    #[test]
    fn dup2_duplicates_a_slot_pair() {
        let mut frame = frame_with_ints(&[9, 8]);
        dup2(&mut frame).unwrap();
        assert_eq!(drain_ints(&mut frame), vec![9, 8, 9, 8]);
    }

    #[test]
    fn dup2_x2_moves_pair_under_pair() {
        let mut frame = frame_with_ints(&[4, 3, 2, 1]);
        dup2_x2(&mut frame).unwrap();
        assert_eq!(drain_ints(&mut frame), vec![2, 1, 4, 3, 2, 1]);
    }

    #[test]
    fn dup2_preserves_a_long_pair() {
        let mut frame = frame_with_ints(&[]);
        frame.stack.push_long(1 << 35);
        dup2(&mut frame).unwrap();
        assert_eq!(frame.stack.pop_long().unwrap(), 1 << 35);
        assert_eq!(frame.stack.pop_long().unwrap(), 1 << 35);
    }

    #[test]
    fn swap_exchanges_the_top_two() {
        let mut frame = frame_with_ints(&[1, 2]);
        swap(&mut frame).unwrap();
        assert_eq!(drain_ints(&mut frame), vec![2, 1]);
    }
}
