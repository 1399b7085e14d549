use crate::error::JvmError;
use crate::interpreter::handlers::branch;
use crate::stack::Frame;

pub fn goto(frame: &mut Frame, pc: usize, offset: i32) -> Result<(), JvmError> {
    branch(frame, pc, offset)
}

/// Pops the key; in `low..=high` branches through the jump table, else
/// through the default offset.
pub fn tableswitch(
    frame: &mut Frame,
    pc: usize,
    default: i32,
    low: i32,
    high: i32,
    offsets: &[i32],
) -> Result<(), JvmError> {
    let key = frame.stack.pop_int()?;
    let offset = if key >= low && key <= high {
        offsets[(key - low) as usize]
    } else {
        default
    };
    branch(frame, pc, offset)
}

/// Binary search over the sorted match-offset pairs; a miss takes the
/// default offset.
pub fn lookupswitch(
    frame: &mut Frame,
    pc: usize,
    default: i32,
    pairs: &[(i32, i32)],
) -> Result<(), JvmError> {
    let key = frame.stack.pop_int()?;
    let offset = match pairs.binary_search_by_key(&key, |&(matched, _)| matched) {
        Ok(found) => pairs[found].1,
        Err(_) => default,
    };
    branch(frame, pc, offset)
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
    #[case(3, 130)] // low bound hits the first table slot
    #[case(4, 140)]
    #[case(5, 150)]
    #[case(2, 99)] // below range
    #[case(6, 99)] // above range
    fn tableswitch_selects_by_range(#[case] key: i32, #[case] target: usize) {
        let mut frame = frame();
        frame.stack.push_int(key);
        tableswitch(&mut frame, 0, 99, 3, 5, &[130, 140, 150]).unwrap();
        assert_eq!(frame.next_pc, target);
    }

    #[rstest]
    #[case(-10, 8)]
    #[case(0, 16)]
    #[case(42, 24)]
    #[case(7, 4)] // miss
    fn lookupswitch_binary_searches_pairs(#[case] key: i32, #[case] target: usize) {
        let mut frame = frame();
        frame.stack.push_int(key);
        lookupswitch(&mut frame, 0, 4, &[(-10, 8), (0, 16), (42, 24)]).unwrap();
        assert_eq!(frame.next_pc, target);
    }
}
