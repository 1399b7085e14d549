//! Instruction handlers, grouped by the opcode families of JVMS §6.
//! Handlers that only touch the current frame take `&mut Frame`; the
//! reference family takes the VM and the thread because it can load,
//! allocate, and push frames.

pub mod compare;
pub mod constants;
pub mod control;
pub mod convert;
pub mod loads;
pub mod math;
pub mod references;
pub mod reserved;
pub mod stack_ops;
pub mod stores;

use crate::error::JvmError;
use crate::stack::Frame;

/// Branch targets are signed offsets from the pc of the branching
/// instruction itself.
pub(crate) fn branch(frame: &mut Frame, pc: usize, offset: i32) -> Result<(), JvmError> {
    let target = pc as i64 + offset as i64;
    if target < 0 {
        return Err(JvmError::Internal(format!("branch to negative pc {target}")));
    }
    frame.next_pc = target as usize;
    Ok(())
}
