//! Runtime of the hervor VM: classpath search, class loading and
//! linking, the runtime class model, frames and threads, the dispatch
//! loop with its instruction set, and the native registry. The `vm`
//! binary crate drives [`start`] with a [`VmConfig`].

use std::path::PathBuf;

pub mod class_loader;
pub mod class_path;
pub mod error;
pub mod heap;
pub mod interpreter;
pub mod keys;
pub mod native;
pub mod rt;
pub mod stack;
pub mod thread;
pub mod vm;

#[cfg(test)]
mod testutil;

pub use error::JvmError;
pub use keys::Symbol;
pub use thread::{DEFAULT_FRAME_STACK_SIZE, JavaThread};
pub use vm::VirtualMachine;

/// Configuration record handed over by the command line.
#[derive(Debug, Clone)]
pub struct VmConfig {
    pub jre_path: Option<PathBuf>,
    pub class_path: Option<String>,
    pub main_class: String,
    pub args: Vec<String>,
    pub verbose_class: bool,
    pub verbose_inst: bool,
    pub frame_stack_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            jre_path: None,
            class_path: None,
            main_class: String::new(),
            args: Vec::new(),
            verbose_class: false,
            verbose_inst: false,
            frame_stack_size: DEFAULT_FRAME_STACK_SIZE,
        }
    }
}

/// Builds the machine, boots `sun/misc/VM`, then runs the entry class's
/// `main` with the program arguments.
pub fn start(config: VmConfig) -> Result<(), JvmError> {
    let mut vm = VirtualMachine::new(&config)?;
    let mut thread = JavaThread::new(config.frame_stack_size);
    vm.boot(&mut thread)?;
    vm.exec_main(&mut thread, &config.main_class, &config.args)
}
