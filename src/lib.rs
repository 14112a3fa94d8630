//! LS-8: an emulator for a tiny 8-bit register machine.

pub mod config;
pub mod error;
pub mod memory;
pub mod processor;

pub use config::Config;
pub use error::{CpuError, LoadError};
pub use memory::parse::Program;
pub use memory::StdMem;
pub use processor::{Instruction, Processor};
