use std::io;
use std::path::PathBuf;

use crate::memory::parse::ParseError;
use crate::memory::Byte;
use crate::processor::Instruction;

/// Everything that can stop a running machine. None of these are recoverable:
/// the processor is left halted and the caller gets the context to reproduce it.
#[derive(Debug, thiserror::Error)]
pub enum CpuError {
    #[error("invalid opcode 0x{opcode:02X} at pc 0x{pc:02X}")]
    InvalidOpcode { opcode: Byte, pc: Byte },

    #[error("division by zero at pc 0x{pc:02X}")]
    DivideByZero { pc: Byte },

    #[error("register index {index} out of range at pc 0x{pc:02X}")]
    InvalidRegister { index: Byte, pc: Byte },

    #[error("memory address 0x{address:X} out of range")]
    AddressOutOfRange { address: usize },

    #[error("stack overflow (sp 0x{sp:02X}) at pc 0x{pc:02X}")]
    StackOverflow { sp: Byte, pc: Byte },

    #[error("stack underflow (sp 0x{sp:02X}) at pc 0x{pc:02X}")]
    StackUnderflow { sp: Byte, pc: Byte },

    #[error("{0} is not an ALU operation")]
    UnsupportedOperation(Instruction),

    #[error("program did not halt within {limit} instructions")]
    InstructionLimitExceeded { limit: u64 },

    #[error("failed to write program output")]
    Output(#[from] io::Error),
}

/// Failure to turn a program file into a memory image. Raised before execution starts.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read program `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid program `{}`:{}", .path.display(), render(.errors))]
    Parse {
        path: PathBuf,
        errors: Vec<ParseError>,
    },
}

fn render(errors: &[ParseError]) -> String {
    errors.iter().map(|err| format!("\n  {}", err)).collect()
}
