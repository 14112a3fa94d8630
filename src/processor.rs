use std::convert::TryFrom;
use std::io::Write;

use crate::config::Config;
use crate::error::CpuError;
use crate::memory::parse::Program;
use crate::memory::{Byte, Memory};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

mod alu;
mod stack;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;
/// Register that is seeded with the initial stack pointer
pub const SP_REGISTER: usize = 7;
/// Initial stack pointer. The stack grows down from here.
pub const STACK_START: Byte = 0xF4;

/// Flag set by `CMP` if `a < b`
pub const FL_LT: Byte = 0b100;
/// Flag set by `CMP` if `a > b`
pub const FL_GT: Byte = 0b010;
/// Flag set by `CMP` if `a == b`
pub const FL_EQ: Byte = 0b001;

/// Emulates the LS-8 control unit together with its register file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Processor {
    /// Program counter
    pub pc: Byte,
    /// Stack pointer
    pub sp: Byte,
    /// Flags register, holds at most one of `FL_LT`, `FL_GT` and `FL_EQ`
    pub fl: Byte,
    /// General purpose registers
    pub reg: [Byte; REGISTER_COUNT],
    /// Cleared by `HLT` or by any execution error
    pub running: bool,
    /// Address of the instruction currently being executed
    pub ir_pc: Byte,
    /// The stack may not grow below this address; guards the loaded program
    pub stack_floor: usize,
}

impl Default for Processor {
    /// Initializes a new CPU
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Initializes a new CPU, ready to run a program at address 0
    pub fn new() -> Self {
        let mut reg = [0; REGISTER_COUNT];
        reg[SP_REGISTER] = STACK_START;

        Self {
            pc: 0,
            sp: STACK_START,
            fl: 0,
            reg,
            running: true,
            ir_pc: 0,
            stack_floor: 0,
        }
    }

    /// Copies `program` into memory at address 0 and keeps the stack out of it
    pub fn load<const S: usize>(
        &mut self,
        memory: &mut Memory<S>,
        program: &Program,
    ) -> Result<(), CpuError> {
        memory.write_array(0, program.as_bytes())?;
        self.stack_floor = program.len();

        info!("Program loaded: {} bytes", program.len());

        Ok(())
    }

    /// Validates a register operand
    fn register(&self, index: Byte) -> Result<usize, CpuError> {
        if (index as usize) < REGISTER_COUNT {
            Ok(index as usize)
        } else {
            Err(CpuError::InvalidRegister {
                index,
                pc: self.ir_pc,
            })
        }
    }

    /// Reads the register named by an operand
    fn value(&self, index: Byte) -> Result<Byte, CpuError> {
        Ok(self.reg[self.register(index)?])
    }

    /// Address of the instruction following the one at `ir_pc`
    fn next_pc(&self, instruction: Instruction) -> Result<Byte, CpuError> {
        let next = self.ir_pc as usize + instruction.width();
        Byte::try_from(next).map_err(|_| CpuError::AddressOutOfRange { address: next })
    }

    fn branch_taken(&self, instruction: Instruction) -> bool {
        match instruction {
            Instruction::JEQ => self.fl & FL_EQ != 0,
            Instruction::JNE => self.fl & FL_EQ == 0,
            Instruction::JGT => self.fl & FL_GT != 0,
            Instruction::JLT => self.fl & FL_LT != 0,
            Instruction::JLE => self.fl & (FL_LT | FL_EQ) != 0,
            Instruction::JGE => self.fl & (FL_GT | FL_EQ) != 0,
            _ => true,
        }
    }

    /// Executes a single decoded instruction. `a` and `b` are its operands
    /// (zero when the instruction takes fewer).
    pub fn execute_instruction<W: Write, const S: usize>(
        &mut self,
        instruction: Instruction,
        a: Byte,
        b: Byte,
        memory: &mut Memory<S>,
        out: &mut W,
    ) -> Result<(), CpuError> {
        match instruction.operand_count() {
            0 => debug!("{:02X}: {}", self.ir_pc, instruction),
            1 => debug!("{:02X}: {} {}", self.ir_pc, instruction, a),
            _ => debug!("{:02X}: {} {} {}", self.ir_pc, instruction, a, b),
        }

        match instruction {
            Instruction::NOP => {}
            Instruction::HLT => {
                self.running = false; // set termination flag
            }
            Instruction::LDI => {
                let r = self.register(a)?;
                self.reg[r] = b;
            }
            Instruction::LD => {
                let r = self.register(a)?;
                let address = self.value(b)?;
                self.reg[r] = memory.read_byte(address as usize)?;
            }
            Instruction::ST => {
                let address = self.value(a)?;
                let value = self.value(b)?;
                memory.write_byte(address as usize, value)?;
            }
            Instruction::PRN => {
                let value = self.value(a)?;
                writeln!(out, "{}", value)?;
            }
            Instruction::PRA => {
                let value = self.value(a)?;
                write!(out, "{}", value as char)?;
            }
            Instruction::PUSH => {
                let value = self.value(a)?;
                self.push(memory, value)?;
            }
            Instruction::POP => {
                let r = self.register(a)?;
                self.reg[r] = self.pop(memory)?;
            }
            Instruction::CALL => self.call(memory, a)?,
            Instruction::RET => self.ret(memory)?,
            Instruction::JMP
            | Instruction::JEQ
            | Instruction::JNE
            | Instruction::JGT
            | Instruction::JLT
            | Instruction::JLE
            | Instruction::JGE => {
                let target = self.value(a)?;
                if self.branch_taken(instruction) {
                    self.pc = target;
                } else {
                    self.pc = self.next_pc(instruction)?;
                }
            }
            Instruction::ADD
            | Instruction::SUB
            | Instruction::MUL
            | Instruction::DIV
            | Instruction::MOD
            | Instruction::INC
            | Instruction::DEC
            | Instruction::CMP
            | Instruction::AND
            | Instruction::NOT
            | Instruction::OR
            | Instruction::XOR
            | Instruction::SHL
            | Instruction::SHR => self.alu(instruction, a, b)?,
        }

        Ok(())
    }

    /// Fetches, decodes and dispatches one instruction.
    /// The machine is halted if the instruction fails.
    pub fn execute<W: Write, const S: usize>(
        &mut self,
        memory: &mut Memory<S>,
        out: &mut W,
    ) -> Result<(), CpuError> {
        let res = self.step(memory, out);
        if res.is_err() {
            self.running = false;
        }
        res
    }

    fn step<W: Write, const S: usize>(
        &mut self,
        memory: &mut Memory<S>,
        out: &mut W,
    ) -> Result<(), CpuError> {
        let pc = self.pc;
        let opcode = memory.read_byte(pc as usize)?; // Read opcode where PC is
        let instruction = Instruction::try_from(opcode)
            .map_err(|_| CpuError::InvalidOpcode { opcode, pc })?;

        let count = instruction.operand_count();
        let a = if count >= 1 {
            memory.read_byte(pc as usize + 1)?
        } else {
            0
        };
        let b = if count >= 2 {
            memory.read_byte(pc as usize + 2)?
        } else {
            0
        };

        self.ir_pc = pc;
        if !instruction.sets_pc() {
            self.pc = self.next_pc(instruction)?;
        }

        self.execute_instruction(instruction, a, b, memory, out)
    }

    /// Run program until `HLT` is executed, an error occurs or the
    /// instruction budget in `config` is spent
    pub fn execute_until_hlt<W: Write, const S: usize>(
        &mut self,
        memory: &mut Memory<S>,
        out: &mut W,
        config: &Config,
    ) -> Result<(), CpuError> {
        let mut executed: u64 = 0;

        while self.running {
            if let Some(limit) = config.max_instructions {
                if executed >= limit {
                    self.running = false;
                    return Err(CpuError::InstructionLimitExceeded { limit });
                }
            }

            if config.trace {
                if let Err(err) = self.trace(memory, out) {
                    self.running = false;
                    return Err(err.into());
                }
            }

            self.execute(memory, out)?;
            executed += 1;
        }

        info!(
            "Program halted at 0x{:02X} after {} instructions",
            self.ir_pc, executed
        );

        Ok(())
    }

    /// Writes the machine state as
    /// `TRACE: PC | M[PC] M[PC+1] M[PC+2] | R0 R1 R2 R3 R4 R5 R6 R7`
    pub fn trace<W: Write, const S: usize>(
        &self,
        memory: &Memory<S>,
        out: &mut W,
    ) -> std::io::Result<()> {
        let peek = |offset: usize| memory.read_byte(self.pc as usize + offset).unwrap_or(0);

        write!(
            out,
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            peek(0),
            peek(1),
            peek(2)
        )?;
        for value in self.reg.iter() {
            write!(out, " {:02X}", value)?;
        }
        writeln!(out)
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , )+ ) => {
        /// Defines the instructions.
        /// Bits 7-6 of an opcode hold its operand count, bit 5 marks ALU
        /// operations and bit 4 marks instructions that set the PC themselves.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    }
}

instructions! {
    /// No operation
    NOP = 0b0000_0000,
    /// Stop the execution of the program
    HLT = 0b0000_0001,
    /// Pop the return address into the PC
    RET = 0b0001_0001,
    /// Push a register onto the stack
    /// @param a The source register
    PUSH = 0b0100_0101,
    /// Pop the top of the stack into a register
    /// @param a The destination register
    POP = 0b0100_0110,
    /// Print a register as a decimal number followed by a newline
    PRN = 0b0100_0111,
    /// Print a register as an ASCII character
    PRA = 0b0100_1000,
    /// Push the address of the next instruction and jump to a register
    /// @param a The register holding the subroutine address
    CALL = 0b0101_0000,
    /// Jump to the address held in a register
    JMP = 0b0101_0100,
    /// Jump if the equal flag is set
    JEQ = 0b0101_0101,
    /// Jump if the equal flag is clear
    JNE = 0b0101_0110,
    /// Jump if the greater-than flag is set
    JGT = 0b0101_0111,
    /// Jump if the less-than flag is set
    JLT = 0b0101_1000,
    /// Jump if the less-than or the equal flag is set
    JLE = 0b0101_1001,
    /// Jump if the greater-than or the equal flag is set
    JGE = 0b0101_1010,
    /// Increment a register
    INC = 0b0110_0101,
    /// Decrement a register
    DEC = 0b0110_0110,
    /// Bitwise complement of a register
    NOT = 0b0110_1001,
    /// Load an immediate into a register
    /// @param a The destination register
    /// @param b The value
    LDI = 0b1000_0010,
    /// Load a register from the address held in another register
    LD = 0b1000_0011,
    /// Store a register at the address held in another register
    ST = 0b1000_0100,
    /// Add two registers
    ADD = 0b1010_0000,
    /// Subtract two registers
    SUB = 0b1010_0001,
    /// Multiply two registers
    MUL = 0b1010_0010,
    /// Divide two registers
    DIV = 0b1010_0011,
    /// Remainder of dividing two registers
    MOD = 0b1010_0100,
    /// Compare two registers and set the flags
    CMP = 0b1010_0111,
    /// Bitwise and of two registers
    AND = 0b1010_1000,
    /// Bitwise or of two registers
    OR = 0b1010_1010,
    /// Bitwise xor of two registers
    XOR = 0b1010_1011,
    /// Shift a register left by the value of another
    SHL = 0b1010_1100,
    /// Shift a register right by the value of another
    SHR = 0b1010_1101,
}

impl Instruction {
    /// Number of operand bytes following the opcode
    pub fn operand_count(self) -> usize {
        (Byte::from(self) >> 6) as usize
    }

    /// Whether the instruction is carried out by the ALU
    pub fn is_alu(self) -> bool {
        (Byte::from(self) >> 5) & 1 == 1
    }

    /// Whether the instruction moves the PC itself instead of leaving it to the fetch loop
    pub fn sets_pc(self) -> bool {
        (Byte::from(self) >> 4) & 1 == 1
    }

    /// Size of the encoded instruction in bytes
    pub fn width(self) -> usize {
        self.operand_count() + 1
    }
}
