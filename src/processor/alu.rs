use std::cmp::Ordering;

use super::{Instruction, Processor, FL_EQ, FL_GT, FL_LT};
use crate::error::CpuError;
use crate::memory::Byte;

impl Processor {
    /// Applies an ALU operation to the registers named by `reg_a` and `reg_b`.
    /// The result lands in `reg_a`, except for `CMP` which only sets the flags.
    /// `reg_b` is ignored by the unary operations.
    pub fn alu(&mut self, op: Instruction, reg_a: Byte, reg_b: Byte) -> Result<(), CpuError> {
        let a = self.register(reg_a)?;
        let x = self.reg[a];

        let result = match op {
            Instruction::INC => x.wrapping_add(1),
            Instruction::DEC => x.wrapping_sub(1),
            Instruction::NOT => !x,
            Instruction::ADD => x.wrapping_add(self.value(reg_b)?),
            Instruction::SUB => x.wrapping_sub(self.value(reg_b)?),
            Instruction::MUL => x.wrapping_mul(self.value(reg_b)?),
            Instruction::DIV => x
                .checked_div(self.value(reg_b)?)
                .ok_or(CpuError::DivideByZero { pc: self.ir_pc })?,
            Instruction::MOD => x
                .checked_rem(self.value(reg_b)?)
                .ok_or(CpuError::DivideByZero { pc: self.ir_pc })?,
            Instruction::AND => x & self.value(reg_b)?,
            Instruction::OR => x | self.value(reg_b)?,
            Instruction::XOR => x ^ self.value(reg_b)?,
            // shifting every bit out leaves zero
            Instruction::SHL => x.checked_shl(self.value(reg_b)? as u32).unwrap_or(0),
            Instruction::SHR => x.checked_shr(self.value(reg_b)? as u32).unwrap_or(0),
            Instruction::CMP => {
                let y = self.value(reg_b)?;
                self.fl = match x.cmp(&y) {
                    Ordering::Less => FL_LT,
                    Ordering::Greater => FL_GT,
                    Ordering::Equal => FL_EQ,
                };
                return Ok(());
            }
            _ => return Err(CpuError::UnsupportedOperation(op)),
        };

        self.reg[a] = result;
        Ok(())
    }
}
