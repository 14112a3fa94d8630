use super::{Instruction, Processor, STACK_START};
use crate::error::CpuError;
use crate::memory::{Byte, Memory};

impl Processor {
    /// Decrements the stack pointer and writes `value` to the new top of stack.
    ///
    /// # Errors
    ///
    /// `StackOverflow` if the stack would run below address 0 or into the loaded program.
    pub fn push<const S: usize>(
        &mut self,
        memory: &mut Memory<S>,
        value: Byte,
    ) -> Result<(), CpuError> {
        let sp = self
            .sp
            .checked_sub(1)
            .filter(|sp| *sp as usize >= self.stack_floor)
            .ok_or(CpuError::StackOverflow {
                sp: self.sp,
                pc: self.ir_pc,
            })?;

        memory.write_byte(sp as usize, value)?;
        self.sp = sp;

        Ok(())
    }

    /// Reads the top of stack and increments the stack pointer.
    ///
    /// # Errors
    ///
    /// `StackUnderflow` if nothing was pushed.
    pub fn pop<const S: usize>(&mut self, memory: &Memory<S>) -> Result<Byte, CpuError> {
        if self.sp >= STACK_START {
            return Err(CpuError::StackUnderflow {
                sp: self.sp,
                pc: self.ir_pc,
            });
        }

        let value = memory.read_byte(self.sp as usize)?;
        self.sp += 1;

        Ok(value)
    }

    /// Pushes the address after the `CALL` and jumps to the address in `reg_a`
    pub(super) fn call<const S: usize>(
        &mut self,
        memory: &mut Memory<S>,
        reg_a: Byte,
    ) -> Result<(), CpuError> {
        let target = self.value(reg_a)?;
        let return_address = self.next_pc(Instruction::CALL)?;

        self.push(memory, return_address)?;
        self.pc = target;

        log::debug!(
            "CALL 0x{:02X}, returning to 0x{:02X}",
            target,
            return_address
        );

        Ok(())
    }

    /// Pops the return address into the PC
    pub(super) fn ret<const S: usize>(&mut self, memory: &Memory<S>) -> Result<(), CpuError> {
        self.pc = self.pop(memory)?;

        log::debug!("RET 0x{:02X}", self.pc);

        Ok(())
    }
}
