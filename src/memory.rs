use crate::error::CpuError;

pub mod parse;

pub type Byte = u8; // 1 byte

/// Number of addressable cells on an LS-8
pub const MEMORY_SIZE: usize = 256;

/// Default memory
pub type StdMem = Memory<MEMORY_SIZE>;

/// Emulates memory for use with the CPU. Program code and the stack share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory<const S: usize> {
    /// The actual data of the memory
    pub data: [Byte; S],
}

impl<const S: usize> Default for Memory<S> {
    /// Initializes the memory
    fn default() -> Self {
        Memory { data: [0; S] }
    }
}

impl<const S: usize> Memory<S> {
    /// Reads a byte from the memory
    pub fn read_byte(&self, position: usize) -> Result<Byte, CpuError> {
        self.data
            .get(position)
            .copied()
            .ok_or(CpuError::AddressOutOfRange { address: position })
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, position: usize, value: Byte) -> Result<(), CpuError> {
        let cell = self
            .data
            .get_mut(position)
            .ok_or(CpuError::AddressOutOfRange { address: position })?;
        *cell = value;
        Ok(())
    }

    /// Writes an array of bytes to the memory
    pub fn write_array(&mut self, position: usize, data: &[Byte]) -> Result<(), CpuError> {
        let end = position + data.len();
        if end > S {
            return Err(CpuError::AddressOutOfRange { address: end - 1 });
        }
        self.data[position..end].copy_from_slice(data);
        Ok(())
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $byte:expr ),+ ) => {
        $mem.write_array($pos, &[
            $(
                $byte as $crate::memory::Byte,
            )+
        ])
    };
}
