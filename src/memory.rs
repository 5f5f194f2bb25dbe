use crate::fault::FaultKind;

pub mod parse;

pub type Byte = u8; // 1 byte
pub type Address = u16; // wide enough to point one past the end

/// Number of addressable cells of the LS-8
pub const RAM_SIZE: usize = 256;

/// Default memory
pub type StdMem = Memory<RAM_SIZE>;

/// Emulates memory for use with the CPU
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
    pub fn read_byte(&self, position: Address) -> Result<Byte, FaultKind> {
        self.data
            .get(position as usize)
            .copied()
            .ok_or(FaultKind::OutOfBoundsAccess {
                address: position as usize,
            })
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, position: Address, value: Byte) -> Result<(), FaultKind> {
        let cell = self
            .data
            .get_mut(position as usize)
            .ok_or(FaultKind::OutOfBoundsAccess {
                address: position as usize,
            })?;
        *cell = value;

        Ok(())
    }

    /// Writes an array of bytes to the memory. Nothing is written if any
    /// part of the block falls outside.
    pub fn write_array(&mut self, position: Address, data: &[Byte]) -> Result<(), FaultKind> {
        let start = position as usize;
        let end = start + data.len();
        if end > S {
            // first cell that does not exist
            return Err(FaultKind::OutOfBoundsAccess {
                address: start.max(S),
            });
        }

        self.data[start..end].copy_from_slice(data);

        Ok(())
    }

    /// Replaces the whole memory content with `program` placed at address 0
    pub fn load(&mut self, program: &[Byte]) -> Result<(), FaultKind> {
        if program.len() > S {
            return Err(FaultKind::ProgramTooLarge {
                length: program.len(),
            });
        }

        self.data = [0; S];
        self.data[..program.len()].copy_from_slice(program);

        Ok(())
    }

    /// Logs every non-empty 16 byte row of the memory
    pub fn dump(&self) {
        for (row, chunk) in self.data.chunks(16).enumerate() {
            if chunk.iter().all(|byte| *byte == 0) {
                continue;
            }

            let line = chunk
                .iter()
                .map(|byte| format!("{:02X}", byte))
                .collect::<Vec<_>>()
                .join(" ");
            log::debug!("{:02X}: {}", row * 16, line);
        }
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

#[cfg(test)]
mod tests {
    use crate::processor::Instruction;

    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_read_byte() -> Result<()> {
        let mut mem = StdMem::default();
        mem.data[0x2] = 0x12;
        assert_eq!(mem.read_byte(0x2)?, 0x12);
        assert_eq!(mem.read_byte(0xFF)?, 0);

        Ok(())
    }

    #[test]
    fn test_write_byte() -> Result<()> {
        let mut mem = StdMem::default();
        mem.write_byte(0x44, 12)?;
        assert_eq!(mem.data[0x44], 12);

        Ok(())
    }

    #[test]
    fn test_out_of_bounds() -> Result<()> {
        let mut mem = StdMem::default();

        assert_eq!(
            mem.read_byte(0x100),
            Err(FaultKind::OutOfBoundsAccess { address: 0x100 })
        );
        assert_eq!(
            mem.write_byte(0x101, 1),
            Err(FaultKind::OutOfBoundsAccess { address: 0x101 })
        );
        assert_eq!(mem, StdMem::default());

        Ok(())
    }

    #[test]
    fn test_write_array() -> Result<()> {
        let mut mem = StdMem::default();
        mem.write_array(0x44, &[0x12, 0x34, 0x56, 0x78])?;
        assert_eq!(mem.data[0x44], 0x12);
        assert_eq!(mem.data[0x45], 0x34);
        assert_eq!(mem.data[0x46], 0x56);
        assert_eq!(mem.data[0x47], 0x78);

        Ok(())
    }

    #[test]
    fn test_write_array_past_end() -> Result<()> {
        let mut mem = StdMem::default();

        assert_eq!(
            mem.write_array(0xFE, &[1, 2, 3]),
            Err(FaultKind::OutOfBoundsAccess { address: 0x100 })
        );
        assert_eq!(mem, StdMem::default());

        Ok(())
    }

    #[test]
    fn test_load() -> Result<()> {
        let mut mem = StdMem::default();
        mem.data[0x80] = 0xAA;

        let program = [0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001];
        mem.load(&program)?;

        assert_eq!(&mem.data[..program.len()], &program);
        assert!(mem.data[program.len()..].iter().all(|byte| *byte == 0));

        Ok(())
    }

    #[test]
    fn test_load_full_memory() -> Result<()> {
        let mut mem = StdMem::default();
        let program = [0x7F; RAM_SIZE];
        mem.load(&program)?;

        assert_eq!(mem.data, program);

        Ok(())
    }

    #[test]
    fn test_load_too_large() -> Result<()> {
        let mut mem = StdMem::default();

        assert_eq!(
            mem.load(&[0; RAM_SIZE + 1]),
            Err(FaultKind::ProgramTooLarge {
                length: RAM_SIZE + 1
            })
        );

        Ok(())
    }

    #[test]
    fn test_write_instructions() -> Result<()> {
        let mut mem = StdMem::default();

        mem.write_array(
            0x10,
            &[
                Instruction::LDI as Byte,
                0,
                8,
                Instruction::PRN as Byte,
                0,
                Instruction::HLT as Byte,
            ],
        )?;

        let mut mem2 = StdMem::default();
        use crate::processor::Instruction::*;
        write_instructions!(mem2 : 0x10 => LDI, 0, 8, PRN, 0, HLT)?;

        assert_eq!(mem, mem2);

        Ok(())
    }
}
