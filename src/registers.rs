use crate::fault::FaultKind;
use crate::memory::Byte;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// The general purpose registers R0 to R7. Every cell is a byte, so values
/// wrap around at 256.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterFile {
    cells: [Byte; REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads register `index`
    pub fn get(&self, index: Byte) -> Result<Byte, FaultKind> {
        self.cells
            .get(index as usize)
            .copied()
            .ok_or(FaultKind::InvalidRegister { index })
    }

    /// Writes `value` into register `index`
    pub fn set(&mut self, index: Byte, value: Byte) -> Result<(), FaultKind> {
        let cell = self
            .cells
            .get_mut(index as usize)
            .ok_or(FaultKind::InvalidRegister { index })?;
        *cell = value;

        Ok(())
    }

    /// All registers in order, R0 first
    pub fn cells(&self) -> &[Byte; REGISTER_COUNT] {
        &self.cells
    }
}
