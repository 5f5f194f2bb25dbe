//! Emulator for the LS-8, a minimal 8-bit stored-program computer.

pub mod alu;
pub mod fault;
pub mod memory;
pub mod processor;
pub mod registers;
