use std::error;
use std::fmt;
use std::io;

use crate::memory::{Address, Byte};

/// Everything that can stop the machine abnormally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The byte at PC has no entry in the opcode table
    InvalidOpcode { opcode: Byte },
    /// The ALU was handed an operation tag it does not implement
    UnsupportedOperation { operation: Byte },
    /// Memory access outside of the address space
    OutOfBoundsAccess { address: usize },
    /// The program does not fit into memory
    ProgramTooLarge { length: usize },
    /// Register index outside of the register file
    InvalidRegister { index: Byte },
    /// PRN could not deliver its value to the output channel
    OutputFailed { kind: io::ErrorKind },
}

impl FaultKind {
    /// Process exit status reported for this kind of fault
    pub fn exit_code(&self) -> i32 {
        match self {
            FaultKind::InvalidOpcode { .. } => 2,
            FaultKind::UnsupportedOperation { .. } => 3,
            FaultKind::OutOfBoundsAccess { .. } => 4,
            FaultKind::ProgramTooLarge { .. } => 5,
            FaultKind::InvalidRegister { .. } => 6,
            FaultKind::OutputFailed { .. } => 7,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::InvalidOpcode { opcode } => {
                write!(f, "invalid opcode `0b{:08b}`", opcode)
            }
            FaultKind::UnsupportedOperation { operation } => {
                write!(f, "unsupported ALU operation `0x{:x}`", operation)
            }
            FaultKind::OutOfBoundsAccess { address } => {
                write!(f, "memory has no address `0x{:x}`", address)
            }
            FaultKind::ProgramTooLarge { length } => {
                write!(f, "program of {} bytes does not fit into memory", length)
            }
            FaultKind::InvalidRegister { index } => write!(f, "no register R{}", index),
            FaultKind::OutputFailed { kind } => write!(f, "output channel failed: {:?}", kind),
        }
    }
}

impl error::Error for FaultKind {}

/// A fault together with the program counter at the time it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub pc: Address,
}

impl Fault {
    pub fn new(kind: FaultKind, pc: Address) -> Self {
        Self { kind, pc }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault [pc: 0x{:02X}]: {}", self.pc, self.kind)
    }
}

impl error::Error for Fault {}
