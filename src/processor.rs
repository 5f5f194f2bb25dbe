use std::io::{self, Write};

use crate::alu::{self, AluOp};
use crate::fault::{Fault, FaultKind};
use crate::memory::{Address, Byte, StdMem};
use crate::registers::RegisterFile;
use log::*;
use num_enum::IntoPrimitive;

/// Largest number of operand bytes an instruction can take
pub const MAX_ARITY: usize = 2;

/// Where PRN sends its values, one per invocation
pub trait Output {
    fn emit(&mut self, value: Byte) -> io::Result<()>;
}

/// Collects the emitted values
impl Output for Vec<Byte> {
    fn emit(&mut self, value: Byte) -> io::Result<()> {
        self.push(value);
        Ok(())
    }
}

/// Writes every value as a decimal number on its own line
#[derive(Debug, Default, Clone)]
pub struct TextOutput<W: Write> {
    writer: W,
}

impl<W: Write> TextOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl TextOutput<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Output for TextOutput<W> {
    fn emit(&mut self, value: Byte) -> io::Result<()> {
        writeln!(self.writer, "{}", value)?;
        self.writer.flush()
    }
}

/// Run state of the processor. `Halted` and `Faulted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
    Faulted(Fault),
}

/// Operand bytes of the instruction being executed. Only the first `count`
/// bytes carry meaning, the rest are zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    bytes: [Byte; MAX_ARITY],
    count: u8,
}

impl Operands {
    pub fn a(&self) -> Byte {
        self.bytes[0]
    }

    pub fn b(&self) -> Byte {
        self.bytes[1]
    }

    /// Size of the whole instruction in memory, opcode included
    pub fn width(&self) -> Address {
        1 + self.count as Address
    }
}

/// Entry of the opcode table: which handler runs and how many operand
/// bytes it gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub instruction: Instruction,
    pub arity: u8,
}

/// Maps every possible opcode byte to its entry, if there is one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeTable {
    entries: [Option<OpcodeEntry>; 256],
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OpcodeTable {
    /// Builds the table from all known instructions
    pub fn new() -> Self {
        let mut entries = [None; 256];
        for &instruction in Instruction::ALL {
            entries[Byte::from(instruction) as usize] = Some(OpcodeEntry {
                instruction,
                arity: instruction.arity(),
            });
        }

        Self { entries }
    }

    pub fn lookup(&self, opcode: Byte) -> Option<OpcodeEntry> {
        self.entries[opcode as usize]
    }
}

/// Emulates the LS-8 CPU together with the memory and registers it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processor {
    /// Program counter
    pc: Address,
    registers: RegisterFile,
    memory: StdMem,
    state: State,
    table: OpcodeTable,
}

impl Default for Processor {
    /// Initializes a new CPU
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Initializes a new CPU with zeroed memory and registers
    pub fn new() -> Self {
        Self {
            pc: 0,
            registers: RegisterFile::default(),
            memory: StdMem::default(),
            state: State::Running,
            table: OpcodeTable::new(),
        }
    }

    /// Initializes a new CPU and loads `program` into it
    pub fn with_program(program: &[Byte]) -> Result<Self, Fault> {
        let mut cpu = Self::new();
        cpu.load(program)?;
        Ok(cpu)
    }

    /// Loads `program` at address 0 and resets the CPU to its initial
    /// state. A program that does not fit leaves the CPU faulted.
    pub fn load(&mut self, program: &[Byte]) -> Result<(), Fault> {
        self.pc = 0;
        self.registers = RegisterFile::default();

        match self.memory.load(program) {
            Ok(()) => {
                self.state = State::Running;
                debug!("Loaded program of {} bytes", program.len());
                Ok(())
            }
            Err(kind) => Err(self.fault(kind)),
        }
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn memory(&self) -> &StdMem {
        &self.memory
    }

    /// Runs one fetch-decode-execute cycle. Does nothing unless the CPU is
    /// running.
    pub fn step<O: Output>(&mut self, output: &mut O) -> Result<(), Fault> {
        if self.state != State::Running {
            return Ok(());
        }

        if log_enabled!(Level::Trace) {
            trace!("{}", self.trace());
        }

        self.cycle(output).map_err(|kind| self.fault(kind))
    }

    /// Run program until it halts or faults and returns the final state
    pub fn run<O: Output>(&mut self, output: &mut O) -> State {
        while self.state == State::Running {
            if self.step(output).is_err() {
                break;
            }
        }

        if self.state == State::Halted {
            info!("Program halted at 0x{:02X}", self.pc);
        }

        self.state
    }

    /// One line overview of the CPU: PC, the three bytes at PC and all
    /// registers in hex
    pub fn trace(&self) -> String {
        let peek = |offset: Address| {
            self.memory
                .read_byte(self.pc + offset)
                .map(|byte| format!("{:02X}", byte))
                .unwrap_or_else(|_| "--".to_string())
        };

        let mut line = format!("TRACE: {:02X} | {} {} {} |", self.pc, peek(0), peek(1), peek(2));
        for value in self.registers.cells() {
            line.push_str(&format!(" {:02X}", value));
        }

        line
    }

    fn fault(&mut self, kind: FaultKind) -> Fault {
        let fault = Fault::new(kind, self.pc);
        self.state = State::Faulted(fault);
        debug!("{}", fault);
        fault
    }

    fn cycle<O: Output>(&mut self, output: &mut O) -> Result<(), FaultKind> {
        let opcode = self.memory.read_byte(self.pc)?; // Read opcode where PC is
        let entry = self
            .table
            .lookup(opcode)
            .ok_or(FaultKind::InvalidOpcode { opcode })?;
        let operands = self.fetch_operands(entry.arity)?;

        self.execute_instruction(entry.instruction, operands, output)
    }

    fn fetch_operands(&self, arity: u8) -> Result<Operands, FaultKind> {
        let mut bytes = [0; MAX_ARITY];
        for (offset, byte) in bytes.iter_mut().take(arity as usize).enumerate() {
            *byte = self.memory.read_byte(self.pc + 1 + offset as Address)?;
        }

        Ok(Operands {
            bytes,
            count: arity,
        })
    }

    /// Executes a single decoded instruction
    fn execute_instruction<O: Output>(
        &mut self,
        instruction: Instruction,
        operands: Operands,
        output: &mut O,
    ) -> Result<(), FaultKind> {
        match instruction {
            Instruction::LDI => self.ldi(operands),
            Instruction::ADD => self.alu(instruction, AluOp::ADD, operands),
            Instruction::MUL => self.alu(instruction, AluOp::MUL, operands),
            Instruction::PRN => self.prn(operands, output),
            Instruction::HLT => self.hlt(),
        }
    }

    fn ldi(&mut self, operands: Operands) -> Result<(), FaultKind> {
        self.registers.set(operands.a(), operands.b())?;
        self.pc += operands.width();

        debug!("LDI R{} {}", operands.a(), operands.b());
        Ok(())
    }

    fn alu(
        &mut self,
        instruction: Instruction,
        operation: AluOp,
        operands: Operands,
    ) -> Result<(), FaultKind> {
        let a = self.registers.get(operands.a())?;
        let b = self.registers.get(operands.b())?;
        let result = alu::evaluate(operation, a, b)?;
        self.registers.set(operands.a(), result)?;
        self.pc += operands.width();

        debug!("{} R{} R{}: {}", instruction, operands.a(), operands.b(), result);
        Ok(())
    }

    fn prn<O: Output>(&mut self, operands: Operands, output: &mut O) -> Result<(), FaultKind> {
        let value = self.registers.get(operands.a())?;
        output
            .emit(value)
            .map_err(|err| FaultKind::OutputFailed { kind: err.kind() })?;
        self.pc += operands.width();

        debug!("PRN R{}: {}", operands.a(), value);
        Ok(())
    }

    fn hlt(&mut self) -> Result<(), FaultKind> {
        self.state = State::Halted; // PC stays on the HLT

        debug!("HLT");
        Ok(())
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal => $arity:literal , )+ ) => {
        /// Defines the instructions together with their operand count
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        #[derive(IntoPrimitive)]
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

            /// Number of operand bytes following the opcode
            pub fn arity(&self) -> u8 {
                match self {
                    $( Self::$name => $arity , )+
                }
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

instructions! {
    /// Stop the execution of the program
    HLT = 0b0000_0001 => 0,
    /// Print the value of a register
    /// @param register
    PRN = 0b0100_0111 => 1,
    /// Load an immediate value into a register
    /// @param register
    /// @param value
    LDI = 0b1000_0010 => 2,
    /// Add two registers and store the result in the first
    /// @param register_a
    /// @param register_b
    ADD = 0b1010_0000 => 2,
    /// Multiply two registers and store the result in the first
    /// @param register_a
    /// @param register_b
    MUL = 0b1010_0010 => 2,
}
