use crate::fault::FaultKind;
use crate::memory::Byte;
use num_enum::IntoPrimitive;

/// LS-8 ALU operation tags. These are the low four bits of the opcodes in
/// the ALU instruction family (`0b101x_xxxx`).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[derive(IntoPrimitive)]
pub enum AluOp {
    ADD = 0x0,
    SUB = 0x1,
    MUL = 0x2,
    DIV = 0x3,
    MOD = 0x4,
    INC = 0x5,
    DEC = 0x6,
    CMP = 0x7,
    AND = 0x8,
    NOT = 0x9,
    OR = 0xA,
    XOR = 0xB,
    SHL = 0xC,
    SHR = 0xD,
}

/// Applies `operation` to `a` and `b`. Results wrap around at 256.
pub fn evaluate(operation: AluOp, a: Byte, b: Byte) -> Result<Byte, FaultKind> {
    match operation {
        AluOp::ADD => Ok(a.wrapping_add(b)),
        AluOp::MUL => Ok(a.wrapping_mul(b)),
        _ => Err(FaultKind::UnsupportedOperation {
            operation: operation.into(),
        }),
    }
}
