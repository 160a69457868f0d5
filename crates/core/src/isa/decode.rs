//! Instruction decoder.
//!
//! Decodes 32-bit encodings into a structured [`Decoded`] form: opcode,
//! register indices, function codes, and the sign-extended immediate for
//! each format (R, I, S, B, U, J). Classification into an [`InstrClass`]
//! and the register-usage flags are derived here as well, so the pipeline
//! never has to look at raw bits.

use crate::common::constants::{
    FUNCT3_MASK, FUNCT3_SHIFT, FUNCT7_MASK, FUNCT7_SHIFT, HALT_ENCODING, NOP_ENCODING,
    OPCODE_MASK, RD_SHIFT, REG_MASK, RS1_SHIFT, RS2_SHIFT,
};
use crate::isa::opcodes::*;
use crate::isa::{InstrClass, MemWidth};

/// Width of an instruction encoding in bits.
const INSTRUCTION_WIDTH: u32 = 32;

/// Shift-amount field mask for RV64 shift-immediates (6 bits).
const SHAMT64_TOP_SHIFT: u32 = 26;
/// funct6 selecting an arithmetic right shift immediate.
const F6_SRAI: u32 = 0b010000;

/// A decoded instruction: extracted fields plus the sign-extended immediate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// Original 32-bit encoding.
    pub raw: u32,
    /// Major opcode (bits 6-0).
    pub opcode: u32,
    /// Destination register index.
    pub rd: usize,
    /// First source register index.
    pub rs1: usize,
    /// Second source register index.
    pub rs2: usize,
    /// funct3 field.
    pub funct3: u32,
    /// funct7 field.
    pub funct7: u32,
    /// Sign-extended immediate (format-dependent).
    pub imm: i64,
}

/// Decodes a 32-bit encoding into its component fields.
pub fn decode(raw: u32) -> Decoded {
    let opcode = raw & OPCODE_MASK;

    let imm = match opcode {
        OP_IMM | OP_LOAD | OP_JALR => i_type_imm(raw),
        OP_STORE => s_type_imm(raw),
        OP_BRANCH => b_type_imm(raw),
        OP_LUI | OP_AUIPC => u_type_imm(raw),
        OP_JAL => j_type_imm(raw),
        _ => 0,
    };

    Decoded {
        raw,
        opcode,
        rd: ((raw >> RD_SHIFT) & REG_MASK) as usize,
        rs1: ((raw >> RS1_SHIFT) & REG_MASK) as usize,
        rs2: ((raw >> RS2_SHIFT) & REG_MASK) as usize,
        funct3: (raw >> FUNCT3_SHIFT) & FUNCT3_MASK,
        funct7: (raw >> FUNCT7_SHIFT) & FUNCT7_MASK,
        imm,
    }
}

impl Decoded {
    /// Classifies the instruction into its pipeline category.
    ///
    /// Everything that does not decode to a supported encoding is `Illegal`;
    /// the pipeline turns that into a precise trap when the instruction
    /// reaches the decode stage.
    pub fn class(&self) -> InstrClass {
        if self.raw == NOP_ENCODING {
            return InstrClass::Nop;
        }
        if self.raw == HALT_ENCODING {
            return InstrClass::Halt;
        }

        match self.opcode {
            OP_LUI | OP_AUIPC => InstrClass::Alu,
            OP_JAL => InstrClass::Jal,
            OP_JALR => {
                if self.funct3 == 0 {
                    InstrClass::Jalr
                } else {
                    InstrClass::Illegal
                }
            }
            OP_BRANCH => match self.funct3 {
                F3_BEQ | F3_BNE | F3_BLT | F3_BGE | F3_BLTU | F3_BGEU => InstrClass::Branch,
                _ => InstrClass::Illegal,
            },
            OP_LOAD => match self.funct3 {
                F3_BYTE | F3_HALF | F3_WORD | F3_DOUBLE | F3_BYTE_U | F3_HALF_U | F3_WORD_U => {
                    InstrClass::Load
                }
                _ => InstrClass::Illegal,
            },
            OP_STORE => match self.funct3 {
                F3_BYTE | F3_HALF | F3_WORD | F3_DOUBLE => InstrClass::Store,
                _ => InstrClass::Illegal,
            },
            OP_IMM => match self.funct3 {
                // RV64 shift-immediates reserve the upper 6 bits of funct7.
                F3_SLL => {
                    if ((self.raw >> SHAMT64_TOP_SHIFT) & 0x3F) == 0 {
                        InstrClass::Alu
                    } else {
                        InstrClass::Illegal
                    }
                }
                F3_SRL_SRA => match (self.raw >> SHAMT64_TOP_SHIFT) & 0x3F {
                    0 | F6_SRAI => InstrClass::Alu,
                    _ => InstrClass::Illegal,
                },
                _ => InstrClass::Alu,
            },
            OP_REG => match (self.funct3, self.funct7) {
                (_, 0) => InstrClass::Alu,
                (F3_ADD_SUB, F7_ALT) | (F3_SRL_SRA, F7_ALT) => InstrClass::Alu,
                _ => InstrClass::Illegal,
            },
            _ => InstrClass::Illegal,
        }
    }

    /// Register-file usage flags `(reads_rs1, reads_rs2, writes_rd)`.
    ///
    /// Usage varies within a class by encoding format (LUI reads nothing,
    /// register-register ALU ops read both sources), so the flags cannot
    /// be derived from the class alone.
    pub fn reg_usage(&self, class: InstrClass) -> (bool, bool, bool) {
        match class {
            InstrClass::Alu => match self.opcode {
                OP_LUI | OP_AUIPC => (false, false, true),
                OP_REG => (true, true, true),
                _ => (true, false, true),
            },
            InstrClass::Load => (true, false, true),
            InstrClass::Store => (true, true, false),
            InstrClass::Branch => (true, true, false),
            InstrClass::Jal => (false, false, true),
            InstrClass::Jalr => (true, false, true),
            InstrClass::Nop | InstrClass::Halt | InstrClass::Illegal => (false, false, false),
        }
    }

    /// Memory access width and sign-extension flag for loads and stores.
    pub fn mem_access(&self) -> (MemWidth, bool) {
        match self.funct3 {
            F3_BYTE => (MemWidth::Byte, true),
            F3_HALF => (MemWidth::Half, true),
            F3_WORD => (MemWidth::Word, true),
            F3_DOUBLE => (MemWidth::Double, false),
            F3_BYTE_U => (MemWidth::Byte, false),
            F3_HALF_U => (MemWidth::Half, false),
            F3_WORD_U => (MemWidth::Word, false),
            _ => (MemWidth::Word, false),
        }
    }
}

/// I-Type: `imm[11:0] | rs1 | funct3 | rd | opcode`.
fn i_type_imm(raw: u32) -> i64 {
    ((raw as i32) >> 20) as i64
}

/// S-Type: `imm[11:5] | rs2 | rs1 | funct3 | imm[4:0] | opcode`.
fn s_type_imm(raw: u32) -> i64 {
    let low = (raw >> 7) & 0x1F;
    let high = (raw >> 25) & 0x7F;
    sign_extend((high << 5) | low, 12)
}

/// B-Type: `imm[12] | imm[10:5] | rs2 | rs1 | funct3 | imm[4:1] | imm[11] | opcode`.
fn b_type_imm(raw: u32) -> i64 {
    let bit_11 = (raw >> 7) & 0x1;
    let bits_4_1 = (raw >> 8) & 0xF;
    let bits_10_5 = (raw >> 25) & 0x3F;
    let bit_12 = (raw >> 31) & 0x1;
    sign_extend(
        (bit_12 << 12) | (bit_11 << 11) | (bits_10_5 << 5) | (bits_4_1 << 1),
        13,
    )
}

/// U-Type: `imm[31:12] | rd | opcode`.
fn u_type_imm(raw: u32) -> i64 {
    ((raw & 0xFFFF_F000) as i32) as i64
}

/// J-Type: `imm[20] | imm[10:1] | imm[11] | imm[19:12] | rd | opcode`.
fn j_type_imm(raw: u32) -> i64 {
    let bits_19_12 = (raw >> 12) & 0xFF;
    let bit_11 = (raw >> 20) & 0x1;
    let bits_10_1 = (raw >> 21) & 0x3FF;
    let bit_20 = (raw >> 31) & 0x1;
    sign_extend(
        (bit_20 << 20) | (bits_19_12 << 12) | (bit_11 << 11) | (bits_10_1 << 1),
        21,
    )
}

/// Sign-extends a `bits`-wide value to 64 bits.
fn sign_extend(val: u32, bits: u32) -> i64 {
    let shift = INSTRUCTION_WIDTH - bits;
    (((val << shift) as i32) >> shift) as i64
}
