//! Major opcodes and function codes for the supported base integer subset.

/// Load instructions (LB, LH, LW, LD and unsigned variants).
pub const OP_LOAD: u32 = 0b0000011;

/// Immediate arithmetic instructions (ADDI, ANDI, SLLI, etc.).
pub const OP_IMM: u32 = 0b0010011;

/// Add Upper Immediate to PC (AUIPC).
pub const OP_AUIPC: u32 = 0b0010111;

/// Store instructions (SB, SH, SW, SD).
pub const OP_STORE: u32 = 0b0100011;

/// Register-register arithmetic (ADD, SUB, SLL, etc.).
pub const OP_REG: u32 = 0b0110011;

/// Load Upper Immediate (LUI).
pub const OP_LUI: u32 = 0b0110111;

/// Conditional branch instructions (BEQ, BNE, etc.).
pub const OP_BRANCH: u32 = 0b1100011;

/// Jump and Link Register (JALR).
pub const OP_JALR: u32 = 0b1100111;

/// Jump and Link (JAL).
pub const OP_JAL: u32 = 0b1101111;

/// System instructions; only ECALL (the HALT marker) is legal here.
pub const OP_SYSTEM: u32 = 0b1110011;

// funct3 codes for OP_REG / OP_IMM arithmetic.

/// ADD / SUB / ADDI.
pub const F3_ADD_SUB: u32 = 0b000;
/// SLL / SLLI.
pub const F3_SLL: u32 = 0b001;
/// SLT / SLTI.
pub const F3_SLT: u32 = 0b010;
/// SLTU / SLTIU.
pub const F3_SLTU: u32 = 0b011;
/// XOR / XORI.
pub const F3_XOR: u32 = 0b100;
/// SRL / SRA / SRLI / SRAI.
pub const F3_SRL_SRA: u32 = 0b101;
/// OR / ORI.
pub const F3_OR: u32 = 0b110;
/// AND / ANDI.
pub const F3_AND: u32 = 0b111;

// funct3 codes for OP_BRANCH.

/// Branch if equal.
pub const F3_BEQ: u32 = 0b000;
/// Branch if not equal.
pub const F3_BNE: u32 = 0b001;
/// Branch if less than (signed).
pub const F3_BLT: u32 = 0b100;
/// Branch if greater or equal (signed).
pub const F3_BGE: u32 = 0b101;
/// Branch if less than (unsigned).
pub const F3_BLTU: u32 = 0b110;
/// Branch if greater or equal (unsigned).
pub const F3_BGEU: u32 = 0b111;

// funct3 codes for OP_LOAD / OP_STORE widths.

/// Byte access (LB / SB).
pub const F3_BYTE: u32 = 0b000;
/// Half-word access (LH / SH).
pub const F3_HALF: u32 = 0b001;
/// Word access (LW / SW).
pub const F3_WORD: u32 = 0b010;
/// Double-word access (LD / SD).
pub const F3_DOUBLE: u32 = 0b011;
/// Unsigned byte load (LBU).
pub const F3_BYTE_U: u32 = 0b100;
/// Unsigned half-word load (LHU).
pub const F3_HALF_U: u32 = 0b101;
/// Unsigned word load (LWU).
pub const F3_WORD_U: u32 = 0b110;

/// funct7 value selecting SUB / SRA over ADD / SRL.
pub const F7_ALT: u32 = 0b0100000;
