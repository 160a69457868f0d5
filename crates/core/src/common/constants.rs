//! Global simulator constants.
//!
//! This module defines system-wide constants used across the simulator:
//! 1. **Architectural Constants:** NOP encoding, word size, trap vector.
//! 2. **Instruction Constants:** Field masks and shifts for decoding.

/// Canonical NOP encoding (`addi x0, x0, 0`).
pub const NOP_ENCODING: u32 = 0x0000_0013;

/// Architectural HALT marker (`ecall`).
pub const HALT_ENCODING: u32 = 0x0000_0073;

/// Address the pipeline redirects to on a precise exception.
pub const EXCEPTION_HANDLER_ADDR: u64 = 0x8000;

/// Size of one instruction in bytes.
pub const INSTRUCTION_BYTES: u64 = 4;

/// Bit mask for extracting the major opcode field.
pub const OPCODE_MASK: u32 = 0x7F;

/// Bit mask for a 5-bit register field.
pub const REG_MASK: u32 = 0x1F;

/// Bit position shift for the destination register (rd) field.
pub const RD_SHIFT: u32 = 7;

/// Bit position shift for the first source register (rs1) field.
pub const RS1_SHIFT: u32 = 15;

/// Bit position shift for the second source register (rs2) field.
pub const RS2_SHIFT: u32 = 20;

/// Bit position shift for the funct3 field.
pub const FUNCT3_SHIFT: u32 = 12;

/// Bit mask for the funct3 field (after shifting).
pub const FUNCT3_MASK: u32 = 0x7;

/// Bit position shift for the funct7 field.
pub const FUNCT7_SHIFT: u32 = 25;

/// Bit mask for the funct7 field (after shifting).
pub const FUNCT7_MASK: u32 = 0x7F;
