//! Concrete stage simulator.
//!
//! Owns the architectural state — a 32-entry general-purpose register file
//! (x0 hardwired to zero) and the memory store — and implements the five
//! stage functions over the supported base integer subset. The pipeline
//! engine decides *when* each stage runs; this module decides *what* it
//! computes.

use crate::core::pipeline::latches::{PipeInstr, StageStatus};
use crate::isa::opcodes::*;
use crate::isa::{decode, InstrClass, MemWidth};
use crate::mem::MemoryStore;
use crate::sim::StageSim;
use std::io::{self, Write};

/// General-purpose register file with x0 hardwired to zero.
pub struct Gpr {
    regs: [u64; 32],
}

impl Gpr {
    /// All registers initialized to zero.
    pub fn new() -> Self {
        Self { regs: [0; 32] }
    }

    /// Reads register `idx`; x0 always reads zero.
    pub fn read(&self, idx: usize) -> u64 {
        if idx == 0 {
            0
        } else {
            self.regs[idx]
        }
    }

    /// Writes register `idx`; writes to x0 are ignored.
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    /// Dumps all registers in pairs.
    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        for i in (0..32).step_by(2) {
            writeln!(
                out,
                "x{:<2} = {:#018x}    x{:<2} = {:#018x}",
                i,
                self.read(i),
                i + 1,
                self.read(i + 1)
            )?;
        }
        Ok(())
    }
}

impl Default for Gpr {
    fn default() -> Self {
        Self::new()
    }
}

/// The concrete stage simulator: register file plus memory store.
pub struct Simulator {
    regs: Gpr,
    mem: MemoryStore,
    retired: u64,
}

impl Simulator {
    /// Creates a simulator over the given memory store.
    pub fn new(mem: MemoryStore) -> Self {
        Self {
            regs: Gpr::new(),
            mem,
            retired: 0,
        }
    }

    /// Reads a general-purpose register.
    pub fn reg(&self, idx: usize) -> u64 {
        self.regs.read(idx)
    }

    /// Writes a general-purpose register.
    pub fn set_reg(&mut self, idx: usize, val: u64) {
        self.regs.write(idx, val);
    }

    /// Shared access to the memory store.
    pub fn mem(&self) -> &MemoryStore {
        &self.mem
    }

    /// Mutable access to the memory store.
    pub fn mem_mut(&mut self) -> &mut MemoryStore {
        &mut self.mem
    }

    fn alu_result(inst: &PipeInstr) -> u64 {
        match inst.raw & 0x7F {
            OP_LUI => inst.imm as u64,
            OP_AUIPC => inst.pc.wrapping_add(inst.imm as u64),
            OP_REG => Self::alu_op(inst.funct3, inst.funct7 == F7_ALT, inst.op1, inst.op2),
            // Immediate forms: shift sub-operation comes from the funct7 bits.
            _ => Self::alu_op(
                inst.funct3,
                inst.funct3 == F3_SRL_SRA && (inst.funct7 & F7_ALT) != 0,
                inst.op1,
                inst.imm as u64,
            ),
        }
    }

    fn alu_op(funct3: u32, alt: bool, a: u64, b: u64) -> u64 {
        match funct3 {
            F3_ADD_SUB => {
                if alt {
                    a.wrapping_sub(b)
                } else {
                    a.wrapping_add(b)
                }
            }
            F3_SLL => a.wrapping_shl((b & 0x3F) as u32),
            F3_SLT => ((a as i64) < (b as i64)) as u64,
            F3_SLTU => (a < b) as u64,
            F3_XOR => a ^ b,
            F3_SRL_SRA => {
                let sh = (b & 0x3F) as u32;
                if alt {
                    ((a as i64).wrapping_shr(sh)) as u64
                } else {
                    a.wrapping_shr(sh)
                }
            }
            F3_OR => a | b,
            F3_AND => a & b,
            _ => 0,
        }
    }

    fn sign_extend_load(val: u64, width: MemWidth) -> u64 {
        match width {
            MemWidth::Byte => val as u8 as i8 as i64 as u64,
            MemWidth::Half => val as u16 as i16 as i64 as u64,
            MemWidth::Word => val as u32 as i32 as i64 as u64,
            MemWidth::Double => val,
        }
    }

    fn misaligned(addr: u64, width: MemWidth) -> bool {
        addr & (width.bytes() - 1) != 0
    }
}

impl StageSim for Simulator {
    fn sim_if(&mut self, pc: u64) -> PipeInstr {
        // Unbacked memory reads as zero, which decodes to Illegal and traps
        // in decode; there is no separate fetch fault.
        let raw = self.mem.read_word(pc).unwrap_or(0);
        let d = decode(raw);
        let class = d.class();
        let (reads_rs1, reads_rs2, writes_rd) = d.reg_usage(class);
        let (width, signed_load) = d.mem_access();

        PipeInstr {
            raw,
            pc,
            status: StageStatus::Idle,
            class,
            reads_rs1,
            reads_rs2,
            writes_rd,
            rs1: d.rs1,
            rs2: d.rs2,
            rd: d.rd,
            imm: d.imm,
            funct3: d.funct3,
            funct7: d.funct7,
            width,
            signed_load,
            op1: 0,
            op2: 0,
            alu: 0,
            mem_addr: 0,
            mem_result: 0,
            mem_trap: false,
            next_pc: pc.wrapping_add(4),
        }
    }

    fn sim_id(&mut self, mut inst: PipeInstr) -> PipeInstr {
        if inst.status.is_terminal() {
            return inst;
        }
        if inst.reads_rs1 {
            inst.op1 = self.regs.read(inst.rs1);
        }
        if inst.reads_rs2 {
            inst.op2 = self.regs.read(inst.rs2);
        }
        inst
    }

    fn sim_ex(&mut self, mut inst: PipeInstr) -> PipeInstr {
        if inst.status.is_terminal() {
            return inst;
        }
        match inst.class {
            InstrClass::Alu => inst.alu = Self::alu_result(&inst),
            InstrClass::Load | InstrClass::Store => {
                inst.mem_addr = inst.op1.wrapping_add(inst.imm as u64);
            }
            InstrClass::Jal | InstrClass::Jalr => {
                inst.alu = inst.pc.wrapping_add(4);
            }
            _ => {}
        }
        inst
    }

    fn sim_mem(&mut self, mut inst: PipeInstr) -> PipeInstr {
        if inst.status.is_terminal() {
            return inst;
        }
        match inst.class {
            InstrClass::Load => {
                if Self::misaligned(inst.mem_addr, inst.width) {
                    inst.mem_trap = true;
                } else {
                    match self.mem.read(inst.mem_addr, inst.width) {
                        Some(val) => {
                            inst.mem_result = if inst.signed_load {
                                Self::sign_extend_load(val, inst.width)
                            } else {
                                val
                            };
                        }
                        None => inst.mem_trap = true,
                    }
                }
            }
            InstrClass::Store => {
                if Self::misaligned(inst.mem_addr, inst.width)
                    || self.mem.write(inst.mem_addr, inst.width, inst.op2).is_none()
                {
                    inst.mem_trap = true;
                }
            }
            _ => {}
        }
        inst
    }

    fn sim_wb(&mut self, inst: PipeInstr) -> PipeInstr {
        if inst.status == StageStatus::Normal && !inst.mem_trap {
            if inst.writes_rd {
                let val = if inst.reads_mem() {
                    inst.mem_result
                } else {
                    inst.alu
                };
                self.regs.write(inst.rd, val);
            }
            self.retired += 1;
        }
        inst
    }

    fn resolve_next_pc(&mut self, mut inst: PipeInstr) -> PipeInstr {
        match inst.class {
            InstrClass::Jal => {
                inst.next_pc = inst.pc.wrapping_add(inst.imm as u64);
            }
            InstrClass::Jalr => {
                inst.next_pc = inst.op1.wrapping_add(inst.imm as u64) & !1;
            }
            InstrClass::Branch => {
                let taken = match inst.funct3 {
                    F3_BEQ => inst.op1 == inst.op2,
                    F3_BNE => inst.op1 != inst.op2,
                    F3_BLT => (inst.op1 as i64) < (inst.op2 as i64),
                    F3_BGE => (inst.op1 as i64) >= (inst.op2 as i64),
                    F3_BLTU => inst.op1 < inst.op2,
                    F3_BGEU => inst.op1 >= inst.op2,
                    _ => false,
                };
                inst.next_pc = if taken {
                    inst.pc.wrapping_add(inst.imm as u64)
                } else {
                    inst.pc.wrapping_add(4)
                };
            }
            _ => {}
        }
        inst
    }

    fn retired(&self) -> u64 {
        self.retired
    }

    fn dump_state(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "---- registers ----")?;
        self.regs.dump(out)?;
        writeln!(out, "---- memory (non-zero words) ----")?;
        self.mem.dump(out)
    }
}
