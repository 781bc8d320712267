//! The execution engine: ties the register file, RAM, ALU, and decoder
//! together into a fetch-execute loop.

use crate::common::ExecutionError;
use crate::core::alu::Alu;
use crate::core::bus::Ram;
use crate::core::decode::{decode, Instruction};
use crate::core::registers::RegisterFile;
use crate::stats::Stats;

/// The machine: register file, RAM, and the bookkeeping the run loop needs.
pub struct Cpu {
    pub regs: RegisterFile,
    pub ram: Ram,
    pub stats: Stats,
    running: bool,
    trace: bool,
}

impl Cpu {
    pub fn new(regs: RegisterFile, ram: Ram, trace: bool) -> Self {
        Self {
            regs,
            ram,
            stats: Stats::new(),
            running: true,
            trace,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Runs fetch-execute cycles until `HLT` or a fatal arithmetic error.
    pub fn run(&mut self) -> Result<(), ExecutionError> {
        while self.running {
            self.step()?;
        }
        Ok(())
    }

    /// One fetch-execute cycle.
    pub fn step(&mut self) -> Result<(), ExecutionError> {
        self.fetch();
        let instruction = decode(self.regs.ir);
        if self.trace {
            eprintln!(
                "cycle={:<6} pc={:#06x} ir={:#018x} {:?} Z={} N={} D={} U={}",
                self.stats.cycles,
                self.regs.pc,
                self.regs.ir,
                instruction,
                self.regs.flags.z as u8,
                self.regs.flags.n as u8,
                self.regs.flags.d as u8,
                self.regs.flags.u as u8,
            );
        }
        self.execute(instruction)?;
        self.stats.cycles += 1;
        Ok(())
    }

    /// `MAR <- PC`; bus read into `MDR`; `IR <- MDR`; `PC <- PC + 1`.
    ///
    /// `PC` advances with a wrapping add, matching the `fetch` of every
    /// other step — a program that runs off the end of the address space
    /// wraps rather than panicking.
    fn fetch(&mut self) {
        self.regs.mar = self.regs.pc;
        let word = self.ram.request(0, self.regs.mar, 0);
        self.regs.mdr = word;
        self.regs.ir = self.regs.mdr;
        self.regs.pc = self.regs.pc.wrapping_add(1);
    }

    fn load_mem(&mut self, addr_reg: u8) -> u64 {
        let addr = self.regs.read(addr_reg);
        self.regs.mar = addr;
        let word = self.ram.request(0, self.regs.mar, 0);
        self.regs.mdr = word;
        self.regs.mdr
    }

    fn store_mem(&mut self, addr_reg: u8, value: u64) {
        let addr = self.regs.read(addr_reg);
        self.regs.mar = addr;
        self.regs.mdr = value;
        self.ram.request(self.regs.mdr, self.regs.mar, 1);
    }

    fn execute(&mut self, instruction: Instruction) -> Result<(), ExecutionError> {
        match instruction {
            Instruction::Nop => {}
            Instruction::Halt => self.running = false,

            Instruction::Jmp { target } => self.regs.pc = target,
            Instruction::JmpZ { target } => {
                if self.regs.flags.z {
                    self.regs.pc = target;
                }
            }
            Instruction::JmpNz { target } => {
                if !self.regs.flags.z {
                    self.regs.pc = target;
                }
            }
            Instruction::JmpN { target } => {
                if self.regs.flags.n {
                    self.regs.pc = target;
                }
            }
            Instruction::JmpNn { target } => {
                if !self.regs.flags.n {
                    self.regs.pc = target;
                }
            }
            Instruction::JmpOvr { target } => {
                if self.regs.flags.d {
                    self.regs.pc = target;
                }
            }
            Instruction::JmpUnd { target } => {
                if self.regs.flags.u {
                    self.regs.pc = target;
                }
            }
            Instruction::JmpNorZ { target } => {
                if !self.regs.flags.n && !self.regs.flags.z {
                    self.regs.pc = target;
                }
            }
            Instruction::JmpNandZ { target } => {
                if !(self.regs.flags.n && self.regs.flags.z) {
                    self.regs.pc = target;
                }
            }

            Instruction::LoadMem { dest, addr_reg } => {
                let value = self.load_mem(addr_reg);
                self.regs.write(dest, value);
            }
            Instruction::Stor { src, addr_reg } => {
                let value = self.regs.read(src);
                self.store_mem(addr_reg, value);
            }
            Instruction::LoadInt { dest, imm } => self.regs.write(dest, imm),
            Instruction::StorI { addr_reg, imm } => self.store_mem(addr_reg, imm),
            Instruction::LoadFloat { dest, imm } => self.regs.write(dest, imm),
            Instruction::StorFloat { addr_reg, imm } => self.store_mem(addr_reg, imm),
            Instruction::Mov { dest, src } => {
                let value = self.regs.read(src);
                self.regs.write(dest, value);
            }

            Instruction::AbsVal { dest, src } => {
                let value = self.regs.read(src);
                let result = Alu::new(&mut self.regs).abs_val(value);
                self.regs.write(dest, result);
            }
            Instruction::ChngSig { dest, src } => {
                let value = self.regs.read(src);
                let result = Alu::new(&mut self.regs).chng_sig(value);
                self.regs.write(dest, result);
            }
            Instruction::ChngInt { dest, src } => {
                let value = self.regs.read(src);
                let result = Alu::new(&mut self.regs).chng_int(value);
                self.regs.write(dest, result);
            }
            Instruction::ChngFloat { dest, src } => {
                let value = self.regs.read(src);
                let result = Alu::new(&mut self.regs).chng_float(value);
                self.regs.write(dest, result);
            }

            Instruction::Comp { a, b } => {
                let av = self.regs.read(a);
                let bv = self.regs.read(b);
                Alu::new(&mut self.regs).comp(av, bv);
            }

            Instruction::And { dest, src1, src2 } => self.binop(dest, src1, src2, Alu::and),
            Instruction::Or { dest, src1, src2 } => self.binop(dest, src1, src2, Alu::or),
            Instruction::Xor { dest, src1, src2 } => self.binop(dest, src1, src2, Alu::xor),
            Instruction::Not { dest, src } => {
                let value = self.regs.read(src);
                let result = Alu::new(&mut self.regs).not(value);
                self.regs.write(dest, result);
            }
            Instruction::ShiftL { dest, src } => {
                let value = self.regs.read(src);
                let result = Alu::new(&mut self.regs).shift_left(value, 1);
                self.regs.write(dest, result);
            }
            Instruction::ShiftR { dest, src } => {
                let value = self.regs.read(src);
                let result = Alu::new(&mut self.regs).shift_right(value, 1);
                self.regs.write(dest, result);
            }

            Instruction::AddFloat { dest, src1, src2 } => {
                self.binop(dest, src1, src2, Alu::add_float)
            }
            Instruction::SubFloat { dest, src1, src2 } => {
                self.binop(dest, src1, src2, Alu::sub_float)
            }
            Instruction::MulFloat { dest, src1, src2 } => {
                self.binop(dest, src1, src2, Alu::mul_float)
            }
            Instruction::DivFloat { dest, src1, src2 } => {
                let a = self.regs.read(src1);
                let b = self.regs.read(src2);
                let result = Alu::new(&mut self.regs).div_float(a, b)?;
                self.regs.write(dest, result);
            }

            Instruction::Push { src } => {
                self.regs.sp = self.regs.sp.wrapping_sub(1);
                let value = self.regs.read(src);
                self.regs.mar = self.regs.sp;
                self.regs.mdr = value;
                self.ram.request(self.regs.mdr, self.regs.mar, 1);
            }
            Instruction::Pop { dest } => {
                self.regs.mar = self.regs.sp;
                let word = self.ram.request(0, self.regs.mar, 0);
                self.regs.mdr = word;
                self.regs.write(dest, self.regs.mdr);
                self.regs.sp = self.regs.sp.wrapping_add(1);
            }

            Instruction::Dec { reg } => {
                let value = self.regs.read(reg);
                let result = Alu::new(&mut self.regs).sub(value, 1);
                self.regs.write(reg, result);
            }
            Instruction::Inc { reg } => {
                let value = self.regs.read(reg);
                let result = Alu::new(&mut self.regs).add(value, 1);
                self.regs.write(reg, result);
            }

            Instruction::Add { dest, src1, src2 } => self.binop(dest, src1, src2, Alu::add),
            Instruction::Sub { dest, src1, src2 } => self.binop(dest, src1, src2, Alu::sub),
            Instruction::Mul { dest, src1, src2 } => self.binop(dest, src1, src2, Alu::mul),
            Instruction::Div { dest, src1, src2 } => {
                let a = self.regs.read(src1);
                let b = self.regs.read(src2);
                let result = Alu::new(&mut self.regs).div(a, b)?;
                self.regs.write(dest, result);
            }

            Instruction::Unknown(word) => {
                eprintln!("unknown instruction word {word:#018x} at pc={:#x}, skipping", self.regs.pc.wrapping_sub(1));
            }
        }
        Ok(())
    }

    fn binop(&mut self, dest: u8, src1: u8, src2: u8, op: fn(&mut Alu, u64, u64) -> u64) {
        let a = self.regs.read(src1);
        let b = self.regs.read(src2);
        let result = op(&mut Alu::new(&mut self.regs), a, b);
        self.regs.write(dest, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(words: &[u64]) -> Cpu {
        let mut ram = Ram::new(64, 64);
        for (i, word) in words.iter().enumerate() {
            ram.write_direct(i as u64, *word);
        }
        let regs = RegisterFile::new();
        Cpu::new(regs, ram, false)
    }

    #[test]
    fn halt_immediately() {
        let mut cpu = machine(&[0xFFFF_FFFF_FFFF_FFFF]);
        cpu.run().unwrap();
        assert_eq!(cpu.stats.cycles, 1);
        assert_eq!(cpu.regs.pc, 1);
        assert!(!cpu.is_running());
    }

    #[test]
    fn load_and_add() {
        let mut cpu = machine(&[
            0x9500_0000_0000_0005, // LOAD INT RA, 5
            0x9600_0000_0000_0007, // LOAD INT RB, 7
            0x0000_0000_0000_1756, // ADD RC, RA, RB
            0xFFFF_FFFF_FFFF_FFFF, // HLT
        ]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.gpr(2), 12); // RC
        assert!(!cpu.regs.flags.z);
        assert!(!cpu.regs.flags.n);
        assert_eq!(cpu.stats.cycles, 4);
    }

    #[test]
    fn conditional_jump_taken_on_zero() {
        let mut cpu = machine(&[
            0x9500_0000_0000_0000, // LOAD INT RA, 0
            (0x21u64 << 8) | (0x5 << 4) | 0x5, // COMP RA, RA
            0x0200_0000_0000_0005, // JMPZ 5
            0xFFFF_FFFF_FFFF_FFFF, // HLT (skipped)
            0x9600_0000_0000_0063, // LOAD INT RB, 99
            0xFFFF_FFFF_FFFF_FFFF, // HLT
        ]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.gpr(1), 99); // RB
    }

    #[test]
    fn fixed_point_multiply() {
        let mut cpu = machine(&[
            0xB500_0001_8000_0000, // LOAD FLOAT RA, 1.5
            0xB600_0002_0000_0000, // LOAD FLOAT RB, 2.0
            (0x01u64 << 16) | (0x3 << 12) | (0x7 << 8) | (0x5 << 4) | 0x6, // MUL_FLOAT RC, RA, RB
            0xFFFF_FFFF_FFFF_FFFF,
        ]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.gpr(2), 0x3_0000_0000);
        assert!(!cpu.regs.flags.d);
        assert!(!cpu.regs.flags.u);
    }

    #[test]
    fn stack_round_trip_restores_sp() {
        let mut cpu = machine(&[
            0x9500_0000_0000_002A, // LOAD INT RA, 42
            0x95,                  // PUSH RA
            0x9500_0000_0000_0000, // LOAD INT RA, 0
            0xA6,                  // POP RB
            0xFFFF_FFFF_FFFF_FFFF,
        ]);
        cpu.regs.sp = 63;
        cpu.run().unwrap();
        assert_eq!(cpu.regs.gpr(0), 0); // RA
        assert_eq!(cpu.regs.gpr(1), 42); // RB
        assert_eq!(cpu.regs.sp, 63);
    }

    #[test]
    fn division_by_zero_is_fatal_and_halts_the_run() {
        let mut cpu = machine(&[
            0x9500_0000_0000_000A, // LOAD INT RA, 10
            0x9600_0000_0000_0000, // LOAD INT RB, 0
            0x0000_0000_0000_4756, // DIV RC, RA, RB
        ]);
        let err = cpu.run().unwrap_err();
        assert_eq!(err, ExecutionError::DivideByZero);
    }

    #[test]
    fn unknown_word_is_skipped_not_fatal() {
        let mut cpu = machine(&[0x0000_0000_F000_0000, 0xFFFF_FFFF_FFFF_FFFF]);
        cpu.run().unwrap();
        assert_eq!(cpu.regs.pc, 2);
    }
}
