//! Reference Hack machine for executing translator output.
//!
//! Loads symbolic assembly the way the downstream assembler does (labels
//! first, then variables allocated from RAM[16]) and runs it with wrapping
//! 16-bit arithmetic. No screen or keyboard behavior: those addresses are
//! plain memory words here.

use std::collections::HashMap;

use crate::asm::{Address, Asm, Comp, Dest, Jump};

pub const RAM_SIZE: usize = 0x8000;
pub const SCREEN: u16 = 16384;
pub const KBD: u16 = 24576;
/// First RAM word handed out to assembler variables (static segment).
pub const VARIABLE_BASE: u16 = 16;
pub const STACK_BASE: u16 = 256;

/// Why execution stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Halt {
    /// The program counter ran past the last instruction.
    EndOfProgram,
    /// An unconditional jump to itself (`(L) @L 0;JMP`).
    SelfLoop,
}

/// VM execution result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub halt: Halt,
    /// Number of instructions executed.
    pub steps: u64,
}

#[derive(Clone, Copy, Debug)]
enum Instr {
    A(u16),
    C {
        dest: Option<Dest>,
        comp: Comp,
        jump: Option<Jump>,
    },
}

pub struct Machine {
    rom: Vec<Instr>,
    ram: Vec<i16>,
    symbols: HashMap<String, u16>,
    pc: usize,
    a: i16,
    d: i16,
}

fn predefined_symbols() -> HashMap<String, u16> {
    let mut table = HashMap::new();
    for (name, addr) in [("SP", 0), ("LCL", 1), ("ARG", 2), ("THIS", 3), ("THAT", 4)] {
        table.insert(name.to_string(), addr);
    }
    for r in 0..16u16 {
        table.insert(format!("R{}", r), r);
    }
    table.insert("SCREEN".to_string(), SCREEN);
    table.insert("KBD".to_string(), KBD);
    table
}

impl Machine {
    /// Resolve symbols and load a program. RAM starts zeroed.
    pub fn load(program: &[Asm]) -> Result<Machine, String> {
        let mut symbols = predefined_symbols();

        // Pass 1: label addresses.
        let mut rom_address = 0u16;
        for line in program {
            match line {
                Asm::Label(name) => {
                    if symbols.contains_key(name) {
                        return Err(format!("duplicate label `{}`", name));
                    }
                    symbols.insert(name.clone(), rom_address);
                }
                _ => {
                    rom_address = rom_address
                        .checked_add(1)
                        .filter(|a| *a <= 0x8000)
                        .ok_or_else(|| "program does not fit in ROM".to_string())?;
                }
            }
        }

        // Pass 2: variables, in order of first use.
        let mut next_variable = VARIABLE_BASE;
        let mut rom = Vec::with_capacity(rom_address as usize);
        for line in program {
            match line {
                Asm::Label(_) => {}
                Asm::At(Address::Value(v)) => rom.push(Instr::A(*v)),
                Asm::At(Address::Symbol(name)) => {
                    let addr = match symbols.get(name) {
                        Some(addr) => *addr,
                        None => {
                            let addr = next_variable;
                            if addr >= SCREEN {
                                return Err(format!("out of variable space at `{}`", name));
                            }
                            symbols.insert(name.clone(), addr);
                            next_variable += 1;
                            addr
                        }
                    };
                    rom.push(Instr::A(addr));
                }
                Asm::Compute { dest, comp, jump } => rom.push(Instr::C {
                    dest: *dest,
                    comp: *comp,
                    jump: *jump,
                }),
            }
        }

        Ok(Machine {
            rom,
            ram: vec![0; RAM_SIZE],
            symbols,
            pc: 0,
            a: 0,
            d: 0,
        })
    }

    /// Address assigned to a label or variable, if any.
    pub fn symbol(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).copied()
    }

    pub fn ram(&self, addr: u16) -> i16 {
        self.ram[addr as usize % RAM_SIZE]
    }

    pub fn set_ram(&mut self, addr: u16, value: i16) {
        self.ram[addr as usize % RAM_SIZE] = value;
    }

    pub fn sp(&self) -> u16 {
        self.ram(0) as u16
    }

    /// The working stack: RAM[256..SP].
    pub fn stack(&self) -> &[i16] {
        let sp = (self.sp() as usize).clamp(STACK_BASE as usize, RAM_SIZE);
        &self.ram[STACK_BASE as usize..sp]
    }

    /// Execute one instruction. Returns `Some(halt)` when the machine stops.
    pub fn step(&mut self) -> Result<Option<Halt>, String> {
        let Some(instr) = self.rom.get(self.pc).copied() else {
            return Ok(Some(Halt::EndOfProgram));
        };
        match instr {
            Instr::A(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Instr::C { dest, comp, jump } => {
                let address = self.a as u16 as usize;
                let m = if comp.reads_m() {
                    *self.ram.get(address).ok_or_else(|| {
                        format!("read of RAM[{}] out of range at pc {}", address, self.pc)
                    })?
                } else {
                    0
                };
                let out = comp.eval(self.d, self.a, m);
                if let Some(dest) = dest {
                    // M is written at the address held before this instruction.
                    if dest.writes_m() {
                        let slot = self.ram.get_mut(address).ok_or_else(|| {
                            format!("write of RAM[{}] out of range at pc {}", address, self.pc)
                        })?;
                        *slot = out;
                    }
                    if dest.writes_a() {
                        self.a = out;
                    }
                    if dest.writes_d() {
                        self.d = out;
                    }
                }
                match jump {
                    Some(j) if j.taken(out) => {
                        let target = self.a as u16 as usize;
                        if j == Jump::JMP && target + 1 == self.pc {
                            return Ok(Some(Halt::SelfLoop));
                        }
                        self.pc = target;
                    }
                    _ => self.pc += 1,
                }
            }
        }
        Ok(None)
    }

    /// Run until halt or until `max_steps` instructions have executed.
    pub fn run(&mut self, max_steps: u64) -> Result<ExecutionResult, String> {
        for steps in 0..max_steps {
            if let Some(halt) = self.step()? {
                return Ok(ExecutionResult { halt, steps });
            }
        }
        Err(format!(
            "step budget of {} exhausted at pc {}",
            max_steps, self.pc
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::parse_listing;

    fn machine(listing: &str) -> Machine {
        Machine::load(&parse_listing(listing).unwrap()).unwrap()
    }

    #[test]
    fn test_add_two_constants() {
        let mut m = machine("@2\nD=A\n@3\nD=D+A\n@0\nM=D\n");
        let result = m.run(100).unwrap();
        assert_eq!(result.halt, Halt::EndOfProgram);
        assert_eq!(result.steps, 6);
        assert_eq!(m.ram(0), 5);
    }

    #[test]
    fn test_variables_allocated_from_16() {
        let m = machine("@i\nM=1\n@j\nM=1\n@i\nM=0\n");
        assert_eq!(m.symbol("i"), Some(16));
        assert_eq!(m.symbol("j"), Some(17));
    }

    #[test]
    fn test_labels_resolve_to_rom_addresses() {
        let m = machine("@END\n0;JMP\n(MID)\n@1\n(END)\n@END\n0;JMP\n");
        assert_eq!(m.symbol("MID"), Some(2));
        assert_eq!(m.symbol("END"), Some(3));
    }

    #[test]
    fn test_self_loop_halts() {
        let mut m = machine("@7\nD=A\n@R0\nM=D\n(END)\n@END\n0;JMP\n");
        let result = m.run(100).unwrap();
        assert_eq!(result.halt, Halt::SelfLoop);
        assert_eq!(m.ram(0), 7);
    }

    #[test]
    fn test_counting_loop() {
        // R1 = 1 + 2 + ... + 10
        let mut m = machine(
            "@10\nD=A\n@R0\nM=D\n@R1\nM=0\n(LOOP)\n@R0\nD=M\n@END\nD;JEQ\n@R1\nM=D+M\n@R0\nM=M-1\n@LOOP\n0;JMP\n(END)\n@END\n0;JMP\n",
        );
        m.run(1_000).unwrap();
        assert_eq!(m.ram(1), 55);
    }

    #[test]
    fn test_am_writes_memory_at_old_address() {
        let mut m = machine("@SP\nAM=M-1\nD=M\n");
        m.set_ram(0, 258);
        m.set_ram(257, 42);
        m.run(10).unwrap();
        assert_eq!(m.sp(), 257);
        assert_eq!(m.d, 42);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let program = parse_listing("(A)\n@1\n(A)\n").unwrap();
        let err = Machine::load(&program).err().unwrap();
        assert!(err.contains("duplicate label"));
    }

    #[test]
    fn test_step_budget() {
        let mut m = machine("(A)\n@B\n0;JMP\n(B)\n@A\n0;JMP\n");
        assert!(m.run(50).unwrap_err().contains("step budget"));
    }

    #[test]
    fn test_negative_address_is_an_error() {
        let mut m = machine("@0\nA=-1\nD=M\n");
        assert!(m.run(10).is_err());
    }
}
