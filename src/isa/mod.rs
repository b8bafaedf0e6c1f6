//! The instruction table shared by the engine, the bytecode codec and the
//! text assembler/disassembler.
//!
//! Every parameter is a [`Word`]. Whether a parameter is read as an address
//! or as a repeat count is decided per opcode (see [`Opcode`]); nothing in a
//! program is a literal, constants live in the header and are addressed.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The machine's only value type.
pub type Word = u64;

/// Result of a comparison that holds.
pub const ALL_ONES: Word = Word::MAX;

/// Parameter slots carried by every instruction, whatever its arity.
pub const MAX_PARAMS: usize = 2;

/// Size in bytes of one word in the binary layout.
pub const WORD_BYTES: usize = std::mem::size_of::<Word>();

/// Size in bytes of one encoded instruction record: opcode + two words.
pub const RECORD_BYTES: usize = 1 + MAX_PARAMS * WORD_BYTES;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IsaError {
    #[error("unknown opcode byte {0:#04x}")]
    UnknownOpcode(u8),
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),
}

// ── Opcodes ──────────────────────────────────────────────────────────
//
// Byte values are the table positions and are part of the file format.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Opcode {
    /// `AND target operand`: `mem[target] &= mem[operand]`
    And = 0,
    /// `OR target operand`: `mem[target] |= mem[operand]`
    Or = 1,
    /// `XOR target operand`: `mem[target] ^= mem[operand]`
    Xor = 2,
    /// `NOT target _`: `mem[target] = !mem[target]`
    Not = 3,
    /// `SHIFT target amount`: right if `mem[amount] > 0`, otherwise left by
    /// the two's-complement magnitude of `mem[amount]`
    Shift = 4,
    /// `ADD target operand`: wrapping
    Add = 5,
    /// `SUB target operand`: wrapping
    Sub = 6,
    /// `MUL target operand`: wrapping
    Mul = 7,
    /// `DIV target operand`: faults on a zero divisor
    Div = 8,
    /// `MOD target operand`: faults on a zero divisor
    Mod = 9,
    /// `LESS a b`: `mem[a] = mem[a] < mem[b] ? ALL_ONES : 0`
    Less = 10,
    /// `EQU a b`: `mem[a] = mem[a] == mem[b] ? ALL_ONES : 0`
    Equ = 11,
    /// `COPY from to`: `mem[to] = mem[from]`
    Copy = 12,
    /// `GOTO hops target`: follow `hops + 1` links starting at `mem[target]`
    Goto = 13,
    /// `INPUT target`: suspend, then `mem[target] = <supplied value>`
    Input = 14,
    /// `LOAD target holder`: `mem[target] = mem[mem[holder]]`
    Load = 15,
}

impl Opcode {
    /// Every opcode in byte order.
    pub const ALL: [Opcode; 16] = [
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Not,
        Opcode::Shift,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::Less,
        Opcode::Equ,
        Opcode::Copy,
        Opcode::Goto,
        Opcode::Input,
        Opcode::Load,
    ];

    /// Text-form name.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Not => "NOT",
            Opcode::Shift => "SHIFT",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Less => "LESS",
            Opcode::Equ => "EQU",
            Opcode::Copy => "COPY",
            Opcode::Goto => "GOTO",
            Opcode::Input => "INPUT",
            Opcode::Load => "LOAD",
        }
    }

    /// Number of parameters written in the text form.
    pub const fn arity(self) -> usize {
        match self {
            Opcode::Input => 1,
            _ => 2,
        }
    }

    pub const fn byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = IsaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .get(value as usize)
            .copied()
            .ok_or(IsaError::UnknownOpcode(value))
    }
}

impl FromStr for Opcode {
    type Err = IsaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == s)
            .ok_or_else(|| IsaError::UnknownMnemonic(s.to_string()))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

// ── Instruction ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub params: [Word; MAX_PARAMS],
}

impl Instruction {
    pub const fn new(opcode: Opcode, params: [Word; MAX_PARAMS]) -> Self {
        Instruction { opcode, params }
    }

    /// The parameters the opcode actually declares.
    pub fn declared_params(&self) -> &[Word] {
        &self.params[..self.opcode.arity()]
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for p in self.declared_params() {
            write!(f, " {}", p)?;
        }
        Ok(())
    }
}

// ── Program ──────────────────────────────────────────────────────────

/// Ordered, immutable instruction sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Program { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at a 0-based index.
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Program::new(instructions)
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Program::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}
