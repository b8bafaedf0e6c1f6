use super::memory::Memory;
use super::{VmError, VmResult};
use crate::isa::{ALL_ONES, Instruction, Opcode, Word};

/// What the run loop does after an instruction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue with the following instruction.
    Next,
    /// Continue at a 1-based line number (never 0).
    Jump(Word),
    /// A GOTO chain resolved to line 0.
    Halt,
    /// Wait for an input value to be written to this address.
    Suspend(Word),
}

#[inline(always)]
fn binary(mem: &mut Memory, [target, operand]: [Word; 2], f: impl FnOnce(Word, Word) -> Word) -> VmResult<Flow> {
    let a = mem.get(target)?;
    let b = mem.get(operand)?;
    mem.set(target, f(a, b))?;
    Ok(Flow::Next)
}

#[inline(always)]
fn checked(
    mem: &mut Memory,
    [target, operand]: [Word; 2],
    f: impl FnOnce(Word, Word) -> Option<Word>,
) -> VmResult<Flow> {
    let a = mem.get(target)?;
    let b = mem.get(operand)?;
    let v = f(a, b).ok_or(VmError::DivisionByZero { target, operand })?;
    mem.set(target, v)?;
    Ok(Flow::Next)
}

fn mask(cond: bool) -> Word {
    if cond { ALL_ONES } else { 0 }
}

// Amounts are read as two's complement: positive shifts right, negative
// shifts left by the magnitude. Shifting by the word width or more clears
// every bit.
fn shift(value: Word, amount: Word) -> Word {
    let signed = amount as i64;
    if signed > 0 {
        u32::try_from(amount).ok().and_then(|n| value.checked_shr(n)).unwrap_or(0)
    } else {
        let magnitude = amount.wrapping_neg();
        u32::try_from(magnitude).ok().and_then(|n| value.checked_shl(n)).unwrap_or(0)
    }
}

/// Resolve a GOTO: `mem[target]`, then `hops` more links.
fn resolve_chain(mem: &Memory, hops: Word, target: Word) -> VmResult<Word> {
    let mut line = mem.get(target)?;
    for _ in 0..hops {
        line = mem.get(line)?;
    }
    Ok(line)
}

/// Apply one instruction to memory.
pub fn execute(ins: &Instruction, mem: &mut Memory) -> VmResult<Flow> {
    let p = ins.params;
    match ins.opcode {
        Opcode::And => binary(mem, p, |a, b| a & b),
        Opcode::Or => binary(mem, p, |a, b| a | b),
        Opcode::Xor => binary(mem, p, |a, b| a ^ b),
        Opcode::Not => {
            let v = mem.get(p[0])?;
            mem.set(p[0], !v)?;
            Ok(Flow::Next)
        }
        Opcode::Shift => binary(mem, p, shift),
        Opcode::Add => binary(mem, p, Word::wrapping_add),
        Opcode::Sub => binary(mem, p, Word::wrapping_sub),
        Opcode::Mul => binary(mem, p, Word::wrapping_mul),
        Opcode::Div => checked(mem, p, Word::checked_div),
        Opcode::Mod => checked(mem, p, Word::checked_rem),
        Opcode::Less => binary(mem, p, |a, b| mask(a < b)),
        Opcode::Equ => binary(mem, p, |a, b| mask(a == b)),
        Opcode::Copy => {
            let v = mem.get(p[0])?;
            mem.set(p[1], v)?;
            Ok(Flow::Next)
        }
        Opcode::Goto => match resolve_chain(mem, p[0], p[1])? {
            0 => Ok(Flow::Halt),
            line => Ok(Flow::Jump(line)),
        },
        Opcode::Input => Ok(Flow::Suspend(p[0])),
        Opcode::Load => {
            let addr = mem.get(p[1])?;
            let v = mem.get(addr)?;
            mem.set(p[0], v)?;
            Ok(Flow::Next)
        }
    }
}
