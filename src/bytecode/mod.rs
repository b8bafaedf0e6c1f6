//! Binary image format (all words little-endian):
//!
//! ```text
//! [header_len: word]
//! [header_len words of initial memory]
//! repeated until end of input:
//!   [opcode: u8][param0: word][param1: word]
//! ```
//!
//! Both parameter slots are always present. There is no instruction count:
//! records run until the buffer is exhausted, and a partial record is an
//! error.

use serde::Serialize;
use tracing::debug;

use crate::isa::{Instruction, MAX_PARAMS, Opcode, Program, RECORD_BYTES, WORD_BYTES, Word};
use crate::vm::{Memory, VmResult};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BytecodeError {
    #[error("file is too short to hold the header length ({len} bytes)")]
    MissingHeaderLength { len: usize },
    #[error("header declares {expected} words but only {available} follow")]
    TruncatedHeader { expected: Word, available: usize },
    #[error("instruction {index} at byte {offset} is cut short ({remaining} of {RECORD_BYTES} bytes)")]
    TruncatedInstruction { index: usize, offset: usize, remaining: usize },
    #[error("unknown opcode {opcode:#04x} at byte {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },
}

impl BytecodeError {
    pub fn code(&self) -> &'static str {
        match self {
            BytecodeError::MissingHeaderLength { .. }
            | BytecodeError::TruncatedHeader { .. }
            | BytecodeError::TruncatedInstruction { .. } => "LP-B001",
            BytecodeError::UnknownOpcode { .. } => "LP-B002",
        }
    }
}

pub type Result<T> = std::result::Result<T, BytecodeError>;

/// A loaded program file: initial memory plus code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Image {
    pub header: Vec<Word>,
    pub program: Program,
}

impl Image {
    pub fn new(header: Vec<Word>, program: Program) -> Self {
        Image { header, program }
    }

    /// Memory of `size` words seeded with the header.
    pub fn memory(&self, size: usize) -> VmResult<Memory> {
        Memory::from_header(&self.header, size)
    }
}

// ── Reader ───────────────────────────────────────────────────────────

/// Length-checked cursor over a byte buffer.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let chunk = self.bytes.get(self.pos..self.pos.checked_add(n)?)?;
        self.pos += n;
        Some(chunk)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn word(&mut self) -> Option<Word> {
        let raw: [u8; WORD_BYTES] = self.take(WORD_BYTES)?.try_into().ok()?;
        Some(Word::from_le_bytes(raw))
    }
}

// ── Decode / encode ──────────────────────────────────────────────────

pub fn decode(bytes: &[u8]) -> Result<Image> {
    let mut r = Reader::new(bytes);

    let header_len = r
        .word()
        .ok_or(BytecodeError::MissingHeaderLength { len: bytes.len() })?;
    let available = r.remaining() / WORD_BYTES;
    let truncated = || BytecodeError::TruncatedHeader { expected: header_len, available };
    let count = usize::try_from(header_len).map_err(|_| truncated())?;
    if count > available {
        return Err(truncated());
    }
    let mut header = Vec::with_capacity(count);
    for _ in 0..count {
        header.push(r.word().ok_or_else(truncated)?);
    }

    let mut instructions = Vec::with_capacity(r.remaining() / RECORD_BYTES);
    while !r.is_empty() {
        let offset = r.pos;
        if r.remaining() < RECORD_BYTES {
            return Err(BytecodeError::TruncatedInstruction {
                index: instructions.len(),
                offset,
                remaining: r.remaining(),
            });
        }
        // length checked above
        let byte = r.u8().unwrap_or_default();
        let opcode = Opcode::try_from(byte)
            .map_err(|_| BytecodeError::UnknownOpcode { opcode: byte, offset })?;
        let mut params = [0; MAX_PARAMS];
        for p in params.iter_mut() {
            *p = r.word().unwrap_or_default();
        }
        instructions.push(Instruction::new(opcode, params));
    }

    debug!(header = header.len(), instructions = instructions.len(), "decoded image");
    Ok(Image::new(header, Program::new(instructions)))
}

pub fn encode(image: &Image) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        WORD_BYTES * (1 + image.header.len()) + RECORD_BYTES * image.program.len(),
    );
    out.extend_from_slice(&(image.header.len() as Word).to_le_bytes());
    for w in &image.header {
        out.extend_from_slice(&w.to_le_bytes());
    }
    for ins in &image.program {
        out.push(ins.opcode.byte());
        for p in ins.params {
            out.extend_from_slice(&p.to_le_bytes());
        }
    }
    out
}
