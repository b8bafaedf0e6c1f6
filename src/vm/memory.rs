use tracing::debug;

use super::{VmError, VmResult};
use crate::isa::Word;

/// Fixed-size, bounds-checked word store: the machine's whole state apart
/// from the program counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    /// `size` zeroed cells. Fails instead of aborting when the host cannot
    /// provide that much.
    pub fn new(size: usize) -> VmResult<Self> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(size)
            .map_err(|_| VmError::MemoryTooLarge { size })?;
        cells.resize(size, 0);
        Ok(Memory { cells })
    }

    /// Copy `header` into the low addresses of a `size`-cell memory.
    pub fn from_header(header: &[Word], size: usize) -> VmResult<Self> {
        if header.len() > size {
            return Err(VmError::HeaderTooLarge { header: header.len(), size });
        }
        let mut memory = Memory::new(size)?;
        memory.cells[..header.len()].copy_from_slice(header);
        debug!(header = header.len(), size, "memory initialised from header");
        Ok(memory)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn index(&self, addr: Word) -> VmResult<usize> {
        usize::try_from(addr)
            .ok()
            .filter(|&i| i < self.cells.len())
            .ok_or(VmError::OutOfBounds { index: addr, size: self.cells.len() })
    }

    #[inline]
    pub fn get(&self, addr: Word) -> VmResult<Word> {
        let i = self.index(addr)?;
        Ok(self.cells[i])
    }

    #[inline]
    pub fn set(&mut self, addr: Word, value: Word) -> VmResult<()> {
        let i = self.index(addr)?;
        self.cells[i] = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.cells
    }
}

impl From<Vec<Word>> for Memory {
    fn from(cells: Vec<Word>) -> Self {
        Memory { cells }
    }
}
