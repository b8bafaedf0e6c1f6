//! Fetch-decode-execute engine.
//!
//! The program counter (`line`) is a 0-based index into the [`Program`].
//! GOTO targets are 1-based line numbers: line `L` is index `L - 1`, and a
//! chain that resolves to 0 ends the run. Falling off the end of the program
//! is a natural end too, leaving `line == program.len()`.

use tracing::{debug, error, trace};

use crate::isa::{Program, Word};

pub mod memory;
pub mod ops;

pub use memory::Memory;
pub use ops::Flow;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error("index {index} is out of bounds: 0 to {size} (inclusive to exclusive)")]
    OutOfBounds { index: Word, size: usize },
    #[error("division by zero: mem[{operand}] is 0 (target mem[{target}] left unchanged)")]
    DivisionByZero { target: Word, operand: Word },
    #[error("the memory size ({size}) isn't large enough to hold the header ({header} words)")]
    HeaderTooLarge { header: usize, size: usize },
    #[error("the engine is not waiting for input")]
    NotSuspended,
    #[error("cannot allocate {size} words of memory")]
    MemoryTooLarge { size: usize },
}

impl VmError {
    pub fn code(&self) -> &'static str {
        match self {
            VmError::OutOfBounds { .. } => "LP-R001",
            VmError::DivisionByZero { .. } => "LP-R002",
            VmError::HeaderTooLarge { .. } => "LP-R003",
            VmError::NotSuspended => "LP-R004",
            VmError::MemoryTooLarge { .. } => "LP-R005",
        }
    }
}

pub type VmResult<T> = Result<T, VmError>;

/// Run status. `Null` means still running; the rest end a `run()`, `Input`
/// only until a value is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndReason {
    Null,
    Natural,
    Input,
    Error,
}

impl EndReason {
    pub fn is_running(self) -> bool {
        self == EndReason::Null
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EndReason::Null => "running",
            EndReason::Natural => "finished",
            EndReason::Input => "waiting for input",
            EndReason::Error => "crashed",
        };
        f.write_str(s)
    }
}

pub struct Engine<'p> {
    program: &'p Program,
    memory: Memory,
    line: Word,
    status: EndReason,
    pending_input: Option<Word>,
    fault: Option<VmError>,
    steps: u64,
}

impl<'p> Engine<'p> {
    pub fn new(program: &'p Program, memory: Memory) -> Self {
        Engine {
            program,
            memory,
            line: 0,
            status: EndReason::Null,
            pending_input: None,
            fault: None,
            steps: 0,
        }
    }

    pub fn status(&self) -> EndReason {
        self.status
    }

    /// 0-based index of the next instruction.
    pub fn line(&self) -> Word {
        self.line
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Hosts may poke memory between steps.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn into_memory(self) -> Memory {
        self.memory
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// The fault that put the engine into `Error`.
    pub fn fault(&self) -> Option<&VmError> {
        self.fault.as_ref()
    }

    /// Address the pending INPUT will write to.
    pub fn pending_input(&self) -> Option<Word> {
        self.pending_input
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn current_index(&self) -> Option<usize> {
        usize::try_from(self.line).ok().filter(|&i| i < self.program.len())
    }

    fn crash(&mut self, e: VmError) -> EndReason {
        error!(line = self.line, "{}", e);
        self.fault = Some(e);
        self.status = EndReason::Error;
        self.status
    }

    /// Execute one instruction. Does nothing unless the engine is running.
    pub fn step(&mut self) -> EndReason {
        if !self.status.is_running() {
            return self.status;
        }
        let Some(index) = self.current_index() else {
            debug!(line = self.line, "ran past the last line");
            self.status = EndReason::Natural;
            return self.status;
        };
        let ins = self.program.instructions()[index];
        trace!(line = self.line, %ins, "step");
        self.steps += 1;

        match ops::execute(&ins, &mut self.memory) {
            Ok(Flow::Next) => self.line += 1,
            Ok(Flow::Jump(target)) => {
                debug!(from = self.line, to = target, "goto");
                self.line = target - 1;
            }
            Ok(Flow::Halt) => {
                debug!(line = self.line, "goto chain resolved to 0");
                self.line += 1;
                self.status = EndReason::Natural;
            }
            Ok(Flow::Suspend(target)) => {
                debug!(line = self.line, target, "waiting for input");
                self.pending_input = Some(target);
                self.status = EndReason::Input;
            }
            Err(e) => return self.crash(e),
        }
        self.status
    }

    /// Finish a suspended INPUT by writing `value` and moving past it.
    pub fn supply_input(&mut self, value: Word) -> VmResult<EndReason> {
        let target = match (self.status, self.pending_input) {
            (EndReason::Input, Some(target)) => target,
            _ => return Err(VmError::NotSuspended),
        };
        self.pending_input = None;
        if let Err(e) = self.memory.set(target, value) {
            return Ok(self.crash(e));
        }
        self.line += 1;
        self.status = if self.current_index().is_some() {
            EndReason::Null
        } else {
            EndReason::Natural
        };
        Ok(self.status)
    }

    /// Step until the engine stops running.
    pub fn run(&mut self) -> EndReason {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), calling `on_step` after every step.
    pub fn run_with(&mut self, mut on_step: impl FnMut(&Engine<'p>)) -> EndReason {
        while self.status.is_running() {
            self.step();
            on_step(self);
        }
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::{Instruction, Opcode};

    fn ins(op: Opcode, a: Word, b: Word) -> Instruction {
        Instruction::new(op, [a, b])
    }

    #[test]
    fn falls_off_the_end_after_every_line() {
        let prog = Program::new(vec![
            ins(Opcode::Add, 0, 1),
            ins(Opcode::Add, 0, 1),
            ins(Opcode::Add, 0, 1),
        ]);
        let mut vm = Engine::new(&prog, Memory::from(vec![0, 2]));
        let mut observed = 0;
        let status = vm.run_with(|_| observed += 1);
        assert_eq!(status, EndReason::Natural);
        assert_eq!(vm.steps(), 3);
        assert_eq!(vm.line(), 3);
        assert_eq!(vm.memory().get(0), Ok(6));
        // three executing steps plus the one that notices the end
        assert_eq!(observed, 4);
    }

    #[test]
    fn empty_program_ends_immediately() {
        let prog = Program::default();
        let mut vm = Engine::new(&prog, Memory::new(1).unwrap());
        assert_eq!(vm.run(), EndReason::Natural);
        assert_eq!(vm.steps(), 0);
    }

    #[test]
    fn goto_lands_on_one_based_line() {
        // line 1: GOTO 0 0   (mem[0] = 3 -> line 3)
        // line 2: NOT 1      (skipped)
        // line 3: NOT 2
        let prog = Program::new(vec![
            ins(Opcode::Goto, 0, 0),
            ins(Opcode::Not, 1, 0),
            ins(Opcode::Not, 2, 0),
        ]);
        let mut vm = Engine::new(&prog, Memory::from(vec![3, 0, 0]));
        assert_eq!(vm.step(), EndReason::Null);
        assert_eq!(vm.line(), 2);
        assert_eq!(vm.run(), EndReason::Natural);
        assert_eq!(vm.memory().as_slice(), &[3, 0, Word::MAX]);
    }

    #[test]
    fn goto_chain_with_hops() {
        // mem[0] = 5, mem[5] = 9, mem[9] = 0
        let mut cells = vec![0; 10];
        cells[0] = 5;
        cells[5] = 9;

        let prog = Program::new(vec![ins(Opcode::Goto, 1, 0)]);
        let mut vm = Engine::new(&prog, Memory::from(cells.clone()));
        vm.step();
        assert_eq!(vm.status(), EndReason::Null);
        assert_eq!(vm.line(), 8, "next executed line is 9");

        let prog = Program::new(vec![ins(Opcode::Goto, 2, 0)]);
        let mut vm = Engine::new(&prog, Memory::from(cells));
        assert_eq!(vm.step(), EndReason::Natural);
    }

    #[test]
    fn goto_loop_counts_down() {
        // mem: [counter=3, one=1, back=1, acc=0, tmp=0, zero=0]
        // line 1: ADD 3 1        acc += 1
        // line 2: SUB 0 1        counter -= 1
        // line 3: COPY 0 4       tmp = counter
        // line 4: EQU 4 5        tmp = counter == 0 ? !0 : 0
        // line 5: NOT 4          tmp = counter != 0 ? !0 : 0
        // line 6: AND 4 2        tmp = counter != 0 ? back : 0
        // line 7: GOTO 0 4
        let prog = Program::new(vec![
            ins(Opcode::Add, 3, 1),
            ins(Opcode::Sub, 0, 1),
            ins(Opcode::Copy, 0, 4),
            ins(Opcode::Equ, 4, 5),
            ins(Opcode::Not, 4, 0),
            ins(Opcode::And, 4, 2),
            ins(Opcode::Goto, 0, 4),
        ]);
        let mut vm = Engine::new(&prog, Memory::from(vec![3, 1, 1, 0, 0, 0]));
        assert_eq!(vm.run(), EndReason::Natural);
        assert_eq!(vm.memory().get(3), Ok(3));
        assert_eq!(vm.steps(), 21);
    }

    #[test]
    fn division_by_zero_crashes_and_reports() {
        let prog = Program::new(vec![ins(Opcode::Div, 0, 1), ins(Opcode::Not, 0, 0)]);
        let mut vm = Engine::new(&prog, Memory::from(vec![10, 0]));
        assert_eq!(vm.run(), EndReason::Error);
        assert_eq!(vm.memory().get(0), Ok(10));
        assert_eq!(vm.line(), 0);
        assert!(matches!(vm.fault(), Some(VmError::DivisionByZero { .. })));
        assert!(vm.fault().unwrap().to_string().contains("division by zero"));
    }

    #[test]
    fn out_of_bounds_crashes() {
        let prog = Program::new(vec![ins(Opcode::Copy, 0, 5)]);
        let mut vm = Engine::new(&prog, Memory::new(2).unwrap());
        assert_eq!(vm.run(), EndReason::Error);
        assert_eq!(vm.fault(), Some(&VmError::OutOfBounds { index: 5, size: 2 }));
    }

    #[test]
    fn stopped_engine_does_not_step() {
        let prog = Program::new(vec![ins(Opcode::Div, 0, 1)]);
        let mut vm = Engine::new(&prog, Memory::from(vec![1, 0]));
        vm.run();
        let steps = vm.steps();
        assert_eq!(vm.step(), EndReason::Error);
        assert_eq!(vm.steps(), steps);
    }

    #[test]
    fn input_suspends_then_resumes() {
        let prog = Program::new(vec![ins(Opcode::Input, 1, 0), ins(Opcode::Add, 0, 1)]);
        let mut vm = Engine::new(&prog, Memory::from(vec![5, 0]));
        assert_eq!(vm.run(), EndReason::Input);
        assert_eq!(vm.memory().get(1), Ok(0));
        assert_eq!(vm.pending_input(), Some(1));
        assert_eq!(vm.line(), 0);

        assert_eq!(vm.supply_input(7), Ok(EndReason::Null));
        assert_eq!(vm.memory().get(1), Ok(7));
        assert_eq!(vm.line(), 1);
        assert_eq!(vm.run(), EndReason::Natural);
        assert_eq!(vm.memory().get(0), Ok(12));
    }

    #[test]
    fn input_on_last_line_finishes() {
        let prog = Program::new(vec![ins(Opcode::Input, 0, 0)]);
        let mut vm = Engine::new(&prog, Memory::new(1).unwrap());
        assert_eq!(vm.run(), EndReason::Input);
        assert_eq!(vm.supply_input(3), Ok(EndReason::Natural));
        assert_eq!(vm.memory().get(0), Ok(3));
    }

    #[test]
    fn input_to_bad_address_crashes_on_write() {
        let prog = Program::new(vec![ins(Opcode::Input, 4, 0)]);
        let mut vm = Engine::new(&prog, Memory::new(1).unwrap());
        assert_eq!(vm.run(), EndReason::Input);
        assert_eq!(vm.supply_input(3), Ok(EndReason::Error));
        assert_eq!(vm.fault(), Some(&VmError::OutOfBounds { index: 4, size: 1 }));
    }

    #[test]
    fn supply_without_suspension_is_rejected() {
        let prog = Program::new(vec![ins(Opcode::Not, 0, 0)]);
        let mut vm = Engine::new(&prog, Memory::new(1).unwrap());
        assert_eq!(vm.supply_input(1), Err(VmError::NotSuspended));
        vm.run();
        assert_eq!(vm.supply_input(1), Err(VmError::NotSuspended));
    }

    #[test]
    fn host_pokes_memory_between_steps() {
        let prog = Program::new(vec![ins(Opcode::Add, 0, 1), ins(Opcode::Add, 0, 1)]);
        let mut vm = Engine::new(&prog, Memory::from(vec![0, 1]));
        assert_eq!(vm.step(), EndReason::Null);
        assert_eq!(vm.memory_mut().set(1, 10), Ok(()));
        assert_eq!(vm.run(), EndReason::Natural);
        assert_eq!(vm.program().len(), 2);
        assert_eq!(vm.into_memory().as_slice(), &[11, 10]);
    }

    #[test]
    fn observer_sees_every_step() {
        let prog = Program::new(vec![ins(Opcode::Add, 0, 1), ins(Opcode::Add, 0, 1)]);
        let mut vm = Engine::new(&prog, Memory::from(vec![0, 1]));
        let mut seen = Vec::new();
        vm.run_with(|e| seen.push((e.memory().as_slice()[0], e.line())));
        assert_eq!(seen, vec![(1, 1), (2, 2), (2, 2)]);
    }
}
