//! Lollipop: a sixteen-instruction machine over a flat array of 64-bit words.
//!
//! Programs are written as text ([`asm`]), stored as a compact binary image
//! ([`bytecode`]) and executed by the [`vm::Engine`], which can suspend on
//! INPUT and resume once the host supplies a value.
//!
//! ```
//! use lollipop::{asm, vm::{Engine, EndReason}};
//!
//! let image = asm::assemble("header {\n  2\n  3\n}\nADD 0 1\n").unwrap();
//! let memory = image.memory(2).unwrap();
//! let mut engine = Engine::new(&image.program, memory);
//! assert_eq!(engine.run(), EndReason::Natural);
//! assert_eq!(engine.memory().get(0), Ok(5));
//! ```

pub mod asm;
pub mod bytecode;
pub mod diagnostic;
pub mod isa;
pub mod lexer;
pub mod vm;
