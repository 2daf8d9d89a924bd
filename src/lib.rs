//! A Brainfuck interpreter built around an unbounded tape.
//!
//! The crate separates the memory model from execution:
//! - [`Tape`]: cells growing on demand to the right, an absolute left edge at
//!   cell 0, and a configurable numeric policy ([`CellMode`]).
//! - [`Engine`]: borrows a tape, walks the program with an instruction pointer
//!   and resolves loops at run time with a loop stack.
//!
//! Features and behaviors:
//! - Any character outside `><+-.,[]` is a comment and is skipped.
//! - Cells are unbounded integers by default; [`CellMode::Wrapping`] gives
//!   canonical byte cells.
//! - Input `,` reads one character from an [`InputSource`]; on exhaustion, or with
//!   no source at all, the current cell is set to the configured sentinel.
//! - Output `.` writes the current cell as a Unicode character to an [`OutputSink`]
//!   (stdout when none is given).
//! - Loops are matched lazily: a stray `]` fails when it executes, not up front.
//! - Debug mode delivers a [`TraceRecord`] per instruction to a [`TraceSink`].
//!
//! Quick start:
//!
//! ```no_run
//! use bf_tape::{Engine, EngineConfig, Tape};
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let mut tape = Tape::new();
//! let mut out: Vec<u8> = Vec::new();
//! Engine::new(&mut tape, code, EngineConfig::default())
//!     .with_output(&mut out)
//!     .run()
//!     .expect("program should run");
//! assert_eq!(out, b"Hello World!\n");
//! ```

pub mod cli_util;
pub mod config;
pub mod engine;
pub mod error;
pub mod instruction;
pub mod io;
pub mod logging;
pub mod tape;
pub mod trace;

pub use engine::{Engine, EngineConfig, RunControl};
pub use error::{EngineError, TapeError};
pub use instruction::Instruction;
pub use io::{CharReader, InputSource, OutputSink, SeekableCharReader, StrInput};
pub use tape::{Cell, CellMode, Tape};
pub use trace::{TraceRecord, TraceSink, TraceTable};
