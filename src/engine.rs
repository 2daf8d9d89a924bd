//! Instruction dispatch and loop handling over a borrowed [`Tape`].

use std::io;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::EngineError;
use crate::instruction::Instruction;
use crate::io::{InputSource, OutputSink};
use crate::tape::{Cell, Tape};
use crate::trace::{TraceRecord, TraceSink, TraceTable};

/// Options fixed when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Track bracket depth when skipping a loop. When off, a skipped `[`
    /// jumps past the first `]` after it, which mis-skips nested loop bodies.
    pub nested_loops: bool,
    /// Value stored by `,` when the input is exhausted or absent.
    pub eof_sentinel: Cell,
    /// Emit a [`TraceRecord`] after every instruction.
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nested_loops: true,
            eof_sentinel: 0,
            debug: false,
        }
    }
}

/// Controls for cooperative cancellation and step limiting.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self {
            max_steps,
            cancel_flag,
        }
    }
}

/// Executes a program against a tape owned by the caller.
///
/// Input, output and trace collaborators are optional and borrowed:
/// - without an input source every `,` stores the end-of-input sentinel,
/// - without an output sink `.` writes to stdout,
/// - without a trace sink debug mode writes a [`TraceTable`] to stderr.
pub struct Engine<'a> {
    tape: &'a mut Tape,
    program: Vec<char>,
    ip: usize,
    loop_stack: Vec<usize>,
    config: EngineConfig,
    input: Option<&'a mut dyn InputSource>,
    output: Option<&'a mut dyn OutputSink>,
    trace: Option<&'a mut dyn TraceSink>,
    trace_delay: Option<Duration>,
    steps: usize,
}

impl<'a> Engine<'a> {
    pub fn new(tape: &'a mut Tape, program: &str, config: EngineConfig) -> Self {
        Self {
            tape,
            program: program.chars().collect(),
            ip: 0,
            loop_stack: Vec::new(),
            config,
            input: None,
            output: None,
            trace: None,
            trace_delay: None,
            steps: 0,
        }
    }

    pub fn with_input(mut self, input: &'a mut dyn InputSource) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_output(mut self, output: &'a mut dyn OutputSink) -> Self {
        self.output = Some(output);
        self
    }

    /// Diagnostic sink used when debug mode is on.
    pub fn with_trace(mut self, trace: &'a mut dyn TraceSink) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Pause after each traced instruction so a human can follow along.
    /// Has no effect unless debug mode is on.
    pub fn with_trace_delay(mut self, delay: Duration) -> Self {
        self.trace_delay = Some(delay).filter(|d| !d.is_zero());
        self
    }

    pub fn tape(&self) -> &Tape {
        &*self.tape
    }

    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    /// Positions of the currently open `[`, innermost last.
    pub fn loop_stack(&self) -> &[usize] {
        &self.loop_stack
    }

    pub fn is_finished(&self) -> bool {
        self.ip >= self.program.len()
    }

    /// Execute until the instruction pointer reaches the end of the program.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.execute(None)
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control(&mut self, control: &RunControl) -> Result<(), EngineError> {
        self.execute(Some(control))
    }

    fn execute(&mut self, control: Option<&RunControl>) -> Result<(), EngineError> {
        debug!(
            len = self.program.len(),
            nested_loops = self.config.nested_loops,
            "run started"
        );

        // Output written before a failure still reaches the sink.
        let result = self.run_loop(control);
        let flushed = self.flush_output();
        result?;
        flushed?;

        debug!(steps = self.steps, cells = self.tape.cells().len(), "run finished");
        Ok(())
    }

    fn run_loop(&mut self, control: Option<&RunControl>) -> Result<(), EngineError> {
        let mut stderr_table = None;

        while !self.is_finished() {
            if let Some(ctrl) = control {
                if ctrl.cancel_flag.load(Ordering::Relaxed) {
                    return Err(EngineError::Canceled);
                }
                if let Some(max) = ctrl.max_steps {
                    if self.steps >= max {
                        return Err(EngineError::StepLimitExceeded { limit: max });
                    }
                }
            }

            let ip = self.ip;
            let symbol = self.program[ip];
            self.step()?;

            if self.config.debug {
                let record = TraceRecord {
                    step: self.steps,
                    ip,
                    symbol,
                    pointer: self.tape.pointer(),
                    cell: self.tape.read_cell(),
                    input_position: self.input.as_ref().and_then(|input| input.position()),
                };
                let sink: &mut dyn TraceSink = match self.trace.as_mut() {
                    Some(sink) => &mut **sink,
                    None => stderr_table.get_or_insert_with(|| TraceTable::new(io::stderr())),
                };
                sink.record(&record)
                    .map_err(|source| EngineError::Io { ip, source })?;
                if let Some(delay) = self.trace_delay {
                    thread::sleep(delay);
                }
            }
            self.steps += 1;
        }
        Ok(())
    }

    /// Execute the instruction under the instruction pointer.
    ///
    /// Comments only advance the pointer. Errors leave the pointer on the
    /// faulting instruction and the tape untouched by it.
    pub fn step(&mut self) -> Result<(), EngineError> {
        let ip = self.ip;
        let Some(&symbol) = self.program.get(ip) else {
            return Ok(());
        };
        let Some(instr) = Instruction::decode(symbol) else {
            self.ip += 1;
            return Ok(());
        };

        match instr {
            Instruction::Increment => self
                .tape
                .increment_cell()
                .map_err(|e| EngineError::from_tape(ip, e))?,
            Instruction::Decrement => self
                .tape
                .decrement_cell()
                .map_err(|e| EngineError::from_tape(ip, e))?,
            Instruction::MoveRight => self.tape.move_right(),
            Instruction::MoveLeft => self
                .tape
                .move_left()
                .map_err(|e| EngineError::from_tape(ip, e))?,
            Instruction::Output => {
                let value = self.tape.read_cell();
                let ch = u32::try_from(value)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(EngineError::InvalidOutput { ip, value })?;
                self.write_char(ch)
                    .map_err(|source| EngineError::Io { ip, source })?;
            }
            Instruction::Input => {
                let unit = match self.input.as_mut() {
                    Some(input) => input
                        .next_unit()
                        .map_err(|source| EngineError::Io { ip, source })?,
                    None => None,
                };
                self.tape.write_cell(unit.unwrap_or(self.config.eof_sentinel));
            }
            Instruction::LoopStart => {
                if self.tape.read_cell() == 0 {
                    self.ip = self.skip_loop()?;
                    trace!(from = ip, to = self.ip, "skipped loop body");
                    return Ok(());
                }
                self.loop_stack.push(ip);
            }
            Instruction::LoopEnd => {
                let Some(start) = self.loop_stack.pop() else {
                    return Err(EngineError::UnbalancedLoop { ip });
                };
                if self.tape.read_cell() != 0 {
                    // Re-evaluating the `[` pushes the start again.
                    self.ip = start;
                    trace!(from = ip, to = start, "loop repeats");
                    return Ok(());
                }
            }
        }

        self.ip += 1;
        Ok(())
    }

    /// Position just past the `]` that closes the `[` at the instruction pointer.
    fn skip_loop(&self) -> Result<usize, EngineError> {
        let start = self.ip;
        let body = self.program.iter().enumerate().skip(start + 1);

        if !self.config.nested_loops {
            return body
                .map(|(i, &c)| (i, c))
                .find(|&(_, c)| c == ']')
                .map(|(i, _)| i + 1)
                .ok_or(EngineError::MalformedLoop { ip: start });
        }

        let mut depth = 1usize;
        for (i, &c) in body {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i + 1);
                    }
                }
                _ => {}
            }
        }
        Err(EngineError::MalformedLoop { ip: start })
    }

    fn write_char(&mut self, ch: char) -> io::Result<()> {
        match self.output.as_mut() {
            Some(out) => out.put_char(ch),
            None => io::stdout().lock().put_char(ch),
        }
    }

    fn flush_output(&mut self) -> Result<(), EngineError> {
        let ip = self.ip;
        let flushed = match self.output.as_mut() {
            Some(out) => out.flush(),
            None => OutputSink::flush(&mut io::stdout().lock()),
        };
        flushed.map_err(|source| EngineError::Io { ip, source })
    }

    /// Return tape and instruction pointer to their initial state and rewind
    /// the input source when it supports it. Configuration and collaborators are kept.
    ///
    /// The input is rewound first; if that fails nothing else is touched.
    pub fn reset(&mut self) -> io::Result<()> {
        let rewound = match self.input.as_mut() {
            Some(input) => input.rewind()?,
            None => false,
        };
        self.tape.reset();
        self.ip = 0;
        self.loop_stack.clear();
        self.steps = 0;
        debug!(rewound, "engine reset");
        Ok(())
    }
}
