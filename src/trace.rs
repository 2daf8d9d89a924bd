//! Debug tracing: one record per executed instruction, delivered to a diagnostic sink.

use std::io::{self, Write};

use nu_ansi_term::Style;

use crate::config::TraceColors;
use crate::tape::Cell;

/// Snapshot taken right after an instruction ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// Zero-based count of instructions executed in this run.
    pub step: usize,
    /// Index of the instruction that just ran.
    pub ip: usize,
    pub symbol: char,
    /// Tape cursor after the instruction.
    pub pointer: usize,
    /// Current cell value after the instruction.
    pub cell: Cell,
    /// Units consumed from the input source, when it keeps track.
    pub input_position: Option<u64>,
}

/// Receiver of trace records. Never consulted by program logic.
pub trait TraceSink {
    fn record(&mut self, record: &TraceRecord) -> io::Result<()>;
}

impl TraceSink for Vec<TraceRecord> {
    fn record(&mut self, record: &TraceRecord) -> io::Result<()> {
        self.push(*record);
        Ok(())
    }
}

/// Renders records as an aligned table, header first.
///
/// ```text
/// STEP | IP  | INSTR | PTR | CELL | INPUT
/// -----+-----+-------+-----+------+------
/// 0    | 0   |  +    | 0   | 1    | -
/// ```
pub struct TraceTable<W> {
    out: W,
    colors: Option<TraceColors>,
    header_written: bool,
}

impl<W: Write> TraceTable<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            colors: None,
            header_written: false,
        }
    }

    /// Colourise the header, instruction symbol and cell value.
    pub fn with_colors(mut self, colors: TraceColors) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: String, pick: fn(&TraceColors) -> Style) -> String {
        match self.colors.as_ref() {
            Some(colors) => pick(colors).paint(text).to_string(),
            None => text,
        }
    }

    fn write_header(&mut self) -> io::Result<()> {
        let header = self.paint("STEP | IP  | INSTR | PTR | CELL | INPUT".to_string(), |c| c.header);
        writeln!(self.out, "{header}")?;
        writeln!(self.out, "-----+-----+-------+-----+------+------")?;
        self.header_written = true;
        Ok(())
    }
}

impl<W: Write> TraceSink for TraceTable<W> {
    fn record(&mut self, record: &TraceRecord) -> io::Result<()> {
        if !self.header_written {
            self.write_header()?;
        }
        let symbol = self.paint(record.symbol.escape_debug().to_string(), |c| c.symbol);
        let cell = self.paint(format!("{:<4}", record.cell), |c| c.cell);
        let input = record
            .input_position
            .map_or_else(|| "-".to_string(), |pos| pos.to_string());
        writeln!(
            self.out,
            "{:<4} | {:<3} |  {}    | {:<3} | {} | {}",
            record.step, record.ip, symbol, record.pointer, cell, input
        )?;
        self.out.flush()
    }
}
