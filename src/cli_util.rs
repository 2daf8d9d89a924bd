use std::io::{self, Write};

use crate::EngineError;

/// Pretty-print an [`EngineError`] with caret positioning under the offending instruction.
/// If `program` is `Some("bf")`, prefix messages with "bf: ...".
pub fn print_engine_error(program: Option<&str>, code: &str, err: &EngineError) {
    let mut stderr = io::stderr().lock();
    let _ = write_engine_error(&mut stderr, program, code, err);
    let _ = stderr.flush();
}

/// Render an [`EngineError`] into `out`; see [`print_engine_error`].
pub fn write_engine_error<W: Write>(
    out: &mut W,
    program: Option<&str>,
    code: &str,
    err: &EngineError,
) -> io::Result<()> {
    let prefix_program = |msg: &str| match program {
        Some(p) => format!("{p}: {msg}"),
        None => msg.to_string(),
    };

    let msg = match err {
        EngineError::TapeUnderflow { .. } => {
            "Runtime error: tape underflow (cannot move left of cell 0)".to_string()
        }
        EngineError::UnbalancedLoop { .. } => "Runtime error: unmatched ']'".to_string(),
        EngineError::MalformedLoop { .. } => {
            "Runtime error: no matching ']' for '['".to_string()
        }
        EngineError::CellOverflow { pointer, .. } => {
            format!("Runtime error: cell overflow (ptr={pointer})")
        }
        EngineError::InvalidOutput { value, .. } => {
            format!("Runtime error: {value} is not a printable character code")
        }
        EngineError::Io { source, .. } => format!("I/O error: {source}"),
        EngineError::StepLimitExceeded { .. } | EngineError::Canceled => {
            return writeln!(out, "{}", prefix_program(&err.to_string()));
        }
    };

    match err.ip() {
        Some(ip) => write_error_with_context(out, &prefix_program(&msg), code, ip),
        None => writeln!(out, "{}", prefix_program(&msg)),
    }
}

/// Write a concise error with instruction index and a caret context window,
/// working with UTF-8 by slicing using char indices.
pub fn write_error_with_context<W: Write>(
    out: &mut W,
    prefix: &str,
    code: &str,
    pos: usize,
) -> io::Result<()> {
    writeln!(out, "{prefix} at instruction {pos}")?;

    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let start_byte = char_to_byte_index(code, start_char);
    let end_byte = char_to_byte_index(code, end_char);
    // Newlines in the window would break the caret alignment.
    let slice: String = code[start_byte..end_byte]
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    writeln!(out, "  {slice}")?;

    // Caret under the exact position
    let caret_offset_chars = pos.saturating_sub(start_char);
    writeln!(out, "  {}^", " ".repeat(caret_offset_chars))
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map_or(s.len(), |(byte_idx, _)| byte_idx)
}
