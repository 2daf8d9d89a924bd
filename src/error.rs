use crate::tape::Cell;

/// Failures reported by [`Tape`](crate::Tape) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TapeError {
    /// The cursor attempted to move left of cell 0.
    #[error("cannot move past the start of the tape")]
    Underflow,

    /// An unbounded cell left the representable range.
    #[error("cell {pointer} overflowed")]
    CellOverflow { pointer: usize },
}

/// Errors that stop a program run.
///
/// Every runtime error carries the instruction index `ip` it was raised at so
/// that callers can point at the offending character in the source.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `<` executed while the cursor was on cell 0.
    #[error("Tape underflow at instruction {ip}: cannot move left of cell 0")]
    TapeUnderflow { ip: usize },

    /// `]` executed with no open loop on the loop stack.
    #[error("Unbalanced loop at instruction {ip}: ']' has no matching '['")]
    UnbalancedLoop { ip: usize },

    /// The search for a loop's closing bracket ran off the end of the program.
    #[error("Malformed loop at instruction {ip}: no matching ']' before end of program")]
    MalformedLoop { ip: usize },

    /// An unbounded cell left the `i64` range.
    #[error("Cell overflow at instruction {ip} (ptr={pointer})")]
    CellOverflow { ip: usize, pointer: usize },

    /// `.` on a value that is not a Unicode scalar value.
    #[error("Invalid output at instruction {ip}: {value} is not a character code point")]
    InvalidOutput { ip: usize, value: Cell },

    /// The input source or output sink failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: std::io::Error,
    },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g., timeout or Ctrl+C)
    #[error("Execution aborted: cancelled")]
    Canceled,
}

impl EngineError {
    /// Attach the instruction index to an error raised by the tape.
    pub(crate) fn from_tape(ip: usize, err: TapeError) -> Self {
        match err {
            TapeError::Underflow => EngineError::TapeUnderflow { ip },
            TapeError::CellOverflow { pointer } => EngineError::CellOverflow { ip, pointer },
        }
    }

    /// Instruction index the error was raised at, if it is tied to one.
    pub fn ip(&self) -> Option<usize> {
        match self {
            EngineError::TapeUnderflow { ip }
            | EngineError::UnbalancedLoop { ip }
            | EngineError::MalformedLoop { ip }
            | EngineError::CellOverflow { ip, .. }
            | EngineError::InvalidOutput { ip, .. }
            | EngineError::Io { ip, .. } => Some(*ip),
            EngineError::StepLimitExceeded { .. } | EngineError::Canceled => None,
        }
    }
}
