//! The memory tape: bounded on the left, growing on demand to the right.

use crate::error::TapeError;

/// Value stored in one tape cell.
pub type Cell = i64;

/// Numeric policy applied to cell arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellMode {
    /// Plain integers. Leaving the `i64` range is an error, never a silent wrap.
    #[default]
    Unbounded,
    /// Canonical byte cells: every stored value is reduced modulo 256.
    Wrapping,
}

impl CellMode {
    fn normalize(self, value: Cell) -> Cell {
        match self {
            CellMode::Unbounded => value,
            CellMode::Wrapping => value.rem_euclid(256),
        }
    }
}

/// A record tape for a Turing-style machine.
///
/// Invariant: `pointer < cells.len()`, and `cells` never shrinks except
/// through [`Tape::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<Cell>,
    pointer: usize,
    mode: CellMode,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    /// A tape with a single zero cell and unbounded cells.
    pub fn new() -> Self {
        Self::with_mode(CellMode::Unbounded)
    }

    pub fn with_mode(mode: CellMode) -> Self {
        Self {
            cells: vec![0],
            pointer: 0,
            mode,
        }
    }

    pub fn mode(&self) -> CellMode {
        self.mode
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Every cell touched so far, leftmost first.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn increment_cell(&mut self) -> Result<(), TapeError> {
        self.add(1)
    }

    pub fn decrement_cell(&mut self) -> Result<(), TapeError> {
        self.add(-1)
    }

    fn add(&mut self, delta: Cell) -> Result<(), TapeError> {
        let pointer = self.pointer;
        let cell = &mut self.cells[pointer];
        *cell = match self.mode {
            CellMode::Unbounded => cell
                .checked_add(delta)
                .ok_or(TapeError::CellOverflow { pointer })?,
            CellMode::Wrapping => (*cell + delta).rem_euclid(256),
        };
        Ok(())
    }

    /// Advance the cursor, appending a zero cell when it walks off the end.
    pub fn move_right(&mut self) {
        self.pointer += 1;
        if self.pointer == self.cells.len() {
            self.cells.push(0);
        }
    }

    /// Step the cursor left. The left boundary is absolute: cell 0 never clamps or wraps.
    pub fn move_left(&mut self) -> Result<(), TapeError> {
        if self.pointer == 0 {
            return Err(TapeError::Underflow);
        }
        self.pointer -= 1;
        Ok(())
    }

    pub fn read_cell(&self) -> Cell {
        self.cells[self.pointer]
    }

    /// Overwrite the current cell, applying the tape's numeric policy.
    pub fn write_cell(&mut self, value: Cell) {
        self.cells[self.pointer] = self.mode.normalize(value);
    }

    /// Return to the freshly-built state: one zero cell, cursor at 0.
    /// The numeric policy is kept.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.cells.push(0);
        self.pointer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tape_has_single_zero_cell() {
        let tape = Tape::new();
        assert_eq!(tape.cells(), &[0]);
        assert_eq!(tape.pointer(), 0);
        assert_eq!(tape.read_cell(), 0);
    }

    #[test]
    fn increments_then_decrements_round_trip() {
        let mut tape = Tape::new();
        tape.write_cell(7);
        for _ in 0..300 {
            tape.increment_cell().unwrap();
        }
        for _ in 0..300 {
            tape.decrement_cell().unwrap();
        }
        assert_eq!(tape.read_cell(), 7);
    }

    #[test]
    fn unbounded_cells_go_negative_and_past_255() {
        let mut tape = Tape::new();
        tape.decrement_cell().unwrap();
        assert_eq!(tape.read_cell(), -1);
        tape.write_cell(255);
        tape.increment_cell().unwrap();
        assert_eq!(tape.read_cell(), 256);
    }

    #[test]
    fn unbounded_overflow_is_reported() {
        let mut tape = Tape::new();
        tape.write_cell(Cell::MAX);
        assert_eq!(
            tape.increment_cell(),
            Err(TapeError::CellOverflow { pointer: 0 })
        );
        assert_eq!(tape.read_cell(), Cell::MAX);
    }

    #[test]
    fn wrapping_subtraction() {
        let mut tape = Tape::with_mode(CellMode::Wrapping);
        tape.decrement_cell().unwrap();
        assert_eq!(tape.read_cell(), 255);
    }

    #[test]
    fn wrapping_addition() {
        let mut tape = Tape::with_mode(CellMode::Wrapping);
        for _ in 0..256 {
            tape.increment_cell().unwrap();
        }
        assert_eq!(tape.read_cell(), 0);
    }

    #[test]
    fn wrapping_write_is_reduced_modulo_256() {
        let mut tape = Tape::with_mode(CellMode::Wrapping);
        tape.write_cell(-1);
        assert_eq!(tape.read_cell(), 255);
        tape.write_cell(300);
        assert_eq!(tape.read_cell(), 44);
    }

    #[test]
    fn move_right_grows_and_move_left_never_shrinks() {
        let mut tape = Tape::new();
        tape.move_right();
        assert_eq!(tape.pointer(), 1);
        assert_eq!(tape.cells().len(), 2);
        tape.move_left().unwrap();
        assert_eq!(tape.pointer(), 0);
        assert_eq!(tape.cells().len(), 2);
        // Revisiting an existing cell does not append another one.
        tape.move_right();
        assert_eq!(tape.cells().len(), 2);
    }

    #[test]
    fn move_left_at_origin_fails_without_wrapping() {
        let mut tape = Tape::new();
        tape.move_right();
        tape.move_right();
        tape.move_left().unwrap();
        tape.move_left().unwrap();
        assert_eq!(tape.move_left(), Err(TapeError::Underflow));
        assert_eq!(tape.pointer(), 0);
        assert_eq!(tape.cells().len(), 3);
    }

    #[test]
    fn reset_restores_initial_state_and_keeps_mode() {
        let mut tape = Tape::with_mode(CellMode::Wrapping);
        tape.increment_cell().unwrap();
        tape.move_right();
        tape.write_cell(42);
        tape.reset();
        assert_eq!(tape.cells(), &[0]);
        assert_eq!(tape.pointer(), 0);
        assert_eq!(tape.mode(), CellMode::Wrapping);
    }
}
