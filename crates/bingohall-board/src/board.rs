//! Board construction, cell toggling and win evaluation.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{BoardError, Vocabulary};

/// Label of the pre-checked centre cell.
pub const FREE_CELL: &str = "FREE";

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// One square on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// The label shown to the player.
    pub value: String,
    /// Whether the player has marked this cell.
    pub checked: bool,
}

impl Cell {
    fn unchecked(value: String) -> Self {
        Self {
            value,
            checked: false,
        }
    }

    fn free() -> Self {
        Self {
            value: FREE_CELL.to_string(),
            checked: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A square grid of cells, addressed as `(x, y)` = `(row, column)`.
///
/// Serializes as a plain array of rows so clients can render it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: Vec<Vec<Cell>>,
}

impl Board {
    /// Side length.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.size() * self.size()
    }

    /// The rows, top to bottom.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Returns the cell at `(x, y)`, if it exists.
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.rows.get(x).and_then(|row| row.get(y))
    }

    /// Returns `true` if `(x, y)` is the free centre.
    pub fn is_free(&self, x: usize, y: usize) -> bool {
        let centre = self.size() / 2;
        x == centre && y == centre
    }

    /// Flips the `checked` flag at `(x, y)` and returns the new value.
    ///
    /// The free centre is always checked; toggling it leaves it unchanged.
    pub fn toggle(&mut self, x: usize, y: usize) -> Result<bool, BoardError> {
        let size = self.size();
        let free = self.is_free(x, y);
        let cell = self
            .rows
            .get_mut(x)
            .and_then(|row| row.get_mut(y))
            .ok_or(BoardError::OutOfBounds { x, y, size })?;
        if !free {
            cell.checked = !cell.checked;
        }
        Ok(cell.checked)
    }

    /// Shorthand for [`evaluate_win`].
    pub fn is_bingo(&self) -> bool {
        evaluate_win(self)
    }

    /// Shorthand for [`count_checked`].
    pub fn checked_count(&self) -> usize {
        count_checked(self)
    }

    fn is_checked(&self, x: usize, y: usize) -> bool {
        self.cell(x, y).is_some_and(|cell| cell.checked)
    }
}

/// Builds a fresh board with a uniformly random layout.
///
/// The whole vocabulary is shuffled, the first `size * size - 1` labels
/// are laid out row by row, and the free centre is inserted pre-checked.
pub fn generate_board<R: Rng + ?Sized>(
    size: usize,
    vocabulary: &Vocabulary,
    rng: &mut R,
) -> Result<Board, BoardError> {
    if size == 0 {
        return Err(BoardError::ZeroSize);
    }
    if size % 2 == 0 {
        return Err(BoardError::EvenSize(size));
    }
    let needed = size * size - 1;
    if vocabulary.len() < needed {
        return Err(BoardError::PoolTooSmall {
            needed,
            available: vocabulary.len(),
        });
    }

    let mut pool = vocabulary.values().to_vec();
    pool.shuffle(rng);

    let mut cells: Vec<Cell> =
        pool.into_iter().take(needed).map(Cell::unchecked).collect();
    let centre = size / 2;
    cells.insert(centre * size + centre, Cell::free());

    let mut cells = cells.into_iter();
    let rows = (0..size)
        .map(|_| cells.by_ref().take(size).collect())
        .collect();

    Ok(Board { rows })
}

/// Returns `true` if any full row, column or diagonal is checked.
///
/// Evaluated from scratch on every call; boards are small.
pub fn evaluate_win(board: &Board) -> bool {
    let n = board.size();
    if n == 0 {
        return false;
    }
    let row = (0..n).any(|x| (0..n).all(|y| board.is_checked(x, y)));
    let column = (0..n).any(|y| (0..n).all(|x| board.is_checked(x, y)));
    let diagonal = (0..n).all(|i| board.is_checked(i, i));
    let anti_diagonal = (0..n).all(|i| board.is_checked(i, n - 1 - i));
    row || column || diagonal || anti_diagonal
}

/// Total number of checked cells, the free centre included.
pub fn count_checked(board: &Board) -> usize {
    board
        .rows
        .iter()
        .flatten()
        .filter(|cell| cell.checked)
        .count()
}
