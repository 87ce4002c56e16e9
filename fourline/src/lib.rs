//! Connect Four rules engine with a uniform-random automated opponent.
//! A `Grid` owns the cell matrix and the drop/win/draw queries; a
//! `GameSession` pairs it with a `RandomOpponent` and resolves one full
//! turn per call: the human move, then the automated reply. Game phase
//! (in progress, won, drawn) is always derived from the grid, never
//! stored, so `reset` cannot leave a stale result behind.
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Board size of the reference deployment.
pub const DEFAULT_HEIGHT: usize = 6;
pub const DEFAULT_WIDTH: usize = 7;

const RUN_LENGTH: usize = 4;

/// Forward scan directions as (d_row, d_col): down, right, down-right,
/// down-left. Every cell of a four-run is itself visited by the win scan,
/// so the backward directions are redundant.
const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Red,
    Yellow,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::Red => Mark::Yellow,
            Mark::Yellow => Mark::Red,
        }
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    /// The opponent was asked for a move on a full board. The turn
    /// sequence checks `is_full` first, so hitting this means the caller
    /// skipped that check.
    #[error("no legal moves remain")]
    NoMoves,
}

/// The rectangular cell matrix. Row 0 is the top; checkers stack from
/// row `height - 1` upward. Cells change only through `drop_checker`
/// and `reset`, which keeps the gravity invariant: no empty cell ever
/// sits below an occupied one in the same column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    height: usize,
    width: usize,
    cells: Vec<Option<Mark>>,
}

impl Grid {
    pub fn new(height: usize, width: usize) -> Self {
        assert!(height > 0 && width > 0, "grid dimensions must be positive");
        Self {
            height,
            width,
            cells: vec![None; height * width],
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<Mark> {
        self.cells[row * self.width + column]
    }

    /// Drops `mark` into the lowest empty cell of `column`. Returns
    /// whether the checker was placed; a full or out-of-range column
    /// reports false without mutating anything. Fullness is a normal
    /// outcome here, not an error.
    pub fn drop_checker(&mut self, mark: Mark, column: usize) -> bool {
        if column >= self.width {
            return false;
        }
        for row in (0..self.height).rev() {
            let idx = row * self.width + column;
            if self.cells[idx].is_none() {
                self.cells[idx] = Some(mark);
                return true;
            }
        }
        false
    }

    /// A column accepts a drop iff its topmost cell is empty; gravity
    /// guarantees compaction below. Out-of-range columns report false.
    pub fn can_drop_into(&self, column: usize) -> bool {
        column < self.width && self.cells[column].is_none()
    }

    /// Pure query: does `mark` own a straight run of four anywhere?
    /// Scans every cell holding `mark` and checks the three forward
    /// continuations along each axis in `DIRECTIONS`.
    pub fn is_win_for(&self, mark: Mark) -> bool {
        for row in 0..self.height {
            for col in 0..self.width {
                if self.cell(row, col) != Some(mark) {
                    continue;
                }
                for (d_row, d_col) in DIRECTIONS {
                    if self.run_from(row, col, d_row, d_col, mark) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn run_from(&self, row: usize, col: usize, d_row: isize, d_col: isize, mark: Mark) -> bool {
        for step in 1..RUN_LENGTH as isize {
            let r = row as isize + d_row * step;
            let c = col as isize + d_col * step;
            if r < 0 || r >= self.height as isize || c < 0 || c >= self.width as isize {
                return false;
            }
            if self.cell(r as usize, c as usize) != Some(mark) {
                return false;
            }
        }
        true
    }

    /// True iff no column accepts a drop, i.e. no legal move exists.
    pub fn is_full(&self) -> bool {
        (0..self.width).all(|col| !self.can_drop_into(col))
    }

    /// Clears every cell; dimensions are retained.
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }
}

/// The automated side. Holds only its mark and consults the grid on
/// every decision: no look-ahead, no blocking, a uniform-random pick
/// among the columns that accept a drop.
#[derive(Clone, Debug)]
pub struct RandomOpponent {
    mark: Mark,
}

impl RandomOpponent {
    pub fn new(mark: Mark) -> Self {
        Self { mark }
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Picks a column that currently accepts a drop. Does not place the
    /// checker; the caller feeds the column back into `drop_checker`.
    /// Asking for a move on a full board is a caller bug and surfaces as
    /// `GameError::NoMoves`.
    pub fn next_move(&self, grid: &Grid) -> Result<usize, GameError> {
        let open: Vec<usize> = (0..grid.width())
            .filter(|&col| grid.can_drop_into(col))
            .collect();
        open.choose(&mut rand::thread_rng())
            .copied()
            .ok_or(GameError::NoMoves)
    }
}

/// Outcome of one resolved turn, the closed vocabulary the orchestration
/// layer reports from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The requested column was full or out of range; nothing moved.
    Invalid,
    /// The requesting side completed a four-run; the opponent did not move.
    Win(Mark),
    /// The board filled without a winner.
    Draw,
    /// The opponent replied in `reply_column`, possibly winning on it.
    Continue {
        reply_column: usize,
        opponent_won: bool,
    },
}

/// One game: a grid plus the automated opponent playing the side
/// opposite the human. Owns the full turn sequence so the transport
/// layer above stays free of game logic.
pub struct GameSession {
    grid: Grid,
    opponent: RandomOpponent,
}

impl GameSession {
    pub fn new(height: usize, width: usize, human: Mark) -> Self {
        Self {
            grid: Grid::new(height, width),
            opponent: RandomOpponent::new(human.opponent()),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn opponent_mark(&self) -> Mark {
        self.opponent.mark()
    }

    /// Resolves one full turn: apply the human move, check terminal
    /// conditions, then let the opponent reply and check again. Win is
    /// checked before fullness, so a move that both wins and fills the
    /// board reports `Win`, never `Draw`.
    pub fn play_turn(&mut self, mark: Mark, column: usize) -> Result<TurnOutcome, GameError> {
        if !self.grid.drop_checker(mark, column) {
            return Ok(TurnOutcome::Invalid);
        }
        if self.grid.is_win_for(mark) {
            return Ok(TurnOutcome::Win(mark));
        }
        if self.grid.is_full() {
            return Ok(TurnOutcome::Draw);
        }
        // The board is not full, so the opponent always finds a column.
        let reply_column = self.opponent.next_move(&self.grid)?;
        let bot = self.opponent.mark();
        let placed = self.grid.drop_checker(bot, reply_column);
        debug_assert!(placed, "opponent chose an unplayable column");
        Ok(TurnOutcome::Continue {
            reply_column,
            opponent_won: self.grid.is_win_for(bot),
        })
    }

    /// Starts a new game on the same grid dimensions.
    pub fn reset(&mut self) {
        self.grid.reset();
    }
}
