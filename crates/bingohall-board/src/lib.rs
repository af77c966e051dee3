//! Bingo board engine for Bingohall.
//!
//! Generates randomized N×N boards from a fixed label pool, toggles cells,
//! and evaluates the win condition. Everything here is pure in-memory
//! computation: no I/O, no clocks, and randomness is injected by the caller
//! so boards can be reproduced in tests with a seeded RNG.
//!
//! # Key types
//!
//! - [`Board`]: a square grid of [`Cell`]s with a pre-checked free centre
//! - [`Vocabulary`]: the de-duplicated pool board labels are drawn from
//! - [`generate_board`]: uniform random board construction
//! - [`evaluate_win`] / [`count_checked`]: derived results, always
//!   recomputed from the cells

mod board;
mod error;
mod vocabulary;

pub use board::{Board, Cell, FREE_CELL, count_checked, evaluate_win, generate_board};
pub use error::BoardError;
pub use vocabulary::Vocabulary;
