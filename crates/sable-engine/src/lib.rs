//! Bitboard chess engine.
//!
//! This crate provides the playing strength of the workspace:
//!
//! - [`Bitboard`] - 64-bit board representation and the named masks
//! - [`Board`] - piece placement with a make/unmake state stack,
//!   incremental Zobrist hashing, and repetition tracking
//! - [`movegen`] - legal move generation (magic bitboards, pin and check
//!   analysis) plus perft
//! - [`eval`] - tapered piece-square evaluation
//! - [`tt`] - the three-way associative transposition table
//! - [`search`] - iterative-deepening negamax with quiescence
//!
//! # Example
//!
//! ```
//! use sable_engine::{search, Board, TranspositionTable};
//! use sable_engine::search::{CancelToken, SearchLimits};
//!
//! let mut board = Board::startpos();
//! let mut tt = TranspositionTable::new();
//! let cancel = CancelToken::new();
//! let outcome = search::search(
//!     &mut board,
//!     &mut tt,
//!     &cancel,
//!     SearchLimits { depth: Some(4) },
//!     |report| println!("depth {} score {}", report.depth, report.score),
//! );
//! println!("best move: {}", outcome.best);
//! ```

mod bitboard;
mod board;
pub mod eval;
mod gamestate;
pub mod movegen;
pub mod ordering;
pub mod search;
pub mod tt;
mod zobrist;

pub use bitboard::{between, Bitboard};
pub use board::{Board, CastlingRights, StateInfo};
pub use gamestate::{game_state, insufficient_material, GameState};
pub use movegen::{
    generate_moves, perft, GenKind, MoveList, MAX_CAPTURES, MAX_MOVES,
};
pub use search::{search, CancelToken, SearchLimits, SearchOutcome, SearchReport};
pub use tt::{TableError, TranspositionTable};
pub use zobrist::{ZobristKeys, ZOBRIST};
