//! Opening book construction and lookup.
//!
//! The book file is plain text, one line per known position:
//!
//! ```text
//! <decimal zobrist hash> <decimal move encoding> <decimal move encoding>...
//! ```
//!
//! A book is built from a games file (one game per line, long-algebraic
//! moves separated by spaces) by replaying each game up to a depth cap and
//! recording every move played from every position reached. Lookup
//! returns a uniformly random stored move for the current hash, or none.
//!
//! The whole file is held in a map; the observable behavior matches a
//! file scan per probe.

use rand::Rng;
use sable_core::Move;
use sable_engine::Board;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Errors raised while building or loading a book.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed book line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// An opening book: position hash to the set of moves seen there.
///
/// Keys and move sets are ordered so a written file is deterministic.
#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    positions: BTreeMap<u64, BTreeSet<u16>>,
}

impl OpeningBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of known positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the book knows no positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Loads a book from its text format.
    pub fn load(path: &Path) -> Result<Self, BookError> {
        let file = std::fs::File::open(path)?;
        let mut book = OpeningBook::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(key_field) = fields.next() else {
                continue;
            };
            let key: u64 = key_field.parse().map_err(|_| BookError::Malformed {
                line: index + 1,
                reason: format!("bad hash '{}'", key_field),
            })?;

            let entry = book.positions.entry(key).or_default();
            for field in fields {
                let encoded: u16 = field.parse().map_err(|_| BookError::Malformed {
                    line: index + 1,
                    reason: format!("bad move encoding '{}'", field),
                })?;
                if Move::from_encoded(encoded).is_none() {
                    return Err(BookError::Malformed {
                        line: index + 1,
                        reason: format!("invalid move encoding {}", encoded),
                    });
                }
                entry.insert(encoded);
            }
        }

        Ok(book)
    }

    /// Writes the book in its text format, keys ascending.
    pub fn save(&self, path: &Path) -> Result<(), BookError> {
        let mut file = std::fs::File::create(path)?;
        for (key, moves) in &self.positions {
            write!(file, "{}", key)?;
            for encoded in moves {
                write!(file, " {}", encoded)?;
            }
            writeln!(file)?;
        }
        Ok(())
    }

    /// Builds a book from a games file: one game per line, long-algebraic
    /// moves, each game followed to at most `max_depth` plies. Unknown or
    /// illegal moves end the line's contribution.
    pub fn build_from_games(path: &Path, max_depth: usize) -> Result<Self, BookError> {
        let file = std::fs::File::open(path)?;
        let mut book = OpeningBook::new();

        for line in BufReader::new(file).lines() {
            let line = line?;
            let mut board = Board::startpos();
            for uci in line.split_whitespace().take(max_depth) {
                let Some(m) = board.find_legal(uci) else {
                    break;
                };
                book.positions
                    .entry(board.hash())
                    .or_default()
                    .insert(m.encoded());
                board.make_move(m);
            }
        }

        Ok(book)
    }

    /// Returns every stored move for a position hash.
    pub fn moves_for(&self, hash: u64) -> Vec<Move> {
        self.positions
            .get(&hash)
            .map(|set| {
                set.iter()
                    .filter_map(|&encoded| Move::from_encoded(encoded))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Picks a uniformly random stored move for a position hash.
    pub fn probe<R: Rng>(&self, hash: u64, rng: &mut R) -> Option<Move> {
        let moves = self.moves_for(hash);
        if moves.is_empty() {
            return None;
        }
        Some(moves[rng.gen_range(0..moves.len())])
    }
}
