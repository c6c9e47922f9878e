//! FEN building blocks.
//!
//! The board owns FEN parsing and printing, since placement can only be
//! validated while pieces are actually placed. This module carries what
//! every consumer shares: the starting-position record, the error type,
//! and the six-field splitter.

use thiserror::Error;

/// The standard starting position.
pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Errors produced while reading a FEN record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 fields, found {0}")]
    FieldCount(usize),

    #[error("bad piece placement: {0}")]
    Placement(String),

    #[error("bad side to move: '{0}'")]
    SideToMove(String),

    #[error("bad castling rights: '{0}'")]
    Castling(String),

    #[error("bad en passant target: '{0}'")]
    EnPassant(String),

    #[error("bad half-move clock: '{0}'")]
    HalfmoveClock(String),

    #[error("bad full-move number: '{0}'")]
    FullmoveNumber(String),
}

/// Splits a record into its six whitespace-separated fields: placement,
/// side to move, castling, en passant, half-move clock, full-move
/// number.
pub fn split_fields(fen: &str) -> Result<[&str; 6], FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    <[&str; 6]>::try_from(fields).map_err(|fields| FenError::FieldCount(fields.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_splits() {
        let [placement, side, castling, ep, halfmove, fullmove] =
            split_fields(STARTPOS).unwrap();
        assert_eq!(
            placement,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"
        );
        assert_eq!(side, "w");
        assert_eq!(castling, "KQkq");
        assert_eq!(ep, "-");
        assert_eq!(halfmove, "0");
        assert_eq!(fullmove, "1");
    }

    #[test]
    fn extra_whitespace_is_tolerated() {
        let [_, side, ..] = split_fields("8/8/8/8/8/8/8/8   b  -  - 12 34").unwrap();
        assert_eq!(side, "b");
    }

    #[test]
    fn wrong_field_count_is_reported() {
        assert_eq!(split_fields(""), Err(FenError::FieldCount(0)));
        assert_eq!(split_fields("one two three"), Err(FenError::FieldCount(3)));
        assert_eq!(
            split_fields("a b c d e f g"),
            Err(FenError::FieldCount(7))
        );
    }
}
