//! Game termination rules.

use crate::{Bitboard, Board};
use sable_core::{Color, Piece};
use std::fmt;

/// Classification of the current position under the termination rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    InProgress,
    WhiteMated,
    BlackMated,
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl GameState {
    /// Returns true for any drawn outcome.
    pub fn is_draw(self) -> bool {
        matches!(
            self,
            GameState::Stalemate
                | GameState::FiftyMoveRule
                | GameState::ThreefoldRepetition
                | GameState::InsufficientMaterial
        )
    }

    /// Returns the winner, if the game ended decisively.
    pub fn winner(self) -> Option<Color> {
        match self {
            GameState::WhiteMated => Some(Color::Black),
            GameState::BlackMated => Some(Color::White),
            _ => None,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GameState::InProgress => "in progress",
            GameState::WhiteMated => "white is mated",
            GameState::BlackMated => "black is mated",
            GameState::Stalemate => "stalemate",
            GameState::FiftyMoveRule => "fifty-move rule",
            GameState::ThreefoldRepetition => "threefold repetition",
            GameState::InsufficientMaterial => "insufficient material",
        };
        write!(f, "{}", text)
    }
}

/// Classifies the current position.
pub fn game_state(board: &Board) -> GameState {
    if board.legal_moves().is_empty() {
        if board.in_check() {
            return match board.side_to_move() {
                Color::White => GameState::WhiteMated,
                Color::Black => GameState::BlackMated,
            };
        }
        return GameState::Stalemate;
    }

    if board.state().halfmove_clock >= 100 {
        return GameState::FiftyMoveRule;
    }

    if board.repetition_count() >= 3 {
        return GameState::ThreefoldRepetition;
    }

    if insufficient_material(board) {
        return GameState::InsufficientMaterial;
    }

    GameState::InProgress
}

/// Neither side can force mate: bare kings, a lone minor piece, or one
/// bishop each on the same colour complex.
pub fn insufficient_material(board: &Board) -> bool {
    let pawns =
        board.pieces_of(Piece::Pawn, Color::White) | board.pieces_of(Piece::Pawn, Color::Black);
    if pawns.is_not_empty() {
        return false;
    }

    let majors = board.pieces_of(Piece::Queen, Color::White)
        | board.pieces_of(Piece::Queen, Color::Black)
        | board.pieces_of(Piece::Rook, Color::White)
        | board.pieces_of(Piece::Rook, Color::Black);
    if majors.is_not_empty() {
        return false;
    }

    let white_bishops = board.pieces_of(Piece::Bishop, Color::White);
    let black_bishops = board.pieces_of(Piece::Bishop, Color::Black);
    let minors = white_bishops
        | black_bishops
        | board.pieces_of(Piece::Knight, Color::White)
        | board.pieces_of(Piece::Knight, Color::Black);

    // Lone kings, or king versus king and one minor.
    if minors.count() <= 1 {
        return true;
    }

    // Bishop against bishop on the same colour complex.
    if minors.count() == 2 && white_bishops.count() == 1 && black_bishops.count() == 1 {
        let white_light = (white_bishops & Bitboard::LIGHT_SQUARES).is_not_empty();
        let black_light = (black_bishops & Bitboard::LIGHT_SQUARES).is_not_empty();
        return white_light == black_light;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_of(fen: &str) -> GameState {
        game_state(&Board::from_fen(fen).unwrap())
    }

    #[test]
    fn fresh_game_in_progress() {
        assert_eq!(game_state(&Board::startpos()), GameState::InProgress);
    }

    #[test]
    fn checkmate_detection() {
        // Back-rank mate, black to move.
        assert_eq!(state_of("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1"), GameState::BlackMated);
        // Mirrored, white to move.
        assert_eq!(state_of("8/8/8/8/8/6k1/6q1/7K w - - 0 1"), GameState::WhiteMated);
    }

    #[test]
    fn stalemate_detection() {
        // Qf7 and Kg6 seal every flight square without giving check.
        assert_eq!(
            state_of("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1"),
            GameState::Stalemate
        );
        // Bare kings always have moves.
        assert_eq!(
            state_of("k7/8/K7/8/8/8/8/8 b - - 0 1"),
            GameState::InsufficientMaterial
        );
    }

    #[test]
    fn fifty_move_rule() {
        assert_eq!(
            state_of("8/8/8/8/8/8/8/R3K2k w Q - 100 1"),
            GameState::FiftyMoveRule
        );
        assert_eq!(
            state_of("8/8/8/8/8/8/8/R3K2k w Q - 99 1"),
            GameState::InProgress
        );
    }

    #[test]
    fn threefold_repetition() {
        let mut board = Board::startpos();
        for _ in 0..2 {
            for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                board.make_move(board.find_legal(uci).unwrap());
            }
        }
        assert_eq!(game_state(&board), GameState::ThreefoldRepetition);
    }

    #[test]
    fn insufficient_material_cases() {
        // Bare kings.
        assert!(insufficient_material(
            &Board::from_fen("k7/8/8/8/8/8/8/K7 w - - 0 1").unwrap()
        ));
        // King and knight versus king.
        assert!(insufficient_material(
            &Board::from_fen("k7/8/8/8/8/8/8/KN6 w - - 0 1").unwrap()
        ));
        // Same-colour bishops (b1 and c8 are both light squares).
        assert!(insufficient_material(
            &Board::from_fen("k1b5/8/8/8/8/8/8/KB6 w - - 0 1").unwrap()
        ));
        // Opposite-colour bishops can still mate with help.
        assert!(!insufficient_material(
            &Board::from_fen("kb6/8/8/8/8/8/8/KB6 w - - 0 1").unwrap()
        ));
        // A pawn is mating material.
        assert!(!insufficient_material(
            &Board::from_fen("8/8/8/8/8/k7/p7/K7 w - - 0 1").unwrap()
        ));
        // Two knights are counted as sufficient here.
        assert!(!insufficient_material(
            &Board::from_fen("k7/8/8/8/8/8/8/KNN5 w - - 0 1").unwrap()
        ));
        // A rook is mating material.
        assert!(!insufficient_material(
            &Board::from_fen("k7/8/8/8/8/8/8/KR6 w - - 0 1").unwrap()
        ));
    }

    #[test]
    fn winner_and_draw_helpers() {
        assert_eq!(GameState::BlackMated.winner(), Some(Color::White));
        assert_eq!(GameState::WhiteMated.winner(), Some(Color::Black));
        assert_eq!(GameState::Stalemate.winner(), None);
        assert!(GameState::Stalemate.is_draw());
        assert!(GameState::FiftyMoveRule.is_draw());
        assert!(!GameState::InProgress.is_draw());
        assert!(!GameState::WhiteMated.is_draw());
    }
}
