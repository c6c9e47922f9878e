//! End-to-end game invariants: random playouts, unwind symmetry, and
//! full-game scenarios driven by the search.

use proptest::prelude::*;
use sable_engine::search::{CancelToken, SearchLimits};
use sable_engine::{game_state, search, Board, GameState, TranspositionTable};
use std::collections::HashMap;

fn check_invariants(board: &Board) {
    // Incremental hash equals recomputation.
    assert_eq!(board.hash(), board.full_hash());

    // The square array and the bitboards agree, square by square.
    let mut occupied = 0;
    for index in 0..64u8 {
        let sq = sable_core::Square::try_new(index).unwrap();
        match board.piece_at(sq) {
            Some((piece, color)) => {
                assert!(board.pieces_of(piece, color).contains(sq));
                occupied += 1;
            }
            None => {
                for piece in sable_core::Piece::ALL {
                    for color in sable_core::Color::BOTH {
                        assert!(!board.pieces_of(piece, color).contains(sq));
                    }
                }
            }
        }
    }
    assert_eq!(occupied, board.occupied().count());

    // FEN round-trips.
    let fen = board.to_fen();
    let reparsed = Board::from_fen(&fen).unwrap();
    assert_eq!(reparsed.to_fen(), fen);
    assert_eq!(reparsed.full_hash(), board.full_hash());

    // Move text round-trips against the legal move list.
    for &m in board.legal_moves().as_slice() {
        assert_eq!(board.find_legal(&m.to_uci()), Some(m), "move {}", m);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn random_playouts_preserve_invariants(choices in prop::collection::vec(any::<u16>(), 1..60)) {
        let mut board = Board::startpos();
        let mut occurrences: HashMap<u64, u32> = HashMap::new();
        *occurrences.entry(board.hash()).or_insert(0) += 1;

        for &choice in &choices {
            if game_state(&board) != GameState::InProgress {
                break;
            }
            let moves = board.legal_moves();
            let m = moves[choice as usize % moves.len()];
            board.make_move(m);

            *occurrences.entry(board.hash()).or_insert(0) += 1;
            prop_assert_eq!(board.repetition_count(), occurrences[&board.hash()]);

            check_invariants(&board);
        }

        // Unwinding the whole game restores the starting position bit for bit.
        let plies = board.ply_count() - 1;
        for _ in 0..plies {
            board.unmake_move();
        }
        prop_assert_eq!(board.to_fen(), sable_core::STARTPOS);
        prop_assert_eq!(board.hash(), board.full_hash());
        prop_assert_eq!(board.repetition_count(), 1);
    }
}

#[test]
fn search_first_move_is_among_the_twenty() {
    let mut board = Board::startpos();
    let mut tt = TranspositionTable::new();
    let outcome = search(
        &mut board,
        &mut tt,
        &CancelToken::new(),
        SearchLimits { depth: Some(5) },
        |_| {},
    );
    assert!(board.legal_moves().as_slice().contains(&outcome.best));
    assert_eq!(board.legal_moves().len(), 20);
}

#[test]
fn promotion_swings_the_evaluation() {
    // A pawn on the board is mating material; once it promotes, the
    // evaluation from White's side collapses by a queen.
    let mut board = Board::from_fen("8/8/8/8/8/1k6/p7/3K4 b - - 0 1").unwrap();
    assert!(!sable_engine::insufficient_material(&board));

    let before = sable_engine::eval::evaluate(&board); // black to move, pawn up
    assert!(before.score > 0);

    let m = board.find_legal("a2a1q").unwrap();
    board.make_move(m);
    let after = sable_engine::eval::evaluate(&board); // white to move, queen down
    assert!(after.score < -700, "white must be lost: {}", after.score);
}

#[test]
#[ignore = "plays out a full endgame; run in release"]
fn king_and_pawn_endgame_is_won() {
    let mut board = Board::from_fen("4k3/8/4K3/4P3/8/8/8/8 w - - 0 1").unwrap();
    let mut tt = TranspositionTable::new();
    let cancel = CancelToken::new();

    for _ in 0..200 {
        if game_state(&board) != GameState::InProgress {
            break;
        }
        let outcome = search(
            &mut board,
            &mut tt,
            &cancel,
            SearchLimits { depth: Some(7) },
            |_| {},
        );
        assert!(!outcome.best.is_null());
        board.make_move(outcome.best);
    }

    // With best play from both sides, this position is a win for White
    // inside the fifty-move limit.
    assert_eq!(game_state(&board), GameState::BlackMated);
}
