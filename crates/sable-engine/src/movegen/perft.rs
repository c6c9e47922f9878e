//! Perft (performance test) for move generator validation.
//!
//! Perft counts the leaf nodes of a full legal-move expansion to a fixed
//! depth; the counts are compared against known-correct values.

use super::{generate_moves, GenKind, MoveList};
use crate::Board;

/// Counts leaf nodes at the given depth using make/unmake.
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    generate_moves(board, GenKind::All, &mut moves);

    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for i in 0..moves.len() {
        let m = moves[i];
        board.make_move(m);
        nodes += perft(board, depth - 1);
        board.unmake_move();
    }
    nodes
}

/// Perft with divide: the node count under each root move at depth-1.
/// Useful to bisect which move tree holds an incorrect count.
pub fn perft_divide(board: &mut Board, depth: u32) -> Vec<(String, u64)> {
    let mut moves = MoveList::new();
    generate_moves(board, GenKind::All, &mut moves);

    let mut results = Vec::with_capacity(moves.len());
    for i in 0..moves.len() {
        let m = moves[i];
        board.make_move(m);
        let nodes = if depth > 1 {
            perft(board, depth - 1)
        } else {
            1
        };
        board.unmake_move();
        results.push((m.to_uci(), nodes));
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMOTION_HEAVY: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
    const LOCKED_ROOKS: &str = "3r1k2/4npp1/1ppr3p/p6P/P2PPPP1/1NR5/5K2/2R5 w - - 0 1";
    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    fn run(fen: &str, depth: u32) -> u64 {
        let mut board = Board::from_fen(fen).unwrap();
        perft(&mut board, depth)
    }

    #[test]
    fn perft_startpos_shallow() {
        let mut board = Board::startpos();
        assert_eq!(perft(&mut board, 1), 20);
        assert_eq!(perft(&mut board, 2), 400);
        assert_eq!(perft(&mut board, 3), 8902);
    }

    #[test]
    fn perft_startpos_depth_4() {
        let mut board = Board::startpos();
        assert_eq!(perft(&mut board, 4), 197_281);
    }

    #[test]
    #[ignore = "slow; run in release"]
    fn perft_startpos_deep() {
        let mut board = Board::startpos();
        assert_eq!(perft(&mut board, 5), 4_865_609);
        assert_eq!(perft(&mut board, 6), 119_060_324);
    }

    #[test]
    fn perft_promotion_heavy_shallow() {
        assert_eq!(run(PROMOTION_HEAVY, 1), 44);
        assert_eq!(run(PROMOTION_HEAVY, 2), 1486);
        assert_eq!(run(PROMOTION_HEAVY, 3), 62_379);
    }

    #[test]
    #[ignore = "slow; run in release"]
    fn perft_promotion_heavy_deep() {
        assert_eq!(run(PROMOTION_HEAVY, 4), 2_103_487);
        assert_eq!(run(PROMOTION_HEAVY, 5), 89_941_194);
    }

    #[test]
    fn perft_locked_rooks_shallow() {
        assert_eq!(run(LOCKED_ROOKS, 1), 33);
        assert_eq!(run(LOCKED_ROOKS, 2), 793);
        assert_eq!(run(LOCKED_ROOKS, 3), 26_013);
    }

    #[test]
    #[ignore = "slow; run in release"]
    fn perft_locked_rooks_deep() {
        assert_eq!(run(LOCKED_ROOKS, 4), 622_922);
        assert_eq!(run(LOCKED_ROOKS, 5), 20_077_998);
    }

    #[test]
    fn perft_kiwipete_shallow() {
        assert_eq!(run(KIWIPETE, 1), 48);
        assert_eq!(run(KIWIPETE, 2), 2039);
        assert_eq!(run(KIWIPETE, 3), 97_862);
    }

    #[test]
    fn perft_divide_sums_to_perft() {
        let mut board = Board::startpos();
        let divide = perft_divide(&mut board, 3);
        assert_eq!(divide.len(), 20);
        let total: u64 = divide.iter().map(|(_, n)| n).sum();
        assert_eq!(total, perft(&mut board, 3));
    }
}
