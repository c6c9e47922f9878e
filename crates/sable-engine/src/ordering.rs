//! Move ordering.
//!
//! Each generated move gets a priority; the list is then stably sorted
//! descending. Tiers, highest first: the saved principal-variation move,
//! the transposition-table move, promotions (queen first), captures by
//! MVV/LVA, then quiet moves by killer slots and the history table.
//!
//! Captures come in two flavours: when the destination is defended the
//! plain MVV/LVA table decides, and when it is undefended a flat bonus
//! rewards winning material outright. The defence test removes our own
//! king from the occupancy so a king "defending" along a ray is seen.

use crate::movegen::{is_square_attacked, MoveList, MAX_MOVES};
use crate::{Bitboard, Board};
use sable_core::{Color, Move, MoveFlag, Piece, Square};

const PV_SCORE: i32 = 1_000_000;
const TT_SCORE: i32 = 900_000;
const QUEEN_PROMO_SCORE: i32 = 810_000;
const PROMO_SCORE: i32 = 800_000;
const CAPTURE_BASE: i32 = 100_000;
const KILLER_SCORE: i32 = 99_000;

const CAPTURE_OFFSET: i32 = 10;
const BLIND_CAPTURE_BONUS: i32 = 6;
const INTERMEDIARY_SPACE: i32 = 4;

/// History scores are clamped well below the killer tier.
const HISTORY_MAX: i32 = 1 << 14;

/// Aggressor (rows: pawn, minor, rook, queen, king) against victim
/// (columns: pawn, minor, rook, queen). Knight and bishop share the minor
/// class. Winning-or-equal trades carry the undefended bonus baked in.
static MVV_LVA: [[i32; 4]; 5] = build_mvv_lva();

const fn build_mvv_lva() -> [[i32; 4]; 5] {
    let base: [[i32; 4]; 5] = [
        [6, 9, 12, 16],
        [2, 6, 11, 15],
        [1, 4, 6, 14],
        [0, 3, 5, 6],
        [7, 8, 10, 13],
    ];
    let mut table = [[0i32; 4]; 5];
    let mut aggressor = 0;
    while aggressor < 5 {
        let mut victim = 0;
        while victim < 4 {
            let mut score = base[aggressor][victim] + CAPTURE_OFFSET;
            if aggressor <= victim {
                score += INTERMEDIARY_SPACE + BLIND_CAPTURE_BONUS;
            }
            table[aggressor][victim] = score;
            victim += 1;
        }
        aggressor += 1;
    }
    table
}

/// Collapses knight and bishop into one class for the MVV/LVA table.
#[inline]
fn mvv_class(piece: Piece) -> usize {
    match piece {
        Piece::Pawn => 0,
        Piece::Knight | Piece::Bishop => 1,
        Piece::Rook => 2,
        Piece::Queen => 3,
        Piece::King => 4,
    }
}

/// Per-(color, piece, to-square) quiet-move score, fed by beta cutoffs.
pub struct HistoryTable {
    scores: [[[i32; 64]; 6]; 2],
}

impl HistoryTable {
    pub fn new() -> Self {
        HistoryTable {
            scores: [[[0; 64]; 6]; 2],
        }
    }

    #[inline]
    pub fn get(&self, color: Color, piece: Piece, to: Square) -> i32 {
        self.scores[color.index()][piece.index()][to.index() as usize]
    }

    /// Rewards the move that produced a cutoff with depth².
    pub fn reward(&mut self, color: Color, piece: Piece, to: Square, depth: u8) {
        let entry = &mut self.scores[color.index()][piece.index()][to.index() as usize];
        *entry = (*entry + (depth as i32).pow(2)).min(HISTORY_MAX);
    }

    /// Penalizes a quiet move that was tried before the cutoff.
    pub fn penalize(&mut self, color: Color, piece: Piece, to: Square, depth: u8) {
        let entry = &mut self.scores[color.index()][piece.index()][to.index() as usize];
        *entry = (*entry - (depth as i32).pow(2)).max(-HISTORY_MAX);
    }

    /// Halves every score; called once per deepening iteration.
    pub fn age(&mut self) {
        for color in &mut self.scores {
            for piece in color.iter_mut() {
                for score in piece.iter_mut() {
                    *score /= 2;
                }
            }
        }
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordering inputs for a main-search node.
pub struct OrderContext<'a> {
    /// The saved PV move for this ply (null when absent).
    pub pv_move: Move,
    /// The transposition-table move (null when absent).
    pub tt_move: Move,
    /// The two killer slots of this ply.
    pub killers: [Move; 2],
    pub history: &'a HistoryTable,
}

/// Orders a full move list for the main search.
pub fn order_moves(board: &Board, moves: &mut MoveList, ctx: &OrderContext) {
    let mut scores = [0i32; MAX_MOVES];
    for (i, &m) in moves.as_slice().iter().enumerate() {
        scores[i] = if m == ctx.pv_move {
            PV_SCORE
        } else if m == ctx.tt_move {
            TT_SCORE
        } else {
            score_move(board, m, Some(ctx))
        };
    }
    stable_sort_desc(moves, &mut scores);
}

/// Orders a capture list for quiescence: MVV/LVA only, no PV, TT, killer,
/// or history input.
pub fn order_captures(board: &Board, moves: &mut MoveList) {
    let mut scores = [0i32; MAX_MOVES];
    for (i, &m) in moves.as_slice().iter().enumerate() {
        scores[i] = score_move(board, m, None);
    }
    stable_sort_desc(moves, &mut scores);
}

fn score_move(board: &Board, m: Move, ctx: Option<&OrderContext>) -> i32 {
    let flag = m.flag();

    if flag.is_promotion() {
        return if flag.promotion_piece() == Some(Piece::Queen) {
            QUEEN_PROMO_SCORE
        } else {
            PROMO_SCORE
        };
    }

    if flag.is_capture() {
        return CAPTURE_BASE + capture_score(board, m);
    }

    let Some(ctx) = ctx else {
        return 0;
    };
    if m == ctx.killers[0] || m == ctx.killers[1] {
        return KILLER_SCORE;
    }
    match board.piece_at(m.from()) {
        Some((piece, color)) => ctx.history.get(color, piece, m.to()),
        None => 0,
    }
}

fn capture_score(board: &Board, m: Move) -> i32 {
    let us = board.side_to_move();
    let aggressor = match board.piece_at(m.from()) {
        Some((piece, _)) => mvv_class(piece),
        None => return 0,
    };
    let victim = if m.flag() == MoveFlag::EnPassant {
        mvv_class(Piece::Pawn)
    } else {
        match board.piece_at(m.to()) {
            Some((piece, _)) => mvv_class(piece),
            None => return 0,
        }
    };

    let mut score = MVV_LVA[aggressor][victim];
    if aggressor > victim && !defended(board, m.to(), us) {
        score += BLIND_CAPTURE_BONUS;
    }
    score
}

/// Is the destination covered by the opponent? Our king is lifted from the
/// occupancy so cover that runs through it is not hidden.
fn defended(board: &Board, to: Square, us: Color) -> bool {
    let mut occupied = board.occupied();
    if let Some(king) = board.king_square(us) {
        occupied &= !Bitboard::from_square(king);
    }
    is_square_attacked(board, to, !us, occupied)
}

/// Stable insertion sort on priority, descending. The lists are short and
/// mostly ordered, and this avoids the allocation of the standard sort.
fn stable_sort_desc(moves: &mut MoveList, scores: &mut [i32; MAX_MOVES]) {
    let len = moves.len();
    let slice = moves.as_mut_slice();
    for i in 1..len {
        let m = slice[i];
        let score = scores[i];
        let mut j = i;
        while j > 0 && scores[j - 1] < score {
            slice[j] = slice[j - 1];
            scores[j] = scores[j - 1];
            j -= 1;
        }
        slice[j] = m;
        scores[j] = score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{generate_moves, GenKind};

    fn position(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    fn ordered_all(board: &Board, ctx: &OrderContext) -> Vec<String> {
        let mut moves = MoveList::new();
        generate_moves(board, GenKind::All, &mut moves);
        order_moves(board, &mut moves, ctx);
        moves.as_slice().iter().map(|m| m.to_uci()).collect()
    }

    fn empty_ctx(history: &HistoryTable) -> OrderContext<'_> {
        OrderContext {
            pv_move: Move::NULL,
            tt_move: Move::NULL,
            killers: [Move::NULL; 2],
            history,
        }
    }

    #[test]
    fn pv_move_sorts_first_tt_second() {
        let board = Board::startpos();
        let history = HistoryTable::new();
        let ctx = OrderContext {
            pv_move: board.find_legal("a2a3").unwrap(),
            tt_move: board.find_legal("h2h3").unwrap(),
            killers: [Move::NULL; 2],
            history: &history,
        };
        let ordered = ordered_all(&board, &ctx);
        assert_eq!(ordered[0], "a2a3");
        assert_eq!(ordered[1], "h2h3");
    }

    #[test]
    fn queen_takes_are_preferred_by_pawns() {
        // Both a pawn and a rook can take the queen: pawn takes queen
        // first.
        let board = position("7k/8/3q4/2P5/8/3R4/8/K7 w - - 0 1");
        let history = HistoryTable::new();
        let ordered = ordered_all(&board, &empty_ctx(&history));
        assert_eq!(ordered[0], "c5d6", "{:?}", ordered);
    }

    #[test]
    fn captures_before_quiets() {
        let board = position("7k/8/3p4/2P5/8/8/8/K7 w - - 0 1");
        let history = HistoryTable::new();
        let ordered = ordered_all(&board, &empty_ctx(&history));
        assert_eq!(ordered[0], "c5d6");
    }

    #[test]
    fn queen_promotion_over_underpromotion_over_capture() {
        let board = position("6nk/5P2/8/8/8/8/8/K7 w - - 0 1");
        let history = HistoryTable::new();
        let ordered = ordered_all(&board, &empty_ctx(&history));
        // All queen promotions (straight or capturing) come before
        // underpromotions.
        let first_two: Vec<&str> = ordered.iter().take(2).map(|s| s.as_str()).collect();
        assert!(first_two.contains(&"f7f8q"));
        assert!(first_two.contains(&"f7g8q"));
    }

    #[test]
    fn killers_rank_above_plain_quiets() {
        let board = Board::startpos();
        let history = HistoryTable::new();
        let killer = board.find_legal("g2g3").unwrap();
        let ctx = OrderContext {
            pv_move: Move::NULL,
            tt_move: Move::NULL,
            killers: [killer, Move::NULL],
            history: &history,
        };
        let ordered = ordered_all(&board, &ctx);
        assert_eq!(ordered[0], "g2g3");
    }

    #[test]
    fn history_orders_quiets() {
        let board = Board::startpos();
        let mut history = HistoryTable::new();
        let to = Square::parse("a3").unwrap();
        history.reward(Color::White, Piece::Pawn, to, 7);
        let ordered = ordered_all(&board, &empty_ctx(&history));
        assert_eq!(ordered[0], "a2a3");
    }

    #[test]
    fn history_update_and_age() {
        let mut history = HistoryTable::new();
        let to = Square::parse("e4").unwrap();
        history.reward(Color::White, Piece::Knight, to, 4);
        assert_eq!(history.get(Color::White, Piece::Knight, to), 16);

        history.penalize(Color::White, Piece::Knight, to, 3);
        assert_eq!(history.get(Color::White, Piece::Knight, to), 7);

        history.age();
        assert_eq!(history.get(Color::White, Piece::Knight, to), 3);
    }

    #[test]
    fn history_saturates() {
        let mut history = HistoryTable::new();
        let to = Square::parse("e4").unwrap();
        for _ in 0..1000 {
            history.reward(Color::Black, Piece::Rook, to, 8);
        }
        assert_eq!(history.get(Color::Black, Piece::Rook, to), HISTORY_MAX);

        for _ in 0..2000 {
            history.penalize(Color::Black, Piece::Rook, to, 8);
        }
        assert_eq!(history.get(Color::Black, Piece::Rook, to), -HISTORY_MAX);
    }

    #[test]
    fn undefended_victim_outranks_defended_one() {
        // The queen can grab an undefended pawn on a4 or a pawn on e6
        // covered by f7: the undefended grab sorts first.
        let board = position("7k/5p2/4p3/8/p3Q3/8/8/K7 w - - 0 1");
        let mut moves = MoveList::new();
        generate_moves(&board, GenKind::Captures, &mut moves);
        order_captures(&board, &mut moves);
        let ordered: Vec<String> = moves.as_slice().iter().map(|m| m.to_uci()).collect();
        assert_eq!(ordered.first().map(|s| s.as_str()), Some("e4a4"), "{:?}", ordered);
    }

    #[test]
    fn quiescence_ordering_mvv_lva() {
        // Queen and pawn both takeable; the queen goes first.
        let board = position("7k/8/2q1p3/3P4/8/8/8/K7 w - - 0 1");
        let mut moves = MoveList::new();
        generate_moves(&board, GenKind::Captures, &mut moves);
        order_captures(&board, &mut moves);
        assert_eq!(moves[0].to_uci(), "d5c6");
    }

    #[test]
    fn sort_is_stable_on_ties() {
        // Two identical-priority quiet moves keep generation order.
        let board = Board::startpos();
        let history = HistoryTable::new();
        let mut moves = MoveList::new();
        generate_moves(&board, GenKind::All, &mut moves);
        let before: Vec<Move> = moves.as_slice().to_vec();
        order_moves(&board, &mut moves, &empty_ctx(&history));
        // With no heuristics loaded every quiet scores zero; the order
        // must be untouched.
        assert_eq!(moves.as_slice(), before.as_slice());
    }
}
