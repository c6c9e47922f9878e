//! Legal move generation.
//!
//! Generation is legal, not pseudo-legal: every emitted move leaves the
//! mover's king out of check. A pin-and-check analysis runs first, treating
//! the king as a super-piece and intersecting with the enemy piece sets;
//! the between-ray of a slider supplies both the check-evasion mask and the
//! movement mask of a pinned piece. En passant is the one case decided by a
//! simulated occupancy test, which also rejects the rank-pin double-removal
//! trick.

mod attacks;
pub mod magics;
pub mod perft;

use crate::bitboard::between;
use crate::{Bitboard, Board};
use sable_core::{Color, Move, MoveFlag, Piece, Square};

pub use attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
};
pub use magics::{
    attack_tables, blocker_subsets, install_attack_tables, relevant_mask, slider_attacks,
    AttackTables, MagicError, MagicParams, SliderKind,
};

/// Upper bound on legal moves in any reachable position.
pub const MAX_MOVES: usize = 218;

/// Upper bound on capture moves in any reachable position.
pub const MAX_CAPTURES: usize = 74;

/// Which move category to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKind {
    /// Captures, en passant, and capturing promotions.
    Captures,
    /// Non-capturing moves, including quiet promotions and castling.
    Quiets,
    /// Captures followed by quiets.
    All,
}

/// A move list backed by a fixed array, sized for the legal-move upper
/// bound so the per-ply pools never allocate.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    /// Creates an empty move list.
    #[inline]
    pub const fn new() -> Self {
        MoveList {
            moves: [Move::NULL; MAX_MOVES],
            len: 0,
        }
    }

    /// Appends a move.
    #[inline]
    pub fn push(&mut self, m: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = m;
        self.len += 1;
    }

    /// Returns the number of moves.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the moves as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    /// Returns the moves as a mutable slice (for ordering).
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }

    /// Clears the list.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        debug_assert!(index < self.len);
        &self.moves[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// A piece currently giving check.
#[derive(Clone, Copy)]
struct Checker {
    sq: Square,
    /// Squares between the checker and the king (empty for leapers);
    /// interposing on them blocks the check.
    ray: Bitboard,
}

/// A friendly piece pinned to the king by an enemy slider.
#[derive(Clone, Copy)]
struct Pin {
    pinned: Square,
    pinner: Square,
    /// Squares the pinned piece may quietly step to: the king-pinner ray
    /// minus its own square.
    quiet_ray: Bitboard,
}

struct Analysis {
    checkers: [Option<Checker>; 2],
    checker_count: usize,
    pins: [Option<Pin>; 8],
    pin_count: usize,
    pinned_mask: Bitboard,
}

impl Analysis {
    fn push_checker(&mut self, checker: Checker) {
        if self.checker_count < self.checkers.len() {
            self.checkers[self.checker_count] = Some(checker);
        }
        self.checker_count += 1;
    }

    fn push_pin(&mut self, pin: Pin) {
        if self.pin_count < self.pins.len() {
            self.pins[self.pin_count] = Some(pin);
            self.pin_count += 1;
            self.pinned_mask.set(pin.pinned);
        }
    }
}

/// Per-call generation context.
struct Ctx<'a> {
    board: &'a Board,
    us: Color,
    them: Color,
    friends: Bitboard,
    enemies: Bitboard,
    occupied: Bitboard,
    king: Square,
}

/// Appends the legal moves of the requested category to `out`.
pub fn generate_moves(board: &Board, kind: GenKind, out: &mut MoveList) {
    if let GenKind::All = kind {
        generate_moves(board, GenKind::Captures, out);
        generate_moves(board, GenKind::Quiets, out);
        return;
    }

    let us = board.side_to_move();
    let them = !us;
    let king = match board.king_square(us) {
        Some(sq) => sq,
        // No king on the board: nothing to generate.
        None => return,
    };
    if board.king_square(them).is_none() {
        return;
    }

    let ctx = Ctx {
        board,
        us,
        them,
        friends: board.occupancy(us),
        enemies: board.occupancy(them),
        occupied: board.occupied(),
        king,
    };

    let analysis = analyze(&ctx);
    let captures = kind == GenKind::Captures;
    let free = !analysis.pinned_mask;

    match analysis.checker_count {
        0 => {
            let target = if captures {
                ctx.enemies
            } else {
                !ctx.occupied
            };
            generate_pinned(&ctx, &analysis, captures, out);
            generate_sliders(&ctx, ctx.board.pieces_of(Piece::Queen, us) & free, Piece::Queen, target, captures, out);
            generate_sliders(&ctx, ctx.board.pieces_of(Piece::Bishop, us) & free, Piece::Bishop, target, captures, out);
            generate_sliders(&ctx, ctx.board.pieces_of(Piece::Rook, us) & free, Piece::Rook, target, captures, out);
            generate_knights(&ctx, ctx.board.pieces_of(Piece::Knight, us) & free, target, captures, out);
            generate_pawns(&ctx, ctx.board.pieces_of(Piece::Pawn, us) & free, target, captures, out);
            if captures {
                generate_en_passant(&ctx, ctx.board.pieces_of(Piece::Pawn, us), out);
            }
        }
        1 => {
            let checker = analysis.checkers[0].expect("checker_count == 1");
            let target = if captures {
                Bitboard::from_square(checker.sq)
            } else {
                checker.ray
            };
            generate_sliders(&ctx, ctx.board.pieces_of(Piece::Queen, us) & free, Piece::Queen, target, captures, out);
            generate_sliders(&ctx, ctx.board.pieces_of(Piece::Bishop, us) & free, Piece::Bishop, target, captures, out);
            generate_sliders(&ctx, ctx.board.pieces_of(Piece::Rook, us) & free, Piece::Rook, target, captures, out);
            generate_knights(&ctx, ctx.board.pieces_of(Piece::Knight, us) & free, target, captures, out);
            generate_pawns(&ctx, ctx.board.pieces_of(Piece::Pawn, us) & free, target, captures, out);
            if captures {
                // The checker may be a just-double-pushed pawn; capturing it
                // en passant lands beside the target mask, so the en passant
                // legality simulation decides.
                generate_en_passant(&ctx, ctx.board.pieces_of(Piece::Pawn, us), out);
            }
        }
        _ => {}
    }

    generate_king(&ctx, &analysis, captures, out);
}

/// Finds every checker and every pin in one pass from the king square.
fn analyze(ctx: &Ctx) -> Analysis {
    let mut analysis = Analysis {
        checkers: [None; 2],
        checker_count: 0,
        pins: [None; 8],
        pin_count: 0,
        pinned_mask: Bitboard::EMPTY,
    };

    let board = ctx.board;
    let king = ctx.king;

    // Leaper checks: reverse the capture from the king square.
    let pawn_checkers = pawn_attacks(king, ctx.us) & board.pieces_of(Piece::Pawn, ctx.them);
    for sq in pawn_checkers {
        analysis.push_checker(Checker {
            sq,
            ray: Bitboard::EMPTY,
        });
    }
    let knight_checkers = knight_attacks(king) & board.pieces_of(Piece::Knight, ctx.them);
    for sq in knight_checkers {
        analysis.push_checker(Checker {
            sq,
            ray: Bitboard::EMPTY,
        });
    }

    // Slider checks and pins: cast rays through friendly pieces (only enemy
    // pieces block) and count the friendly pieces on each king-slider ray.
    let rook_like =
        board.pieces_of(Piece::Rook, ctx.them) | board.pieces_of(Piece::Queen, ctx.them);
    let bishop_like =
        board.pieces_of(Piece::Bishop, ctx.them) | board.pieces_of(Piece::Queen, ctx.them);

    let rook_candidates = rook_attacks(king, ctx.enemies) & rook_like;
    let bishop_candidates = bishop_attacks(king, ctx.enemies) & bishop_like;

    for sq in rook_candidates | bishop_candidates {
        let ray = between(king, sq);
        let friendly_on_ray = ray & ctx.friends;
        match friendly_on_ray.count() {
            0 => analysis.push_checker(Checker { sq, ray }),
            1 => {
                let pinned = friendly_on_ray.lsb().expect("one bit set");
                analysis.push_pin(Pin {
                    pinned,
                    pinner: sq,
                    quiet_ray: ray & !Bitboard::from_square(pinned),
                });
            }
            _ => {}
        }
    }

    analysis
}

/// Moves of pinned pieces: capture the pinner or slide along the pin ray.
fn generate_pinned(ctx: &Ctx, analysis: &Analysis, captures: bool, out: &mut MoveList) {
    for pin in analysis.pins.iter().take(analysis.pin_count) {
        let pin = pin.expect("pin slots below pin_count are filled");
        let piece = match ctx.board.piece_at(pin.pinned) {
            Some((piece, _)) => piece,
            None => continue,
        };
        let single = Bitboard::from_square(pin.pinned);
        let target = if captures {
            Bitboard::from_square(pin.pinner)
        } else {
            pin.quiet_ray
        };

        match piece {
            Piece::Pawn => generate_pawns(ctx, single, target, captures, out),
            Piece::Knight => generate_knights(ctx, single, target, captures, out),
            Piece::Bishop | Piece::Rook | Piece::Queen => {
                generate_sliders(ctx, single, piece, target, captures, out)
            }
            // The king is never pinned.
            Piece::King => {}
        }
    }
}

fn generate_sliders(
    ctx: &Ctx,
    pieces: Bitboard,
    piece: Piece,
    target: Bitboard,
    captures: bool,
    out: &mut MoveList,
) {
    let flag = if captures {
        MoveFlag::Capture
    } else {
        MoveFlag::Quiet
    };
    for from in pieces {
        let reachable = match piece {
            Piece::Rook => rook_attacks(from, ctx.occupied),
            Piece::Bishop => bishop_attacks(from, ctx.occupied),
            Piece::Queen => queen_attacks(from, ctx.occupied),
            _ => unreachable!("slider generation for non-slider"),
        };
        for to in reachable & !ctx.friends & target {
            out.push(Move::new(from, to, flag));
        }
    }
}

fn generate_knights(
    ctx: &Ctx,
    knights: Bitboard,
    target: Bitboard,
    captures: bool,
    out: &mut MoveList,
) {
    let flag = if captures {
        MoveFlag::Capture
    } else {
        MoveFlag::Quiet
    };
    for from in knights {
        for to in knight_attacks(from) & !ctx.friends & target {
            out.push(Move::new(from, to, flag));
        }
    }
}

fn generate_pawns(
    ctx: &Ctx,
    pawns: Bitboard,
    target: Bitboard,
    captures: bool,
    out: &mut MoveList,
) {
    if pawns.is_empty() {
        return;
    }
    let delta = ctx.us.push_delta();

    if captures {
        let capture_target = target & ctx.enemies;
        let east = pawns.forward_east(ctx.us) & capture_target;
        let west = pawns.forward_west(ctx.us) & capture_target;
        push_pawn_moves(east, delta + 1, true, out);
        push_pawn_moves(west, delta - 1, true, out);
    } else {
        let empty = !ctx.occupied;
        let single = pawns.forward(ctx.us) & empty;
        push_pawn_moves(single & target, delta, false, out);

        let start_rank = match ctx.us {
            Color::White => Bitboard::rank(1),
            Color::Black => Bitboard::rank(6),
        };
        let mid = (pawns & start_rank).forward(ctx.us) & empty;
        let double = mid.forward(ctx.us) & empty & target;
        for to in double {
            let from = to
                .offset(-2 * delta)
                .expect("double push origin on board");
            out.push(Move::new(from, to, MoveFlag::DoublePush));
        }
    }
}

/// Emits pawn moves for every destination bit, expanding promotions.
fn push_pawn_moves(destinations: Bitboard, delta: i8, capture: bool, out: &mut MoveList) {
    for to in destinations {
        let from = to.offset(-delta).expect("pawn origin on board");
        if Bitboard::PROMOTION_RANKS.contains(to) {
            for piece in [Piece::Queen, Piece::Knight, Piece::Rook, Piece::Bishop] {
                let flag = MoveFlag::promotion(piece, capture).expect("promotable piece");
                out.push(Move::new(from, to, flag));
            }
        } else if capture {
            out.push(Move::capture(from, to));
        } else {
            out.push(Move::quiet(from, to));
        }
    }
}

/// Emits en passant captures, each validated by simulating the capture:
/// both pawns leave the board at once, so a plain pin check is not enough.
fn generate_en_passant(ctx: &Ctx, pawns: Bitboard, out: &mut MoveList) {
    let ep = match ctx.board.state().en_passant {
        Some(sq) => sq,
        None => return,
    };

    for from in pawns {
        if !pawn_attacks(from, ctx.us).contains(ep) {
            continue;
        }
        if en_passant_is_legal(ctx, from, ep) {
            out.push(Move::new(from, ep, MoveFlag::EnPassant));
        }
    }
}

fn en_passant_is_legal(ctx: &Ctx, from: Square, to: Square) -> bool {
    let victim_sq = match to.offset(-ctx.us.push_delta()) {
        Some(sq) => sq,
        None => return false,
    };
    let occupied = Bitboard(
        (ctx.occupied.0 ^ from.bit() ^ victim_sq.bit()) | to.bit(),
    );
    let board = ctx.board;
    let king = ctx.king;

    let rook_like =
        board.pieces_of(Piece::Rook, ctx.them) | board.pieces_of(Piece::Queen, ctx.them);
    if (rook_attacks(king, occupied) & rook_like).is_not_empty() {
        return false;
    }
    let bishop_like =
        board.pieces_of(Piece::Bishop, ctx.them) | board.pieces_of(Piece::Queen, ctx.them);
    if (bishop_attacks(king, occupied) & bishop_like).is_not_empty() {
        return false;
    }
    if (knight_attacks(king) & board.pieces_of(Piece::Knight, ctx.them)).is_not_empty() {
        return false;
    }
    let enemy_pawns =
        board.pieces_of(Piece::Pawn, ctx.them) & !Bitboard::from_square(victim_sq);
    if (pawn_attacks(king, ctx.us) & enemy_pawns).is_not_empty() {
        return false;
    }
    if (king_attacks(king) & board.pieces_of(Piece::King, ctx.them)).is_not_empty() {
        return false;
    }
    true
}

fn generate_king(ctx: &Ctx, analysis: &Analysis, captures: bool, out: &mut MoveList) {
    // Remove the king from occupancy so it cannot shelter behind itself on
    // a slider's ray.
    let attacked = attack_map(ctx.board, ctx.them, ctx.occupied & !Bitboard::from_square(ctx.king));
    let base = if captures {
        ctx.enemies
    } else {
        !ctx.occupied
    };
    let flag = if captures {
        MoveFlag::Capture
    } else {
        MoveFlag::Quiet
    };

    for to in king_attacks(ctx.king) & base & !attacked {
        out.push(Move::new(ctx.king, to, flag));
    }

    if captures || analysis.checker_count > 0 {
        return;
    }

    // Castling: rights intact, path empty, king not in check, the king's
    // two-step path unattacked. The offsets only miss on a board whose
    // rights disagree with the king square; such a record emits nothing.
    let rights = ctx.board.state().castling;
    let safe_and_empty = !ctx.occupied & !attacked;
    if rights.kingside(ctx.us) {
        if let (Some(rook_sq), Some(to)) = (ctx.king.offset(3), ctx.king.offset(2)) {
            let path = between(ctx.king, rook_sq);
            if path & safe_and_empty == path {
                out.push(Move::new(ctx.king, to, MoveFlag::CastleKingside));
            }
        }
    }
    if rights.queenside(ctx.us) {
        if let (Some(rook_sq), Some(path_end), Some(to)) = (
            ctx.king.offset(-4),
            ctx.king.offset(-3),
            ctx.king.offset(-2),
        ) {
            let clear = between(ctx.king, rook_sq);
            let king_path = between(ctx.king, path_end);
            if (clear & ctx.occupied).is_empty() && king_path & safe_and_empty == king_path {
                out.push(Move::new(ctx.king, to, MoveFlag::CastleQueenside));
            }
        }
    }
}

/// The set of squares `color` attacks under the given occupancy.
pub fn attack_map(board: &Board, color: Color, occupied: Bitboard) -> Bitboard {
    let mut attacked = Bitboard::EMPTY;

    let pawns = board.pieces_of(Piece::Pawn, color);
    attacked |= pawns.forward_east(color) | pawns.forward_west(color);

    for from in board.pieces_of(Piece::Knight, color) {
        attacked |= knight_attacks(from);
    }
    for from in board.pieces_of(Piece::Rook, color) | board.pieces_of(Piece::Queen, color) {
        attacked |= rook_attacks(from, occupied);
    }
    for from in board.pieces_of(Piece::Bishop, color) | board.pieces_of(Piece::Queen, color) {
        attacked |= bishop_attacks(from, occupied);
    }
    if let Some(king) = board.king_square(color) {
        attacked |= king_attacks(king);
    }

    attacked
}

/// Returns true if `by` attacks `sq` under the given occupancy.
pub fn is_square_attacked(board: &Board, sq: Square, by: Color, occupied: Bitboard) -> bool {
    // Reverse every capture from the target square.
    if (pawn_attacks(sq, !by) & board.pieces_of(Piece::Pawn, by)).is_not_empty() {
        return true;
    }
    if (knight_attacks(sq) & board.pieces_of(Piece::Knight, by)).is_not_empty() {
        return true;
    }
    let rook_like = board.pieces_of(Piece::Rook, by) | board.pieces_of(Piece::Queen, by);
    if (rook_attacks(sq, occupied) & rook_like).is_not_empty() {
        return true;
    }
    let bishop_like = board.pieces_of(Piece::Bishop, by) | board.pieces_of(Piece::Queen, by);
    if (bishop_attacks(sq, occupied) & bishop_like).is_not_empty() {
        return true;
    }
    if (king_attacks(sq) & board.pieces_of(Piece::King, by)).is_not_empty() {
        return true;
    }
    false
}
