//! Iterative-deepening negamax search.
//!
//! The driver deepens from depth 1 until the depth cap or cancellation.
//! Each node runs a negamax alpha-beta with principal-variation splitting:
//! the first move gets the full window, later moves a zero-window probe
//! with a re-search on an unexpected improvement. Quiet late moves at
//! sufficient depth are searched reduced first. Checks extend the search
//! by one ply under a budget. Leaves fall into a captures-only quiescence
//! search with stand-pat and delta pruning.
//!
//! Cancellation is polled at every node entry and after each child
//! returns; a cancelled search unwinds with the board fully restored and
//! the driver answers with the last completed iteration's move.

use crate::eval;
use crate::gamestate;
use crate::movegen::{self, GenKind, MoveList};
use crate::ordering::{self, HistoryTable, OrderContext};
use crate::tt::{NodeType, TranspositionTable};
use crate::Board;
use sable_core::{Move, MoveFlag, Piece};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Hard cap on search depth and the PV/killer tables.
pub const MAX_PLY: usize = 64;

/// Default depth cap of the deepening driver.
pub const DEFAULT_DEPTH: u8 = 63;

pub const SCORE_MAX: i32 = 32_767;
pub const SCORE_MIN: i32 = -32_767;

/// The score of the side to move when it is mated at the root; a mate at
/// ply `p` scores `MATE_SCORE + p`, so faster mates score stronger.
pub const MATE_SCORE: i32 = SCORE_MIN + 1;

const MAX_EXTENSIONS: u8 = 8;
const QUIESCENCE_CAP: u8 = 30;
const DELTA_MARGIN: i32 = 200;
/// Delta pruning is switched off once the middlegame phase drops here,
/// where material swings decide won endgames.
const DELTA_PHASE_FLOOR: i32 = 4;
/// Search stack head-room past the nominal depth cap: check extensions
/// plus the quiescence tail.
const STACK_SIZE: usize = MAX_PLY + MAX_EXTENSIONS as usize + QUIESCENCE_CAP as usize + 2;

/// One-shot cancellation notifier shared between the search and its
/// deadline timer.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the notifier. Irreversible.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once the notifier has fired.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds for one search call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    /// Hard depth cap; `None` searches to [`DEFAULT_DEPTH`].
    pub depth: Option<u8>,
}

/// Progress of one completed deepening iteration.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub depth: u8,
    pub seldepth: u8,
    /// Score in centipawns from the mover's perspective (mate scores are
    /// near the bounds; see [`mate_in`]).
    pub score: i32,
    pub nodes: u64,
    pub nps: u64,
    pub hashfull: u32,
    pub time_ms: u64,
    pub pv: Vec<Move>,
}

/// Final result of a search call.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The move to play; null only when the position has no legal moves.
    pub best: Move,
    pub score: i32,
    /// Deepest fully completed iteration.
    pub depth: u8,
}

/// Converts a score near the mate bounds into "mate in N moves" (negative
/// when the mover is being mated).
pub fn mate_in(score: i32) -> Option<i32> {
    const BOUND: i32 = -MATE_SCORE - 2 * MAX_PLY as i32;
    if score >= BOUND {
        Some((-MATE_SCORE - score + 1) / 2)
    } else if score <= -BOUND {
        Some(-((score - MATE_SCORE + 1) / 2))
    } else {
        None
    }
}

/// Searches the position until the depth cap or the cancel notifier
/// fires, reporting each completed iteration.
pub fn search(
    board: &mut Board,
    tt: &mut TranspositionTable,
    cancel: &CancelToken,
    limits: SearchLimits,
    mut on_iteration: impl FnMut(&SearchReport),
) -> SearchOutcome {
    let mut searcher = Searcher::new(board, tt, cancel);
    let cap = limits.depth.unwrap_or(DEFAULT_DEPTH).min(DEFAULT_DEPTH);

    let mut outcome = SearchOutcome {
        best: Move::NULL,
        score: 0,
        depth: 0,
    };

    let mut depth = 1u8;
    loop {
        searcher.history.age();
        searcher.pv_len = [0; MAX_PLY];
        searcher.root_move = Move::NULL;
        searcher.root_score = SCORE_MIN;

        searcher.negamax(depth as i32, 0, SCORE_MIN, SCORE_MAX, 0, false);

        if !searcher.root_move.is_null() {
            outcome.best = searcher.root_move;
            outcome.score = searcher.root_score;
            outcome.depth = depth;
            searcher.saved_pv = searcher.pv[0][..searcher.pv_len[0]].to_vec();
            if searcher.saved_pv.first() != Some(&searcher.root_move) {
                searcher.saved_pv = vec![searcher.root_move];
            }

            let time_ms = searcher.start.elapsed().as_millis() as u64;
            let report = SearchReport {
                depth,
                seldepth: searcher.seldepth,
                score: outcome.score,
                nodes: searcher.nodes,
                nps: searcher.nodes * 1000 / time_ms.max(1),
                hashfull: searcher.tt.hashfull(),
                time_ms,
                pv: searcher.saved_pv.clone(),
            };
            on_iteration(&report);

            depth += 1;
        } else if !cancel.is_cancelled() {
            // No move produced without a cancellation: the position has
            // no legal moves, so deepening cannot help.
            break;
        }

        if cancel.is_cancelled() || depth > cap {
            break;
        }
    }

    // Cancelled before the first iteration finished: fall back to the
    // best-ordered legal move so a move is always produced.
    if outcome.best.is_null() {
        let mut moves = MoveList::new();
        movegen::generate_moves(searcher.board, GenKind::All, &mut moves);
        let history = HistoryTable::new();
        let ctx = OrderContext {
            pv_move: Move::NULL,
            tt_move: Move::NULL,
            killers: [Move::NULL; 2],
            history: &history,
        };
        ordering::order_moves(searcher.board, &mut moves, &ctx);
        if !moves.is_empty() {
            outcome.best = moves[0];
        }
    }

    outcome
}

struct Searcher<'a> {
    board: &'a mut Board,
    tt: &'a mut TranspositionTable,
    cancel: &'a CancelToken,
    history: HistoryTable,
    killers: [[Move; 2]; MAX_PLY],
    pools: Vec<MoveList>,
    pv: Box<[[Move; MAX_PLY]; MAX_PLY]>,
    pv_len: [usize; MAX_PLY],
    saved_pv: Vec<Move>,
    root_move: Move,
    root_score: i32,
    nodes: u64,
    seldepth: u8,
    generation: u8,
    start: Instant,
}

impl<'a> Searcher<'a> {
    fn new(board: &'a mut Board, tt: &'a mut TranspositionTable, cancel: &'a CancelToken) -> Self {
        let generation = board.ply_count().min(u8::MAX as usize) as u8;
        Searcher {
            board,
            tt,
            cancel,
            history: HistoryTable::new(),
            killers: [[Move::NULL; 2]; MAX_PLY],
            pools: vec![MoveList::new(); STACK_SIZE],
            pv: Box::new([[Move::NULL; MAX_PLY]; MAX_PLY]),
            pv_len: [0; MAX_PLY],
            saved_pv: Vec::new(),
            root_move: Move::NULL,
            root_score: SCORE_MIN,
            nodes: 0,
            seldepth: 0,
            generation,
            start: Instant::now(),
        }
    }

    fn negamax(
        &mut self,
        depth: i32,
        ply: usize,
        mut alpha: i32,
        beta: i32,
        extensions: u8,
        reduced: bool,
    ) -> i32 {
        if self.cancel.is_cancelled() {
            return 0;
        }
        self.nodes += 1;
        if ply < MAX_PLY {
            self.pv_len[ply] = 0;
        }

        if ply > 0 {
            let state = self.board.state();
            if state.halfmove_clock >= 100
                || self.board.repetition_count() >= 3
                || gamestate::insufficient_material(self.board)
            {
                return 0;
            }
        }

        if depth <= 0 {
            return self.quiescence(alpha, beta, ply, 0);
        }

        let hash = self.board.hash();
        let probe = self
            .tt
            .probe(hash, depth as u8, self.generation, alpha, beta);
        if let Some(hit) = probe.hit {
            if ply == 0 {
                if hit.node_type == NodeType::Pv && !hit.mov.is_null() {
                    self.root_move = hit.mov;
                    self.root_score = hit.score;
                    self.pv[0][0] = hit.mov;
                    self.pv_len[0] = 1;
                    return hit.score;
                }
            } else {
                return hit.score;
            }
        }

        let in_check = self.board.in_check();

        self.pools[ply].clear();
        {
            let (board, pool) = (&*self.board, &mut self.pools[ply]);
            movegen::generate_moves(board, GenKind::All, pool);
        }

        if self.pools[ply].is_empty() {
            return if in_check {
                MATE_SCORE + ply as i32
            } else {
                0
            };
        }

        let pv_move = self.saved_pv.get(ply).copied().unwrap_or(Move::NULL);
        let tt_move = probe.ordering_move.unwrap_or(Move::NULL);
        {
            let ctx = OrderContext {
                pv_move,
                tt_move,
                killers: self.killers[ply.min(MAX_PLY - 1)],
                history: &self.history,
            };
            let (board, pool) = (&*self.board, &mut self.pools[ply]);
            ordering::order_moves(board, pool, &ctx);
        }

        let move_count = self.pools[ply].len();
        let mut node_type = NodeType::All;
        let mut best_move = Move::NULL;
        let mut best_score = SCORE_MIN;

        for i in 0..move_count {
            let m = self.pools[ply][i];
            self.board.make_move(m);

            let gives_check = self.board.in_check();
            let extension = if extensions < MAX_EXTENSIONS && extends(self.board, m, gives_check) {
                1u8
            } else {
                0
            };
            let child_depth = depth - 1 + extension as i32;

            let score = if i == 0 {
                -self.negamax(child_depth, ply + 1, -beta, -alpha, extensions + extension, false)
            } else {
                let tactical = m.flag().is_capture() || m.flag().is_promotion();
                let can_reduce = depth >= 3
                    && !in_check
                    && !gives_check
                    && extension == 0
                    && !reduced
                    && probe.node_type != Some(NodeType::Pv)
                    && !tactical;

                let mut score = if can_reduce {
                    let reduction = depth / 3;
                    let reduced_score = -self.negamax(
                        depth - 1 - reduction,
                        ply + 1,
                        -alpha - 1,
                        -alpha,
                        extensions,
                        true,
                    );
                    if reduced_score > alpha {
                        -self.negamax(child_depth, ply + 1, -alpha - 1, -alpha, extensions, true)
                    } else {
                        reduced_score
                    }
                } else {
                    -self.negamax(
                        child_depth,
                        ply + 1,
                        -alpha - 1,
                        -alpha,
                        extensions + extension,
                        reduced,
                    )
                };

                if score > alpha && score < beta {
                    score = -self.negamax(
                        child_depth,
                        ply + 1,
                        -beta,
                        -alpha,
                        extensions + extension,
                        reduced,
                    );
                }
                score
            };

            self.board.unmake_move();

            if self.cancel.is_cancelled() {
                // Abandon the node; the driver discards this iteration.
                return if best_score > SCORE_MIN { best_score } else { 0 };
            }

            if score > best_score {
                best_score = score;
            }

            if score >= beta {
                self.tt.record(
                    hash,
                    depth as u8,
                    self.generation,
                    NodeType::Cut,
                    best_score,
                    m,
                );
                let quiet = !m.flag().is_capture() && !m.flag().is_promotion();
                if quiet && m != pv_move {
                    self.store_killer(ply, m);
                    if let Some((piece, color)) = self.board.piece_at(m.from()) {
                        self.history.reward(color, piece, m.to(), depth as u8);
                    }
                    self.penalize_tried_quiets(ply, i, m, depth as u8);
                }
                return best_score;
            }

            if score > alpha {
                alpha = score;
                node_type = NodeType::Pv;
                best_move = m;
                self.update_pv(ply, m);
                if ply == 0 {
                    self.root_move = m;
                    self.root_score = score;
                }
            }
        }

        self.tt.record(
            hash,
            depth as u8,
            self.generation,
            node_type,
            alpha,
            best_move,
        );
        alpha
    }

    fn quiescence(&mut self, mut alpha: i32, beta: i32, ply: usize, qdepth: u8) -> i32 {
        if self.cancel.is_cancelled() {
            return 0;
        }
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply.min(u8::MAX as usize) as u8);
        if ply < MAX_PLY {
            self.pv_len[ply] = 0;
        }

        let stand = eval::evaluate(self.board);
        if stand.score >= beta {
            return beta;
        }
        if stand.score > alpha {
            alpha = stand.score;
        }
        if qdepth >= QUIESCENCE_CAP {
            return alpha;
        }

        let margin = alpha - eval::material_score(self.board, stand.mg_phase, stand.eg_phase)
            - DELTA_MARGIN;

        let pool_index = ply.min(STACK_SIZE - 1);
        self.pools[pool_index].clear();
        {
            let (board, pool) = (&*self.board, &mut self.pools[pool_index]);
            movegen::generate_moves(board, GenKind::Captures, pool);
            ordering::order_captures(board, pool);
        }

        for i in 0..self.pools[pool_index].len() {
            let m = self.pools[pool_index][i];

            // Delta pruning: skip captures that cannot lift alpha even
            // with a generous margin. Off in deep endgames, where bare
            // material swings decide.
            if stand.mg_phase > DELTA_PHASE_FLOOR {
                if let Some(value) = self.victim_value(m, stand.mg_phase) {
                    if value < margin {
                        continue;
                    }
                }
            }

            self.board.make_move(m);
            let score = -self.quiescence(-beta, -alpha, ply + 1, qdepth + 1);
            self.board.unmake_move();

            if self.cancel.is_cancelled() {
                return alpha;
            }

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }

    /// The tapered value of the piece a capture removes.
    fn victim_value(&self, m: Move, mg_phase: i32) -> Option<i32> {
        let victim_sq = if m.flag() == MoveFlag::EnPassant {
            m.to().offset(-self.board.side_to_move().push_delta())?
        } else {
            m.to()
        };
        let (piece, color) = self.board.piece_at(victim_sq)?;
        Some(eval::piece_value(piece, color, victim_sq, mg_phase))
    }

    fn store_killer(&mut self, ply: usize, m: Move) {
        let slot = &mut self.killers[ply.min(MAX_PLY - 1)];
        if slot[0] != m {
            slot[1] = slot[0];
            slot[0] = m;
        }
    }

    fn penalize_tried_quiets(&mut self, ply: usize, cutoff_index: usize, cutoff: Move, depth: u8) {
        for j in 0..cutoff_index {
            let tried = self.pools[ply][j];
            if tried == cutoff || tried.flag().is_capture() || tried.flag().is_promotion() {
                continue;
            }
            if let Some((piece, color)) = self.board.piece_at(tried.from()) {
                self.history.penalize(color, piece, tried.to(), depth);
            }
        }
    }

    fn update_pv(&mut self, ply: usize, m: Move) {
        if ply >= MAX_PLY {
            return;
        }
        self.pv[ply][0] = m;
        let child_len = if ply + 1 < MAX_PLY {
            self.pv_len[ply + 1].min(MAX_PLY - ply - 1)
        } else {
            0
        };
        for k in 0..child_len {
            self.pv[ply][k + 1] = self.pv[ply + 1][k];
        }
        self.pv_len[ply] = child_len + 1;
    }
}

/// Extension test: checks are always interesting, as is a pawn arriving
/// one step from promotion.
fn extends(board: &Board, m: Move, gives_check: bool) -> bool {
    if gives_check {
        return true;
    }
    match board.piece_at(m.to()) {
        Some((Piece::Pawn, color)) => eval::pawn_near_promotion(color, m.to()),
        _ => false,
    }
}
