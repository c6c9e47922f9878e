//! Board representation with an undo stack.
//!
//! The board keeps twelve piece bitboards plus an authoritative per-square
//! array, and a stack of per-ply state records carrying everything needed
//! to reverse the last move in O(1): castle rights, en passant target,
//! clocks, the producing move, the captured piece, and the Zobrist hash.
//! Make and unmake mutate the piece placement in place; popping a state
//! record restores captures and promotions.

use crate::movegen;
use crate::zobrist::ZOBRIST;
use crate::Bitboard;
use sable_core::fen::{split_fields, FenError, STARTPOS};
use sable_core::{Color, Move, MoveFlag, Piece, Square};
use std::collections::HashMap;
use std::fmt;

/// Castling rights bitmap (4 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;

    /// Creates castling rights from raw flags.
    #[inline]
    pub const fn new(flags: u8) -> Self {
        CastlingRights(flags & 0b1111)
    }

    /// Returns true if the given side may castle kingside.
    #[inline]
    pub const fn kingside(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        };
        self.0 & flag != 0
    }

    /// Returns true if the given side may castle queenside.
    #[inline]
    pub const fn queenside(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        };
        self.0 & flag != 0
    }

    /// Removes both rights for a color.
    #[inline]
    pub fn remove_color(&mut self, color: Color) {
        let mask = match color {
            Color::White => Self::WHITE_KINGSIDE | Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_KINGSIDE | Self::BLACK_QUEENSIDE,
        };
        self.0 &= !mask;
    }

    /// Removes the kingside right for a color.
    #[inline]
    pub fn remove_kingside(&mut self, color: Color) {
        let flag = match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        };
        self.0 &= !flag;
    }

    /// Removes the queenside right for a color.
    #[inline]
    pub fn remove_queenside(&mut self, color: Color) {
        let flag = match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        };
        self.0 &= !flag;
    }

    /// Returns the raw 4-bit value.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// Per-ply state record.
///
/// One record is pushed by every make and popped by the matching unmake.
/// `hash` always equals the full Zobrist recomputation of the position the
/// record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInfo {
    /// Zobrist hash of the position.
    pub hash: u64,
    /// Castle rights bitmap.
    pub castling: CastlingRights,
    /// En passant target square, if the last move was a double push.
    pub en_passant: Option<Square>,
    /// The side to move.
    pub side_to_move: Color,
    /// Half-moves since the last capture or pawn move.
    pub halfmove_clock: u32,
    /// Full-move counter, incremented after Black's move.
    pub fullmove_number: u32,
    /// The move that produced this state (null for the initial state).
    pub last_move: Move,
    /// The piece captured by `last_move`, if any (a pawn for en passant).
    pub captured: Option<(Piece, Color)>,
    /// Cached "side to move is in check".
    pub in_check: bool,
}

/// A chess position with full make/unmake history.
#[derive(Clone)]
pub struct Board {
    /// Piece bitboards, indexed `[color][piece]`.
    pieces: [[Bitboard; 6]; 2],
    /// Authoritative per-square lookup.
    squares: [Option<(Piece, Color)>; 64],
    /// State stack; never empty.
    states: Vec<StateInfo>,
    /// Position hash -> number of occurrences in the game history.
    repetitions: HashMap<u64, u32>,
}

impl Board {
    /// Creates the standard starting position.
    pub fn startpos() -> Self {
        Self::from_fen(STARTPOS).expect("the starting position parses")
    }

    /// Creates a board from a FEN string. Validation happens in one pass
    /// while the pieces are placed; the board is only returned when all
    /// six fields are well formed.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let [placement, side, castling, en_passant, halfmove, fullmove] = split_fields(fen)?;

        let mut board = Board {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            squares: [None; 64],
            states: Vec::with_capacity(64),
            repetitions: HashMap::new(),
        };

        // Placement runs rank 8 down to rank 1; digits skip files.
        let mut rows = placement.split('/');
        for rank in (0..8u8).rev() {
            let row = rows
                .next()
                .ok_or_else(|| FenError::Placement("fewer than 8 ranks".to_string()))?;
            let mut file = 0u8;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else if let Some((piece, color)) = Piece::from_fen_char(c) {
                    let sq = Square::at(file, rank).ok_or_else(|| {
                        FenError::Placement(format!("rank {} overflows", rank + 1))
                    })?;
                    board.put_piece(piece, color, sq);
                    file += 1;
                } else {
                    return Err(FenError::Placement(format!("unexpected '{}'", c)));
                }
            }
            if file != 8 {
                return Err(FenError::Placement(format!(
                    "rank {} covers {} files",
                    rank + 1,
                    file
                )));
            }
        }
        if rows.next().is_some() {
            return Err(FenError::Placement("more than 8 ranks".to_string()));
        }

        let side_to_move = match (side.len(), side.chars().next()) {
            (1, Some(c)) => Color::from_fen_char(c),
            _ => None,
        }
        .ok_or_else(|| FenError::SideToMove(side.to_string()))?;

        let mut rights = 0u8;
        if castling != "-" {
            if castling.is_empty() || castling.len() > 4 {
                return Err(FenError::Castling(castling.to_string()));
            }
            for c in castling.chars() {
                rights |= match c {
                    'K' => CastlingRights::WHITE_KINGSIDE,
                    'Q' => CastlingRights::WHITE_QUEENSIDE,
                    'k' => CastlingRights::BLACK_KINGSIDE,
                    'q' => CastlingRights::BLACK_QUEENSIDE,
                    _ => return Err(FenError::Castling(castling.to_string())),
                };
            }
        }

        // The target square sits on rank 3 or 6, depending on who just
        // pushed.
        let en_passant = match en_passant {
            "-" => None,
            text => Some(
                Square::parse(text)
                    .filter(|sq| sq.rank() == 2 || sq.rank() == 5)
                    .ok_or_else(|| FenError::EnPassant(text.to_string()))?,
            ),
        };

        let halfmove_clock = halfmove
            .parse::<u32>()
            .map_err(|_| FenError::HalfmoveClock(halfmove.to_string()))?;
        let fullmove_number = fullmove
            .parse::<u32>()
            .map_err(|_| FenError::FullmoveNumber(fullmove.to_string()))?;

        let mut state = StateInfo {
            hash: 0,
            castling: CastlingRights::new(rights),
            en_passant,
            side_to_move,
            halfmove_clock,
            fullmove_number,
            last_move: Move::NULL,
            captured: None,
            in_check: false,
        };
        state.in_check = board.king_attacked(side_to_move);
        board.states.push(state);

        let hash = board.full_hash();
        board.states[0].hash = hash;
        board.repetitions.insert(hash, 1);

        Ok(board)
    }

    /// Serializes the position to FEN.
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                let sq = Square::at(file, rank).expect("0..8 coordinates");
                if let Some((piece, color)) = self.piece_at(sq) {
                    if empty > 0 {
                        fen.push_str(&empty.to_string());
                        empty = 0;
                    }
                    fen.push(piece.fen_char(color));
                } else {
                    empty += 1;
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        let state = self.state();
        fen.push(' ');
        fen.push(state.side_to_move.fen_char());

        fen.push(' ');
        if state.castling.raw() == 0 {
            fen.push('-');
        } else {
            if state.castling.kingside(Color::White) {
                fen.push('K');
            }
            if state.castling.queenside(Color::White) {
                fen.push('Q');
            }
            if state.castling.kingside(Color::Black) {
                fen.push('k');
            }
            if state.castling.queenside(Color::Black) {
                fen.push('q');
            }
        }

        fen.push(' ');
        match state.en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&state.halfmove_clock.to_string());
        fen.push(' ');
        fen.push_str(&state.fullmove_number.to_string());

        fen
    }

    /// Returns the top state record.
    #[inline]
    pub fn state(&self) -> &StateInfo {
        self.states.last().expect("state stack is never empty")
    }

    /// Returns the side to move.
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.state().side_to_move
    }

    /// Returns true if the side to move is in check.
    #[inline]
    pub fn in_check(&self) -> bool {
        self.state().in_check
    }

    /// Returns the position hash.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.state().hash
    }

    /// Number of states on the stack (1 for a fresh board). Used as the
    /// transposition-table generation tag.
    #[inline]
    pub fn ply_count(&self) -> usize {
        self.states.len()
    }

    /// Returns how many times the current position has occurred.
    #[inline]
    pub fn repetition_count(&self) -> u32 {
        self.repetitions.get(&self.hash()).copied().unwrap_or(0)
    }

    /// Returns how many times the given hash has occurred.
    #[inline]
    pub fn repetition_count_of(&self, hash: u64) -> u32 {
        self.repetitions.get(&hash).copied().unwrap_or(0)
    }

    /// Returns the piece and color on a square, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        self.squares[sq.index() as usize]
    }

    /// Returns the bitboard of one piece type of one color.
    #[inline]
    pub fn pieces_of(&self, piece: Piece, color: Color) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    /// Returns the occupancy of one color.
    #[inline]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        let boards = &self.pieces[color.index()];
        boards[0] | boards[1] | boards[2] | boards[3] | boards[4] | boards[5]
    }

    /// Returns the occupancy of both colors.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.occupancy(Color::White) | self.occupancy(Color::Black)
    }

    /// Returns the king square of a color, if the king is on the board.
    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(Piece::King, color).lsb()
    }

    fn king_attacked(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(sq) => movegen::is_square_attacked(self, sq, !color, self.occupied()),
            None => false,
        }
    }

    #[inline]
    fn put_piece(&mut self, piece: Piece, color: Color, sq: Square) {
        self.pieces[color.index()][piece.index()].set(sq);
        self.squares[sq.index() as usize] = Some((piece, color));
    }

    #[inline]
    fn take_piece(&mut self, sq: Square) -> Option<(Piece, Color)> {
        let entry = self.squares[sq.index() as usize].take();
        if let Some((piece, color)) = entry {
            self.pieces[color.index()][piece.index()].clear(sq);
        }
        entry
    }

    /// Makes a move assumed to be legal for the current position.
    pub fn make_move(&mut self, m: Move) {
        let prev = *self.state();
        let mover = prev.side_to_move;
        let from = m.from();
        let to = m.to();
        let flag = m.flag();

        let mut st = StateInfo {
            hash: prev.hash ^ ZOBRIST.white_to_move(),
            castling: prev.castling,
            en_passant: None,
            side_to_move: !mover,
            halfmove_clock: prev.halfmove_clock + 1,
            fullmove_number: prev.fullmove_number
                + (mover == Color::Black) as u32,
            last_move: m,
            captured: None,
            in_check: false,
        };

        if let Some(ep) = prev.en_passant {
            st.hash ^= ZOBRIST.en_passant(ep);
        }

        let (piece, color) = self
            .take_piece(from)
            .expect("make_move: from-square is empty");
        debug_assert_eq!(color, mover, "make_move: moving the wrong color");
        st.hash ^= ZOBRIST.piece(piece, color, from);

        if piece == Piece::Pawn {
            st.halfmove_clock = 0;
        }

        match flag {
            MoveFlag::DoublePush => {
                let transit = from
                    .offset(mover.push_delta())
                    .expect("double push transit square on board");
                st.en_passant = Some(transit);
                st.hash ^= ZOBRIST.en_passant(transit);
            }
            MoveFlag::CastleKingside => {
                let rook_from = to.offset(1).expect("kingside rook square");
                let rook_to = to.offset(-1).expect("kingside rook target");
                self.take_piece(rook_from);
                self.put_piece(Piece::Rook, color, rook_to);
                st.hash ^= ZOBRIST.piece(Piece::Rook, color, rook_from)
                    ^ ZOBRIST.piece(Piece::Rook, color, rook_to);
            }
            MoveFlag::CastleQueenside => {
                let rook_from = to.offset(-2).expect("queenside rook square");
                let rook_to = to.offset(1).expect("queenside rook target");
                self.take_piece(rook_from);
                self.put_piece(Piece::Rook, color, rook_to);
                st.hash ^= ZOBRIST.piece(Piece::Rook, color, rook_from)
                    ^ ZOBRIST.piece(Piece::Rook, color, rook_to);
            }
            _ => {}
        }

        if flag.is_capture() {
            let victim_sq = if flag == MoveFlag::EnPassant {
                // The captured pawn sits behind the destination square.
                to.offset(-mover.push_delta())
                    .expect("en passant victim square on board")
            } else {
                to
            };
            let victim = self
                .take_piece(victim_sq)
                .expect("capture move targets an empty square");
            st.hash ^= ZOBRIST.piece(victim.0, victim.1, victim_sq);
            st.captured = Some(victim);
            st.halfmove_clock = 0;
        }

        let arriving = flag.promotion_piece().unwrap_or(piece);
        self.put_piece(arriving, color, to);
        st.hash ^= ZOBRIST.piece(arriving, color, to);

        // Castle rights: king moves drop both, rook moves and corner
        // captures drop one side.
        if piece == Piece::King {
            st.castling.remove_color(mover);
        }
        for (corner, color_at, kingside) in [
            (Square::H1, Color::White, true),
            (Square::A1, Color::White, false),
            (Square::H8, Color::Black, true),
            (Square::A8, Color::Black, false),
        ] {
            if from == corner || to == corner {
                if kingside {
                    st.castling.remove_kingside(color_at);
                } else {
                    st.castling.remove_queenside(color_at);
                }
            }
        }
        if st.castling != prev.castling {
            st.hash ^=
                ZOBRIST.castling(prev.castling.raw()) ^ ZOBRIST.castling(st.castling.raw());
        }

        st.in_check = self.king_attacked(st.side_to_move);
        self.states.push(st);
        *self.repetitions.entry(st.hash).or_insert(0) += 1;

        debug_assert_eq!(self.hash(), self.full_hash(), "incremental hash diverged");
    }

    /// Reverses the last move made with [`Board::make_move`].
    pub fn unmake_move(&mut self) {
        debug_assert!(self.states.len() > 1, "unmake_move: state stack underflow");
        let st = match self.states.pop() {
            Some(st) => st,
            None => return,
        };
        let m = st.last_move;
        if m.is_null() {
            return;
        }

        if let Some(count) = self.repetitions.get_mut(&st.hash) {
            *count -= 1;
            if *count == 0 {
                self.repetitions.remove(&st.hash);
            }
        }

        let from = m.from();
        let to = m.to();
        let flag = m.flag();
        let mover = self.state().side_to_move;

        let (piece, color) = self
            .take_piece(to)
            .expect("unmake_move: destination square is empty");
        debug_assert_eq!(color, mover);

        match flag {
            MoveFlag::CastleKingside => {
                let rook_from = to.offset(1).expect("kingside rook square");
                let rook_to = to.offset(-1).expect("kingside rook target");
                self.take_piece(rook_to);
                self.put_piece(Piece::Rook, color, rook_from);
            }
            MoveFlag::CastleQueenside => {
                let rook_from = to.offset(-2).expect("queenside rook square");
                let rook_to = to.offset(1).expect("queenside rook target");
                self.take_piece(rook_to);
                self.put_piece(Piece::Rook, color, rook_from);
            }
            _ => {}
        }

        if let Some((victim, victim_color)) = st.captured {
            let victim_sq = if flag == MoveFlag::EnPassant {
                to.offset(-mover.push_delta())
                    .expect("en passant victim square on board")
            } else {
                to
            };
            self.put_piece(victim, victim_color, victim_sq);
        }

        // A promoted piece turns back into the pawn that pushed.
        let original = if flag.is_promotion() {
            Piece::Pawn
        } else {
            piece
        };
        self.put_piece(original, color, from);
    }

    /// Makes a null move: flips the side to move and clears the en passant
    /// target without moving a piece. Used by null-move pruning.
    pub fn make_null(&mut self) {
        let prev = *self.state();
        let mut st = StateInfo {
            hash: prev.hash ^ ZOBRIST.white_to_move(),
            castling: prev.castling,
            en_passant: None,
            side_to_move: !prev.side_to_move,
            halfmove_clock: prev.halfmove_clock + 1,
            fullmove_number: prev.fullmove_number
                + (prev.side_to_move == Color::Black) as u32,
            last_move: Move::NULL,
            captured: None,
            in_check: false,
        };
        if let Some(ep) = prev.en_passant {
            st.hash ^= ZOBRIST.en_passant(ep);
        }
        st.in_check = self.king_attacked(st.side_to_move);
        self.states.push(st);
    }

    /// Reverses a [`Board::make_null`].
    pub fn unmake_null(&mut self) {
        debug_assert!(self.states.len() > 1, "unmake_null: state stack underflow");
        debug_assert!(self.state().last_move.is_null());
        self.states.pop();
    }

    /// Recomputes the Zobrist hash of the current position from scratch.
    pub fn full_hash(&self) -> u64 {
        let state = self.state();
        let mut hash = 0u64;

        for (index, entry) in self.squares.iter().enumerate() {
            if let Some((piece, color)) = entry {
                let sq = Square::try_new(index as u8).expect("0..64");
                hash ^= ZOBRIST.piece(*piece, *color, sq);
            }
        }

        hash ^= ZOBRIST.castling(state.castling.raw());

        if let Some(ep) = state.en_passant {
            hash ^= ZOBRIST.en_passant(ep);
        }

        if state.side_to_move == Color::White {
            hash ^= ZOBRIST.white_to_move();
        }

        hash
    }

    /// Generates the legal moves of the current position.
    pub fn legal_moves(&self) -> movegen::MoveList {
        let mut moves = movegen::MoveList::new();
        movegen::generate_moves(self, movegen::GenKind::All, &mut moves);
        moves
    }

    /// Resolves a long-algebraic move string against the legal move list.
    pub fn find_legal(&self, uci: &str) -> Option<Move> {
        let (from, to, promotion) = Move::parse_uci(uci)?;
        self.legal_moves()
            .as_slice()
            .iter()
            .copied()
            .find(|m| m.from() == from && m.to() == to && m.flag().promotion_piece() == promotion)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board({})", self.to_fen())?;
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let sq = Square::at(file, rank).expect("0..8 coordinates");
                match self.piece_at(sq) {
                    Some((piece, color)) => write!(f, "{} ", piece.fen_char(color))?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_equal(a: &Board, b: &Board) -> bool {
        a.pieces == b.pieces && a.squares == b.squares && a.state() == b.state()
    }

    #[test]
    fn startpos_fen_roundtrip() {
        let board = Board::startpos();
        assert_eq!(board.to_fen(), STARTPOS);
        assert_eq!(board.occupied().count(), 32);
        assert!(!board.in_check());
        assert_eq!(board.repetition_count(), 1);
    }

    #[test]
    fn custom_fen_roundtrip() {
        for fen in [
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w - - 0 1",
            "8/8/8/8/8/k7/p7/K7 w - - 0 1",
        ] {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(board.to_fen(), fen);
        }
    }

    #[test]
    fn malformed_fen_is_rejected() {
        for fen in [
            "",
            "only three fields here",
            // Seven ranks.
            "8/8/8/8/8/8/8 w - - 0 1",
            // Nine ranks.
            "8/8/8/8/8/8/8/8/8 w - - 0 1",
            // A rank covering seven files.
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPP/RNBQKBNR w KQkq - 0 1",
            // An invalid placement character.
            "rnbqkbnr/ppppXppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            // Bad side to move.
            "8/8/8/8/8/8/8/8 x - - 0 1",
            // Bad castling letter.
            "8/8/8/8/8/8/8/8 w KX - 0 1",
            // En passant target off the third and sixth ranks.
            "8/8/8/8/8/8/8/8 w - e4 0 1",
            // Non-numeric clocks.
            "8/8/8/8/8/8/8/8 w - - x 1",
            "8/8/8/8/8/8/8/8 w - - 0 x",
        ] {
            assert!(Board::from_fen(fen).is_err(), "accepted: {}", fen);
        }
    }

    #[test]
    fn squares_and_bitboards_agree() {
        let board = Board::startpos();
        let mut total = 0;
        for index in 0..64 {
            let sq = Square::try_new(index).unwrap();
            match board.piece_at(sq) {
                Some((piece, color)) => {
                    assert!(board.pieces_of(piece, color).contains(sq));
                    total += 1;
                }
                None => {
                    for piece in Piece::ALL {
                        for color in Color::BOTH {
                            assert!(!board.pieces_of(piece, color).contains(sq));
                        }
                    }
                }
            }
        }
        assert_eq!(total, board.occupied().count());
    }

    #[test]
    fn make_unmake_restores_board() {
        let mut board = Board::startpos();
        let reference = board.clone();

        for m in board.legal_moves().as_slice().to_vec() {
            board.make_move(m);
            board.unmake_move();
            assert!(board_equal(&board, &reference), "move {} broke unmake", m);
            assert_eq!(board.hash(), board.full_hash());
        }
    }

    #[test]
    fn make_unmake_restores_special_moves() {
        // Castling, promotions, and en passant all in one position.
        let fen = "r3k2r/pPpp1ppp/8/3Pp3/8/8/PPP1PPPP/R3K2R w KQkq e6 0 10";
        let mut board = Board::from_fen(fen).unwrap();
        let reference = board.clone();

        for m in board.legal_moves().as_slice().to_vec() {
            board.make_move(m);
            assert_eq!(board.hash(), board.full_hash(), "hash after {}", m);
            board.unmake_move();
            assert!(board_equal(&board, &reference), "move {} broke unmake", m);
        }
    }

    #[test]
    fn incremental_hash_along_a_line() {
        let mut board = Board::startpos();
        for uci in ["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4"] {
            let m = board.find_legal(uci).expect(uci);
            board.make_move(m);
            assert_eq!(board.hash(), board.full_hash(), "after {}", uci);
        }
    }

    #[test]
    fn double_push_sets_en_passant() {
        let mut board = Board::startpos();
        let m = board.find_legal("e2e4").unwrap();
        board.make_move(m);
        assert_eq!(
            board.state().en_passant,
            Some(Square::parse("e3").unwrap())
        );

        let m = board.find_legal("g8f6").unwrap();
        board.make_move(m);
        assert_eq!(board.state().en_passant, None);
    }

    #[test]
    fn en_passant_capture_removes_pawn() {
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3")
                .unwrap();
        let m = board.find_legal("d4e3").unwrap();
        assert_eq!(m.flag(), MoveFlag::EnPassant);
        board.make_move(m);
        // The e4 pawn is gone, the black pawn sits on e3.
        assert_eq!(
            board.piece_at(Square::parse("e4").unwrap()),
            None
        );
        assert_eq!(
            board.piece_at(Square::parse("e3").unwrap()),
            Some((Piece::Pawn, Color::Black))
        );
        board.unmake_move();
        assert_eq!(
            board.piece_at(Square::parse("e4").unwrap()),
            Some((Piece::Pawn, Color::White))
        );
    }

    #[test]
    fn castling_moves_rook() {
        let mut board =
            Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let m = board.find_legal("e1g1").unwrap();
        assert_eq!(m.flag(), MoveFlag::CastleKingside);
        board.make_move(m);
        assert_eq!(
            board.piece_at(Square::F1),
            Some((Piece::Rook, Color::White))
        );
        assert_eq!(board.piece_at(Square::H1), None);
        assert!(!board.state().castling.kingside(Color::White));
        assert!(!board.state().castling.queenside(Color::White));

        board.unmake_move();
        assert_eq!(
            board.piece_at(Square::H1),
            Some((Piece::Rook, Color::White))
        );
        assert!(board.state().castling.kingside(Color::White));
    }

    #[test]
    fn rook_capture_clears_castle_right() {
        let mut board =
            Board::from_fen("r3k2r/pppppp1p/6p1/8/8/1P6/PBPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let m = board.find_legal("b2h8").unwrap();
        board.make_move(m);
        assert!(!board.state().castling.kingside(Color::Black));
        assert!(board.state().castling.queenside(Color::Black));
    }

    #[test]
    fn promotion_and_unmake() {
        let mut board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let m = board.find_legal("a7a8q").unwrap();
        board.make_move(m);
        assert_eq!(
            board.piece_at(Square::A8),
            Some((Piece::Queen, Color::White))
        );
        board.unmake_move();
        assert_eq!(
            board.piece_at(Square::parse("a7").unwrap()),
            Some((Piece::Pawn, Color::White))
        );
        assert_eq!(board.piece_at(Square::A8), None);
    }

    #[test]
    fn repetition_counting() {
        let mut board = Board::startpos();
        let start_hash = board.hash();
        assert_eq!(board.repetition_count_of(start_hash), 1);

        for _ in 0..2 {
            for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                let m = board.find_legal(uci).unwrap();
                board.make_move(m);
            }
        }
        assert_eq!(board.hash(), start_hash);
        assert_eq!(board.repetition_count(), 3);

        board.unmake_move();
        assert_eq!(board.repetition_count_of(start_hash), 2);
    }

    #[test]
    fn null_move_flips_side_and_clears_ep() {
        let mut board = Board::startpos();
        let m = board.find_legal("e2e4").unwrap();
        board.make_move(m);
        let hash_before = board.hash();

        board.make_null();
        assert_eq!(board.side_to_move(), Color::White);
        assert_eq!(board.state().en_passant, None);
        assert_eq!(board.hash(), board.full_hash());
        assert_ne!(board.hash(), hash_before);

        board.unmake_null();
        assert_eq!(board.hash(), hash_before);
        assert_eq!(board.side_to_move(), Color::Black);
    }

    #[test]
    fn check_flag_maintained() {
        let mut board = Board::startpos();
        for uci in ["e2e4", "e7e5", "d1h5", "b8c6", "h5f7"] {
            let m = board.find_legal(uci).expect(uci);
            board.make_move(m);
        }
        // Qxf7 is checkmate-ish pressure; black is in check.
        assert!(board.in_check());
        board.unmake_move();
        assert!(!board.in_check());
    }

    #[test]
    fn fullmove_number_increments_after_black() {
        let mut board = Board::startpos();
        assert_eq!(board.state().fullmove_number, 1);
        board.make_move(board.find_legal("e2e4").unwrap());
        assert_eq!(board.state().fullmove_number, 1);
        board.make_move(board.find_legal("e7e5").unwrap());
        assert_eq!(board.state().fullmove_number, 2);
    }

    #[test]
    fn halfmove_clock_resets() {
        let mut board = Board::startpos();
        board.make_move(board.find_legal("g1f3").unwrap());
        assert_eq!(board.state().halfmove_clock, 1);
        board.make_move(board.find_legal("e7e5").unwrap());
        assert_eq!(board.state().halfmove_clock, 0);
        board.make_move(board.find_legal("f3e5").unwrap());
        assert_eq!(board.state().halfmove_clock, 0);
    }
}
