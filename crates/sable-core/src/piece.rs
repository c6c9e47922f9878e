//! Piece kinds.

use crate::Color;

/// The six piece kinds. Variant order is conventional value order, so
/// the discriminants index value and piece-square tables directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    /// All six kinds, in table order.
    pub const ALL: [Piece; 6] = [
        Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King,
    ];

    /// Index into per-piece tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The lowercase piece letter. One letter set serves every text
    /// surface: FEN placement (cased by color) and the promotion suffix
    /// of long-algebraic move text.
    #[inline]
    pub const fn letter(self) -> char {
        match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        }
    }

    /// The FEN board letter: White pieces print uppercase.
    #[inline]
    pub const fn fen_char(self, color: Color) -> char {
        match color {
            Color::White => self.letter().to_ascii_uppercase(),
            Color::Black => self.letter(),
        }
    }

    /// Decodes a FEN board letter by searching the letter table; the
    /// case carries the color.
    pub const fn from_fen_char(c: char) -> Option<(Piece, Color)> {
        let lower = c.to_ascii_lowercase();
        let mut i = 0;
        while i < Self::ALL.len() {
            let piece = Self::ALL[i];
            if piece.letter() == lower {
                let color = if c.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                return Some((piece, color));
            }
            i += 1;
        }
        None
    }
}
