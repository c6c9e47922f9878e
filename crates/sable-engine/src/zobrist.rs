//! Zobrist hashing for position identification.
//!
//! A position hash is the XOR of one random key per piece-on-square, plus
//! keys for the castle-rights bitmap, the en passant file, and the side to
//! move. XOR being its own inverse makes the hash cheap to maintain
//! incrementally across make/unmake.
//!
//! The keys come from Bob Jenkins' small-state PRNG with a fixed seed, so
//! the table is identical on every build; book files and stored hashes stay
//! valid across versions.

use sable_core::{Color, Piece, Square};

const ZOBRIST_SEED: u64 = 2_361_912;

/// Zobrist hash keys.
pub struct ZobristKeys {
    /// Keys for pieces: [piece][color][square]
    pieces: [[[u64; 64]; 2]; 6],
    /// Keys for each value of the 4-bit castle-rights bitmap.
    castling: [u64; 16],
    /// Keys for the en passant file. Only the file matters: the rank is
    /// implied by the side to move.
    en_passant: [u64; 8],
    /// Key XORed in while White is to move.
    white_to_move: u64,
}

/// Small-state generator (Jenkins' "A small noncryptographic PRNG").
struct Ranctx {
    a: u64,
    b: u64,
    c: u64,
    d: u64,
}

impl Ranctx {
    const fn seeded(seed: u64) -> Self {
        let mut rng = Ranctx {
            a: 0xf1ea_5eed,
            b: seed,
            c: seed,
            d: seed,
        };
        // Warm-up rounds to spread the seed through the state.
        let mut i = 0;
        while i < 20 {
            rng = rng.step().0;
            i += 1;
        }
        rng
    }

    const fn step(self) -> (Self, u64) {
        let e = self.a.wrapping_sub(self.b.rotate_left(7));
        let a = self.b ^ self.c.rotate_left(13);
        let b = self.c.wrapping_add(self.d.rotate_left(37));
        let c = self.d.wrapping_add(e);
        let d = e.wrapping_add(a);
        (Ranctx { a, b, c, d }, d)
    }
}

impl ZobristKeys {
    const fn new() -> Self {
        let mut rng = Ranctx::seeded(ZOBRIST_SEED);
        let mut pieces = [[[0u64; 64]; 2]; 6];
        let mut castling = [0u64; 16];
        let mut en_passant = [0u64; 8];

        let mut piece = 0;
        while piece < 6 {
            let mut color = 0;
            while color < 2 {
                let mut square = 0;
                while square < 64 {
                    let (next, value) = rng.step();
                    rng = next;
                    pieces[piece][color][square] = value;
                    square += 1;
                }
                color += 1;
            }
            piece += 1;
        }

        let mut i = 0;
        while i < 16 {
            let (next, value) = rng.step();
            rng = next;
            castling[i] = value;
            i += 1;
        }

        let mut i = 0;
        while i < 8 {
            let (next, value) = rng.step();
            rng = next;
            en_passant[i] = value;
            i += 1;
        }

        let (_, white_to_move) = rng.step();

        ZobristKeys {
            pieces,
            castling,
            en_passant,
            white_to_move,
        }
    }

    /// Returns the key for a piece of a color on a square.
    #[inline]
    pub fn piece(&self, piece: Piece, color: Color, square: Square) -> u64 {
        self.pieces[piece.index()][color.index()][square.index() as usize]
    }

    /// Returns the key for a castle-rights bitmap (0-15).
    #[inline]
    pub fn castling(&self, rights: u8) -> u64 {
        self.castling[(rights & 0xF) as usize]
    }

    /// Returns the key for an en passant target; only its file enters
    /// the hash, the rank being implied by the side to move.
    #[inline]
    pub fn en_passant(&self, target: Square) -> u64 {
        self.en_passant[target.file() as usize]
    }

    /// Returns the side-to-move key (XORed in while White moves).
    #[inline]
    pub fn white_to_move(&self) -> u64 {
        self.white_to_move
    }
}

/// Global Zobrist keys, generated at compile time.
pub static ZOBRIST: ZobristKeys = ZobristKeys::new();

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_are_nonzero() {
        assert_ne!(ZOBRIST.white_to_move(), 0);
        assert_ne!(ZOBRIST.piece(Piece::Pawn, Color::White, Square::A1), 0);
        assert_ne!(ZOBRIST.castling(0b1111), 0);
        assert_ne!(ZOBRIST.en_passant(Square::parse("e3").unwrap()), 0);
    }

    #[test]
    fn keys_are_distinct() {
        let mut seen = HashSet::new();
        for piece in Piece::ALL {
            for color in Color::BOTH {
                for index in 0..Square::COUNT {
                    let sq = Square::try_new(index).unwrap();
                    assert!(seen.insert(ZOBRIST.piece(piece, color, sq)));
                }
            }
        }
        for rights in 0..16u8 {
            assert!(seen.insert(ZOBRIST.castling(rights)));
        }
        for file in 0..8 {
            let target = Square::at(file, 2).unwrap();
            assert!(seen.insert(ZOBRIST.en_passant(target)));
        }
        assert!(seen.insert(ZOBRIST.white_to_move()));
    }

    #[test]
    fn en_passant_keyed_by_file_only() {
        let e3 = Square::parse("e3").unwrap();
        let e6 = Square::parse("e6").unwrap();
        let d3 = Square::parse("d3").unwrap();
        assert_eq!(ZOBRIST.en_passant(e3), ZOBRIST.en_passant(e6));
        assert_ne!(ZOBRIST.en_passant(e3), ZOBRIST.en_passant(d3));
    }

    #[test]
    fn generator_is_reproducible() {
        // Same seed, same stream.
        let (rng, first) = Ranctx::seeded(ZOBRIST_SEED).step();
        let (_, second) = rng.step();
        let (rng2, first2) = Ranctx::seeded(ZOBRIST_SEED).step();
        let (_, second2) = rng2.step();
        assert_eq!(first, first2);
        assert_eq!(second, second2);
        assert_ne!(first, second);
    }
}
