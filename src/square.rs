use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A board square, indexed 0..64 with 0 = a8 and 63 = h1.
///
/// Square (file f, rank r) maps to index `(7 - r) * 8 + f`, so the index
/// order matches the piece-placement order of a FEN string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square(u8);

impl Square {
    /// Build from a raw 0..64 index. Panics on out-of-range input.
    #[inline(always)]
    pub fn from_index(idx: u8) -> Self {
        assert!(idx < 64, "square index out of range: {}", idx);
        Square(idx)
    }

    /// Build from file (0 = a) and rank (0 = rank 1).
    #[inline(always)]
    pub fn at(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Square((7 - rank) * 8 + file)
    }

    #[inline(always)]
    pub fn index(self) -> u8 {
        self.0
    }

    /// File 0..8, 0 = a-file.
    #[inline(always)]
    pub fn file(self) -> u8 {
        self.0 % 8
    }

    /// Rank 0..8, 0 = rank 1 (White's back rank).
    #[inline(always)]
    pub fn rank(self) -> u8 {
        7 - self.0 / 8
    }

    /// Step by a (file, rank) delta, or None when the step leaves the board.
    #[inline(always)]
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let f = self.file() as i8 + df;
        let r = self.rank() as i8 + dr;
        if (0..8).contains(&f) && (0..8).contains(&r) {
            Some(Square::at(f as u8, r as u8))
        } else {
            None
        }
    }

    /// Bit mask for u64 square sets.
    #[inline(always)]
    pub fn bit(self) -> u64 {
        1u64 << self.0
    }
}

impl TryFrom<u8> for Square {
    type Error = u8;

    fn try_from(idx: u8) -> Result<Self, Self::Error> {
        if idx < 64 { Ok(Square(idx)) } else { Err(idx) }
    }
}

impl FromStr for Square {
    type Err = String;

    /// Parse algebraic notation, e.g. "e4".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(format!("invalid square notation '{}'", s));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file > 7 || rank > 7 {
            return Err(format!("invalid square notation '{}'", s));
        }
        Ok(Square::at(file, rank))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        write!(f, "{}{}", file, rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_fen_order() {
        assert_eq!(Square::from_str("a8").unwrap().index(), 0);
        assert_eq!(Square::from_str("h8").unwrap().index(), 7);
        assert_eq!(Square::from_str("a1").unwrap().index(), 56);
        assert_eq!(Square::from_str("h1").unwrap().index(), 63);
    }

    #[test]
    fn algebraic_round_trip() {
        for idx in 0..64u8 {
            let sq = Square::from_index(idx);
            let parsed: Square = sq.to_string().parse().unwrap();
            assert_eq!(parsed, sq);
        }
    }

    #[test]
    fn offsets_respect_edges() {
        let a8 = Square::from_str("a8").unwrap();
        assert_eq!(a8.offset(-1, 0), None);
        assert_eq!(a8.offset(0, 1), None);
        assert_eq!(a8.offset(1, -1), Some(Square::from_str("b7").unwrap()));
    }
}
