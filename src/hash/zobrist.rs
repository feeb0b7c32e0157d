use crate::board::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, EMPTY};
use crate::square::Square;
use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Fixed key-generation seed. The key set only has to be stable within a
/// single process; a constant keeps searches reproducible.
const ZOBRIST_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Random key material for position fingerprints.
pub struct ZobristKeys {
    /// `[code - 1][square]` for the twelve mailbox piece codes.
    piece: [[u64; 64]; 12],
    /// XOR-ed in when Black is to move.
    pub side_to_move: u64,
    /// One key per castling bit, in WK, WQ, BK, BQ order.
    pub castling: [u64; 4],
    /// One key per en-passant file, a..h. Keyed by file only so positions
    /// that transpose with differing irrelevant en-passant state hash
    /// equal.
    pub ep_file: [u64; 8],
}

impl ZobristKeys {
    /// Key for a non-empty mailbox code on a square.
    #[inline(always)]
    pub fn piece_key(&self, code: u8, sq: Square) -> u64 {
        debug_assert!(code != EMPTY && code <= 12);
        self.piece[(code - 1) as usize][sq.index() as usize]
    }
}

/// XOR the castling-key delta between two rights masks into `hash`.
#[inline]
pub fn xor_castling_delta(hash: &mut u64, keys: &ZobristKeys, old: u8, new: u8) {
    let d = old ^ new;
    for (i, flag) in [CASTLE_WK, CASTLE_WQ, CASTLE_BK, CASTLE_BQ].iter().enumerate() {
        if d & flag != 0 {
            *hash ^= keys.castling[i];
        }
    }
}

/// Global keys, generated on first use.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_keys(StdRng::seed_from_u64(ZOBRIST_SEED)))
}

fn generate_keys(mut rng: StdRng) -> ZobristKeys {
    // Zero keys would make distinct positions collide trivially.
    let mut non_zero = || {
        let mut v = rng.next_u64();
        while v == 0 {
            v = rng.next_u64();
        }
        v
    };

    let mut keys = ZobristKeys {
        piece: [[0u64; 64]; 12],
        side_to_move: 0,
        castling: [0u64; 4],
        ep_file: [0u64; 8],
    };

    for code in 0..12 {
        for sq in 0..64 {
            keys.piece[code][sq] = non_zero();
        }
    }
    for i in 0..4 {
        keys.castling[i] = non_zero();
    }
    for f in 0..8 {
        keys.ep_file[f] = non_zero();
    }
    keys.side_to_move = non_zero();

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_stable_within_process() {
        let a = zobrist_keys();
        let b = zobrist_keys();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.side_to_move, b.side_to_move);
    }

    #[test]
    fn keys_are_distinct_and_non_zero() {
        let keys = zobrist_keys();
        assert_ne!(keys.side_to_move, 0);
        for i in 0..4 {
            assert_ne!(keys.castling[i], 0);
        }
        // Spot-check a handful of piece keys for collisions.
        let a = keys.piece_key(1, Square::from_index(0));
        let b = keys.piece_key(1, Square::from_index(1));
        let c = keys.piece_key(2, Square::from_index(0));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn castling_delta_is_its_own_inverse() {
        let keys = zobrist_keys();
        let mut hash = 0xDEAD_BEEFu64;
        let start = hash;
        xor_castling_delta(&mut hash, keys, 0b1111, 0b0101);
        assert_ne!(hash, start);
        xor_castling_delta(&mut hash, keys, 0b0101, 0b1111);
        assert_eq!(hash, start);
    }
}
