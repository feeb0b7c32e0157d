mod fen;
mod fen_tables;
mod piece_list;

pub mod error;

pub use error::FenError;
pub use piece_list::PieceLists;

use crate::hash::zobrist::zobrist_keys;
use crate::square::Square;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Castling-right bits: White/Black, kingside/queenside.
pub const CASTLE_WK: u8 = 0b0001;
pub const CASTLE_WQ: u8 = 0b0010;
pub const CASTLE_BK: u8 = 0b0100;
pub const CASTLE_BQ: u8 = 0b1000;
pub const CASTLE_ALL: u8 = CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ;

/// Empty-square code in the mailbox array.
pub const EMPTY: u8 = 0;

/// Which side is to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    White,
    Black,
}

/// Piece kind, ordered to match the mailbox piece codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Piece {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

pub const PIECES: [Piece; 6] = [
    Piece::King,
    Piece::Queen,
    Piece::Rook,
    Piece::Bishop,
    Piece::Knight,
    Piece::Pawn,
];

impl Color {
    #[inline(always)]
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Both castling bits owned by this side.
    #[inline(always)]
    pub fn castle_rights(self) -> u8 {
        match self {
            Color::White => CASTLE_WK | CASTLE_WQ,
            Color::Black => CASTLE_BK | CASTLE_BQ,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.opposite()
    }
}

impl Piece {
    /// Decode a 0-5 value into a Piece.
    #[inline(always)]
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Piece::King,
            1 => Piece::Queen,
            2 => Piece::Rook,
            3 => Piece::Bishop,
            4 => Piece::Knight,
            5 => Piece::Pawn,
            _ => panic!("invalid piece encoding: {}", v),
        }
    }

    /// Material value in centipawns.
    #[inline(always)]
    pub fn value(self) -> i32 {
        match self {
            Piece::King => 0,
            Piece::Queen => 900,
            Piece::Rook => 500,
            Piece::Bishop => 300,
            Piece::Knight => 300,
            Piece::Pawn => 100,
        }
    }

}

/// Pack (color, piece) into a mailbox code: 0 = empty, 1..=6 black
/// {K,Q,R,B,N,P}, 7..=12 white {K,Q,R,B,N,P}.
#[inline(always)]
pub fn piece_code(color: Color, piece: Piece) -> u8 {
    let base = match color {
        Color::White => 7,
        Color::Black => 1,
    };
    base + piece as u8
}

/// Unpack a mailbox code; `None` for the empty code.
#[inline(always)]
pub fn decode_piece(code: u8) -> Option<(Color, Piece)> {
    match code {
        0 => None,
        1..=6 => Some((Color::Black, Piece::from_u8(code - 1))),
        7..=12 => Some((Color::White, Piece::from_u8(code - 7))),
        _ => panic!("invalid mailbox code: {}", code),
    }
}

/// Color of a non-empty code. A piece is white iff its code is >= 7.
#[inline(always)]
pub fn code_color(code: u8) -> Option<Color> {
    match code {
        0 => None,
        1..=6 => Some(Color::Black),
        _ => Some(Color::White),
    }
}

/// Core mailbox board representation.
///
/// Mutation happens through [`crate::moves::execute::make_move`] and
/// [`crate::moves::execute::undo_move`]; the piece-placement helpers below
/// keep the piece lists and the Zobrist hash in step with the square array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Mailbox array in FEN order (index 0 = a8).
    pub squares: [u8; 64],
    /// Per-code square lists; kings tracked in dedicated slots.
    pub piece_lists: PieceLists,
    pub side_to_move: Color,
    /// Castling rights: bit 0 = WK, 1 = WQ, 2 = BK, 3 = BQ.
    pub castling: u8,
    /// En-passant target square, set only right after a double pawn push.
    pub en_passant: Option<Square>,
    /// Plies since the last capture or pawn move (fifty-move rule).
    pub halfmove_clock: u32,
    /// Starts at 1, increments after every Black move.
    pub fullmove_number: u32,
    /// Hashes of positions reached since the last irreversible move,
    /// including the current one as the last element.
    pub repetition: Vec<u64>,
    /// Incrementally maintained Zobrist hash.
    pub hash: u64,
}

impl Board {
    /// An empty board with White to move and no rights.
    pub fn new_empty() -> Self {
        let mut b = Board {
            squares: [EMPTY; 64],
            piece_lists: PieceLists::new(),
            side_to_move: Color::White,
            castling: 0,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            repetition: Vec::new(),
            hash: 0,
        };
        b.refresh_hash();
        b.repetition.push(b.hash);
        b
    }

    /// The standard starting position.
    pub fn new() -> Self {
        let mut b = Board::new_empty();
        const BACK_RANK: [Piece; 8] = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for file in 0..8u8 {
            b.place_piece(Square::at(file, 0), piece_code(Color::White, BACK_RANK[file as usize]));
            b.place_piece(Square::at(file, 1), piece_code(Color::White, Piece::Pawn));
            b.place_piece(Square::at(file, 6), piece_code(Color::Black, Piece::Pawn));
            b.place_piece(Square::at(file, 7), piece_code(Color::Black, BACK_RANK[file as usize]));
        }
        b.castling = CASTLE_ALL;
        b.refresh_hash();
        b.repetition.clear();
        b.repetition.push(b.hash);
        b
    }

    #[inline(always)]
    pub fn code_at(&self, sq: Square) -> u8 {
        self.squares[sq.index() as usize]
    }

    /// Piece and color at a square, or None if empty.
    #[inline(always)]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        decode_piece(self.code_at(sq))
    }

    #[inline(always)]
    pub fn color_at(&self, sq: Square) -> Option<Color> {
        code_color(self.code_at(sq))
    }

    #[inline(always)]
    pub fn king_square(&self, color: Color) -> Square {
        self.piece_lists.king(color)
    }

    #[inline(always)]
    pub fn has_castling(&self, flag: u8) -> bool {
        self.castling & flag != 0
    }

    /// Put a piece on an empty square, updating lists and hash.
    #[inline]
    pub(crate) fn place_piece(&mut self, sq: Square, code: u8) {
        debug_assert_eq!(self.code_at(sq), EMPTY, "place on occupied {}", sq);
        self.squares[sq.index() as usize] = code;
        self.piece_lists.add(code, sq);
        self.hash ^= zobrist_keys().piece_key(code, sq);
    }

    /// Take a piece off its square, updating lists and hash.
    #[inline]
    pub(crate) fn remove_piece(&mut self, sq: Square, code: u8) {
        debug_assert_eq!(self.code_at(sq), code, "remove mismatch at {}", sq);
        self.squares[sq.index() as usize] = EMPTY;
        self.piece_lists.remove(code, sq);
        self.hash ^= zobrist_keys().piece_key(code, sq);
    }

    /// Slide a piece from one square to an empty one, updating lists and hash.
    #[inline]
    pub(crate) fn move_piece(&mut self, from: Square, to: Square, code: u8) {
        debug_assert_eq!(self.code_at(from), code, "move mismatch at {}", from);
        debug_assert_eq!(self.code_at(to), EMPTY, "move onto occupied {}", to);
        self.squares[from.index() as usize] = EMPTY;
        self.squares[to.index() as usize] = code;
        self.piece_lists.relocate(code, from, to);
        let keys = zobrist_keys();
        self.hash ^= keys.piece_key(code, from);
        self.hash ^= keys.piece_key(code, to);
    }

    /// Recompute the hash from scratch and store it.
    #[inline]
    pub fn refresh_hash(&mut self) {
        self.hash = self.compute_hash_full();
    }

    /// Full recompute from current state. Must match the incremental hash
    /// at all times.
    pub fn compute_hash_full(&self) -> u64 {
        let keys = zobrist_keys();
        let mut hash = 0u64;

        for idx in 0..64u8 {
            let code = self.squares[idx as usize];
            if code != EMPTY {
                hash ^= keys.piece_key(code, Square::from_index(idx));
            }
        }

        if self.side_to_move == Color::Black {
            hash ^= keys.side_to_move;
        }

        for (i, flag) in [CASTLE_WK, CASTLE_WQ, CASTLE_BK, CASTLE_BQ].iter().enumerate() {
            if self.castling & flag != 0 {
                hash ^= keys.castling[i];
            }
        }

        if let Some(ep) = self.en_passant {
            hash ^= keys.ep_file[ep.file() as usize];
        }

        hash
    }

    /// Occurrences of the current hash in the repetition window, the
    /// current position included.
    pub fn repetition_count(&self) -> u32 {
        let current = self.hash;
        self.repetition.iter().filter(|&&h| h == current).count() as u32
    }

    /// True once the current position has occurred at least twice.
    pub fn is_repetition(&self) -> bool {
        self.repetition_count() >= 2
    }

    /// True iff the current position has occurred three or more times.
    pub fn is_threefold(&self) -> bool {
        self.repetition_count() >= 3
    }

    #[cfg(debug_assertions)]
    pub fn assert_hash(&self) {
        let full = self.compute_hash_full();
        debug_assert_eq!(
            self.hash, full,
            "zobrist parity mismatch: stored={:#018x}, full={:#018x}",
            self.hash, full
        );
    }

    /// Verify square array, piece lists, and hash agree. Debug builds only.
    #[cfg(debug_assertions)]
    pub fn assert_consistent(&self) {
        self.assert_hash();
        for idx in 0..64u8 {
            let sq = Square::from_index(idx);
            let code = self.code_at(sq);
            if code == EMPTY {
                continue;
            }
            debug_assert!(
                self.piece_lists.contains(code, sq),
                "piece list missing code {} at {}",
                code,
                sq
            );
        }
        for color in [Color::White, Color::Black] {
            let king = self.king_square(color);
            debug_assert_eq!(
                self.code_at(king),
                piece_code(color, Piece::King),
                "king slot out of step for {:?}",
                color
            );
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl FromStr for Board {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut board = Board::new_empty();
        board.set_fen(s)?;
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}
