//! Errors surfaced while loading a position.

use std::fmt;

/// FEN rejection reasons.
///
/// The first group covers strings that do not parse at all; the second
/// covers well-formed strings describing a position no legal game can
/// reach. Both leave the board untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// Not exactly six whitespace-separated fields.
    WrongFieldCount { found: usize },
    /// Unknown character in the piece-placement field.
    InvalidPiece { ch: char },
    /// Placement field does not describe eight ranks.
    WrongRankCount { found: usize },
    /// A rank does not sum to eight files.
    BadRankLength { rank: usize, files: usize },
    /// Active-color field is neither 'w' nor 'b'.
    InvalidSideToMove { found: String },
    /// Castling field holds a character outside "KQkq-".
    InvalidCastling { ch: char },
    /// En-passant field is neither '-' nor a valid target square.
    InvalidEnPassant { found: String },
    /// Halfmove clock or fullmove number failed to parse.
    InvalidCounter { field: &'static str, found: String },

    /// More copies of one piece than any reachable game allows.
    TooManyPieces { ch: char },
    /// A side has no king, or more than one.
    WrongKingCount { white: usize, black: usize },
    /// A pawn stands on rank 1 or rank 8.
    PawnOnBackRank,
    /// The side that just moved is still in check.
    OpponentInCheck,
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::WrongFieldCount { found } => {
                write!(f, "FEN must have 6 fields, found {found}")
            }
            FenError::InvalidPiece { ch } => {
                write!(f, "invalid piece character '{ch}' in FEN")
            }
            FenError::WrongRankCount { found } => {
                write!(f, "FEN placement must have 8 ranks, found {found}")
            }
            FenError::BadRankLength { rank, files } => {
                write!(f, "rank {rank} describes {files} files, expected 8")
            }
            FenError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidCastling { ch } => {
                write!(f, "invalid castling character '{ch}' in FEN")
            }
            FenError::InvalidEnPassant { found } => {
                write!(f, "invalid en-passant square '{found}'")
            }
            FenError::InvalidCounter { field, found } => {
                write!(f, "invalid {field} counter '{found}'")
            }
            FenError::TooManyPieces { ch } => {
                write!(f, "too many '{ch}' pieces for a legal position")
            }
            FenError::WrongKingCount { white, black } => {
                write!(f, "position must have one king per side, found {white} white / {black} black")
            }
            FenError::PawnOnBackRank => {
                write!(f, "pawns cannot stand on rank 1 or rank 8")
            }
            FenError::OpponentInCheck => {
                write!(f, "side not to move is in check")
            }
        }
    }
}

impl std::error::Error for FenError {}
