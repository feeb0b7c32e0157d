//! Game-status classification. Derived from the position on demand,
//! never stored.

use crate::board::{Board, Color, Piece, piece_code};
use crate::moves::movegen::legal_moves;
use crate::moves::square_control::in_check;
use serde::{Deserialize, Serialize};

/// What the side to move is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InPlay,
    Check,
    Checkmate,
    Stalemate,
    DrawFiftyMove,
    DrawThreefold,
    DrawInsufficientMaterial,
}

impl GameStatus {
    /// True when the game cannot continue from here.
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InPlay | GameStatus::Check)
    }
}

pub fn is_draw_by_fifty_move(board: &Board) -> bool {
    board.halfmove_clock >= 100
}

pub fn is_draw_by_threefold(board: &Board) -> bool {
    board.is_threefold()
}

/// Dead-position detection for the canonical set: KvK, KvKN, KvKB, and
/// KBvKB with both bishops on the same square color.
pub fn is_insufficient_material(board: &Board) -> bool {
    // Any pawn, rook, or queen means mating material exists.
    for color in [Color::White, Color::Black] {
        for piece in [Piece::Pawn, Piece::Rook, Piece::Queen] {
            if !board.piece_lists.squares_of(piece_code(color, piece)).is_empty() {
                return false;
            }
        }
    }

    let knights = |c: Color| board.piece_lists.squares_of(piece_code(c, Piece::Knight));
    let bishops = |c: Color| board.piece_lists.squares_of(piece_code(c, Piece::Bishop));

    let minors = knights(Color::White).len()
        + knights(Color::Black).len()
        + bishops(Color::White).len()
        + bishops(Color::Black).len();

    match minors {
        // K vs K
        0 => true,
        // K vs KN or K vs KB
        1 => true,
        2 => {
            // KB vs KB draws only with same-colored bishops.
            let wb = bishops(Color::White);
            let bb = bishops(Color::Black);
            if wb.len() == 1 && bb.len() == 1 {
                let shade = |sq: crate::square::Square| (sq.file() + sq.rank()) % 2;
                return shade(wb[0]) == shade(bb[0]);
            }
            false
        }
        _ => false,
    }
}

/// Classify the position facing the side to move.
///
/// Mate and stalemate outrank the draw rules: a mating move ends the
/// game even if it also reaches the fifty-move threshold.
pub fn position_status(board: &mut Board) -> GameStatus {
    let checked = in_check(board, board.side_to_move);

    if legal_moves(board).is_empty() {
        return if checked {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        };
    }

    if is_draw_by_fifty_move(board) {
        return GameStatus::DrawFiftyMove;
    }
    if is_draw_by_threefold(board) {
        return GameStatus::DrawThreefold;
    }
    if is_insufficient_material(board) {
        return GameStatus::DrawInsufficientMaterial;
    }

    if checked { GameStatus::Check } else { GameStatus::InPlay }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_queen_mate_is_checkmate() {
        let mut board = Board::from_fen("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(position_status(&mut board), GameStatus::Checkmate);
    }

    #[test]
    fn cornered_king_with_no_moves_is_stalemate() {
        let mut board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(position_status(&mut board), GameStatus::Stalemate);
    }

    #[test]
    fn bare_kings_are_a_dead_position() {
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(position_status(&mut board), GameStatus::DrawInsufficientMaterial);
    }

    #[test]
    fn same_colored_bishops_cannot_mate() {
        // Both bishops on dark squares.
        let board = Board::from_fen("4k3/8/8/8/8/2b5/5B2/4K3 w - - 0 1").unwrap();
        assert!(is_insufficient_material(&board));
        // Opposite-colored bishops can.
        let board = Board::from_fen("4k3/8/8/8/8/3b4/5B2/4K3 w - - 0 1").unwrap();
        assert!(!is_insufficient_material(&board));
    }

    #[test]
    fn knight_and_bishop_retain_mating_chances() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/2B1K1N1 w - - 0 1").unwrap();
        assert!(!is_insufficient_material(&board));
    }
}
