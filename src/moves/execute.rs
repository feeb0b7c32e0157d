//! Applying and reversing moves on the board.

use crate::board::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, EMPTY, Piece, piece_code};
use crate::hash::zobrist::{xor_castling_delta, zobrist_keys};
use crate::moves::square_control::pawn_dir;
use crate::moves::types::{Delta, Edit, Move};
use crate::square::Square;
use arrayvec::ArrayVec;

/// Rook (from, to) for a castling move, keyed by the king's destination.
#[inline(always)]
fn rook_castle_squares(king_to: Square) -> (Square, Square) {
    let (from, to) = match king_to.index() {
        62 => (63, 61), // White O-O
        58 => (56, 59), // White O-O-O
        6 => (7, 5),    // Black O-O
        2 => (0, 3),    // Black O-O-O
        other => panic!("castling king destination {} is not g1/c1/g8/c8", other),
    };
    (Square::from_index(from), Square::from_index(to))
}

/// Castling bit lost when a rook leaves (or is captured on) a home square.
#[inline(always)]
fn rights_mask_for_rook(color: Color, sq: Square) -> u8 {
    match (color, sq.index()) {
        (Color::White, 56) => CASTLE_WQ, // a1
        (Color::White, 63) => CASTLE_WK, // h1
        (Color::Black, 0) => CASTLE_BQ,  // a8
        (Color::Black, 7) => CASTLE_BK,  // h8
        _ => 0,
    }
}

/// Apply `mv` to `board` and return the delta that undoes it.
///
/// `mv` must be legal in the current position. The hash, piece lists,
/// clocks, castling rights, en-passant state, and repetition window are
/// all updated here; every board edit is recorded in order so
/// [`undo_move`] can replay them backwards.
pub fn make_move(board: &mut Board, mv: Move) -> Delta {
    let keys = zobrist_keys();
    let mover = board.side_to_move;
    let code = piece_code(mover, mv.piece);
    let mut edits: ArrayVec<Edit, 8> = ArrayVec::new();

    let prev_halfmove = board.halfmove_clock;
    edits.push(Edit::Halfmove { prev: prev_halfmove });

    // Capture, including the en-passant victim one rank behind the target.
    let mut captured: Option<(Square, u8)> = None;
    if mv.is_en_passant() {
        let victim_sq = mv
            .to
            .offset(0, -pawn_dir(mover))
            .expect("en-passant victim square on board");
        captured = Some((victim_sq, piece_code(mover.opposite(), Piece::Pawn)));
    } else {
        let occupant = board.code_at(mv.to);
        if occupant != EMPTY {
            captured = Some((mv.to, occupant));
        }
    }
    if let Some((sq, victim)) = captured {
        debug_assert!(mv.is_capture(), "capture flag missing on {}", mv);
        board.remove_piece(sq, victim);
        edits.push(Edit::Remove { sq, code: victim });
    }

    // Move the piece; a promotion swaps the pawn for the promoted kind.
    if let Some(promo) = mv.promotion {
        debug_assert_eq!(mv.piece, Piece::Pawn, "only pawns promote");
        let promo_code = piece_code(mover, promo);
        board.remove_piece(mv.from, code);
        board.place_piece(mv.to, promo_code);
        edits.push(Edit::Remove { sq: mv.from, code });
        edits.push(Edit::Place { sq: mv.to, code: promo_code });
    } else {
        board.move_piece(mv.from, mv.to, code);
        edits.push(Edit::Move { from: mv.from, to: mv.to, code });
    }

    // Castling also relocates the rook.
    if mv.is_castling() {
        let (rook_from, rook_to) = rook_castle_squares(mv.to);
        let rook_code = piece_code(mover, Piece::Rook);
        board.move_piece(rook_from, rook_to, rook_code);
        edits.push(Edit::Move { from: rook_from, to: rook_to, code: rook_code });
    }

    // Castling rights: king moves clear both bits, rook moves and rook
    // captures clear the matching bit.
    let old_rights = board.castling;
    let mut mask_to_clear = 0u8;
    if mv.piece == Piece::King {
        mask_to_clear |= mover.castle_rights();
    }
    if mv.piece == Piece::Rook {
        mask_to_clear |= rights_mask_for_rook(mover, mv.from);
    }
    if let Some((sq, victim)) = captured
        && victim == piece_code(mover.opposite(), Piece::Rook)
    {
        mask_to_clear |= rights_mask_for_rook(mover.opposite(), sq);
    }
    let new_rights = old_rights & !mask_to_clear;
    if new_rights != old_rights {
        board.castling = new_rights;
        xor_castling_delta(&mut board.hash, keys, old_rights, new_rights);
        edits.push(Edit::Castling { prev: old_rights });
    }

    // En-passant target: set after a double push, cleared otherwise.
    let prev_ep = board.en_passant;
    let new_ep = if mv.is_double_pawn_push() {
        Some(
            mv.from
                .offset(0, pawn_dir(mover))
                .expect("jumped square on board"),
        )
    } else {
        None
    };
    if new_ep != prev_ep {
        if let Some(sq) = prev_ep {
            board.hash ^= keys.ep_file[sq.file() as usize];
        }
        if let Some(sq) = new_ep {
            board.hash ^= keys.ep_file[sq.file() as usize];
        }
        board.en_passant = new_ep;
        edits.push(Edit::EnPassant { prev: prev_ep });
    }

    // Clocks.
    let clock_reset = captured.is_some() || mv.piece == Piece::Pawn;
    board.halfmove_clock = if clock_reset { 0 } else { prev_halfmove + 1 };
    if mover == Color::Black {
        board.fullmove_number += 1;
    }

    // Side to move.
    board.side_to_move = mover.opposite();
    board.hash ^= keys.side_to_move;

    // Repetition window: irreversible moves start a fresh one.
    let repetition = if clock_reset || new_rights != old_rights {
        Some(std::mem::take(&mut board.repetition))
    } else {
        None
    };
    board.repetition.push(board.hash);

    #[cfg(debug_assertions)]
    {
        debug_assert_valid_ep(board);
        board.assert_hash();
    }

    Delta { edits, repetition }
}

/// Reverse the edits of one made move, restoring the board bit-for-bit.
pub fn undo_move(board: &mut Board, delta: Delta) {
    let keys = zobrist_keys();

    // Drop the hash pushed by make and, if the move started a fresh
    // repetition window, restore the previous one.
    board.repetition.pop();
    if let Some(prev) = delta.repetition {
        board.repetition = prev;
    }

    // Flip the side back before replaying edits so the mover is current.
    board.side_to_move = board.side_to_move.opposite();
    board.hash ^= keys.side_to_move;
    if board.side_to_move == Color::Black {
        board.fullmove_number -= 1;
    }

    for edit in delta.edits.iter().rev() {
        match *edit {
            Edit::Place { sq, code } => board.remove_piece(sq, code),
            Edit::Remove { sq, code } => board.place_piece(sq, code),
            Edit::Move { from, to, code } => board.move_piece(to, from, code),
            Edit::Castling { prev } => {
                xor_castling_delta(&mut board.hash, keys, board.castling, prev);
                board.castling = prev;
            }
            Edit::EnPassant { prev } => {
                if let Some(sq) = board.en_passant {
                    board.hash ^= keys.ep_file[sq.file() as usize];
                }
                if let Some(sq) = prev {
                    board.hash ^= keys.ep_file[sq.file() as usize];
                }
                board.en_passant = prev;
            }
            Edit::Halfmove { prev } => board.halfmove_clock = prev,
        }
    }

    #[cfg(debug_assertions)]
    {
        debug_assert_valid_ep(board);
        board.assert_hash();
    }
}

#[cfg(debug_assertions)]
#[inline]
fn debug_assert_valid_ep(board: &Board) {
    if let Some(ep) = board.en_passant {
        match board.side_to_move {
            // Black just pushed when White is to move: target on rank 6.
            Color::White => debug_assert_eq!(ep.rank(), 5, "bad EP square {} for White to move", ep),
            Color::Black => debug_assert_eq!(ep.rank(), 2, "bad EP square {} for Black to move", ep),
        }
    }
}
