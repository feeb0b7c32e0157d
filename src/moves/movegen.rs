//! Pseudo-legal generation, pin analysis, and the legality filter.

use crate::board::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, EMPTY, Piece, code_color, piece_code};
use crate::moves::execute::{make_move, undo_move};
use crate::moves::square_control::{
    DIAG_DIRS, KING_STEPS, KNIGHT_JUMPS, ORTHO_DIRS, in_check, is_square_attacked, pawn_dir,
};
use crate::moves::types::{
    CAPTURE, DOUBLE_PAWN_PUSH, EN_PASSANT, KINGSIDE_CASTLE, Move, MoveBuffer, PROMOTION,
    PROMOTION_CAPTURE, QUEENSIDE_CASTLE, QUIET_MOVE,
};
use crate::square::Square;

const PROMOTION_PIECES: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

#[inline(always)]
fn push(moves: &mut impl MoveBuffer, from: Square, to: Square, piece: Piece, flags: u8) {
    moves.push(Move { from, to, piece, promotion: None, flags });
}

fn push_promotions(moves: &mut impl MoveBuffer, from: Square, to: Square, flags: u8) {
    for promo in PROMOTION_PIECES {
        moves.push(Move {
            from,
            to,
            piece: Piece::Pawn,
            promotion: Some(promo),
            flags,
        });
    }
}

fn gen_pawn(board: &Board, from: Square, color: Color, moves: &mut impl MoveBuffer) {
    let forward = pawn_dir(color);
    let (start_rank, promo_rank): (u8, u8) = match color {
        Color::White => (1, 7),
        Color::Black => (6, 0),
    };

    if let Some(to) = from.offset(0, forward)
        && board.code_at(to) == EMPTY
    {
        if to.rank() == promo_rank {
            push_promotions(moves, from, to, PROMOTION);
        } else {
            push(moves, from, to, Piece::Pawn, QUIET_MOVE);
            if from.rank() == start_rank
                && let Some(two) = to.offset(0, forward)
                && board.code_at(two) == EMPTY
            {
                push(moves, from, two, Piece::Pawn, DOUBLE_PAWN_PUSH);
            }
        }
    }

    for df in [-1i8, 1] {
        let Some(to) = from.offset(df, forward) else {
            continue;
        };
        match board.color_at(to) {
            Some(victim) if victim != color => {
                if to.rank() == promo_rank {
                    push_promotions(moves, from, to, PROMOTION_CAPTURE);
                } else {
                    push(moves, from, to, Piece::Pawn, CAPTURE);
                }
            }
            Some(_) => {}
            None => {
                if Some(to) == board.en_passant {
                    push(moves, from, to, Piece::Pawn, EN_PASSANT);
                }
            }
        }
    }
}

fn gen_steps(
    board: &Board,
    from: Square,
    color: Color,
    piece: Piece,
    steps: &[(i8, i8)],
    moves: &mut impl MoveBuffer,
) {
    for &(df, dr) in steps {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        match board.color_at(to) {
            None => push(moves, from, to, piece, QUIET_MOVE),
            Some(c) if c != color => push(moves, from, to, piece, CAPTURE),
            Some(_) => {}
        }
    }
}

fn gen_slider(
    board: &Board,
    from: Square,
    color: Color,
    piece: Piece,
    dirs: &[(i8, i8)],
    moves: &mut impl MoveBuffer,
) {
    for &(df, dr) in dirs {
        let mut cur = from;
        while let Some(to) = cur.offset(df, dr) {
            cur = to;
            match board.color_at(to) {
                None => push(moves, from, to, piece, QUIET_MOVE),
                Some(c) => {
                    if c != color {
                        push(moves, from, to, piece, CAPTURE);
                    }
                    break;
                }
            }
        }
    }
}

/// Castling is generated fully legal: rights, empty path, and an
/// unattacked king path are all verified here.
fn gen_castles(board: &Board, color: Color, moves: &mut impl MoveBuffer) {
    let opp = color.opposite();
    let king_from = board.king_square(color);

    let (kingside_bit, queenside_bit, back) = match color {
        Color::White => (CASTLE_WK, CASTLE_WQ, 0u8),
        Color::Black => (CASTLE_BK, CASTLE_BQ, 7u8),
    };
    let rook = piece_code(color, Piece::Rook);
    let at = |file: u8| Square::at(file, back);

    // Kingside: f and g empty; e, f, g unattacked.
    if board.has_castling(kingside_bit)
        && board.code_at(at(7)) == rook
        && board.code_at(at(5)) == EMPTY
        && board.code_at(at(6)) == EMPTY
        && !is_square_attacked(board, king_from, opp, None)
        && !is_square_attacked(board, at(5), opp, None)
        && !is_square_attacked(board, at(6), opp, None)
    {
        push(moves, king_from, at(6), Piece::King, KINGSIDE_CASTLE);
    }

    // Queenside: b, c, d empty; e, d, c unattacked (b may be attacked).
    if board.has_castling(queenside_bit)
        && board.code_at(at(0)) == rook
        && board.code_at(at(1)) == EMPTY
        && board.code_at(at(2)) == EMPTY
        && board.code_at(at(3)) == EMPTY
        && !is_square_attacked(board, king_from, opp, None)
        && !is_square_attacked(board, at(3), opp, None)
        && !is_square_attacked(board, at(2), opp, None)
    {
        push(moves, king_from, at(2), Piece::King, QUEENSIDE_CASTLE);
    }
}

/// Every move that obeys piece movement rules for the side to move,
/// before king-safety filtering. Castling, the exception, is emitted
/// fully verified.
pub fn generate_pseudo_legal(board: &Board, moves: &mut impl MoveBuffer) {
    let color = board.side_to_move;

    for &from in board.piece_lists.squares_of(piece_code(color, Piece::Pawn)) {
        gen_pawn(board, from, color, moves);
    }
    for &from in board.piece_lists.squares_of(piece_code(color, Piece::Knight)) {
        gen_steps(board, from, color, Piece::Knight, &KNIGHT_JUMPS, moves);
    }
    for &from in board.piece_lists.squares_of(piece_code(color, Piece::Bishop)) {
        gen_slider(board, from, color, Piece::Bishop, &DIAG_DIRS, moves);
    }
    for &from in board.piece_lists.squares_of(piece_code(color, Piece::Rook)) {
        gen_slider(board, from, color, Piece::Rook, &ORTHO_DIRS, moves);
    }
    for &from in board.piece_lists.squares_of(piece_code(color, Piece::Queen)) {
        gen_slider(board, from, color, Piece::Queen, &KING_STEPS, moves);
    }

    let king_from = board.king_square(color);
    gen_steps(board, king_from, color, Piece::King, &KING_STEPS, moves);
    gen_castles(board, color, moves);
}

/// Squares of `side` pieces that may only move along the ray between
/// their king and an enemy slider.
///
/// Walking outward from the king, the first friendly piece on a ray is
/// pinned iff the next piece beyond it is an enemy slider moving on that
/// ray.
pub fn pinned_squares(board: &Board, side: Color) -> u64 {
    let king = board.king_square(side);
    let opp = side.opposite();
    let queen = piece_code(opp, Piece::Queen);
    let mut pinned = 0u64;

    for (dirs, slider_kind) in [(ORTHO_DIRS, Piece::Rook), (DIAG_DIRS, Piece::Bishop)] {
        let slider = piece_code(opp, slider_kind);
        for (df, dr) in dirs {
            let mut blocker: Option<Square> = None;
            let mut cur = king;
            while let Some(s) = cur.offset(df, dr) {
                cur = s;
                let code = board.code_at(s);
                if code == EMPTY {
                    continue;
                }
                if code_color(code) == Some(side) {
                    if blocker.is_some() {
                        break;
                    }
                    blocker = Some(s);
                } else {
                    if (code == slider || code == queen)
                        && let Some(b) = blocker
                    {
                        pinned |= b.bit();
                    }
                    break;
                }
            }
        }
    }

    pinned
}

/// Every legal move in the current position.
///
/// Pseudo-legal moves go through a tiered filter: moves that cannot
/// affect king safety pass directly; king moves are checked against the
/// attacked set with their destination vacated; moves made while in
/// check, by pinned pieces, or en passant are applied and verified, the
/// last because the captured pawn can unmask a rank pin.
pub fn generate_legal(board: &mut Board, moves: &mut impl MoveBuffer, scratch: &mut impl MoveBuffer) {
    scratch.clear();
    generate_pseudo_legal(board, scratch);
    moves.clear();

    let side = board.side_to_move;
    let opp = side.opposite();
    let checked = in_check(board, side);
    let pinned = pinned_squares(board, side);

    for i in 0..scratch.len() {
        let mv = scratch[i];
        let legal = if mv.is_castling() {
            true
        } else if checked || mv.is_en_passant() || pinned & mv.from.bit() != 0 {
            let delta = make_move(board, mv);
            let safe = !in_check(board, side);
            undo_move(board, delta);
            safe
        } else if mv.piece == Piece::King {
            !is_square_attacked(board, mv.to, opp, Some(mv.to))
        } else {
            true
        };
        if legal {
            moves.push(mv);
        }
    }
}

/// Allocating convenience wrapper over [`generate_legal`].
pub fn legal_moves(board: &mut Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    let mut scratch = Vec::with_capacity(128);
    generate_legal(board, &mut moves, &mut scratch);
    moves
}
