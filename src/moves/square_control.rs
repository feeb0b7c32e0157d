//! Attacked-square queries over the mailbox board.

use crate::board::{Board, Color, Piece, piece_code};
use crate::square::Square;

pub(crate) const ORTHO_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub(crate) const DIAG_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
pub(crate) const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// Forward rank direction for a side's pawns.
#[inline(always)]
pub(crate) fn pawn_dir(color: Color) -> i8 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

#[inline(always)]
fn occupied(board: &Board, sq: Square, ignore: Option<Square>) -> bool {
    Some(sq) != ignore && board.code_at(sq) != crate::board::EMPTY
}

/// Is `sq` attacked by any piece of `by`?
///
/// A piece standing on `ignore` is treated as absent, both as a blocker
/// and as an attacker. This answers "could the king stand here after
/// capturing the piece on `ignore`" without mutating the board.
pub fn is_square_attacked(board: &Board, sq: Square, by: Color, ignore: Option<Square>) -> bool {
    let present = |s: Square, code: u8| Some(s) != ignore && board.code_at(s) == code;

    // Pawns attack diagonally forward, so look one rank backward from `sq`.
    let pawn = piece_code(by, Piece::Pawn);
    let back = -pawn_dir(by);
    for df in [-1i8, 1] {
        if let Some(s) = sq.offset(df, back)
            && present(s, pawn)
        {
            return true;
        }
    }

    let knight = piece_code(by, Piece::Knight);
    for (df, dr) in KNIGHT_JUMPS {
        if let Some(s) = sq.offset(df, dr)
            && present(s, knight)
        {
            return true;
        }
    }

    let king = piece_code(by, Piece::King);
    for (df, dr) in KING_STEPS {
        if let Some(s) = sq.offset(df, dr)
            && present(s, king)
        {
            return true;
        }
    }

    let queen = piece_code(by, Piece::Queen);
    let rook = piece_code(by, Piece::Rook);
    let bishop = piece_code(by, Piece::Bishop);

    for (dirs, slider) in [(ORTHO_DIRS, rook), (DIAG_DIRS, bishop)] {
        for (df, dr) in dirs {
            let mut cur = sq;
            while let Some(s) = cur.offset(df, dr) {
                cur = s;
                if !occupied(board, s, ignore) {
                    continue;
                }
                let code = board.code_at(s);
                if code == slider || code == queen {
                    return true;
                }
                break;
            }
        }
    }

    false
}

/// Every square attacked by `by`, as a bit set indexed by square.
///
/// Attack-only semantics: sliders report the first occupied square on each
/// ray whether it holds friend or foe, and pawns report both diagonals
/// regardless of occupancy. `ignore` removes one square's piece from the
/// board for the query.
pub fn attacked_squares(board: &Board, by: Color, ignore: Option<Square>) -> u64 {
    let mut attacked = 0u64;

    let mut add_steps = |from: Square, steps: &[(i8, i8)], acc: &mut u64| {
        for &(df, dr) in steps {
            if let Some(s) = from.offset(df, dr) {
                *acc |= s.bit();
            }
        }
    };

    // King
    let king = board.king_square(by);
    if Some(king) != ignore {
        add_steps(king, &KING_STEPS, &mut attacked);
    }

    // Knights
    for &from in board.piece_lists.squares_of(piece_code(by, Piece::Knight)) {
        if Some(from) != ignore {
            add_steps(from, &KNIGHT_JUMPS, &mut attacked);
        }
    }

    // Pawns
    let forward = pawn_dir(by);
    for &from in board.piece_lists.squares_of(piece_code(by, Piece::Pawn)) {
        if Some(from) == ignore {
            continue;
        }
        for df in [-1i8, 1] {
            if let Some(s) = from.offset(df, forward) {
                attacked |= s.bit();
            }
        }
    }

    // Sliders
    for (piece, dirs) in [
        (Piece::Rook, &ORTHO_DIRS[..]),
        (Piece::Bishop, &DIAG_DIRS[..]),
        (Piece::Queen, &KING_STEPS[..]),
    ] {
        for &from in board.piece_lists.squares_of(piece_code(by, piece)) {
            if Some(from) == ignore {
                continue;
            }
            for &(df, dr) in dirs {
                let mut cur = from;
                while let Some(s) = cur.offset(df, dr) {
                    cur = s;
                    attacked |= s.bit();
                    if occupied(board, s, ignore) {
                        break;
                    }
                }
            }
        }
    }

    attacked
}

/// Is `side`'s king currently attacked?
#[inline(always)]
pub fn in_check(board: &Board, side: Color) -> bool {
    is_square_attacked(board, board.king_square(side), side.opposite(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_rays_stop_at_blockers() {
        let board = Board::from_fen("4k3/8/8/8/1R2p3/8/8/4K3 w - - 0 1").unwrap();
        let attacked = attacked_squares(&board, Color::White, None);
        let b4: Square = "b4".parse().unwrap();
        let e4: Square = "e4".parse().unwrap();
        let f4: Square = "f4".parse().unwrap();
        assert_eq!(attacked & b4.bit(), 0, "own square is not attacked");
        assert_ne!(attacked & e4.bit(), 0, "first blocker is attacked");
        assert_eq!(attacked & f4.bit(), 0, "squares beyond a blocker are not");
    }

    #[test]
    fn ignore_square_lets_rays_pass_through() {
        let board = Board::from_fen("4k3/8/8/8/1R2p3/8/8/4K3 w - - 0 1").unwrap();
        let e4: Square = "e4".parse().unwrap();
        let f4: Square = "f4".parse().unwrap();
        assert!(is_square_attacked(&board, f4, Color::White, Some(e4)));
        assert!(!is_square_attacked(&board, f4, Color::White, None));
    }

    #[test]
    fn pawns_attack_diagonals_only() {
        let board = Board::from_fen("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1").unwrap();
        let attacked = attacked_squares(&board, Color::White, None);
        let d5: Square = "d5".parse().unwrap();
        let f5: Square = "f5".parse().unwrap();
        let e5: Square = "e5".parse().unwrap();
        assert_ne!(attacked & d5.bit(), 0);
        assert_ne!(attacked & f5.bit(), 0);
        assert_eq!(attacked & e5.bit(), 0, "push square is not an attack");
    }

    #[test]
    fn check_detection_by_each_piece_kind() {
        for fen in [
            "4k3/8/8/8/8/5n2/8/4K3 w - - 0 1",  // knight
            "4k3/8/8/8/8/8/3p4/4K3 w - - 0 1",  // pawn
            "4k3/8/8/8/8/8/8/r3K3 w - - 0 1",   // rook
            "4k3/8/8/8/1b6/8/8/4K3 w - - 0 1",  // bishop
            "4k3/8/8/8/8/8/8/q3K3 w - - 0 1",   // queen
        ] {
            let board = Board::from_fen(fen).unwrap();
            assert!(in_check(&board, Color::White), "fen: {fen}");
            assert!(!in_check(&board, Color::Black), "fen: {fen}");
        }
    }
}
