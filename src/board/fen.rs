//! FEN parsing and serialization.

use super::fen_tables::{CHAR_TO_CODE, CODE_TO_CHAR};
use super::{
    Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, EMPTY, FenError, Piece, piece_code,
};
use crate::moves::square_control::in_check;
use crate::square::Square;

/// Rights that the piece placement can actually back: a bit survives only
/// if the corresponding king and rook still stand on their home squares.
fn supported_rights(board: &Board) -> u8 {
    let mut rights = 0;
    let at = |name: &str| -> u8 {
        board.code_at(name.parse::<Square>().expect("home square"))
    };
    let wk = piece_code(Color::White, Piece::King);
    let wr = piece_code(Color::White, Piece::Rook);
    let bk = piece_code(Color::Black, Piece::King);
    let br = piece_code(Color::Black, Piece::Rook);

    if at("e1") == wk {
        if at("h1") == wr {
            rights |= CASTLE_WK;
        }
        if at("a1") == wr {
            rights |= CASTLE_WQ;
        }
    }
    if at("e8") == bk {
        if at("h8") == br {
            rights |= CASTLE_BK;
        }
        if at("a8") == br {
            rights |= CASTLE_BQ;
        }
    }
    rights
}

impl Board {
    /// Parse a six-field FEN string into a new board.
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let mut board = Board::new_empty();
        board.set_fen(fen)?;
        Ok(board)
    }

    /// Replace this board with the position described by `fen`.
    ///
    /// On any error the board is left untouched. Beyond syntax, the
    /// position itself is validated: one king per side, no pawns on the
    /// back ranks, and the side that just moved must not be in check.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::WrongFieldCount { found: fields.len() });
        }

        let mut board = Board::new_empty();

        // Field 1: piece placement, rank 8 down to rank 1.
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::WrongRankCount { found: ranks.len() });
        }
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank_no = 8 - row;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(FenError::InvalidPiece { ch });
                    }
                    file += skip as usize;
                } else {
                    let code = if ch.is_ascii() { CHAR_TO_CODE[ch as usize] } else { EMPTY };
                    if code == EMPTY {
                        return Err(FenError::InvalidPiece { ch });
                    }
                    if file >= 8 {
                        return Err(FenError::BadRankLength { rank: rank_no, files: file + 1 });
                    }
                    // Piece lists hold at most ten squares per code (two
                    // originals plus eight promotions).
                    let is_king = code == piece_code(Color::White, Piece::King)
                        || code == piece_code(Color::Black, Piece::King);
                    if !is_king && board.piece_lists.squares_of(code).len() >= 10 {
                        return Err(FenError::TooManyPieces { ch });
                    }
                    board.place_piece(Square::from_index((row * 8 + file) as u8), code);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::BadRankLength { rank: rank_no, files: file });
            }
        }

        // Field 2: active color.
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove { found: other.to_string() });
            }
        };

        // Field 3: castling availability. Bits without a king and rook on
        // their home squares are dropped so the rights invariant holds.
        let mut rights = 0u8;
        if fields[2] != "-" {
            for ch in fields[2].chars() {
                rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(FenError::InvalidCastling { ch }),
                };
            }
        }
        let supported = supported_rights(&board);
        board.castling = rights & supported;

        // Field 4: en-passant target.
        board.en_passant = match fields[3] {
            "-" => None,
            s => {
                let sq: Square = s.parse().map_err(|_| FenError::InvalidEnPassant {
                    found: s.to_string(),
                })?;
                let valid_rank = match board.side_to_move {
                    // White to move: Black just double-pushed, target on rank 6.
                    Color::White => sq.rank() == 5,
                    Color::Black => sq.rank() == 2,
                };
                if !valid_rank {
                    return Err(FenError::InvalidEnPassant { found: s.to_string() });
                }
                Some(sq)
            }
        };

        // Fields 5-6: counters.
        board.halfmove_clock = fields[4].parse().map_err(|_| FenError::InvalidCounter {
            field: "halfmove",
            found: fields[4].to_string(),
        })?;
        board.fullmove_number = fields[5].parse().map_err(|_| FenError::InvalidCounter {
            field: "fullmove",
            found: fields[5].to_string(),
        })?;
        if board.fullmove_number == 0 {
            return Err(FenError::InvalidCounter {
                field: "fullmove",
                found: fields[5].to_string(),
            });
        }

        // Position legality.
        let count_code = |code: u8| board.squares.iter().filter(|&&c| c == code).count();
        let white_kings = count_code(piece_code(Color::White, Piece::King));
        let black_kings = count_code(piece_code(Color::Black, Piece::King));
        if white_kings != 1 || black_kings != 1 {
            return Err(FenError::WrongKingCount {
                white: white_kings,
                black: black_kings,
            });
        }
        for &code in [
            piece_code(Color::White, Piece::Pawn),
            piece_code(Color::Black, Piece::Pawn),
        ]
        .iter()
        {
            for &sq in board.piece_lists.squares_of(code) {
                if sq.rank() == 0 || sq.rank() == 7 {
                    return Err(FenError::PawnOnBackRank);
                }
            }
        }
        if in_check(&board, board.side_to_move.opposite()) {
            return Err(FenError::OpponentInCheck);
        }

        board.refresh_hash();
        board.repetition.clear();
        board.repetition.push(board.hash);

        *self = board;
        Ok(())
    }

    /// Serialize to the canonical six-field FEN form.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for row in 0..8usize {
            let mut empty_run = 0;
            for file in 0..8usize {
                let code = self.squares[row * 8 + file];
                if code == EMPTY {
                    empty_run += 1;
                } else {
                    if empty_run > 0 {
                        fen.push(char::from_digit(empty_run, 10).expect("run <= 8"));
                        empty_run = 0;
                    }
                    fen.push(CODE_TO_CHAR[code as usize]);
                }
            }
            if empty_run > 0 {
                fen.push(char::from_digit(empty_run, 10).expect("run <= 8"));
            }
            if row != 7 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        if self.castling == 0 {
            fen.push('-');
        } else {
            for (flag, ch) in [
                (CASTLE_WK, 'K'),
                (CASTLE_WQ, 'Q'),
                (CASTLE_BK, 'k'),
                (CASTLE_BQ, 'q'),
            ] {
                if self.castling & flag != 0 {
                    fen.push(ch);
                }
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn start_position_round_trip() {
        let board = Board::from_fen(START_FEN).unwrap();
        assert_eq!(board.to_fen(), START_FEN);
        assert_eq!(board, Board::new());
    }

    #[test]
    fn malformed_fens_are_rejected() {
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"),
            Err(FenError::WrongFieldCount { found: 5 })
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/ppXppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::InvalidPiece { ch: 'X' })
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::BadRankLength { rank: 7, .. })
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenError::InvalidSideToMove { .. })
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1"),
            Err(FenError::InvalidCounter { field: "halfmove", .. })
        ));
    }

    #[test]
    fn illegal_positions_are_rejected() {
        // No black king.
        assert!(matches!(
            Board::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::WrongKingCount { white: 1, black: 0 })
        ));
        // Pawn on rank 8.
        assert!(matches!(
            Board::from_fen("P3k3/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::PawnOnBackRank)
        ));
        // White to move while Black is already in check.
        assert!(matches!(
            Board::from_fen("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::OpponentInCheck)
        ));
        // Eleven knights of one color cannot come from a real game.
        assert!(matches!(
            Board::from_fen("4k3/nnnnnnnn/nnn5/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::TooManyPieces { ch: 'n' })
        ));
    }

    #[test]
    fn unsupported_castling_bits_are_dropped() {
        // Rights claimed but the rooks are gone.
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
        assert_eq!(board.castling, 0);
    }

    #[test]
    fn en_passant_rank_must_match_side() {
        assert!(Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").is_ok());
        assert!(matches!(
            Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d3 0 1"),
            Err(FenError::InvalidEnPassant { .. })
        ));
    }
}
