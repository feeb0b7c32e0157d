// O(1) FEN glyph <-> mailbox-code maps.

use super::EMPTY;

const fn code_const(white: bool, piece_idx: u8) -> u8 {
    if white { 7 + piece_idx } else { 1 + piece_idx }
}

pub(super) const CHAR_TO_CODE: [u8; 128] = {
    let mut table = [EMPTY; 128];

    // Uppercase = White
    table['K' as usize] = code_const(true, 0);
    table['Q' as usize] = code_const(true, 1);
    table['R' as usize] = code_const(true, 2);
    table['B' as usize] = code_const(true, 3);
    table['N' as usize] = code_const(true, 4);
    table['P' as usize] = code_const(true, 5);

    // Lowercase = Black
    table['k' as usize] = code_const(false, 0);
    table['q' as usize] = code_const(false, 1);
    table['r' as usize] = code_const(false, 2);
    table['b' as usize] = code_const(false, 3);
    table['n' as usize] = code_const(false, 4);
    table['p' as usize] = code_const(false, 5);

    table
};

pub(super) const CODE_TO_CHAR: [char; 13] = [
    '\0', 'k', 'q', 'r', 'b', 'n', 'p', 'K', 'Q', 'R', 'B', 'N', 'P',
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, PIECES, piece_code};

    #[test]
    fn glyphs_round_trip() {
        for color in [Color::White, Color::Black] {
            for piece in PIECES {
                let code = piece_code(color, piece);
                let glyph = CODE_TO_CHAR[code as usize];
                assert_eq!(CHAR_TO_CODE[glyph as usize], code, "glyph {}", glyph);
            }
        }
        assert_eq!(CHAR_TO_CODE['x' as usize], EMPTY);
    }
}
