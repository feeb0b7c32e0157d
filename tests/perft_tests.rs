use meridian::board::Board;
use meridian::moves::execute::{make_move, undo_move};
use meridian::moves::movegen::generate_legal;
use meridian::moves::perft::{perft, perft_divide};
use meridian::moves::square_control::in_check;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const KIWI_FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn run_perft(fen: &str, depth: u32, expected: u64) {
    let mut board = Board::from_fen(fen).expect("valid fen");
    let nodes = perft(&mut board, depth);
    assert_eq!(
        nodes, expected,
        "perft mismatch at depth {depth}: got {nodes}, expected {expected}"
    );
    // The board comes back untouched.
    assert_eq!(board.to_fen(), fen);
}

#[test]
fn perft_startpos_d1() {
    run_perft(START_FEN, 1, 20);
}

#[test]
fn perft_startpos_d2() {
    run_perft(START_FEN, 2, 400);
}

#[test]
fn perft_startpos_d3() {
    run_perft(START_FEN, 3, 8_902);
}

#[test]
fn perft_startpos_d4() {
    run_perft(START_FEN, 4, 197_281);
}

#[test]
#[ignore] // heavy; opt-in on CI
fn perft_startpos_d5() {
    run_perft(START_FEN, 5, 4_865_609);
}

#[test]
#[ignore] // heavy; opt-in on CI
fn perft_startpos_d6() {
    run_perft(START_FEN, 6, 119_060_324);
}

#[test]
fn perft_kiwipete_d1() {
    run_perft(KIWI_FEN, 1, 48);
}

#[test]
fn perft_kiwipete_d2() {
    run_perft(KIWI_FEN, 2, 2_039);
}

#[test]
fn perft_kiwipete_d3() {
    run_perft(KIWI_FEN, 3, 97_862);
}

#[test]
#[ignore] // heavy; opt-in on CI
fn perft_kiwipete_d4() {
    run_perft(KIWI_FEN, 4, 4_085_603);
}

#[test]
#[ignore] // heavy; opt-in on CI
fn perft_kiwipete_d5() {
    run_perft(KIWI_FEN, 5, 193_690_690);
}

/// Positions that exercise en passant, promotion, and castling edges.
#[test]
fn perft_special_move_positions() {
    // EP immediately available for White: e5xd6 e.p.
    run_perft("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", 1, 7);
    // Promotion-ready pawn on a7.
    run_perft("4k3/P7/8/8/8/8/8/4K3 w - - 0 1", 1, 9);
    // Position 3 from the chessprogramming perft suite.
    run_perft("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 4, 43_238);
    // Position 4: castling, promotions, checks.
    run_perft(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        3,
        9_467,
    );
}

#[test]
fn divide_totals_match_perft() {
    let mut board = Board::from_fen(START_FEN).unwrap();
    let rows = perft_divide(&mut board, 2);
    let total: u64 = rows.iter().map(|(_, n)| n).sum();
    assert_eq!(total, 400);
    assert_eq!(rows.len(), 20);
}

#[test]
fn kiwipete_d2_breakdown() {
    let mut board = Board::from_fen(KIWI_FEN).unwrap();

    let mut roots = Vec::new();
    let mut scratch = Vec::new();
    generate_legal(&mut board, &mut roots, &mut scratch);

    let mut nodes = 0u64;
    let mut captures = 0u64;
    let mut ep = 0u64;
    let mut castles = 0u64;
    let mut checks = 0u64;

    for mv in roots {
        let delta = make_move(&mut board, mv);
        let mut replies = Vec::new();
        generate_legal(&mut board, &mut replies, &mut scratch);

        nodes += replies.len() as u64;
        for &reply in &replies {
            if reply.is_capture() {
                captures += 1;
            }
            if reply.is_en_passant() {
                ep += 1;
            }
            if reply.is_castling() {
                castles += 1;
            }
            let inner = make_move(&mut board, reply);
            if in_check(&board, board.side_to_move) {
                checks += 1;
            }
            undo_move(&mut board, inner);
        }

        undo_move(&mut board, delta);
    }

    assert_eq!(nodes, 2_039);
    assert_eq!(captures, 351);
    assert_eq!(ep, 1);
    assert_eq!(castles, 91);
    assert_eq!(checks, 3);
}

/// Random walks keep the incremental hash in lockstep with a full
/// recompute.
#[test]
fn perft_walk_hash_parity() {
    let fens = [
        START_FEN,
        KIWI_FEN,
        "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1",
        "4k3/P7/8/8/8/8/8/4K3 w - - 0 1",
    ];

    for &seed0 in &[1u64, 2, 3, 42, 99] {
        for fen in fens {
            let mut board = Board::from_fen(fen).unwrap();
            let mut seed = seed0;
            for _ply in 0..200 {
                assert_eq!(board.hash, board.compute_hash_full());

                let mut moves = Vec::new();
                let mut scratch = Vec::new();
                generate_legal(&mut board, &mut moves, &mut scratch);
                if moves.is_empty() {
                    break;
                }

                seed = splitmix64(seed);
                let mv = moves[(seed as usize) % moves.len()];

                let delta = make_move(&mut board, mv);
                assert_eq!(board.hash, board.compute_hash_full());
                undo_move(&mut board, delta);
                assert_eq!(board.hash, board.compute_hash_full());

                // Walk forward.
                let _ = make_move(&mut board, mv);
            }
        }
    }
}
