use meridian::board::Board;
use meridian::moves::execute::{make_move, undo_move};
use meridian::moves::movegen::legal_moves;
use meridian::search::context::SearchContext;
use meridian::search::eval::evaluate;
use meridian::search::search::{
    INF, MATE_SCORE, SearchLimits, TimeManager, alpha_beta, is_mate_score, mate_distance,
    search_best_move,
};
use meridian::search::tt::TranspositionTable;
use meridian::square::Square;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn fixed_depth(depth: u32) -> SearchLimits {
    SearchLimits {
        max_depth: depth,
        max_time: None,
    }
}

/// Plain negamax over the same scoring rules as the searcher: no window,
/// no cache, no ordering. The oracle for pruning soundness.
fn reference_negamax(board: &mut Board, depth: i32, ply: i32) -> i32 {
    if ply > 0 && (board.halfmove_clock >= 100 || board.is_repetition()) {
        return 0;
    }
    if depth <= 0 {
        return evaluate(board);
    }

    let moves = legal_moves(board);
    if moves.is_empty() {
        return if meridian::moves::square_control::in_check(board, board.side_to_move) {
            -MATE_SCORE + ply
        } else {
            0
        };
    }

    let mut best = -INF;
    for mv in moves {
        let delta = make_move(board, mv);
        let score = -reference_negamax(board, depth - 1, ply + 1);
        undo_move(board, delta);
        best = best.max(score);
    }
    best
}

fn alpha_beta_root(board: &mut Board, depth: i32) -> i32 {
    let mut ctx = SearchContext::new();
    let mut tt = TranspositionTable::new(8);
    let mut time = TimeManager::new(None, Arc::new(AtomicBool::new(false)));
    alpha_beta(board, &mut ctx, &mut tt, &mut time, depth, 0, -INF, INF)
}

/// Alpha-beta with table and ordering returns exactly the minimax score.
#[test]
fn pruning_preserves_the_minimax_score() {
    let suite: &[(&str, i32)] = &[
        ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 3),
        ("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 2),
        ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 4),
        ("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4", 3),
        ("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", 4),
        ("7k/Q7/6K1/8/8/8/8/8 w - - 0 1", 3),
    ];

    for &(fen, depth) in suite {
        let mut board = Board::from_fen(fen).expect("valid fen");
        let expected = reference_negamax(&mut board, depth, 0);
        let got = alpha_beta_root(&mut board, depth);
        assert_eq!(got, expected, "score mismatch at depth {depth} for {fen}");
        // The search left the board as it found it.
        assert_eq!(board.to_fen(), fen);
    }
}

#[test]
fn search_is_deterministic_from_a_fresh_table() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    let run = || {
        let mut board = Board::from_fen(fen).unwrap();
        let mut tt = TranspositionTable::new(8);
        search_best_move(
            &mut board,
            &mut tt,
            fixed_depth(3),
            Arc::new(AtomicBool::new(false)),
            None,
        )
    };

    let a = run();
    let b = run();
    assert_eq!(a.best_move, b.best_move);
    assert_eq!(a.score, b.score);
    assert_eq!(a.nodes, b.nodes);
}

#[test]
fn scholars_mate_is_found() {
    // 4. Qxf7# is available.
    let mut board = Board::from_fen(
        "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
    )
    .unwrap();
    let mut tt = TranspositionTable::new(16);
    let report = search_best_move(
        &mut board,
        &mut tt,
        fixed_depth(4),
        Arc::new(AtomicBool::new(false)),
        None,
    );

    let best = report.best_move.expect("a move exists");
    assert_eq!(best.from, "h5".parse::<Square>().unwrap());
    assert_eq!(best.to, "f7".parse::<Square>().unwrap());
    assert!(is_mate_score(report.score));
    assert!(mate_distance(report.score) <= 2);
}

#[test]
fn mate_in_one_scores_mate_minus_one() {
    let mut board = Board::from_fen("7k/Q7/6K1/8/8/8/8/8 w - - 0 1").unwrap();
    let mut tt = TranspositionTable::new(8);
    let report = search_best_move(
        &mut board,
        &mut tt,
        fixed_depth(3),
        Arc::new(AtomicBool::new(false)),
        None,
    );
    assert_eq!(report.score, MATE_SCORE - 1);
    assert!(report.best_move.is_some());
}

#[test]
fn mated_side_reports_the_mate_score() {
    // Black to move, already mated.
    let mut board = Board::from_fen("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let mut tt = TranspositionTable::new(8);
    let report = search_best_move(
        &mut board,
        &mut tt,
        fixed_depth(3),
        Arc::new(AtomicBool::new(false)),
        None,
    );
    assert_eq!(report.score, -MATE_SCORE);
    assert_eq!(report.best_move, None);
}

#[test]
fn stalemate_scores_zero() {
    let mut board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let mut tt = TranspositionTable::new(8);
    let report = search_best_move(
        &mut board,
        &mut tt,
        fixed_depth(3),
        Arc::new(AtomicBool::new(false)),
        None,
    );
    assert_eq!(report.score, 0);
    assert_eq!(report.best_move, None);
}

#[test]
fn deeper_iterations_keep_a_legal_move() {
    let mut board = Board::new();
    let mut tt = TranspositionTable::new(16);
    let report = search_best_move(
        &mut board,
        &mut tt,
        fixed_depth(5),
        Arc::new(AtomicBool::new(false)),
        None,
    );

    let best = report.best_move.expect("start position has moves");
    assert!(legal_moves(&mut Board::new()).contains(&best));
    assert_eq!(report.depth, 5);
    assert!(report.nodes > 0);
}

#[test]
fn a_preset_abort_flag_stops_the_search_immediately() {
    let mut board = Board::new();
    let mut tt = TranspositionTable::new(8);
    let abort = Arc::new(AtomicBool::new(true));
    let report = search_best_move(&mut board, &mut tt, fixed_depth(6), abort, None);
    // Nothing completed; board untouched either way.
    assert_eq!(report.depth, 0);
    assert_eq!(board, Board::new());
}

#[test]
fn king_and_pawn_endgame_searches_deep() {
    let mut board = Board::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
    let mut tt = TranspositionTable::new(8);
    let report = search_best_move(
        &mut board,
        &mut tt,
        fixed_depth(6),
        Arc::new(AtomicBool::new(false)),
        None,
    );
    assert!(report.best_move.is_some());
    assert_eq!(report.depth, 6);
    assert!(report.score > 0, "the extra pawn shows up in the score");
}

#[test]
fn exhausted_fifty_move_counter_draws_the_tree() {
    // One ply from the hundred-halfmove mark: every quiet continuation
    // is an immediate draw, so the root scores zero despite the rook.
    let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 99 80").unwrap();
    let score = alpha_beta_root(&mut board, 4);
    assert_eq!(score, 0);
}
