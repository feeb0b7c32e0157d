//! Negamax alpha-beta with transposition table, plus iterative deepening.

use crate::board::Board;
use crate::moves::execute::{make_move, undo_move};
use crate::moves::movegen::generate_legal;
use crate::moves::square_control::in_check;
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::eval::evaluate;
use crate::search::ordering::order_moves;
use crate::search::tt::{Bound, HitKind, TranspositionTable};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub const INF: i32 = 32_000;
/// Score of a delivered mate at the root; mate-in-n scores count down
/// from here by plies.
pub const MATE_SCORE: i32 = 31_000;
/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;

/// True for scores that encode a forced mate for either side.
#[inline(always)]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

/// Plies until mate encoded in a mate score.
#[inline(always)]
pub fn mate_distance(score: i32) -> i32 {
    debug_assert!(is_mate_score(score));
    MATE_SCORE - score.abs()
}

/// Wall-clock budget and cooperative cancellation for one search.
///
/// The abort flag is polled on every node; the clock is sampled every 64
/// nodes. Once either trips, the in-flight iteration unwinds returning
/// values the driver discards.
pub struct TimeManager {
    start: Instant,
    allotted: Option<Duration>,
    abort: Arc<AtomicBool>,
    stop_signal: bool,
}

impl TimeManager {
    pub fn new(allotted: Option<Duration>, abort: Arc<AtomicBool>) -> Self {
        Self {
            start: Instant::now(),
            allotted,
            abort,
            stop_signal: false,
        }
    }

    #[inline(always)]
    pub fn poll(&mut self, nodes: u64) {
        if self.stop_signal {
            return;
        }
        if self.abort.load(Ordering::Relaxed) {
            self.stop_signal = true;
            return;
        }
        if nodes & 63 == 0
            && let Some(limit) = self.allotted
            && self.start.elapsed() >= limit
        {
            self.stop_signal = true;
        }
    }

    #[inline(always)]
    pub fn stopped(&self) -> bool {
        self.stop_signal
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Depth and time bounds for one `search_best_move` call.
#[derive(Clone, Copy, Debug)]
pub struct SearchLimits {
    pub max_depth: u32,
    pub max_time: Option<Duration>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_time: Some(Duration::from_millis(2_000)),
        }
    }
}

/// Result of the deepest completed iteration.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SearchReport {
    pub depth: u32,
    pub score: i32,
    pub best_move: Option<Move>,
    pub nodes: u64,
    pub elapsed: Duration,
}

/// Negamax alpha-beta over the move tree rooted at `board`.
///
/// Returns the score of the position within `(alpha, beta)`, relative to
/// the side to move. The best root move is reported through
/// `ctx.root_best` rather than the return value, so an aborted iteration
/// still leaves the last fully-evaluated root move behind.
#[allow(clippy::too_many_arguments)]
pub fn alpha_beta(
    board: &mut Board,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    time: &mut TimeManager,
    depth: i32,
    ply: i32,
    alpha: i32,
    beta: i32,
) -> i32 {
    time.poll(ctx.nodes);
    if time.stopped() {
        return 0;
    }
    ctx.nodes += 1;

    // Repetitions and exhausted fifty-move counters are draws wherever
    // they appear in the tree.
    if ply > 0 && (board.halfmove_clock >= 100 || board.is_repetition()) {
        return 0;
    }

    if depth <= 0 {
        return evaluate(board);
    }

    // Mate-distance pruning: no line from here can beat a mate already
    // found closer to the root.
    let mut alpha = alpha.max(-MATE_SCORE + ply);
    let beta = beta.min(MATE_SCORE - ply);
    if alpha >= beta {
        return alpha;
    }

    let hash = board.hash;
    let probe = tt.probe(hash, depth as u32, ply, alpha, beta);
    let tt_move = probe.best_move;
    if probe.kind != HitKind::Miss && (ply > 0 || tt_move.is_some()) {
        if ply == 0 {
            ctx.root_best = tt_move;
        }
        return match probe.kind {
            HitKind::Exact => probe.score,
            HitKind::Lower => beta,
            HitKind::Upper => alpha,
            HitKind::Miss => unreachable!(),
        };
    }

    let mut moves = Vec::with_capacity(64);
    let mut scratch = Vec::with_capacity(128);
    generate_legal(board, &mut moves, &mut scratch);

    if moves.is_empty() {
        return if in_check(board, board.side_to_move) {
            -MATE_SCORE + ply
        } else {
            0
        };
    }

    order_moves(&mut moves, board, tt_move);

    let mut bound = Bound::Upper;
    let mut best_move: Option<Move> = None;

    for &mv in moves.iter() {
        let delta = make_move(board, mv);
        let score = -alpha_beta(board, ctx, tt, time, depth - 1, ply + 1, -beta, -alpha);
        undo_move(board, delta);

        if time.stopped() {
            return 0;
        }

        if score >= beta {
            tt.store(hash, depth as u32, ply, beta, Bound::Lower, Some(mv));
            return beta;
        }
        if score > alpha {
            alpha = score;
            best_move = Some(mv);
            bound = Bound::Exact;
            if ply == 0 {
                ctx.root_best = Some(mv);
            }
        }
    }

    tt.store(hash, depth as u32, ply, alpha, bound, best_move);
    alpha
}

/// Iterative deepening driver.
///
/// Runs depths 1, 2, 3, ... until the depth or time budget is exhausted.
/// Only completed iterations update the returned report; an aborted
/// iteration is discarded, except that its partial root move stands in
/// when no iteration ever completed.
pub fn search_best_move(
    board: &mut Board,
    tt: &mut TranspositionTable,
    limits: SearchLimits,
    abort: Arc<AtomicBool>,
    mut progress: Option<&mut dyn FnMut(&SearchReport)>,
) -> SearchReport {
    let mut time = TimeManager::new(limits.max_time, abort);
    let mut ctx = SearchContext::new();
    tt.new_search();

    let mut report = SearchReport {
        depth: 0,
        score: 0,
        best_move: None,
        nodes: 0,
        elapsed: Duration::ZERO,
    };
    let mut last_iter = Duration::ZERO;

    for depth in 1..=limits.max_depth.max(1) {
        // Starting a depth we cannot plausibly finish only wastes the
        // remaining budget; each depth tends to cost several times the
        // previous one.
        if depth > 1
            && let Some(limit) = limits.max_time
            && time.elapsed() + last_iter * 3 > limit
        {
            break;
        }

        let iter_start = Instant::now();
        ctx.root_best = None;
        let score = alpha_beta(board, &mut ctx, tt, &mut time, depth as i32, 0, -INF, INF);
        last_iter = iter_start.elapsed();

        if time.stopped() {
            if report.best_move.is_none() {
                report.best_move = ctx.root_best;
            }
            break;
        }

        report = SearchReport {
            depth,
            score,
            best_move: ctx.root_best.or(report.best_move),
            nodes: ctx.nodes,
            elapsed: time.elapsed(),
        };
        tracing::debug!(
            depth,
            score,
            nodes = ctx.nodes,
            best = %report.best_move.map(|m| m.to_coord()).unwrap_or_default(),
            "iteration complete"
        );
        if let Some(cb) = progress.as_deref_mut() {
            cb(&report);
        }

        // A found mate cannot improve with more depth.
        if is_mate_score(score) {
            break;
        }
    }

    report.nodes = ctx.nodes;
    report.elapsed = time.elapsed();
    report
}
