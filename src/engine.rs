//! The engine driver: owns the board, the transposition table, and the
//! game history, and exposes the programmatic API hosts talk to.

use crate::board::{Board, FenError, Piece};
use crate::book::OpeningBook;
use crate::moves::execute::{make_move, undo_move};
use crate::moves::movegen::legal_moves;
use crate::moves::perft::perft;
use crate::moves::types::{Delta, Move};
use crate::search::eval::evaluate;
use crate::search::search::{SearchLimits, SearchReport, search_best_move};
use crate::search::tt::TranspositionTable;
use crate::square::Square;
use crate::status::{GameStatus, position_status};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

const DEFAULT_TT_MB: usize = 64;
/// Plies during which the opening book is consulted before searching.
const BOOK_PLY_LIMIT: usize = 16;

/// Outcome of an attempted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub accepted: bool,
    /// Status facing the side to move after the move (or the unchanged
    /// status when the move was rejected).
    pub status: GameStatus,
}

/// A complete engine instance: board, cache, history, and hooks.
///
/// Single-threaded by design; hosts that want parallel search clone the
/// engine per worker.
pub struct Engine {
    board: Board,
    tt: TranspositionTable,
    history: Vec<Delta>,
    limits: SearchLimits,
    abort: Arc<AtomicBool>,
    book: Option<Box<dyn OpeningBook>>,
    progress: Option<Box<dyn FnMut(&SearchReport)>>,
}

impl Engine {
    /// A fresh engine at the starting position.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            tt: TranspositionTable::new(DEFAULT_TT_MB),
            history: Vec::new(),
            limits: SearchLimits::default(),
            abort: Arc::new(AtomicBool::new(false)),
            book: None,
            progress: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Load a new root position. Clears the game history and the cache,
    /// since entries from another root are meaningless here.
    pub fn set_position_fen(&mut self, fen: &str) -> Result<(), FenError> {
        self.board.set_fen(fen)?;
        self.history.clear();
        self.tt.clear();
        Ok(())
    }

    pub fn current_fen(&self) -> String {
        self.board.to_fen()
    }

    /// Every legal move in the current position.
    pub fn legal_moves(&mut self) -> Vec<Move> {
        legal_moves(&mut self.board)
    }

    /// Play the move matching `(from, to, promotion)` if it is legal.
    ///
    /// On success the move is made, recorded in the history, and the
    /// resulting status is reported. On rejection the board is untouched.
    pub fn attempt_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> MoveOutcome {
        let candidate = self
            .legal_moves()
            .into_iter()
            .find(|mv| mv.from == from && mv.to == to && mv.promotion == promotion);

        match candidate {
            Some(mv) => {
                let delta = make_move(&mut self.board, mv);
                self.history.push(delta);
                MoveOutcome {
                    accepted: true,
                    status: position_status(&mut self.board),
                }
            }
            None => MoveOutcome {
                accepted: false,
                status: position_status(&mut self.board),
            },
        }
    }

    /// Take back the last played move. Returns false with the board
    /// untouched when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(delta) => {
                undo_move(&mut self.board, delta);
                true
            }
            None => false,
        }
    }

    /// Status facing the side to move.
    pub fn status(&mut self) -> GameStatus {
        position_status(&mut self.board)
    }

    /// Pick a move for the side to move, by book lookup in the opening
    /// and iterative-deepening search otherwise.
    pub fn search_best_move(&mut self, limits: SearchLimits) -> SearchReport {
        self.abort.store(false, Ordering::Relaxed);

        // Book moves only make sense in the opening, and only when the
        // book's suggestion is actually legal here.
        let book_move = if self.history.len() < BOOK_PLY_LIMIT {
            self.book.as_deref().and_then(|book| book.lookup(&self.board))
        } else {
            None
        };
        if let Some(mv) = book_move
            && self.legal_moves().contains(&mv)
        {
            info!(mv = %mv, "book move");
            return SearchReport {
                depth: 0,
                score: 0,
                best_move: Some(mv),
                nodes: 0,
                elapsed: Duration::ZERO,
            };
        }

        let progress: Option<&mut dyn FnMut(&SearchReport)> = match &mut self.progress {
            Some(sink) => Some(&mut **sink),
            None => None,
        };

        search_best_move(
            &mut self.board,
            &mut self.tt,
            limits,
            Arc::clone(&self.abort),
            progress,
        )
    }

    /// Search with the engine's default limits.
    pub fn go(&mut self) -> SearchReport {
        let limits = self.limits;
        self.search_best_move(limits)
    }

    /// Default per-move time budget used by [`Engine::go`].
    pub fn set_max_search_time(&mut self, ms: u64) {
        self.limits.max_time = Some(Duration::from_millis(ms));
    }

    pub fn set_max_search_depth(&mut self, depth: u32) {
        self.limits.max_depth = depth;
    }

    /// Handle a host can set from another thread to cancel the running
    /// search; the in-flight iteration is discarded.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    pub fn set_opening_book(&mut self, book: Box<dyn OpeningBook>) {
        self.book = Some(book);
    }

    pub fn clear_opening_book(&mut self) {
        self.book = None;
    }

    /// Callback invoked after every completed deepening iteration.
    pub fn set_progress_sink(&mut self, sink: Box<dyn FnMut(&SearchReport)>) {
        self.progress = Some(sink);
    }

    /// Leaf count at `depth`; validation hook for the move generator.
    pub fn perft(&mut self, depth: u32) -> u64 {
        perft(&mut self.board, depth)
    }

    /// Static evaluation of the current position, side-to-move relative.
    pub fn eval(&self) -> i32 {
        evaluate(&self.board)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
