//! Node-counting validation of the move generator.

use crate::board::Board;
use crate::moves::execute::{make_move, undo_move};
use crate::moves::movegen::generate_legal;
use crate::moves::types::Move;
use tracing::{debug, instrument};

const MAX_PERFT_DEPTH: usize = 16;

fn make_buffers(capacity: usize) -> [Vec<Move>; MAX_PERFT_DEPTH] {
    std::array::from_fn(|_| Vec::with_capacity(capacity))
}

fn perft_recursive(
    board: &mut Board,
    depth: u32,
    ply: usize,
    move_buffers: &mut [Vec<Move>; MAX_PERFT_DEPTH],
    scratch_buffers: &mut [Vec<Move>; MAX_PERFT_DEPTH],
) -> u64 {
    if depth == 0 {
        return 1;
    }

    // Buffers for this ply are taken out for the duration of the loop so
    // the recursion can borrow the arrays for deeper plies.
    let mut moves = std::mem::take(&mut move_buffers[ply]);
    let mut scratch = std::mem::take(&mut scratch_buffers[ply]);
    generate_legal(board, &mut moves, &mut scratch);

    let mut nodes = 0u64;
    if depth == 1 {
        nodes = moves.len() as u64;
    } else {
        for &mv in &moves {
            let delta = make_move(board, mv);
            nodes += perft_recursive(board, depth - 1, ply + 1, move_buffers, scratch_buffers);
            undo_move(board, delta);
        }
    }

    move_buffers[ply] = moves;
    scratch_buffers[ply] = scratch;
    nodes
}

/// Count leaf positions reachable in exactly `depth` plies.
#[instrument(skip(board), fields(depth))]
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    assert!(
        (depth as usize) <= MAX_PERFT_DEPTH,
        "depth {} exceeds MAX_PERFT_DEPTH {}",
        depth,
        MAX_PERFT_DEPTH
    );

    let mut move_buffers = make_buffers(64);
    let mut scratch_buffers = make_buffers(128);
    perft_recursive(board, depth, 0, &mut move_buffers, &mut scratch_buffers)
}

/// Per-root-move node counts, in coordinate notation. The sum of the
/// counts equals `perft(board, depth)`.
#[instrument(skip(board), fields(depth))]
pub fn perft_divide(board: &mut Board, depth: u32) -> Vec<(String, u64)> {
    assert!(depth >= 1, "divide needs at least depth 1");

    let mut move_buffers = make_buffers(64);
    let mut scratch_buffers = make_buffers(128);

    let mut roots = Vec::with_capacity(64);
    let mut scratch = Vec::with_capacity(128);
    generate_legal(board, &mut roots, &mut scratch);

    let mut rows = Vec::with_capacity(roots.len());
    for mv in roots {
        let delta = make_move(board, mv);
        let nodes = perft_recursive(board, depth - 1, 0, &mut move_buffers, &mut scratch_buffers);
        undo_move(board, delta);
        debug!(mv = %mv, nodes, "divide");
        rows.push((mv.to_coord(), nodes));
    }
    rows
}
