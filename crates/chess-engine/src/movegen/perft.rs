//! Perft (performance test) for move generator validation.
//!
//! Perft counts the number of leaf nodes at a given depth, which can be
//! compared against known-correct values to validate the move generator.
//! Game-ending rules are ignored: every legal move is followed.

use super::{generate_legal, MoveList};
use crate::{transition, Board, BoardError};

fn legal_moves(board: &Board) -> Result<MoveList, BoardError> {
    let mut scratch = board.clone();
    let mut legal = MoveList::new();
    generate_legal(&mut scratch, &mut MoveList::new(), &mut legal)?;
    Ok(legal)
}

/// Counts the number of leaf nodes at the given depth.
pub fn perft(board: &Board, depth: u32) -> Result<u64, BoardError> {
    if depth == 0 {
        return Ok(1);
    }

    let moves = legal_moves(board)?;
    if depth == 1 {
        return Ok(moves.len() as u64);
    }

    let mut nodes = 0u64;
    for m in &moves {
        let mut child = board.clone();
        transition::advance(&mut child, m)?;
        nodes += perft(&child, depth - 1)?;
    }
    Ok(nodes)
}

/// Perft with divide - node count below each root move, sorted by move text.
/// Useful for debugging to identify which moves have incorrect counts.
pub fn perft_divide(board: &Board, depth: u32) -> Result<Vec<(String, u64)>, BoardError> {
    let moves = legal_moves(board)?;
    let mut results = Vec::with_capacity(moves.len());

    for m in &moves {
        let nodes = if depth > 1 {
            let mut child = board.clone();
            transition::advance(&mut child, m)?;
            perft(&child, depth - 1)?
        } else {
            1
        };
        results.push((m.to_string(), nodes));
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(results)
}
