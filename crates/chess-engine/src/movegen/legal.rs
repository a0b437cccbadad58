//! Legality filtering by simulation.

use super::{generate, is_king_in_check, MoveList};
use crate::{Board, BoardError};
use chess_core::{Color, MoveFlags};

/// Writes into `legal` the moves of `pseudo` that do not leave `side` in
/// check, flagging those that check the opponent.
///
/// Each move is simulated on `board` and reverted before the next one, so the
/// board is unchanged when this returns.
pub fn filter_legal(
    board: &mut Board,
    side: Color,
    pseudo: &MoveList,
    legal: &mut MoveList,
) -> Result<(), BoardError> {
    legal.clear();
    for mv in pseudo {
        board.simulate(mv)?;
        let exposed = is_king_in_check(board, side);
        let gives_check = !exposed && is_king_in_check(board, side.opposite());
        board.revert(mv);

        if !exposed {
            let mut mv = *mv;
            if gives_check {
                mv.flags.insert(MoveFlags::CHECK);
            }
            legal.push(mv);
        }
    }
    Ok(())
}

/// Generates the legal moves of the side to move, using `pseudo` as scratch.
pub fn generate_legal(
    board: &mut Board,
    pseudo: &mut MoveList,
    legal: &mut MoveList,
) -> Result<(), BoardError> {
    let side = board.side_to_move();
    pseudo.clear();
    generate(board, side, pseudo);
    filter_legal(board, side, pseudo, legal)
}
