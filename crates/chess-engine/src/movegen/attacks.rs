//! Attack detection.
//!
//! Rays are walked outward from the queried square. A piece found on a ray
//! attacks the square if it moves along that ray and reaches that far; the
//! walk stops at the first occupied square, whoever owns it.

use crate::Board;
use chess_core::mailbox::{self, BISHOP_RAYS, KNIGHT_RAYS, QUEEN_RAYS};
use chess_core::{Color, PieceKind, Square};

/// Returns true if any piece of `by` attacks `target`.
pub fn is_square_attacked(board: &Board, target: Square, by: Color) -> bool {
    // A pawn of `by` attacks `target` from one capture step behind it.
    for delta in mailbox::pawn_captures(by) {
        if let Some(sq) = target.offset(-delta) {
            if board.piece_at(sq).is(PieceKind::Pawn, by) {
                return true;
            }
        }
    }

    for &delta in KNIGHT_RAYS.iter() {
        if let Some(sq) = target.offset(delta) {
            if board.piece_at(sq).is(PieceKind::Knight, by) {
                return true;
            }
        }
    }

    for &delta in QUEEN_RAYS.iter() {
        let diagonal = BISHOP_RAYS.contains(&delta);
        let mut at = target;
        let mut distance = 0;
        while let Some(sq) = at.offset(delta) {
            distance += 1;
            let piece = board.piece_at(sq);
            if piece.is_empty() {
                at = sq;
                continue;
            }
            if piece.is_color(by) {
                let hits = match piece.kind() {
                    Some(PieceKind::Queen) => true,
                    Some(PieceKind::Rook) => !diagonal,
                    Some(PieceKind::Bishop) => diagonal,
                    Some(PieceKind::King) => distance == 1,
                    _ => false,
                };
                if hits {
                    return true;
                }
            }
            break;
        }
    }

    false
}

/// Returns true if `color`'s king is attacked by the other side.
#[inline]
pub fn is_king_in_check(board: &Board, color: Color) -> bool {
    is_square_attacked(board, board.king_square(color), color.opposite())
}
