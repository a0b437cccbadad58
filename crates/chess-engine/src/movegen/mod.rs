//! Move generation.
//!
//! Pieces walk their direction vectors over the padded mailbox: sliders up to
//! seven steps, leapers a single step. [`generate`] emits pseudo-legal moves;
//! [`filter_legal`] keeps the ones that do not leave the mover in check.

mod attacks;
mod legal;
pub mod perft;

use crate::board::CastleSide;
use crate::Board;
use chess_core::{mailbox, Color, Move, MoveFlags, Piece, PieceKind, Placement, Square};

pub use attacks::{is_king_in_check, is_square_attacked};
pub use legal::{filter_legal, generate_legal};

/// A growable list of moves.
///
/// Lists are meant to be reused: [`MoveList::clear`] drops the moves but keeps
/// the allocation for the next generation call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MoveList {
    moves: Vec<Move>,
}

impl MoveList {
    /// Typical upper bound of legal moves in a position.
    const INITIAL_CAPACITY: usize = 64;

    /// Creates an empty move list.
    pub fn new() -> Self {
        MoveList {
            moves: Vec::with_capacity(Self::INITIAL_CAPACITY),
        }
    }

    /// Adds a move to the list.
    #[inline]
    pub fn push(&mut self, m: Move) {
        self.moves.push(m);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves
    }

    /// Empties the list, keeping its capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Retains only moves for which the predicate returns true.
    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&Move) -> bool,
    {
        self.moves.retain(f);
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.moves[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Appends every pseudo-legal move of `side` to `moves`.
///
/// Moves that would leave `side`'s own king attacked are included; run the
/// result through [`filter_legal`] to drop them.
pub fn generate(board: &Board, side: Color, moves: &mut MoveList) {
    for from in Square::all() {
        let piece = board.piece_at(from);
        if !piece.is_color(side) {
            continue;
        }
        match piece.kind() {
            Some(PieceKind::Pawn) => generate_pawn_moves(board, from, piece, side, moves),
            Some(kind) => {
                generate_piece_moves(board, from, piece, kind, side, moves);
                if kind == PieceKind::King {
                    generate_castling_moves(board, side, moves);
                }
            }
            None => {}
        }
    }
}

fn generate_piece_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    kind: PieceKind,
    side: Color,
    moves: &mut MoveList,
) {
    let origin = Placement::new(from, piece);
    for &delta in mailbox::rays(kind) {
        let mut at = from;
        for _ in 0..mailbox::reach(kind) {
            let Some(to) = at.offset(delta) else {
                break;
            };
            let target = board.piece_at(to);
            if target.is_empty() {
                moves.push(Move::new(origin, Placement::new(to, target), MoveFlags::NORMAL));
            } else {
                if !target.is_color(side) {
                    moves.push(Move::new(origin, Placement::new(to, target), MoveFlags::CAPTURE));
                }
                break;
            }
            at = to;
        }
    }
}

fn generate_pawn_moves(board: &Board, from: Square, pawn: Piece, side: Color, moves: &mut MoveList) {
    let origin = Placement::new(from, pawn);

    for delta in mailbox::pawn_captures(side) {
        let Some(to) = from.offset(delta) else {
            continue;
        };
        let target = board.piece_at(to);
        if target.color() == Some(side.opposite()) {
            push_pawn_move(origin, Placement::new(to, target), MoveFlags::CAPTURE, side, moves);
        } else if target.is_empty()
            && board.en_passant() == Some(to)
            && is_en_passant_victim(board, from, to, side)
        {
            moves.push(Move::new(origin, Placement::new(to, target), MoveFlags::EN_PASSANT));
        }
    }

    let push = mailbox::pawn_push(side);
    let Some(one) = from.offset(push) else {
        return;
    };
    if !board.piece_at(one).is_empty() {
        return;
    }
    push_pawn_move(origin, Placement::new(one, Piece::EMPTY), MoveFlags::NORMAL, side, moves);

    if from.rank() == side.pawn_rank() {
        if let Some(two) = one.offset(push) {
            if board.piece_at(two).is_empty() {
                moves.push(Move::new(origin, Placement::new(two, Piece::EMPTY), MoveFlags::NORMAL));
            }
        }
    }
}

/// An en-passant target is only capturable if the pawn that skipped it is
/// still standing next to the capturer.
fn is_en_passant_victim(board: &Board, from: Square, to: Square, side: Color) -> bool {
    Square::from_coords(to.file(), from.rank())
        .map(|sq| board.piece_at(sq).is(PieceKind::Pawn, side.opposite()))
        .unwrap_or(false)
}

fn push_pawn_move(
    origin: Placement,
    target: Placement,
    flags: MoveFlags,
    side: Color,
    moves: &mut MoveList,
) {
    if target.square.rank() != side.promotion_rank() {
        moves.push(Move::new(origin, target, flags));
        return;
    }
    for kind in PieceKind::PROMOTIONS {
        let mut mv = Move::new(origin, target, flags | MoveFlags::PROMOTION);
        mv.promotion = Some(Piece::new(kind, side));
        moves.push(mv);
    }
}

fn generate_castling_moves(board: &Board, side: Color, moves: &mut MoveList) {
    let king = Piece::new(PieceKind::King, side);
    let rook = Piece::new(PieceKind::Rook, side);
    let enemy = side.opposite();

    for kingside in [true, false] {
        if !board.castling().has(side, kingside) {
            continue;
        }
        let castle = CastleSide::new(side, kingside);
        if board.piece_at(castle.king_from) != king || board.piece_at(castle.rook_from) != rook {
            continue;
        }
        if castle.between().any(|sq| !board.piece_at(sq).is_empty()) {
            continue;
        }
        if castle
            .king_path()
            .iter()
            .any(|&sq| is_square_attacked(board, sq, enemy))
        {
            continue;
        }
        moves.push(Move::new(
            Placement::new(castle.king_from, king),
            Placement::new(castle.king_to, Piece::EMPTY),
            MoveFlags::castle(side, kingside),
        ));
    }
}
