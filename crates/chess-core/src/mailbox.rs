//! Padded 12x12 mailbox geometry.
//!
//! The 8x8 board sits inside a two-cell ring of off-board cells, so any
//! single step, including a knight jump, from an on-board square lands on a
//! valid cell of the padded grid. Stepping north adds [`WIDTH`], stepping east
//! adds one.

use crate::{Color, PieceKind, Square};

/// Cells per padded row.
pub const WIDTH: i8 = 12;

/// Total cells of the padded grid.
pub const CELLS: usize = 144;

const OFF_BOARD: i8 = -1;

const fn build_mailbox() -> [i8; CELLS] {
    let mut cells = [OFF_BOARD; CELLS];
    let mut sq = 0;
    while sq < 64 {
        let padded = (sq / 8 + 2) * 12 + sq % 8 + 2;
        cells[padded] = sq as i8;
        sq += 1;
    }
    cells
}

const fn build_padded() -> [u8; 64] {
    let mut padded = [0u8; 64];
    let mut sq = 0;
    while sq < 64 {
        padded[sq] = ((sq / 8 + 2) * 12 + sq % 8 + 2) as u8;
        sq += 1;
    }
    padded
}

/// Padded cell to board square, or -1 for the ring.
static MAILBOX: [i8; CELLS] = build_mailbox();

/// Board square to padded cell.
static PADDED: [u8; 64] = build_padded();

/// Returns the padded cell of a board square.
#[inline]
pub fn padded_index(sq: Square) -> u8 {
    PADDED[sq.index() as usize]
}

/// Returns the board square at a padded cell, `None` for the ring.
#[inline]
pub fn square_at(cell: usize) -> Option<Square> {
    match MAILBOX.get(cell) {
        Some(&s) if s >= 0 => Square::from_index(s as u8),
        _ => None,
    }
}

pub const ROOK_RAYS: [i8; 4] = [1, WIDTH, -1, -WIDTH];
pub const BISHOP_RAYS: [i8; 4] = [WIDTH + 1, WIDTH - 1, -WIDTH - 1, -WIDTH + 1];
pub const QUEEN_RAYS: [i8; 8] = [
    1,
    WIDTH + 1,
    WIDTH,
    WIDTH - 1,
    -1,
    -WIDTH - 1,
    -WIDTH,
    -WIDTH + 1,
];
pub const KNIGHT_RAYS: [i8; 8] = [
    WIDTH + 2,
    2 * WIDTH + 1,
    2 * WIDTH - 1,
    WIDTH - 2,
    -WIDTH - 2,
    -2 * WIDTH - 1,
    -2 * WIDTH + 1,
    -WIDTH + 2,
];

/// Pawn capture directions per color: two diagonals toward the enemy.
pub const fn pawn_captures(color: Color) -> [i8; 2] {
    match color {
        Color::White => [WIDTH - 1, WIDTH + 1],
        Color::Black => [-WIDTH + 1, -WIDTH - 1],
    }
}

/// Single pawn push direction per color.
pub const fn pawn_push(color: Color) -> i8 {
    match color {
        Color::White => WIDTH,
        Color::Black => -WIDTH,
    }
}

/// Step directions of a non-pawn piece kind.
pub const fn rays(kind: PieceKind) -> &'static [i8] {
    match kind {
        PieceKind::Rook => &ROOK_RAYS,
        PieceKind::Bishop => &BISHOP_RAYS,
        PieceKind::Queen | PieceKind::King => &QUEEN_RAYS,
        PieceKind::Knight => &KNIGHT_RAYS,
        PieceKind::Pawn => &[],
    }
}

/// How many steps a piece may take along one ray.
pub const fn reach(kind: PieceKind) -> u8 {
    if kind.is_slider() {
        7
    } else {
        1
    }
}
