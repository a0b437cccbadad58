//! Core types for chess.
//!
//! This crate provides the fundamental types used across the chess engine:
//! - [`Piece`], [`PieceKind`] and [`Color`] for piece representation
//! - [`Square`] for board coordinates and [`mailbox`] for the padded
//!   step geometry used by move generation
//! - [`Move`] snapshots and caller-side [`MoveRequest`]s
//! - FEN parsing and serialization

mod color;
mod fen;
pub mod mailbox;
mod mov;
mod piece;
mod square;

pub use color::Color;
pub use fen::{FenError, FenParser};
pub use mov::{Move, MoveFlags, MoveRequest, Placement};
pub use piece::{Piece, PieceKind};
pub use square::Square;
