//! Chess rules engine over a padded mailbox board, with a pool-allocated
//! game tree.
//!
//! This crate provides:
//! - [`Board`] - position state: squares, king squares, castling rights,
//!   en-passant target, clocks, cached check flag and [`GameStatus`]
//! - Move generation ([`generate`]), attack queries and legality filtering
//!   by simulate/revert ([`filter_legal`])
//! - [`transition::apply_move`] - permanent move application with status
//!   derivation
//! - [`Game`] - history, undo, repetition, off-board outcomes and random
//!   move selection
//! - [`Tree`] - a lazily expanded tree of positions whose nodes and edges
//!   live in the fixed-capacity [`Pool`]s of a [`TreeArena`]
//!
//! # Example
//!
//! ```
//! use chess_engine::{Game, Tree, TreeArena, TreeConfig};
//!
//! let mut game = Game::new();
//! game.play_str("e2e4").unwrap();
//! game.play_str("e7e5").unwrap();
//! println!("Position after 1.e4 e5: {}", game.to_fen());
//!
//! let config = TreeConfig { max_depth: 2, ..TreeConfig::default() };
//! let mut arena = TreeArena::from_config(&config);
//! let tree = Tree::new(&mut arena, game.board(), config.max_depth).unwrap();
//! let mut nodes = 0;
//! tree.preorder(&mut arena, |_, _, _| nodes += 1).unwrap();
//! assert!(nodes > 1 + 29);
//! tree.destroy(&mut arena).unwrap();
//! ```

mod arena;
mod board;
mod config;
mod game;
pub mod movegen;
mod status;
pub mod transition;
mod tree;

pub use arena::{Pool, PoolError};
pub use board::{Board, BoardError, CastleSide, CastlingRights, MAX_PIECES};
pub use config::{ConfigError, TreeConfig};
pub use game::{Game, GameError, GameMove};
pub use movegen::{
    filter_legal, generate, generate_legal, is_king_in_check, is_square_attacked, MoveList,
};
pub use status::{DrawReason, GameStatus, WinReason};
pub use transition::apply_move;
pub use tree::{Children, Edge, EdgeId, Node, NodeFlags, NodeId, Tree, TreeArena, TreeError, TreeStats};
