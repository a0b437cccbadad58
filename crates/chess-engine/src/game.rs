//! Full game management with history tracking.
//!
//! The [`Game`] struct owns one board and the legal moves of its side to
//! move, and adds what a single position cannot know: move history for
//! undo, repetition counting, and outcomes decided off the board (draw
//! offers, forfeits, fallen flags).

use crate::movegen::MoveList;
use crate::{transition, Board, BoardError, DrawReason, GameStatus, WinReason};
use chess_core::{Color, Move, MoveRequest, PieceKind};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// A recorded move in game history.
#[derive(Debug, Clone)]
pub struct GameMove {
    /// The move as it was generated.
    pub mov: Move,
    /// The board before the move.
    pub before: Board,
}

/// Error type for game operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("game has already ended: {0}")]
    GameOver(GameStatus),

    #[error("no move to take back")]
    NothingToUndo,

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// A chess game with history tracking.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    legal: MoveList,
    pseudo: MoveList,
    moves: Vec<GameMove>,
    /// Position keys of every position reached, the current one last.
    positions: Vec<String>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Times a position must occur for the game to be drawn.
    pub const REPETITION_LIMIT: usize = 3;

    /// Creates a new game from the starting position.
    pub fn new() -> Self {
        // The starting position always has moves.
        Self::from_board(Board::startpos()).unwrap_or_else(|_| unreachable!())
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Self::from_board(Board::from_fen(fen)?)
    }

    /// Creates a game starting at `board`.
    pub fn from_board(mut board: Board) -> Result<Self, GameError> {
        let mut pseudo = MoveList::new();
        let mut legal = MoveList::new();
        transition::refresh(&mut board, &mut pseudo, &mut legal)?;
        let positions = vec![board.position_key()];
        Ok(Game {
            board,
            legal,
            pseudo,
            moves: Vec::new(),
            positions,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the legal moves of the side to move; empty once the game is over.
    pub fn legal_moves(&self) -> &[Move] {
        self.legal.as_slice()
    }

    pub fn status(&self) -> GameStatus {
        self.board.status()
    }

    pub fn is_over(&self) -> bool {
        self.status().is_over()
    }

    pub fn is_check(&self) -> bool {
        self.board.is_check()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn move_history(&self) -> &[GameMove] {
        &self.moves
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// Returns the current position as a FEN string.
    pub fn to_fen(&self) -> String {
        self.board.to_fen()
    }

    /// Counts how many times the current position has occurred.
    pub fn position_count(&self) -> usize {
        match self.positions.last() {
            Some(current) => self.positions.iter().filter(|&key| key == current).count(),
            None => 0,
        }
    }

    fn ensure_ongoing(&self) -> Result<(), GameError> {
        match self.status() {
            status if status.is_over() => Err(GameError::GameOver(status)),
            _ => Ok(()),
        }
    }

    /// Finds the legal move named by `request`.
    pub fn find_move(&self, request: &MoveRequest) -> Option<Move> {
        self.legal.as_slice().iter().copied().find(|m| m.matches(request))
    }

    /// Plays the legal move named by origin, destination and promotion.
    pub fn play(&mut self, request: &MoveRequest) -> Result<GameStatus, GameError> {
        self.ensure_ongoing()?;
        let mv = self
            .find_move(request)
            .ok_or_else(|| GameError::IllegalMove(request.to_string()))?;
        self.apply(mv)
    }

    /// Plays a move given in coordinate notation, e.g. "e2e4" or "e7e8q".
    pub fn play_str(&mut self, text: &str) -> Result<GameStatus, GameError> {
        let request: MoveRequest = text.parse().map_err(GameError::IllegalMove)?;
        self.play(&request)
    }

    /// Plays a move taken from [`Game::legal_moves`].
    pub fn make_move(&mut self, mv: Move) -> Result<GameStatus, GameError> {
        self.ensure_ongoing()?;
        if !self.legal.as_slice().contains(&mv) {
            return Err(GameError::IllegalMove(mv.to_string()));
        }
        self.apply(mv)
    }

    fn apply(&mut self, mv: Move) -> Result<GameStatus, GameError> {
        let before = self.board.clone();
        let mut status =
            transition::apply_move(&mut self.board, &mv, &mut self.pseudo, &mut self.legal)?;
        self.moves.push(GameMove { mov: mv, before });
        self.positions.push(self.board.position_key());

        if status.is_ongoing() && self.position_count() >= Self::REPETITION_LIMIT {
            status = GameStatus::draw(DrawReason::ThreefoldRepetition);
            self.finish(status);
        }

        tracing::debug!(mv = %mv, status = %status, "move applied");
        Ok(status)
    }

    /// Takes back the last move.
    pub fn undo(&mut self) -> Result<Move, GameError> {
        let last = self.moves.pop().ok_or(GameError::NothingToUndo)?;
        self.positions.pop();
        self.board = last.before;
        transition::refresh(&mut self.board, &mut self.pseudo, &mut self.legal)?;
        Ok(last.mov)
    }

    /// Ends the game with a draw agreed by both players.
    pub fn agree_draw(&mut self) -> Result<GameStatus, GameError> {
        self.ensure_ongoing()?;
        Ok(self.finish(GameStatus::draw(DrawReason::Agreement)))
    }

    /// Ends the game by forfeit of `loser`.
    pub fn forfeit(&mut self, loser: Color) -> Result<GameStatus, GameError> {
        self.ensure_ongoing()?;
        Ok(self.finish(GameStatus::win(loser.opposite(), WinReason::Forfeit)))
    }

    /// Ends the game because `loser` ran out of time.
    ///
    /// If the opponent has nothing left but the king, the game is drawn.
    pub fn flag_fallen(&mut self, loser: Color) -> Result<GameStatus, GameError> {
        self.ensure_ongoing()?;
        let winner = loser.opposite();
        let status = if self.has_mating_material(winner) {
            GameStatus::win(winner, WinReason::Time)
        } else {
            GameStatus::draw(DrawReason::Timeout)
        };
        Ok(self.finish(status))
    }

    fn has_mating_material(&self, color: Color) -> bool {
        chess_core::Square::all().any(|sq| {
            let piece = self.board.piece_at(sq);
            piece.is_color(color) && piece.kind() != Some(PieceKind::King)
        })
    }

    fn finish(&mut self, status: GameStatus) -> GameStatus {
        self.board.set_status(status);
        self.legal.clear();
        tracing::debug!(status = %status, "game finished");
        status
    }

    /// Picks a uniformly random legal move, `None` once the game is over.
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Move> {
        self.legal.as_slice().choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_game() {
        let game = Game::new();
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.side_to_move(), Color::White);
        assert!(!game.is_over());
        assert_eq!(game.ply_count(), 0);
        assert_eq!(game.position_count(), 1);
    }

    #[test]
    fn play_and_undo() {
        let mut game = Game::new();
        let start = game.to_fen();
        game.play_str("e2e4").unwrap();
        game.play_str("c7c5").unwrap();
        assert_eq!(game.ply_count(), 2);
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2"
        );

        let taken = game.undo().unwrap();
        assert_eq!(taken.to_string(), "c7c5");
        game.undo().unwrap();
        assert_eq!(game.to_fen(), start);
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.undo(), Err(GameError::NothingToUndo));
    }

    #[test]
    fn rejects_illegal_moves() {
        let mut game = Game::new();
        assert!(matches!(game.play_str("e2e5"), Err(GameError::IllegalMove(_))));
        assert!(matches!(game.play_str("zz"), Err(GameError::IllegalMove(_))));
        assert_eq!(game.ply_count(), 0);

        let foreign = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap().legal_moves()[0];
        assert!(matches!(game.make_move(foreign), Err(GameError::IllegalMove(_))));
    }

    #[test]
    fn promotion_piece_must_match() {
        let mut game = Game::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(matches!(game.play_str("a7a8"), Err(GameError::IllegalMove(_))));
        game.play_str("a7a8r").unwrap();
        assert!(game
            .board()
            .piece_at(chess_core::Square::A8)
            .is(PieceKind::Rook, Color::White));
    }

    #[test]
    fn threefold_repetition() {
        let mut game = Game::new();
        for mv in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"] {
            assert!(game.play_str(mv).unwrap().is_ongoing());
        }
        let status = game.play_str("f6g8").unwrap();
        assert_eq!(status, GameStatus::draw(DrawReason::ThreefoldRepetition));
        assert_eq!(game.position_count(), 3);
        assert!(game.legal_moves().is_empty());
        assert!(matches!(game.play_str("e2e4"), Err(GameError::GameOver(_))));

        game.undo().unwrap();
        assert!(!game.is_over());
    }

    #[test]
    fn off_board_outcomes() {
        let mut game = Game::new();
        assert_eq!(
            game.agree_draw().unwrap(),
            GameStatus::draw(DrawReason::Agreement)
        );
        assert!(matches!(game.forfeit(Color::White), Err(GameError::GameOver(_))));

        let mut game = Game::new();
        let status = game.forfeit(Color::Black).unwrap();
        assert_eq!(status.winner(), Some(Color::White));
        assert_eq!(status.win_reason(), Some(WinReason::Forfeit));

        let mut game = Game::new();
        assert_eq!(
            game.flag_fallen(Color::White).unwrap(),
            GameStatus::win(Color::Black, WinReason::Time)
        );

        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert_eq!(
            game.flag_fallen(Color::White).unwrap(),
            GameStatus::draw(DrawReason::Timeout)
        );
    }

    #[test]
    fn random_moves_are_legal() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut game = Game::new();
        for _ in 0..40 {
            let Some(mv) = game.random_move(&mut rng) else {
                break;
            };
            assert!(game.legal_moves().contains(&mv));
            game.make_move(mv).unwrap();
        }
        let mut over = Game::from_fen("8/k7/8/K7/8/8/8/8 b - - 0 1").unwrap();
        assert!(over.is_over());
        assert_eq!(over.random_move(&mut rng), None);
        assert!(matches!(over.agree_draw(), Err(GameError::GameOver(_))));
    }
}
