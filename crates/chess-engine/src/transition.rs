//! Permanent move application and status derivation.

use crate::movegen::{generate_legal, is_king_in_check, MoveList};
use crate::{Board, BoardError, DrawReason, GameStatus};
use chess_core::{Color, FenParser, Move, PieceKind, Square};

/// Regenerates the legal moves of the side to move into `legal` and derives
/// the board's check flag and status from them.
///
/// With no pieces left besides the kings, or with the halfmove clock at
/// fifty, the game is drawn and `legal` stays empty.
pub fn refresh(
    board: &mut Board,
    pseudo: &mut MoveList,
    legal: &mut MoveList,
) -> Result<GameStatus, BoardError> {
    let side = board.side_to_move();
    board.check = is_king_in_check(board, side);
    legal.clear();

    let status = if board.piece_count == 0 {
        GameStatus::draw(DrawReason::InsufficientMaterial)
    } else if board.halfmove_clock >= FenParser::MAX_HALFMOVE_CLOCK {
        GameStatus::draw(DrawReason::FiftyMoveRule)
    } else {
        generate_legal(board, pseudo, legal)?;
        if !legal.is_empty() {
            GameStatus::ONGOING
        } else if board.check {
            GameStatus::checkmate(side.opposite())
        } else {
            GameStatus::draw(DrawReason::Stalemate)
        }
    };

    board.status = status;
    Ok(status)
}

/// Plays `mv` on the board and updates turn, clocks, castling rights, the
/// en-passant target and the piece count. Legal moves and status are left
/// for [`refresh`].
pub fn advance(board: &mut Board, mv: &Move) -> Result<(), BoardError> {
    board.simulate(mv)?;

    let mover = board.side_to_move;
    if mover == Color::Black {
        board.fullmove_number = board.fullmove_number.saturating_add(1);
    }

    let is_pawn = mv.from.piece.kind() == Some(PieceKind::Pawn);
    if mv.is_capture() || is_pawn {
        board.halfmove_clock = 0;
    } else {
        board.halfmove_clock += 1;
    }

    if mv.from.piece.kind() == Some(PieceKind::King) && mv.from.square == king_home(mover) {
        board.castling.remove_color(mover);
    }
    board.castling.remove_corner(mv.from.square);
    board.castling.remove_corner(mv.to.square);

    board.en_passant = if is_pawn && mv.from.square.rank().abs_diff(mv.to.square.rank()) == 2 {
        let skipped = (mv.from.square.rank() + mv.to.square.rank()) / 2;
        Square::from_coords(mv.from.square.file(), skipped)
    } else {
        None
    };

    if mv.is_capture() {
        board.piece_count = board.piece_count.saturating_sub(1);
    }

    board.side_to_move = mover.opposite();
    Ok(())
}

/// Applies a legal move permanently and returns the resulting status.
///
/// `legal` receives the legal moves of the side now to move.
pub fn apply_move(
    board: &mut Board,
    mv: &Move,
    pseudo: &mut MoveList,
    legal: &mut MoveList,
) -> Result<GameStatus, BoardError> {
    advance(board, mv)?;
    refresh(board, pseudo, legal)
}

fn king_home(color: Color) -> Square {
    match color {
        Color::White => Square::E1,
        Color::Black => Square::E8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WinReason;
    use chess_core::MoveRequest;

    struct Fixture {
        board: Board,
        pseudo: MoveList,
        legal: MoveList,
    }

    impl Fixture {
        fn new(fen: &str) -> Self {
            let mut board = Board::from_fen(fen).unwrap();
            let mut pseudo = MoveList::new();
            let mut legal = MoveList::new();
            refresh(&mut board, &mut pseudo, &mut legal).unwrap();
            Fixture {
                board,
                pseudo,
                legal,
            }
        }

        fn play(&mut self, text: &str) -> GameStatus {
            let request: MoveRequest = text.parse().unwrap();
            let mv = *self
                .legal
                .as_slice()
                .iter()
                .find(|m| m.matches(&request))
                .unwrap_or_else(|| panic!("{text} is not legal"));
            apply_move(&mut self.board, &mv, &mut self.pseudo, &mut self.legal).unwrap()
        }
    }

    #[test]
    fn clocks_and_turn() {
        let mut f = Fixture::new(FenParser::STARTPOS);
        f.play("g1f3");
        assert_eq!(f.board.side_to_move(), Color::Black);
        assert_eq!(f.board.halfmove_clock(), 1);
        assert_eq!(f.board.fullmove_number(), 1);
        f.play("g8f6");
        assert_eq!(f.board.halfmove_clock(), 2);
        assert_eq!(f.board.fullmove_number(), 2);
        f.play("e2e4");
        assert_eq!(f.board.halfmove_clock(), 0);
        assert_eq!(f.board.en_passant(), Square::from_algebraic("e3"));
        f.play("f6e4");
        assert_eq!(f.board.halfmove_clock(), 0);
        assert_eq!(f.board.en_passant(), None);
        assert_eq!(f.board.piece_count(), 29);
        assert_eq!(
            f.board.to_fen(),
            "rnbqkb1r/pppppppp/8/8/4n3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 3"
        );
    }

    #[test]
    fn castling_rights_follow_king_and_rooks() {
        let mut f = Fixture::new("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        f.play("h1h8");
        // White gave up the h1 rook's right, black lost the captured rook's.
        assert!(!f.board.castling().has(Color::White, true));
        assert!(f.board.castling().has(Color::White, false));
        assert!(!f.board.castling().has(Color::Black, true));
        assert!(f.board.castling().has(Color::Black, false));
        assert_eq!(f.board.piece_count(), 3);

        f.play("e8d7");
        assert!(!f.board.castling().has(Color::Black, false));
        assert_eq!(f.board.castling().raw(), crate::CastlingRights::WHITE_QUEENSIDE);
    }

    #[test]
    fn castling_moves_the_rook() {
        let mut f = Fixture::new("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        f.play("e1g1");
        assert_eq!(f.board.king_square(Color::White), Square::G1);
        assert!(f.board.piece_at(Square::F1).is(PieceKind::Rook, Color::White));
        assert!(f.board.piece_at(Square::H1).is_empty());
        assert!(!f.board.castling().has(Color::White, true));
        assert!(!f.board.castling().has(Color::White, false));
        f.play("e8c8");
        assert!(f.board.piece_at(Square::D8).is(PieceKind::Rook, Color::Black));
        assert_eq!(f.board.castling(), crate::CastlingRights::NONE);
    }

    #[test]
    fn en_passant_capture_removes_the_pawn() {
        let mut f = Fixture::new("rnbqkbnr/1pp1pppp/8/p2pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3");
        f.play("e5d6");
        assert!(f.board.piece_at(Square::from_algebraic("d5").unwrap()).is_empty());
        assert!(f
            .board
            .piece_at(Square::from_algebraic("d6").unwrap())
            .is(PieceKind::Pawn, Color::White));
        assert_eq!(f.board.piece_count(), 29);
    }

    #[test]
    fn promotion_places_the_new_piece() {
        let mut f = Fixture::new("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        f.play("a7a8n");
        assert!(f.board.piece_at(Square::A8).is(PieceKind::Knight, Color::White));
        assert_eq!(f.board.piece_count(), 1);
    }

    #[test]
    fn checkmate() {
        let mut f = Fixture::new("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3");
        f.play("f1c4");
        f.play("g8f6");
        f.play("d1h5");
        f.play("a7a6");
        let status = f.play("h5f7");
        assert_eq!(status, GameStatus::checkmate(Color::White));
        assert_eq!(status.win_reason(), Some(WinReason::Checkmate));
        assert!(f.board.is_check());
        assert!(f.legal.is_empty());
        assert_eq!(f.board.status(), status);
    }

    #[test]
    fn fools_mate() {
        let mut f = Fixture::new(FenParser::STARTPOS);
        f.play("f2f3");
        f.play("e7e5");
        f.play("g2g4");
        let status = f.play("d8h4");
        assert_eq!(status, GameStatus::checkmate(Color::Black));
        assert_eq!(status.bits(), 0x10);
    }

    #[test]
    fn stalemate() {
        let mut f = Fixture::new("k7/8/8/2Q5/8/8/8/4K3 w - - 0 1");
        let status = f.play("c5b6");
        assert_eq!(status, GameStatus::draw(DrawReason::Stalemate));
        assert!(!f.board.is_check());
    }

    #[test]
    fn bare_kings_are_insufficient_material() {
        let f = Fixture::new("8/k7/8/K7/8/8/8/8 b - - 0 1");
        assert_eq!(f.board.status(), GameStatus::draw(DrawReason::InsufficientMaterial));
        assert!(f.legal.is_empty());

        let mut f = Fixture::new("8/k7/8/K7/8/8/8/7q w - - 0 1");
        let status = f.play("a5b5");
        assert!(status.is_ongoing());
    }

    #[test]
    fn fifty_move_rule() {
        let mut f = Fixture::new("4k3/8/8/8/8/8/8/R3K3 w - - 49 70");
        let status = f.play("a1a2");
        assert_eq!(status, GameStatus::draw(DrawReason::FiftyMoveRule));
        assert_eq!(f.board.halfmove_clock(), 50);
        assert!(f.legal.is_empty());
    }

    #[test]
    fn fullmove_number_saturates() {
        let mut f = Fixture::new("4k3/8/8/8/8/8/8/R3K3 b - - 0 4294967295");
        assert!(f.play("e8d8").is_ongoing());
        assert_eq!(f.board.fullmove_number(), u32::MAX);
        let fen = f.board.to_fen();
        assert_eq!(Board::from_fen(&fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn advance_rejects_inconsistent_snapshots() {
        let mut f = Fixture::new(FenParser::STARTPOS);
        let mv = f.legal[0];
        f.play(&mv.to_string());
        let before = f.board.clone();
        assert!(matches!(
            advance(&mut f.board, &mv),
            Err(BoardError::PieceMismatch { .. })
        ));
        assert_eq!(f.board, before);
    }
}
