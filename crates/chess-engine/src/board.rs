//! Board state: square contents plus the metadata threaded through every move.

use chess_core::{Color, FenError, FenParser, Move, MoveFlags, Piece, PieceKind, Square};
use thiserror::Error;

use crate::movegen::{is_king_in_check, MoveList};
use crate::{transition, GameStatus};

/// Most non-king pieces a legal position can hold.
pub const MAX_PIECES: u32 = 30;

/// Errors raised when a board is built or mutated inconsistently.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error(transparent)]
    Fen(#[from] FenError),

    #[error("no {0} king on the board")]
    MissingKing(Color),

    #[error("more than one {0} king on the board")]
    DuplicateKing(Color),

    #[error("{0} pieces besides the kings (at most 30)")]
    TooManyPieces(u32),

    #[error("pawn on back rank at {0}")]
    PawnOnBackRank(Square),

    #[error("{0} is in check but it is not their move")]
    OpponentInCheck(Color),

    #[error("move expects {expected} on {square}, found {found}")]
    PieceMismatch {
        square: Square,
        expected: Piece,
        found: Piece,
    },
}

/// Castling rights flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// Creates new castling rights from flags.
    #[inline]
    pub const fn new(flags: u8) -> Self {
        CastlingRights(flags & 0b1111)
    }

    const fn flag(color: Color, kingside: bool) -> u8 {
        match (color, kingside) {
            (Color::White, true) => Self::WHITE_KINGSIDE,
            (Color::White, false) => Self::WHITE_QUEENSIDE,
            (Color::Black, true) => Self::BLACK_KINGSIDE,
            (Color::Black, false) => Self::BLACK_QUEENSIDE,
        }
    }

    /// Returns true if `color` may still castle on the given wing.
    #[inline]
    pub const fn has(self, color: Color, kingside: bool) -> bool {
        self.0 & Self::flag(color, kingside) != 0
    }

    /// Removes castling rights for a color.
    #[inline]
    pub fn remove_color(&mut self, color: Color) {
        self.0 &= !(Self::flag(color, true) | Self::flag(color, false));
    }

    /// Removes the right tied to the rook that starts on `corner`, if any.
    pub fn remove_corner(&mut self, corner: Square) {
        for color in Color::BOTH {
            for kingside in [true, false] {
                if CastleSide::new(color, kingside).rook_from == corner {
                    self.0 &= !Self::flag(color, kingside);
                }
            }
        }
    }

    /// Returns the raw flags.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    fn from_fen_field(field: &str) -> Self {
        let mut rights = 0;
        for c in field.chars() {
            rights |= match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => 0,
            };
        }
        CastlingRights(rights)
    }

    fn to_fen_field(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        [
            (Self::WHITE_KINGSIDE, 'K'),
            (Self::WHITE_QUEENSIDE, 'Q'),
            (Self::BLACK_KINGSIDE, 'k'),
            (Self::BLACK_QUEENSIDE, 'q'),
        ]
        .iter()
        .filter(|(flag, _)| self.0 & flag != 0)
        .map(|&(_, c)| c)
        .collect()
    }
}

/// Fixed squares involved in one of the four castling moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastleSide {
    pub color: Color,
    pub kingside: bool,
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
}

impl CastleSide {
    pub fn new(color: Color, kingside: bool) -> Self {
        let rank = color.back_rank();
        let at = |file| Square::from_coords(file, rank).unwrap_or(Square::A1);
        let (king_to, rook_from, rook_to) = if kingside {
            (6, 7, 5)
        } else {
            (2, 0, 3)
        };
        CastleSide {
            color,
            kingside,
            king_from: at(4),
            king_to: at(king_to),
            rook_from: at(rook_from),
            rook_to: at(rook_to),
        }
    }

    /// Returns the castling described by a move's flags, if it is one.
    pub fn from_flags(flags: MoveFlags) -> Option<Self> {
        Color::BOTH
            .iter()
            .flat_map(|&color| [(color, true), (color, false)])
            .find(|&(color, kingside)| flags.contains(MoveFlags::castle(color, kingside)))
            .map(|(color, kingside)| CastleSide::new(color, kingside))
    }

    /// Squares that must be empty between king and rook.
    pub fn between(&self) -> impl Iterator<Item = Square> {
        let (lo, hi) = if self.kingside { (5, 7) } else { (1, 4) };
        let rank = self.color.back_rank();
        (lo..hi).filter_map(move |file| Square::from_coords(file, rank))
    }

    /// Squares the king stands on, crosses, and lands on.
    pub fn king_path(&self) -> [Square; 3] {
        [self.king_from, self.rook_to, self.king_to]
    }
}

/// Complete chess position state.
///
/// Besides the 64 squares the board caches the king squares, the number of
/// non-king pieces, whether the side to move is in check, and the status
/// derived the last time legal moves were generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub(crate) squares: [Piece; 64],
    pub(crate) kings: [Square; 2],
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) piece_count: u32,
    pub(crate) check: bool,
    pub(crate) status: GameStatus,
}

impl Board {
    /// Creates the standard starting position.
    pub fn startpos() -> Self {
        let mut squares = [Piece::EMPTY; 64];
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, kind) in back.into_iter().enumerate() {
            squares[file] = Piece::new(kind, Color::White);
            squares[8 + file] = Piece::new(PieceKind::Pawn, Color::White);
            squares[48 + file] = Piece::new(PieceKind::Pawn, Color::Black);
            squares[56 + file] = Piece::new(kind, Color::Black);
        }
        Board {
            squares,
            kings: [Square::E1, Square::E8],
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            piece_count: 30,
            check: false,
            status: GameStatus::ONGOING,
        }
    }

    /// Creates a board from a FEN string.
    ///
    /// The check flag and status are derived immediately, so a board parsed
    /// from a finished position already reports how the game ended.
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let parsed = FenParser::parse(fen)?;

        let mut kings: [Option<Square>; 2] = [None, None];
        let mut piece_count = 0;
        for sq in Square::all() {
            let piece = parsed.placement[sq.index() as usize];
            let (Some(kind), Some(color)) = (piece.kind(), piece.color()) else {
                continue;
            };
            match kind {
                PieceKind::King => {
                    if kings[color.index()].replace(sq).is_some() {
                        return Err(BoardError::DuplicateKing(color));
                    }
                }
                PieceKind::Pawn if sq.rank() == 0 || sq.rank() == 7 => {
                    return Err(BoardError::PawnOnBackRank(sq));
                }
                _ => piece_count += 1,
            }
        }
        if piece_count > MAX_PIECES {
            return Err(BoardError::TooManyPieces(piece_count));
        }
        let white_king = kings[0].ok_or(BoardError::MissingKing(Color::White))?;
        let black_king = kings[1].ok_or(BoardError::MissingKing(Color::Black))?;

        let mut board = Board {
            squares: parsed.placement,
            kings: [white_king, black_king],
            side_to_move: parsed.active_color,
            castling: CastlingRights::from_fen_field(&parsed.castling),
            en_passant: parsed.en_passant,
            halfmove_clock: parsed.halfmove_clock,
            fullmove_number: parsed.fullmove_number,
            piece_count,
            check: false,
            status: GameStatus::ONGOING,
        };
        let waiting = board.side_to_move.opposite();
        if is_king_in_check(&board, waiting) {
            return Err(BoardError::OpponentInCheck(waiting));
        }
        transition::refresh(&mut board, &mut MoveList::new(), &mut MoveList::new())?;
        Ok(board)
    }

    /// Converts the board to a FEN string.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.position_key(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// The first four FEN fields: everything that makes two positions equal
    /// for repetition purposes.
    pub fn position_key(&self) -> String {
        format!(
            "{} {} {} {}",
            FenParser::placement_string(&self.squares),
            self.side_to_move.to_fen_char(),
            self.castling.to_fen_field(),
            self.en_passant
                .map_or_else(|| "-".to_string(), |sq| sq.to_algebraic())
        )
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Piece {
        self.squares[sq.index() as usize]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.kings[color.index()]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Number of pieces on the board other than the two kings.
    #[inline]
    pub fn piece_count(&self) -> u32 {
        self.piece_count
    }

    /// Whether the side to move is in check.
    #[inline]
    pub fn is_check(&self) -> bool {
        self.check
    }

    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Overrides the status with an outcome decided outside the rules of
    /// movement (agreement, repetition, clocks).
    pub(crate) fn set_status(&mut self, status: GameStatus) {
        self.status = status;
    }

    fn expect(&self, square: Square, expected: Piece) -> Result<(), BoardError> {
        let found = self.piece_at(square);
        if found == expected {
            Ok(())
        } else {
            Err(BoardError::PieceMismatch {
                square,
                expected,
                found,
            })
        }
    }

    /// Plays `mv` on the squares only: pieces, king squares, the rook of a
    /// castling move and the pawn taken en passant. Turn, clocks and rights
    /// are untouched. [`Board::revert`] undoes it exactly.
    pub fn simulate(&mut self, mv: &Move) -> Result<(), BoardError> {
        let color = match mv.from.piece.color() {
            Some(color) => color,
            None => {
                return Err(BoardError::PieceMismatch {
                    square: mv.from.square,
                    expected: mv.from.piece,
                    found: self.piece_at(mv.from.square),
                })
            }
        };
        self.expect(mv.from.square, mv.from.piece)?;
        self.expect(mv.to.square, mv.to.piece)?;

        let landing = mv.promotion.unwrap_or(mv.from.piece);
        self.squares[mv.to.square.index() as usize] = landing;
        self.squares[mv.from.square.index() as usize] = Piece::EMPTY;

        if mv.from.piece.kind() == Some(PieceKind::King) {
            self.kings[color.index()] = mv.to.square;
        }
        if mv.flags.contains(MoveFlags::EN_PASSANT) {
            let victim = en_passant_victim(mv);
            self.squares[victim.index() as usize] = Piece::EMPTY;
        }
        if let Some(castle) = CastleSide::from_flags(mv.flags) {
            let rook = self.piece_at(castle.rook_from);
            self.squares[castle.rook_to.index() as usize] = rook;
            self.squares[castle.rook_from.index() as usize] = Piece::EMPTY;
        }
        Ok(())
    }

    /// Takes back a move previously passed to [`Board::simulate`].
    pub fn revert(&mut self, mv: &Move) {
        self.squares[mv.from.square.index() as usize] = mv.from.piece;
        self.squares[mv.to.square.index() as usize] = mv.to.piece;

        let Some(color) = mv.from.piece.color() else {
            return;
        };
        if mv.from.piece.kind() == Some(PieceKind::King) {
            self.kings[color.index()] = mv.from.square;
        }
        if mv.flags.contains(MoveFlags::EN_PASSANT) {
            let victim = en_passant_victim(mv);
            self.squares[victim.index() as usize] =
                Piece::new(PieceKind::Pawn, color.opposite());
        }
        if let Some(castle) = CastleSide::from_flags(mv.flags) {
            let rook = self.piece_at(castle.rook_to);
            self.squares[castle.rook_from.index() as usize] = rook;
            self.squares[castle.rook_to.index() as usize] = Piece::EMPTY;
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::startpos()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let piece = self.squares[rank * 8 + file];
                write!(f, "{}", piece.to_fen_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The pawn removed by an en-passant capture stands beside the origin square,
/// on the destination file.
pub(crate) fn en_passant_victim(mv: &Move) -> Square {
    Square::from_coords(mv.to.square.file(), mv.from.square.rank()).unwrap_or(mv.to.square)
}
