//! Move representation.
//!
//! A [`Move`] records the moving piece and whatever stood on the destination
//! square before the move. Those two snapshots are enough to take the move
//! back, so no separate undo log exists.

use crate::{Color, Piece, PieceKind, Square};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Flag byte of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MoveFlags(u8);

impl MoveFlags {
    pub const NORMAL: MoveFlags = MoveFlags(0);
    pub const CAPTURE: MoveFlags = MoveFlags(1 << 0);
    pub const PROMOTION: MoveFlags = MoveFlags(1 << 1);
    pub const EN_PASSANT: MoveFlags = MoveFlags(1 << 2);
    pub const CASTLE_WHITE_KINGSIDE: MoveFlags = MoveFlags(1 << 3);
    pub const CASTLE_WHITE_QUEENSIDE: MoveFlags = MoveFlags(1 << 4);
    pub const CASTLE_BLACK_KINGSIDE: MoveFlags = MoveFlags(1 << 5);
    pub const CASTLE_BLACK_QUEENSIDE: MoveFlags = MoveFlags(1 << 6);
    /// The move leaves the opponent in check.
    pub const CHECK: MoveFlags = MoveFlags(1 << 7);

    const CASTLE_MASK: u8 = 0b0111_1000;

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: MoveFlags) {
        self.0 |= other.0;
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        self.0 & Self::CASTLE_MASK != 0
    }

    /// Castling flag for a side, `kingside` selecting the short castle.
    pub const fn castle(color: Color, kingside: bool) -> MoveFlags {
        match (color, kingside) {
            (Color::White, true) => Self::CASTLE_WHITE_KINGSIDE,
            (Color::White, false) => Self::CASTLE_WHITE_QUEENSIDE,
            (Color::Black, true) => Self::CASTLE_BLACK_KINGSIDE,
            (Color::Black, false) => Self::CASTLE_BLACK_QUEENSIDE,
        }
    }
}

impl BitOr for MoveFlags {
    type Output = MoveFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        MoveFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for MoveFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A square together with the piece standing on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub square: Square,
    pub piece: Piece,
}

impl Placement {
    #[inline]
    pub const fn new(square: Square, piece: Piece) -> Self {
        Placement { square, piece }
    }
}

/// A chess move as produced by the move generator.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    /// Origin square and the piece that moves.
    pub from: Placement,
    /// Destination square and what stood there before the move.
    pub to: Placement,
    pub flags: MoveFlags,
    /// The piece a pawn turns into, when promoting.
    pub promotion: Option<Piece>,
}

impl Move {
    #[inline]
    pub const fn new(from: Placement, to: Placement, flags: MoveFlags) -> Self {
        Move {
            from,
            to,
            flags,
            promotion: None,
        }
    }

    /// Returns the moving side.
    #[inline]
    pub fn color(&self) -> Option<Color> {
        self.from.piece.color()
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.flags.contains(MoveFlags::CAPTURE) || self.flags.contains(MoveFlags::EN_PASSANT)
    }

    #[inline]
    pub fn gives_check(&self) -> bool {
        self.flags.contains(MoveFlags::CHECK)
    }

    /// Returns the kind of piece promoted to, if any.
    #[inline]
    pub fn promotion_kind(&self) -> Option<PieceKind> {
        self.promotion.and_then(Piece::kind)
    }

    /// Returns true if this move is the one named by `request`.
    pub fn matches(&self, request: &MoveRequest) -> bool {
        self.from.square == request.from
            && self.to.square == request.to
            && self.promotion_kind() == request.promotion
    }

    /// Returns the coordinate notation for this move (e.g., "e2e4", "e7e8q").
    pub fn to_coordinate(&self) -> String {
        MoveRequest::from(self).to_string()
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Move({}{}{}{} {:#04x})",
            self.from.piece,
            self.from.square,
            self.to.square,
            self.promotion.map_or(String::new(), |p| p.to_string()),
            self.flags.bits()
        )
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_coordinate())
    }
}

/// How a caller names a move: origin, destination and promotion piece.
///
/// Requests are matched against the generated legal moves; they never
/// become moves on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl MoveRequest {
    pub const fn new(from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        MoveRequest {
            from,
            to,
            promotion,
        }
    }
}

impl From<&Move> for MoveRequest {
    fn from(mv: &Move) -> Self {
        MoveRequest::new(mv.from.square, mv.to.square, mv.promotion_kind())
    }
}

impl FromStr for MoveRequest {
    type Err = String;

    /// Parses coordinate notation such as "e2e4" or "a7a8q".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid move: {}", s);
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(invalid());
        }
        let from = Square::from_algebraic(&s[0..2]).ok_or_else(invalid)?;
        let to = Square::from_algebraic(&s[2..4]).ok_or_else(invalid)?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_char(c) {
                Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
                _ => return Err(invalid()),
            },
        };
        Ok(MoveRequest::new(from, to, promotion))
    }
}

impl fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.to_char())?;
        }
        Ok(())
    }
}
