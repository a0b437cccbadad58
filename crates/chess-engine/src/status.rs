//! Game status codes.
//!
//! The status of a game is a single bit-flagged integer that external
//! callers consume verbatim:
//!
//! | bits   | meaning                                        |
//! |--------|------------------------------------------------|
//! | `0`    | game continues                                 |
//! | `0x10` | a side has won                                 |
//! | `0x20` | the winner is white (unset: black)             |
//! | `0x40` | the win was on time                            |
//! | `0x80` | the game is drawn                              |
//! | 8..=10 | reason: [`WinReason`] or [`DrawReason`]        |

use chess_core::Color;
use std::fmt;

/// Why a game was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum WinReason {
    Checkmate = 0,
    Time = 1,
    Forfeit = 2,
}

/// Why a game was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DrawReason {
    /// No legal moves but not in check.
    Stalemate = 0,
    /// Only the two kings are left.
    InsufficientMaterial = 1,
    /// Fifty plies without a capture or pawn move.
    FiftyMoveRule = 2,
    /// The same position occurred for the third time.
    ThreefoldRepetition = 3,
    Agreement = 4,
    /// A flag fell but the opponent has nothing to mate with.
    Timeout = 5,
}

impl WinReason {
    const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(WinReason::Checkmate),
            1 => Some(WinReason::Time),
            2 => Some(WinReason::Forfeit),
            _ => None,
        }
    }
}

impl DrawReason {
    const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(DrawReason::Stalemate),
            1 => Some(DrawReason::InsufficientMaterial),
            2 => Some(DrawReason::FiftyMoveRule),
            3 => Some(DrawReason::ThreefoldRepetition),
            4 => Some(DrawReason::Agreement),
            5 => Some(DrawReason::Timeout),
            _ => None,
        }
    }
}

/// Outcome of a position, encoded as status bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GameStatus(u32);

impl GameStatus {
    const WIN: u32 = 0x10;
    const WHITE: u32 = 0x20;
    const ON_TIME: u32 = 0x40;
    const DRAW: u32 = 0x80;
    const REASON_SHIFT: u32 = 8;
    const REASON_MASK: u32 = 0x7;

    /// The game continues.
    pub const ONGOING: GameStatus = GameStatus(0);

    /// A win for `winner`.
    pub const fn win(winner: Color, reason: WinReason) -> Self {
        let mut bits = Self::WIN | ((reason as u32) << Self::REASON_SHIFT);
        if let Color::White = winner {
            bits |= Self::WHITE;
        }
        if let WinReason::Time = reason {
            bits |= Self::ON_TIME;
        }
        GameStatus(bits)
    }

    pub const fn checkmate(winner: Color) -> Self {
        Self::win(winner, WinReason::Checkmate)
    }

    pub const fn draw(reason: DrawReason) -> Self {
        GameStatus(Self::DRAW | ((reason as u32) << Self::REASON_SHIFT))
    }

    /// Decodes raw status bits, rejecting combinations no game produces.
    pub fn from_bits(bits: u32) -> Option<Self> {
        let status = GameStatus(bits);
        let canonical = if bits == 0 {
            Some(Self::ONGOING)
        } else if let (Some(winner), Some(reason)) = (status.winner(), status.win_reason()) {
            Some(Self::win(winner, reason))
        } else {
            status.draw_reason().map(Self::draw)
        };
        canonical.filter(|c| *c == status)
    }

    /// Returns the raw status bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_ongoing(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_over(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub const fn is_win(self) -> bool {
        self.0 & Self::WIN != 0
    }

    #[inline]
    pub const fn is_draw(self) -> bool {
        self.0 & Self::DRAW != 0
    }

    const fn reason(self) -> u32 {
        (self.0 >> Self::REASON_SHIFT) & Self::REASON_MASK
    }

    /// Returns the winning side, if any.
    pub const fn winner(self) -> Option<Color> {
        if !self.is_win() {
            None
        } else if self.0 & Self::WHITE != 0 {
            Some(Color::White)
        } else {
            Some(Color::Black)
        }
    }

    pub const fn win_reason(self) -> Option<WinReason> {
        if self.is_win() {
            WinReason::from_code(self.reason())
        } else {
            None
        }
    }

    pub const fn draw_reason(self) -> Option<DrawReason> {
        if self.is_draw() {
            DrawReason::from_code(self.reason())
        } else {
            None
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(winner), Some(reason)) = (self.winner(), self.win_reason()) {
            let how = match reason {
                WinReason::Checkmate => "by checkmate",
                WinReason::Time => "on time",
                WinReason::Forfeit => "by forfeit",
            };
            return write!(f, "{} wins {}", winner, how);
        }
        if let Some(reason) = self.draw_reason() {
            let why = match reason {
                DrawReason::Stalemate => "Stalemate",
                DrawReason::InsufficientMaterial => "Insufficient material",
                DrawReason::FiftyMoveRule => "Fifty-move rule",
                DrawReason::ThreefoldRepetition => "Threefold repetition",
                DrawReason::Agreement => "Agreement",
                DrawReason::Timeout => "Timeout without mating material",
            };
            return write!(f, "Draw: {}", why);
        }
        if self.is_ongoing() {
            write!(f, "Game in progress")
        } else {
            write!(f, "Unknown status {:#x}", self.0)
        }
    }
}
