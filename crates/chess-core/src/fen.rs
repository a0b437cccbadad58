//! FEN (Forsyth-Edwards Notation) tokenizing and validation.

use crate::{Color, Piece, Square};
use thiserror::Error;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 6 parts, got {0}")]
    InvalidPartCount(usize),

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0} (expected 0-50)")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),
}

/// The six validated fields of a FEN record.
///
/// Every field has been checked for syntax and range. Whether the placement
/// forms a playable position (kings present, piece count) is for the board
/// to decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenParser {
    /// Square contents indexed a1 = 0 .. h8 = 63.
    pub placement: [Piece; 64],
    pub active_color: Color,
    /// Castling availability, "-" or a subset of "KQkq" in that order.
    pub castling: String,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl FenParser {
    /// The standard starting position FEN.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Largest accepted halfmove clock; the fifty-move draw is due at this value.
    pub const MAX_HALFMOVE_CLOCK: u32 = 50;

    /// Parses and validates a FEN string.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();

        if parts.len() != 6 {
            return Err(FenError::InvalidPartCount(parts.len()));
        }

        let placement = Self::parse_placement(parts[0])?;

        let active_color = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidActiveColor(other.to_string())),
        };

        Self::validate_castling(parts[2])?;
        let en_passant = Self::parse_en_passant(parts[3])?;

        let halfmove_clock = parse_counter(parts[4])
            .filter(|&n| n <= Self::MAX_HALFMOVE_CLOCK)
            .ok_or_else(|| FenError::InvalidHalfmoveClock(parts[4].to_string()))?;

        let fullmove_number = parse_counter(parts[5])
            .filter(|&n| n >= 1)
            .ok_or_else(|| FenError::InvalidFullmoveNumber(parts[5].to_string()))?;

        Ok(FenParser {
            placement,
            active_color,
            castling: parts[2].to_string(),
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    fn parse_placement(placement: &str) -> Result<[Piece; 64], FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        let mut squares = [Piece::EMPTY; 64];
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(run @ 1..=8) = c.to_digit(10) {
                    file += run as u8;
                } else if let Some(piece) = Piece::from_fen_char(c) {
                    if let Some(sq) = Square::from_coords(file, rank) {
                        squares[sq.index() as usize] = piece;
                    }
                    file += 1;
                } else {
                    return Err(FenError::InvalidPiecePlacement(format!(
                        "invalid character '{}' in rank {}",
                        c,
                        rank + 1
                    )));
                }
                if file > 8 {
                    break;
                }
            }
            if file != 8 {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "rank {} does not describe exactly 8 squares",
                    rank + 1
                )));
            }
        }

        Ok(squares)
    }

    fn validate_castling(castling: &str) -> Result<(), FenError> {
        if castling == "-" {
            return Ok(());
        }

        // Each letter at most once, in canonical order.
        let mut remaining = "KQkq";
        for c in castling.chars() {
            match remaining.find(c) {
                Some(pos) => remaining = &remaining[pos + 1..],
                None => {
                    return Err(FenError::InvalidCastlingRights(format!(
                        "unexpected '{}' in '{}'",
                        c, castling
                    )))
                }
            }
        }

        Ok(())
    }

    fn parse_en_passant(ep: &str) -> Result<Option<Square>, FenError> {
        if ep == "-" {
            return Ok(None);
        }

        match Square::from_algebraic(ep) {
            Some(sq) if sq.rank() == 2 || sq.rank() == 5 => Ok(Some(sq)),
            _ => Err(FenError::InvalidEnPassantSquare(ep.to_string())),
        }
    }

    /// Returns the placement field in FEN form.
    pub fn placement_string(squares: &[Piece; 64]) -> String {
        let mut out = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                let piece = squares[(rank * 8 + file) as usize];
                if piece.kind().is_none() {
                    empty += 1;
                    continue;
                }
                if empty > 0 {
                    out.push_str(&empty.to_string());
                    empty = 0;
                }
                out.push(piece.to_fen_char());
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }

    /// Converts the parsed FEN back to a FEN string.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            Self::placement_string(&self.placement),
            self.active_color.to_fen_char(),
            self.castling,
            self.en_passant
                .map_or_else(|| "-".to_string(), |sq| sq.to_algebraic()),
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

/// Clocks are plain ASCII digits; signs, spaces and empty fields are rejected.
fn parse_counter(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PieceKind;

    #[test]
    fn parse_startpos() {
        let fen = FenParser::parse(FenParser::STARTPOS).unwrap();
        assert_eq!(fen.active_color, Color::White);
        assert_eq!(fen.castling, "KQkq");
        assert_eq!(fen.en_passant, None);
        assert_eq!(fen.halfmove_clock, 0);
        assert_eq!(fen.fullmove_number, 1);
        assert_eq!(
            fen.placement[Square::E1.index() as usize],
            Piece::new(PieceKind::King, Color::White)
        );
        assert_eq!(
            fen.placement[Square::D8.index() as usize],
            Piece::new(PieceKind::Queen, Color::Black)
        );
        assert!(fen.placement[32].is_empty());
    }

    #[test]
    fn roundtrip() {
        let original = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let parsed = FenParser::parse(original).unwrap();
        assert_eq!(parsed.to_fen(), original);
        assert_eq!(parsed.en_passant, Square::from_algebraic("e3"));
    }

    #[test]
    fn multi_digit_clocks() {
        let fen = FenParser::parse("8/8/8/8/8/8/8/8 w - - 42 117").unwrap();
        assert_eq!(fen.halfmove_clock, 42);
        assert_eq!(fen.fullmove_number, 117);
    }

    #[test]
    fn wrong_part_count() {
        assert!(matches!(
            FenParser::parse("invalid"),
            Err(FenError::InvalidPartCount(1))
        ));
    }

    #[test]
    fn wrong_active_color() {
        assert!(matches!(
            FenParser::parse("8/8/8/8/8/8/8/8 x KQkq - 0 1"),
            Err(FenError::InvalidActiveColor(_))
        ));
    }

    #[test]
    fn placement_errors() {
        for bad in [
            "8/8/8/8/8/8/8 w - - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPXPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "7/8/8/8/8/8/8/8 w - - 0 1",
            "09/8/8/8/8/8/8/8 w - - 0 1",
            "81/8/8/8/8/8/8/8 w - - 0 1",
        ] {
            assert!(
                matches!(FenParser::parse(bad), Err(FenError::InvalidPiecePlacement(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn castling_errors() {
        for bad in ["XYZ", "KK", "qK", ""] {
            let fen = format!("8/8/8/8/8/8/8/8 w {} - 0 1", bad);
            // An empty field collapses the part count instead.
            assert!(FenParser::parse(&fen).is_err(), "{bad}");
        }
        assert!(FenParser::parse("8/8/8/8/8/8/8/8 w Kq - 0 1").is_ok());
    }

    #[test]
    fn en_passant_errors() {
        for bad in ["abc", "x3", "e4", "e"] {
            let fen = format!("8/8/8/8/8/8/8/8 w - {} 0 1", bad);
            assert!(
                matches!(FenParser::parse(&fen), Err(FenError::InvalidEnPassantSquare(_))),
                "{bad}"
            );
        }
        let fen = FenParser::parse("8/8/8/8/8/8/8/8 b - d6 0 1").unwrap();
        assert_eq!(fen.en_passant, Square::from_algebraic("d6"));
    }

    #[test]
    fn halfmove_clock_range_and_syntax() {
        for bad in ["abc", "51", "+3", "-1", "1x"] {
            let fen = format!("8/8/8/8/8/8/8/8 w - - {} 1", bad);
            assert!(
                matches!(FenParser::parse(&fen), Err(FenError::InvalidHalfmoveClock(_))),
                "{bad}"
            );
        }
        assert!(FenParser::parse("8/8/8/8/8/8/8/8 w - - 50 1").is_ok());
    }

    #[test]
    fn fullmove_number_must_be_positive() {
        for bad in ["xyz", "0", "+1"] {
            let fen = format!("8/8/8/8/8/8/8/8 w - - 0 {}", bad);
            assert!(
                matches!(FenParser::parse(&fen), Err(FenError::InvalidFullmoveNumber(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn fen_error_display() {
        let err = FenError::InvalidPartCount(3);
        assert!(format!("{}", err).contains('3'));

        let err = FenError::InvalidHalfmoveClock("77".to_string());
        let text = format!("{}", err);
        assert!(text.contains("77"));
        assert!(text.contains("0-50"));
    }
}
