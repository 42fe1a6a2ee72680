//! Multiplicity code parsing.
//!
//! # Responsibility
//! - Normalize user/imported codes (`br s`, `d quint`, `DD`) to one-letter
//!   generation tokens.
//! - Classify tokens as splitting or coupling-less (`s`, range-level `m`).
//!
//! # Invariants
//! - Splitting tokens have 2..=9 lines; each consumes one coupling constant.
//! - Parsing is pure; unknown letters are an error, never guessed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static BROAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bbr\b\.?").expect("valid broad regex"));
static LONG_FORM_RE: Lazy<Regex> =
    Lazy::new(|| {
        Regex::new(r"quint(?:et)?|sext(?:et)?|(?:sept|hept)(?:et)?|oct(?:et)?|non(?:et)?")
            .expect("valid long form regex")
    });
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// One generation of a multiplicity code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplicityToken {
    /// `s`: no splitting, no coupling constant.
    Singlet,
    /// Splits every line into `lines` lines with one coupling constant.
    Split { lines: u8 },
    /// `m`: unresolved, range-level multiplet.
    Massive,
}

impl MultiplicityToken {
    fn from_letter(letter: char) -> Option<Self> {
        let token = match letter {
            's' => Self::Singlet,
            'd' => Self::Split { lines: 2 },
            't' => Self::Split { lines: 3 },
            'q' => Self::Split { lines: 4 },
            'i' | 'p' => Self::Split { lines: 5 },
            'x' => Self::Split { lines: 6 },
            'h' => Self::Split { lines: 7 },
            'o' => Self::Split { lines: 8 },
            'n' => Self::Split { lines: 9 },
            'm' => Self::Massive,
            _ => return None,
        };
        Some(token)
    }

    pub fn carries_coupling(self) -> bool {
        matches!(self, Self::Split { .. })
    }
}

/// Parsed multiplicity code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplicityCode {
    tokens: Vec<MultiplicityToken>,
}

impl MultiplicityCode {
    /// Parses a code such as `dd`, `t`, `br s`, `d quint` or `m`.
    pub fn parse(code: &str) -> Result<Self, MultiplicityParseError> {
        let lowered = code.trim().to_ascii_lowercase();
        let without_broad = BROAD_RE.replace_all(&lowered, " ");
        let short = LONG_FORM_RE.replace_all(&without_broad, |caps: &regex::Captures<'_>| {
            match caps[0].trim_end_matches("et") {
                "quint" => "i",
                "sext" => "x",
                "sept" | "hept" => "h",
                "oct" => "o",
                _ => "n",
            }
        });
        let compact = WHITESPACE_RE.replace_all(&short, "");
        if compact.is_empty() {
            return Err(MultiplicityParseError::Empty);
        }

        let tokens = compact
            .chars()
            .map(|letter| {
                MultiplicityToken::from_letter(letter)
                    .ok_or(MultiplicityParseError::UnknownToken(letter))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[MultiplicityToken] {
        &self.tokens
    }

    /// True when every token is `m`: no tree, only a range bracket.
    pub fn is_range_level(&self) -> bool {
        self.tokens
            .iter()
            .all(|token| *token == MultiplicityToken::Massive)
    }

    /// Coupling constants consumed before the first coupling-less token
    /// (`s` or `m`), where expansion stops.
    pub fn coupling_count(&self) -> usize {
        self.tokens
            .iter()
            .take_while(|token| token.carries_coupling())
            .count()
    }
}

/// Multiplicity parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiplicityParseError {
    Empty,
    UnknownToken(char),
}

impl Display for MultiplicityParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "multiplicity code must not be empty"),
            Self::UnknownToken(letter) => write!(f, "unknown multiplicity token: `{letter}`"),
        }
    }
}

impl Error for MultiplicityParseError {}

#[cfg(test)]
mod tests {
    use super::{MultiplicityCode, MultiplicityParseError, MultiplicityToken};

    #[test]
    fn parses_compact_codes() {
        let code = MultiplicityCode::parse("dt").expect("dt parse");
        assert_eq!(
            code.tokens(),
            &[
                MultiplicityToken::Split { lines: 2 },
                MultiplicityToken::Split { lines: 3 }
            ]
        );
        assert_eq!(code.coupling_count(), 2);
        assert!(!code.is_range_level());
    }

    #[test]
    fn normalizes_long_forms_and_broad_prefix() {
        let code = MultiplicityCode::parse("br s").expect("br s parse");
        assert_eq!(code.tokens(), &[MultiplicityToken::Singlet]);

        let code = MultiplicityCode::parse("d quint").expect("d quint parse");
        assert_eq!(
            code.tokens(),
            &[
                MultiplicityToken::Split { lines: 2 },
                MultiplicityToken::Split { lines: 5 }
            ]
        );

        let code = MultiplicityCode::parse(" SEPT ").expect("sept parse");
        assert_eq!(code.tokens(), &[MultiplicityToken::Split { lines: 7 }]);
    }

    #[test]
    fn normalizes_full_word_forms() {
        let cases = [
            ("quintet", 5),
            ("sextet", 6),
            ("septet", 7),
            ("heptet", 7),
            ("octet", 8),
            ("nonet", 9),
        ];
        for (word, lines) in cases {
            let code = MultiplicityCode::parse(word).expect("full word parse");
            assert_eq!(code.tokens(), &[MultiplicityToken::Split { lines }], "{word}");
        }

        let code = MultiplicityCode::parse("d quintet").expect("d quintet parse");
        assert_eq!(code.coupling_count(), 2);
    }

    #[test]
    fn singlet_stops_coupling_consumption() {
        let code = MultiplicityCode::parse("sd").expect("sd parse");
        assert_eq!(code.coupling_count(), 0);
    }

    #[test]
    fn massive_stops_coupling_consumption() {
        let code = MultiplicityCode::parse("dm").expect("dm parse");
        assert_eq!(code.coupling_count(), 1);
        assert!(!code.is_range_level());
        assert!(MultiplicityCode::parse("m").expect("m parse").is_range_level());
    }

    #[test]
    fn rejects_unknown_and_empty_codes() {
        assert_eq!(
            MultiplicityCode::parse("dz"),
            Err(MultiplicityParseError::UnknownToken('z'))
        );
        assert_eq!(
            MultiplicityCode::parse("  "),
            Err(MultiplicityParseError::Empty)
        );
    }
}
