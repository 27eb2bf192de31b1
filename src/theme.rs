use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use crate::error::ArchiveError;

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-7]{4}$").unwrap());

const CODE_LEN: usize = 4;

/// Total number of codes: seven digits in four positions.
pub const CODE_COUNT: usize = 7 * 7 * 7 * 7;

/// Four-digit melodic theme code prefix, digits 1-7.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThemeCode(String);

impl ThemeCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Every code from 1111 to 7777 in lexicographic order.
    pub fn all() -> impl Iterator<Item = ThemeCode> {
        (0..CODE_LEN)
            .map(|_| 1..=7u8)
            .multi_cartesian_product()
            .map(|digits| ThemeCode(digits.iter().map(|d| d.to_string()).collect()))
    }

    /// Codes at or after `start`, in the same order as [`ThemeCode::all`].
    pub fn starting_from(start: ThemeCode) -> impl Iterator<Item = ThemeCode> {
        Self::all().skip_while(move |code| *code < start)
    }
}

impl FromStr for ThemeCode {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if CODE_RE.is_match(s) {
            Ok(ThemeCode(s.to_string()))
        } else {
            Err(ArchiveError::InvalidThemeCode(s.to_string()))
        }
    }
}

impl fmt::Display for ThemeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
