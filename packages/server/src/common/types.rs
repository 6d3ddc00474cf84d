//! Shared value types for the sponsor tree.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned member identifier.
///
/// Codes are allocated by the store in strictly increasing order and are never
/// reused, so a child's code is always greater than its parent's.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct MemberCode(pub i64);

impl MemberCode {
    #[inline]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MemberCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemberCode {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl From<i64> for MemberCode {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// Clients send codes both as JSON numbers and as numeric strings.
impl<'de> Deserialize<'de> for MemberCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Which child slot of a member a placement targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid side: {0} (expected Left or Right)")]
pub struct ParseSideError(String);

impl FromStr for Side {
    type Err = ParseSideError;

    /// Accepts `Left`/`Right` in any case, so both the JSON body value and
    /// the lowercase route segment parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(ParseSideError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_code_accepts_number_or_string() {
        let from_number: MemberCode = serde_json::from_str("42").unwrap();
        let from_string: MemberCode = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_number, MemberCode(42));
        assert_eq!(from_string, MemberCode(42));

        assert!(serde_json::from_str::<MemberCode>("\"abc\"").is_err());
    }

    #[test]
    fn member_code_serializes_as_number() {
        assert_eq!(serde_json::to_string(&MemberCode(7)).unwrap(), "7");
    }

    #[test]
    fn side_parses_case_insensitively() {
        assert_eq!("Left".parse::<Side>().unwrap(), Side::Left);
        assert_eq!("right".parse::<Side>().unwrap(), Side::Right);
        assert_eq!("RIGHT".parse::<Side>().unwrap(), Side::Right);
        assert!("middle".parse::<Side>().is_err());
    }

    #[test]
    fn side_uses_original_wire_values() {
        assert_eq!(serde_json::to_string(&Side::Left).unwrap(), "\"Left\"");
        let side: Side = serde_json::from_str("\"Right\"").unwrap();
        assert_eq!(side, Side::Right);
    }
}
