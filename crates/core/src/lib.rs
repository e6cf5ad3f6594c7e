#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use registry::{
    CaseInsensitive, ExactKeys, KeyPolicy, RegistryEntry, RegistryError, RegistryMap, Stringified,
};

/// Integer value of a modded enum entry (TechType, EquipmentType, ...).
///
/// Save data written by the game references this number, never the symbolic
/// name, so an id must stay stable once handed out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EnumId(pub u32);

impl EnumId {
    /// Smallest representable id.
    pub const ZERO: Self = Self(0);

    /// Raw integer value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// The id directly above this one, or `None` past `u32::MAX`.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for EnumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EnumId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Reason an id field failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    /// Field was empty after trimming.
    Empty,
    /// Field was not an integer.
    NotNumeric,
    /// Field was a negative integer.
    Negative,
    /// Field does not fit in a `u32`.
    OutOfRange,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseIdError::Empty => "id is empty",
            ParseIdError::NotNumeric => "id is not numeric",
            ParseIdError::Negative => "id is negative",
            ParseIdError::OutOfRange => "id is out of range",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for EnumId {
    type Err = ParseIdError;

    /// Parse a whitespace-tolerant decimal id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseIdError::Empty);
        }
        let value: i64 = s.parse().map_err(|_| ParseIdError::NotNumeric)?;
        if value < 0 {
            return Err(ParseIdError::Negative);
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| ParseIdError::OutOfRange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_ids() {
        assert_eq!(" 11010 ".parse::<EnumId>(), Ok(EnumId(11010)));
        assert_eq!("0".parse::<EnumId>(), Ok(EnumId::ZERO));
    }

    #[test]
    fn rejects_bad_ids() {
        assert_eq!("".parse::<EnumId>(), Err(ParseIdError::Empty));
        assert_eq!("abc".parse::<EnumId>(), Err(ParseIdError::NotNumeric));
        assert_eq!("-5".parse::<EnumId>(), Err(ParseIdError::Negative));
        assert_eq!("4294967296".parse::<EnumId>(), Err(ParseIdError::OutOfRange));
    }

    #[test]
    fn next_saturates_at_max() {
        assert_eq!(EnumId(7).next(), Some(EnumId(8)));
        assert_eq!(EnumId(u32::MAX).next(), None);
    }
}
