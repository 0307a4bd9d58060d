//! Content rating codes accepted for videos.
//!
//! The set is closed: `L` (general audience) and the minimum ages 10, 12,
//! 14, 16 and 18. Codes are stored and serialized as their string form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every accepted rating code, in ascending order of restriction.
pub const RATING_CODES: &[&str] = &["L", "10", "12", "14", "16", "18"];

/// A video content rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "L")]
    General,
    #[serde(rename = "10")]
    Age10,
    #[serde(rename = "12")]
    Age12,
    #[serde(rename = "14")]
    Age14,
    #[serde(rename = "16")]
    Age16,
    #[serde(rename = "18")]
    Age18,
}

impl Rating {
    pub const ALL: [Rating; 6] = [
        Rating::General,
        Rating::Age10,
        Rating::Age12,
        Rating::Age14,
        Rating::Age16,
        Rating::Age18,
    ];

    /// The code persisted in the `videos.rating` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::General => "L",
            Rating::Age10 => "10",
            Rating::Age12 => "12",
            Rating::Age14 => "14",
            Rating::Age16 => "16",
            Rating::Age18 => "18",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a code outside [`RATING_CODES`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rating code: {0}")]
pub struct UnknownRating(pub String);

impl FromStr for Rating {
    type Err = UnknownRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rating::ALL
            .into_iter()
            .find(|rating| rating.as_str() == s)
            .ok_or_else(|| UnknownRating(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_variants() {
        let codes: Vec<&str> = Rating::ALL.iter().map(|r| r.as_str()).collect();
        assert_eq!(codes, RATING_CODES);
    }

    #[test]
    fn parse_known_code() {
        assert_eq!("L".parse::<Rating>(), Ok(Rating::General));
        assert_eq!("16".parse::<Rating>(), Ok(Rating::Age16));
    }

    #[test]
    fn parse_unknown_code() {
        assert_eq!(
            "PG-13".parse::<Rating>(),
            Err(UnknownRating("PG-13".to_string()))
        );
    }

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_string(&Rating::Age12).unwrap(), "\"12\"");
        let parsed: Rating = serde_json::from_str("\"L\"").unwrap();
        assert_eq!(parsed, Rating::General);
    }
}
