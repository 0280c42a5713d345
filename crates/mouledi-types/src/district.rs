//! Canonical neighborhood names used to scope searches.

use serde::{Deserialize, Serialize};

use crate::ParseLabelError;

/// A canonical district of Lomé.
///
/// Canonical names carry their diacritics (`"bè"`, `"agoè"`); the alias table
/// in `mouledi-nlu` maps folded spellings back onto these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum District {
    #[serde(rename = "bè")]
    Be,
    #[serde(rename = "tokoin")]
    Tokoin,
    #[serde(rename = "agoè")]
    Agoe,
    #[serde(rename = "adidogomé")]
    Adidogome,
    #[serde(rename = "nyekonakpoè")]
    Nyekonakpoe,
    #[serde(rename = "hanoukopé")]
    Hanoukope,
    #[serde(rename = "akodesséwa")]
    Akodessewa,
    #[serde(rename = "kodjoviakopé")]
    Kodjoviakope,
    #[serde(rename = "dékon")]
    Dekon,
}

impl District {
    /// Every canonical district, in display order.
    pub const ALL: [District; 9] = [
        Self::Be,
        Self::Tokoin,
        Self::Agoe,
        Self::Adidogome,
        Self::Nyekonakpoe,
        Self::Hanoukope,
        Self::Akodessewa,
        Self::Kodjoviakope,
        Self::Dekon,
    ];

    /// Returns the canonical (accented) name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Be => "bè",
            Self::Tokoin => "tokoin",
            Self::Agoe => "agoè",
            Self::Adidogome => "adidogomé",
            Self::Nyekonakpoe => "nyekonakpoè",
            Self::Hanoukope => "hanoukopé",
            Self::Akodessewa => "akodesséwa",
            Self::Kodjoviakope => "kodjoviakopé",
            Self::Dekon => "dékon",
        }
    }
}

impl std::fmt::Display for District {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for District {
    type Err = ParseLabelError;

    /// Parses a canonical name. Aliases are not accepted here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseLabelError::new("district", s))
    }
}

impl PartialEq<&str> for District {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
