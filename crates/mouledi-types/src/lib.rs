//! Shared types for the mouledi voice assistant.
//!
//! This crate holds the closed-set vocabulary that every other crate in the
//! workspace speaks: request intents, canonical districts, routing results,
//! provider records returned by the search backend, and the symbolic keys of
//! the spoken feedback prompts.
//!
//! It has no async or I/O dependencies so that the language layer
//! (`mouledi-nlu`) and the voice pipeline (`mouledi-voice`) can both depend on
//! it without pulling in each other.

use serde::{Deserialize, Serialize};

mod district;
mod prompt;
mod provider;

pub use district::District;
pub use prompt::PromptKey;
pub use provider::{ProviderKind, ProviderQuery, ProviderRecord, DEFAULT_RESULT_LIMIT};

/// Error returned when parsing a label that does not belong to a closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseLabelError {
    /// Which closed set was being parsed (e.g. "intent", "district").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseLabelError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// What kind of facility the user is asking about.
///
/// Exactly one intent is derived from each transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// A pharmacy that is on duty right now.
    PharmacyOnCall,
    /// Any pharmacy.
    Pharmacy,
    /// A clinic, health center or hospital.
    Clinic,
    /// Nothing recognisable. A valid routing outcome, not an error.
    Unknown,
}

impl Intent {
    /// Returns the canonical label for this intent.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PharmacyOnCall => "PHARMACY_ON_CALL",
            Self::Pharmacy => "PHARMACY",
            Self::Clinic => "CLINIC",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether a results view can be opened for this intent.
    pub fn is_dispatchable(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// The provider category searched for this intent, if any.
    pub fn provider_kind(self) -> Option<ProviderKind> {
        match self {
            Self::PharmacyOnCall | Self::Pharmacy => Some(ProviderKind::Pharmacy),
            Self::Clinic => Some(ProviderKind::Clinic),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PHARMACY_ON_CALL" => Ok(Self::PharmacyOnCall),
            "PHARMACY" => Ok(Self::Pharmacy),
            "CLINIC" => Ok(Self::Clinic),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(ParseLabelError::new("intent", s)),
        }
    }
}

/// The outcome of one extraction pass over a transcript.
///
/// A pure function of its input: the intent and the district are derived
/// independently and never influence each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub intent: Intent,
    pub district: Option<District>,
}

/// Device coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// The two remote backends probed during warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Provider search, feedback-audio resolution.
    Search,
    /// Speech-to-text.
    Transcription,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Transcription => "transcription",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
