//! Symbolic keys of the pre-recorded feedback prompts.

use serde::{Deserialize, Serialize};

/// A short spoken phrase narrating the pipeline state.
///
/// The key is resolved to a playable URL per language by the feedback-audio
/// service; the clips themselves are not shipped with the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKey {
    /// Greeting played when the home screen opens.
    Welcome,
    /// "Please repeat": played on every failure and on noise.
    RepeatPlease,
    /// "Choose pharmacies or try again": played when no intent was found.
    FallbackPharmaciesOrRetry,
    /// "Tap an item to hear it": played once results are listed.
    TapItemToListen,
}

impl PromptKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::RepeatPlease => "repeat_please",
            Self::FallbackPharmaciesOrRetry => "fallback_pharmacies_or_retry",
            Self::TapItemToListen => "tap_item_to_listen",
        }
    }
}

impl std::fmt::Display for PromptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_backend_names() {
        assert_eq!(PromptKey::RepeatPlease.as_str(), "repeat_please");
        assert_eq!(
            PromptKey::FallbackPharmaciesOrRetry.to_string(),
            "fallback_pharmacies_or_retry"
        );
    }
}
