//! Keyword-based intent classification.

use mouledi_types::Intent;

use crate::error::NluError;
use crate::normalize::normalize_loose;

const DEFAULT_PHARMACY_KEYWORDS: &[&str] = &["pharmacie", "pharmacies"];

const DEFAULT_CLINIC_KEYWORDS: &[&str] = &[
    "clinique",
    "cliniques",
    "centre de sante",
    "centre de santé",
    "hopital",
    "hôpital",
];

const DEFAULT_ON_CALL_KEYWORDS: &[&str] = &["garde", "de garde", "garda", "on call"];

/// Surface forms that signal each intent.
///
/// Keywords are matched as substrings of the loosely normalized text, so
/// accented and unaccented spellings must both be listed.
#[derive(Debug, Clone)]
pub struct IntentRules {
    pharmacy: Vec<String>,
    clinic: Vec<String>,
    on_call: Vec<String>,
}

impl IntentRules {
    /// Builds rules from custom keyword lists.
    ///
    /// # Errors
    ///
    /// Returns [`NluError::EmptyKeywords`] when a list has no non-blank entry.
    pub fn new<P, C, O>(pharmacy: P, clinic: C, on_call: O) -> Result<Self, NluError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
        O: IntoIterator,
        O::Item: AsRef<str>,
    {
        Ok(Self {
            pharmacy: keyword_set("pharmacy", pharmacy)?,
            clinic: keyword_set("clinic", clinic)?,
            on_call: keyword_set("on_call", on_call)?,
        })
    }

    pub fn pharmacy_keywords(&self) -> &[String] {
        &self.pharmacy
    }

    pub fn clinic_keywords(&self) -> &[String] {
        &self.clinic
    }

    pub fn on_call_keywords(&self) -> &[String] {
        &self.on_call
    }

    /// Classifies `text`.
    ///
    /// Pharmacy is checked first: pharmacy with an on-call keyword beats
    /// clinic even when clinic keywords are present too.
    pub fn detect_intent(&self, text: &str) -> Intent {
        let t = normalize_loose(text);
        let has = |keywords: &[String]| keywords.iter().any(|k| t.contains(k.as_str()));

        let has_pharmacy = has(&self.pharmacy);
        if has_pharmacy && has(&self.on_call) {
            return Intent::PharmacyOnCall;
        }
        if has_pharmacy {
            return Intent::Pharmacy;
        }
        if has(&self.clinic) {
            return Intent::Clinic;
        }
        Intent::Unknown
    }
}

impl Default for IntentRules {
    fn default() -> Self {
        let owned =
            |words: &[&str]| -> Vec<String> { words.iter().map(|w| w.to_string()).collect() };
        Self {
            pharmacy: owned(DEFAULT_PHARMACY_KEYWORDS),
            clinic: owned(DEFAULT_CLINIC_KEYWORDS),
            on_call: owned(DEFAULT_ON_CALL_KEYWORDS),
        }
    }
}

fn keyword_set<I>(name: &'static str, words: I) -> Result<Vec<String>, NluError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let set: Vec<String> = words
        .into_iter()
        .map(|w| normalize_loose(w.as_ref()))
        .filter(|w| !w.is_empty())
        .collect();
    if set.is_empty() {
        return Err(NluError::EmptyKeywords(name));
    }
    Ok(set)
}
