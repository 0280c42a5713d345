//! One extraction pass over a transcript: intent plus district.

use std::collections::BTreeMap;

use mouledi_types::RoutingResult;
use serde::Deserialize;

use crate::district::DistrictTable;
use crate::error::NluError;
use crate::intent::IntentRules;

/// Composes the intent classifier and the district matcher.
///
/// Both run on the raw text with their own normalization; neither output
/// depends on the other.
#[derive(Debug, Clone, Default)]
pub struct QueryRouter {
    districts: DistrictTable,
    intents: IntentRules,
}

impl QueryRouter {
    pub fn new(districts: DistrictTable, intents: IntentRules) -> Self {
        Self { districts, intents }
    }

    pub fn route(&self, text: &str) -> RoutingResult {
        RoutingResult {
            intent: self.intents.detect_intent(text),
            district: self.districts.match_district(text),
        }
    }

    pub fn districts(&self) -> &DistrictTable {
        &self.districts
    }

    pub fn intents(&self) -> &IntentRules {
        &self.intents
    }
}

/// Externally editable rule tables, as found in the `[nlu]` config section.
///
/// Every field is optional; an absent field keeps the built-in table.
/// `districts` is a `BTreeMap` so the substring pass iterates in a stable
/// (alphabetical) order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleTables {
    #[serde(default)]
    pub districts: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub pharmacy_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub clinic_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub on_call_keywords: Option<Vec<String>>,
}

impl RuleTables {
    /// Builds a router, falling back to built-in tables for absent fields.
    ///
    /// # Errors
    ///
    /// Returns [`NluError`] if a supplied table is invalid.
    pub fn build_router(&self) -> Result<QueryRouter, NluError> {
        let districts = match &self.districts {
            Some(aliases) => DistrictTable::from_names(aliases.clone())?,
            None => DistrictTable::default(),
        };

        let defaults = IntentRules::default();
        let pick = |custom: &Option<Vec<String>>, builtin: &[String]| {
            custom.clone().unwrap_or_else(|| builtin.to_vec())
        };
        let intents = IntentRules::new(
            pick(&self.pharmacy_keywords, defaults.pharmacy_keywords()),
            pick(&self.clinic_keywords, defaults.clinic_keywords()),
            pick(&self.on_call_keywords, defaults.on_call_keywords()),
        )?;

        Ok(QueryRouter::new(districts, intents))
    }
}
