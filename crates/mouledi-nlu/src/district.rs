//! District extraction from free text via an alias table.

use std::collections::HashMap;

use mouledi_types::District;

use crate::error::NluError;
use crate::normalize::normalize;

/// Built-in aliases, in lookup order for the substring pass.
const DEFAULT_ALIASES: &[(&str, District)] = &[
    ("be", District::Be),
    ("bè", District::Be),
    ("tokoin", District::Tokoin),
    ("agoe", District::Agoe),
    ("agoè", District::Agoe),
    ("adidogome", District::Adidogome),
    ("adidogomé", District::Adidogome),
    ("nyekonakpoe", District::Nyekonakpoe),
    ("nyekonakpoè", District::Nyekonakpoe),
    ("hanoukope", District::Hanoukope),
    ("hanoukopé", District::Hanoukope),
    ("akodessewa", District::Akodessewa),
    ("akodesséwa", District::Akodessewa),
    ("kodjoviakope", District::Kodjoviakope),
    ("kodjoviakopé", District::Kodjoviakope),
    ("dekon", District::Dekon),
    ("dékon", District::Dekon),
];

/// Alias → canonical district mapping.
///
/// Entries keep their insertion order, which fixes the iteration order of
/// the substring fallback. Every canonical district targeted by an alias is
/// also registered as an alias of itself.
#[derive(Debug, Clone)]
pub struct DistrictTable {
    entries: Vec<(String, District)>,
    index: HashMap<String, District>,
}

impl DistrictTable {
    /// Builds a table from `(alias, canonical)` pairs.
    ///
    /// Later duplicates of an alias are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`NluError::CanonicalNotSelfAliased`] when a canonical district
    /// is targeted but missing as its own key.
    pub fn new<I, S>(aliases: I) -> Result<Self, NluError>
    where
        I: IntoIterator<Item = (S, District)>,
        S: Into<String>,
    {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        for (alias, district) in aliases {
            let alias = alias.into();
            if index.contains_key(&alias) {
                continue;
            }
            index.insert(alias.clone(), district);
            entries.push((alias, district));
        }

        for (alias, district) in &entries {
            if index.get(district.as_str()) != Some(district) {
                return Err(NluError::CanonicalNotSelfAliased {
                    alias: alias.clone(),
                    canonical: district.as_str(),
                });
            }
        }

        Ok(Self { entries, index })
    }

    /// Builds a table from externally edited `(alias, canonical name)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`NluError::UnknownDistrict`] when a canonical name is not one
    /// of the known districts, plus the errors of [`DistrictTable::new`].
    pub fn from_names<I, A, C>(aliases: I) -> Result<Self, NluError>
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: AsRef<str>,
    {
        let parsed = aliases
            .into_iter()
            .map(|(alias, canonical)| Ok((alias.into(), canonical.as_ref().parse::<District>()?)))
            .collect::<Result<Vec<(String, District)>, NluError>>()?;
        Self::new(parsed)
    }

    /// Number of registered aliases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(alias, district)` in table order.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, District)> + '_ {
        self.entries.iter().map(|(a, d)| (a.as_str(), *d))
    }

    /// Finds the district named in `text`, if any.
    ///
    /// A whole-token hit wins over a substring hit; the substring pass
    /// recovers names the transcriber glued to a neighbouring word.
    pub fn match_district(&self, text: &str) -> Option<District> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return None;
        }

        if let Some(district) = normalized
            .split(' ')
            .find_map(|token| self.index.get(token).copied())
        {
            return Some(district);
        }

        self.entries
            .iter()
            .find(|(alias, _)| normalized.contains(alias.as_str()))
            .map(|(_, district)| *district)
    }
}

impl Default for DistrictTable {
    fn default() -> Self {
        let entries: Vec<(String, District)> = DEFAULT_ALIASES
            .iter()
            .map(|(alias, district)| (alias.to_string(), *district))
            .collect();
        let index = entries.iter().cloned().collect();
        Self { entries, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_self_consistent() {
        let rebuilt = DistrictTable::new(DEFAULT_ALIASES.iter().copied());
        assert!(rebuilt.is_ok(), "{:?}", rebuilt.err());
    }

    #[test]
    fn every_canonical_district_is_reachable() {
        let table = DistrictTable::default();
        for district in District::ALL {
            assert_eq!(table.match_district(district.as_str()), Some(district));
        }
    }

    #[test]
    fn token_match_in_sentence() {
        let table = DistrictTable::default();
        assert_eq!(
            table.match_district("pharmacie de garde à Hanoukopé s'il vous plaît"),
            Some(District::Hanoukope)
        );
    }

    #[test]
    fn token_pass_wins_over_earlier_substring() {
        // "be" would hit as a substring of "bebe" first, but "tokoin" is a
        // whole token.
        let table = DistrictTable::default();
        assert_eq!(
            table.match_district("bebe tokoin"),
            Some(District::Tokoin)
        );
    }

    #[test]
    fn substring_pass_recovers_glued_words() {
        let table = DistrictTable::default();
        assert_eq!(
            table.match_district("pharmaciedekon"),
            Some(District::Dekon)
        );
    }

    #[test]
    fn no_match() {
        let table = DistrictTable::default();
        assert_eq!(table.match_district(""), None);
        assert_eq!(table.match_district("xyz-nonexistent"), None);
        assert_eq!(table.match_district("pharmacie"), None);
    }

    #[test]
    fn rejects_alias_to_unregistered_canonical() {
        let err = DistrictTable::new([("be", District::Be)]).unwrap_err();
        assert!(matches!(
            err,
            NluError::CanonicalNotSelfAliased { canonical: "bè", .. }
        ));
    }

    #[test]
    fn from_names_rejects_unknown_canonical() {
        let err = DistrictTable::from_names([("kpalime", "kpalimé")]).unwrap_err();
        assert!(matches!(err, NluError::UnknownDistrict(_)));
    }

    #[test]
    fn from_names_builds_custom_table() {
        let table =
            DistrictTable::from_names([("tokoin", "tokoin"), ("tokoen", "tokoin")]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.match_district("à Tokoen"), Some(District::Tokoin));
        assert_eq!(table.match_district("à bè"), None);
    }
}
