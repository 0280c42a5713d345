//! Provider records and search queries exchanged with the search backend.

use serde::{Deserialize, Serialize};

use crate::{Coordinates, District};

/// Result-count limit used when none is configured.
pub const DEFAULT_RESULT_LIMIT: u32 = 50;

/// Category of health provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Pharmacy,
    Clinic,
}

impl ProviderKind {
    /// The value of the `type` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pharmacy => "pharmacy",
            Self::Clinic => "clinic",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider as listed by the search backend.
///
/// Only `name` is guaranteed; the backend omits fields it does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub is_on_call_now: bool,
    /// Distance from the query coordinates, when coordinates were sent.
    #[serde(default)]
    pub distance_km: Option<f64>,
}

/// Parameters of one provider search.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderQuery {
    pub kind: ProviderKind,
    pub district: Option<District>,
    pub on_call_now: bool,
    pub near: Option<Coordinates>,
    pub limit: u32,
}

impl ProviderQuery {
    /// A query for `kind` with no filters and the default limit.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            district: None,
            on_call_now: false,
            near: None,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn with_district(mut self, district: Option<District>) -> Self {
        self.district = district;
        self
    }

    pub fn on_call(mut self, on_call_now: bool) -> Self {
        self.on_call_now = on_call_now;
        self
    }

    pub fn near(mut self, near: Option<Coordinates>) -> Self {
        self.near = near;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tolerates_missing_fields() {
        let record: ProviderRecord =
            serde_json::from_str(r#"{"name": "Pharmacie du Golfe"}"#).unwrap();
        assert_eq!(record.name, "Pharmacie du Golfe");
        assert_eq!(record.phone, None);
        assert!(!record.is_on_call_now);
    }

    #[test]
    fn record_reads_backend_field_names() {
        let record: ProviderRecord = serde_json::from_str(
            r#"{
                "provider_id": "p-17",
                "type": "pharmacy",
                "name": "Pharmacie Bè Château",
                "phone": "+228 22 21 00 00",
                "district": "bè",
                "city": "Lomé",
                "is_on_call_now": true,
                "distance_km": 1.4
            }"#,
        )
        .unwrap();
        assert_eq!(record.kind.as_deref(), Some("pharmacy"));
        assert!(record.is_on_call_now);
        assert_eq!(record.distance_km, Some(1.4));
    }

    #[test]
    fn query_builder_defaults() {
        let q = ProviderQuery::new(ProviderKind::Clinic);
        assert_eq!(q.limit, DEFAULT_RESULT_LIMIT);
        assert!(!q.on_call_now);
        assert!(q.district.is_none());

        let q = q.with_district(Some(District::Tokoin)).on_call(true).limit(10);
        assert_eq!(q.district, Some(District::Tokoin));
        assert!(q.on_call_now);
        assert_eq!(q.limit, 10);
    }
}
