//! Language understanding for spoken health-provider requests.
//!
//! Turns a free-text transcript such as `"pharmacie de garde à Bè"` into a
//! [`RoutingResult`]: one [`Intent`] from keyword presence and at most one
//! canonical [`District`] from an alias table. Everything here is pure and
//! synchronous; the rule tables are data and can be replaced from
//! configuration without touching the matching code.
//!
//! # Usage
//!
//! ```rust
//! use mouledi_nlu::route;
//! use mouledi_types::{District, Intent};
//!
//! let result = route("pharmacie de garde a be");
//! assert_eq!(result.intent, Intent::PharmacyOnCall);
//! assert_eq!(result.district, Some(District::Be));
//! ```

pub mod command;
mod district;
mod error;
mod intent;
mod normalize;
mod router;

use std::sync::LazyLock;

use mouledi_types::{District, Intent, RoutingResult};

pub use command::{parse_command, ResultsCommand};
pub use district::DistrictTable;
pub use error::NluError;
pub use intent::IntentRules;
pub use normalize::{normalize, normalize_loose};
pub use router::{QueryRouter, RuleTables};

static DEFAULT_ROUTER: LazyLock<QueryRouter> = LazyLock::new(QueryRouter::default);

/// Matches a district with the built-in alias table.
pub fn match_district(text: &str) -> Option<District> {
    DEFAULT_ROUTER.districts().match_district(text)
}

/// Classifies a transcript with the built-in keyword rules.
pub fn detect_intent(text: &str) -> Intent {
    DEFAULT_ROUTER.intents().detect_intent(text)
}

/// Routes a transcript with the built-in tables.
pub fn route(text: &str) -> RoutingResult {
    DEFAULT_ROUTER.route(text)
}
