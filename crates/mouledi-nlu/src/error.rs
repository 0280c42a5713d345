//! Error types for rule-table construction.

use mouledi_types::ParseLabelError;

/// Errors raised while building district or keyword tables.
///
/// Matching itself never fails; only an invalid table is rejected.
#[derive(Debug, thiserror::Error)]
pub enum NluError {
    /// An alias points at a name that is not a canonical district.
    #[error("invalid district alias: {0}")]
    UnknownDistrict(#[from] ParseLabelError),

    /// A canonical district is targeted by an alias but is not registered
    /// as an alias of itself.
    #[error("district {canonical} is targeted by alias {alias:?} but is not its own alias")]
    CanonicalNotSelfAliased {
        alias: String,
        canonical: &'static str,
    },

    /// A keyword set is empty after normalization.
    #[error("keyword set {0} is empty")]
    EmptyKeywords(&'static str),
}
