//! Normalized identity key

use serde::Serialize;
use std::fmt;

/// Canonical identity of a card, produced by the key normalizer
///
/// Used both as the comparison basis for scoring and as the memo key for
/// confirmed matches. Two source rows with equal keys resolve identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NormalizedKey {
    /// Lowercase front-face name, annotations removed
    pub name: String,
    /// Lowercase set name after alias substitution
    pub set_name: String,
    /// Digits and dashes only; `None` when nothing survives filtering
    pub collector_number: Option<String>,
    /// Lowercase condition text
    pub condition: String,
    /// Removed annotations: parentheticals and back-face text
    pub name_suffix: String,
}

impl NormalizedKey {
    /// Collector number or empty string
    pub fn number_or_empty(&self) -> &str {
        self.collector_number.as_deref().unwrap_or("")
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.name_suffix.is_empty() {
            write!(f, " {}", self.name_suffix)?;
        }
        write!(f, " [{}", self.set_name)?;
        if let Some(number) = &self.collector_number {
            write!(f, " #{}", number)?;
        }
        write!(f, "] {}", self.condition)
    }
}
