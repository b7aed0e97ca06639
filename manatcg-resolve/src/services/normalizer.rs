//! Key Normalizer
//!
//! Turns raw (name, set, condition, number) text into a [`NormalizedKey`].
//!
//! **Rules:**
//! - Parenthetical annotations are removed from the name and kept in the suffix
//! - Diacritics are stripped (NFKD, combining marks dropped)
//! - Two-faced names keep only the front face; the back face joins the suffix
//! - Names keep `[a-z0-9 ,'-]`, set names keep `[a-z0-9 ]`
//! - Set aliases apply to the raw set name before any cleanup
//! - Universal reprint set names collapse to one canonical name, and their
//!   collector numbers keep only the trailing `-` segment
//! - Set names naming prerelease card pools reject the key
//! - Numbers keep digits and dashes; nothing left means unknown
//!
//! Normalization is pure and idempotent on the name, set and number fields.

use crate::models::{NormalizedKey, ReferenceRecord};
use manatcg_common::config::AliasConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical normalized name of the universal reprint set
pub const UNIVERSAL_REPRINT_SET: &str = "the list reprints";

/// Separator between the faces of a two-faced card name
pub const FACE_SEPARATOR: &str = "//";

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((.*?)\)").expect("parenthetical pattern is valid"));

static NAME_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9 ,'\-]").expect("name pattern is valid"));

static SET_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9 ]").expect("set pattern is valid"));

/// Remove diacritics: NFKD decomposition with combining marks dropped
pub fn remove_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Restrict set-name text to the set alphabet, trimmed and lowercased
pub fn clean_set_name(text: &str) -> String {
    SET_DISALLOWED
        .replace_all(&remove_accents(text), "")
        .trim()
        .to_lowercase()
}

fn clean_name(text: &str) -> String {
    NAME_DISALLOWED
        .replace_all(text, "")
        .trim()
        .to_lowercase()
}

fn clean_number(text: &str) -> Option<String> {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    (!digits.is_empty()).then_some(digits)
}

/// Key normalizer configured with the set alias tables
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    /// Raw set name → canonical set name
    set_aliases: BTreeMap<String, String>,
    /// Normalized names denoting the universal reprint set
    universal_reprint_sets: Vec<String>,
}

impl KeyNormalizer {
    pub fn new(aliases: &AliasConfig) -> Self {
        Self {
            set_aliases: aliases.sets.clone(),
            universal_reprint_sets: aliases.universal_reprint_sets.clone(),
        }
    }

    /// Normalize raw item text
    ///
    /// Returns `None` when the set denotes prerelease cards; such items are
    /// never matched.
    pub fn normalize(
        &self,
        name: &str,
        set_name: &str,
        condition: &str,
        number: &str,
    ) -> Option<NormalizedKey> {
        let (name, name_suffix) = split_name(name);

        let aliased = self
            .set_aliases
            .get(set_name)
            .map(String::as_str)
            .unwrap_or(set_name);
        let mut set_name = clean_set_name(aliased);

        let mut number = number;
        if self.universal_reprint_sets.iter().any(|s| *s == set_name) {
            set_name = UNIVERSAL_REPRINT_SET.to_string();
            number = number.rsplit('-').next().unwrap_or("");
        }

        if set_name.contains("prerelease cards") {
            return None;
        }

        Some(NormalizedKey {
            name,
            set_name,
            collector_number: clean_number(number),
            condition: condition.trim().to_lowercase(),
            name_suffix,
        })
    }

    /// Normalize a reference row by its product name, set, condition and number
    pub fn normalize_record(&self, record: &ReferenceRecord) -> Option<NormalizedKey> {
        self.normalize(
            &record.product_name,
            &record.set_name,
            &record.condition,
            &record.number,
        )
    }
}

/// Split a raw name into the matching name and the removed annotations
fn split_name(raw: &str) -> (String, String) {
    let mut annotations: Vec<String> = PARENTHETICAL
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| {
            let inner = clean_name(&remove_accents(m.as_str()));
            format!("({})", inner)
        })
        .collect();

    let stripped = PARENTHETICAL.replace_all(raw, "");
    let unaccented = remove_accents(stripped.trim());

    let (front, back) = match unaccented.split_once(FACE_SEPARATOR) {
        Some((front, back)) => (front, Some(back)),
        None => (unaccented.as_str(), None),
    };

    if let Some(back) = back {
        let back = clean_name(back);
        if !back.is_empty() {
            annotations.insert(0, format!("{} {}", FACE_SEPARATOR, back));
        }
    }

    (clean_name(front), annotations.join(" "))
}
