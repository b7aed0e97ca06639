//! Collection export rows

use serde::Deserialize;

/// One row of the collection export
///
/// Columns the export does not carry default to empty text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceRow {
    /// Card name, possibly with annotations and a back face
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Short set code
    #[serde(rename = "Set code", default)]
    pub set_code: String,
    /// Set name
    #[serde(rename = "Set name", default)]
    pub set_name: String,
    /// Collector number, free text
    #[serde(rename = "Collector number", default)]
    pub collector_number: String,
    /// "foil" or "normal"
    #[serde(rename = "Foil", default)]
    pub foil: String,
    /// Rarity
    #[serde(rename = "Rarity", default)]
    pub rarity: String,
    /// Quantity as written; see [`SourceRow::quantity`]
    #[serde(rename = "Quantity", default)]
    pub quantity: String,
    /// Collection manager's own identifier
    #[serde(rename = "ManaBox ID", default)]
    pub manabox_id: String,
    /// Authority identifier when known
    #[serde(rename = "Scryfall ID", default)]
    pub scryfall_id: String,
    /// Purchase price as written
    #[serde(rename = "Purchase price", default)]
    pub purchase_price: String,
    /// Condition code, e.g. `near_mint`
    #[serde(rename = "Condition", default)]
    pub condition: String,
}

impl SourceRow {
    /// Parsed quantity; blank means one
    pub fn quantity(&self) -> Option<u32> {
        let text = self.quantity.trim();
        if text.is_empty() {
            return Some(1);
        }
        text.parse().ok()
    }

    /// Authority identifier, if the row carries a non-blank one
    pub fn authority_id(&self) -> Option<&str> {
        let id = self.scryfall_id.trim();
        (!id.is_empty()).then_some(id)
    }

    /// True when the row is marked foil
    pub fn is_foil(&self) -> bool {
        self.foil.trim().eq_ignore_ascii_case("foil")
    }

    /// Display condition, e.g. `Lightly Played Foil`
    ///
    /// Condition codes use underscores (`lightly_played`); unknown or blank
    /// codes read as Near Mint.
    pub fn display_condition(&self) -> String {
        let code = self.condition.trim().to_lowercase().replace('_', " ");
        let mut condition = match code.as_str() {
            "lightly played" => "Lightly Played",
            "moderately played" => "Moderately Played",
            "heavily played" => "Heavily Played",
            "damaged" => "Damaged",
            _ => "Near Mint",
        }
        .to_string();
        if self.is_foil() {
            condition.push_str(" Foil");
        }
        condition
    }

    /// Collector number used for matching regular cards
    ///
    /// Keeps the last `-` segment and drops its leading letters, so `C21-263`
    /// and `PLST-263` both read as `263`.
    pub fn matching_number(&self) -> &str {
        self.collector_number
            .trim()
            .rsplit('-')
            .next()
            .unwrap_or("")
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_defaults_to_one_when_blank() {
        let row = SourceRow::default();
        assert_eq!(row.quantity(), Some(1));
    }

    #[test]
    fn test_quantity_rejects_garbage() {
        let row = SourceRow {
            quantity: "two".to_string(),
            ..Default::default()
        };
        assert_eq!(row.quantity(), None);
    }

    #[test]
    fn test_display_condition_maps_codes_and_foil() {
        let row = SourceRow {
            condition: "lightly_played".to_string(),
            foil: "foil".to_string(),
            ..Default::default()
        };
        assert_eq!(row.display_condition(), "Lightly Played Foil");

        let unknown = SourceRow {
            condition: "mint".to_string(),
            foil: "normal".to_string(),
            ..Default::default()
        };
        assert_eq!(unknown.display_condition(), "Near Mint");
    }

    #[test]
    fn test_matching_number_keeps_trailing_segment() {
        let row = SourceRow {
            collector_number: " C21-263 ".to_string(),
            ..Default::default()
        };
        assert_eq!(row.matching_number(), "263");

        let plain = SourceRow {
            collector_number: "12a".to_string(),
            ..Default::default()
        };
        assert_eq!(plain.matching_number(), "12a");
    }

    #[test]
    fn test_authority_id_blank_is_none() {
        let row = SourceRow {
            scryfall_id: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(row.authority_id(), None);
    }
}
