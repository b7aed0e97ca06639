//! Output entries

use serde::Serialize;

/// Identifier written for items no reference record was found for
pub const NOT_FOUND_ID: &str = "Not Found";

/// Identifier written for records synthesized from the authority
pub const AUTHORITY_VERIFIED_ID: &str = "Scryfall Verified";

/// Column order of every output file
pub const OUTPUT_HEADERS: [&str; 9] = [
    "TCGplayer Id",
    "Product Line",
    "Set Name",
    "Product Name",
    "Number",
    "Rarity",
    "Condition",
    "Add to Quantity",
    "TCG Marketplace Price",
];

/// Which output file an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryStream {
    /// Matched to a reference dataset row
    Main,
    /// Matched to an authority-synthesized record
    Authority,
    /// No match
    GivenUp,
}

/// One output row
///
/// Field order matches [`OUTPUT_HEADERS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputEntry {
    #[serde(rename = "TCGplayer Id")]
    pub identifier: String,
    #[serde(rename = "Product Line")]
    pub product_line: String,
    #[serde(rename = "Set Name")]
    pub set_name: String,
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Number")]
    pub number: String,
    #[serde(rename = "Rarity")]
    pub rarity: String,
    #[serde(rename = "Condition")]
    pub condition: String,
    #[serde(rename = "Add to Quantity")]
    pub quantity: u32,
    #[serde(rename = "TCG Marketplace Price")]
    pub price: String,
}
