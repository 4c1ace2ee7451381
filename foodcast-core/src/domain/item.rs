//! The ten tracked commodities and their naming rules.
//!
//! Every item has three names:
//! - a canonical token (`CASSAVA_MEAL`), used to name persisted model artifacts
//! - a dataset column (`c_cassava_meal`), used when reading the price table
//! - a display label (`Cassava Meal (100 KG)`), shown to users
//!
//! The token mapping is exhaustive over [`Item`], so training and inference can
//! never disagree on an artifact name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown item '{0}'")]
pub struct UnknownItem(pub String);

/// A tracked food commodity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Item {
    Bread,
    CassavaMeal,
    Cowpeas,
    Gari,
    Groundnuts,
    Millet,
    Sorghum,
    Yam,
    Rice,
    Maize,
}

impl Item {
    /// All items, in dataset column order.
    pub const ALL: [Item; 10] = [
        Item::Bread,
        Item::CassavaMeal,
        Item::Cowpeas,
        Item::Gari,
        Item::Groundnuts,
        Item::Millet,
        Item::Sorghum,
        Item::Yam,
        Item::Rice,
        Item::Maize,
    ];

    /// Position of this item in [`Item::ALL`].
    pub fn index(self) -> usize {
        match self {
            Item::Bread => 0,
            Item::CassavaMeal => 1,
            Item::Cowpeas => 2,
            Item::Gari => 3,
            Item::Groundnuts => 4,
            Item::Millet => 5,
            Item::Sorghum => 6,
            Item::Yam => 7,
            Item::Rice => 8,
            Item::Maize => 9,
        }
    }

    /// Plain human name, without unit.
    pub fn name(self) -> &'static str {
        match self {
            Item::Bread => "Bread",
            Item::CassavaMeal => "Cassava Meal",
            Item::Cowpeas => "Cowpeas",
            Item::Gari => "Gari",
            Item::Groundnuts => "Groundnuts",
            Item::Millet => "Millet",
            Item::Sorghum => "Sorghum",
            Item::Yam => "Yam",
            Item::Rice => "Rice",
            Item::Maize => "Maize",
        }
    }

    /// Canonical artifact token. Multi-word items are joined with `_`.
    pub fn canonical_token(self) -> &'static str {
        match self {
            Item::Bread => "BREAD",
            Item::CassavaMeal => "CASSAVA_MEAL",
            Item::Cowpeas => "COWPEAS",
            Item::Gari => "GARI",
            Item::Groundnuts => "GROUNDNUTS",
            Item::Millet => "MILLET",
            Item::Sorghum => "SORGHUM",
            Item::Yam => "YAM",
            Item::Rice => "RICE",
            Item::Maize => "MAIZE",
        }
    }

    /// Price column for this item in the source dataset.
    pub fn column_name(self) -> &'static str {
        match self {
            Item::Bread => "c_bread",
            Item::CassavaMeal => "c_cassava_meal",
            Item::Cowpeas => "c_cowpeas",
            Item::Gari => "c_gari",
            Item::Groundnuts => "c_groundnuts",
            Item::Millet => "c_millet",
            Item::Sorghum => "c_sorghum",
            Item::Yam => "c_yam",
            Item::Rice => "c_rice",
            Item::Maize => "c_maize",
        }
    }

    /// Label shown in item pickers, including the unit the price refers to.
    pub fn display_label(self) -> &'static str {
        match self {
            Item::Bread => "Bread (small size)",
            Item::CassavaMeal => "Cassava Meal (100 KG)",
            Item::Cowpeas => "Cowpeas (100 KG)",
            Item::Gari => "Garri (100 KG)",
            Item::Groundnuts => "Groundnuts (100 KG)",
            Item::Millet => "Millet (100 KG)",
            Item::Sorghum => "Sorghum (100 KG)",
            Item::Yam => "Yam (1 KG)",
            Item::Rice => "Rice (50 KG)",
            Item::Maize => "Maize (100 KG)",
        }
    }

    /// Resolve a canonical token back to its item.
    pub fn from_token(token: &str) -> Option<Item> {
        Item::ALL.into_iter().find(|i| i.canonical_token() == token)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Item {
    type Err = UnknownItem;

    /// Accepts tokens, column names, display labels and plain names in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(item) = Item::ALL
            .into_iter()
            .find(|i| i.display_label().eq_ignore_ascii_case(trimmed))
        {
            return Ok(item);
        }

        let token = canonical_token(trimmed);
        let token = token.strip_prefix("C_").unwrap_or(&token);
        // "Garri" is the spelling used on display labels.
        let token = if token == "GARRI" { "GARI" } else { token };

        Item::from_token(token).ok_or_else(|| UnknownItem(s.to_string()))
    }
}

/// Normalize a free-form item name into artifact-token form.
///
/// Trims, collapses whitespace runs into a single `_`, and uppercases.
/// Applying it twice yields the same result as applying it once.
pub fn canonical_token(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}
