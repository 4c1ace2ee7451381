use super::item::Item;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one trainable price series and of its persisted model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub region: String,
    pub item: Item,
}

impl SeriesKey {
    pub fn new(region: impl Into<String>, item: Item) -> Self {
        Self {
            region: region.into(),
            item,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.item.canonical_token())
    }
}

/// One observed price for a (region, item) pair.
///
/// `regressor_value` is always present: missing values are imputed when the
/// table is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub region: String,
    pub item: Item,
    pub price: f64,
    pub regressor_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn display_uses_canonical_token() {
        let key = SeriesKey::new("Lagos", Item::CassavaMeal);
        assert_eq!(key.to_string(), "Lagos/CASSAVA_MEAL");
    }

    #[test]
    fn keys_hash_by_region_and_item() {
        let mut set = HashSet::new();
        set.insert(SeriesKey::new("Lagos", Item::Rice));
        set.insert(SeriesKey::new("Lagos", Item::Rice));
        set.insert(SeriesKey::new("Kano", Item::Rice));
        set.insert(SeriesKey::new("Lagos", Item::Maize));
        assert_eq!(set.len(), 3);
    }
}
