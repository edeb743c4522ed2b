use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::price_list::{CategoryCode, PriceListEntry};
use crate::pricing::PriceCatalog;

type EntryKey = (CategoryCode, String);

/// Immutable price list snapshot. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPriceCatalog {
    entries: Arc<BTreeMap<EntryKey, PriceListEntry>>,
}

impl InMemoryPriceCatalog {
    /// Later entries replace earlier ones with the same category and item.
    pub fn new(entries: impl IntoIterator<Item = PriceListEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| ((entry.category_code.clone(), entry.item_name.clone()), entry))
            .collect();
        Self { entries: Arc::new(entries) }
    }

    pub fn entries(&self) -> impl Iterator<Item = &PriceListEntry> + '_ {
        self.entries.values()
    }

    pub fn entries_in_category<'a>(
        &'a self,
        category_code: &'a str,
    ) -> impl Iterator<Item = &'a PriceListEntry> + 'a {
        self.entries.values().filter(move |entry| entry.category_code.as_str() == category_code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PriceCatalog for InMemoryPriceCatalog {
    fn entry(&self, category_code: &str, item_name: &str) -> Option<PriceListEntry> {
        self.entries.get(&(CategoryCode::from(category_code), item_name.to_owned())).cloned()
    }
}
