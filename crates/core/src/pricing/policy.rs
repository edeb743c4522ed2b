use std::collections::BTreeSet;

use crate::config::{PricingConfig, DEFAULT_NON_EXPEDITABLE_CATEGORIES};
use crate::pricing::CategoryPolicy;

/// Expedite is allowed for every category except the ones on the deny-list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenyListCategoryPolicy {
    non_expeditable: BTreeSet<String>,
}

impl DenyListCategoryPolicy {
    pub fn new<I, S>(non_expeditable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let non_expeditable = non_expeditable
            .into_iter()
            .map(|category| normalize(category.as_ref()))
            .filter(|category| !category.is_empty())
            .collect();
        Self { non_expeditable }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(&config.non_expeditable_categories)
    }
}

impl Default for DenyListCategoryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_NON_EXPEDITABLE_CATEGORIES)
    }
}

impl CategoryPolicy for DenyListCategoryPolicy {
    fn can_expedite(&self, category_code: &str) -> bool {
        !self.non_expeditable.contains(&normalize(category_code))
    }
}

fn normalize(category_code: &str) -> String {
    category_code.trim().to_ascii_uppercase()
}
