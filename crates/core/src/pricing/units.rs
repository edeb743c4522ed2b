use std::collections::BTreeSet;

use crate::domain::price_list::PriceListEntry;
use crate::pricing::UnitOfMeasureAdvisor;

pub const UNIT_PIECES: &str = "pcs";
pub const UNIT_KILOGRAMS: &str = "kg";

const WEIGHT_PRICED_CATEGORIES: &[&str] = &["LAUNDRY"];

/// Uses the entry's stored unit, otherwise a unit derived from its category.
#[derive(Clone, Debug)]
pub struct CategoryUnitAdvisor {
    weight_priced: BTreeSet<String>,
}

impl CategoryUnitAdvisor {
    pub fn new<I, S>(weight_priced: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            weight_priced: weight_priced
                .into_iter()
                .map(|category| category.as_ref().trim().to_ascii_uppercase())
                .collect(),
        }
    }
}

impl Default for CategoryUnitAdvisor {
    fn default() -> Self {
        Self::new(WEIGHT_PRICED_CATEGORIES)
    }
}

impl UnitOfMeasureAdvisor for CategoryUnitAdvisor {
    fn recommended_unit_of_measure(&self, entry: &PriceListEntry) -> String {
        if let Some(unit) = entry.unit_of_measure.as_deref().filter(|unit| !unit.trim().is_empty())
        {
            return unit.to_string();
        }

        let category = entry.category_code.as_str().trim().to_ascii_uppercase();
        if self.weight_priced.contains(&category) {
            UNIT_KILOGRAMS.to_string()
        } else {
            UNIT_PIECES.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::CategoryUnitAdvisor;
    use crate::domain::price_list::PriceListEntry;
    use crate::pricing::UnitOfMeasureAdvisor;

    #[test]
    fn stored_unit_wins_over_category_default() {
        let advisor = CategoryUnitAdvisor::default();
        let entry =
            PriceListEntry::new("CARPET", "Rug", Decimal::from(200)).with_unit_of_measure("m2");

        assert_eq!(advisor.recommended_unit_of_measure(&entry), "m2");
    }

    #[test]
    fn laundry_defaults_to_kilograms_and_others_to_pieces() {
        let advisor = CategoryUnitAdvisor::default();
        let laundry = PriceListEntry::new("LAUNDRY", "Bed linen", Decimal::from(60));
        let shirt = PriceListEntry::new("CLOTHING", "Shirt", Decimal::from(100));

        assert_eq!(advisor.recommended_unit_of_measure(&laundry), "kg");
        assert_eq!(advisor.recommended_unit_of_measure(&shirt), "pcs");
    }
}
