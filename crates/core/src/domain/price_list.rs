use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const COLOR_BLACK: &str = "black";
pub const COLOR_WHITE: &str = "white";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryCode(pub String);

impl CategoryCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryCode {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sellable catalog item. Reference data; the pricing engine only reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListEntry {
    pub category_code: CategoryCode,
    pub item_name: String,
    pub unit_of_measure: Option<String>,
    pub base_price: Decimal,
    pub price_black: Option<Decimal>,
}

impl PriceListEntry {
    pub fn new(
        category_code: impl Into<String>,
        item_name: impl Into<String>,
        base_price: Decimal,
    ) -> Self {
        Self {
            category_code: CategoryCode(category_code.into()),
            item_name: item_name.into(),
            unit_of_measure: None,
            base_price,
            price_black: None,
        }
    }

    pub fn with_unit_of_measure(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measure = Some(unit.into());
        self
    }

    pub fn with_price_black(mut self, price_black: Decimal) -> Self {
        self.price_black = Some(price_black);
        self
    }

    /// Unit price for the requested color: the black variant when the color is black
    /// and the entry carries one, the base price otherwise.
    pub fn price_for_color(&self, color: Option<&str>) -> Decimal {
        match (color, self.price_black) {
            (Some(color), Some(price_black)) if is_color(color, COLOR_BLACK) => price_black,
            _ => self.base_price,
        }
    }
}

pub fn is_color(candidate: &str, color: &str) -> bool {
    candidate.trim().eq_ignore_ascii_case(color)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::PriceListEntry;

    #[test]
    fn black_variant_is_selected_case_insensitively() {
        let entry = PriceListEntry::new("CLOTHING", "Shirt", Decimal::new(10_000, 2))
            .with_price_black(Decimal::new(12_000, 2));

        assert_eq!(entry.price_for_color(Some("BLACK")), Decimal::new(12_000, 2));
        assert_eq!(entry.price_for_color(Some("Black")), Decimal::new(12_000, 2));
        assert_eq!(entry.price_for_color(Some("white")), Decimal::new(10_000, 2));
        assert_eq!(entry.price_for_color(None), Decimal::new(10_000, 2));
    }

    #[test]
    fn black_color_without_variant_uses_base_price() {
        let entry = PriceListEntry::new("CLOTHING", "Shirt", Decimal::new(10_000, 2));

        assert_eq!(entry.price_for_color(Some("black")), Decimal::new(10_000, 2));
    }
}
