use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::modifier::{ModifierCategory, ModifierCode, ModifierDefinition, ModifierKind};
use crate::pricing::ModifierCatalog;

const TEXTILE_CATEGORIES: &[&str] = &["CLOTHING", "LAUNDRY", "IRONING", "DYEING"];
const LEATHER_CATEGORIES: &[&str] = &["LEATHER", "PADDING", "FUR"];

/// Maps a price list category onto the modifier category whose modifiers it may use.
/// Unknown categories fall back to [`ModifierCategory::General`].
pub fn modifier_category_for(category_code: &str) -> ModifierCategory {
    let category = category_code.trim().to_ascii_uppercase();
    if TEXTILE_CATEGORIES.contains(&category.as_str()) {
        ModifierCategory::Textile
    } else if LEATHER_CATEGORIES.contains(&category.as_str()) {
        ModifierCategory::Leather
    } else {
        ModifierCategory::General
    }
}

/// Immutable modifier snapshot keyed by code.
#[derive(Clone, Debug, Default)]
pub struct InMemoryModifierCatalog {
    definitions: Arc<BTreeMap<ModifierCode, ModifierDefinition>>,
}

impl InMemoryModifierCatalog {
    pub fn new(definitions: impl IntoIterator<Item = ModifierDefinition>) -> Self {
        let definitions = definitions
            .into_iter()
            .map(|definition| (definition.code.clone(), definition))
            .collect();
        Self { definitions: Arc::new(definitions) }
    }

    pub fn standard() -> Self {
        Self::new(standard_modifiers())
    }

    pub fn get(&self, code: &ModifierCode) -> Option<&ModifierDefinition> {
        self.definitions.get(code)
    }

    /// Every definition, inactive ones included, ordered by sort order then code.
    pub fn all(&self) -> Vec<ModifierDefinition> {
        let mut definitions: Vec<_> = self.definitions.values().cloned().collect();
        sort_for_display(&mut definitions);
        definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ModifierCatalog for InMemoryModifierCatalog {
    fn modifiers_by_codes(&self, codes: &[ModifierCode]) -> Vec<ModifierDefinition> {
        let mut seen = BTreeSet::new();
        let mut resolved = Vec::with_capacity(codes.len());

        for code in codes {
            if !seen.insert(code) {
                continue;
            }
            match self.definitions.get(code) {
                Some(definition) if definition.active => resolved.push(definition.clone()),
                Some(_) => debug!(
                    event_name = "pricing.modifier.inactive",
                    modifier_code = %code,
                    "skipping inactive modifier"
                ),
                None => debug!(
                    event_name = "pricing.modifier.unknown",
                    modifier_code = %code,
                    "skipping unknown modifier"
                ),
            }
        }

        resolved
    }

    fn modifiers_for_category(&self, category_code: &str) -> Vec<ModifierDefinition> {
        let mapped = modifier_category_for(category_code);
        let mut definitions: Vec<_> = self
            .definitions
            .values()
            .filter(|definition| definition.active)
            .filter(|definition| {
                definition.category == ModifierCategory::General || definition.category == mapped
            })
            .cloned()
            .collect();
        sort_for_display(&mut definitions);
        definitions
    }
}

fn sort_for_display(definitions: &mut [ModifierDefinition]) {
    definitions.sort_by(|left, right| {
        left.sort_order.cmp(&right.sort_order).then_with(|| left.code.cmp(&right.code))
    });
}

/// The modifier list the shop prices with out of the box.
pub fn standard_modifiers() -> Vec<ModifierDefinition> {
    use ModifierCategory::{General, Leather, Textile};

    let percent = |value: i64| ModifierKind::Percentage { percent: Decimal::from(value) };
    let range = |min: i64, max: i64| ModifierKind::RangePercentage {
        min_percent: Decimal::from(min),
        max_percent: Decimal::from(max),
    };
    let per_unit = |amount: i64| ModifierKind::Addition { amount: Decimal::from(amount) };

    let rows = [
        (
            "kids_items",
            "Children's items (up to size 30)",
            "-30% for children's items",
            percent(-30),
            General,
        ),
        (
            "manual_cleaning",
            "Manual cleaning",
            "+20% for manual cleaning",
            percent(20),
            General,
        ),
        (
            "very_dirty_items",
            "Heavily soiled items",
            "+20% to +100% for heavily soiled items",
            range(20, 100),
            General,
        ),
        (
            "urgent_cleaning",
            "Urgent cleaning",
            "+50% to +100% for urgent cleaning",
            range(50, 100),
            General,
        ),
        (
            "fur_collars",
            "Fur collars and cuffs",
            "+30% for items with fur collars or cuffs",
            percent(30),
            Textile,
        ),
        (
            "water_repellent",
            "Water-repellent coating",
            "+30% for a water-repellent coating",
            percent(30),
            Textile,
        ),
        (
            "silk_products",
            "Silk, satin and chiffon",
            "+50% for natural silk, satin or chiffon",
            percent(50),
            Textile,
        ),
        (
            "combined_products",
            "Combined items (leather and textile)",
            "+100% of the textile cleaning price",
            percent(100),
            Textile,
        ),
        (
            "large_toys",
            "Large soft toys",
            "+100% for manual cleaning of large soft toys",
            percent(100),
            Textile,
        ),
        (
            "sewing_buttons",
            "Sewing on buttons",
            "Fixed charge per sewn button",
            per_unit(10),
            Textile,
        ),
        (
            "black_light_colors",
            "Black and light colors",
            "+20% for black or light colored items",
            percent(20),
            Textile,
        ),
        (
            "wedding_dress",
            "Wedding dress with train",
            "+30% for a wedding dress with a train",
            percent(30),
            Textile,
        ),
        (
            "leather_ironing",
            "Leather ironing",
            "70% of the cleaning price for ironing",
            percent(70),
            Leather,
        ),
        (
            "leather_water_repellent",
            "Water-repellent coating",
            "+30% for a water-repellent coating",
            percent(30),
            Leather,
        ),
        (
            "leather_coloring_after_our_cleaning",
            "Coloring after our cleaning",
            "+50% for coloring after our cleaning",
            percent(50),
            Leather,
        ),
        (
            "leather_coloring_after_other_cleaning",
            "Coloring after cleaning elsewhere",
            "100% of the cleaning price for coloring",
            percent(100),
            Leather,
        ),
        (
            "leather_with_inserts",
            "Leather with inserts",
            "+30% for leather items with inserts",
            percent(30),
            Leather,
        ),
        (
            "pearl_coating",
            "Pearl coating",
            "+30% for a pearl coating",
            percent(30),
            Leather,
        ),
        (
            "natural_sheepskin",
            "Natural sheepskin on faux fur",
            "-20% for natural sheepskin on faux fur",
            percent(-20),
            Leather,
        ),
        (
            "leather_sewing_buttons",
            "Sewing on buttons",
            "Fixed charge per sewn button",
            per_unit(10),
            Leather,
        ),
        (
            "manual_leather_cleaning",
            "Manual leather cleaning",
            "+30% for manual cleaning of leather",
            percent(30),
            Leather,
        ),
    ];

    rows.into_iter()
        .zip(1..)
        .map(|((code, name, description, kind, category), position)| {
            ModifierDefinition::new(code, name, kind, category)
                .with_description(description)
                .with_sort_order(position * 10)
        })
        .collect()
}
