use rust_decimal::Decimal;

use launderly_core::domain::price_list::PriceListEntry;
use launderly_core::pricing::standard_modifiers;

use crate::connection::DbPool;
use crate::repositories::{
    ModifierRepository, PriceListRepository, RepositoryError, SqlModifierRepository,
    SqlPriceListRepository,
};

/// Reference price list shipped with a fresh install. Prices in cents.
const SEED_PRICE_LIST: &[SeedPriceItem] = &[
    SeedPriceItem::new("CLOTHING", "Coat", 42000, Some(46000), None),
    SeedPriceItem::new("CLOTHING", "Jacket", 30000, Some(33000), None),
    SeedPriceItem::new("CLOTHING", "Suit (2 pieces)", 38000, Some(42000), None),
    SeedPriceItem::new("CLOTHING", "Dress", 26000, Some(29000), None),
    SeedPriceItem::new("CLOTHING", "Trousers", 16000, Some(18000), None),
    SeedPriceItem::new("LAUNDRY", "Bed linen", 6500, None, Some("kg")),
    SeedPriceItem::new("LAUNDRY", "Mixed laundry", 5500, None, Some("kg")),
    SeedPriceItem::new("IRONING", "Shirt", 7000, None, None),
    SeedPriceItem::new("LEATHER", "Leather jacket", 95000, Some(105000), None),
    SeedPriceItem::new("LEATHER", "Leather gloves", 28000, None, None),
    SeedPriceItem::new("PADDING", "Down jacket", 52000, None, None),
    SeedPriceItem::new("FUR", "Fur coat", 160000, None, None),
    SeedPriceItem::new("DYEING", "Coat dyeing", 75000, None, None),
];

#[derive(Debug, Clone, Copy)]
struct SeedPriceItem {
    category_code: &'static str,
    item_name: &'static str,
    base_cents: i64,
    black_cents: Option<i64>,
    unit_of_measure: Option<&'static str>,
}

impl SeedPriceItem {
    const fn new(
        category_code: &'static str,
        item_name: &'static str,
        base_cents: i64,
        black_cents: Option<i64>,
        unit_of_measure: Option<&'static str>,
    ) -> Self {
        Self { category_code, item_name, base_cents, black_cents, unit_of_measure }
    }

    fn to_entry(self) -> PriceListEntry {
        let base_price = Decimal::new(self.base_cents, 2);
        let mut entry = PriceListEntry::new(self.category_code, self.item_name, base_price);
        if let Some(cents) = self.black_cents {
            entry = entry.with_price_black(Decimal::new(cents, 2));
        }
        if let Some(unit) = self.unit_of_measure {
            entry = entry.with_unit_of_measure(unit);
        }
        entry
    }
}

/// Standard price list and modifier set. Loading is idempotent: rows are upserted.
pub struct StandardCatalogSeed;

impl StandardCatalogSeed {
    pub fn price_list() -> Vec<PriceListEntry> {
        SEED_PRICE_LIST.iter().map(|item| item.to_entry()).collect()
    }

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let price_repo = SqlPriceListRepository::new(pool.clone());
        let modifier_repo = SqlModifierRepository::new(pool.clone());

        let entries = Self::price_list();
        let price_items = entries.len();
        for entry in entries {
            price_repo.save(entry).await?;
        }

        let modifiers = standard_modifiers();
        let modifier_count = modifiers.len();
        for definition in modifiers {
            modifier_repo.save(definition).await?;
        }

        tracing::info!(
            event_name = "pricing.catalog.seeded",
            price_items,
            modifiers = modifier_count,
            "standard catalog seeded"
        );

        Ok(SeedResult { price_items, modifiers: modifier_count })
    }

    /// Checks every seeded row is present with its seeded base price or modifier type.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for item in SEED_PRICE_LIST {
            let stored: Option<String> = sqlx::query_scalar(
                "SELECT base_price FROM price_list_item
                 WHERE category_code = ?1 AND item_name = ?2",
            )
            .bind(item.category_code)
            .bind(item.item_name)
            .fetch_optional(pool)
            .await?;
            let expected = Decimal::new(item.base_cents, 2).to_string();
            checks.push((
                format!("price:{}/{}", item.category_code, item.item_name),
                stored.as_deref() == Some(expected.as_str()),
            ));
        }

        for definition in standard_modifiers() {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM price_modifier WHERE code = ?1 AND modifier_type = ?2
                 )",
            )
            .bind(definition.code.as_str())
            .bind(definition.kind.modifier_type().as_str())
            .fetch_one(pool)
            .await?;
            checks.push((format!("modifier:{}", definition.code), exists == 1));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the seeded rows, leaving operator-added data in place.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        for item in SEED_PRICE_LIST {
            sqlx::query("DELETE FROM price_list_item WHERE category_code = ?1 AND item_name = ?2")
                .bind(item.category_code)
                .bind(item.item_name)
                .execute(&mut *tx)
                .await?;
        }
        for definition in standard_modifiers() {
            sqlx::query("DELETE FROM price_modifier WHERE code = ?1")
                .bind(definition.code.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub price_items: usize,
    pub modifiers: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}
