//! Loads persisted catalog data into the in-memory catalogs the pricing engine reads.
//!
//! A snapshot is taken once and shared; later writes to the repositories do not affect
//! calculations running against an already loaded snapshot.

use launderly_core::{
    InMemoryModifierCatalog, InMemoryPriceCatalog, PriceCalculationEngine, PricingConfig,
};

use crate::repositories::{ModifierRepository, PriceListRepository, RepositoryError};

pub type SnapshotEngine = PriceCalculationEngine<InMemoryPriceCatalog, InMemoryModifierCatalog>;

#[derive(Clone, Debug)]
pub struct CatalogSnapshot {
    pub prices: InMemoryPriceCatalog,
    pub modifiers: InMemoryModifierCatalog,
}

impl CatalogSnapshot {
    pub async fn load(
        prices: &dyn PriceListRepository,
        modifiers: &dyn ModifierRepository,
    ) -> Result<Self, RepositoryError> {
        let entries = prices.list_entries().await?;
        let definitions = modifiers.list_all().await?;

        let snapshot = Self {
            prices: InMemoryPriceCatalog::new(entries),
            modifiers: InMemoryModifierCatalog::new(definitions),
        };

        tracing::debug!(
            event_name = "pricing.catalog.snapshot_loaded",
            price_items = snapshot.prices.len(),
            modifiers = snapshot.modifiers.len(),
            "catalog snapshot loaded"
        );

        Ok(snapshot)
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn into_engine(self, config: PricingConfig) -> SnapshotEngine {
        PriceCalculationEngine::new(self.prices, self.modifiers, config)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use launderly_core::domain::modifier::{ModifierCategory, ModifierDefinition, ModifierKind};
    use launderly_core::{CalculationRequest, PriceCalculator, PriceListEntry, PricingConfig};

    use super::CatalogSnapshot;
    use crate::fixtures::StandardCatalogSeed;
    use crate::repositories::{
        InMemoryModifierRepository, InMemoryPriceListRepository, ModifierRepository,
        PriceListRepository, SqlModifierRepository, SqlPriceListRepository,
    };
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn snapshot_from_seeded_database_prices_requests() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        StandardCatalogSeed::load(&pool).await.expect("seed");

        let snapshot = CatalogSnapshot::load(
            &SqlPriceListRepository::new(pool.clone()),
            &SqlModifierRepository::new(pool.clone()),
        )
        .await
        .expect("load snapshot");
        let engine = snapshot.into_engine(PricingConfig::default());

        let result = engine
            .calculate_price(
                &CalculationRequest::new("CLOTHING", "Coat", 1)
                    .with_color("black")
                    .with_modifier("black_light_colors"),
            )
            .expect("calculate");

        // black price 460.00, then +20% from the color modifier
        assert_eq!(result.base_unit_price, Decimal::new(46000, 2));
        assert_eq!(result.final_unit_price, Decimal::new(55200, 2));
    }

    #[tokio::test]
    async fn snapshot_keeps_inactive_modifiers_out_of_pricing() {
        let prices = InMemoryPriceListRepository::default();
        let modifiers = InMemoryModifierRepository::default();
        prices
            .save(PriceListEntry::new("CLOTHING", "Dress", Decimal::new(20000, 2)))
            .await
            .expect("save entry");
        modifiers
            .save(
                ModifierDefinition::new(
                    "silk_products",
                    "Silk products",
                    ModifierKind::Percentage { percent: Decimal::from(50) },
                    ModifierCategory::Textile,
                )
                .inactive(),
            )
            .await
            .expect("save modifier");

        let snapshot = CatalogSnapshot::load(&prices, &modifiers).await.expect("load snapshot");
        assert!(!snapshot.is_empty());
        let engine = snapshot.into_engine(PricingConfig::default());

        let result = engine
            .calculate_price(
                &CalculationRequest::new("CLOTHING", "Dress", 1).with_modifier("silk_products"),
            )
            .expect("calculate");

        assert_eq!(result.final_unit_price, Decimal::new(20000, 2));
        assert!(result.applied_modifier_codes().is_empty());
    }
}
