use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::PricingConfig;
use crate::domain::calculation::{CalculationRequest, CalculationResult};
use crate::errors::PricingError;
use crate::pricing::pipeline::ModifierPipeline;
use crate::pricing::policy::DenyListCategoryPolicy;
use crate::pricing::units::CategoryUnitAdvisor;
use crate::pricing::{
    CategoryPolicy, ModifierCatalog, PriceCalculator, PriceCatalog, UnitOfMeasureAdvisor,
};

/// Largest accepted expedite surcharge, in percent.
pub const MAX_EXPEDITE_PERCENT: Decimal = Decimal::ONE_THOUSAND;

/// Request/response price calculation over read-only catalog data.
pub struct PriceCalculationEngine<C, M, P = DenyListCategoryPolicy, U = CategoryUnitAdvisor> {
    catalog: C,
    modifiers: M,
    policy: P,
    units: U,
    pipeline: ModifierPipeline,
}

impl<C, M> PriceCalculationEngine<C, M> {
    pub fn new(catalog: C, modifiers: M, config: PricingConfig) -> Self {
        let policy = DenyListCategoryPolicy::from_config(&config);
        Self::with_components(catalog, modifiers, policy, CategoryUnitAdvisor::default(), config)
    }
}

impl<C, M, P, U> PriceCalculationEngine<C, M, P, U> {
    pub fn with_components(
        catalog: C,
        modifiers: M,
        policy: P,
        units: U,
        config: PricingConfig,
    ) -> Self {
        Self { catalog, modifiers, policy, units, pipeline: ModifierPipeline::new(config) }
    }

    pub fn config(&self) -> &PricingConfig {
        self.pipeline.config()
    }
}

impl<C, M, P, U> PriceCalculationEngine<C, M, P, U>
where
    C: PriceCatalog,
    M: ModifierCatalog,
    P: CategoryPolicy,
    U: UnitOfMeasureAdvisor,
{
    /// Single-unit quote for an item with no modifiers applied.
    pub fn base_price_result(
        &self,
        category_code: &str,
        item_name: &str,
        color: Option<&str>,
    ) -> Result<CalculationResult, PricingError> {
        let mut request = CalculationRequest::new(category_code, item_name, 1);
        request.color = color.map(str::to_owned);
        self.calculate_price(&request)
    }
}

impl<C, M, P, U> PriceCalculator for PriceCalculationEngine<C, M, P, U>
where
    C: PriceCatalog,
    M: ModifierCatalog,
    P: CategoryPolicy,
    U: UnitOfMeasureAdvisor,
{
    fn calculate_price(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationResult, PricingError> {
        validate_request(request)?;

        let category_code = request.category_code.as_str();
        debug!(
            event_name = "pricing.calculation.start",
            category_code,
            item_name = %request.item_name,
            quantity = request.quantity,
            modifier_count = request.modifier_codes.len(),
            "calculating price"
        );

        let entry = self.catalog.resolve_entry(category_code, &request.item_name).map_err(
            |error| {
                warn!(
                    event_name = "pricing.calculation.not_found",
                    category_code,
                    item_name = %request.item_name,
                    "price list entry not found"
                );
                error
            },
        )?;
        let catalog_price = entry.price_for_color(request.color());
        let unit_of_measure = self.units.recommended_unit_of_measure(&entry);

        let modifiers = self.modifiers.modifiers_by_codes(&request.modifier_codes);
        if modifiers.len() < request.modifier_codes.len() {
            debug!(
                event_name = "pricing.calculation.modifiers_skipped",
                requested = request.modifier_codes.len(),
                resolved = modifiers.len(),
                "some requested modifiers were not resolved"
            );
        }

        let can_expedite = self.policy.can_expedite(category_code);
        let outcome = self.pipeline.run(catalog_price, &modifiers, request, can_expedite)?;

        let quantity = Decimal::from(request.quantity);
        let base_unit_price = outcome.base_unit_price;
        let final_unit_price = outcome.final_unit_price;
        let result = CalculationResult {
            base_unit_price,
            quantity: request.quantity,
            base_total_price: total_for(base_unit_price, quantity)?,
            final_unit_price,
            final_total_price: total_for(final_unit_price, quantity)?,
            total_modifier_impact: final_unit_price - base_unit_price,
            unit_of_measure,
            steps: outcome.steps,
        };

        info!(
            event_name = "pricing.calculation.completed",
            category_code,
            item_name = %request.item_name,
            base_unit_price = %result.base_unit_price,
            final_unit_price = %result.final_unit_price,
            final_total_price = %result.final_total_price,
            steps = result.steps.len(),
            "price calculated"
        );

        Ok(result)
    }
}

fn total_for(unit_price: Decimal, quantity: Decimal) -> Result<Decimal, PricingError> {
    unit_price
        .checked_mul(quantity)
        .ok_or_else(|| PricingError::overflow(format!("total of {quantity} x {unit_price}")))
}

fn validate_request(request: &CalculationRequest) -> Result<(), PricingError> {
    if request.category_code.as_str().trim().is_empty() {
        return Err(PricingError::InvalidRequest("category_code must not be blank".to_string()));
    }
    if request.item_name.trim().is_empty() {
        return Err(PricingError::InvalidRequest("item_name must not be blank".to_string()));
    }
    if request.quantity == 0 {
        return Err(PricingError::InvalidRequest("quantity must be >= 1".to_string()));
    }
    if request.expedite_factor < Decimal::ZERO || request.expedite_factor > MAX_EXPEDITE_PERCENT {
        return Err(PricingError::InvalidRequest(format!(
            "expedite_factor must be in range 0..={MAX_EXPEDITE_PERCENT}"
        )));
    }
    if request.discount_percent < Decimal::ZERO || request.discount_percent > Decimal::ONE_HUNDRED
    {
        return Err(PricingError::InvalidRequest(
            "discount_percent must be in range 0..=100".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{PriceCalculationEngine, MAX_EXPEDITE_PERCENT};
    use crate::config::PricingConfig;
    use crate::domain::calculation::{CalculationRequest, PipelineStage};
    use crate::domain::modifier::{
        ModifierCategory, ModifierDefinition, ModifierKind, ModifierSelection,
    };
    use crate::domain::price_list::PriceListEntry;
    use crate::errors::PricingError;
    use crate::pricing::{InMemoryModifierCatalog, InMemoryPriceCatalog, PriceCalculator};

    type Engine = PriceCalculationEngine<InMemoryPriceCatalog, InMemoryModifierCatalog>;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn engine() -> Engine {
        let catalog = InMemoryPriceCatalog::new([
            PriceListEntry::new("CLOTHING", "Shirt", money(10_000)).with_price_black(money(12_000)),
            PriceListEntry::new("LAUNDRY", "Bed linen", money(10_000)),
            PriceListEntry::new("LEATHER", "Jacket", money(80_000)),
            PriceListEntry::new("CLOTHING", "Sock", money(50)),
            PriceListEntry::new(
                "CLOTHING",
                "Gown",
                Decimal::from_i128_with_scale(10_i128.pow(20), 0),
            ),
        ]);
        let modifiers = InMemoryModifierCatalog::new([
            ModifierDefinition::new(
                "black_light_colors",
                "Black and light colors",
                ModifierKind::Percentage { percent: Decimal::from(10) },
                ModifierCategory::Textile,
            ),
            ModifierDefinition::new(
                "very_dirty_items",
                "Heavily soiled items",
                ModifierKind::RangePercentage {
                    min_percent: Decimal::from(20),
                    max_percent: Decimal::from(100),
                },
                ModifierCategory::General,
            ),
            ModifierDefinition::new(
                "leather_coloring_after_other_cleaning",
                "Coloring after cleaning elsewhere",
                ModifierKind::Fixed { amount: money(150_000) },
                ModifierCategory::Leather,
            ),
            ModifierDefinition::new(
                "manual_cleaning",
                "Manual cleaning",
                ModifierKind::Percentage { percent: Decimal::from(20) },
                ModifierCategory::General,
            ),
            ModifierDefinition::new(
                "sewing_buttons",
                "Sewing on buttons",
                ModifierKind::Addition { amount: money(1_000) },
                ModifierCategory::Textile,
            ),
        ]);
        PriceCalculationEngine::new(catalog, modifiers, PricingConfig::default())
    }

    #[test]
    fn plain_item_yields_base_and_rounding_steps_only() -> Result<(), PricingError> {
        let result = engine().calculate_price(&CalculationRequest::new("CLOTHING", "Shirt", 2))?;

        assert_eq!(result.final_unit_price, money(10_000));
        assert_eq!(result.final_total_price, money(20_000));
        assert_eq!(result.base_total_price, money(20_000));
        assert_eq!(result.total_modifier_impact, Decimal::ZERO);
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].stage, PipelineStage::BasePrice);
        assert_eq!(result.steps[1].stage, PipelineStage::Rounding);
        assert_eq!(result.unit_of_measure, "pcs");
        Ok(())
    }

    #[test]
    fn black_price_and_color_modifier_stack() -> Result<(), PricingError> {
        let request = CalculationRequest::new("CLOTHING", "Shirt", 1)
            .with_color("black")
            .with_modifier("black_light_colors");

        let result = engine().calculate_price(&request)?;

        assert_eq!(result.base_unit_price, money(12_000));
        assert_eq!(result.steps[1].step, 2);
        assert_eq!(result.steps[1].stage, PipelineStage::ColorModifier);
        assert_eq!(result.steps[1].price_after, money(13_200));
        assert_eq!(result.final_unit_price, money(13_200));
        Ok(())
    }

    #[test]
    fn range_modifier_without_value_uses_midpoint() -> Result<(), PricingError> {
        let request =
            CalculationRequest::new("CLOTHING", "Shirt", 1).with_modifier("very_dirty_items");

        let result = engine().calculate_price(&request)?;

        assert_eq!(result.final_unit_price, money(16_000));
        assert_eq!(result.steps[1].modifier_value.as_deref(), Some("+60% (range 20-100%)"));
        Ok(())
    }

    #[test]
    fn range_modifier_uses_caller_value() -> Result<(), PricingError> {
        let request = CalculationRequest::new("CLOTHING", "Shirt", 1).with_selection(
            ModifierSelection::new("very_dirty_items").with_range_value(Decimal::from(35)),
        );

        let result = engine().calculate_price(&request)?;

        assert_eq!(result.final_unit_price, money(13_500));
        Ok(())
    }

    #[test]
    fn expedite_on_denied_category_is_informational() -> Result<(), PricingError> {
        let request =
            CalculationRequest::new("LAUNDRY", "Bed linen", 1).expedited(Decimal::from(30));

        let result = engine().calculate_price(&request)?;

        let expedite: Vec<_> = result.steps_for(PipelineStage::Expedite).collect();
        assert_eq!(expedite.len(), 1);
        assert_eq!(expedite[0].price_difference, Decimal::ZERO);
        assert_eq!(result.final_unit_price, money(10_000));
        assert_eq!(result.unit_of_measure, "kg");
        Ok(())
    }

    #[test]
    fn expedite_applies_on_allowed_category() -> Result<(), PricingError> {
        let request = CalculationRequest::new("CLOTHING", "Shirt", 1).expedited(Decimal::from(30));

        let result = engine().calculate_price(&request)?;

        assert_eq!(result.final_unit_price, money(13_000));
        Ok(())
    }

    #[test]
    fn discount_reduces_running_price() -> Result<(), PricingError> {
        let request =
            CalculationRequest::new("CLOTHING", "Shirt", 1).with_discount(Decimal::from(10));
        let mut engine = engine();
        engine.catalog = InMemoryPriceCatalog::new([PriceListEntry::new(
            "CLOTHING",
            "Shirt",
            money(20_000),
        )]);

        let result = engine.calculate_price(&request)?;

        let discount: Vec<_> = result.steps_for(PipelineStage::Discount).collect();
        assert_eq!(discount.len(), 1);
        assert_eq!(discount[0].price_difference, money(-2_000));
        assert_eq!(result.final_unit_price, money(18_000));
        Ok(())
    }

    #[test]
    fn special_override_replaces_price_and_is_not_reapplied() -> Result<(), PricingError> {
        let request = CalculationRequest::new("LEATHER", "Jacket", 1)
            .with_modifier("leather_coloring_after_other_cleaning")
            .with_modifier("manual_cleaning");

        let result = engine().calculate_price(&request)?;

        let codes: Vec<_> =
            result.applied_modifier_codes().iter().map(|code| code.as_str()).collect();
        assert_eq!(codes, vec!["leather_coloring_after_other_cleaning", "manual_cleaning"]);
        assert_eq!(result.steps[1].stage, PipelineStage::SpecialModifier);
        assert_eq!(result.final_unit_price, money(180_000));
        Ok(())
    }

    #[test]
    fn unknown_modifiers_are_skipped() -> Result<(), PricingError> {
        let request = CalculationRequest::new("CLOTHING", "Shirt", 3).with_modifier("gold_plating");

        let result = engine().calculate_price(&request)?;

        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.final_total_price, money(30_000));
        Ok(())
    }

    #[test]
    fn missing_item_fails_without_partial_result() {
        let result = engine().calculate_price(&CalculationRequest::new("CLOTHING", "Cape", 1));

        assert_eq!(result, Err(PricingError::not_found("CLOTHING", "Cape")));
    }

    #[test]
    fn invalid_requests_are_rejected_before_lookup() {
        let engine = engine();

        let zero_quantity = CalculationRequest::new("CLOTHING", "Shirt", 0);
        let negative_discount =
            CalculationRequest::new("CLOTHING", "Shirt", 1).with_discount(Decimal::from(-5));
        let blank_item = CalculationRequest::new("CLOTHING", "  ", 1);
        let runaway_expedite = CalculationRequest::new("CLOTHING", "Shirt", 1)
            .expedited(Decimal::from_i128_with_scale(10_i128.pow(27), 0));

        for request in [zero_quantity, negative_discount, blank_item, runaway_expedite] {
            assert!(matches!(
                engine.calculate_price(&request),
                Err(PricingError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn base_price_result_is_single_unit_without_modifiers() -> Result<(), PricingError> {
        let result = engine().base_price_result("CLOTHING", "Shirt", Some("BLACK"))?;

        assert_eq!(result.quantity, 1);
        assert_eq!(result.final_total_price, money(12_000));
        assert!(result.applied_modifier_codes().is_empty());
        Ok(())
    }

    #[test]
    fn largest_allowed_expedite_is_priced() -> Result<(), PricingError> {
        let request =
            CalculationRequest::new("CLOTHING", "Shirt", 1).expedited(MAX_EXPEDITE_PERCENT);

        let result = engine().calculate_price(&request)?;

        assert_eq!(result.final_unit_price, money(110_000));
        Ok(())
    }

    #[test]
    fn oversized_total_is_an_error_not_a_panic() {
        let request = CalculationRequest::new("CLOTHING", "Gown", u32::MAX);

        let result = engine().calculate_price(&request);

        assert!(matches!(result, Err(PricingError::Overflow(_))));
    }

    #[test]
    fn maximum_quantity_prices_ordinary_items() -> Result<(), PricingError> {
        let request = CalculationRequest::new("CLOTHING", "Shirt", u32::MAX);

        let result = engine().calculate_price(&request)?;

        assert_eq!(result.final_total_price, money(10_000) * Decimal::from(u32::MAX));
        Ok(())
    }

    #[test]
    fn large_fixed_quantity_is_added_exactly() -> Result<(), PricingError> {
        let request = CalculationRequest::new("CLOTHING", "Shirt", 1).with_selection(
            ModifierSelection::new("sewing_buttons").with_fixed_quantity(u32::MAX),
        );

        let result = engine().calculate_price(&request)?;

        let expected = money(10_000) + money(1_000) * Decimal::from(u32::MAX);
        assert_eq!(result.final_unit_price, expected);
        Ok(())
    }

    #[test]
    fn catalog_price_below_minimum_starts_at_the_floor() -> Result<(), PricingError> {
        let result = engine().calculate_price(&CalculationRequest::new("CLOTHING", "Sock", 2))?;

        assert_eq!(result.base_unit_price, Decimal::ONE);
        assert_eq!(result.steps[0].price_after, Decimal::ONE);
        assert_eq!(result.final_total_price, money(200));
        Ok(())
    }
}
