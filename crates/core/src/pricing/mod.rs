pub mod apply;
pub mod catalog;
pub mod engine;
pub mod modifiers;
pub mod pipeline;
pub mod policy;
pub mod trace;
pub mod units;

use rust_decimal::Decimal;

use crate::domain::calculation::{CalculationRequest, CalculationResult};
use crate::domain::modifier::{ModifierCode, ModifierDefinition};
use crate::domain::price_list::PriceListEntry;
use crate::errors::PricingError;

pub use self::{
    catalog::InMemoryPriceCatalog,
    engine::{PriceCalculationEngine, MAX_EXPEDITE_PERCENT},
    modifiers::{modifier_category_for, standard_modifiers, InMemoryModifierCatalog},
    pipeline::{ModifierPartition, ModifierPipeline, PipelineOutcome},
    policy::DenyListCategoryPolicy,
    units::CategoryUnitAdvisor,
};

/// Base price lookup by category and item.
pub trait PriceCatalog: Send + Sync {
    /// Exact, case-sensitive match on category code and item name.
    fn entry(&self, category_code: &str, item_name: &str) -> Option<PriceListEntry>;

    fn resolve_entry(
        &self,
        category_code: &str,
        item_name: &str,
    ) -> Result<PriceListEntry, PricingError> {
        self.entry(category_code, item_name)
            .ok_or_else(|| PricingError::not_found(category_code, item_name))
    }

    fn base_price(
        &self,
        category_code: &str,
        item_name: &str,
        color: Option<&str>,
    ) -> Result<Decimal, PricingError> {
        Ok(self.resolve_entry(category_code, item_name)?.price_for_color(color))
    }
}

pub trait ModifierCatalog: Send + Sync {
    /// Active definitions for `codes` in request order. Unknown and inactive codes are dropped.
    fn modifiers_by_codes(&self, codes: &[ModifierCode]) -> Vec<ModifierDefinition>;

    /// Active GENERAL modifiers plus those of the category's modifier category.
    fn modifiers_for_category(&self, category_code: &str) -> Vec<ModifierDefinition>;
}

pub trait CategoryPolicy: Send + Sync {
    fn can_expedite(&self, category_code: &str) -> bool;
}

pub trait UnitOfMeasureAdvisor: Send + Sync {
    fn recommended_unit_of_measure(&self, entry: &PriceListEntry) -> String;
}

pub trait PriceCalculator: Send + Sync {
    fn calculate_price(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationResult, PricingError>;
}
