pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod recommendations;

pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat, PricingConfig};
pub use domain::calculation::{
    CalculationRequest, CalculationResult, CalculationStep, PipelineStage,
};
pub use domain::modifier::{
    ModifierCategory, ModifierCode, ModifierDefinition, ModifierKind, ModifierSelection,
    ModifierType,
};
pub use domain::price_list::{CategoryCode, PriceListEntry};
pub use errors::{ApplicationError, InterfaceError, PricingError};
pub use pricing::{
    CategoryPolicy, DenyListCategoryPolicy, InMemoryModifierCatalog, InMemoryPriceCatalog,
    ModifierCatalog, PriceCalculationEngine, PriceCalculator, PriceCatalog, UnitOfMeasureAdvisor,
};
pub use recommendations::{RecommendationAdvisor, RecommendationReport, RecommendationRequest};
