use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use launderly_core::domain::modifier::{ModifierCode, ModifierDefinition};
use launderly_core::ApplicationError;
use launderly_core::domain::price_list::{CategoryCode, PriceListEntry};

pub mod calculation;
pub mod memory;
pub mod modifier;
pub mod price_list;

pub use calculation::{CalculationId, CalculationRecord, SqlCalculationRepository};
pub use memory::{
    InMemoryCalculationRepository, InMemoryModifierRepository, InMemoryPriceListRepository,
};
pub use modifier::SqlModifierRepository;
pub use price_list::SqlPriceListRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

#[async_trait]
pub trait PriceListRepository: Send + Sync {
    async fn find_entry(
        &self,
        category_code: &CategoryCode,
        item_name: &str,
    ) -> Result<Option<PriceListEntry>, RepositoryError>;

    /// All entries ordered by category, then item name.
    async fn list_entries(&self) -> Result<Vec<PriceListEntry>, RepositoryError>;

    async fn list_by_category(
        &self,
        category_code: &CategoryCode,
    ) -> Result<Vec<PriceListEntry>, RepositoryError>;

    async fn save(&self, entry: PriceListEntry) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ModifierRepository: Send + Sync {
    async fn find_by_code(
        &self,
        code: &ModifierCode,
    ) -> Result<Option<ModifierDefinition>, RepositoryError>;

    /// Active and inactive definitions ordered by sort order, then code.
    async fn list_all(&self) -> Result<Vec<ModifierDefinition>, RepositoryError>;

    async fn save(&self, definition: ModifierDefinition) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CalculationRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &CalculationId,
    ) -> Result<Option<CalculationRecord>, RepositoryError>;

    /// Stored calculations for one price list item, newest first.
    async fn list_for_item(
        &self,
        category_code: &CategoryCode,
        item_name: &str,
    ) -> Result<Vec<CalculationRecord>, RepositoryError>;

    async fn save(&self, record: CalculationRecord) -> Result<(), RepositoryError>;
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value.trim())
        .map_err(|error| RepositoryError::Decode(format!("invalid decimal in {field}: {error}")))
}

pub(crate) fn parse_optional_decimal(
    field: &str,
    value: Option<String>,
) -> Result<Option<Decimal>, RepositoryError> {
    match value {
        Some(text) if !text.trim().is_empty() => parse_decimal(field, &text).map(Some),
        _ => Ok(None),
    }
}
