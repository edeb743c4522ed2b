use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use launderly_core::domain::modifier::{
    ModifierCategory, ModifierCode, ModifierDefinition, ModifierKind, ModifierType,
};

use super::{parse_decimal, parse_optional_decimal, ModifierRepository, RepositoryError};
use crate::DbPool;

pub struct SqlModifierRepository {
    pool: DbPool,
}

impl SqlModifierRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_definition(row: &SqliteRow) -> Result<ModifierDefinition, RepositoryError> {
    let code: String = row.try_get("code").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: String =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let modifier_type: String =
        row.try_get("modifier_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let value: String = row.try_get("value").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let min_value: Option<String> =
        row.try_get("min_value").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let max_value: Option<String> =
        row.try_get("max_value").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let active: i64 = row.try_get("active").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let sort_order: i32 =
        row.try_get("sort_order").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let decode = |error: launderly_core::PricingError| {
        RepositoryError::Decode(format!("modifier `{code}`: {error}"))
    };
    let modifier_type = ModifierType::from_str(&modifier_type).map_err(decode)?;
    let category = ModifierCategory::from_str(&category).map_err(decode)?;
    let kind = ModifierKind::from_parts(
        modifier_type,
        parse_decimal("value", &value)?,
        parse_optional_decimal("min_value", min_value)?,
        parse_optional_decimal("max_value", max_value)?,
    )
    .map_err(decode)?;

    Ok(ModifierDefinition {
        code: ModifierCode(code),
        name,
        description,
        kind,
        category,
        active: active != 0,
        sort_order,
    })
}

#[async_trait::async_trait]
impl ModifierRepository for SqlModifierRepository {
    async fn find_by_code(
        &self,
        code: &ModifierCode,
    ) -> Result<Option<ModifierDefinition>, RepositoryError> {
        let row = sqlx::query(
            "SELECT code, name, description, modifier_type, category, value, min_value,
                    max_value, active, sort_order
             FROM price_modifier WHERE code = ?",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_definition(r)?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<ModifierDefinition>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT code, name, description, modifier_type, category, value, min_value,
                    max_value, active, sort_order
             FROM price_modifier ORDER BY sort_order, code",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_definition).collect()
    }

    async fn save(&self, definition: ModifierDefinition) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let kind = &definition.kind;

        sqlx::query(
            "INSERT INTO price_modifier (code, name, description, modifier_type, category, value,
                                         min_value, max_value, active, sort_order,
                                         created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(code) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 modifier_type = excluded.modifier_type,
                 category = excluded.category,
                 value = excluded.value,
                 min_value = excluded.min_value,
                 max_value = excluded.max_value,
                 active = excluded.active,
                 sort_order = excluded.sort_order,
                 updated_at = excluded.updated_at",
        )
        .bind(definition.code.as_str())
        .bind(&definition.name)
        .bind(&definition.description)
        .bind(kind.modifier_type().as_str())
        .bind(definition.category.as_str())
        .bind(kind.value().to_string())
        .bind(kind.min_value().map(|value| value.to_string()))
        .bind(kind.max_value().map(|value| value.to_string()))
        .bind(i64::from(definition.active))
        .bind(definition.sort_order)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
