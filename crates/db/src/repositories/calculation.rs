use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use launderly_core::domain::calculation::{CalculationRequest, CalculationResult};
use launderly_core::domain::price_list::CategoryCode;

use super::{CalculationRepository, RepositoryError};
use crate::DbPool;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalculationId(pub String);

impl CalculationId {
    pub fn generate() -> Self {
        Self(format!("calc-{}", Uuid::new_v4()))
    }
}

/// A priced request kept for later dispute resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: CalculationId,
    pub request: CalculationRequest,
    pub result: CalculationResult,
    pub calculated_at: DateTime<Utc>,
}

impl CalculationRecord {
    pub fn new(request: CalculationRequest, result: CalculationResult) -> Self {
        Self { id: CalculationId::generate(), request, result, calculated_at: Utc::now() }
    }
}

pub struct SqlCalculationRepository {
    pool: DbPool,
}

impl SqlCalculationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &SqliteRow) -> Result<CalculationRecord, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let request_json: String =
        row.try_get("request_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let result_json: String =
        row.try_get("result_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let calculated_at_str: String =
        row.try_get("calculated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let request: CalculationRequest = serde_json::from_str(&request_json)
        .map_err(|e| RepositoryError::Decode(format!("calculation `{id}` request: {e}")))?;
    let result: CalculationResult = serde_json::from_str(&result_json)
        .map_err(|e| RepositoryError::Decode(format!("calculation `{id}` result: {e}")))?;
    let calculated_at = DateTime::parse_from_rfc3339(&calculated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("calculation `{id}` timestamp: {e}")))?;

    Ok(CalculationRecord { id: CalculationId(id), request, result, calculated_at })
}

#[async_trait::async_trait]
impl CalculationRepository for SqlCalculationRepository {
    async fn find_by_id(
        &self,
        id: &CalculationId,
    ) -> Result<Option<CalculationRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, request_json, result_json, calculated_at
             FROM price_calculation WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_item(
        &self,
        category_code: &CategoryCode,
        item_name: &str,
    ) -> Result<Vec<CalculationRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, request_json, result_json, calculated_at
             FROM price_calculation
             WHERE category_code = ? AND item_name = ?
             ORDER BY calculated_at DESC, id",
        )
        .bind(category_code.as_str())
        .bind(item_name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn save(&self, record: CalculationRecord) -> Result<(), RepositoryError> {
        let request_json = serde_json::to_string(&record.request)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let result_json = serde_json::to_string(&record.result)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO price_calculation (id, category_code, item_name, quantity,
                                            base_unit_price, final_unit_price, final_total_price,
                                            request_json, result_json, calculated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 final_unit_price = excluded.final_unit_price,
                 final_total_price = excluded.final_total_price,
                 request_json = excluded.request_json,
                 result_json = excluded.result_json",
        )
        .bind(&record.id.0)
        .bind(record.request.category_code.as_str())
        .bind(&record.request.item_name)
        .bind(i64::from(record.result.quantity))
        .bind(record.result.base_unit_price.to_string())
        .bind(record.result.final_unit_price.to_string())
        .bind(record.result.final_total_price.to_string())
        .bind(request_json)
        .bind(result_json)
        .bind(record.calculated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            event_name = "pricing.calculation.persisted",
            calculation_id = %record.id.0,
            category_code = %record.request.category_code,
            item_name = %record.request.item_name,
            "stored price calculation"
        );

        Ok(())
    }
}
