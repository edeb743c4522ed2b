use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use launderly_core::domain::price_list::{CategoryCode, PriceListEntry};

use super::{parse_decimal, parse_optional_decimal, PriceListRepository, RepositoryError};
use crate::DbPool;

const SELECT_COLUMNS: &str =
    "SELECT category_code, item_name, unit_of_measure, base_price, price_black
     FROM price_list_item";

pub struct SqlPriceListRepository {
    pool: DbPool,
}

impl SqlPriceListRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<PriceListEntry, RepositoryError> {
    let category_code: String =
        row.try_get("category_code").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let item_name: String =
        row.try_get("item_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let unit_of_measure: Option<String> =
        row.try_get("unit_of_measure").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let base_price: String =
        row.try_get("base_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_black: Option<String> =
        row.try_get("price_black").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(PriceListEntry {
        category_code: CategoryCode(category_code),
        item_name,
        unit_of_measure: unit_of_measure.filter(|unit| !unit.trim().is_empty()),
        base_price: parse_decimal("base_price", &base_price)?,
        price_black: parse_optional_decimal("price_black", price_black)?,
    })
}

#[async_trait::async_trait]
impl PriceListRepository for SqlPriceListRepository {
    async fn find_entry(
        &self,
        category_code: &CategoryCode,
        item_name: &str,
    ) -> Result<Option<PriceListEntry>, RepositoryError> {
        let row = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE category_code = ? AND item_name = ?"
        ))
        .bind(category_code.as_str())
        .bind(item_name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_entry(r)?)),
            None => Ok(None),
        }
    }

    async fn list_entries(&self) -> Result<Vec<PriceListEntry>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY category_code, item_name"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn list_by_category(
        &self,
        category_code: &CategoryCode,
    ) -> Result<Vec<PriceListEntry>, RepositoryError> {
        let rows =
            sqlx::query(&format!("{SELECT_COLUMNS} WHERE category_code = ? ORDER BY item_name"))
                .bind(category_code.as_str())
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn save(&self, entry: PriceListEntry) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO price_list_item (category_code, item_name, unit_of_measure, base_price,
                                          price_black, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(category_code, item_name) DO UPDATE SET
                 unit_of_measure = excluded.unit_of_measure,
                 base_price = excluded.base_price,
                 price_black = excluded.price_black,
                 updated_at = excluded.updated_at",
        )
        .bind(entry.category_code.as_str())
        .bind(&entry.item_name)
        .bind(&entry.unit_of_measure)
        .bind(entry.base_price.to_string())
        .bind(entry.price_black.map(|price| price.to_string()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use launderly_core::domain::price_list::{CategoryCode, PriceListEntry};

    use super::SqlPriceListRepository;
    use crate::repositories::{PriceListRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlPriceListRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlPriceListRepository::new(pool)
    }

    #[tokio::test]
    async fn save_and_find_entry_round_trip() {
        let repo = setup().await;
        let entry = PriceListEntry::new("CLOTHING", "Coat", Decimal::new(12000, 2))
            .with_price_black(Decimal::new(15000, 2))
            .with_unit_of_measure("pcs");

        repo.save(entry.clone()).await.expect("save");
        let found = repo
            .find_entry(&CategoryCode::from("CLOTHING"), "Coat")
            .await
            .expect("find")
            .expect("entry exists");

        assert_eq!(found, entry);
    }

    #[tokio::test]
    async fn missing_entry_is_none() {
        let repo = setup().await;

        let found =
            repo.find_entry(&CategoryCode::from("CLOTHING"), "Nothing").await.expect("find");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn save_updates_existing_price() {
        let repo = setup().await;
        repo.save(PriceListEntry::new("LEATHER", "Jacket", Decimal::new(30000, 2)))
            .await
            .expect("save");
        repo.save(PriceListEntry::new("LEATHER", "Jacket", Decimal::new(32500, 2)))
            .await
            .expect("update");

        let entries = repo.list_by_category(&CategoryCode::from("LEATHER")).await.expect("list");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].base_price, Decimal::new(32500, 2));
        assert_eq!(entries[0].price_black, None);
    }

    #[tokio::test]
    async fn list_entries_is_ordered_by_category_then_item() {
        let repo = setup().await;
        for (category, item) in [("LEATHER", "Gloves"), ("CLOTHING", "Skirt"), ("CLOTHING", "Coat")]
        {
            repo.save(PriceListEntry::new(category, item, Decimal::ONE)).await.expect("save");
        }

        let keys: Vec<(String, String)> = repo
            .list_entries()
            .await
            .expect("list")
            .into_iter()
            .map(|entry| (entry.category_code.0, entry.item_name))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("CLOTHING".to_string(), "Coat".to_string()),
                ("CLOTHING".to_string(), "Skirt".to_string()),
                ("LEATHER".to_string(), "Gloves".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn corrupt_price_text_is_a_decode_error() {
        let repo = setup().await;
        sqlx::query(
            "INSERT INTO price_list_item
                (category_code, item_name, base_price, created_at, updated_at)
             VALUES ('CLOTHING', 'Scarf', 'cheap', 'now', 'now')",
        )
        .execute(&repo.pool)
        .await
        .expect("insert corrupt row");

        let error = repo
            .find_entry(&CategoryCode::from("CLOTHING"), "Scarf")
            .await
            .expect_err("decode must fail");

        assert!(matches!(error, RepositoryError::Decode(_)));
    }
}
