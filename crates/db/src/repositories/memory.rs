use std::collections::HashMap;

use tokio::sync::RwLock;

use launderly_core::domain::modifier::{ModifierCode, ModifierDefinition};
use launderly_core::domain::price_list::{CategoryCode, PriceListEntry};

use super::{
    CalculationId, CalculationRecord, CalculationRepository, ModifierRepository,
    PriceListRepository, RepositoryError,
};

type EntryKey = (String, String);

#[derive(Default)]
pub struct InMemoryPriceListRepository {
    entries: RwLock<HashMap<EntryKey, PriceListEntry>>,
}

#[async_trait::async_trait]
impl PriceListRepository for InMemoryPriceListRepository {
    async fn find_entry(
        &self,
        category_code: &CategoryCode,
        item_name: &str,
    ) -> Result<Option<PriceListEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(category_code.0.clone(), item_name.to_string())).cloned())
    }

    async fn list_entries(&self) -> Result<Vec<PriceListEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut listed: Vec<PriceListEntry> = entries.values().cloned().collect();
        listed.sort_by(|a, b| {
            (&a.category_code, &a.item_name).cmp(&(&b.category_code, &b.item_name))
        });
        Ok(listed)
    }

    async fn list_by_category(
        &self,
        category_code: &CategoryCode,
    ) -> Result<Vec<PriceListEntry>, RepositoryError> {
        let mut listed = self.list_entries().await?;
        listed.retain(|entry| &entry.category_code == category_code);
        Ok(listed)
    }

    async fn save(&self, entry: PriceListEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.insert((entry.category_code.0.clone(), entry.item_name.clone()), entry);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryModifierRepository {
    definitions: RwLock<HashMap<String, ModifierDefinition>>,
}

#[async_trait::async_trait]
impl ModifierRepository for InMemoryModifierRepository {
    async fn find_by_code(
        &self,
        code: &ModifierCode,
    ) -> Result<Option<ModifierDefinition>, RepositoryError> {
        let definitions = self.definitions.read().await;
        Ok(definitions.get(&code.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ModifierDefinition>, RepositoryError> {
        let definitions = self.definitions.read().await;
        let mut listed: Vec<ModifierDefinition> = definitions.values().cloned().collect();
        listed.sort_by(|a, b| (a.sort_order, &a.code).cmp(&(b.sort_order, &b.code)));
        Ok(listed)
    }

    async fn save(&self, definition: ModifierDefinition) -> Result<(), RepositoryError> {
        let mut definitions = self.definitions.write().await;
        definitions.insert(definition.code.0.clone(), definition);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCalculationRepository {
    records: RwLock<HashMap<String, CalculationRecord>>,
}

#[async_trait::async_trait]
impl CalculationRepository for InMemoryCalculationRepository {
    async fn find_by_id(
        &self,
        id: &CalculationId,
    ) -> Result<Option<CalculationRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(&id.0).cloned())
    }

    async fn list_for_item(
        &self,
        category_code: &CategoryCode,
        item_name: &str,
    ) -> Result<Vec<CalculationRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut listed: Vec<CalculationRecord> = records
            .values()
            .filter(|record| {
                &record.request.category_code == category_code
                    && record.request.item_name == item_name
            })
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.calculated_at.cmp(&a.calculated_at).then(a.id.0.cmp(&b.id.0)));
        Ok(listed)
    }

    async fn save(&self, record: CalculationRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.insert(record.id.0.clone(), record);
        Ok(())
    }
}
