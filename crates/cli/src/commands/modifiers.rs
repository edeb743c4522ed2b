use clap::Args;
use serde::Serialize;

use launderly_core::pricing::modifier_category_for;
use launderly_core::{InMemoryModifierCatalog, ModifierCatalog, ModifierDefinition};
use launderly_db::repositories::{ModifierRepository, SqlModifierRepository};

use crate::commands::{open_database, prepare, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct ModifiersArgs {
    #[arg(long, help = "Only list active modifiers applicable to this price list category")]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModifierRow {
    code: String,
    name: String,
    category: &'static str,
    modifier_type: &'static str,
    change: String,
    active: bool,
}

impl From<&ModifierDefinition> for ModifierRow {
    fn from(definition: &ModifierDefinition) -> Self {
        Self {
            code: definition.code.0.clone(),
            name: definition.name.clone(),
            category: definition.category.as_str(),
            modifier_type: definition.kind.modifier_type().as_str(),
            change: definition.change_description(),
            active: definition.active,
        }
    }
}

pub fn run(args: ModifiersArgs) -> CommandResult {
    let (config, runtime) = match prepare("modifiers") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let listed = SqlModifierRepository::new(pool.clone())
            .list_all()
            .await
            .map_err(|error| ("catalog_load", error.to_string(), 5u8));
        pool.close().await;
        listed
    });

    let definitions = match result {
        Ok(definitions) => definitions,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("modifiers", error_class, message, exit_code);
        }
    };

    let rows = select_rows(definitions, args.category.as_deref());
    let message = match &args.category {
        Some(category) => format!(
            "{} modifiers available for {category} ({} + GENERAL)",
            rows.len(),
            modifier_category_for(category).as_str()
        ),
        None => format!("{} modifiers defined", rows.len()),
    };

    match serde_json::to_value(&rows) {
        Ok(data) => CommandResult::success_with_data("modifiers", message, Some(data)),
        Err(error) => CommandResult::failure("modifiers", "serialization", error.to_string(), 1),
    }
}

/// Every definition in catalog order, or only the active ones applicable to `category`.
fn select_rows(definitions: Vec<ModifierDefinition>, category: Option<&str>) -> Vec<ModifierRow> {
    match category {
        Some(category) => InMemoryModifierCatalog::new(definitions)
            .modifiers_for_category(category)
            .iter()
            .map(ModifierRow::from)
            .collect(),
        None => definitions.iter().map(ModifierRow::from).collect(),
    }
}
