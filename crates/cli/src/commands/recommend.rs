use clap::Args;

use launderly_core::{
    InMemoryModifierCatalog, RecommendationAdvisor, RecommendationReport, RecommendationRequest,
};
use launderly_db::repositories::{ModifierRepository, SqlModifierRepository};

use crate::commands::{open_database, prepare, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Price list category of the item")]
    pub category: String,
    #[arg(long = "stain", value_name = "STAIN", help = "Stain code or name (repeatable)")]
    pub stains: Vec<String>,
    #[arg(long = "defect", value_name = "DEFECT", help = "Defect code or name (repeatable)")]
    pub defects: Vec<String>,
}

impl RecommendArgs {
    pub fn to_request(&self) -> RecommendationRequest {
        RecommendationRequest {
            category_code: self.category.trim().to_string(),
            stains: self.stains.clone(),
            defects: self.defects.clone(),
        }
    }
}

pub fn run(args: RecommendArgs) -> CommandResult {
    let (config, runtime) = match prepare("recommend") {
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
            return CommandResult::failure("recommend", error_class, message, exit_code);
        }
    };

    let advisor =
        RecommendationAdvisor::with_standard_issues(InMemoryModifierCatalog::new(definitions));
    let report = advisor.recommend(&args.to_request());

    match serde_json::to_value(&report) {
        Ok(data) => CommandResult::success_with_data("recommend", summary(&report), Some(data)),
        Err(error) => CommandResult::failure("recommend", "serialization", error.to_string(), 1),
    }
}

fn summary(report: &RecommendationReport) -> String {
    if report.recommendations.is_empty() {
        return "no modifiers recommended".to_string();
    }
    let codes: Vec<&str> =
        report.recommendations.iter().map(|recommendation| recommendation.code.as_str()).collect();
    format!("recommended: {} ({} warnings)", codes.join(", "), report.warnings.len())
}
