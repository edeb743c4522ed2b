use anyhow::{anyhow, Context};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use launderly_core::config::AppConfig;
use launderly_core::{
    ApplicationError, CalculationRequest, InterfaceError, ModifierSelection, PriceCalculator,
};
use launderly_db::repositories::{
    CalculationId, CalculationRecord, CalculationRepository, SqlCalculationRepository,
    SqlModifierRepository, SqlPriceListRepository,
};
use launderly_db::{CatalogSnapshot, DbPool};

use crate::commands::{open_database, prepare, CommandResult, StepFailure};

#[derive(Debug, Clone, Args)]
pub struct PriceArgs {
    #[arg(long, help = "Price list category code, e.g. CLOTHING")]
    pub category: String,
    #[arg(long, help = "Item name exactly as it appears in the price list")]
    pub item: String,
    #[arg(long, default_value_t = 1)]
    pub quantity: u32,
    #[arg(long, help = "Item color; black and white qualify for the color modifier")]
    pub color: Option<String>,
    #[arg(long = "modifier", value_name = "CODE", help = "Modifier code to apply (repeatable)")]
    pub modifiers: Vec<String>,
    #[arg(
        long = "range",
        value_name = "CODE=PERCENT",
        help = "Percent chosen for a range modifier"
    )]
    pub range_values: Vec<String>,
    #[arg(long = "fixed", value_name = "CODE=QUANTITY", help = "Quantity of a fixed modifier")]
    pub fixed_quantities: Vec<String>,
    #[arg(long, value_name = "PERCENT", help = "Request expedited service at this surcharge")]
    pub expedite: Option<Decimal>,
    #[arg(long, value_name = "PERCENT")]
    pub discount: Option<Decimal>,
    #[arg(long, help = "Store the calculation for later lookup")]
    pub persist: bool,
    #[arg(
        long,
        conflicts_with_all = [
            "modifiers",
            "range_values",
            "fixed_quantities",
            "expedite",
            "discount",
        ],
        help = "Quote one unit at the catalog price, without modifiers"
    )]
    pub base_only: bool,
}

impl PriceArgs {
    /// Builds the engine request. `--range` and `--fixed` select their modifier implicitly.
    pub fn to_request(&self) -> anyhow::Result<CalculationRequest> {
        let mut selections: Vec<ModifierSelection> = Vec::new();

        for code in &self.modifiers {
            selection_for(&mut selections, code);
        }
        for raw in &self.range_values {
            let (code, value) = split_assignment(raw)?;
            let percent = value
                .parse::<Decimal>()
                .with_context(|| format!("range value for `{code}` is not a number: `{value}`"))?;
            selection_for(&mut selections, code).range_value = Some(percent);
        }
        for raw in &self.fixed_quantities {
            let (code, value) = split_assignment(raw)?;
            let quantity = value
                .parse::<u32>()
                .with_context(|| format!("fixed quantity for `{code}` is not a count: `{value}`"))?;
            selection_for(&mut selections, code).fixed_quantity = Some(quantity);
        }

        let quantity = if self.base_only { 1 } else { self.quantity };
        let mut request = CalculationRequest::new(&self.category, &self.item, quantity);
        if let Some(color) = &self.color {
            request = request.with_color(color);
        }
        for selection in selections {
            request = request.with_selection(selection);
        }
        if let Some(factor) = self.expedite {
            request = request.expedited(factor);
        }
        if let Some(discount) = self.discount {
            request = request.with_discount(discount);
        }
        Ok(request)
    }
}

fn selection_for<'a>(
    selections: &'a mut Vec<ModifierSelection>,
    code: &str,
) -> &'a mut ModifierSelection {
    let code = code.trim();
    let index = match selections.iter().position(|selection| selection.code.as_str() == code) {
        Some(index) => index,
        None => {
            selections.push(ModifierSelection::new(code));
            selections.len() - 1
        }
    };
    &mut selections[index]
}

fn split_assignment(raw: &str) -> anyhow::Result<(&str, &str)> {
    let (code, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected CODE=VALUE, got `{raw}`"))?;
    let code = code.trim();
    if code.is_empty() {
        return Err(anyhow!("modifier code is missing in `{raw}`"));
    }
    Ok((code, value.trim()))
}

pub fn run(args: PriceArgs) -> CommandResult {
    let request = match args.to_request() {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure("price", "invalid_arguments", format!("{error:#}"), 2);
        }
    };

    let (config, runtime) = match prepare("price") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let correlation_id = CalculationId::generate();
    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let outcome = price_request(&pool, &config, request, &correlation_id, &args).await;
        pool.close().await;
        outcome.map_err(|error| interface_failure(error.into_interface(&correlation_id.0)))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data("price", message, Some(data)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("price", error_class, message, exit_code)
        }
    }
}

async fn price_request(
    pool: &DbPool,
    config: &AppConfig,
    request: CalculationRequest,
    calculation_id: &CalculationId,
    args: &PriceArgs,
) -> Result<(String, Value), ApplicationError> {
    let snapshot = CatalogSnapshot::load(
        &SqlPriceListRepository::new(pool.clone()),
        &SqlModifierRepository::new(pool.clone()),
    )
    .await?;
    let engine = snapshot.into_engine(config.pricing.clone());
    let result = if args.base_only {
        engine.base_price_result(
            request.category_code.as_str(),
            &request.item_name,
            request.color(),
        )?
    } else {
        engine.calculate_price(&request)?
    };

    let message = format!(
        "{} x {} = {} ({} steps)",
        request.item_name,
        result.quantity,
        result.final_total_price,
        result.steps.len()
    );
    let mut data = json!({ "request": request, "result": result });

    if args.persist {
        let mut record = CalculationRecord::new(request, result);
        record.id = calculation_id.clone();
        SqlCalculationRepository::new(pool.clone()).save(record).await?;
        data["calculation_id"] = Value::String(calculation_id.0.clone());
    }

    tracing::info!(
        event_name = "pricing.cli.priced",
        correlation_id = %calculation_id.0,
        persisted = args.persist,
        base_only = args.base_only,
        "price command completed"
    );

    Ok((message, data))
}

fn interface_failure(error: InterfaceError) -> StepFailure {
    let (error_class, exit_code) = match &error {
        InterfaceError::BadRequest { .. } => ("invalid_request", 2u8),
        InterfaceError::NotFound { .. } => ("not_found", 7),
        InterfaceError::ServiceUnavailable { .. } => ("persistence", 5),
        InterfaceError::Internal { .. } => ("internal", 1),
    };
    let message =
        format!("{} {error} (correlation_id: {})", error.user_message(), error.correlation_id());
    (error_class, message, exit_code)
}
