use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::config::PricingConfig;
use crate::domain::calculation::{CalculationRequest, CalculationStep, PipelineStage};
use crate::domain::modifier::{signed_percent, ModifierDefinition, ModifierKind};
use crate::domain::price_list::{is_color, COLOR_BLACK, COLOR_WHITE};
use crate::errors::PricingError;
use crate::pricing::apply::{
    apply_modifier, apply_percentage, describe_application, floor_at, resolve_range_percent,
    ModifierParameter, RangeSource,
};
use crate::pricing::trace::CalculationTrace;

/// Resolved modifiers split by the pipeline stage that owns them.
///
/// Reserved codes only ever run at their own stage, even when that stage's
/// precondition does not hold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModifierPartition<'a> {
    pub color: Option<&'a ModifierDefinition>,
    pub special: Option<&'a ModifierDefinition>,
    pub percentage: Vec<&'a ModifierDefinition>,
    pub fixed: Vec<&'a ModifierDefinition>,
}

impl<'a> ModifierPartition<'a> {
    pub fn split(
        modifiers: &'a [ModifierDefinition],
        color_modifier_code: &str,
        special_override_code: &str,
    ) -> Self {
        let mut partition = Self::default();

        for definition in modifiers {
            let code = definition.code.as_str();
            if code == color_modifier_code {
                partition.color.get_or_insert(definition);
            } else if code == special_override_code {
                partition.special.get_or_insert(definition);
            } else if definition.kind.is_percentage_class() {
                partition.percentage.push(definition);
            } else {
                partition.fixed.push(definition);
            }
        }

        partition
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Catalog price after the minimum-price floor.
    pub base_unit_price: Decimal,
    pub final_unit_price: Decimal,
    pub steps: Vec<CalculationStep>,
}

struct PipelineContext<'a> {
    request: &'a CalculationRequest,
    partition: ModifierPartition<'a>,
    can_expedite: bool,
    config: &'a PricingConfig,
}

type StageResult = Result<Decimal, PricingError>;
type StageFn =
    fn(&PipelineContext<'_>, PipelineStage, Decimal, &mut CalculationTrace) -> StageResult;

const STAGES: [(PipelineStage, StageFn); 7] = [
    (PipelineStage::ColorModifier, color_stage),
    (PipelineStage::SpecialModifier, special_stage),
    (PipelineStage::PercentageModifiers, percentage_stage),
    (PipelineStage::FixedServices, fixed_stage),
    (PipelineStage::Expedite, expedite_stage),
    (PipelineStage::Discount, discount_stage),
    (PipelineStage::Rounding, rounding_stage),
];

/// Runs the unit price through every stage in a fixed order, recording one trace step
/// per change.
#[derive(Clone, Debug, Default)]
pub struct ModifierPipeline {
    config: PricingConfig,
}

impl ModifierPipeline {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn run(
        &self,
        base_price: Decimal,
        modifiers: &[ModifierDefinition],
        request: &CalculationRequest,
        can_expedite: bool,
    ) -> Result<PipelineOutcome, PricingError> {
        let context = PipelineContext {
            request,
            partition: ModifierPartition::split(
                modifiers,
                &self.config.color_modifier_code,
                &self.config.special_override_code,
            ),
            can_expedite,
            config: &self.config,
        };

        let base_unit_price = floor_at(base_price, self.config.min_price);
        let mut description = format!("{} ({})", request.item_name, request.category_code);
        if base_unit_price > base_price {
            debug!(
                event_name = "pricing.calculation.base_price_floored",
                catalog_price = %base_price,
                min_price = %self.config.min_price,
                "catalog price below the minimum price"
            );
            description.push_str(", raised to the minimum price");
        }

        let mut trace = CalculationTrace::new();
        trace.record(PipelineStage::BasePrice, description, Decimal::ZERO, base_unit_price);

        let final_unit_price = STAGES.iter().try_fold(base_unit_price, |price, (stage, run)| {
            run(&context, *stage, price, &mut trace)
        })?;

        Ok(PipelineOutcome { base_unit_price, final_unit_price, steps: trace.into_steps() })
    }
}

fn parameter_for(
    definition: &ModifierDefinition,
    request: &CalculationRequest,
) -> ModifierParameter {
    match definition.kind {
        ModifierKind::RangePercentage { .. } => request
            .range_value(&definition.code)
            .map_or(ModifierParameter::Default, ModifierParameter::RangeValue),
        ModifierKind::Fixed { .. } | ModifierKind::Addition { .. } => request
            .fixed_quantity(&definition.code)
            .map_or(ModifierParameter::Default, ModifierParameter::Quantity),
        ModifierKind::Percentage { .. } => ModifierParameter::Default,
    }
}

fn apply_and_record(
    context: &PipelineContext<'_>,
    stage: PipelineStage,
    definition: &ModifierDefinition,
    price: Decimal,
    trace: &mut CalculationTrace,
) -> StageResult {
    let parameter = parameter_for(definition, context.request);
    log_range_resolution(definition, parameter);

    let next = apply_modifier(price, &definition.kind, parameter, context.config.min_price)
        .map_err(|error| error.for_modifier(definition.code.as_str()))?;
    trace.record_modifier(
        stage,
        definition,
        describe_application(&definition.kind, parameter),
        price,
        next,
    );
    Ok(next)
}

fn log_range_resolution(definition: &ModifierDefinition, parameter: ModifierParameter) {
    let ModifierKind::RangePercentage { min_percent, max_percent } = definition.kind else {
        return;
    };
    let requested = match parameter {
        ModifierParameter::RangeValue(value) => Some(value),
        _ => None,
    };

    let resolution = resolve_range_percent(min_percent, max_percent, requested);
    match resolution.source {
        RangeSource::Clamped => warn!(
            event_name = "pricing.modifier.range_clamped",
            modifier_code = %definition.code,
            requested = ?requested,
            applied = %resolution.percent,
            "range value outside modifier bounds, clamped"
        ),
        RangeSource::Midpoint => debug!(
            event_name = "pricing.modifier.range_defaulted",
            modifier_code = %definition.code,
            applied = %resolution.percent,
            "no range value supplied, using midpoint"
        ),
        RangeSource::Requested => {}
    }
}

fn color_stage(
    context: &PipelineContext<'_>,
    stage: PipelineStage,
    price: Decimal,
    trace: &mut CalculationTrace,
) -> StageResult {
    let Some(definition) = context.partition.color else {
        return Ok(price);
    };

    let qualifies = context
        .request
        .color()
        .is_some_and(|color| is_color(color, COLOR_BLACK) || is_color(color, COLOR_WHITE));
    if !qualifies {
        debug!(
            event_name = "pricing.modifier.color_skipped",
            modifier_code = %definition.code,
            color = ?context.request.color(),
            "color modifier selected for an item that is neither black nor white"
        );
        return Ok(price);
    }

    apply_and_record(context, stage, definition, price, trace)
}

fn special_stage(
    context: &PipelineContext<'_>,
    stage: PipelineStage,
    price: Decimal,
    trace: &mut CalculationTrace,
) -> StageResult {
    match context.partition.special {
        Some(definition) => apply_and_record(context, stage, definition, price, trace),
        None => Ok(price),
    }
}

fn percentage_stage(
    context: &PipelineContext<'_>,
    stage: PipelineStage,
    price: Decimal,
    trace: &mut CalculationTrace,
) -> StageResult {
    context.partition.percentage.iter().try_fold(price, |price, definition| {
        apply_and_record(context, stage, definition, price, trace)
    })
}

fn fixed_stage(
    context: &PipelineContext<'_>,
    stage: PipelineStage,
    price: Decimal,
    trace: &mut CalculationTrace,
) -> StageResult {
    context.partition.fixed.iter().try_fold(price, |price, definition| {
        apply_and_record(context, stage, definition, price, trace)
    })
}

fn expedite_stage(
    context: &PipelineContext<'_>,
    stage: PipelineStage,
    price: Decimal,
    trace: &mut CalculationTrace,
) -> StageResult {
    let request = context.request;
    if !request.expedited {
        return Ok(price);
    }

    if !context.can_expedite {
        trace.record(
            stage,
            format!("Expedite is not available for category {}", request.category_code),
            price,
            price,
        );
        return Ok(price);
    }

    if request.expedite_factor <= Decimal::ZERO {
        return Ok(price);
    }

    let next =
        floor_at(apply_percentage(price, request.expedite_factor)?, context.config.min_price);
    let description = format!("Expedite {}", signed_percent(request.expedite_factor));
    trace.record(stage, description, price, next);
    Ok(next)
}

fn discount_stage(
    context: &PipelineContext<'_>,
    stage: PipelineStage,
    price: Decimal,
    trace: &mut CalculationTrace,
) -> StageResult {
    let discount = context.request.discount_percent;
    if discount <= Decimal::ZERO {
        return Ok(price);
    }

    let next = floor_at(apply_percentage(price, -discount)?, context.config.min_price);
    trace.record(stage, format!("Discount {}", signed_percent(-discount)), price, next);
    Ok(next)
}

fn rounding_stage(
    context: &PipelineContext<'_>,
    stage: PipelineStage,
    price: Decimal,
    trace: &mut CalculationTrace,
) -> StageResult {
    let scale = context.config.scale;
    let rounded = price.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    let next = floor_at(rounded, context.config.min_price);

    let description = if next > rounded {
        format!("Rounded to {scale} decimal places and raised to the minimum price")
    } else {
        format!("Rounded to {scale} decimal places")
    };
    trace.record(stage, description, price, next);
    Ok(next)
}
