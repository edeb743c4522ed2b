use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::modifier::{ModifierCode, ModifierSelection};
use crate::domain::price_list::CategoryCode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub category_code: CategoryCode,
    pub item_name: String,
    pub quantity: u32,
    pub color: Option<String>,
    pub modifier_codes: Vec<ModifierCode>,
    pub range_modifier_values: BTreeMap<ModifierCode, Decimal>,
    pub fixed_modifier_quantities: BTreeMap<ModifierCode, u32>,
    pub expedited: bool,
    pub expedite_factor: Decimal,
    pub discount_percent: Decimal,
}

impl CalculationRequest {
    pub fn new(
        category_code: impl Into<String>,
        item_name: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            category_code: CategoryCode(category_code.into()),
            item_name: item_name.into(),
            quantity,
            color: None,
            modifier_codes: Vec::new(),
            range_modifier_values: BTreeMap::new(),
            fixed_modifier_quantities: BTreeMap::new(),
            expedited: false,
            expedite_factor: Decimal::ZERO,
            discount_percent: Decimal::ZERO,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_modifier(self, code: impl Into<String>) -> Self {
        self.with_selection(ModifierSelection::new(code))
    }

    pub fn with_selection(mut self, selection: ModifierSelection) -> Self {
        if let Some(range_value) = selection.range_value {
            self.range_modifier_values.insert(selection.code.clone(), range_value);
        }
        if let Some(quantity) = selection.fixed_quantity {
            self.fixed_modifier_quantities.insert(selection.code.clone(), quantity);
        }
        self.modifier_codes.push(selection.code);
        self
    }

    pub fn expedited(mut self, factor_percent: Decimal) -> Self {
        self.expedited = true;
        self.expedite_factor = factor_percent;
        self
    }

    pub fn with_discount(mut self, discount_percent: Decimal) -> Self {
        self.discount_percent = discount_percent;
        self
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn range_value(&self, code: &ModifierCode) -> Option<Decimal> {
        self.range_modifier_values.get(code).copied()
    }

    pub fn fixed_quantity(&self, code: &ModifierCode) -> Option<u32> {
        self.fixed_modifier_quantities.get(code).copied()
    }
}

/// Position of a step in the pricing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    BasePrice,
    ColorModifier,
    SpecialModifier,
    PercentageModifiers,
    FixedServices,
    Expedite,
    Discount,
    Rounding,
}

impl PipelineStage {
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::BasePrice => "Base price",
            Self::ColorModifier => "Color check",
            Self::SpecialModifier => "Special modifiers",
            Self::PercentageModifiers => "Percentage modifiers",
            Self::FixedServices => "Fixed services",
            Self::Expedite => "Expedite",
            Self::Discount => "Discount",
            Self::Rounding => "Rounding",
        }
    }

    /// Fixed 1-based slot of the stage in the pipeline, independent of which stages ran.
    pub fn position(&self) -> u32 {
        match self {
            Self::BasePrice => 1,
            Self::ColorModifier => 2,
            Self::SpecialModifier => 3,
            Self::PercentageModifiers => 4,
            Self::FixedServices => 5,
            Self::Expedite => 6,
            Self::Discount => 7,
            Self::Rounding => 8,
        }
    }
}

/// One row of the calculation trace.
///
/// `step` is the sequential index within this trace; `stage_position` is the stage's
/// fixed slot, so a discount is always position 7 even when earlier stages were skipped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationStep {
    pub step: u32,
    pub stage: PipelineStage,
    pub stage_position: u32,
    pub step_name: String,
    pub description: String,
    pub modifier_name: Option<String>,
    pub modifier_code: Option<ModifierCode>,
    pub modifier_value: Option<String>,
    pub price_before: Decimal,
    pub price_after: Decimal,
    pub price_difference: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub base_unit_price: Decimal,
    pub quantity: u32,
    pub base_total_price: Decimal,
    pub final_unit_price: Decimal,
    pub final_total_price: Decimal,
    pub total_modifier_impact: Decimal,
    pub unit_of_measure: String,
    pub steps: Vec<CalculationStep>,
}

impl CalculationResult {
    pub fn steps_for(&self, stage: PipelineStage) -> impl Iterator<Item = &CalculationStep> + '_ {
        self.steps.iter().filter(move |step| step.stage == stage)
    }

    pub fn applied_modifier_codes(&self) -> Vec<&ModifierCode> {
        self.steps.iter().filter_map(|step| step.modifier_code.as_ref()).collect()
    }
}
