use rust_decimal::Decimal;

use crate::domain::calculation::{CalculationStep, PipelineStage};
use crate::domain::modifier::ModifierDefinition;

/// Append-only calculation trace. Step numbers start at 1 and are assigned on append.
#[derive(Clone, Debug, Default)]
pub struct CalculationTrace {
    steps: Vec<CalculationStep>,
}

impl CalculationTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        stage: PipelineStage,
        description: impl Into<String>,
        price_before: Decimal,
        price_after: Decimal,
    ) -> &CalculationStep {
        let step = self.next_step_number();
        self.push(CalculationStep {
            step,
            stage,
            stage_position: stage.position(),
            step_name: stage.step_name().to_string(),
            description: description.into(),
            modifier_name: None,
            modifier_code: None,
            modifier_value: None,
            price_before,
            price_after,
            price_difference: price_after - price_before,
        })
    }

    pub fn record_modifier(
        &mut self,
        stage: PipelineStage,
        definition: &ModifierDefinition,
        value_description: String,
        price_before: Decimal,
        price_after: Decimal,
    ) -> &CalculationStep {
        let step = self.next_step_number();
        self.push(CalculationStep {
            step,
            stage,
            stage_position: stage.position(),
            step_name: stage.step_name().to_string(),
            description: format!("{}: {}", definition.name, value_description),
            modifier_name: Some(definition.name.clone()),
            modifier_code: Some(definition.code.clone()),
            modifier_value: Some(value_description),
            price_before,
            price_after,
            price_difference: price_after - price_before,
        })
    }

    pub fn steps(&self) -> &[CalculationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<CalculationStep> {
        self.steps
    }

    fn next_step_number(&self) -> u32 {
        u32::try_from(self.steps.len()).map_or(u32::MAX, |count| count.saturating_add(1))
    }

    fn push(&mut self, step: CalculationStep) -> &CalculationStep {
        self.steps.push(step);
        &self.steps[self.steps.len() - 1]
    }
}
