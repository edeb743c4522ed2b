//! Types for the recommendation advisor

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::modifier::{ModifierCode, ModifierSelection};

/// How likely an issue is to survive or complicate cleaning
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Whether an issue is a stain or a physical defect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Stain,
    Defect,
}

/// Priority of a recommendation. Ordered from most to least urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

/// A known stain or defect type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
    /// Stable identifier, e.g. `blood`
    pub code: String,
    /// Display name as entered at intake
    pub name: String,
    pub kind: IssueKind,
    pub risk_level: RiskLevel,
}

impl IssueType {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        kind: IssueKind,
        risk_level: RiskLevel,
    ) -> Self {
        Self { code: code.into(), name: name.into(), kind, risk_level }
    }

    /// Matches on code or display name, ignoring case and surrounding whitespace
    pub fn matches(&self, reference: &str) -> bool {
        let reference = reference.trim();
        self.code.eq_ignore_ascii_case(reference) || self.name.eq_ignore_ascii_case(reference)
    }
}

/// Stains and defects observed on one item
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Price list category of the item
    pub category_code: String,
    /// Stain codes or names
    pub stains: Vec<String>,
    /// Defect codes or names
    pub defects: Vec<String>,
}

impl RecommendationRequest {
    pub fn new(category_code: impl Into<String>) -> Self {
        Self { category_code: category_code.into(), ..Self::default() }
    }

    pub fn with_stain(mut self, stain: impl Into<String>) -> Self {
        self.stains.push(stain.into());
        self
    }

    pub fn with_defect(mut self, defect: impl Into<String>) -> Self {
        self.defects.push(defect.into());
        self
    }
}

/// A modifier proposed for an item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierRecommendation {
    pub code: ModifierCode,
    pub name: String,
    /// Human-readable reason, naming the stain or defect
    pub reason: String,
    /// Suggested percent for range modifiers
    pub recommended_value: Option<Decimal>,
    pub priority: RecommendationPriority,
}

impl ModifierRecommendation {
    pub fn to_selection(&self) -> ModifierSelection {
        let selection = ModifierSelection::new(self.code.as_str());
        match self.recommended_value {
            Some(value) => selection.with_range_value(value),
            None => selection,
        }
    }
}

/// Advisor output: merged recommendations plus warnings for high-risk issues
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<ModifierRecommendation>,
    pub warnings: Vec<String>,
}

impl RecommendationReport {
    /// Selections ready to be added to a calculation request
    pub fn selections(&self) -> Vec<ModifierSelection> {
        self.recommendations.iter().map(ModifierRecommendation::to_selection).collect()
    }
}
