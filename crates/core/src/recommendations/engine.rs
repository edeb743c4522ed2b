use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use super::types::{
    IssueKind, IssueType, ModifierRecommendation, RecommendationPriority, RecommendationReport,
    RecommendationRequest, RiskLevel,
};
use crate::domain::modifier::{ModifierCategory, ModifierCode, ModifierDefinition};
use crate::pricing::{modifier_category_for, ModifierCatalog};

pub const VERY_DIRTY_CODE: &str = "very_dirty_items";
pub const MANUAL_CLEANING_CODE: &str = "manual_cleaning";

#[derive(Debug, Clone, Copy)]
struct IssueSeed {
    code: &'static str,
    name: &'static str,
    kind: IssueKind,
    risk_level: RiskLevel,
}

const ISSUE_SEEDS: &[IssueSeed] = &[
    IssueSeed {
        code: "grease",
        name: "Grease",
        kind: IssueKind::Stain,
        risk_level: RiskLevel::Medium,
    },
    IssueSeed {
        code: "blood",
        name: "Blood",
        kind: IssueKind::Stain,
        risk_level: RiskLevel::High,
    },
    IssueSeed {
        code: "protein",
        name: "Protein",
        kind: IssueKind::Stain,
        risk_level: RiskLevel::Medium,
    },
    IssueSeed {
        code: "wine",
        name: "Wine",
        kind: IssueKind::Stain,
        risk_level: RiskLevel::High,
    },
    IssueSeed {
        code: "coffee",
        name: "Coffee",
        kind: IssueKind::Stain,
        risk_level: RiskLevel::Medium,
    },
    IssueSeed {
        code: "grass",
        name: "Grass",
        kind: IssueKind::Stain,
        risk_level: RiskLevel::Low,
    },
    IssueSeed {
        code: "ink",
        name: "Ink",
        kind: IssueKind::Stain,
        risk_level: RiskLevel::High,
    },
    IssueSeed {
        code: "cosmetics",
        name: "Cosmetics",
        kind: IssueKind::Stain,
        risk_level: RiskLevel::Low,
    },
    IssueSeed {
        code: "worn",
        name: "Worn",
        kind: IssueKind::Defect,
        risk_level: RiskLevel::Medium,
    },
    IssueSeed {
        code: "torn",
        name: "Torn",
        kind: IssueKind::Defect,
        risk_level: RiskLevel::High,
    },
    IssueSeed {
        code: "missing_hardware",
        name: "Missing hardware",
        kind: IssueKind::Defect,
        risk_level: RiskLevel::Low,
    },
    IssueSeed {
        code: "damaged_hardware",
        name: "Damaged hardware",
        kind: IssueKind::Defect,
        risk_level: RiskLevel::Medium,
    },
    IssueSeed {
        code: "color_change_risk",
        name: "Color change risk",
        kind: IssueKind::Defect,
        risk_level: RiskLevel::High,
    },
    IssueSeed {
        code: "deformation_risk",
        name: "Deformation risk",
        kind: IssueKind::Defect,
        risk_level: RiskLevel::High,
    },
];

pub fn standard_issue_types() -> Vec<IssueType> {
    ISSUE_SEEDS
        .iter()
        .map(|seed| IssueType::new(seed.code, seed.name, seed.kind, seed.risk_level))
        .collect()
}

struct ModifierRule {
    code: &'static str,
    recommended_value: Option<Decimal>,
    priority: RecommendationPriority,
}

fn rules_for(issue: &IssueType) -> Vec<ModifierRule> {
    let very_dirty = |percent: i64, priority| ModifierRule {
        code: VERY_DIRTY_CODE,
        recommended_value: Some(Decimal::from(percent)),
        priority,
    };
    let manual = |priority| ModifierRule {
        code: MANUAL_CLEANING_CODE,
        recommended_value: None,
        priority,
    };

    match (issue.kind, issue.risk_level) {
        (IssueKind::Stain, RiskLevel::High) => vec![
            very_dirty(70, RecommendationPriority::High),
            manual(RecommendationPriority::High),
        ],
        (IssueKind::Stain, RiskLevel::Medium) => vec![
            very_dirty(50, RecommendationPriority::Medium),
            manual(RecommendationPriority::Medium),
        ],
        (IssueKind::Stain, RiskLevel::Low) => vec![very_dirty(30, RecommendationPriority::Low)],
        (IssueKind::Defect, RiskLevel::High) => vec![manual(RecommendationPriority::High)],
        (IssueKind::Defect, RiskLevel::Medium) => vec![manual(RecommendationPriority::Medium)],
        (IssueKind::Defect, RiskLevel::Low) => Vec::new(),
    }
}

/// Proposes modifiers and risk warnings from the stains and defects found on an item.
pub struct RecommendationAdvisor<M> {
    modifiers: M,
    issues: Vec<IssueType>,
}

impl<M> RecommendationAdvisor<M> {
    pub fn new(modifiers: M, issues: Vec<IssueType>) -> Self {
        Self { modifiers, issues }
    }

    pub fn with_standard_issues(modifiers: M) -> Self {
        Self::new(modifiers, standard_issue_types())
    }

    pub fn issue_types(&self) -> &[IssueType] {
        &self.issues
    }

    fn find_issue(&self, kind: IssueKind, reference: &str) -> Option<&IssueType> {
        let found =
            self.issues.iter().find(|issue| issue.kind == kind && issue.matches(reference));
        if found.is_none() {
            debug!(
                event_name = "pricing.recommendation.unknown_issue",
                issue_kind = ?kind,
                reference,
                "ignoring unknown issue"
            );
        }
        found
    }
}

impl<M: ModifierCatalog> RecommendationAdvisor<M> {
    pub fn recommend(&self, request: &RecommendationRequest) -> RecommendationReport {
        let mut recommendations =
            self.recommend_for(IssueKind::Stain, &request.stains, &request.category_code);
        recommendations.extend(self.recommend_for(
            IssueKind::Defect,
            &request.defects,
            &request.category_code,
        ));

        RecommendationReport {
            recommendations: merge_by_priority(recommendations),
            warnings: self.risk_warnings(&request.stains, &request.defects),
        }
    }

    pub fn recommend_for_stains(
        &self,
        stains: &[String],
        category_code: &str,
    ) -> Vec<ModifierRecommendation> {
        merge_by_priority(self.recommend_for(IssueKind::Stain, stains, category_code))
    }

    pub fn recommend_for_defects(
        &self,
        defects: &[String],
        category_code: &str,
    ) -> Vec<ModifierRecommendation> {
        merge_by_priority(self.recommend_for(IssueKind::Defect, defects, category_code))
    }

    pub fn risk_warnings(&self, stains: &[String], defects: &[String]) -> Vec<String> {
        let stain_warnings = stains
            .iter()
            .filter_map(|stain| self.find_issue(IssueKind::Stain, stain))
            .filter(|issue| issue.risk_level == RiskLevel::High)
            .map(|issue| format!("Stains of type \"{}\" may not come out completely.", issue.name));
        let defect_warnings = defects
            .iter()
            .filter_map(|defect| self.find_issue(IssueKind::Defect, defect))
            .filter(|issue| issue.risk_level == RiskLevel::High)
            .map(|issue| {
                format!("The \"{}\" defect may cause complications during cleaning.", issue.name)
            });

        stain_warnings.chain(defect_warnings).collect()
    }

    fn recommend_for(
        &self,
        kind: IssueKind,
        references: &[String],
        category_code: &str,
    ) -> Vec<ModifierRecommendation> {
        let mut recommendations = Vec::new();

        for issue in references.iter().filter_map(|reference| self.find_issue(kind, reference)) {
            for rule in rules_for(issue) {
                let Some(definition) = self.resolve(rule.code) else {
                    continue;
                };
                if !is_category_compatible(&definition, category_code) {
                    continue;
                }
                recommendations.push(ModifierRecommendation {
                    code: definition.code.clone(),
                    name: definition.name.clone(),
                    reason: reason_for(issue),
                    recommended_value: rule.recommended_value,
                    priority: rule.priority,
                });
            }
        }

        recommendations
    }

    fn resolve(&self, code: &str) -> Option<ModifierDefinition> {
        self.modifiers.modifiers_by_codes(&[ModifierCode::from(code)]).into_iter().next()
    }
}

fn reason_for(issue: &IssueType) -> String {
    match issue.kind {
        IssueKind::Stain => format!("Recommended because of stain: {}", issue.name),
        IssueKind::Defect => format!("Recommended because of defect: {}", issue.name),
    }
}

fn is_category_compatible(definition: &ModifierDefinition, category_code: &str) -> bool {
    definition.category == ModifierCategory::General
        || definition.category == modifier_category_for(category_code)
}

/// One recommendation per modifier, keeping the highest priority (first seen on ties),
/// ordered by priority then code.
fn merge_by_priority(recommendations: Vec<ModifierRecommendation>) -> Vec<ModifierRecommendation> {
    let mut merged: BTreeMap<ModifierCode, ModifierRecommendation> = BTreeMap::new();

    for recommendation in recommendations {
        match merged.get(&recommendation.code) {
            Some(existing) if existing.priority <= recommendation.priority => {}
            _ => {
                merged.insert(recommendation.code.clone(), recommendation);
            }
        }
    }

    let mut merged: Vec<_> = merged.into_values().collect();
    merged.sort_by(|left, right| {
        left.priority.cmp(&right.priority).then_with(|| left.code.cmp(&right.code))
    });
    merged
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::RecommendationAdvisor;
    use crate::domain::modifier::{ModifierCategory, ModifierDefinition, ModifierKind};
    use crate::pricing::InMemoryModifierCatalog;
    use crate::recommendations::types::{RecommendationPriority, RecommendationRequest};

    fn advisor() -> RecommendationAdvisor<InMemoryModifierCatalog> {
        RecommendationAdvisor::with_standard_issues(InMemoryModifierCatalog::standard())
    }

    #[test]
    fn high_risk_stain_recommends_dirty_surcharge_and_manual_cleaning() {
        let request = RecommendationRequest::new("CLOTHING").with_stain("Blood");

        let report = advisor().recommend(&request);

        let codes: Vec<_> = report.recommendations.iter().map(|rec| rec.code.as_str()).collect();
        assert_eq!(codes, vec!["manual_cleaning", "very_dirty_items"]);
        assert!(report
            .recommendations
            .iter()
            .all(|rec| rec.priority == RecommendationPriority::High));
        let very_dirty = report
            .recommendations
            .iter()
            .find(|rec| rec.code.as_str() == "very_dirty_items")
            .and_then(|rec| rec.recommended_value);
        assert_eq!(very_dirty, Some(Decimal::from(70)));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn merge_keeps_highest_priority_per_modifier() {
        let stains = vec!["grass".to_string(), "wine".to_string()];

        let recommendations = advisor().recommend_for_stains(&stains, "CLOTHING");

        let very_dirty: Vec<_> = recommendations
            .iter()
            .filter(|rec| rec.code.as_str() == "very_dirty_items")
            .collect();
        assert_eq!(very_dirty.len(), 1);
        assert_eq!(very_dirty[0].priority, RecommendationPriority::High);
        assert_eq!(very_dirty[0].recommended_value, Some(Decimal::from(70)));
    }

    #[test]
    fn low_risk_defects_need_nothing_and_unknown_issues_are_ignored() {
        let report = advisor().recommend(
            &RecommendationRequest::new("LEATHER")
                .with_defect("missing_hardware")
                .with_stain("glitter"),
        );

        assert!(report.recommendations.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn incompatible_category_modifiers_are_filtered() {
        let catalog = InMemoryModifierCatalog::new([ModifierDefinition::new(
            "manual_cleaning",
            "Manual textile cleaning",
            ModifierKind::Percentage { percent: Decimal::from(20) },
            ModifierCategory::Textile,
        )]);
        let advisor = RecommendationAdvisor::with_standard_issues(catalog);

        let leather = advisor.recommend_for_defects(&["torn".to_string()], "LEATHER");
        let clothing = advisor.recommend_for_defects(&["torn".to_string()], "CLOTHING");

        assert!(leather.is_empty());
        assert_eq!(clothing.len(), 1);
    }

    #[test]
    fn report_converts_to_calculation_selections() {
        let request = RecommendationRequest::new("CLOTHING").with_stain("coffee");

        let report = advisor().recommend(&request);

        let selections = report.selections();
        let very_dirty = selections
            .iter()
            .find(|selection| selection.code.as_str() == "very_dirty_items")
            .and_then(|selection| selection.range_value);
        assert_eq!(very_dirty, Some(Decimal::from(50)));
    }
}
