use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::PricingError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModifierCode(pub String);

impl ModifierCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModifierCode {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ModifierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierCategory {
    General,
    Textile,
    Leather,
}

impl ModifierCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Textile => "TEXTILE",
            Self::Leather => "LEATHER",
        }
    }
}

impl FromStr for ModifierCategory {
    type Err = PricingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GENERAL" => Ok(Self::General),
            "TEXTILE" => Ok(Self::Textile),
            "LEATHER" => Ok(Self::Leather),
            other => Err(PricingError::InvalidModifier {
                code: String::new(),
                reason: format!("unknown modifier category `{other}`"),
            }),
        }
    }
}

/// Persisted discriminant of [`ModifierKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierType {
    Percentage,
    RangePercentage,
    Fixed,
    Addition,
}

impl ModifierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "PERCENTAGE",
            Self::RangePercentage => "RANGE_PERCENTAGE",
            Self::Fixed => "FIXED",
            Self::Addition => "ADDITION",
        }
    }
}

impl FromStr for ModifierType {
    type Err = PricingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PERCENTAGE" => Ok(Self::Percentage),
            "RANGE_PERCENTAGE" => Ok(Self::RangePercentage),
            "FIXED" => Ok(Self::Fixed),
            "ADDITION" => Ok(Self::Addition),
            other => Err(PricingError::InvalidModifier {
                code: String::new(),
                reason: format!("unknown modifier type `{other}`"),
            }),
        }
    }
}

/// Arithmetic of a modifier together with the parameters that arithmetic needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierKind {
    Percentage { percent: Decimal },
    RangePercentage { min_percent: Decimal, max_percent: Decimal },
    Fixed { amount: Decimal },
    Addition { amount: Decimal },
}

impl ModifierKind {
    /// Rebuilds a kind from its flat persisted columns.
    pub fn from_parts(
        modifier_type: ModifierType,
        value: Decimal,
        min_value: Option<Decimal>,
        max_value: Option<Decimal>,
    ) -> Result<Self, PricingError> {
        match modifier_type {
            ModifierType::Percentage => Ok(Self::Percentage { percent: value }),
            ModifierType::RangePercentage => match (min_value, max_value) {
                (Some(min_percent), Some(max_percent)) if min_percent <= max_percent => {
                    Ok(Self::RangePercentage { min_percent, max_percent })
                }
                (Some(_), Some(_)) => Err(PricingError::InvalidModifier {
                    code: String::new(),
                    reason: "range minimum exceeds maximum".to_string(),
                }),
                _ => Err(PricingError::InvalidModifier {
                    code: String::new(),
                    reason: "range modifiers require min_value and max_value".to_string(),
                }),
            },
            ModifierType::Fixed => Ok(Self::Fixed { amount: value }),
            ModifierType::Addition => Ok(Self::Addition { amount: value }),
        }
    }

    pub fn modifier_type(&self) -> ModifierType {
        match self {
            Self::Percentage { .. } => ModifierType::Percentage,
            Self::RangePercentage { .. } => ModifierType::RangePercentage,
            Self::Fixed { .. } => ModifierType::Fixed,
            Self::Addition { .. } => ModifierType::Addition,
        }
    }

    /// Flat `value` column: the percent or amount, or the range midpoint.
    pub fn value(&self) -> Decimal {
        match self {
            Self::Percentage { percent } => *percent,
            Self::RangePercentage { .. } => self.range_midpoint().unwrap_or_default(),
            Self::Fixed { amount } | Self::Addition { amount } => *amount,
        }
    }

    pub fn min_value(&self) -> Option<Decimal> {
        match self {
            Self::RangePercentage { min_percent, .. } => Some(*min_percent),
            _ => None,
        }
    }

    pub fn max_value(&self) -> Option<Decimal> {
        match self {
            Self::RangePercentage { max_percent, .. } => Some(*max_percent),
            _ => None,
        }
    }

    pub fn range_midpoint(&self) -> Option<Decimal> {
        match self {
            Self::RangePercentage { min_percent, max_percent } => {
                Some(midpoint(*min_percent, *max_percent))
            }
            _ => None,
        }
    }

    pub fn is_percentage_class(&self) -> bool {
        matches!(self, Self::Percentage { .. } | Self::RangePercentage { .. })
    }

    pub fn is_fixed_class(&self) -> bool {
        matches!(self, Self::Fixed { .. } | Self::Addition { .. })
    }

    /// Short human description of the change, e.g. `+20%` or `+10.00`.
    pub fn change_description(&self) -> String {
        match self {
            Self::Percentage { percent } => signed_percent(*percent),
            Self::RangePercentage { min_percent, max_percent } => {
                format!("{} to {}", signed_percent(*min_percent), signed_percent(*max_percent))
            }
            Self::Fixed { amount } => format!("fixed {amount:.2}"),
            Self::Addition { amount } => format!("+{amount:.2}"),
        }
    }
}

pub fn signed_percent(percent: Decimal) -> String {
    let percent = percent.normalize();
    if percent > Decimal::ZERO {
        format!("+{percent}%")
    } else {
        format!("{percent}%")
    }
}

/// Midpoint of `[min, max]` without overflowing at the edges of the decimal range.
pub fn midpoint(min: Decimal, max: Decimal) -> Decimal {
    match max.checked_sub(min) {
        Some(span) => min + span / Decimal::TWO,
        None => min / Decimal::TWO + max / Decimal::TWO,
    }
}

/// A named pricing rule. Reference data; immutable for the duration of a calculation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierDefinition {
    pub code: ModifierCode,
    pub name: String,
    pub description: String,
    pub kind: ModifierKind,
    pub category: ModifierCategory,
    pub active: bool,
    pub sort_order: i32,
}

impl ModifierDefinition {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        kind: ModifierKind,
        category: ModifierCategory,
    ) -> Self {
        Self {
            code: ModifierCode(code.into()),
            name: name.into(),
            description: String::new(),
            kind,
            category,
            active: true,
            sort_order: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn change_description(&self) -> String {
        self.kind.change_description()
    }
}

/// A modifier the caller wants applied, with its optional per-type parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSelection {
    pub code: ModifierCode,
    pub range_value: Option<Decimal>,
    pub fixed_quantity: Option<u32>,
}

impl ModifierSelection {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: ModifierCode(code.into()), range_value: None, fixed_quantity: None }
    }

    pub fn with_range_value(mut self, percent: Decimal) -> Self {
        self.range_value = Some(percent);
        self
    }

    pub fn with_fixed_quantity(mut self, quantity: u32) -> Self {
        self.fixed_quantity = Some(quantity);
        self
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{ModifierKind, ModifierType};

    #[test]
    fn range_kind_requires_ordered_bounds() {
        let ok = ModifierKind::from_parts(
            ModifierType::RangePercentage,
            Decimal::ZERO,
            Some(Decimal::from(20)),
            Some(Decimal::from(100)),
        );
        assert_eq!(
            ok,
            Ok(ModifierKind::RangePercentage {
                min_percent: Decimal::from(20),
                max_percent: Decimal::from(100),
            })
        );

        let inverted = ModifierKind::from_parts(
            ModifierType::RangePercentage,
            Decimal::ZERO,
            Some(Decimal::from(100)),
            Some(Decimal::from(20)),
        );
        assert!(inverted.is_err());

        let missing =
            ModifierKind::from_parts(ModifierType::RangePercentage, Decimal::ZERO, None, None);
        assert!(missing.is_err());
    }

    #[test]
    fn change_descriptions_are_signed() {
        let surcharge = ModifierKind::Percentage { percent: Decimal::from(20) };
        let discount = ModifierKind::Percentage { percent: Decimal::from(-30) };
        assert_eq!(surcharge.change_description(), "+20%");
        assert_eq!(discount.change_description(), "-30%");
        assert_eq!(
            ModifierKind::RangePercentage {
                min_percent: Decimal::from(20),
                max_percent: Decimal::from(100),
            }
            .change_description(),
            "+20% to +100%"
        );
        assert_eq!(
            ModifierKind::Addition { amount: Decimal::new(1000, 2) }.change_description(),
            "+10.00"
        );
        let fixed = ModifierKind::Fixed { amount: Decimal::from(10) };
        assert_eq!(fixed.change_description(), "fixed 10.00");
    }

    #[test]
    fn midpoint_is_exact() {
        let kind = ModifierKind::RangePercentage {
            min_percent: Decimal::from(25),
            max_percent: Decimal::from(50),
        };
        assert_eq!(kind.range_midpoint(), Some(Decimal::new(375, 1)));
        assert_eq!(kind.modifier_type().as_str(), "RANGE_PERCENTAGE");
    }
}
