use rust_decimal::Decimal;

use crate::domain::modifier::{midpoint, signed_percent, ModifierKind};
use crate::errors::PricingError;

/// Caller-supplied parameter for a single modifier application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierParameter {
    Default,
    RangeValue(Decimal),
    Quantity(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeSource {
    Requested,
    Clamped,
    Midpoint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeResolution {
    pub percent: Decimal,
    pub source: RangeSource,
}

/// Picks the percent for a range modifier: the requested value clamped to the bounds,
/// or the midpoint when nothing was requested.
pub fn resolve_range_percent(
    min_percent: Decimal,
    max_percent: Decimal,
    requested: Option<Decimal>,
) -> RangeResolution {
    match requested {
        Some(value) if value < min_percent => {
            RangeResolution { percent: min_percent, source: RangeSource::Clamped }
        }
        Some(value) if value > max_percent => {
            RangeResolution { percent: max_percent, source: RangeSource::Clamped }
        }
        Some(value) => RangeResolution { percent: value, source: RangeSource::Requested },
        None => RangeResolution {
            percent: midpoint(min_percent, max_percent),
            source: RangeSource::Midpoint,
        },
    }
}

pub fn apply_percentage(price: Decimal, percent: Decimal) -> Result<Decimal, PricingError> {
    Decimal::ONE_HUNDRED
        .checked_add(percent)
        .and_then(|factor| price.checked_mul(factor))
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| PricingError::overflow(format!("{price} adjusted by {percent}%")))
}

pub fn floor_at(price: Decimal, min_price: Decimal) -> Decimal {
    price.max(min_price)
}

/// Applies one modifier to the running unit price. The result never drops below `min_price`.
pub fn apply_modifier(
    price: Decimal,
    kind: &ModifierKind,
    parameter: ModifierParameter,
    min_price: Decimal,
) -> Result<Decimal, PricingError> {
    let next = match kind {
        ModifierKind::Percentage { percent } => apply_percentage(price, *percent)?,
        ModifierKind::RangePercentage { min_percent, max_percent } => {
            let resolved =
                resolve_range_percent(*min_percent, *max_percent, requested_range(parameter));
            apply_percentage(price, resolved.percent)?
        }
        ModifierKind::Fixed { amount } => *amount,
        ModifierKind::Addition { amount } => {
            let quantity = effective_quantity(parameter);
            amount
                .checked_mul(Decimal::from(quantity))
                .and_then(|extra| price.checked_add(extra))
                .ok_or_else(|| {
                    PricingError::overflow(format!("{price} plus {amount} x {quantity}"))
                })?
        }
    };

    Ok(floor_at(next, min_price))
}

/// Trace text for the value a modifier was applied with, e.g. `+60% (range 20-100%)`.
pub fn describe_application(kind: &ModifierKind, parameter: ModifierParameter) -> String {
    match kind {
        ModifierKind::Percentage { percent } => signed_percent(*percent),
        ModifierKind::RangePercentage { min_percent, max_percent } => {
            let resolved =
                resolve_range_percent(*min_percent, *max_percent, requested_range(parameter));
            format!(
                "{} (range {}-{}%)",
                signed_percent(resolved.percent),
                min_percent.normalize(),
                max_percent.normalize()
            )
        }
        ModifierKind::Fixed { amount } => format!("fixed {amount:.2}"),
        ModifierKind::Addition { amount } => {
            format!("+{amount:.2} x {}", effective_quantity(parameter))
        }
    }
}

fn requested_range(parameter: ModifierParameter) -> Option<Decimal> {
    match parameter {
        ModifierParameter::RangeValue(value) => Some(value),
        _ => None,
    }
}

// A missing or zero quantity counts as one unit.
fn effective_quantity(parameter: ModifierParameter) -> u32 {
    match parameter {
        ModifierParameter::Quantity(quantity) => quantity.max(1),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        apply_modifier, apply_percentage, describe_application, resolve_range_percent,
        ModifierParameter, RangeSource,
    };
    use crate::domain::modifier::ModifierKind;
    use crate::errors::PricingError;

    fn min_price() -> Decimal {
        Decimal::ONE
    }

    fn range() -> ModifierKind {
        ModifierKind::RangePercentage {
            min_percent: Decimal::from(20),
            max_percent: Decimal::from(100),
        }
    }

    #[test]
    fn percentage_scales_running_price() -> Result<(), PricingError> {
        let kind = ModifierKind::Percentage { percent: Decimal::from(20) };

        let price =
            apply_modifier(Decimal::from(100), &kind, ModifierParameter::Default, min_price())?;

        assert_eq!(price, Decimal::from(120));
        Ok(())
    }

    #[test]
    fn range_uses_midpoint_without_caller_value() -> Result<(), PricingError> {
        let price =
            apply_modifier(Decimal::from(100), &range(), ModifierParameter::Default, min_price())?;

        assert_eq!(price, Decimal::from(160));
        assert_eq!(
            describe_application(&range(), ModifierParameter::Default),
            "+60% (range 20-100%)"
        );
        Ok(())
    }

    #[test]
    fn range_value_is_clamped_to_bounds() -> Result<(), PricingError> {
        let resolution =
            resolve_range_percent(Decimal::from(20), Decimal::from(100), Some(Decimal::from(150)));
        assert_eq!(resolution.percent, Decimal::from(100));
        assert_eq!(resolution.source, RangeSource::Clamped);

        let price = apply_modifier(
            Decimal::from(100),
            &range(),
            ModifierParameter::RangeValue(Decimal::from(5)),
            min_price(),
        )?;
        assert_eq!(price, Decimal::from(120));
        Ok(())
    }

    #[test]
    fn fixed_replaces_and_addition_scales_with_quantity() -> Result<(), PricingError> {
        let fixed = ModifierKind::Fixed { amount: Decimal::from(250) };
        let addition = ModifierKind::Addition { amount: Decimal::from(10) };

        assert_eq!(
            apply_modifier(Decimal::from(100), &fixed, ModifierParameter::Default, min_price())?,
            Decimal::from(250)
        );
        let three = ModifierParameter::Quantity(3);
        let zero = ModifierParameter::Quantity(0);
        assert_eq!(
            apply_modifier(Decimal::from(100), &addition, three, min_price())?,
            Decimal::from(130)
        );
        assert_eq!(
            apply_modifier(Decimal::from(100), &addition, zero, min_price())?,
            Decimal::from(110)
        );
        assert_eq!(describe_application(&addition, ModifierParameter::Quantity(3)), "+10.00 x 3");
        Ok(())
    }

    #[test]
    fn results_never_fall_below_min_price() -> Result<(), PricingError> {
        let full_discount = ModifierKind::Percentage { percent: Decimal::from(-100) };
        let zero_fixed = ModifierKind::Fixed { amount: Decimal::ZERO };

        let default = ModifierParameter::Default;
        assert_eq!(
            apply_modifier(Decimal::from(50), &full_discount, default, min_price())?,
            Decimal::ONE
        );
        assert_eq!(
            apply_modifier(Decimal::from(50), &zero_fixed, default, min_price())?,
            Decimal::ONE
        );
        Ok(())
    }

    #[test]
    fn oversized_percentage_reports_overflow() {
        let surcharge = apply_percentage(Decimal::MAX, Decimal::from(50));

        assert!(matches!(surcharge, Err(PricingError::Overflow(_))));
        assert_eq!(
            apply_percentage(Decimal::from(200), Decimal::from(-10)),
            Ok(Decimal::from(180))
        );
    }

    #[test]
    fn huge_addition_quantity_reports_overflow() {
        let addition = ModifierKind::Addition { amount: Decimal::MAX };

        let result = apply_modifier(
            Decimal::from(100),
            &addition,
            ModifierParameter::Quantity(u32::MAX),
            min_price(),
        );

        assert!(matches!(result, Err(PricingError::Overflow(_))));
    }

    #[test]
    fn midpoint_of_extreme_bounds_stays_representable() {
        let widest = resolve_range_percent(Decimal::MIN, Decimal::MAX, None);
        let pinned = resolve_range_percent(Decimal::MAX, Decimal::MAX, None);

        assert_eq!(widest.percent, Decimal::ZERO);
        assert_eq!(widest.source, RangeSource::Midpoint);
        assert_eq!(pinned.percent, Decimal::MAX);
    }
}
