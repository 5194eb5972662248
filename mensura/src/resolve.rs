//! Strategy selection and evaluation
//!
//! Strategies are tried in a fixed priority order; the first one that
//! applies wins:
//!
//! 1. Role formula: role-keyed categories (temperature) need an exact
//!    `<role>_to_<role>` formula and never fall back.
//! 2. Direct formula: `<from>_to_<to>` evaluated at the input.
//! 3. Reverse formula: `<to>_to_<from>` evaluated at `1` gives a scale
//!    factor `f`; the result is `input / f`. Only correct for linear
//!    formulas.
//! 4. Ratio: `input * ratio(to) / ratio(from)`.

use crate::formula::Formula;
use mensura_catalog::{formula_key, CategoryDef, CategoryKind};
use mensura_core::ConversionError;
use serde::{Deserialize, Serialize};

/// Which strategy produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RoleFormula,
    DirectFormula,
    ReverseFormula,
    Ratio,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::RoleFormula => "role_formula",
            StrategyKind::DirectFormula => "direct_formula",
            StrategyKind::ReverseFormula => "reverse_formula",
            StrategyKind::Ratio => "ratio",
        }
    }
}

/// A selected strategy, borrowing formula text from the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy<'a> {
    RoleFormula { key: String, formula: &'a str },
    DirectFormula { key: String, formula: &'a str },
    ReverseFormula { key: String, formula: &'a str },
    Ratio { from: f64, to: f64 },
}

impl Strategy<'_> {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::RoleFormula { .. } => StrategyKind::RoleFormula,
            Strategy::DirectFormula { .. } => StrategyKind::DirectFormula,
            Strategy::ReverseFormula { .. } => StrategyKind::ReverseFormula,
            Strategy::Ratio { .. } => StrategyKind::Ratio,
        }
    }

    /// Compute the unrounded result for `value`
    pub fn evaluate(&self, value: f64) -> Result<f64, ConversionError> {
        let raw = match self {
            Strategy::RoleFormula { key, formula } | Strategy::DirectFormula { key, formula } => {
                eval_formula(key, formula, value)?
            }
            Strategy::ReverseFormula { key, formula } => {
                let factor = eval_formula(key, formula, 1.0)?;
                if factor == 0.0 {
                    return Err(ConversionError::malformed_formula(
                        key,
                        formula,
                        "reverse scale factor at 1 is zero",
                    ));
                }
                value / factor
            }
            Strategy::Ratio { from, to } => value * (to / from),
        };

        if !raw.is_finite() {
            return Err(ConversionError::overflow());
        }
        Ok(raw)
    }
}

fn eval_formula(key: &str, source: &str, value: f64) -> Result<f64, ConversionError> {
    Formula::parse(source)
        .and_then(|f| f.eval(value))
        .map_err(|e| ConversionError::malformed_formula(key, source, e.to_string()))
}

/// Pick the strategy for a unit pair
///
/// Both units are expected to exist in `category`; request validation
/// guarantees it.
pub fn select_strategy<'a>(
    category: &'a CategoryDef,
    from: &str,
    to: &str,
) -> Result<Strategy<'a>, ConversionError> {
    if category.kind() == CategoryKind::Role {
        let (from_role, to_role) = match (category.role(from), category.role(to)) {
            (Some(f), Some(t)) => (f, t),
            _ => {
                let err = ConversionError::no_conversion_path(category.name(), &formula_key(from, to));
                return Err(err.with_note("both units need a role tag"));
            }
        };
        let key = formula_key(from_role, to_role);
        return match category.formula(&key) {
            Some(formula) => Ok(Strategy::RoleFormula { key, formula }),
            None => Err(ConversionError::no_conversion_path(category.name(), &key)),
        };
    }

    if category.has_formulas() {
        let key = formula_key(from, to);
        if let Some(formula) = category.formula(&key) {
            return Ok(Strategy::DirectFormula { key, formula });
        }
        let reverse = formula_key(to, from);
        if let Some(formula) = category.formula(&reverse) {
            return Ok(Strategy::ReverseFormula { key: reverse, formula });
        }
    }

    // Loaded catalogs never hold zero or non-finite ratios; hand-built ones might
    let ratio = |unit: &str| match category.ratio(unit) {
        Some(r) if r.is_finite() && r != 0.0 => Ok(r),
        Some(_) => Err(ConversionError::no_ratio(category.name(), unit)
            .with_note("ratio must be finite and non-zero")),
        None => Err(ConversionError::no_ratio(category.name(), unit)),
    };
    Ok(Strategy::Ratio {
        from: ratio(from)?,
        to: ratio(to)?,
    })
}

/// Select and evaluate; returns the unrounded result and the strategy used
pub fn resolve(
    category: &CategoryDef,
    from: &str,
    to: &str,
    value: f64,
) -> Result<(f64, StrategyKind), ConversionError> {
    let strategy = select_strategy(category, from, to)?;
    let raw = strategy
        .evaluate(value)
        .map_err(|e| e.in_category(category.name()))?;
    Ok((raw, strategy.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mensura_core::ErrorKind;

    fn temperature() -> CategoryDef {
        CategoryDef::new("temperature")
            .with_role("celsius", "celsius")
            .with_role("fahrenheit", "fahrenheit")
            .with_role("kelvin", "kelvin")
            .with_formula("celsius_to_fahrenheit", "value * 9/5 + 32")
            .with_formula("fahrenheit_to_celsius", "(value - 32) * 5/9")
    }

    fn storage() -> CategoryDef {
        CategoryDef::new("digital_storage")
            .with_ratio("byte", 1.0)
            .with_ratio("bit", 8.0)
            .with_ratio("kilobyte", 0.001)
            .with_formula("bit_to_byte", "value / 8")
    }

    #[test]
    fn test_role_formula_selected() {
        let cat = temperature();
        let s = select_strategy(&cat, "celsius", "fahrenheit").unwrap();
        assert_eq!(s.kind(), StrategyKind::RoleFormula);
        assert_eq!(s.evaluate(100.0).unwrap(), 212.0);
    }

    #[test]
    fn test_role_formula_uses_tags_not_names() {
        let cat = CategoryDef::new("temperature")
            .with_role("degrees_c", "c")
            .with_role("degrees_f", "f")
            .with_formula("c_to_f", "value * 9/5 + 32");
        let s = select_strategy(&cat, "degrees_c", "degrees_f").unwrap();
        assert_eq!(s, Strategy::RoleFormula { key: "c_to_f".to_string(), formula: "value * 9/5 + 32" });
    }

    #[test]
    fn test_role_formula_never_falls_back() {
        // celsius_to_kelvin exists, yet kelvin -> celsius must not use it in reverse
        let cat = temperature().with_formula("celsius_to_kelvin", "value + 273.15");
        let err = select_strategy(&cat, "kelvin", "celsius").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoConversionPath);
        assert!(err.message.contains("kelvin_to_celsius"));
    }

    #[test]
    fn test_role_same_unit_needs_formula() {
        let err = select_strategy(&temperature(), "celsius", "celsius").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoConversionPath);
    }

    #[test]
    fn test_direct_formula_selected() {
        let cat = storage();
        let s = select_strategy(&cat, "bit", "byte").unwrap();
        assert_eq!(s.kind(), StrategyKind::DirectFormula);
        assert_eq!(s.evaluate(16.0).unwrap(), 2.0);
    }

    #[test]
    fn test_reverse_formula_selected() {
        let cat = storage();
        let s = select_strategy(&cat, "byte", "bit").unwrap();
        assert_eq!(s.kind(), StrategyKind::ReverseFormula);
        // f = 1/8, result = 3 / 0.125
        assert_eq!(s.evaluate(3.0).unwrap(), 24.0);
    }

    #[test]
    fn test_ratio_when_no_formula_matches() {
        let cat = storage();
        let s = select_strategy(&cat, "byte", "kilobyte").unwrap();
        assert_eq!(s, Strategy::Ratio { from: 1.0, to: 0.001 });
        assert_eq!(s.evaluate(2000.0).unwrap(), 2.0);
    }

    #[test]
    fn test_ratio_without_formulas() {
        let cat = CategoryDef::new("length")
            .with_ratio("meter", 1.0)
            .with_ratio("centimeter", 100.0);
        let s = select_strategy(&cat, "meter", "centimeter").unwrap();
        assert_eq!(s.kind(), StrategyKind::Ratio);
        assert_eq!(s.evaluate(2.5).unwrap(), 250.0);
    }

    #[test]
    fn test_direct_beats_reverse() {
        let cat = CategoryDef::new("x")
            .with_ratio("a", 1.0)
            .with_ratio("b", 1.0)
            .with_formula("a_to_b", "value * 3")
            .with_formula("b_to_a", "value * 100");
        let s = select_strategy(&cat, "a", "b").unwrap();
        assert_eq!(s.kind(), StrategyKind::DirectFormula);
        assert_eq!(s.evaluate(2.0).unwrap(), 6.0);
    }

    #[test]
    fn test_reverse_of_affine_formula_is_scale_only() {
        // Preserved behavior: only the value at 1 is used
        let cat = CategoryDef::new("x")
            .with_ratio("a", 1.0)
            .with_ratio("b", 1.0)
            .with_formula("b_to_a", "value * 2 + 2");
        let s = select_strategy(&cat, "a", "b").unwrap();
        assert_eq!(s.evaluate(8.0).unwrap(), 2.0);
    }

    #[test]
    fn test_malformed_formula_reported() {
        let cat = CategoryDef::new("x")
            .with_ratio("a", 1.0)
            .with_ratio("b", 1.0)
            .with_formula("a_to_b", "value * factor");
        let err = resolve(&cat, "a", "b", 1.0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedFormula);
        let ctx = err.context.unwrap();
        assert_eq!(ctx.formula_key.as_deref(), Some("a_to_b"));
        assert_eq!(ctx.category.as_deref(), Some("x"));
    }

    #[test]
    fn test_zero_reverse_factor() {
        let cat = CategoryDef::new("x")
            .with_ratio("a", 1.0)
            .with_ratio("b", 1.0)
            .with_formula("b_to_a", "value - 1");
        let err = resolve(&cat, "a", "b", 5.0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedFormula);
    }

    #[test]
    fn test_overflow_detected() {
        let cat = CategoryDef::new("length")
            .with_ratio("meter", 1.0)
            .with_ratio("millimeter", 1000.0);
        let err = resolve(&cat, "meter", "millimeter", f64::MAX).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Overflow);
    }

    #[test]
    fn test_zero_ratio_not_blamed_on_input() {
        let cat = CategoryDef::new("length")
            .with_ratio("meter", 1.0)
            .with_ratio("void", 0.0);
        let err = resolve(&cat, "void", "meter", 5.0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoConversionPath);
        assert_eq!(err.context.unwrap().unit.as_deref(), Some("void"));
    }

    #[test]
    fn test_resolve_reports_strategy() {
        let (raw, kind) = resolve(&temperature(), "fahrenheit", "celsius", 212.0).unwrap();
        assert_eq!(raw, 100.0);
        assert_eq!(kind, StrategyKind::RoleFormula);
    }

    #[test]
    fn test_strategy_kind_names() {
        assert_eq!(StrategyKind::ReverseFormula.as_str(), "reverse_formula");
    }
}
