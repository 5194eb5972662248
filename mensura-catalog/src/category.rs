//! Category definitions: units plus optional named formulas

use crate::unit::{UnitDef, UnitKind};
use std::collections::HashMap;

/// Separator between the two unit names of a formula key
pub const FORMULA_KEY_SEPARATOR: &str = "_to_";

/// Build a directional formula key such as `meter_to_foot`
pub fn formula_key(from: &str, to: &str) -> String {
    format!("{}{}{}", from, FORMULA_KEY_SEPARATOR, to)
}

/// How units of a category resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    /// Units carry base ratios
    Ratio,
    /// Units carry role tags; conversions need an exact formula
    Role,
}

/// One conversion domain (length, temperature, ...)
///
/// Units and formulas keep their declared order.
#[derive(Debug, Clone, Default)]
pub struct CategoryDef {
    name: String,
    units: Vec<UnitDef>,
    unit_index: HashMap<String, usize>,
    formulas: Vec<(String, String)>,
    formula_index: HashMap<String, usize>,
}

impl CategoryDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Builder: add a ratio unit
    pub fn with_ratio(mut self, unit: &str, ratio: f64) -> Self {
        self.push_unit(UnitDef::ratio(unit, ratio));
        self
    }

    /// Builder: add a role-tagged unit
    pub fn with_role(mut self, unit: &str, tag: &str) -> Self {
        self.push_unit(UnitDef::role(unit, tag));
        self
    }

    /// Builder: add a formula
    pub fn with_formula(mut self, key: &str, expression: &str) -> Self {
        self.push_formula(key, expression);
        self
    }

    /// Insert a unit, replacing any previous unit of the same name in place
    pub fn push_unit(&mut self, unit: UnitDef) {
        match self.unit_index.get(&unit.name) {
            Some(&i) => self.units[i] = unit,
            None => {
                self.unit_index.insert(unit.name.clone(), self.units.len());
                self.units.push(unit);
            }
        }
    }

    /// Insert a formula, replacing any previous formula with the same key in place
    pub fn push_formula(&mut self, key: &str, expression: &str) {
        match self.formula_index.get(key) {
            Some(&i) => self.formulas[i].1 = expression.to_string(),
            None => {
                self.formula_index.insert(key.to_string(), self.formulas.len());
                self.formulas.push((key.to_string(), expression.to_string()));
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role if any unit carries a role tag
    pub fn kind(&self) -> CategoryKind {
        if self.units.iter().any(|u| u.kind.is_role()) {
            CategoryKind::Role
        } else {
            CategoryKind::Ratio
        }
    }

    /// True when both ratio and role units are present
    pub fn is_mixed(&self) -> bool {
        let roles = self.units.iter().filter(|u| u.kind.is_role()).count();
        roles > 0 && roles < self.units.len()
    }

    pub fn units(&self) -> &[UnitDef] {
        &self.units
    }

    pub fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }

    pub fn unit(&self, name: &str) -> Option<&UnitDef> {
        self.unit_index.get(name).map(|&i| &self.units[i])
    }

    pub fn has_unit(&self, name: &str) -> bool {
        self.unit_index.contains_key(name)
    }

    pub fn ratio(&self, unit: &str) -> Option<f64> {
        self.unit(unit).and_then(|u| u.kind.as_ratio())
    }

    pub fn role(&self, unit: &str) -> Option<&str> {
        self.unit(unit).and_then(|u| u.kind.as_role())
    }

    /// Distinct role tags in declared order
    pub fn role_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for unit in &self.units {
            if let UnitKind::FormulaRole(tag) = &unit.kind {
                if !tags.contains(&tag.as_str()) {
                    tags.push(tag.as_str());
                }
            }
        }
        tags
    }

    pub fn formula(&self, key: &str) -> Option<&str> {
        self.formula_index.get(key).map(|&i| self.formulas[i].1.as_str())
    }

    /// `(key, expression)` pairs in declared order
    pub fn formulas(&self) -> impl Iterator<Item = (&str, &str)> {
        self.formulas.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_formulas(&self) -> bool {
        !self.formulas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_key() {
        assert_eq!(formula_key("meter", "foot"), "meter_to_foot");
    }

    #[test]
    fn test_declared_order_kept() {
        let cat = CategoryDef::new("length")
            .with_ratio("meter", 1.0)
            .with_ratio("kilometer", 0.001)
            .with_ratio("foot", 3.28084);
        assert_eq!(cat.unit_names(), vec!["meter", "kilometer", "foot"]);
    }

    #[test]
    fn test_duplicate_unit_replaced_in_place() {
        let cat = CategoryDef::new("length")
            .with_ratio("meter", 1.0)
            .with_ratio("foot", 3.0)
            .with_ratio("meter", 2.0);
        assert_eq!(cat.unit_names(), vec!["meter", "foot"]);
        assert_eq!(cat.ratio("meter"), Some(2.0));
    }

    #[test]
    fn test_kind_detection() {
        let length = CategoryDef::new("length").with_ratio("meter", 1.0);
        assert_eq!(length.kind(), CategoryKind::Ratio);
        assert!(!length.is_mixed());

        let temp = CategoryDef::new("temperature")
            .with_role("celsius", "celsius")
            .with_role("fahrenheit", "fahrenheit");
        assert_eq!(temp.kind(), CategoryKind::Role);
        assert_eq!(temp.role("fahrenheit"), Some("fahrenheit"));
        assert_eq!(temp.ratio("fahrenheit"), None);
    }

    #[test]
    fn test_mixed_detection() {
        let cat = CategoryDef::new("odd")
            .with_ratio("a", 1.0)
            .with_role("b", "b");
        assert!(cat.is_mixed());
    }

    #[test]
    fn test_role_tags_distinct() {
        let cat = CategoryDef::new("temperature")
            .with_role("celsius", "c")
            .with_role("centigrade", "c")
            .with_role("kelvin", "k");
        assert_eq!(cat.role_tags(), vec!["c", "k"]);
    }

    #[test]
    fn test_formula_lookup() {
        let cat = CategoryDef::new("energy")
            .with_ratio("joule", 1.0)
            .with_ratio("calorie", 0.239)
            .with_formula("joule_to_calorie", "value / 4.184");
        assert!(cat.has_formulas());
        assert_eq!(cat.formula("joule_to_calorie"), Some("value / 4.184"));
        assert_eq!(cat.formula("calorie_to_joule"), None);
    }
}
