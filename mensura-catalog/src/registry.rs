//! Catalog registry
//!
//! Immutable after construction. Share it across threads behind an `Arc`;
//! every query is a read.

use crate::category::{CategoryDef, CategoryKind};
use crate::error::CatalogError;
use crate::unit::{UnitDef, UnitKind};
use mensura_core::ConversionError;
use std::collections::{HashMap, HashSet};

/// Categories in declared order, indexed by name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: Vec<CategoryDef>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a category, replacing any previous one of the same name in place
    pub fn with_category(mut self, category: CategoryDef) -> Self {
        self.push_category(category);
        self
    }

    pub fn push_category(&mut self, category: CategoryDef) {
        match self.index.get(category.name()) {
            Some(&i) => self.categories[i] = category,
            None => {
                self.index.insert(category.name().to_string(), self.categories.len());
                self.categories.push(category);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[CategoryDef] {
        &self.categories
    }

    // ========== Queries ==========

    /// Category names in declared order
    pub fn list_categories(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name()).collect()
    }

    pub fn get_category(&self, name: &str) -> Option<&CategoryDef> {
        self.index.get(name).map(|&i| &self.categories[i])
    }

    /// Look up a category, failing with `UnknownCategory`
    pub fn category(&self, name: &str) -> Result<&CategoryDef, ConversionError> {
        self.get_category(name).ok_or_else(|| {
            let err = ConversionError::unknown_category(name);
            match suggest(name, self.list_categories()) {
                Some(s) => err.with_suggestion(s),
                None => err,
            }
        })
    }

    /// Unit names of a category in declared order
    pub fn list_units(&self, category: &str) -> Result<Vec<&str>, ConversionError> {
        Ok(self.category(category)?.unit_names())
    }

    /// Look up a unit, failing with `UnknownCategory` or `UnknownUnit`
    pub fn unit(&self, category: &str, unit: &str) -> Result<&UnitDef, ConversionError> {
        let cat = self.category(category)?;
        cat.unit(unit).ok_or_else(|| {
            let err = ConversionError::unknown_unit(category, unit);
            match suggest(unit, cat.unit_names()) {
                Some(s) => err.with_suggestion(s),
                None => err,
            }
        })
    }

    /// Base ratio of a unit
    ///
    /// Role-tagged units have no ratio and fail with `NoConversionPath`.
    pub fn get_unit_ratio(&self, category: &str, unit: &str) -> Result<f64, ConversionError> {
        match &self.unit(category, unit)?.kind {
            UnitKind::Ratio(r) => Ok(*r),
            UnitKind::FormulaRole(_) => Err(ConversionError::no_ratio(category, unit)),
        }
    }

    /// Formula expression for a key, if the category declares one
    pub fn get_formula(&self, category: &str, key: &str) -> Result<Option<&str>, ConversionError> {
        Ok(self.category(category)?.formula(key))
    }

    // ========== Validation ==========

    /// Check the structural rules every loaded catalog satisfies
    pub fn validate(&self) -> Result<(), CatalogError> {
        for cat in &self.categories {
            if cat.is_mixed() {
                return Err(CatalogError::MixedUnitKinds(cat.name().to_string()));
            }
            for unit in cat.units() {
                if let UnitKind::Ratio(r) = unit.kind {
                    if !r.is_finite() || r == 0.0 {
                        return Err(CatalogError::InvalidRatio {
                            category: cat.name().to_string(),
                            unit: unit.name.clone(),
                            ratio: r,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Report formula keys that name no known unit pair
    ///
    /// These never fail loading; a conversion simply never selects them.
    pub fn lint(&self) -> Vec<CatalogWarning> {
        let mut warnings = Vec::new();
        for cat in &self.categories {
            let known: HashSet<&str> = match cat.kind() {
                CategoryKind::Ratio => cat.unit_names().into_iter().collect(),
                CategoryKind::Role => cat.role_tags().into_iter().collect(),
            };
            for (key, _) in cat.formulas() {
                if !key_splits_into(key, &known) {
                    warnings.push(CatalogWarning {
                        category: cat.name().to_string(),
                        formula_key: key.to_string(),
                        message: format!(
                            "formula '{}' does not name two known units of '{}'",
                            key,
                            cat.name()
                        ),
                    });
                }
            }
        }
        warnings
    }
}

/// Non-fatal catalog inconsistency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogWarning {
    pub category: String,
    pub formula_key: String,
    pub message: String,
}

/// Unit names may themselves contain `_to_`, so try every split point
fn key_splits_into(key: &str, known: &HashSet<&str>) -> bool {
    key.match_indices(crate::category::FORMULA_KEY_SEPARATOR).any(|(i, sep)| {
        let from = &key[..i];
        let to = &key[i + sep.len()..];
        known.contains(from) && known.contains(to)
    })
}

/// Build a "did you mean" hint from the closest candidate names
fn suggest(query: &str, candidates: Vec<&str>) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let query = query.to_lowercase();
    let mut scored: Vec<(&str, usize)> = candidates
        .into_iter()
        .map(|c| (c, similarity_score(&query, &c.to_lowercase())))
        .filter(|&(_, score)| score >= MIN_SUGGESTION_SCORE)
        .collect();
    if scored.is_empty() {
        return None;
    }
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    let names: Vec<&str> = scored.iter().take(3).map(|(name, _)| *name).collect();
    Some(format!("Did you mean: {}?", names.join(", ")))
}

const MIN_SUGGESTION_SCORE: usize = 30;

/// Rough closeness of two names; higher is closer
fn similarity_score(query: &str, candidate: &str) -> usize {
    let mut score = 0;

    if candidate.starts_with(query) || query.starts_with(candidate) {
        score += 100;
    } else if candidate.contains(query) || query.contains(candidate) {
        score += 50;
    }

    // Shared leading characters ("metre" vs "meter")
    let prefix = query
        .chars()
        .zip(candidate.chars())
        .take_while(|(a, b)| a == b)
        .count();
    score += prefix * 10;

    let len_diff = query.len().abs_diff(candidate.len());
    if score > 0 && len_diff < 5 {
        score += 5 - len_diff;
    }

    score
}
