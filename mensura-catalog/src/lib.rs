//! Mensura Catalog - Categories, units and conversion formulas
//!
//! An immutable, in-memory view of the conversion document. Each category
//! holds units (base ratios or role tags) and optional formulas keyed
//! `<from>_to_<to>`. Loading validates structure; lookups never mutate.

mod category;
mod error;
mod load;
mod registry;
mod unit;

pub use category::{formula_key, CategoryDef, CategoryKind, FORMULA_KEY_SEPARATOR};
pub use error::CatalogError;
pub use load::category_to_json;
pub use registry::{Catalog, CatalogWarning};
pub use unit::{format_unit_name, UnitDef, UnitKind};
