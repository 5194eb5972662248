//! Structured conversion errors
//!
//! Errors are values returned to the immediate caller. They classify the
//! failure precisely enough for a caller to choose what to show, and never
//! touch catalog state or later requests.

use crate::InputError;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const UNKNOWN_CATEGORY: &str = "UNKNOWN_CATEGORY";
    pub const UNKNOWN_UNIT: &str = "UNKNOWN_UNIT";
    pub const NO_CONVERSION_PATH: &str = "NO_CONVERSION_PATH";
    pub const MALFORMED_FORMULA: &str = "MALFORMED_FORMULA";
    pub const OVERFLOW: &str = "OVERFLOW";
}

/// Failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing field or unparseable numeric input
    InvalidRequest,
    /// Category absent from the catalog
    UnknownCategory,
    /// Unit absent from the selected category
    UnknownUnit,
    /// Role-keyed category without a formula for the unit pair
    NoConversionPath,
    /// Formula is not pure arithmetic over `value`
    MalformedFormula,
    /// Raw result is not a finite number
    Overflow,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => codes::INVALID_REQUEST,
            ErrorKind::UnknownCategory => codes::UNKNOWN_CATEGORY,
            ErrorKind::UnknownUnit => codes::UNKNOWN_UNIT,
            ErrorKind::NoConversionPath => codes::NO_CONVERSION_PATH,
            ErrorKind::MalformedFormula => codes::MALFORMED_FORMULA,
            ErrorKind::Overflow => codes::OVERFLOW,
        }
    }

    /// True when the catalog data, not the user's input, is at fault
    pub fn is_data_fault(self) -> bool {
        matches!(self, ErrorKind::MalformedFormula | ErrorKind::NoConversionPath)
    }
}

/// Where in the catalog the error occurred
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Formula key such as `celsius_to_fahrenheit`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula_key: Option<String>,

    /// Formula expression text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

/// Structured conversion error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionError {
    pub kind: ErrorKind,

    /// Machine-readable error code, derived from `kind`
    pub code: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
}

impl ConversionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.code().to_string(),
            message: message.into(),
            suggestion: None,
            context: None,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: set category context
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.category = Some(category.into());
        self
    }

    /// Builder: set unit context
    pub fn for_unit(mut self, unit: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.unit = Some(unit.into());
        self
    }

    /// Builder: set formula context
    pub fn with_formula(mut self, key: impl Into<String>, formula: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.formula_key = Some(key.into());
        ctx.formula = Some(formula.into());
        self
    }

    /// Builder: add note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.notes.push(note.into());
        self
    }

    // ========== Common Error Constructors ==========

    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, format!("Invalid request: {}", details.into()))
    }

    pub fn missing_field(field: &str) -> Self {
        Self::invalid_request(format!("missing {}", field))
            .with_suggestion("Please fill in all fields to perform a conversion")
    }

    pub fn unknown_category(name: &str) -> Self {
        Self::new(ErrorKind::UnknownCategory, format!("Unknown category: {}", name))
            .in_category(name)
    }

    pub fn unknown_unit(category: &str, unit: &str) -> Self {
        Self::new(
            ErrorKind::UnknownUnit,
            format!("Unknown unit '{}' in category '{}'", unit, category),
        )
        .in_category(category)
        .for_unit(unit)
    }

    pub fn no_conversion_path(category: &str, key: &str) -> Self {
        Self::new(
            ErrorKind::NoConversionPath,
            format!("No conversion formula '{}' in category '{}'", key, category),
        )
        .in_category(category)
        .with_suggestion("Add the formula to the catalog document")
    }

    /// A role-tagged unit asked for its ratio
    pub fn no_ratio(category: &str, unit: &str) -> Self {
        Self::new(
            ErrorKind::NoConversionPath,
            format!("Unit '{}' in category '{}' has no ratio", unit, category),
        )
        .in_category(category)
        .for_unit(unit)
    }

    pub fn malformed_formula(key: &str, formula: &str, details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::MalformedFormula,
            format!("Malformed formula '{}': {}", key, details.into()),
        )
        .with_formula(key, formula)
        .with_suggestion("Formulas may only use numbers, + - * / ( ) and 'value'")
    }

    pub fn overflow() -> Self {
        Self::new(ErrorKind::Overflow, "Result is not a finite number")
            .with_suggestion("Use a smaller input value")
    }
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConversionError {}

impl From<InputError> for ConversionError {
    fn from(err: InputError) -> Self {
        match err {
            InputError::Empty => Self::missing_field("value"),
            InputError::NotANumber(_) | InputError::NotFinite(_) => {
                Self::invalid_request(err.to_string())
                    .with_suggestion("Enter a finite number such as 12.5")
            }
        }
    }
}
