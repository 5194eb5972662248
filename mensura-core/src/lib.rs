//! Mensura Core - Fundamental types
//!
//! This crate provides the core types used throughout Mensura:
//! - `ConversionError`: Structured, serializable conversion failures
//! - `RawValue`: Caller input (typed text or a number)
//! - Rounding policy: ceiling at four decimals

mod error;
mod number;
mod value;

pub use error::{codes, ConversionError, ErrorContext, ErrorKind};
pub use number::{ceil_to_places, parse_input, round_result, InputError, RESULT_DECIMALS};
pub use value::RawValue;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::codes;
    pub use crate::{ConversionError, ErrorKind, RawValue};
}

#[cfg(test)]
mod tests {
    use super::*;

    mod number_tests {
        use super::*;

        #[test]
        fn test_parse_integer_and_decimal() {
            assert_eq!(parse_input("42"), Ok(42.0));
            assert_eq!(parse_input("98.6"), Ok(98.6));
            assert_eq!(parse_input("-3.5"), Ok(-3.5));
        }

        #[test]
        fn test_parse_trims_whitespace() {
            assert_eq!(parse_input("  5 \n"), Ok(5.0));
        }

        #[test]
        fn test_parse_scientific() {
            assert_eq!(parse_input("1.5e2"), Ok(150.0));
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert_eq!(parse_input("abc"), Err(InputError::NotANumber("abc".to_string())));
            assert!(matches!(parse_input("12abc"), Err(InputError::NotANumber(_))));
        }

        #[test]
        fn test_parse_rejects_empty() {
            assert_eq!(parse_input(""), Err(InputError::Empty));
            assert_eq!(parse_input("   "), Err(InputError::Empty));
        }

        #[test]
        fn test_parse_rejects_non_finite() {
            assert!(matches!(parse_input("NaN"), Err(InputError::NotFinite(_))));
            assert!(matches!(parse_input("inf"), Err(InputError::NotFinite(_))));
            assert!(matches!(parse_input("1e999"), Err(InputError::NotFinite(_))));
        }

        #[test]
        fn test_round_up_not_nearest() {
            assert_eq!(round_result(1.23451), 1.2346);
            assert_eq!(round_result(1.0 / 3.0), 0.3334);
            assert_eq!(round_result(2.5), 2.5);
        }

        #[test]
        fn test_round_negative_moves_toward_zero() {
            assert_eq!(round_result(-2.00001), -2.0);
            assert_eq!(round_result(-1.0 / 3.0), -0.3333);
        }

        #[test]
        fn test_round_negative_zero_normalized() {
            let r = round_result(-0.00001);
            assert_eq!(r, 0.0);
            assert!(r.is_sign_positive());
        }

        #[test]
        fn test_round_keeps_float_artifacts_visible() {
            // 0.1 + 0.2 is slightly above 0.3, so the ceiling bumps it
            assert_eq!(round_result(0.1 + 0.2), 0.3001);
        }

        #[test]
        fn test_ceil_to_other_places() {
            assert_eq!(ceil_to_places(1.21, 1), 1.3);
            assert_eq!(ceil_to_places(7.0, 0), 7.0);
        }

        #[test]
        fn test_round_huge_values_stay_finite() {
            assert_eq!(round_result(1e306), 1e306);
            assert_eq!(round_result(-1e306), -1e306);
            assert_eq!(round_result(f64::MAX), f64::MAX);
        }
    }

    mod value_tests {
        use super::*;

        #[test]
        fn test_raw_text_to_number() {
            assert_eq!(RawValue::from("12.5").to_number(), Ok(12.5));
        }

        #[test]
        fn test_raw_number_passthrough() {
            assert_eq!(RawValue::from(7).to_number(), Ok(7.0));
            assert_eq!(RawValue::from(-0.5).to_number(), Ok(-0.5));
        }

        #[test]
        fn test_raw_number_non_finite() {
            assert!(RawValue::Number(f64::NAN).to_number().is_err());
            assert!(RawValue::Number(f64::INFINITY).to_number().is_err());
        }

        #[test]
        fn test_raw_value_untagged_serde() {
            let n: RawValue = serde_json::from_str("5").unwrap();
            assert_eq!(n, RawValue::Number(5.0));
            let t: RawValue = serde_json::from_str("\"5\"").unwrap();
            assert_eq!(t, RawValue::Text("5".to_string()));
        }

        #[test]
        fn test_raw_value_display() {
            assert_eq!(RawValue::from("98.6").to_string(), "98.6");
            assert_eq!(RawValue::from(5).to_string(), "5");
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_code_follows_kind() {
            let err = ConversionError::unknown_unit("length", "bogus_unit");
            assert_eq!(err.kind, ErrorKind::UnknownUnit);
            assert_eq!(err.code, codes::UNKNOWN_UNIT);
            let ctx = err.context.unwrap();
            assert_eq!(ctx.category.as_deref(), Some("length"));
            assert_eq!(ctx.unit.as_deref(), Some("bogus_unit"));
        }

        #[test]
        fn test_input_error_becomes_invalid_request() {
            let err: ConversionError = InputError::NotANumber("abc".to_string()).into();
            assert_eq!(err.kind, ErrorKind::InvalidRequest);
            assert!(err.message.contains("abc"));

            let err: ConversionError = InputError::Empty.into();
            assert_eq!(err.kind, ErrorKind::InvalidRequest);
        }

        #[test]
        fn test_display_includes_code_and_suggestion() {
            let err = ConversionError::overflow();
            let s = err.to_string();
            assert!(s.starts_with("[OVERFLOW]"));
            assert!(s.contains("suggestion"));
        }

        #[test]
        fn test_serialized_shape() {
            let err = ConversionError::malformed_formula("a_to_b", "value + x", "unknown identifier 'x'");
            let json = serde_json::to_value(&err).unwrap();
            assert_eq!(json["kind"], "malformed_formula");
            assert_eq!(json["code"], "MALFORMED_FORMULA");
            assert_eq!(json["context"]["formula_key"], "a_to_b");
            assert!(json["context"].get("category").is_none());
        }

        #[test]
        fn test_data_fault_classification() {
            assert!(ErrorKind::MalformedFormula.is_data_fault());
            assert!(!ErrorKind::InvalidRequest.is_data_fault());
        }
    }
}
