//! Version string normalization.
//!
//! `"v2.3.10"` becomes `2310`: every ASCII digit is kept in order, everything
//! else is dropped, and the result is parsed as base 10. The target type is
//! `i64` (a Postgres `BIGINT`); anything larger is rejected rather than
//! wrapped or truncated.

use crate::error::{FieldProblem, ValidationError};

pub const VERSION_FIELD: &str = "app_version";

/// Keep only `'0'..='9'`, preserving order.
pub fn extract_digits(version: &str) -> String {
    version.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a free-form version string to a non-negative integer.
pub fn normalize_version(version: &str) -> Result<i64, ValidationError> {
    let digits = extract_digits(version);
    if digits.is_empty() {
        return Err(ValidationError::single(VERSION_FIELD, FieldProblem::NoDigits));
    }

    digits
        .parse::<i64>()
        .map_err(|_| ValidationError::single(VERSION_FIELD, FieldProblem::Overflow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dotted_version() {
        assert_eq!(normalize_version("v2.3.10").unwrap(), 2310);
        assert_eq!(normalize_version("3.14.2").unwrap(), 3142);
    }

    #[test]
    fn test_leading_zeros_dropped() {
        assert_eq!(normalize_version("0.0.7").unwrap(), 7);
        assert_eq!(normalize_version("0.0").unwrap(), 0);
    }

    #[test]
    fn test_no_digits_rejected() {
        let err = normalize_version("beta").unwrap_err();
        assert_eq!(err.fields(), vec![VERSION_FIELD]);
        assert_eq!(err.issues[0].problem, FieldProblem::NoDigits);

        assert!(normalize_version("").is_err());
    }

    #[test]
    fn test_non_ascii_digits_ignored() {
        // Arabic-Indic digits are not '0'..='9'
        assert_eq!(normalize_version("\u{0661}.2").unwrap(), 2);
    }

    #[test]
    fn test_overflow_boundary() {
        assert_eq!(
            normalize_version("9223372036854775807").unwrap(),
            i64::MAX
        );
        let err = normalize_version("9.223.372.036.854.775.808").unwrap_err();
        assert_eq!(err.issues[0].problem, FieldProblem::Overflow);
    }

    proptest! {
        #[test]
        fn prop_digits_preserved_in_order(s in "[a-z.\\-]{0,3}[0-9]{1,15}[a-z.\\-]{0,3}") {
            let digits = extract_digits(&s);
            let n = normalize_version(&s).unwrap();
            prop_assert_eq!(n, digits.parse::<i64>().unwrap());
            prop_assert!(n >= 0);
        }
    }
}
