// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Schema validation for everything that crosses into a machine.
//!
//! serde enforces shape; [`Validate`] enforces the constraints serde cannot express.
//! Both failures surface as [`ApiError::Decode`].

use serde::de::DeserializeOwned;

use crate::api_error::ApiError;

pub trait Validate {
    /// Check field constraints, returning a human-readable diagnostic on failure.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.iter()
            .enumerate()
            .try_for_each(|(i, item)| item.validate().map_err(|e| format!("[{i}]: {e}")))
    }
}

/// Decode a JSON body into `T` and validate it.
pub fn decode<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_slice(body)
        .map_err(|err| ApiError::decode("Response failed schema validation", err.to_string()))?;
    check(value)
}

/// Decode an already-parsed JSON value into `T` and validate it.
pub fn decode_value<T>(value: serde_json::Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_value(value)
        .map_err(|err| ApiError::decode("Stored record failed schema validation", err.to_string()))?;
    check(value)
}

fn check<T: Validate>(value: T) -> Result<T, ApiError> {
    value
        .validate()
        .map_err(|diagnostic| ApiError::decode("Response failed schema validation", diagnostic))?;
    Ok(value)
}

/// Loose structural email check: one `@`, non-empty local part, dotted domain.
pub fn is_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !candidate.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_error::ErrorKind;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Page {
        page: u32,
    }

    impl Validate for Page {
        fn validate(&self) -> Result<(), String> {
            if self.page == 0 {
                return Err("page: must be at least 1".into());
            }
            Ok(())
        }
    }

    #[test]
    fn missing_field_is_a_decode_error() {
        let err = decode::<Page>(br#"{"total": 3}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        match err {
            ApiError::Decode { diagnostic, .. } => assert!(diagnostic.contains("page")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn constraint_violation_is_a_decode_error() {
        let err = decode::<Page>(br#"{"page": 0}"#).unwrap_err();
        assert_eq!(
            err,
            ApiError::decode("Response failed schema validation", "page: must be at least 1")
        );
        assert_eq!(decode::<Page>(br#"{"page": 2}"#).unwrap().page, 2);
    }

    #[test]
    fn email_check() {
        assert!(is_email("ada@example.com"));
        assert!(!is_email("ada@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("ada example@x.io"));
        assert!(!is_email("a@b@c.io"));
    }
}
