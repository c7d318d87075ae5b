//! Field validation against an [`AssetTypeSchema`].
//!
//! Both checks are pure: they look only at the schema and the field map and
//! never touch the ledger. Fields are visited in name order, so the reported
//! error is the same on every run.

use thiserror::Error;

use crate::schema::AssetTypeSchema;
use crate::value::{Fields, Value};

/// Schema violations in user-supplied data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: Value },
}

/// Check that every required field is present.
///
/// Runs on create only.
pub fn validate_required(schema: &AssetTypeSchema, data: &Fields) -> Result<(), ValidationError> {
    match schema
        .required_fields
        .iter()
        .find(|field| !data.contains_key(field.as_str()))
    {
        Some(field) => Err(ValidationError::MissingField {
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

/// Check that every enforced field present in `data` holds an allowed value.
///
/// Runs on create and on the merged result of an edit.
pub fn validate_enforced(schema: &AssetTypeSchema, data: &Fields) -> Result<(), ValidationError> {
    for field in schema.enforced_fields.keys() {
        if let Some(value) = data.get(field)
            && !schema.allows(field, value)
        {
            return Err(ValidationError::InvalidValue {
                field: field.clone(),
                value: value.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::fields;

    fn schema() -> AssetTypeSchema {
        AssetTypeSchema::default()
            .require("name")
            .require("ip")
            .enforce("status", ["enabled", "disabled"])
    }

    #[test]
    fn test_required_present() {
        let data = fields([("name", Value::from("h1")), ("ip", Value::from("10.0.0.1"))]);
        assert_eq!(validate_required(&schema(), &data), Ok(()));
    }

    #[test]
    fn test_required_missing_reports_first_in_order() {
        let data = fields([("other", Value::Null)]);
        assert_eq!(
            validate_required(&schema(), &data),
            Err(ValidationError::MissingField { field: "ip".into() })
        );
    }

    #[test]
    fn test_enforced_absent_field_passes() {
        let data = fields([("name", Value::from("h1"))]);
        assert_eq!(validate_enforced(&schema(), &data), Ok(()));
    }

    #[test]
    fn test_enforced_rejects_unknown_value() {
        let data = fields([("status", Value::from("broken"))]);
        let err = validate_enforced(&schema(), &data).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidValue {
                field: "status".into(),
                value: Value::from("broken"),
            }
        );
        assert_eq!(err.to_string(), "Invalid value for field 'status': \"broken\"");
    }
}
