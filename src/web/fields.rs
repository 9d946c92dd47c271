//! Lenient field decoding for JSON payloads.
//!
//! Browser forms post numbers as strings ("72.5"), so numeric fields accept
//! either a JSON number or numeric text. Blank text counts as missing.

use crate::error::ValidationError;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
            FieldValue::Other(v) => v.is_null(),
        }
    }

    pub fn text(&self, field: &'static str) -> Result<String, ValidationError> {
        match self {
            FieldValue::Text(s) => Ok(s.trim().to_string()),
            FieldValue::Number(n) => Ok(n.to_string()),
            FieldValue::Other(_) => Err(ValidationError::NotText { field }),
        }
    }

    pub fn number(&self, field: &'static str) -> Result<f64, ValidationError> {
        let value = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ValidationError::NotNumeric { field })?,
            FieldValue::Other(_) => return Err(ValidationError::NotNumeric { field }),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ValidationError::NotNumeric { field })
        }
    }

    pub fn integer(&self, field: &'static str) -> Result<i64, ValidationError> {
        let value = self.number(field)?;
        if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return Err(ValidationError::NotInteger { field });
        }
        Ok(value as i64)
    }
}

/// Names every field that is absent, null, or blank, in the order given.
pub fn missing_fields(fields: &[(&'static str, Option<&FieldValue>)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.map_or(true, FieldValue::is_blank))
        .map(|(name, _)| *name)
        .collect()
}

pub fn ensure_present(fields: &[(&'static str, Option<&FieldValue>)]) -> Result<(), ValidationError> {
    let missing = missing_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

pub fn required<'a>(field: &'static str, value: &'a Option<FieldValue>) -> Result<&'a FieldValue, ValidationError> {
    match value {
        Some(v) if !v.is_blank() => Ok(v),
        _ => Err(ValidationError::MissingFields(vec![field])),
    }
}

/// Present, non-blank values only.
pub fn optional(value: &Option<FieldValue>) -> Option<&FieldValue> {
    value.as_ref().filter(|v| !v.is_blank())
}

pub fn positive_int<T>(field: &'static str, value: &FieldValue) -> Result<T, ValidationError>
where
    T: TryFrom<i64>,
{
    let raw = value.integer(field)?;
    if raw <= 0 {
        return Err(ValidationError::OutOfRange { field });
    }
    T::try_from(raw).map_err(|_| ValidationError::OutOfRange { field })
}
