//! Record form definitions and pre-submit validation.

use std::collections::BTreeMap;
use thiserror::Error;

/// A field failed validation before anything was sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
  pub field: &'static str,
  pub reason: String,
}

impl ValidationError {
  pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
    Self {
      field,
      reason: reason.into(),
    }
  }
}

/// How a form field is edited and checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  /// Free text up to `max_len` characters
  Text { max_len: usize },
  /// One of a fixed set of values
  Choice(&'static [&'static str]),
  /// One of another namespace's codes, loaded at runtime (e.g. "programs")
  Lookup(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
  pub key: &'static str,
  pub label: &'static str,
  pub kind: FieldKind,
  pub required: bool,
  /// Identifier fields of records that can't be renamed are locked when editing
  pub editable_on_update: bool,
}

impl FormField {
  pub const fn text(key: &'static str, label: &'static str, max_len: usize) -> Self {
    Self {
      key,
      label,
      kind: FieldKind::Text { max_len },
      required: true,
      editable_on_update: true,
    }
  }

  pub const fn choice(key: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
    Self {
      key,
      label,
      kind: FieldKind::Choice(options),
      required: true,
      editable_on_update: true,
    }
  }

  pub const fn lookup(key: &'static str, label: &'static str, namespace: &'static str) -> Self {
    Self {
      key,
      label,
      kind: FieldKind::Lookup(namespace),
      required: true,
      editable_on_update: true,
    }
  }

  pub const fn locked_on_update(mut self) -> Self {
    self.editable_on_update = false;
    self
  }
}

/// Validated form values keyed by field key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<&'static str, String>);

impl FormValues {
  /// Trimmed value of a field, empty when absent
  pub fn text(&self, key: &str) -> String {
    self.0.get(key).cloned().unwrap_or_default()
  }

  pub fn number(&self, key: &'static str) -> Result<u32, ValidationError> {
    self
      .text(key)
      .parse()
      .map_err(|_| ValidationError::new(key, "must be a number"))
  }
}

/// Check `values` (aligned with `fields`) and collect them.
///
/// Choice values must be one of the options. Lookup values are checked only
/// when `lookup` knows the namespace's codes.
pub fn validate<'a>(
  fields: &[FormField],
  values: &[String],
  lookup: impl Fn(&str) -> Option<&'a [String]>,
) -> Result<FormValues, ValidationError> {
  let mut out = BTreeMap::new();

  for (field, raw) in fields.iter().zip(values) {
    let value = raw.trim();

    if value.is_empty() {
      if field.required {
        return Err(ValidationError::new(field.label, "is required"));
      }
      out.insert(field.key, String::new());
      continue;
    }

    match field.kind {
      FieldKind::Text { max_len } => {
        if value.chars().count() > max_len {
          return Err(ValidationError::new(
            field.label,
            format!("must be at most {} characters", max_len),
          ));
        }
      }
      FieldKind::Choice(options) => {
        if !options.contains(&value) {
          return Err(ValidationError::new(
            field.label,
            format!("must be one of {}", options.join(", ")),
          ));
        }
      }
      FieldKind::Lookup(namespace) => {
        if let Some(codes) = lookup(namespace) {
          if !codes.iter().any(|c| c == value) {
            return Err(ValidationError::new(
              field.label,
              format!("unknown code {:?}", value),
            ));
          }
        }
      }
    }

    out.insert(field.key, value.to_string());
  }

  Ok(FormValues(out))
}

#[cfg(test)]
mod tests {
  use super::*;

  const FIELDS: &[FormField] = &[
    FormField::text("code", "Code", 4),
    FormField::choice("year", "Year", &["1", "2"]),
    FormField::lookup("college", "College", "colleges"),
  ];

  fn values(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
  }

  fn no_lookup(_: &str) -> Option<&'static [String]> {
    None
  }

  #[test]
  fn test_valid_values_are_trimmed() {
    let out = validate(FIELDS, &values(&[" CS ", "2", "CCS"]), no_lookup).unwrap();
    assert_eq!(out.text("code"), "CS");
    assert_eq!(out.number("year").unwrap(), 2);
  }

  #[test]
  fn test_required_field() {
    let err = validate(FIELDS, &values(&["  ", "1", "CCS"]), no_lookup).unwrap_err();
    assert_eq!(err, ValidationError::new("Code", "is required"));
  }

  #[test]
  fn test_text_length_and_choice() {
    assert!(validate(FIELDS, &values(&["TOOLONG", "1", "CCS"]), no_lookup).is_err());
    let err = validate(FIELDS, &values(&["CS", "9", "CCS"]), no_lookup).unwrap_err();
    assert_eq!(err.field, "Year");
  }

  #[test]
  fn test_lookup_checked_when_codes_known() {
    let codes = vec!["CCS".to_string(), "COE".to_string()];
    let lookup = |ns: &str| (ns == "colleges").then_some(codes.as_slice());
    assert!(validate(FIELDS, &values(&["CS", "1", "COE"]), lookup).is_ok());
    let err = validate(FIELDS, &values(&["CS", "1", "XYZ"]), lookup).unwrap_err();
    assert_eq!(err.field, "College");
  }

  #[test]
  fn test_optional_empty_value() {
    let fields = [FormField {
      required: false,
      ..FormField::text("note", "Note", 10)
    }];
    let out = validate(&fields, &values(&[""]), no_lookup).unwrap();
    assert_eq!(out.text("note"), "");
  }
}
