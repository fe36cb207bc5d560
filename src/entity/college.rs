use serde::{Deserialize, Serialize};

use super::form::{FormField, FormValues, ValidationError};
use super::{Column, Entity};
use crate::listview::{FieldMap, ListConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct College {
  pub college_code: String,
  pub college_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollegePayload {
  pub college_code: String,
  pub college_name: String,
}

/// The colleges collection
pub struct Colleges;

impl Entity for Colleges {
  type Record = College;
  type Payload = CollegePayload;

  const TITLE: &'static str = "Colleges";
  const SINGULAR: &'static str = "College";
  const PATH: &'static str = "colleges";
  const LIST: ListConfig = ListConfig {
    namespace: "colleges",
    sort_fields: &[
      FieldMap::new("code", "college_code"),
      FieldMap::new("name", "college_name"),
    ],
    filter_fields: &[],
  };
  const COLUMNS: &'static [Column] = &[
    Column::new("Code", "code", 10),
    Column::new("Name", "name", 48),
  ];
  const FORM: &'static [FormField] = &[
    FormField::text("college_code", "College Code", 16),
    FormField::text("college_name", "College Name", 128),
  ];
  const CONFLICT_MESSAGE: &'static str = "College code already exists.";
  const DEPENDENTS: &'static [&'static str] = &["programs"];

  fn id(record: &College) -> &str {
    &record.college_code
  }

  fn cells(record: &College) -> Vec<String> {
    vec![record.college_code.clone(), record.college_name.clone()]
  }

  fn form_values(record: &College) -> Vec<String> {
    Self::cells(record)
  }

  fn payload(values: &FormValues) -> Result<CollegePayload, ValidationError> {
    Ok(CollegePayload {
      college_code: values.text("college_code"),
      college_name: values.text("college_name"),
    })
  }
}
