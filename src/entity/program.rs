use serde::{Deserialize, Serialize};

use super::form::{FormField, FormValues, ValidationError};
use super::{Column, Entity};
use crate::listview::{FieldMap, ListConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
  pub program_code: String,
  pub program_name: String,
  #[serde(default)]
  pub college_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramPayload {
  pub program_code: String,
  pub program_name: String,
  pub college_code: String,
}

/// The programs collection
pub struct Programs;

impl Entity for Programs {
  type Record = Program;
  type Payload = ProgramPayload;

  const TITLE: &'static str = "Programs";
  const SINGULAR: &'static str = "Program";
  const PATH: &'static str = "programs";
  const LIST: ListConfig = ListConfig {
    namespace: "programs",
    sort_fields: &[
      FieldMap::new("code", "program_code"),
      FieldMap::new("name", "program_name"),
      FieldMap::new("college", "college_code"),
    ],
    filter_fields: &[],
  };
  const COLUMNS: &'static [Column] = &[
    Column::new("Code", "code", 10),
    Column::new("Name", "name", 40),
    Column::new("College", "college", 8),
  ];
  const FORM: &'static [FormField] = &[
    FormField::text("program_code", "Program Code", 16),
    FormField::text("program_name", "Program Name", 128),
    FormField::lookup("college_code", "College", "colleges"),
  ];
  const CONFLICT_MESSAGE: &'static str = "Program code already exists.";
  const DEPENDENTS: &'static [&'static str] = &["students"];

  fn id(record: &Program) -> &str {
    &record.program_code
  }

  fn cells(record: &Program) -> Vec<String> {
    vec![
      record.program_code.clone(),
      record.program_name.clone(),
      record.college_code.clone().unwrap_or_else(|| "None".into()),
    ]
  }

  fn form_values(record: &Program) -> Vec<String> {
    vec![
      record.program_code.clone(),
      record.program_name.clone(),
      record.college_code.clone().unwrap_or_default(),
    ]
  }

  fn payload(values: &FormValues) -> Result<ProgramPayload, ValidationError> {
    Ok(ProgramPayload {
      program_code: values.text("program_code"),
      program_name: values.text("program_name"),
      college_code: values.text("college_code"),
    })
  }
}
