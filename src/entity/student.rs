use serde::{Deserialize, Serialize};

use super::form::{FormField, FormValues, ValidationError};
use super::{Column, Entity, FilterDef, FilterOptions};
use crate::listview::{FieldMap, ListConfig};

const YEAR_LEVELS: &[&str] = &["1", "2", "3", "4"];
const GENDERS: &[&str] = &["Male", "Female", "Other"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
  pub student_id: String,
  pub first_name: String,
  pub last_name: String,
  #[serde(default)]
  pub program_code: Option<String>,
  pub year_level: u32,
  #[serde(default)]
  pub gender: Option<String>,
  #[serde(default)]
  pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentPayload {
  pub student_id: String,
  pub first_name: String,
  pub last_name: String,
  pub program_code: String,
  pub year_level: u32,
  pub gender: String,
}

/// The students collection
pub struct Students;

impl Entity for Students {
  type Record = Student;
  type Payload = StudentPayload;

  const TITLE: &'static str = "Students";
  const SINGULAR: &'static str = "Student";
  const PATH: &'static str = "students";
  const LIST: ListConfig = ListConfig {
    namespace: "students",
    sort_fields: &[
      FieldMap::new("id", "student_id"),
      FieldMap::new("firstname", "first_name"),
      FieldMap::new("lastname", "last_name"),
      FieldMap::new("program", "program_code"),
      FieldMap::new("year", "year_level"),
      FieldMap::new("gender", "gender"),
    ],
    filter_fields: &[
      FieldMap::new("program", "program_code"),
      FieldMap::new("year", "year_level"),
      FieldMap::new("gender", "gender"),
    ],
  };
  const COLUMNS: &'static [Column] = &[
    Column::new("ID", "id", 10),
    Column::new("First Name", "firstname", 14),
    Column::new("Last Name", "lastname", 14),
    Column::new("Program", "program", 9),
    Column::new("Year", "year", 4),
    Column::new("Gender", "gender", 7),
    Column::new("Photo", "photo", 5),
  ];
  const FILTERS: &'static [FilterDef] = &[
    FilterDef {
      name: "program",
      label: "Program",
      options: FilterOptions::Lookup("programs"),
    },
    FilterDef {
      name: "year",
      label: "Year Level",
      options: FilterOptions::Fixed(YEAR_LEVELS),
    },
    FilterDef {
      name: "gender",
      label: "Gender",
      options: FilterOptions::Fixed(GENDERS),
    },
  ];
  const FORM: &'static [FormField] = &[
    FormField::text("student_id", "Student ID", 16).locked_on_update(),
    FormField::text("first_name", "First Name", 64),
    FormField::text("last_name", "Last Name", 64),
    FormField::lookup("program_code", "Program", "programs"),
    FormField::choice("year_level", "Year Level", YEAR_LEVELS),
    FormField::choice("gender", "Gender", GENDERS),
  ];
  const CONFLICT_MESSAGE: &'static str = "Student ID already exists.";
  const HAS_PHOTO: bool = true;

  fn id(record: &Student) -> &str {
    &record.student_id
  }

  fn cells(record: &Student) -> Vec<String> {
    vec![
      record.student_id.clone(),
      record.first_name.clone(),
      record.last_name.clone(),
      record.program_code.clone().unwrap_or_else(|| "None".into()),
      record.year_level.to_string(),
      record.gender.clone().unwrap_or_else(|| "N/A".into()),
      if record.photo_url.is_some() { "yes" } else { "-" }.to_string(),
    ]
  }

  fn form_values(record: &Student) -> Vec<String> {
    vec![
      record.student_id.clone(),
      record.first_name.clone(),
      record.last_name.clone(),
      record.program_code.clone().unwrap_or_default(),
      record.year_level.to_string(),
      record.gender.clone().unwrap_or_default(),
    ]
  }

  fn payload(values: &FormValues) -> Result<StudentPayload, ValidationError> {
    Ok(StudentPayload {
      student_id: values.text("student_id"),
      first_name: values.text("first_name"),
      last_name: values.text("last_name"),
      program_code: values.text("program_code"),
      year_level: values.number("year_level")?,
      gender: values.text("gender"),
    })
  }
}
