//! Entity descriptors: everything that differs between the Students,
//! Programs and Colleges screens.
//!
//! A descriptor supplies the namespace and collection path, the column and
//! filter tables that parameterize the list controller, the presentation
//! mapping from backend records to display cells, and the record form.

mod college;
pub mod form;
mod program;
mod student;

pub use college::Colleges;
pub use form::{FieldKind, FormField, FormValues, ValidationError};
pub use program::Programs;
pub use student::Students;

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use crate::listview::ListConfig;

/// A table column. `key` is the display key used for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub label: &'static str,
  pub key: &'static str,
  /// Minimum width in cells
  pub width: u16,
}

impl Column {
  pub const fn new(label: &'static str, key: &'static str, width: u16) -> Self {
    Self { label, key, width }
  }
}

/// Where a filter's selectable values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOptions {
  Fixed(&'static [&'static str]),
  /// Codes of another namespace, loaded at runtime
  Lookup(&'static str),
}

/// A multi-select filter offered by the filter picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDef {
  /// Filter name, as used in the list config's filter table
  pub name: &'static str,
  pub label: &'static str,
  pub options: FilterOptions,
}

/// Describes one entity collection of the backend.
pub trait Entity: Send + Sync + 'static {
  /// Record as the backend sends it
  type Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;
  /// Body of create and update requests
  type Payload: Serialize + Send + Sync + 'static;

  /// Plural title, e.g. "Students"
  const TITLE: &'static str;
  const SINGULAR: &'static str;
  /// Collection path below the API base, e.g. "students"
  const PATH: &'static str;
  const LIST: ListConfig;
  const COLUMNS: &'static [Column];
  const FILTERS: &'static [FilterDef] = &[];
  const FORM: &'static [FormField];
  /// Message shown when the backend reports a duplicate record
  const CONFLICT_MESSAGE: &'static str;
  /// Whether records have an uploadable photo
  const HAS_PHOTO: bool = false;
  /// Namespaces whose records show this entity's codes. Their cached pages
  /// go stale when a record here changes.
  const DEPENDENTS: &'static [&'static str] = &[];

  /// Identifier used in per-record paths
  fn id(record: &Self::Record) -> &str;

  /// Display cells, aligned with `COLUMNS`
  fn cells(record: &Self::Record) -> Vec<String>;

  /// Current values for the edit form, aligned with `FORM`
  fn form_values(record: &Self::Record) -> Vec<String>;

  /// Build the request body from validated form values
  fn payload(values: &FormValues) -> Result<Self::Payload, ValidationError>;

  /// Whether a column can be sorted on
  fn is_sortable(column: &Column) -> bool {
    Self::LIST.sort_field(column.key).is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Column keys that sort must appear in the sort table and vice versa,
  /// filter definitions must have a backend parameter, and forms must line up.
  fn check_tables<E: Entity>() {
    for field in E::LIST.sort_fields {
      assert!(
        E::COLUMNS.iter().any(|c| c.key == field.display),
        "{}: sort key {} has no column",
        E::TITLE,
        field.display
      );
    }
    for filter in E::FILTERS {
      assert!(
        E::LIST.filter_param(filter.name).is_some(),
        "{}: filter {} has no backend parameter",
        E::TITLE,
        filter.name
      );
    }
    assert_eq!(E::LIST.namespace, E::PATH);
    assert!(!E::DEPENDENTS.contains(&E::PATH));
  }

  #[test]
  fn test_tables_consistent() {
    check_tables::<Students>();
    check_tables::<Programs>();
    check_tables::<Colleges>();
  }
}
