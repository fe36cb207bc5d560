//! Request parameters derived from a [`QueryState`] and an entity's field tables.

use super::query_state::QueryState;

/// Maps a display-side name to the backend's name for the same field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
  pub display: &'static str,
  pub backend: &'static str,
}

impl FieldMap {
  pub const fn new(display: &'static str, backend: &'static str) -> Self {
    Self { display, backend }
  }
}

/// Per-entity parameters of a list view controller
#[derive(Debug, Clone, Copy)]
pub struct ListConfig {
  /// Entity namespace, also the cache key prefix (e.g. "students")
  pub namespace: &'static str,
  /// Sortable display keys and the backend `sort_by` value for each
  pub sort_fields: &'static [FieldMap],
  /// Filter names and the backend query parameter for each
  pub filter_fields: &'static [FieldMap],
}

impl ListConfig {
  /// Prefix shared by every cache key of this namespace
  pub fn key_prefix(&self) -> String {
    format!("{}_", self.namespace)
  }

  pub fn sort_field(&self, display: &str) -> Option<&'static str> {
    lookup(self.sort_fields, display)
  }

  pub fn filter_param(&self, name: &str) -> Option<&'static str> {
    lookup(self.filter_fields, name)
  }
}

fn lookup(table: &[FieldMap], display: &str) -> Option<&'static str> {
  table
    .iter()
    .find(|f| f.display == display)
    .map(|f| f.backend)
}

/// Parameters handed to the fetch capability for one list request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListParams {
  pub page: u32,
  pub per_page: u32,
  pub search: Option<String>,
  /// Backend field name
  pub sort_by: Option<String>,
  /// "asc" or "desc", present whenever `sort_by` is
  pub order: Option<&'static str>,
  /// Flattened filter values as (backend param, value), sorted
  pub filters: Vec<(String, String)>,
}

impl ListParams {
  pub fn from_state(state: &QueryState, config: &ListConfig) -> Self {
    let (sort_by, order) = match state
      .sort()
      .and_then(|s| config.sort_field(&s.key).map(|field| (field, s.direction)))
    {
      Some((field, direction)) => (Some(field.to_string()), Some(direction.as_param())),
      None => (None, None),
    };

    let mut filters: Vec<(String, String)> = state
      .filters()
      .iter()
      .filter_map(|(name, values)| config.filter_param(name).map(|param| (param, values)))
      .flat_map(|(param, values)| {
        values
          .iter()
          .map(move |value| (param.to_string(), value.clone()))
      })
      .collect();
    filters.sort();

    Self {
      page: state.page(),
      per_page: state.page_size().get(),
      search: (!state.search().is_empty()).then(|| state.search().to_string()),
      sort_by,
      order,
      filters,
    }
  }

  /// Query string pairs in a stable order. Multi-select filters repeat their parameter.
  pub fn query_pairs(&self) -> Vec<(String, String)> {
    let mut pairs = vec![
      ("page".to_string(), self.page.to_string()),
      ("per_page".to_string(), self.per_page.to_string()),
    ];
    if let Some(search) = &self.search {
      pairs.push(("search".to_string(), search.clone()));
    }
    if let (Some(sort_by), Some(order)) = (&self.sort_by, self.order) {
      pairs.push(("sort_by".to_string(), sort_by.clone()));
      pairs.push(("order".to_string(), order.to_string()));
    }
    pairs.extend(self.filters.iter().cloned());
    pairs
  }

  /// Unambiguous text form of every parameter, used as cache key material
  pub fn canonical(&self) -> String {
    self
      .query_pairs()
      .iter()
      .map(|(k, v)| format!("{}:{}={}:{};", k.len(), k, v.len(), v))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listview::query_state::Filters;
  use std::collections::BTreeSet;

  const SORTS: &[FieldMap] = &[
    FieldMap::new("id", "student_id"),
    FieldMap::new("firstname", "first_name"),
  ];
  const FILTERS: &[FieldMap] = &[
    FieldMap::new("year", "year_level"),
    FieldMap::new("gender", "gender"),
  ];
  const CONFIG: ListConfig = ListConfig {
    namespace: "students",
    sort_fields: SORTS,
    filter_fields: FILTERS,
  };

  #[test]
  fn test_default_state_sends_only_paging() {
    let params = ListParams::from_state(&QueryState::default(), &CONFIG);
    assert_eq!(
      params,
      ListParams {
        page: 1,
        per_page: 10,
        ..Default::default()
      }
    );
    assert_eq!(
      params.query_pairs(),
      vec![
        ("page".to_string(), "1".to_string()),
        ("per_page".to_string(), "10".to_string())
      ]
    );
  }

  #[test]
  fn test_sort_key_mapped_to_backend_field() {
    let mut state = QueryState::default();
    state.set_sort("firstname");
    state.set_sort("firstname");
    let params = ListParams::from_state(&state, &CONFIG);
    assert_eq!(params.sort_by.as_deref(), Some("first_name"));
    assert_eq!(params.order, Some("desc"));
  }

  #[test]
  fn test_filters_flattened_and_sorted() {
    let mut state = QueryState::default();
    let mut filters = Filters::new();
    filters.insert(
      "year".into(),
      BTreeSet::from(["3".to_string(), "1".to_string()]),
    );
    filters.insert("gender".into(), BTreeSet::from(["Female".to_string()]));
    state.set_filters(filters);
    state.set_search(" li ");

    let params = ListParams::from_state(&state, &CONFIG);
    assert_eq!(params.search.as_deref(), Some("li"));
    assert_eq!(
      params.filters,
      vec![
        ("gender".to_string(), "Female".to_string()),
        ("year_level".to_string(), "1".to_string()),
        ("year_level".to_string(), "3".to_string()),
      ]
    );
  }

  #[test]
  fn test_canonical_is_unambiguous() {
    let a = ListParams {
      page: 1,
      per_page: 10,
      search: Some("a;b".into()),
      ..Default::default()
    };
    let b = ListParams {
      page: 1,
      per_page: 10,
      search: Some("a".into()),
      filters: vec![("b".into(), String::new())],
      ..Default::default()
    };
    assert_ne!(a.canonical(), b.canonical());
  }
}
