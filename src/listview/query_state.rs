//! Query state for a single list view: paging, sorting, search text and filters.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Selected filter values keyed by filter name (e.g. "year" -> {"1", "2"})
pub type Filters = BTreeMap<String, BTreeSet<String>>;

/// Errors raised when a page change would leave the valid range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
  #[error("page numbers start at 1")]
  Zero,

  #[error("page {requested} is past the last page ({last})")]
  PastEnd { requested: u32, last: u32 },

  #[error("unsupported page size {0}; expected one of 5, 10, 20, 50")]
  InvalidPageSize(u32),
}

/// Rows per page. Only the sizes offered by the page size selector are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "u32")]
pub enum PageSize {
  Five,
  #[default]
  Ten,
  Twenty,
  Fifty,
}

impl PageSize {
  pub const ALL: [PageSize; 4] = [
    PageSize::Five,
    PageSize::Ten,
    PageSize::Twenty,
    PageSize::Fifty,
  ];

  pub fn get(self) -> u32 {
    match self {
      PageSize::Five => 5,
      PageSize::Ten => 10,
      PageSize::Twenty => 20,
      PageSize::Fifty => 50,
    }
  }

  /// Next larger size, saturating at the largest
  pub fn larger(self) -> Self {
    let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
    Self::ALL[(idx + 1).min(Self::ALL.len() - 1)]
  }

  /// Next smaller size, saturating at the smallest
  pub fn smaller(self) -> Self {
    let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
    Self::ALL[idx.saturating_sub(1)]
  }
}

impl TryFrom<u32> for PageSize {
  type Error = PageError;

  fn try_from(value: u32) -> Result<Self, Self::Error> {
    Self::ALL
      .into_iter()
      .find(|s| s.get() == value)
      .ok_or(PageError::InvalidPageSize(value))
  }
}

impl fmt::Display for PageSize {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.get())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
  Ascending,
  Descending,
}

impl SortDirection {
  /// Value of the backend's `order` parameter
  pub fn as_param(self) -> &'static str {
    match self {
      SortDirection::Ascending => "asc",
      SortDirection::Descending => "desc",
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      SortDirection::Ascending => SortDirection::Descending,
      SortDirection::Descending => SortDirection::Ascending,
    }
  }
}

/// Active sort, keyed by display column key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
  pub key: String,
  pub direction: SortDirection,
}

/// Query state for one entity collection.
///
/// Page policy: out-of-range page requests are rejected and leave the state
/// untouched. Setting the search text, the filters or the page size moves
/// back to page 1. Sorting and page navigation keep the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
  page: u32,
  page_size: PageSize,
  sort: Option<Sort>,
  search: String,
  filters: Filters,
  /// Total matching rows from the last applied response, if any
  total_count: Option<u64>,
}

impl Default for QueryState {
  fn default() -> Self {
    Self::new(PageSize::default())
  }
}

impl QueryState {
  pub fn new(page_size: PageSize) -> Self {
    Self {
      page: 1,
      page_size,
      sort: None,
      search: String::new(),
      filters: Filters::new(),
      total_count: None,
    }
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn page_size(&self) -> PageSize {
    self.page_size
  }

  pub fn sort(&self) -> Option<&Sort> {
    self.sort.as_ref()
  }

  pub fn search(&self) -> &str {
    &self.search
  }

  pub fn filters(&self) -> &Filters {
    &self.filters
  }

  pub fn total_count(&self) -> Option<u64> {
    self.total_count
  }

  /// Number of pages for the last known total (never less than 1)
  pub fn total_pages(&self) -> Option<u32> {
    self
      .total_count
      .map(|total| pages_for(total, self.page_size))
  }

  pub fn set_page(&mut self, page: u32) -> Result<(), PageError> {
    if page == 0 {
      return Err(PageError::Zero);
    }
    if let Some(last) = self.total_pages() {
      if page > last {
        return Err(PageError::PastEnd {
          requested: page,
          last,
        });
      }
    }
    self.page = page;
    Ok(())
  }

  pub fn next_page(&mut self) -> Result<(), PageError> {
    self.set_page(self.page.saturating_add(1))
  }

  pub fn prev_page(&mut self) -> Result<(), PageError> {
    self.set_page(self.page - 1)
  }

  /// Change the page size. Returns `false`, leaving the page alone, when
  /// `page_size` is already current.
  pub fn set_page_size(&mut self, page_size: PageSize) -> bool {
    if page_size == self.page_size {
      return false;
    }
    self.page_size = page_size;
    self.page = 1;
    true
  }

  /// Apply a submitted search. Leading and trailing whitespace is dropped.
  pub fn set_search(&mut self, text: &str) {
    self.search = text.trim().to_string();
    self.page = 1;
    self.total_count = None;
  }

  /// Sort by `key`: the same key flips the direction, a new key starts ascending
  pub fn set_sort(&mut self, key: &str) {
    match &mut self.sort {
      Some(sort) if sort.key == key => sort.direction = sort.direction.toggled(),
      _ => {
        self.sort = Some(Sort {
          key: key.to_string(),
          direction: SortDirection::Ascending,
        })
      }
    }
  }

  /// Replace the filter set. Filters with no selected values are dropped.
  pub fn set_filters(&mut self, filters: Filters) {
    self.filters = filters
      .into_iter()
      .filter(|(_, values)| !values.is_empty())
      .collect();
    self.page = 1;
    self.total_count = None;
  }

  /// Clear search, filters and sort. The page size is kept.
  pub fn reset(&mut self) {
    self.search.clear();
    self.filters.clear();
    self.sort = None;
    self.page = 1;
    self.total_count = None;
  }

  /// Record the total from a response.
  ///
  /// Returns `true` when the current page no longer exists and was clamped
  /// to the last page.
  pub fn record_total(&mut self, total: u64) -> bool {
    self.total_count = Some(total);
    let last = pages_for(total, self.page_size);
    if self.page > last {
      self.page = last;
      true
    } else {
      false
    }
  }
}

fn pages_for(total: u64, page_size: PageSize) -> u32 {
  let pages = total.div_ceil(u64::from(page_size.get())).max(1);
  u32::try_from(pages).unwrap_or(u32::MAX)
}
