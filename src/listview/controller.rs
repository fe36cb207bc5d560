//! Generic list view controller: query state, cache-or-fetch, stale response discard.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use thiserror::Error;

use super::cache::{codes_key, derive_key, CacheEntry, Page, ResponseCache};
use super::params::{ListConfig, ListParams};
use super::query_state::{Filters, PageError, PageSize, QueryState};
use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum ListError {
  #[error("{0}")]
  FetchFailed(#[source] ApiError),

  #[error(transparent)]
  Page(#[from] PageError),

  #[error("column {0:?} is not sortable")]
  UnknownSortKey(String),

  #[error("unknown filter {0:?}")]
  UnknownFilter(String),
}

/// How a fetch treats the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchOptions {
  /// Skip the cache read (the response is still cached)
  pub background: bool,
}

impl FetchOptions {
  pub const FOREGROUND: Self = Self { background: false };
  pub const BACKGROUND: Self = Self { background: true };
}

/// Where the current rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
  Cache,
  Network,
}

/// A network request the caller has to run and report back.
#[derive(Debug, Clone)]
pub struct FetchTicket {
  seq: u64,
  key: String,
  pub params: ListParams,
}

/// Result of [`ListViewController::begin_fetch`].
#[derive(Debug)]
pub enum FetchPlan {
  /// Served from the cache and now current. `clamped` means the cached
  /// total put the page past the end; the page moved to the last one and
  /// another fetch is due.
  Cached { clamped: bool },
  /// Not cached (or a background refresh): run the fetch for this ticket
  Remote(FetchTicket),
}

/// Result of [`ListViewController::complete_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
  /// Rows and totals updated
  Applied,
  /// Rows updated, but the page no longer exists and was moved to the last
  /// page. Another fetch is due.
  PageClamped,
  /// A newer request was issued after this one; the response was dropped
  Stale,
}

/// Pagination summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
  pub page: u32,
  pub total_pages: u32,
  pub page_size: PageSize,
  /// 1-based index of the first row on this page, 0 when empty
  pub first_row: u64,
  pub last_row: u64,
  pub total_count: u64,
}

/// Controller for one entity collection.
///
/// Owns the query state and a handle on the session cache. Every
/// `begin_fetch` and `invalidate` bumps a sequence number, and
/// `complete_fetch` ignores any response whose ticket is not the latest, so
/// a slow earlier response can't overwrite a newer one.
pub struct ListViewController<R> {
  config: ListConfig,
  state: QueryState,
  cache: ResponseCache,
  seq: u64,
  current: Option<Page<R>>,
  source: Option<PageSource>,
  /// State the current rows were fetched with
  shown: Option<QueryState>,
}

impl<R> ListViewController<R>
where
  R: Clone + Serialize + DeserializeOwned,
{
  pub fn new(config: ListConfig, cache: ResponseCache, page_size: PageSize) -> Self {
    Self {
      config,
      state: QueryState::new(page_size),
      cache,
      seq: 0,
      current: None,
      source: None,
      shown: None,
    }
  }

  pub fn state(&self) -> &QueryState {
    &self.state
  }

  pub fn rows(&self) -> &[R] {
    self.current.as_ref().map(|p| p.rows.as_slice()).unwrap_or(&[])
  }

  pub fn has_data(&self) -> bool {
    self.current.is_some()
  }

  pub fn source(&self) -> Option<PageSource> {
    self.source
  }

  pub fn set_page(&mut self, page: u32) -> Result<(), ListError> {
    Ok(self.state.set_page(page)?)
  }

  pub fn next_page(&mut self) -> Result<(), ListError> {
    Ok(self.state.next_page()?)
  }

  pub fn prev_page(&mut self) -> Result<(), ListError> {
    Ok(self.state.prev_page()?)
  }

  /// Returns `false` when the size was already current
  pub fn set_page_size(&mut self, page_size: PageSize) -> bool {
    self.state.set_page_size(page_size)
  }

  pub fn set_search(&mut self, text: &str) {
    self.state.set_search(text);
  }

  /// Sort by a display column key. Keys missing from the sort table are rejected.
  pub fn set_sort(&mut self, key: &str) -> Result<(), ListError> {
    if self.config.sort_field(key).is_none() {
      return Err(ListError::UnknownSortKey(key.to_string()));
    }
    self.state.set_sort(key);
    Ok(())
  }

  pub fn set_filters(&mut self, filters: Filters) -> Result<(), ListError> {
    if let Some(name) = filters
      .keys()
      .find(|name| self.config.filter_param(name).is_none())
    {
      return Err(ListError::UnknownFilter(name.clone()));
    }
    self.state.set_filters(filters);
    Ok(())
  }

  pub fn reset(&mut self) {
    self.state.reset();
  }

  /// Request parameters for the current state
  pub fn params(&self) -> ListParams {
    ListParams::from_state(&self.state, &self.config)
  }

  /// Cache key for the current state
  #[cfg(test)]
  pub fn cache_key(&self) -> String {
    derive_key(self.config.namespace, &self.params())
  }

  pub fn page_info(&self) -> PageInfo {
    let page_size = self.state.page_size();
    let total_count = self.state.total_count().unwrap_or(0);
    let page = self.state.page();
    let size = u64::from(page_size.get());
    let first_row = if total_count == 0 {
      0
    } else {
      (u64::from(page) - 1) * size + 1
    };
    PageInfo {
      page,
      total_pages: self.state.total_pages().unwrap_or(1),
      page_size,
      first_row,
      last_row: (u64::from(page) * size).min(total_count),
      total_count,
    }
  }

  /// Drop every cached response of this namespace.
  ///
  /// Call after a successful create, update or delete. Any request still in
  /// flight is superseded.
  pub fn invalidate(&mut self) -> usize {
    self.seq += 1;
    let prefix = self.config.key_prefix();
    match self.cache.invalidate_namespace(&prefix) {
      Ok(removed) => removed,
      Err(e) => {
        tracing::warn!(namespace = self.config.namespace, error = %e, "cache invalidation failed");
        0
      }
    }
  }

  /// Resolve the current state against the cache.
  ///
  /// On a hit (and `background` unset) the cached page becomes current.
  /// Otherwise the caller gets a ticket to run the fetch with.
  pub fn begin_fetch(&mut self, options: FetchOptions) -> FetchPlan {
    self.seq += 1;
    let params = self.params();
    let key = derive_key(self.config.namespace, &params);

    if !options.background {
      match self.cache.get::<R>(&key) {
        Ok(Some(entry)) => {
          tracing::debug!(namespace = self.config.namespace, %key, "cache hit");
          let clamped = self.apply(entry.into_page(), PageSource::Cache);
          return FetchPlan::Cached { clamped };
        }
        Ok(None) => {
          tracing::debug!(namespace = self.config.namespace, %key, "cache miss");
        }
        Err(e) => {
          tracing::warn!(namespace = self.config.namespace, error = %e, "cache read failed, fetching");
        }
      }
    }

    FetchPlan::Remote(FetchTicket {
      seq: self.seq,
      key,
      params,
    })
  }

  /// Apply the outcome of a ticket's fetch.
  ///
  /// Failures leave rows and cache untouched and put the query state back to
  /// the one the current rows were fetched with. Responses to superseded
  /// tickets are dropped whether they succeeded or not.
  pub fn complete_fetch(
    &mut self,
    ticket: FetchTicket,
    result: Result<Page<R>, ApiError>,
  ) -> Result<FetchStatus, ListError> {
    if ticket.seq != self.seq {
      tracing::debug!(
        namespace = self.config.namespace,
        seq = ticket.seq,
        latest = self.seq,
        "discarding stale response"
      );
      return Ok(FetchStatus::Stale);
    }

    let page = match result {
      Ok(page) => page,
      Err(e) => {
        if let Some(shown) = &self.shown {
          self.state = shown.clone();
        }
        return Err(ListError::FetchFailed(e));
      }
    };

    if let Err(e) = self.cache.put(&ticket.key, &CacheEntry::new(page.clone())) {
      tracing::warn!(namespace = self.config.namespace, error = %e, "cache write failed");
    }

    if self.apply(page, PageSource::Network) {
      Ok(FetchStatus::PageClamped)
    } else {
      Ok(FetchStatus::Applied)
    }
  }

  /// Cache-or-fetch in one call.
  ///
  /// When the response shows the page no longer exists, the last page is
  /// fetched once more.
  #[allow(dead_code)]
  pub async fn fetch_page<F, Fut>(
    &mut self,
    fetch: F,
    options: FetchOptions,
  ) -> Result<Page<R>, ListError>
  where
    F: Fn(ListParams) -> Fut,
    Fut: Future<Output = Result<Page<R>, ApiError>>,
  {
    let mut follow_up = true;
    loop {
      let clamped = match self.begin_fetch(options) {
        FetchPlan::Cached { clamped } => clamped,
        FetchPlan::Remote(ticket) => {
          let result = fetch(ticket.params.clone()).await;
          self.complete_fetch(ticket, result)? == FetchStatus::PageClamped
        }
      };
      if clamped && follow_up {
        follow_up = false;
        continue;
      }

      return Ok(self.current.clone().unwrap_or(Page {
        rows: Vec::new(),
        total_count: 0,
      }));
    }
  }

  fn apply(&mut self, page: Page<R>, source: PageSource) -> bool {
    let clamped = self.state.record_total(page.total_count);
    self.current = Some(page);
    self.source = Some(source);
    self.shown = Some(self.state.clone());
    clamped
  }
}

/// Fetch a namespace's code list (used for filter and form options),
/// going through the cache like list pages do.
pub async fn fetch_codes<F, Fut>(
  cache: &ResponseCache,
  namespace: &str,
  fetch: F,
) -> Result<Vec<String>, ApiError>
where
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<Vec<String>, ApiError>>,
{
  let key = codes_key(namespace);
  match cache.get::<String>(&key) {
    Ok(Some(entry)) => return Ok(entry.rows),
    Ok(None) => {}
    Err(e) => tracing::warn!(namespace, error = %e, "cache read failed, fetching codes"),
  }

  let codes = fetch().await?;
  let entry = CacheEntry::new(Page {
    total_count: codes.len() as u64,
    rows: codes.clone(),
  });
  if let Err(e) = cache.put(&key, &entry) {
    tracing::warn!(namespace, error = %e, "cache write failed");
  }
  Ok(codes)
}
