use crate::api::{ApiError, SsisClient};
use crate::entity::{form, Entity, FilterOptions};
use crate::listview::{
  fetch_codes, FetchOptions, FetchPlan, FetchStatus, FetchTicket, ListError, ListViewController,
  Page, PageSize, PageSource, QueryState, ResponseCache, SortDirection,
};
use crate::request::RequestQueue;
use crate::ui::components::{
  ConfirmDialog, ConfirmEvent, FilterPicker, FilterPickerEvent, FormEvent, FormMode, KeyResult,
  Prompt, PromptEvent, RecordForm, SearchEvent, SearchInput,
};
use crate::ui::renderfns::{draw_footer, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{ensure_valid_selection, Message};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Finished background work, drained on tick
enum Msg<R> {
  Page {
    ticket: FetchTicket,
    result: Result<Page<R>, ApiError>,
  },
  Codes {
    namespace: &'static str,
    result: Result<Vec<String>, ApiError>,
  },
  Saved {
    created: bool,
    result: Result<(), ApiError>,
  },
  Deleted {
    id: String,
    result: Result<(), ApiError>,
  },
  PhotoUploaded {
    id: String,
    result: Result<Option<String>, ApiError>,
  },
}

enum PromptKind {
  GoToPage,
  /// Photo path for this student id
  Photo(String),
}

/// Paginated, searchable table for one entity collection, with the record
/// form, delete confirmation and filter picker as overlays.
pub struct EntityListView<E: Entity> {
  client: SsisClient,
  cache: ResponseCache,
  controller: ListViewController<E::Record>,
  requests: RequestQueue<Msg<E::Record>>,
  table_state: TableState,
  loading: bool,
  /// A clamped page already triggered its follow-up fetch
  clamp_retried: bool,
  search: SearchInput,
  filters: FilterPicker,
  form: Option<RecordForm>,
  confirm: ConfirmDialog,
  pending_delete: Option<String>,
  prompt: Prompt,
  prompt_kind: Option<PromptKind>,
  codes: BTreeMap<&'static str, Vec<String>>,
  message: Option<Message>,
  session_expired: bool,
  _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityListView<E> {
  pub fn new(client: SsisClient, cache: ResponseCache, page_size: PageSize) -> Self {
    let controller = ListViewController::new(E::LIST, cache.clone(), page_size);
    let mut view = Self {
      client,
      cache,
      controller,
      requests: RequestQueue::new(),
      table_state: TableState::default(),
      loading: false,
      clamp_retried: false,
      search: SearchInput::new(),
      filters: FilterPicker::new(),
      form: None,
      confirm: ConfirmDialog::new(),
      pending_delete: None,
      prompt: Prompt::new(),
      prompt_kind: None,
      codes: BTreeMap::new(),
      message: None,
      session_expired: false,
      _entity: PhantomData,
    };

    view.fetch(FetchOptions::FOREGROUND);
    view.load_codes(filter_lookups::<E>());
    view
  }

  fn selected(&self) -> Option<&E::Record> {
    self
      .table_state
      .selected()
      .and_then(|i| self.controller.rows().get(i))
  }

  fn fetch(&mut self, options: FetchOptions) {
    match self.controller.begin_fetch(options) {
      FetchPlan::Cached { clamped: true } if !self.clamp_retried => {
        debug!(
          namespace = E::PATH,
          page = self.controller.state().page(),
          "cached page out of range, refetching"
        );
        self.clamp_retried = true;
        self.fetch(FetchOptions::FOREGROUND);
      }
      FetchPlan::Cached { .. } => {
        self.loading = false;
        self.clamp_retried = false;
      }
      FetchPlan::Remote(ticket) => {
        self.loading = true;
        let client = self.client.clone();
        self.requests.spawn(async move {
          let result = client.list::<E>(ticket.params.clone()).await;
          Msg::Page { ticket, result }
        });
      }
    }
  }

  fn load_codes(&mut self, namespaces: impl IntoIterator<Item = &'static str>) {
    for namespace in namespaces {
      let client = self.client.clone();
      let cache = self.cache.clone();
      self.requests.spawn(async move {
        let result = fetch_codes(&cache, namespace, || client.codes(namespace)).await;
        Msg::Codes { namespace, result }
      });
    }
  }

  fn report(&mut self, err: &ApiError) {
    if err.is_unauthorized() {
      self.session_expired = true;
    }
    warn!(namespace = E::PATH, error = %err, "request failed");
    self.message = Some(Message::Error(err.user_message(E::CONFLICT_MESSAGE)));
  }

  fn handle_msg(&mut self, msg: Msg<E::Record>) {
    match msg {
      Msg::Page { ticket, result } => self.handle_page(ticket, result),
      Msg::Codes { namespace, result } => match result {
        Ok(codes) => {
          self.filters.set_lookup(namespace, &codes);
          if let Some(form) = &mut self.form {
            form.set_lookup(namespace, &codes);
          }
          self.codes.insert(namespace, codes);
        }
        Err(e) => self.report(&e),
      },
      Msg::Saved { created, result } => match result {
        Ok(()) => {
          self.form = None;
          let verb = if created { "Added" } else { "Updated" };
          self.message = Some(Message::Info(format!("{} {}.", verb, E::SINGULAR.to_lowercase())));
          self.after_mutation();
        }
        Err(e) if e.is_unauthorized() => self.report(&e),
        Err(e) => match &mut self.form {
          Some(form) => form.set_error(e.user_message(E::CONFLICT_MESSAGE)),
          None => self.report(&e),
        },
      },
      Msg::Deleted { id, result } => match result {
        Ok(()) => {
          self.message = Some(Message::Info(format!(
            "Deleted {} {}.",
            E::SINGULAR.to_lowercase(),
            id
          )));
          self.after_mutation();
        }
        Err(e) => self.report(&e),
      },
      Msg::PhotoUploaded { id, result } => match result {
        Ok(_) => {
          self.message = Some(Message::Info(format!("Photo uploaded for {}.", id)));
          self.after_mutation();
        }
        Err(e) => self.report(&e),
      },
    }
  }

  fn handle_page(&mut self, ticket: FetchTicket, result: Result<Page<E::Record>, ApiError>) {
    match self.controller.complete_fetch(ticket, result) {
      Ok(FetchStatus::Stale) => {}
      Ok(FetchStatus::PageClamped) if !self.clamp_retried => {
        debug!(
          namespace = E::PATH,
          page = self.controller.state().page(),
          "page out of range, refetching"
        );
        self.clamp_retried = true;
        self.fetch(FetchOptions::FOREGROUND);
      }
      Ok(_) => {
        self.loading = false;
        self.clamp_retried = false;
      }
      Err(ListError::FetchFailed(e)) => {
        self.loading = false;
        self.clamp_retried = false;
        self.report(&e);
      }
      Err(e) => {
        self.loading = false;
        self.message = Some(Message::Error(e.to_string()));
      }
    }
  }

  /// Drop cached pages of this collection and of collections showing its
  /// codes, then refresh the visible page.
  fn after_mutation(&mut self) {
    let removed = self.controller.invalidate();
    debug!(namespace = E::PATH, removed, "invalidated cache");
    for namespace in E::DEPENDENTS {
      if let Err(e) = self.cache.invalidate_namespace(&format!("{}_", namespace)) {
        warn!(namespace, error = %e, "failed to invalidate dependent cache");
      }
    }
    self.fetch(FetchOptions::BACKGROUND);
  }

  /// Apply a state change and fetch, or show why it was refused
  fn apply(&mut self, result: Result<(), ListError>) {
    match result {
      Ok(()) => self.fetch(FetchOptions::FOREGROUND),
      Err(e) => self.message = Some(Message::Error(e.to_string())),
    }
  }

  fn open_form(&mut self, edit: bool) {
    let (mode, values, title) = if edit {
      let Some(record) = self.selected() else {
        return;
      };
      (
        FormMode::Edit(E::id(record).to_string()),
        E::form_values(record),
        format!("Edit {}", E::SINGULAR),
      )
    } else {
      (FormMode::Create, Vec::new(), format!("Add {}", E::SINGULAR))
    };

    let mut form = RecordForm::new(title, mode, E::FORM, &values);
    let lookups = form.lookups();
    for namespace in &lookups {
      if let Some(codes) = self.codes.get(namespace) {
        form.set_lookup(namespace, codes);
      }
    }
    self.form = Some(form);
    self.load_codes(lookups);
  }

  fn submit_form(&mut self, values: Vec<String>) {
    let Some(form) = &self.form else {
      return;
    };
    let mode = form.mode().clone();
    let codes = &self.codes;
    let payload = form::validate(E::FORM, &values, |ns| codes.get(ns).map(Vec::as_slice))
      .and_then(|values| E::payload(&values));

    let payload = match payload {
      Ok(payload) => payload,
      Err(e) => {
        if let Some(form) = &mut self.form {
          form.set_error(e.to_string());
        }
        return;
      }
    };

    if let Some(form) = &mut self.form {
      form.set_submitting();
    }
    let client = self.client.clone();
    match mode {
      FormMode::Create => self.requests.spawn(async move {
        let result = client.create::<E>(&payload).await;
        Msg::Saved {
          created: true,
          result,
        }
      }),
      FormMode::Edit(id) => self.requests.spawn(async move {
        let result = client.update::<E>(&id, &payload).await;
        Msg::Saved {
          created: false,
          result,
        }
      }),
    }
  }

  fn ask_delete(&mut self) {
    let Some(id) = self.selected().map(|r| E::id(r).to_string()) else {
      return;
    };
    self.confirm.show(format!(
      "Delete {} {}? This cannot be undone.",
      E::SINGULAR.to_lowercase(),
      id
    ));
    self.pending_delete = Some(id);
  }

  fn delete_pending(&mut self) {
    let Some(id) = self.pending_delete.take() else {
      return;
    };
    let client = self.client.clone();
    self.requests.spawn(async move {
      let result = client.delete::<E>(&id).await;
      Msg::Deleted { id, result }
    });
  }

  fn prompt_submitted(&mut self, value: String) {
    match self.prompt_kind.take() {
      Some(PromptKind::GoToPage) => match value.parse::<u32>() {
        Ok(page) => {
          let result = self.controller.set_page(page);
          self.apply(result);
        }
        Err(_) => self.message = Some(Message::Error(format!("{:?} is not a page number", value))),
      },
      Some(PromptKind::Photo(id)) => {
        if value.is_empty() {
          return;
        }
        let path = expand_home(&value);
        let client = self.client.clone();
        self.requests.spawn(async move {
          let result = client.upload_photo(&id, &path).await;
          Msg::PhotoUploaded { id, result }
        });
      }
      None => {}
    }
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> bool {
    if let Some(form) = &mut self.form {
      match form.handle_key(key) {
        KeyResult::Event(FormEvent::Submitted(values)) => self.submit_form(values),
        KeyResult::Event(FormEvent::Cancelled) => self.form = None,
        _ => {}
      }
      return true;
    }

    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        self.delete_pending();
        return true;
      }
      KeyResult::Event(ConfirmEvent::Cancelled) => {
        self.pending_delete = None;
        return true;
      }
      KeyResult::Handled => return true,
      KeyResult::NotHandled => {}
    }

    match self.prompt.handle_key(key) {
      KeyResult::Event(PromptEvent::Submitted(value)) => {
        self.prompt_submitted(value);
        return true;
      }
      KeyResult::Event(PromptEvent::Cancelled) => {
        self.prompt_kind = None;
        return true;
      }
      KeyResult::Handled => return true,
      KeyResult::NotHandled => {}
    }

    match self.filters.handle_key(key) {
      KeyResult::Event(FilterPickerEvent::Applied(filters)) => {
        let result = self.controller.set_filters(filters);
        self.apply(result);
        return true;
      }
      KeyResult::Event(FilterPickerEvent::Cancelled) | KeyResult::Handled => return true,
      KeyResult::NotHandled => {}
    }

    let current = self.controller.state().search().to_string();
    match self.search.handle_key(key, &current) {
      KeyResult::Event(SearchEvent::Submitted(text)) => {
        if text != current {
          self.controller.set_search(&text);
          self.fetch(FetchOptions::FOREGROUND);
        }
        true
      }
      KeyResult::Event(SearchEvent::Cleared) => {
        if !current.is_empty() {
          self.controller.set_search("");
          self.fetch(FetchOptions::FOREGROUND);
        }
        true
      }
      KeyResult::Handled => true,
      KeyResult::NotHandled => false,
    }
  }

  fn handle_list_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right => {
        let result = self.controller.next_page();
        self.apply(result);
      }
      KeyCode::Char('p') | KeyCode::Left => {
        let result = self.controller.prev_page();
        self.apply(result);
      }
      KeyCode::Char('g') => {
        let total = self.controller.page_info().total_pages;
        self.prompt.show(format!("Go to page (1-{})", total));
        self.prompt_kind = Some(PromptKind::GoToPage);
      }
      KeyCode::Char(']') => {
        let size = self.controller.state().page_size().larger();
        if self.controller.set_page_size(size) {
          self.fetch(FetchOptions::FOREGROUND);
        }
      }
      KeyCode::Char('[') => {
        let size = self.controller.state().page_size().smaller();
        if self.controller.set_page_size(size) {
          self.fetch(FetchOptions::FOREGROUND);
        }
      }
      KeyCode::Char(c @ '1'..='9') => {
        let idx = c as usize - '1' as usize;
        if let Some(column) = E::COLUMNS.get(idx) {
          let result = self.controller.set_sort(column.key);
          self.apply(result);
        }
      }
      KeyCode::Char('f') if !E::FILTERS.is_empty() => {
        let codes = &self.codes;
        self.filters.show(E::FILTERS, self.controller.state().filters(), |ns| {
          codes.get(ns).map(Vec::as_slice)
        });
        self.load_codes(filter_lookups::<E>());
      }
      KeyCode::Char('a') => self.open_form(false),
      KeyCode::Char('e') | KeyCode::Enter => self.open_form(true),
      KeyCode::Char('d') => self.ask_delete(),
      KeyCode::Char('u') if E::HAS_PHOTO => {
        if let Some(id) = self.selected().map(|r| E::id(r).to_string()) {
          self.prompt.show(format!("Photo file for {}", id));
          self.prompt_kind = Some(PromptKind::Photo(id));
        }
      }
      KeyCode::Char('r') => self.fetch(FetchOptions::BACKGROUND),
      KeyCode::Esc => self.message = None,
      _ => {}
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.controller.rows().len();
    ensure_valid_selection(&mut self.table_state, len);

    let info = self.controller.page_info();
    let marker = if self.loading {
      " · loading..."
    } else if self.controller.source() == Some(PageSource::Cache) {
      " · cached"
    } else {
      ""
    };
    let title = format!(" {} ({}){} ", E::TITLE, info.total_count, marker);

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if !self.controller.has_data() {
        if self.loading {
          "Loading...".to_string()
        } else {
          format!("Failed to load {}. Press 'r' to retry.", E::TITLE.to_lowercase())
        }
      } else {
        format!("No {} found.", E::TITLE.to_lowercase())
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let sort = self.controller.state().sort();
    let header = Row::new(E::COLUMNS.iter().enumerate().map(|(i, column)| {
      let arrow = match sort {
        Some(s) if s.key == column.key => match s.direction {
          SortDirection::Ascending => " ▲",
          SortDirection::Descending => " ▼",
        },
        _ => "",
      };
      let label = if i < 9 && E::is_sortable(column) {
        format!("{}:{}{}", i + 1, column.label, arrow)
      } else {
        column.label.to_string()
      };
      Cell::from(label)
    }))
    .style(Style::default().fg(Color::Yellow).bold());

    let rows: Vec<Row> = self
      .controller
      .rows()
      .iter()
      .map(|record| Row::new(E::cells(record).into_iter().map(Cell::from)))
      .collect();

    let widths: Vec<Constraint> = E::COLUMNS.iter().map(|c| Constraint::Min(c.width)).collect();

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl<E: Entity> View for EntityListView<E> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if !self.handle_overlays(key) {
      self.handle_list_key(key);
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);

    self.render_table(frame, chunks[0]);

    let info = self.controller.page_info();
    let query = query_summary(self.controller.state());
    draw_footer(frame, chunks[1], &info, &query, self.message.as_ref());

    self.search.render_overlay(frame, area);
    self.filters.render_overlay(frame, area);
    self.prompt.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
    if let Some(form) = &self.form {
      form.render_overlay(frame, area);
    }
  }

  fn breadcrumb_label(&self) -> String {
    E::TITLE.to_string()
  }

  fn tick(&mut self) -> ViewAction {
    for msg in self.requests.poll() {
      self.handle_msg(msg);
    }
    if std::mem::take(&mut self.session_expired) {
      return ViewAction::SessionExpired;
    }
    ViewAction::None
  }

  fn handle_command(&mut self, command: &str) -> bool {
    match command {
      "reset" => {
        self.controller.reset();
        self.message = Some(Message::Info("Cleared search, filters and sort.".to_string()));
        self.fetch(FetchOptions::FOREGROUND);
        true
      }
      "refresh" => {
        self.fetch(FetchOptions::BACKGROUND);
        true
      }
      _ => false,
    }
  }

  fn is_capturing_input(&self) -> bool {
    self.form.is_some()
      || self.confirm.is_active()
      || self.prompt.is_active()
      || self.filters.is_active()
      || self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new("/", "search").with_priority(10),
      ShortcutInfo::new("n/p", "page").with_priority(20),
      ShortcutInfo::new("1-9", "sort").with_priority(30),
      ShortcutInfo::new("a", "add").with_priority(40),
      ShortcutInfo::new("e", "edit").with_priority(41),
      ShortcutInfo::new("d", "delete").with_priority(42),
      ShortcutInfo::new("r", "refresh").with_priority(60),
      ShortcutInfo::new(":", "command").with_priority(80),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ];
    if !E::FILTERS.is_empty() {
      shortcuts.push(ShortcutInfo::new("f", "filter").with_priority(15));
    }
    if E::HAS_PHOTO {
      shortcuts.push(ShortcutInfo::new("u", "photo").with_priority(45));
    }
    shortcuts
  }
}

/// Namespaces whose codes the filter picker offers
fn filter_lookups<E: Entity>() -> Vec<&'static str> {
  E::FILTERS
    .iter()
    .filter_map(|f| match f.options {
      FilterOptions::Lookup(ns) => Some(ns),
      FilterOptions::Fixed(_) => None,
    })
    .collect()
}

/// Active search and filters for the footer, e.g. `"ana" year=1,3`
fn query_summary(state: &QueryState) -> String {
  let mut parts = Vec::new();
  if !state.search().is_empty() {
    parts.push(format!("{:?}", truncate(state.search(), 30)));
  }
  for (name, values) in state.filters() {
    if values.is_empty() {
      continue;
    }
    let joined: Vec<&str> = values.iter().map(String::as_str).collect();
    parts.push(format!("{}={}", name, joined.join(",")));
  }
  parts.join(" ")
}

fn expand_home(path: &str) -> PathBuf {
  match path.strip_prefix("~/") {
    Some(rest) => dirs::home_dir()
      .map(|home| home.join(rest))
      .unwrap_or_else(|| PathBuf::from(path)),
    None => PathBuf::from(path),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::entity::{Colleges, Programs, Students};
  use crate::listview::MemoryStorage;
  use crossterm::event::KeyModifiers;
  use serde_json::json;
  use std::collections::BTreeSet;

  fn view<E: Entity>(cache: &ResponseCache) -> EntityListView<E> {
    let client = SsisClient::new(&Config::default()).unwrap();
    EntityListView::new(client, cache.clone(), PageSize::Ten)
  }

  fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
  }

  fn program(code: &str) -> <Programs as Entity>::Record {
    serde_json::from_value(json!({
      "program_code": code,
      "program_name": format!("Program {}", code),
      "college_code": null,
    }))
    .unwrap()
  }

  /// Cache the first page of `E` through its own controller
  fn seed<E: Entity>(cache: &ResponseCache) -> ListViewController<E::Record> {
    let mut ctl = ListViewController::new(E::LIST, cache.clone(), PageSize::Ten);
    let FetchPlan::Remote(ticket) = ctl.begin_fetch(FetchOptions::FOREGROUND) else {
      panic!("expected a remote fetch");
    };
    let page = Page {
      rows: Vec::new(),
      total_count: 0,
    };
    ctl.complete_fetch(ticket, Ok(page)).unwrap();
    ctl
  }

  #[test]
  fn test_query_summary() {
    let mut state = QueryState::new(PageSize::Ten);
    assert_eq!(query_summary(&state), "");

    state.set_search("ana");
    let mut filters = BTreeMap::new();
    filters.insert("year".to_string(), BTreeSet::from(["1".to_string(), "3".to_string()]));
    filters.insert("gender".to_string(), BTreeSet::new());
    state.set_filters(filters);
    assert_eq!(query_summary(&state), "\"ana\" year=1,3");
  }

  #[test]
  fn test_filter_lookups() {
    assert_eq!(filter_lookups::<Students>(), vec!["programs"]);
    assert!(filter_lookups::<Programs>().is_empty());
  }

  #[test]
  fn test_expand_home() {
    assert_eq!(expand_home("/tmp/a.png"), PathBuf::from("/tmp/a.png"));
    if let Some(home) = dirs::home_dir() {
      assert_eq!(expand_home("~/a.png"), home.join("a.png"));
    }
  }

  #[tokio::test]
  async fn test_page_result_fills_table() {
    let cache = ResponseCache::new(MemoryStorage::new());
    let mut view = view::<Programs>(&cache);
    assert!(view.loading);

    let FetchPlan::Remote(ticket) = view.controller.begin_fetch(FetchOptions::BACKGROUND) else {
      panic!("expected a remote fetch");
    };
    let page = Page {
      rows: vec![program("BSCS"), program("BSIT")],
      total_count: 2,
    };
    view.handle_msg(Msg::Page {
      ticket,
      result: Ok(page),
    });

    assert!(!view.loading);
    assert_eq!(view.controller.rows().len(), 2);
    assert_eq!(view.controller.page_info().total_count, 2);
  }

  #[tokio::test]
  async fn test_unauthorized_expires_session_on_tick() {
    let cache = ResponseCache::new(MemoryStorage::new());
    let mut view = view::<Programs>(&cache);

    let FetchPlan::Remote(ticket) = view.controller.begin_fetch(FetchOptions::BACKGROUND) else {
      panic!("expected a remote fetch");
    };
    view.handle_msg(Msg::Page {
      ticket,
      result: Err(ApiError::Unauthorized("token expired".to_string())),
    });

    assert_eq!(view.tick(), ViewAction::SessionExpired);
    assert_eq!(view.tick(), ViewAction::None);
  }

  #[tokio::test]
  async fn test_save_invalidates_dependent_namespaces() {
    let cache = ResponseCache::new(MemoryStorage::new());
    let mut students = seed::<Students>(&cache);
    let mut colleges = seed::<Colleges>(&cache);

    let mut view = view::<Programs>(&cache);
    view.handle_msg(Msg::Saved {
      created: true,
      result: Ok(()),
    });

    assert!(matches!(
      students.begin_fetch(FetchOptions::FOREGROUND),
      FetchPlan::Remote(_)
    ));
    assert!(matches!(
      colleges.begin_fetch(FetchOptions::FOREGROUND),
      FetchPlan::Cached { clamped: false }
    ));
    assert_eq!(view.message, Some(Message::Info("Added program.".to_string())));
    assert!(view.loading);
  }

  #[tokio::test]
  async fn test_conflict_keeps_form_open() {
    let cache = ResponseCache::new(MemoryStorage::new());
    let mut view = view::<Programs>(&cache);

    view.handle_key(key('a'));
    assert!(view.form.is_some());
    assert!(view.is_capturing_input());

    if let Some(form) = &mut view.form {
      form.set_submitting();
    }
    view.handle_msg(Msg::Saved {
      created: true,
      result: Err(ApiError::Conflict("duplicate".to_string())),
    });

    assert!(view.form.is_some());
    assert_eq!(view.message, None);
  }

  #[tokio::test]
  async fn test_unsortable_column_reports_error() {
    let cache = ResponseCache::new(MemoryStorage::new());
    let mut view = view::<Students>(&cache);

    // Photo is the last of the seven student columns
    view.handle_key(key('7'));
    assert!(matches!(view.message, Some(Message::Error(_))));
    assert!(view.controller.state().sort().is_none());
  }

  #[tokio::test]
  async fn test_reset_command() {
    let cache = ResponseCache::new(MemoryStorage::new());
    let mut view = view::<Students>(&cache);
    view.controller.set_search("ana");

    assert!(view.handle_command("reset"));
    assert_eq!(view.controller.state().search(), "");
    assert!(!view.handle_command("students"));
  }
}
