use super::KeyResult;
use crate::entity::{FilterDef, FilterOptions};
use crate::listview::Filters;
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::collections::BTreeSet;

/// Events emitted by the filter picker that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPickerEvent {
  /// Enter pressed with these selections
  Applied(Filters),
  Cancelled,
}

#[derive(Debug, Clone)]
struct FilterGroup {
  name: &'static str,
  label: &'static str,
  /// Namespace whose codes fill `options`, if any
  lookup: Option<&'static str>,
  options: Vec<String>,
  selected: BTreeSet<String>,
}

/// Multi-select picker over an entity's filters.
///
/// `j`/`k` move across every option of every filter, Space toggles, `c`
/// clears all, Enter applies.
#[derive(Debug, Clone, Default)]
pub struct FilterPicker {
  active: bool,
  groups: Vec<FilterGroup>,
  /// Index into the flattened options
  cursor: usize,
}

impl FilterPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open with the current filters checked. Lookup options come from
  /// `codes`; missing ones can be filled in later with `set_lookup`.
  pub fn show<'a>(
    &mut self,
    defs: &[FilterDef],
    current: &Filters,
    codes: impl Fn(&str) -> Option<&'a [String]>,
  ) {
    self.groups = defs
      .iter()
      .map(|def| {
        let (lookup, options) = match def.options {
          FilterOptions::Fixed(values) => (None, values.iter().map(|v| v.to_string()).collect()),
          FilterOptions::Lookup(ns) => (Some(ns), codes(ns).map(<[String]>::to_vec).unwrap_or_default()),
        };
        let mut group = FilterGroup {
          name: def.name,
          label: def.label,
          lookup,
          options,
          selected: current.get(def.name).cloned().unwrap_or_default(),
        };
        merge_selected(&mut group);
        group
      })
      .collect();
    self.cursor = 0;
    self.active = true;
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.groups.clear();
    self.cursor = 0;
  }

  /// Replace the options of every filter backed by `namespace`
  pub fn set_lookup(&mut self, namespace: &str, codes: &[String]) {
    for group in &mut self.groups {
      if group.lookup == Some(namespace) {
        group.options = codes.to_vec();
        merge_selected(group);
      }
    }
    self.cursor = self.cursor.min(self.option_count().saturating_sub(1));
  }

  fn option_count(&self) -> usize {
    self.groups.iter().map(|g| g.options.len()).sum()
  }

  /// (group index, option index) of the flattened position `idx`
  fn locate(&self, mut idx: usize) -> Option<(usize, usize)> {
    for (gi, group) in self.groups.iter().enumerate() {
      if idx < group.options.len() {
        return Some((gi, idx));
      }
      idx -= group.options.len();
    }
    None
  }

  fn toggle(&mut self) {
    if let Some((gi, oi)) = self.locate(self.cursor) {
      let group = &mut self.groups[gi];
      let value = group.options[oi].clone();
      if !group.selected.remove(&value) {
        group.selected.insert(value);
      }
    }
  }

  fn selections(&self) -> Filters {
    self
      .groups
      .iter()
      .filter(|g| !g.selected.is_empty())
      .map(|g| (g.name.to_string(), g.selected.clone()))
      .collect()
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FilterPickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    let count = self.option_count();
    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(FilterPickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let filters = self.selections();
        self.hide();
        KeyResult::Event(FilterPickerEvent::Applied(filters))
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if count > 0 {
          self.cursor = (self.cursor + 1) % count;
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if count > 0 {
          self.cursor = (self.cursor + count - 1) % count;
        }
        KeyResult::Handled
      }
      KeyCode::Char(' ') | KeyCode::Char('x') => {
        self.toggle();
        KeyResult::Handled
      }
      KeyCode::Char('c') => {
        for group in &mut self.groups {
          group.selected.clear();
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let mut lines = Vec::new();
    let mut cursor_line = 0;
    let mut flat = 0;
    for group in &self.groups {
      lines.push(Line::from(Span::styled(
        group.label,
        Style::default().fg(Color::Yellow).bold(),
      )));
      if group.options.is_empty() {
        lines.push(Line::from(Span::styled(
          "  (loading...)",
          Style::default().fg(Color::DarkGray),
        )));
      }
      for option in &group.options {
        let checked = group.selected.contains(option);
        let mut style = Style::default().fg(if checked { Color::Cyan } else { Color::White });
        if flat == self.cursor {
          style = style.bg(Color::DarkGray);
          cursor_line = lines.len();
        }
        let mark = if checked { "[x]" } else { "[ ]" };
        lines.push(Line::from(Span::styled(format!("  {} {}", mark, option), style)));
        flat += 1;
      }
    }

    let height = (lines.len() as u16 + 3).min(area.height.saturating_sub(2)).max(5);
    let overlay_area = centered_rect(area, 40, height);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Filters ")
      .title_bottom(Line::from(" space toggle · c clear · enter apply ").centered());

    // Keep the cursor in view
    let visible = overlay_area.height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(visible.saturating_sub(1));

    frame.render_widget(
      Paragraph::new(lines).block(block).scroll((scroll as u16, 0)),
      overlay_area,
    );
  }
}

/// Selected values missing from the options (e.g. a deleted program) stay visible
fn merge_selected(group: &mut FilterGroup) {
  for value in &group.selected {
    if !group.options.contains(value) {
      group.options.push(value.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  const DEFS: &[FilterDef] = &[
    FilterDef {
      name: "program",
      label: "Program",
      options: FilterOptions::Lookup("programs"),
    },
    FilterDef {
      name: "year",
      label: "Year Level",
      options: FilterOptions::Fixed(&["1", "2", "3", "4"]),
    },
  ];

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn no_codes(_: &str) -> Option<&'static [String]> {
    None
  }

  #[test]
  fn test_toggle_and_apply() {
    let mut picker = FilterPicker::new();
    picker.show(DEFS, &Filters::new(), no_codes);

    // Program options not loaded yet, so the cursor starts on year "1"
    picker.handle_key(key(KeyCode::Char(' ')));
    picker.handle_key(key(KeyCode::Char('j')));
    picker.handle_key(key(KeyCode::Char('j')));
    picker.handle_key(key(KeyCode::Char(' ')));

    let mut expected = Filters::new();
    expected.insert("year".into(), BTreeSet::from(["1".to_string(), "3".to_string()]));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FilterPickerEvent::Applied(expected))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_lookup_options_arrive_later() {
    let mut picker = FilterPicker::new();
    let mut current = Filters::new();
    current.insert("program".into(), BTreeSet::from(["BSCS".to_string()]));
    picker.show(DEFS, &current, no_codes);
    assert_eq!(picker.option_count(), 1 + 4);

    picker.set_lookup("programs", &["BSCS".to_string(), "BSIT".to_string()]);
    assert_eq!(picker.option_count(), 2 + 4);

    // Un-check BSCS, check BSIT
    picker.handle_key(key(KeyCode::Char(' ')));
    picker.handle_key(key(KeyCode::Down));
    picker.handle_key(key(KeyCode::Char(' ')));
    match picker.handle_key(key(KeyCode::Enter)) {
      KeyResult::Event(FilterPickerEvent::Applied(filters)) => {
        assert_eq!(filters["program"], BTreeSet::from(["BSIT".to_string()]));
        assert!(!filters.contains_key("year"));
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn test_clear_all() {
    let mut picker = FilterPicker::new();
    let mut current = Filters::new();
    current.insert("year".into(), BTreeSet::from(["2".to_string()]));
    picker.show(DEFS, &current, no_codes);
    picker.handle_key(key(KeyCode::Char('c')));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FilterPickerEvent::Applied(Filters::new()))
    );
  }
}
