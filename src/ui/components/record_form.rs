use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::entity::{FieldKind, FormField};
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the record form that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Enter pressed. Values are aligned with the form's fields.
  Submitted(Vec<String>),
  Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
  Create,
  /// Editing the record with this id
  Edit(String),
}

#[derive(Debug, Clone)]
struct FieldState {
  field: FormField,
  input: TextInput,
  /// Values Left/Right cycle through
  options: Vec<String>,
}

impl FieldState {
  fn cycle(&mut self, forward: bool) {
    if self.options.is_empty() {
      return;
    }
    let len = self.options.len();
    let next = match self.options.iter().position(|o| o == self.input.value()) {
      Some(i) if forward => (i + 1) % len,
      Some(i) => (i + len - 1) % len,
      None if forward => 0,
      None => len - 1,
    };
    self.input.set_value(&self.options[next]);
  }
}

/// Create/edit form for one record
#[derive(Debug, Clone)]
pub struct RecordForm {
  title: String,
  mode: FormMode,
  fields: Vec<FieldState>,
  focus: usize,
  error: Option<String>,
  submitting: bool,
}

impl RecordForm {
  /// `values` pre-fills the fields (aligned with `fields`), empty for a new record
  pub fn new(title: impl Into<String>, mode: FormMode, fields: &[FormField], values: &[String]) -> Self {
    let fields: Vec<FieldState> = fields
      .iter()
      .enumerate()
      .map(|(i, field)| FieldState {
        field: *field,
        input: TextInput::with_value(values.get(i).map(String::as_str).unwrap_or("")),
        options: match field.kind {
          FieldKind::Choice(options) => options.iter().map(|o| o.to_string()).collect(),
          _ => Vec::new(),
        },
      })
      .collect();

    let mut form = Self {
      title: title.into(),
      mode,
      fields,
      focus: 0,
      error: None,
      submitting: false,
    };
    if !form.is_editable(0) {
      form.move_focus(true);
    }
    form
  }

  pub fn mode(&self) -> &FormMode {
    &self.mode
  }

  /// Fill the options of lookup fields backed by `namespace`
  pub fn set_lookup(&mut self, namespace: &str, codes: &[String]) {
    for state in &mut self.fields {
      if matches!(state.field.kind, FieldKind::Lookup(ns) if ns == namespace) {
        state.options = codes.to_vec();
      }
    }
  }

  /// Namespaces of the lookup fields, to load their codes
  pub fn lookups(&self) -> Vec<&'static str> {
    self
      .fields
      .iter()
      .filter_map(|s| match s.field.kind {
        FieldKind::Lookup(ns) => Some(ns),
        _ => None,
      })
      .collect()
  }

  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
    self.submitting = false;
  }

  pub fn set_submitting(&mut self) {
    self.error = None;
    self.submitting = true;
  }

  fn is_editable(&self, idx: usize) -> bool {
    match self.fields.get(idx) {
      Some(state) => self.mode == FormMode::Create || state.field.editable_on_update,
      None => false,
    }
  }

  fn move_focus(&mut self, forward: bool) {
    let len = self.fields.len();
    for step in 1..=len {
      let idx = if forward {
        (self.focus + step) % len
      } else {
        (self.focus + len * step - step) % len
      };
      if self.is_editable(idx) {
        self.focus = idx;
        return;
      }
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    match key.code {
      KeyCode::Esc => return KeyResult::Event(FormEvent::Cancelled),
      KeyCode::Enter => {
        if self.submitting {
          return KeyResult::Handled;
        }
        let values = self
          .fields
          .iter()
          .map(|s| s.input.value().to_string())
          .collect();
        return KeyResult::Event(FormEvent::Submitted(values));
      }
      KeyCode::Tab | KeyCode::Down => {
        self.move_focus(true);
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.move_focus(false);
        return KeyResult::Handled;
      }
      _ => {}
    }

    if self.submitting || !self.is_editable(self.focus) {
      return KeyResult::Handled;
    }

    let state = &mut self.fields[self.focus];
    match (key.code, state.field.kind) {
      (KeyCode::Left, FieldKind::Choice(_) | FieldKind::Lookup(_)) => state.cycle(false),
      (KeyCode::Right, FieldKind::Choice(_) | FieldKind::Lookup(_)) => state.cycle(true),
      // Choice fields only change by cycling
      (KeyCode::Char(_) | KeyCode::Backspace | KeyCode::Delete, FieldKind::Choice(_)) => {}
      _ => {
        if state.input.handle_key(key) == InputResult::Consumed {
          self.error = None;
        }
      }
    }
    KeyResult::Handled
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let height = self.fields.len() as u16 + 6;
    let overlay_area = centered_rect(area, 64, height);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title))
      .title_bottom(
        Line::from(" tab next · ←/→ choose · enter save · esc cancel ").centered(),
      );
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let label_width = self
      .fields
      .iter()
      .map(|s| s.field.label.chars().count())
      .max()
      .unwrap_or(0);

    let mut lines: Vec<Line> = Vec::new();
    for (i, state) in self.fields.iter().enumerate() {
      let focused = i == self.focus;
      let label_style = if focused {
        Style::default().fg(Color::Cyan).bold()
      } else {
        Style::default().fg(Color::Gray)
      };
      let mut spans = vec![Span::styled(
        format!("{:>width$}: ", state.field.label, width = label_width),
        label_style,
      )];

      if !self.is_editable(i) {
        spans.push(Span::styled(
          state.input.value(),
          Style::default().fg(Color::DarkGray),
        ));
      } else if focused {
        spans.extend(state.input.spans(Style::default().fg(Color::Yellow)));
        if !state.options.is_empty() {
          spans.push(Span::styled("  ◂▸", Style::default().fg(Color::DarkGray)));
        }
      } else {
        spans.push(Span::raw(state.input.value()));
      }
      lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    if self.submitting {
      lines.push(Line::from(Span::styled(
        "Saving...",
        Style::default().fg(Color::Yellow),
      )));
    } else if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(
        error.as_str(),
        Style::default().fg(Color::Red),
      )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
  }
}
