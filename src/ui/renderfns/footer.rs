use crate::listview::PageInfo;
use crate::ui::Message;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// "Page 2 of 5 · rows 11–20 of 42 · per page 10"
pub fn page_summary(info: &PageInfo) -> String {
  if info.total_count == 0 {
    return format!(
      "Page {} of {} · no rows · per page {}",
      info.page, info.total_pages, info.page_size
    );
  }
  format!(
    "Page {} of {} · rows {}–{} of {} · per page {}",
    info.page, info.total_pages, info.first_row, info.last_row, info.total_count, info.page_size
  )
}

/// Draw the footer: pagination, active search and filters, then the status message
pub fn draw_footer(
  frame: &mut Frame,
  area: Rect,
  info: &PageInfo,
  query: &str,
  message: Option<&Message>,
) {
  let mut spans = vec![
    Span::raw(" "),
    Span::styled(page_summary(info), Style::default().fg(Color::Cyan)),
  ];

  if !query.is_empty() {
    spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(query.to_string(), Style::default().fg(Color::Yellow)));
  }

  if let Some(message) = message {
    let (text, color) = match message {
      Message::Info(text) => (text, Color::Green),
      Message::Error(text) => (text, Color::Red),
    };
    spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(text.clone(), Style::default().fg(color)));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listview::PageSize;

  #[test]
  fn test_page_summary() {
    let info = PageInfo {
      page: 5,
      total_pages: 5,
      page_size: PageSize::Ten,
      first_row: 41,
      last_row: 42,
      total_count: 42,
    };
    assert_eq!(page_summary(&info), "Page 5 of 5 · rows 41–42 of 42 · per page 10");
  }

  #[test]
  fn test_page_summary_empty() {
    let info = PageInfo {
      page: 1,
      total_pages: 1,
      page_size: PageSize::Five,
      first_row: 0,
      last_row: 0,
      total_count: 0,
    };
    assert_eq!(page_summary(&info), "Page 1 of 1 · no rows · per page 5");
  }
}
