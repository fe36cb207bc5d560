use crate::api::{ApiError, SsisClient, SESSION_EXPIRED};
use crate::config::{CacheBackend, Config, ViewKind};
use crate::entity::{Colleges, Programs, Students};
use crate::event::{Event, EventHandler};
use crate::listview::{MemoryStorage, NoopStorage, ResponseCache, SqliteStorage};
use crate::request::RequestQueue;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::draw_header;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::EntityListView;
use crate::ui::Message;
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::io::stdout;
use std::time::Duration;
use tracing::{info, warn};

/// Main application state
pub struct App {
  config: Config,
  client: SsisClient,
  /// Shared by every view for the whole session
  cache: ResponseCache,
  view: Box<dyn View>,
  command: CommandInput,
  /// App-level status, e.g. an expired session
  message: Option<Message>,
  logout: RequestQueue<Result<(), ApiError>>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, client: SsisClient) -> Result<Self> {
    let cache = build_cache(config.cache.backend)?;
    let view = make_view(config.default_view, &client, &cache, &config);

    Ok(Self {
      config,
      client,
      cache,
      view,
      command: CommandInput::new(),
      message: None,
      logout: RequestQueue::new(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Resize) => {}
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }
    Ok(())
  }

  fn tick(&mut self) {
    let action = self.view.tick();
    self.apply(action);

    for result in self.logout.poll() {
      if let Err(e) = result {
        warn!(error = %e, "logout request failed");
      }
      self.should_quit = true;
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::SessionExpired => {
        warn!("session token rejected");
        self.client.set_token(None);
        self.clear_cache();
        self.message = Some(Message::Error(SESSION_EXPIRED.to_string()));
      }
    }
  }

  fn clear_cache(&self) {
    if let Err(e) = self.cache.clear() {
      warn!(error = %e, "failed to clear cache");
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let capturing = self.view.is_capturing_input();
    if self.command.is_active() || !capturing {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(command)) => {
          self.execute_command(&command);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    if !capturing && key.code == KeyCode::Char('q') {
      self.should_quit = true;
      return;
    }

    let action = self.view.handle_key(key);
    self.apply(action);
  }

  fn execute_command(&mut self, command: &str) {
    match command {
      "students" => self.switch_view(ViewKind::Students),
      "programs" => self.switch_view(ViewKind::Programs),
      "colleges" => self.switch_view(ViewKind::Colleges),
      "logout" => self.start_logout(),
      "quit" => self.should_quit = true,
      other => {
        if !self.view.handle_command(other) {
          self.message = Some(Message::Error(format!("Unknown command: {}", other)));
        }
      }
    }
  }

  fn switch_view(&mut self, kind: ViewKind) {
    info!(view = kind.label(), "switching view");
    self.message = None;
    self.view = make_view(kind, &self.client, &self.cache, &self.config);
  }

  fn start_logout(&mut self) {
    if self.logout.is_busy() {
      return;
    }
    self.clear_cache();
    self.message = Some(Message::Info("Signing out...".to_string()));
    let client = self.client.clone();
    self.logout.spawn(async move { client.logout().await });
  }

  fn draw(&mut self, frame: &mut Frame) {
    let status_height = u16::from(self.message.is_some());
    let chunks = Layout::vertical([
      Constraint::Length(1),
      Constraint::Min(1),
      Constraint::Length(status_height),
    ])
    .split(frame.area());

    let label = self.view.breadcrumb_label();
    let shortcuts = self.view.shortcuts();
    draw_header(
      frame,
      chunks[0],
      self.config.title(),
      self.client.host(),
      &label,
      &shortcuts,
    );

    self.view.render(frame, chunks[1]);

    if let Some(message) = &self.message {
      let (text, color) = match message {
        Message::Info(text) => (text, Color::Green),
        Message::Error(text) => (text, Color::Red),
      };
      let paragraph = Paragraph::new(format!(" {}", text))
        .style(Style::default().fg(color).bg(Color::Black));
      frame.render_widget(paragraph, chunks[2]);
    }

    self.command.render_overlay(frame, frame.area());
  }
}

fn build_cache(backend: CacheBackend) -> Result<ResponseCache> {
  let cache = match backend {
    CacheBackend::Memory => ResponseCache::new(MemoryStorage::new()),
    CacheBackend::Sqlite => ResponseCache::new(
      SqliteStorage::open_in_memory().map_err(|e| eyre!("Failed to open cache database: {}", e))?,
    ),
    CacheBackend::None => ResponseCache::new(NoopStorage),
  };
  Ok(cache)
}

fn make_view(
  kind: ViewKind,
  client: &SsisClient,
  cache: &ResponseCache,
  config: &Config,
) -> Box<dyn View> {
  let (client, cache) = (client.clone(), cache.clone());
  match kind {
    ViewKind::Students => Box::new(EntityListView::<Students>::new(client, cache, config.page_size)),
    ViewKind::Programs => Box::new(EntityListView::<Programs>::new(client, cache, config.page_size)),
    ViewKind::Colleges => Box::new(EntityListView::<Colleges>::new(client, cache, config.page_size)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn app() -> App {
    let config = Config::default();
    let client = SsisClient::new(&config).unwrap();
    App::new(config, client).unwrap()
  }

  #[test]
  fn test_build_cache_backends() {
    for backend in [CacheBackend::Memory, CacheBackend::Sqlite, CacheBackend::None] {
      assert!(build_cache(backend).is_ok());
    }
  }

  #[tokio::test]
  async fn test_switch_view_by_command() {
    let mut app = app();
    assert_eq!(app.view.breadcrumb_label(), "Students");

    app.execute_command("colleges");
    assert_eq!(app.view.breadcrumb_label(), "Colleges");
  }

  #[tokio::test]
  async fn test_unknown_command_reports_error() {
    let mut app = app();
    app.execute_command("frobnicate");
    assert!(matches!(app.message, Some(Message::Error(_))));
  }

  #[tokio::test]
  async fn test_q_quits_unless_view_captures_input() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('/')));
    assert!(app.view.is_capturing_input());
    app.handle_key(key(KeyCode::Char('q')));
    assert!(!app.should_quit);

    app.handle_key(key(KeyCode::Esc));
    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_session_expired_clears_token() {
    let mut app = app();
    app.client.set_token(Some("t0k".into()));
    app.apply(ViewAction::SessionExpired);
    assert!(!app.client.has_token());
    assert!(matches!(app.message, Some(Message::Error(_))));
  }
}
