use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;

use crate::commands::{self, Command};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::report::export::FileSink;
use crate::ui;
use crate::ui::components::{Toast, ToastState};
use crate::ui::renderfns::extract_domain;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::report::SprintReportView;
use crate::zenhub::cached_client::CachedZenhubClient;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  views: Vec<Box<dyn View>>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Application configuration
  config: Config,

  /// Sprint-data client (shared by all views)
  client: CachedZenhubClient,

  /// Status-bar notifications
  toasts: ToastState,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let client = CachedZenhubClient::new(&config)?;

    let project = config
      .default_project
      .clone()
      .ok_or_else(|| eyre!("No project specified. Set default_project or pass --project."))?;

    let root = Self::report_view(&config, &client, project);

    Ok(Self {
      views: vec![root],
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      config,
      client,
      toasts: ToastState::default(),
      should_quit: false,
    })
  }

  fn report_view(config: &Config, client: &CachedZenhubClient, project: String) -> Box<dyn View> {
    let sink = FileSink::new(config.export_dir());
    Box::new(SprintReportView::new(project, client.clone(), sink))
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        match event {
          Event::Key(key) => self.handle_key(key),
          Event::Tick => self.handle_tick(),
        }
      }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_tick(&mut self) {
    self.toasts.tick();

    if let Some(view) = self.views.last_mut() {
      let action = view.tick();
      self.apply(action);
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    // Ctrl-C always quits, regardless of mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    if key.code == KeyCode::Char(':') {
      self.mode = Mode::Command;
      self.command_input.clear();
      self.selected_suggestion = 0;
      return;
    }

    if let Some(view) = self.views.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  fn handle_command_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = self
            .selected_suggestion
            .checked_sub(1)
            .unwrap_or(suggestions.len() - 1);
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0;
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    let (head, arg) = commands::parse_command(&self.command_input);
    self.command_input.clear();

    // Prefer the highlighted suggestion over whatever was half-typed
    let suggestions = commands::get_suggestions(&head);
    let cmd = suggestions
      .get(self.selected_suggestion)
      .map(|c| c.name)
      .unwrap_or(head.as_str());

    match cmd {
      "report" => {
        if let Some(project) = self.config.default_project.clone() {
          self.views = vec![Self::report_view(&self.config, &self.client, project)];
        }
      }
      "project" => match arg {
        Some(project) => {
          let view = Self::report_view(&self.config, &self.client, project);
          self.views.push(view);
        }
        None => {
          self
            .toasts
            .show(Toast::warning("Usage: project <project-id>"));
        }
      },
      "quit" => {
        self.should_quit = true;
      }
      other => {
        if !other.is_empty() {
          self
            .toasts
            .show(Toast::warning(format!("Unknown command: {}", other)));
        }
      }
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Pop => {
        if self.views.len() > 1 {
          self.views.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Notify(toast) => self.toasts.show(toast),
    }
  }

  // Accessors for UI rendering

  pub fn current_view(&self) -> Option<&dyn View> {
    self.views.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.views.last_mut()
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn header_title(&self) -> String {
    self
      .config
      .title
      .clone()
      .unwrap_or_else(|| extract_domain(&self.config.backend.url).to_string())
  }

  pub fn toasts(&self) -> &ToastState {
    &self.toasts
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self.views.iter().map(|v| v.breadcrumb_label()).collect()
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }
}
