use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use super::components::Toast;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// Actions that a view can request in response to input or async progress
pub enum ViewAction {
  /// No action needed
  None,
  /// Pop current view from stack (go back)
  Pop,
  /// Show a transient notification in the status bar
  Notify(Toast),
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, filter bars, etc.) and return
/// actions for the App to execute: App -> View -> Components.
///
/// Views that load data asynchronously own a `Query<T>` and poll it in
/// `tick()`, which runs once per event-loop tick.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Get the project id if this view has one (for header display)
  fn project(&self) -> Option<&str> {
    None
  }

  /// Called on each tick to let the view poll async queries and timers
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// Keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command"),
      ShortcutInfo::new("/", "search"),
      ShortcutInfo::new("q", "back"),
    ]
  }
}
