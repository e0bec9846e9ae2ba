pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use ratatui::prelude::*;
use ratatui::widgets::{ListState, Paragraph};

use crate::app::{App, Mode};
use components::draw_command_overlay;
use renderfns::draw_header;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let title = app.header_title();
  let project = app
    .current_view()
    .and_then(|v| v.project())
    .unwrap_or_default()
    .to_string();
  let shortcuts = app
    .current_view()
    .map(|v| v.shortcuts())
    .unwrap_or_default();
  draw_header(frame, chunks[0], &title, &project, &shortcuts);

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }

  draw_status_bar(frame, chunks[2], app);

  // Command overlay sits on top of everything
  if *app.mode() == Mode::Command {
    draw_command_overlay(
      frame,
      chunks[1],
      app.command_input(),
      &app.autocomplete_suggestions(),
      app.selected_suggestion(),
    );
  }
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  // An active toast beats the breadcrumb/hint line
  if let Some(toast) = app.toasts().current() {
    let line = Line::from(vec![
      Span::raw(" "),
      Span::styled(
        toast.message.clone(),
        Style::default().fg(toast.level.color()).bold(),
      ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
    return;
  }

  let mut spans = vec![Span::raw(" ")];
  for (i, part) in app.view_breadcrumb().iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled(
      part.clone(),
      Style::default().fg(Color::Cyan),
    ));
  }
  spans.push(Span::styled(
    "   :command  /search  Ctrl-C:quit",
    Style::default().fg(Color::DarkGray),
  ));

  frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Clamp a list selection to the current item count.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(selected) if selected >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}
