use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::cache::{CacheResult, CacheSource};
use crate::query::{Query, QueryState};
use crate::report::derive::{self, DerivedView};
use crate::report::export::{self, ExportError, FileSink};
use crate::report::filter::{self, FilteredView};
use crate::ui::components::{Debouncer, KeyResult, SearchEvent, SearchInput, Toast};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_points, status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::zenhub::cached_client::CachedZenhubClient;
use crate::zenhub::types::{Issue, Pipeline, Sprint, SprintData};

/// Quiet period before a typed search query is applied
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Sprint report for one project: summary header, issue table or board,
/// filter bar, search, CSV export.
pub struct SprintReportView {
  project: String,
  export_sink: FileSink,

  // Data query; the fetcher consumes `force` on each run
  query: Query<CacheResult<SprintData>>,
  force: Arc<AtomicBool>,
  awaiting_forced: bool,

  // UI state
  selected_sprint: usize,
  board_mode: bool,
  selected_column: usize,
  column_selected: usize,
  list_state: ListState,
  filter_bar_active: bool,
  selected_filter: Option<usize>, // Index into filter_values(), None = "All"
  show_blockers: bool,

  // Components
  search: SearchInput,
  applied_search: String,
  debounce: Debouncer,
}

impl SprintReportView {
  pub fn new(project: String, client: CachedZenhubClient, export_sink: FileSink) -> Self {
    let force = Arc::new(AtomicBool::new(false));

    let fetch_client = client;
    let fetch_project = project.clone();
    let fetch_force = force.clone();
    let mut query = Query::new(move || {
      let client = fetch_client.clone();
      let project = fetch_project.clone();
      // Consume the one-shot force flag armed by a forced refresh.
      let force = fetch_force.swap(false, Ordering::SeqCst);
      async move {
        client
          .get_sprint_data(&project, force)
          .await
          .map_err(|e| e.to_string())
      }
    });

    // Start loading immediately
    query.fetch();

    Self {
      project,
      export_sink,
      query,
      force,
      awaiting_forced: false,
      selected_sprint: 0,
      board_mode: false,
      selected_column: 0,
      column_selected: 0,
      list_state: ListState::default(),
      filter_bar_active: false,
      selected_filter: None,
      show_blockers: false,
      search: SearchInput::new(),
      applied_search: String::new(),
      debounce: Debouncer::new(SEARCH_DEBOUNCE),
    }
  }

  // ==========================================================================
  // Data access — derived state is recomputed on demand, never cached
  // ==========================================================================

  fn data(&self) -> Option<&SprintData> {
    self.query.data().map(|result| &result.data)
  }

  fn sprints(&self) -> &[Sprint] {
    self.data().map(|d| d.sprints.as_slice()).unwrap_or(&[])
  }

  fn pipelines(&self) -> &[Pipeline] {
    self.data().map(|d| d.pipelines.as_slice()).unwrap_or(&[])
  }

  fn current_sprint(&self) -> Option<&Sprint> {
    self.sprints().get(self.selected_sprint)
  }

  fn derived(&self) -> DerivedView {
    derive::derive(self.current_sprint())
  }

  /// Filter bar tab values, in column order ("All" not included)
  fn filter_values(&self) -> Vec<String> {
    filter::filter_values(&self.derived().issues, self.pipelines())
  }

  fn status_filter(&self) -> Option<String> {
    let values = self.filter_values();
    self
      .selected_filter
      .and_then(|idx| values.get(idx).cloned())
  }

  fn filtered(&self) -> FilteredView {
    let derived = self.derived();
    filter::filter(
      &derived.issues,
      self.status_filter().as_deref(),
      &self.applied_search,
      self.pipelines(),
    )
  }

  fn is_loading(&self) -> bool {
    self.query.is_loading()
  }

  // ==========================================================================
  // Input handling
  // ==========================================================================

  fn reset_selection(&mut self) {
    self.list_state.select(Some(0));
    self.column_selected = 0;
  }

  fn switch_sprint(&mut self, delta: i32) {
    let len = self.sprints().len();
    if len == 0 {
      return;
    }
    // Tab switches re-derive only; the payload is never refetched here.
    self.selected_sprint =
      (self.selected_sprint as i32 + delta).rem_euclid(len as i32) as usize;
    self.selected_filter = None;
    self.reset_selection();
  }

  fn navigate_rows(&mut self, direction: i32) {
    if self.board_mode {
      let groups = self.filtered().groups;
      if let Some(group) = groups.get(self.selected_column) {
        let len = group.issues.len();
        if len == 0 {
          return;
        }
        self.column_selected =
          (self.column_selected as i32 + direction).rem_euclid(len as i32) as usize;
      }
    } else if direction > 0 {
      self.list_state.select_next();
    } else {
      self.list_state.select_previous();
    }
  }

  fn navigate_columns(&mut self, direction: i32) {
    let num_columns = self.filtered().groups.len();
    if num_columns == 0 {
      return;
    }
    self.selected_column =
      (self.selected_column as i32 + direction).rem_euclid(num_columns as i32) as usize;
    self.column_selected = 0;
  }

  /// Navigate filter tabs (left/right), "All" first
  fn navigate_filter(&mut self, direction: i32) {
    let values = self.filter_values();
    if values.is_empty() {
      return;
    }

    let total_tabs = values.len() + 1;
    let current_pos = self.selected_filter.map(|i| i + 1).unwrap_or(0);
    let new_pos = (current_pos as i32 + direction).rem_euclid(total_tabs as i32) as usize;

    self.selected_filter = if new_pos == 0 { None } else { Some(new_pos - 1) };
    self.reset_selection();
  }

  fn refresh(&mut self, forced: bool) {
    if forced {
      self.force.store(true, Ordering::SeqCst);
      self.awaiting_forced = true;
    }
    self.query.refetch();
  }

  fn export_csv(&self) -> ViewAction {
    let filtered = self.filtered();
    match export::export_csv(&self.export_sink, self.current_sprint(), &filtered.issues) {
      Ok(filename) => ViewAction::Notify(Toast::success(format!("Exported {}", filename))),
      Err(ExportError::Empty) => ViewAction::Notify(Toast::warning("No issues to export")),
      Err(ExportError::Failed(e)) => {
        ViewAction::Notify(Toast::error(format!("Export failed: {}", e)))
      }
    }
  }

  // ==========================================================================
  // Rendering
  // ==========================================================================

  fn render_sprint_tabs(&self, frame: &mut Frame, area: Rect) {
    let sprints = self.sprints();
    if sprints.is_empty() {
      return;
    }

    let mut spans = Vec::new();
    for (idx, sprint) in sprints.iter().enumerate() {
      let style = if idx == self.selected_sprint {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        Style::default().fg(Color::Gray)
      };
      spans.push(Span::styled(format!(" {} ", sprint.name), style));
      if idx < sprints.len() - 1 {
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
      }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_summary(&self, frame: &mut Frame, area: Rect) {
    let derived = self.derived();
    let summary = derived.summary;

    let mut lines = Vec::new();

    let workspace = self
      .data()
      .map(|d| d.workspace.name.clone())
      .unwrap_or_default();

    if let Some(sprint) = self.current_sprint() {
      let dates = match (&sprint.start_date, &sprint.end_date) {
        (Some(start), Some(end)) => format!("{} → {}", start, end),
        _ => String::new(),
      };
      lines.push(Line::from(vec![
        Span::styled(workspace, Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(dates, Style::default().fg(Color::DarkGray)),
        Span::raw("   "),
        Span::styled("points ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
          "{}/{} done, {} left ({:.0}%)",
          format_points(sprint.points.completed),
          format_points(sprint.points.total),
          format_points(sprint.points.remaining),
          sprint.points.utilization,
        )),
      ]));
      lines.push(Line::from(vec![
        Span::styled("issues ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} total  ", summary.total)),
        Span::styled(
          format!("{} done  ", summary.completed),
          Style::default().fg(Color::Green),
        ),
        Span::styled(
          format!("{} in progress  ", summary.in_progress),
          Style::default().fg(Color::Yellow),
        ),
        Span::styled(
          format!("{} blocked", summary.blocked),
          Style::default().fg(Color::Red),
        ),
        Span::styled(
          format!("   blockers: {}", sprint.blockers.len()),
          Style::default().fg(Color::DarkGray),
        ),
      ]));
    }

    frame.render_widget(Paragraph::new(lines), area);
  }

  fn render_filter_bar(&self, frame: &mut Frame, area: Rect) {
    let values = self.filter_values();
    if values.is_empty() {
      return;
    }

    let mut spans = Vec::new();

    let all_style = if self.selected_filter.is_none() {
      Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::styled(" All ", all_style));
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));

    for (idx, value) in values.iter().enumerate() {
      let style = if self.selected_filter == Some(idx) {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        Style::default().fg(Color::Gray)
      };
      spans.push(Span::styled(format!(" {} ", value), style));
      if idx < values.len() - 1 {
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
      }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn content_title(&self, issue_count: usize) -> String {
    let label = self
      .current_sprint()
      .map(|s| s.name.clone())
      .unwrap_or_else(|| "Sprint Report".to_string());

    match self.query.state() {
      QueryState::Loading { .. } => format!(" {} (loading...) ", label),
      QueryState::Error { message, .. } => {
        format!(" {} (error: {}) ", label, truncate(message, 40))
      }
      _ => format!(" {} ({} issues) ", label, issue_count),
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let filtered = self.filtered();
    ensure_valid_selection(&mut self.list_state, filtered.issues.len());

    let block = Block::default()
      .title(self.content_title(filtered.issues.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if filtered.issues.is_empty() && !self.is_loading() {
      let content = if self.query.is_error() && self.data().is_none() {
        "Failed to load sprint data. Press 'r' to retry."
      } else {
        "No issues match the current filter."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = filtered
      .issues
      .iter()
      .map(|issue| self.table_row(issue))
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn table_row(&self, issue: &Issue) -> ListItem<'static> {
    let status = derive::effective_status(issue).to_string();
    let points = issue
      .story_points
      .map(format_points)
      .unwrap_or_else(|| "-".to_string());
    let assignees = issue
      .assignees
      .iter()
      .map(|a| a.name.as_str())
      .collect::<Vec<_>>()
      .join(", ");

    let mut spans = vec![
      Span::styled(
        format!("{:<10}", truncate(&issue.issue_id, 10)),
        Style::default().fg(Color::Cyan),
      ),
      Span::raw(" "),
      Span::styled(
        format!("{:<14}", truncate(&status, 14)),
        Style::default().fg(status_color(&status)),
      ),
      Span::raw(" "),
      Span::styled(format!("{:>4}", points), Style::default().fg(Color::Magenta)),
      Span::raw("  "),
      Span::styled(
        format!("{:<20}", truncate(&assignees, 20)),
        Style::default().fg(Color::Gray),
      ),
      Span::raw(" "),
      Span::raw(truncate(&issue.title, 60)),
    ];
    if let Some(epic) = &issue.epic {
      spans.push(Span::styled(
        format!("  [{}]", truncate(&epic.title, 20)),
        Style::default().fg(Color::DarkGray),
      ));
    }
    ListItem::new(Line::from(spans))
  }

  fn render_board(&self, frame: &mut Frame, area: Rect) {
    let filtered = self.filtered();

    if filtered.groups.is_empty() {
      let block = Block::default()
        .title(self.content_title(0))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
      let paragraph = Paragraph::new("No issues match the current filter.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let constraints: Vec<Constraint> = filtered
      .groups
      .iter()
      .map(|_| Constraint::Ratio(1, filtered.groups.len() as u32))
      .collect();
    let col_areas = Layout::horizontal(constraints).split(area);

    for (col_idx, group) in filtered.groups.iter().enumerate() {
      let is_selected_column = col_idx == self.selected_column;
      let border_color = if is_selected_column {
        Color::Yellow
      } else {
        Color::Blue
      };

      let title = format!(" {} ({}) ", truncate(&group.key, 12), group.issues.len());
      let block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

      let items: Vec<ListItem> = group
        .issues
        .iter()
        .map(|issue| {
          let points = issue
            .story_points
            .map(|p| format!(" [{}]", format_points(p)))
            .unwrap_or_default();
          let line = Line::from(vec![
            Span::styled(issue.issue_id.clone(), Style::default().fg(Color::Cyan)),
            Span::styled(points, Style::default().fg(Color::Magenta)),
          ]);
          ListItem::new(line)
        })
        .collect();

      let list = List::new(items)
        .block(block)
        .highlight_style(
          Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

      if is_selected_column {
        let mut state = ListState::default();
        state.select(Some(self.column_selected));
        frame.render_stateful_widget(list, col_areas[col_idx], &mut state);
      } else {
        frame.render_widget(list, col_areas[col_idx]);
      }
    }
  }

  fn render_blockers(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Sprint Details ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));

    let mut lines = Vec::new();

    if let Some(sprint) = self.current_sprint() {
      if sprint.blockers.is_empty() {
        lines.push(Line::styled(
          "No blockers",
          Style::default().fg(Color::DarkGray),
        ));
      }
      for blocker in &sprint.blockers {
        lines.push(Line::from(vec![
          Span::styled(blocker.issue_id.clone(), Style::default().fg(Color::Red)),
          Span::raw(" "),
          Span::raw(truncate(&blocker.title, 30)),
        ]));
        if !blocker.blocked_by.is_empty() {
          lines.push(Line::styled(
            format!("  blocked by {}", blocker.blocked_by.join(", ")),
            Style::default().fg(Color::DarkGray),
          ));
        }
      }

      if !sprint.member_points.is_empty() {
        lines.push(Line::raw(""));
        for member in &sprint.member_points {
          lines.push(Line::from(vec![
            Span::styled(
              format!("{:<16}", truncate(&member.name, 16)),
              Style::default().fg(Color::Gray),
            ),
            Span::raw(format!(
              "{}/{}",
              format_points(member.completed),
              format_points(member.total)
            )),
          ]));
        }
      }

      // Unfiltered status breakdown from the derivation baseline
      let derived = self.derived();
      if !derived.by_status.is_empty() {
        lines.push(Line::raw(""));
        for (status, issues) in &derived.by_status {
          lines.push(Line::from(vec![
            Span::styled(
              format!("{:<16}", truncate(status, 16)),
              Style::default().fg(status_color(status)),
            ),
            Span::raw(format!("{}", issues.len())),
          ]));
        }
      }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }
}

impl View for SprintReportView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Search overlay gets first shot at every key
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.debounce.submit(query);
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted(query)) => {
        self.debounce.cancel();
        self.applied_search = query;
        self.reset_selection();
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      // Vertical navigation
      KeyCode::Char('j') | KeyCode::Down => self.navigate_rows(1),
      KeyCode::Char('k') | KeyCode::Up => self.navigate_rows(-1),

      // Filter tab navigation (when filter bar active)
      KeyCode::Char('h') | KeyCode::Left => {
        if self.filter_bar_active {
          self.navigate_filter(-1);
        }
      }
      KeyCode::Char('l') | KeyCode::Right => {
        if self.filter_bar_active {
          self.navigate_filter(1);
        }
      }

      // Sprint tabs; switching never refetches
      KeyCode::Tab => self.switch_sprint(1),
      KeyCode::BackTab => self.switch_sprint(-1),

      // Board column navigation
      KeyCode::PageUp => {
        if self.board_mode {
          self.navigate_columns(-1);
        }
      }
      KeyCode::PageDown => {
        if self.board_mode {
          self.navigate_columns(1);
        }
      }

      // Toggles
      KeyCode::Char('f') => {
        if !self.filter_values().is_empty() {
          self.filter_bar_active = !self.filter_bar_active;
        }
      }
      KeyCode::Char('s') => {
        self.board_mode = !self.board_mode;
        self.selected_column = 0;
        self.reset_selection();
      }
      KeyCode::Char('b') => {
        self.show_blockers = !self.show_blockers;
      }

      // Refresh
      KeyCode::Char('r') => self.refresh(false),
      KeyCode::Char('R') => self.refresh(true),

      // Export
      KeyCode::Char('e') => return self.export_csv(),

      // Back
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,

      _ => {}
    }
    ViewAction::None
  }

  fn tick(&mut self) -> ViewAction {
    // Apply a settled search query
    if let Some(applied) = self.debounce.poll() {
      self.applied_search = applied;
      self.reset_selection();
    }

    if self.query.poll() {
      self.selected_sprint = self.selected_sprint.min(self.sprints().len().saturating_sub(1));

      match self.query.state() {
        QueryState::Success(result) => {
          let was_forced = std::mem::take(&mut self.awaiting_forced);
          if was_forced && result.source == CacheSource::Network {
            return ViewAction::Notify(Toast::success("Sprint data refreshed"));
          }
        }
        QueryState::Error { message, .. } => {
          self.awaiting_forced = false;
          return ViewAction::Notify(Toast::error(format!(
            "Failed to load sprint data: {}",
            message
          )));
        }
        _ => {}
      }
    }

    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let show_filters = self.filter_bar_active && !self.filter_values().is_empty();

    let mut constraints = vec![
      Constraint::Length(1), // Sprint tabs
      Constraint::Length(2), // Summary
    ];
    if show_filters {
      constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(0)); // Main content

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints(constraints)
      .split(area);

    self.render_sprint_tabs(frame, chunks[0]);
    self.render_summary(frame, chunks[1]);

    let content_area = if show_filters {
      self.render_filter_bar(frame, chunks[2]);
      chunks[3]
    } else {
      chunks[2]
    };

    // Blockers panel takes the right third when open
    let (main_area, side_area) = if self.show_blockers {
      let split = Layout::horizontal([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)])
        .split(content_area);
      (split[0], Some(split[1]))
    } else {
      (content_area, None)
    };

    if self.board_mode {
      self.render_board(frame, main_area);
    } else {
      self.render_table(frame, main_area);
    }

    if let Some(side) = side_area {
      self.render_blockers(frame, side);
    }

    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    if self.board_mode {
      format!("{} [Board]", self.project)
    } else {
      self.project.clone()
    }
  }

  fn project(&self) -> Option<&str> {
    Some(&self.project)
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new(":", "command"),
      ShortcutInfo::new("/", "search"),
      ShortcutInfo::new("Tab", "sprint"),
      ShortcutInfo::new("s", "board"),
      ShortcutInfo::new("f", "filter"),
      ShortcutInfo::new("b", "blockers"),
      ShortcutInfo::new("r/R", "refresh"),
      ShortcutInfo::new("e", "export"),
      ShortcutInfo::new("q", "back"),
    ];

    if self.board_mode {
      shortcuts.push(ShortcutInfo::new("PgUp/Dn", "column"));
    }
    if self.filter_bar_active {
      shortcuts.push(ShortcutInfo::new("h/l", "filter tab"));
    }

    shortcuts
  }
}
