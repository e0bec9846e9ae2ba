use ratatui::prelude::Color;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

/// Display color for an issue status or pipeline name
pub fn status_color(status: &str) -> Color {
  match status {
    "Done" | "Closed" | "Completed" => Color::Green,
    "In Progress" | "In Review" | "Doing" => Color::Yellow,
    "Blocked" => Color::Red,
    _ => Color::White,
  }
}

/// Format story points without a trailing ".0" for whole values
pub fn format_points(points: f64) -> String {
  if points.fract() == 0.0 {
    format!("{}", points as i64)
  } else {
    format!("{:.1}", points)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_status_color_buckets() {
    assert_eq!(status_color("Done"), Color::Green);
    assert_eq!(status_color("In Progress"), Color::Yellow);
    assert_eq!(status_color("Blocked"), Color::Red);
    assert_eq!(status_color("To Do"), Color::White);
  }

  #[test]
  fn test_format_points() {
    assert_eq!(format_points(3.0), "3");
    assert_eq!(format_points(5.5), "5.5");
    assert_eq!(format_points(0.0), "0");
  }
}
