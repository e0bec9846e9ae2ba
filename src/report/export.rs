//! CSV export of the currently filtered issue list.
//!
//! CSV construction is pure; writing goes through an `ExportSink` capability
//! so the format can be tested without a filesystem. Production uses
//! `FileSink`, which drops the file into a download directory.

use chrono::Utc;
use color_eyre::eyre::eyre;
use std::fmt;
use std::path::PathBuf;

use crate::report::derive::effective_status;
use crate::zenhub::types::{Issue, Sprint};

/// Destination for an exported file.
pub trait ExportSink {
  fn download(&self, filename: &str, bytes: &[u8]) -> color_eyre::Result<()>;
}

/// Sink that writes into a directory on disk.
pub struct FileSink {
  dir: PathBuf,
}

impl FileSink {
  pub fn new(dir: PathBuf) -> Self {
    Self { dir }
  }
}

impl ExportSink for FileSink {
  fn download(&self, filename: &str, bytes: &[u8]) -> color_eyre::Result<()> {
    std::fs::create_dir_all(&self.dir)
      .map_err(|e| eyre!("Failed to create export directory: {}", e))?;
    let path = self.dir.join(filename);
    std::fs::write(&path, bytes).map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
    Ok(())
  }
}

/// Why an export produced no file.
#[derive(Debug)]
pub enum ExportError {
  /// No sprint selected, or nothing matched the current filter. A warning,
  /// not a failure.
  Empty,
  /// CSV construction or the sink write failed.
  Failed(color_eyre::Report),
}

impl fmt::Display for ExportError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExportError::Empty => write!(f, "No sprint data available to export"),
      ExportError::Failed(e) => write!(f, "{}", e),
    }
  }
}

/// Export the issues to CSV through the sink. Returns the filename written.
///
/// All-or-nothing: any failure means no file is produced.
pub fn export_csv(
  sink: &dyn ExportSink,
  sprint: Option<&Sprint>,
  issues: &[Issue],
) -> Result<String, ExportError> {
  let sprint = match sprint {
    Some(s) if !issues.is_empty() => s,
    _ => return Err(ExportError::Empty),
  };

  let csv = build_csv(&sprint.name, issues);
  let filename = csv_filename(&sprint.name, Utc::now().timestamp_millis());

  sink
    .download(&filename, csv.as_bytes())
    .map_err(ExportError::Failed)?;

  Ok(filename)
}

/// Build the CSV document: a header row plus one row per issue.
pub fn build_csv(sprint_name: &str, issues: &[Issue]) -> String {
  let mut out = String::new();
  out.push_str("Issue ID,Title,Status,Story Points,Assignees,Pipeline,Sprint\n");

  for issue in issues {
    let assignees = issue
      .assignees
      .iter()
      .map(|a| a.name.as_str())
      .collect::<Vec<_>>()
      .join("; ");
    let pipeline = issue.pipeline_name.as_deref().unwrap_or("");

    out.push_str(&format!(
      "{},{},{},{},{},{},{}\n",
      quote(&issue.issue_id),
      quote(&issue.title),
      quote(effective_status(issue)),
      issue.story_points.unwrap_or(0.0),
      quote(&assignees),
      quote(pipeline),
      quote(sprint_name),
    ));
  }

  out
}

/// Filename for an export taken at `at_millis`.
pub fn csv_filename(sprint_name: &str, at_millis: i64) -> String {
  let name = if sprint_name.is_empty() {
    "report"
  } else {
    sprint_name
  };
  format!("sprint-{}-{}.csv", name, at_millis)
}

/// Standard CSV quoting: wrap in double quotes, double any embedded quotes.
fn quote(field: &str) -> String {
  format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::zenhub::types::{Assignee, SprintPoints};
  use std::sync::Mutex;

  /// Sink that captures the download in memory.
  #[derive(Default)]
  struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
  }

  impl ExportSink for MemorySink {
    fn download(&self, filename: &str, bytes: &[u8]) -> color_eyre::Result<()> {
      self
        .files
        .lock()
        .unwrap()
        .push((filename.to_string(), bytes.to_vec()));
      Ok(())
    }
  }

  struct FailingSink;

  impl ExportSink for FailingSink {
    fn download(&self, _filename: &str, _bytes: &[u8]) -> color_eyre::Result<()> {
      Err(eyre!("disk full"))
    }
  }

  fn fixture_sprint() -> Sprint {
    Sprint {
      id: "s1".to_string(),
      name: "Sprint 12".to_string(),
      start_date: None,
      end_date: None,
      points: SprintPoints::default(),
      member_points: Vec::new(),
      blockers: Vec::new(),
      summary: None,
      issues: Vec::new(),
    }
  }

  fn fixture_issues() -> Vec<Issue> {
    vec![
      Issue {
        issue_id: "101".to_string(),
        title: "Fix \"login\" bug".to_string(),
        status: Some("In Progress".to_string()),
        story_points: Some(3.0),
        pipeline_name: Some("Doing".to_string()),
        assignees: vec![
          Assignee {
            id: "u1".to_string(),
            name: "Alice".to_string(),
          },
          Assignee {
            id: "u2".to_string(),
            name: "Bob".to_string(),
          },
        ],
        ..Issue::default()
      },
      Issue {
        issue_id: "102".to_string(),
        title: "Add search".to_string(),
        story_points: Some(5.5),
        ..Issue::default()
      },
    ]
  }

  #[test]
  fn test_csv_has_header_plus_one_row_per_issue() {
    let csv = build_csv("Sprint 12", &fixture_issues());
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
      lines[0],
      "Issue ID,Title,Status,Story Points,Assignees,Pipeline,Sprint"
    );
  }

  #[test]
  fn test_csv_quoting_and_escaping() {
    let csv = build_csv("Sprint 12", &fixture_issues());
    let lines: Vec<&str> = csv.lines().collect();

    // Embedded quotes doubled, assignees joined with "; ", points unquoted.
    assert_eq!(
      lines[1],
      "\"101\",\"Fix \"\"login\"\" bug\",\"In Progress\",3,\"Alice; Bob\",\"Doing\",\"Sprint 12\""
    );
    // Missing status defaults, missing pipeline is an empty quoted field.
    assert_eq!(
      lines[2],
      "\"102\",\"Add search\",\"To Do\",5.5,\"\",\"\",\"Sprint 12\""
    );
  }

  #[test]
  fn test_export_writes_through_sink() {
    let sink = MemorySink::default();
    let sprint = fixture_sprint();

    let filename = export_csv(&sink, Some(&sprint), &fixture_issues()).unwrap();
    assert!(filename.starts_with("sprint-Sprint 12-"));
    assert!(filename.ends_with(".csv"));

    let files = sink.files.lock().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, filename);
    assert_eq!(String::from_utf8_lossy(&files[0].1).lines().count(), 3);
  }

  #[test]
  fn test_export_without_sprint_is_empty() {
    let sink = MemorySink::default();
    assert!(matches!(
      export_csv(&sink, None, &fixture_issues()),
      Err(ExportError::Empty)
    ));
    assert!(sink.files.lock().unwrap().is_empty());
  }

  #[test]
  fn test_export_without_issues_is_empty() {
    let sink = MemorySink::default();
    let sprint = fixture_sprint();
    assert!(matches!(
      export_csv(&sink, Some(&sprint), &[]),
      Err(ExportError::Empty)
    ));
  }

  #[test]
  fn test_sink_failure_is_surfaced() {
    let sprint = fixture_sprint();
    assert!(matches!(
      export_csv(&FailingSink, Some(&sprint), &fixture_issues()),
      Err(ExportError::Failed(_))
    ));
  }

  #[test]
  fn test_filename_falls_back_without_name() {
    assert_eq!(csv_filename("", 1700000000000), "sprint-report-1700000000000.csv");
    assert_eq!(
      csv_filename("Sprint 9", 1700000000000),
      "sprint-Sprint 9-1700000000000.csv"
    );
  }

  #[test]
  fn test_file_sink_writes_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FileSink::new(dir.path().to_path_buf());

    sink.download("sprint-test-1.csv", b"a,b\n").unwrap();
    let written = std::fs::read_to_string(dir.path().join("sprint-test-1.csv")).unwrap();
    assert_eq!(written, "a,b\n");
  }
}
