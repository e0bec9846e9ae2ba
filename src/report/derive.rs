//! Derivation of summary counts and baseline groupings from a sprint.
//!
//! Everything here is recomputed on demand from the canonical sprint payload;
//! nothing is cached between renders.

use std::collections::BTreeMap;

use crate::zenhub::types::{Issue, IssueCounts, Sprint};

/// Status assumed for issues that carry none.
pub const DEFAULT_STATUS: &str = "To Do";

/// Summary, flattened issue list, and the unfiltered by-status partition for
/// one sprint.
#[derive(Debug, Default)]
pub struct DerivedView {
  pub summary: IssueCounts,
  pub issues: Vec<Issue>,
  pub by_status: BTreeMap<String, Vec<Issue>>,
}

/// Derive the view for a sprint. No sprint means zeroed counts and empty
/// collections.
pub fn derive(sprint: Option<&Sprint>) -> DerivedView {
  let sprint = match sprint {
    Some(s) => s,
    None => return DerivedView::default(),
  };

  // A backend-supplied summary is used verbatim; only when absent do we
  // aggregate over the issue list. Never a mix of the two.
  let summary = match sprint.summary {
    Some(counts) => counts,
    None => compute_counts(&sprint.issues),
  };

  let mut by_status: BTreeMap<String, Vec<Issue>> = BTreeMap::new();
  for issue in &sprint.issues {
    by_status
      .entry(effective_status(issue).to_string())
      .or_default()
      .push(issue.clone());
  }

  DerivedView {
    summary,
    issues: sprint.issues.clone(),
    by_status,
  }
}

/// The status string used for grouping and legacy filtering.
pub fn effective_status(issue: &Issue) -> &str {
  issue.status.as_deref().unwrap_or(DEFAULT_STATUS)
}

/// Progress bucket for one issue. `None` counts toward the total only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
  Blocked,
  InProgress,
  Completed,
}

/// Classify an issue into at most one bucket.
///
/// Precedence: blocked status first, then in-progress by status or state,
/// then completed by state or status. Comparisons are case-insensitive since
/// both fields are free text from the backend.
fn classify(issue: &Issue) -> Option<Bucket> {
  let status = issue
    .status
    .as_deref()
    .map(str::to_lowercase)
    .unwrap_or_default();
  let state = issue
    .state
    .as_deref()
    .map(str::to_lowercase)
    .unwrap_or_default();

  if status == "blocked" {
    return Some(Bucket::Blocked);
  }
  if status == "in progress" || state == "in_progress" || state == "in progress" {
    return Some(Bucket::InProgress);
  }
  if matches!(state.as_str(), "closed" | "done" | "completed") || status == "done" {
    return Some(Bucket::Completed);
  }
  None
}

/// Aggregate counts over an issue list.
pub fn compute_counts(issues: &[Issue]) -> IssueCounts {
  let mut counts = IssueCounts {
    total: issues.len() as u32,
    ..IssueCounts::default()
  };

  for issue in issues {
    match classify(issue) {
      Some(Bucket::Blocked) => counts.blocked += 1,
      Some(Bucket::InProgress) => counts.in_progress += 1,
      Some(Bucket::Completed) => counts.completed += 1,
      None => {}
    }
  }

  counts
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::zenhub::types::SprintPoints;

  fn issue(id: &str, status: Option<&str>, state: Option<&str>) -> Issue {
    Issue {
      issue_id: id.to_string(),
      title: format!("Issue {}", id),
      status: status.map(String::from),
      state: state.map(String::from),
      ..Issue::default()
    }
  }

  fn sprint_with(issues: Vec<Issue>, summary: Option<IssueCounts>) -> Sprint {
    Sprint {
      id: "s1".to_string(),
      name: "Sprint 1".to_string(),
      start_date: None,
      end_date: None,
      points: SprintPoints::default(),
      member_points: Vec::new(),
      blockers: Vec::new(),
      summary,
      issues,
    }
  }

  #[test]
  fn test_no_sprint_yields_zeroed_view() {
    let view = derive(None);
    assert_eq!(view.summary, IssueCounts::default());
    assert!(view.issues.is_empty());
    assert!(view.by_status.is_empty());
  }

  #[test]
  fn test_backend_summary_wins_over_recompute() {
    let summary = IssueCounts {
      total: 50,
      completed: 20,
      in_progress: 10,
      blocked: 5,
    };
    // One lone issue; a recompute would say total = 1.
    let sprint = sprint_with(vec![issue("1", Some("Done"), None)], Some(summary));

    let view = derive(Some(&sprint));
    assert_eq!(view.summary, summary);
  }

  #[test]
  fn test_computed_counts_classification() {
    let issues = vec![
      issue("1", Some("Blocked"), Some("open")),
      issue("2", Some("In Progress"), None),
      issue("3", None, Some("in_progress")),
      issue("4", Some("Done"), None),
      issue("5", None, Some("closed")),
      issue("6", Some("To Do"), Some("open")),
    ];

    let counts = compute_counts(&issues);
    assert_eq!(counts.total, 6);
    assert_eq!(counts.blocked, 1);
    assert_eq!(counts.in_progress, 2);
    assert_eq!(counts.completed, 2);
  }

  #[test]
  fn test_blocked_takes_precedence() {
    // Blocked status beats a completed-looking state.
    let counts = compute_counts(&[issue("1", Some("Blocked"), Some("closed"))]);
    assert_eq!(counts.blocked, 1);
    assert_eq!(counts.completed, 0);
  }

  #[test]
  fn test_bucket_sum_never_exceeds_total() {
    let issues = vec![
      issue("1", Some("Blocked"), Some("closed")),
      issue("2", Some("In Progress"), Some("done")),
      issue("3", Some("weird"), Some("unknown")),
      issue("4", None, None),
    ];

    let counts = compute_counts(&issues);
    assert!(counts.blocked + counts.in_progress + counts.completed <= counts.total);
    assert_eq!(counts.total, 4);
  }

  #[test]
  fn test_baseline_grouping_defaults_missing_status() {
    let sprint = sprint_with(
      vec![
        issue("1", Some("Doing"), None),
        issue("2", None, None),
        issue("3", Some("Doing"), None),
      ],
      None,
    );

    let view = derive(Some(&sprint));
    assert_eq!(view.by_status.len(), 2);
    assert_eq!(view.by_status["Doing"].len(), 2);
    assert_eq!(view.by_status[DEFAULT_STATUS].len(), 1);
    assert_eq!(view.by_status[DEFAULT_STATUS][0].issue_id, "2");
  }
}
