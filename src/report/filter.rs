//! Status/pipeline filtering and free-text search over a sprint's issues.
//!
//! One pass produces two synchronized projections of the same filtered set:
//! a flat list for the table view and ordered groups for the board view.

use crate::zenhub::types::{Issue, Pipeline};

use super::derive::effective_status;

/// Group key for issues without a pipeline when the workspace defines them.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One board column: a group key and the issues under it.
#[derive(Debug)]
pub struct IssueGroup {
  pub key: String,
  pub issues: Vec<Issue>,
}

/// The filtered issue set in both projections.
#[derive(Debug, Default)]
pub struct FilteredView {
  pub issues: Vec<Issue>,
  pub groups: Vec<IssueGroup>,
}

/// Apply the status/pipeline filter and search query.
///
/// `status_filter` of `None` means "All". When the workspace defines
/// pipelines, issues carrying a `pipeline_name` are matched against it and
/// the groups follow the declared pipeline order with an "Uncategorized"
/// bucket appended last. Legacy projects fall back to the status string with
/// a "To Do" default.
pub fn filter(
  issues: &[Issue],
  status_filter: Option<&str>,
  search: &str,
  pipelines: &[Pipeline],
) -> FilteredView {
  let has_pipelines = !pipelines.is_empty();
  let needle = search.trim().to_lowercase();

  let filtered: Vec<Issue> = issues
    .iter()
    .filter(|issue| matches_status(issue, status_filter, has_pipelines))
    .filter(|issue| matches_search(issue, &needle))
    .cloned()
    .collect();

  let groups = group_issues(&filtered, pipelines);

  FilteredView {
    issues: filtered,
    groups,
  }
}

/// The board column an issue belongs to.
pub fn group_key(issue: &Issue, has_pipelines: bool) -> &str {
  if has_pipelines {
    issue.pipeline_name.as_deref().unwrap_or(UNCATEGORIZED)
  } else {
    effective_status(issue)
  }
}

/// Values for the filter bar, in column order. Does not include "All".
pub fn filter_values(issues: &[Issue], pipelines: &[Pipeline]) -> Vec<String> {
  if !pipelines.is_empty() {
    return pipelines.iter().map(|p| p.name.clone()).collect();
  }

  // Legacy: distinct statuses in first-seen order.
  let mut values: Vec<String> = Vec::new();
  for issue in issues {
    let status = effective_status(issue);
    if !values.iter().any(|v| v == status) {
      values.push(status.to_string());
    }
  }
  values
}

fn matches_status(issue: &Issue, status_filter: Option<&str>, has_pipelines: bool) -> bool {
  let wanted = match status_filter {
    None => return true,
    Some(w) => w,
  };

  if has_pipelines {
    if let Some(pipeline) = issue.pipeline_name.as_deref() {
      return pipeline == wanted;
    }
  }
  effective_status(issue) == wanted
}

fn matches_search(issue: &Issue, needle: &str) -> bool {
  if needle.is_empty() {
    return true;
  }

  issue.issue_id.to_lowercase().contains(needle)
    || issue.title.to_lowercase().contains(needle)
    || issue.assignees.iter().any(|a| {
      a.name.to_lowercase().contains(needle) || a.id.to_lowercase().contains(needle)
    })
}

fn group_issues(filtered: &[Issue], pipelines: &[Pipeline]) -> Vec<IssueGroup> {
  let has_pipelines = !pipelines.is_empty();

  // Column order: declared pipeline order, or first-seen status order for
  // legacy projects. "Uncategorized" always lands last.
  let mut keys: Vec<String> = if has_pipelines {
    pipelines.iter().map(|p| p.name.clone()).collect()
  } else {
    Vec::new()
  };

  let mut uncategorized = false;
  for issue in filtered {
    let key = group_key(issue, has_pipelines);
    if has_pipelines && key == UNCATEGORIZED {
      uncategorized = true;
      continue;
    }
    if !keys.iter().any(|k| k == key) {
      keys.push(key.to_string());
    }
  }
  if uncategorized {
    keys.push(UNCATEGORIZED.to_string());
  }

  keys
    .into_iter()
    .map(|key| IssueGroup {
      issues: filtered
        .iter()
        .filter(|issue| group_key(issue, has_pipelines) == key)
        .cloned()
        .collect(),
      key,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::zenhub::types::Assignee;

  fn pipelines(names: &[&str]) -> Vec<Pipeline> {
    names
      .iter()
      .enumerate()
      .map(|(i, name)| Pipeline {
        name: name.to_string(),
        position: i as u32,
      })
      .collect()
  }

  fn issue(id: &str, status: Option<&str>, pipeline: Option<&str>) -> Issue {
    Issue {
      issue_id: id.to_string(),
      title: format!("Issue {}", id),
      status: status.map(String::from),
      pipeline_name: pipeline.map(String::from),
      ..Issue::default()
    }
  }

  fn test_issues() -> Vec<Issue> {
    vec![
      issue("101", Some("To Do"), Some("Backlog")),
      issue("102", Some("In Progress"), Some("Doing")),
      issue("103", Some("Done"), Some("Done")),
    ]
  }

  #[test]
  fn test_all_filter_is_identity() {
    let issues = test_issues();
    let view = filter(&issues, None, "", &[]);
    assert_eq!(view.issues.len(), 3);
  }

  #[test]
  fn test_pipeline_filter_matches_by_pipeline_name() {
    let issues = test_issues();
    let view = filter(&issues, Some("Doing"), "", &pipelines(&["Backlog", "Doing", "Done"]));
    assert_eq!(view.issues.len(), 1);
    assert_eq!(view.issues[0].issue_id, "102");
  }

  #[test]
  fn test_status_fallback_without_pipelines() {
    let issues = vec![
      issue("1", Some("To Do"), None),
      issue("2", None, None),
      issue("3", Some("Done"), None),
    ];

    // Missing status matches the "To Do" default.
    let view = filter(&issues, Some("To Do"), "", &[]);
    let ids: Vec<&str> = view.issues.iter().map(|i| i.issue_id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);
  }

  #[test]
  fn test_status_fallback_when_issue_has_no_pipeline() {
    // Workspace has pipelines but this issue predates them.
    let issues = vec![issue("1", Some("Doing"), None)];
    let view = filter(&issues, Some("Doing"), "", &pipelines(&["Doing"]));
    assert_eq!(view.issues.len(), 1);
  }

  #[test]
  fn test_search_narrows_status_filtered_set() {
    let mut issues = test_issues();
    issues.push(issue("104", Some("In Progress"), Some("Doing")));

    let pipes = pipelines(&["Backlog", "Doing", "Done"]);
    let by_status = filter(&issues, Some("Doing"), "", &pipes);
    assert_eq!(by_status.issues.len(), 2);

    let narrowed = filter(&issues, Some("Doing"), "104", &pipes);
    assert_eq!(narrowed.issues.len(), 1);
    assert_eq!(narrowed.issues[0].issue_id, "104");
  }

  #[test]
  fn test_search_matches_id_title_and_assignee() {
    let mut with_assignee = issue("201", None, None);
    with_assignee.assignees.push(Assignee {
      id: "u7".to_string(),
      name: "Priya Patel".to_string(),
    });
    let issues = vec![with_assignee, issue("202", None, None)];

    assert_eq!(filter(&issues, None, "201", &[]).issues.len(), 1);
    assert_eq!(filter(&issues, None, "issue 202", &[]).issues.len(), 1);
    assert_eq!(filter(&issues, None, "priya", &[]).issues.len(), 1);
    assert_eq!(filter(&issues, None, "u7", &[]).issues.len(), 1);
    assert_eq!(filter(&issues, None, "  PRIYA  ", &[]).issues.len(), 1);
    assert_eq!(filter(&issues, None, "nobody", &[]).issues.len(), 0);
  }

  #[test]
  fn test_grouping_with_pipelines() {
    let issues = test_issues();
    let view = filter(&issues, None, "", &pipelines(&["Backlog", "Doing", "Done"]));

    assert_eq!(view.groups.len(), 3);
    for group in &view.groups {
      assert_eq!(group.issues.len(), 1);
    }
    let keys: Vec<&str> = view.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["Backlog", "Doing", "Done"]);
  }

  #[test]
  fn test_uncategorized_bucket_comes_last() {
    let mut issues = test_issues();
    issues.push(issue("104", Some("To Do"), None));

    let view = filter(&issues, None, "", &pipelines(&["Backlog", "Doing", "Done"]));
    let last = view.groups.last().unwrap();
    assert_eq!(last.key, UNCATEGORIZED);
    assert_eq!(last.issues[0].issue_id, "104");
  }

  #[test]
  fn test_legacy_grouping_by_status() {
    let issues = vec![
      issue("1", Some("Doing"), None),
      issue("2", None, None),
      issue("3", Some("Doing"), None),
    ];

    let view = filter(&issues, None, "", &[]);
    let keys: Vec<&str> = view.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["Doing", "To Do"]);
    assert_eq!(view.groups[0].issues.len(), 2);
    assert_eq!(view.groups[1].issues[0].issue_id, "2");
  }

  #[test]
  fn test_empty_pipeline_columns_are_kept() {
    let issues = vec![issue("1", None, Some("Doing"))];
    let view = filter(&issues, None, "", &pipelines(&["Backlog", "Doing", "Done"]));

    assert_eq!(view.groups.len(), 3);
    assert!(view.groups[0].issues.is_empty());
    assert_eq!(view.groups[1].issues.len(), 1);
  }

  #[test]
  fn test_filter_values_pipeline_order() {
    let values = filter_values(&test_issues(), &pipelines(&["Backlog", "Doing", "Done"]));
    assert_eq!(values, ["Backlog", "Doing", "Done"]);
  }

  #[test]
  fn test_filter_values_legacy_first_seen() {
    let issues = vec![
      issue("1", Some("Doing"), None),
      issue("2", None, None),
      issue("3", Some("Doing"), None),
    ];
    let values = filter_values(&issues, &[]);
    assert_eq!(values, ["Doing", "To Do"]);
  }
}
