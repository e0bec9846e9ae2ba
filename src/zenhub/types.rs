use serde::{Deserialize, Serialize};

/// Canonical sprint-data payload for one project.
///
/// This is the only shape the rest of the application sees; the legacy wire
/// variants are folded into it by `api_types` right after deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintData {
  pub workspace: Workspace,
  /// Workflow columns declared by the workspace, in board order.
  /// Empty for legacy projects that only carry per-issue status strings.
  pub pipelines: Vec<Pipeline>,
  pub sprints: Vec<Sprint>,
}

/// Workspace identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
  pub id: String,
  pub name: String,
}

/// A named workflow column (e.g. "Backlog", "Doing", "Done")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
  pub name: String,
  pub position: u32,
}

/// A time-boxed iteration with its issues and point aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
  pub id: String,
  pub name: String,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  pub points: SprintPoints,
  pub member_points: Vec<MemberPoints>,
  pub blockers: Vec<Blocker>,
  /// Backend-precomputed counts. When present this takes precedence over
  /// anything recomputed from `issues`.
  pub summary: Option<IssueCounts>,
  pub issues: Vec<Issue>,
}

/// Aggregate story-point totals for a sprint
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SprintPoints {
  pub total: f64,
  pub completed: f64,
  pub remaining: f64,
  /// Percentage of committed points completed
  pub utilization: f64,
}

/// Story-point breakdown for one team member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPoints {
  pub name: String,
  pub total: f64,
  pub completed: f64,
}

/// An issue flagged as blocking sprint progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blocker {
  pub issue_id: String,
  pub title: String,
  pub blocked_by: Vec<String>,
}

/// Issue status counts for a sprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
  pub total: u32,
  pub completed: u32,
  pub in_progress: u32,
  pub blocked: u32,
}

/// An atomic unit of tracked work
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
  pub issue_id: String,
  pub title: String,
  /// Free-text workflow status ("To Do", "In Progress", "Blocked", "Done", ...)
  pub status: Option<String>,
  /// Lifecycle state ("open", "closed", ...)
  pub state: Option<String>,
  pub story_points: Option<f64>,
  pub pipeline_name: Option<String>,
  pub epic: Option<Epic>,
  pub assignees: Vec<Assignee>,
  pub blocked_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epic {
  pub id: String,
  pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignee {
  pub id: String,
  pub name: String,
}
