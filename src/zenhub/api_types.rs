//! Serde-deserializable types matching the backend's sprint-data responses.
//!
//! The backend has shipped three shapes for a sprint's `issues` field over
//! time: a plain array, an object with a `nodes` array, and (oldest) a bare
//! summary object stored where the list should be. All three are tolerated
//! here and folded into the canonical `SprintData` in one normalization step,
//! so nothing downstream has to care.

use serde::Deserialize;

use super::types::{
  Assignee, Blocker, Epic, Issue, IssueCounts, MemberPoints, Pipeline, Sprint, SprintData,
  SprintPoints, Workspace,
};

/// Frappe wraps every RPC response in a `message` envelope.
#[derive(Debug, Deserialize)]
pub struct RpcEnvelope<T> {
  pub message: T,
}

#[derive(Debug, Deserialize)]
pub struct RawSprintData {
  #[serde(default)]
  pub workspace: RawWorkspace,
  #[serde(default)]
  pub pipelines: Vec<RawPipeline>,
  #[serde(default)]
  pub sprints: Vec<RawSprint>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawWorkspace {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawPipeline {
  pub name: String,
  #[serde(default)]
  pub position: u32,
}

#[derive(Debug, Deserialize)]
pub struct RawSprint {
  pub id: Option<String>,
  #[serde(default)]
  pub name: String,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  #[serde(default)]
  pub total_points: f64,
  #[serde(default)]
  pub completed_points: f64,
  #[serde(default)]
  pub remaining_points: f64,
  #[serde(default)]
  pub utilization: f64,
  #[serde(default)]
  pub member_points: Vec<RawMemberPoints>,
  #[serde(default)]
  pub blockers: Vec<RawBlocker>,
  pub issues: Option<RawIssues>,
  pub issues_summary: Option<RawCounts>,
}

/// The three legacy shapes of a sprint's `issues` field.
///
/// Variant order matters for untagged deserialization: `Nodes` must be tried
/// before `Summary`, otherwise `{"nodes": [...]}` would satisfy the
/// all-defaulted summary object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawIssues {
  List(Vec<RawIssue>),
  Nodes { nodes: Vec<RawIssue> },
  Summary(RawCounts),
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCounts {
  #[serde(default)]
  pub total: u32,
  #[serde(default)]
  pub completed: u32,
  #[serde(default)]
  pub in_progress: u32,
  #[serde(default)]
  pub blocked: u32,
}

#[derive(Debug, Deserialize)]
pub struct RawIssue {
  #[serde(default)]
  pub issue_id: String,
  #[serde(default)]
  pub title: String,
  pub status: Option<String>,
  pub state: Option<String>,
  pub story_points: Option<f64>,
  pub pipeline_name: Option<String>,
  pub epic: Option<RawEpic>,
  #[serde(default)]
  pub assignees: Vec<RawAssignee>,
  #[serde(default)]
  pub blocked_by: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawEpic {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct RawAssignee {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawMemberPoints {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub total: f64,
  #[serde(default)]
  pub completed: f64,
}

#[derive(Debug, Deserialize)]
pub struct RawBlocker {
  #[serde(default)]
  pub issue_id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub blocked_by: Vec<String>,
}

// ============================================================================
// Normalization to canonical types
// ============================================================================

impl RawSprintData {
  pub fn normalize(self) -> SprintData {
    let mut pipelines: Vec<Pipeline> = self
      .pipelines
      .into_iter()
      .map(|p| Pipeline {
        name: p.name,
        position: p.position,
      })
      .collect();
    pipelines.sort_by_key(|p| p.position);

    SprintData {
      workspace: Workspace {
        id: self.workspace.id,
        name: self.workspace.name,
      },
      pipelines,
      sprints: self.sprints.into_iter().map(RawSprint::normalize).collect(),
    }
  }
}

impl RawSprint {
  fn normalize(self) -> Sprint {
    // Fold the three legacy issue shapes into (summary, list).
    let (shape_summary, issues) = match self.issues {
      Some(RawIssues::List(list)) => (None, list),
      Some(RawIssues::Nodes { nodes }) => (None, nodes),
      Some(RawIssues::Summary(counts)) => (Some(counts), Vec::new()),
      None => (None, Vec::new()),
    };

    // An explicit issues_summary always wins over a summary stored in the
    // legacy issues slot.
    let summary = self
      .issues_summary
      .or(shape_summary)
      .map(RawCounts::into_counts);

    Sprint {
      id: self.id.unwrap_or_else(|| self.name.clone()),
      name: self.name,
      start_date: self.start_date,
      end_date: self.end_date,
      points: SprintPoints {
        total: self.total_points,
        completed: self.completed_points,
        remaining: self.remaining_points,
        utilization: self.utilization,
      },
      member_points: self
        .member_points
        .into_iter()
        .map(|m| MemberPoints {
          name: m.name,
          total: m.total,
          completed: m.completed,
        })
        .collect(),
      blockers: self
        .blockers
        .into_iter()
        .map(|b| Blocker {
          issue_id: b.issue_id,
          title: b.title,
          blocked_by: b.blocked_by,
        })
        .collect(),
      summary,
      issues: issues.into_iter().map(RawIssue::into_issue).collect(),
    }
  }
}

impl RawCounts {
  fn into_counts(self) -> IssueCounts {
    IssueCounts {
      total: self.total,
      completed: self.completed,
      in_progress: self.in_progress,
      blocked: self.blocked,
    }
  }
}

impl RawIssue {
  fn into_issue(self) -> Issue {
    Issue {
      issue_id: self.issue_id,
      title: self.title,
      status: self.status,
      state: self.state,
      story_points: self.story_points,
      pipeline_name: self.pipeline_name,
      epic: self.epic.map(|e| Epic {
        id: e.id,
        title: e.title,
      }),
      assignees: self
        .assignees
        .into_iter()
        .map(|a| Assignee {
          id: a.id,
          name: a.name,
        })
        .collect(),
      blocked_by: self.blocked_by,
    }
  }
}
