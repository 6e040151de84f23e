//! Project model matching the backend project documents.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// One entry in a repository file-tree preview.
///
/// Only directories carry children, so a file with children cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepoNode {
    Dir {
        name: String,
        #[serde(default, deserialize_with = "null_as_default")]
        children: Vec<RepoNode>,
    },
    File {
        name: String,
    },
}

impl RepoNode {
    pub fn dir(name: impl Into<String>, children: Vec<RepoNode>) -> Self {
        RepoNode::Dir {
            name: name.into(),
            children,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        RepoNode::File { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            RepoNode::Dir { name, .. } | RepoNode::File { name } => name,
        }
    }

    pub fn children(&self) -> &[RepoNode] {
        match self {
            RepoNode::Dir { children, .. } => children,
            RepoNode::File { .. } => &[],
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, RepoNode::Dir { .. })
    }

    /// Depth of the subtree rooted here; a lone node has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(RepoNode::depth).max().unwrap_or(0)
    }
}

/// Optional narrative attached to a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// A tracked software repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Backend-assigned id; absent for records that only exist in the fallback dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stars: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub forks: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ProjectDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_tree: Option<Vec<RepoNode>>,
}

impl Project {
    /// Backend id, if this record can be edited.
    pub fn editable_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn is_editable(&self) -> bool {
        self.editable_id().is_some()
    }

    /// Repo tree nodes, empty when none were provided.
    pub fn repo_nodes(&self) -> &[RepoNode] {
        self.repo_tree.as_deref().unwrap_or(&[])
    }
}

/// Canonical payload for `PUT /api/projects/{id}`.
///
/// Fields left as `None` are not sent and the backend keeps its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ProjectDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_tree: Option<Vec<RepoNode>>,
}

/// Backend acknowledgment of a project write.
///
/// Some backends echo the stored project, others only report a count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WriteAck {
    Updated { updated: u64 },
    Inserted { inserted: u64 },
    Project(Box<Project>),
    Other(serde_json::Value),
}

impl WriteAck {
    /// The echoed project, when the backend returned one.
    pub fn project(&self) -> Option<&Project> {
        match self {
            WriteAck::Project(p) => Some(p),
            _ => None,
        }
    }
}

/// `{ "items": [...] }` envelope used by the list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Project>,
}
