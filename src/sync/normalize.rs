//! Edit forms and their canonical update payloads.
//!
//! Forms hold what a user types: topics as one comma-separated string, dates as
//! `YYYY-MM-DD`, the repo tree as JSON text. Normalizing a form validates all of
//! it locally, so a bad field is rejected before anything is sent.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

use crate::errors::SyncError;
use crate::models::{Project, ProjectDetails, ProjectUpdate, RepoNode};

/// Field name used in repo tree validation errors.
pub const REPO_TREE_FIELD: &str = "repoTree";

/// Split a comma-separated topic string into trimmed, non-empty, de-duplicated topics.
pub fn parse_topics(input: &str) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for topic in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }
    }
    topics
}

/// Join topics for display in a single text input.
pub fn format_topics(topics: &[String]) -> String {
    topics.join(", ")
}

/// Parse repo tree JSON text into nodes.
///
/// Blank text means an empty tree. The value must be an array of node objects;
/// any other shape is a validation error on `repoTree` with the path of the bad node.
pub fn parse_repo_tree(input: &str) -> Result<Vec<RepoNode>, SyncError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(input)
        .map_err(|e| SyncError::validation(REPO_TREE_FIELD, format!("invalid JSON: {}", e)))?;

    match value {
        Value::Array(items) => nodes_from_values(&items, REPO_TREE_FIELD),
        other => Err(SyncError::validation(
            REPO_TREE_FIELD,
            format!("expected an array of nodes, got {}", kind(&other)),
        )),
    }
}

/// Render nodes as pretty-printed JSON for editing.
pub fn format_repo_tree(nodes: &[RepoNode]) -> String {
    serde_json::to_string_pretty(nodes).unwrap_or_else(|_| "[]".to_string())
}

fn nodes_from_values(items: &[Value], path: &str) -> Result<Vec<RepoNode>, SyncError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| node_from_value(item, &format!("{}[{}]", path, i)))
        .collect()
}

fn node_from_value(value: &Value, path: &str) -> Result<RepoNode, SyncError> {
    let invalid = |message: String| SyncError::validation(REPO_TREE_FIELD, message);

    let Value::Object(fields) = value else {
        return Err(invalid(format!("{}: expected an object, got {}", path, kind(value))));
    };

    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        Some(Value::String(_)) => return Err(invalid(format!("{}: name is empty", path))),
        Some(other) => {
            return Err(invalid(format!(
                "{}: name must be a string, got {}",
                path,
                kind(other)
            )))
        }
        None => return Err(invalid(format!("{}: missing name", path))),
    };

    let children = match fields.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => nodes_from_values(items, &format!("{}.children", path))?,
        Some(other) => {
            return Err(invalid(format!(
                "{}: children must be an array, got {}",
                path,
                kind(other)
            )))
        }
    };

    match fields.get("type").and_then(Value::as_str) {
        Some("dir") => Ok(RepoNode::Dir { name, children }),
        Some("file") if children.is_empty() => Ok(RepoNode::File { name }),
        Some("file") => Err(invalid(format!("{}: a file cannot have children", path))),
        Some(other) => Err(invalid(format!(
            "{}: type must be \"dir\" or \"file\", got \"{}\"",
            path, other
        ))),
        None => Err(invalid(format!("{}: missing type", path))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize a date input into a full UTC timestamp.
///
/// Blank input yields `None` so the field is omitted rather than sent empty.
/// `YYYY-MM-DD` becomes midnight UTC; full RFC 3339 timestamps are accepted too.
pub fn normalize_date(field: &str, input: &str) -> Result<Option<String>, SyncError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let instant = if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| SyncError::validation(field, format!("invalid date '{}'", input)))?
    } else {
        DateTime::parse_from_rfc3339(input)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| {
                SyncError::validation(field, format!("expected YYYY-MM-DD, got '{}'", input))
            })?
    };

    Ok(Some(instant.to_rfc3339_opts(SecondsFormat::Millis, true)))
}

/// The `YYYY-MM-DD` prefix of a stored timestamp, for a date input.
pub fn date_input(timestamp: Option<&str>) -> String {
    timestamp
        .map(|ts| ts.chars().take(10).collect())
        .unwrap_or_default()
}

/// Narrative fields shared by both edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsForm {
    pub story: String,
    pub role: String,
    pub impact: String,
    /// `YYYY-MM-DD` or blank
    pub started_at: String,
    /// `YYYY-MM-DD` or blank
    pub completed_at: String,
    /// Repo tree as JSON text
    pub repo_tree: String,
}

impl DetailsForm {
    /// Pre-fill from a project.
    pub fn from_project(project: &Project) -> Self {
        let details = project.details.clone().unwrap_or_default();
        Self {
            story: details.story.unwrap_or_default(),
            role: details.role.unwrap_or_default(),
            impact: details.impact.unwrap_or_default(),
            started_at: date_input(details.started_at.as_deref()),
            completed_at: date_input(details.completed_at.as_deref()),
            repo_tree: format_repo_tree(project.repo_nodes()),
        }
    }

    fn details(&self) -> Result<ProjectDetails, SyncError> {
        Ok(ProjectDetails {
            story: Some(self.story.clone()),
            role: Some(self.role.clone()),
            impact: Some(self.impact.clone()),
            started_at: normalize_date("startedAt", &self.started_at)?,
            completed_at: normalize_date("completedAt", &self.completed_at)?,
        })
    }

    /// Payload updating only the narrative and repo tree.
    pub fn normalize(&self) -> Result<ProjectUpdate, SyncError> {
        let repo_tree = parse_repo_tree(&self.repo_tree)?;
        Ok(ProjectUpdate {
            details: Some(self.details()?),
            repo_tree: Some(repo_tree),
            ..Default::default()
        })
    }
}

/// Full admin edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
    pub language: String,
    /// Comma-separated topics
    pub topics: String,
    pub featured: bool,
    pub details: DetailsForm,
}

impl ProjectForm {
    /// Pre-fill from a project.
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            description: project.description.clone(),
            language: project.language.clone(),
            topics: format_topics(&project.topics),
            featured: project.featured,
            details: DetailsForm::from_project(project),
        }
    }

    /// Topics as they will be saved.
    pub fn topic_list(&self) -> Vec<String> {
        parse_topics(&self.topics)
    }

    /// Canonical payload carrying every editable field.
    pub fn normalize(&self) -> Result<ProjectUpdate, SyncError> {
        if self.name.trim().is_empty() {
            return Err(SyncError::validation("name", "name is required"));
        }
        let narrative = self.details.normalize()?;
        Ok(ProjectUpdate {
            name: Some(self.name.trim().to_string()),
            description: Some(self.description.clone()),
            language: Some(self.language.trim().to_string()),
            topics: Some(self.topic_list()),
            featured: Some(self.featured),
            ..narrative
        })
    }
}
