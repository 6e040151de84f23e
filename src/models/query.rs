//! Project list filters shared by the backend query string and the fallback dataset.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Project;

/// Sentinel language value meaning "no language filter".
pub const ALL_LANGUAGES: &str = "all";

/// Ordering of a project list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Most recently updated first
    #[default]
    Updated,
    /// Most starred first
    Stars,
    /// Name ascending
    Name,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Updated => "updated",
            SortKey::Stars => "stars",
            SortKey::Name => "name",
        }
    }

    /// Parse a sort token; anything unrecognized sorts by `updated`.
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "stars" => SortKey::Stars,
            "name" => SortKey::Name,
            _ => SortKey::Updated,
        }
    }

    fn compare(&self, a: &Project, b: &Project) -> Ordering {
        match self {
            SortKey::Updated => compare_timestamps(&b.updated_at, &a.updated_at),
            SortKey::Stars => b.stars.cmp(&a.stars),
            SortKey::Name => a.name.cmp(&b.name),
        }
    }
}

/// Filter for `GET /api/projects`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectQuery {
    /// Case-insensitive substring over name and description
    pub q: Option<String>,
    /// Exact language, or `all`
    pub lang: Option<String>,
    pub sort: Option<SortKey>,
}

impl ProjectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    fn text(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    fn language(&self) -> Option<&str> {
        self.lang
            .as_deref()
            .filter(|lang| !lang.trim().is_empty() && !lang.eq_ignore_ascii_case(ALL_LANGUAGES))
    }

    /// Query-string pairs for the backend; empty when no filter is set.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = self.q.as_deref().filter(|q| !q.trim().is_empty()) {
            pairs.push(("q", q.to_string()));
        }
        if let Some(lang) = self.lang.as_deref().filter(|l| !l.trim().is_empty()) {
            pairs.push(("lang", lang.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        pairs
    }

    /// Whether a project passes the text and language filters.
    pub fn matches(&self, project: &Project) -> bool {
        if let Some(lang) = self.language() {
            if project.language != lang {
                return false;
            }
        }
        match self.text() {
            Some(q) => {
                project.name.to_lowercase().contains(&q)
                    || project.description.to_lowercase().contains(&q)
            }
            None => true,
        }
    }

    /// Filter and sort a local collection the way the backend does.
    pub fn apply(&self, projects: &[Project]) -> Vec<Project> {
        let mut items: Vec<Project> = projects
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();
        sort_projects(&mut items, self.sort.unwrap_or_default());
        items
    }
}

/// Stable sort by the given key.
pub fn sort_projects(items: &mut [Project], sort: SortKey) {
    items.sort_by(|a, b| sort.compare(a, b));
}

/// Options for a language selector: `all` followed by each language once, in first-seen order.
pub fn language_options(projects: &[Project]) -> Vec<String> {
    let mut options = vec![ALL_LANGUAGES.to_string()];
    for project in projects {
        if !options.iter().skip(1).any(|l| l == &project.language) {
            options.push(project.language.clone());
        }
    }
    options
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Backends that drop the offset send naive UTC timestamps
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Compare two timestamp strings chronologically, falling back to string order.
pub fn compare_timestamps(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}
