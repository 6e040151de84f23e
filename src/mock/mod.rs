//! Static fallback dataset.
//!
//! Served when the backend is unreachable or not configured. Records here carry
//! no backend id, which marks them as read-only.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::errors::SyncError;
use crate::models::{sort_projects, Profile, Project, ProjectQuery, RepoNode, SortKey};
use crate::source::{id_matches, name_matches, ProjectSource};

static PROFILE: Lazy<Profile> = Lazy::new(|| Profile {
    username: "Nocturiis".to_string(),
    name: "Nocturiis".to_string(),
    title: "Software developer".to_string(),
    bio: "Software engineer who enjoys robust systems, developer tooling and open source. \
          I like turning ideas into useful products."
        .to_string(),
    location: "France".to_string(),
    email: "contact@example.com".to_string(),
    avatar_url: "https://github.com/Nocturiis.png".to_string(),
    socials: [
        ("github", "https://github.com/Nocturiis"),
        ("linkedin", "https://www.linkedin.com/in/"),
        ("twitter", "https://x.com/"),
        ("website", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect(),
});

static PROJECTS: Lazy<Vec<Project>> = Lazy::new(|| {
    vec![
        sample(
            "portfolio-nocturiis",
            "Modern portfolio site built with React and FastAPI.",
            "JavaScript",
            &["react", "fastapi", "tailwind"],
            (12, 2),
            "2025-06-21T10:00:00Z",
            true,
        ),
        sample(
            "cli-utils",
            "A collection of CLI tools that automate everyday chores.",
            "Python",
            &["cli", "automation"],
            (45, 5),
            "2025-05-11T14:30:00Z",
            false,
        ),
        Project {
            repo_tree: Some(vec![
                RepoNode::file("Cargo.toml"),
                RepoNode::dir(
                    "src",
                    vec![RepoNode::file("lib.rs"), RepoNode::file("eviction.rs")],
                ),
                RepoNode::dir("benches", vec![]),
            ]),
            ..sample(
                "rusty-cache",
                "A very fast in-memory cache written in Rust.",
                "Rust",
                &["rust", "performance", "systems"],
                (89, 11),
                "2025-04-02T09:12:00Z",
                true,
            )
        },
        sample(
            "go-webhooks",
            "A simple, secure webhook server.",
            "Go",
            &["webhook", "security"],
            (23, 3),
            "2025-03-19T18:42:00Z",
            false,
        ),
        sample(
            "ml-notebooks",
            "ML prototyping notebooks: CV, NLP and MLOps.",
            "Jupyter Notebook",
            &["ml", "cv", "nlp"],
            (71, 9),
            "2025-05-29T07:22:00Z",
            false,
        ),
        sample(
            "next-starter-kit",
            "A clean Next.js starter with auth and tests.",
            "TypeScript",
            &["nextjs", "auth", "testing"],
            (33, 6),
            "2025-02-07T12:00:00Z",
            false,
        ),
        sample(
            "dotfiles",
            "My zsh, tmux and neovim dotfiles.",
            "Shell",
            &["zsh", "tmux", "neovim"],
            (99, 14),
            "2025-06-01T08:55:00Z",
            false,
        ),
        sample(
            "gh-insights",
            "GitHub analytics dashboard (stars, issues, PRs).",
            "TypeScript",
            &["github", "analytics", "dashboard"],
            (64, 10),
            "2025-06-15T16:10:00Z",
            false,
        ),
    ]
});

fn sample(
    name: &str,
    description: &str,
    language: &str,
    topics: &[&str],
    (stars, forks): (u64, u64),
    updated_at: &str,
    featured: bool,
) -> Project {
    Project {
        id: None,
        name: name.to_string(),
        description: description.to_string(),
        language: language.to_string(),
        topics: topics.iter().map(|t| t.to_string()).collect(),
        stars,
        forks,
        url: format!("https://github.com/Nocturiis/{}", name),
        homepage: None,
        updated_at: updated_at.to_string(),
        featured,
        details: None,
        repo_tree: None,
    }
}

/// The built-in profile.
pub fn profile() -> &'static Profile {
    &PROFILE
}

/// The built-in sample projects.
pub fn projects() -> &'static [Project] {
    &PROJECTS
}

/// Fallback source backed by a fixed, never-mutated project list.
#[derive(Debug, Clone)]
pub struct MockSource {
    projects: Vec<Project>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new(projects().to_vec())
    }
}

impl MockSource {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }
}

#[async_trait]
impl ProjectSource for MockSource {
    fn label(&self) -> &'static str {
        "mock"
    }

    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, SyncError> {
        Ok(query.apply(&self.projects))
    }

    async fn list_featured(&self) -> Result<Vec<Project>, SyncError> {
        let mut items: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| p.featured)
            .cloned()
            .collect();
        sort_projects(&mut items, SortKey::Updated);
        Ok(items)
    }

    async fn get_project(&self, key: &str) -> Result<Project, SyncError> {
        self.projects
            .iter()
            .find(|p| id_matches(p, key))
            .or_else(|| self.projects.iter().find(|p| name_matches(p, key)))
            .cloned()
            .ok_or_else(|| SyncError::NotFound(key.to_string()))
    }
}
