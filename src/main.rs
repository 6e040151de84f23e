//! Portfolio sync command line
//!
//! Drives the sync layer from a terminal: browse projects with fallback, edit
//! project metadata, and send or inspect contact messages.

use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio_sync::config::LogFormat;
use portfolio_sync::models::{ContactRequest, Project, ProjectQuery, SortKey};
use portfolio_sync::{Advisory, Config, ProjectForm, Sourced, SyncError, SyncService};

#[derive(Debug, Parser)]
#[command(name = "portfolio-sync", version)]
#[command(about = "Portfolio project data with offline fallback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the site owner's profile
    Profile,
    /// List projects
    Projects {
        /// Text to look for in names and descriptions
        #[arg(long)]
        q: Option<String>,
        /// Exact language, or "all"
        #[arg(long)]
        lang: Option<String>,
        /// updated, stars or name
        #[arg(long)]
        sort: Option<String>,
    },
    /// List featured projects
    Featured,
    /// Show one project by id or name
    Show { key: String },
    /// List projects from the backend for editing
    Admin {
        #[arg(long, default_value = "")]
        q: String,
    },
    /// Edit a project stored on the backend
    Edit(EditArgs),
    /// Create a project from a JSON file
    Create { file: PathBuf },
    /// Push the built-in sample projects to the backend
    Seed,
    /// Send a contact message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Show contact messages queued on this device
    Outbox,
}

#[derive(Debug, Args)]
struct EditArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    language: Option<String>,
    /// Comma-separated topics
    #[arg(long)]
    topics: Option<String>,
    #[arg(long)]
    featured: Option<bool>,
    #[arg(long)]
    story: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    impact: Option<String>,
    /// YYYY-MM-DD, or empty to clear
    #[arg(long)]
    started_at: Option<String>,
    /// YYYY-MM-DD, or empty to clear
    #[arg(long)]
    completed_at: Option<String>,
    /// File holding the repo tree JSON, or "-" for stdin
    #[arg(long)]
    repo_tree: Option<PathBuf>,
}

impl EditArgs {
    fn apply(self, form: &mut ProjectForm) -> std::io::Result<()> {
        let assign = |slot: &mut String, value: Option<String>| {
            if let Some(v) = value {
                *slot = v;
            }
        };
        assign(&mut form.name, self.name);
        assign(&mut form.description, self.description);
        assign(&mut form.language, self.language);
        assign(&mut form.topics, self.topics);
        assign(&mut form.details.story, self.story);
        assign(&mut form.details.role, self.role);
        assign(&mut form.details.impact, self.impact);
        assign(&mut form.details.started_at, self.started_at);
        assign(&mut form.details.completed_at, self.completed_at);
        if let Some(featured) = self.featured {
            form.featured = featured;
        }
        if let Some(path) = self.repo_tree {
            form.details.repo_tree = if path.as_os_str() == "-" {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                text
            } else {
                std::fs::read_to_string(path)?
            };
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    tracing::debug!("Backend: {:?}", config.backend_url.as_ref().map(|u| u.as_str()));
    tracing::debug!("Local store: {:?}", config.store_path);

    let service = SyncService::from_config(&config).await?;

    if let Err(err) = run(&service, cli.command).await {
        eprintln!("{} ({})", err, err.error_code());
        std::process::exit(1);
    }

    Ok(())
}

async fn run(service: &SyncService, command: Commands) -> Result<(), SyncError> {
    match command {
        Commands::Profile => print_json(service.profile())?,
        Commands::Projects { q, lang, sort } => {
            let query = ProjectQuery {
                q,
                lang,
                sort: sort.as_deref().map(SortKey::parse),
            };
            let listed = service.list_projects(&query).await?;
            print_sourced(&listed)?;
        }
        Commands::Featured => print_sourced(&service.list_featured().await?)?,
        Commands::Show { key } => match service.get_project(&key).await {
            Ok(found) => print_sourced(&found)?,
            Err(SyncError::NotFound(_)) => report(&Advisory::NotFound),
            Err(err) => return Err(err),
        },
        Commands::Admin { q } => {
            let rows = service
                .admin_projects(&q)
                .await
                .inspect_err(|_| report(&Advisory::LoadFailed))?;
            print_json(&rows)?;
        }
        Commands::Edit(args) => {
            let project = service.remote().get_project(&args.id).await?;
            let mut form = ProjectForm::from_project(&project);
            args.apply(&mut form)
                .map_err(|e| SyncError::validation("repoTree", format!("cannot read input: {}", e)))?;
            let saved = service
                .update_project(&project, &form)
                .await
                .inspect_err(|err| report(&Advisory::for_write_error(err)))?;
            report(&Advisory::Saved {
                name: saved.name.clone(),
            });
            print_json(&saved)?;
        }
        Commands::Create { file } => {
            let text = std::fs::read_to_string(&file)
                .map_err(|e| SyncError::validation("file", format!("{}: {}", file.display(), e)))?;
            let project: Project = serde_json::from_str(&text)
                .map_err(|e| SyncError::validation("project", e.to_string()))?;
            print_json(&service.create_project(&project).await?)?;
        }
        Commands::Seed => print_json(&service.seed_from_mock().await?)?,
        Commands::Contact {
            name,
            email,
            message,
        } => {
            let advisory = service
                .submit_contact(ContactRequest::new(name, email, message))
                .await?;
            report(&advisory);
            if advisory.is_degraded() {
                report(&Advisory::Sent);
            }
        }
        Commands::Outbox => print_json(&service.outbox().await?)?,
    }
    Ok(())
}

fn print_sourced<T: Serialize>(sourced: &Sourced<T>) -> Result<(), SyncError> {
    if let Some(advisory) = &sourced.advisory {
        report(advisory);
    }
    print_json(&sourced.data)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), SyncError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report(advisory: &Advisory) {
    eprintln!("{}: {}", advisory.title(), advisory.description());
}
