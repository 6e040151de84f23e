//! Integration tests for the sync layer against an in-process stub backend.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::client::RemoteClient;
use crate::db::{init_database, ContactQueue, LocalStore};
use crate::errors::{Advisory, SyncError};
use crate::mock::{self, MockSource};
use crate::models::{
    compare_timestamps, ContactRequest, Project, ProjectQuery, RepoNode, SortKey, WriteAck,
};
use crate::sync::{DetailsForm, Origin, ProjectForm, SyncService, ViewScope};

/// Shared state of the stub backend.
#[derive(Clone, Default)]
struct StubState {
    projects: Arc<Mutex<Vec<Project>>>,
    contacts: Arc<Mutex<Vec<Value>>>,
    updates: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    requests: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    next_id: Arc<AtomicUsize>,
}

impl StubState {
    fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn assign_id(&self) -> String {
        format!("6650{:020}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

async fn count_requests(state: StubState, request: Request, next: Next) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if state.failing.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "backend down").into_response();
    }
    next.run(request).await
}

async fn list_projects(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.queries.lock().unwrap().push(params.clone());
    let query = ProjectQuery {
        q: params.get("q").cloned(),
        lang: params.get("lang").cloned(),
        sort: params.get("sort").map(|s| SortKey::parse(s)),
    };
    let items = query.apply(&state.projects.lock().unwrap());
    Json(json!({ "items": items }))
}

async fn list_featured(State(state): State<StubState>) -> Json<Value> {
    let items: Vec<Project> = state
        .projects
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p.featured)
        .cloned()
        .collect();
    Json(json!({ "items": items }))
}

async fn get_project(State(state): State<StubState>, Path(id): Path<String>) -> Response {
    let found = state
        .projects
        .lock()
        .unwrap()
        .iter()
        .find(|p| p.id.as_deref() == Some(id.as_str()))
        .cloned();
    match found {
        Some(project) => Json(project).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Project not found" })),
        )
            .into_response(),
    }
}

async fn update_project(
    State(state): State<StubState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.updates.lock().unwrap().push(body.clone());
    let mut projects = state.projects.lock().unwrap();
    let Some(slot) = projects.iter_mut().find(|p| p.id.as_deref() == Some(id.as_str())) else {
        return (StatusCode::NOT_FOUND, "Project not found").into_response();
    };

    let mut merged = serde_json::to_value(&*slot).unwrap();
    for (key, value) in body.as_object().unwrap() {
        merged[key] = value.clone();
    }
    *slot = serde_json::from_value(merged).unwrap();
    Json(json!({ "updated": 1 })).into_response()
}

async fn create_projects(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
    let docs = match body {
        Value::Array(items) => items,
        single => vec![single],
    };
    let mut projects = state.projects.lock().unwrap();
    for doc in &docs {
        let mut project: Project = serde_json::from_value(doc.clone()).unwrap();
        project.id = Some(state.assign_id());
        projects.push(project);
    }
    Json(json!({ "inserted": docs.len() }))
}

async fn create_contact(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
    state.contacts.lock().unwrap().push(body.clone());
    Json(json!({
        "id": "c1",
        "name": body["name"],
        "email": body["email"],
        "message": body["message"],
        "createdAt": "2025-06-21T10:00:00"
    }))
}

/// Stub backend bound to an ephemeral port.
struct StubBackend {
    state: StubState,
    base_url: Url,
}

impl StubBackend {
    async fn spawn(projects: Vec<Project>) -> Self {
        let state = StubState::default();
        *state.projects.lock().unwrap() = projects;

        let counter_state = state.clone();
        let app = Router::new()
            .route("/api/projects", get(list_projects).post(create_projects))
            .route("/api/projects/featured", get(list_featured))
            .route("/api/projects/{id}", get(get_project).put(update_project))
            .route("/api/contact", axum::routing::post(create_contact))
            .layer(middleware::from_fn(move |req, next| {
                count_requests(counter_state.clone(), req, next)
            }))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        StubBackend {
            state,
            base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
        }
    }
}

/// Test fixture wiring a sync service to local storage and, optionally, a stub backend.
struct TestFixture {
    service: SyncService,
    backend: Option<StubBackend>,
    _temp_dir: TempDir,
}

impl TestFixture {
    /// Service with a reachable backend holding `projects`.
    async fn online(projects: Vec<Project>) -> Self {
        let backend = StubBackend::spawn(projects).await;
        let remote = RemoteClient::new(Some(backend.base_url.clone())).unwrap();
        Self::build(remote, Some(backend)).await
    }

    /// Service whose backend URL is not configured.
    async fn offline() -> Self {
        Self::build(RemoteClient::unconfigured().unwrap(), None).await
    }

    async fn build(remote: RemoteClient, backend: Option<StubBackend>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("local.sqlite"))
            .await
            .expect("Failed to init DB");
        let outbox = ContactQueue::new(LocalStore::new(pool));

        TestFixture {
            service: SyncService::new(remote, outbox),
            backend,
            _temp_dir: temp_dir,
        }
    }

    fn stub(&self) -> &StubState {
        &self.backend.as_ref().expect("fixture has no backend").state
    }
}

fn live_project(id: &str, name: &str, language: &str, stars: u64, featured: bool) -> Project {
    Project {
        id: Some(id.to_string()),
        name: name.to_string(),
        description: format!("{} from the backend", name),
        language: language.to_string(),
        topics: vec!["live".to_string()],
        stars,
        forks: 1,
        url: format!("https://github.com/Nocturiis/{}", name),
        homepage: None,
        updated_at: "2025-07-01T00:00:00".to_string(),
        featured,
        details: None,
        repo_tree: None,
    }
}

fn names(projects: &[Project]) -> Vec<&str> {
    projects.iter().map(|p| p.name.as_str()).collect()
}

// ==================== READ PATHS ====================

#[tokio::test]
async fn test_backend_data_is_trusted_when_reachable() {
    let fixture = TestFixture::online(vec![
        live_project("a1", "alpha", "Rust", 3, true),
        live_project("b2", "beta", "Go", 9, false),
    ])
    .await;

    let listed = fixture
        .service
        .list_projects(&ProjectQuery::new())
        .await
        .unwrap();
    assert_eq!(listed.origin, Origin::Backend);
    assert!(listed.advisory.is_none());
    assert_eq!(listed.data.len(), 2);

    let featured = fixture.service.list_featured().await.unwrap();
    assert_eq!(names(&featured.data), ["alpha"]);

    let one = fixture.service.get_project("b2").await.unwrap();
    assert!(!one.is_degraded());
    assert_eq!(one.data.name, "beta");
}

#[tokio::test]
async fn test_filter_is_forwarded_to_backend() {
    let fixture = TestFixture::online(vec![live_project("a1", "alpha", "Rust", 3, false)]).await;

    let query = ProjectQuery::new()
        .with_q("rusty cache")
        .with_lang("Rust")
        .with_sort(SortKey::Stars);
    fixture.service.list_projects(&query).await.unwrap();
    fixture
        .service
        .list_projects(&ProjectQuery::new())
        .await
        .unwrap();

    let queries = fixture.stub().queries.lock().unwrap().clone();
    assert_eq!(queries[0]["q"], "rusty cache");
    assert_eq!(queries[0]["lang"], "Rust");
    assert_eq!(queries[0]["sort"], "stars");
    assert!(queries[1].is_empty());
}

#[tokio::test]
async fn test_fallback_matches_independent_filter() {
    let fixture = TestFixture::offline().await;

    let cases = [
        ("", "all", "updated"),
        ("", "Rust", "stars"),
        ("", "TypeScript", "name"),
        ("cache", "all", "stars"),
        ("CLI", "all", "name"),
        ("tool", "Python", "updated"),
        ("", "Cobol", "updated"),
        ("notebooks", "all", "bogus"),
    ];

    for (q, lang, sort) in cases {
        let query = ProjectQuery::new()
            .with_q(q)
            .with_lang(lang)
            .with_sort(SortKey::parse(sort));
        let result = fixture.service.list_projects(&query).await.unwrap();
        assert_eq!(result.origin, Origin::Fallback);
        assert!(matches!(result.advisory, Some(Advisory::Degraded { .. })));

        let needle = q.to_lowercase();
        let expected: BTreeSet<&str> = mock::projects()
            .iter()
            .filter(|p| lang == "all" || p.language == lang)
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .map(|p| p.name.as_str())
            .collect();
        let actual: BTreeSet<&str> = result.data.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(actual, expected, "case {:?}", (q, lang, sort));
    }
}

#[tokio::test]
async fn test_fallback_language_filter() {
    let fixture = TestFixture::offline().await;
    let result = fixture
        .service
        .list_projects(&ProjectQuery::new().with_lang("Rust"))
        .await
        .unwrap();
    assert_eq!(names(&result.data), ["rusty-cache"]);
}

#[tokio::test]
async fn test_fallback_orderings() {
    let fixture = TestFixture::offline().await;
    let list = |sort: &'static str| {
        let service = &fixture.service;
        async move {
            service
                .list_projects(&ProjectQuery::new().with_sort(SortKey::parse(sort)))
                .await
                .unwrap()
                .data
        }
    };

    let by_stars = list("stars").await;
    assert_eq!(by_stars.len(), 8);
    assert!(by_stars.windows(2).all(|w| w[0].stars >= w[1].stars));
    assert_eq!(by_stars[0].name, "dotfiles");

    let by_name = list("name").await;
    assert!(by_name.windows(2).all(|w| w[0].name <= w[1].name));

    for sort in ["updated", "trending"] {
        let by_updated = list(sort).await;
        assert!(by_updated
            .windows(2)
            .all(|w| compare_timestamps(&w[0].updated_at, &w[1].updated_at).is_ge()));
        assert_eq!(by_updated[0].name, "portfolio-nocturiis");
    }
}

#[tokio::test]
async fn test_featured_fallback() {
    let fixture = TestFixture::offline().await;
    let featured = fixture.service.list_featured().await.unwrap();
    assert!(featured.is_degraded());
    assert!(featured.data.iter().all(|p| p.featured));
    assert_eq!(names(&featured.data), ["portfolio-nocturiis", "rusty-cache"]);
}

#[tokio::test]
async fn test_backend_error_status_triggers_fallback() {
    let fixture = TestFixture::online(vec![live_project("a1", "alpha", "Rust", 3, true)]).await;
    fixture.stub().set_failing(true);

    let listed = fixture
        .service
        .list_projects(&ProjectQuery::new())
        .await
        .unwrap();
    assert_eq!(listed.origin, Origin::Fallback);
    assert_eq!(listed.data.len(), mock::projects().len());
    assert_eq!(fixture.stub().request_count(), 1);
}

#[tokio::test]
async fn test_detail_falls_back_to_name_lookup() {
    let fixture = TestFixture::online(vec![live_project("a1", "alpha", "Rust", 3, true)]).await;

    // Backend answers 404 for a name, so the fallback dataset is searched by name
    let found = fixture.service.get_project("dotfiles").await.unwrap();
    assert!(found.is_degraded());
    assert_eq!(found.data.name, "dotfiles");
    assert!(!found.data.is_editable());

    let offline = TestFixture::offline().await;
    let found = offline.service.get_project("ml-notebooks").await.unwrap();
    assert_eq!(found.data.language, "Jupyter Notebook");
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let fixture = TestFixture::offline().await;
    let err = fixture
        .service
        .get_project("665f1c000000000000000000")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_custom_fallback_dataset_by_id() {
    let fixture = TestFixture::offline().await;
    let service = fixture.service.with_fallback(MockSource::new(vec![live_project(
        "42",
        "answer",
        "Rust",
        1,
        false,
    )]));
    assert_eq!(service.get_project("42").await.unwrap().data.name, "answer");
    assert_eq!(service.language_options(&[]), ["all", "Rust"]);
}

#[tokio::test]
async fn test_admin_listing_never_falls_back() {
    let fixture = TestFixture::offline().await;
    let err = fixture.service.admin_projects("").await.unwrap_err();
    assert!(err.is_transport());

    let online = TestFixture::online(vec![
        live_project("a1", "alpha", "Rust", 3, true),
        live_project("b2", "beta", "Go", 9, false),
    ])
    .await;
    let rows = online.service.admin_projects("bet").await.unwrap();
    assert_eq!(names(&rows), ["beta"]);
}

#[tokio::test]
async fn test_dismissed_view_drops_result() {
    let fixture = TestFixture::offline().await;
    let scope = ViewScope::new();
    scope.dismiss();
    let result = scope.run(fixture.service.list_featured()).await;
    assert!(result.is_none());
}

// ==================== WRITE PATHS ====================

#[tokio::test]
async fn test_update_sends_canonical_payload_then_refreshes() {
    let fixture = TestFixture::online(vec![live_project("a1", "alpha", "Rust", 3, false)]).await;
    let project = fixture.service.get_project("a1").await.unwrap().data;
    let before = fixture.stub().request_count();

    let mut form = ProjectForm::from_project(&project);
    form.topics = " rust, cli,, rust ".to_string();
    form.featured = true;
    form.details.story = "Why I built it".to_string();
    form.details.started_at = "2024-01-15".to_string();
    form.details.completed_at = "".to_string();
    form.details.repo_tree =
        r#"[{"name":"src","type":"dir","children":[{"name":"main.rs","type":"file"}]}]"#
            .to_string();

    let saved = fixture
        .service
        .update_project(&project, &form)
        .await
        .unwrap();

    // One PUT followed by one GET
    assert_eq!(fixture.stub().request_count(), before + 2);

    let body = fixture.stub().updates.lock().unwrap()[0].clone();
    assert_eq!(body["topics"], json!(["rust", "cli"]));
    assert_eq!(body["featured"], json!(true));
    assert_eq!(body["details"]["startedAt"], "2024-01-15T00:00:00.000Z");
    assert!(body["details"].get("completedAt").is_none());
    assert_eq!(body["repoTree"][0]["children"][0]["name"], "main.rs");

    assert!(saved.featured);
    assert_eq!(saved.topics, ["rust", "cli"]);
    assert_eq!(
        saved.repo_nodes(),
        &[RepoNode::dir("src", vec![RepoNode::file("main.rs")])]
    );
}

#[tokio::test]
async fn test_details_update_only_touches_narrative() {
    let fixture = TestFixture::online(vec![live_project("a1", "alpha", "Rust", 3, false)]).await;
    let project = fixture.service.get_project("a1").await.unwrap().data;

    let mut form = DetailsForm::from_project(&project);
    form.role = "Author".to_string();
    let saved = fixture
        .service
        .update_details(&project, &form)
        .await
        .unwrap();

    let body = fixture.stub().updates.lock().unwrap()[0].clone();
    let keys: BTreeSet<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, BTreeSet::from(["details", "repoTree"]));
    assert_eq!(saved.details.unwrap().role.as_deref(), Some("Author"));
    assert_eq!(saved.name, "alpha");
}

#[tokio::test]
async fn test_invalid_repo_tree_never_reaches_backend() {
    let fixture = TestFixture::online(vec![live_project("a1", "alpha", "Rust", 3, false)]).await;
    let project = fixture.service.get_project("a1").await.unwrap().data;
    let before = fixture.stub().request_count();

    for bad in [
        "[{\"name\": \"src\"",
        "{\"name\": \"src\", \"type\": \"dir\"}",
        "\"just text\"",
    ] {
        let mut form = ProjectForm::from_project(&project);
        form.details.repo_tree = bad.to_string();

        let err = fixture
            .service
            .update_project(&project, &form)
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("repoTree"), "input: {}", bad);
        assert!(matches!(
            Advisory::for_write_error(&err),
            Advisory::InvalidInput { .. }
        ));
    }

    assert_eq!(fixture.stub().request_count(), before);
    assert!(fixture.stub().updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_fallback_record_is_not_editable() {
    let fixture = TestFixture::online(vec![]).await;
    let project = mock::projects()[0].clone();
    let form = ProjectForm::from_project(&project);

    let err = fixture
        .service
        .update_project(&project, &form)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotEditable(_)));
    assert_eq!(Advisory::for_write_error(&err), Advisory::NotEditable);

    // Rejected before validation too
    let mut broken = DetailsForm::from_project(&project);
    broken.repo_tree = "not json".to_string();
    let err = fixture
        .service
        .update_details(&project, &broken)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotEditable(_)));

    assert_eq!(fixture.stub().request_count(), 0);
}

#[tokio::test]
async fn test_update_failure_is_surfaced() {
    let fixture = TestFixture::online(vec![live_project("a1", "alpha", "Rust", 3, false)]).await;
    let project = fixture.service.get_project("a1").await.unwrap().data;
    fixture.stub().set_failing(true);

    let err = fixture
        .service
        .update_project(&project, &ProjectForm::from_project(&project))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Http { status: 503, .. }));
    assert_eq!(Advisory::for_write_error(&err), Advisory::SaveFailed);
}

#[tokio::test]
async fn test_create_and_seed() {
    let fixture = TestFixture::online(vec![]).await;

    let ack = fixture.service.seed_from_mock().await.unwrap();
    assert_eq!(ack, WriteAck::Inserted { inserted: 8 });

    let mut extra = live_project("ignored", "gamma", "Zig", 0, false);
    extra.id = None;
    let ack = fixture.service.create_project(&extra).await.unwrap();
    assert_eq!(ack, WriteAck::Inserted { inserted: 1 });

    let listed = fixture
        .service
        .list_projects(&ProjectQuery::new())
        .await
        .unwrap();
    assert_eq!(listed.origin, Origin::Backend);
    assert_eq!(listed.data.len(), 9);
    assert!(listed.data.iter().all(|p| p.is_editable()));
}

#[tokio::test]
async fn test_create_validates_locally() {
    let fixture = TestFixture::online(vec![]).await;
    let mut nameless = live_project("x", "", "Rust", 0, false);
    nameless.id = None;

    let err = fixture.service.create_project(&nameless).await.unwrap_err();
    assert_eq!(err.field(), Some("name"));
    assert_eq!(fixture.stub().request_count(), 0);
}

// ==================== CONTACT ====================

#[tokio::test]
async fn test_contact_is_queued_when_backend_unreachable() {
    let fixture = TestFixture::offline().await;

    let advisory = fixture
        .service
        .submit_contact(ContactRequest::new("A", "a@x.com", "hi"))
        .await
        .unwrap();
    assert_eq!(advisory, Advisory::SavedLocally);
    assert!(advisory.is_degraded());

    let queued = fixture.service.outbox().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].name, "A");
    assert_eq!(queued[0].email, "a@x.com");
    assert_eq!(queued[0].message, "hi");
    assert!(queued[0].id > 0);
    assert!(chrono::DateTime::parse_from_rfc3339(&queued[0].date).is_ok());
}

#[tokio::test]
async fn test_contact_queue_accumulates() {
    let fixture = TestFixture::online(vec![]).await;
    fixture.stub().set_failing(true);

    for i in 0..3 {
        fixture
            .service
            .submit_contact(ContactRequest::new(format!("n{}", i), "a@x.com", "hi"))
            .await
            .unwrap();
    }
    let queued = fixture.service.outbox().await.unwrap();
    assert_eq!(
        queued.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        ["n0", "n1", "n2"]
    );
}

#[tokio::test]
async fn test_contact_delivered_when_backend_reachable() {
    let fixture = TestFixture::online(vec![]).await;

    let advisory = fixture
        .service
        .submit_contact(ContactRequest::new("A", "a@x.com", "hi"))
        .await
        .unwrap();
    assert_eq!(advisory, Advisory::Sent);
    assert!(fixture.service.outbox().await.unwrap().is_empty());

    let contacts = fixture.stub().contacts.lock().unwrap().clone();
    assert_eq!(
        contacts,
        vec![json!({"name": "A", "email": "a@x.com", "message": "hi"})]
    );
}

#[tokio::test]
async fn test_invalid_contact_is_rejected_not_queued() {
    let fixture = TestFixture::offline().await;
    let err = fixture
        .service
        .submit_contact(ContactRequest::new("A", "", "hi"))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("email"));
    assert!(fixture.service.outbox().await.unwrap().is_empty());
}
