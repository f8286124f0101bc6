//! Note HTTP Routes
//!
//! CRUD endpoints over the note store. Every handler runs the store call,
//! and the backup it triggers, on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::notes::{NoteError, NoteResult, NoteStore};

use super::{api_error, scope_param, ApiError};

// ==================
// Shared State
// ==================

/// Note state shared across handlers
pub struct NotesState {
    pub store: NoteStore,
}

impl NotesState {
    pub fn new(store: NoteStore) -> Self {
        Self { store }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScopeForm {
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteForm {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditNoteForm {
    #[serde(rename = "oldTitle")]
    pub old_title: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotesListResponse {
    pub scope: Option<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScopesResponse {
    pub scopes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<String>,
}

// ==================
// Router
// ==================

/// Create note routes
pub fn note_routes(state: Arc<NotesState>) -> Router {
    Router::new()
        .route("/", get(list_notes_handler))
        .route("/scopes", get(list_scopes_handler))
        .route("/view/:title", get(view_note_handler))
        .route("/create", post(create_note_handler))
        .route("/edit", post(edit_note_handler))
        .route(
            "/delete/:title",
            get(delete_note_handler).post(delete_note_handler),
        )
        .route("/delete-all", post(delete_all_handler))
        .route("/search", get(search_handler))
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

/// 302 back to the index
fn found_index() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/")])
}

fn note_error(e: NoteError) -> ApiError {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    api_error(status, e.to_string())
}

async fn with_store<T, F>(state: Arc<NotesState>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&NoteStore) -> NoteResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&state.store))
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Note task failed: {}", e),
            )
        })?
        .map_err(note_error)
}

// ==================
// Handlers
// ==================

async fn list_notes_handler(
    State(state): State<Arc<NotesState>>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<NotesListResponse>, ApiError> {
    let scope = scope_param(&query.scope);
    let lookup = scope.clone();
    let notes = with_store(state, move |store| store.list(lookup.as_deref())).await?;

    Ok(Json(NotesListResponse { scope, notes }))
}

async fn list_scopes_handler(
    State(state): State<Arc<NotesState>>,
) -> Result<Json<ScopesResponse>, ApiError> {
    let scopes = with_store(state, |store| store.list_scopes()).await?;
    Ok(Json(ScopesResponse { scopes }))
}

async fn view_note_handler(
    State(state): State<Arc<NotesState>>,
    Path(title): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope_param(&query.scope);
    let body = with_store(state, move |store| store.read(scope.as_deref(), &title)).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    ))
}

async fn create_note_handler(
    State(state): State<Arc<NotesState>>,
    Form(form): Form<CreateNoteForm>,
) -> Result<StatusCode, ApiError> {
    let scope = scope_param(&form.scope);
    with_store(state, move |store| {
        store.create(scope.as_deref(), &form.title, &form.body)
    })
    .await?;

    Ok(StatusCode::OK)
}

async fn edit_note_handler(
    State(state): State<Arc<NotesState>>,
    Form(form): Form<EditNoteForm>,
) -> Result<StatusCode, ApiError> {
    let scope = scope_param(&form.scope);
    with_store(state, move |store| {
        store.edit(scope.as_deref(), &form.old_title, &form.title, &form.body)
    })
    .await?;

    Ok(StatusCode::OK)
}

async fn delete_note_handler(
    State(state): State<Arc<NotesState>>,
    Path(title): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope_param(&query.scope);
    with_store(state, move |store| store.delete(scope.as_deref(), &title)).await?;

    Ok(found_index())
}

/// Scope comes from the form body like `/create` and `/edit`; `?scope=` is
/// accepted when the body carries none.
async fn delete_all_handler(
    State(state): State<Arc<NotesState>>,
    Query(query): Query<ScopeQuery>,
    form: Option<Form<ScopeForm>>,
) -> Result<StatusCode, ApiError> {
    let scope = form
        .and_then(|Form(form)| scope_param(&form.scope))
        .or_else(|| scope_param(&query.scope));
    with_store(state, move |store| store.delete_all(scope.as_deref())).await?;

    Ok(StatusCode::OK)
}

async fn search_handler(
    State(state): State<Arc<NotesState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let scope = scope_param(&query.scope);
    let needle = query.query.clone();
    let results = with_store(state, move |store| store.search(scope.as_deref(), &needle)).await?;

    Ok(Json(SearchResponse {
        query: query.query,
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::MutationListener;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingListener {
        scopes: Mutex<Vec<Option<String>>>,
    }

    impl MutationListener for CountingListener {
        fn on_note_mutated(&self, scope: Option<&str>) {
            self.scopes.lock().unwrap().push(scope.map(str::to_string));
        }
    }

    fn setup() -> (TempDir, Arc<CountingListener>, Router) {
        let temp = TempDir::new().unwrap();
        let listener = Arc::new(CountingListener::default());
        let store = NoteStore::new(temp.path().join("data"), listener.clone());
        let router = note_routes(Arc::new(NotesState::new(store)));
        (temp, listener, router)
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_create_notifies_scope() {
        let (_temp, listener, router) = setup();

        let response = router
            .oneshot(form_post("/create", "title=todo&body=buy+milk&scope=work"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *listener.scopes.lock().unwrap(),
            vec![Some("work".to_string())]
        );
    }

    #[tokio::test]
    async fn test_view_returns_plain_text() {
        let (_temp, _listener, router) = setup();

        router
            .clone()
            .oneshot(form_post("/create", "title=todo&body=buy+milk"))
            .await
            .unwrap();
        let response = router.oneshot(get("/view/todo")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"buy milk");
    }

    #[tokio::test]
    async fn test_duplicate_create_is_conflict() {
        let (_temp, _listener, router) = setup();

        router
            .clone()
            .oneshot(form_post("/create", "title=todo&body=a"))
            .await
            .unwrap();
        let response = router
            .oneshot(form_post("/create", "title=todo&body=b"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: super::super::ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, 409);
    }

    #[tokio::test]
    async fn test_invalid_title_is_bad_request() {
        let (_temp, listener, router) = setup();

        let response = router
            .oneshot(form_post("/create", "title=a%2Fb&body=x"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(listener.scopes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_note_is_not_found() {
        let (_temp, _listener, router) = setup();
        let response = router.oneshot(get("/view/ghost")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_lists_matches() {
        let (_temp, _listener, router) = setup();
        for form in ["title=a&body=milk", "title=b&body=bread"] {
            router
                .clone()
                .oneshot(form_post("/create", form))
                .await
                .unwrap();
        }

        let response = router.oneshot(get("/search?query=milk")).await.unwrap();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let search: SearchResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(search.results, vec!["a"]);
    }

    #[tokio::test]
    async fn test_delete_by_get_redirects() {
        let (_temp, listener, router) = setup();
        router
            .clone()
            .oneshot(form_post("/create", "title=todo&body=x"))
            .await
            .unwrap();

        let response = router.clone().oneshot(get("/delete/todo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let response = router.oneshot(get("/")).await.unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let list: NotesListResponse = serde_json::from_slice(&body).unwrap();
        assert!(list.notes.is_empty());
        assert_eq!(listener.scopes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_all_reads_scope_from_body() {
        let (temp, _listener, router) = setup();
        for form in ["title=keep&body=g", "title=w&body=x&scope=work"] {
            router
                .clone()
                .oneshot(form_post("/create", form))
                .await
                .unwrap();
        }

        let response = router
            .oneshot(form_post("/delete-all", "scope=work"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let data = temp.path().join("data");
        assert!(data.join("keep.txt").is_file());
        assert!(!data.join("work").join("w.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_all_accepts_query_scope_without_body() {
        let (temp, _listener, router) = setup();
        for form in ["title=keep&body=g", "title=w&body=x&scope=work"] {
            router
                .clone()
                .oneshot(form_post("/create", form))
                .await
                .unwrap();
        }

        let request = Request::builder()
            .method("POST")
            .uri("/delete-all?scope=work")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(temp.path().join("data").join("keep.txt").is_file());
        assert!(!temp.path().join("data").join("work").join("w.txt").exists());
    }
}
