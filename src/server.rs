//! HTTP surface: thin handlers that map routes onto [`TaskList`] calls.

use crate::config::Config;
use crate::core::TaskList;
use crate::error::{Result, TaskError};
use crate::models::{Direction, NewTask, TaskEdit};
use crate::render;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::Local;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Shared application state passed to handlers.
///
/// The mutex serializes every request against the store.
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<Mutex<TaskList>>,
}

impl AppState {
    pub fn new(tasks: TaskList) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(tasks)),
        }
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/add", post(add_task))
        .route("/edit/{id}", get(edit_form).post(edit_task))
        .route("/toggle/{id}", get(toggle_task))
        .route("/move/{id}/{direction}", get(move_task))
        .route("/reorder", post(reorder_tasks))
        .route("/delete/{id}", get(delete_task))
        .route("/sweep", get(sweep_completed))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl-C.
pub async fn run(config: &Config, tasks: TaskList) -> Result<()> {
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(%local_addr, "task list server started");

    axum::serve(listener, build_router(AppState::new(tasks)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("task list server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

// ==================== Errors ====================

/// Store failures surface as a plain 500.
pub struct AppError(TaskError);

impl From<TaskError> for AppError {
    fn from(e: TaskError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
    }
}

type HandlerResult<T> = std::result::Result<T, AppError>;

// ==================== Request Types ====================

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub content: String,
    pub color: Option<String>,
    pub label: Option<String>,
    pub due_date: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditForm {
    pub content: Option<String>,
    pub color: Option<String>,
    pub label: Option<String>,
    pub due_date: Option<String>,
    pub requires_id: Option<String>,
    pub context: Option<String>,
    pub completion_note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    #[serde(default)]
    pub order: Vec<Value>,
}

/// Accept ids as JSON numbers or digit strings; drop anything else
fn order_ids(order: &[Value]) -> Vec<i64> {
    order
        .iter()
        .filter_map(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect()
}

fn home() -> Redirect {
    Redirect::to("/")
}

// ==================== Handlers ====================

async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> HandlerResult<Html<String>> {
    let filter = query.label.filter(|l| !l.is_empty());
    let listing = state.tasks.lock().await.list_tasks(filter.as_deref())?;
    Ok(Html(render::index_page(
        &listing,
        filter.as_deref(),
        Local::now().date_naive(),
    )))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn add_task(
    State(state): State<AppState>,
    Form(form): Form<AddForm>,
) -> HandlerResult<Redirect> {
    let new = NewTask {
        content: form.content,
        color: form.color,
        label: form.label,
        due_date: form.due_date,
        context: form.context,
    };
    state.tasks.lock().await.create_task(&new)?;
    Ok(home())
}

async fn edit_form(State(state): State<AppState>, Path(id): Path<i64>) -> HandlerResult<Response> {
    match state.tasks.lock().await.get_task(id) {
        Ok(task) => Ok(Html(render::edit_page(&task)).into_response()),
        Err(TaskError::TaskNotFound(_)) => Ok(home().into_response()),
        Err(e) => Err(e.into()),
    }
}

async fn edit_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<EditForm>,
) -> HandlerResult<Redirect> {
    let edit = TaskEdit {
        content: form.content,
        color: form.color,
        label: form.label,
        due_date: form.due_date,
        requires_id: form.requires_id,
        context: form.context,
        completion_note: form.completion_note,
    };
    state.tasks.lock().await.edit_task(id, &edit)?;
    Ok(home())
}

async fn toggle_task(State(state): State<AppState>, Path(id): Path<i64>) -> HandlerResult<Redirect> {
    state.tasks.lock().await.toggle_task(id)?;
    Ok(home())
}

async fn move_task(
    State(state): State<AppState>,
    Path((id, direction)): Path<(i64, String)>,
) -> HandlerResult<Redirect> {
    if let Ok(direction) = Direction::try_from(direction.as_str()) {
        state.tasks.lock().await.move_task(id, direction)?;
    }
    Ok(home())
}

async fn reorder_tasks(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> HandlerResult<Json<Value>> {
    let ids = order_ids(&request.order);
    state.tasks.lock().await.reorder_tasks(&ids)?;
    Ok(Json(json!({ "status": "success" })))
}

async fn delete_task(State(state): State<AppState>, Path(id): Path<i64>) -> HandlerResult<Redirect> {
    state.tasks.lock().await.delete_task(id)?;
    Ok(home())
}

async fn sweep_completed(State(state): State<AppState>) -> HandlerResult<Redirect> {
    state.tasks.lock().await.sweep_completed()?;
    Ok(home())
}
