use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::action::{Action, IgnoreReason, Outcome};
use crate::board::{BoardView, ColumnView, ParentTaskView};
use crate::model::{ChildTask, ColumnId, TaskId};
use crate::persistence::{BoardStore, PersistenceError};
use crate::Board;

pub type SharedStore = Arc<dyn BoardStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    board: Arc<RwLock<Board>>,
    store: Option<SharedStore>,
}

impl AppState {
    pub fn new(board: Board) -> Self {
        Self {
            board: Arc::new(RwLock::new(board)),
            store: None,
        }
    }

    /// Syncs every applied mutation to `store`.
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    fn board(&self) -> Arc<RwLock<Board>> {
        self.board.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        warn!(error = %value, "board store sync failed");
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct NewColumnPayload {
    id: ColumnId,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: ColumnId,
}

#[derive(Debug, Serialize)]
struct DispatchResponse {
    outcome: Outcome,
    board: BoardView,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/board", get(get_board))
        .route("/columns", get(list_columns).post(create_column))
        .route("/actions", post(dispatch_action))
        .route("/tasks/:id", get(get_task))
        .route("/tasks/:id/status", post(update_task_status))
        .route("/parents/:id", get(get_parent))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "kanban board HTTP API listening");
    axum::serve(listener, app).await
}

/// Runs [`apply_and_sync`] on the blocking pool; store writes are file or
/// SQLite I/O and the write lock is held across them.
async fn dispatch_blocking(state: &AppState, action: Action) -> Result<(Outcome, Board), ApiError> {
    let state = state.clone();
    tokio::task::spawn_blocking(move || apply_and_sync(&state, &action))
        .await
        .map_err(|err| ApiError::internal(format!("dispatch task failed: {err}")))?
}

/// Applies `action` under the write lock and, when it changed the board,
/// forwards the change to the store. A store failure is reported after the
/// in-memory board has already changed.
fn apply_and_sync(state: &AppState, action: &Action) -> Result<(Outcome, Board), ApiError> {
    let board = state.board();
    let mut guard = board.write();
    let outcome = guard.dispatch(action);
    if let (Outcome::Applied, Some(store)) = (&outcome, &state.store) {
        match action {
            Action::MoveTask {
                destination,
                task_id,
                ..
            } => store.update_child_status(task_id, destination)?,
            _ => store.save_board(&guard)?,
        }
    }
    Ok((outcome, guard.clone()))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_board(State(state): State<AppState>) -> Json<BoardView> {
    let board = state.board();
    let view = {
        let guard = board.read();
        BoardView::from(&*guard)
    };
    Json(view)
}

async fn list_columns(State(state): State<AppState>) -> Json<Vec<ColumnView>> {
    let board = state.board();
    let columns = {
        let guard = board.read();
        guard
            .columns()
            .iter()
            .map(|c| BoardView::column(&guard, c))
            .collect()
    };
    Json(columns)
}

async fn create_column(
    State(state): State<AppState>,
    Json(payload): Json<NewColumnPayload>,
) -> Result<(StatusCode, Json<ColumnView>), ApiError> {
    let title = payload
        .title
        .unwrap_or_else(|| payload.id.as_str().to_string());
    let action = Action::add_column(payload.id.clone(), title);
    let (outcome, board) = dispatch_blocking(&state, action).await?;
    match outcome {
        Outcome::Applied => {
            let column = board
                .column(&payload.id)
                .ok_or_else(|| ApiError::internal("column not found after creation"))?;
            Ok((StatusCode::CREATED, Json(BoardView::column(&board, column))))
        }
        Outcome::Ignored(reason @ IgnoreReason::ColumnExists { .. }) => {
            Err(ApiError::Conflict(reason.to_string()))
        }
        Outcome::Ignored(reason) => Err(ApiError::invalid(reason.to_string())),
    }
}

async fn dispatch_action(
    State(state): State<AppState>,
    Json(action): Json<Action>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let (outcome, board) = dispatch_blocking(&state, action).await?;
    Ok(Json(DispatchResponse {
        outcome,
        board: BoardView::from(&board),
    }))
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ChildTask>, ApiError> {
    let board = state.board();
    let result = {
        let guard = board.read();
        guard.child(&TaskId::new(task_id.as_str())).cloned()
    };
    match result {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::not_found(format!("task {task_id} not found"))),
    }
}

async fn get_parent(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ParentTaskView>, ApiError> {
    let board = state.board();
    let result = {
        let guard = board.read();
        guard
            .parent(&TaskId::new(task_id.as_str()))
            .map(|p| BoardView::parent(&guard, p))
    };
    match result {
        Some(view) => Ok(Json(view)),
        None => Err(ApiError::not_found(format!("parent task {task_id} not found"))),
    }
}

/// Moves a child task to `status`, whatever column it currently sits in.
async fn update_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<ChildTask>, ApiError> {
    let task_id = TaskId::new(task_id);
    let source = {
        let board = state.board();
        let guard = board.read();
        guard.child(&task_id).map(|c| c.status.clone())
    };
    let Some(source) = source else {
        return Err(ApiError::not_found(format!("task {task_id} not found")));
    };
    let action = Action::move_task(source, payload.status, task_id.clone());
    let (outcome, board) = dispatch_blocking(&state, action).await?;
    match outcome {
        Outcome::Applied | Outcome::Ignored(IgnoreReason::SameColumn) => {}
        Outcome::Ignored(reason @ IgnoreReason::ColumnNotFound { .. }) => {
            return Err(ApiError::invalid(reason.to_string()));
        }
        // The task moved between the read and the write; report the conflict.
        Outcome::Ignored(reason) => return Err(ApiError::Conflict(reason.to_string())),
    }
    board
        .child(&task_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::internal("task not found after status update"))
}
