//! HTTP transport over the todo command layer.
//!
//! # Design
//! Handlers hold no logic of their own: each one forwards to `TodoCommands`
//! and maps the outcome to a status. Validation failures come back as 422
//! with the per-field messages. Storage failures are logged with their cause
//! and answered with a generic 500 body.

pub mod config;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use todo_store::{CommandError, Gateway, StorageError, Todo, TodoCommands, TodoId};
use tokio::net::TcpListener;
use tracing::error;

pub use todo_store::{MemoryGateway, SqliteGateway};

type Commands<G> = State<Arc<TodoCommands<G>>>;

pub fn app<G: Gateway + 'static>(gateway: G) -> Router {
    let commands = Arc::new(TodoCommands::new(gateway));
    Router::new()
        .route("/todos", get(list_todos::<G>).post(create_todo::<G>))
        .route("/todos/{id}", put(update_todo::<G>).delete(delete_todo::<G>))
        .with_state(commands)
}

pub async fn run<G: Gateway + 'static>(listener: TcpListener, gateway: G) -> Result<(), std::io::Error> {
    axum::serve(listener, app(gateway)).await
}

/// Error side of every handler.
#[derive(Debug)]
pub struct ApiError(CommandError);

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        Self(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(CommandError::Storage(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            CommandError::Validation(failure) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(failure)).into_response()
            }
            CommandError::Storage(err) => {
                error!(%err, "request failed in storage");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "storage failure" })),
                )
                    .into_response()
            }
        }
    }
}

async fn list_todos<G: Gateway>(State(commands): Commands<G>) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(commands.list().await?))
}

async fn create_todo<G: Gateway>(
    State(commands): Commands<G>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = commands.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo<G: Gateway>(
    State(commands): Commands<G>,
    Path(id): Path<TodoId>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, ApiError> {
    commands.update(id, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_todo<G: Gateway>(
    State(commands): Commands<G>,
    Path(id): Path<TodoId>,
) -> Result<StatusCode, ApiError> {
    commands.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
