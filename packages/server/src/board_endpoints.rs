//! Board Endpoints
//!
//! REST surface over `BoardOperations`. Handlers only translate between HTTP
//! and the operations layer; every hierarchy rule lives in the core crate.
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `GET /api/boards` - List all boards (newest first)
//! - `POST /api/boards` - Create a board
//! - `GET /api/boards/root` - List root boards
//! - `GET /api/boards/:id` - Get a board by ID
//! - `PUT /api/boards/:id` - Update a board (a `parent_id` field moves it)
//! - `DELETE /api/boards/:id` - Delete a board and its subtree
//! - `GET /api/boards/:id/children` - Direct children
//! - `GET /api/boards/:id/hierarchy` - Subtree with levels
//! - `GET /api/boards/:id/stats` - Direct and total descendant counts
//! - `GET /api/boards/:id/depth` - Depth of the board
//! - `GET /api/boards/:id/ancestors` - Ancestors, root first
//!
//! Malformed IDs answer 404, like unknown ones.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::{AppState, HttpError};
use boardspace_core::models::{
    Board, BoardId, BoardStats, BoardUpdate, CreateBoardParams, HierarchyEntry,
};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct DepthResponse {
    pub depth: u32,
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn parse_board_id(raw: &str) -> Result<BoardId, HttpError> {
    raw.parse()
        .map_err(|_| HttpError::new(format!("Board not found: {}", raw), "INVALID_BOARD_ID"))
}

fn board_not_found(id: &BoardId) -> HttpError {
    HttpError::new(format!("Board not found: {}", id), "BOARD_NOT_FOUND")
}

async fn list_boards(State(state): State<AppState>) -> Result<Json<Vec<Board>>, HttpError> {
    Ok(Json(state.operations.list_boards().await?))
}

async fn list_roots(State(state): State<AppState>) -> Result<Json<Vec<Board>>, HttpError> {
    Ok(Json(state.operations.list_roots().await?))
}

/// Create a board
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3001/api/boards \
///   -H "Content-Type: application/json" \
///   -d '{"title": "Roadmap", "parent_id": null}'
/// ```
async fn create_board(
    State(state): State<AppState>,
    payload: Result<Json<CreateBoardParams>, JsonRejection>,
) -> Result<(StatusCode, Json<Board>), HttpError> {
    let Json(params) = payload?;
    let board = state.operations.create_board(params).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

async fn get_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Board>, HttpError> {
    let id = parse_board_id(&id)?;
    state
        .operations
        .get_board(&id)
        .await?
        .map(Json)
        .ok_or_else(|| board_not_found(&id))
}

/// Update a board
///
/// `parent_id` moves the board (`null` moves it to root level); `title` and
/// `description` are applied afterwards.
async fn update_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BoardUpdate>, JsonRejection>,
) -> Result<Json<Board>, HttpError> {
    let id = parse_board_id(&id)?;
    let Json(update) = payload?;
    state
        .operations
        .update_board(&id, update)
        .await?
        .map(Json)
        .ok_or_else(|| board_not_found(&id))
}

async fn delete_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let id = parse_board_id(&id)?;
    if state.operations.delete_board(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(board_not_found(&id))
    }
}

async fn get_children(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Board>>, HttpError> {
    let id = parse_board_id(&id)?;
    Ok(Json(state.operations.get_children(&id).await?))
}

async fn get_hierarchy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HierarchyEntry>>, HttpError> {
    let id = parse_board_id(&id)?;
    Ok(Json(state.operations.get_subtree(&id).await?))
}

async fn get_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BoardStats>, HttpError> {
    let id = parse_board_id(&id)?;
    Ok(Json(state.operations.get_stats(&id).await?))
}

async fn get_depth(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DepthResponse>, HttpError> {
    let id = parse_board_id(&id)?;
    let depth = state.operations.get_depth(&id).await?;
    Ok(Json(DepthResponse { depth }))
}

async fn get_ancestors(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Board>>, HttpError> {
    let id = parse_board_id(&id)?;
    Ok(Json(state.operations.get_ancestors(&id).await?))
}

/// Create board routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/boards", get(list_boards).post(create_board))
        .route("/api/boards/root", get(list_roots))
        .route(
            "/api/boards/:id",
            get(get_board).put(update_board).delete(delete_board),
        )
        .route("/api/boards/:id/children", get(get_children))
        .route("/api/boards/:id/hierarchy", get(get_hierarchy))
        .route("/api/boards/:id/stats", get(get_stats))
        .route("/api/boards/:id/depth", get(get_depth))
        .route("/api/boards/:id/ancestors", get(get_ancestors))
        .with_state(state)
}
