//! Canvas document endpoints.
//!
//! POST   /canvases              - Create an empty canvas
//! GET    /canvases?owner={id}   - List an owner's canvases, most recent first
//! GET    /canvases/{id}         - Fetch one canvas
//! PATCH  /canvases/{id}         - Replace the name or any of the three arrays
//! DELETE /canvases/{id}         - Delete a canvas
//! GET    /health                - Liveness check

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use magiccanvas_core::storage::{DocumentUpdate, NewDocument};
use magiccanvas_core::{Document, DocumentStore, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

/// Store failure mapped onto an HTTP status with a JSON body.
pub struct ApiError(StorageError);

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => {
                tracing::error!("Store failure: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub owner: String,
}

async fn health() -> &'static str {
    "ok"
}

async fn create_canvas(
    State(state): State<AppState>,
    Json(request): Json<NewDocument>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let id = state.store.create(request).await?;
    tracing::info!("Created canvas {id}");
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn list_canvases(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.store.list_by_owner(&params.owner).await?))
}

async fn get_canvas(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.store.get_by_id(&id).await?))
}

async fn update_canvas(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<DocumentUpdate>,
) -> Result<Json<Document>, ApiError> {
    let document = state.store.update(&id, update).await?;
    tracing::debug!("Updated canvas {id}");
    Ok(Json(document))
}

async fn delete_canvas(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&id).await?;
    tracing::info!("Deleted canvas {id}");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/canvases", get(list_canvases).post(create_canvas))
        .route(
            "/canvases/{id}",
            get(get_canvas).patch(update_canvas).delete(delete_canvas),
        )
        .with_state(state)
}
