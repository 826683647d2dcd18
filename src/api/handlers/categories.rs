use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::response::{created, ok, ApiError, ApiResponse, ApiResult};
use crate::api::{AppState, AuthUser};
use crate::models::{Category, CategoryKind};
use crate::services::CategoryService;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub kind: CategoryKind,
}

pub async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Category>> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| CategoryService::new(storage).list_visible(user_id))
        .await?)
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    let user_id = auth.user.id;
    let category = state
        .run(move |storage, _| CategoryService::new(storage).create(user_id, &req.name, req.kind))
        .await?;
    created(category)
}
