use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::response::{created, ok, ApiError, ApiResponse, ApiResult};
use crate::api::{AppState, AuthUser};
use crate::models::{FamilyGroup, Invitation, InvitationId, UserId};
use crate::services::{FamilyService, PendingInvitation};

#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub username: String,
}

/// The caller's family, or `null` when they have none
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Option<FamilyGroup>> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| FamilyService::new(storage).get_for_user(user_id))
        .await?)
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFamilyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FamilyGroup>>), ApiError> {
    let user_id = auth.user.id;
    created(
        state
            .run(move |storage, _| FamilyService::new(storage).create_group(user_id, &req.name))
            .await?,
    )
}

pub async fn invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<InviteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Invitation>>), ApiError> {
    let user_id = auth.user.id;
    created(
        state
            .run(move |storage, _| FamilyService::new(storage).invite(user_id, &req.username))
            .await?,
    )
}

/// Invitations waiting for the caller's answer
pub async fn invitations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Vec<PendingInvitation>> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| FamilyService::new(storage).pending_invitations(user_id))
        .await?)
}

async fn respond(
    state: AppState,
    user_id: UserId,
    id: InvitationId,
    accept: bool,
) -> ApiResult<FamilyGroup> {
    ok(state
        .run(move |storage, _| FamilyService::new(storage).respond(user_id, id, accept))
        .await?)
}

pub async fn accept(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<InvitationId>,
) -> ApiResult<FamilyGroup> {
    respond(state, auth.user.id, id, true).await
}

pub async fn decline(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<InvitationId>,
) -> ApiResult<FamilyGroup> {
    respond(state, auth.user.id, id, false).await
}

pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<FamilyGroup> {
    let head_id = auth.user.id;
    ok(state
        .run(move |storage, _| FamilyService::new(storage).remove_member(head_id, user_id))
        .await?)
}

pub async fn leave(State(state): State<AppState>, auth: AuthUser) -> ApiResult<FamilyGroup> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| FamilyService::new(storage).leave(user_id))
        .await?)
}
