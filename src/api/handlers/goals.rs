use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::response::{created, ok, ApiError, ApiResponse, ApiResult};
use crate::api::{AppState, AuthUser};
use crate::models::{Goal, GoalId, GoalKind, Money};
use crate::services::{CreateGoalInput, GoalProgress, GoalService};

use super::today;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub name: String,
    #[serde(default)]
    pub kind: GoalKind,
    pub target_amount: Money,
    pub target_date: Option<NaiveDate>,
    pub initial_amount: Option<Money>,
}

#[derive(Debug, Deserialize)]
pub struct ContributionRequest {
    /// Negative to withdraw
    pub amount: Money,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress: GoalProgress,
}

fn view(service: &GoalService<'_>, goal: Goal) -> GoalView {
    let progress = service.progress(&goal, today());
    GoalView { goal, progress }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ListQuery>,
) -> ApiResult<Vec<GoalView>> {
    let user_id = auth.user.id;
    let views = state
        .run(move |storage, _| {
            let service = GoalService::new(storage);
            let goals = service.list(user_id, q.all)?;
            Ok(goals.into_iter().map(|g| view(&service, g)).collect())
        })
        .await?;
    ok(views)
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GoalView>>), ApiError> {
    let user_id = auth.user.id;
    let goal_view = state
        .run(move |storage, _| {
            let service = GoalService::new(storage);
            let goal = service.create(
                user_id,
                CreateGoalInput {
                    name: req.name,
                    kind: req.kind,
                    target_amount: req.target_amount,
                    target_date: req.target_date,
                    initial_amount: req.initial_amount,
                },
            )?;
            Ok(view(&service, goal))
        })
        .await?;
    created(goal_view)
}

pub async fn contribute(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<GoalId>,
    Json(req): Json<ContributionRequest>,
) -> ApiResult<GoalView> {
    let user_id = auth.user.id;
    let goal_view = state
        .run(move |storage, _| {
            let service = GoalService::new(storage);
            let goal = service.contribute(
                user_id,
                id,
                req.amount,
                req.date.unwrap_or_else(today),
                &req.note,
            )?;
            Ok(view(&service, goal))
        })
        .await?;
    ok(goal_view)
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<GoalId>,
) -> ApiResult<Goal> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| GoalService::new(storage).delete(user_id, id))
        .await?)
}
