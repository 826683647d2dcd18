use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::response::{created, ok, ApiError, ApiResponse, ApiResult};
use crate::api::{AppState, AuthUser};
use crate::error::FintrackError;
use crate::models::{Budget, BudgetId, BudgetSummary, BudgetTransfer, Money};
use crate::services::{BudgetOverview, BudgetService, CategoryService, CreateBudgetInput};

use super::month_or_current;

#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub month: Option<String>,
    /// The caller's family budgets instead of their own
    #[serde(default)]
    pub family: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    /// Category name or ID
    pub category: String,
    pub limit: Money,
    pub month: Option<String>,
    pub alert_threshold: Option<u8>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub family: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBudgetRequest {
    pub limit: Option<Money>,
    pub alert_threshold: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from: BudgetId,
    pub to: BudgetId,
    pub amount: Money,
    #[serde(default)]
    pub note: String,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ScopeQuery>,
) -> ApiResult<Vec<Budget>> {
    let user_id = auth.user.id;
    let month = month_or_current(q.month.as_deref())?;
    let budgets = state
        .run(move |storage, _| {
            let scope = BudgetService::new(storage).scope_for(user_id, q.family)?;
            storage.budgets.get_for_scope(scope, Some(month))
        })
        .await?;
    ok(budgets)
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Budget>>), ApiError> {
    let user_id = auth.user.id;
    let month = month_or_current(req.month.as_deref())?;
    let budget = state
        .run(move |storage, settings| {
            let service = BudgetService::new(storage);
            let category = CategoryService::new(storage).resolve(user_id, &req.category)?;
            service.create(
                user_id,
                CreateBudgetInput {
                    scope: service.scope_for(user_id, req.family)?,
                    category_id: category.id,
                    month,
                    limit: req.limit,
                    alert_threshold: req
                        .alert_threshold
                        .unwrap_or(settings.default_alert_threshold),
                    notes: req.notes,
                },
            )
        })
        .await?;
    created(budget)
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<BudgetId>,
    Json(req): Json<UpdateBudgetRequest>,
) -> ApiResult<Budget> {
    if req.limit.is_none() && req.alert_threshold.is_none() {
        return Err(FintrackError::Validation("Nothing to update".into()).into());
    }

    let user_id = auth.user.id;
    let budget = state
        .run(move |storage, _| {
            let service = BudgetService::new(storage);
            let mut budget = service.get(user_id, id)?;
            if let Some(limit) = req.limit {
                budget = service.update_limit(user_id, id, limit)?;
            }
            if let Some(threshold) = req.alert_threshold {
                budget = service.update_threshold(user_id, id, threshold)?;
            }
            Ok(budget)
        })
        .await?;
    ok(budget)
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<BudgetId>,
) -> ApiResult<Budget> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| BudgetService::new(storage).delete(user_id, id))
        .await?)
}

pub async fn overview(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ScopeQuery>,
) -> ApiResult<BudgetOverview> {
    let user_id = auth.user.id;
    let month = month_or_current(q.month.as_deref())?;
    let overview = state
        .run(move |storage, _| {
            let service = BudgetService::new(storage);
            let scope = service.scope_for(user_id, q.family)?;
            service.overview(user_id, scope, month)
        })
        .await?;
    ok(overview)
}

pub async fn alerts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ScopeQuery>,
) -> ApiResult<Vec<BudgetSummary>> {
    let user_id = auth.user.id;
    let month = month_or_current(q.month.as_deref())?;
    ok(state
        .run(move |storage, _| BudgetService::new(storage).alerts(user_id, month))
        .await?)
}

pub async fn transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetTransfer>>), ApiError> {
    let user_id = auth.user.id;
    let transfer = state
        .run(move |storage, _| {
            BudgetService::new(storage).transfer(user_id, req.from, req.to, req.amount, &req.note)
        })
        .await?;
    created(transfer)
}
