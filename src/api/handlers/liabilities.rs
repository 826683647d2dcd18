use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::response::{created, ok, ApiError, ApiResponse, ApiResult};
use crate::api::{AppState, AuthUser};
use crate::models::{Liability, LiabilityId, LiabilityKind, LiabilityPayment, Money, PayoffPlan};
use crate::services::{CreateLiabilityInput, LiabilityService};

use super::{month_or_current, today};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateLiabilityRequest {
    pub name: String,
    #[serde(default)]
    pub kind: LiabilityKind,
    pub balance: Money,
    /// Basis points: 1999 is 19.99%
    pub apr_bps: u32,
    pub minimum_payment: Money,
    #[serde(default)]
    pub lender: String,
    pub due_day: Option<u8>,
    pub credit_limit: Option<Money>,
    pub opened_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount: Money,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub liability: Liability,
    pub payment: LiabilityPayment,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayoffQuery {
    /// Monthly payment in cents; the minimum payment when absent
    pub payment: Option<Money>,
    pub start: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ListQuery>,
) -> ApiResult<Vec<Liability>> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| LiabilityService::new(storage).list(user_id, q.closed))
        .await?)
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateLiabilityRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Liability>>), ApiError> {
    let user_id = auth.user.id;
    let liability = state
        .run(move |storage, _| {
            LiabilityService::new(storage).create(
                user_id,
                CreateLiabilityInput {
                    name: req.name,
                    kind: req.kind,
                    balance: req.balance,
                    apr_bps: req.apr_bps,
                    minimum_payment: req.minimum_payment,
                    lender: req.lender,
                    due_day: req.due_day,
                    credit_limit: req.credit_limit,
                    opened_on: req.opened_on,
                },
            )
        })
        .await?;
    created(liability)
}

pub async fn pay(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<LiabilityId>,
    Json(req): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), ApiError> {
    let user_id = auth.user.id;
    let (liability, payment) = state
        .run(move |storage, _| {
            LiabilityService::new(storage).record_payment(
                user_id,
                id,
                req.amount,
                req.date.unwrap_or_else(today),
                &req.note,
            )
        })
        .await?;
    created(PaymentResponse { liability, payment })
}

pub async fn payoff(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<LiabilityId>,
    Query(q): Query<PayoffQuery>,
) -> ApiResult<PayoffPlan> {
    let user_id = auth.user.id;
    let start = month_or_current(q.start.as_deref())?;
    let plan = state
        .run(move |storage, _| {
            LiabilityService::new(storage).payoff_plan(user_id, id, q.payment, start)
        })
        .await?;
    ok(plan)
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<LiabilityId>,
) -> ApiResult<Liability> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| LiabilityService::new(storage).delete(user_id, id))
        .await?)
}
