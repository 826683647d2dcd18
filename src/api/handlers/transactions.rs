use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::response::{created, ok, ApiError, ApiResponse, ApiResult};
use crate::api::{AppState, AuthUser};
use crate::error::FintrackError;
use crate::models::{Money, Transaction, TransactionId, TransactionKind};
use crate::services::{
    CategoryService, CreateTransactionInput, MonthlySummary, TransactionFilter,
    TransactionService, UpdateTransactionInput,
};

use super::{month_or_current, today};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub month: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Category name or ID
    pub category: Option<String>,
    pub kind: Option<TransactionKind>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

/// Amounts are integer cents
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub kind: TransactionKind,
    pub amount: Money,
    pub category: String,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub payee: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionRequest {
    pub kind: Option<TransactionKind>,
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub payee: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<ListQuery>,
) -> ApiResult<Vec<Transaction>> {
    let user_id = auth.user.id;
    let mut filter = TransactionFilter::new();

    if let Some(month) = q.month.as_deref() {
        filter = filter.month(month_or_current(Some(month))?);
    }
    if q.from.is_some() || q.to.is_some() {
        let start = q.from.unwrap_or(NaiveDate::MIN);
        let end = q.to.unwrap_or(NaiveDate::MAX);
        if start > end {
            return Err(FintrackError::Validation("'from' is after 'to'".into()).into());
        }
        filter = filter.date_range(start, end);
    }
    if let Some(kind) = q.kind {
        filter = filter.kind(kind);
    }
    if let Some(search) = q.search {
        filter = filter.search(search);
    }
    if let Some(limit) = q.limit {
        filter = filter.limit(limit);
    }

    let txns = state
        .run(move |storage, _| {
            if let Some(category) = q.category.as_deref() {
                let category = CategoryService::new(storage).resolve(user_id, category)?;
                filter = filter.category(category.id);
            }
            TransactionService::new(storage).list(user_id, &filter)
        })
        .await?;
    ok(txns)
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ApiError> {
    let user_id = auth.user.id;
    let txn = state
        .run(move |storage, _| {
            let category = CategoryService::new(storage).resolve(user_id, &req.category)?;
            TransactionService::new(storage).create(
                user_id,
                CreateTransactionInput {
                    kind: req.kind,
                    amount: req.amount,
                    category_id: category.id,
                    date: req.date.unwrap_or_else(today),
                    description: req.description,
                    payee: req.payee,
                    tags: req.tags,
                },
            )
        })
        .await?;
    created(txn)
}

pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TransactionId>,
) -> ApiResult<Transaction> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| TransactionService::new(storage).get(user_id, id))
        .await?)
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TransactionId>,
    Json(req): Json<UpdateTransactionRequest>,
) -> ApiResult<Transaction> {
    let user_id = auth.user.id;
    let txn = state
        .run(move |storage, _| {
            let category_id = match req.category.as_deref() {
                Some(c) => Some(CategoryService::new(storage).resolve(user_id, c)?.id),
                None => None,
            };
            TransactionService::new(storage).update(
                user_id,
                id,
                UpdateTransactionInput {
                    kind: req.kind,
                    amount: req.amount,
                    category_id,
                    date: req.date,
                    description: req.description,
                    payee: req.payee,
                    tags: req.tags,
                },
            )
        })
        .await?;
    ok(txn)
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<TransactionId>,
) -> ApiResult<Transaction> {
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| TransactionService::new(storage).delete(user_id, id))
        .await?)
}

pub async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<MonthQuery>,
) -> ApiResult<MonthlySummary> {
    let month = month_or_current(q.month.as_deref())?;
    let user_id = auth.user.id;
    ok(state
        .run(move |storage, _| TransactionService::new(storage).monthly_summary(user_id, month))
        .await?)
}
