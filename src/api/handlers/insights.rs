use axum::extract::{Query, State};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::response::{ok, ApiResult};
use crate::api::{AppState, AuthUser};
use crate::services::{
    CategoryTrend, HealthScore, InsightService, SpendingAnomaly, SpendingCluster,
};

use super::month_or_current;

#[derive(Debug, Default, Deserialize)]
pub struct AnomalyQuery {
    pub since: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub month: Option<String>,
    pub months: Option<usize>,
}

pub async fn anomalies(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<AnomalyQuery>,
) -> ApiResult<Vec<SpendingAnomaly>> {
    let user_id = auth.user.id;
    let anomalies = state
        .run(move |storage, settings| {
            InsightService::new(storage, settings).anomalies(user_id, q.since)
        })
        .await?;
    ok(anomalies)
}

/// `months` is capped at `MAX_WINDOW_MONTHS`; longer windows are a 400
pub async fn trends(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<WindowQuery>,
) -> ApiResult<Vec<CategoryTrend>> {
    let user_id = auth.user.id;
    let month = month_or_current(q.month.as_deref())?;
    let trends = state
        .run(move |storage, settings| {
            let months = q.months.unwrap_or(settings.insights.trend_months);
            InsightService::new(storage, settings).category_trends(user_id, month, months)
        })
        .await?;
    ok(trends)
}

pub async fn clusters(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<WindowQuery>,
) -> ApiResult<Vec<SpendingCluster>> {
    let user_id = auth.user.id;
    let month = month_or_current(q.month.as_deref())?;
    let clusters = state
        .run(move |storage, settings| {
            InsightService::new(storage, settings).spending_clusters(
                user_id,
                month,
                q.months.unwrap_or(3),
            )
        })
        .await?;
    ok(clusters)
}

pub async fn health(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<WindowQuery>,
) -> ApiResult<HealthScore> {
    let user_id = auth.user.id;
    let month = month_or_current(q.month.as_deref())?;
    ok(state
        .run(move |storage, settings| {
            InsightService::new(storage, settings).health_score(user_id, month)
        })
        .await?)
}
