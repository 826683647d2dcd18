//! Spending insights
//!
//! Feeds a user's stored transactions, budgets, debts and goals through the
//! `analytics` routines. Everything here is read-only.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::analytics::{
    standardize, AnomalyDetector, AnomalyReason, KMeans, Observation, Severity, Trend,
};
use crate::config::settings::{InsightSettings, Settings};
use crate::error::{FintrackError, FintrackResult};
use crate::models::{
    BudgetStatus, Category, CategoryId, Money, Month, Transaction, TransactionId, UserId,
};
use crate::storage::Storage;

use super::budget::BudgetService;
use super::category::CategoryService;
use super::goal::GoalService;
use super::liability::LiabilityService;

/// Weights of the health score components; they sum to 100
const SAVINGS_WEIGHT: f64 = 35.0;
const BUDGET_WEIGHT: f64 = 30.0;
const DEBT_WEIGHT: f64 = 25.0;
const GOALS_WEIGHT: f64 = 10.0;

/// Savings rate (percent) that earns full marks
const TARGET_SAVINGS_RATE: f64 = 20.0;
/// Debt payments below this share of income earn full marks, above
/// `MAX_DEBT_TO_INCOME` none
const HEALTHY_DEBT_TO_INCOME: f64 = 15.0;
const MAX_DEBT_TO_INCOME: f64 = 50.0;
/// Score for a component with nothing to measure
const NEUTRAL_SCORE: f64 = 50.0;

/// Longest look-back window, in months, for trends, clusters and cash flow
pub const MAX_WINDOW_MONTHS: u32 = 120;

/// Validate a look-back window; zero is read as one month
pub(crate) fn window_months(months: usize) -> FintrackResult<u32> {
    u32::try_from(months.max(1))
        .ok()
        .filter(|m| *m <= MAX_WINDOW_MONTHS)
        .ok_or_else(|| {
            FintrackError::Validation(format!(
                "A window of {} months is longer than the {} allowed",
                months, MAX_WINDOW_MONTHS
            ))
        })
}

/// Service for statistical insights
pub struct InsightService<'a> {
    storage: &'a Storage,
    settings: &'a InsightSettings,
}

/// A flagged expense
#[derive(Debug, Clone, Serialize)]
pub struct SpendingAnomaly {
    pub transaction_id: TransactionId,
    pub date: NaiveDate,
    pub amount: Money,
    pub expected: Money,
    pub category_id: CategoryId,
    pub category_name: String,
    pub description: String,
    pub z_score: Option<f64>,
    pub deviation: Option<f64>,
    pub reason: AnomalyReason,
    pub severity: Severity,
}

/// Monthly spending series for one category (or overall) with its trend
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTrend {
    /// `None` for the all-categories series
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub months: Vec<Month>,
    pub totals: Vec<Money>,
    pub average: Money,
    /// `None` with fewer than two months
    pub trend: Option<Trend>,
}

/// A group of similar expenses
#[derive(Debug, Clone, Serialize)]
pub struct SpendingCluster {
    pub label: String,
    pub size: usize,
    pub total: Money,
    /// Mean amount of the members
    pub typical_amount: Money,
    /// Mean day of month of the members
    pub typical_day: f64,
    pub transaction_ids: Vec<TransactionId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreComponent {
    pub name: &'static str,
    /// 0-100
    pub score: f64,
    pub weight: f64,
    pub detail: String,
}

/// Overall financial health for a month
#[derive(Debug, Clone, Serialize)]
pub struct HealthScore {
    pub month: Month,
    /// 0-100
    pub score: u8,
    pub grade: char,
    pub savings_rate: f64,
    /// Share of budgets not over their limit, as a percentage
    pub budget_adherence: Option<f64>,
    /// Minimum debt payments as a percentage of income
    pub debt_to_income: Option<f64>,
    pub components: Vec<ScoreComponent>,
}

fn grade(score: u8) -> char {
    match score {
        90..=100 => 'A',
        80..=89 => 'B',
        70..=79 => 'C',
        60..=69 => 'D',
        _ => 'F',
    }
}

fn to_money(amount: f64) -> Money {
    Money::from_f64(amount)
}

impl<'a> InsightService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self {
            storage,
            settings: &settings.insights,
        }
    }

    fn detector(&self) -> AnomalyDetector {
        AnomalyDetector {
            zscore_threshold: self.settings.zscore_threshold,
            moving_average_window: self.settings.moving_average_window,
            deviation_threshold: self.settings.deviation_threshold,
            min_history: self.settings.min_history,
        }
    }

    fn category_names(&self, user_id: UserId) -> FintrackResult<HashMap<CategoryId, String>> {
        Ok(CategoryService::new(self.storage)
            .list_visible(user_id)?
            .into_iter()
            .map(|c: Category| (c.id, c.name))
            .collect())
    }

    fn expenses(&self, user_id: UserId) -> FintrackResult<Vec<Transaction>> {
        Ok(self
            .storage
            .transactions
            .get_by_user(user_id)?
            .into_iter()
            .filter(Transaction::is_expense)
            .collect())
    }

    fn expenses_in(
        &self,
        user_id: UserId,
        first: Month,
        last: Month,
    ) -> FintrackResult<Vec<Transaction>> {
        Ok(self
            .storage
            .transactions
            .get_for_users_in_range(&[user_id], first.start_date(), last.end_date())?
            .into_iter()
            .filter(Transaction::is_expense)
            .collect())
    }

    /// Unusual expenses dated on or after `since`
    ///
    /// The whole expense history is the baseline, so older spending still
    /// shapes what counts as unusual.
    pub fn anomalies(
        &self,
        user_id: UserId,
        since: Option<NaiveDate>,
    ) -> FintrackResult<Vec<SpendingAnomaly>> {
        let expenses = self.expenses(user_id)?;
        let observations: Vec<Observation<TransactionId, CategoryId>> = expenses
            .iter()
            .map(|t| Observation {
                id: t.id,
                group: t.category_id,
                date: t.date,
                amount: t.amount.as_f64(),
            })
            .collect();

        let by_id: HashMap<TransactionId, &Transaction> =
            expenses.iter().map(|t| (t.id, t)).collect();
        let names = self.category_names(user_id)?;

        let anomalies = self
            .detector()
            .detect(&observations)
            .into_iter()
            .filter(|a| since.map_or(true, |s| a.date >= s))
            .map(|a| SpendingAnomaly {
                transaction_id: a.id,
                date: a.date,
                amount: to_money(a.amount),
                expected: to_money(a.expected),
                category_id: a.group,
                category_name: names.get(&a.group).cloned().unwrap_or_default(),
                description: by_id
                    .get(&a.id)
                    .map(|t| t.description.clone())
                    .unwrap_or_default(),
                z_score: a.z_score,
                deviation: a.deviation,
                reason: a.reason,
                severity: a.severity,
            })
            .collect();
        Ok(anomalies)
    }

    /// Per-category and overall monthly spending for the `months` months
    /// ending with `through`, overall first, then by total spending
    pub fn category_trends(
        &self,
        user_id: UserId,
        through: Month,
        months: usize,
    ) -> FintrackResult<Vec<CategoryTrend>> {
        let months = window_months(months)?;
        let window = through.range_back(months);
        let first = window.first().copied().unwrap_or(through);
        let index: HashMap<Month, usize> =
            window.iter().enumerate().map(|(i, m)| (*m, i)).collect();

        let mut overall = vec![Money::zero(); window.len()];
        let mut per_category: BTreeMap<CategoryId, Vec<Money>> = BTreeMap::new();
        for txn in self.expenses_in(user_id, first, through)? {
            if let Some(&i) = index.get(&Month::from_date(txn.date)) {
                overall[i] += txn.amount;
                per_category
                    .entry(txn.category_id)
                    .or_insert_with(|| vec![Money::zero(); window.len()])[i] += txn.amount;
            }
        }

        let names = self.category_names(user_id)?;
        let horizon = self.settings.forecast_months;
        let build = |category_id: Option<CategoryId>, name: String, totals: Vec<Money>| {
            let series: Vec<f64> = totals.iter().map(Money::as_f64).collect();
            let sum: Money = totals.iter().sum();
            CategoryTrend {
                category_id,
                name,
                months: window.clone(),
                average: Money::from_cents(
                    (sum.cents() as f64 / totals.len() as f64).round() as i64,
                ),
                trend: Trend::from_series(&series, horizon),
                totals,
            }
        };

        let mut categories: Vec<CategoryTrend> = per_category
            .into_iter()
            .map(|(id, totals)| {
                let name = names.get(&id).cloned().unwrap_or_else(|| id.to_string());
                build(Some(id), name, totals)
            })
            .collect();
        categories.sort_by(|a, b| b.average.cmp(&a.average).then_with(|| a.name.cmp(&b.name)));

        let mut trends = vec![build(None, "All spending".to_string(), overall)];
        trends.extend(categories);
        Ok(trends)
    }

    /// Group the expenses of the last `months` months by amount and day of
    /// month, labelled from smallest to largest typical amount
    pub fn spending_clusters(
        &self,
        user_id: UserId,
        through: Month,
        months: usize,
    ) -> FintrackResult<Vec<SpendingCluster>> {
        let first = through.minus(window_months(months)? - 1);
        let expenses = self.expenses_in(user_id, first, through)?;
        if expenses.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<Vec<f64>> = expenses
            .iter()
            .map(|t| vec![t.amount.as_f64(), t.date.day() as f64])
            .collect();
        let result = KMeans::new(self.settings.cluster_count)
            .with_max_iterations(self.settings.kmeans_max_iterations)
            .fit(&standardize(&raw))
            .map_err(|e| FintrackError::Validation(e.to_string()))?;

        let mut clusters: Vec<SpendingCluster> = (0..result.k())
            .filter_map(|c| {
                let members: Vec<usize> = result
                    .assignments
                    .iter()
                    .enumerate()
                    .filter(|(_, &a)| a == c)
                    .map(|(i, _)| i)
                    .collect();
                if members.is_empty() {
                    return None;
                }
                let n = members.len() as f64;
                let total: Money = members.iter().map(|&i| expenses[i].amount).sum();
                let typical_day = members.iter().map(|&i| raw[i][1]).sum::<f64>() / n;
                Some(SpendingCluster {
                    label: String::new(),
                    size: members.len(),
                    total,
                    typical_amount: Money::from_cents((total.cents() as f64 / n).round() as i64),
                    typical_day,
                    transaction_ids: members.iter().map(|&i| expenses[i].id).collect(),
                })
            })
            .collect();

        clusters.sort_by(|a, b| a.typical_amount.cmp(&b.typical_amount));
        let count = clusters.len();
        for (rank, cluster) in clusters.iter_mut().enumerate() {
            cluster.label = cluster_label(rank, count);
        }
        Ok(clusters)
    }

    pub fn health_score(&self, user_id: UserId, month: Month) -> FintrackResult<HealthScore> {
        let txns = self.storage.transactions.get_for_users_in_range(
            &[user_id],
            month.start_date(),
            month.end_date(),
        )?;
        let income: Money = txns.iter().filter(|t| t.is_income()).map(|t| t.amount).sum();
        let expenses: Money = txns.iter().filter(|t| t.is_expense()).map(|t| t.amount).sum();
        let savings_rate = if income.is_positive() {
            (income - expenses).percent_of(income)
        } else {
            0.0
        };

        let mut components = Vec::with_capacity(4);

        let savings_score = (savings_rate.max(0.0) / TARGET_SAVINGS_RATE * 100.0).min(100.0);
        components.push(ScoreComponent {
            name: "Savings",
            score: savings_score,
            weight: SAVINGS_WEIGHT,
            detail: format!("Saved {:.1}% of income", savings_rate),
        });

        let budgets = BudgetService::new(self.storage);
        let mut statuses = Vec::new();
        for scope in budgets.scopes_for(user_id)? {
            for summary in budgets.overview(user_id, scope, month)?.summaries {
                statuses.push(summary.status);
            }
        }
        let budget_adherence = if statuses.is_empty() {
            None
        } else {
            let kept = statuses
                .iter()
                .filter(|s| **s != BudgetStatus::OverBudget)
                .count();
            Some(kept as f64 / statuses.len() as f64 * 100.0)
        };
        components.push(ScoreComponent {
            name: "Budgets",
            score: budget_adherence.unwrap_or(NEUTRAL_SCORE),
            weight: BUDGET_WEIGHT,
            detail: match budget_adherence {
                Some(a) => format!("{:.0}% of budgets within limit", a),
                None => "No budgets set".to_string(),
            },
        });

        let debt = LiabilityService::new(self.storage).summary(user_id)?;
        let debt_to_income = if debt.total_minimum_payment.is_zero() {
            Some(0.0)
        } else if income.is_positive() {
            Some(debt.total_minimum_payment.percent_of(income))
        } else {
            None
        };
        let debt_score = match debt_to_income {
            Some(ratio) if ratio <= HEALTHY_DEBT_TO_INCOME => 100.0,
            Some(ratio) => ((MAX_DEBT_TO_INCOME - ratio)
                / (MAX_DEBT_TO_INCOME - HEALTHY_DEBT_TO_INCOME)
                * 100.0)
                .clamp(0.0, 100.0),
            None => 0.0,
        };
        components.push(ScoreComponent {
            name: "Debt",
            score: debt_score,
            weight: DEBT_WEIGHT,
            detail: match debt_to_income {
                Some(r) => format!("Debt payments are {:.1}% of income", r),
                None => "Debt payments with no income".to_string(),
            },
        });

        let goals = GoalService::new(self.storage);
        let active: Vec<_> = goals
            .list(user_id, false)?
            .into_iter()
            .filter(|g| !g.is_completed())
            .collect();
        let today = month.end_date();
        let goals_score = if active.is_empty() {
            NEUTRAL_SCORE
        } else {
            active.iter().filter(|g| g.is_on_track(today)).count() as f64 / active.len() as f64
                * 100.0
        };
        components.push(ScoreComponent {
            name: "Goals",
            score: goals_score,
            weight: GOALS_WEIGHT,
            detail: format!("{} active goal(s)", active.len()),
        });

        let total: f64 = components.iter().map(|c| c.score * c.weight).sum::<f64>() / 100.0;
        let score = total.round().clamp(0.0, 100.0) as u8;

        Ok(HealthScore {
            month,
            score,
            grade: grade(score),
            savings_rate,
            budget_adherence,
            debt_to_income,
            components,
        })
    }

    /// Plain-language suggestions drawn from the other insights
    pub fn recommendations(&self, user_id: UserId, month: Month) -> FintrackResult<Vec<String>> {
        let mut tips = Vec::new();
        let health = self.health_score(user_id, month)?;

        if health.savings_rate < TARGET_SAVINGS_RATE {
            tips.push(format!(
                "You saved {:.1}% of your income in {}; aim for at least {:.0}%.",
                health.savings_rate, month, TARGET_SAVINGS_RATE
            ));
        }

        for alert in BudgetService::new(self.storage).alerts(user_id, month)? {
            let name = self
                .storage
                .categories
                .get(alert.category_id)?
                .map(|c| c.name)
                .unwrap_or_default();
            tips.push(match alert.status {
                BudgetStatus::OverBudget => format!(
                    "{} is over budget by {}; consider moving unspent budget from another category.",
                    name,
                    -alert.remaining
                ),
                _ => format!(
                    "{} has used {:.0}% of its budget.",
                    name, alert.percent_used
                ),
            });
        }

        if let Some(ratio) = health.debt_to_income.filter(|r| *r > HEALTHY_DEBT_TO_INCOME) {
            let order = LiabilityService::new(self.storage)
                .payoff_order(user_id, super::PayoffStrategy::Avalanche)?;
            if let Some(first) = order.first() {
                tips.push(format!(
                    "Debt payments take {:.0}% of income; put extra money toward '{}' ({:.2}% APR) first.",
                    ratio,
                    first.name,
                    first.apr() * 100.0
                ));
            }
        }

        let since = month.start_date();
        let flagged = self
            .anomalies(user_id, Some(since))?
            .into_iter()
            .filter(|a| a.date <= month.end_date() && a.severity >= Severity::Medium)
            .count();
        if flagged > 0 {
            tips.push(format!(
                "{} unusually large expense(s) in {}; review them with `insights anomalies`.",
                flagged, month
            ));
        }

        let trends = self.category_trends(user_id, month, self.settings.trend_months)?;
        for trend in trends.iter().skip(1) {
            if let Some(t) = &trend.trend {
                if t.direction == crate::analytics::TrendDirection::Rising
                    && t.fit.r_squared >= 0.5
                    && t.monthly_change >= 1.0
                {
                    tips.push(format!(
                        "{} spending is rising by about {} a month.",
                        trend.name,
                        to_money(t.monthly_change)
                    ));
                }
            }
        }

        if tips.is_empty() {
            tips.push("Everything looks on track. Keep it up!".to_string());
        }
        Ok(tips)
    }
}

fn cluster_label(rank: usize, count: usize) -> String {
    match (rank, count) {
        (_, 1) => "Typical".to_string(),
        (0, _) => "Small".to_string(),
        (r, c) if r + 1 == c => "Large".to_string(),
        (_, 3) => "Medium".to_string(),
        (r, _) => format!("Medium {}", r),
    }
}
