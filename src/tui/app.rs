//! Application state for the TUI
//!
//! The App struct holds all state needed for rendering and handling events.
//! Data for the selected month is loaded into a `Snapshot` whenever the month
//! changes, so drawing never touches storage.

use std::collections::HashMap;

use crate::config::settings::Settings;
use crate::error::FintrackResult;
use crate::models::{CategoryId, Goal, Liability, Month, Transaction, User};
use crate::services::{
    BudgetOverview, BudgetService, CategoryService, CategoryTrend, DebtSummary, GoalProgress,
    GoalService, HealthScore, InsightService, LiabilityService, MonthlySummary, SpendingAnomaly,
    TransactionFilter, TransactionService,
};
use crate::storage::Storage;

/// Dashboard tabs, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    Transactions,
    Budgets,
    Goals,
    Debts,
    Insights,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Overview,
        Tab::Transactions,
        Tab::Budgets,
        Tab::Goals,
        Tab::Debts,
        Tab::Insights,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Transactions => "Transactions",
            Tab::Budgets => "Budgets",
            Tab::Goals => "Goals",
            Tab::Debts => "Debts",
            Tab::Insights => "Insights",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Everything the views show for one month
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub summary: MonthlySummary,
    /// The month's transactions, newest first
    pub transactions: Vec<Transaction>,
    pub category_names: HashMap<CategoryId, String>,
    /// Personal overview first, then the family's if any
    pub budgets: Vec<BudgetOverview>,
    pub goals: Vec<(Goal, GoalProgress)>,
    pub liabilities: Vec<Liability>,
    pub debt: DebtSummary,
    pub health: HealthScore,
    pub anomalies: Vec<SpendingAnomaly>,
    pub trends: Vec<CategoryTrend>,
}

impl Snapshot {
    pub fn load(
        storage: &Storage,
        settings: &Settings,
        user: &User,
        month: Month,
    ) -> FintrackResult<Self> {
        let budgets = BudgetService::new(storage);
        let goals = GoalService::new(storage);
        let debts = LiabilityService::new(storage);
        let insights = InsightService::new(storage, settings);
        let transactions = TransactionService::new(storage);

        let category_names = CategoryService::new(storage)
            .list_visible(user.id)?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut overviews = Vec::new();
        for scope in budgets.scopes_for(user.id)? {
            overviews.push(budgets.overview(user.id, scope, month)?);
        }

        let today = chrono::Local::now().date_naive();
        let goal_list = goals
            .list(user.id, false)?
            .into_iter()
            .map(|g| {
                let progress = goals.progress(&g, today);
                (g, progress)
            })
            .collect();

        Ok(Self {
            summary: transactions.monthly_summary(user.id, month)?,
            transactions: transactions.list(user.id, &TransactionFilter::new().month(month))?,
            category_names,
            budgets: overviews,
            goals: goal_list,
            liabilities: debts.list(user.id, false)?,
            debt: debts.summary(user.id)?,
            health: insights.health_score(user.id, month)?,
            anomalies: insights.anomalies(user.id, Some(month.start_date()))?,
            trends: insights.category_trends(user.id, month, settings.insights.trend_months)?,
        })
    }

    pub fn category_name(&self, id: CategoryId) -> &str {
        self.category_names
            .get(&id)
            .map(String::as_str)
            .unwrap_or("(unknown)")
    }

    /// Rows in the scrollable list of a tab
    pub fn row_count(&self, tab: Tab) -> usize {
        match tab {
            Tab::Overview => self.summary.by_category.len(),
            Tab::Transactions => self.transactions.len(),
            Tab::Budgets => self.budgets.iter().map(|b| b.summaries.len()).sum(),
            Tab::Goals => self.goals.len(),
            Tab::Debts => self.liabilities.len(),
            Tab::Insights => self.anomalies.len(),
        }
    }
}

/// Main application state
pub struct App<'a> {
    pub storage: &'a Storage,
    pub settings: &'a Settings,
    pub user: &'a User,

    /// Whether the app should quit
    pub should_quit: bool,

    pub active_tab: Tab,

    /// Month being viewed
    pub month: Month,

    /// Selected row in the active tab's list
    pub selected: usize,

    pub show_help: bool,

    /// Status message to display
    pub status_message: Option<String>,

    /// `None` when loading failed; the reason is in `status_message`
    pub snapshot: Option<Snapshot>,
}

impl<'a> App<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings, user: &'a User) -> Self {
        let mut app = Self {
            storage,
            settings,
            user,
            should_quit: false,
            active_tab: Tab::default(),
            month: Month::current(),
            selected: 0,
            show_help: false,
            status_message: None,
            snapshot: None,
        };
        app.refresh();
        app
    }

    /// Reload the snapshot for the current month
    pub fn refresh(&mut self) {
        match Snapshot::load(self.storage, self.settings, self.user, self.month) {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.status_message = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, month = %self.month, "failed to load dashboard data");
                self.snapshot = None;
                self.status_message = Some(e.to_string());
            }
        }
        self.clamp_selection();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn next_tab(&mut self) {
        self.active_tab = self.active_tab.next();
        self.selected = 0;
    }

    pub fn previous_tab(&mut self) {
        self.active_tab = self.active_tab.previous();
        self.selected = 0;
    }

    pub fn next_month(&mut self) {
        self.month = self.month.next();
        self.refresh();
    }

    pub fn previous_month(&mut self) {
        self.month = self.month.prev();
        self.refresh();
    }

    pub fn current_month(&mut self) {
        self.month = Month::current();
        self.refresh();
    }

    fn row_count(&self) -> usize {
        self.snapshot
            .as_ref()
            .map(|s| s.row_count(self.active_tab))
            .unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.row_count() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.row_count().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.row_count().saturating_sub(1));
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle() {
        assert_eq!(Tab::Overview.next(), Tab::Transactions);
        assert_eq!(Tab::Insights.next(), Tab::Overview);
        assert_eq!(Tab::Overview.previous(), Tab::Insights);
        assert_eq!(Tab::Debts.index(), 4);
    }

    #[test]
    fn test_snapshot_holds_only_the_month() {
        use crate::models::TransactionKind;
        use crate::services::testing::{create_test_storage, register};
        use chrono::NaiveDate;

        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let alice = register(&storage, "alice");
        let groceries = storage
            .categories
            .find_builtin("Groceries", TransactionKind::Expense)
            .unwrap()
            .unwrap();
        for (month, cents) in [(2, 1_000), (3, 2_500)] {
            let date = NaiveDate::from_ymd_opt(2025, month, 10).unwrap();
            storage
                .transactions
                .upsert(Transaction::expense(
                    alice.id,
                    crate::models::Money::from_cents(cents),
                    groceries.id,
                    date,
                    "shop",
                ))
                .unwrap();
        }

        let snapshot =
            Snapshot::load(&storage, &settings, &alice, Month::new(2025, 3).unwrap()).unwrap();
        assert_eq!(snapshot.transactions.len(), 1);
        assert_eq!(snapshot.transactions[0].amount.cents(), 2_500);
        assert_eq!(snapshot.summary.expenses.cents(), 2_500);
    }
}
