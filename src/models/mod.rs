//! Core data models for fintrack
//!
//! This module contains the data structures of the personal-finance domain:
//! users and sessions, categories, transactions, budgets, savings goals,
//! liabilities and family groups.

pub mod budget;
pub mod category;
pub mod family;
pub mod goal;
pub mod ids;
pub mod liability;
pub mod money;
pub mod month;
pub mod session;
pub mod transaction;
pub mod user;

pub use budget::{Budget, BudgetScope, BudgetStatus, BudgetSummary, BudgetTransfer};
pub use category::{Category, CategoryKind};
pub use family::{
    FamilyGroup, FamilyMember, FamilyRole, Invitation, InvitationStatus, MAX_FAMILY_MEMBERS,
};
pub use goal::{Contribution, Goal, GoalKind, GoalStatus};
pub use ids::{
    BudgetId, BudgetTransferId, CategoryId, FamilyId, GoalId, InvitationId, LiabilityId,
    PaymentId, SessionId, TransactionId, UserId,
};
pub use liability::{Liability, LiabilityKind, LiabilityPayment, PayoffPlan, PayoffStep};
pub use money::Money;
pub use month::Month;
pub use session::Session;
pub use transaction::{Transaction, TransactionKind};
pub use user::{User, UserProfile};
