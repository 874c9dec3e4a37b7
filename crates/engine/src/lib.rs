//! Budget and goal rule engine.
//!
//! The [`Engine`] owns the database connection and enforces every invariant
//! of categories, budgets and goals before writing. Operations live in the
//! `ops` modules as `impl Engine` blocks; each runs in one database
//! transaction so check-then-write sequences cannot race.

pub use budgets::{Budget, BudgetPeriod, BudgetStatus};
pub use categories::{Category, CategoryKind};
pub use config::EngineConfig;
pub use error::{EngineError, ErrorKind};
pub use goal_contributions::{Contribution, ContributionKind};
pub use goal_milestones::Milestone;
pub use goals::{Goal, GoalProgress, GoalStatus};
pub use money::MoneyCents;
pub use ops::{
    BudgetListFilter, BudgetPatch, BudgetSummary, BudgetsOverview, CategoryDetail,
    CategoryDisplay, CategoryListFilter, CategoryPatch, CategoryTreeNode, GoalDetail,
    GoalListFilter, GoalPatch, GoalSummary, NewBudget, NewCategory, NewContribution, NewGoal,
    NewTransaction, TransactionListFilter,
};
pub use ops::{Engine, EngineBuilder};
pub use transactions::Transaction;

mod budgets;
mod categories;
mod config;
mod error;
mod goal_contributions;
mod goal_milestones;
mod goals;
mod money;
mod ops;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
