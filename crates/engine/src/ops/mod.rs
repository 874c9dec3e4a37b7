use sea_orm::DatabaseConnection;

use crate::{EngineConfig, ResultEngine};

mod access;
mod budgets;
mod categories;
mod goals;
mod summaries;
mod transactions;

pub use budgets::{BudgetListFilter, BudgetPatch, NewBudget};
pub use categories::{CategoryDetail, CategoryListFilter, CategoryPatch, CategoryTreeNode, NewCategory};
pub use goals::{GoalListFilter, GoalPatch, NewContribution, NewGoal};
pub use summaries::{BudgetSummary, BudgetsOverview, CategoryDisplay, GoalDetail, GoalSummary};
pub use transactions::{NewTransaction, TransactionListFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// An early `?` inside the block drops the transaction, which rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    config: EngineConfig,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default tunables
    pub fn config(mut self, config: EngineConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        self.config.validate()?;
        Ok(Engine {
            database: self.database,
            config: self.config,
        })
    }
}
