use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Budget, BudgetPeriod, EngineError, ResultEngine,
    budgets::{self, validate_limit, validate_range, validate_thresholds},
    util::normalize_optional_text,
};

use super::{BudgetSummary, Engine, with_tx};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBudget {
    pub category_id: Uuid,
    pub limit_minor: i64,
    pub period: BudgetPeriod,
    /// Defaults to the configured first alert.
    pub alert_threshold_1: Option<i32>,
    /// Defaults to the configured second alert.
    pub alert_threshold_2: Option<i32>,
    /// Defaults to `true`.
    pub alerts_enabled: Option<bool>,
    pub notes: Option<String>,
}

/// Fields to change on a budget. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPatch {
    pub category_id: Option<Uuid>,
    pub limit_minor: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub alert_threshold_1: Option<i32>,
    pub alert_threshold_2: Option<i32>,
    pub alerts_enabled: Option<bool>,
    pub is_active: Option<bool>,
    pub notes: Option<Option<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetListFilter {
    pub category_id: Option<Uuid>,
    /// `true`: the period covers today. `false`: the period already ended.
    pub active: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Engine {
    /// Create a spending limit on a category visible to `user_id`.
    ///
    /// Fails with `Conflict` when another budget of the same category
    /// overlaps the period.
    pub async fn create_budget(&self, user_id: &str, new_budget: NewBudget) -> ResultEngine<Budget> {
        let (start_date, end_date) = new_budget.period.bounds()?;
        validate_limit(new_budget.limit_minor)?;
        let alert_threshold_1 = new_budget
            .alert_threshold_1
            .unwrap_or(self.config.default_alert_threshold_1);
        let alert_threshold_2 = new_budget
            .alert_threshold_2
            .unwrap_or(self.config.default_alert_threshold_2);
        validate_thresholds(alert_threshold_1, alert_threshold_2)?;

        with_tx!(self, |db_tx| {
            self.require_category_visible(&db_tx, new_budget.category_id, user_id)
                .await?;
            self.ensure_no_overlap(
                &db_tx,
                user_id,
                new_budget.category_id,
                start_date,
                end_date,
                None,
            )
            .await?;

            let now = Utc::now();
            let active = budgets::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id.to_string()),
                category_id: ActiveValue::Set(new_budget.category_id),
                start_date: ActiveValue::Set(start_date),
                end_date: ActiveValue::Set(end_date),
                limit_minor: ActiveValue::Set(new_budget.limit_minor),
                alert_threshold_1: ActiveValue::Set(alert_threshold_1),
                alert_threshold_2: ActiveValue::Set(alert_threshold_2),
                alerts_enabled: ActiveValue::Set(new_budget.alerts_enabled.unwrap_or(true)),
                is_active: ActiveValue::Set(true),
                notes: ActiveValue::Set(normalize_optional_text(new_budget.notes.as_deref())),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            };
            let budget = Budget::from(active.insert(&db_tx).await?);
            tracing::info!(
                user_id,
                budget_id = %budget.id,
                category_id = %budget.category_id,
                %start_date,
                %end_date,
                "budget created"
            );
            Ok(budget)
        })
    }

    /// Apply a patch. The overlap check runs again, excluding this budget,
    /// whenever the category or a bound changes.
    pub async fn update_budget(
        &self,
        user_id: &str,
        budget_id: Uuid,
        patch: BudgetPatch,
    ) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget_owned(&db_tx, budget_id, user_id).await?;

            let category_id = patch.category_id.unwrap_or(model.category_id);
            let start_date = patch.start_date.unwrap_or(model.start_date);
            let end_date = patch.end_date.unwrap_or(model.end_date);
            validate_range(start_date, end_date)?;
            if let Some(limit_minor) = patch.limit_minor {
                validate_limit(limit_minor)?;
            }
            validate_thresholds(
                patch.alert_threshold_1.unwrap_or(model.alert_threshold_1),
                patch.alert_threshold_2.unwrap_or(model.alert_threshold_2),
            )?;

            if category_id != model.category_id {
                self.require_category_visible(&db_tx, category_id, user_id)
                    .await?;
            }
            if category_id != model.category_id
                || start_date != model.start_date
                || end_date != model.end_date
            {
                self.ensure_no_overlap(
                    &db_tx,
                    user_id,
                    category_id,
                    start_date,
                    end_date,
                    Some(budget_id),
                )
                .await?;
            }

            let mut active: budgets::ActiveModel = model.into();
            active.category_id = ActiveValue::Set(category_id);
            active.start_date = ActiveValue::Set(start_date);
            active.end_date = ActiveValue::Set(end_date);
            if let Some(limit_minor) = patch.limit_minor {
                active.limit_minor = ActiveValue::Set(limit_minor);
            }
            if let Some(threshold) = patch.alert_threshold_1 {
                active.alert_threshold_1 = ActiveValue::Set(threshold);
            }
            if let Some(threshold) = patch.alert_threshold_2 {
                active.alert_threshold_2 = ActiveValue::Set(threshold);
            }
            if let Some(enabled) = patch.alerts_enabled {
                active.alerts_enabled = ActiveValue::Set(enabled);
            }
            if let Some(is_active) = patch.is_active {
                active.is_active = ActiveValue::Set(is_active);
            }
            if let Some(notes) = patch.notes {
                active.notes = ActiveValue::Set(normalize_optional_text(notes.as_deref()));
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            let updated = active.update(&db_tx).await?;

            tracing::info!(user_id, budget_id = %budget_id, "budget updated");
            Ok(Budget::from(updated))
        })
    }

    /// Permanently delete a budget.
    pub async fn delete_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget_owned(&db_tx, budget_id, user_id).await?;
            budgets::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::info!(user_id, budget_id = %budget_id, "budget deleted");
            Ok(())
        })
    }

    pub async fn budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget_owned(&db_tx, budget_id, user_id).await?;
            Ok(Budget::from(model))
        })
    }

    /// List budgets ordered by `start_date` descending.
    pub async fn list_budgets(
        &self,
        user_id: &str,
        filter: &BudgetListFilter,
        today: NaiveDate,
    ) -> ResultEngine<Vec<Budget>> {
        let mut query =
            budgets::Entity::find().filter(budgets::Column::UserId.eq(user_id.to_string()));
        if let Some(category_id) = filter.category_id {
            query = query.filter(budgets::Column::CategoryId.eq(category_id));
        }
        match filter.active {
            Some(true) => {
                query = query
                    .filter(budgets::Column::StartDate.lte(today))
                    .filter(budgets::Column::EndDate.gte(today));
            }
            Some(false) => {
                query = query.filter(budgets::Column::EndDate.lt(today));
            }
            None => {}
        }
        let models = query
            .order_by_desc(budgets::Column::StartDate)
            .limit(self.config.page_size(filter.limit))
            .offset(filter.offset.unwrap_or(0))
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Budget::from).collect())
    }

    /// Spending state of one budget, recomputed from the transaction ledger.
    pub async fn budget_summary(
        &self,
        user_id: &str,
        budget_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<BudgetSummary> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget_owned(&db_tx, budget_id, user_id).await?;
            self.summarize_budget(&db_tx, Budget::from(model), today)
                .await
        })
    }

    /// One independently computed summary per budget covering `today`.
    pub async fn active_budget_summaries(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<Vec<BudgetSummary>> {
        with_tx!(self, |db_tx| {
            let models = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .filter(budgets::Column::StartDate.lte(today))
                .filter(budgets::Column::EndDate.gte(today))
                .order_by_asc(budgets::Column::EndDate)
                .all(&db_tx)
                .await?;
            let mut summaries = Vec::with_capacity(models.len());
            for model in models {
                summaries.push(
                    self.summarize_budget(&db_tx, Budget::from(model), today)
                        .await?,
                );
            }
            Ok(summaries)
        })
    }

    /// Inclusive bounds: two budgets overlap when they share at least one day.
    async fn ensure_no_overlap(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        category_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        let overlap = Condition::any()
            .add(
                Condition::all()
                    .add(budgets::Column::StartDate.lte(start_date))
                    .add(budgets::Column::EndDate.gte(start_date)),
            )
            .add(
                Condition::all()
                    .add(budgets::Column::StartDate.lte(end_date))
                    .add(budgets::Column::EndDate.gte(end_date)),
            )
            .add(
                Condition::all()
                    .add(budgets::Column::StartDate.gte(start_date))
                    .add(budgets::Column::EndDate.lte(end_date)),
            );
        let mut query = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .filter(budgets::Column::CategoryId.eq(category_id))
            .filter(overlap);
        if let Some(exclude_id) = exclude_id {
            query = query.filter(budgets::Column::Id.ne(exclude_id));
        }
        if let Some(existing) = query.one(db).await? {
            tracing::debug!(user_id, existing = %existing.id, "budget period overlap");
            return Err(EngineError::Conflict(format!(
                "budget {} already covers part of {start_date}..={end_date}",
                existing.id
            )));
        }
        Ok(())
    }
}
