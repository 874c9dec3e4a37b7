//! Read-side rollups that join category display fields onto budgets and goals.

use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, QueryFilter, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Budget, BudgetStatus, CategoryKind, Contribution, Goal, GoalProgress, GoalStatus, MoneyCents,
    Milestone, ResultEngine, categories, goals, money::round2, transactions,
};

use super::{Engine, with_tx};

/// Display fields of the category a budget or goal points at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDisplay {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl From<categories::Model> for CategoryDisplay {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            icon: model.icon,
            color: model.color,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub budget: Budget,
    pub category: Option<CategoryDisplay>,
    pub spent_minor: i64,
    /// `limit - spent`, negative once exceeded.
    pub remaining_minor: i64,
    pub percentage_used: f64,
    pub status: BudgetStatus,
    pub days_remaining: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetsOverview {
    pub total_budgets: u64,
    pub total_limit_minor: i64,
    pub total_spent_minor: i64,
    pub average_percentage: f64,
    pub exceeded: u64,
    pub warning: u64,
    pub on_track: u64,
}

/// Goal rollup for one owner.
///
/// The pace counters only look at `IN_PROGRESS` goals and overlap: a goal at
/// 85% counts as both on track and ahead.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalSummary {
    pub total_goals: u64,
    pub active_goals: u64,
    pub completed_goals: u64,
    pub total_saved_minor: i64,
    pub total_target_minor: i64,
    pub overall_progress: f64,
    /// Progress >= 50%.
    pub goals_on_track: u64,
    /// Progress < 30%.
    pub goals_behind: u64,
    /// Progress >= 80%.
    pub goals_ahead: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalDetail {
    pub goal: Goal,
    pub progress: GoalProgress,
    pub category: Option<CategoryDisplay>,
    pub contributions: Vec<Contribution>,
    pub milestones: Vec<Milestone>,
}

impl Engine {
    /// Aggregate of every budget covering `today`.
    pub async fn budgets_overview(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<BudgetsOverview> {
        let summaries = self.active_budget_summaries(user_id, today).await?;
        Ok(overview_of(&summaries))
    }

    pub async fn goal_summary(&self, user_id: &str) -> ResultEngine<GoalSummary> {
        with_tx!(self, |db_tx| {
            let models = goals::Entity::find()
                .filter(goals::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?;
            let goals = models
                .into_iter()
                .map(Goal::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(summary_of(&goals))
        })
    }

    /// Sum of the owner's expense transactions on `category_id` dated inside
    /// `[start, end]`.
    pub(super) async fn spent_in_range(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        category_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<i64> {
        let total: Option<Option<i64>> = transactions::Entity::find()
            .select_only()
            .column_as(transactions::Column::AmountMinor.sum(), "total")
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .filter(transactions::Column::CategoryId.eq(category_id))
            .filter(transactions::Column::Kind.eq(CategoryKind::Expense.as_str()))
            .filter(transactions::Column::TransactionDate.between(start, end))
            .into_tuple()
            .one(db)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }

    pub(super) async fn category_display(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<Option<CategoryDisplay>> {
        Ok(categories::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .map(CategoryDisplay::from))
    }

    /// Recompute a budget summary from the ledger.
    pub(super) async fn summarize_budget(
        &self,
        db: &DatabaseTransaction,
        budget: Budget,
        today: NaiveDate,
    ) -> ResultEngine<BudgetSummary> {
        let spent_minor = self
            .spent_in_range(
                db,
                &budget.user_id,
                budget.category_id,
                budget.start_date,
                budget.end_date,
            )
            .await?;
        let category = self.category_display(db, budget.category_id).await?;
        let percentage_used = budget.percentage_used(spent_minor);
        let status = budget.status_for(spent_minor);
        tracing::debug!(
            budget_id = %budget.id,
            spent_minor,
            percentage_used,
            status = status.as_str(),
            "budget summarized"
        );
        Ok(BudgetSummary {
            remaining_minor: budget.limit_minor - spent_minor,
            days_remaining: budget.days_remaining(today),
            spent_minor,
            percentage_used,
            status,
            category,
            budget,
        })
    }
}

fn overview_of(summaries: &[BudgetSummary]) -> BudgetsOverview {
    let mut overview = BudgetsOverview::default();
    let mut percentage_total = 0.0;
    for summary in summaries {
        overview.total_budgets += 1;
        overview.total_limit_minor += summary.budget.limit_minor;
        overview.total_spent_minor += summary.spent_minor;
        percentage_total += summary.percentage_used;
        match summary.status {
            BudgetStatus::Exceeded => overview.exceeded += 1,
            BudgetStatus::Warning => overview.warning += 1,
            BudgetStatus::OnTrack => overview.on_track += 1,
        }
    }
    if overview.total_budgets > 0 {
        overview.average_percentage = round2(percentage_total / overview.total_budgets as f64);
    }
    overview
}

fn summary_of(goals: &[Goal]) -> GoalSummary {
    let mut summary = GoalSummary::default();
    for goal in goals {
        summary.total_goals += 1;
        summary.total_saved_minor += goal.current_minor;
        summary.total_target_minor += goal.target_minor;
        match goal.status {
            GoalStatus::InProgress => {
                summary.active_goals += 1;
                if goal.reaches_percent(50) {
                    summary.goals_on_track += 1;
                }
                if !goal.reaches_percent(30) {
                    summary.goals_behind += 1;
                }
                if goal.reaches_percent(80) {
                    summary.goals_ahead += 1;
                }
            }
            GoalStatus::Completed => summary.completed_goals += 1,
            _ => {}
        }
    }
    summary.overall_progress = MoneyCents::new(summary.total_saved_minor)
        .percent_of(MoneyCents::new(summary.total_target_minor));
    summary
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn goal(status: GoalStatus, target_minor: i64, current_minor: i64) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            category_id: None,
            name: "Reserva".to_string(),
            description: None,
            target_minor,
            current_minor,
            deadline: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            status,
            color: None,
            icon: None,
            priority: 1,
            is_recurring: false,
            recurrence_day: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            achieved_at: None,
            paused_at: None,
        }
    }

    #[test]
    fn pace_buckets_overlap() {
        let goals = [
            goal(GoalStatus::InProgress, 1_000, 850),
            goal(GoalStatus::InProgress, 1_000, 100),
            goal(GoalStatus::InProgress, 1_000, 400),
            goal(GoalStatus::Draft, 1_000, 900),
            goal(GoalStatus::Completed, 1_000, 1_000),
        ];
        let summary = summary_of(&goals);
        assert_eq!(summary.total_goals, 5);
        assert_eq!(summary.active_goals, 3);
        assert_eq!(summary.completed_goals, 1);
        assert_eq!(summary.goals_on_track, 1);
        assert_eq!(summary.goals_ahead, 1);
        assert_eq!(summary.goals_behind, 1);
        assert_eq!(summary.total_saved_minor, 3_250);
        assert_eq!(summary.total_target_minor, 5_000);
        assert_eq!(summary.overall_progress, 65.0);
    }

    #[test]
    fn pace_buckets_use_exact_progress() {
        let goals = [
            goal(GoalStatus::InProgress, 1_000_000, 499_999),
            goal(GoalStatus::InProgress, 1_000_000, 299_999),
            goal(GoalStatus::InProgress, 1_000_000, 799_999),
        ];
        let summary = summary_of(&goals);
        assert_eq!(summary.goals_on_track, 1);
        assert_eq!(summary.goals_behind, 1);
        assert_eq!(summary.goals_ahead, 0);
    }

    #[test]
    fn empty_summary_has_zero_progress() {
        let summary = summary_of(&[]);
        assert_eq!(summary.overall_progress, 0.0);
        assert_eq!(overview_of(&[]).average_percentage, 0.0);
    }
}
