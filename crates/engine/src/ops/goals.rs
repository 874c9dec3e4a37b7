use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Contribution, ContributionKind, EngineError, Goal, GoalStatus, Milestone, MoneyCents,
    ResultEngine, goal_contributions, goal_milestones,
    goal_milestones::DEFAULT_MILESTONES,
    goals,
    util::{normalize_name, normalize_optional_text, validate_color, validate_icon},
};

use super::{Engine, GoalDetail, with_tx};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoal {
    pub name: String,
    pub description: Option<String>,
    pub target_minor: i64,
    /// Must be strictly after today.
    pub deadline: NaiveDate,
    pub category_id: Option<Uuid>,
    pub color: Option<String>,
    pub icon: Option<String>,
    /// `1..=5`, defaults to 1.
    pub priority: Option<i32>,
    pub is_recurring: bool,
    pub recurrence_day: Option<i32>,
}

/// Fields to change on a goal. `None` leaves the field untouched; for
/// nullable fields `Some(None)` clears the value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub target_minor: Option<i64>,
    pub deadline: Option<NaiveDate>,
    pub category_id: Option<Option<Uuid>>,
    pub status: Option<GoalStatus>,
    pub color: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub priority: Option<i32>,
    pub is_recurring: Option<bool>,
    pub recurrence_day: Option<Option<i32>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalListFilter {
    pub status: Option<GoalStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContribution {
    pub amount_minor: i64,
    pub kind: ContributionKind,
    pub description: Option<String>,
    /// Defaults to today.
    pub contribution_date: Option<NaiveDate>,
    /// One of the user's transactions.
    pub transaction_id: Option<Uuid>,
    pub is_recurring: bool,
}

fn validate_target(target_minor: i64) -> ResultEngine<()> {
    if !MoneyCents::new(target_minor).is_positive() {
        return Err(EngineError::InvalidAmount(
            "target_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_priority(priority: i32) -> ResultEngine<()> {
    if !(1..=5).contains(&priority) {
        return Err(EngineError::InvalidArgument(
            "priority must be within 1..=5".to_string(),
        ));
    }
    Ok(())
}

fn validate_recurrence(is_recurring: bool, recurrence_day: Option<i32>) -> ResultEngine<()> {
    match recurrence_day {
        Some(day) if !(1..=31).contains(&day) => Err(EngineError::InvalidArgument(
            "recurrence_day must be within 1..=31".to_string(),
        )),
        None if is_recurring => Err(EngineError::InvalidArgument(
            "recurrence_day is required for recurring goals".to_string(),
        )),
        _ => Ok(()),
    }
}

impl Engine {
    /// Create a goal in `DRAFT` together with its four standard milestones.
    pub async fn create_goal(
        &self,
        user_id: &str,
        new_goal: NewGoal,
        now: DateTime<Utc>,
    ) -> ResultEngine<Goal> {
        let name = normalize_name(&new_goal.name, "goal", 1, 100)?;
        validate_target(new_goal.target_minor)?;
        if new_goal.deadline <= now.date_naive() {
            return Err(EngineError::InvalidDate(
                "deadline must be in the future".to_string(),
            ));
        }
        let priority = new_goal.priority.unwrap_or(1);
        validate_priority(priority)?;
        validate_recurrence(new_goal.is_recurring, new_goal.recurrence_day)?;
        let color = validate_color(new_goal.color.as_deref())?;
        let icon = validate_icon(new_goal.icon.as_deref())?;

        with_tx!(self, |db_tx| {
            self.ensure_goal_name_free(&db_tx, user_id, &name, None)
                .await?;
            if let Some(category_id) = new_goal.category_id {
                self.require_goal_category(&db_tx, category_id, user_id)
                    .await?;
            }

            let goal_id = Uuid::new_v4();
            let active = goals::ActiveModel {
                id: ActiveValue::Set(goal_id),
                user_id: ActiveValue::Set(user_id.to_string()),
                category_id: ActiveValue::Set(new_goal.category_id),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(normalize_optional_text(
                    new_goal.description.as_deref(),
                )),
                target_minor: ActiveValue::Set(new_goal.target_minor),
                current_minor: ActiveValue::Set(0),
                deadline: ActiveValue::Set(new_goal.deadline),
                status: ActiveValue::Set(GoalStatus::Draft.as_str().to_string()),
                color: ActiveValue::Set(color),
                icon: ActiveValue::Set(icon),
                priority: ActiveValue::Set(priority),
                is_recurring: ActiveValue::Set(new_goal.is_recurring),
                recurrence_day: ActiveValue::Set(new_goal.recurrence_day),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                achieved_at: ActiveValue::Set(None),
                paused_at: ActiveValue::Set(None),
            };
            let goal = Goal::try_from(active.insert(&db_tx).await?)?;

            for (percentage, title, description) in DEFAULT_MILESTONES {
                let milestone = goal_milestones::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    goal_id: ActiveValue::Set(goal_id),
                    percentage: ActiveValue::Set(percentage),
                    title: ActiveValue::Set(title.to_string()),
                    description: ActiveValue::Set(Some(description.to_string())),
                    achieved: ActiveValue::Set(false),
                    achieved_at: ActiveValue::Set(None),
                    created_at: ActiveValue::Set(now),
                };
                milestone.insert(&db_tx).await?;
            }

            tracing::info!(user_id, goal_id = %goal_id, target_minor = goal.target_minor, "goal created");
            Ok(goal)
        })
    }

    /// Apply a patch. A status change is checked against the transition
    /// table before any other field is touched.
    pub async fn update_goal(
        &self,
        user_id: &str,
        goal_id: Uuid,
        patch: GoalPatch,
        now: DateTime<Utc>,
    ) -> ResultEngine<Goal> {
        with_tx!(self, |db_tx| {
            let model = self.require_goal_owned(&db_tx, goal_id, user_id).await?;
            let current = Goal::try_from(model.clone())?;

            let next_status = match patch.status {
                Some(next) if next != current.status => {
                    if !current.status.can_transition_to(next) {
                        tracing::warn!(
                            user_id,
                            goal_id = %goal_id,
                            from = current.status.as_str(),
                            to = next.as_str(),
                            "rejected goal status transition"
                        );
                        return Err(EngineError::InvalidTransition(format!(
                            "invalid status transition from {} to {}",
                            current.status.as_str(),
                            next.as_str()
                        )));
                    }
                    Some(next)
                }
                _ => None,
            };
            let status = next_status.unwrap_or(current.status);

            let name = patch
                .name
                .as_deref()
                .map(|name| normalize_name(name, "goal", 1, 100))
                .transpose()?;
            if let Some(target_minor) = patch.target_minor {
                validate_target(target_minor)?;
            }
            if let Some(priority) = patch.priority {
                validate_priority(priority)?;
            }
            let is_recurring = patch.is_recurring.unwrap_or(current.is_recurring);
            let recurrence_day = patch.recurrence_day.unwrap_or(current.recurrence_day);
            validate_recurrence(is_recurring, recurrence_day)?;
            let color = patch
                .color
                .as_ref()
                .map(|color| validate_color(color.as_deref()))
                .transpose()?;
            let icon = patch
                .icon
                .as_ref()
                .map(|icon| validate_icon(icon.as_deref()))
                .transpose()?;

            let effective_name = name.as_deref().unwrap_or(&current.name);
            let claims_name = effective_name != current.name || !current.status.reserves_name();
            if status.reserves_name() && claims_name {
                self.ensure_goal_name_free(&db_tx, user_id, effective_name, Some(goal_id))
                    .await?;
            }
            if let Some(Some(category_id)) = patch.category_id {
                self.require_goal_category(&db_tx, category_id, user_id)
                    .await?;
            }

            let mut active: goals::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(description) = patch.description {
                active.description =
                    ActiveValue::Set(normalize_optional_text(description.as_deref()));
            }
            if let Some(target_minor) = patch.target_minor {
                active.target_minor = ActiveValue::Set(target_minor);
            }
            if let Some(deadline) = patch.deadline {
                active.deadline = ActiveValue::Set(deadline);
            }
            if let Some(category_id) = patch.category_id {
                active.category_id = ActiveValue::Set(category_id);
            }
            if let Some(color) = color {
                active.color = ActiveValue::Set(color);
            }
            if let Some(icon) = icon {
                active.icon = ActiveValue::Set(icon);
            }
            if let Some(priority) = patch.priority {
                active.priority = ActiveValue::Set(priority);
            }
            active.is_recurring = ActiveValue::Set(is_recurring);
            active.recurrence_day = ActiveValue::Set(recurrence_day);
            if let Some(next) = next_status {
                active.status = ActiveValue::Set(next.as_str().to_string());
                match next {
                    GoalStatus::Paused => active.paused_at = ActiveValue::Set(Some(now)),
                    GoalStatus::InProgress if current.status == GoalStatus::Paused => {
                        active.paused_at = ActiveValue::Set(None);
                    }
                    GoalStatus::Completed => active.achieved_at = ActiveValue::Set(Some(now)),
                    _ => {}
                }
            }
            active.updated_at = ActiveValue::Set(now);
            let updated = Goal::try_from(active.update(&db_tx).await?)?;

            if patch.target_minor.is_some() {
                self.sync_milestones(&db_tx, &updated, now).await?;
            }

            tracing::info!(user_id, goal_id = %goal_id, status = updated.status.as_str(), "goal updated");
            Ok(updated)
        })
    }

    /// Move a goal to `status` following the transition table.
    pub async fn set_goal_status(
        &self,
        user_id: &str,
        goal_id: Uuid,
        status: GoalStatus,
        now: DateTime<Utc>,
    ) -> ResultEngine<Goal> {
        let patch = GoalPatch {
            status: Some(status),
            ..GoalPatch::default()
        };
        self.update_goal(user_id, goal_id, patch, now).await
    }

    /// Delete a goal with its contributions and milestones.
    pub async fn delete_goal(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_goal_owned(&db_tx, goal_id, user_id).await?;
            goal_contributions::Entity::delete_many()
                .filter(goal_contributions::Column::GoalId.eq(model.id))
                .exec(&db_tx)
                .await?;
            goal_milestones::Entity::delete_many()
                .filter(goal_milestones::Column::GoalId.eq(model.id))
                .exec(&db_tx)
                .await?;
            goals::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::info!(user_id, goal_id = %goal_id, "goal deleted");
            Ok(())
        })
    }

    /// Record a contribution and recompute the goal balance from its ledger.
    ///
    /// Only `DRAFT` and `IN_PROGRESS` goals accept contributions.
    pub async fn add_contribution(
        &self,
        user_id: &str,
        goal_id: Uuid,
        new_contribution: NewContribution,
        now: DateTime<Utc>,
    ) -> ResultEngine<Contribution> {
        if !MoneyCents::new(new_contribution.amount_minor).is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let model = self.require_goal_owned(&db_tx, goal_id, user_id).await?;
            let goal = Goal::try_from(model)?;
            if !goal.status.accepts_contributions() {
                return Err(EngineError::InactiveGoal(format!(
                    "cannot add contributions to a {} goal",
                    goal.status.as_str()
                )));
            }
            if let Some(transaction_id) = new_contribution.transaction_id {
                self.require_transaction_owned(&db_tx, transaction_id, user_id)
                    .await?;
            }

            let active = goal_contributions::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                goal_id: ActiveValue::Set(goal_id),
                transaction_id: ActiveValue::Set(new_contribution.transaction_id),
                amount_minor: ActiveValue::Set(new_contribution.amount_minor),
                kind: ActiveValue::Set(new_contribution.kind.as_str().to_string()),
                description: ActiveValue::Set(normalize_optional_text(
                    new_contribution.description.as_deref(),
                )),
                contribution_date: ActiveValue::Set(
                    new_contribution
                        .contribution_date
                        .unwrap_or_else(|| now.date_naive()),
                ),
                is_recurring: ActiveValue::Set(new_contribution.is_recurring),
                created_by: ActiveValue::Set(user_id.to_string()),
                created_at: ActiveValue::Set(now),
            };
            let contribution = Contribution::try_from(active.insert(&db_tx).await?)?;

            let current_minor = self.contributed_total(&db_tx, goal_id).await?;
            let mut goal_active: goals::ActiveModel = goals::Entity::find_by_id(goal_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?
                .into();
            goal_active.current_minor = ActiveValue::Set(current_minor);
            goal_active.updated_at = ActiveValue::Set(now);
            let updated = Goal::try_from(goal_active.update(&db_tx).await?)?;
            self.sync_milestones(&db_tx, &updated, now).await?;

            tracing::info!(
                user_id,
                goal_id = %goal_id,
                amount_minor = contribution.amount_minor,
                current_minor,
                "goal contribution added"
            );
            Ok(contribution)
        })
    }

    /// A goal with its derived metrics, ledger and milestones.
    pub async fn goal(
        &self,
        user_id: &str,
        goal_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<GoalDetail> {
        with_tx!(self, |db_tx| {
            let model = self.require_goal_owned(&db_tx, goal_id, user_id).await?;
            let goal = Goal::try_from(model)?;
            let contributions = goal_contributions::Entity::find()
                .filter(goal_contributions::Column::GoalId.eq(goal_id))
                .order_by_desc(goal_contributions::Column::ContributionDate)
                .order_by_desc(goal_contributions::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Contribution::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let milestones = goal_milestones::Entity::find()
                .filter(goal_milestones::Column::GoalId.eq(goal_id))
                .order_by_asc(goal_milestones::Column::Percentage)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Milestone::from)
                .collect();
            let category = match goal.category_id {
                Some(category_id) => self.category_display(&db_tx, category_id).await?,
                None => None,
            };
            Ok(GoalDetail {
                progress: goal.progress(today),
                goal,
                category,
                contributions,
                milestones,
            })
        })
    }

    /// List goals, highest priority first then nearest deadline.
    pub async fn list_goals(
        &self,
        user_id: &str,
        filter: &GoalListFilter,
    ) -> ResultEngine<Vec<Goal>> {
        let mut query =
            goals::Entity::find().filter(goals::Column::UserId.eq(user_id.to_string()));
        if let Some(status) = filter.status {
            query = query.filter(goals::Column::Status.eq(status.as_str()));
        }
        query
            .order_by_desc(goals::Column::Priority)
            .order_by_asc(goals::Column::Deadline)
            .limit(self.config.page_size(filter.limit))
            .offset(filter.offset.unwrap_or(0))
            .all(&self.database)
            .await?
            .into_iter()
            .map(Goal::try_from)
            .collect()
    }

    /// `IN_PROGRESS` goals due within `within_days` of `today`, nearest first.
    pub async fn upcoming_deadlines(
        &self,
        user_id: &str,
        within_days: Option<i64>,
        today: NaiveDate,
    ) -> ResultEngine<Vec<Goal>> {
        let days = within_days.unwrap_or(self.config.upcoming_deadline_days);
        if !(1..=self.config.max_upcoming_deadline_days).contains(&days) {
            return Err(EngineError::InvalidArgument(format!(
                "days must be within 1..={}",
                self.config.max_upcoming_deadline_days
            )));
        }
        let cutoff = today + Duration::days(days);
        goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .filter(goals::Column::Status.eq(GoalStatus::InProgress.as_str()))
            .filter(goals::Column::Deadline.lte(cutoff))
            .order_by_asc(goals::Column::Deadline)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Goal::try_from)
            .collect()
    }

    /// Names are unique among the owner's `DRAFT`, `IN_PROGRESS` and `PAUSED` goals.
    async fn ensure_goal_name_free(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .filter(goals::Column::Name.eq(name))
            .filter(goals::Column::Status.is_in(GoalStatus::name_reserving()));
        if let Some(exclude_id) = exclude_id {
            query = query.filter(goals::Column::Id.ne(exclude_id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    async fn contributed_total(&self, db: &DatabaseTransaction, goal_id: Uuid) -> ResultEngine<i64> {
        let total: Option<Option<i64>> = goal_contributions::Entity::find()
            .select_only()
            .column_as(goal_contributions::Column::AmountMinor.sum(), "total")
            .filter(goal_contributions::Column::GoalId.eq(goal_id))
            .into_tuple()
            .one(db)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }

    /// Mark reached milestones as achieved. Achieved milestones never revert.
    async fn sync_milestones(
        &self,
        db: &DatabaseTransaction,
        goal: &Goal,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let reached = goal.whole_percent_reached();
        let result = goal_milestones::Entity::update_many()
            .col_expr(goal_milestones::Column::Achieved, Expr::value(true))
            .col_expr(goal_milestones::Column::AchievedAt, Expr::value(Some(now)))
            .filter(goal_milestones::Column::GoalId.eq(goal.id))
            .filter(goal_milestones::Column::Achieved.eq(false))
            .filter(goal_milestones::Column::Percentage.lte(reached))
            .exec(db)
            .await?;
        if result.rows_affected > 0 {
            tracing::info!(goal_id = %goal.id, reached, milestones = result.rows_affected, "milestones achieved");
        }
        Ok(())
    }
}
