//! Savings goals and their status machine.
//!
//! ```text
//! DRAFT       -> IN_PROGRESS, CANCELLED
//! IN_PROGRESS -> PAUSED, COMPLETED, CANCELLED
//! PAUSED      -> IN_PROGRESS, CANCELLED
//! OVERDUE     -> IN_PROGRESS, CANCELLED
//! COMPLETED   -> (terminal)
//! CANCELLED   -> (terminal)
//! ```
//!
//! Progress metrics are never stored: they are derived from `current_minor`,
//! `target_minor` and the deadline every time a goal is read.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    Draft,
    InProgress,
    Paused,
    Completed,
    Cancelled,
    Overdue,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::InProgress => "IN_PROGRESS",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Overdue => "OVERDUE",
        }
    }

    /// Statuses reachable from `self` in one step.
    pub fn allowed_transitions(self) -> &'static [GoalStatus] {
        match self {
            Self::Draft => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Paused, Self::Completed, Self::Cancelled],
            Self::Paused => &[Self::InProgress, Self::Cancelled],
            Self::Overdue => &[Self::InProgress, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: GoalStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// No outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Statuses that reserve the goal name for the owner.
    pub fn reserves_name(self) -> bool {
        matches!(self, Self::Draft | Self::InProgress | Self::Paused)
    }

    /// Statuses that accept new contributions.
    pub fn accepts_contributions(self) -> bool {
        matches!(self, Self::Draft | Self::InProgress)
    }

    pub(crate) fn name_reserving() -> [&'static str; 3] {
        [
            Self::Draft.as_str(),
            Self::InProgress.as_str(),
            Self::Paused.as_str(),
        ]
    }
}

impl TryFrom<&str> for GoalStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "DRAFT" => Ok(Self::Draft),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "PAUSED" => Ok(Self::Paused),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "OVERDUE" => Ok(Self::Overdue),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid goal status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub target_minor: i64,
    pub current_minor: i64,
    pub deadline: NaiveDate,
    pub status: GoalStatus,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub priority: i32,
    pub is_recurring: bool,
    pub recurrence_day: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub achieved_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
}

/// Derived progress metrics of a goal at a given day.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// `current / target * 100`, clamped to 100.
    pub progress_percentage: f64,
    pub days_remaining: i64,
    pub monthly_contribution_needed_minor: i64,
}

impl Goal {
    pub fn progress_percentage(&self) -> f64 {
        MoneyCents::new(self.current_minor)
            .percent_of(MoneyCents::new(self.target_minor))
            .min(100.0)
    }

    /// Exact `current / target * 100 >= percent`.
    pub fn reaches_percent(&self, percent: i32) -> bool {
        MoneyCents::new(self.current_minor)
            .reaches_percent(MoneyCents::new(self.target_minor), percent)
    }

    /// Whole percentage points saved, rounded down and unclamped.
    pub fn whole_percent_reached(&self) -> i64 {
        MoneyCents::new(self.current_minor).whole_percent_of(MoneyCents::new(self.target_minor))
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.deadline - today).num_days().max(0)
    }

    /// Amount to save per remaining month to reach the target, rounded up to
    /// the cent. Zero once the target is reached or no whole month is left.
    pub fn monthly_contribution_needed(&self, today: NaiveDate) -> i64 {
        let missing = self.target_minor - self.current_minor;
        let months = months_between(today, self.deadline);
        if missing <= 0 || months <= 0 {
            return 0;
        }
        (missing + months - 1) / months
    }

    pub fn progress(&self, today: NaiveDate) -> GoalProgress {
        GoalProgress {
            progress_percentage: self.progress_percentage(),
            days_remaining: self.days_remaining(today),
            monthly_contribution_needed_minor: self.monthly_contribution_needed(today),
        }
    }
}

/// Whole calendar months from `from` to `to` (negative when `to` is earlier).
pub(crate) fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let mut months = i64::from(to.year() - from.year()) * 12
        + (i64::from(to.month()) - i64::from(from.month()));
    if months > 0 && to.day() < from.day() {
        months -= 1;
    }
    months
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub target_minor: i64,
    pub current_minor: i64,
    pub deadline: Date,
    pub status: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub priority: i32,
    pub is_recurring: bool,
    pub recurrence_day: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub achieved_at: Option<DateTimeUtc>,
    pub paused_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::goal_contributions::Entity")]
    Contributions,
    #[sea_orm(has_many = "super::goal_milestones::Entity")]
    Milestones,
}

impl Related<super::goal_contributions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contributions.def()
    }
}

impl Related<super::goal_milestones::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Milestones.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            name: model.name,
            description: model.description,
            target_minor: model.target_minor,
            current_minor: model.current_minor,
            deadline: model.deadline,
            status: GoalStatus::try_from(model.status.as_str())?,
            color: model.color,
            icon: model.icon,
            priority: model.priority,
            is_recurring: model.is_recurring,
            recurrence_day: model.recurrence_day,
            created_at: model.created_at,
            updated_at: model.updated_at,
            achieved_at: model.achieved_at,
            paused_at: model.paused_at,
        })
    }
}
