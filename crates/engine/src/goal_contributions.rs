//! Append-only ledger of amounts saved towards a goal.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionKind {
    #[default]
    Manual,
    Automatic,
    Transaction,
    Recurring,
}

impl ContributionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Automatic => "AUTOMATIC",
            Self::Transaction => "TRANSACTION",
            Self::Recurring => "RECURRING",
        }
    }
}

impl TryFrom<&str> for ContributionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "MANUAL" => Ok(Self::Manual),
            "AUTOMATIC" => Ok(Self::Automatic),
            "TRANSACTION" => Ok(Self::Transaction),
            "RECURRING" => Ok(Self::Recurring),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid contribution type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub amount_minor: i64,
    pub kind: ContributionKind,
    pub description: Option<String>,
    pub contribution_date: NaiveDate,
    pub is_recurring: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goal_contributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub goal_id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub amount_minor: i64,
    pub kind: String,
    pub description: Option<String>,
    pub contribution_date: Date,
    pub is_recurring: bool,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goals::Entity",
        from = "Column::GoalId",
        to = "super::goals::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Goal,
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Contribution {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            goal_id: model.goal_id,
            transaction_id: model.transaction_id,
            amount_minor: model.amount_minor,
            kind: ContributionKind::try_from(model.kind.as_str())?,
            description: model.description,
            contribution_date: model.contribution_date,
            is_recurring: model.is_recurring,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
