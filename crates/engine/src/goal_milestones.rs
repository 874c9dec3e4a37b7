//! Fixed progress checkpoints created with every goal.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `(percentage, title, description)` of the checkpoints every goal starts with.
pub(crate) const DEFAULT_MILESTONES: [(i32, &str, &str); 4] = [
    (25, "Um Quarto do Caminho!", "Você está progredindo bem!"),
    (50, "Metade Alcançada!", "Estamos na metade da jornada!"),
    (75, "Quase Lá!", "Falta pouco para conquistar sua meta!"),
    (100, "Meta Conquistada!", "Parabéns! Você conseguiu!"),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub percentage: i32,
    pub title: String,
    pub description: Option<String>,
    pub achieved: bool,
    pub achieved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goal_milestones")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub goal_id: Uuid,
    pub percentage: i32,
    pub title: String,
    pub description: Option<String>,
    pub achieved: bool,
    pub achieved_at: Option<DateTimeUtc>,
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

impl From<Model> for Milestone {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            goal_id: model.goal_id,
            percentage: model.percentage,
            title: model.title,
            description: model.description,
            achieved: model.achieved,
            achieved_at: model.achieved_at,
            created_at: model.created_at,
        }
    }
}
