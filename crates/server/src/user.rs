//! Users resolved by the identity middleware.

use api_types::user::UserView;
use axum::{Extension, Json};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// The authenticated caller.
pub async fn me(Extension(user): Extension<Model>) -> Json<UserView> {
    Json(UserView {
        username: user.username,
    })
}
