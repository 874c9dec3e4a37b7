use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, budgets, categories, goals, transactions};

use super::Engine;

/// Generates a `require_*_owned` lookup for an entity scoped by `user_id`.
///
/// Rows owned by someone else are reported exactly like missing ones.
macro_rules! impl_require_owned {
    ($require_fn:ident, $entity:path, $user_col:expr, $model:path, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
            user_id: &str,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .filter($user_col.eq(user_id.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_owned!(
        require_budget_owned,
        budgets::Entity,
        budgets::Column::UserId,
        budgets::Model,
        "budget not exists"
    );

    impl_require_owned!(
        require_goal_owned,
        goals::Entity,
        goals::Column::UserId,
        goals::Model,
        "goal not exists"
    );

    impl_require_owned!(
        require_transaction_owned,
        transactions::Entity,
        transactions::Column::UserId,
        transactions::Model,
        "transaction not exists"
    );

    /// Active and either owned by `user_id` or a system category.
    pub(super) async fn require_category_visible(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<categories::Model> {
        let model = categories::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        if !model.is_visible_to(user_id) {
            return Err(EngineError::KeyNotFound("category not exists".to_string()));
        }
        Ok(model)
    }

    /// Category the caller may mutate, active or not.
    ///
    /// Absent is `KeyNotFound`, system is `Forbidden`, someone else's is
    /// `KeyNotFound` again.
    pub(super) async fn require_category_writable(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<categories::Model> {
        let model = categories::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        if model.is_system {
            return Err(EngineError::Forbidden(
                "system categories are read-only".to_string(),
            ));
        }
        if model.user_id.as_deref() != Some(user_id) {
            return Err(EngineError::KeyNotFound("category not exists".to_string()));
        }
        Ok(model)
    }

    /// Goals may only point at an active category the caller owns.
    pub(super) async fn require_goal_category(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id.to_string()))
            .filter(categories::Column::IsActive.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::InvalidCategory("invalid category".to_string()))
    }
}
