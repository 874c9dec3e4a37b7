use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CategoryKind, EngineError, MoneyCents, ResultEngine, Transaction, transactions,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub category_id: Option<Uuid>,
    pub kind: CategoryKind,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionListFilter {
    pub category_id: Option<Uuid>,
    pub kind: Option<CategoryKind>,
    /// Inclusive.
    pub from: Option<NaiveDate>,
    /// Inclusive.
    pub to: Option<NaiveDate>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Engine {
    /// Record a ledger entry. A category, when given, must be visible to the
    /// user and classify the same kind of transaction.
    pub async fn record_transaction(
        &self,
        user_id: &str,
        new_transaction: NewTransaction,
    ) -> ResultEngine<Transaction> {
        if !MoneyCents::new(new_transaction.amount_minor).is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            if let Some(category_id) = new_transaction.category_id {
                let category = self
                    .require_category_visible(&db_tx, category_id, user_id)
                    .await?;
                if category.kind != new_transaction.kind.as_str() {
                    return Err(EngineError::InvalidCategory(format!(
                        "category type {} does not match transaction type {}",
                        category.kind,
                        new_transaction.kind.as_str()
                    )));
                }
            }

            let active = transactions::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id.to_string()),
                category_id: ActiveValue::Set(new_transaction.category_id),
                kind: ActiveValue::Set(new_transaction.kind.as_str().to_string()),
                amount_minor: ActiveValue::Set(new_transaction.amount_minor),
                description: ActiveValue::Set(normalize_optional_text(
                    new_transaction.description.as_deref(),
                )),
                transaction_date: ActiveValue::Set(new_transaction.transaction_date),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let transaction = Transaction::try_from(active.insert(&db_tx).await?)?;
            tracing::info!(
                user_id,
                transaction_id = %transaction.id,
                kind = transaction.kind.as_str(),
                amount_minor = transaction.amount_minor,
                "transaction recorded"
            );
            Ok(transaction)
        })
    }

    /// List the user's transactions, newest first.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.to_string()));
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::TransactionDate.lte(to));
        }
        query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(self.config.page_size(filter.limit))
            .offset(filter.offset.unwrap_or(0))
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }
}
