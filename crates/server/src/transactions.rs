//! Transaction ledger endpoints.

use api_types::transaction::{
    TransactionCreate, TransactionListQuery, TransactionListResponse, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::{NewTransaction, TransactionListFilter};

use crate::{
    ServerError,
    categories::{engine_kind, map_kind},
    server::ServerState,
    user,
};

fn map_transaction(transaction: engine::Transaction) -> TransactionView {
    TransactionView {
        id: transaction.id,
        category_id: transaction.category_id,
        kind: map_kind(transaction.kind),
        amount_minor: transaction.amount_minor,
        description: transaction.description,
        transaction_date: transaction.transaction_date,
        created_at: transaction.created_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionCreate>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let transaction = state
        .engine
        .record_transaction(
            &user.username,
            NewTransaction {
                category_id: payload.category_id,
                kind: engine_kind(payload.kind),
                amount_minor: payload.amount_minor,
                description: payload.description,
                transaction_date: payload.transaction_date,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_transaction(transaction))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && to < from
    {
        return Err(ServerError::Generic("`to` must not precede `from`".to_string()));
    }
    let filter = TransactionListFilter {
        category_id: query.category_id,
        kind: query.kind.map(engine_kind),
        from: query.from,
        to: query.to,
        limit: query.limit,
        offset: query.offset,
    };
    let transactions = state
        .engine
        .list_transactions(&user.username, &filter)
        .await?
        .into_iter()
        .map(map_transaction)
        .collect();
    Ok(Json(TransactionListResponse { transactions }))
}
