use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{budgets, categories, goals, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolve HTTP Basic credentials to an active user and attach it to the
/// request as an `Extension<user::Model>`.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = user::Entity::find_by_id(auth_header.username().to_string())
        .filter(user::Column::Password.eq(auth_header.password()))
        .filter(user::Column::IsActive.eq(true))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to resolve user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let Some(user) = user else {
        tracing::debug!(username = auth_header.username(), "rejected credentials");
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/users/me", get(user::me))
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route("/categories/tree", get(categories::tree))
        .route("/categories/system", get(categories::system))
        .route(
            "/categories/{id}",
            get(categories::get)
                .patch(categories::update)
                .delete(categories::delete),
        )
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/active/summary", get(budgets::active_summaries))
        .route("/budgets/overview", get(budgets::overview))
        .route(
            "/budgets/{id}",
            get(budgets::get)
                .patch(budgets::update)
                .delete(budgets::delete),
        )
        .route("/budgets/{id}/summary", get(budgets::summary))
        .route("/goals", get(goals::list).post(goals::create))
        .route("/goals/summary", get(goals::summary))
        .route("/goals/upcoming", get(goals::upcoming))
        .route(
            "/goals/{id}",
            get(goals::get).patch(goals::update).delete(goals::delete),
        )
        .route(
            "/goals/{id}/contributions",
            axum::routing::post(goals::contribute),
        )
        .route("/goals/{id}/status", put(goals::set_status))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}
