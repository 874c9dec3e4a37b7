//! Budgets API endpoints.

use api_types::budget::{
    BudgetCreate, BudgetListQuery, BudgetListResponse, BudgetStatus, BudgetSummaryListResponse,
    BudgetSummaryView, BudgetUpdate, BudgetView, BudgetsOverviewView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{BudgetListFilter, BudgetPatch, BudgetPeriod, NewBudget};
use uuid::Uuid;

use crate::{ServerError, categories::map_display, server::ServerState, user};

fn map_budget(budget: engine::Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        category_id: budget.category_id,
        start_date: budget.start_date,
        end_date: budget.end_date,
        limit_minor: budget.limit_minor,
        alert_threshold_1: budget.alert_threshold_1,
        alert_threshold_2: budget.alert_threshold_2,
        alerts_enabled: budget.alerts_enabled,
        is_active: budget.is_active,
        notes: budget.notes,
        created_at: budget.created_at,
        updated_at: budget.updated_at,
    }
}

fn map_status(status: engine::BudgetStatus) -> BudgetStatus {
    match status {
        engine::BudgetStatus::OnTrack => BudgetStatus::OnTrack,
        engine::BudgetStatus::Warning => BudgetStatus::Warning,
        engine::BudgetStatus::Exceeded => BudgetStatus::Exceeded,
    }
}

fn map_summary(summary: engine::BudgetSummary) -> BudgetSummaryView {
    BudgetSummaryView {
        budget: map_budget(summary.budget),
        category: summary.category.map(map_display),
        spent_minor: summary.spent_minor,
        remaining_minor: summary.remaining_minor,
        percentage_used: summary.percentage_used,
        status: map_status(summary.status),
        days_remaining: summary.days_remaining,
    }
}

fn period_of(payload: &BudgetCreate) -> Result<BudgetPeriod, ServerError> {
    match (payload.start_date, payload.end_date, payload.year, payload.month) {
        (Some(start), Some(end), None, None) => Ok(BudgetPeriod::Range { start, end }),
        (None, None, Some(year), Some(month)) => Ok(BudgetPeriod::Month { year, month }),
        _ => Err(ServerError::Generic(
            "provide either start_date and end_date, or year and month".to_string(),
        )),
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetCreate>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let period = period_of(&payload)?;
    let budget = state
        .engine
        .create_budget(
            &user.username,
            NewBudget {
                category_id: payload.category_id,
                limit_minor: payload.limit_minor,
                period,
                alert_threshold_1: payload.alert_threshold_1,
                alert_threshold_2: payload.alert_threshold_2,
                alerts_enabled: payload.alerts_enabled,
                notes: payload.notes,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_budget(budget))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<BudgetListQuery>,
) -> Result<Json<BudgetListResponse>, ServerError> {
    let filter = BudgetListFilter {
        category_id: query.category_id,
        active: query.active,
        limit: query.limit,
        offset: query.offset,
    };
    let budgets = state
        .engine
        .list_budgets(&user.username, &filter, Utc::now().date_naive())
        .await?
        .into_iter()
        .map(map_budget)
        .collect();

    Ok(Json(BudgetListResponse { budgets }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state.engine.budget(&user.username, budget_id).await?;
    Ok(Json(map_budget(budget)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state
        .engine
        .update_budget(
            &user.username,
            budget_id,
            BudgetPatch {
                category_id: payload.category_id,
                limit_minor: payload.limit_minor,
                start_date: payload.start_date,
                end_date: payload.end_date,
                alert_threshold_1: payload.alert_threshold_1,
                alert_threshold_2: payload.alert_threshold_2,
                alerts_enabled: payload.alerts_enabled,
                is_active: payload.is_active,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(Json(map_budget(budget)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(&user.username, budget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<BudgetSummaryView>, ServerError> {
    let summary = state
        .engine
        .budget_summary(&user.username, budget_id, Utc::now().date_naive())
        .await?;
    Ok(Json(map_summary(summary)))
}

pub async fn active_summaries(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<BudgetSummaryListResponse>, ServerError> {
    let summaries = state
        .engine
        .active_budget_summaries(&user.username, Utc::now().date_naive())
        .await?
        .into_iter()
        .map(map_summary)
        .collect();
    Ok(Json(BudgetSummaryListResponse { summaries }))
}

pub async fn overview(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<BudgetsOverviewView>, ServerError> {
    let overview = state
        .engine
        .budgets_overview(&user.username, Utc::now().date_naive())
        .await?;
    Ok(Json(BudgetsOverviewView {
        total_budgets: overview.total_budgets,
        total_limit_minor: overview.total_limit_minor,
        total_spent_minor: overview.total_spent_minor,
        average_percentage: overview.average_percentage,
        exceeded: overview.exceeded,
        warning: overview.warning,
        on_track: overview.on_track,
    }))
}
