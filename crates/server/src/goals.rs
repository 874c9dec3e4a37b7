//! Goals API endpoints.

use api_types::goal::{
    ContributionCreate, ContributionType, ContributionView, GoalCreate, GoalDetailView,
    GoalListQuery, GoalListResponse, GoalStatus, GoalStatusUpdate, GoalSummaryView, GoalUpdate,
    GoalView, MilestoneView, UpcomingQuery,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use engine::{ContributionKind, GoalListFilter, GoalPatch, GoalProgress, NewContribution, NewGoal};
use uuid::Uuid;

use crate::{ServerError, categories::map_display, server::ServerState, user};

fn map_status(status: engine::GoalStatus) -> GoalStatus {
    match status {
        engine::GoalStatus::Draft => GoalStatus::Draft,
        engine::GoalStatus::InProgress => GoalStatus::InProgress,
        engine::GoalStatus::Paused => GoalStatus::Paused,
        engine::GoalStatus::Completed => GoalStatus::Completed,
        engine::GoalStatus::Cancelled => GoalStatus::Cancelled,
        engine::GoalStatus::Overdue => GoalStatus::Overdue,
    }
}

fn engine_status(status: GoalStatus) -> engine::GoalStatus {
    match status {
        GoalStatus::Draft => engine::GoalStatus::Draft,
        GoalStatus::InProgress => engine::GoalStatus::InProgress,
        GoalStatus::Paused => engine::GoalStatus::Paused,
        GoalStatus::Completed => engine::GoalStatus::Completed,
        GoalStatus::Cancelled => engine::GoalStatus::Cancelled,
        GoalStatus::Overdue => engine::GoalStatus::Overdue,
    }
}

fn map_contribution_kind(kind: ContributionKind) -> ContributionType {
    match kind {
        ContributionKind::Manual => ContributionType::Manual,
        ContributionKind::Automatic => ContributionType::Automatic,
        ContributionKind::Transaction => ContributionType::Transaction,
        ContributionKind::Recurring => ContributionType::Recurring,
    }
}

fn engine_contribution_kind(kind: ContributionType) -> ContributionKind {
    match kind {
        ContributionType::Manual => ContributionKind::Manual,
        ContributionType::Automatic => ContributionKind::Automatic,
        ContributionType::Transaction => ContributionKind::Transaction,
        ContributionType::Recurring => ContributionKind::Recurring,
    }
}

fn map_goal(goal: engine::Goal, progress: GoalProgress) -> GoalView {
    GoalView {
        id: goal.id,
        category_id: goal.category_id,
        name: goal.name,
        description: goal.description,
        target_minor: goal.target_minor,
        current_minor: goal.current_minor,
        deadline: goal.deadline,
        status: map_status(goal.status),
        color: goal.color,
        icon: goal.icon,
        priority: goal.priority,
        is_recurring: goal.is_recurring,
        recurrence_day: goal.recurrence_day,
        created_at: goal.created_at,
        updated_at: goal.updated_at,
        achieved_at: goal.achieved_at,
        paused_at: goal.paused_at,
        progress_percentage: progress.progress_percentage,
        days_remaining: progress.days_remaining,
        monthly_contribution_needed_minor: progress.monthly_contribution_needed_minor,
    }
}

fn goal_view(goal: engine::Goal, today: NaiveDate) -> GoalView {
    let progress = goal.progress(today);
    map_goal(goal, progress)
}

fn map_contribution(contribution: engine::Contribution) -> ContributionView {
    ContributionView {
        id: contribution.id,
        goal_id: contribution.goal_id,
        transaction_id: contribution.transaction_id,
        amount_minor: contribution.amount_minor,
        kind: map_contribution_kind(contribution.kind),
        description: contribution.description,
        contribution_date: contribution.contribution_date,
        is_recurring: contribution.is_recurring,
        created_by: contribution.created_by,
        created_at: contribution.created_at,
    }
}

fn map_milestone(milestone: engine::Milestone) -> MilestoneView {
    MilestoneView {
        id: milestone.id,
        percentage: milestone.percentage,
        title: milestone.title,
        description: milestone.description,
        achieved: milestone.achieved,
        achieved_at: milestone.achieved_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalCreate>,
) -> Result<(StatusCode, Json<GoalView>), ServerError> {
    let now = Utc::now();
    let goal = state
        .engine
        .create_goal(
            &user.username,
            NewGoal {
                name: payload.name,
                description: payload.description,
                target_minor: payload.target_minor,
                deadline: payload.deadline,
                category_id: payload.category_id,
                color: payload.color,
                icon: payload.icon,
                priority: payload.priority,
                is_recurring: payload.is_recurring.unwrap_or(false),
                recurrence_day: payload.recurrence_day,
            },
            now,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(goal_view(goal, now.date_naive())),
    ))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<GoalListQuery>,
) -> Result<Json<GoalListResponse>, ServerError> {
    let filter = GoalListFilter {
        status: query.status.map(engine_status),
        limit: query.limit,
        offset: query.offset,
    };
    let today = Utc::now().date_naive();
    let goals = state
        .engine
        .list_goals(&user.username, &filter)
        .await?
        .into_iter()
        .map(|goal| goal_view(goal, today))
        .collect();
    Ok(Json(GoalListResponse { goals }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalDetailView>, ServerError> {
    let detail = state
        .engine
        .goal(&user.username, goal_id, Utc::now().date_naive())
        .await?;
    Ok(Json(GoalDetailView {
        goal: map_goal(detail.goal, detail.progress),
        category: detail.category.map(map_display),
        contributions: detail
            .contributions
            .into_iter()
            .map(map_contribution)
            .collect(),
        milestones: detail.milestones.into_iter().map(map_milestone).collect(),
    }))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<GoalView>, ServerError> {
    let now = Utc::now();
    let goal = state
        .engine
        .update_goal(
            &user.username,
            goal_id,
            GoalPatch {
                name: payload.name,
                description: payload.description,
                target_minor: payload.target_minor,
                deadline: payload.deadline,
                category_id: payload.category_id,
                status: payload.status.map(engine_status),
                color: payload.color,
                icon: payload.icon,
                priority: payload.priority,
                is_recurring: payload.is_recurring,
                recurrence_day: payload.recurrence_day,
            },
            now,
        )
        .await?;
    Ok(Json(goal_view(goal, now.date_naive())))
}

pub async fn set_status(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalStatusUpdate>,
) -> Result<Json<GoalView>, ServerError> {
    let now = Utc::now();
    let goal = state
        .engine
        .set_goal_status(&user.username, goal_id, engine_status(payload.status), now)
        .await?;
    Ok(Json(goal_view(goal, now.date_naive())))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_goal(&user.username, goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn contribute(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<ContributionCreate>,
) -> Result<(StatusCode, Json<ContributionView>), ServerError> {
    let contribution = state
        .engine
        .add_contribution(
            &user.username,
            goal_id,
            NewContribution {
                amount_minor: payload.amount_minor,
                kind: payload
                    .kind
                    .map(engine_contribution_kind)
                    .unwrap_or_default(),
                description: payload.description,
                contribution_date: payload.contribution_date,
                transaction_id: payload.transaction_id,
                is_recurring: payload.is_recurring.unwrap_or(false),
            },
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_contribution(contribution))))
}

pub async fn summary(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<GoalSummaryView>, ServerError> {
    let summary = state.engine.goal_summary(&user.username).await?;
    Ok(Json(GoalSummaryView {
        total_goals: summary.total_goals,
        active_goals: summary.active_goals,
        completed_goals: summary.completed_goals,
        total_saved_minor: summary.total_saved_minor,
        total_target_minor: summary.total_target_minor,
        overall_progress: summary.overall_progress,
        goals_on_track: summary.goals_on_track,
        goals_behind: summary.goals_behind,
        goals_ahead: summary.goals_ahead,
    }))
}

pub async fn upcoming(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<GoalListResponse>, ServerError> {
    let today = Utc::now().date_naive();
    let goals = state
        .engine
        .upcoming_deadlines(&user.username, query.days, today)
        .await?
        .into_iter()
        .map(|goal| goal_view(goal, today))
        .collect();
    Ok(Json(GoalListResponse { goals }))
}
