//! Categories API endpoints.

use api_types::category::{
    CategoryCreate, CategoryDetailView, CategoryDisplayView, CategoryListQuery,
    CategoryListResponse, CategoryTreeQuery, CategoryTreeResponse, CategoryTreeView, CategoryType,
    CategoryUpdate, CategoryView, SystemCategoriesQuery, SystemCategoriesResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CategoryKind, CategoryListFilter, CategoryPatch, NewCategory};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn map_kind(kind: CategoryKind) -> CategoryType {
    match kind {
        CategoryKind::Income => CategoryType::Income,
        CategoryKind::Expense => CategoryType::Expense,
        CategoryKind::Transfer => CategoryType::Transfer,
    }
}

pub(crate) fn engine_kind(kind: CategoryType) -> CategoryKind {
    match kind {
        CategoryType::Income => CategoryKind::Income,
        CategoryType::Expense => CategoryKind::Expense,
        CategoryType::Transfer => CategoryKind::Transfer,
    }
}

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        user_id: category.user_id,
        name: category.name,
        kind: map_kind(category.kind),
        icon: category.icon,
        color: category.color,
        parent_id: category.parent_id,
        is_system: category.is_system,
        is_active: category.is_active,
        sort_order: category.sort_order,
        created_at: category.created_at,
        updated_at: category.updated_at,
    }
}

fn map_detail(detail: engine::CategoryDetail) -> CategoryDetailView {
    CategoryDetailView {
        category: map_category(detail.category),
        subcategories_count: detail.subcategories_count,
        parent_name: detail.parent_name,
    }
}

pub(crate) fn map_display(display: engine::CategoryDisplay) -> CategoryDisplayView {
    CategoryDisplayView {
        id: display.id,
        name: display.name,
        icon: display.icon,
        color: display.color,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let filter = CategoryListFilter {
        kind: query.kind.map(engine_kind),
        parent_id: query.parent_id,
        include_system: query.include_system.unwrap_or(true),
        include_subcategories: query.include_subcategories.unwrap_or(false),
    };
    let categories = state
        .engine
        .list_categories(&user.username, &filter)
        .await?
        .into_iter()
        .map(map_detail)
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(
            &user.username,
            NewCategory {
                name: payload.name,
                kind: engine_kind(payload.kind),
                icon: payload.icon,
                color: payload.color,
                parent_id: payload.parent_id,
                sort_order: payload.sort_order.unwrap_or(0),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn tree(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<CategoryTreeQuery>,
) -> Result<Json<CategoryTreeResponse>, ServerError> {
    let categories = state
        .engine
        .category_tree(
            &user.username,
            query.kind.map(engine_kind),
            query.include_system.unwrap_or(true),
        )
        .await?
        .into_iter()
        .map(|node| CategoryTreeView {
            category: map_detail(node.category),
            subcategories: node.subcategories.into_iter().map(map_detail).collect(),
        })
        .collect();

    Ok(Json(CategoryTreeResponse { categories }))
}

pub async fn system(
    State(state): State<ServerState>,
    Query(query): Query<SystemCategoriesQuery>,
) -> Result<Json<SystemCategoriesResponse>, ServerError> {
    let categories = state
        .engine
        .system_categories(query.kind.map(engine_kind))
        .await?
        .into_iter()
        .map(map_category)
        .collect();

    Ok(Json(SystemCategoriesResponse { categories }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<CategoryDetailView>, ServerError> {
    let detail = state.engine.category(&user.username, category_id).await?;
    Ok(Json(map_detail(detail)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .update_category(
            &user.username,
            category_id,
            CategoryPatch {
                name: payload.name,
                icon: payload.icon,
                color: payload.color,
                sort_order: payload.sort_order,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(map_category(category)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_category(&user.username, category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
