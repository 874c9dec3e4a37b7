use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Category, CategoryKind, EngineError, ResultEngine, budgets, categories, transactions,
    util::{normalize_name, validate_color, validate_icon},
};

use super::{Engine, with_tx};

const MAX_SORT_ORDER: i32 = 999;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
}

/// Fields to change on a category. `None` leaves the field untouched; for
/// nullable fields `Some(None)` clears the value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryListFilter {
    pub kind: Option<CategoryKind>,
    /// Only children of this category.
    pub parent_id: Option<Uuid>,
    pub include_system: bool,
    /// Without a `parent_id`, also return subcategories instead of top level only.
    pub include_subcategories: bool,
}

impl Default for CategoryListFilter {
    fn default() -> Self {
        Self {
            kind: None,
            parent_id: None,
            include_system: true,
            include_subcategories: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDetail {
    pub category: Category,
    /// Active children only.
    pub subcategories_count: u64,
    pub parent_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTreeNode {
    pub category: CategoryDetail,
    pub subcategories: Vec<CategoryDetail>,
}

fn validate_sort_order(sort_order: i32) -> ResultEngine<()> {
    if !(0..=MAX_SORT_ORDER).contains(&sort_order) {
        return Err(EngineError::InvalidArgument(format!(
            "sort_order must be within 0..={MAX_SORT_ORDER}"
        )));
    }
    Ok(())
}

impl Engine {
    /// Create a category owned by `user_id`.
    ///
    /// A parent must be visible to the user, of the same kind and top level.
    pub async fn create_category(
        &self,
        user_id: &str,
        new_category: NewCategory,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let category = self
                .insert_category(&db_tx, Some(user_id), new_category)
                .await?;
            tracing::info!(user_id, category_id = %category.id, kind = category.kind.as_str(), "category created");
            Ok(category)
        })
    }

    /// Create a category shared read-only with every user.
    pub async fn create_system_category(&self, new_category: NewCategory) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let category = self.insert_category(&db_tx, None, new_category).await?;
            tracing::info!(category_id = %category.id, name = %category.name, "system category created");
            Ok(category)
        })
    }

    pub async fn update_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_category_writable(&db_tx, category_id, user_id)
                .await?;

            let name = patch
                .name
                .as_deref()
                .map(|name| normalize_name(name, "category", 2, 100))
                .transpose()?;
            let icon = patch
                .icon
                .as_ref()
                .map(|icon| validate_icon(icon.as_deref()))
                .transpose()?;
            let color = patch
                .color
                .as_ref()
                .map(|color| validate_color(color.as_deref()))
                .transpose()?;
            if let Some(sort_order) = patch.sort_order {
                validate_sort_order(sort_order)?;
            }

            let was_active = model.is_active;
            let will_be_active = patch.is_active.unwrap_or(was_active);
            let renamed = name.as_ref().is_some_and(|name| *name != model.name);

            if was_active && !will_be_active {
                self.ensure_category_removable(&db_tx, category_id).await?;
            }
            if will_be_active && (renamed || !was_active) {
                let kind = CategoryKind::try_from(model.kind.as_str())?;
                let target_name = name.clone().unwrap_or_else(|| model.name.clone());
                self.ensure_category_unique(
                    &db_tx,
                    Some(user_id),
                    &target_name,
                    kind,
                    model.parent_id,
                    Some(category_id),
                )
                .await?;
            }
            if will_be_active
                && !was_active
                && let Some(parent_id) = model.parent_id
            {
                match self.require_category_visible(&db_tx, parent_id, user_id).await {
                    Err(EngineError::KeyNotFound(_)) => {
                        return Err(EngineError::InvalidCategory(
                            "parent category is not active".to_string(),
                        ));
                    }
                    other => {
                        other?;
                    }
                }
            }

            let mut active: categories::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(icon) = icon {
                active.icon = ActiveValue::Set(icon);
            }
            if let Some(color) = color {
                active.color = ActiveValue::Set(color);
            }
            if let Some(sort_order) = patch.sort_order {
                active.sort_order = ActiveValue::Set(sort_order);
            }
            active.is_active = ActiveValue::Set(will_be_active);
            active.updated_at = ActiveValue::Set(Utc::now());
            let updated = active.update(&db_tx).await?;

            tracing::info!(user_id, category_id = %category_id, "category updated");
            Category::try_from(updated)
        })
    }

    /// Soft delete a category.
    ///
    /// Refused while it has active subcategories or is referenced by a
    /// transaction or a budget.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_category_writable(&db_tx, category_id, user_id)
                .await?;
            if !model.is_active {
                return Err(EngineError::KeyNotFound("category not exists".to_string()));
            }
            self.ensure_category_removable(&db_tx, category_id).await?;

            let mut active: categories::ActiveModel = model.into();
            active.is_active = ActiveValue::Set(false);
            active.updated_at = ActiveValue::Set(Utc::now());
            active.update(&db_tx).await?;

            tracing::info!(user_id, category_id = %category_id, "category deleted");
            Ok(())
        })
    }

    /// Return a category visible to `user_id`.
    pub async fn category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<CategoryDetail> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_category_visible(&db_tx, category_id, user_id)
                .await?;
            self.category_detail(&db_tx, model).await
        })
    }

    /// List active visible categories ordered by `(sort_order, name)`.
    pub async fn list_categories(
        &self,
        user_id: &str,
        filter: &CategoryListFilter,
    ) -> ResultEngine<Vec<CategoryDetail>> {
        with_tx!(self, |db_tx| {
            let models = self.visible_categories(&db_tx, user_id, filter).await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(self.category_detail(&db_tx, model).await?);
            }
            Ok(out)
        })
    }

    /// Top-level categories, each with its visible subcategories.
    pub async fn category_tree(
        &self,
        user_id: &str,
        kind: Option<CategoryKind>,
        include_system: bool,
    ) -> ResultEngine<Vec<CategoryTreeNode>> {
        with_tx!(self, |db_tx| {
            let filter = CategoryListFilter {
                kind,
                parent_id: None,
                include_system,
                include_subcategories: true,
            };
            let models = self.visible_categories(&db_tx, user_id, &filter).await?;
            let names: HashMap<Uuid, String> =
                models.iter().map(|m| (m.id, m.name.clone())).collect();

            let mut roots = Vec::new();
            let mut children: HashMap<Uuid, Vec<categories::Model>> = HashMap::new();
            for model in models {
                match model.parent_id {
                    Some(parent_id) => children.entry(parent_id).or_default().push(model),
                    None => roots.push(model),
                }
            }

            let mut tree = Vec::with_capacity(roots.len());
            for root in roots {
                let subs = children.remove(&root.id).unwrap_or_default();
                let subcategories = subs
                    .into_iter()
                    .map(|sub| {
                        let parent_name = sub.parent_id.and_then(|id| names.get(&id).cloned());
                        Ok(CategoryDetail {
                            category: Category::try_from(sub)?,
                            subcategories_count: 0,
                            parent_name,
                        })
                    })
                    .collect::<ResultEngine<Vec<_>>>()?;
                let category = self.category_detail(&db_tx, root).await?;
                tree.push(CategoryTreeNode {
                    category,
                    subcategories,
                });
            }
            Ok(tree)
        })
    }

    /// Active system categories ordered by `(sort_order, name)`.
    pub async fn system_categories(
        &self,
        kind: Option<CategoryKind>,
    ) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::IsSystem.eq(true))
            .filter(categories::Column::IsActive.eq(true));
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        query
            .order_by_asc(categories::Column::SortOrder)
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    async fn insert_category(
        &self,
        db: &DatabaseTransaction,
        owner: Option<&str>,
        new_category: NewCategory,
    ) -> ResultEngine<Category> {
        let name = normalize_name(&new_category.name, "category", 2, 100)?;
        let icon = validate_icon(new_category.icon.as_deref())?;
        let color = validate_color(new_category.color.as_deref())?;
        validate_sort_order(new_category.sort_order)?;

        self.ensure_category_unique(
            db,
            owner,
            &name,
            new_category.kind,
            new_category.parent_id,
            None,
        )
        .await?;

        if let Some(parent_id) = new_category.parent_id {
            let parent = match owner {
                Some(user_id) => self.require_category_visible(db, parent_id, user_id).await?,
                None => categories::Entity::find_by_id(parent_id)
                    .filter(categories::Column::IsSystem.eq(true))
                    .filter(categories::Column::IsActive.eq(true))
                    .one(db)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?,
            };
            if parent.kind != new_category.kind.as_str() {
                return Err(EngineError::InvalidCategory(
                    "parent category must have the same type".to_string(),
                ));
            }
            if parent.parent_id.is_some() {
                return Err(EngineError::InvalidCategory(
                    "subcategories cannot have subcategories (max depth 2)".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let active = categories::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(owner.map(ToString::to_string)),
            name: ActiveValue::Set(name),
            kind: ActiveValue::Set(new_category.kind.as_str().to_string()),
            icon: ActiveValue::Set(icon),
            color: ActiveValue::Set(color),
            parent_id: ActiveValue::Set(new_category.parent_id),
            is_system: ActiveValue::Set(owner.is_none()),
            is_active: ActiveValue::Set(true),
            sort_order: ActiveValue::Set(new_category.sort_order),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        Category::try_from(active.insert(db).await?)
    }

    /// `(owner, name, kind, parent)` is unique among active categories.
    async fn ensure_category_unique(
        &self,
        db: &DatabaseTransaction,
        owner: Option<&str>,
        name: &str,
        kind: CategoryKind,
        parent_id: Option<Uuid>,
        exclude_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::IsActive.eq(true));
        query = match owner {
            Some(user_id) => query.filter(categories::Column::UserId.eq(user_id)),
            None => query.filter(categories::Column::UserId.is_null()),
        };
        query = match parent_id {
            Some(parent_id) => query.filter(categories::Column::ParentId.eq(parent_id)),
            None => query.filter(categories::Column::ParentId.is_null()),
        };
        if let Some(exclude_id) = exclude_id {
            query = query.filter(categories::Column::Id.ne(exclude_id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    async fn ensure_category_removable(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<()> {
        if self.count_active_subcategories(db, category_id).await? > 0 {
            return Err(EngineError::Conflict(
                "category has active subcategories".to_string(),
            ));
        }
        let transaction_refs = transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(category_id))
            .count(db)
            .await?;
        let budget_refs = budgets::Entity::find()
            .filter(budgets::Column::CategoryId.eq(category_id))
            .count(db)
            .await?;
        if transaction_refs > 0 || budget_refs > 0 {
            return Err(EngineError::Conflict(
                "category is used by transactions or budgets".to_string(),
            ));
        }
        Ok(())
    }

    async fn count_active_subcategories(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<u64> {
        categories::Entity::find()
            .filter(categories::Column::ParentId.eq(category_id))
            .filter(categories::Column::IsActive.eq(true))
            .count(db)
            .await
            .map_err(Into::into)
    }

    async fn visible_categories(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        filter: &CategoryListFilter,
    ) -> ResultEngine<Vec<categories::Model>> {
        let mut owners = Condition::any().add(categories::Column::UserId.eq(user_id));
        if filter.include_system {
            owners = owners.add(categories::Column::IsSystem.eq(true));
        }
        let mut query = categories::Entity::find()
            .filter(owners)
            .filter(categories::Column::IsActive.eq(true));
        if let Some(kind) = filter.kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        if let Some(parent_id) = filter.parent_id {
            query = query.filter(categories::Column::ParentId.eq(parent_id));
        } else if !filter.include_subcategories {
            query = query.filter(categories::Column::ParentId.is_null());
        }
        query
            .order_by_asc(categories::Column::SortOrder)
            .order_by_asc(categories::Column::Name)
            .all(db)
            .await
            .map_err(Into::into)
    }

    async fn category_detail(
        &self,
        db: &DatabaseTransaction,
        model: categories::Model,
    ) -> ResultEngine<CategoryDetail> {
        let subcategories_count = self.count_active_subcategories(db, model.id).await?;
        let parent_name = match model.parent_id {
            Some(parent_id) => categories::Entity::find_by_id(parent_id)
                .one(db)
                .await?
                .map(|parent| parent.name),
            None => None,
        };
        Ok(CategoryDetail {
            category: Category::try_from(model)?,
            subcategories_count,
            parent_name,
        })
    }
}
