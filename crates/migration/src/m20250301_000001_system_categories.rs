//! Shared, read-only categories every user sees.

use chrono::Utc;
use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    Kind,
    Icon,
    Color,
    ParentId,
    IsSystem,
    IsActive,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

/// (name, kind, icon, color), in display order within each kind.
const SYSTEM_CATEGORIES: &[(&str, &str, &str, &str)] = &[
    ("Salário", "income", "briefcase", "#2E7D32"),
    ("Freelance", "income", "laptop", "#388E3C"),
    ("Investimentos", "income", "trending-up", "#43A047"),
    ("Outras Receitas", "income", "plus-circle", "#66BB6A"),
    ("Alimentação", "expense", "utensils", "#E53935"),
    ("Transporte", "expense", "car", "#FB8C00"),
    ("Moradia", "expense", "home", "#6D4C41"),
    ("Saúde", "expense", "heart", "#D81B60"),
    ("Educação", "expense", "book", "#3949AB"),
    ("Lazer", "expense", "smile", "#8E24AA"),
    ("Outras Despesas", "expense", "minus-circle", "#757575"),
    ("Transferência", "transfer", "repeat", "#1E88E5"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let now = Utc::now();

        let mut insert = Query::insert();
        insert.into_table(Categories::Table).columns([
            Categories::Id,
            Categories::UserId,
            Categories::Name,
            Categories::Kind,
            Categories::Icon,
            Categories::Color,
            Categories::ParentId,
            Categories::IsSystem,
            Categories::IsActive,
            Categories::SortOrder,
            Categories::CreatedAt,
            Categories::UpdatedAt,
        ]);

        let mut previous_kind = "";
        let mut sort_order = 0_i32;
        for (name, kind, icon, color) in SYSTEM_CATEGORIES {
            if *kind == previous_kind {
                sort_order += 1;
            } else {
                previous_kind = kind;
                sort_order = 0;
            }
            insert
                .values([
                    Uuid::new_v4().into(),
                    Option::<String>::None.into(),
                    (*name).into(),
                    (*kind).into(),
                    (*icon).into(),
                    (*color).into(),
                    Option::<Uuid>::None.into(),
                    true.into(),
                    true.into(),
                    sort_order.into(),
                    now.into(),
                    now.into(),
                ])
                .map_err(|err| DbErr::Migration(err.to_string()))?;
        }

        db.execute(db.get_database_backend().build(&insert)).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let delete = Query::delete()
            .from_table(Categories::Table)
            .and_where(Expr::col(Categories::IsSystem).eq(true))
            .and_where(Expr::col(Categories::UserId).is_null())
            .to_owned();
        db.execute(db.get_database_backend().build(&delete)).await?;
        Ok(())
    }
}
