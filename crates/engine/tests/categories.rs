mod common;

use engine::{
    BudgetPeriod, CategoryKind, CategoryListFilter, CategoryPatch, EngineError, ErrorKind,
    NewBudget, NewCategory, NewTransaction,
};

use common::{date, engine_with_db, expense_category, new_category};

fn child(name: &str, kind: CategoryKind, parent_id: uuid::Uuid) -> NewCategory {
    NewCategory {
        parent_id: Some(parent_id),
        ..new_category(name, kind)
    }
}

#[tokio::test]
async fn subcategory_must_share_kind_and_stay_two_levels_deep() {
    let (engine, _db) = engine_with_db().await;
    let food = expense_category(&engine, "alice", "Food").await;

    let groceries = engine
        .create_category("alice", child("Groceries", CategoryKind::Expense, food.id))
        .await
        .unwrap();
    assert_eq!(groceries.parent_id, Some(food.id));
    assert!(!groceries.is_system);

    let err = engine
        .create_category("alice", child("Bonus", CategoryKind::Income, food.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = engine
        .create_category("alice", child("Fruit", CategoryKind::Expense, groceries.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));
}

#[tokio::test]
async fn subcategory_of_a_system_category_is_allowed() {
    let (engine, _db) = engine_with_db().await;
    let system = engine
        .system_categories(Some(CategoryKind::Expense))
        .await
        .unwrap();
    let transport = system.iter().find(|c| c.name == "Transporte").unwrap();

    let fuel = engine
        .create_category("alice", child("Fuel", CategoryKind::Expense, transport.id))
        .await
        .unwrap();
    assert_eq!(fuel.user_id.as_deref(), Some("alice"));
}

#[tokio::test]
async fn parent_of_another_user_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let bobs = expense_category(&engine, "bob", "Hobbies").await;

    let err = engine
        .create_category("alice", child("Models", CategoryKind::Expense, bobs.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn names_are_unique_per_owner_kind_and_parent() {
    let (engine, _db) = engine_with_db().await;
    let food = expense_category(&engine, "alice", "Food").await;

    let err = engine
        .create_category("alice", new_category("Food", CategoryKind::Expense))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Food".to_string()));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    engine
        .create_category("alice", new_category("Food", CategoryKind::Income))
        .await
        .unwrap();
    engine
        .create_category("alice", child("Food", CategoryKind::Expense, food.id))
        .await
        .unwrap();
    expense_category(&engine, "bob", "Food").await;
}

#[tokio::test]
async fn rename_checks_uniqueness() {
    let (engine, _db) = engine_with_db().await;
    expense_category(&engine, "alice", "Food").await;
    let fun = expense_category(&engine, "alice", "Fun").await;

    let err = engine
        .update_category(
            "alice",
            fun.id,
            CategoryPatch {
                name: Some("Food".to_string()),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let renamed = engine
        .update_category(
            "alice",
            fun.id,
            CategoryPatch {
                name: Some("  Leisure ".to_string()),
                color: Some(Some("#00FF00".to_string())),
                sort_order: Some(5),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Leisure");
    assert_eq!(renamed.color.as_deref(), Some("#00FF00"));
    assert_eq!(renamed.sort_order, 5);
}

#[tokio::test]
async fn system_categories_are_read_only() {
    let (engine, _db) = engine_with_db().await;
    let system = engine.system_categories(None).await.unwrap();
    let salary = system.iter().find(|c| c.name == "Salário").unwrap();

    let err = engine
        .update_category(
            "alice",
            salary.id,
            CategoryPatch {
                name: Some("Paycheck".to_string()),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = engine.delete_category("alice", salary.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn foreign_or_missing_categories_are_not_found() {
    let (engine, _db) = engine_with_db().await;
    let bobs = expense_category(&engine, "bob", "Garden").await;

    let err = engine.delete_category("alice", bobs.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = engine.category("alice", bobs.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = engine
        .delete_category("alice", uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_is_blocked_by_active_subcategories() {
    let (engine, _db) = engine_with_db().await;
    let food = expense_category(&engine, "alice", "Food").await;
    let groceries = engine
        .create_category("alice", child("Groceries", CategoryKind::Expense, food.id))
        .await
        .unwrap();

    let err = engine.delete_category("alice", food.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    engine.delete_category("alice", groceries.id).await.unwrap();
    engine.delete_category("alice", food.id).await.unwrap();

    let err = engine.category("alice", food.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_is_blocked_by_budgets() {
    let (engine, _db) = engine_with_db().await;
    let food = expense_category(&engine, "alice", "Food").await;
    engine
        .create_budget(
            "alice",
            NewBudget {
                category_id: food.id,
                limit_minor: 100_000,
                period: BudgetPeriod::Month {
                    year: 2025,
                    month: 1,
                },
                alert_threshold_1: None,
                alert_threshold_2: None,
                alerts_enabled: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = engine.delete_category("alice", food.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = engine
        .update_category(
            "alice",
            food.id,
            CategoryPatch {
                is_active: Some(false),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn delete_is_blocked_by_transactions() {
    let (engine, _db) = engine_with_db().await;
    let food = expense_category(&engine, "alice", "Food").await;
    engine
        .record_transaction(
            "alice",
            NewTransaction {
                category_id: Some(food.id),
                kind: CategoryKind::Expense,
                amount_minor: 4_250,
                description: None,
                transaction_date: date(2025, 1, 10),
            },
        )
        .await
        .unwrap();

    let err = engine.delete_category("alice", food.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert!(engine.category("alice", food.id).await.is_ok());
}

#[tokio::test]
async fn reactivation_rechecks_uniqueness() {
    let (engine, _db) = engine_with_db().await;
    let first = expense_category(&engine, "alice", "Pets").await;
    engine.delete_category("alice", first.id).await.unwrap();
    expense_category(&engine, "alice", "Pets").await;

    let err = engine
        .update_category(
            "alice",
            first.id,
            CategoryPatch {
                is_active: Some(true),
                ..CategoryPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn listing_defaults_to_top_level_visible_categories() {
    let (engine, _db) = engine_with_db().await;
    let food = expense_category(&engine, "alice", "Food").await;
    engine
        .create_category("alice", child("Groceries", CategoryKind::Expense, food.id))
        .await
        .unwrap();
    expense_category(&engine, "bob", "Secret").await;

    let own_only = engine
        .list_categories(
            "alice",
            &CategoryListFilter {
                include_system: false,
                ..CategoryListFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(own_only.len(), 1);
    assert_eq!(own_only[0].category.name, "Food");
    assert_eq!(own_only[0].subcategories_count, 1);

    let with_system = engine
        .list_categories(
            "alice",
            &CategoryListFilter {
                kind: Some(CategoryKind::Expense),
                ..CategoryListFilter::default()
            },
        )
        .await
        .unwrap();
    assert!(with_system.iter().any(|d| d.category.is_system));
    assert!(with_system.iter().all(|d| d.category.parent_id.is_none()));
    assert!(with_system.iter().all(|d| d.category.name != "Secret"));

    let children = engine
        .list_categories(
            "alice",
            &CategoryListFilter {
                parent_id: Some(food.id),
                ..CategoryListFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].parent_name.as_deref(), Some("Food"));

    let flat = engine
        .list_categories(
            "alice",
            &CategoryListFilter {
                include_system: false,
                include_subcategories: true,
                ..CategoryListFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(flat.len(), 2);
}

#[tokio::test]
async fn tree_nests_subcategories_under_their_parent() {
    let (engine, _db) = engine_with_db().await;
    let food = expense_category(&engine, "alice", "Food").await;
    for name in ["Restaurants", "Groceries"] {
        engine
            .create_category("alice", child(name, CategoryKind::Expense, food.id))
            .await
            .unwrap();
    }

    let tree = engine
        .category_tree("alice", Some(CategoryKind::Expense), false)
        .await
        .unwrap();
    assert_eq!(tree.len(), 1);
    let names: Vec<_> = tree[0]
        .subcategories
        .iter()
        .map(|d| d.category.name.as_str())
        .collect();
    assert_eq!(names, ["Groceries", "Restaurants"]);
    assert_eq!(tree[0].category.subcategories_count, 2);
}

#[tokio::test]
async fn seeded_system_categories_are_ordered() {
    let (engine, _db) = engine_with_db().await;
    let income = engine
        .system_categories(Some(CategoryKind::Income))
        .await
        .unwrap();
    let names: Vec<_> = income.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["Salário", "Freelance", "Investimentos", "Outras Receitas"]
    );
    assert!(income.iter().all(|c| c.is_system && c.user_id.is_none()));
}

#[tokio::test]
async fn invalid_display_fields_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_category("alice", new_category("F", CategoryKind::Expense))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));

    let err = engine
        .create_category(
            "alice",
            NewCategory {
                color: Some("red".to_string()),
                ..new_category("Food", CategoryKind::Expense)
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = engine
        .create_category(
            "alice",
            NewCategory {
                sort_order: 1_000,
                ..new_category("Food", CategoryKind::Expense)
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn system_category_creation_is_shared() {
    let (engine, _db) = engine_with_db().await;
    let pets = engine
        .create_system_category(NewCategory {
            sort_order: 50,
            ..new_category("Pets", CategoryKind::Expense)
        })
        .await
        .unwrap();
    assert!(pets.is_system);
    let detail = engine.category("bob", pets.id).await.unwrap();
    assert_eq!(detail.category.name, "Pets");

    let err = engine
        .create_system_category(new_category("Pets", CategoryKind::Expense))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}
