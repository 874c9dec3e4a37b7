mod common;

use chrono::Duration;
use engine::{
    CategoryKind, ContributionKind, EngineError, ErrorKind, GoalListFilter, GoalPatch,
    GoalStatus, NewContribution, NewGoal, NewTransaction,
};
use sea_orm::{ConnectionTrait, Statement};

use common::{at, date, engine_with_db, expense_category};

fn new_goal(name: &str, target_minor: i64) -> NewGoal {
    NewGoal {
        name: name.to_string(),
        description: None,
        target_minor,
        deadline: date(2026, 1, 1),
        category_id: None,
        color: None,
        icon: None,
        priority: None,
        is_recurring: false,
        recurrence_day: None,
    }
}

fn contribution(amount_minor: i64) -> NewContribution {
    NewContribution {
        amount_minor,
        ..NewContribution::default()
    }
}

#[tokio::test]
async fn goal_starts_as_draft_with_four_milestones() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Viagem", 1_500_000), now)
        .await
        .unwrap();
    assert_eq!(goal.status, GoalStatus::Draft);
    assert_eq!(goal.current_minor, 0);
    assert_eq!(goal.priority, 1);

    let detail = engine
        .goal("alice", goal.id, now.date_naive())
        .await
        .unwrap();
    let percentages: Vec<_> = detail.milestones.iter().map(|m| m.percentage).collect();
    assert_eq!(percentages, [25, 50, 75, 100]);
    assert_eq!(detail.milestones[1].title, "Metade Alcançada!");
    assert!(detail.milestones.iter().all(|m| !m.achieved));
    assert_eq!(detail.progress.progress_percentage, 0.0);
    assert_eq!(detail.progress.days_remaining, 365);
}

#[tokio::test]
async fn deadline_must_be_in_the_future() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2026, 1, 1);
    let err = engine
        .create_goal("alice", new_goal("Viagem", 1_000), now)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn status_lifecycle_follows_transition_table() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Reserva", 1_500_000), now)
        .await
        .unwrap();

    let err = engine
        .set_goal_status("alice", goal.id, GoalStatus::Completed, now)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    let started = engine
        .set_goal_status("alice", goal.id, GoalStatus::InProgress, now)
        .await
        .unwrap();
    assert_eq!(started.status, GoalStatus::InProgress);

    let completed = engine
        .set_goal_status("alice", goal.id, GoalStatus::Completed, now)
        .await
        .unwrap();
    assert_eq!(completed.achieved_at, Some(now));

    let err = engine
        .set_goal_status("alice", goal.id, GoalStatus::InProgress, now)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn rejected_transition_discards_other_fields() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Carro", 1_000_000), now)
        .await
        .unwrap();

    let err = engine
        .update_goal(
            "alice",
            goal.id,
            GoalPatch {
                name: Some("Moto".to_string()),
                status: Some(GoalStatus::Paused),
                ..GoalPatch::default()
            },
            now,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let unchanged = engine
        .goal("alice", goal.id, now.date_naive())
        .await
        .unwrap();
    assert_eq!(unchanged.goal.name, "Carro");
}

#[tokio::test]
async fn pausing_stamps_and_resuming_clears_paused_at() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Casa", 10_000_000), now)
        .await
        .unwrap();
    engine
        .set_goal_status("alice", goal.id, GoalStatus::InProgress, now)
        .await
        .unwrap();

    let paused_at = now + Duration::days(3);
    let paused = engine
        .set_goal_status("alice", goal.id, GoalStatus::Paused, paused_at)
        .await
        .unwrap();
    assert_eq!(paused.paused_at, Some(paused_at));

    let err = engine
        .add_contribution("alice", goal.id, contribution(1_000), paused_at)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InactiveGoal(_)));

    let resumed = engine
        .set_goal_status("alice", goal.id, GoalStatus::InProgress, now + Duration::days(5))
        .await
        .unwrap();
    assert_eq!(resumed.paused_at, None);
}

#[tokio::test]
async fn contributions_drive_balance_and_milestones() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Viagem", 1_500_000), now)
        .await
        .unwrap();
    engine
        .set_goal_status("alice", goal.id, GoalStatus::InProgress, now)
        .await
        .unwrap();

    let first = engine
        .add_contribution("alice", goal.id, contribution(500_000), now)
        .await
        .unwrap();
    assert_eq!(first.kind, ContributionKind::Manual);
    assert_eq!(first.created_by, "alice");
    assert_eq!(first.contribution_date, date(2025, 1, 1));

    let detail = engine
        .goal("alice", goal.id, now.date_naive())
        .await
        .unwrap();
    assert_eq!(detail.goal.current_minor, 500_000);
    assert_eq!(detail.progress.progress_percentage, 33.33);
    assert_eq!(detail.progress.monthly_contribution_needed_minor, 83_334);
    let achieved: Vec<_> = detail
        .milestones
        .iter()
        .filter(|m| m.achieved)
        .map(|m| m.percentage)
        .collect();
    assert_eq!(achieved, [25]);

    engine
        .add_contribution("alice", goal.id, contribution(1_500_000), now)
        .await
        .unwrap();
    let detail = engine
        .goal("alice", goal.id, now.date_naive())
        .await
        .unwrap();
    assert_eq!(detail.goal.current_minor, 2_000_000);
    assert_eq!(detail.progress.progress_percentage, 100.0);
    assert_eq!(detail.progress.monthly_contribution_needed_minor, 0);
    assert!(detail.milestones.iter().all(|m| m.achieved));
    assert_eq!(detail.contributions.len(), 2);

    engine
        .set_goal_status("alice", goal.id, GoalStatus::Completed, now)
        .await
        .unwrap();
    let err = engine
        .add_contribution("alice", goal.id, contribution(1_000), now)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn milestone_needs_the_exact_percentage() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Casa", 1_000_000), now)
        .await
        .unwrap();
    engine
        .add_contribution("alice", goal.id, contribution(249_999), now)
        .await
        .unwrap();

    let detail = engine
        .goal("alice", goal.id, now.date_naive())
        .await
        .unwrap();
    assert_eq!(detail.progress.progress_percentage, 25.0);
    assert!(detail.milestones.iter().all(|m| !m.achieved));

    engine
        .add_contribution("alice", goal.id, contribution(1), now)
        .await
        .unwrap();
    let detail = engine
        .goal("alice", goal.id, now.date_naive())
        .await
        .unwrap();
    assert!(detail.milestones[0].achieved);
    assert!(!detail.milestones[1].achieved);
}

#[tokio::test]
async fn progress_never_decreases_as_contributions_accrue() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Reserva", 100_000), now)
        .await
        .unwrap();

    let mut last = 0.0;
    for amount in [10_000, 1, 45_000, 80_000, 7] {
        engine
            .add_contribution("alice", goal.id, contribution(amount), now)
            .await
            .unwrap();
        let progress = engine
            .goal("alice", goal.id, now.date_naive())
            .await
            .unwrap()
            .progress
            .progress_percentage;
        assert!(progress >= last);
        assert!(progress <= 100.0);
        last = progress;
    }
    assert_eq!(last, 100.0);
}

#[tokio::test]
async fn contribution_rejects_foreign_goal_and_transaction() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Viagem", 100_000), now)
        .await
        .unwrap();

    let err = engine
        .add_contribution("bob", goal.id, contribution(1_000), now)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let bobs_category = expense_category(&engine, "bob", "Market").await;
    let bobs_tx = engine
        .record_transaction(
            "bob",
            NewTransaction {
                category_id: Some(bobs_category.id),
                kind: CategoryKind::Expense,
                amount_minor: 1_000,
                description: None,
                transaction_date: date(2025, 1, 1),
            },
        )
        .await
        .unwrap();
    let err = engine
        .add_contribution(
            "alice",
            goal.id,
            NewContribution {
                kind: ContributionKind::Transaction,
                transaction_id: Some(bobs_tx.id),
                ..contribution(1_000)
            },
            now,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = engine
        .add_contribution("alice", goal.id, contribution(0), now)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn name_is_reserved_until_goal_is_terminal() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let first = engine
        .create_goal("alice", new_goal("Viagem", 100_000), now)
        .await
        .unwrap();

    let err = engine
        .create_goal("alice", new_goal("Viagem", 200_000), now)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    engine
        .create_goal("bob", new_goal("Viagem", 200_000), now)
        .await
        .unwrap();

    engine
        .set_goal_status("alice", first.id, GoalStatus::Cancelled, now)
        .await
        .unwrap();
    engine
        .create_goal("alice", new_goal("Viagem", 200_000), now)
        .await
        .unwrap();
}

#[tokio::test]
async fn rename_checks_reserved_names() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    engine
        .create_goal("alice", new_goal("Viagem", 100_000), now)
        .await
        .unwrap();
    let other = engine
        .create_goal("alice", new_goal("Carro", 100_000), now)
        .await
        .unwrap();

    let err = engine
        .update_goal(
            "alice",
            other.id,
            GoalPatch {
                name: Some("Viagem".to_string()),
                ..GoalPatch::default()
            },
            now,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn goal_category_must_be_owned() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let bobs = expense_category(&engine, "bob", "Cars").await;
    let err = engine
        .create_goal(
            "alice",
            NewGoal {
                category_id: Some(bobs.id),
                ..new_goal("Carro", 100_000)
            },
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCategory(_)));

    let own = expense_category(&engine, "alice", "Cars").await;
    let goal = engine
        .create_goal(
            "alice",
            NewGoal {
                category_id: Some(own.id),
                ..new_goal("Carro", 100_000)
            },
            now,
        )
        .await
        .unwrap();
    let detail = engine
        .goal("alice", goal.id, now.date_naive())
        .await
        .unwrap();
    assert_eq!(detail.category.unwrap().name, "Cars");
}

#[tokio::test]
async fn recurring_goal_needs_a_day() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let err = engine
        .create_goal(
            "alice",
            NewGoal {
                is_recurring: true,
                ..new_goal("Mensal", 100_000)
            },
            now,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = engine
        .create_goal(
            "alice",
            NewGoal {
                priority: Some(6),
                ..new_goal("Mensal", 100_000)
            },
            now,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn delete_removes_contributions_and_milestones() {
    let (engine, db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Viagem", 100_000), now)
        .await
        .unwrap();
    engine
        .add_contribution("alice", goal.id, contribution(10_000), now)
        .await
        .unwrap();

    engine.delete_goal("alice", goal.id).await.unwrap();

    let err = engine
        .goal("alice", goal.id, now.date_naive())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    for table in ["goal_contributions", "goal_milestones"] {
        let row = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                format!("SELECT COUNT(*) AS n FROM {table}"),
            ))
            .await
            .unwrap()
            .unwrap();
        let count: i64 = row.try_get("", "n").unwrap();
        assert_eq!(count, 0, "{table}");
    }
}

#[tokio::test]
async fn overdue_goals_can_resume() {
    let (engine, db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let goal = engine
        .create_goal("alice", new_goal("Viagem", 100_000), now)
        .await
        .unwrap();
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE goals SET status = ? WHERE id = ?",
        vec!["OVERDUE".into(), goal.id.into()],
    ))
    .await
    .unwrap();

    let err = engine
        .add_contribution("alice", goal.id, contribution(1_000), now)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InactiveGoal(_)));
    let err = engine
        .set_goal_status("alice", goal.id, GoalStatus::Paused, now)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let resumed = engine
        .set_goal_status("alice", goal.id, GoalStatus::InProgress, now)
        .await
        .unwrap();
    assert_eq!(resumed.status, GoalStatus::InProgress);
}

#[tokio::test]
async fn resuming_overdue_goal_rechecks_reserved_name() {
    let (engine, db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let stale = engine
        .create_goal("alice", new_goal("Viagem", 100_000), now)
        .await
        .unwrap();
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE goals SET status = ? WHERE id = ?",
        vec!["OVERDUE".into(), stale.id.into()],
    ))
    .await
    .unwrap();

    let fresh = engine
        .create_goal("alice", new_goal("Viagem", 200_000), now)
        .await
        .unwrap();
    engine
        .set_goal_status("alice", fresh.id, GoalStatus::InProgress, now)
        .await
        .unwrap();

    let err = engine
        .set_goal_status("alice", stale.id, GoalStatus::InProgress, now)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let detail = engine
        .goal("alice", stale.id, now.date_naive())
        .await
        .unwrap();
    assert_eq!(detail.goal.status, GoalStatus::Overdue);

    let renamed = engine
        .update_goal(
            "alice",
            stale.id,
            GoalPatch {
                name: Some("Viagem 2".to_string()),
                status: Some(GoalStatus::InProgress),
                ..GoalPatch::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Viagem 2");
    assert_eq!(renamed.status, GoalStatus::InProgress);
}

#[tokio::test]
async fn summary_and_upcoming_deadlines() {
    let (engine, _db) = engine_with_db().await;
    let now = at(2025, 1, 1);
    let today = now.date_naive();

    let soon = engine
        .create_goal(
            "alice",
            NewGoal {
                deadline: date(2025, 1, 20),
                ..new_goal("Presente", 10_000)
            },
            now,
        )
        .await
        .unwrap();
    let later = engine
        .create_goal("alice", new_goal("Viagem", 100_000), now)
        .await
        .unwrap();
    let draft = engine
        .create_goal(
            "alice",
            NewGoal {
                deadline: date(2025, 1, 10),
                ..new_goal("Curso", 10_000)
            },
            now,
        )
        .await
        .unwrap();
    for goal in [&soon, &later] {
        engine
            .set_goal_status("alice", goal.id, GoalStatus::InProgress, now)
            .await
            .unwrap();
    }
    engine
        .add_contribution("alice", soon.id, contribution(8_500), now)
        .await
        .unwrap();
    engine
        .add_contribution("alice", draft.id, contribution(1_500), now)
        .await
        .unwrap();

    let summary = engine.goal_summary("alice").await.unwrap();
    assert_eq!(summary.total_goals, 3);
    assert_eq!(summary.active_goals, 2);
    assert_eq!(summary.completed_goals, 0);
    assert_eq!(summary.total_saved_minor, 10_000);
    assert_eq!(summary.total_target_minor, 120_000);
    assert_eq!(summary.overall_progress, 8.33);
    assert_eq!(summary.goals_on_track, 1);
    assert_eq!(summary.goals_ahead, 1);
    assert_eq!(summary.goals_behind, 1);

    let upcoming = engine
        .upcoming_deadlines("alice", None, today)
        .await
        .unwrap();
    let ids: Vec<_> = upcoming.iter().map(|g| g.id).collect();
    assert_eq!(ids, [soon.id]);

    let wide = engine
        .upcoming_deadlines("alice", Some(365), today)
        .await
        .unwrap();
    let ids: Vec<_> = wide.iter().map(|g| g.id).collect();
    assert_eq!(ids, [soon.id, later.id]);

    let err = engine
        .upcoming_deadlines("alice", Some(0), today)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let drafts = engine
        .list_goals(
            "alice",
            &GoalListFilter {
                status: Some(GoalStatus::Draft),
                ..GoalListFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, draft.id);
}
