use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Deserialize a nullable patch field.
///
/// Use together with `#[serde(default)]`: a missing field stays `None`, an
/// explicit `null` becomes `Some(None)` and a value becomes `Some(Some(_))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub username: String,
    }
}

pub mod category {
    use super::*;

    /// Transaction type a category classifies.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryType {
        Income,
        Expense,
        Transfer,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryCreate {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: CategoryType,
        pub icon: Option<String>,
        /// `#RRGGBB`.
        pub color: Option<String>,
        pub parent_id: Option<Uuid>,
        pub sort_order: Option<i32>,
    }

    /// Omitted fields are left untouched; `null` clears `icon` and `color`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub icon: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub color: Option<Option<String>>,
        pub sort_order: Option<i32>,
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryListQuery {
        #[serde(rename = "type")]
        pub kind: Option<CategoryType>,
        pub parent_id: Option<Uuid>,
        /// Defaults to `true`.
        pub include_system: Option<bool>,
        pub include_subcategories: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryTreeQuery {
        #[serde(rename = "type")]
        pub kind: Option<CategoryType>,
        /// Defaults to `true`.
        pub include_system: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SystemCategoriesQuery {
        #[serde(rename = "type")]
        pub kind: Option<CategoryType>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        /// `None` for system categories.
        pub user_id: Option<String>,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: CategoryType,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub parent_id: Option<Uuid>,
        pub is_system: bool,
        pub is_active: bool,
        pub sort_order: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryDetailView {
        #[serde(flatten)]
        pub category: CategoryView,
        pub subcategories_count: u64,
        pub parent_name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTreeView {
        #[serde(flatten)]
        pub category: CategoryDetailView,
        pub subcategories: Vec<CategoryDetailView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryDetailView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTreeResponse {
        pub categories: Vec<CategoryTreeView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SystemCategoriesResponse {
        pub categories: Vec<CategoryView>,
    }

    /// Display fields joined onto budgets and goals.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryDisplayView {
        pub id: Uuid,
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
    }
}

pub mod budget {
    use super::*;
    use crate::category::CategoryDisplayView;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BudgetStatus {
        OnTrack,
        Warning,
        Exceeded,
    }

    /// The period is either `start_date` + `end_date` (inclusive) or a
    /// calendar `year` + `month`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetCreate {
        pub category_id: Uuid,
        pub limit_minor: i64,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub year: Option<i32>,
        pub month: Option<u32>,
        pub alert_threshold_1: Option<i32>,
        pub alert_threshold_2: Option<i32>,
        pub alerts_enabled: Option<bool>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub category_id: Option<Uuid>,
        pub limit_minor: Option<i64>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub alert_threshold_1: Option<i32>,
        pub alert_threshold_2: Option<i32>,
        pub alerts_enabled: Option<bool>,
        pub is_active: Option<bool>,
        #[serde(default, deserialize_with = "double_option")]
        pub notes: Option<Option<String>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetListQuery {
        pub category_id: Option<Uuid>,
        /// `true`: the period covers today. `false`: the period already ended.
        pub active: Option<bool>,
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub category_id: Uuid,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub limit_minor: i64,
        pub alert_threshold_1: i32,
        pub alert_threshold_2: i32,
        pub alerts_enabled: bool,
        pub is_active: bool,
        pub notes: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetSummaryView {
        #[serde(flatten)]
        pub budget: BudgetView,
        pub category: Option<CategoryDisplayView>,
        pub spent_minor: i64,
        /// Negative once the limit is exceeded.
        pub remaining_minor: i64,
        pub percentage_used: f64,
        pub status: BudgetStatus,
        pub days_remaining: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetListResponse {
        pub budgets: Vec<BudgetView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetSummaryListResponse {
        pub summaries: Vec<BudgetSummaryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetsOverviewView {
        pub total_budgets: u64,
        pub total_limit_minor: i64,
        pub total_spent_minor: i64,
        pub average_percentage: f64,
        pub exceeded: u64,
        pub warning: u64,
        pub on_track: u64,
    }
}

pub mod goal {
    use super::*;
    use crate::category::CategoryDisplayView;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum GoalStatus {
        Draft,
        InProgress,
        Paused,
        Completed,
        Cancelled,
        Overdue,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum ContributionType {
        Manual,
        Automatic,
        Transaction,
        Recurring,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalCreate {
        pub name: String,
        pub description: Option<String>,
        pub target_minor: i64,
        pub deadline: NaiveDate,
        pub category_id: Option<Uuid>,
        pub color: Option<String>,
        pub icon: Option<String>,
        pub priority: Option<i32>,
        pub is_recurring: Option<bool>,
        pub recurrence_day: Option<i32>,
    }

    /// Omitted fields are left untouched; `null` clears nullable fields.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalUpdate {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub description: Option<Option<String>>,
        pub target_minor: Option<i64>,
        pub deadline: Option<NaiveDate>,
        #[serde(default, deserialize_with = "double_option")]
        pub category_id: Option<Option<Uuid>>,
        pub status: Option<GoalStatus>,
        #[serde(default, deserialize_with = "double_option")]
        pub color: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub icon: Option<Option<String>>,
        pub priority: Option<i32>,
        pub is_recurring: Option<bool>,
        #[serde(default, deserialize_with = "double_option")]
        pub recurrence_day: Option<Option<i32>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalStatusUpdate {
        pub status: GoalStatus,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalListQuery {
        pub status: Option<GoalStatus>,
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UpcomingQuery {
        pub days: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionCreate {
        pub amount_minor: i64,
        /// Defaults to `MANUAL`.
        #[serde(rename = "type")]
        pub kind: Option<ContributionType>,
        pub description: Option<String>,
        /// Defaults to today.
        pub contribution_date: Option<NaiveDate>,
        pub transaction_id: Option<Uuid>,
        pub is_recurring: Option<bool>,
    }

    /// A goal with its progress metrics computed at read time.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalView {
        pub id: Uuid,
        pub category_id: Option<Uuid>,
        pub name: String,
        pub description: Option<String>,
        pub target_minor: i64,
        pub current_minor: i64,
        pub deadline: NaiveDate,
        pub status: GoalStatus,
        pub color: Option<String>,
        pub icon: Option<String>,
        pub priority: i32,
        pub is_recurring: bool,
        pub recurrence_day: Option<i32>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub achieved_at: Option<DateTime<Utc>>,
        pub paused_at: Option<DateTime<Utc>>,
        pub progress_percentage: f64,
        pub days_remaining: i64,
        pub monthly_contribution_needed_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionView {
        pub id: Uuid,
        pub goal_id: Uuid,
        pub transaction_id: Option<Uuid>,
        pub amount_minor: i64,
        #[serde(rename = "type")]
        pub kind: ContributionType,
        pub description: Option<String>,
        pub contribution_date: NaiveDate,
        pub is_recurring: bool,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MilestoneView {
        pub id: Uuid,
        pub percentage: i32,
        pub title: String,
        pub description: Option<String>,
        pub achieved: bool,
        pub achieved_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalDetailView {
        #[serde(flatten)]
        pub goal: GoalView,
        pub category: Option<CategoryDisplayView>,
        pub contributions: Vec<ContributionView>,
        pub milestones: Vec<MilestoneView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalListResponse {
        pub goals: Vec<GoalView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalSummaryView {
        pub total_goals: u64,
        pub active_goals: u64,
        pub completed_goals: u64,
        pub total_saved_minor: i64,
        pub total_target_minor: i64,
        pub overall_progress: f64,
        pub goals_on_track: u64,
        pub goals_behind: u64,
        pub goals_ahead: u64,
    }
}

pub mod transaction {
    use super::*;
    use crate::category::CategoryType;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreate {
        pub category_id: Option<Uuid>,
        #[serde(rename = "type")]
        pub kind: CategoryType,
        /// Must be > 0.
        pub amount_minor: i64,
        pub description: Option<String>,
        pub transaction_date: NaiveDate,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub category_id: Option<Uuid>,
        #[serde(rename = "type")]
        pub kind: Option<CategoryType>,
        /// Inclusive.
        pub from: Option<NaiveDate>,
        /// Inclusive.
        pub to: Option<NaiveDate>,
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub category_id: Option<Uuid>,
        #[serde(rename = "type")]
        pub kind: CategoryType,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub transaction_date: NaiveDate,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_missing_from_null() {
        let patch: category::CategoryUpdate =
            serde_json::from_str(r##"{"icon": null, "color": "#112233"}"##).unwrap();
        assert_eq!(patch.icon, Some(None));
        assert_eq!(patch.color, Some(Some("#112233".to_string())));
        assert_eq!(patch.name, None);

        let patch: goal::GoalUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.category_id, None);
        assert_eq!(patch.recurrence_day, None);
    }

    #[test]
    fn category_type_uses_type_key() {
        let body: transaction::TransactionCreate = serde_json::from_str(
            r#"{"type": "expense", "amount_minor": 1500, "transaction_date": "2025-03-10"}"#,
        )
        .unwrap();
        assert_eq!(body.kind, category::CategoryType::Expense);
        assert_eq!(body.category_id, None);
    }
}
