//! Spending limits per category over an inclusive date range.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Period a budget covers.
///
/// `Month` is sugar for the calendar month `[first day, last day]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Range { start: NaiveDate, end: NaiveDate },
    Month { year: i32, month: u32 },
}

impl BudgetPeriod {
    /// Resolve the inclusive `(start, end)` bounds.
    pub fn bounds(self) -> ResultEngine<(NaiveDate, NaiveDate)> {
        match self {
            Self::Range { start, end } => {
                validate_range(start, end)?;
                Ok((start, end))
            }
            Self::Month { year, month } => {
                let invalid =
                    || EngineError::InvalidDate(format!("invalid budget month {year}-{month}"));
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
                    .and_then(|d| d.pred_opt())
                    .ok_or_else(invalid)?;
                Ok((start, end))
            }
        }
    }
}

/// Spending status derived from the used percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    OnTrack,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::Warning => "warning",
            Self::Exceeded => "exceeded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: String,
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

impl Budget {
    /// `start_date <= today <= end_date`.
    pub fn covers(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }

    /// Percentage of the limit already spent, rounded to two decimals
    /// (0 when the limit is not positive).
    pub fn percentage_used(&self, spent_minor: i64) -> f64 {
        MoneyCents::new(spent_minor).percent_of(MoneyCents::new(self.limit_minor))
    }

    /// `exceeded` at 100% or more, `warning` once the first alert is reached
    /// (only with alerts enabled), `on_track` otherwise.
    pub fn status_for(&self, spent_minor: i64) -> BudgetStatus {
        let spent = MoneyCents::new(spent_minor);
        let limit = MoneyCents::new(self.limit_minor);
        if spent.reaches_percent(limit, 100) {
            BudgetStatus::Exceeded
        } else if self.alerts_enabled && spent.reaches_percent(limit, self.alert_threshold_1) {
            BudgetStatus::Warning
        } else {
            BudgetStatus::OnTrack
        }
    }

    /// Days left until `end_date`, never negative.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.end_date - today).num_days().max(0)
    }

    /// `YYYY-MM` when the budget spans exactly one calendar month.
    pub fn month_label(&self) -> Option<String> {
        let whole_month = self.start_date.day() == 1
            && BudgetPeriod::Month {
                year: self.start_date.year(),
                month: self.start_date.month(),
            }
            .bounds()
            .is_ok_and(|(_, end)| end == self.end_date);
        whole_month.then(|| format!("{:04}-{:02}", self.start_date.year(), self.start_date.month()))
    }
}

pub(crate) fn validate_range(start: NaiveDate, end: NaiveDate) -> ResultEngine<()> {
    if end < start {
        return Err(EngineError::InvalidDate(format!(
            "end_date {end} precedes start_date {start}"
        )));
    }
    Ok(())
}

/// Both thresholds within `1..=100` and strictly ascending.
pub(crate) fn validate_thresholds(first: i32, second: i32) -> ResultEngine<()> {
    if !(1..=100).contains(&first) || !(1..=100).contains(&second) {
        return Err(EngineError::InvalidThreshold(
            "alert thresholds must be within 1..=100".to_string(),
        ));
    }
    if second <= first {
        return Err(EngineError::InvalidThreshold(
            "alert_threshold_2 must be greater than alert_threshold_1".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_limit(limit_minor: i64) -> ResultEngine<()> {
    if !MoneyCents::new(limit_minor).is_positive() {
        return Err(EngineError::InvalidAmount(
            "limit_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub limit_minor: i64,
    pub alert_threshold_1: i32,
    pub alert_threshold_2: i32,
    pub alerts_enabled: bool,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Budget {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            start_date: model.start_date,
            end_date: model.end_date,
            limit_minor: model.limit_minor,
            alert_threshold_1: model.alert_threshold_1,
            alert_threshold_2: model.alert_threshold_2,
            alerts_enabled: model.alerts_enabled,
            is_active: model.is_active,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn budget(limit_minor: i64, alerts_enabled: bool) -> Budget {
        Budget {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            category_id: Uuid::new_v4(),
            start_date: date(2025, 1, 1),
            end_date: date(2025, 1, 31),
            limit_minor,
            alert_threshold_1: 80,
            alert_threshold_2: 95,
            alerts_enabled,
            is_active: true,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn month_period_covers_calendar_month() {
        let feb = BudgetPeriod::Month {
            year: 2024,
            month: 2,
        };
        assert_eq!(feb.bounds().unwrap(), (date(2024, 2, 1), date(2024, 2, 29)));
        let dec = BudgetPeriod::Month {
            year: 2025,
            month: 12,
        };
        assert_eq!(dec.bounds().unwrap(), (date(2025, 12, 1), date(2025, 12, 31)));
        assert!(BudgetPeriod::Month { year: 2025, month: 13 }.bounds().is_err());
    }

    #[test]
    fn range_period_rejects_inverted_bounds() {
        let inverted = BudgetPeriod::Range {
            start: date(2025, 2, 1),
            end: date(2025, 1, 1),
        };
        assert!(matches!(inverted.bounds(), Err(EngineError::InvalidDate(_))));
    }

    #[test]
    fn thresholds_must_ascend_within_bounds() {
        assert!(validate_thresholds(80, 95).is_ok());
        assert!(validate_thresholds(95, 95).is_err());
        assert!(validate_thresholds(0, 50).is_err());
        assert!(validate_thresholds(50, 101).is_err());
    }

    #[test]
    fn status_classification() {
        let b = budget(100_000, true);
        assert_eq!(b.status_for(85_000), BudgetStatus::Warning);
        assert_eq!(b.status_for(120_000), BudgetStatus::Exceeded);
        assert_eq!(b.status_for(100_000), BudgetStatus::Exceeded);
        assert_eq!(b.status_for(50_000), BudgetStatus::OnTrack);

        let quiet = budget(100_000, false);
        assert_eq!(quiet.status_for(85_000), BudgetStatus::OnTrack);
        assert_eq!(quiet.status_for(100_000), BudgetStatus::Exceeded);
    }

    #[test]
    fn status_uses_exact_ratio_near_edges() {
        let b = budget(1_000_000, true);
        assert_eq!(b.percentage_used(999_999), 100.0);
        assert_eq!(b.status_for(999_999), BudgetStatus::Warning);
        assert_eq!(b.percentage_used(799_999), 80.0);
        assert_eq!(b.status_for(799_999), BudgetStatus::OnTrack);
        assert_eq!(b.status_for(800_000), BudgetStatus::Warning);
    }

    #[test]
    fn days_remaining_never_negative() {
        let b = budget(100_000, true);
        assert_eq!(b.days_remaining(date(2025, 1, 21)), 10);
        assert_eq!(b.days_remaining(date(2025, 3, 1)), 0);
    }

    #[test]
    fn month_label_only_for_whole_months() {
        let mut b = budget(100_000, true);
        assert_eq!(b.month_label().as_deref(), Some("2025-01"));
        b.end_date = date(2025, 1, 15);
        assert_eq!(b.month_label(), None);
    }
}
