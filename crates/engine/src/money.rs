/// Signed money amount represented as **integer cents**.
///
/// Every monetary column (budget limits, goal targets, contributions,
/// transaction amounts) is stored in minor units. Ratios are classified on
/// the integers; the `f64` percentage is only for reporting.
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let spent = MoneyCents::new(999_999);
/// let limit = MoneyCents::new(1_000_000);
/// assert!(!spent.reaches_percent(limit, 100));
/// assert_eq!(spent.percent_of(limit), 100.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `self / whole * 100`, rounded to two decimals for display.
    ///
    /// Returns `0.0` when `whole` is not positive.
    #[must_use]
    pub fn percent_of(self, whole: MoneyCents) -> f64 {
        if whole.0 <= 0 {
            return 0.0;
        }
        round2(self.0 as f64 / whole.0 as f64 * 100.0)
    }

    /// Exact `self / whole * 100 >= percent`.
    ///
    /// A non-positive `whole` counts as 0%.
    #[must_use]
    pub fn reaches_percent(self, whole: MoneyCents, percent: i32) -> bool {
        if whole.0 <= 0 {
            return percent <= 0;
        }
        i128::from(self.0) * 100 >= i128::from(whole.0) * i128::from(percent)
    }

    /// Whole percentage points of `whole` reached, rounded down.
    ///
    /// Returns `0` when `whole` is not positive.
    #[must_use]
    pub fn whole_percent_of(self, whole: MoneyCents) -> i64 {
        if whole.0 <= 0 {
            return 0;
        }
        let points = (i128::from(self.0) * 100).div_euclid(i128::from(whole.0));
        i64::try_from(points).unwrap_or(if points < 0 { i64::MIN } else { i64::MAX })
    }
}

/// Round to two decimals (half away from zero).
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
