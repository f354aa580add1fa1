//! Date to period-index mapping.
//!
//! Period 1 starts on the habit creation date. Daily habits advance one index
//! per calendar day, weekly habits one index per seven days counted from the
//! creation date (not from a calendar week boundary).

use crate::model::habit::Habit;
use chrono::{Duration, NaiveDate};

/// Returns the 1-based period index of `date` for `habit`.
///
/// Total over all dates: dates before creation yield `<= 0`. Whole periods are
/// counted with floor division, so the index is monotonic in `date` on both
/// sides of the creation date.
pub fn period_index(habit: &Habit, date: NaiveDate) -> i64 {
    let days = date.signed_duration_since(habit.created_on()).num_days();
    days.div_euclid(habit.frequency.period_days()) + 1
}

/// Returns the first calendar date of period `index` for `habit`.
///
/// Returns `None` when the date falls outside the supported calendar range.
pub fn period_start(habit: &Habit, index: i64) -> Option<NaiveDate> {
    let offset_days = index
        .checked_sub(1)?
        .checked_mul(habit.frequency.period_days())?;
    habit
        .created_on()
        .checked_add_signed(Duration::try_days(offset_days)?)
}

#[cfg(test)]
mod tests {
    use super::{period_index, period_start};
    use crate::model::habit::{Frequency, Habit};
    use chrono::{Duration, NaiveDate};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn creation_date_is_period_one() {
        for frequency in [Frequency::Daily, Frequency::Weekly] {
            let habit = Habit::new("ann", "Walk", frequency, day(2024, 2, 29));
            assert_eq!(period_index(&habit, day(2024, 2, 29)), 1);
        }
    }

    #[test]
    fn daily_index_counts_days() {
        let habit = Habit::new("ann", "Walk", Frequency::Daily, day(2024, 1, 1));
        assert_eq!(period_index(&habit, day(2024, 1, 2)), 2);
        assert_eq!(period_index(&habit, day(2024, 1, 31)), 31);
        assert_eq!(period_index(&habit, day(2025, 1, 1)), 367);
        assert_eq!(period_index(&habit, day(2023, 12, 31)), 0);
    }

    #[test]
    fn weekly_index_counts_whole_weeks_from_creation() {
        let habit = Habit::new("ann", "Walk", Frequency::Weekly, day(2024, 1, 3));
        assert_eq!(period_index(&habit, day(2024, 1, 9)), 1);
        assert_eq!(period_index(&habit, day(2024, 1, 10)), 2);
        assert_eq!(period_index(&habit, day(2024, 1, 16)), 2);
        assert_eq!(period_index(&habit, day(2024, 1, 17)), 3);
    }

    #[test]
    fn weekly_index_before_creation_is_not_positive() {
        let habit = Habit::new("ann", "Walk", Frequency::Weekly, day(2024, 1, 3));
        assert_eq!(period_index(&habit, day(2024, 1, 2)), 0);
        assert_eq!(period_index(&habit, day(2023, 12, 27)), 0);
        assert_eq!(period_index(&habit, day(2023, 12, 26)), -1);
    }

    #[test]
    fn period_start_inverts_index() {
        let habit = Habit::new("ann", "Walk", Frequency::Weekly, day(2024, 1, 3));
        assert_eq!(period_start(&habit, 1), Some(day(2024, 1, 3)));
        assert_eq!(period_start(&habit, 3), Some(day(2024, 1, 17)));
        for index in -3..20 {
            let start = period_start(&habit, index).unwrap();
            assert_eq!(period_index(&habit, start), index);
            assert_eq!(period_index(&habit, start - Duration::days(1)), index - 1);
        }
    }

    #[test]
    fn period_start_rejects_overflow() {
        let habit = Habit::new("ann", "Walk", Frequency::Weekly, day(2024, 1, 3));
        assert_eq!(period_start(&habit, i64::MAX), None);
    }
}
