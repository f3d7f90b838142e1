//! Minimal rebalance-day calendar check (spec.md §6 "calendar"; SPEC_FULL.md
//! Non-goals carry-forward: a frequency-boundary check, not a holiday-aware
//! trading calendar — that is explicitly out of scope, spec.md §1).

use chrono::{DateTime, Datelike, IsoWeek, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// True when `current` crosses a `frequency` boundary relative to `last`.
pub fn is_rebalance_day(frequency: Frequency, current: DateTime<Utc>, last: DateTime<Utc>) -> bool {
    match frequency {
        Frequency::Daily => current.date_naive() != last.date_naive(),
        Frequency::Weekly => iso_week_key(current.iso_week()) != iso_week_key(last.iso_week()),
        Frequency::Monthly => {
            current.year() != last.year() || current.month() != last.month()
        }
    }
}

fn iso_week_key(week: IsoWeek) -> (i32, u32) {
    (week.year(), week.week())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::parse_timestamp;

    #[test]
    fn monthly_boundary_crossing() {
        let last = parse_timestamp("2024-01-31").unwrap();
        let current = parse_timestamp("2024-02-01").unwrap();
        assert!(is_rebalance_day(Frequency::Monthly, current, last));
        assert!(!is_rebalance_day(Frequency::Monthly, last, last));
    }

    #[test]
    fn weekly_boundary_crossing() {
        let last = parse_timestamp("2024-01-07").unwrap(); // Sunday
        let current = parse_timestamp("2024-01-08").unwrap(); // Monday, new ISO week
        assert!(is_rebalance_day(Frequency::Weekly, current, last));
    }

    #[test]
    fn daily_boundary_crossing() {
        let last = parse_timestamp("2024-01-01").unwrap();
        let current = parse_timestamp("2024-01-02").unwrap();
        assert!(is_rebalance_day(Frequency::Daily, current, last));
        assert!(!is_rebalance_day(Frequency::Daily, last, last));
    }
}
