//! Default values for the date fields, derived from the local calendar date.
//!
//! - Day range: 90 days ago through today.
//! - Month range: first of the month five months back through the first of
//!   the current month.

use chrono::{Datelike, Days, Local, Months, NaiveDate};

use super::DateFields;

/// Days covered by the default day range (excluding today).
pub const DAY_RANGE_DAYS: u64 = 90;

/// Months between the start and end of the default month range.
pub const MONTH_RANGE_MONTHS: u32 = 5;

/// Compute default field values relative to `today`.
pub fn defaults_for(today: NaiveDate) -> DateFields {
    let start_date = today
        .checked_sub_days(Days::new(DAY_RANGE_DAYS))
        .unwrap_or(NaiveDate::MIN);

    let end_month = today.with_day(1).unwrap_or(today);
    let start_month = end_month
        .checked_sub_months(Months::new(MONTH_RANGE_MONTHS))
        .unwrap_or(end_month);

    DateFields {
        start_date: iso(start_date),
        end_date: iso(today),
        start_month: iso(start_month),
        end_month: iso(end_month),
    }
}

/// Default field values for the viewer's local date right now.
pub fn defaults_now() -> DateFields {
    defaults_for(Local::now().date_naive())
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
