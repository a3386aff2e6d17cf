//! Billing period handling
//!
//! Usage quotas are counted over the current calendar month in UTC, from
//! the first instant of the month up to the moment of the check. Counting
//! is open-ended at the top: a record stamped after the checking request's
//! clock reading still counts.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The window `[start, end]` (both inclusive) over which invoice usage is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl BillingPeriod {
    /// The month-to-date period containing `now`
    pub fn month_to_date(now: DateTime<Utc>) -> Self {
        let first_day = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
            .unwrap_or(now);

        Self {
            start: first_day,
            end: now,
        }
    }

    /// First instant of the period
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Last instant of the period (the reference "now")
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns true if something created at `at` counts toward this
    /// period's usage
    ///
    /// Only the start bounds the count. Another request may read the clock
    /// after `end` yet commit first; its record must still be seen.
    pub fn counts(&self, at: DateTime<Utc>) -> bool {
        at >= self.start
    }
}
