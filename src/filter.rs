//! Crash record filtering.
//!
//! A [`CrashFilter`] is a conjunction of optional predicates. The default
//! filter accepts every record, so applying it is the identity.

use serde::{Deserialize, Serialize};

use crate::CrashRecord;

/// Compound filter over crash records. All active predicates are ANDed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashFilter {
    /// Exact year; records without a year never match an active year filter
    pub year: Option<i32>,
    /// Exact month (1-12)
    pub month: Option<u32>,
    /// Inclusive lower hour bound. Default: 0
    pub hour_min: u32,
    /// Inclusive upper hour bound. Default: 23
    pub hour_max: u32,
    pub weekend_only: bool,
    pub night_only: bool,
    pub fatal_only: bool,
}

impl Default for CrashFilter {
    fn default() -> Self {
        Self {
            year: None,
            month: None,
            hour_min: 0,
            hour_max: 23,
            weekend_only: false,
            night_only: false,
            fatal_only: false,
        }
    }
}

impl CrashFilter {
    /// Set the hour range, swapping the bounds if they arrive reversed.
    pub fn with_hour_range(mut self, a: u32, b: u32) -> Self {
        let (lo, hi) = if a > b { (b, a) } else { (a, b) };
        self.hour_min = lo;
        self.hour_max = hi;
        self
    }

    /// True when no predicate is active.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Whether a single record passes every active predicate.
    ///
    /// A record with an unknown hour always passes the hour range.
    pub fn matches(&self, record: &CrashRecord) -> bool {
        if let Some(year) = self.year {
            if record.year != Some(year) {
                return false;
            }
        }
        if let Some(month) = self.month {
            if record.month != Some(month) {
                return false;
            }
        }
        if let Some(hour) = record.hour {
            if hour < self.hour_min || hour > self.hour_max {
                return false;
            }
        }
        if self.weekend_only && !record.is_weekend {
            return false;
        }
        if self.night_only && !record.is_night {
            return false;
        }
        if self.fatal_only && !record.is_fatal() {
            return false;
        }
        true
    }
}

/// Return the records matching `filter`, preserving their original order.
pub fn apply_filter(records: &[CrashRecord], filter: &CrashFilter) -> Vec<CrashRecord> {
    records.iter().filter(|r| filter.matches(r)).cloned().collect()
}
