// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::MarginError;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn day(d: NaiveDate) -> Self {
        DateRange { start: d, end: d }
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        self.start <= d && d <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} .. {}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Daily,
    WeekToDate,
    MonthToDate,
    YearToDate,
}

impl PeriodKind {
    pub const ALL: [PeriodKind; 4] = [
        PeriodKind::Daily,
        PeriodKind::WeekToDate,
        PeriodKind::MonthToDate,
        PeriodKind::YearToDate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PeriodKind::Daily => "Today",
            PeriodKind::WeekToDate => "Week to date",
            PeriodKind::MonthToDate => "Month to date",
            PeriodKind::YearToDate => "Year to date",
        }
    }
}

/// Window of `kind` ending on `as_of`. Weeks start on Monday.
pub fn window(kind: PeriodKind, as_of: NaiveDate) -> DateRange {
    let start = match kind {
        PeriodKind::Daily => as_of,
        PeriodKind::WeekToDate => {
            as_of - Duration::days(as_of.weekday().num_days_from_monday() as i64)
        }
        PeriodKind::MonthToDate => as_of.with_day(1).unwrap_or(as_of),
        PeriodKind::YearToDate => NaiveDate::from_ymd_opt(as_of.year(), 1, 1).unwrap_or(as_of),
    };
    DateRange::new(start, as_of)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonBasis {
    YearAgo,
    MonthAgo,
}

impl ComparisonBasis {
    fn months(&self) -> u32 {
        match self {
            ComparisonBasis::YearAgo => 12,
            ComparisonBasis::MonthAgo => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComparisonBasis::YearAgo => "last year",
            ComparisonBasis::MonthAgo => "last month",
        }
    }
}

impl FromStr for ComparisonBasis {
    type Err = MarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" | "yoy" => Ok(ComparisonBasis::YearAgo),
            "month" | "mom" => Ok(ComparisonBasis::MonthAgo),
            other => Err(MarginError::InvalidConfiguration {
                field: "basis".into(),
                reason: format!("unknown comparison basis '{}', expected year|month", other),
            }),
        }
    }
}

fn shift_back(d: NaiveDate, months: u32) -> NaiveDate {
    // checked_sub_months clamps to the last valid day (29 Feb -> 28 Feb).
    d.checked_sub_months(Months::new(months)).unwrap_or(d)
}

/// The same calendar span `basis` earlier.
pub fn reference(range: DateRange, basis: ComparisonBasis) -> DateRange {
    let m = basis.months();
    DateRange::new(shift_back(range.start, m), shift_back(range.end, m))
}
