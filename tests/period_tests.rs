// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use dealermargin::error::MarginError;
use dealermargin::period::{reference, window, ComparisonBasis, DateRange, PeriodKind};
use dealermargin::utils::parse_date;
use pretty_assertions::assert_eq;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn windows_end_on_the_report_date() {
    // A Wednesday.
    let as_of = ymd(2024, 5, 15);
    assert_eq!(window(PeriodKind::Daily, as_of), DateRange::day(as_of));
    assert_eq!(
        window(PeriodKind::WeekToDate, as_of),
        DateRange::new(ymd(2024, 5, 13), as_of)
    );
    assert_eq!(
        window(PeriodKind::MonthToDate, as_of),
        DateRange::new(ymd(2024, 5, 1), as_of)
    );
    assert_eq!(
        window(PeriodKind::YearToDate, as_of),
        DateRange::new(ymd(2024, 1, 1), as_of)
    );
}

#[test]
fn week_starts_on_monday() {
    let monday = ymd(2024, 5, 13);
    assert_eq!(window(PeriodKind::WeekToDate, monday), DateRange::day(monday));
    let sunday = ymd(2024, 5, 19);
    assert_eq!(window(PeriodKind::WeekToDate, sunday).start, monday);
}

#[test]
fn reference_shifts_both_ends() {
    let mtd = DateRange::new(ymd(2024, 5, 1), ymd(2024, 5, 15));
    assert_eq!(
        reference(mtd, ComparisonBasis::YearAgo),
        DateRange::new(ymd(2023, 5, 1), ymd(2023, 5, 15))
    );
    assert_eq!(
        reference(mtd, ComparisonBasis::MonthAgo),
        DateRange::new(ymd(2024, 4, 1), ymd(2024, 4, 15))
    );
}

#[test]
fn reference_clamps_to_month_end() {
    let leap = DateRange::day(ymd(2024, 2, 29));
    assert_eq!(
        reference(leap, ComparisonBasis::YearAgo),
        DateRange::day(ymd(2023, 2, 28))
    );
    let march_end = DateRange::day(ymd(2024, 3, 31));
    assert_eq!(
        reference(march_end, ComparisonBasis::MonthAgo),
        DateRange::day(ymd(2024, 2, 29))
    );
}

#[test]
fn basis_parses_aliases() {
    assert_eq!("year".parse::<ComparisonBasis>(), Ok(ComparisonBasis::YearAgo));
    assert_eq!("YoY".parse::<ComparisonBasis>(), Ok(ComparisonBasis::YearAgo));
    assert_eq!(" Month ".parse::<ComparisonBasis>(), Ok(ComparisonBasis::MonthAgo));
    match "weekly".parse::<ComparisonBasis>() {
        Err(MarginError::InvalidConfiguration { field, .. }) => assert_eq!(field, "basis"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn range_display() {
    assert_eq!(DateRange::day(ymd(2024, 5, 15)).to_string(), "2024-05-15");
    assert_eq!(
        DateRange::new(ymd(2024, 5, 1), ymd(2024, 5, 15)).to_string(),
        "2024-05-01 .. 2024-05-15"
    );
}

#[test]
fn dates_accept_iso_and_day_first() {
    let want = ymd(2024, 5, 15);
    for s in ["2024-05-15", "15-05-2024", "15/05/2024", "15052024", " 2024-05-15 "] {
        assert_eq!(parse_date(s), Ok(want), "{}", s);
    }
    assert_eq!(
        parse_date("31-02-2024"),
        Err(MarginError::InvalidDate("31-02-2024".into()))
    );
    assert!(parse_date("yesterday").is_err());
}
