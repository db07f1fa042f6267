// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::margin::compute_margin;
use crate::models::{
    MarginedSale, PeriodComparison, PeriodSummary, SaleRecord, SupervisorTally,
};
use crate::period::{window, PeriodKind};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

pub fn annotate(records: Vec<SaleRecord>) -> Vec<MarginedSale> {
    records
        .into_iter()
        .map(|record| {
            let margin = compute_margin(&record);
            MarginedSale { record, margin }
        })
        .collect()
}

/// Summarize one period. An empty slice gives [`PeriodSummary::empty`].
pub fn aggregate(sales: &[MarginedSale]) -> PeriodSummary {
    let mut summary = PeriodSummary::empty();
    for s in sales {
        summary.unit_count += 1;
        summary.total_revenue += s.record.selling_price;
        summary.total_cost += s.record.redemption_cost;
        summary.total_margin += s.margin;
        let bucket = summary
            .by_payment_method
            .entry(s.record.payment_method)
            .or_default();
        bucket.count += 1;
        bucket.total_margin += s.margin;
    }
    if summary.unit_count > 0 {
        summary.average_margin = summary.total_margin / Decimal::from(summary.unit_count);
    }
    if summary.total_cost > Decimal::ZERO {
        summary.margin_percentage = percent_of(summary.total_margin, summary.total_cost);
    }
    summary
}

/// `part / whole * 100`, or zero when the quotient leaves `Decimal`'s range
/// (a near-zero `whole`).
fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .and_then(|q| q.checked_mul(HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

fn pct_change(current: Decimal, reference: Decimal) -> Decimal {
    if reference > Decimal::ZERO {
        percent_of(current - reference, reference)
    } else {
        Decimal::ZERO
    }
}

/// Deltas of `current` against `reference`. A zero reference yields zero
/// percentages; "no prior data" is an ordinary state for these reports.
pub fn compare(current: &PeriodSummary, reference: &PeriodSummary) -> PeriodComparison {
    let cur_units = Decimal::from(current.unit_count);
    let ref_units = Decimal::from(reference.unit_count);
    PeriodComparison {
        unit_delta: current.unit_count as i64 - reference.unit_count as i64,
        unit_delta_pct: pct_change(cur_units, ref_units),
        value_delta: current.total_cost - reference.total_cost,
        value_delta_pct: pct_change(current.total_cost, reference.total_cost),
        margin_delta: current.total_margin - reference.total_margin,
        reference_units: reference.unit_count,
        reference_value: reference.total_cost,
    }
}

/// Delivered units per supervisor for the day, month and year ending on
/// `as_of`. Sales without a handover date are not counted.
pub fn tally_supervisors(
    location: &str,
    sales: &[SaleRecord],
    as_of: NaiveDate,
) -> Vec<SupervisorTally> {
    let today = window(PeriodKind::Daily, as_of);
    let mtd = window(PeriodKind::MonthToDate, as_of);
    let ytd = window(PeriodKind::YearToDate, as_of);

    let mut by_name: BTreeMap<&str, (u64, u64, u64)> = BTreeMap::new();
    for s in sales {
        let Some(d) = s.handover_date else { continue };
        if !ytd.contains(d) {
            continue;
        }
        let e = by_name.entry(s.supervisor.as_str()).or_default();
        e.2 += 1;
        if mtd.contains(d) {
            e.1 += 1;
        }
        if today.contains(d) {
            e.0 += 1;
        }
    }
    by_name
        .into_iter()
        .map(|(name, (t, m, y))| SupervisorTally {
            location: location.to_string(),
            supervisor: name.to_string(),
            today: t,
            month_to_date: m,
            year_to_date: y,
        })
        .collect()
}

