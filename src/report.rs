// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::aggregate::{aggregate, annotate, compare, tally_supervisors};
use crate::db::open_location;
use crate::margin::normalize;
use crate::models::{
    Location, MarginedSale, PeriodComparison, PeriodSummary, SaleRecord, SupervisorTally,
};
use crate::period::{reference, window, ComparisonBasis, DateRange, PeriodKind};
use crate::source::{SaleSource, SqliteSource};

#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    pub kind: PeriodKind,
    pub range: DateRange,
    pub reference_range: DateRange,
    pub summary: PeriodSummary,
    pub reference: PeriodSummary,
    pub comparison: PeriodComparison,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationReport {
    pub location: String,
    pub as_of: NaiveDate,
    pub basis: ComparisonBasis,
    pub periods: Vec<PeriodReport>,
}

impl LocationReport {
    pub fn period(&self, kind: PeriodKind) -> Option<&PeriodReport> {
        self.periods.iter().find(|p| p.kind == kind)
    }
}

/// Normalized records for `range`, using the source's declared variant.
pub fn sale_records<S: SaleSource + ?Sized>(source: &S, range: DateRange) -> Result<Vec<SaleRecord>> {
    let variant = source.schema_variant();
    Ok(source
        .sales_between(range)?
        .iter()
        .map(|raw| normalize(raw, variant))
        .collect())
}

pub fn margined_sales<S: SaleSource + ?Sized>(
    source: &S,
    range: DateRange,
) -> Result<Vec<MarginedSale>> {
    Ok(annotate(sale_records(source, range)?))
}

pub fn build_report<S: SaleSource + ?Sized>(
    source: &S,
    location: &str,
    as_of: NaiveDate,
    basis: ComparisonBasis,
) -> Result<LocationReport> {
    let mut periods = Vec::with_capacity(PeriodKind::ALL.len());
    for kind in PeriodKind::ALL {
        let range = window(kind, as_of);
        let reference_range = reference(range, basis);
        let summary = aggregate(&margined_sales(source, range)?);
        let prior = aggregate(&margined_sales(source, reference_range)?);
        let comparison = compare(&summary, &prior);
        periods.push(PeriodReport {
            kind,
            range,
            reference_range,
            summary,
            reference: prior,
            comparison,
        });
    }
    info!(location, %as_of, "report built");
    Ok(LocationReport {
        location: location.to_string(),
        as_of,
        basis,
        periods,
    })
}

pub fn report_for_location(
    loc: &Location,
    as_of: NaiveDate,
    basis: ComparisonBasis,
) -> Result<LocationReport> {
    let conn = open_location(loc)?;
    let source = SqliteSource::new(&conn, loc.schema_variant);
    build_report(&source, &loc.name, as_of, basis)
}

/// One thread per location, each with its own connection. Results come back
/// in the order of `locations`; one location failing leaves the rest intact.
pub fn build_reports_parallel(
    locations: &[Location],
    as_of: NaiveDate,
    basis: ComparisonBasis,
) -> Vec<Result<LocationReport>> {
    std::thread::scope(|s| {
        let handles: Vec<_> = locations
            .iter()
            .map(|loc| s.spawn(move || report_for_location(loc, as_of, basis)))
            .collect();
        handles
            .into_iter()
            .zip(locations)
            .map(|(h, loc)| {
                h.join()
                    .unwrap_or_else(|_| Err(anyhow!("Report thread for '{}' panicked", loc.name)))
            })
            .collect()
    })
}

/// Supervisor unit counts across `locations`, sorted by location then name.
pub fn supervisor_report(locations: &[Location], as_of: NaiveDate) -> Result<Vec<SupervisorTally>> {
    let ytd = window(PeriodKind::YearToDate, as_of);
    let mut out = Vec::new();
    for loc in locations {
        let conn = open_location(loc)?;
        let source = SqliteSource::new(&conn, loc.schema_variant);
        let records = sale_records(&source, ytd)?;
        out.extend(tally_supervisors(&loc.name, &records, as_of));
    }
    out.sort_by(|a, b| (&a.location, &a.supervisor).cmp(&(&b.location, &b.supervisor)));
    Ok(out)
}
