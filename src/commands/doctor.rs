// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::location_conn;
use crate::models::RawSale;
use crate::source::{SaleSource, SqliteSource};
use crate::utils::{pretty_table, range_args};
use anyhow::Result;
use rusqlite::Connection;
use tracing::warn;

/// Data gaps that silently turn into zeros in the margin.
pub fn check_sales(sales: &[RawSale]) -> Vec<(String, String)> {
    let mut issues = Vec::new();
    for s in sales {
        if s.selling_price.is_none() {
            issues.push(("missing_selling_price".into(), s.handover_code.clone()));
        }
        // No inbound unit linked to the frame.
        if s.redemption_cost.is_none() {
            issues.push((
                "missing_redemption_cost".into(),
                format!("{} ({})", s.handover_code, s.frame_number),
            ));
        }
        if let Some(pm) = s.payment_method.as_deref() {
            let pm = pm.trim();
            let known = pm.is_empty()
                || pm.eq_ignore_ascii_case("TUNAI")
                || pm.eq_ignore_ascii_case("KREDIT");
            if !known {
                issues.push((
                    "unknown_payment_method".into(),
                    format!("{} '{}' counted as cash", s.handover_code, pm),
                ));
            }
        }
    }
    issues
}

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let range = range_args(sub)?;
    let (loc, lconn) = location_conn(conn, sub)?;
    let sales = SqliteSource::new(&lconn, loc.schema_variant).sales_between(range)?;
    let rows: Vec<Vec<String>> = check_sales(&sales)
        .into_iter()
        .map(|(issue, detail)| vec![issue, detail])
        .collect();

    if rows.is_empty() {
        println!("✅ doctor: no issues found in {} ({} sales)", loc.name, sales.len());
    } else {
        warn!(location = %loc.name, issues = rows.len(), "data gaps found");
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
