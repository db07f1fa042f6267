// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::location_conn;
use crate::error::MarginError;
use crate::report::margined_sales;
use crate::source::SqliteSource;
use crate::utils::range_args;
use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("margins", sub)) => export_margins(conn, sub),
        _ => Ok(()),
    }
}

const CSV_HEADER: [&str; 11] = [
    "handover_date",
    "handover_code",
    "order_number",
    "frame_number",
    "model_name",
    "supervisor",
    "payment_method",
    "selling_price",
    "redemption_cost",
    "margin",
    "schema_variant",
];

fn export_margins(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    if fmt != "csv" && fmt != "json" {
        return Err(MarginError::InvalidConfiguration {
            field: "format".into(),
            reason: format!("unknown format '{}', expected csv|json", fmt),
        }
        .into());
    }
    let range = range_args(sub)?;
    let (loc, lconn) = location_conn(conn, sub)?;
    let sales = margined_sales(&SqliteSource::new(&lconn, loc.schema_variant), range)?;

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record(CSV_HEADER)?;
        for s in &sales {
            let r = &s.record;
            wtr.write_record([
                r.handover_date.map(|d| d.to_string()).unwrap_or_default(),
                r.handover_code.clone(),
                r.order_number.clone(),
                r.frame_number.clone(),
                r.model_name.clone(),
                r.supervisor.clone(),
                r.payment_method.label().to_string(),
                r.selling_price.to_string(),
                r.redemption_cost.to_string(),
                s.margin.to_string(),
                r.schema_variant.to_string(),
            ])?;
        }
        wtr.flush()?;
    } else {
        std::fs::write(out, serde_json::to_string_pretty(&sales)?)?;
    }
    info!(location = %loc.name, rows = sales.len(), %range, "margins exported");
    println!("Exported {} margins from '{}' to {}", sales.len(), loc.name, out);
    Ok(())
}
