// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::margins::summary_table;
use crate::db::{get_location, list_locations};
use crate::models::PaymentMethod;
use crate::period::ComparisonBasis;
use crate::report::{
    build_reports_parallel, report_for_location, supervisor_report, LocationReport,
};
use crate::utils::{as_of_arg, currency_symbol, fmt_money, fmt_pct, maybe_print_json, pretty_table};
use anyhow::{bail, Result};
use rusqlite::Connection;
use tracing::error;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("period", sub)) => period(conn, sub)?,
        Some(("all", sub)) => all(conn, sub)?,
        Some(("supervisors", sub)) => supervisors(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn basis_arg(sub: &clap::ArgMatches) -> Result<ComparisonBasis> {
    Ok(sub.get_one::<String>("basis").unwrap().parse()?)
}

fn period(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = as_of_arg(sub)?;
    let basis = basis_arg(sub)?;
    let loc = get_location(conn, sub.get_one::<String>("location").unwrap())?;
    let report = report_for_location(&loc, as_of, basis)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    print_report(&report, &currency_symbol(conn)?);
    Ok(())
}

fn all(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = as_of_arg(sub)?;
    let basis = basis_arg(sub)?;
    let locations = list_locations(conn)?;
    if locations.is_empty() {
        bail!("No locations registered. Use `location add` first.");
    }
    let sym = currency_symbol(conn)?;
    let mut reports = Vec::new();
    let mut failed = 0usize;
    for (loc, result) in locations.iter().zip(build_reports_parallel(&locations, as_of, basis)) {
        match result {
            Ok(r) => reports.push(r),
            Err(e) => {
                failed += 1;
                error!(location = %loc.name, error = %e, "report failed");
                eprintln!("{}: {:#}", loc.name, e);
            }
        }
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &reports)? {
        for r in &reports {
            print_report(r, &sym);
            println!();
        }
    }
    if failed == locations.len() {
        bail!("Every location failed to report");
    }
    Ok(())
}

fn print_report(r: &LocationReport, sym: &str) {
    println!(
        "{} as of {} (compared with {})",
        r.location,
        r.as_of,
        r.basis.label()
    );
    let rows = r
        .periods
        .iter()
        .map(|p| {
            let s = &p.summary;
            let c = &p.comparison;
            vec![
                p.kind.label().to_string(),
                p.range.to_string(),
                s.unit_count.to_string(),
                s.bucket(PaymentMethod::Cash).count.to_string(),
                s.bucket(PaymentMethod::Credit).count.to_string(),
                fmt_money(&s.total_cost, sym),
                fmt_money(&s.total_margin, sym),
                fmt_pct(&s.margin_percentage),
                format!("{:+} ({})", c.unit_delta, fmt_pct(&c.unit_delta_pct)),
                format!("{} ({})", fmt_money(&c.value_delta, sym), fmt_pct(&c.value_delta_pct)),
                fmt_money(&c.margin_delta, sym),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &[
                "Period", "Range", "Units", "Cash", "Credit", "Cost", "Margin", "Margin %",
                "Units vs ref", "Cost vs ref", "Margin vs ref",
            ],
            rows,
        )
    );
    if let Some(last) = r.periods.last() {
        println!("{}", summary_table(&last.summary, sym));
    }
}

fn supervisors(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = as_of_arg(sub)?;
    let locations = list_locations(conn)?;
    let tallies = supervisor_report(&locations, as_of)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &tallies)? {
        return Ok(());
    }
    let rows = tallies
        .into_iter()
        .map(|t| {
            vec![
                t.location,
                t.supervisor,
                t.today.to_string(),
                t.month_to_date.to_string(),
                t.year_to_date.to_string(),
            ]
        })
        .collect();
    println!("Supervisor units as of {}", as_of);
    println!(
        "{}",
        pretty_table(&["Location", "Supervisor", "Today", "MTD", "YTD"], rows)
    );
    Ok(())
}
