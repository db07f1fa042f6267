// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::aggregate;
use crate::commands::location_conn;
use crate::margin::{breakdown, normalize, payment_split_margin, MarginBreakdown};
use crate::models::{MarginedSale, PaymentMethod, PeriodSummary, SaleRecord};
use crate::report::{margined_sales, sale_records};
use crate::source::{SaleKey, SaleSource, SqliteSource};
use crate::utils::{currency_symbol, fmt_money, fmt_pct, maybe_print_json, pretty_table, range_args};
use anyhow::{anyhow, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => show(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("reconcile", sub)) => reconcile(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct VehicleMargin {
    record: SaleRecord,
    breakdown: MarginBreakdown,
    payment_split_margin: Decimal,
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let term = sub.get_one::<String>("term").unwrap().trim();
    let key = SaleKey::parse(sub.get_one::<String>("by").unwrap())?;
    let (loc, lconn) = location_conn(conn, sub)?;
    let source = SqliteSource::new(&lconn, loc.schema_variant);
    let raw = source
        .find_sale(key, term)?
        .ok_or_else(|| anyhow!("No vehicle found for '{}' in '{}'", term, loc.name))?;
    let record = normalize(&raw, source.schema_variant());
    let out = VehicleMargin {
        breakdown: breakdown(&record),
        payment_split_margin: payment_split_margin(&record),
        record,
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        return Ok(());
    }

    let sym = currency_symbol(conn)?;
    let r = &out.record;
    let b = &out.breakdown;
    println!(
        "{} - {} | handover {} | order {} | {} | {}",
        r.frame_number,
        r.model_name,
        r.handover_code,
        r.order_number,
        r.handover_date.map(|d| d.to_string()).unwrap_or_default(),
        r.payment_method.label()
    );
    let m = |d: &Decimal| fmt_money(d, &sym);
    let components = vec![
        vec!["Selling price".into(), m(&r.selling_price)],
        vec!["Redemption cost".into(), m(&r.redemption_cost)],
        vec!["Discount".into(), m(&r.discount)],
        vec!["Credit note".into(), m(&r.credit_note)],
        vec!["Broker commission".into(), m(&r.broker_commission)],
        vec!["Leasing DP gross".into(), m(&r.leasing_down_payment_gross)],
        vec!["Manufacturer subsidy".into(), m(&r.manufacturer_subsidy)],
        vec!["Main dealer subsidy".into(), m(&r.main_dealer_subsidy)],
        vec!["Notice cost".into(), m(&r.regional_notice_cost)],
        vec!["Leasing installment advance".into(), m(&r.leasing_installment_advance)],
        vec!["Down payment".into(), m(&r.down_payment_received)],
        vec!["Leasing broker commission".into(), m(&r.leasing_broker_commission)],
        vec!["Central promo".into(), m(&r.central_promo_deduction)],
        vec!["Regional admin cost".into(), m(&r.regional_admin_cost)],
        vec!["Savings".into(), m(&r.savings_adjustment)],
    ];
    println!("{}", pretty_table(&["Component", "Amount"], components));

    let steps = vec![
        vec![
            "Leasing adjustment".into(),
            "installment advance - down payment + leasing broker commission".into(),
            m(&b.leasing_adjustment),
        ],
        vec![
            "Discount factor".into(),
            "discount + credit note + broker commission".into(),
            m(&b.discount_factor),
        ],
        vec![
            "Subsidy factor".into(),
            "manufacturer + main dealer subsidy".into(),
            m(&b.subsidy_factor),
        ],
        vec![
            "Cost factor".into(),
            "redemption + discount factor + dp gross - subsidy factor - notice + leasing adjustment - central promo".into(),
            m(&b.cost_factor),
        ],
        vec![
            "Margin".into(),
            "selling price - cost factor - regional admin + savings".into(),
            m(&b.margin),
        ],
    ];
    println!("{}", pretty_table(&["Step", "Formula", "Value"], steps));
    let diff = b.margin - out.payment_split_margin;
    if !diff.is_zero() {
        println!(
            "Payment-split formula gives {} (difference {})",
            m(&out.payment_split_margin),
            m(&diff)
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct MarginList {
    sales: Vec<MarginedSale>,
    summary: PeriodSummary,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let range = range_args(sub)?;
    let (loc, lconn) = location_conn(conn, sub)?;
    let source = SqliteSource::new(&lconn, loc.schema_variant);
    let mut sales = margined_sales(&source, range)?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sales.truncate(*limit);
    }
    let summary = aggregate(&sales);
    let summary_only = sub.get_flag("summary-only");

    let out = MarginList {
        sales: if summary_only { Vec::new() } else { sales },
        summary,
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        return Ok(());
    }

    let sym = currency_symbol(conn)?;
    println!("{}: {} vehicles handed over {}", loc.name, out.summary.unit_count, range);
    if !summary_only {
        let rows = out
            .sales
            .iter()
            .map(|s| {
                vec![
                    s.record
                        .handover_date
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                    s.record.handover_code.clone(),
                    s.record.frame_number.clone(),
                    s.record.model_name.clone(),
                    s.record.payment_method.label().to_string(),
                    fmt_money(&s.record.selling_price, &sym),
                    fmt_money(&s.record.redemption_cost, &sym),
                    fmt_money(&s.margin, &sym),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Handover", "Frame", "Model", "Payment", "Selling", "Cost", "Margin"],
                rows,
            )
        );
    }
    println!("{}", summary_table(&out.summary, &sym));
    Ok(())
}

pub fn summary_table(s: &PeriodSummary, sym: &str) -> comfy_table::Table {
    let cash = s.bucket(PaymentMethod::Cash);
    let credit = s.bucket(PaymentMethod::Credit);
    let rows = vec![
        vec!["Units".into(), s.unit_count.to_string()],
        vec!["  cash (TUNAI)".into(), cash.count.to_string()],
        vec!["  credit (KREDIT)".into(), credit.count.to_string()],
        vec!["Total selling price".into(), fmt_money(&s.total_revenue, sym)],
        vec!["Total redemption cost".into(), fmt_money(&s.total_cost, sym)],
        vec!["Total margin".into(), fmt_money(&s.total_margin, sym)],
        vec!["  cash margin".into(), fmt_money(&cash.total_margin, sym)],
        vec!["  credit margin".into(), fmt_money(&credit.total_margin, sym)],
        vec!["Average margin".into(), fmt_money(&s.average_margin, sym)],
        vec!["Margin / cost".into(), fmt_pct(&s.margin_percentage)],
    ];
    pretty_table(&["Summary", "Value"], rows)
}

#[derive(Debug, Serialize)]
pub struct Divergence {
    pub handover_code: String,
    pub payment_method: PaymentMethod,
    pub margin: Decimal,
    pub payment_split_margin: Decimal,
    pub difference: Decimal,
}

/// Records whose canonical margin differs from the payment-split formula.
pub fn divergences(records: &[SaleRecord]) -> Vec<Divergence> {
    records
        .iter()
        .filter_map(|r| {
            let margin = breakdown(r).margin;
            let split = payment_split_margin(r);
            let difference = margin - split;
            (!difference.is_zero()).then(|| Divergence {
                handover_code: r.handover_code.clone(),
                payment_method: r.payment_method,
                margin,
                payment_split_margin: split,
                difference,
            })
        })
        .collect()
}

fn reconcile(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let range = range_args(sub)?;
    let (loc, lconn) = location_conn(conn, sub)?;
    let source = SqliteSource::new(&lconn, loc.schema_variant);
    let records = sale_records(&source, range)?;
    let found = divergences(&records);
    info!(location = %loc.name, checked = records.len(), diverging = found.len(), "reconcile");
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &found)? {
        return Ok(());
    }
    if found.is_empty() {
        println!("{}: both formulas agree on all {} vehicles", loc.name, records.len());
        return Ok(());
    }
    let sym = currency_symbol(conn)?;
    let rows = found
        .iter()
        .map(|d| {
            vec![
                d.handover_code.clone(),
                d.payment_method.label().to_string(),
                fmt_money(&d.margin, &sym),
                fmt_money(&d.payment_split_margin, &sym),
                fmt_money(&d.difference, &sym),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Handover", "Payment", "Margin", "Payment-split", "Difference"],
            rows
        )
    );
    println!(
        "{} of {} vehicles differ; summaries use the Margin column.",
        found.len(),
        records.len()
    );
    Ok(())
}
