// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{get_location, init_location_schema, open_location};
use crate::models::SchemaVariant;
use crate::utils::{parse_date, parse_decimal};
use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord};
use rusqlite::{Connection, ToSql, params, params_from_iter};
use std::collections::HashMap;
use tracing::{info, warn};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("sales", sub)) => import_sales(conn, sub),
        _ => Ok(()),
    }
}

const ORDER_TEXT_COLUMNS: [&str; 7] = [
    "order_code",
    "form_number",
    "payment_method",
    "customer",
    "salesperson",
    "supervisor",
    "model_code",
];

/// (CSV header, `sale_orders` column) pairs present in both schema variants.
const ORDER_AMOUNTS: [(&str, &str); 9] = [
    ("selling_price", "selling_price"),
    ("discount", "discount"),
    ("credit_note", "credit_note"),
    ("broker_commission", "broker_commission"),
    ("leasing_installment_advance", "leasing_installment_advance"),
    ("down_payment_received", "down_payment"),
    ("leasing_broker_commission", "leasing_broker_commission"),
    ("central_promo_deduction", "central_promo"),
    ("savings_adjustment", "savings"),
];

/// Columns a reduced-schema database has no place for.
const FULL_ONLY: [&str; 3] = [
    "manufacturer_subsidy",
    "main_dealer_subsidy",
    "regional_admin_cost",
];

struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Columns(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
                .collect(),
        )
    }

    fn get<'r>(&self, rec: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.0
            .get(name)
            .and_then(|i| rec.get(*i))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    fn require<'r>(&self, rec: &'r StringRecord, name: &str, line: u64) -> Result<&'r str> {
        self.get(rec, name)
            .with_context(|| format!("Line {}: {} missing", line, name))
    }

    /// Validated amount, kept in its textual form for storage.
    fn amount(&self, rec: &StringRecord, name: &str, line: u64) -> Result<Option<String>> {
        match self.get(rec, name) {
            Some(s) => {
                let d = parse_decimal(s).with_context(|| format!("Line {}: {}", line, name))?;
                Ok(Some(d.to_string()))
            }
            None => Ok(None),
        }
    }
}

fn import_sales(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let loc = get_location(conn, sub.get_one::<String>("location").unwrap())?;
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;
    let cols = Columns::new(rdr.headers()?);

    let mut lconn = open_location(&loc)?;
    init_location_schema(&lconn, loc.schema_variant)?;
    let full = loc.schema_variant == SchemaVariant::Full;

    let tx = lconn.transaction()?;
    let mut count = 0usize;
    for result in rdr.records() {
        let rec = result?;
        let line = rec.position().map(|p| p.line()).unwrap_or(0);

        let handover_code = cols.require(&rec, "handover_code", line)?;
        let date_raw = cols.require(&rec, "handover_date", line)?;
        let date = parse_date(date_raw)
            .with_context(|| format!("Line {}: invalid handover date", line))?;
        let frame = cols.require(&rec, "frame_number", line)?;
        let model_code = cols.require(&rec, "model_code", line)?;
        let order = cols.get(&rec, "order_number").unwrap_or(handover_code);
        let model_name = cols.get(&rec, "model_name");

        if !full {
            for name in FULL_ONLY {
                if let Some(v) = cols.amount(&rec, name, line)? {
                    if parse_decimal(&v)?.is_zero() {
                        continue;
                    }
                    warn!(line, column = name, value = %v, location = %loc.name,
                        "reduced schema has no such column; value ignored");
                }
            }
        }

        // Model data is shared by every sale of the model; blanks keep what is stored.
        let notice = cols.amount(&rec, "regional_notice_cost", line)?;
        tx.execute(
            "INSERT INTO vehicle_models(model_code, model_name, notice_cost)
             VALUES (?1, COALESCE(?2, ?1), ?3)
             ON CONFLICT(model_code) DO UPDATE SET
                 model_name=COALESCE(?2, vehicle_models.model_name),
                 notice_cost=COALESCE(excluded.notice_cost, vehicle_models.notice_cost)",
            params![model_code, model_name, notice],
        )?;

        let mut amount_cols = ORDER_AMOUNTS.to_vec();
        if full {
            amount_cols.push(("regional_admin_cost", "regional_admin_cost"));
        }
        let amounts = amount_cols
            .iter()
            .map(|(csv_name, _)| cols.amount(&rec, csv_name, line))
            .collect::<Result<Vec<_>>>()?;
        let texts = ["payment_method", "customer", "salesperson", "supervisor"]
            .map(|name| cols.get(&rec, name));

        let mut values: Vec<&dyn ToSql> = vec![&order as &dyn ToSql, &order];
        values.extend(texts.iter().map(|t| t as &dyn ToSql));
        values.push(&model_code);
        values.extend(amounts.iter().map(|a| a as &dyn ToSql));
        let columns: Vec<&str> = ORDER_TEXT_COLUMNS
            .iter()
            .copied()
            .chain(amount_cols.iter().map(|(_, db_col)| *db_col))
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        tx.execute(
            &format!(
                "INSERT OR REPLACE INTO sale_orders({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(",")
            ),
            params_from_iter(values),
        )?;

        tx.execute(
            "INSERT OR REPLACE INTO handovers(handover_code, order_code, handover_date,
                 frame_number, engine_number) VALUES (?1,?2,?3,?4,?5)",
            params![
                handover_code,
                order,
                date.to_string(),
                frame,
                cols.get(&rec, "engine_number")
            ],
        )?;

        // A blank cell clears a previously imported value for this unit.
        match cols.amount(&rec, "redemption_cost", line)? {
            Some(cost) => tx.execute(
                "INSERT OR REPLACE INTO inbound_units(frame_number, redemption_cost) VALUES (?1,?2)",
                params![frame, cost],
            )?,
            None => tx.execute(
                "DELETE FROM inbound_units WHERE frame_number=?1",
                params![frame],
            )?,
        };

        let dp_gross = cols.amount(&rec, "leasing_down_payment_gross", line)?;
        if full {
            let subs = cols.amount(&rec, "manufacturer_subsidy", line)?;
            let main = cols.amount(&rec, "main_dealer_subsidy", line)?;
            if dp_gross.is_some() || subs.is_some() || main.is_some() {
                tx.execute(
                    "INSERT OR REPLACE INTO leasing_billings(handover_code, down_payment_gross,
                         manufacturer_subsidy, main_dealer_subsidy) VALUES (?1,?2,?3,?4)",
                    params![handover_code, dp_gross, subs, main],
                )?;
            } else {
                clear_billing(&tx, handover_code)?;
            }
        } else if dp_gross.is_some() {
            tx.execute(
                "INSERT OR REPLACE INTO leasing_billings(handover_code, down_payment_gross)
                 VALUES (?1,?2)",
                params![handover_code, dp_gross],
            )?;
        } else {
            clear_billing(&tx, handover_code)?;
        }
        count += 1;
    }
    if count == 0 {
        return Err(anyhow!("No sale rows found in {}", path));
    }
    tx.commit()?;
    info!(location = %loc.name, rows = count, "sales imported");
    println!("Imported {} sales into '{}' from {}", count, loc.name, path);
    Ok(())
}

fn clear_billing(conn: &Connection, handover_code: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM leasing_billings WHERE handover_code=?1",
        params![handover_code],
    )?;
    Ok(())
}
