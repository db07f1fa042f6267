// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::db::get_setting;
use crate::error::MarginError;
use crate::period::DateRange;

static DAY_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})[-/]?(\d{2})[-/]?(\d{4})$").expect("valid regex"));

/// Accepts `YYYY-MM-DD`, `DD-MM-YYYY`, `DD/MM/YYYY` and `DDMMYYYY`.
pub fn parse_date(s: &str) -> Result<NaiveDate, MarginError> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    let caps = DAY_FIRST
        .captures(s)
        .ok_or_else(|| MarginError::InvalidDate(s.to_string()))?;
    let day: u32 = caps[1].parse().map_err(|_| MarginError::InvalidDate(s.to_string()))?;
    let month: u32 = caps[2].parse().map_err(|_| MarginError::InvalidDate(s.to_string()))?;
    let year: i32 = caps[3].parse().map_err(|_| MarginError::InvalidDate(s.to_string()))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| MarginError::InvalidDate(s.to_string()))
}

/// Largest absolute amount accepted from CSV or a location database. Sums of
/// the margin formula and period totals stay far inside `Decimal`'s range.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

pub fn check_amount(d: Decimal) -> Result<Decimal> {
    if d.abs() > Decimal::from(MAX_AMOUNT) {
        anyhow::bail!("Amount {} exceeds {}", d, MAX_AMOUNT);
    }
    Ok(d)
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    let d = s
        .trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))?;
    check_amount(d)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `--date`, or today.
pub fn as_of_arg(sub: &clap::ArgMatches) -> Result<NaiveDate> {
    match sub.get_one::<String>("date") {
        Some(s) => Ok(parse_date(s)?),
        None => Ok(today()),
    }
}

/// `--from`/`--to`; `to` defaults to today and `from` to a week before `to`.
pub fn range_args(sub: &clap::ArgMatches) -> Result<DateRange> {
    let end = match sub.get_one::<String>("to") {
        Some(s) => parse_date(s)?,
        None => today(),
    };
    let start = match sub.get_one::<String>("from") {
        Some(s) => parse_date(s)?,
        None => end - Duration::days(7),
    };
    if start > end {
        anyhow::bail!("--from {} is after --to {}", start, end);
    }
    Ok(DateRange::new(start, end))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Whole-currency amount with thousands separators, e.g. `Rp 4,500,000`.
pub fn fmt_money(d: &Decimal, symbol: &str) -> String {
    let rounded = d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{} {}", sign, symbol, group_thousands(&digits))
}

/// Signed percentage with two places; zero prints unsigned.
pub fn fmt_pct(d: &Decimal) -> String {
    let r = d.round_dp(2);
    if r.is_zero() {
        "0.00%".to_string()
    } else {
        format!("{:+.2}%", r)
    }
}

pub fn currency_symbol(conn: &Connection) -> Result<String> {
    get_setting(conn, "currency_symbol", "Rp")
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
