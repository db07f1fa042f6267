// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{RawSale, SchemaVariant};
use crate::period::DateRange;
use crate::utils::check_amount;

/// How `find_sale` interprets its search term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleKey {
    Frame,
    Order,
    Handover,
}

impl SaleKey {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "frame" => Ok(SaleKey::Frame),
            "order" | "spk" => Ok(SaleKey::Order),
            "handover" | "bast" => Ok(SaleKey::Handover),
            other => Err(anyhow!("Unknown search key '{}' (use frame|order|handover)", other)),
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SaleKey::Frame => "h.frame_number",
            SaleKey::Order => "so.form_number",
            SaleKey::Handover => "h.handover_code",
        }
    }
}

/// Where sale rows come from. Implementors state their schema variant
/// explicitly; it is never inferred from the rows.
pub trait SaleSource {
    fn schema_variant(&self) -> SchemaVariant;

    /// Sales handed over within `range`, newest first.
    fn sales_between(&self, range: DateRange) -> Result<Vec<RawSale>>;

    fn find_sale(&self, key: SaleKey, term: &str) -> Result<Option<RawSale>>;
}

pub struct SqliteSource<'c> {
    conn: &'c Connection,
    variant: SchemaVariant,
}

impl<'c> SqliteSource<'c> {
    pub fn new(conn: &'c Connection, variant: SchemaVariant) -> Self {
        SqliteSource { conn, variant }
    }

    fn select_sql(&self) -> String {
        let (subs_ahm, main_dealer, adm_wil) = match self.variant {
            SchemaVariant::Full => (
                "lb.manufacturer_subsidy",
                "lb.main_dealer_subsidy",
                "so.regional_admin_cost",
            ),
            SchemaVariant::Reduced => ("NULL", "NULL", "NULL"),
        };
        format!(
            "SELECT h.handover_code, h.handover_date, so.form_number, h.frame_number,
                    h.engine_number, vm.model_name, so.customer, so.salesperson,
                    so.supervisor, so.payment_method,
                    so.selling_price, iu.redemption_cost, so.discount, so.credit_note,
                    so.broker_commission, lb.down_payment_gross, {subs_ahm}, {main_dealer},
                    vm.notice_cost, so.leasing_installment_advance, so.down_payment,
                    so.leasing_broker_commission, so.central_promo, {adm_wil}, so.savings
             FROM handovers h
             INNER JOIN sale_orders so ON so.order_code = h.order_code
             INNER JOIN vehicle_models vm ON vm.model_code = so.model_code
             LEFT JOIN inbound_units iu ON iu.frame_number = h.frame_number
             LEFT JOIN leasing_billings lb ON lb.handover_code = h.handover_code"
        )
    }
}

const MONEY_COLUMNS: [&str; 15] = [
    "selling_price",
    "redemption_cost",
    "discount",
    "credit_note",
    "broker_commission",
    "down_payment_gross",
    "manufacturer_subsidy",
    "main_dealer_subsidy",
    "notice_cost",
    "leasing_installment_advance",
    "down_payment",
    "leasing_broker_commission",
    "central_promo",
    "regional_admin_cost",
    "savings",
];

/// Read a monetary column stored as INTEGER, REAL or TEXT. NULL and blank
/// text read as `None`; amounts beyond [`check_amount`]'s bound are errors.
pub fn decimal_column(row: &Row<'_>, idx: usize) -> Result<Option<Decimal>> {
    let v = match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Decimal::from(i)),
        ValueRef::Real(f) => Some(
            Decimal::try_from(f)
                .with_context(|| format!("Invalid amount {} in column {}", f, idx))?,
        ),
        ValueRef::Text(t) => {
            let s = std::str::from_utf8(t)?.trim();
            if s.is_empty() {
                None
            } else {
                Some(
                    s.parse::<Decimal>()
                        .with_context(|| format!("Invalid amount '{}' in column {}", s, idx))?,
                )
            }
        }
        ValueRef::Blob(_) => return Err(anyhow!("Unexpected blob in amount column {}", idx)),
    };
    match v {
        Some(d) => Ok(Some(
            check_amount(d).with_context(|| format!("Amount column {}", idx))?,
        )),
        None => Ok(None),
    }
}

fn text(row: &Row<'_>, idx: usize) -> Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn map_row(row: &Row<'_>) -> Result<RawSale> {
    let date_s: Option<String> = row.get(1)?;
    let handover_date = match date_s {
        Some(s) => Some(
            NaiveDate::parse_from_str(s.get(..10).unwrap_or(&s), "%Y-%m-%d")
                .with_context(|| format!("Invalid handover date '{}'", s))?,
        ),
        None => None,
    };
    let mut money = [None; 15];
    for (i, slot) in money.iter_mut().enumerate() {
        *slot = decimal_column(row, 10 + i)
            .with_context(|| format!("Reading {}", MONEY_COLUMNS[i]))?;
    }
    Ok(RawSale {
        handover_code: text(row, 0)?,
        handover_date,
        order_number: text(row, 2)?,
        frame_number: text(row, 3)?,
        engine_number: text(row, 4)?,
        model_name: text(row, 5)?,
        customer: text(row, 6)?,
        salesperson: text(row, 7)?,
        supervisor: text(row, 8)?,
        payment_method: row.get(9)?,
        selling_price: money[0],
        redemption_cost: money[1],
        discount: money[2],
        credit_note: money[3],
        broker_commission: money[4],
        leasing_down_payment_gross: money[5],
        manufacturer_subsidy: money[6],
        main_dealer_subsidy: money[7],
        regional_notice_cost: money[8],
        leasing_installment_advance: money[9],
        down_payment_received: money[10],
        leasing_broker_commission: money[11],
        central_promo_deduction: money[12],
        regional_admin_cost: money[13],
        savings_adjustment: money[14],
    })
}

impl SaleSource for SqliteSource<'_> {
    fn schema_variant(&self) -> SchemaVariant {
        self.variant
    }

    fn sales_between(&self, range: DateRange) -> Result<Vec<RawSale>> {
        let sql = format!(
            "{} WHERE substr(h.handover_date,1,10) BETWEEN ?1 AND ?2
             ORDER BY h.handover_date DESC, h.handover_code DESC",
            self.select_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![range.start.to_string(), range.end.to_string()])?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            out.push(map_row(r)?);
        }
        debug!(%range, rows = out.len(), "sales fetched");
        Ok(out)
    }

    fn find_sale(&self, key: SaleKey, term: &str) -> Result<Option<RawSale>> {
        let sql = format!(
            "{} WHERE {} = ?1 ORDER BY h.handover_date DESC, h.handover_code DESC LIMIT 1",
            self.select_sql(),
            key.column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![term])?;
        match rows.next()? {
            Some(r) => Ok(Some(map_row(r)?)),
            None => Ok(None),
        }
    }
}
