// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::MarginError;
use crate::models::{Location, SchemaVariant};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Dealermargin", "dealermargin"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("dealermargin.sqlite"))
}

/// Open the location registry, at `override_path` when given.
pub fn open_or_init(override_path: Option<&Path>) -> Result<Connection> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => db_path()?,
    };
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    debug!(path = %path.display(), "registry opened");
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS locations(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        db_path TEXT NOT NULL,
        schema_variant TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )?;
    Ok(())
}

pub fn add_location(conn: &Connection, loc: &Location) -> Result<()> {
    conn.execute(
        "INSERT INTO locations(name, db_path, schema_variant) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET db_path=excluded.db_path, schema_variant=excluded.schema_variant",
        params![loc.name, loc.db_path, loc.schema_variant.as_str()],
    )?;
    Ok(())
}

pub fn remove_location(conn: &Connection, name: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM locations WHERE name=?1", params![name])?;
    Ok(n > 0)
}

fn location_from_row(name: String, db_path: String, schema: String) -> Result<Location> {
    let schema_variant = schema
        .parse::<SchemaVariant>()
        .with_context(|| format!("Location '{}' has a bad schema variant", name))?;
    Ok(Location {
        name,
        db_path,
        schema_variant,
    })
}

pub fn get_location(conn: &Connection, name: &str) -> Result<Location> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT name, db_path, schema_variant FROM locations WHERE name=?1",
            params![name],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let (n, p, s) = row.ok_or_else(|| MarginError::UnknownLocation(name.to_string()))?;
    location_from_row(n, p, s)
}

pub fn list_locations(conn: &Connection) -> Result<Vec<Location>> {
    let mut stmt =
        conn.prepare("SELECT name, db_path, schema_variant FROM locations ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (n, p, s) = row?;
        out.push(location_from_row(n, p, s)?);
    }
    Ok(out)
}

pub fn get_setting(conn: &Connection, key: &str, default: &str) -> Result<String> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v.unwrap_or_else(|| default.to_string()))
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn open_location(loc: &Location) -> Result<Connection> {
    let conn = Connection::open(&loc.db_path)
        .with_context(|| format!("Open location '{}' DB at {}", loc.name, loc.db_path))?;
    debug!(location = %loc.name, schema = %loc.schema_variant, "location DB opened");
    Ok(conn)
}

/// Create the dealership tables for `variant`. The reduced layout has no
/// subsidy columns on leasing billings and no regional admin cost on orders.
pub fn init_location_schema(conn: &Connection, variant: SchemaVariant) -> Result<()> {
    let (order_extra, billing_extra) = match variant {
        SchemaVariant::Full => (
            ",\n        regional_admin_cost TEXT",
            ",\n        manufacturer_subsidy TEXT,\n        main_dealer_subsidy TEXT",
        ),
        SchemaVariant::Reduced => ("", ""),
    };
    conn.execute_batch(&format!(
        r#"
    CREATE TABLE IF NOT EXISTS vehicle_models(
        model_code TEXT PRIMARY KEY,
        model_name TEXT NOT NULL,
        notice_cost TEXT
    );

    CREATE TABLE IF NOT EXISTS sale_orders(
        order_code TEXT PRIMARY KEY,
        form_number TEXT NOT NULL,
        payment_method TEXT,
        customer TEXT,
        salesperson TEXT,
        supervisor TEXT,
        model_code TEXT NOT NULL,
        selling_price TEXT,
        discount TEXT,
        credit_note TEXT,
        broker_commission TEXT,
        leasing_installment_advance TEXT,
        down_payment TEXT,
        leasing_broker_commission TEXT,
        central_promo TEXT,
        savings TEXT{order_extra},
        FOREIGN KEY(model_code) REFERENCES vehicle_models(model_code)
    );

    CREATE TABLE IF NOT EXISTS handovers(
        handover_code TEXT PRIMARY KEY,
        order_code TEXT NOT NULL,
        handover_date TEXT NOT NULL,
        frame_number TEXT NOT NULL,
        engine_number TEXT,
        FOREIGN KEY(order_code) REFERENCES sale_orders(order_code)
    );
    CREATE INDEX IF NOT EXISTS idx_handovers_date ON handovers(handover_date);

    CREATE TABLE IF NOT EXISTS inbound_units(
        frame_number TEXT PRIMARY KEY,
        redemption_cost TEXT
    );

    CREATE TABLE IF NOT EXISTS leasing_billings(
        handover_code TEXT PRIMARY KEY,
        down_payment_gross TEXT{billing_extra}
    );
    "#
    ))?;
    Ok(())
}
