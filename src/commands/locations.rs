// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{
    add_location, init_location_schema, list_locations, open_location, remove_location,
    set_setting,
};
use crate::models::{Location, SchemaVariant};
use crate::utils::{currency_symbol, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => {
            let locs = list_locations(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &locs)? {
                let data = locs
                    .into_iter()
                    .map(|l| vec![l.name, l.schema_variant.to_string(), l.db_path])
                    .collect();
                println!("{}", pretty_table(&["Name", "Schema", "Database"], data));
            }
        }
        Some(("remove", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            if remove_location(conn, name)? {
                println!("Removed location '{}'", name);
            } else {
                println!("No location named '{}'", name);
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let path = sub.get_one::<String>("path").unwrap().trim().to_string();
    // Rejects anything but full|reduced before it reaches the registry.
    let schema: SchemaVariant = sub.get_one::<String>("schema").unwrap().parse()?;
    let loc = Location {
        name,
        db_path: path,
        schema_variant: schema,
    };
    if sub.get_flag("init") {
        let lconn = open_location(&loc)?;
        init_location_schema(&lconn, loc.schema_variant)?;
        info!(location = %loc.name, "location schema created");
    }
    add_location(conn, &loc)?;
    println!(
        "Registered location '{}' ({} schema) at {}",
        loc.name, loc.schema_variant, loc.db_path
    );
    Ok(())
}

pub fn handle_config(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-currency", sub)) => {
            let symbol = sub.get_one::<String>("symbol").unwrap().trim();
            set_setting(conn, "currency_symbol", symbol)?;
            println!("Currency symbol set to {}", symbol);
        }
        Some(("show", _)) => {
            let data = vec![vec!["currency_symbol".to_string(), currency_symbol(conn)?]];
            println!("{}", pretty_table(&["Key", "Value"], data));
        }
        _ => {}
    }
    Ok(())
}
