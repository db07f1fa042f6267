// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod doctor;
pub mod exporter;
pub mod importer;
pub mod locations;
pub mod margins;
pub mod reports;

use anyhow::Result;
use rusqlite::Connection;

use crate::db::{get_location, open_location};
use crate::models::Location;

/// Resolve `--location` against the registry and open its database.
pub fn location_conn(conn: &Connection, sub: &clap::ArgMatches) -> Result<(Location, Connection)> {
    let loc = get_location(conn, sub.get_one::<String>("location").unwrap())?;
    let lconn = open_location(&loc)?;
    Ok((loc, lconn))
}
