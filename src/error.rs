// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures the margin core can report. Formula and aggregation code never
/// produce these; they come from the boundary where configuration and user
/// input are validated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarginError {
    #[error("Invalid configuration: {field} ({reason})")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Location '{0}' not found")]
    UnknownLocation(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD, DD-MM-YYYY, DD/MM/YYYY or DDMMYYYY")]
    InvalidDate(String),
}
