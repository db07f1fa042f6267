// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MarginError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Cash,
    Credit,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::Cash, PaymentMethod::Credit];

    /// Only a (trimmed, case-insensitive) "KREDIT" is credit; anything else,
    /// including a missing value, is cash.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("KREDIT") => PaymentMethod::Credit,
            _ => PaymentMethod::Cash,
        }
    }

    /// Label used by the dealership's own records.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "TUNAI",
            PaymentMethod::Credit => "KREDIT",
        }
    }
}

/// Which subset of subsidy/administrative fields a data source exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    Full,
    Reduced,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVariant::Full => "full",
            SchemaVariant::Reduced => "reduced",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVariant {
    type Err = MarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(SchemaVariant::Full),
            "reduced" => Ok(SchemaVariant::Reduced),
            other => Err(MarginError::InvalidConfiguration {
                field: "schema_variant".into(),
                reason: format!("unknown variant '{}', expected full|reduced", other),
            }),
        }
    }
}

/// One sale row exactly as the data source returned it. Monetary fields are
/// `None` wherever the source had NULL (or a LEFT JOIN found nothing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSale {
    pub handover_code: String,
    pub handover_date: Option<NaiveDate>,
    pub order_number: String,
    pub frame_number: String,
    pub engine_number: String,
    pub model_name: String,
    pub customer: String,
    pub salesperson: String,
    pub supervisor: String,
    pub payment_method: Option<String>,

    pub selling_price: Option<Decimal>,
    pub redemption_cost: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub credit_note: Option<Decimal>,
    pub broker_commission: Option<Decimal>,
    pub leasing_down_payment_gross: Option<Decimal>,
    pub manufacturer_subsidy: Option<Decimal>,
    pub main_dealer_subsidy: Option<Decimal>,
    pub regional_notice_cost: Option<Decimal>,
    pub leasing_installment_advance: Option<Decimal>,
    pub down_payment_received: Option<Decimal>,
    pub leasing_broker_commission: Option<Decimal>,
    pub central_promo_deduction: Option<Decimal>,
    pub regional_admin_cost: Option<Decimal>,
    pub savings_adjustment: Option<Decimal>,
}

/// A sale with every monetary field resolved. Build one with
/// [`crate::margin::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub handover_code: String,
    pub handover_date: Option<NaiveDate>,
    pub order_number: String,
    pub frame_number: String,
    pub model_name: String,
    pub supervisor: String,
    pub payment_method: PaymentMethod,
    pub schema_variant: SchemaVariant,

    pub selling_price: Decimal,
    pub redemption_cost: Decimal,
    pub discount: Decimal,
    pub credit_note: Decimal,
    pub broker_commission: Decimal,
    pub leasing_down_payment_gross: Decimal,
    pub manufacturer_subsidy: Decimal,
    pub main_dealer_subsidy: Decimal,
    pub regional_notice_cost: Decimal,
    pub leasing_installment_advance: Decimal,
    pub down_payment_received: Decimal,
    pub leasing_broker_commission: Decimal,
    pub central_promo_deduction: Decimal,
    pub regional_admin_cost: Decimal,
    pub savings_adjustment: Decimal,
}

impl SaleRecord {
    /// All-zero cash sale; handy as a base for struct-update syntax.
    pub fn zeroed(schema_variant: SchemaVariant) -> Self {
        SaleRecord {
            handover_code: String::new(),
            handover_date: None,
            order_number: String::new(),
            frame_number: String::new(),
            model_name: String::new(),
            supervisor: String::new(),
            payment_method: PaymentMethod::Cash,
            schema_variant,
            selling_price: Decimal::ZERO,
            redemption_cost: Decimal::ZERO,
            discount: Decimal::ZERO,
            credit_note: Decimal::ZERO,
            broker_commission: Decimal::ZERO,
            leasing_down_payment_gross: Decimal::ZERO,
            manufacturer_subsidy: Decimal::ZERO,
            main_dealer_subsidy: Decimal::ZERO,
            regional_notice_cost: Decimal::ZERO,
            leasing_installment_advance: Decimal::ZERO,
            down_payment_received: Decimal::ZERO,
            leasing_broker_commission: Decimal::ZERO,
            central_promo_deduction: Decimal::ZERO,
            regional_admin_cost: Decimal::ZERO,
            savings_adjustment: Decimal::ZERO,
        }
    }
}

/// A sale together with its computed margin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginedSale {
    pub record: SaleRecord,
    pub margin: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentBucket {
    pub count: u64,
    pub total_margin: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub unit_count: u64,
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_margin: Decimal,
    pub average_margin: Decimal,
    pub margin_percentage: Decimal,
    pub by_payment_method: BTreeMap<PaymentMethod, PaymentBucket>,
}

impl PeriodSummary {
    /// Zero-valued summary with both payment buckets present.
    pub fn empty() -> Self {
        PeriodSummary {
            unit_count: 0,
            total_revenue: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_margin: Decimal::ZERO,
            average_margin: Decimal::ZERO,
            margin_percentage: Decimal::ZERO,
            by_payment_method: PaymentMethod::ALL
                .iter()
                .map(|m| (*m, PaymentBucket::default()))
                .collect(),
        }
    }

    pub fn bucket(&self, method: PaymentMethod) -> PaymentBucket {
        self.by_payment_method
            .get(&method)
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub unit_delta: i64,
    pub unit_delta_pct: Decimal,
    pub value_delta: Decimal,
    pub value_delta_pct: Decimal,
    pub margin_delta: Decimal,
    pub reference_units: u64,
    pub reference_value: Decimal,
}

/// A registered dealership database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub db_path: String,
    pub schema_variant: SchemaVariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorTally {
    pub location: String,
    pub supervisor: String,
    pub today: u64,
    pub month_to_date: u64,
    pub year_to_date: u64,
}
