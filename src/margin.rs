// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-unit margin formula.
//!
//! ```text
//! leasing adjustment = installment advance - down payment + leasing broker commission
//! cost factor        = redemption + discount + credit note + broker commission
//!                      + dp gross - manufacturer subsidy - main dealer subsidy
//!                      - notice cost + leasing adjustment - central promo
//! margin             = selling price - cost factor - regional admin + savings
//! ```
//!
//! The same arithmetic applies to cash and credit sales. A reduced-schema
//! record has both subsidies and the regional admin cost pinned to zero
//! before it enters the formula.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{PaymentMethod, RawSale, SaleRecord, SchemaVariant};

fn or_zero(v: Option<Decimal>) -> Decimal {
    v.unwrap_or(Decimal::ZERO)
}

/// Resolve a source row into a [`SaleRecord`]: NULLs become zero, the
/// payment method is normalized and variant-absent fields are pinned.
pub fn normalize(raw: &RawSale, variant: SchemaVariant) -> SaleRecord {
    let record = SaleRecord {
        handover_code: raw.handover_code.clone(),
        handover_date: raw.handover_date,
        order_number: raw.order_number.clone(),
        frame_number: raw.frame_number.clone(),
        model_name: raw.model_name.clone(),
        supervisor: raw.supervisor.clone(),
        payment_method: PaymentMethod::from_raw(raw.payment_method.as_deref()),
        schema_variant: variant,
        selling_price: or_zero(raw.selling_price),
        redemption_cost: or_zero(raw.redemption_cost),
        discount: or_zero(raw.discount),
        credit_note: or_zero(raw.credit_note),
        broker_commission: or_zero(raw.broker_commission),
        leasing_down_payment_gross: or_zero(raw.leasing_down_payment_gross),
        manufacturer_subsidy: or_zero(raw.manufacturer_subsidy),
        main_dealer_subsidy: or_zero(raw.main_dealer_subsidy),
        regional_notice_cost: or_zero(raw.regional_notice_cost),
        leasing_installment_advance: or_zero(raw.leasing_installment_advance),
        down_payment_received: or_zero(raw.down_payment_received),
        leasing_broker_commission: or_zero(raw.leasing_broker_commission),
        central_promo_deduction: or_zero(raw.central_promo_deduction),
        regional_admin_cost: or_zero(raw.regional_admin_cost),
        savings_adjustment: or_zero(raw.savings_adjustment),
    };
    pin_variant(record)
}

fn pin_variant(mut record: SaleRecord) -> SaleRecord {
    if record.schema_variant == SchemaVariant::Reduced {
        record.manufacturer_subsidy = Decimal::ZERO;
        record.main_dealer_subsidy = Decimal::ZERO;
        record.regional_admin_cost = Decimal::ZERO;
    }
    record
}

/// Intermediate factors of one margin computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarginBreakdown {
    pub leasing_adjustment: Decimal,
    pub discount_factor: Decimal,
    pub subsidy_factor: Decimal,
    pub cost_factor: Decimal,
    pub margin: Decimal,
}

pub fn breakdown(record: &SaleRecord) -> MarginBreakdown {
    let r = pin_variant(record.clone());

    let leasing_adjustment =
        r.leasing_installment_advance - r.down_payment_received + r.leasing_broker_commission;
    let discount_factor = r.discount + r.credit_note + r.broker_commission;
    let subsidy_factor = r.manufacturer_subsidy + r.main_dealer_subsidy;
    let cost_factor = r.redemption_cost + discount_factor + r.leasing_down_payment_gross
        - subsidy_factor
        - r.regional_notice_cost
        + leasing_adjustment
        - r.central_promo_deduction;
    let margin = r.selling_price - cost_factor - r.regional_admin_cost + r.savings_adjustment;

    MarginBreakdown {
        leasing_adjustment,
        discount_factor,
        subsidy_factor,
        cost_factor,
        margin,
    }
}

pub fn compute_margin(record: &SaleRecord) -> Decimal {
    breakdown(record).margin
}

/// The payment-method-dependent formula some older tooling used. Cash sales
/// skip the dp gross and leasing adjustment terms, notice cost is subtracted
/// rather than credited, and savings are ignored. Only `margin reconcile`
/// calls this, to list where the two formulas disagree.
pub fn payment_split_margin(record: &SaleRecord) -> Decimal {
    let r = pin_variant(record.clone());
    let b = breakdown(&r);
    let cost = match r.payment_method {
        PaymentMethod::Credit => {
            r.redemption_cost + b.discount_factor + r.leasing_down_payment_gross
                + b.leasing_adjustment
                - r.central_promo_deduction
        }
        PaymentMethod::Cash => r.redemption_cost + b.discount_factor - r.central_promo_deduction,
    };
    r.selling_price - cost - r.regional_notice_cost - r.regional_admin_cost + b.subsidy_factor
}
