// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use dealermargin::aggregate::{aggregate, annotate, compare, tally_supervisors};
use dealermargin::models::{
    MarginedSale, PaymentBucket, PaymentMethod, PeriodSummary, SaleRecord, SchemaVariant,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn sale(margin: Decimal, cost: Decimal, method: PaymentMethod) -> MarginedSale {
    MarginedSale {
        record: SaleRecord {
            payment_method: method,
            redemption_cost: cost,
            ..SaleRecord::zeroed(SchemaVariant::Full)
        },
        margin,
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn empty_period_is_all_zero() {
    let s = aggregate(&[]);
    assert_eq!(s, PeriodSummary::empty());
    assert_eq!(s.unit_count, 0);
    assert_eq!(s.total_margin, Decimal::ZERO);
    assert_eq!(s.average_margin, Decimal::ZERO);
    assert_eq!(s.margin_percentage, Decimal::ZERO);
    for m in PaymentMethod::ALL {
        assert_eq!(s.by_payment_method.get(&m), Some(&PaymentBucket::default()));
    }
}

#[test]
fn loss_making_sale_is_netted() {
    let s = aggregate(&[
        sale(dec!(1000), dec!(0), PaymentMethod::Cash),
        sale(dec!(-200), dec!(0), PaymentMethod::Credit),
    ]);
    assert_eq!(s.unit_count, 2);
    assert_eq!(s.total_margin, dec!(800));
    assert_eq!(s.average_margin, dec!(400));
    assert_eq!(s.bucket(PaymentMethod::Cash).count, 1);
    assert_eq!(s.bucket(PaymentMethod::Cash).total_margin, dec!(1000));
    assert_eq!(s.bucket(PaymentMethod::Credit).count, 1);
    assert_eq!(s.bucket(PaymentMethod::Credit).total_margin, dec!(-200));
}

#[test]
fn zero_cost_gives_zero_percentage() {
    let s = aggregate(&[sale(dec!(500), dec!(0), PaymentMethod::Cash)]);
    assert_eq!(s.total_cost, Decimal::ZERO);
    assert_eq!(s.total_margin, dec!(500));
    assert_eq!(s.margin_percentage, Decimal::ZERO);
}

#[test]
fn margin_percentage_is_against_redemption_cost() {
    let s = aggregate(&[
        sale(dec!(600), dec!(4000), PaymentMethod::Credit),
        sale(dec!(400), dec!(6000), PaymentMethod::Cash),
    ]);
    assert_eq!(s.total_cost, dec!(10000));
    assert_eq!(s.margin_percentage, dec!(10));
}

#[test]
fn buckets_cover_every_unit() {
    let mixes: [&[PaymentMethod]; 4] = [
        &[PaymentMethod::Cash],
        &[PaymentMethod::Credit, PaymentMethod::Credit],
        &[PaymentMethod::Cash, PaymentMethod::Credit, PaymentMethod::Cash],
        &[],
    ];
    for mix in mixes {
        let sales: Vec<_> = mix
            .iter()
            .map(|m| sale(dec!(10), dec!(100), *m))
            .collect();
        let s = aggregate(&sales);
        let counted: u64 = s.by_payment_method.values().map(|b| b.count).sum();
        assert_eq!(counted, s.unit_count);
        assert_eq!(s.unit_count, mix.len() as u64);
    }
}

#[test]
fn average_times_count_recovers_total() {
    let s = aggregate(&[
        sale(dec!(1000), dec!(1), PaymentMethod::Cash),
        sale(dec!(1000), dec!(1), PaymentMethod::Cash),
        sale(dec!(1001), dec!(1), PaymentMethod::Credit),
    ]);
    let diff = (s.average_margin * Decimal::from(s.unit_count) - s.total_margin).abs();
    assert!(diff < dec!(0.000001), "diff {}", diff);
}

#[test]
fn total_revenue_sums_selling_price() {
    let mut a = sale(dec!(1), dec!(1), PaymentMethod::Cash);
    a.record.selling_price = dec!(1500);
    let mut b = sale(dec!(1), dec!(1), PaymentMethod::Cash);
    b.record.selling_price = dec!(2500);
    assert_eq!(aggregate(&[a, b]).total_revenue, dec!(4000));
}

#[test]
fn annotate_uses_the_margin_formula() {
    let r = SaleRecord {
        selling_price: dec!(20000000),
        redemption_cost: dec!(15000000),
        discount: dec!(500000),
        ..SaleRecord::zeroed(SchemaVariant::Full)
    };
    let out = annotate(vec![r]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].margin, dec!(4500000));
}

#[test]
fn summary_against_itself_has_no_deltas() {
    let s = aggregate(&[
        sale(dec!(300), dec!(1000), PaymentMethod::Cash),
        sale(dec!(700), dec!(3000), PaymentMethod::Credit),
    ]);
    let c = compare(&s, &s);
    assert_eq!(c.unit_delta, 0);
    assert_eq!(c.unit_delta_pct, Decimal::ZERO);
    assert_eq!(c.value_delta, Decimal::ZERO);
    assert_eq!(c.value_delta_pct, Decimal::ZERO);
    assert_eq!(c.margin_delta, Decimal::ZERO);
    assert_eq!(c.reference_units, 2);
    assert_eq!(c.reference_value, dec!(4000));
}

#[test]
fn zero_reference_gives_zero_percentages() {
    let current = aggregate(&[sale(dec!(50), dec!(2500), PaymentMethod::Cash)]);
    let c = compare(&current, &PeriodSummary::empty());
    assert_eq!(c.unit_delta, 1);
    assert_eq!(c.unit_delta_pct, Decimal::ZERO);
    assert_eq!(c.value_delta, dec!(2500));
    assert_eq!(c.value_delta_pct, Decimal::ZERO);
    assert_eq!(c.margin_delta, dec!(50));
}

#[test]
fn growth_against_reference() {
    let current = aggregate(&[
        sale(dec!(100), dec!(50), PaymentMethod::Cash),
        sale(dec!(100), dec!(50), PaymentMethod::Cash),
        sale(dec!(100), dec!(50), PaymentMethod::Cash),
    ]);
    let reference = aggregate(&[
        sale(dec!(120), dec!(50), PaymentMethod::Credit),
        sale(dec!(120), dec!(50), PaymentMethod::Credit),
    ]);
    let c = compare(&current, &reference);
    assert_eq!(c.unit_delta, 1);
    assert_eq!(c.unit_delta_pct, dec!(50));
    assert_eq!(c.value_delta, dec!(50));
    assert_eq!(c.value_delta_pct, dec!(50));
    assert_eq!(c.margin_delta, dec!(60));

    let shrink = compare(&reference, &current);
    assert_eq!(shrink.unit_delta, -1);
    assert_eq!(shrink.value_delta, dec!(-50));
}

#[test]
fn supervisors_are_counted_per_window() {
    let at = |sup: &str, date: Option<NaiveDate>| SaleRecord {
        supervisor: sup.into(),
        handover_date: date,
        ..SaleRecord::zeroed(SchemaVariant::Reduced)
    };
    let as_of = ymd(2024, 5, 15);
    let sales = [
        at("Budi", Some(ymd(2024, 5, 15))),
        at("Budi", Some(ymd(2024, 5, 2))),
        at("Budi", Some(ymd(2024, 2, 1))),
        at("Ani", Some(ymd(2024, 5, 15))),
        at("Ani", Some(ymd(2023, 12, 31))),
        at("Ani", None),
        at("Citra", Some(ymd(2024, 5, 16))),
    ];
    let t = tally_supervisors("North", &sales, as_of);
    assert_eq!(t.len(), 2);
    assert_eq!(t[0].supervisor, "Ani");
    assert_eq!((t[0].today, t[0].month_to_date, t[0].year_to_date), (1, 1, 1));
    assert_eq!(t[1].supervisor, "Budi");
    assert_eq!((t[1].today, t[1].month_to_date, t[1].year_to_date), (1, 2, 3));
    assert!(t.iter().all(|x| x.location == "North"));
}

#[test]
fn near_zero_cost_does_not_overflow() {
    let tiny = dec!(0.0000000000000000000000000001);
    let s = aggregate(&[sale(dec!(1000000000000000), tiny, PaymentMethod::Cash)]);
    assert_eq!(s.total_cost, tiny);
    assert_eq!(s.margin_percentage, Decimal::ZERO);

    let current = aggregate(&[sale(dec!(1), dec!(1000000000000000), PaymentMethod::Cash)]);
    let c = compare(&current, &s);
    assert_eq!(c.value_delta_pct, Decimal::ZERO);
    assert_eq!(c.unit_delta_pct, Decimal::ZERO);
}
