// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use dealermargin::db::init_location_schema;
use dealermargin::margin::{compute_margin, normalize};
use dealermargin::models::{PaymentMethod, SchemaVariant};
use dealermargin::period::DateRange;
use dealermargin::source::{SaleKey, SaleSource, SqliteSource};
use pretty_assertions::assert_eq;
use rusqlite::{params, Connection};
use rust_decimal_macros::dec;

fn location_conn(variant: SchemaVariant) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_location_schema(&conn, variant).unwrap();
    conn.execute(
        "INSERT INTO vehicle_models(model_code, model_name, notice_cost) VALUES ('NC11','Vario 125','100000')",
        [],
    )
    .unwrap();
    conn
}

fn insert_handover(conn: &Connection, code: &str, date: &str, frame: &str, payment: &str) {
    conn.execute(
        "INSERT INTO sale_orders(order_code, form_number, payment_method, supervisor, model_code,
             selling_price, discount) VALUES (?1, ?1, ?2, 'Budi', 'NC11', '20000000', '500000')",
        params![format!("SPK-{}", code), payment],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO handovers(handover_code, order_code, handover_date, frame_number)
         VALUES (?1, ?2, ?3, ?4)",
        params![code, format!("SPK-{}", code), date, frame],
    )
    .unwrap();
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn full_schema_reads_subsidies_and_admin_cost() {
    let conn = location_conn(SchemaVariant::Full);
    insert_handover(&conn, "BAST-1", "2024-05-15", "MH1A", "KREDIT");
    conn.execute("UPDATE sale_orders SET regional_admin_cost='50000'", [])
        .unwrap();
    conn.execute(
        "INSERT INTO inbound_units(frame_number, redemption_cost) VALUES ('MH1A', 15000000)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO leasing_billings(handover_code, down_payment_gross, manufacturer_subsidy,
             main_dealer_subsidy) VALUES ('BAST-1', NULL, '400000', '')",
        [],
    )
    .unwrap();

    let source = SqliteSource::new(&conn, SchemaVariant::Full);
    let sales = source.sales_between(DateRange::day(ymd(2024, 5, 15))).unwrap();
    assert_eq!(sales.len(), 1);
    let raw = &sales[0];
    assert_eq!(raw.handover_date, Some(ymd(2024, 5, 15)));
    assert_eq!(raw.order_number, "SPK-BAST-1");
    assert_eq!(raw.model_name, "Vario 125");
    assert_eq!(raw.redemption_cost, Some(dec!(15000000)));
    assert_eq!(raw.manufacturer_subsidy, Some(dec!(400000)));
    assert_eq!(raw.main_dealer_subsidy, None);
    assert_eq!(raw.leasing_down_payment_gross, None);
    assert_eq!(raw.regional_admin_cost, Some(dec!(50000)));

    let r = normalize(raw, source.schema_variant());
    assert_eq!(r.payment_method, PaymentMethod::Credit);
    // 20,000,000 - (15,000,000 + 500,000 - 400,000 - 100,000) - 50,000
    assert_eq!(compute_margin(&r), dec!(4950000));
}

#[test]
fn reduced_schema_has_no_subsidy_columns() {
    let conn = location_conn(SchemaVariant::Reduced);
    insert_handover(&conn, "BAST-1", "2024-05-15", "MH1A", "TUNAI");
    conn.execute(
        "INSERT INTO inbound_units(frame_number, redemption_cost) VALUES ('MH1A','15000000')",
        [],
    )
    .unwrap();

    let source = SqliteSource::new(&conn, SchemaVariant::Reduced);
    let raw = source
        .find_sale(SaleKey::Frame, "MH1A")
        .unwrap()
        .expect("sale");
    assert_eq!(raw.manufacturer_subsidy, None);
    assert_eq!(raw.main_dealer_subsidy, None);
    assert_eq!(raw.regional_admin_cost, None);
    assert_eq!(compute_margin(&normalize(&raw, SchemaVariant::Reduced)), dec!(4600000));
}

#[test]
fn unlinked_redemption_cost_reads_as_none() {
    let conn = location_conn(SchemaVariant::Reduced);
    insert_handover(&conn, "BAST-9", "2024-05-15", "MH1Z", "TUNAI");
    let source = SqliteSource::new(&conn, SchemaVariant::Reduced);
    let raw = source
        .find_sale(SaleKey::Handover, "BAST-9")
        .unwrap()
        .expect("sale");
    assert_eq!(raw.redemption_cost, None);
    assert_eq!(normalize(&raw, SchemaVariant::Reduced).redemption_cost, dec!(0));
}

#[test]
fn sales_are_filtered_by_range_newest_first() {
    let conn = location_conn(SchemaVariant::Reduced);
    insert_handover(&conn, "BAST-1", "2024-05-01", "F1", "TUNAI");
    insert_handover(&conn, "BAST-2", "2024-05-10 09:30:00", "F2", "KREDIT");
    insert_handover(&conn, "BAST-3", "2024-05-20", "F3", "TUNAI");
    insert_handover(&conn, "BAST-4", "2024-04-30", "F4", "TUNAI");

    let source = SqliteSource::new(&conn, SchemaVariant::Reduced);
    let sales = source
        .sales_between(DateRange::new(ymd(2024, 5, 1), ymd(2024, 5, 10)))
        .unwrap();
    let codes: Vec<_> = sales.iter().map(|s| s.handover_code.as_str()).collect();
    assert_eq!(codes, vec!["BAST-2", "BAST-1"]);
    assert_eq!(sales[0].handover_date, Some(ymd(2024, 5, 10)));
}

#[test]
fn find_sale_by_each_key() {
    let conn = location_conn(SchemaVariant::Full);
    insert_handover(&conn, "BAST-7", "2024-05-15", "MH1Q", "TUNAI");
    let source = SqliteSource::new(&conn, SchemaVariant::Full);
    for (key, term) in [
        (SaleKey::Frame, "MH1Q"),
        (SaleKey::Order, "SPK-BAST-7"),
        (SaleKey::Handover, "BAST-7"),
    ] {
        let raw = source.find_sale(key, term).unwrap().expect("sale");
        assert_eq!(raw.handover_code, "BAST-7");
    }
    assert!(source.find_sale(SaleKey::Frame, "NOPE").unwrap().is_none());
}

#[test]
fn sale_key_aliases() {
    assert_eq!(SaleKey::parse("spk").unwrap(), SaleKey::Order);
    assert_eq!(SaleKey::parse("bast").unwrap(), SaleKey::Handover);
    assert!(SaleKey::parse("vin").is_err());
}

#[test]
fn bad_amount_text_is_an_error() {
    let conn = location_conn(SchemaVariant::Reduced);
    insert_handover(&conn, "BAST-1", "2024-05-15", "F1", "TUNAI");
    conn.execute("UPDATE sale_orders SET discount='lima ratus'", [])
        .unwrap();
    let source = SqliteSource::new(&conn, SchemaVariant::Reduced);
    assert!(source.sales_between(DateRange::day(ymd(2024, 5, 15))).is_err());
}

#[test]
fn repeated_frame_finds_newest_handover() {
    let conn = location_conn(SchemaVariant::Reduced);
    insert_handover(&conn, "BAST-1", "2024-05-01", "MH1R", "TUNAI");
    insert_handover(&conn, "BAST-3", "2024-05-10", "MH1R", "KREDIT");
    insert_handover(&conn, "BAST-2", "2024-05-05", "MH1R", "TUNAI");
    let source = SqliteSource::new(&conn, SchemaVariant::Reduced);
    let raw = source
        .find_sale(SaleKey::Frame, "MH1R")
        .unwrap()
        .expect("sale");
    assert_eq!(raw.handover_code, "BAST-3");
}

#[test]
fn oversized_amount_text_is_an_error() {
    let conn = location_conn(SchemaVariant::Reduced);
    insert_handover(&conn, "BAST-1", "2024-05-15", "F1", "TUNAI");
    conn.execute(
        "UPDATE sale_orders SET selling_price='79228162514264337593543950335'",
        [],
    )
    .unwrap();
    let source = SqliteSource::new(&conn, SchemaVariant::Reduced);
    assert!(source.sales_between(DateRange::day(ymd(2024, 5, 15))).is_err());
}
