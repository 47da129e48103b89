// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, Utc};
use costclip::cache::ReportCache;
use costclip::cli;
use costclip::commands::{products, reports};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    costclip::db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO businesses(id,name,currency) VALUES (1,'Bakery','USD');
        INSERT INTO categories(id,name) VALUES (1,'Rent'),(2,'Utilities');
        INSERT INTO costs(business_id,name,amount,frequency,category_id,start_date) VALUES
            (1,'Shop rent','1200','monthly',1,'2025-01-01'),
            (1,'Power','300','monthly',2,'2025-01-01'),
            (1,'Water','150','annual',2,'2025-01-01');
        INSERT INTO costs(business_id,name,amount,frequency,category_id,active,start_date) VALUES
            (1,'Old lease','5000','monthly',1,0,'2020-01-01');
        "#,
    )
    .unwrap();
    conn
}

#[test]
fn summary_totals_active_costs_only() {
    let conn = setup();
    let cache = ReportCache::new(Duration::days(30));
    let report = reports::summary(&conn, 1, &cache, false, Utc::now()).unwrap();
    assert_eq!(report.count, 3);
    assert_eq!(report.total_per_month, "1512.5".parse::<Decimal>().unwrap());
    assert_eq!(report.total_per_year, Decimal::from(18150));
}

#[test]
fn category_rows_are_named_and_sorted_by_share() {
    let conn = setup();
    conn.execute(
        "INSERT INTO costs(business_id,name,amount,frequency,start_date) VALUES (1,'Misc','0','monthly','2025-01-01')",
        [],
    )
    .unwrap();
    let cache = ReportCache::new(Duration::days(30));
    let report = reports::summary(&conn, 1, &cache, false, Utc::now()).unwrap();
    let rows = reports::category_rows(&conn, &report).unwrap();
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].category, "Rent");
    assert_eq!(rows[0].per_month, "1200.00");
    assert_eq!(rows[0].per_year, "14400.00");
    assert_eq!(rows[0].percentage, "79.34");

    assert_eq!(rows[1].category, "Utilities");
    assert_eq!(rows[1].costs, 2);
    assert_eq!(rows[1].per_month, "312.50");
    assert_eq!(rows[1].percentage, "20.66");

    assert_eq!(rows[2].category, "(uncategorized)");
    assert_eq!(rows[2].percentage, "0.00");
}

#[test]
fn breakeven_uses_recipes_and_monthly_fixed_costs() {
    let conn = setup();
    let run = |args: &[&str]| {
        let mut argv = vec!["costclip", "product"];
        argv.extend_from_slice(args);
        let matches = cli::build_cli().get_matches_from(argv);
        let Some(("product", m)) = matches.subcommand() else {
            panic!("no product subcommand");
        };
        products::handle(&conn, m)
    };
    run(&["add", "-b", "Bakery", "--name", "Croissant", "--price", "3.50"]).unwrap();
    run(&[
        "ingredient", "-b", "Bakery", "--product", "Croissant", "--name", "butter",
        "--quantity", "0.05", "--unit-cost", "10",
    ])
    .unwrap();
    run(&[
        "ingredient", "-b", "Bakery", "--product", "Croissant", "--name", "flour",
        "--quantity", "0.1", "--unit-cost", "5",
    ])
    .unwrap();
    run(&["add", "-b", "Bakery", "--name", "Loss leader", "--price", "1"]).unwrap();
    run(&[
        "ingredient", "-b", "Bakery", "--product", "Loss leader", "--name", "sugar",
        "--quantity", "1", "--unit-cost", "2",
    ])
    .unwrap();
    assert!(
        run(&[
            "ingredient", "-b", "Bakery", "--product", "Croissant", "--name", "air",
            "--quantity", "0", "--unit-cost", "1",
        ])
        .is_err()
    );

    let rows = reports::breakeven_rows(&conn, 1).unwrap();
    assert_eq!(rows.len(), 2);

    // unit cost 1.00, contribution 2.50, 1512.5 / 2.5 = 605
    let c = &rows[0];
    assert_eq!(c.product, "Croissant");
    assert_eq!(c.unit_variable_cost, "1.00");
    assert_eq!(c.contribution, "2.50");
    assert_eq!(c.margin_pct, "71.43");
    assert_eq!(c.units_per_month.as_deref(), Some("605"));
    assert_eq!(c.revenue_per_month.as_deref(), Some("2117.50"));

    let l = &rows[1];
    assert_eq!(l.product, "Loss leader");
    assert_eq!(l.units_per_month, None);

    let issues = costclip::commands::doctor::check(&conn).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0][0], "no_margin");
}

#[test]
fn product_price_must_not_be_negative() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "costclip", "product", "add", "-b", "Bakery", "--name", "Bad", "--price", "-1",
    ]);
    let Some(("product", m)) = matches.subcommand() else {
        panic!("no product subcommand");
    };
    assert!(products::handle(&conn, m).is_err());
}

#[test]
fn oversized_stored_amount_fails_reports_without_panicking() {
    let conn = setup();
    conn.execute(
        "INSERT INTO costs(business_id,name,amount,frequency,start_date) VALUES (1,'Typo','79228162514264337593543950335','monthly','2025-01-01')",
        [],
    )
    .unwrap();
    let cache = ReportCache::new(Duration::days(30));
    let err = reports::summary(&conn, 1, &cache, false, Utc::now()).unwrap_err();
    assert!(err.to_string().contains("too large"));
    assert!(reports::breakeven_rows(&conn, 1).is_err());

    let issues = costclip::commands::doctor::check(&conn).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0][0], "bad_amount");
}

#[test]
fn doctor_lists_corrupt_products_instead_of_failing() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO products(id,business_id,name,price) VALUES (1,1,'Broken','abc'),(2,1,'Odd','2');
        INSERT INTO recipe_lines(product_id,ingredient,quantity,unit_cost) VALUES (2,'milk','lots','1');
        "#,
    )
    .unwrap();
    assert!(products::products_with_recipes(&conn, 1).is_err());

    let issues = costclip::commands::doctor::check(&conn).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(kinds, vec!["bad_price", "bad_recipe_line"]);
    assert!(issues[1][1].contains("milk"));
}

#[test]
fn deactivated_products_take_no_new_ingredients() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO products(id,business_id,name,price,active) VALUES (1,1,'Retired','3',0);
        "#,
    )
    .unwrap();
    let matches = cli::build_cli().get_matches_from([
        "costclip", "product", "ingredient", "-b", "Bakery", "--product", "Retired", "--name",
        "flour", "--quantity", "1", "--unit-cost", "1",
    ]);
    let Some(("product", m)) = matches.subcommand() else {
        panic!("no product subcommand");
    };
    let err = products::handle(&conn, m).unwrap_err();
    assert!(err.to_string().contains("deactivated"));
}
