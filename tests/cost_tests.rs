// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use costclip::commands::{businesses, categories, costs, products};
use costclip::costing::Frequency;
use costclip::utils::Removal;
use costclip::cli;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    costclip::db::init_schema(&conn).unwrap();
    conn.execute(
        "INSERT INTO businesses(id,name,currency) VALUES (1,'Bakery','USD')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO categories(id,name) VALUES (1,'Kitchen Equipment'),(2,'Rent')",
        [],
    )
    .unwrap();
    conn
}

fn run_cost(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["costclip", "cost"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("cost", cost_m)) = matches.subcommand() {
        costs::handle(conn, cost_m)
    } else {
        panic!("no cost subcommand");
    }
}

#[test]
fn add_trims_and_stores_cost() {
    let conn = setup();
    run_cost(
        &conn,
        &[
            "add", "--business", " Bakery ", "--name", " Oven lease ", "--amount", " 600 ",
            "--frequency", "Semiannual", "--category", "Kitchen Equipment", "--start",
            "2025-03-01",
        ],
    )
    .unwrap();

    let recs = costs::active_records(&conn, 1).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].name, "Oven lease");
    assert_eq!(recs[0].amount, Decimal::from(600));
    assert_eq!(recs[0].frequency, Frequency::Semiannual);
    assert_eq!(recs[0].category_id, Some(1));
    assert_eq!(recs[0].start_date.to_string(), "2025-03-01");
}

#[test]
fn add_rejects_unknown_frequency_and_negative_amount() {
    let conn = setup();
    assert!(
        run_cost(
            &conn,
            &["add", "-b", "Bakery", "--name", "Gas", "--amount", "50", "--frequency", "quarterly"],
        )
        .is_err()
    );
    assert!(
        run_cost(&conn, &["add", "-b", "Bakery", "--name", "Gas", "--amount=-50"]).is_err()
    );
    assert!(
        run_cost(&conn, &["add", "-b", "Bakery", "--name", "Gas", "--amount", "lots"]).is_err()
    );
    assert!(costs::active_records(&conn, 1).unwrap().is_empty());
}

#[test]
fn add_refuses_deactivated_category() {
    let conn = setup();
    conn.execute("UPDATE categories SET active=0 WHERE id=2", [])
        .unwrap();
    let err = run_cost(
        &conn,
        &["add", "-b", "Bakery", "--name", "Shop", "--amount", "900", "--category", "Rent"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("deactivated"));
}

#[test]
fn active_records_skip_deactivated_costs() {
    let conn = setup();
    run_cost(&conn, &["add", "-b", "Bakery", "--name", "Rent", "--amount", "900"]).unwrap();
    run_cost(&conn, &["add", "-b", "Bakery", "--name", "Web", "--amount", "120", "--frequency", "annual"]).unwrap();
    let web_id: i64 = conn
        .query_row("SELECT id FROM costs WHERE name='Web'", [], |r| r.get(0))
        .unwrap();
    run_cost(&conn, &["deactivate", "--id", &web_id.to_string()]).unwrap();

    let active = costs::active_records(&conn, 1).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Rent");
    let all = costs::records(&conn, 1, true).unwrap();
    assert_eq!(all.len(), 2);
    assert!(!all[1].active);

    run_cost(&conn, &["rm", "--id", &web_id.to_string()]).unwrap();
    assert_eq!(costs::records(&conn, 1, true).unwrap().len(), 1);
    assert!(costs::remove(&conn, web_id).is_err());
}

#[test]
fn stored_unknown_frequency_reads_as_other() {
    let conn = setup();
    conn.execute(
        "INSERT INTO costs(business_id,name,amount,frequency,start_date) VALUES (1,'Legacy','50','quarterly','2024-01-01')",
        [],
    )
    .unwrap();
    let recs = costs::active_records(&conn, 1).unwrap();
    assert_eq!(recs[0].frequency, Frequency::Other("quarterly".into()));

    let issues = costclip::commands::doctor::check(&conn).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0][0], "unknown_frequency");
}

#[test]
fn category_rm_deactivates_when_referenced() {
    let conn = setup();
    run_cost(
        &conn,
        &["add", "-b", "Bakery", "--name", "Mixer", "--amount", "40", "--category", "Kitchen Equipment"],
    )
    .unwrap();

    assert_eq!(
        categories::remove(&conn, "Kitchen Equipment").unwrap(),
        Removal::Deactivated
    );
    assert_eq!(categories::remove(&conn, "Rent").unwrap(), Removal::Deleted);

    let visible = categories::list(&conn, false).unwrap();
    assert!(visible.is_empty());
    let all = categories::list(&conn, true).unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].active);

    let issues = costclip::commands::doctor::check(&conn).unwrap();
    assert_eq!(issues[0][0], "inactive_category");
}

#[test]
fn category_add_validates_color() {
    let conn = setup();
    let add = |args: &[&str]| {
        let mut argv = vec!["costclip", "category", "add"];
        argv.extend_from_slice(args);
        let matches = cli::build_cli().get_matches_from(argv);
        let Some(("category", m)) = matches.subcommand() else {
            panic!("no category subcommand");
        };
        categories::handle(&conn, m)
    };
    add(&["Utilities", "--color", "#00ff7f", "--icon", "bolt"]).unwrap();
    assert!(add(&["Marketing", "--color", "green"]).is_err());
    // names are unique
    assert!(add(&["Utilities"]).is_err());

    let color: String = conn
        .query_row("SELECT color FROM categories WHERE name='Utilities'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(color, "#00FF7F");
}

#[test]
fn business_rm_keeps_businesses_with_dependents() {
    let conn = setup();
    conn.execute(
        "INSERT INTO businesses(id,name,currency) VALUES (2,'Empty','USD')",
        [],
    )
    .unwrap();
    run_cost(&conn, &["add", "-b", "Bakery", "--name", "Rent", "--amount", "900"]).unwrap();

    assert_eq!(businesses::remove(&conn, "Bakery").unwrap(), Removal::Deactivated);
    assert_eq!(businesses::remove(&conn, "Empty").unwrap(), Removal::Deleted);
    assert!(businesses::remove(&conn, "Nope").is_err());
}

#[test]
fn product_rm_deactivates_products_with_recipes() {
    let conn = setup();
    conn.execute(
        "INSERT INTO products(id,business_id,name,price) VALUES (1,1,'Croissant','3.50'),(2,1,'Water','1')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO recipe_lines(product_id,ingredient,quantity,unit_cost) VALUES (1,'butter','0.05','9')",
        [],
    )
    .unwrap();
    assert_eq!(products::remove(&conn, 1, "Croissant").unwrap(), Removal::Deactivated);
    assert_eq!(products::remove(&conn, 1, "Water").unwrap(), Removal::Deleted);
    assert!(products::products_with_recipes(&conn, 1).unwrap().is_empty());
}

#[test]
fn deactivated_business_takes_no_new_costs() {
    let conn = setup();
    conn.execute("UPDATE businesses SET active=0 WHERE id=1", [])
        .unwrap();
    let err = run_cost(&conn, &["add", "-b", "Bakery", "--name", "Rent", "--amount", "900"])
        .unwrap_err();
    assert!(err.to_string().contains("deactivated"));
    assert!(costs::records(&conn, 1, true).unwrap().is_empty());
}

#[test]
fn add_rejects_oversized_amount() {
    let conn = setup();
    let err = run_cost(
        &conn,
        &["add", "-b", "Bakery", "--name", "Typo", "--amount", "79228162514264337593543950335"],
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("too large"));
    assert!(costs::active_records(&conn, 1).unwrap().is_empty());
}
