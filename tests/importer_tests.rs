// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use costclip::{cli, commands::costs, commands::importer, costing::Frequency};
use rusqlite::Connection;
use std::io::Write;
use tempfile::NamedTempFile;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    costclip::db::init_schema(&conn).unwrap();
    conn.execute(
        "INSERT INTO businesses(id,name,currency) VALUES (1,'Bakery','USD')",
        [],
    )
    .unwrap();
    conn.execute("INSERT INTO categories(id,name) VALUES (1,'Rent')", [])
        .unwrap();
    conn
}

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn importer_trims_cli_path_argument() {
    let mut conn = base_conn();
    let file = csv_file(
        "name,amount,frequency,category,start_date,description\n\
         Shop rent,900,monthly,Rent,2025-01-01,Main street\n\
         Insurance,600,annual,,2025-01-01,\n\
         Cleaning,45,,,,\n",
    );

    let path = file.path().to_str().unwrap().to_string();
    let padded = format!("  {}  ", path);
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "costclip", "import", "costs", "--business", "Bakery", "--path", &padded,
    ]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut conn, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }

    let recs = costs::active_records(&conn, 1).unwrap();
    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0].category_id, Some(1));
    assert_eq!(recs[0].description.as_deref(), Some("Main street"));
    assert_eq!(recs[1].frequency, Frequency::Annual);
    assert_eq!(recs[1].category_id, None);
    // blank frequency defaults to monthly
    assert_eq!(recs[2].frequency, Frequency::Monthly);
}

#[test]
fn importer_rejects_unknown_frequency_atomically() {
    let mut conn = base_conn();
    let file = csv_file(
        "name,amount,frequency,category,start_date,description\n\
         Shop rent,900,monthly,Rent,2025-01-01,\n\
         Water,90,quarterly,,2025-01-01,\n",
    );
    let err = importer::import_costs(&mut conn, "Bakery", file.path().to_str().unwrap())
        .unwrap_err();
    assert!(format!("{:#}", err).contains("quarterly"));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM costs", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn importer_rejects_negative_amounts_and_unknown_categories() {
    let mut conn = base_conn();
    let negative = csv_file("name,amount,frequency,category,start_date,description\nRefund,-10,monthly,,,\n");
    assert!(importer::import_costs(&mut conn, "Bakery", negative.path().to_str().unwrap()).is_err());

    let unknown_cat =
        csv_file("name,amount,frequency,category,start_date,description\nAds,10,monthly,Marketing,,\n");
    let err = importer::import_costs(&mut conn, "Bakery", unknown_cat.path().to_str().unwrap())
        .unwrap_err();
    assert!(err.to_string().contains("Marketing"));

    assert!(costs::records(&conn, 1, true).unwrap().is_empty());
}

#[test]
fn importer_requires_known_business() {
    let mut conn = base_conn();
    let file = csv_file("name,amount,frequency,category,start_date,description\nRent,10,monthly,,,\n");
    let err = importer::import_costs(&mut conn, "Cafe", file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Cafe"));
}
