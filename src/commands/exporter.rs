// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::id_for_business;
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("costs", sub)) => export_costs(conn, sub),
        _ => Ok(()),
    }
}

fn export_costs(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    if fmt != "csv" && fmt != "json" {
        return Err(anyhow!("Unknown format: {} (use csv|json)", fmt));
    }
    let business_id = id_for_business(conn, sub.get_one::<String>("business").unwrap())?;

    let mut stmt = conn.prepare(
        "SELECT k.name, k.amount, k.frequency, c.name as category, k.start_date, k.description, k.active
         FROM costs k
         LEFT JOIN categories c ON k.category_id=c.id
         WHERE k.business_id=?1
         ORDER BY k.id",
    )?;
    let rows = stmt.query_map([business_id], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<String>>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, bool>(6)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            // same column order the importer reads, plus the active flag
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "name",
                "amount",
                "frequency",
                "category",
                "start_date",
                "description",
                "active",
            ])?;
            for row in rows {
                let (n, amt, freq, cat, start, desc, active) = row?;
                wtr.write_record([
                    n,
                    amt,
                    freq,
                    cat.unwrap_or_default(),
                    start,
                    desc.unwrap_or_default(),
                    active.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            let mut items = Vec::new();
            for row in rows {
                let (n, amt, freq, cat, start, desc, active) = row?;
                items.push(json!({
                    "name": n, "amount": amt, "frequency": freq, "category": cat,
                    "start_date": start, "description": desc, "active": active
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported costs to {}", out);
    Ok(())
}
