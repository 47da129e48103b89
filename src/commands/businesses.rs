// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{Removal, id_for_business, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            if name.is_empty() {
                return Err(anyhow!("Business name must not be empty"));
            }
            let ccy = match sub.get_one::<String>("currency") {
                Some(c) => c.trim().to_uppercase(),
                None => crate::config::default_currency(conn)?,
            };
            conn.execute(
                "INSERT INTO businesses(name, currency) VALUES (?1, ?2)",
                params![name, ccy],
            )?;
            println!("Added business '{}' ({})", name, ccy);
        }
        Some(("list", sub)) => {
            let all = sub.get_flag("all");
            let mut stmt = conn.prepare(
                "SELECT name, currency, active, created_at FROM businesses
                 WHERE active=1 OR ?1 ORDER BY name",
            )?;
            let rows = stmt.query_map(params![all], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, bool>(2)?,
                    r.get::<_, String>(3)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, c, a, cr) = row?;
                data.push(vec![n, c, if a { "yes" } else { "no" }.into(), cr]);
            }
            println!(
                "{}",
                pretty_table(&["Name", "Currency", "Active", "Created"], data)
            );
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            match remove(conn, name)? {
                Removal::Deleted => println!("Removed business '{}'", name.trim()),
                Removal::Deactivated => println!(
                    "Business '{}' still owns costs or products; deactivated instead",
                    name.trim()
                ),
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn remove(conn: &Connection, name: &str) -> Result<Removal> {
    let id = id_for_business(conn, name)?;
    let dependents: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM costs WHERE business_id=?1)
              + (SELECT COUNT(*) FROM products WHERE business_id=?1)",
        params![id],
        |r| r.get(0),
    )?;
    if dependents > 0 {
        conn.execute("UPDATE businesses SET active=0 WHERE id=?1", params![id])?;
        info!(business_id = id, dependents, "business deactivated");
        Ok(Removal::Deactivated)
    } else {
        conn.execute("DELETE FROM businesses WHERE id=?1", params![id])?;
        info!(business_id = id, "business deleted");
        Ok(Removal::Deleted)
    }
}
