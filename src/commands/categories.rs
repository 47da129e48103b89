// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CostCategory;
use crate::utils::{Removal, id_for_category, parse_color, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use std::collections::HashMap;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            if name.is_empty() {
                return Err(anyhow!("Category name must not be empty"));
            }
            let opt = |key: &str| {
                sub.get_one::<String>(key)
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
            };
            let color = opt("color").map(|c| parse_color(&c)).transpose()?;
            conn.execute(
                "INSERT INTO categories(name, description, icon, color) VALUES (?1,?2,?3,?4)",
                params![name, opt("description"), opt("icon"), color],
            )?;
            println!("Added category '{}'", name);
        }
        Some(("list", sub)) => {
            let cats = list(conn, sub.get_flag("all"))?;
            let data = cats
                .into_iter()
                .map(|c| {
                    vec![
                        c.name,
                        c.description.unwrap_or_default(),
                        c.icon.unwrap_or_default(),
                        c.color.unwrap_or_default(),
                        if c.active { "yes" } else { "no" }.into(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Category", "Description", "Icon", "Color", "Active"], data)
            );
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            match remove(conn, name)? {
                Removal::Deleted => println!("Removed category '{}'", name.trim()),
                Removal::Deactivated => println!(
                    "Category '{}' is still used by cost records; deactivated instead",
                    name.trim()
                ),
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn list(conn: &Connection, include_inactive: bool) -> Result<Vec<CostCategory>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, icon, color, active FROM categories
         WHERE active=1 OR ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![include_inactive], |r| {
        Ok(CostCategory {
            id: r.get(0)?,
            name: r.get(1)?,
            description: r.get(2)?,
            icon: r.get(3)?,
            color: r.get(4)?,
            active: r.get(5)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Category id -> name for every category, active or not.
pub fn names_by_id(conn: &Connection) -> Result<HashMap<i64, String>> {
    Ok(list(conn, true)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

pub fn remove(conn: &Connection, name: &str) -> Result<Removal> {
    let id = id_for_category(conn, name)?;
    let refs: i64 = conn.query_row(
        "SELECT COUNT(*) FROM costs WHERE category_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if refs > 0 {
        conn.execute("UPDATE categories SET active=0 WHERE id=?1", params![id])?;
        info!(category_id = id, refs, "category deactivated");
        Ok(Removal::Deactivated)
    } else {
        conn.execute("DELETE FROM categories WHERE id=?1", params![id])?;
        info!(category_id = id, "category deleted");
        Ok(Removal::Deleted)
    }
}
