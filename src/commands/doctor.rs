// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::costing::{Frequency, parse_amount, unit_variable_cost};
use crate::models::RecipeLine;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = check(conn)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn check(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Cost rows a strict parser would reject
    let mut stmt = conn.prepare("SELECT id, name, amount, frequency FROM costs ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let amount: String = r.get(2)?;
        let freq: String = r.get(3)?;
        if let Err(e) = parse_amount(&amount) {
            rows.push(vec!["bad_amount".into(), format!("#{} {}: {}", id, name, e)]);
        }
        if !Frequency::from_tag(&freq).is_known() {
            rows.push(vec![
                "unknown_frequency".into(),
                format!("#{} {}: '{}' counted as monthly", id, name, freq),
            ]);
        }
    }

    // 2) Active costs filed under a deactivated category
    let mut stmt2 = conn.prepare(
        "SELECT k.id, k.name, c.name FROM costs k JOIN categories c ON k.category_id=c.id
         WHERE k.active=1 AND c.active=0 ORDER BY k.id",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let cat: String = r.get(2)?;
        rows.push(vec![
            "inactive_category".into(),
            format!("#{} {} -> {}", id, name, cat),
        ]);
    }

    // 3) Unreadable products and products that lose money on every unit
    let mut stmt3 = conn.prepare(
        "SELECT p.id, p.name, p.price, b.name FROM products p JOIN businesses b ON p.business_id=b.id
         WHERE p.active=1 AND b.active=1 ORDER BY b.name, p.name",
    )?;
    let mut line_stmt = conn.prepare_cached(
        "SELECT id, ingredient, quantity, unit_cost FROM recipe_lines WHERE product_id=?1 ORDER BY id",
    )?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let pid: i64 = r.get(0)?;
        let pname: String = r.get(1)?;
        let price_s: String = r.get(2)?;
        let bname: String = r.get(3)?;
        let price = match parse_amount(&price_s) {
            Ok(p) => Some(p),
            Err(e) => {
                rows.push(vec!["bad_price".into(), format!("{} / {}: {}", bname, pname, e)]);
                None
            }
        };

        let mut recipe = Vec::new();
        let mut readable = true;
        let mut cur_lines = line_stmt.query(params![pid])?;
        while let Some(l) = cur_lines.next()? {
            let lid: i64 = l.get(0)?;
            let ingredient: String = l.get(1)?;
            let qty_s: String = l.get(2)?;
            let cost_s: String = l.get(3)?;
            match (parse_amount(&qty_s), parse_amount(&cost_s)) {
                (Ok(quantity), Ok(unit_cost)) => recipe.push(RecipeLine {
                    id: lid,
                    product_id: pid,
                    ingredient,
                    quantity,
                    unit_cost,
                }),
                (Err(e), _) | (_, Err(e)) => {
                    rows.push(vec![
                        "bad_recipe_line".into(),
                        format!("{} / {} line #{} {}: {}", bname, pname, lid, ingredient, e),
                    ]);
                    readable = false;
                }
            }
        }

        let Some(price) = price else { continue };
        if !readable {
            continue;
        }
        match unit_variable_cost(&recipe) {
            Ok(unit_cost) if price <= unit_cost => rows.push(vec![
                "no_margin".into(),
                format!("{} / {}: price {} does not cover unit cost", bname, pname, price),
            ]),
            Ok(_) => {}
            Err(e) => rows.push(vec!["bad_recipe_line".into(), format!("{} / {}: {}", bname, pname, e)]),
        }
    }

    Ok(rows)
}
