// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::costing::{CostError, parse_amount, unit_variable_cost};
use crate::models::{Product, RecipeLine};
use crate::utils::{
    Removal, active_business, decimal_column, id_for_business, maybe_print_json, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let business = sub.get_one::<String>("business").unwrap();
            let name = sub.get_one::<String>("name").unwrap().trim();
            if name.is_empty() {
                return Err(anyhow!("Product name must not be empty"));
            }
            let price = parse_amount(sub.get_one::<String>("price").unwrap())
                .with_context(|| format!("Product '{}' rejected", name))?;
            let business_id = active_business(conn, business)?;
            conn.execute(
                "INSERT INTO products(business_id, name, price) VALUES (?1,?2,?3)",
                params![business_id, name, price.to_string()],
            )?;
            println!("Added product '{}' at {} for {}", name, price, business.trim());
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let business_id = id_for_business(conn, sub.get_one::<String>("business").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            match remove(conn, business_id, name)? {
                Removal::Deleted => println!("Removed product '{}'", name.trim()),
                Removal::Deactivated => println!(
                    "Product '{}' has a recipe; deactivated instead",
                    name.trim()
                ),
            }
        }
        Some(("ingredient", sub)) => {
            let business_id = active_business(conn, sub.get_one::<String>("business").unwrap())?;
            let product = sub.get_one::<String>("product").unwrap();
            let ingredient = sub.get_one::<String>("name").unwrap().trim();
            let quantity = parse_amount(sub.get_one::<String>("quantity").unwrap())?;
            if quantity.is_zero() {
                return Err(CostError::InvalidQuantity(quantity).into());
            }
            let unit_cost = parse_amount(sub.get_one::<String>("unit_cost").unwrap())?;
            let product_id = active_product(conn, business_id, product)?;
            conn.execute(
                "INSERT INTO recipe_lines(product_id, ingredient, quantity, unit_cost) VALUES (?1,?2,?3,?4)",
                params![product_id, ingredient, quantity.to_string(), unit_cost.to_string()],
            )?;
            println!(
                "Added {} x '{}' at {} to '{}'",
                quantity,
                ingredient,
                unit_cost,
                product.trim()
            );
        }
        _ => {}
    }
    Ok(())
}

pub fn id_for_product(conn: &Connection, business_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM products WHERE business_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![business_id, name.trim()], |r| r.get(0))
        .with_context(|| format!("Product '{}' not found", name.trim()))?;
    Ok(id)
}

/// Product id for `name`, refusing products that were deactivated.
pub fn active_product(conn: &Connection, business_id: i64, name: &str) -> Result<i64> {
    let id = id_for_product(conn, business_id, name)?;
    let active: bool = conn.query_row(
        "SELECT active FROM products WHERE id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if !active {
        return Err(anyhow!("Product '{}' is deactivated", name.trim()));
    }
    Ok(id)
}

pub fn remove(conn: &Connection, business_id: i64, name: &str) -> Result<Removal> {
    let id = id_for_product(conn, business_id, name)?;
    let lines: i64 = conn.query_row(
        "SELECT COUNT(*) FROM recipe_lines WHERE product_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if lines > 0 {
        conn.execute("UPDATE products SET active=0 WHERE id=?1", params![id])?;
        info!(product_id = id, lines, "product deactivated");
        Ok(Removal::Deactivated)
    } else {
        conn.execute("DELETE FROM products WHERE id=?1", params![id])?;
        info!(product_id = id, "product deleted");
        Ok(Removal::Deleted)
    }
}

/// Active products of a business together with their recipe lines.
pub fn products_with_recipes(
    conn: &Connection,
    business_id: i64,
) -> Result<Vec<(Product, Vec<RecipeLine>)>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, name, price, active FROM products
         WHERE business_id=?1 AND active=1 ORDER BY name",
    )?;
    let mut rows = stmt.query(params![business_id])?;
    let mut products = Vec::new();
    while let Some(r) = rows.next()? {
        let price_s: String = r.get(3)?;
        products.push(Product {
            id: r.get(0)?,
            business_id: r.get(1)?,
            name: r.get(2)?,
            price: decimal_column(&price_s, "product price")?,
            active: r.get(4)?,
        });
    }

    let mut line_stmt = conn.prepare_cached(
        "SELECT id, product_id, ingredient, quantity, unit_cost FROM recipe_lines
         WHERE product_id=?1 ORDER BY id",
    )?;
    let mut out = Vec::with_capacity(products.len());
    for p in products {
        let mut cur = line_stmt.query(params![p.id])?;
        let mut lines = Vec::new();
        while let Some(r) = cur.next()? {
            let qty_s: String = r.get(3)?;
            let cost_s: String = r.get(4)?;
            lines.push(RecipeLine {
                id: r.get(0)?,
                product_id: r.get(1)?,
                ingredient: r.get(2)?,
                quantity: decimal_column(&qty_s, "recipe quantity")?,
                unit_cost: decimal_column(&cost_s, "recipe unit cost")?,
            });
        }
        out.push((p, lines));
    }
    Ok(out)
}

#[derive(Serialize)]
struct ProductRow {
    name: String,
    price: String,
    ingredients: usize,
    unit_variable_cost: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let business_id = id_for_business(conn, sub.get_one::<String>("business").unwrap())?;
    let mut data = Vec::new();
    for (p, lines) in products_with_recipes(conn, business_id)? {
        let cost = unit_variable_cost(&lines).with_context(|| format!("Product '{}'", p.name))?;
        data.push(ProductRow {
            name: p.name,
            price: format!("{:.2}", p.price.round_dp(2)),
            ingredients: lines.len(),
            unit_variable_cost: format!("{:.2}", cost.round_dp(2)),
        });
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .into_iter()
            .map(|r| {
                vec![
                    r.name,
                    r.price,
                    r.ingredients.to_string(),
                    r.unit_variable_cost,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Product", "Price", "Ingredients", "Unit Variable Cost"], rows)
        );
    }
    Ok(())
}
