// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cache::ReportCache;
use crate::costing::{CostError, Frequency, normalize_to_monthly, parse_amount};
use crate::models::CostRecord;
use crate::utils::{
    active_business, decimal_column, id_for_business, id_for_category, maybe_print_json, parse_date,
    pretty_table,
};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("deactivate", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            deactivate(conn, id)?;
            println!("Deactivated cost #{}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            remove(conn, id)?;
            println!("Removed cost #{}", id);
        }
        _ => {}
    }
    Ok(())
}

/// A validated cost record that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewCost {
    pub business_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub category_id: Option<i64>,
    pub start_date: NaiveDate,
    pub active: bool,
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let business = sub.get_one::<String>("business").unwrap().trim();
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let amount_raw = sub.get_one::<String>("amount").unwrap();
    let amount =
        parse_amount(amount_raw).with_context(|| format!("Cost '{}' rejected", name))?;
    let frequency: Frequency = sub
        .get_one::<String>("frequency")
        .unwrap()
        .parse()
        .with_context(|| format!("Cost '{}' rejected", name))?;
    let category_id = match sub.get_one::<String>("category").map(|s| s.trim()) {
        Some(c) if !c.is_empty() => Some(active_category(conn, c)?),
        _ => None,
    };
    let start_date = match sub.get_one::<String>("start") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    let description = sub
        .get_one::<String>("description")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let business_id = active_business(conn, business)?;
    let id = insert(
        conn,
        &NewCost {
            business_id,
            name: name.clone(),
            description,
            amount,
            frequency: frequency.clone(),
            category_id,
            start_date,
            active: true,
        },
    )?;
    let monthly = normalize_to_monthly(amount, &frequency)?;
    println!(
        "Added cost #{} '{}' {} {} (= {:.2} / month) for {}",
        id,
        name,
        amount,
        frequency,
        monthly.round_dp(2),
        business
    );
    Ok(())
}

/// Category id for `name`, refusing categories that were deactivated.
pub fn active_category(conn: &Connection, name: &str) -> Result<i64> {
    let id = id_for_category(conn, name)?;
    let active: bool = conn.query_row(
        "SELECT active FROM categories WHERE id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if !active {
        return Err(anyhow!("Category '{}' is deactivated", name.trim()));
    }
    Ok(id)
}

pub fn insert(conn: &Connection, cost: &NewCost) -> Result<i64> {
    if cost.name.is_empty() {
        return Err(anyhow!("Cost name must not be empty"));
    }
    if !cost.frequency.is_known() {
        return Err(CostError::UnknownFrequency(cost.frequency.to_string()).into());
    }
    conn.execute(
        "INSERT INTO costs(business_id, name, description, amount, frequency, category_id, start_date, active)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
        params![
            cost.business_id,
            cost.name,
            cost.description,
            cost.amount.to_string(),
            cost.frequency.as_str(),
            cost.category_id,
            cost.start_date.to_string(),
            cost.active
        ],
    )?;
    let id = conn.last_insert_rowid();
    ReportCache::invalidate(conn, cost.business_id)?;
    debug!(cost_id = id, business_id = cost.business_id, "cost inserted");
    Ok(id)
}

fn business_of(conn: &Connection, id: i64) -> Result<i64> {
    let business_id: Option<i64> = conn
        .query_row(
            "SELECT business_id FROM costs WHERE id=?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    business_id.ok_or_else(|| anyhow!("Cost #{} not found", id))
}

pub fn deactivate(conn: &Connection, id: i64) -> Result<()> {
    let business_id = business_of(conn, id)?;
    conn.execute("UPDATE costs SET active=0 WHERE id=?1", params![id])?;
    ReportCache::invalidate(conn, business_id)?;
    info!(cost_id = id, "cost deactivated");
    Ok(())
}

pub fn remove(conn: &Connection, id: i64) -> Result<()> {
    let business_id = business_of(conn, id)?;
    conn.execute("DELETE FROM costs WHERE id=?1", params![id])?;
    ReportCache::invalidate(conn, business_id)?;
    info!(cost_id = id, "cost deleted");
    Ok(())
}

/// Costs of one business in insertion order.
pub fn records(conn: &Connection, business_id: i64, include_inactive: bool) -> Result<Vec<CostRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, name, description, amount, frequency, category_id, active, start_date
         FROM costs WHERE business_id=?1 AND (active=1 OR ?2) ORDER BY id",
    )?;
    let mut rows = stmt.query(params![business_id, include_inactive])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let amount_s: String = r.get(4)?;
        let freq_s: String = r.get(5)?;
        let date_s: String = r.get(8)?;
        out.push(CostRecord {
            id: r.get(0)?,
            business_id: r.get(1)?,
            name: r.get(2)?,
            description: r.get(3)?,
            amount: decimal_column(&amount_s, "cost amount")?,
            frequency: Frequency::from_tag(&freq_s),
            category_id: r.get(6)?,
            active: r.get(7)?,
            start_date: parse_date(&date_s)?,
        });
    }
    Ok(out)
}

pub fn active_records(conn: &Connection, business_id: i64) -> Result<Vec<CostRecord>> {
    records(conn, business_id, false)
}

#[derive(Serialize)]
pub struct CostRow {
    pub id: i64,
    pub name: String,
    pub amount: String,
    pub frequency: String,
    pub monthly: String,
    pub category: String,
    pub active: bool,
    pub start_date: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let business_id = id_for_business(conn, sub.get_one::<String>("business").unwrap())?;
    let names = crate::commands::categories::names_by_id(conn)?;

    let mut data = Vec::new();
    for rec in records(conn, business_id, sub.get_flag("all"))? {
        let monthly = normalize_to_monthly(rec.amount, &rec.frequency)
            .with_context(|| format!("Cost #{} '{}'", rec.id, rec.name))?;
        data.push(CostRow {
            id: rec.id,
            name: rec.name,
            amount: rec.amount.to_string(),
            frequency: rec.frequency.to_string(),
            monthly: format!("{:.2}", monthly.round_dp(2)),
            category: rec
                .category_id
                .and_then(|id| names.get(&id).cloned())
                .unwrap_or_default(),
            active: rec.active,
            start_date: rec.start_date.to_string(),
        });
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.name,
                    r.amount,
                    r.frequency,
                    r.monthly,
                    r.category,
                    if r.active { "yes" } else { "no" }.into(),
                    r.start_date,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Amount", "Frequency", "Monthly", "Category", "Active", "Start"],
                rows,
            )
        );
    }
    Ok(())
}
