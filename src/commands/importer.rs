// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::costs::{NewCost, active_category, insert};
use crate::costing::{Frequency, parse_amount};
use crate::utils::{active_business, parse_date};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use rusqlite::Connection;
use std::collections::{HashMap, hash_map::Entry};
use tracing::info;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("costs", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let business = sub.get_one::<String>("business").unwrap();
            let n = import_costs(conn, business, path)?;
            println!("Imported {} costs from {}", n, path);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Import `name,amount,frequency,category,start_date,description[,active]` rows.
///
/// Runs in one transaction: a single bad row leaves the store untouched. A
/// missing or empty `active` column means the cost is active.
pub fn import_costs(conn: &mut Connection, business: &str, path: &str) -> Result<usize> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let business_id = active_business(&tx, business)?;
    let today = chrono::Local::now().date_naive();
    let mut category_cache: HashMap<String, i64> = HashMap::new();
    let mut imported = 0usize;

    for (idx, result) in rdr.records().enumerate() {
        let line = idx + 2;
        let rec = result?;
        let name = rec.get(0).context("name missing")?.trim().to_string();
        let amount_raw = rec.get(1).context("amount missing")?.trim().to_string();
        let freq_raw = rec.get(2).unwrap_or("").trim();
        let category = rec.get(3).unwrap_or("").trim().to_string();
        let date_raw = rec.get(4).unwrap_or("").trim();
        let description = rec
            .get(5)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        let active = parse_active(rec.get(6).unwrap_or(""))
            .with_context(|| format!("Line {}: cost '{}'", line, name))?;

        let amount = parse_amount(&amount_raw)
            .with_context(|| format!("Line {}: invalid amount for '{}'", line, name))?;
        let frequency: Frequency = if freq_raw.is_empty() {
            Frequency::Monthly
        } else {
            freq_raw
                .parse()
                .with_context(|| format!("Line {}: cost '{}'", line, name))?
        };
        let start_date = if date_raw.is_empty() {
            today
        } else {
            parse_date(date_raw).with_context(|| format!("Line {}: cost '{}'", line, name))?
        };
        let category_id = if category.is_empty() {
            None
        } else {
            let cat_id = match category_cache.entry(category.clone()) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let fetched = active_category(&tx, &category)?;
                    *entry.insert(fetched)
                }
            };
            Some(cat_id)
        };

        insert(
            &tx,
            &NewCost {
                business_id,
                name,
                description,
                amount,
                frequency,
                category_id,
                start_date,
                active,
            },
        )
        .with_context(|| format!("Line {}", line))?;
        imported += 1;
    }
    tx.commit()?;
    info!(business_id, imported, path, "cost import finished");
    Ok(imported)
}

fn parse_active(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "" | "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(anyhow!("Invalid active flag '{}', expected true|false", other)),
    }
}
