// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cache::ReportCache;
use crate::costing::{AggregationReport, CostError, aggregate, break_even, unit_variable_cost};
use crate::utils::{
    currency_for_business, fmt_money, id_for_business, maybe_print_json, pretty_table,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => print_summary(conn, sub)?,
        Some(("categories", sub)) => print_categories(conn, sub)?,
        Some(("breakeven", sub)) => print_breakeven(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Aggregate the active costs of a business.
///
/// With `use_cached` a snapshot younger than the cache's max age is returned
/// as is; otherwise the report is recomputed and the snapshot refreshed.
pub fn summary(
    conn: &Connection,
    business_id: i64,
    cache: &ReportCache,
    use_cached: bool,
    now: DateTime<Utc>,
) -> Result<AggregationReport> {
    if use_cached {
        if let Some(report) = cache.load(conn, business_id, now)? {
            debug!(business_id, "using cached report");
            return Ok(report);
        }
    }
    let records = crate::commands::costs::active_records(conn, business_id)?;
    let report = aggregate(&records)?;
    cache.store(conn, business_id, now, &report)?;
    Ok(report)
}

fn print_summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let business_id = id_for_business(conn, sub.get_one::<String>("business").unwrap())?;
    let cache = ReportCache::from_settings(conn)?;
    let report = summary(conn, business_id, &cache, sub.get_flag("cached"), Utc::now())?;
    if !maybe_print_json(json_flag, jsonl_flag, &report)? {
        let ccy = currency_for_business(conn, business_id)?;
        let data = vec![
            vec!["Costs".into(), report.count.to_string()],
            vec!["Per month".into(), fmt_money(&report.total_per_month, &ccy)],
            vec!["Per year".into(), fmt_money(&report.total_per_year, &ccy)],
        ];
        println!("{}", pretty_table(&["Metric", "Value"], data));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CategoryRow {
    pub category: String,
    pub costs: usize,
    pub per_month: String,
    pub per_year: String,
    pub percentage: String,
}

pub fn category_rows(conn: &Connection, report: &AggregationReport) -> Result<Vec<CategoryRow>> {
    let names = crate::commands::categories::names_by_id(conn)?;
    let mut shares: Vec<_> = report.categories.iter().collect();
    // biggest share first; ties keep category order
    shares.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    let mut rows = Vec::with_capacity(shares.len());
    for share in shares {
        let category = match share.category_id {
            Some(id) => names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("#{}", id)),
            None => "(uncategorized)".to_string(),
        };
        let per_year = share
            .total_per_month
            .checked_mul(Decimal::from(12))
            .ok_or(CostError::Overflow("yearly total"))?;
        rows.push(CategoryRow {
            category,
            costs: share.count,
            per_month: format!("{:.2}", share.total_per_month.round_dp(2)),
            per_year: format!("{:.2}", per_year.round_dp(2)),
            percentage: format!("{:.2}", share.percentage),
        });
    }
    Ok(rows)
}

fn print_categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let business_id = id_for_business(conn, sub.get_one::<String>("business").unwrap())?;
    let cache = ReportCache::from_settings(conn)?;
    let report = summary(conn, business_id, &cache, false, Utc::now())?;
    let data = category_rows(conn, &report)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .into_iter()
            .map(|r| {
                vec![
                    r.category,
                    r.costs.to_string(),
                    r.per_month,
                    r.per_year,
                    format!("{}%", r.percentage),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Costs", "Per Month", "Per Year", "Share"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct BreakEvenRow {
    pub product: String,
    pub price: String,
    pub unit_variable_cost: String,
    pub contribution: String,
    pub margin_pct: String,
    pub units_per_month: Option<String>,
    pub revenue_per_month: Option<String>,
}

pub fn breakeven_rows(conn: &Connection, business_id: i64) -> Result<Vec<BreakEvenRow>> {
    let records = crate::commands::costs::active_records(conn, business_id)?;
    let fixed = aggregate(&records)?.total_per_month;
    let mut rows = Vec::new();
    for (product, lines) in crate::commands::products::products_with_recipes(conn, business_id)? {
        let be = unit_variable_cost(&lines)
            .and_then(|uvc| break_even(product.price, uvc, fixed))
            .with_context(|| format!("Break-even for '{}'", product.name))?;
        rows.push(BreakEvenRow {
            product: product.name,
            price: format!("{:.2}", be.price.round_dp(2)),
            unit_variable_cost: format!("{:.2}", be.unit_variable_cost.round_dp(2)),
            contribution: format!("{:.2}", be.contribution.round_dp(2)),
            margin_pct: format!("{:.2}", be.margin_pct),
            units_per_month: be.units_per_month.map(|u| u.to_string()),
            revenue_per_month: be.revenue_per_month.map(|r| format!("{:.2}", r.round_dp(2))),
        });
    }
    Ok(rows)
}

fn print_breakeven(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let business_id = id_for_business(conn, sub.get_one::<String>("business").unwrap())?;
    let data = breakeven_rows(conn, business_id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .into_iter()
            .map(|r| {
                vec![
                    r.product,
                    r.price,
                    r.unit_variable_cost,
                    r.contribution,
                    format!("{}%", r.margin_pct),
                    r.units_per_month.unwrap_or_else(|| "never".into()),
                    r.revenue_per_month.unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Product", "Price", "Unit Cost", "Contribution", "Margin", "Units / Month", "Revenue / Month"],
                rows,
            )
        );
    }
    Ok(())
}
