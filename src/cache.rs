// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::costing::AggregationReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, warn};

/// Advisory store of the last computed report per business.
///
/// A snapshot is only handed back for the business it was computed for and
/// while it is younger than `max_age`. Anything else means recompute.
#[derive(Debug, Clone, Copy)]
pub struct ReportCache {
    max_age: Duration,
}

impl ReportCache {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn from_settings(conn: &Connection) -> Result<Self> {
        let days = crate::config::cache_days(conn)?;
        let max_age = Duration::try_days(days).unwrap_or_else(|| {
            warn!("cache_days {days} out of range, using default");
            Duration::days(crate::config::DEFAULT_CACHE_DAYS)
        });
        Ok(Self::new(max_age))
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn load(
        &self,
        conn: &Connection,
        business_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<AggregationReport>> {
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT computed_at, payload FROM report_snapshots WHERE business_id=?1",
                params![business_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let Some((computed_at, payload)) = row else {
            debug!(business_id, "no report snapshot");
            return Ok(None);
        };
        let computed_at = match DateTime::parse_from_rfc3339(&computed_at) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                warn!(business_id, "discarding snapshot with bad timestamp '{computed_at}': {e}");
                return Ok(None);
            }
        };
        let age = now - computed_at;
        if age < Duration::zero() || age > self.max_age {
            debug!(business_id, age_days = age.num_days(), "report snapshot is stale");
            return Ok(None);
        }
        let report: AggregationReport = serde_json::from_str(&payload)
            .with_context(|| format!("Corrupt report snapshot for business #{}", business_id))?;
        Ok(Some(report))
    }

    pub fn store(
        &self,
        conn: &Connection,
        business_id: i64,
        now: DateTime<Utc>,
        report: &AggregationReport,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO report_snapshots(business_id, computed_at, payload) VALUES (?1,?2,?3)
             ON CONFLICT(business_id) DO UPDATE SET computed_at=excluded.computed_at, payload=excluded.payload",
            params![business_id, now.to_rfc3339(), serde_json::to_string(report)?],
        )?;
        Ok(())
    }

    pub fn invalidate(conn: &Connection, business_id: i64) -> Result<()> {
        conn.execute(
            "DELETE FROM report_snapshots WHERE business_id=?1",
            params![business_id],
        )?;
        Ok(())
    }
}
