// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{self, CACHE_DAYS_KEY, CURRENCY_KEY};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let data = vec![
                vec![CURRENCY_KEY.to_string(), config::default_currency(conn)?],
                vec![CACHE_DAYS_KEY.to_string(), config::cache_days(conn)?.to_string()],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], data));
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            let value = sub.get_one::<String>("value").unwrap();
            let stored = config::set(conn, key, value)?;
            println!("{} = {}", key.trim(), stored);
        }
        _ => {}
    }
    Ok(())
}
