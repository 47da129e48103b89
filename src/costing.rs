// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cost normalization, aggregation and break-even math.
//!
//! Everything in here is pure: callers fetch records from the store, hand them
//! over, and decide what to do with the resulting report.

use crate::models::{CostRecord, RecipeLine};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostError {
    #[error("Amount {0} is negative")]
    NegativeAmount(Decimal),
    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("Unknown frequency '{0}', expected monthly|semiannual|annual")]
    UnknownFrequency(String),
    #[error("Quantity {0} must be greater than zero")]
    InvalidQuantity(Decimal),
    #[error("Amount {0} is too large (max 1000000000000000)")]
    AmountTooLarge(Decimal),
    #[error("Result of {0} is too large to represent")]
    Overflow(&'static str),
}

/// Largest amount, price, quantity or unit cost accepted from input.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Billing cadence of a cost record.
///
/// `Other` keeps whatever tag was stored so it can be reported back; it is
/// normalized as if it were monthly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Monthly,
    Semiannual,
    Annual,
    Other(String),
}

impl Frequency {
    /// Lenient parse used when reading stored rows.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "monthly" => Frequency::Monthly,
            "semiannual" => Frequency::Semiannual,
            "annual" => Frequency::Annual,
            _ => Frequency::Other(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Semiannual => "semiannual",
            Frequency::Annual => "annual",
            Frequency::Other(tag) => tag.as_str(),
        }
    }

    /// Number of months one payment covers.
    pub fn months(&self) -> Decimal {
        match self {
            Frequency::Semiannual => Decimal::from(6),
            Frequency::Annual => Decimal::from(12),
            Frequency::Monthly | Frequency::Other(_) => Decimal::ONE,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Frequency::Other(_))
    }
}

impl FromStr for Frequency {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Frequency::from_tag(s) {
            Frequency::Other(tag) => Err(CostError::UnknownFrequency(tag.trim().to_string())),
            known => Ok(known),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Frequency {
    fn from(s: String) -> Self {
        Frequency::from_tag(&s)
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.as_str().to_string()
    }
}

/// Parse a user-supplied amount, rejecting garbage and negatives.
pub fn parse_amount(raw: &str) -> Result<Decimal, CostError> {
    let trimmed = raw.trim();
    let amount = trimmed
        .parse::<Decimal>()
        .map_err(|_| CostError::InvalidAmount(trimmed.to_string()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CostError::NegativeAmount(amount));
    }
    if amount > MAX_AMOUNT {
        return Err(CostError::AmountTooLarge(amount));
    }
    Ok(amount)
}

/// Convert `amount`, paid once per `frequency`, into what it costs per month.
pub fn normalize_to_monthly(amount: Decimal, frequency: &Frequency) -> Result<Decimal, CostError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CostError::NegativeAmount(amount));
    }
    Ok(amount / frequency.months())
}

/// `part` as a percentage of `total`, 2 dp, zero when `total` is zero.
pub fn percentage_of(part: Decimal, total: Decimal) -> Result<Decimal, CostError> {
    if total.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let pct = part
        .checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(CostError::Overflow("percentage"))?;
    Ok(pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category_id: Option<i64>,
    pub total_per_month: Decimal,
    pub percentage: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationReport {
    pub total_per_month: Decimal,
    pub total_per_year: Decimal,
    pub categories: Vec<CategoryShare>,
    pub count: usize,
}

// Categorized groups sort by id, uncategorized goes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
    Category(i64),
    Uncategorized,
}

impl GroupKey {
    fn category_id(self) -> Option<i64> {
        match self {
            GroupKey::Category(id) => Some(id),
            GroupKey::Uncategorized => None,
        }
    }
}

/// Build an [`AggregationReport`] from a business's cost records.
///
/// Records are not filtered on `active`; pass only the ones that should count.
pub fn aggregate(records: &[CostRecord]) -> Result<AggregationReport, CostError> {
    let mut groups: BTreeMap<GroupKey, (Decimal, usize)> = BTreeMap::new();
    for rec in records {
        let monthly = normalize_to_monthly(rec.amount, &rec.frequency)?;
        let key = rec
            .category_id
            .map(GroupKey::Category)
            .unwrap_or(GroupKey::Uncategorized);
        let entry = groups.entry(key).or_insert((Decimal::ZERO, 0));
        entry.0 = entry
            .0
            .checked_add(monthly)
            .ok_or(CostError::Overflow("category total"))?;
        entry.1 += 1;
    }

    let mut total_per_month = Decimal::ZERO;
    for (sum, _) in groups.values() {
        total_per_month = total_per_month
            .checked_add(*sum)
            .ok_or(CostError::Overflow("monthly total"))?;
    }
    let total_per_year = total_per_month
        .checked_mul(Decimal::from(12))
        .ok_or(CostError::Overflow("yearly total"))?;

    let mut categories = Vec::with_capacity(groups.len());
    for (key, (sum, count)) in groups {
        categories.push(CategoryShare {
            category_id: key.category_id(),
            total_per_month: sum,
            percentage: percentage_of(sum, total_per_month)?,
            count,
        });
    }

    Ok(AggregationReport {
        total_per_month,
        total_per_year,
        categories,
        count: records.len(),
    })
}

/// Variable cost of producing one unit: sum of quantity x unit cost.
pub fn unit_variable_cost(lines: &[RecipeLine]) -> Result<Decimal, CostError> {
    lines.iter().try_fold(Decimal::ZERO, |acc, l| {
        l.quantity
            .checked_mul(l.unit_cost)
            .and_then(|line| acc.checked_add(line))
            .ok_or(CostError::Overflow("unit variable cost"))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEven {
    pub price: Decimal,
    pub unit_variable_cost: Decimal,
    pub contribution: Decimal,
    pub margin_pct: Decimal,
    pub units_per_month: Option<Decimal>,
    pub revenue_per_month: Option<Decimal>,
}

/// Units a product has to sell each month to cover `fixed_per_month`.
///
/// `units_per_month` is `None` when every sale loses money or breaks even on
/// its own, since no volume will ever cover the fixed costs. A volume too
/// large to represent is an [`CostError::Overflow`].
pub fn break_even(
    price: Decimal,
    unit_variable_cost: Decimal,
    fixed_per_month: Decimal,
) -> Result<BreakEven, CostError> {
    let contribution = price
        .checked_sub(unit_variable_cost)
        .ok_or(CostError::Overflow("contribution"))?;
    let (units, revenue) = if contribution > Decimal::ZERO {
        let units = fixed_per_month
            .checked_div(contribution)
            .ok_or(CostError::Overflow("break-even units"))?
            .ceil();
        let revenue = units
            .checked_mul(price)
            .ok_or(CostError::Overflow("break-even revenue"))?;
        (Some(units), Some(revenue))
    } else {
        (None, None)
    };
    Ok(BreakEven {
        price,
        unit_variable_cost,
        contribution,
        margin_pct: percentage_of(contribution, price)?,
        units_per_month: units,
        revenue_per_month: revenue,
    })
}
