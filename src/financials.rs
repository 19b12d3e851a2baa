// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{FinancialSnapshot, FinancialTrend, StatementTable, TrendPoint};

const OPERATING_INCOME: &[&str] = &["Operating Income", "Total Operating Income As Reported"];
const NET_INCOME: &[&str] = &["Net Income", "Net Income Common Stockholders"];
const EBITDA: &[&str] = &["EBITDA", "Normalized EBITDA"];
const TOTAL_REVENUE: &[&str] = &["Total Revenue", "Revenue"];

/// First alias that yields a value in the latest reporting period that has one
fn lookup(table: &StatementTable, aliases: &[&str]) -> Option<f64> {
    aliases.iter().find_map(|name| table.latest_value(name))
}

/// Pull the headline figures out of a statement table.
///
/// Every field is looked up on its own, so a missing row only blanks that field.
pub fn extract(table: &StatementTable) -> FinancialSnapshot {
    if table.is_empty() {
        return FinancialSnapshot::default();
    }

    FinancialSnapshot {
        operating_income: lookup(table, OPERATING_INCOME),
        net_income: lookup(table, NET_INCOME),
        ebitda: lookup(table, EBITDA),
        revenue: lookup(table, TOTAL_REVENUE),
    }
}

/// Row of the first alias the table has
fn lookup_row<'a>(
    table: &'a StatementTable,
    aliases: &[&str],
) -> Option<&'a BTreeMap<NaiveDate, Option<f64>>> {
    aliases.iter().find_map(|name| table.row(name))
}

/// Revenue and operating income for every reporting period of the table
pub fn trend(table: &StatementTable) -> FinancialTrend {
    let revenue = lookup_row(table, TOTAL_REVENUE);
    let operating_income = lookup_row(table, OPERATING_INCOME);
    let value_at = |row: Option<&BTreeMap<NaiveDate, Option<f64>>>, period: &NaiveDate| {
        row.and_then(|r| r.get(period).copied().flatten())
    };

    let periods: BTreeSet<NaiveDate> = revenue
        .into_iter()
        .chain(operating_income)
        .flat_map(|row| row.keys().copied())
        .collect();

    FinancialTrend::new(
        periods
            .iter()
            .map(|period| TrendPoint {
                period: *period,
                revenue: value_at(revenue, period),
                operating_income: value_at(operating_income, period),
            })
            .collect(),
    )
}
