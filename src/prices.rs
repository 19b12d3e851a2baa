// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{Duration, Months, NaiveDate};

use crate::models::{HistoryPeriod, PriceChanges, PriceSeries};

/// Average close of all observations within `window_days` calendar days of `target`.
///
/// Weekends and holidays simply contribute no observations, so a target that falls
/// on a non-trading day still gets a reference from the surrounding sessions.
/// Returns `None` when the window selects nothing.
pub fn average_near(series: &PriceSeries, target: NaiveDate, window_days: u32) -> Option<f64> {
    let window = Duration::days(window_days as i64);
    let from = target.checked_sub_signed(window).unwrap_or(NaiveDate::MIN);
    let to = target.checked_add_signed(window).unwrap_or(NaiveDate::MAX);
    let selected = series.range(from, to);

    if selected.is_empty() {
        return None;
    }

    let sum: f64 = selected.iter().map(|p| p.close).sum();
    Some(sum / selected.len() as f64)
}

/// Percentage change from `historical` to `current`.
///
/// `None` if either operand is missing or non-finite, or if `historical` is zero.
pub fn percent_change(current: Option<f64>, historical: Option<f64>) -> Option<f64> {
    let current = current.filter(|c| c.is_finite())?;
    let historical = historical.filter(|h| h.is_finite() && *h != 0.0)?;
    Some((current - historical) / historical * 100.0)
}

/// Calendar date `period` before `today`, clamped to the end of shorter months
pub fn reference_date(today: NaiveDate, period: HistoryPeriod) -> NaiveDate {
    today
        .checked_sub_months(Months::new(period.months()))
        .unwrap_or(NaiveDate::MIN)
}

/// Earliest date whose price can influence any of the look-back windows
pub fn history_start(today: NaiveDate, window_days: u32) -> NaiveDate {
    reference_date(today, HistoryPeriod::FiveYears)
        .checked_sub_signed(Duration::days(window_days as i64))
        .unwrap_or(NaiveDate::MIN)
}

/// Changes from every standard look-back reference to `current`
pub fn compute_changes(
    series: &PriceSeries,
    current: Option<f64>,
    today: NaiveDate,
    window_days: u32,
) -> PriceChanges {
    let change_for = |period: HistoryPeriod| {
        let reference = average_near(series, reference_date(today, period), window_days);
        percent_change(current, reference)
    };

    PriceChanges {
        change_6m: change_for(HistoryPeriod::SixMonths),
        change_1y: change_for(HistoryPeriod::OneYear),
        change_5y: change_for(HistoryPeriod::FiveYears),
    }
}
