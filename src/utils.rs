// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

/// Shown wherever a value is missing
pub const NOT_AVAILABLE: &str = "N/A";

// Largest first. A unit is used once the magnitude reaches half of it.
const MONEY_UNITS: [(f64, &str); 3] = [
    (1_000_000_000.0, "B"),
    (1_000_000.0, "M"),
    (1_000.0, "K"),
];

// Symbols for the common quote currencies; other codes are printed as `CODE `
const CURRENCY_SYMBOLS: [(&str, &str); 6] = [
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("JPY", "¥"),
    ("CNY", "¥"),
    ("INR", "₹"),
];

/// Prefix for amounts quoted in `currency`; no currency means US dollars
pub fn currency_prefix(currency: Option<&str>) -> String {
    let Some(code) = currency.map(str::trim).filter(|c| !c.is_empty()) else {
        return "$".to_string();
    };
    let code = code.to_ascii_uppercase();
    CURRENCY_SYMBOLS
        .iter()
        .find(|(iso, _)| *iso == code)
        .map(|(_, symbol)| symbol.to_string())
        .unwrap_or_else(|| format!("{} ", code))
}

/// Format a currency amount in thousands, millions or billions (e.g. $2.50B, €0.75M)
pub fn format_money(value: f64, currency: Option<&str>) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let prefix = currency_prefix(currency);
    let magnitude = value.abs();

    for (unit, suffix) in MONEY_UNITS {
        if magnitude >= unit / 2.0 {
            return format!("{}{}{:.2}{}", sign, prefix, magnitude / unit, suffix);
        }
    }

    format!("{}{}{:.2}", sign, prefix, magnitude)
}

pub fn format_money_opt(value: Option<f64>, currency: Option<&str>) -> String {
    value
        .map(|v| format_money(v, currency))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Signed percentage with two decimals, e.g. `+12.34%`
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:+.2}%", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Share price with two decimals, e.g. `$187.20` or `SEK 101.30`
pub fn format_price(value: Option<f64>, currency: Option<&str>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{}{:.2}", currency_prefix(currency), v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Plain ratio with two decimals, e.g. a P/E of `28.41`
pub fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Fraction shown as an unsigned percentage, 0.0123 is `1.23%`
pub fn format_yield(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v * 100.0),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn text_or_na(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// Ticker made safe for use as a file name stem.
///
/// ASCII letters, digits, `.` and `-` are kept; every other byte becomes `_XX` (hex),
/// so distinct tickers never share a stem.
pub fn file_stem(ticker: &str) -> String {
    let mut stem = String::with_capacity(ticker.len());
    for c in ticker.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') {
            stem.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                stem.push_str(&format!("_{:02X}", byte));
            }
        }
    }
    stem
}

/// Safely truncate a string to a maximum number of characters, respecting UTF-8 boundaries
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
