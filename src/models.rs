// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;
use reqwest::Url;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closes in ascending date order, at most one per date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from unordered points.
    ///
    /// Points are sorted by date; for a repeated date the last observation wins.
    /// Non-finite closes are dropped.
    pub fn new(points: Vec<PricePoint>) -> Self {
        let mut points: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| p.close.is_finite())
            .collect();
        // Stable sort keeps input order among equal dates, so the last one is the latest observation
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self { points: deduped }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Points with `from <= date <= to`
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> &[PricePoint] {
        if from > to {
            return &[];
        }
        let start = self.points.partition_point(|p| p.date < from);
        let end = self.points.partition_point(|p| p.date <= to);
        &self.points[start..end]
    }

    /// Owned copy of the points on or after `from`
    pub fn since(&self, from: NaiveDate) -> PriceSeries {
        let start = self.points.partition_point(|p| p.date < from);
        PriceSeries {
            points: self.points[start..].to_vec(),
        }
    }
}

/// Identity and quote fields from the market-data provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyInfo {
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub currency: Option<String>,
    pub pe_ratio: Option<f64>,
    /// Fraction, 0.0123 is 1.23%
    pub dividend_yield: Option<f64>,
}

/// Financial statement keyed by line item and reporting period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementTable {
    rows: BTreeMap<String, BTreeMap<NaiveDate, Option<f64>>>,
}

impl StatementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, line_item: &str, period: NaiveDate, value: Option<f64>) {
        self.rows
            .entry(line_item.to_string())
            .or_default()
            .insert(period, value.filter(|v| v.is_finite()));
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive row lookup
    pub fn row(&self, line_item: &str) -> Option<&BTreeMap<NaiveDate, Option<f64>>> {
        self.rows
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(line_item))
            .map(|(_, row)| row)
    }

    /// Value of the most recent period that has one
    pub fn latest_value(&self, line_item: &str) -> Option<f64> {
        self.row(line_item)?
            .iter()
            .rev()
            .find_map(|(_, value)| *value)
    }
}

/// Latest headline figures from the financial statements
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
    pub ebitda: Option<f64>,
    pub revenue: Option<f64>,
}

impl FinancialSnapshot {
    /// Fill absent fields from `other`
    pub fn or(self, other: FinancialSnapshot) -> FinancialSnapshot {
        FinancialSnapshot {
            operating_income: self.operating_income.or(other.operating_income),
            net_income: self.net_income.or(other.net_income),
            ebitda: self.ebitda.or(other.ebitda),
            revenue: self.revenue.or(other.revenue),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operating_income.is_none()
            && self.net_income.is_none()
            && self.ebitda.is_none()
            && self.revenue.is_none()
    }
}

/// Revenue and operating income of one reporting period
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: NaiveDate,
    pub revenue: Option<f64>,
    pub operating_income: Option<f64>,
}

/// Reporting periods in ascending date order, for the financial trend chart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialTrend {
    points: Vec<TrendPoint>,
}

impl FinancialTrend {
    /// Periods where neither figure is known are dropped
    pub fn new(mut points: Vec<TrendPoint>) -> Self {
        points.retain(|p| p.revenue.is_some() || p.operating_income.is_some());
        points.sort_by_key(|p| p.period);
        points.dedup_by_key(|p| p.period);
        Self { points }
    }

    pub fn points(&self) -> &[TrendPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// First and last period
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.period, self.points.last()?.period))
    }
}

/// Article as returned by the primary news search provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub url: Option<String>,
    pub source_name: Option<String>,
}

impl RawArticle {
    pub fn to_article(&self) -> Option<NewsArticle> {
        NewsArticle::usable(
            self.title.as_deref(),
            self.url.as_deref(),
            self.source_name.as_deref(),
        )
    }
}

/// Article as returned by the market-data news feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNewsItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub publisher: Option<String>,
}

impl RawNewsItem {
    pub fn to_article(&self) -> Option<NewsArticle> {
        NewsArticle::usable(
            self.title.as_deref(),
            self.link.as_deref(),
            self.publisher.as_deref(),
        )
    }
}

/// A news article with the fields the report needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub publisher: String,
}

pub const UNKNOWN_PUBLISHER: &str = "Unknown source";

impl NewsArticle {
    /// Returns `None` unless the title is non-blank and the URL is an absolute http(s) link
    pub fn usable(title: Option<&str>, url: Option<&str>, publisher: Option<&str>) -> Option<Self> {
        let title = title.map(str::trim).filter(|t| !t.is_empty())?;
        let url = url.map(str::trim).filter(|u| is_web_link(u))?;
        let publisher = publisher
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(UNKNOWN_PUBLISHER);

        Some(Self {
            title: title.to_string(),
            url: url.to_string(),
            publisher: publisher.to_string(),
        })
    }
}

fn is_web_link(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// Risk-at-a-glance classification of a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemaphoreColor {
    Green,
    Yellow,
    Red,
    /// Not enough data to classify
    Gray,
}

impl SemaphoreColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemaphoreColor::Green => "green",
            SemaphoreColor::Yellow => "yellow",
            SemaphoreColor::Red => "red",
            SemaphoreColor::Gray => "gray",
        }
    }
}

impl fmt::Display for SemaphoreColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look-back periods used for changes and price charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryPeriod {
    SixMonths,
    OneYear,
    FiveYears,
}

impl HistoryPeriod {
    pub const ALL: [HistoryPeriod; 3] = [
        HistoryPeriod::SixMonths,
        HistoryPeriod::OneYear,
        HistoryPeriod::FiveYears,
    ];

    pub fn months(&self) -> u32 {
        match self {
            HistoryPeriod::SixMonths => 6,
            HistoryPeriod::OneYear => 12,
            HistoryPeriod::FiveYears => 60,
        }
    }

    /// Short name used in file names
    pub fn slug(&self) -> &'static str {
        match self {
            HistoryPeriod::SixMonths => "6m",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::FiveYears => "5y",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryPeriod::SixMonths => "6 Months",
            HistoryPeriod::OneYear => "1 Year",
            HistoryPeriod::FiveYears => "5 Years",
        }
    }
}

/// Percentage changes against the windowed reference prices
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceChanges {
    pub change_6m: Option<f64>,
    pub change_1y: Option<f64>,
    pub change_5y: Option<f64>,
}

impl PriceChanges {
    pub fn get(&self, period: HistoryPeriod) -> Option<f64> {
        match period {
            HistoryPeriod::SixMonths => self.change_6m,
            HistoryPeriod::OneYear => self.change_1y,
            HistoryPeriod::FiveYears => self.change_5y,
        }
    }
}

/// Relative paths (from the output directory) of the charts for one company
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartLinks {
    pub price_6m: Option<String>,
    pub price_1y: Option<String>,
    pub price_5y: Option<String>,
    pub financial: Option<String>,
}

impl ChartLinks {
    pub fn set_price(&mut self, period: HistoryPeriod, path: Option<String>) {
        match period {
            HistoryPeriod::SixMonths => self.price_6m = path,
            HistoryPeriod::OneYear => self.price_1y = path,
            HistoryPeriod::FiveYears => self.price_5y = path,
        }
    }

    pub fn price(&self, period: HistoryPeriod) -> Option<&str> {
        match period {
            HistoryPeriod::SixMonths => self.price_6m.as_deref(),
            HistoryPeriod::OneYear => self.price_1y.as_deref(),
            HistoryPeriod::FiveYears => self.price_5y.as_deref(),
        }
    }
}

/// Everything the report shows for one ticker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyReport {
    pub ticker: String,
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub current_price: Option<f64>,
    /// ISO 4217 code the prices and statements are quoted in
    pub currency: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub changes: PriceChanges,
    pub financials: FinancialSnapshot,
    pub trend: FinancialTrend,
    pub semaphore: SemaphoreColor,
    pub news_summary: String,
    pub articles: Vec<NewsArticle>,
    pub charts: ChartLinks,
}

pub const DATA_UNAVAILABLE: &str = "Data for this company could not be loaded.";

impl CompanyReport {
    /// Record used when a ticker's pipeline fails; same shape as a full record
    pub fn degraded(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            sector: None,
            industry: None,
            current_price: None,
            currency: None,
            market_cap: None,
            pe_ratio: None,
            dividend_yield: None,
            changes: PriceChanges::default(),
            financials: FinancialSnapshot::default(),
            trend: FinancialTrend::default(),
            semaphore: SemaphoreColor::Gray,
            news_summary: DATA_UNAVAILABLE.to_string(),
            articles: Vec::new(),
            charts: ChartLinks::default(),
        }
    }

    pub fn summary_row(&self) -> SummaryRow {
        SummaryRow {
            ticker: self.ticker.clone(),
            name: self.name.clone(),
            current_price: self.current_price,
            currency: self.currency.clone(),
            changes: self.changes,
            semaphore: self.semaphore,
        }
    }
}

/// Projection of a report for the top-level table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub ticker: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub currency: Option<String>,
    pub changes: PriceChanges,
    pub semaphore: SemaphoreColor,
}

/// All company reports of one run, in ticker-list order
#[derive(Debug, Clone)]
pub struct ReportSet {
    companies: Vec<CompanyReport>,
    summary: Vec<SummaryRow>,
    generated_at: chrono::NaiveDateTime,
}

impl ReportSet {
    pub fn new(companies: Vec<CompanyReport>, generated_at: chrono::NaiveDateTime) -> Self {
        let summary = companies.iter().map(CompanyReport::summary_row).collect();
        Self {
            companies,
            summary,
            generated_at,
        }
    }

    pub fn companies(&self) -> &[CompanyReport] {
        &self.companies
    }

    pub fn summary(&self) -> &[SummaryRow] {
        &self.summary
    }

    pub fn generated_at(&self) -> chrono::NaiveDateTime {
        self.generated_at
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_price_series_sorts_and_dedups() {
        let series = PriceSeries::new(vec![
            PricePoint { date: date(2025, 1, 3), close: 3.0 },
            PricePoint { date: date(2025, 1, 1), close: 1.0 },
            PricePoint { date: date(2025, 1, 3), close: 30.0 },
            PricePoint { date: date(2025, 1, 2), close: f64::NAN },
        ]);

        let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 1, 3)]);
        assert_eq!(series.latest().unwrap().close, 30.0);
    }

    #[test]
    fn test_price_series_range_is_inclusive() {
        let series = PriceSeries::new(
            (1..=10)
                .map(|d| PricePoint { date: date(2025, 3, d), close: d as f64 })
                .collect(),
        );

        let selected = series.range(date(2025, 3, 3), date(2025, 3, 5));
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].close, 3.0);
        assert_eq!(selected[2].close, 5.0);
        assert!(series.range(date(2025, 3, 5), date(2025, 3, 3)).is_empty());
        assert_eq!(series.since(date(2025, 3, 9)).len(), 2);
    }

    #[test]
    fn test_statement_latest_value_skips_empty_periods() {
        let mut table = StatementTable::new();
        table.insert("Net Income", date(2023, 12, 31), Some(10.0));
        table.insert("Net Income", date(2024, 12, 31), None);

        assert_eq!(table.latest_value("net income"), Some(10.0));
        assert_eq!(table.latest_value("EBITDA"), None);
    }

    #[test]
    fn test_news_article_requires_title_and_url() {
        assert!(NewsArticle::usable(Some("Title"), None, Some("Reuters")).is_none());
        assert!(NewsArticle::usable(Some("  "), Some("https://x"), None).is_none());

        let article = NewsArticle::usable(Some("Title"), Some("https://x"), None).unwrap();
        assert_eq!(article.publisher, UNKNOWN_PUBLISHER);
    }

    #[test]
    fn test_news_article_rejects_non_web_links() {
        for link in [
            "javascript:alert(document.cookie)",
            "  JavaScript:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "ftp://files.example/report.pdf",
            "/relative/path",
            "news.example/story",
        ] {
            assert!(
                NewsArticle::usable(Some("Title"), Some(link), None).is_none(),
                "{} should be rejected",
                link
            );
        }

        let article =
            NewsArticle::usable(Some("Title"), Some(" http://news.example/a?b=1 "), None).unwrap();
        assert_eq!(article.url, "http://news.example/a?b=1");
        assert!(NewsArticle::usable(Some("Title"), Some("HTTPS://News.Example/x"), None).is_some());
    }

    #[test]
    fn test_financial_trend_orders_and_drops_empty_periods() {
        let trend = FinancialTrend::new(vec![
            TrendPoint { period: date(2024, 12, 31), revenue: Some(4.0), operating_income: Some(1.0) },
            TrendPoint { period: date(2022, 12, 31), revenue: Some(2.0), operating_income: None },
            TrendPoint { period: date(2023, 12, 31), revenue: None, operating_income: None },
        ]);

        assert_eq!(trend.len(), 2);
        assert_eq!(trend.points()[0].period, date(2022, 12, 31));
        assert_eq!(trend.span(), Some((date(2022, 12, 31), date(2024, 12, 31))));
        assert!(FinancialTrend::default().span().is_none());
    }

    #[test]
    fn test_degraded_report_is_gray() {
        let report = CompanyReport::degraded("BAD");
        assert_eq!(report.semaphore, SemaphoreColor::Gray);
        assert_eq!(report.name, "BAD");
        assert!(report.articles.is_empty());
        assert_eq!(report.news_summary, DATA_UNAVAILABLE);
        assert_eq!(report.charts, ChartLinks::default());
    }

    #[test]
    fn test_report_set_keeps_order_and_projects_summary() {
        let reports = vec![CompanyReport::degraded("B"), CompanyReport::degraded("A")];
        let set = ReportSet::new(reports, chrono::NaiveDateTime::default());

        assert_eq!(set.len(), 2);
        assert_eq!(set.summary()[0].ticker, "B");
        assert_eq!(set.summary()[1].ticker, "A");
    }
}
