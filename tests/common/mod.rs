// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Common test utilities and helpers
//!
//! In-memory stand-ins for the external services:
//! - `MockMarketData` with per-ticker canned data or failures
//! - `MockNewsSearch` and `MockSummarizer` that record what they were asked
//! - `RecordingCharts`, a chart renderer that writes nothing
#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use stock_semaphore::charts::{financial_chart_path, price_chart_path};
use stock_semaphore::config::NewsConfig;
use stock_semaphore::models::{
    CompanyInfo, FinancialTrend, HistoryPeriod, PricePoint, PriceSeries, RawArticle,
    RawNewsItem, StatementTable,
};
use stock_semaphore::providers::{ChartRenderer, MarketData, NewsQuery, NewsSearch, Summarizer};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fixed "today" used across the integration tests
pub fn today() -> NaiveDate {
    date(2025, 6, 16)
}

/// One close per calendar day in `[from, to]`, all equal to `close`
pub fn flat_series(from: NaiveDate, to: NaiveDate, close: f64) -> PriceSeries {
    let days = (to - from).num_days();
    PriceSeries::new(
        (0..=days)
            .map(|i| PricePoint {
                date: from + Duration::days(i),
                close,
            })
            .collect(),
    )
}

pub fn company_info(name: &str, price: Option<f64>) -> CompanyInfo {
    CompanyInfo {
        name: name.to_string(),
        sector: Some("Technology".to_string()),
        industry: Some("Consumer Electronics".to_string()),
        current_price: price,
        market_cap: Some(2.9e12),
        currency: Some("USD".to_string()),
        pe_ratio: Some(28.4),
        dividend_yield: Some(0.0044),
    }
}

pub fn income_statement(operating_income: f64, net_income: f64) -> StatementTable {
    let mut table = StatementTable::new();
    let period = date(2024, 9, 28);
    table.insert("Operating Income", period, Some(operating_income));
    table.insert("Net Income", period, Some(net_income));
    table.insert("Total Revenue", period, Some(operating_income * 3.0));
    table
}

pub fn raw_article(n: usize) -> RawArticle {
    RawArticle {
        title: Some(format!("Primary headline {}", n)),
        url: Some(format!("https://primary.example/{}", n)),
        source_name: Some("Primary Wire".to_string()),
    }
}

pub fn raw_news_item(n: usize) -> RawNewsItem {
    RawNewsItem {
        title: Some(format!("Feed headline {}", n)),
        link: Some(format!("https://feed.example/{}", n)),
        publisher: Some("Feed Wire".to_string()),
    }
}

/// Canned data for one ticker
#[derive(Clone)]
pub struct MockCompany {
    pub info: CompanyInfo,
    pub history: PriceSeries,
    pub income: StatementTable,
    pub cashflow: StatementTable,
    pub news: Vec<RawNewsItem>,
}

impl MockCompany {
    /// Flat history at `past_close` and a current price of `current_price`
    pub fn new(name: &str, past_close: f64, current_price: f64) -> Self {
        Self {
            info: company_info(name, Some(current_price)),
            history: flat_series(date(2020, 6, 1), today(), past_close),
            income: income_statement(2.5e9, 750_000.0),
            cashflow: StatementTable::new(),
            news: vec![raw_news_item(1)],
        }
    }
}

#[derive(Default)]
pub struct MockMarketData {
    companies: HashMap<String, MockCompany>,
    failing_history: HashSet<String>,
    failing_statements: bool,
    failing_news: bool,
    pub news_calls: AtomicUsize,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_company(mut self, ticker: &str, company: MockCompany) -> Self {
        self.companies.insert(ticker.to_string(), company);
        self
    }

    /// `get_history` errors for `ticker` while its other data stays available
    pub fn with_failing_history(mut self, ticker: &str) -> Self {
        self.failing_history.insert(ticker.to_string());
        self
    }

    pub fn with_failing_statements(mut self) -> Self {
        self.failing_statements = true;
        self
    }

    pub fn with_failing_news(mut self) -> Self {
        self.failing_news = true;
        self
    }

    fn company(&self, ticker: &str) -> Result<&MockCompany> {
        self.companies
            .get(ticker)
            .ok_or_else(|| anyhow!("No data found for ticker {}", ticker))
    }
}

#[async_trait]
impl MarketData for MockMarketData {
    async fn get_info(&self, ticker: &str) -> Result<CompanyInfo> {
        Ok(self.company(ticker)?.info.clone())
    }

    async fn get_history(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceSeries> {
        if self.failing_history.contains(ticker) {
            return Err(anyhow!("price history unavailable for {}", ticker));
        }
        let company = self.company(ticker)?;
        Ok(PriceSeries::new(company.history.range(from, to).to_vec()))
    }

    async fn get_financials(&self, ticker: &str) -> Result<StatementTable> {
        if self.failing_statements {
            return Err(anyhow!("statement endpoint unavailable"));
        }
        Ok(self.company(ticker)?.income.clone())
    }

    async fn get_cashflow(&self, ticker: &str) -> Result<StatementTable> {
        if self.failing_statements {
            return Err(anyhow!("statement endpoint unavailable"));
        }
        Ok(self.company(ticker)?.cashflow.clone())
    }

    async fn get_news(&self, ticker: &str) -> Result<Vec<RawNewsItem>> {
        self.news_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_news {
            return Err(anyhow!("news feed unavailable"));
        }
        Ok(self
            .companies
            .get(ticker)
            .map(|c| c.news.clone())
            .unwrap_or_default())
    }
}

pub struct MockNewsSearch {
    response: std::result::Result<Vec<RawArticle>, String>,
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<NewsQuery>>,
}

impl MockNewsSearch {
    pub fn returning(articles: Vec<RawArticle>) -> Self {
        Self {
            response: Ok(articles),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NewsSearch for MockNewsSearch {
    async fn search(&self, query: &NewsQuery) -> Result<Vec<RawArticle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        self.response.clone().map_err(|e| anyhow!(e))
    }
}

pub struct MockSummarizer {
    response: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockSummarizer {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone().map_err(|e| anyhow!(e))
    }
}

/// Chart renderer that only records which charts were requested
#[derive(Default)]
pub struct RecordingCharts {
    fail_price_charts: bool,
    pub rendered: Mutex<Vec<String>>,
    /// Currency passed with each chart request
    pub currencies: Mutex<Vec<Option<String>>>,
    pub trends: Mutex<Vec<FinancialTrend>>,
}

impl RecordingCharts {
    pub fn failing_price_charts() -> Self {
        Self {
            fail_price_charts: true,
            ..Self::default()
        }
    }
}

impl ChartRenderer for RecordingCharts {
    fn price_chart(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        series: &PriceSeries,
        currency: Option<&str>,
    ) -> Result<String> {
        self.currencies.lock().unwrap().push(currency.map(str::to_string));
        if self.fail_price_charts {
            return Err(anyhow!("no fonts available"));
        }
        assert!(!series.is_empty());
        let path = price_chart_path(ticker, period);
        self.rendered.lock().unwrap().push(path.clone());
        Ok(path)
    }

    fn financial_chart(
        &self,
        ticker: &str,
        trend: &FinancialTrend,
        currency: Option<&str>,
    ) -> Result<String> {
        assert!(!trend.is_empty());
        self.currencies.lock().unwrap().push(currency.map(str::to_string));
        self.trends.lock().unwrap().push(trend.clone());
        let path = financial_chart_path(ticker);
        self.rendered.lock().unwrap().push(path.clone());
        Ok(path)
    }
}

pub fn news_settings() -> NewsConfig {
    NewsConfig::default()
}
