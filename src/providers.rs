// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Interfaces of the external services the report is built from.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{
    CompanyInfo, FinancialTrend, HistoryPeriod, PriceSeries, RawArticle, RawNewsItem,
    StatementTable,
};

/// Quotes, price history, statements and the exchange news feed
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn get_info(&self, ticker: &str) -> Result<CompanyInfo>;

    /// Daily closes with `from <= date <= to`
    async fn get_history(&self, ticker: &str, from: NaiveDate, to: NaiveDate)
    -> Result<PriceSeries>;

    /// Income statement
    async fn get_financials(&self, ticker: &str) -> Result<StatementTable>;

    async fn get_cashflow(&self, ticker: &str) -> Result<StatementTable>;

    async fn get_news(&self, ticker: &str) -> Result<Vec<RawNewsItem>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsQuery {
    pub query: String,
    pub language: String,
    pub sort_by: String,
    pub page_size: usize,
}

/// Full-text news search
#[async_trait]
pub trait NewsSearch: Send + Sync {
    async fn search(&self, query: &NewsQuery) -> Result<Vec<RawArticle>>;
}

/// Text generation used for the news summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Writes chart images and returns their path relative to the report directory.
///
/// `currency` is the ISO code used for the value axis labels.
pub trait ChartRenderer: Send + Sync {
    fn price_chart(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        series: &PriceSeries,
        currency: Option<&str>,
    ) -> Result<String>;

    /// Revenue and operating income over the reporting periods
    fn financial_chart(
        &self,
        ticker: &str,
        trend: &FinancialTrend,
        currency: Option<&str>,
    ) -> Result<String>;
}
