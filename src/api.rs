// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::models::{
    CompanyInfo, PricePoint, PriceSeries, RawNewsItem, StatementTable,
};
use crate::providers::MarketData;

const FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

// Statement fields mapped to line-item names
const INCOME_STATEMENT_ITEMS: &[(&str, &str)] = &[
    ("revenue", "Total Revenue"),
    ("operatingIncome", "Operating Income"),
    ("netIncome", "Net Income"),
    ("ebitda", "EBITDA"),
];

// Only fills a net income the income statement lacks
const CASH_FLOW_ITEMS: &[(&str, &str)] = &[("netIncome", "Net Income")];

const STATEMENT_PERIODS: usize = 4;
const NEWS_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FMPCompanyProfile {
    symbol: String,
    company_name: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
    price: Option<f64>,
    mkt_cap: Option<f64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FMPRatios {
    price_earnings_ratio: Option<f64>,
    dividend_yield: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FMPHistoricalResponse {
    #[serde(default)]
    historical: Vec<FMPHistoricalPrice>,
}

#[derive(Debug, Deserialize)]
struct FMPHistoricalPrice {
    date: String,
    close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FMPStockNews {
    title: Option<String>,
    url: Option<String>,
    site: Option<String>,
}

/// Financial Modeling Prep client
pub struct FMPClient {
    client: Client,
    api_key: String,
    request_delay: Duration,
}

impl FMPClient {
    pub fn new(api_key: String, timeout: Duration, request_delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            request_delay,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        // Stay within the per-minute request limit
        sleep(self.request_delay).await;

        let url = format!("{}/{}", FMP_BASE_URL, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", path))?;

        let status = response.status();
        let text = response.text().await.context("Failed to get response text")?;

        if !status.is_success() {
            anyhow::bail!("API request to {} failed: {} - {}", path, status, text);
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse FMP response for {}", path))
    }

    /// Most recent annual ratios, if FMP has any for the ticker
    async fn get_ratios(&self, ticker: &str) -> Result<Option<FMPRatios>> {
        let ratios: Vec<FMPRatios> = self
            .get_json(&format!("ratios/{}", ticker), &[("limit", "1".to_string())])
            .await?;

        // Most recent first
        Ok(ratios.into_iter().next())
    }

    async fn get_statement(
        &self,
        endpoint: &str,
        ticker: &str,
        items: &[(&str, &str)],
    ) -> Result<StatementTable> {
        if ticker.is_empty() {
            anyhow::bail!("ticker empty");
        }

        let periods: Vec<Map<String, Value>> = self
            .get_json(
                &format!("{}/{}", endpoint, ticker),
                &[("period", "annual".to_string()), ("limit", STATEMENT_PERIODS.to_string())],
            )
            .await?;

        Ok(statement_from_periods(&periods, items))
    }
}

/// Build a statement table from FMP's one-object-per-period layout
fn statement_from_periods(periods: &[Map<String, Value>], items: &[(&str, &str)]) -> StatementTable {
    let mut table = StatementTable::new();

    for period in periods {
        let Some(date) = period
            .get("date")
            .and_then(Value::as_str)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };

        for (field, line_item) in items {
            if let Some(value) = period.get(*field) {
                table.insert(line_item, date, value.as_f64());
            }
        }
    }

    table
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[async_trait]
impl MarketData for FMPClient {
    async fn get_info(&self, ticker: &str) -> Result<CompanyInfo> {
        if ticker.is_empty() {
            anyhow::bail!("ticker empty");
        }

        let profiles: Vec<FMPCompanyProfile> = self.get_json(&format!("profile/{}", ticker), &[]).await?;
        let profile = profiles
            .into_iter()
            .next()
            .with_context(|| format!("No profile found for ticker {}", ticker))?;

        // Ratios are optional extras; the profile alone is enough for a report
        let ratios = self.get_ratios(ticker).await.unwrap_or_else(|e| {
            warn!("No ratios for {}: {:#}", ticker, e);
            None
        });
        let finite = |v: Option<f64>| v.filter(|v| v.is_finite());

        Ok(CompanyInfo {
            name: non_empty(profile.company_name).unwrap_or(profile.symbol),
            sector: non_empty(profile.sector),
            industry: non_empty(profile.industry),
            current_price: profile.price.filter(|p| p.is_finite() && *p > 0.0),
            market_cap: profile.mkt_cap.filter(|m| m.is_finite() && *m > 0.0),
            currency: non_empty(profile.currency),
            pe_ratio: finite(ratios.as_ref().and_then(|r| r.price_earnings_ratio)),
            dividend_yield: finite(ratios.as_ref().and_then(|r| r.dividend_yield)),
        })
    }

    async fn get_history(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Result<PriceSeries> {
        if ticker.is_empty() {
            anyhow::bail!("ticker empty");
        }

        // Unknown or delisted symbols come back as `{}`
        let response: FMPHistoricalResponse = self
            .get_json(
                &format!("historical-price-full/{}", ticker),
                &[
                    ("from", from.format("%Y-%m-%d").to_string()),
                    ("to", to.format("%Y-%m-%d").to_string()),
                    ("serietype", "line".to_string()),
                ],
            )
            .await?;

        let points = response
            .historical
            .into_iter()
            .filter_map(|p| {
                let date = NaiveDate::parse_from_str(&p.date, "%Y-%m-%d").ok()?;
                Some(PricePoint { date, close: p.close? })
            })
            .collect();

        Ok(PriceSeries::new(points))
    }

    async fn get_financials(&self, ticker: &str) -> Result<StatementTable> {
        self.get_statement("income-statement", ticker, INCOME_STATEMENT_ITEMS)
            .await
    }

    async fn get_cashflow(&self, ticker: &str) -> Result<StatementTable> {
        self.get_statement("cash-flow-statement", ticker, CASH_FLOW_ITEMS)
            .await
    }

    async fn get_news(&self, ticker: &str) -> Result<Vec<RawNewsItem>> {
        if ticker.is_empty() {
            anyhow::bail!("ticker empty");
        }

        let news: Vec<FMPStockNews> = self
            .get_json(
                "stock_news",
                &[("tickers", ticker.to_string()), ("limit", NEWS_LIMIT.to_string())],
            )
            .await?;

        Ok(news
            .into_iter()
            .map(|n| RawNewsItem {
                title: n.title,
                link: n.url,
                publisher: n.site,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserialization() {
        let json = r#"[{
            "symbol": "AAPL",
            "price": 187.2,
            "mktCap": 2900000000000,
            "currency": "USD",
            "companyName": "Apple Inc.",
            "sector": "Technology",
            "industry": "Consumer Electronics",
            "isActive": true
        }]"#;

        let profiles: Vec<FMPCompanyProfile> = serde_json::from_str(json).unwrap();
        assert_eq!(profiles[0].company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(profiles[0].mkt_cap, Some(2.9e12));
        assert_eq!(profiles[0].industry.as_deref(), Some("Consumer Electronics"));
    }

    #[test]
    fn test_historical_empty_object() {
        let response: FMPHistoricalResponse = serde_json::from_str("{}").unwrap();
        assert!(response.historical.is_empty());
    }

    #[test]
    fn test_historical_deserialization() {
        let json = r#"{"symbol": "AAPL", "historical": [
            {"date": "2025-01-03", "close": 243.36},
            {"date": "2025-01-02", "close": 243.85}
        ]}"#;
        let response: FMPHistoricalResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.historical.len(), 2);
        assert_eq!(response.historical[1].close, Some(243.85));
    }

    #[test]
    fn test_statement_from_periods() {
        let json = r#"[
            {"date": "2024-09-28", "revenue": 391035000000, "operatingIncome": 123216000000, "netIncome": 93736000000, "ebitda": null},
            {"date": "2023-09-30", "revenue": 383285000000, "operatingIncome": 114301000000, "netIncome": 96995000000, "ebitda": 125820000000},
            {"revenue": 1}
        ]"#;
        let periods: Vec<Map<String, Value>> = serde_json::from_str(json).unwrap();
        let table = statement_from_periods(&periods, INCOME_STATEMENT_ITEMS);

        assert_eq!(table.latest_value("Operating Income"), Some(123216000000.0));
        assert_eq!(table.latest_value("Net Income"), Some(93736000000.0));
        // Latest EBITDA is null, so the previous year is used
        assert_eq!(table.latest_value("EBITDA"), Some(125820000000.0));
    }

    #[test]
    fn test_stock_news_deserialization() {
        let json = r#"[{"symbol": "AAPL", "publishedDate": "2025-01-03 10:00:00",
            "title": "Apple ships", "image": null, "site": "Reuters", "text": "...",
            "url": "https://reuters.example/apple"}]"#;
        let news: Vec<FMPStockNews> = serde_json::from_str(json).unwrap();
        assert_eq!(news[0].site.as_deref(), Some("Reuters"));
    }

    #[test]
    fn test_ratios_deserialization() {
        let json = r#"[{"symbol": "MC.PA", "date": "2024-12-31", "period": "FY",
            "priceEarningsRatio": 24.87, "dividendYield": 0.0208, "currentRatio": 1.45},
            {"symbol": "MC.PA", "date": "2023-12-31", "priceEarningsRatio": null}]"#;
        let ratios: Vec<FMPRatios> = serde_json::from_str(json).unwrap();
        assert_eq!(ratios[0].price_earnings_ratio, Some(24.87));
        assert_eq!(ratios[0].dividend_yield, Some(0.0208));
        assert_eq!(ratios[1].dividend_yield, None);
    }

    #[test]
    fn test_cash_flow_statement_keeps_net_income() {
        let json = r#"[{"date": "2024-12-31", "netIncome": 5.0, "operatingCashFlow": 9.0, "freeCashFlow": 7.0}]"#;
        let periods: Vec<Map<String, Value>> = serde_json::from_str(json).unwrap();
        let table = statement_from_periods(&periods, CASH_FLOW_ITEMS);

        assert_eq!(table.latest_value("Net Income"), Some(5.0));
        assert!(table.row("Free Cash Flow").is_none());
    }
}
