// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::AnalysisConfig;
use crate::financials;
use crate::models::{
    ChartLinks, CompanyReport, FinancialTrend, HistoryPeriod, PriceSeries, ReportSet,
    StatementTable,
};
use crate::news::{FinancialContext, NewsAggregator};
use crate::prices::{compute_changes, history_start, reference_date};
use crate::providers::{ChartRenderer, MarketData};
use crate::semaphore::classify;

/// Runs the per-ticker pipeline and isolates failures to the ticker that caused them
pub struct ReportAssembler {
    market: Arc<dyn MarketData>,
    news: NewsAggregator,
    charts: Option<Arc<dyn ChartRenderer>>,
    settings: AnalysisConfig,
}

fn progress_bar(len: usize) -> ProgressBar {
    let progress = ProgressBar::new(len as u64);
    match ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
    {
        Ok(style) => progress.set_style(style.progress_chars("=>-")),
        Err(e) => debug!("Falling back to the default progress style: {}", e),
    }
    progress
}

impl ReportAssembler {
    pub fn new(
        market: Arc<dyn MarketData>,
        news: NewsAggregator,
        charts: Option<Arc<dyn ChartRenderer>>,
        settings: AnalysisConfig,
    ) -> Self {
        Self {
            market,
            news,
            charts,
            settings,
        }
    }

    /// Assemble every ticker and stamp the set with the local time
    pub async fn build_report_set(&self, tickers: &[String]) -> ReportSet {
        let now = Local::now().naive_local();
        let companies = self.assemble(tickers, now.date()).await;
        ReportSet::new(companies, now)
    }

    /// One report per ticker, in input order; failed tickers get a degraded record.
    pub async fn assemble(&self, tickers: &[String], today: NaiveDate) -> Vec<CompanyReport> {
        info!(
            "Assembling reports for {} tickers (concurrency {})",
            tickers.len(),
            self.settings.concurrency
        );
        let progress = progress_bar(tickers.len());

        let reports: Vec<CompanyReport> = stream::iter(tickers.iter().map(|ticker| {
            let progress = progress.clone();
            async move {
                let report = self.assemble_one(ticker, today).await;
                progress.set_message(ticker.clone());
                progress.inc(1);
                report
            }
        }))
        .buffered(self.settings.concurrency.max(1))
        .collect()
        .await;

        progress.finish_with_message("Reports assembled");
        reports
    }

    pub async fn assemble_one(&self, ticker: &str, today: NaiveDate) -> CompanyReport {
        match self.try_assemble(ticker, today).await {
            Ok(report) => report,
            Err(e) => {
                error!("Failed to build report for {}: {:#}", ticker, e);
                CompanyReport::degraded(ticker)
            }
        }
    }

    async fn try_assemble(&self, ticker: &str, today: NaiveDate) -> Result<CompanyReport> {
        let window_days = self.settings.window_days;

        let info = self
            .market
            .get_info(ticker)
            .await
            .with_context(|| format!("Failed to fetch company info for {}", ticker))?;

        let history = self
            .market
            .get_history(ticker, history_start(today, window_days), today)
            .await
            .with_context(|| format!("Failed to fetch price history for {}", ticker))?;
        debug!("{} price points for {}", history.len(), ticker);

        let current_price = info
            .current_price
            .or_else(|| history.latest().map(|p| p.close));
        let changes = compute_changes(&history, current_price, today, window_days);

        let income = self.statement_or_empty(
            ticker,
            "income statement",
            self.market.get_financials(ticker).await,
        );
        let cashflow = self.statement_or_empty(
            ticker,
            "cash-flow statement",
            self.market.get_cashflow(ticker).await,
        );
        let snapshot = financials::extract(&income).or(financials::extract(&cashflow));
        let trend = financials::trend(&income);

        let context = FinancialContext {
            currency: info.currency.clone(),
            current_price,
            change_1y: changes.change_1y,
            operating_income: snapshot.operating_income,
            net_income: snapshot.net_income,
        };
        let digest = self
            .news
            .summarize(&info.name, ticker, self.news.settings().max_articles, &context)
            .await;

        let semaphore = classify(changes.change_1y, &self.settings.thresholds());
        let charts = self.render_charts(ticker, today, &history, &trend, info.currency.as_deref());

        Ok(CompanyReport {
            ticker: ticker.to_string(),
            name: info.name,
            sector: info.sector,
            industry: info.industry,
            current_price,
            currency: info.currency,
            market_cap: info.market_cap,
            pe_ratio: info.pe_ratio,
            dividend_yield: info.dividend_yield,
            changes,
            financials: snapshot,
            trend,
            semaphore,
            news_summary: digest.summary,
            articles: digest.articles,
            charts,
        })
    }

    fn statement_or_empty(
        &self,
        ticker: &str,
        statement: &str,
        result: Result<StatementTable>,
    ) -> StatementTable {
        result.unwrap_or_else(|e| {
            warn!("No {} for {}: {:#}", statement, ticker, e);
            StatementTable::new()
        })
    }

    fn render_charts(
        &self,
        ticker: &str,
        today: NaiveDate,
        history: &PriceSeries,
        trend: &FinancialTrend,
        currency: Option<&str>,
    ) -> ChartLinks {
        let mut links = ChartLinks::default();
        let Some(charts) = &self.charts else {
            return links;
        };

        for period in HistoryPeriod::ALL {
            let series = history.since(reference_date(today, period));
            if series.is_empty() {
                debug!("No prices for the {} chart of {}", period.slug(), ticker);
                continue;
            }
            match charts.price_chart(ticker, period, &series, currency) {
                Ok(path) => links.set_price(period, Some(path)),
                Err(e) => warn!("Failed to render {} chart for {}: {:#}", period.slug(), ticker, e),
            }
        }

        if !trend.is_empty() {
            match charts.financial_chart(ticker, trend, currency) {
                Ok(path) => links.financial = Some(path),
                Err(e) => warn!("Failed to render financial chart for {}: {:#}", ticker, e),
            }
        }

        links
    }
}
