// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::NewsConfig;
use crate::models::NewsArticle;
use crate::providers::{MarketData, NewsQuery, NewsSearch, Summarizer};
use crate::utils::{format_money, format_percent, format_price, truncate_string};

/// Summary text when no usable article was found
pub const NEWS_UNAVAILABLE: &str = "No recent news is available for this company.";
/// Summary text when articles exist but no summary could be generated
pub const SUMMARY_UNAVAILABLE: &str =
    "A news summary could not be generated at this time. See the articles below.";

// NewsAPI refuses larger pages
const MAX_PAGE_SIZE: usize = 100;
const MAX_PROMPT_TITLE_CHARS: usize = 200;

/// Figures the summary may mention
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialContext {
    /// ISO code the price and statement figures are in
    pub currency: Option<String>,
    pub current_price: Option<f64>,
    pub change_1y: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsDigest {
    pub summary: String,
    pub articles: Vec<NewsArticle>,
}

/// Where the articles of a digest came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NewsSource {
    Primary,
    MarketFeed,
}

/// News search with fallback to the market-data feed, then AI summarization
pub struct NewsAggregator {
    primary: Option<Arc<dyn NewsSearch>>,
    market: Arc<dyn MarketData>,
    summarizer: Option<Arc<dyn Summarizer>>,
    settings: NewsConfig,
}

impl NewsAggregator {
    pub fn new(
        primary: Option<Arc<dyn NewsSearch>>,
        market: Arc<dyn MarketData>,
        summarizer: Option<Arc<dyn Summarizer>>,
        settings: NewsConfig,
    ) -> Self {
        Self {
            primary,
            market,
            summarizer,
            settings,
        }
    }

    pub fn settings(&self) -> &NewsConfig {
        &self.settings
    }

    /// Collect up to `max_articles` articles and summarize them.
    ///
    /// Never fails: provider errors degrade to the next source or to sentinel text.
    pub async fn summarize(
        &self,
        company_name: &str,
        ticker: &str,
        max_articles: usize,
        context: &FinancialContext,
    ) -> NewsDigest {
        let Some((source, articles)) = self.collect_articles(company_name, ticker, max_articles).await
        else {
            info!("No usable news for {}", ticker);
            return NewsDigest {
                summary: NEWS_UNAVAILABLE.to_string(),
                articles: Vec::new(),
            };
        };
        debug!("{} articles for {} from {:?}", articles.len(), ticker, source);

        let Some(summarizer) = &self.summarizer else {
            return NewsDigest {
                summary: SUMMARY_UNAVAILABLE.to_string(),
                articles,
            };
        };

        let prompt = build_prompt(
            company_name,
            ticker,
            &articles,
            context,
            self.settings.min_sentences,
            self.settings.max_sentences,
        );

        let summary = match summarizer.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Summarizer returned an empty response for {}", ticker);
                SUMMARY_UNAVAILABLE.to_string()
            }
            Err(e) => {
                warn!("Summarizer failed for {}: {:#}", ticker, e);
                SUMMARY_UNAVAILABLE.to_string()
            }
        };

        NewsDigest { summary, articles }
    }

    async fn collect_articles(
        &self,
        company_name: &str,
        ticker: &str,
        max_articles: usize,
    ) -> Option<(NewsSource, Vec<NewsArticle>)> {
        if max_articles == 0 {
            return None;
        }

        if let Some(primary) = &self.primary {
            let query = NewsQuery {
                query: search_phrase(company_name, ticker),
                language: self.settings.language.clone(),
                sort_by: self.settings.sort_by.clone(),
                page_size: (max_articles * self.settings.over_fetch_factor).clamp(1, MAX_PAGE_SIZE),
            };

            match primary.search(&query).await {
                Ok(raw) => {
                    let articles = keep_usable(raw.iter().map(|a| a.to_article()), max_articles);
                    if !articles.is_empty() {
                        return Some((NewsSource::Primary, articles));
                    }
                    info!(
                        "Primary news search had no usable articles for {} ({} raw), trying market feed",
                        ticker,
                        raw.len()
                    );
                }
                Err(e) => {
                    warn!("Primary news search failed for {}: {:#}", ticker, e);
                }
            }
        }

        match self.market.get_news(ticker).await {
            Ok(raw) => {
                let articles = keep_usable(raw.iter().map(|item| item.to_article()), max_articles);
                if !articles.is_empty() {
                    return Some((NewsSource::MarketFeed, articles));
                }
                info!("Market news feed had no usable articles for {}", ticker);
            }
            Err(e) => {
                warn!("Market news feed failed for {}: {:#}", ticker, e);
            }
        }

        None
    }
}

/// Query matching either the company name or "<ticker> stock"
pub fn search_phrase(company_name: &str, ticker: &str) -> String {
    let name = company_name.trim();
    if name.is_empty() || name.eq_ignore_ascii_case(ticker) {
        format!("\"{} stock\"", ticker)
    } else {
        format!("\"{}\" OR \"{} stock\"", name, ticker)
    }
}

fn keep_usable<I>(candidates: I, max_articles: usize) -> Vec<NewsArticle>
where
    I: Iterator<Item = Option<NewsArticle>>,
{
    let mut articles: Vec<NewsArticle> = Vec::with_capacity(max_articles);
    for article in candidates.flatten() {
        if articles.iter().any(|a| a.url == article.url) {
            continue;
        }
        articles.push(article);
        if articles.len() == max_articles {
            break;
        }
    }
    articles
}

/// Prompt asking for a short, objective summary of the articles.
///
/// Financial figures that are missing are left out entirely.
pub fn build_prompt(
    company_name: &str,
    ticker: &str,
    articles: &[NewsArticle],
    context: &FinancialContext,
    min_sentences: u32,
    max_sentences: u32,
) -> String {
    let mut lines = vec![
        format!(
            "Write a short, objective summary of recent news about {} ({}) in {} to {} sentences.",
            company_name, ticker, min_sentences, max_sentences
        ),
        "Use only the information given below. Do not give investment advice and do not invent facts."
            .to_string(),
        String::new(),
        "Recent articles:".to_string(),
    ];
    lines.extend(articles.iter().enumerate().map(|(i, article)| {
        format!(
            "{}. {} ({}) - {}",
            i + 1,
            truncate_string(&article.title, MAX_PROMPT_TITLE_CHARS),
            article.publisher,
            article.url
        )
    }));

    let facts = financial_sentences(context);
    if !facts.is_empty() {
        lines.push(String::new());
        lines.push("Financial context:".to_string());
        lines.extend(facts);
    }

    let mut prompt = lines.join("\n");
    prompt.push('\n');
    prompt
}

fn financial_sentences(context: &FinancialContext) -> Vec<String> {
    let currency = context.currency.as_deref();
    let mut sentences = Vec::new();

    if context.current_price.is_some() {
        sentences.push(format!(
            "The current share price is {}.",
            format_price(context.current_price, currency)
        ));
    }
    if context.change_1y.is_some() {
        sentences.push(format!(
            "The share price changed {} over the last year.",
            format_percent(context.change_1y)
        ));
    }
    if let Some(value) = context.operating_income {
        sentences.push(format!(
            "The latest reported operating income is {}.",
            format_money(value, currency)
        ));
    }
    if let Some(value) = context.net_income {
        sentences.push(format!(
            "The latest reported net income is {}.",
            format_money(value, currency)
        ));
    }

    sentences
}
