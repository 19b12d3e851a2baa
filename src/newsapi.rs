// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::RawArticle;
use crate::providers::{NewsQuery, NewsSearch};

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    source: Option<NewsApiSource>,
    title: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

/// NewsAPI `/v2/everything` client
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl NewsApiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            endpoint: NEWSAPI_URL.to_string(),
        })
    }
}

fn into_raw_articles(response: NewsApiResponse) -> Result<Vec<RawArticle>> {
    if response.status != "ok" {
        anyhow::bail!(
            "NewsAPI error ({}): {}",
            response.code.unwrap_or_else(|| "unknown".to_string()),
            response.message.unwrap_or_else(|| "Unknown message".to_string())
        );
    }

    Ok(response
        .articles
        .into_iter()
        .map(|a| RawArticle {
            title: a.title,
            url: a.url,
            source_name: a.source.and_then(|s| s.name),
        })
        .collect())
}

#[async_trait]
impl NewsSearch for NewsApiClient {
    async fn search(&self, query: &NewsQuery) -> Result<Vec<RawArticle>> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query.query.as_str()),
                ("language", query.language.as_str()),
                ("sortBy", query.sort_by.as_str()),
            ])
            .query(&[("pageSize", query.page_size)])
            .send()
            .await
            .context("Failed to send NewsAPI request")?;

        // Error bodies carry the same envelope, so parse before looking at the status
        let status = response.status();
        let text = response.text().await.context("Failed to get response text")?;
        let parsed: NewsApiResponse = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse NewsAPI response ({})", status))?;

        into_raw_articles(parsed)
    }
}
