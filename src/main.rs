// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use stock_semaphore::api::FMPClient;
use stock_semaphore::charts::PngCharts;
use stock_semaphore::config::{self, Config, Secrets};
use stock_semaphore::error::ConfigError;
use stock_semaphore::llm::OpenAiSummarizer;
use stock_semaphore::models::SemaphoreColor;
use stock_semaphore::news::NewsAggregator;
use stock_semaphore::newsapi::NewsApiClient;
use stock_semaphore::providers::{ChartRenderer, MarketData, NewsSearch, Summarizer};
use stock_semaphore::render::write_site;
use stock_semaphore::report::ReportAssembler;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the report for every ticker in the ticker list (default)
    Run,
}

/// Everything needed before the first ticker is processed
fn load_setup() -> Result<(Config, Vec<String>, Secrets), ConfigError> {
    let config_path = config::config_path();
    let config = config::load_config(&config_path)?;
    let tickers = config::load_tickers(&config.tickers_file)?;
    let secrets = Secrets::from_env()?;
    Ok((config, tickers, secrets))
}

async fn run(config: Config, tickers: Vec<String>, secrets: Secrets) -> Result<()> {
    let timeout = Duration::from_secs(config.http.timeout_secs);

    let market: Arc<dyn MarketData> = Arc::new(FMPClient::new(
        secrets.fmp_api_key.clone(),
        timeout,
        Duration::from_millis(config.http.request_delay_ms),
    )?);

    let primary: Option<Arc<dyn NewsSearch>> = match &secrets.news_api_key {
        Some(key) => {
            let client: Arc<dyn NewsSearch> = Arc::new(NewsApiClient::new(key.clone(), timeout)?);
            Some(client)
        }
        None => {
            info!("NEWS_API_KEY not set, news will come from the market data feed only");
            None
        }
    };

    let summarizer: Option<Arc<dyn Summarizer>> = match &secrets.openai_api_key {
        Some(key) => {
            let client: Arc<dyn Summarizer> = Arc::new(OpenAiSummarizer::new(
                key.clone(),
                secrets.openai_base_url.clone(),
                &config.summarizer,
                timeout,
            )?);
            Some(client)
        }
        None => {
            info!("OPENAI_API_KEY not set, news summaries are disabled");
            None
        }
    };

    let charts: Arc<dyn ChartRenderer> = Arc::new(PngCharts::new(&config.output_dir));
    let news = NewsAggregator::new(primary, market.clone(), summarizer, config.news.clone());
    let assembler = ReportAssembler::new(market, news, Some(charts), config.analysis.clone());

    println!("📈 Building reports for {} tickers...", tickers.len());
    let report = assembler.build_report_set(&tickers).await;

    let index = write_site(&report, &config.output_dir)?;

    let degraded = report
        .companies()
        .iter()
        .filter(|c| c.semaphore == SemaphoreColor::Gray)
        .count();
    println!("✅ Report written to {}", index.display());
    println!(
        "   {} companies, {} without a classification",
        report.len(),
        degraded
    );

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run) | None => {
            let (config, tickers, secrets) = match load_setup() {
                Ok(setup) => setup,
                Err(e) => {
                    error!("{}", e);
                    eprintln!("❌ {}", e);
                    return ExitCode::FAILURE;
                }
            };
            info!("Loaded {} tickers from {:?}", tickers.len(), config.tickers_file);

            if let Err(e) = run(config, tickers, secrets).await {
                error!("Run failed: {:#}", e);
                eprintln!("❌ {:#}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
