// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use askama::Template;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{CompanyReport, HistoryPeriod, NewsArticle, ReportSet, SummaryRow};
use crate::utils::{
    file_stem, format_money_opt, format_percent, format_price, format_ratio, format_yield,
    text_or_na,
};

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";
const REPORT_TITLE: &str = "Stock Semaphore Report";

pub const STYLESHEET: &str = r#"body {
  font-family: -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
  margin: 0;
  padding: 0 2rem 3rem;
  color: #1f2937;
  background: #f9fafb;
}
header { padding: 1.5rem 0 0.5rem; }
h1 { margin: 0; }
.generated { color: #64748b; font-size: 0.9rem; }
table { border-collapse: collapse; width: 100%; background: #fff; }
th, td { padding: 0.5rem 0.75rem; border-bottom: 1px solid #e5e7eb; text-align: left; }
th { background: #f3f4f6; }
td.num { text-align: right; font-variant-numeric: tabular-nums; }
.up { color: #10b981; }
.down { color: #f43f5e; }
.na { color: #94a3b8; }
.semaphore {
  display: inline-block;
  width: 1rem;
  height: 1rem;
  border-radius: 50%;
  vertical-align: middle;
  border: 1px solid rgba(0, 0, 0, 0.15);
}
.semaphore-green { background: #10b981; }
.semaphore-yellow { background: #f59e0b; }
.semaphore-red { background: #f43f5e; }
.semaphore-gray { background: #9ca3af; }
.company {
  margin-top: 2rem;
  padding: 1.5rem;
  background: #fff;
  border: 1px solid #e5e7eb;
  border-radius: 8px;
}
.company h2 { margin-top: 0; }
.facts { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 0.5rem 1.5rem; }
.facts dt { color: #64748b; font-size: 0.85rem; }
.facts dd { margin: 0; font-weight: 600; }
.charts { display: grid; grid-template-columns: repeat(auto-fill, minmax(420px, 1fr)); gap: 1rem; }
.charts img { width: 100%; height: auto; border: 1px solid #e5e7eb; }
.summary-text { line-height: 1.5; }
.articles li { margin-bottom: 0.25rem; }
.publisher { color: #64748b; }
"#;

struct ChangeView {
    label: &'static str,
    value: String,
    class: &'static str,
}

struct FigureView {
    label: &'static str,
    value: String,
}

struct ChartView {
    title: String,
    src: String,
}

struct SummaryView {
    anchor: String,
    ticker: String,
    name: String,
    price: String,
    changes: Vec<ChangeView>,
    semaphore: &'static str,
}

struct CompanyView {
    anchor: String,
    ticker: String,
    name: String,
    sector: String,
    industry: String,
    price: String,
    market_cap: String,
    pe_ratio: String,
    dividend_yield: String,
    changes: Vec<ChangeView>,
    figures: Vec<FigureView>,
    semaphore: &'static str,
    summary: String,
    articles: Vec<NewsArticle>,
    charts: Vec<ChartView>,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    title: &'a str,
    generated_at: String,
    summary: Vec<SummaryView>,
    companies: Vec<CompanyView>,
}

fn change_class(value: Option<f64>) -> &'static str {
    match value {
        Some(v) if v > 0.0 => "up",
        Some(v) if v < 0.0 => "down",
        Some(_) => "",
        None => "na",
    }
}

fn change_views(changes: &crate::models::PriceChanges) -> Vec<ChangeView> {
    HistoryPeriod::ALL
        .iter()
        .map(|period| {
            let value = changes.get(*period);
            ChangeView {
                label: period.label(),
                value: format_percent(value),
                class: change_class(value),
            }
        })
        .collect()
}

impl SummaryView {
    fn from_row(row: &SummaryRow) -> Self {
        Self {
            anchor: file_stem(&row.ticker),
            ticker: row.ticker.clone(),
            name: row.name.clone(),
            price: format_price(row.current_price, row.currency.as_deref()),
            changes: change_views(&row.changes),
            semaphore: row.semaphore.as_str(),
        }
    }
}

impl CompanyView {
    fn from_report(report: &CompanyReport) -> Self {
        let financials = &report.financials;
        let currency = report.currency.as_deref();
        let figures = vec![
            FigureView {
                label: "Operating Income",
                value: format_money_opt(financials.operating_income, currency),
            },
            FigureView {
                label: "Net Income",
                value: format_money_opt(financials.net_income, currency),
            },
            FigureView {
                label: "EBITDA",
                value: format_money_opt(financials.ebitda, currency),
            },
            FigureView {
                label: "Revenue",
                value: format_money_opt(financials.revenue, currency),
            },
        ];

        let mut charts: Vec<ChartView> = HistoryPeriod::ALL
            .iter()
            .filter_map(|period| {
                report.charts.price(*period).map(|src| ChartView {
                    title: format!("Price, {}", period.label()),
                    src: src.to_string(),
                })
            })
            .collect();
        if let Some(src) = &report.charts.financial {
            charts.push(ChartView {
                title: "Revenue and Operating Income".to_string(),
                src: src.clone(),
            });
        }

        Self {
            anchor: file_stem(&report.ticker),
            ticker: report.ticker.clone(),
            name: report.name.clone(),
            sector: text_or_na(report.sector.as_deref()),
            industry: text_or_na(report.industry.as_deref()),
            price: format_price(report.current_price, currency),
            market_cap: format_money_opt(report.market_cap, currency),
            pe_ratio: format_ratio(report.pe_ratio),
            dividend_yield: format_yield(report.dividend_yield),
            changes: change_views(&report.changes),
            figures,
            semaphore: report.semaphore.as_str(),
            summary: report.news_summary.clone(),
            articles: report.articles.clone(),
            charts,
        }
    }
}

/// Render the report page to a string
pub fn render_html(report: &ReportSet) -> Result<String> {
    let template = ReportTemplate {
        title: REPORT_TITLE,
        generated_at: report.generated_at().format(TIMESTAMP_FORMAT).to_string(),
        summary: report.summary().iter().map(SummaryView::from_row).collect(),
        companies: report
            .companies()
            .iter()
            .map(CompanyView::from_report)
            .collect(),
    };

    template.render().context("Failed to render report template")
}

/// Write the summary projection as CSV, one row per company
pub fn write_summary_csv(report: &ReportSet, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {:?}", path))?;

    writer.write_record([
        "Ticker",
        "Name",
        "Current Price",
        "Change 6M",
        "Change 1Y",
        "Change 5Y",
        "Semaphore",
    ])?;

    for row in report.summary() {
        writer.write_record([
            row.ticker.clone(),
            row.name.clone(),
            format_price(row.current_price, row.currency.as_deref()),
            format_percent(row.changes.change_6m),
            format_percent(row.changes.change_1y),
            format_percent(row.changes.change_5y),
            row.semaphore.as_str().to_string(),
        ])?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

/// Write `index.html`, `css/style.css` and `summary.csv` under `output_dir`.
///
/// Chart images are expected to be in `output_dir/img` already.
pub fn write_site(report: &ReportSet, output_dir: &Path) -> Result<PathBuf> {
    let css_dir = output_dir.join("css");
    fs::create_dir_all(&css_dir)
        .with_context(|| format!("Failed to create directory {:?}", css_dir))?;
    let img_dir = output_dir.join("img");
    fs::create_dir_all(&img_dir)
        .with_context(|| format!("Failed to create directory {:?}", img_dir))?;

    let css_path = css_dir.join("style.css");
    fs::write(&css_path, STYLESHEET)
        .with_context(|| format!("Failed to write stylesheet {:?}", css_path))?;

    let html = render_html(report)?;
    let index_path = output_dir.join("index.html");
    fs::write(&index_path, html)
        .with_context(|| format!("Failed to write report {:?}", index_path))?;

    write_summary_csv(report, &output_dir.join("summary.csv"))?;

    info!("Wrote report for {} companies to {:?}", report.len(), index_path);
    Ok(index_path)
}
