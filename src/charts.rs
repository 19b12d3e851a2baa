// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::fs;
use std::path::PathBuf;

use crate::models::{FinancialTrend, HistoryPeriod, PriceSeries, TrendPoint};
use crate::providers::ChartRenderer;
use crate::utils::{file_stem, format_money, format_price};

const COLOR_EMERALD: RGBColor = RGBColor(16, 185, 129);
const COLOR_ROSE: RGBColor = RGBColor(244, 63, 94);
const COLOR_SLATE: RGBColor = RGBColor(100, 116, 139);

const IMAGE_DIR: &str = "img";
const PRICE_CHART_SIZE: (u32, u32) = (900, 420);
const FINANCIAL_CHART_SIZE: (u32, u32) = (900, 420);

/// Relative link of a price chart, e.g. `img/AAPL_1y.png`
pub fn price_chart_path(ticker: &str, period: HistoryPeriod) -> String {
    format!("{}/{}_{}.png", IMAGE_DIR, file_stem(ticker), period.slug())
}

/// Relative link of the revenue and operating income chart
pub fn financial_chart_path(ticker: &str) -> String {
    format!("{}/{}_financial.png", IMAGE_DIR, file_stem(ticker))
}

/// Y range covering `values` and zero, padded by 10%
fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return None;
    }

    let (lo, hi) = (min.min(0.0), max.max(0.0));
    let pad = ((hi - lo) * 0.1).max(1.0);
    Some((if lo < 0.0 { lo - pad } else { 0.0 }, hi + pad))
}

/// Closing-price range with a little headroom; not anchored at zero
fn price_range(series: &PriceSeries) -> Option<(f64, f64)> {
    let (min, max) = series
        .points()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.close), hi.max(p.close))
        });
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    let pad = ((max - min) * 0.05).max(max.abs() * 0.01).max(0.01);
    Some((min - pad, max + pad))
}

/// `(period index, value)` pairs of one trend line, skipping periods without a value
fn trend_line(trend: &FinancialTrend, value: fn(&TrendPoint) -> Option<f64>) -> Vec<(f64, f64)> {
    trend
        .points()
        .iter()
        .enumerate()
        .filter_map(|(i, p)| value(p).map(|v| (i as f64, v)))
        .collect()
}

/// PNG charts written under `<output_dir>/img`
pub struct PngCharts {
    output_dir: PathBuf,
}

impl PngCharts {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn target(&self, relative: &str) -> Result<PathBuf> {
        let dir = self.output_dir.join(IMAGE_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create chart directory {:?}", dir))?;
        Ok(self.output_dir.join(relative))
    }
}

impl ChartRenderer for PngCharts {
    fn price_chart(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        series: &PriceSeries,
        currency: Option<&str>,
    ) -> Result<String> {
        let (y_min, y_max) = price_range(series)
            .with_context(|| format!("No prices to chart for {} ({})", ticker, period.slug()))?;
        let relative = price_chart_path(ticker, period);
        let path = self.target(&relative)?;
        let points = series.points();

        let root = BitMapBackend::new(&path, PRICE_CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let first = points.first().map(|p| p.close).unwrap_or_default();
        let last = points.last().map(|p| p.close).unwrap_or_default();
        let line_color = if last >= first { COLOR_EMERALD } else { COLOR_ROSE };

        let x_max = points.len().saturating_sub(1).max(1) as f64;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} - {}", ticker, period.label()),
                ("sans-serif", 24).into_font().color(&BLACK),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_labels(6)
            .x_label_formatter(&|x| {
                points
                    .get(x.round().max(0.0) as usize)
                    .map(|p| p.date.format("%b %Y").to_string())
                    .unwrap_or_default()
            })
            .y_label_formatter(&|y| format_price(Some(*y), currency))
            .y_desc("Close")
            .axis_desc_style(("sans-serif", 14).into_font().color(&COLOR_SLATE))
            .draw()?;

        chart.draw_series(LineSeries::new(
            points.iter().enumerate().map(|(i, p)| (i as f64, p.close)),
            line_color.stroke_width(2),
        ))?;

        root.present()
            .with_context(|| format!("Failed to write chart {:?}", path))?;

        Ok(relative)
    }

    fn financial_chart(
        &self,
        ticker: &str,
        trend: &FinancialTrend,
        currency: Option<&str>,
    ) -> Result<String> {
        let revenue = trend_line(trend, |p| p.revenue);
        let operating_income = trend_line(trend, |p| p.operating_income);
        let (y_min, y_max) = value_range(revenue.iter().chain(&operating_income).map(|(_, v)| *v))
            .with_context(|| format!("No financial figures to chart for {}", ticker))?;
        let relative = financial_chart_path(ticker);
        let path = self.target(&relative)?;
        let periods = trend.points();

        let root = BitMapBackend::new(&path, FINANCIAL_CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} - Revenue and Operating Income", ticker),
                ("sans-serif", 24).into_font().color(&BLACK),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5f64..(periods.len() as f64 - 0.5), y_min..y_max)?;

        chart
            .configure_mesh()
            .x_labels(periods.len())
            .x_label_formatter(&|x| {
                periods
                    .get(x.round().max(0.0) as usize)
                    .map(|p| p.period.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .y_label_formatter(&|y| format_money(*y, currency))
            .x_desc("Period")
            .axis_desc_style(("sans-serif", 14).into_font().color(&COLOR_SLATE))
            .draw()?;

        chart
            .draw_series(LineSeries::new(revenue.iter().copied(), COLOR_EMERALD.stroke_width(2)))?
            .label("Total Revenue")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], COLOR_EMERALD.stroke_width(2)));
        chart.draw_series(
            revenue
                .iter()
                .map(|&point| Circle::new(point, 4, COLOR_EMERALD.filled())),
        )?;

        chart
            .draw_series(LineSeries::new(operating_income.iter().copied(), COLOR_ROSE.stroke_width(2)))?
            .label("Operating Income")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], COLOR_ROSE.stroke_width(2)));
        chart.draw_series(
            operating_income
                .iter()
                .map(|&point| Cross::new(point, 5, COLOR_ROSE.stroke_width(2))),
        )?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE)
            .border_style(&COLOR_SLATE)
            .draw()?;

        root.present()
            .with_context(|| format!("Failed to write chart {:?}", path))?;

        Ok(relative)
    }
}
