use super::ui;
use crate::coordinator::FetchCoordinator;
use crate::core::{DataSource, TimeSeries};
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use comfy_table::Cell;

/// Headline numbers over the closes of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub latest: f64,
    pub oldest: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesSummary {
    /// Percentage change from the oldest to the latest close.
    pub fn change(&self) -> Option<f64> {
        (self.oldest > 0.0).then(|| (self.latest - self.oldest) / self.oldest * 100.0)
    }
}

/// Summarises the parseable closes of `series`; values arrive newest first.
pub fn summarize(series: &TimeSeries) -> Option<SeriesSummary> {
    let closes: Vec<f64> = series
        .values
        .iter()
        .filter_map(|v| v.close_price())
        .collect();
    let latest = *closes.first()?;
    let oldest = *closes.last()?;
    let (min, max) = closes
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            (lo.min(*c), hi.max(*c))
        });
    Some(SeriesSummary {
        latest,
        oldest,
        min,
        max,
    })
}

pub fn render(series: &TimeSeries, limit: usize) -> String {
    let mut output = format!(
        "{}\n\n",
        ui::style_text(
            &format!("{} ({})", series.meta.symbol, series.meta.interval),
            ui::StyleType::Title
        )
    );

    let Some(summary) = summarize(series) else {
        output.push_str(&ui::style_text("No price history", ui::StyleType::Error));
        return output;
    };

    let mut overview = ui::new_styled_table();
    overview.set_header(vec![
        ui::header_cell("Latest"),
        ui::header_cell("Min"),
        ui::header_cell("Max"),
        ui::header_cell("Change"),
    ]);
    overview.add_row(vec![
        ui::rate_cell(summary.latest),
        ui::rate_cell(summary.min),
        ui::rate_cell(summary.max),
        summary.change().map_or_else(ui::na_cell, ui::change_cell),
    ]);
    output.push_str(&overview.to_string());
    output.push_str("\n\n");

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Close")]);
    for value in series.values.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&value.datetime),
            ui::format_optional_cell(value.close_price(), |c| format!("{c:.4}")),
        ]);
    }
    output.push_str(&table.to_string());
    output
}

pub async fn run(coordinator: &FetchCoordinator, limit: usize) -> Result<()> {
    let payload = coordinator
        .fetch(DataSource::Twelvedata)
        .await
        .context("Failed to fetch price history")?;
    let series = payload
        .as_time_series()
        .ok_or_else(|| anyhow!("Unexpected payload for {}", DataSource::Twelvedata))?;

    println!("{}", render(series, limit));
    println!(
        "\n{}",
        ui::last_updated_line(
            coordinator.last_fetch_timestamp(DataSource::Twelvedata),
            Utc::now()
        )
    );
    Ok(())
}
