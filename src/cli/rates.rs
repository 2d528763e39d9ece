use super::ui;
use crate::coordinator::FetchCoordinator;
use crate::core::{DataSource, MyfinRates};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use comfy_table::Cell;

impl MyfinRates {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell("Buy"),
            ui::header_cell("Sell"),
            ui::header_cell("Spread"),
        ]);

        for (code, quote) in &self.best {
            table.add_row(vec![
                Cell::new(code),
                ui::rate_cell(quote.buy),
                ui::rate_cell(quote.sell),
                ui::rate_cell(quote.sell - quote.buy),
            ]);
        }

        table.to_string()
    }
}

pub fn render(rates: &MyfinRates, fetched_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let mut output = format!(
        "{}\n\n",
        ui::style_text("Best exchange rates (GEL)", ui::StyleType::Title)
    );
    if rates.best.is_empty() {
        output.push_str(&ui::style_text("No rates published", ui::StyleType::Error));
    } else {
        output.push_str(&rates.display_as_table());
    }
    output.push_str("\n\n");
    output.push_str(&ui::last_updated_line(fetched_at, now));
    output
}

pub async fn run(coordinator: &FetchCoordinator) -> Result<()> {
    let payload = coordinator
        .fetch(DataSource::Myfin)
        .await
        .context("Failed to fetch best rates")?;
    let rates = payload
        .as_myfin()
        .ok_or_else(|| anyhow!("Unexpected payload for {}", DataSource::Myfin))?;

    println!(
        "{}",
        render(
            rates,
            coordinator.last_fetch_timestamp(DataSource::Myfin),
            Utc::now()
        )
    );
    Ok(())
}
