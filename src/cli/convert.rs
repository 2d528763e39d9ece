use super::ui;
use crate::coordinator::FetchCoordinator;
use crate::core::{DataSource, convert};
use anyhow::{Context, Result, anyhow};

pub async fn run(coordinator: &FetchCoordinator, amount: f64, from: &str, to: &str) -> Result<()> {
    let payload = coordinator
        .fetch(DataSource::Myfin)
        .await
        .context("Failed to fetch best rates")?;
    let rates = payload
        .as_myfin()
        .ok_or_else(|| anyhow!("Unexpected payload for {}", DataSource::Myfin))?;

    let converted = convert::convert(rates, amount, from, to)?;
    println!(
        "{amount:.2} {} = {}",
        from.to_uppercase(),
        ui::style_text(
            &format!("{converted:.2} {}", to.to_uppercase()),
            ui::StyleType::Value
        )
    );
    Ok(())
}
