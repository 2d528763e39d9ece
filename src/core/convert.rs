//! Conversion math over a best-rate board quoted against the local currency.
use super::payload::MyfinRates;
use anyhow::{Result, anyhow};
use tracing::debug;

/// Currency every myfin quote is expressed in.
pub const LOCAL_CURRENCY: &str = "GEL";

/// Converts `amount` of `from` into `to`.
///
/// Selling foreign currency to an exchange office happens at its buy rate,
/// buying it happens at its sell rate. Cross conversions go through the
/// local currency, so both legs apply.
pub fn convert(rates: &MyfinRates, amount: f64, from: &str, to: &str) -> Result<f64> {
    let from = from.to_uppercase();
    let to = to.to_uppercase();

    if from == to {
        return Ok(amount);
    }

    let local_amount = if from == LOCAL_CURRENCY {
        amount
    } else {
        let quote = rates
            .best_quote(&from)
            .ok_or_else(|| anyhow!("No rate available for {from}"))?;
        amount * quote.buy
    };

    if to == LOCAL_CURRENCY {
        debug!("Converted {amount} {from} to {local_amount} {to}");
        return Ok(local_amount);
    }

    let quote = rates
        .best_quote(&to)
        .ok_or_else(|| anyhow!("No rate available for {to}"))?;
    if quote.sell <= 0.0 {
        return Err(anyhow!("Invalid sell rate for {to}: {}", quote.sell));
    }
    let converted = local_amount / quote.sell;
    debug!("Converted {amount} {from} to {converted} {to} via {LOCAL_CURRENCY}");
    Ok(converted)
}
