//! Decoded response bodies, one shape per data source

use super::source::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Buy/sell quote against the local currency (GEL).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub buy: f64,
    pub sell: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    #[serde(default)]
    pub rates: BTreeMap<String, Quote>,
}

/// Best-rate board returned by myfin, keyed by ISO currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyfinRates {
    pub best: BTreeMap<String, Quote>,
    #[serde(default)]
    pub organizations: Vec<Organization>,
}

impl MyfinRates {
    pub fn best_quote(&self, code: &str) -> Option<Quote> {
        self.best.get(&code.to_uppercase()).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub symbol: String,
    pub interval: String,
    #[serde(default)]
    pub currency_base: Option<String>,
    #[serde(default)]
    pub currency_quote: Option<String>,
}

/// One bar of a time series. Prices are kept as the decimal strings the API
/// sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesValue {
    pub datetime: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl SeriesValue {
    pub fn close_price(&self) -> Option<f64> {
        self.close.parse().ok()
    }
}

/// Time series returned by twelvedata, newest value first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub meta: SeriesMeta,
    pub values: Vec<SeriesValue>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RatePayload {
    Myfin(MyfinRates),
    Twelvedata(TimeSeries),
}

impl RatePayload {
    pub fn source(&self) -> DataSource {
        match self {
            RatePayload::Myfin(_) => DataSource::Myfin,
            RatePayload::Twelvedata(_) => DataSource::Twelvedata,
        }
    }

    /// Decodes a body into the shape owned by `source`.
    pub fn decode(source: DataSource, bytes: &[u8]) -> serde_json::Result<Self> {
        Ok(match source {
            DataSource::Myfin => RatePayload::Myfin(serde_json::from_slice(bytes)?),
            DataSource::Twelvedata => RatePayload::Twelvedata(serde_json::from_slice(bytes)?),
        })
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            RatePayload::Myfin(rates) => serde_json::to_vec(rates),
            RatePayload::Twelvedata(series) => serde_json::to_vec(series),
        }
    }

    pub fn as_myfin(&self) -> Option<&MyfinRates> {
        match self {
            RatePayload::Myfin(rates) => Some(rates),
            _ => None,
        }
    }

    pub fn as_time_series(&self) -> Option<&TimeSeries> {
        match self {
            RatePayload::Twelvedata(series) => Some(series),
            _ => None,
        }
    }
}
