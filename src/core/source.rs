//! Remote rate providers and their static request/storage configuration

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// One remote rate provider. Each variant has a fixed endpoint, request
/// method, header set and a pair of storage keys for the cached payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum DataSource {
    /// Bank and exchange office rates board (myfin.ge)
    Myfin,
    /// Daily time series (twelvedata.com)
    Twelvedata,
}

impl DataSource {
    pub const ALL: [DataSource; 2] = [DataSource::Myfin, DataSource::Twelvedata];

    /// Base URL used when the configuration does not override it.
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            DataSource::Myfin => "https://myfin.ge",
            DataSource::Twelvedata => "https://api.twelvedata.com",
        }
    }

    /// Request path appended to the base URL.
    pub const fn path(&self) -> &'static str {
        match self {
            DataSource::Myfin => "/api/exchangeRates",
            DataSource::Twelvedata => "/time_series",
        }
    }

    pub const fn method(&self) -> HttpMethod {
        match self {
            DataSource::Myfin => HttpMethod::Post,
            DataSource::Twelvedata => HttpMethod::Get,
        }
    }

    pub const fn headers(&self) -> &'static [(&'static str, &'static str)] {
        &[("Content-Type", "application/json")]
    }

    pub const fn cache_key(&self) -> &'static str {
        match self {
            DataSource::Myfin => "MyfinExchangeRateModelCache",
            DataSource::Twelvedata => "TwelveExchangeRateModelCache",
        }
    }

    pub const fn timestamp_key(&self) -> &'static str {
        match self {
            DataSource::Myfin => "MyfinExchangeRateModelTimestamp",
            DataSource::Twelvedata => "TwelveExchangeRateModelTimestamp",
        }
    }

    pub fn default_endpoint(&self) -> String {
        format!("{}{}", self.default_base_url(), self.path())
    }
}

impl Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                DataSource::Myfin => "myfin",
                DataSource::Twelvedata => "twelvedata",
            }
        )
    }
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "myfin" => Ok(DataSource::Myfin),
            "twelvedata" | "twelve" => Ok(DataSource::Twelvedata),
            _ => Err(anyhow::anyhow!("Invalid data source: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_storage_keys_are_distinct() {
        let keys: HashSet<&str> = DataSource::ALL
            .iter()
            .flat_map(|s| [s.cache_key(), s.timestamp_key()])
            .collect();
        assert_eq!(keys.len(), DataSource::ALL.len() * 2);
    }

    #[test]
    fn test_default_endpoints() {
        assert_eq!(
            DataSource::Myfin.default_endpoint(),
            "https://myfin.ge/api/exchangeRates"
        );
        assert_eq!(DataSource::Myfin.method(), HttpMethod::Post);
        assert_eq!(
            DataSource::Twelvedata.default_endpoint(),
            "https://api.twelvedata.com/time_series"
        );
        assert_eq!(DataSource::Twelvedata.method().as_str(), "GET");
    }

    #[test]
    fn test_parse_display_round_trip() {
        for source in DataSource::ALL {
            assert_eq!(source.to_string().parse::<DataSource>().unwrap(), source);
        }
        assert!("yahoo".parse::<DataSource>().is_err());
    }
}
