//! Remote rate clients

pub mod http;

use crate::core::{DataSource, FetchResult};
use async_trait::async_trait;

/// Performs exactly one round-trip to the endpoint of a data source.
/// Implementations never cache and never retry.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self, source: DataSource) -> FetchResult;
}

pub use http::HttpRateClient;
