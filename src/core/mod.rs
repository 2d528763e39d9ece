//! Core types shared by the store, providers and coordinator

pub mod clock;
pub mod config;
pub mod convert;
pub mod error;
pub mod log;
pub mod payload;
pub mod retry;
pub mod source;

// Re-export main types for cleaner imports
pub use clock::{Clock, SystemClock};
pub use error::FetchError;
pub use payload::{MyfinRates, Quote, RatePayload, TimeSeries};
pub use retry::RetryPolicy;
pub use source::{DataSource, HttpMethod};

pub type FetchResult = Result<RatePayload, FetchError>;
