pub mod disk;
pub mod memory;

use crate::core::{Clock, DataSource, RatePayload, SystemClock};
use anyhow::{Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use disk::DiskBackend;
use memory::MemoryBackend;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Raw byte storage under string keys.
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes every entry or none of them.
    fn insert_all(&self, entries: Vec<(&str, Vec<u8>)>) -> Result<()>;
}

/// Last successful payload and its fetch time, one pair per data source.
pub struct RateStore {
    backend: Arc<dyn KeyValueBackend>,
    clock: Arc<dyn Clock>,
}

impl RateStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(
            Arc::new(DiskBackend::open(path)?),
            Arc::new(SystemClock),
        ))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), Arc::new(SystemClock))
    }

    /// Returns the last saved payload, or `None` when nothing was saved or the
    /// stored bytes no longer decode.
    pub fn load(&self, source: DataSource) -> Option<RatePayload> {
        let bytes = match self.backend.get(source.cache_key()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("Store MISS for {source}");
                return None;
            }
            Err(e) => {
                debug!("Store read error for {source}: {e}");
                return None;
            }
        };

        match RatePayload::decode(source, &bytes) {
            Ok(payload) => {
                debug!("Store HIT for {source}");
                Some(payload)
            }
            Err(e) => {
                debug!("Stored payload for {source} no longer decodes: {e}");
                None
            }
        }
    }

    /// Stores `payload` together with the current time as its fetch timestamp.
    pub fn save(&self, source: DataSource, payload: &RatePayload) -> Result<DateTime<Utc>> {
        if payload.source() != source {
            bail!(
                "Refusing to store a {} payload under {}",
                payload.source(),
                source
            );
        }

        let fetched_at = self.clock.now();
        let timestamp = fetched_at.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        self.backend.insert_all(vec![
            (source.cache_key(), payload.encode()?),
            (source.timestamp_key(), timestamp.into_bytes()),
        ])?;
        debug!("Store PUT for {source} at {fetched_at}");
        Ok(fetched_at)
    }

    pub fn last_fetch_timestamp(&self, source: DataSource) -> Option<DateTime<Utc>> {
        let bytes = self.backend.get(source.timestamp_key()).ok()??;
        let text = String::from_utf8(bytes).ok()?;
        match DateTime::parse_from_rfc3339(&text) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                debug!("Invalid timestamp stored for {source}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::testing::ManualClock;
    use crate::core::payload::{MyfinRates, Quote};
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn myfin_payload(usd_buy: f64) -> RatePayload {
        let mut best = BTreeMap::new();
        best.insert(
            "USD".to_string(),
            Quote {
                buy: usd_buy,
                sell: usd_buy + 0.03,
            },
        );
        RatePayload::Myfin(MyfinRates {
            best,
            organizations: Vec::new(),
        })
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 29, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_load_empty_store() {
        let store = RateStore::in_memory();
        assert!(store.load(DataSource::Myfin).is_none());
        assert!(store.last_fetch_timestamp(DataSource::Myfin).is_none());
    }

    #[test]
    fn test_save_writes_payload_and_timestamp() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = RateStore::new(Arc::new(MemoryBackend::new()), clock.clone());

        let saved_at = store.save(DataSource::Myfin, &myfin_payload(2.71)).unwrap();
        assert_eq!(saved_at, start());
        assert_eq!(store.load(DataSource::Myfin), Some(myfin_payload(2.71)));
        assert_eq!(store.last_fetch_timestamp(DataSource::Myfin), Some(start()));

        // Sources are keyed independently
        assert!(store.load(DataSource::Twelvedata).is_none());
        assert!(store.last_fetch_timestamp(DataSource::Twelvedata).is_none());

        // Last write wins, timestamp moves with the payload
        clock.advance(Duration::seconds(90));
        store.save(DataSource::Myfin, &myfin_payload(2.72)).unwrap();
        assert_eq!(store.load(DataSource::Myfin), Some(myfin_payload(2.72)));
        assert_eq!(
            store.last_fetch_timestamp(DataSource::Myfin),
            Some(start() + Duration::seconds(90))
        );
    }

    #[test]
    fn test_stored_rates_are_bit_exact() {
        let store = RateStore::in_memory();
        for rate in [2.71, 2.74, 0.1 + 0.2, 1.0 / 3.0, 2.7399999999999998] {
            let payload = myfin_payload(rate);
            store.save(DataSource::Myfin, &payload).unwrap();
            let loaded = store.load(DataSource::Myfin).unwrap();

            let quote = loaded.as_myfin().unwrap().best_quote("USD").unwrap();
            assert_eq!(quote.buy.to_bits(), rate.to_bits());
            assert_eq!(quote.sell.to_bits(), (rate + 0.03).to_bits());
            assert_eq!(loaded, payload);
        }
    }

    #[test]
    fn test_save_rejects_mismatched_source() {
        let store = RateStore::in_memory();
        assert!(store.save(DataSource::Twelvedata, &myfin_payload(2.71)).is_err());
        assert!(store.load(DataSource::Twelvedata).is_none());
        assert!(store.last_fetch_timestamp(DataSource::Twelvedata).is_none());
    }

    #[test]
    fn test_corrupt_entries_read_as_absent() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .insert_all(vec![
                (DataSource::Myfin.cache_key(), b"{\"best\": 12}".to_vec()),
                (DataSource::Myfin.timestamp_key(), b"yesterday".to_vec()),
            ])
            .unwrap();
        let store = RateStore::new(backend, Arc::new(SystemClock));

        assert!(store.load(DataSource::Myfin).is_none());
        assert!(store.last_fetch_timestamp(DataSource::Myfin).is_none());
    }

    #[test]
    fn test_disk_store_persists_across_sessions() {
        let dir = tempdir().unwrap();
        let saved_at = {
            let store = RateStore::open(dir.path()).unwrap();
            store.save(DataSource::Myfin, &myfin_payload(2.71)).unwrap()
        };

        let store = RateStore::open(dir.path()).unwrap();
        assert_eq!(store.load(DataSource::Myfin), Some(myfin_payload(2.71)));
        assert_eq!(store.last_fetch_timestamp(DataSource::Myfin), Some(saved_at));
    }
}
