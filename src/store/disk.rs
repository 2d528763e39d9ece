use super::KeyValueBackend;
use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "rates";

/// Durable backend on a fjall keyspace. Multi-key writes go through a single
/// batch so they land together or not at all.
pub struct DiskBackend {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskBackend {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path.join("cache"))
            .open()
            .with_context(|| format!("Failed to open keyspace in {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open rates partition")?;
        debug!("Opened rate store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl KeyValueBackend for DiskBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .partition
            .get(key.as_bytes())?
            .map(|value| value.to_vec()))
    }

    fn insert_all(&self, entries: Vec<(&str, Vec<u8>)>) -> Result<()> {
        let mut batch = self.keyspace.batch();
        for (key, value) in entries {
            debug!("Store PUT for key: {key}");
            batch.insert(&self.partition, key.as_bytes(), value);
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}
