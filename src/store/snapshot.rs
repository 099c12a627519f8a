use super::{load_json, save_json, Persistence, StoreError, SNAPSHOT_RESOURCE};
use crate::idset;
use crate::model::Snapshot;

pub struct SnapshotStore<'a> {
    persistence: &'a dyn Persistence,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(persistence: &'a dyn Persistence) -> Self {
        Self { persistence }
    }

    pub async fn exists(&self) -> bool {
        self.persistence.exists(SNAPSHOT_RESOURCE).await
    }

    /// Loads the last snapshot with its ids sorted and deduplicated.
    ///
    /// There is no fallback when the file is missing or malformed, starting from
    /// an empty list would report every current follower as new.
    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        let mut snapshot: Snapshot = load_json(self.persistence, SNAPSHOT_RESOURCE).await?;
        idset::sort(&mut snapshot.ids);
        Ok(snapshot)
    }

    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        save_json(self.persistence, SNAPSHOT_RESOURCE, snapshot).await?;
        log::info!("Saved snapshot of {} followers", snapshot.ids.len());
        Ok(())
    }
}
