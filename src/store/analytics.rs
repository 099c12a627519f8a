//! Every account ever seen in a diff, with its latest follow status.
//! Records are only ever inserted or updated, never removed.

use super::{load_json, save_json, Persistence, StoreError, ANALYTICS_RESOURCE};
use crate::model::{ChangeKind, Identifier, Profile, Status, UserRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsCache {
    users: BTreeMap<Identifier, UserRecord>,
}

impl AnalyticsCache {
    pub fn get(&self, id: Identifier) -> Option<&UserRecord> {
        self.users.get(&id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Records that `id` was just gained or lost.
    ///
    /// Unseen ids are seeded from `profile`, or the unknown user placeholder when
    /// Twitter couldn't resolve them. A resolved profile also refreshes the name
    /// and handle of an existing record.
    pub fn record_change(
        &mut self,
        id: Identifier,
        kind: ChangeKind,
        profile: Option<&Profile>,
        now: DateTime<Utc>,
    ) {
        let status = Status::from(kind);
        match self.users.get_mut(&id) {
            Some(record) => {
                if let Some(profile) = profile.filter(|p| !p.is_unknown()) {
                    record.id = profile.id;
                    record.name = profile.name.clone();
                    record.handle = profile.handle.clone();
                }
                record.status = status;
                record.last_seen = now;
            }
            None => {
                let profile = profile.cloned().unwrap_or_else(Profile::unknown);
                self.users.insert(id, UserRecord::new(profile, status, now));
            }
        }
    }

    /// Up to `limit` records with `status`, most recently seen first.
    ///
    /// Unknown users and anything in `exclude` are skipped. Ties on `last_seen`
    /// keep ascending id order.
    pub fn recent_by_status(
        &self,
        status: Status,
        exclude: &HashSet<Identifier>,
        limit: usize,
    ) -> Vec<UserRecord> {
        let mut matching: Vec<_> = self
            .users
            .iter()
            .filter(|(id, record)| {
                record.status == status && !record.is_unknown() && !exclude.contains(*id)
            })
            .map(|(_, record)| record)
            .collect();
        matching.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        matching.into_iter().take(limit).cloned().collect()
    }
}

pub struct AnalyticsStore<'a> {
    persistence: &'a dyn Persistence,
}

impl<'a> AnalyticsStore<'a> {
    pub fn new(persistence: &'a dyn Persistence) -> Self {
        Self { persistence }
    }

    pub async fn exists(&self) -> bool {
        self.persistence.exists(ANALYTICS_RESOURCE).await
    }

    pub async fn load(&self) -> Result<AnalyticsCache, StoreError> {
        let cache: AnalyticsCache = load_json(self.persistence, ANALYTICS_RESOURCE).await?;
        if cache.is_empty() {
            log::debug!("No follower history recorded yet");
        }
        Ok(cache)
    }

    pub async fn save(&self, cache: &AnalyticsCache) -> Result<(), StoreError> {
        save_json(self.persistence, ANALYTICS_RESOURCE, cache).await?;
        log::info!("Saved analytics for {} users", cache.len());
        Ok(())
    }
}
