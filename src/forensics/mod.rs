pub mod nonmutual;

use crate::clock::Clock;
use crate::idset;
use crate::model::{DiffResult, Identifier, Profile, Snapshot, Status};
use crate::policy::RefreshPolicy;
use crate::report::{ForensicsReport, Reporter};
use crate::store::analytics::{AnalyticsCache, AnalyticsStore};
use crate::store::snapshot::SnapshotStore;
use crate::store::Persistence;
use crate::twitter::{ApiError, TwitterClient};
use anyhow::{bail, Context};
use std::collections::{HashMap, HashSet};

#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The local rate limit is used up, nothing was fetched
    Wait { minutes: i64 },
    /// Twitter refused the fetch, nothing was saved
    RateLimited,
    Reconciled {
        total_followers: usize,
        diff: DiffResult,
        /// False when saving the snapshot or analytics failed
        persisted: bool,
    },
}

/// Compares the saved follower snapshot with a fresh fetch and records who
/// followed or unfollowed since
pub struct Reconciler<'a> {
    pub client: &'a dyn TwitterClient,
    pub persistence: &'a dyn Persistence,
    pub clock: &'a dyn Clock,
    pub policy: RefreshPolicy,
    pub account_id: Identifier,
    /// How many cached users to show when a run finds few changes
    pub recent_limit: usize,
}

impl<'a> Reconciler<'a> {
    pub async fn run(&self, reporter: &dyn Reporter) -> anyhow::Result<RunOutcome> {
        let snapshots = SnapshotStore::new(self.persistence);
        let analytics = AnalyticsStore::new(self.persistence);

        log::debug!("Loading snapshot");
        let snapshot = snapshots
            .load()
            .await
            .context("Unable to load follower snapshot, run `init` first")?;

        let now = self.clock.now();
        if !self
            .policy
            .should_fetch(snapshot.timestamp, snapshot.request_count, now)
        {
            // A window ending exactly now still needs a wait
            let minutes = self
                .policy
                .minutes_until_next_window(snapshot.timestamp, now)
                .max(1);
            log::info!(
                "{} requests made since {}, waiting for the window to reset",
                snapshot.request_count,
                snapshot.timestamp
            );
            reporter.must_wait(minutes);
            return Ok(RunOutcome::Wait { minutes });
        }

        log::debug!("Fetching followers for {}", self.account_id);
        let mut ids = match self.client.list_follower_ids(self.account_id).await {
            Ok(ids) => ids,
            Err(ApiError::RateLimited(endpoint)) => {
                log::warn!("Twitter rate limited {}, cooling down", endpoint);
                let cache = analytics
                    .load()
                    .await
                    .context("Unable to load follower analytics")?;
                let report = self.report(None, DiffResult::default(), HashMap::new(), &cache);
                reporter.forensics(&report);
                return Ok(RunOutcome::RateLimited);
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Unable to fetch followers")),
        };

        idset::sort(&mut ids);
        let total_followers = ids.len();
        let diff = idset::symmetric_difference(&snapshot.ids, &ids);
        log::info!(
            "{} followers, {} new, {} lost",
            total_followers,
            diff.gained.len(),
            diff.lost.len()
        );

        let fresh = if diff.is_empty() {
            HashMap::new()
        } else {
            let changed: Vec<_> = diff.changes().map(|(id, _)| id).collect();
            resolve_profiles(self.client, &changed)
                .await
                .context("Unable to look up changed followers")?
        };

        let mut cache = analytics
            .load()
            .await
            .context("Unable to load follower analytics")?;
        for (id, kind) in diff.changes() {
            cache.record_change(id, kind, fresh.get(&id), now);
        }

        let (timestamp, request_count) = self
            .policy
            .advance(snapshot.timestamp, snapshot.request_count, now);
        let mut persisted = true;
        if !diff.is_empty() {
            if let Err(e) = analytics.save(&cache).await {
                log::error!("Error saving analytics: {:#}", e);
                persisted = false;
            }
        }
        // Unrecorded changes keep the old ids so the next run finds them again
        let next = Snapshot {
            ids: if persisted { ids } else { snapshot.ids },
            timestamp,
            request_count,
        };
        if let Err(e) = snapshots.save(&next).await {
            log::error!("Error saving snapshot: {:#}", e);
            persisted = false;
        }

        let report = self.report(Some(total_followers), diff.clone(), fresh, &cache);
        reporter.forensics(&report);
        Ok(RunOutcome::Reconciled {
            total_followers,
            diff,
            persisted,
        })
    }

    fn report(
        &self,
        total_followers: Option<usize>,
        diff: DiffResult,
        fresh: HashMap<Identifier, Profile>,
        cache: &AnalyticsCache,
    ) -> ForensicsReport {
        let reported: HashSet<_> = diff.changes().map(|(id, _)| id).collect();
        ForensicsReport {
            total_followers,
            recent_followers: cache.recent_by_status(
                Status::Followed,
                &reported,
                self.recent_limit,
            ),
            recent_unfollowers: cache.recent_by_status(
                Status::Unfollowed,
                &reported,
                self.recent_limit,
            ),
            diff,
            fresh,
            checked_at: self.clock.now(),
        }
    }

    /// Saves the current followers as the first snapshot, so later runs have
    /// something to compare against. Existing analytics are kept.
    pub async fn init(&self, force: bool) -> anyhow::Result<Snapshot> {
        let snapshots = SnapshotStore::new(self.persistence);
        let analytics = AnalyticsStore::new(self.persistence);
        if snapshots.exists().await && !force {
            bail!("A follower snapshot already exists, use --force to replace it");
        }

        let mut ids = self
            .client
            .list_follower_ids(self.account_id)
            .await
            .context("Unable to fetch followers")?;
        idset::sort(&mut ids);
        let snapshot = Snapshot {
            ids,
            timestamp: self.clock.now(),
            request_count: 1,
        };
        snapshots
            .save(&snapshot)
            .await
            .context("Error saving snapshot")?;

        if analytics.exists().await {
            log::info!("Keeping existing follower analytics");
        } else {
            analytics
                .save(&AnalyticsCache::default())
                .await
                .context("Error saving analytics")?;
        }
        Ok(snapshot)
    }
}

/// Looks up every id, with the unknown user placeholder standing in for any
/// Twitter can't resolve
pub(crate) async fn resolve_profiles(
    client: &dyn TwitterClient,
    ids: &[Identifier],
) -> Result<HashMap<Identifier, Profile>, ApiError> {
    let mut resolved: HashMap<_, _> = match client.lookup_users(ids).await {
        Ok(profiles) => profiles.into_iter().map(|p| (p.id, p)).collect(),
        Err(ApiError::InvalidIdentifier) => HashMap::new(),
        Err(e) => return Err(e),
    };
    for id in ids {
        resolved.entry(*id).or_insert_with(|| {
            log::warn!("Unable to resolve user {}, suspended or deleted?", id);
            Profile::unknown()
        });
    }
    Ok(resolved)
}
