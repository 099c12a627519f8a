//! In memory stand-ins for Twitter, the data directory and the console

use crate::model::{Identifier, Profile};
use crate::report::{ForensicsReport, Reporter};
use crate::store::Persistence;
use crate::twitter::{ApiError, TwitterClient};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn profile(id: Identifier) -> Profile {
    Profile {
        id,
        name: format!("User {}", id),
        handle: format!("user{}", id),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    resources: Mutex<HashMap<String, String>>,
    writes: Mutex<HashMap<String, usize>>,
    fail_writes: AtomicBool,
    read_only: Mutex<HashSet<String>>,
}

impl MemoryStore {
    /// Sets contents directly, without counting as a write
    pub fn insert(&self, resource: &str, contents: &str) {
        self.resources
            .lock()
            .unwrap()
            .insert(resource.to_string(), contents.to_string());
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Fails writes to `resource` only
    pub fn fail_writes_to(&self, resource: &str) {
        self.read_only.lock().unwrap().insert(resource.to_string());
    }

    pub fn allow_writes(&self) {
        self.fail_writes.store(false, Ordering::SeqCst);
        self.read_only.lock().unwrap().clear();
    }

    pub fn writes(&self, resource: &str) -> usize {
        self.writes
            .lock()
            .unwrap()
            .get(resource)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn read_text(&self, resource: &str) -> io::Result<String> {
        self.resources
            .lock()
            .unwrap()
            .get(resource)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, resource.to_string()))
    }

    async fn write_text(&self, resource: &str, contents: &str) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst)
            || self.read_only.lock().unwrap().contains(resource)
        {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read only"));
        }
        self.insert(resource, contents);
        *self
            .writes
            .lock()
            .unwrap()
            .entry(resource.to_string())
            .or_default() += 1;
        Ok(())
    }
}

/// Follower fetches are answered in order from a queue, lookups from a set of
/// known profiles
#[derive(Default)]
pub struct ScriptedClient {
    followers: Mutex<VecDeque<Result<Vec<Identifier>, ApiError>>>,
    following: Mutex<Vec<Identifier>>,
    profiles: Mutex<HashMap<Identifier, Profile>>,
    lookups: Mutex<Vec<Vec<Identifier>>>,
    follower_calls: AtomicUsize,
    fail_lookups: AtomicBool,
}

impl ScriptedClient {
    pub fn push_followers(&self, ids: Vec<Identifier>) {
        self.followers.lock().unwrap().push_back(Ok(ids));
    }

    pub fn push_rate_limit(&self) {
        self.followers
            .lock()
            .unwrap()
            .push_back(Err(ApiError::RateLimited("followers/ids")));
    }

    pub fn push_failure(&self) {
        self.followers
            .lock()
            .unwrap()
            .push_back(Err(ApiError::upstream("followers/ids", "Internal error")));
    }

    pub fn set_following(&self, ids: Vec<Identifier>) {
        *self.following.lock().unwrap() = ids;
    }

    pub fn known_user(&self, profile: Profile) {
        self.profiles.lock().unwrap().insert(profile.id, profile);
    }

    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> Vec<Vec<Identifier>> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn follower_calls(&self) -> usize {
        self.follower_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TwitterClient for ScriptedClient {
    async fn get_id_for_username(&self, _username: &str) -> Result<Identifier, ApiError> {
        Err(ApiError::InvalidIdentifier)
    }

    async fn list_follower_ids(&self, _user_id: Identifier) -> Result<Vec<Identifier>, ApiError> {
        self.follower_calls.fetch_add(1, Ordering::SeqCst);
        self.followers
            .lock()
            .unwrap()
            .pop_front()
            .expect("No follower response scripted")
    }

    async fn list_following_ids(&self, _user_id: Identifier) -> Result<Vec<Identifier>, ApiError> {
        Ok(self.following.lock().unwrap().clone())
    }

    async fn lookup_users(&self, ids: &[Identifier]) -> Result<Vec<Profile>, ApiError> {
        self.lookups.lock().unwrap().push(ids.to_vec());
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(ApiError::upstream("users/lookup", "Internal error"));
        }
        let profiles = self.profiles.lock().unwrap();
        let found: Vec<_> = ids.iter().filter_map(|id| profiles.get(id).cloned()).collect();
        if found.is_empty() {
            return Err(ApiError::InvalidIdentifier);
        }
        Ok(found)
    }
}

#[derive(Debug, Clone)]
pub enum Reported {
    Forensics(ForensicsReport),
    Wait(i64),
    NonMutuals(Vec<Profile>),
}

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Reported>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Reported> {
        self.events.lock().unwrap().clone()
    }

    pub fn single(&self) -> Reported {
        let events = self.events();
        assert_eq!(events.len(), 1, "Expected one report, got {:?}", events);
        events.into_iter().next().unwrap()
    }

    pub fn last(&self) -> Reported {
        self.events().pop().expect("Nothing reported")
    }
}

impl Reporter for RecordingReporter {
    fn forensics(&self, report: &ForensicsReport) {
        self.events
            .lock()
            .unwrap()
            .push(Reported::Forensics(report.clone()));
    }

    fn must_wait(&self, minutes: i64) {
        self.events.lock().unwrap().push(Reported::Wait(minutes));
    }

    fn non_mutuals(&self, profiles: &[Profile]) {
        self.events
            .lock()
            .unwrap()
            .push(Reported::NonMutuals(profiles.to_vec()));
    }
}
