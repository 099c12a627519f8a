use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Twitter account id
pub type Identifier = u64;

/// Id stored on records for accounts Twitter can no longer resolve
pub const UNKNOWN_USER_ID: Identifier = 0;
const UNKNOWN_USER_NAME: &str = "null";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Identifier,
    pub name: String,
    pub handle: String,
}

impl Profile {
    /// Placeholder for deleted or suspended accounts
    pub fn unknown() -> Self {
        Self {
            id: UNKNOWN_USER_ID,
            name: UNKNOWN_USER_NAME.to_string(),
            handle: UNKNOWN_USER_NAME.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_USER_ID
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Followed,
    Unfollowed,
}

/// Which side of a diff an id was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Gained,
    Lost,
}

impl From<ChangeKind> for Status {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Gained => Status::Followed,
            ChangeKind::Lost => Status::Unfollowed,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Identifier,
    pub name: String,
    pub handle: String,
    pub status: Status,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_seen: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(profile: Profile, status: Status, last_seen: DateTime<Utc>) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            handle: profile.handle,
            status,
            last_seen,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_USER_ID
    }
}

/// The last fetched follower list, plus rate limit bookkeeping
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub ids: Vec<Identifier>,
    /// Start of the current rate limit window
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Fetches made since `timestamp`
    pub request_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub gained: Vec<Identifier>,
    pub lost: Vec<Identifier>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.gained.is_empty() && self.lost.is_empty()
    }

    /// Net change in follower count
    pub fn delta(&self) -> i64 {
        self.gained.len() as i64 - self.lost.len() as i64
    }

    /// Every changed id, tagged with the side it came from
    pub fn changes(&self) -> impl Iterator<Item = (Identifier, ChangeKind)> + '_ {
        self.gained
            .iter()
            .map(|id| (*id, ChangeKind::Gained))
            .chain(self.lost.iter().map(|id| (*id, ChangeKind::Lost)))
    }
}
