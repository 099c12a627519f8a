pub mod v1;
pub mod v2;

use crate::model::{Identifier, Profile};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Most ids Twitter accepts in a single user lookup
pub const LOOKUP_BATCH_SIZE: usize = 100;

#[derive(Deserialize)]
pub struct Authentication {
    pub bearer_token: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Rate limit exceeded for {0}")]
    RateLimited(&'static str),
    #[error("None of the requested user ids could be found")]
    InvalidIdentifier,
    #[error("Unable to reach Twitter, you probably aren't connected to the internet right now: {0}")]
    Connectivity(String),
    #[error("{endpoint} failed: {message}")]
    Upstream {
        endpoint: &'static str,
        message: String,
    },
}

impl ApiError {
    pub(crate) fn upstream(endpoint: &'static str, message: impl ToString) -> Self {
        ApiError::Upstream {
            endpoint,
            message: message.to_string(),
        }
    }
}

#[async_trait]
pub trait TwitterClient: Send + Sync {
    async fn get_id_for_username(&self, username: &str) -> Result<Identifier, ApiError>;

    /// Ids of everyone following `user_id`, in no particular order
    async fn list_follower_ids(&self, user_id: Identifier) -> Result<Vec<Identifier>, ApiError>;

    /// Ids of everyone `user_id` follows, in no particular order
    async fn list_following_ids(&self, user_id: Identifier) -> Result<Vec<Identifier>, ApiError>;

    /// Profiles for as many of `ids` as Twitter can still resolve.
    ///
    /// Unresolvable ids are simply missing from the result, `InvalidIdentifier`
    /// is returned when none of them resolve.
    async fn lookup_users(&self, ids: &[Identifier]) -> Result<Vec<Profile>, ApiError>;
}
