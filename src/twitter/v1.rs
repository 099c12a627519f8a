use crate::model::{Identifier, Profile};
use crate::twitter::{ApiError, Authentication, TwitterClient, LOOKUP_BATCH_SIZE};
use async_trait::async_trait;
use egg_mode::error::Error;
use egg_mode::Token;
use futures::TryStreamExt;

// https://developer.twitter.com/en/support/twitter-api/error-troubleshooting
const NO_USER_MATCHES: i32 = 17;
const RATE_LIMIT_EXCEEDED: i32 = 88;

const IDS_PAGE_SIZE: i32 = 5000;

pub struct TwitterClientV1 {
    token: Token,
}

impl TwitterClientV1 {
    pub fn new(auth: &Authentication) -> Self {
        Self {
            token: Token::Bearer(auth.bearer_token.clone()),
        }
    }
}

fn convert_error(endpoint: &'static str, error: Error) -> ApiError {
    match error {
        Error::RateLimit(_) => ApiError::RateLimited(endpoint),
        Error::TwitterError(_, ref errors)
            if errors.errors.iter().any(|e| e.code == RATE_LIMIT_EXCEEDED) =>
        {
            ApiError::RateLimited(endpoint)
        }
        Error::TwitterError(_, ref errors)
            if errors.errors.iter().any(|e| e.code == NO_USER_MATCHES) =>
        {
            ApiError::InvalidIdentifier
        }
        Error::NetError(e) => ApiError::Connectivity(e.to_string()),
        e => ApiError::upstream(endpoint, e),
    }
}

#[async_trait]
impl TwitterClient for TwitterClientV1 {
    async fn get_id_for_username(&self, username: &str) -> Result<Identifier, ApiError> {
        let user = egg_mode::user::show(username.to_string(), &self.token)
            .await
            .map_err(|e| convert_error("users/show", e))?;
        Ok(user.response.id)
    }

    async fn list_follower_ids(&self, user_id: Identifier) -> Result<Vec<Identifier>, ApiError> {
        egg_mode::user::followers_ids(user_id, &self.token)
            .with_page_size(IDS_PAGE_SIZE)
            .map_ok(|r| r.response)
            .try_collect()
            .await
            .map_err(|e| convert_error("followers/ids", e))
    }

    async fn list_following_ids(&self, user_id: Identifier) -> Result<Vec<Identifier>, ApiError> {
        egg_mode::user::friends_ids(user_id, &self.token)
            .with_page_size(IDS_PAGE_SIZE)
            .map_ok(|r| r.response)
            .try_collect()
            .await
            .map_err(|e| convert_error("friends/ids", e))
    }

    async fn lookup_users(&self, ids: &[Identifier]) -> Result<Vec<Profile>, ApiError> {
        let mut profiles = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(LOOKUP_BATCH_SIZE) {
            match egg_mode::user::lookup(chunk.iter().copied(), &self.token).await {
                Ok(users) => profiles.extend(users.response.into_iter().map(|user| Profile {
                    id: user.id,
                    name: user.name,
                    handle: user.screen_name,
                })),
                Err(e) => match convert_error("users/lookup", e) {
                    // Only this chunk was unresolvable, keep going with the rest
                    ApiError::InvalidIdentifier => {
                        log::warn!("No users found for {} ids", chunk.len());
                    }
                    e => return Err(e),
                },
            }
        }
        if profiles.is_empty() && !ids.is_empty() {
            return Err(ApiError::InvalidIdentifier);
        }
        Ok(profiles)
    }
}
