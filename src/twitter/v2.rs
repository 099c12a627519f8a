use crate::model::{Identifier, Profile};
use crate::twitter::{ApiError, Authentication, TwitterClient, LOOKUP_BATCH_SIZE};
use async_trait::async_trait;
use maplit::hashmap;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

const TIMEOUT_SEC: u64 = 10;
const API_ROOT: &str = "https://api.twitter.com/2/";
const IDS_PAGE_SIZE: &str = "1000";

#[derive(Clone)]
pub struct TwitterClientV2 {
    client: Client,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TwitterResponse<T> {
    Ok(T),
    // Detect the case where the API returns 200, but contains errors
    #[allow(unused)]
    Error {
        errors: serde_json::Value,
    },
}

#[derive(Deserialize)]
struct ByUsernameResponse {
    data: User,
}

#[derive(Deserialize)]
struct User {
    id: String,
    name: String,
    username: String,
}

#[derive(Deserialize)]
struct UsersPage {
    #[serde(default)]
    data: Vec<User>,
    meta: UsersPageMeta,
}

#[derive(Deserialize)]
struct UsersPageMeta {
    next_token: Option<String>,
}

/// Lookups report unknown ids in `errors` next to the users that were found
#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    data: Vec<User>,
    #[serde(default)]
    errors: Vec<LookupError>,
}

#[derive(Deserialize)]
struct LookupError {
    value: Option<String>,
    title: String,
}

impl TryFrom<User> for Profile {
    type Error = ApiError;

    fn try_from(user: User) -> Result<Self, ApiError> {
        Ok(Profile {
            id: parse_id(&user.id)?,
            name: user.name,
            handle: user.username,
        })
    }
}

fn parse_id(id: &str) -> Result<Identifier, ApiError> {
    Identifier::from_str(id)
        .map_err(|e| ApiError::upstream("users", format!("Bad user id {id}: {e}")))
}

fn send_error(endpoint: &'static str, error: reqwest::Error) -> ApiError {
    if error.is_connect() || error.is_timeout() {
        ApiError::Connectivity(error.to_string())
    } else {
        ApiError::upstream(endpoint, error)
    }
}

async fn response_text(endpoint: &'static str, response: Response) -> Result<String, ApiError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited(endpoint));
    }
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::upstream(endpoint, format!("Bad response text: {e}")))?;
    if !status.is_success() {
        let code = status.as_u16();
        return Err(ApiError::upstream(
            endpoint,
            format!("Response was not successful: {code}\n{text}"),
        ));
    }
    Ok(text)
}

async fn deserialize_response<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, ApiError> {
    let text = response_text(endpoint, response).await?;
    let twitter = serde_json::from_str::<TwitterResponse<T>>(&text).map_err(|e| {
        ApiError::upstream(
            endpoint,
            format!("Unable to deserialize due to: {e}\nContents:\n{text}"),
        )
    })?;
    match twitter {
        TwitterResponse::Ok(ok) => Ok(ok),
        TwitterResponse::Error { .. } => Err(ApiError::upstream(endpoint, text)),
    }
}

impl TwitterClientV2 {
    pub fn new(auth: &Authentication) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", auth.bearer_token);
        let value = HeaderValue::from_str(&value)?;
        headers.insert(AUTHORIZATION, value);
        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(Duration::from_secs(TIMEOUT_SEC))
                .build()?,
        })
    }

    fn url(&self, endpoint: &'static str, path: &str) -> Result<Url, ApiError> {
        Url::from_str(API_ROOT)
            .and_then(|root| root.join(path))
            .map_err(|e| ApiError::upstream(endpoint, e))
    }

    // https://developer.twitter.com/en/docs/twitter-api/users/follows/api-reference/get-users-id-followers
    async fn get_all_user_ids(
        &self,
        endpoint: &'static str,
        user_id: Identifier,
    ) -> Result<Vec<Identifier>, ApiError> {
        let url = self.url(endpoint, &format!("users/{user_id}/{endpoint}"))?;
        let mut next_token: Option<String> = None;
        let mut results = Vec::new();
        loop {
            let mut query = hashmap! {
                "max_results" => IDS_PAGE_SIZE.to_string(),
            };
            if let Some(pagination_token) = next_token.take() {
                query.insert("pagination_token", pagination_token);
            }
            let response = self
                .client
                .get(url.clone())
                .query(&query)
                .send()
                .await
                .map_err(|e| send_error(endpoint, e))?;
            let page = deserialize_response::<UsersPage>(endpoint, response).await?;
            for user in page.data {
                results.push(parse_id(&user.id)?);
            }
            match page.meta.next_token {
                Some(next) => next_token = Some(next),
                None => break,
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl TwitterClient for TwitterClientV2 {
    async fn get_id_for_username(&self, username: &str) -> Result<Identifier, ApiError> {
        let url = self.url("users/by", &format!("users/by/username/{username}"))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| send_error("users/by", e))?;
        let response = deserialize_response::<ByUsernameResponse>("users/by", response).await?;
        parse_id(&response.data.id)
    }

    async fn list_follower_ids(&self, user_id: Identifier) -> Result<Vec<Identifier>, ApiError> {
        self.get_all_user_ids("followers", user_id).await
    }

    async fn list_following_ids(&self, user_id: Identifier) -> Result<Vec<Identifier>, ApiError> {
        self.get_all_user_ids("following", user_id).await
    }

    // https://developer.twitter.com/en/docs/twitter-api/users/lookup/api-reference/get-users
    async fn lookup_users(&self, ids: &[Identifier]) -> Result<Vec<Profile>, ApiError> {
        let url = self.url("users", "users")?;
        let mut profiles = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(LOOKUP_BATCH_SIZE) {
            let joined = chunk
                .iter()
                .map(Identifier::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let response = self
                .client
                .get(url.clone())
                .query(&hashmap! { "ids" => joined })
                .send()
                .await
                .map_err(|e| send_error("users", e))?;
            let text = response_text("users", response).await?;
            let lookup = serde_json::from_str::<LookupResponse>(&text).map_err(|e| {
                ApiError::upstream("users", format!("Unable to deserialize due to: {e}"))
            })?;
            for error in &lookup.errors {
                log::warn!(
                    "Unable to look up user {}: {}",
                    error.value.as_deref().unwrap_or("?"),
                    error.title
                );
            }
            for user in lookup.data {
                profiles.push(Profile::try_from(user)?);
            }
        }
        if profiles.is_empty() && !ids.is_empty() {
            return Err(ApiError::InvalidIdentifier);
        }
        Ok(profiles)
    }
}
