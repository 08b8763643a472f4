use super::{normalize_handle, SocialGraph};
use crate::config::{ApiConfig, Credentials};
use crate::error::ApiError;
use crate::model::{Account, AccountId};
use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::OnceCell;

/// `followers/ids` and `friends/ids` return at most this many ids per page.
const IDS_PAGE_SIZE: &str = "5000";
/// A rate-limit window is 15 minutes; never sleep longer than one window.
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);

pub struct TwitterClient {
    base_url: String,
    credentials: Credentials,
    wait_on_rate_limit: bool,
    client: reqwest::Client,
    bearer: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct IdsPage {
    ids: Vec<u64>,
    next_cursor: i64,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: u64,
    screen_name: String,
    followers_count: u64,
    friends_count: u64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    entities: Option<UserEntities>,
}

#[derive(Debug, Deserialize)]
struct UserEntities {
    #[serde(default)]
    url: Option<UrlEntity>,
}

#[derive(Debug, Deserialize)]
struct UrlEntity {
    #[serde(default)]
    urls: Vec<UrlItem>,
}

#[derive(Debug, Deserialize)]
struct UrlItem {
    #[serde(default)]
    expanded_url: Option<String>,
}

impl From<ApiUser> for Account {
    fn from(user: ApiUser) -> Self {
        // Profile URLs come back t.co-wrapped; prefer the expanded form.
        let expanded = user
            .entities
            .and_then(|e| e.url)
            .and_then(|u| u.urls.into_iter().find_map(|item| item.expanded_url));

        Account {
            id: AccountId(user.id),
            handle: user.screen_name,
            followers_count: user.followers_count,
            following_count: user.friends_count,
            description: user.description.unwrap_or_default(),
            website: expanded.or(user.url).filter(|u| !u.is_empty()),
        }
    }
}

impl TwitterClient {
    pub fn new(api: &ApiConfig, credentials: Credentials) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(api.timeout())
            .user_agent(concat!("cofollow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            credentials,
            wait_on_rate_limit: api.wait_on_rate_limit,
            client,
            bearer: OnceCell::new(),
        })
    }

    /// Application-only bearer token, exchanged once per client.
    async fn bearer_token(&self) -> Result<&str, ApiError> {
        let token = self
            .bearer
            .get_or_try_init(|| self.request_bearer_token())
            .await?;
        Ok(token.as_str())
    }

    async fn request_bearer_token(&self) -> Result<String, ApiError> {
        let basic = basic_credentials(
            &self.credentials.consumer_key,
            &self.credentials.consumer_secret,
        );

        let response = self
            .client
            .post(format!("{}/oauth2/token", self.base_url))
            .header("Authorization", format!("Basic {}", basic))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded;charset=UTF-8")
            .body("grant_type=client_credentials")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!(
                "token exchange returned HTTP {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                endpoint: "oauth2/token".to_string(),
                source,
            })?;

        if !token.token_type.eq_ignore_ascii_case("bearer") {
            return Err(ApiError::Auth(format!(
                "unexpected token type '{}'",
                token.token_type
            )));
        }

        tracing::debug!("obtained application bearer token");
        Ok(token.access_token)
    }

    /// GET `/1.1/{endpoint}.json`. A 429 either sleeps until the window
    /// resets and re-issues the request, or fails with `RateLimited`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/1.1/{}.json", self.base_url, endpoint);

        loop {
            let token = self.bearer_token().await?;
            let response = self
                .client
                .get(&url)
                .bearer_auth(token)
                .query(query)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let reset_in = rate_limit_delay(response.headers(), unix_now());
                if !self.wait_on_rate_limit {
                    return Err(ApiError::RateLimited {
                        endpoint: endpoint.to_string(),
                        reset_in,
                    });
                }
                tracing::warn!(
                    endpoint,
                    wait_secs = reset_in.as_secs(),
                    "rate limited, waiting for window reset"
                );
                tokio::time::sleep(reset_in).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Status {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await?;
            return serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            });
        }
    }

    /// Walk a cursored id listing until `next_cursor` is 0.
    async fn paged_ids(&self, endpoint: &str, id: AccountId) -> Result<Vec<AccountId>, ApiError> {
        let mut ids = Vec::new();
        let mut cursor: i64 = -1;

        loop {
            let page: IdsPage = self
                .get_json(
                    endpoint,
                    &[
                        ("user_id", id.to_string()),
                        ("cursor", cursor.to_string()),
                        ("count", IDS_PAGE_SIZE.to_string()),
                    ],
                )
                .await?;

            ids.extend(page.ids.into_iter().map(AccountId));
            tracing::trace!(endpoint, %id, cursor, total = ids.len(), "fetched id page");

            if page.next_cursor == 0 {
                break;
            }
            cursor = page.next_cursor;
        }

        Ok(ids)
    }
}

#[async_trait]
impl SocialGraph for TwitterClient {
    async fn resolve_handle(&self, handle: &str) -> Result<AccountId, ApiError> {
        let screen_name = normalize_handle(handle);
        let user: ApiUser = self
            .get_json("users/show", &[("screen_name", screen_name.to_string())])
            .await
            .map_err(|e| match e {
                ApiError::Status { status: 404, .. } => ApiError::NotFound(screen_name.to_string()),
                other => other,
            })?;
        Ok(AccountId(user.id))
    }

    async fn follower_ids(&self, id: AccountId) -> Result<Vec<AccountId>, ApiError> {
        self.paged_ids("followers/ids", id).await
    }

    async fn friend_ids(&self, id: AccountId) -> Result<Vec<AccountId>, ApiError> {
        self.paged_ids("friends/ids", id).await
    }

    async fn lookup_users(&self, ids: &[AccountId]) -> Result<Vec<Account>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let result: Result<Vec<ApiUser>, ApiError> = self
            .get_json(
                "users/lookup",
                &[
                    ("user_id", user_ids),
                    ("include_entities", "true".to_string()),
                ],
            )
            .await;

        match result {
            Ok(users) => Ok(users.into_iter().map(Account::from).collect()),
            // Returned when none of the requested ids resolve.
            Err(ApiError::Status { status: 404, .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// `base64(urlencode(key) ":" urlencode(secret))` for the token exchange.
fn basic_credentials(key: &str, secret: &str) -> String {
    BASE64_STANDARD.encode(format!(
        "{}:{}",
        urlencoding::encode(key),
        urlencoding::encode(secret)
    ))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Time until the `x-rate-limit-reset` epoch plus one second of slack,
/// capped at one window. Without the header, wait a full window.
fn rate_limit_delay(headers: &HeaderMap, now: u64) -> Duration {
    let reset = headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match reset {
        Some(reset) => Duration::from_secs(reset.saturating_sub(now) + 1).min(MAX_RATE_LIMIT_WAIT),
        None => MAX_RATE_LIMIT_WAIT,
    }
}
