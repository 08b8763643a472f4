pub mod memory;
pub mod twitter;

use crate::error::ApiError;
use crate::model::{Account, AccountId};
use async_trait::async_trait;

/// Read access to a follower graph.
#[async_trait]
pub trait SocialGraph: Send + Sync {
    /// Resolve a handle (with or without a leading `@`) to its account id.
    async fn resolve_handle(&self, handle: &str) -> Result<AccountId, ApiError>;

    /// Every account following `id`.
    async fn follower_ids(&self, id: AccountId) -> Result<Vec<AccountId>, ApiError>;

    /// Every account `id` follows.
    async fn friend_ids(&self, id: AccountId) -> Result<Vec<AccountId>, ApiError>;

    /// Profile metadata for up to one batch of ids. Unknown or suspended
    /// accounts are omitted from the result rather than reported as errors.
    async fn lookup_users(&self, ids: &[AccountId]) -> Result<Vec<Account>, ApiError>;
}

pub(crate) fn normalize_handle(handle: &str) -> &str {
    handle.trim().trim_start_matches('@')
}
