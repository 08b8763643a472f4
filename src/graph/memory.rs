use super::{normalize_handle, SocialGraph};
use crate::error::ApiError;
use crate::model::{Account, AccountId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A fixed follower graph held in memory. Used to exercise the pipeline
/// without network access; failures can be injected per account.
#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    accounts: HashMap<AccountId, Account>,
    following: BTreeMap<AccountId, Vec<AccountId>>,
    failing_friend_lookups: HashSet<AccountId>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&mut self, account: Account) -> &mut Self {
        self.accounts.insert(account.id, account);
        self
    }

    pub fn follow(&mut self, follower: AccountId, followee: AccountId) -> &mut Self {
        self.following.entry(follower).or_default().push(followee);
        self
    }

    /// Make `friend_ids(id)` fail with an HTTP 401, as the API does for
    /// protected accounts.
    pub fn fail_friend_lookup(&mut self, id: AccountId) -> &mut Self {
        self.failing_friend_lookups.insert(id);
        self
    }
}

#[async_trait]
impl SocialGraph for MemoryGraph {
    async fn resolve_handle(&self, handle: &str) -> Result<AccountId, ApiError> {
        let wanted = normalize_handle(handle);
        self.accounts
            .values()
            .find(|a| a.handle.eq_ignore_ascii_case(wanted))
            .map(|a| a.id)
            .ok_or_else(|| ApiError::NotFound(wanted.to_string()))
    }

    async fn follower_ids(&self, id: AccountId) -> Result<Vec<AccountId>, ApiError> {
        Ok(self
            .following
            .iter()
            .filter(|(_, followees)| followees.contains(&id))
            .map(|(follower, _)| *follower)
            .collect())
    }

    async fn friend_ids(&self, id: AccountId) -> Result<Vec<AccountId>, ApiError> {
        if self.failing_friend_lookups.contains(&id) {
            return Err(ApiError::Status {
                endpoint: "friends/ids".to_string(),
                status: 401,
                body: "Not authorized.".to_string(),
            });
        }
        Ok(self.following.get(&id).cloned().unwrap_or_default())
    }

    async fn lookup_users(&self, ids: &[AccountId]) -> Result<Vec<Account>, ApiError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.accounts.get(id).cloned())
            .collect())
    }
}
