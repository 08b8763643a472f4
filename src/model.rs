use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque numeric account identifier as issued by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AccountId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Profile snapshot returned by a metadata lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub handle: String,
    pub followers_count: u64,
    pub following_count: u64,
    pub description: String,
    pub website: Option<String>,
}

/// An account that passed the co-follow threshold, with its overlap figures.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAccount {
    pub account: Account,
    pub common_followers: u32,
    pub similarity_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&AccountId(42)).unwrap();
        assert_eq!(json, "42");
        let back: AccountId = serde_json::from_str("7").unwrap();
        assert_eq!(back, AccountId(7));
    }

    #[test]
    fn test_account_id_display() {
        assert_eq!(AccountId(1234567890).to_string(), "1234567890");
    }
}
