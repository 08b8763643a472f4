//! Level 1 and level 2 collection: degree filtering, sampling and the
//! co-follow tally.

pub mod filter;
pub mod sample;
pub mod tally;

use crate::batch::batches;
use crate::error::ApiError;
use crate::graph::SocialGraph;
use crate::model::{Account, AccountId};
use std::collections::HashSet;
use std::num::NonZeroUsize;

/// Drop repeated ids, keeping the first occurrence of each. Cursor pages
/// can overlap when the listing changes mid-crawl.
pub fn distinct_ids(ids: Vec<AccountId>) -> Vec<AccountId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Look up profile metadata for `ids` one batch at a time.
pub async fn lookup_in_batches<G>(
    graph: &G,
    ids: &[AccountId],
    batch_size: NonZeroUsize,
) -> Result<Vec<Account>, ApiError>
where
    G: SocialGraph + ?Sized,
{
    let mut accounts = Vec::with_capacity(ids.len());
    for batch in batches(ids, batch_size) {
        accounts.extend(graph.lookup_users(batch).await?);
    }
    Ok(accounts)
}
