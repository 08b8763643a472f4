use crate::error::FetchError;
use crate::graph::SocialGraph;
use crate::model::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How many sampled seeds follow each account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoFollowTally {
    counts: HashMap<AccountId, u32>,
    contributors: u32,
}

impl CoFollowTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one seed's following set. Repeated ids inside the set count once.
    pub fn record_seed<I>(&mut self, following: I)
    where
        I: IntoIterator<Item = AccountId>,
    {
        let distinct: HashSet<AccountId> = following.into_iter().collect();
        for id in distinct {
            *self.counts.entry(id).or_insert(0) += 1;
        }
        self.contributors += 1;
    }

    pub fn count(&self, id: AccountId) -> u32 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// Seeds whose following set was recorded.
    pub fn contributors(&self) -> u32 {
        self.contributors
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Ids followed by at least `threshold` seeds, in ascending id order.
    pub fn at_or_above(&self, threshold: u32) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self
            .counts
            .iter()
            .filter(|&(_, &count)| count >= threshold)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Debug)]
pub struct TallyOutcome {
    pub tally: CoFollowTally,
    pub failures: Vec<FetchError>,
}

/// Fetch each seed's following set and tally it. A failed lookup is logged,
/// recorded and skipped; the remaining seeds still contribute.
pub async fn build_tally<G>(graph: &G, seeds: &[AccountId]) -> TallyOutcome
where
    G: SocialGraph + ?Sized,
{
    let mut tally = CoFollowTally::new();
    let mut failures = Vec::new();

    for (index, &seed) in seeds.iter().enumerate() {
        match graph.friend_ids(seed).await {
            Ok(following) => {
                tracing::debug!(
                    seed = %seed,
                    following = following.len(),
                    progress = index + 1,
                    total = seeds.len(),
                    "tallied seed"
                );
                tally.record_seed(following);
            }
            Err(cause) => {
                tracing::warn!(seed = %seed, error = %cause, "skipping seed");
                failures.push(FetchError {
                    seed_id: seed,
                    cause,
                });
            }
        }
    }

    tracing::info!(
        contributors = tally.contributors(),
        failed = failures.len(),
        accounts = tally.len(),
        "level 2 tally complete"
    );

    TallyOutcome { tally, failures }
}
