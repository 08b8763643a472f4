use crate::crawl::tally::CoFollowTally;
use crate::model::{Account, ScoredAccount};
use serde::Deserialize;
use std::cmp::Ordering;

/// Which degree of the candidate account enters the denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegreeField {
    #[default]
    Following,
    Followers,
}

impl DegreeField {
    fn of(self, account: &Account) -> u64 {
        match self {
            DegreeField::Following => account.following_count,
            DegreeField::Followers => account.followers_count,
        }
    }
}

/// `common / (sample_base + degree - common)`, or `None` when the
/// denominator is not positive.
pub fn similarity(common_followers: u32, sample_base: u32, degree: u64) -> Option<f64> {
    let denominator =
        i128::from(sample_base) + i128::from(degree) - i128::from(common_followers);
    if denominator <= 0 {
        return None;
    }
    Some(f64::from(common_followers) / denominator as f64)
}

#[derive(Debug, Default)]
pub struct ScoringOutcome {
    pub scored: Vec<ScoredAccount>,
    /// Accounts dropped because their denominator was zero or negative.
    pub skipped: usize,
}

pub struct Scorer {
    pub sample_base: u32,
    pub degree_field: DegreeField,
}

impl Scorer {
    pub fn new(sample_base: u32, degree_field: DegreeField) -> Self {
        Self {
            sample_base,
            degree_field,
        }
    }

    /// Score every looked-up account against its tally count. The result is
    /// ordered by descending score, then ascending id.
    pub fn score(&self, tally: &CoFollowTally, accounts: Vec<Account>) -> ScoringOutcome {
        let mut outcome = ScoringOutcome::default();

        for account in accounts {
            let common_followers = tally.count(account.id);
            let degree = self.degree_field.of(&account);
            match similarity(common_followers, self.sample_base, degree) {
                Some(similarity_score) => outcome.scored.push(ScoredAccount {
                    account,
                    common_followers,
                    similarity_score,
                }),
                None => {
                    tracing::warn!(
                        account = %account.id,
                        common_followers,
                        degree,
                        sample_base = self.sample_base,
                        "non-positive similarity denominator, skipping"
                    );
                    outcome.skipped += 1;
                }
            }
        }

        outcome.scored.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.account.id.cmp(&b.account.id))
        });
        outcome
    }
}
