use crate::checkpoint;
use crate::config::Config;
use crate::crawl::filter::filter_by_degree;
use crate::crawl::{distinct_ids, lookup_in_batches};
use crate::crawl::sample::{sample_accounts, sampling_rng};
use crate::crawl::tally::{build_tally, CoFollowTally, TallyOutcome};
use crate::error::{ApiError, PipelineError};
use crate::graph::SocialGraph;
use crate::model::AccountId;
use crate::report;
use crate::scoring::{Scorer, ScoringOutcome};

#[derive(Debug)]
pub struct CrawlReport {
    pub seed: AccountId,
    pub level1: usize,
    pub degree_filtered: usize,
    pub sampled: usize,
    pub outcome: TallyOutcome,
}

#[derive(Debug)]
pub struct ScoreReport {
    /// Tally entries at or above the threshold.
    pub candidates: usize,
    pub sample_base: u32,
    pub outcome: ScoringOutcome,
}

#[derive(Debug)]
pub struct RunReport {
    pub crawl: CrawlReport,
    pub score: ScoreReport,
    pub rows_written: usize,
}

pub struct Pipeline<'a, G: SocialGraph + ?Sized> {
    graph: &'a G,
    config: &'a Config,
}

impl<'a, G: SocialGraph + ?Sized> Pipeline<'a, G> {
    pub fn new(graph: &'a G, config: &'a Config) -> Self {
        Self { graph, config }
    }

    /// Seed resolution through the level 2 tally.
    pub async fn crawl(&self, seed_handle: &str) -> Result<CrawlReport, ApiError> {
        let crawl = &self.config.crawl;

        let seed = self.graph.resolve_handle(seed_handle).await?;
        tracing::info!(handle = seed_handle, %seed, "resolved seed account");

        let fetched = self.graph.follower_ids(seed).await?;
        let fetched_len = fetched.len();
        let level1 = distinct_ids(fetched);
        tracing::info!(
            followers = level1.len(),
            repeated = fetched_len - level1.len(),
            "collected level 1 followers"
        );

        let profiles = lookup_in_batches(self.graph, &level1, crawl.batch_size()).await?;
        let filtered: Vec<AccountId> = filter_by_degree(&profiles, crawl.degree_range())
            .map(|a| a.id)
            .collect();
        tracing::info!(
            looked_up = profiles.len(),
            kept = filtered.len(),
            min_following = crawl.min_following,
            max_following = crawl.max_following,
            "applied degree filter"
        );

        if filtered.len() < crawl.sample_size {
            tracing::warn!(
                available = filtered.len(),
                requested = crawl.sample_size,
                "fewer followers than the sample size, using all of them"
            );
        }
        let mut rng = sampling_rng(crawl.rng_seed);
        let sample = sample_accounts(&filtered, crawl.sample_size, &mut rng);

        let outcome = build_tally(self.graph, &sample).await;

        Ok(CrawlReport {
            seed,
            level1: level1.len(),
            degree_filtered: filtered.len(),
            sampled: sample.len(),
            outcome,
        })
    }

    /// Threshold the tally, look up the survivors and score them.
    pub async fn score(&self, tally: &CoFollowTally) -> Result<ScoreReport, ApiError> {
        let scoring = &self.config.scoring;
        let sample_base = self.sample_base(tally);

        let candidates = tally.at_or_above(scoring.min_common_followers);
        tracing::info!(
            candidates = candidates.len(),
            min_common_followers = scoring.min_common_followers,
            "applied co-follow threshold"
        );

        let accounts =
            lookup_in_batches(self.graph, &candidates, self.config.crawl.batch_size()).await?;
        if accounts.len() < candidates.len() {
            tracing::info!(
                missing = candidates.len() - accounts.len(),
                "some candidate accounts were not returned by lookup"
            );
        }

        let outcome = Scorer::new(sample_base, scoring.degree_field).score(tally, accounts);
        tracing::info!(
            scored = outcome.scored.len(),
            skipped = outcome.skipped,
            sample_base,
            "scored candidate accounts"
        );

        Ok(ScoreReport {
            candidates: candidates.len(),
            sample_base,
            outcome,
        })
    }

    /// Full run: crawl, checkpoint, score, report.
    pub async fn run(&self, seed_handle: &str) -> Result<RunReport, PipelineError> {
        let crawl = self.crawl(seed_handle).await?;
        checkpoint::save(&self.config.output.checkpoint_path, &crawl.outcome.tally)?;

        let score = self.score(&crawl.outcome.tally).await?;
        let rows_written =
            report::write_report_file(&self.config.output.report_path, &score.outcome.scored)?;

        Ok(RunReport {
            crawl,
            score,
            rows_written,
        })
    }

    /// Re-score a checkpointed tally without crawling.
    pub async fn rescore(&self, tally: &CoFollowTally) -> Result<ScoreReport, PipelineError> {
        let score = self.score(tally).await?;
        report::write_report_file(&self.config.output.report_path, &score.outcome.scored)?;
        Ok(score)
    }

    fn sample_base(&self, tally: &CoFollowTally) -> u32 {
        match self.config.scoring.sample_base {
            Some(fixed) => {
                if fixed != tally.contributors() {
                    tracing::info!(
                        configured = fixed,
                        contributors = tally.contributors(),
                        "using configured sample base instead of contributing seed count"
                    );
                }
                fixed
            }
            None => tally.contributors(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::memory::MemoryGraph;
    use crate::model::Account;
    use approx::assert_relative_eq;

    const SEED: AccountId = AccountId(1);

    fn account(id: u64, following_count: u64) -> Account {
        Account {
            id: AccountId(id),
            handle: format!("user{}", id),
            followers_count: 1000,
            following_count,
            description: format!("account\t{}", id),
            website: None,
        }
    }

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.crawl.sample_size = 10;
        config.crawl.rng_seed = Some(3);
        config.scoring.min_common_followers = 2;
        config.output.checkpoint_path = dir.join("level2.bin");
        config.output.report_path = dir.join("similar.tsv");
        config
    }

    /// Seed 1 has followers 10..=14. 10..=12 pass the degree filter; 13 follows
    /// too few accounts and 14 too many. Popular account 500 is followed by
    /// 10, 11 and 12; account 600 by 10 and 11; account 700 only by 12.
    fn graph() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph
            .add_account(Account {
                handle: "seed".to_string(),
                ..account(1, 300)
            })
            .add_account(account(10, 30))
            .add_account(account(11, 50))
            .add_account(account(12, 100))
            .add_account(account(13, 24))
            .add_account(account(14, 101))
            .add_account(account(500, 40))
            .add_account(account(600, 60))
            .add_account(account(700, 80));

        for follower in 10..=14 {
            graph.follow(AccountId(follower), SEED);
        }
        for follower in [10, 11, 12, 13, 14] {
            graph.follow(AccountId(follower), AccountId(500));
        }
        graph
            .follow(AccountId(10), AccountId(600))
            .follow(AccountId(11), AccountId(600))
            .follow(AccountId(12), AccountId(700));
        graph
    }

    #[tokio::test]
    async fn test_crawl_filters_and_tallies() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let graph = graph();
        let pipeline = Pipeline::new(&graph, &config);

        let crawl = pipeline.crawl("@seed").await.unwrap();

        assert_eq!(crawl.seed, SEED);
        assert_eq!(crawl.level1, 5);
        assert_eq!(crawl.degree_filtered, 3);
        assert_eq!(crawl.sampled, 3);
        let tally = &crawl.outcome.tally;
        assert_eq!(tally.contributors(), 3);
        assert_eq!(tally.count(AccountId(500)), 3);
        assert_eq!(tally.count(AccountId(600)), 2);
        assert_eq!(tally.count(AccountId(700)), 1);
        // Every sampled follower also follows the seed.
        assert_eq!(tally.count(SEED), 3);
    }

    #[tokio::test]
    async fn test_run_writes_checkpoint_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let graph = graph();
        let pipeline = Pipeline::new(&graph, &config);

        let report = pipeline.run("seed").await.unwrap();

        // Candidates: seed (3), 500 (3), 600 (2); 700 is below the threshold.
        assert_eq!(report.score.candidates, 3);
        assert_eq!(report.score.sample_base, 3);
        assert_eq!(report.rows_written, 3);

        let top = &report.score.outcome.scored[0];
        assert_eq!(top.account.id, AccountId(500));
        assert_relative_eq!(top.similarity_score, 3.0 / (3.0 + 40.0 - 3.0));

        let text = std::fs::read_to_string(&config.output.report_path).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("account 500"));

        let restored = checkpoint::load(&config.output.checkpoint_path).unwrap();
        assert_eq!(restored, report.crawl.outcome.tally);
    }

    #[tokio::test]
    async fn test_sample_base_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.scoring.sample_base = Some(4607);
        let graph = graph();
        let pipeline = Pipeline::new(&graph, &config);

        let mut tally = CoFollowTally::new();
        for _ in 0..5 {
            tally.record_seed([AccountId(700)]);
        }
        let score = pipeline.score(&tally).await.unwrap();

        assert_eq!(score.sample_base, 4607);
        assert_relative_eq!(
            score.outcome.scored[0].similarity_score,
            5.0 / (4607.0 + 80.0 - 5.0)
        );
    }

    #[tokio::test]
    async fn test_rescore_drops_unresolvable_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let graph = graph();
        let pipeline = Pipeline::new(&graph, &config);

        let mut tally = CoFollowTally::new();
        for _ in 0..4 {
            // 999 is not known to the graph, as with a suspended account.
            tally.record_seed([AccountId(600), AccountId(999)]);
        }
        let score = pipeline.rescore(&tally).await.unwrap();

        assert_eq!(score.candidates, 2);
        assert_eq!(score.outcome.scored.len(), 1);
        let text = std::fs::read_to_string(&config.output.report_path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    /// Serves follower pages that overlap, repeating every follower id.
    struct OverlappingPages(MemoryGraph);

    #[async_trait::async_trait]
    impl SocialGraph for OverlappingPages {
        async fn resolve_handle(&self, handle: &str) -> Result<AccountId, ApiError> {
            self.0.resolve_handle(handle).await
        }

        async fn follower_ids(&self, id: AccountId) -> Result<Vec<AccountId>, ApiError> {
            let page = self.0.follower_ids(id).await?;
            Ok(page.iter().chain(page.iter()).copied().collect())
        }

        async fn friend_ids(&self, id: AccountId) -> Result<Vec<AccountId>, ApiError> {
            self.0.friend_ids(id).await
        }

        async fn lookup_users(&self, ids: &[AccountId]) -> Result<Vec<Account>, ApiError> {
            self.0.lookup_users(ids).await
        }
    }

    #[tokio::test]
    async fn test_repeated_followers_counted_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let graph = OverlappingPages(graph());
        let pipeline = Pipeline::new(&graph, &config);

        let crawl = pipeline.crawl("seed").await.unwrap();

        assert_eq!(crawl.level1, 5);
        assert_eq!(crawl.degree_filtered, 3);
        assert_eq!(crawl.sampled, 3);
        assert_eq!(crawl.outcome.tally.contributors(), 3);
        assert_eq!(crawl.outcome.tally.count(AccountId(500)), 3);
        assert_eq!(crawl.outcome.tally.count(AccountId(600)), 2);
    }

    #[tokio::test]
    async fn test_unknown_seed_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let graph = graph();
        let pipeline = Pipeline::new(&graph, &config);

        let err = pipeline.run("@nobody").await.unwrap_err();
        assert!(matches!(err, PipelineError::Api(ApiError::NotFound(_))));
        assert!(!config.output.report_path.exists());
    }
}
