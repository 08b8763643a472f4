use cofollow::crawl::tally::build_tally;
use cofollow::graph::memory::MemoryGraph;
use cofollow::{Account, AccountId, Config, Pipeline};

fn account(id: u64, followers_count: u64, following_count: u64) -> Account {
    Account {
        id: AccountId(id),
        handle: format!("user{}", id),
        followers_count,
        following_count,
        description: "CRAN\r\nmaintainer".to_string(),
        website: Some(format!("https://user{}.example", id)),
    }
}

#[tokio::test]
async fn test_failed_seeds_are_reported_and_excluded() {
    let mut graph = MemoryGraph::new();
    let seeds: Vec<AccountId> = (1..=50).map(AccountId).collect();
    for &seed in &seeds {
        graph.follow(seed, AccountId(900));
        if seed.0 % 2 == 0 {
            graph.follow(seed, AccountId(901));
        }
    }
    graph
        .fail_friend_lookup(AccountId(2))
        .fail_friend_lookup(AccountId(3));

    let outcome = build_tally(&graph, &seeds).await;

    assert_eq!(outcome.tally.contributors(), 48);
    assert_eq!(outcome.tally.count(AccountId(900)), 48);
    assert_eq!(outcome.tally.count(AccountId(901)), 24);
    assert_eq!(outcome.failures.len(), 2);
    assert_eq!(outcome.failures[0].seed_id, AccountId(2));
    assert_eq!(outcome.failures[1].seed_id, AccountId(3));
}

#[tokio::test]
async fn test_end_to_end_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.crawl.rng_seed = Some(11);
    config.scoring.min_common_followers = 5;
    config.output.checkpoint_path = dir.path().join("level2.bin");
    config.output.report_path = dir.path().join("similar.tsv");

    let mut graph = MemoryGraph::new();
    graph.add_account(Account {
        handle: "hadleywickham".to_string(),
        ..account(1, 90_000, 300)
    });
    // Followers 10..=29 pass the degree filter; 30..=34 follow too many accounts.
    for id in 10..=34u64 {
        let following = if id < 30 { 50 } else { 500 };
        graph.add_account(account(id, 10, following));
        graph.follow(AccountId(id), AccountId(1));
    }
    graph
        .add_account(account(100, 5000, 95))
        .add_account(account(101, 200, 40));
    for id in 10..=29u64 {
        graph.follow(AccountId(id), AccountId(100));
        if id < 14 {
            // Four co-followers: one short of the threshold.
            graph.follow(AccountId(id), AccountId(101));
        }
    }
    graph.fail_friend_lookup(AccountId(29));

    let report = Pipeline::new(&graph, &config).run("@hadleywickham").await.unwrap();

    assert_eq!(report.crawl.degree_filtered, 20);
    assert_eq!(report.crawl.outcome.failures.len(), 1);
    assert_eq!(report.score.sample_base, 19);
    assert_eq!(report.rows_written, 2);

    let text = std::fs::read_to_string(&config.output.report_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("twitterid\thandle"));

    let first: Vec<&str> = lines[1].split('\t').collect();
    assert_eq!(first.len(), 8);
    assert_eq!(first[0], "100");
    assert_eq!(first[4], "AN maintainer");
    assert_eq!(first[6], "19");
    let score: f64 = first[7].parse().unwrap();
    approx::assert_relative_eq!(score, 19.0 / (19.0 + 95.0 - 19.0));

    assert!(lines[2].starts_with("1\thadleywickham"));
}
