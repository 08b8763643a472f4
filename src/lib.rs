//! Sample the follower network of a seed account, tally which accounts the
//! sampled followers co-follow, and rank those accounts by a Jaccard-style
//! similarity to the seed's audience.

pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod crawl;
pub mod error;
pub mod graph;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod scoring;

pub use config::Config;
pub use error::{ApiError, FetchError, PipelineError};
pub use graph::SocialGraph;
pub use model::{Account, AccountId, ScoredAccount};
pub use pipeline::Pipeline;
