use crate::crawl::filter::DegreeRange;
use crate::error::ConfigError;
use crate::scoring::DegreeField;
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = "cofollow";
const CONFIG_FILE_NAME: &str = "config.toml";

const ENV_CONSUMER_KEY: &str = "COFOLLOW_CONSUMER_KEY";
const ENV_CONSUMER_SECRET: &str = "COFOLLOW_CONSUMER_SECRET";
const ENV_ACCESS_TOKEN: &str = "COFOLLOW_ACCESS_TOKEN";
const ENV_ACCESS_TOKEN_SECRET: &str = "COFOLLOW_ACCESS_TOKEN_SECRET";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_token_secret: Option<String>,
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &redact(&self.consumer_key))
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field(
                "access_token",
                &self.access_token.as_deref().map(redact),
            )
            .field(
                "access_token_secret",
                &self.access_token_secret.as_deref().map(redact),
            )
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub wait_on_rate_limit: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com".to_string(),
            timeout_secs: 30,
            wait_on_rate_limit: true,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub seed_handle: Option<String>,
    pub min_following: u64,
    pub max_following: u64,
    pub sample_size: usize,
    pub batch_size: usize,
    pub rng_seed: Option<u64>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_handle: None,
            min_following: 25,
            max_following: 100,
            sample_size: 5000,
            batch_size: 100,
            rng_seed: None,
        }
    }
}

impl CrawlConfig {
    pub fn degree_range(&self) -> DegreeRange {
        DegreeRange::new(self.min_following, self.max_following)
    }

    /// Falls back to the lookup limit when unset; `validate` rejects zero first.
    pub fn batch_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.batch_size).unwrap_or(crate::batch::LOOKUP_BATCH_SIZE)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub min_common_followers: u32,
    /// Overrides the number of contributing seeds used as the denominator base.
    pub sample_base: Option<u32>,
    pub degree_field: DegreeField,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_common_followers: 5,
            sample_base: None,
            degree_field: DegreeField::Following,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub checkpoint_path: PathBuf,
    pub report_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: PathBuf::from("cofollow_level2.bin"),
            report_path: PathBuf::from("cofollow_similar.tsv"),
        }
    }
}

impl Config {
    /// `~/.config/cofollow/config.toml` on Linux, the platform equivalent elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from the default location if it exists, then apply
    /// credential overrides from the environment and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Non-empty values returned by `lookup` replace the file's credentials.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_CONSUMER_KEY) {
            self.credentials.consumer_key = v;
        }
        if let Some(v) = get(ENV_CONSUMER_SECRET) {
            self.credentials.consumer_secret = v;
        }
        if let Some(v) = get(ENV_ACCESS_TOKEN) {
            self.credentials.access_token = Some(v);
        }
        if let Some(v) = get(ENV_ACCESS_TOKEN_SECRET) {
            self.credentials.access_token_secret = Some(v);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.consumer_key.trim().is_empty() {
            return Err(ConfigError::MissingField("credentials.consumer_key"));
        }
        if self.credentials.consumer_secret.trim().is_empty() {
            return Err(ConfigError::MissingField("credentials.consumer_secret"));
        }
        let token_set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        if token_set(&self.credentials.access_token)
            != token_set(&self.credentials.access_token_secret)
        {
            return Err(ConfigError::Invalid(
                "access_token and access_token_secret must be supplied together".to_string(),
            ));
        }
        if self.crawl.min_following > self.crawl.max_following {
            return Err(ConfigError::Invalid(format!(
                "min_following ({}) exceeds max_following ({})",
                self.crawl.min_following, self.crawl.max_following
            )));
        }
        if self.crawl.sample_size == 0 {
            return Err(ConfigError::Invalid("sample_size must be positive".to_string()));
        }
        if self.crawl.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be positive".to_string()));
        }
        if self.scoring.sample_base == Some(0) {
            return Err(ConfigError::Invalid("sample_base must be positive".to_string()));
        }
        Ok(())
    }
}
