use clap::Parser;
use contributors::export::OutputFormat;
use contributors::{Pacing, RepositoryFilter};
use github_client::RetryPolicy;
use secrecy::SecretString;
use std::{
    fmt::{Debug, Display},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Output file [default: blockchain_contributors.<format>]
    #[clap(short, long, env)]
    pub output: Option<PathBuf>,

    /// Top contributors taken from every repository
    #[clap(short, long, env, default_value_t = 3, parse(try_from_str=max_contributors_in_range))]
    pub max_contributors: u32,

    /// Maximal number of repositories of a single owner
    #[clap(long, env, parse(try_from_str=max_repos_per_owner_in_range))]
    pub max_repos_per_owner: Option<usize>,

    /// Skip owners of chains which are not EVM compatible
    #[clap(long, env)]
    pub evm_only: bool,

    /// Keep bot and organization accounts
    #[clap(long, env)]
    pub include_bots: bool,

    /// Output format: csv or xlsx
    #[clap(short, long, env, default_value = "csv")]
    pub format: OutputFormat,

    /// Rewrite the output file after every repository
    #[clap(long, env)]
    pub checkpoint: bool,

    /// API OAuth access token
    #[clap(short, long, env = "GITHUB_TOKEN")]
    pub api_token: Option<SecretString>,

    /// Repository API URL
    #[clap(long, env, default_value = "https://api.github.com")]
    pub api_url: String,

    /// Pause after every profile request
    #[clap(long, env, default_value_t = 1000)]
    pub profile_delay_ms: u64,

    /// Pause between repositories
    #[clap(long, env, default_value_t = 2000)]
    pub repository_delay_ms: u64,

    /// Tries per request
    #[clap(long, env, default_value_t = 3, parse(try_from_str=max_attempts_in_range))]
    pub max_attempts: u32,

    /// Delay before the first retry, doubled for every next one
    #[clap(long, env, default_value_t = 1000)]
    pub backoff_ms: u64,

    /// Shortest wait after a rate limited response
    #[clap(long, env, default_value_t = 60)]
    pub min_rate_limit_wait_secs: u64,

    /// Requests which would wait longer for the rate limit reset are skipped
    #[clap(long, env, default_value_t = 3600)]
    pub max_rate_limit_wait_secs: u64,

    /// Single request timeout
    #[clap(long, env, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Args {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("blockchain_contributors.{}", self.format.extension())))
    }

    pub fn repository_filter(&self) -> RepositoryFilter {
        RepositoryFilter {
            max_per_owner: self.max_repos_per_owner,
            evm_only: self.evm_only,
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::new(
            Duration::from_millis(self.profile_delay_ms),
            Duration::from_millis(self.repository_delay_ms),
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.backoff_ms),
            Duration::from_secs(self.min_rate_limit_wait_secs),
            Duration::from_secs(self.max_rate_limit_wait_secs),
        )
    }
}

fn max_contributors_in_range(value: &str) -> clap::Result<u32, String> {
    // API page size cap
    number_in_range(value, 1, 100, "max_contributors".to_string())
}

fn max_repos_per_owner_in_range(value: &str) -> clap::Result<usize, String> {
    number_in_range(value, 1, usize::MAX, "max_repos_per_owner".to_string())
}

fn max_attempts_in_range(value: &str) -> clap::Result<u32, String> {
    number_in_range(value, 1, u32::MAX, "max_attempts".to_string())
}

fn number_in_range<T>(value: &str, min: T, max: T, name: String) -> clap::Result<T, String>
where
    T: FromStr + PartialOrd + Display,
    <T as FromStr>::Err: Display,
{
    value.parse::<T>().map_err(|err| format!("{}", err)).and_then(|value| {
        if value < min || value > max {
            return Err(format!("{} is not in range {} .. {}.", name, min, max));
        }
        Ok(value)
    })
}
