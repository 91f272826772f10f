mod args;

pub use args::Args;

use contributors::api::{RepositoryRef, Result};
use contributors::{catalog, export, Collector};
use github_client::GithubClientBuilder;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub struct Summary {
    pub output: PathBuf,
    pub repositories: usize,
    pub processed: usize,
    pub failed: usize,
    pub found: usize,
    pub unique: usize,
}

/// Collects top contributors of the built-in repository catalog.
pub async fn extract_contributors(args: Args) -> Result<Summary> {
    extract_contributors_from(args, catalog()).await
}

/// Collects top contributors of `repos` and writes them to the output file.
/// Only a failing output write is reported as an error, failing requests are logged and skipped.
pub async fn extract_contributors_from(args: Args, repos: Vec<RepositoryRef>) -> Result<Summary> {
    let repos = args.repository_filter().apply(repos);
    let output = args.output_path();
    let format = args.format;
    let checkpoint = args.checkpoint;
    let pacing = args.pacing();
    info!("Processing {} repositories", repos.len());
    info!("Getting top {} contributors per repository", args.max_contributors);
    info!("Output will be saved to {}", output.display());

    let mut client = GithubClientBuilder::default()
        .with_github_url(&args.api_url)
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_retry_policy(args.retry_policy());
    if let Some(token) = args.api_token {
        client = client.try_with_token(token)?;
    }
    let client = client.build().await?;

    let collector = Collector::new(client, args.max_contributors)
        .with_bots(args.include_bots)
        .with_pacing(pacing);
    let collection = collector
        .collect(&repos, |records| {
            if checkpoint {
                export::save(format, &output, records)?;
            }
            Ok(())
        })
        .await?;
    export::save(format, &output, &collection.records)?;

    info!("Successfully processed: {} repositories", collection.processed);
    info!("Failed to process: {} repositories", collection.failed);
    info!("Skipped profiles: {}", collection.skipped_profiles);
    info!("Total contributors found: {}", collection.found);
    info!("Duplicates skipped: {}", collection.duplicates());
    info!("Unique contributors: {}", collection.records.len());

    Ok(Summary {
        output,
        repositories: repos.len(),
        processed: collection.processed,
        failed: collection.failed,
        found: collection.found,
        unique: collection.records.len(),
    })
}
