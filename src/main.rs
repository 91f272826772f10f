use clap::Parser;
use contributors::api::Error;
use contributors_app::Args;

/// Collects top contributors of blockchain projects hosted on GitHub into a CSV file.

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let summary = contributors_app::extract_contributors(args).await?;

    println!(
        "Contributor data saved to: {} ({} unique contributors from {} of {} repositories)",
        summary.output.display(),
        summary.unique,
        summary.processed,
        summary.repositories
    );

    Ok(())
}
