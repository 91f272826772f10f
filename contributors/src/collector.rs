use crate::api::{AccountType, Client, Contributor, ContributorRecord, RepositoryRef, Result};
use crate::dedup::Deduplicator;
use derive_more::Constructor;
use log::{error, info, warn};
use std::time::Duration;

/// Largest page served by the contributors listing.
const MAX_PAGE_SIZE: u32 = 100;

/// Fixed pauses keeping the request rate under the API limit.
#[derive(Debug, Clone, Copy, PartialEq, Constructor)]
pub struct Pacing {
    /// Pause after every profile request.
    pub profile_delay: Duration,
    /// Pause between two repositories.
    pub repository_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing::new(Duration::from_secs(1), Duration::from_secs(2))
    }
}

/// Outcome of a collection run.
#[derive(Debug, Default)]
pub struct Collection {
    /// Unique contributors in repository order, then API order.
    pub records: Vec<ContributorRecord>,
    /// Repositories whose contributors listing succeeded.
    pub processed: usize,
    /// Repositories skipped because their contributors listing failed.
    pub failed: usize,
    /// Records built, duplicates included.
    pub found: usize,
    /// Profiles which could not be fetched.
    pub skipped_profiles: usize,
}

impl Collection {
    pub fn duplicates(&self) -> usize {
        self.found - self.records.len()
    }
}

pub struct Collector<CLIENT>
where
    CLIENT: Client,
{
    client: CLIENT,
    max_contributors: u32,
    include_bots: bool,
    pacing: Pacing,
}

impl<CLIENT> Collector<CLIENT>
where
    CLIENT: Client,
{
    pub fn new(client: CLIENT, max_contributors: u32) -> Self {
        Collector {
            client,
            max_contributors,
            include_bots: false,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Keeps bot and organization accounts which are dropped by default.
    pub fn with_bots(mut self, include_bots: bool) -> Self {
        self.include_bots = include_bots;
        self
    }

    /// Visits `repos` one by one. A failing repository or profile is logged and skipped.
    ///
    /// # Arguments
    /// * `repos` - Repositories in processing order
    /// * `checkpoint` - Called with the unique records collected so far after every successfully listed repository.
    ///   Its error aborts the run.
    pub async fn collect<F>(&self, repos: &[RepositoryRef], mut checkpoint: F) -> Result<Collection>
    where
        F: FnMut(&[ContributorRecord]) -> Result<()>,
    {
        let mut dedup = Deduplicator::default();
        let mut collection = Collection::default();
        for (index, repo) in repos.iter().enumerate() {
            info!("[{}/{}] Processing {} ({})", index + 1, repos.len(), repo.project, repo);
            match self.repository_records(repo).await {
                Ok((records, skipped_profiles)) => {
                    collection.processed += 1;
                    collection.found += records.len();
                    collection.skipped_profiles += skipped_profiles;
                    let added = records.into_iter().map(|record| dedup.admit(record)).filter(|added| *added).count();
                    info!(
                        "Added {} new contributors from {}, {} unique so far",
                        added,
                        repo.project,
                        dedup.records().len()
                    );
                    checkpoint(dedup.records())?;
                }
                Err(err) => {
                    collection.failed += 1;
                    error!("Skipping {}: failed to get top contributors: {}", repo, err);
                }
            }
            if index + 1 < repos.len() {
                tokio::time::sleep(self.pacing.repository_delay).await;
            }
        }
        collection.records = dedup.into_records();
        Ok(collection)
    }

    /// Returns records of top contributors of `repo` and the number of profiles which could not be fetched.
    async fn repository_records(&self, repo: &RepositoryRef) -> Result<(Vec<ContributorRecord>, usize)> {
        let contributors = self.client.top_contributors(repo, self.page_size()).await?;
        let contributors = take_top(contributors, self.max_contributors, self.include_bots);
        if contributors.is_empty() {
            warn!("No contributors found for {}", repo);
            return Ok((Vec::new(), 0));
        }
        info!(
            "Top contributors of {}: {}",
            repo,
            contributors.iter().map(|c| c.login.as_str()).collect::<Vec<_>>().join(", ")
        );

        let mut records = Vec::with_capacity(contributors.len());
        let mut skipped = 0;
        for (index, contributor) in contributors.iter().enumerate() {
            info!(
                "[{}/{}] Fetching profile of @{}",
                index + 1,
                contributors.len(),
                contributor.login
            );
            match self.client.profile(&contributor.login).await {
                Ok(profile) => {
                    let record = ContributorRecord::merge(repo, contributor, profile);
                    info!(
                        "{} (@{}) - {} contributions",
                        record.name.as_deref().unwrap_or("N/A"),
                        record.username,
                        record.contributions
                    );
                    records.push(record);
                }
                Err(err) => {
                    skipped += 1;
                    warn!("Could not fetch profile of @{}: {}", contributor.login, err);
                }
            }
            tokio::time::sleep(self.pacing.profile_delay).await;
        }
        Ok((records, skipped))
    }

    /// Bots ranked among the top entries are dropped after listing, so a full page is requested to still get N users.
    fn page_size(&self) -> u32 {
        if self.include_bots {
            self.max_contributors
        } else {
            MAX_PAGE_SIZE.max(self.max_contributors)
        }
    }
}

/// First `n` contributors in API order. No sorting, the API already ranks them by contributions.
fn take_top(contributors: Vec<Contributor>, n: u32, include_bots: bool) -> Vec<Contributor> {
    contributors
        .into_iter()
        .filter(|c| include_bots || c.account_type == AccountType::User)
        .take(n as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Error, Profile};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct FakeClient {
        /// `None` answers with HTTP 500.
        contributors: HashMap<String, Option<Vec<Contributor>>>,
        missing_profiles: Vec<String>,
        profile_requests: Mutex<Vec<String>>,
        page_sizes: Mutex<Vec<u32>>,
    }

    impl FakeClient {
        fn with_repo(mut self, name: &str, logins: &[&str]) -> Self {
            let contributors = logins
                .iter()
                .enumerate()
                .map(|(i, login)| user(login, 100 - i as u32))
                .collect();
            self.contributors.insert(name.to_string(), Some(contributors));
            self
        }

        fn with_contributors(mut self, name: &str, contributors: Vec<Contributor>) -> Self {
            self.contributors.insert(name.to_string(), Some(contributors));
            self
        }

        fn with_failing_repo(mut self, name: &str) -> Self {
            self.contributors.insert(name.to_string(), None);
            self
        }

        fn with_missing_profile(mut self, login: &str) -> Self {
            self.missing_profiles.push(login.to_string());
            self
        }
    }

    #[async_trait]
    impl Client for FakeClient {
        async fn top_contributors(&self, repo: &RepositoryRef, per_page: u32) -> Result<Vec<Contributor>> {
            self.page_sizes.lock().unwrap().push(per_page);
            match self.contributors.get(&repo.name) {
                Some(Some(contributors)) => Ok(contributors.iter().take(per_page as usize).cloned().collect()),
                _ => Err(Error::Status {
                    status: 500,
                    url: repo.url(),
                }),
            }
        }

        async fn profile(&self, login: &str) -> Result<Profile> {
            self.profile_requests.lock().unwrap().push(login.to_string());
            if self.missing_profiles.iter().any(|missing| missing == login) {
                return Err(Error::NotFound(login.to_string()));
            }
            Ok(Profile {
                login: login.to_string(),
                name: Some(login.to_uppercase()),
                ..Profile::default()
            })
        }
    }

    fn user(login: &str, contributions: u32) -> Contributor {
        Contributor::new(login.to_string(), contributions, AccountType::User)
    }

    fn repos(names: &[&str]) -> Vec<RepositoryRef> {
        names
            .iter()
            .map(|name| RepositoryRef::new("owner".to_string(), name.to_string(), name.to_uppercase()))
            .collect()
    }

    fn usernames(collection: &Collection) -> Vec<&str> {
        collection.records.iter().map(|r| r.username.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn duplicates_across_repositories_test() {
        let client = FakeClient::default().with_repo("r1", &["a", "b"]).with_repo("r2", &["a"]);
        let collector = Collector::new(client, 3);

        let collection = collector.collect(&repos(&["r1", "r2"]), |_| Ok(())).await.unwrap();

        assert_eq!(usernames(&collection), vec!["a", "b"]);
        assert_eq!(collection.records[0].project_name, "R1");
        assert_eq!(collection.found, 3);
        assert_eq!(collection.duplicates(), 1);
        assert_eq!(collection.processed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_repository_is_skipped_test() {
        let client = FakeClient::default()
            .with_repo("r1", &["a"])
            .with_failing_repo("r2")
            .with_repo("r3", &["c"]);
        let collector = Collector::new(client, 3);

        let collection = collector.collect(&repos(&["r1", "r2", "r3"]), |_| Ok(())).await.unwrap();

        assert_eq!(usernames(&collection), vec!["a", "c"]);
        assert_eq!(collection.processed, 2);
        assert_eq!(collection.failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_profile_is_skipped_test() {
        let client = FakeClient::default()
            .with_repo("r1", &["a", "ghost", "b"])
            .with_missing_profile("ghost");
        let collector = Collector::new(client, 3);

        let collection = collector.collect(&repos(&["r1"]), |_| Ok(())).await.unwrap();

        assert_eq!(usernames(&collection), vec!["a", "b"]);
        assert_eq!(collection.skipped_profiles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn max_contributors_per_repository_test() {
        let client = FakeClient::default().with_repo("r1", &["a", "b", "c", "d", "e"]);
        let collector = Collector::new(client, 2);

        let collection = collector.collect(&repos(&["r1"]), |_| Ok(())).await.unwrap();

        assert_eq!(usernames(&collection), vec!["a", "b"]);
        assert_eq!(*collector.client.profile_requests.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn bots_are_dropped_by_default_test() {
        let contributors = vec![
            Contributor::new("dependabot[bot]".to_string(), 500, AccountType::Bot),
            user("a", 100),
            user("b", 50),
        ];
        let client = FakeClient::default().with_contributors("r1", contributors.clone());
        let collection = Collector::new(client, 2)
            .collect(&repos(&["r1"]), |_| Ok(()))
            .await
            .unwrap();
        assert_eq!(usernames(&collection), vec!["a", "b"]);

        let client = FakeClient::default().with_contributors("r1", contributors);
        let collection = Collector::new(client, 2)
            .with_bots(true)
            .collect(&repos(&["r1"]), |_| Ok(()))
            .await
            .unwrap();
        assert_eq!(usernames(&collection), vec!["dependabot[bot]", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn bot_in_top_page_does_not_shrink_result_test() {
        let contributors = vec![
            user("a", 100),
            Contributor::new("github-actions[bot]".to_string(), 90, AccountType::Bot),
            user("b", 80),
            user("c", 70),
            user("d", 60),
        ];
        let collector = Collector::new(FakeClient::default().with_contributors("r1", contributors.clone()), 3);
        let collection = collector.collect(&repos(&["r1"]), |_| Ok(())).await.unwrap();
        assert_eq!(usernames(&collection), vec!["a", "b", "c"]);
        assert_eq!(*collector.client.page_sizes.lock().unwrap(), vec![MAX_PAGE_SIZE]);

        let collector = Collector::new(FakeClient::default().with_contributors("r1", contributors), 3).with_bots(true);
        let collection = collector.collect(&repos(&["r1"]), |_| Ok(())).await.unwrap();
        assert_eq!(usernames(&collection), vec!["a", "github-actions[bot]", "b"]);
        assert_eq!(*collector.client.page_sizes.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_test() {
        let client = FakeClient::default().with_repo("r1", &["a", "b"]).with_repo("r2", &["c", "d"]);
        let collector = Collector::new(client, 2);

        let start = Instant::now();
        collector.collect(&repos(&["r1", "r2"]), |_| Ok(())).await.unwrap();

        // 4 profile pauses and a single pause between the two repositories
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(7), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoint_test() {
        let client = FakeClient::default()
            .with_repo("r1", &["a"])
            .with_failing_repo("r2")
            .with_repo("r3", &["a", "b"]);
        let collector = Collector::new(client, 3).with_pacing(Pacing::new(Duration::ZERO, Duration::ZERO));

        let mut snapshots = Vec::new();
        collector
            .collect(&repos(&["r1", "r2", "r3"]), |records| {
                snapshots.push(records.len());
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(snapshots, vec![1, 2]);

        let failed = collector
            .collect(&repos(&["r1"]), |_| Err(Error::Error("disk full")))
            .await;
        assert!(matches!(failed, Err(Error::Error("disk full"))));
    }
}
