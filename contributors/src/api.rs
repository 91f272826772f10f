use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use derive_more::{Constructor, Display};
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error: {0}")]
    Error(&'static str),
    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Rate limited on {url}, reset in {wait_secs} sec")]
    RateLimited { url: String, wait_secs: u64 },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Repository taken from the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Constructor, Display)]
#[display(fmt = "{}/{}", owner, name)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    /// Human readable project name, reported in the `project_name` column.
    pub project: String,
}

impl RepositoryRef {
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    User,
    Bot,
    Organization,
    Other,
}

impl From<&str> for AccountType {
    fn from(value: &str) -> Self {
        match value {
            "User" => AccountType::User,
            "Bot" => AccountType::Bot,
            "Organization" => AccountType::Organization,
            _ => AccountType::Other,
        }
    }
}

/// Entry of a repository contributors listing.
#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct Contributor {
    pub login: String,
    pub contributions: u32,
    pub account_type: AccountType,
}

/// Public user profile. Free text `bio` is not carried on purpose, it breaks row alignment of flat exports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub login: String,
    pub html_url: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub twitter_username: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One output row. Field order is the column order of every export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorRecord {
    pub project_name: String,
    pub project_url: String,
    pub username: String,
    pub profile_url: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub contributions: u32,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
    #[serde(serialize_with = "serialize_timestamp")]
    pub account_created: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ContributorRecord {
    pub const COLUMNS: [&'static str; 16] = [
        "project_name",
        "project_url",
        "username",
        "profile_url",
        "name",
        "email",
        "twitter",
        "website",
        "location",
        "company",
        "contributions",
        "followers",
        "following",
        "public_repos",
        "account_created",
        "last_updated",
    ];

    pub fn merge(repo: &RepositoryRef, contributor: &Contributor, profile: Profile) -> Self {
        let profile_url = non_blank(profile.html_url)
            .unwrap_or_else(|| format!("https://github.com/{}", contributor.login));
        ContributorRecord {
            project_name: repo.project.clone(),
            project_url: repo.url(),
            username: contributor.login.clone(),
            profile_url,
            name: non_blank(profile.name),
            email: non_blank(profile.email),
            twitter: non_blank(profile.twitter_username),
            website: non_blank(profile.blog),
            location: non_blank(profile.location),
            company: non_blank(profile.company),
            contributions: contributor.contributions,
            followers: profile.followers,
            following: profile.following,
            public_repos: profile.public_repos,
            account_created: profile.created_at,
            last_updated: profile.updated_at,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// RFC 3339 in UTC with second precision, e.g. `2011-01-25T18:44:36Z`.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn serialize_timestamp<S>(time: &Option<DateTime<Utc>>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match time {
        Some(time) => serializer.serialize_str(&format_timestamp(time)),
        None => serializer.serialize_none(),
    }
}

#[async_trait]
pub trait Client: Send + Sync {
    /// Contributors of `repo` in the order the API ranks them, at most `per_page` of them.
    async fn top_contributors(&self, repo: &RepositoryRef, per_page: u32) -> Result<Vec<Contributor>>;

    async fn profile(&self, login: &str) -> Result<Profile>;
}

#[test]
fn merge_test() {
    let repo = RepositoryRef::new("ethereum".into(), "go-ethereum".into(), "Ethereum (Geth)".into());
    let contributor = Contributor::new("karalabe".into(), 42, AccountType::User);
    let profile = Profile {
        login: "karalabe".into(),
        name: Some("Péter Szilágyi".into()),
        blog: Some("".into()),
        company: Some("  ".into()),
        followers: 7,
        ..Profile::default()
    };
    let record = ContributorRecord::merge(&repo, &contributor, profile);
    assert_eq!(record.project_name, "Ethereum (Geth)");
    assert_eq!(record.project_url, "https://github.com/ethereum/go-ethereum");
    assert_eq!(record.profile_url, "https://github.com/karalabe");
    assert_eq!(record.name.as_deref(), Some("Péter Szilágyi"));
    assert_eq!(record.website, None);
    assert_eq!(record.company, None);
    assert_eq!(record.contributions, 42);
    assert_eq!(record.followers, 7);
}

#[test]
fn account_type_test() {
    assert_eq!(AccountType::from("User"), AccountType::User);
    assert_eq!(AccountType::from("Bot"), AccountType::Bot);
    assert_eq!(AccountType::from("Mannequin"), AccountType::Other);
}
