use chrono::{DateTime, Utc};
use contributors::api;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Contributor {
    pub login: String,
    pub contributions: u32,
    #[serde(rename = "type", default = "user_type")]
    pub account_type: String,
}

fn user_type() -> String {
    "User".to_string()
}

impl From<Contributor> for api::Contributor {
    fn from(contributor: Contributor) -> Self {
        api::Contributor {
            account_type: api::AccountType::from(contributor.account_type.as_str()),
            login: contributor.login,
            contributions: contributor.contributions,
        }
    }
}

/// `GET /users/{username}` body. `bio` is left out.
#[derive(Deserialize, Debug)]
pub struct User {
    pub login: String,
    pub html_url: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub twitter_username: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    #[serde(default)]
    pub public_repos: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for api::Profile {
    fn from(user: User) -> Self {
        api::Profile {
            login: user.login,
            html_url: user.html_url,
            name: user.name,
            email: user.email,
            twitter_username: user.twitter_username,
            blog: user.blog,
            location: user.location,
            company: user.company,
            followers: user.followers,
            following: user.following,
            public_repos: user.public_repos,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct RateLimitBody {
    pub resources: RateLimitResources,
}

#[derive(Deserialize, Debug)]
pub struct RateLimitResources {
    pub core: RateLimitResource,
}

#[derive(Deserialize, Debug)]
pub struct RateLimitResource {
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
}
