//! Top contributors extraction
//!
//! # Overview
//!
//! Library collects profiles of the most active contributors of a fixed catalog of GitHub repositories.
//! For each repository it fetches the first `max_contributors` contributors (in the order the API ranks them by contribution count),
//! then fetches every contributor's public profile and merges both into a single `ContributorRecord`.
//! A contributor who shows up in more than one repository is kept only once, attributed to the first repository it was found in.
//! The resulting table is written as CSV or as an Excel workbook.
//!
//! Requests are issued one at a time with fixed pauses in between, since the bottleneck is the API rate limit
//! (60 requests per hour without a token, 5000 with one).

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "collector")]
pub mod collector;
#[cfg(feature = "collector")]
mod dedup;
#[cfg(feature = "export")]
pub mod export;
#[cfg(feature = "collector")]
pub mod repos;

#[cfg(feature = "collector")]
pub use collector::{Collection, Collector, Pacing};
#[cfg(feature = "collector")]
pub use repos::{catalog, RepositoryFilter};
