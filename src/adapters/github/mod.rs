//! GitHub adapter: GraphQL client, project layout resolution, and the
//! tracker implementing the record and project ports.

pub mod client;
pub mod layout;
mod models;
mod queries;
pub mod tracker;

pub use client::{GitHubClient, RateLimiter, GITHUB_GRAPHQL_URL};
pub use layout::resolve_layout;
pub use tracker::GitHubProjectTracker;
