//! Adapters implementing the domain ports.

pub mod github;
pub mod memory;

pub use github::GitHubProjectTracker;
pub use memory::InMemoryTracker;
