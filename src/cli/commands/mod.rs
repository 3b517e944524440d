//! CLI command implementations.

pub mod check;
pub mod layout;
pub mod reconcile;
pub mod sweep;
