//! Project-state invariant checks.
//!
//! Four pure checks over a freshly fetched [`Record`], evaluated in a fixed
//! order. [`validate`] stops at the first failing check so that exactly one
//! violation, and therefore exactly one repair, comes out of each pass.

use chrono::{DateTime, Duration, Utc};

use crate::domain::models::{ProjectItem, ProjectLayout, Record, StatusClass, Violation};

/// Minimum whole weeks without an update before a cycled record is stale.
pub const STALE_AFTER_WEEKS: i64 = 1;

/// Run every check in order and return the first violation.
///
/// Records flagged with a linked pull request only go through the
/// membership test: they must stay off the main project, so finding one on
/// it is the only possible violation.
pub fn validate(record: &Record, layout: &ProjectLayout, now: DateTime<Utc>) -> Result<(), Violation> {
    if record.has_linked_pull_request {
        return check_linked_membership(record, layout);
    }

    let item = check_membership(record, layout)?;
    let status = check_status(record, item)?;
    check_cycle(record, item, status, layout)?;
    check_staleness(record, item, now)
}

/// A record with a linked pull request must not be in the main project.
pub fn check_linked_membership(record: &Record, layout: &ProjectLayout) -> Result<(), Violation> {
    match record.project_item(&layout.project_id) {
        Some(_) => Err(Violation::LinkedRecord(record.summary())),
        None => Ok(()),
    }
}

/// Every audited record has an item in the main project.
pub fn check_membership<'a>(
    record: &'a Record,
    layout: &ProjectLayout,
) -> Result<&'a ProjectItem, Violation> {
    record
        .project_item(&layout.project_id)
        .ok_or_else(|| Violation::Stray(record.summary()))
}

/// The main-project item always has a status.
pub fn check_status<'a>(record: &Record, item: &'a ProjectItem) -> Result<&'a str, Violation> {
    item.status()
        .ok_or_else(|| Violation::MissingStatus(record.summary()))
}

/// Planned work carries the current cycle; unplanned work carries none.
pub fn check_cycle(
    record: &Record,
    item: &ProjectItem,
    status: &str,
    layout: &ProjectLayout,
) -> Result<(), Violation> {
    match (layout.classify_status(status), item.cycle()) {
        (StatusClass::Planned, None) => Err(Violation::NoCycle(record.summary())),
        (StatusClass::Planned, Some(cycle)) if !layout.is_current_cycle(cycle) => {
            Err(Violation::PreviousCycle(record.summary()))
        }
        (StatusClass::Unplanned, Some(_)) => Err(Violation::UnexpectedCycle(record.summary())),
        _ => Ok(()),
    }
}

/// A cycled record is marked stale exactly when it has gone a whole week
/// without an update. Records without a cycle are never checked.
pub fn check_staleness(
    record: &Record,
    item: &ProjectItem,
    now: DateTime<Utc>,
) -> Result<(), Violation> {
    if item.cycle().is_none() {
        return Ok(());
    }

    let stale = weeks_since(record.updated_at, now) >= STALE_AFTER_WEEKS;
    match (stale, item.is_stale()) {
        (true, false) => Err(Violation::Stale(record.summary())),
        (false, true) => Err(Violation::NotStale(record.summary())),
        _ => Ok(()),
    }
}

/// Whole weeks elapsed between `then` and `now`, rounded down. Negative
/// when `then` lies in the future.
pub fn weeks_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed: Duration = now - then;
    elapsed.num_weeks()
}
