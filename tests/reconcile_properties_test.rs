//! Reconciliation loop behaviour against the in-memory tracker.

mod common;

use common::*;
use shepherd::adapters::memory::Mutation;
use shepherd::{
    DomainError, ProjectField, ReconcileOutcome, ReconcilePolicy, Repair, Violation,
};

fn repair_names(report: &shepherd::ReconcileReport) -> Vec<&'static str> {
    report.repairs.iter().map(|r| r.repair.name()).collect()
}

#[tokio::test]
async fn stray_record_is_added_and_triaged() {
    let tracker = tracker_with([issue("I_1")]).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(report.outcome, ReconcileOutcome::Consistent);
    assert_eq!(repair_names(&report), vec!["add_to_project", "set_triage"]);
    let stored = tracker.record("I_1").await.unwrap();
    assert_eq!(stored.project_items.len(), 1);
    assert_eq!(stored.project_items[0].status(), Some("opt_triage"));
}

#[tokio::test]
async fn linked_record_is_removed_without_refetch() {
    let mut record = tracked_issue("I_1", &[(ProjectField::Status, status("opt_todo"))]);
    record.has_linked_pull_request = true;
    let tracker = tracker_with([record]).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(report.outcome, ReconcileOutcome::Removed);
    assert_eq!(tracker.fetch_count(), 1, "removal must not be followed by a read");
    assert_eq!(
        tracker.mutations().await,
        vec![Mutation::Remove {
            item_id: "PVTI_I_1".into()
        }]
    );
    assert!(tracker.record("I_1").await.unwrap().project_items.is_empty());
}

#[tokio::test]
async fn linked_record_off_the_project_is_left_alone() {
    let mut record = issue("I_1");
    record.has_linked_pull_request = true;
    let tracker = tracker_with([record]).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(report.outcome, ReconcileOutcome::Consistent);
    assert!(tracker.mutations().await.is_empty());
}

#[tokio::test]
async fn forced_linked_branch_skips_field_checks() {
    let tracker = tracker_with([tracked_issue("I_1", &[])]).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_linked_by_id("I_1").await.unwrap();

    assert_eq!(report.outcome, ReconcileOutcome::Removed);
    assert!(matches!(report.repairs[0].violation, Violation::LinkedRecord(_)));
}

#[tokio::test]
async fn planned_record_without_cycle_gets_current_cycle() {
    let tracker =
        tracker_with([tracked_issue("I_1", &[(ProjectField::Status, status("opt_todo"))])]).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(repair_names(&report), vec!["set_current_cycle"]);
    let stored = tracker.record("I_1").await.unwrap();
    assert_eq!(stored.project_items[0].cycle(), Some("it_current"));
}

#[tokio::test]
async fn previous_cycle_rolls_over_and_counts() {
    let tracker = tracker_with([tracked_issue(
        "I_1",
        &[
            (ProjectField::Status, status("opt_in_progress")),
            (ProjectField::Cycle, cycle("it_previous")),
            (ProjectField::Rollovers, shepherd::FieldValue::Number(2.0)),
        ],
    )])
    .await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(
        report.repairs[0].repair,
        Repair::RollOver {
            item_id: "PVTI_I_1".into(),
            rollovers: 3
        }
    );
    let item = &tracker.record("I_1").await.unwrap().project_items[0];
    assert_eq!(item.cycle(), Some("it_current"));
    assert_eq!(item.rollovers(), 3);
}

#[tokio::test]
async fn first_rollover_starts_counter_at_one() {
    let tracker = tracker_with([tracked_issue(
        "I_1",
        &[
            (ProjectField::Status, status("opt_todo")),
            (ProjectField::Cycle, cycle("it_previous")),
        ],
    )])
    .await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    reconciler.reconcile_by_id("I_1").await.unwrap();

    let item = &tracker.record("I_1").await.unwrap().project_items[0];
    assert_eq!(item.rollovers(), 1);
}

#[tokio::test]
async fn unplanned_record_loses_its_cycle() {
    let tracker = tracker_with([tracked_issue(
        "I_1",
        &[
            (ProjectField::Status, status("opt_backlog")),
            (ProjectField::Cycle, cycle("it_current")),
        ],
    )])
    .await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(repair_names(&report), vec!["clear_cycle"]);
    assert!(tracker.record("I_1").await.unwrap().project_items[0].cycle().is_none());
}

#[tokio::test]
async fn idle_record_is_marked_stale() {
    let mut record = tracked_issue(
        "I_1",
        &[
            (ProjectField::Status, status("opt_in_progress")),
            (ProjectField::Cycle, cycle("it_current")),
        ],
    );
    record.updated_at = days_ago(14);
    let tracker = tracker_with([record]).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(repair_names(&report), vec!["mark_stale"]);
    assert!(tracker.record("I_1").await.unwrap().project_items[0].is_stale());
}

#[tokio::test]
async fn active_record_loses_stale_flag() {
    let tracker = tracker_with([tracked_issue(
        "I_1",
        &[
            (ProjectField::Status, status("opt_todo")),
            (ProjectField::Cycle, cycle("it_current")),
            (ProjectField::Stale, status("opt_stale")),
        ],
    )])
    .await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(repair_names(&report), vec!["clear_stale"]);
    assert!(!tracker.record("I_1").await.unwrap().project_items[0].is_stale());
}

#[tokio::test]
async fn six_days_idle_is_not_stale() {
    let mut record = tracked_issue(
        "I_1",
        &[
            (ProjectField::Status, status("opt_todo")),
            (ProjectField::Cycle, cycle("it_current")),
        ],
    );
    record.updated_at = days_ago(6);
    let tracker = tracker_with([record]).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert!(report.repairs.is_empty());
}

#[tokio::test]
async fn second_run_is_a_fixed_point() {
    let mut record = issue("I_1");
    record.updated_at = days_ago(30);
    let tracker = tracker_with([record]).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let first = reconciler.reconcile_by_id("I_1").await.unwrap();
    assert!(first.repaired());
    tracker.clear_mutations().await;

    let second = reconciler.reconcile_by_id("I_1").await.unwrap();
    assert_eq!(second.outcome, ReconcileOutcome::Consistent);
    assert!(second.repairs.is_empty());
    assert_eq!(second.passes, 1);
    assert!(tracker.mutations().await.is_empty());
}

#[tokio::test]
async fn one_action_per_pass() {
    let tracker = tracker_with([issue("I_1")]).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    // add, refetch, set status, refetch, clean pass
    assert_eq!(report.passes, 3);
    assert_eq!(tracker.mutations().await.len(), report.repairs.len());
    assert_eq!(tracker.fetch_count(), 3);
}

#[tokio::test]
async fn repair_that_never_sticks_is_non_converging() {
    let tracker = tracker_with([tracked_issue("I_1", &[])]).await;
    tracker.ignore_field(ProjectField::Status).await;
    let reconciler = reconciler(
        &tracker,
        ReconcilePolicy {
            max_attempts: 3,
            dry_run: false,
        },
    );

    let err = reconciler.reconcile_by_id("I_1").await.unwrap_err();

    match err {
        DomainError::NonConverging { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, Violation::MissingStatus(_)));
        }
        other => panic!("Expected NonConverging, got: {other:?}"),
    }
    assert_eq!(tracker.mutations().await.len(), 3);
}

#[tokio::test]
async fn failed_refetch_propagates() {
    let record = issue("I_1");
    let tracker = tracker_with([record.clone()]).await;
    tracker.fail_record("I_1").await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let err = reconciler.reconcile(record).await.unwrap_err();

    assert!(matches!(err, DomainError::ExecutionFailed(_)));
    assert_eq!(tracker.mutations().await.len(), 1, "the add ran before the read failed");
}

#[tokio::test]
async fn unknown_record_is_not_found() {
    let tracker = tracker_with(Vec::<shepherd::Record>::new()).await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let err = reconciler.reconcile_by_id("I_missing").await.unwrap_err();

    assert!(matches!(err, DomainError::RecordNotFound(id) if id == "I_missing"));
}

#[tokio::test]
async fn dry_run_plans_without_writing() {
    let tracker = tracker_with([issue("I_1")]).await;
    let reconciler = reconciler(
        &tracker,
        ReconcilePolicy {
            dry_run: true,
            ..Default::default()
        },
    );

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(report.outcome, ReconcileOutcome::Planned);
    assert_eq!(repair_names(&report), vec!["add_to_project"]);
    assert!(!report.repaired());
    assert!(tracker.mutations().await.is_empty());
}

#[tokio::test]
async fn done_status_is_unconstrained() {
    let tracker = tracker_with([tracked_issue(
        "I_1",
        &[
            (ProjectField::Status, status("opt_done")),
            (ProjectField::Cycle, cycle("it_previous")),
        ],
    )])
    .await;
    let reconciler = reconciler(&tracker, ReconcilePolicy::default());

    let report = reconciler.reconcile_by_id("I_1").await.unwrap();

    assert_eq!(report.outcome, ReconcileOutcome::Consistent);
    assert!(tracker.mutations().await.is_empty());
}
