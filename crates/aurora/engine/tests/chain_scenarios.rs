//! End-to-end chain scenarios over the local dispatcher and mock cloud.

mod support;

use aurora_engine::ports::SnapshotScope;
use aurora_state::StateStore;
use aurora_types::{OperationId, StepEvent, StepName, StepRecord};
use support::*;

fn event(value: serde_json::Value) -> StepEvent {
    serde_json::from_value(value).unwrap()
}

fn op_of(response: &aurora_types::StepResponse) -> OperationId {
    response.body.operation_id.clone()
}

/// Steps in chain order, polling repeats collapsed.
fn collapsed_steps(records: &[StepRecord]) -> Vec<StepName> {
    let mut steps: Vec<StepName> = Vec::new();
    for record in records {
        if steps.last() != Some(&record.step) {
            steps.push(record.step);
        }
    }
    steps
}

#[tokio::test(start_paused = true)]
async fn test_happy_path_cross_region() {
    let mut h = harness();
    h.cloud
        .seed_snapshot(SOURCE_REGION, SNAPSHOT_NAME, SnapshotScope::Shared, &["available"]);
    // A stale target cluster that must be torn down first.
    h.cloud.seed_cluster(TARGET_REGION, TARGET_CLUSTER, &["available"]);

    let response = h
        .runner
        .execute(StepName::SnapshotCheck, event(entry_event(SOURCE_REGION, TARGET_REGION)))
        .await;
    assert_eq!(response.status_code, 200);
    let op = op_of(&response);

    let responses = h.worker.drive(&h.runner).await;
    assert!(responses.iter().all(|r| r.body.success), "no step may fail");

    let records = h.state.records_for(&op);
    assert!(records.len() >= 11, "expected >= 11 records, got {}", records.len());
    assert_eq!(
        collapsed_steps(&records),
        vec![
            StepName::SnapshotCheck,
            StepName::CopySnapshot,
            StepName::CheckCopyStatus,
            StepName::DeleteRds,
            StepName::CheckDeleteStatus,
            StepName::RestoreSnapshot,
            StepName::CheckRestoreStatus,
            StepName::SetupDbUsers,
            StepName::VerifyRestore,
            StepName::ArchiveSnapshot,
            StepName::SnsNotification,
        ]
    );

    let terminal = records.last().unwrap();
    assert_eq!(terminal.step, StepName::SnsNotification);
    assert!(terminal.success);
    assert_eq!(terminal.str_field("archive_status"), Some("deleted"));
    assert!(terminal
        .str_field("cluster_endpoint")
        .is_some_and(|endpoint| endpoint.contains(TARGET_CLUSTER)));

    // The copy was archived and operators were notified.
    assert_eq!(
        h.cloud.deleted_snapshots(),
        vec![format!("{SNAPSHOT_NAME}-copy")]
    );
    let messages = h.notifier.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, TOPIC_ARN);
    assert_eq!(messages[0].1, format!("Aurora Restore Complete - {TARGET_CLUSTER}"));
    let body: serde_json::Value = serde_json::from_str(&messages[0].2).unwrap();
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["cluster_id"], TARGET_CLUSTER);
    assert_eq!(body["archive_status"], "deleted");
    drop(messages);

    // Roles were provisioned and the restore verified exactly once.
    assert_eq!(h.database.provisioned.lock().unwrap().len(), 1);
    assert_eq!(h.database.verified.lock().unwrap().len(), 1);

    // Step metrics were emitted under the operation's dimensions.
    assert_eq!(h.metrics.total("snapshot_check_completed"), 1.0);
    assert_eq!(h.metrics.total("sns_notification_completed"), 1.0);
    assert!(h.metrics.total("snapshot_check_duration") >= 0.0);

    // Every audit event corresponds to a persisted record for its step.
    for audit in h.audit.events() {
        assert_eq!(audit.operation_id, op);
        assert!(
            records.iter().any(|r| r.step == audit.event_type),
            "audit without record: {}",
            audit.event_type
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_same_region_skips_copy_entirely() {
    let mut h = harness();
    h.cloud
        .seed_snapshot(SOURCE_REGION, SNAPSHOT_NAME, SnapshotScope::Shared, &["available"]);

    let response = h
        .runner
        .execute(StepName::SnapshotCheck, event(entry_event(SOURCE_REGION, SOURCE_REGION)))
        .await;
    assert_eq!(response.status_code, 200);
    let op = op_of(&response);

    let responses = h.worker.drive(&h.runner).await;
    assert!(responses.iter().all(|r| r.body.success));

    // No copy call was ever issued.
    assert_eq!(h.cloud.copy_calls(), 0);
    // The restore came from the original snapshot, which is left alone.
    assert_eq!(h.cloud.restore_calls(), 1);
    assert!(h.cloud.deleted_snapshots().is_empty());

    let records = h.state.records_for(&op);
    let copy = records
        .iter()
        .find(|r| r.step == StepName::CopySnapshot)
        .unwrap();
    assert_eq!(copy.str_field("copy_status"), Some("available"));
    assert_eq!(copy.str_field("target_snapshot_name"), Some(SNAPSHOT_NAME));

    let terminal = records.last().unwrap();
    assert_eq!(terminal.step, StepName::SnsNotification);
    assert_eq!(terminal.str_field("archive_status"), Some("skipped"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_snapshot_halts_chain() {
    let mut h = harness();

    let response = h
        .runner
        .execute(StepName::SnapshotCheck, event(entry_event(SOURCE_REGION, TARGET_REGION)))
        .await;
    assert_eq!(response.status_code, 404);
    assert!(!response.body.success);
    assert!(response.body.message.contains("not found"));
    let op = op_of(&response);

    // Nothing was dispatched.
    assert!(h.worker.drive(&h.runner).await.is_empty());

    let records = h.state.records_for(&op);
    assert_eq!(records.len(), 1);
    let terminal = &records[0];
    assert_eq!(terminal.step, StepName::SnapshotCheck);
    assert!(!terminal.success);
    assert!(terminal.error.as_deref().unwrap().contains("not found"));
}

#[tokio::test(start_paused = true)]
async fn test_restore_onto_existing_cluster_terminates_branch() {
    let mut h = harness();
    h.cloud.seed_cluster(TARGET_REGION, TARGET_CLUSTER, &["available"]);

    let op = OperationId::new("op-1718000000-deadbeef");
    let prior = StepRecord::success(op.clone(), StepName::CheckDeleteStatus, 100)
        .with("source_region", SOURCE_REGION)
        .with("target_region", TARGET_REGION)
        .with("source_cluster_id", SOURCE_CLUSTER)
        .with("target_cluster_id", TARGET_CLUSTER)
        .with("target_snapshot_name", format!("{SNAPSHOT_NAME}-copy"))
        .with("delete_status", "deleted");
    h.state.save(&prior).await.unwrap();

    let response = h
        .runner
        .execute(
            StepName::RestoreSnapshot,
            event(serde_json::json!({"operation_id": op.as_str()})),
        )
        .await;
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body.fields["restore_status"],
        serde_json::json!("already_exists")
    );

    // No restore call was issued and no successor dispatched.
    assert_eq!(h.cloud.restore_calls(), 0);
    assert!(h.worker.drive(&h.runner).await.is_empty());

    let latest = h.state.records_for(&op).pop().unwrap();
    assert_eq!(latest.step, StepName::RestoreSnapshot);
    assert!(latest.success);
    assert_eq!(latest.str_field("restore_status"), Some("already_exists"));
}

#[tokio::test(start_paused = true)]
async fn test_incompatible_restore_fails_terminally() {
    let mut h = harness();
    h.cloud
        .seed_snapshot(SOURCE_REGION, SNAPSHOT_NAME, SnapshotScope::Shared, &["available"]);
    h.cloud.set_restore_statuses(&["creating", "incompatible-restore"]);

    let response = h
        .runner
        .execute(StepName::SnapshotCheck, event(entry_event(SOURCE_REGION, TARGET_REGION)))
        .await;
    let op = op_of(&response);

    let responses = h.worker.drive(&h.runner).await;
    let last = responses.last().unwrap();
    assert_eq!(last.status_code, 500);
    assert!(!last.body.success);

    let records = h.state.records_for(&op);
    let terminal = records.last().unwrap();
    assert_eq!(terminal.step, StepName::CheckRestoreStatus);
    assert!(!terminal.success);
    assert_eq!(
        terminal.error.as_deref(),
        Some("Cluster restore failed with status: incompatible-restore")
    );

    // The chain halted: no database work, no notification.
    assert!(h.database.provisioned.lock().unwrap().is_empty());
    assert!(h.notifier.messages.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_operator_replay_after_exhausted_copy_retries() {
    let mut h = harness();
    h.cloud
        .seed_snapshot(SOURCE_REGION, SNAPSHOT_NAME, SnapshotScope::Shared, &["available"]);
    h.cloud.fail_next_copies(1);

    let response = h
        .runner
        .execute(StepName::SnapshotCheck, event(entry_event(SOURCE_REGION, TARGET_REGION)))
        .await;
    let op = op_of(&response);

    let responses = h.worker.drive(&h.runner).await;
    assert_eq!(responses.last().unwrap().status_code, 500);
    let latest = h.state.records_for(&op).pop().unwrap();
    assert_eq!(latest.step, StepName::CopySnapshot);
    assert!(!latest.success);
    assert_eq!(h.metrics.total("copy_snapshot_failures"), 1.0);

    // Operator replays the failed step with the same operation id; the
    // carried context comes from the failure record.
    let replay = h
        .runner
        .execute(
            StepName::CopySnapshot,
            event(serde_json::json!({"operation_id": op.as_str()})),
        )
        .await;
    assert_eq!(replay.status_code, 200);

    let responses = h.worker.drive(&h.runner).await;
    assert!(responses.iter().all(|r| r.body.success));

    let terminal = h.state.records_for(&op).pop().unwrap();
    assert_eq!(terminal.step, StepName::SnsNotification);
    assert!(terminal.success);
    assert_eq!(h.cloud.copy_calls(), 1);
}
