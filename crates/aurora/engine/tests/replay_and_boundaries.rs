//! Replay (at-least-once) behavior and boundary conditions.

mod support;

use aurora_engine::ports::SnapshotScope;
use aurora_state::StateStore;
use aurora_types::{OperationId, StepEvent, StepName, StepRecord};
use serde_json::json;
use support::*;

fn event(value: serde_json::Value) -> StepEvent {
    serde_json::from_value(value).unwrap()
}

fn chain_state(op: &OperationId, step: StepName) -> StepRecord {
    StepRecord::success(op.clone(), step, 100)
        .with("source_region", SOURCE_REGION)
        .with("target_region", TARGET_REGION)
        .with("source_cluster_id", SOURCE_CLUSTER)
        .with("target_cluster_id", TARGET_CLUSTER)
        .with("sns_topic_arn", TOPIC_ARN)
        .with("target_snapshot_name", format!("{SNAPSHOT_NAME}-copy"))
}

#[tokio::test(start_paused = true)]
async fn test_delete_rds_skip_is_idempotent() {
    let mut h = harness();
    let op = OperationId::new("op-1718000000-00000001");
    h.state
        .save(&chain_state(&op, StepName::CheckCopyStatus).with("copy_status", "available"))
        .await
        .unwrap();

    let first = h
        .runner
        .execute(StepName::DeleteRds, event(json!({"operation_id": op.as_str()})))
        .await;
    let second = h
        .runner
        .execute(StepName::DeleteRds, event(json!({"operation_id": op.as_str()})))
        .await;

    assert_eq!(first.status_code, 200);
    assert_eq!(second.status_code, 200);
    assert_eq!(h.cloud.delete_cluster_calls(), 0);

    // Both invocations recorded the skip and dispatched the restore.
    let records = h.state.records_for(&op);
    let skips: Vec<_> = records.iter().filter(|r| r.step == StepName::DeleteRds).collect();
    assert!(!skips.is_empty());
    assert!(skips.iter().all(|r| r.success && r.bool_field("delete_skipped") == Some(true)));

    let mut dispatched = Vec::new();
    while let Some(request) = h.worker.try_next() {
        dispatched.push(request.step);
    }
    assert_eq!(dispatched, vec![StepName::RestoreSnapshot, StepName::RestoreSnapshot]);
}

#[tokio::test(start_paused = true)]
async fn test_archive_snapshot_second_run_records_skipped() {
    let mut h = harness();
    let copy_name = format!("{SNAPSHOT_NAME}-copy");
    h.cloud
        .seed_snapshot(TARGET_REGION, &copy_name, SnapshotScope::Manual, &["available"]);

    let op = OperationId::new("op-1718000000-00000002");
    h.state
        .save(&chain_state(&op, StepName::VerifyRestore).with("verification_status", "completed"))
        .await
        .unwrap();

    let first = h
        .runner
        .execute(StepName::ArchiveSnapshot, event(json!({"operation_id": op.as_str()})))
        .await;
    assert_eq!(first.status_code, 200);
    assert_eq!(first.body.fields["archive_status"], json!("deleted"));

    let second = h
        .runner
        .execute(StepName::ArchiveSnapshot, event(json!({"operation_id": op.as_str()})))
        .await;
    assert_eq!(second.status_code, 200);
    assert_eq!(second.body.fields["archive_status"], json!("skipped"));

    // Deleted exactly once.
    assert_eq!(h.cloud.deleted_snapshots(), vec![copy_name]);
}

#[tokio::test(start_paused = true)]
async fn test_setup_db_users_replay_converges() {
    let mut h = harness();
    let op = OperationId::new("op-1718000000-00000003");
    h.state
        .save(
            &chain_state(&op, StepName::CheckRestoreStatus)
                .with("cluster_endpoint", "prod-db-restored.cluster-abc123.eu-west-1.rds.amazonaws.com")
                .with("cluster_port", 5432),
        )
        .await
        .unwrap();

    for _ in 0..2 {
        let response = h
            .runner
            .execute(StepName::SetupDbUsers, event(json!({"operation_id": op.as_str()})))
            .await;
        assert_eq!(response.status_code, 200);
    }

    let provisioned = h.database.provisioned.lock().unwrap();
    assert_eq!(provisioned.len(), 2);
    // Same host, same roles both times.
    assert_eq!(provisioned[0], provisioned[1]);
    assert_eq!(provisioned[0].1, vec!["app_user", "readonly_user"]);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_date_is_rejected_with_failure_record() {
    let mut h = harness();
    let mut entry = entry_event(SOURCE_REGION, TARGET_REGION);
    entry["date"] = json!("2024-13-40");

    let response = h.runner.execute(StepName::SnapshotCheck, event(entry)).await;
    assert_eq!(response.status_code, 400);
    let op = response.body.operation_id.clone();

    assert!(h.worker.drive(&h.runner).await.is_empty());
    let records = h.state.records_for(&op);
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
}

#[tokio::test(start_paused = true)]
async fn test_blocked_step_reports_previous_state_without_writing() {
    let mut h = harness();
    let op = OperationId::new("op-1718000000-00000004");
    let failure = StepRecord::failure(op.clone(), StepName::CopySnapshot, 100, "copy exploded")
        .with("source_region", SOURCE_REGION)
        .with("target_region", TARGET_REGION)
        .with("target_cluster_id", TARGET_CLUSTER);
    h.state.save(&failure).await.unwrap();

    let response = h
        .runner
        .execute(StepName::DeleteRds, event(json!({"operation_id": op.as_str()})))
        .await;
    assert_eq!(response.status_code, 400);
    assert!(response.body.message.contains("previous step failed"));
    assert!(response.body.fields.contains_key("previous_state"));

    // No record was written for the blocked step and nothing dispatched.
    let records = h.state.records_for(&op);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].step, StepName::CopySnapshot);
    assert!(h.worker.try_next().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_non_entry_step_requires_prior_state() {
    let mut h = harness();
    let response = h
        .runner
        .execute(
            StepName::DeleteRds,
            event(json!({"operation_id": "op-1718000000-00000005"})),
        )
        .await;
    assert_eq!(response.status_code, 400);
    assert!(response.body.message.contains("no prior state"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_required_config_is_rejected() {
    let mut h = harness();
    // No source_cluster_id anywhere.
    let response = h
        .runner
        .execute(
            StepName::SnapshotCheck,
            event(json!({
                "source_region": SOURCE_REGION,
                "target_region": TARGET_REGION,
            })),
        )
        .await;
    assert_eq!(response.status_code, 400);
    assert!(response.body.message.contains("source_cluster_id"));
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_removes_state_and_copy() {
    let mut h = harness();
    let copy_name = format!("{SNAPSHOT_NAME}-copy");
    h.cloud
        .seed_snapshot(TARGET_REGION, &copy_name, SnapshotScope::Manual, &["available"]);

    let op = OperationId::new("op-1718000000-00000006");
    h.state
        .save(&chain_state(&op, StepName::SnsNotification).with("archive_status", "skipped"))
        .await
        .unwrap();

    let response = h
        .runner
        .execute(
            StepName::Cleanup,
            event(json!({"operation_id": op.as_str(), "log_bucket": "restore-logs"})),
        )
        .await;
    assert_eq!(response.status_code, 200);
    let results = &response.body.fields["cleanup_results"];
    assert_eq!(results["snapshot_deleted"], json!(true));
    assert_eq!(results["logs_deleted"], json!(true));
    assert_eq!(results["state_rows_deleted"], json!(1));

    // State rows are gone and stay gone (cleanup writes no record).
    assert!(h.state.records_for(&op).is_empty());
    assert_eq!(h.cloud.deleted_snapshots(), vec![copy_name]);
    let prefixes = h.logs.deleted_prefixes.lock().unwrap();
    assert_eq!(
        prefixes[0],
        ("restore-logs".to_string(), format!("aurora-restore-logs/{op}/"))
    );
}
