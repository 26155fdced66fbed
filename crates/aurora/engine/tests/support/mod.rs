//! Test harness: in-memory stores plus a scripted mock cloud.
//!
//! Snapshots and clusters carry a queue of statuses; every describe call
//! observes the next one, so tests script convergence ("copying, copying,
//! available") the way the real service would surface it. The sentinel
//! status `gone` makes a cluster disappear on its next describe.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use aurora_engine::ports::{
    AppCredentials, Clock, CloudError, CloudErrorKind, ClusterControl, ClusterInfo,
    ConnectTarget, CopySnapshotRequest, DatabaseAdmin, DbAdminError, LogStore, MasterCredentials,
    Notifier, RestoreSpec, RoleSpec, SecretsProvider, SnapshotInfo, SnapshotScope, SnapshotStore,
    VerificationSummary,
};
use aurora_engine::{EngineServices, LocalDispatcher, LocalWorker, StepRunner};
use aurora_observability::{MemoryAuditSink, MemoryMetricsSink};
use aurora_state::InMemoryStateStore;

pub const SOURCE_REGION: &str = "us-east-1";
pub const TARGET_REGION: &str = "eu-west-1";
pub const SOURCE_CLUSTER: &str = "prod-db";
pub const TARGET_CLUSTER: &str = "prod-db-restored";
pub const TOPIC_ARN: &str = "arn:aws:sns:eu-west-1:123456789012:aurora-restore-notifications";
pub const SNAPSHOT_NAME: &str = "aurora-snapshot-prod-db-2024-06-10";

/// Clock that advances one second per reading, so every saved record gets a
/// distinct sort key.
pub struct TickingClock {
    base: DateTime<Utc>,
    ticks: AtomicI64,
}

impl TickingClock {
    pub fn new() -> Self {
        Self {
            base: Utc.with_ymd_and_hms(2024, 6, 11, 3, 0, 0).unwrap(),
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for TickingClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + chrono::Duration::seconds(self.ticks.fetch_add(1, Ordering::SeqCst))
    }
}

struct MockSnapshot {
    arn: String,
    scope: SnapshotScope,
    statuses: VecDeque<String>,
    engine: String,
}

impl MockSnapshot {
    fn observe(&mut self) -> String {
        if self.statuses.len() > 1 {
            self.statuses.pop_front().unwrap()
        } else {
            self.statuses
                .front()
                .cloned()
                .unwrap_or_else(|| "available".to_string())
        }
    }
}

struct MockCluster {
    statuses: VecDeque<String>,
    endpoint: String,
    port: i32,
    engine: String,
    engine_version: String,
}

impl MockCluster {
    fn observe(&mut self) -> String {
        if self.statuses.len() > 1 {
            self.statuses.pop_front().unwrap()
        } else {
            self.statuses
                .front()
                .cloned()
                .unwrap_or_else(|| "available".to_string())
        }
    }
}

#[derive(Default)]
struct World {
    snapshots: HashMap<(String, String), MockSnapshot>,
    clusters: HashMap<(String, String), MockCluster>,
    /// Status sequence given to snapshot copies.
    copy_statuses: Vec<String>,
    /// Status sequence given to restored clusters.
    restore_statuses: Vec<String>,
    /// Remaining copy calls that fail (exhausted-retry simulation).
    fail_copies: u32,
    copy_calls: u32,
    delete_cluster_calls: u32,
    restore_calls: u32,
    deleted_snapshots: Vec<String>,
}

/// Scripted snapshot and cluster control.
pub struct MockCloud {
    world: Mutex<World>,
}

impl MockCloud {
    pub fn new() -> Self {
        Self {
            world: Mutex::new(World {
                copy_statuses: vec!["copying".into(), "available".into()],
                restore_statuses: vec!["creating".into(), "available".into()],
                ..World::default()
            }),
        }
    }

    pub fn seed_snapshot(&self, region: &str, id: &str, scope: SnapshotScope, statuses: &[&str]) {
        let mut world = self.world.lock().unwrap();
        world.snapshots.insert(
            (region.to_string(), id.to_string()),
            MockSnapshot {
                arn: snapshot_arn(region, id),
                scope,
                statuses: statuses.iter().map(|s| s.to_string()).collect(),
                engine: "aurora-postgresql".to_string(),
            },
        );
    }

    pub fn seed_cluster(&self, region: &str, id: &str, statuses: &[&str]) {
        let mut world = self.world.lock().unwrap();
        world.clusters.insert(
            (region.to_string(), id.to_string()),
            MockCluster {
                statuses: statuses.iter().map(|s| s.to_string()).collect(),
                endpoint: format!("{id}.cluster-abc123.{region}.rds.amazonaws.com"),
                port: 5432,
                engine: "aurora-postgresql".to_string(),
                engine_version: "15.4".to_string(),
            },
        );
    }

    pub fn set_restore_statuses(&self, statuses: &[&str]) {
        self.world.lock().unwrap().restore_statuses =
            statuses.iter().map(|s| s.to_string()).collect();
    }

    pub fn fail_next_copies(&self, count: u32) {
        self.world.lock().unwrap().fail_copies = count;
    }

    pub fn copy_calls(&self) -> u32 {
        self.world.lock().unwrap().copy_calls
    }

    pub fn restore_calls(&self) -> u32 {
        self.world.lock().unwrap().restore_calls
    }

    pub fn delete_cluster_calls(&self) -> u32 {
        self.world.lock().unwrap().delete_cluster_calls
    }

    pub fn deleted_snapshots(&self) -> Vec<String> {
        self.world.lock().unwrap().deleted_snapshots.clone()
    }
}

fn snapshot_arn(region: &str, id: &str) -> String {
    format!("arn:aws:rds:{region}:123456789012:cluster-snapshot:{id}")
}

#[async_trait]
impl SnapshotStore for MockCloud {
    async fn find_snapshot(
        &self,
        region: &str,
        snapshot_id: &str,
        scope: SnapshotScope,
    ) -> Result<Option<SnapshotInfo>, CloudError> {
        let mut world = self.world.lock().unwrap();
        let key = (region.to_string(), snapshot_id.to_string());
        let Some(snapshot) = world.snapshots.get_mut(&key) else {
            return Ok(None);
        };
        if snapshot.scope != scope {
            return Ok(None);
        }
        let status = snapshot.observe();
        let info = SnapshotInfo {
            identifier: snapshot_id.to_string(),
            arn: snapshot.arn.clone(),
            status,
            cluster_id: Some(SOURCE_CLUSTER.to_string()),
            engine: Some(snapshot.engine.clone()),
            engine_version: Some("15.4".to_string()),
            encrypted: true,
            kms_key_id: None,
            allocated_storage: Some(100),
            created_at: Some(Utc.with_ymd_and_hms(2024, 6, 10, 2, 0, 0).unwrap()),
        };
        Ok(Some(info))
    }

    async fn copy_snapshot(
        &self,
        region: &str,
        request: &CopySnapshotRequest,
    ) -> Result<SnapshotInfo, CloudError> {
        let mut world = self.world.lock().unwrap();
        if world.fail_copies > 0 {
            world.fail_copies -= 1;
            return Err(CloudError::new(
                CloudErrorKind::Throttled,
                "Rate exceeded (retries exhausted)",
            ));
        }
        world.copy_calls += 1;
        let key = (region.to_string(), request.target_snapshot_id.clone());
        if world.snapshots.contains_key(&key) {
            return Err(CloudError::already_exists(format!(
                "snapshot {} already exists",
                request.target_snapshot_id
            )));
        }
        let statuses: VecDeque<String> = world.copy_statuses.iter().cloned().collect();
        world.snapshots.insert(
            key,
            MockSnapshot {
                arn: snapshot_arn(region, &request.target_snapshot_id),
                scope: SnapshotScope::Manual,
                statuses,
                engine: "aurora-postgresql".to_string(),
            },
        );
        Ok(SnapshotInfo {
            identifier: request.target_snapshot_id.clone(),
            arn: snapshot_arn(region, &request.target_snapshot_id),
            status: "copying".to_string(),
            cluster_id: Some(SOURCE_CLUSTER.to_string()),
            engine: Some("aurora-postgresql".to_string()),
            engine_version: Some("15.4".to_string()),
            encrypted: true,
            kms_key_id: request.kms_key_id.clone(),
            allocated_storage: Some(100),
            created_at: None,
        })
    }

    async fn delete_snapshot(&self, region: &str, snapshot_id: &str) -> Result<bool, CloudError> {
        let mut world = self.world.lock().unwrap();
        let key = (region.to_string(), snapshot_id.to_string());
        let existed = world.snapshots.remove(&key).is_some();
        if existed {
            world.deleted_snapshots.push(snapshot_id.to_string());
        }
        Ok(existed)
    }
}

#[async_trait]
impl ClusterControl for MockCloud {
    async fn find_cluster(
        &self,
        region: &str,
        cluster_id: &str,
    ) -> Result<Option<ClusterInfo>, CloudError> {
        let mut world = self.world.lock().unwrap();
        let key = (region.to_string(), cluster_id.to_string());
        let Some(cluster) = world.clusters.get_mut(&key) else {
            return Ok(None);
        };
        let status = cluster.observe();
        if status == "gone" {
            world.clusters.remove(&key);
            return Ok(None);
        }
        let info = ClusterInfo {
            identifier: cluster_id.to_string(),
            status,
            endpoint: Some(cluster.endpoint.clone()),
            port: Some(cluster.port),
            engine: Some(cluster.engine.clone()),
            engine_version: Some(cluster.engine_version.clone()),
            db_subnet_group: Some("restored-subnets".to_string()),
            vpc_security_group_ids: vec!["sg-0a1b2c3d".to_string()],
        };
        Ok(Some(info))
    }

    async fn delete_cluster(
        &self,
        region: &str,
        cluster_id: &str,
        _skip_final_snapshot: bool,
    ) -> Result<(), CloudError> {
        let mut world = self.world.lock().unwrap();
        world.delete_cluster_calls += 1;
        let key = (region.to_string(), cluster_id.to_string());
        let Some(cluster) = world.clusters.get_mut(&key) else {
            return Err(CloudError::not_found(format!(
                "cluster {cluster_id} not found"
            )));
        };
        cluster.statuses = VecDeque::from(vec!["deleting".to_string(), "gone".to_string()]);
        Ok(())
    }

    async fn restore_cluster(
        &self,
        region: &str,
        spec: &RestoreSpec,
    ) -> Result<ClusterInfo, CloudError> {
        let mut world = self.world.lock().unwrap();
        world.restore_calls += 1;
        let key = (region.to_string(), spec.cluster_id.clone());
        if world.clusters.contains_key(&key) {
            return Err(CloudError::already_exists(format!(
                "cluster {} already exists",
                spec.cluster_id
            )));
        }
        let statuses: VecDeque<String> = world.restore_statuses.iter().cloned().collect();
        world.clusters.insert(
            key,
            MockCluster {
                statuses,
                endpoint: format!(
                    "{}.cluster-abc123.{}.rds.amazonaws.com",
                    spec.cluster_id, region
                ),
                port: spec.port.unwrap_or(5432),
                engine: spec.engine.clone(),
                engine_version: spec.engine_version.clone().unwrap_or_else(|| "15.4".into()),
            },
        );
        Ok(ClusterInfo {
            identifier: spec.cluster_id.clone(),
            status: "creating".to_string(),
            endpoint: None,
            port: spec.port,
            engine: Some(spec.engine.clone()),
            engine_version: spec.engine_version.clone(),
            db_subnet_group: spec.db_subnet_group_name.clone(),
            vpc_security_group_ids: spec.vpc_security_group_ids.clone(),
        })
    }
}

/// Fixed secrets.
pub struct MockSecrets;

#[async_trait]
impl SecretsProvider for MockSecrets {
    async fn master_credentials(
        &self,
        _region: &str,
        _secret_id: &str,
    ) -> Result<MasterCredentials, CloudError> {
        Ok(MasterCredentials {
            database: "appdb".to_string(),
            username: "postgres".to_string(),
            password: "master-pw".to_string(),
        })
    }

    async fn app_credentials(
        &self,
        _region: &str,
        _secret_id: &str,
    ) -> Result<AppCredentials, CloudError> {
        Ok(AppCredentials {
            app_username: "app_user".to_string(),
            app_password: "app-pw".to_string(),
            readonly_username: "readonly_user".to_string(),
            readonly_password: "ro-pw".to_string(),
        })
    }
}

/// Recording notifier.
#[derive(Default)]
pub struct MockNotifier {
    pub messages: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn publish(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
    ) -> Result<String, CloudError> {
        let mut messages = self.messages.lock().unwrap();
        messages.push((
            topic_arn.to_string(),
            subject.to_string(),
            message.to_string(),
        ));
        Ok(format!("msg-{:04}", messages.len()))
    }
}

/// Recording database admin.
#[derive(Default)]
pub struct MockDatabase {
    pub provisioned: Mutex<Vec<(String, Vec<String>)>>,
    pub verified: Mutex<Vec<String>>,
}

#[async_trait]
impl DatabaseAdmin for MockDatabase {
    async fn provision_roles(
        &self,
        target: &ConnectTarget,
        roles: &[RoleSpec],
    ) -> Result<(), DbAdminError> {
        self.provisioned.lock().unwrap().push((
            target.host.clone(),
            roles.iter().map(|r| r.name.clone()).collect(),
        ));
        Ok(())
    }

    async fn verify(&self, target: &ConnectTarget) -> Result<VerificationSummary, DbAdminError> {
        self.verified.lock().unwrap().push(target.host.clone());
        Ok(VerificationSummary {
            server_version: "PostgreSQL 15.4".to_string(),
            schemas: vec!["public".to_string(), "app".to_string()],
            table_count: 12,
        })
    }
}

/// Recording log store.
#[derive(Default)]
pub struct MockLogs {
    pub deleted_prefixes: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl LogStore for MockLogs {
    async fn delete_prefix(&self, bucket: &str, prefix: &str) -> Result<u64, CloudError> {
        self.deleted_prefixes
            .lock()
            .unwrap()
            .push((bucket.to_string(), prefix.to_string()));
        Ok(3)
    }
}

/// Everything a scenario needs.
pub struct Harness {
    pub runner: StepRunner,
    pub worker: LocalWorker,
    pub state: Arc<InMemoryStateStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub metrics: Arc<MemoryMetricsSink>,
    pub cloud: Arc<MockCloud>,
    pub notifier: Arc<MockNotifier>,
    pub database: Arc<MockDatabase>,
    pub logs: Arc<MockLogs>,
}

pub fn harness() -> Harness {
    let state = Arc::new(InMemoryStateStore::new());
    let audit = Arc::new(MemoryAuditSink::new());
    let metrics = Arc::new(MemoryMetricsSink::new());
    let cloud = Arc::new(MockCloud::new());
    let notifier = Arc::new(MockNotifier::default());
    let database = Arc::new(MockDatabase::default());
    let logs = Arc::new(MockLogs::default());
    let (dispatcher, worker) = LocalDispatcher::channel();

    let services = EngineServices {
        clock: Arc::new(TickingClock::new()),
        state: state.clone(),
        audit: audit.clone(),
        metrics: metrics.clone(),
        parameters: None,
        snapshots: cloud.clone(),
        clusters: cloud.clone(),
        secrets: Arc::new(MockSecrets),
        notifier: notifier.clone(),
        logs: Some(logs.clone()),
        database: database.clone(),
        dispatcher: Arc::new(dispatcher),
        environment: "test".to_string(),
    };

    Harness {
        runner: StepRunner::new(Arc::new(services)),
        worker,
        state,
        audit,
        metrics,
        cloud,
        notifier,
        database,
        logs,
    }
}

/// Entry event carrying the scenario's configuration (the event layer has
/// the highest priority, and the runner carries it forward through state).
pub fn entry_event(source_region: &str, target_region: &str) -> Value {
    json!({
        "date": "2024-06-10",
        "source_region": source_region,
        "target_region": target_region,
        "source_cluster_id": SOURCE_CLUSTER,
        "target_cluster_id": TARGET_CLUSTER,
        "sns_topic_arn": TOPIC_ARN,
    })
}
