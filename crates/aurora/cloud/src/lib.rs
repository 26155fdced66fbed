//! AWS adapters.
//!
//! Implements the engine's cloud ports over the AWS SDK: RDS snapshots and
//! clusters, Secrets Manager, the SSM parameter source, SNS notification,
//! SQS step dispatch, and S3 log cleanup. All calls share one retry policy
//! (exponential backoff on transient errors) and one error classification,
//! and clients are memoized per region within an invocation.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod classify;
mod clients;
mod clusters;
mod dispatch;
mod logs;
mod notify;
mod params;
mod retry;
mod secrets;
mod snapshots;

pub use clients::AwsClients;
pub use clusters::RdsClusterControl;
pub use dispatch::SqsStepDispatcher;
pub use logs::S3LogStore;
pub use notify::SnsNotifier;
pub use params::SsmParameterSource;
pub use secrets::SecretsManagerProvider;
pub use snapshots::RdsSnapshotStore;
