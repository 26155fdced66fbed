//! S3 log store used by administrative cleanup.

use async_trait::async_trait;
use tracing::info;

use aurora_engine::ports::{CloudError, LogStore};

use crate::classify::classify_error;
use crate::retry::with_backoff;

/// Deletes an operation's log objects by prefix.
pub struct S3LogStore {
    client: aws_sdk_s3::Client,
}

impl S3LogStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogStore for S3LogStore {
    async fn delete_prefix(&self, bucket: &str, prefix: &str) -> Result<u64, CloudError> {
        let mut removed = 0u64;
        let mut continuation: Option<String> = None;

        loop {
            let page = with_backoff("list_objects_v2", || {
                let client = self.client.clone();
                let continuation = continuation.clone();
                async move {
                    client
                        .list_objects_v2()
                        .bucket(bucket)
                        .prefix(prefix)
                        .set_continuation_token(continuation)
                        .send()
                        .await
                        .map_err(|err| classify_error("list_objects_v2", err))
                }
            })
            .await?;

            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                with_backoff("delete_object", || {
                    let client = self.client.clone();
                    let key = key.to_string();
                    async move {
                        client
                            .delete_object()
                            .bucket(bucket)
                            .key(key)
                            .send()
                            .await
                            .map_err(|err| classify_error("delete_object", err))
                    }
                })
                .await?;
                removed += 1;
            }

            continuation = page.next_continuation_token().map(str::to_string);
            if continuation.is_none() {
                break;
            }
        }

        info!(bucket, prefix, removed, "deleted log objects");
        Ok(removed)
    }
}
