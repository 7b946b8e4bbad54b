use crate::arn::SnsArn;
use crate::notifications::{ensure_restore_notifications, Wiring};
use crate::s3::{Availability, RestoreOutcome, S3Client};
use crate::status::{decide, ArchiveTier, RestoreDecision};
use aws_sdk_s3::types::{ArchiveStatus, StorageClass};

/// Object responsible for driving the whole restore flow for a single
/// bucket/key
#[derive(Clone, Debug)]
pub(crate) struct Restorer {
    /// The client for interacting with S3
    client: S3Client,

    /// The bucket containing the archived object
    bucket: String,

    /// The key of the archived object
    key: String,

    /// The SNS topic that restore progress events are routed to
    topic_arn: SnsArn,
}

impl Restorer {
    pub(crate) fn new(
        client: S3Client,
        bucket: String,
        key: String,
        topic_arn: SnsArn,
    ) -> Restorer {
        Restorer {
            client,
            bucket,
            key,
            topic_arn,
        }
    }

    /// Probe the object, inspect its archive state if the probe says it is
    /// archived, and issue a restore when one is called for.  Every outcome
    /// short of a missing bucket/key or an unexpected API failure is a
    /// success.
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(bucket = %self.bucket, key = %self.key, "Probing object ...");
        match self.client.probe_object(&self.bucket, &self.key).await? {
            Availability::Retrievable => {
                tracing::info!(
                    key = %self.key,
                    "Object is not in an Intelligent-Tiering archive tier; nothing to do"
                );
                return Ok(());
            }
            Availability::Archived => {
                tracing::info!(
                    key = %self.key,
                    "Object is not directly retrievable; inspecting archive status ..."
                );
            }
        }
        let state = self.client.object_state(&self.bucket, &self.key).await?;
        tracing::info!(
            key = %self.key,
            archive_status = state.archive_status.as_ref().map(ArchiveStatus::as_str),
            storage_class = state.storage_class.as_ref().map(StorageClass::as_str),
            "Fetched object archive state"
        );
        match decide(&state) {
            RestoreDecision::Start(tier) => self.start_restore(tier).await,
            RestoreDecision::AlreadyInProgress => {
                tracing::info!(key = %self.key, "A restore of the object is already in progress");
                Ok(())
            }
            RestoreDecision::AlreadyRestored => {
                tracing::info!(key = %self.key, "The object has already been restored");
                Ok(())
            }
            RestoreDecision::NotEligible => {
                tracing::info!(
                    key = %self.key,
                    "Object is not in an archive-access tier; restore does not apply"
                );
                Ok(())
            }
        }
    }

    /// Wire up the notification events, then ask S3 to recall the object.
    /// Wiring runs on every attempt, not just the first, so a configuration
    /// that was changed since the last run gets repaired.
    async fn start_restore(&self, tier: ArchiveTier) -> anyhow::Result<()> {
        self.wire_notifications().await;
        tracing::info!(
            key = %self.key,
            %tier,
            "Requesting restore; the object should be retrievable {}",
            tier.expected_recall_time(),
        );
        match self.client.start_restore(&self.bucket, &self.key).await? {
            RestoreOutcome::Accepted => {
                tracing::info!(key = %self.key, "Restore request accepted");
            }
            RestoreOutcome::AlreadyActive => {
                tracing::warn!(
                    key = %self.key,
                    "S3 reports the object is already in an active tier; no restore issued"
                );
            }
        }
        Ok(())
    }

    /// Best-effort: a bucket whose notifications cannot be wired still gets
    /// its restore issued
    async fn wire_notifications(&self) {
        match ensure_restore_notifications(&self.client, &self.bucket, &self.topic_arn).await {
            Ok(Wiring::AlreadyCovered) => {
                tracing::debug!(
                    bucket = %self.bucket,
                    "Both restore events are already routed to a topic"
                );
            }
            Ok(Wiring::Subscribed { added }) => {
                tracing::info!(
                    bucket = %self.bucket,
                    topic = %self.topic_arn,
                    events = ?added,
                    "Subscribed restore events for the bucket"
                );
            }
            Err(e) if e.is_topic_rejected() => {
                tracing::warn!(
                    topic = %self.topic_arn,
                    error = %e,
                    "S3 rejected the topic; check the SNS topic's access policy permissions"
                );
            }
            Err(e) => {
                tracing::warn!(
                    bucket = %self.bucket,
                    error = %e,
                    "Could not update the bucket's notification configuration; continuing with the restore"
                );
            }
        }
    }
}
