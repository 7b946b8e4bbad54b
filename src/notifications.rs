use crate::arn::SnsArn;
use crate::s3::{GetNotificationError, PutNotificationError, S3Client};
use aws_sdk_s3::operation::get_bucket_notification_configuration::GetBucketNotificationConfigurationOutput;
use aws_sdk_s3::types::{Event, NotificationConfiguration, TopicConfiguration};
use aws_smithy_types::error::operation::BuildError;
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

/// The notification events a bucket must route to a topic for restore
/// progress to be observable: one fires when the restore is initiated, the
/// other when the object becomes retrievable
pub(crate) fn restore_events() -> [Event; 2] {
    [Event::S3ObjectRestorePost, Event::S3ObjectRestoreCompleted]
}

/// Union of the event types across all Topic Configuration entries.  Queue,
/// Lambda, and `EventBridge` entries do not count towards coverage; they are
/// only round-tripped through updates.
fn topic_events(current: &GetBucketNotificationConfigurationOutput) -> BTreeSet<Event> {
    current
        .topic_configurations
        .iter()
        .flatten()
        .flat_map(|tc| tc.events.iter().cloned())
        .collect()
}

/// How the bucket's configuration must change to cover the restore events
#[derive(Clone, Debug)]
pub(crate) enum MergePlan {
    /// Both restore events are already routed to some topic; no write must
    /// occur
    AlreadyCovered,

    /// The full replacement configuration to write, along with the events
    /// subscribed by the appended entry
    Write {
        configuration: NotificationConfiguration,
        added: Vec<Event>,
    },
}

/// Compute the configuration update, if any, that subscribes the missing
/// restore events to `topic_arn`.  All existing entries are carried over
/// verbatim; missing events go into a single new Topic entry named
/// `entry_id` appended to the existing sequence.
pub(crate) fn merge_restore_events(
    current: &GetBucketNotificationConfigurationOutput,
    topic_arn: &SnsArn,
    entry_id: &str,
) -> Result<MergePlan, BuildError> {
    let configured = topic_events(current);
    let missing = restore_events()
        .into_iter()
        .filter(|event| !configured.contains(event))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        return Ok(MergePlan::AlreadyCovered);
    }
    let entry = TopicConfiguration::builder()
        .id(entry_id)
        .topic_arn(topic_arn.to_string())
        .set_events(Some(missing.clone()))
        .build()?;
    let mut topics = current.topic_configurations.clone().unwrap_or_default();
    topics.push(entry);
    let configuration = NotificationConfiguration::builder()
        .set_topic_configurations(Some(topics))
        .set_queue_configurations(current.queue_configurations.clone())
        .set_lambda_function_configurations(current.lambda_function_configurations.clone())
        .set_event_bridge_configuration(current.event_bridge_configuration.clone())
        .build();
    Ok(MergePlan::Write {
        configuration,
        added: missing,
    })
}

/// What [`ensure_restore_notifications()`] did to the bucket
#[derive(Clone, Debug)]
pub(crate) enum Wiring {
    /// Both restore events were already routed to a topic
    AlreadyCovered,

    /// A new Topic entry subscribing `added` was appended
    Subscribed { added: Vec<Event> },
}

/// Make sure the bucket routes both restore events to `topic_arn`, writing
/// the merged configuration back only when something is missing
pub(crate) async fn ensure_restore_notifications(
    client: &S3Client,
    bucket: &str,
    topic_arn: &SnsArn,
) -> Result<Wiring, NotifyError> {
    let current = client.notification_configuration(bucket).await?;
    let entry_id = format!("{bucket}-restore-events-{}", Uuid::new_v4());
    match merge_restore_events(&current, topic_arn, &entry_id)? {
        MergePlan::AlreadyCovered => Ok(Wiring::AlreadyCovered),
        MergePlan::Write {
            configuration,
            added,
        } => {
            client
                .put_notification_configuration(bucket, configuration)
                .await?;
            Ok(Wiring::Subscribed { added })
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum NotifyError {
    #[error(transparent)]
    Fetch(#[from] GetNotificationError),

    #[error("failed to assemble the replacement notification configuration")]
    Assemble(#[from] BuildError),

    #[error(transparent)]
    Publish(#[from] PutNotificationError),
}

impl NotifyError {
    /// True iff the failure was S3 rejecting the topic subscription, most
    /// often because the SNS topic's access policy does not admit S3
    pub(crate) fn is_topic_rejected(&self) -> bool {
        match self {
            NotifyError::Publish(e) => e.is_invalid_argument(),
            NotifyError::Fetch(_) | NotifyError::Assemble(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use aws_sdk_s3::types::{LambdaFunctionConfiguration, QueueConfiguration};

    static TOPIC: &str = "arn:aws:sns:us-east-1:123456789123:restore";

    fn topic_arn() -> SnsArn {
        TOPIC.parse::<SnsArn>().unwrap()
    }

    fn topic_entry(id: &str, events: Vec<Event>) -> TopicConfiguration {
        TopicConfiguration::builder()
            .id(id)
            .topic_arn(TOPIC)
            .set_events(Some(events))
            .build()
            .unwrap()
    }

    fn output_for(configuration: &NotificationConfiguration) -> GetBucketNotificationConfigurationOutput {
        GetBucketNotificationConfigurationOutput::builder()
            .set_topic_configurations(configuration.topic_configurations.clone())
            .set_queue_configurations(configuration.queue_configurations.clone())
            .set_lambda_function_configurations(configuration.lambda_function_configurations.clone())
            .set_event_bridge_configuration(configuration.event_bridge_configuration.clone())
            .build()
    }

    #[test]
    fn empty_configuration_gets_one_entry_with_both_events() {
        let current = GetBucketNotificationConfigurationOutput::builder().build();
        let plan = merge_restore_events(&current, &topic_arn(), "new-entry").unwrap();
        let (configuration, added) = assert_matches!(
            plan,
            MergePlan::Write { configuration, added } => (configuration, added)
        );
        assert_eq!(added, restore_events());
        let topics = configuration.topic_configurations.as_deref().unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].id(), Some("new-entry"));
        assert_eq!(topics[0].topic_arn(), TOPIC);
        assert_eq!(topics[0].events(), &restore_events());
        assert_eq!(configuration.queue_configurations, None);
        assert_eq!(configuration.lambda_function_configurations, None);
    }

    #[test]
    fn merge_is_idempotent() {
        let current = GetBucketNotificationConfigurationOutput::builder().build();
        let plan = merge_restore_events(&current, &topic_arn(), "first").unwrap();
        let configuration = assert_matches!(
            plan,
            MergePlan::Write { configuration, .. } => configuration
        );
        let second = merge_restore_events(&output_for(&configuration), &topic_arn(), "second");
        assert_matches!(second, Ok(MergePlan::AlreadyCovered));
    }

    #[test]
    fn coverage_split_across_entries_counts() {
        let current = GetBucketNotificationConfigurationOutput::builder()
            .topic_configurations(topic_entry("post", vec![Event::S3ObjectRestorePost]))
            .topic_configurations(topic_entry("done", vec![Event::S3ObjectRestoreCompleted]))
            .build();
        let plan = merge_restore_events(&current, &topic_arn(), "new-entry");
        assert_matches!(plan, Ok(MergePlan::AlreadyCovered));
    }

    #[test]
    fn partial_coverage_appends_only_the_missing_event() {
        let first = topic_entry("post-only", vec![Event::S3ObjectRestorePost]);
        let current = GetBucketNotificationConfigurationOutput::builder()
            .topic_configurations(first.clone())
            .build();
        let plan = merge_restore_events(&current, &topic_arn(), "new-entry").unwrap();
        let (configuration, added) = assert_matches!(
            plan,
            MergePlan::Write { configuration, added } => (configuration, added)
        );
        assert_eq!(added, vec![Event::S3ObjectRestoreCompleted]);
        let topics = configuration.topic_configurations.as_deref().unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0], first);
        assert_eq!(topics[1].events(), &[Event::S3ObjectRestoreCompleted]);
    }

    #[test]
    fn unrelated_entries_survive_the_merge() {
        let created = topic_entry("created", vec![Event::S3ObjectCreated]);
        let queue = QueueConfiguration::builder()
            .id("queue")
            .queue_arn("arn:aws:sqs:us-east-1:123456789123:events")
            .events(Event::S3ObjectRemoved)
            .build()
            .unwrap();
        let lambda = LambdaFunctionConfiguration::builder()
            .id("lambda")
            .lambda_function_arn("arn:aws:lambda:us-east-1:123456789123:function:on-tag")
            .events(Event::S3ObjectTagging)
            .build()
            .unwrap();
        let current = GetBucketNotificationConfigurationOutput::builder()
            .topic_configurations(created.clone())
            .queue_configurations(queue.clone())
            .lambda_function_configurations(lambda.clone())
            .build();
        let plan = merge_restore_events(&current, &topic_arn(), "new-entry").unwrap();
        let (configuration, added) = assert_matches!(
            plan,
            MergePlan::Write { configuration, added } => (configuration, added)
        );
        assert_eq!(added, restore_events());
        let topics = configuration.topic_configurations.as_deref().unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0], created);
        assert_eq!(configuration.queue_configurations, Some(vec![queue]));
        assert_eq!(configuration.lambda_function_configurations, Some(vec![lambda]));
    }

    #[test]
    fn queue_subscriptions_do_not_count_as_coverage() {
        let queue = QueueConfiguration::builder()
            .id("queue")
            .queue_arn("arn:aws:sqs:us-east-1:123456789123:events")
            .events(Event::S3ObjectRestorePost)
            .events(Event::S3ObjectRestoreCompleted)
            .build()
            .unwrap();
        let current = GetBucketNotificationConfigurationOutput::builder()
            .queue_configurations(queue)
            .build();
        let plan = merge_restore_events(&current, &topic_arn(), "new-entry").unwrap();
        let added = assert_matches!(plan, MergePlan::Write { added, .. } => added);
        assert_eq!(added, restore_events());
    }
}
