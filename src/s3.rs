use crate::status::ObjectState;
use aws_config::SdkConfig;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::operation::get_bucket_notification_configuration::{
    GetBucketNotificationConfigurationError, GetBucketNotificationConfigurationOutput,
};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::operation::put_bucket_notification_configuration::PutBucketNotificationConfigurationError;
use aws_sdk_s3::operation::restore_object::RestoreObjectError;
use aws_sdk_s3::types::{NotificationConfiguration, RestoreRequest};
use aws_sdk_s3::Client;
use aws_smithy_runtime_api::client::{orchestrator::HttpResponse, result::SdkError};
use thiserror::Error;

type InnerGetError = SdkError<GetObjectError, HttpResponse>;
type InnerHeadError = SdkError<HeadObjectError, HttpResponse>;
type InnerRestoreError = SdkError<RestoreObjectError, HttpResponse>;
type InnerGetNotifError = SdkError<GetBucketNotificationConfigurationError, HttpResponse>;
type InnerPutNotifError = SdkError<PutBucketNotificationConfigurationError, HttpResponse>;

/// A client for interacting with S3 on behalf of a single bucket-owning
/// account.  Every call carries `ExpectedBucketOwner` so that a bucket owned
/// by somebody else is indistinguishable from a missing one.
#[derive(Clone, Debug)]
pub(crate) struct S3Client {
    inner: Client,
    owner_account: String,
}

/// Whether a `GetObject` probe could retrieve the object directly
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Availability {
    /// The object was retrievable; it is not parked in an archive tier
    Retrievable,

    /// S3 reported `InvalidObjectState`; the object is archived
    Archived,
}

/// Whether S3 accepted a `RestoreObject` request
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RestoreOutcome {
    /// The recall was accepted and is now running
    Accepted,

    /// S3 reported the object is already in an active tier, so there is
    /// nothing to recall
    AlreadyActive,
}

impl S3Client {
    pub(crate) fn new(config: &SdkConfig, owner_account: String) -> S3Client {
        S3Client {
            inner: Client::new(config),
            owner_account,
        }
    }

    /// Probe the object with a direct `GetObject`.  A success means no
    /// restore is needed; `InvalidObjectState` means the object is archived
    /// and needs closer inspection.  The body of a successful response is
    /// discarded unread.
    pub(crate) async fn probe_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Availability, ProbeError> {
        match self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .expected_bucket_owner(&self.owner_account)
            .send()
            .await
        {
            Ok(_) => Ok(Availability::Retrievable),
            Err(source) => {
                if source
                    .as_service_error()
                    .is_some_and(GetObjectError::is_invalid_object_state)
                {
                    return Ok(Availability::Archived);
                }
                if source
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    return Err(ProbeError::NoSuchKey {
                        bucket: bucket.to_owned(),
                        key: key.to_owned(),
                        source,
                    });
                }
                // `NoSuchBucket` is not modeled on GetObject, so match on the
                // error code
                if source.code() == Some("NoSuchBucket") {
                    return Err(ProbeError::NoSuchBucket {
                        bucket: bucket.to_owned(),
                        source,
                    });
                }
                Err(ProbeError::Get {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                    source,
                })
            }
        }
    }

    /// Fetch the object's archive metadata via `HeadObject`
    pub(crate) async fn object_state(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<ObjectState, HeadError> {
        let output = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .expected_bucket_owner(&self.owner_account)
            .send()
            .await
            .map_err(|source| HeadError {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                source,
            })?;
        Ok(ObjectState {
            archive_status: output.archive_status,
            storage_class: output.storage_class,
            restore_marker: output.restore,
        })
    }

    /// Ask S3 to recall the object.  The restore request is left empty:
    /// Intelligent-Tiering recalls take no retention period, and the tier
    /// defaults to Standard.
    pub(crate) async fn start_restore(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<RestoreOutcome, StartRestoreError> {
        match self
            .inner
            .restore_object()
            .bucket(bucket)
            .key(key)
            .expected_bucket_owner(&self.owner_account)
            .restore_request(RestoreRequest::builder().build())
            .send()
            .await
        {
            Ok(_) => Ok(RestoreOutcome::Accepted),
            Err(source) => {
                if source
                    .as_service_error()
                    .is_some_and(RestoreObjectError::is_object_already_in_active_tier_error)
                {
                    Ok(RestoreOutcome::AlreadyActive)
                } else {
                    Err(StartRestoreError {
                        bucket: bucket.to_owned(),
                        key: key.to_owned(),
                        source,
                    })
                }
            }
        }
    }

    /// Fetch the bucket's current notification configuration
    pub(crate) async fn notification_configuration(
        &self,
        bucket: &str,
    ) -> Result<GetBucketNotificationConfigurationOutput, GetNotificationError> {
        self.inner
            .get_bucket_notification_configuration()
            .bucket(bucket)
            .expected_bucket_owner(&self.owner_account)
            .send()
            .await
            .map_err(|source| GetNotificationError {
                bucket: bucket.to_owned(),
                source,
            })
    }

    /// Replace the bucket's notification configuration wholesale; the
    /// provider API has no partial patch
    pub(crate) async fn put_notification_configuration(
        &self,
        bucket: &str,
        configuration: NotificationConfiguration,
    ) -> Result<(), PutNotificationError> {
        self.inner
            .put_bucket_notification_configuration()
            .bucket(bucket)
            .expected_bucket_owner(&self.owner_account)
            .notification_configuration(configuration)
            .send()
            .await
            .map_err(|source| PutNotificationError {
                bucket: bucket.to_owned(),
                source,
            })?;
        Ok(())
    }
}

/// Error returned when the `GetObject` probe fails outright
#[derive(Debug, Error)]
pub(crate) enum ProbeError {
    /// The bucket does not exist, or it is not owned by the caller's account
    #[error("bucket {bucket:?} does not exist or is not owned by the caller")]
    NoSuchBucket {
        bucket: String,
        source: InnerGetError,
    },

    /// The key does not exist in the bucket
    #[error("key {key:?} does not exist in bucket {bucket:?}")]
    NoSuchKey {
        bucket: String,
        key: String,
        source: InnerGetError,
    },

    /// Any other retrieval failure
    #[error("failed to retrieve s3://{bucket}/{key}")]
    Get {
        bucket: String,
        key: String,
        source: InnerGetError,
    },
}

#[derive(Debug, Error)]
#[error("failed to fetch object metadata for s3://{bucket}/{key}")]
pub(crate) struct HeadError {
    bucket: String,
    key: String,
    source: InnerHeadError,
}

#[derive(Debug, Error)]
#[error("failed to request restore of s3://{bucket}/{key}")]
pub(crate) struct StartRestoreError {
    bucket: String,
    key: String,
    source: InnerRestoreError,
}

#[derive(Debug, Error)]
#[error("failed to fetch the notification configuration of bucket {bucket:?}")]
pub(crate) struct GetNotificationError {
    bucket: String,
    source: InnerGetNotifError,
}

#[derive(Debug, Error)]
#[error("failed to update the notification configuration of bucket {bucket:?}")]
pub(crate) struct PutNotificationError {
    bucket: String,
    source: InnerPutNotifError,
}

impl PutNotificationError {
    /// True iff S3 rejected the configuration as invalid, which for a topic
    /// subscription usually means the SNS topic's access policy does not let
    /// S3 publish to it
    pub(crate) fn is_invalid_argument(&self) -> bool {
        self.source.code() == Some("InvalidArgument")
    }
}
