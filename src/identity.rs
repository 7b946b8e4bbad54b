use aws_config::SdkConfig;
use aws_sdk_sts::operation::get_caller_identity::GetCallerIdentityError;
use aws_smithy_runtime_api::client::{orchestrator::HttpResponse, result::SdkError};
use thiserror::Error;

type InnerIdentityError = SdkError<GetCallerIdentityError, HttpResponse>;

/// The AWS account the tool is running as, per STS
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CallerIdentity {
    /// The account ID, passed as `ExpectedBucketOwner` on every S3 call
    pub(crate) account_id: String,
}

/// Ask STS who the caller is
pub(crate) async fn lookup_caller_identity(
    config: &SdkConfig,
) -> Result<CallerIdentity, IdentityError> {
    let client = aws_sdk_sts::Client::new(config);
    let output = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|source| IdentityError::Lookup { source })?;
    let Some(account_id) = output.account() else {
        return Err(IdentityError::NoAccount);
    };
    Ok(CallerIdentity {
        account_id: account_id.to_owned(),
    })
}

#[derive(Debug, Error)]
pub(crate) enum IdentityError {
    /// The STS call itself failed
    #[error("failed to determine caller identity via STS")]
    Lookup { source: InnerIdentityError },

    /// The call succeeded but reported no account ID
    #[error("STS did not report an account ID for the caller")]
    NoAccount,
}
