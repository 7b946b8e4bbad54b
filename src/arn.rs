use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The ARN of an SNS topic
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SnsArn {
    /// The region the topic lives in
    region: String,

    /// The account that owns the topic
    account: String,

    /// The topic name
    name: String,
}

impl fmt::Display for SnsArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:aws:sns:{}:{}:{}",
            self.region, self.account, self.name
        )
    }
}

impl FromStr for SnsArn {
    type Err = SnsArnError;

    /// Parse an `SnsArn` of the form `arn:aws:sns:<region>:<account>:<name>`,
    /// where each segment is a nonempty run of lowercase ASCII alphanumerics
    /// and hyphens
    fn from_str(s: &str) -> Result<SnsArn, SnsArnError> {
        fn is_segment(s: &str) -> bool {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        }

        let Some(s) = s.strip_prefix("arn:aws:sns:") else {
            return Err(SnsArnError::BadPrefix);
        };
        let mut segments = s.split(':');
        let (Some(region), Some(account), Some(name), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(SnsArnError::BadSegmentCount);
        };
        if !is_segment(region) {
            return Err(SnsArnError::BadRegion);
        }
        if !is_segment(account) {
            return Err(SnsArnError::BadAccount);
        }
        if !is_segment(name) {
            return Err(SnsArnError::BadName);
        }
        Ok(SnsArn {
            region: region.to_owned(),
            account: account.to_owned(),
            name: name.to_owned(),
        })
    }
}

/// Error returned when parsing an invalid SNS topic ARN
#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum SnsArnError {
    /// The ARN does not start with `"arn:aws:sns:"`
    #[error(r#"ARN does not start with "arn:aws:sns:""#)]
    BadPrefix,

    /// The ARN does not have exactly region, account, and name segments
    #[error("expected an ARN of the form arn:aws:sns:<region>:<account>:<name>")]
    BadSegmentCount,

    /// The region segment is empty or contains invalid characters
    #[error("invalid region in SNS topic ARN")]
    BadRegion,

    /// The account segment is empty or contains invalid characters
    #[error("invalid account ID in SNS topic ARN")]
    BadAccount,

    /// The topic name is empty or contains invalid characters
    #[error("invalid topic name in SNS topic ARN")]
    BadName,
}
