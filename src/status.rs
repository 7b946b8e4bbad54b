use aws_sdk_s3::types::{ArchiveStatus, StorageClass};
use std::fmt;

/// Archive metadata reported by `HeadObject` for a single object
#[derive(Clone, Debug)]
pub(crate) struct ObjectState {
    /// The Intelligent-Tiering archive status, if any
    pub(crate) archive_status: Option<ArchiveStatus>,

    /// The object's storage class (S3 omits it for STANDARD)
    pub(crate) storage_class: Option<StorageClass>,

    /// The raw `x-amz-restore` marker, present iff a restore was ever
    /// requested for the object
    pub(crate) restore_marker: Option<String>,
}

/// The Intelligent-Tiering tiers an object can be recalled from
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ArchiveTier {
    /// `ARCHIVE_ACCESS`
    Archive,

    /// `DEEP_ARCHIVE_ACCESS`
    DeepArchive,
}

impl ArchiveTier {
    fn from_archive_status(status: &ArchiveStatus) -> Option<ArchiveTier> {
        match status {
            ArchiveStatus::ArchiveAccess => Some(ArchiveTier::Archive),
            ArchiveStatus::DeepArchiveAccess => Some(ArchiveTier::DeepArchive),
            _ => None,
        }
    }

    /// How long S3 says a Standard-tier recall from this tier takes
    pub(crate) fn expected_recall_time(self) -> &'static str {
        match self {
            ArchiveTier::Archive => "in 3-5 hours",
            ArchiveTier::DeepArchive => "within 12 hours",
        }
    }
}

impl fmt::Display for ArchiveTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveTier::Archive => write!(f, "ARCHIVE_ACCESS"),
            ArchiveTier::DeepArchive => write!(f, "DEEP_ARCHIVE_ACCESS"),
        }
    }
}

/// State of a previously issued restore request, per the `x-amz-restore`
/// marker
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RestoreMarker {
    /// The recall is still running
    InProgress,

    /// The recall finished and the object is temporarily retrievable
    Completed,
}

impl RestoreMarker {
    /// `ongoing-request="true"` means the recall is still running; any other
    /// marker value (normally `ongoing-request="false"` plus an expiry date)
    /// means it already finished
    fn parse(marker: &str) -> RestoreMarker {
        if marker.contains(r#"ongoing-request="true""#) {
            RestoreMarker::InProgress
        } else {
            RestoreMarker::Completed
        }
    }
}

/// What to do about an object that `GetObject` reported as archived
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RestoreDecision {
    /// The object sits in an archive tier and no restore has been requested
    Start(ArchiveTier),

    /// A restore of the object is already running
    AlreadyInProgress,

    /// A previous restore already completed
    AlreadyRestored,

    /// The object is not in a tier that restores apply to
    NotEligible,
}

/// Decide whether a restore request should be issued for an object in the
/// given state.  Only the `ARCHIVE_ACCESS` and `DEEP_ARCHIVE_ACCESS` statuses
/// are eligible, and only when no restore marker is present.
pub(crate) fn decide(state: &ObjectState) -> RestoreDecision {
    let Some(tier) = state
        .archive_status
        .as_ref()
        .and_then(ArchiveTier::from_archive_status)
    else {
        return RestoreDecision::NotEligible;
    };
    match state.restore_marker.as_deref().map(RestoreMarker::parse) {
        None => RestoreDecision::Start(tier),
        Some(RestoreMarker::InProgress) => RestoreDecision::AlreadyInProgress,
        Some(RestoreMarker::Completed) => RestoreDecision::AlreadyRestored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn state(archive_status: Option<ArchiveStatus>, marker: Option<&str>) -> ObjectState {
        ObjectState {
            archive_status,
            storage_class: Some(StorageClass::IntelligentTiering),
            restore_marker: marker.map(String::from),
        }
    }

    #[rstest]
    #[case(ArchiveStatus::ArchiveAccess, ArchiveTier::Archive)]
    #[case(ArchiveStatus::DeepArchiveAccess, ArchiveTier::DeepArchive)]
    fn start_when_no_marker(#[case] status: ArchiveStatus, #[case] tier: ArchiveTier) {
        assert_eq!(
            decide(&state(Some(status), None)),
            RestoreDecision::Start(tier)
        );
    }

    #[rstest]
    #[case(r#"ongoing-request="true""#, RestoreDecision::AlreadyInProgress)]
    #[case(r#"ongoing-request="false""#, RestoreDecision::AlreadyRestored)]
    #[case(
        r#"ongoing-request="false", expiry-date="Fri, 21 Dec 2012 00:00:00 GMT""#,
        RestoreDecision::AlreadyRestored
    )]
    fn marker_short_circuits(#[case] marker: &str, #[case] expected: RestoreDecision) {
        assert_eq!(
            decide(&state(Some(ArchiveStatus::ArchiveAccess), Some(marker))),
            expected
        );
    }

    #[test]
    fn absent_archive_status_is_not_eligible() {
        assert_eq!(decide(&state(None, None)), RestoreDecision::NotEligible);
    }

    #[test]
    fn unrecognized_archive_status_is_not_eligible() {
        let status = ArchiveStatus::from("SOMEDAY_ACCESS");
        // A pending restore of an ineligible object must not matter either
        assert_eq!(
            decide(&state(Some(status), Some(r#"ongoing-request="true""#))),
            RestoreDecision::NotEligible
        );
    }
}
