//! Pseudo-versions for untagged modules.
//!
//! Format: `v0.0.0-<YYYYMMDDHHMMSS>-<first 12 hex chars of the commit id>`,
//! timestamp in UTC. Requests for a pseudo-version resolve back to the
//! embedded commit prefix.

use std::sync::LazyLock;

use modpox_upstream::UpstreamError;
use regex::Regex;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::api::Commit;

static PSEUDO_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v\d+\.\d+\.\d+-\d{14}-([0-9a-f]{12})$").expect("Invalid pseudo-version regex")
});

const COMMIT_PREFIX_LEN: usize = 12;

/// Parses an API timestamp such as `2020-01-02T03:04:05.000+01:00`.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, UpstreamError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(UpstreamError::encoding)
}

/// Builds the pseudo-version for `commit_id` committed at `time`.
pub fn pseudo_version(commit_id: &str, time: OffsetDateTime) -> Result<String, UpstreamError> {
    let stamp = time
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year][month][day][hour][minute][second]"
        ))
        .map_err(UpstreamError::encoding)?;
    let prefix: String = commit_id.chars().take(COMMIT_PREFIX_LEN).collect();
    Ok(format!("v0.0.0-{stamp}-{prefix}"))
}

/// Builds the pseudo-version for an API commit record.
pub fn commit_pseudo_version(commit: &Commit) -> Result<String, UpstreamError> {
    pseudo_version(&commit.id, parse_timestamp(&commit.created_at)?)
}

/// Returns the commit prefix embedded in a pseudo-version.
pub fn commit_prefix(version: &str) -> Option<&str> {
    PSEUDO_VERSION_REGEX
        .captures(version)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns the git ref to fetch for a requested version: the embedded commit
/// prefix for pseudo-versions, the version itself (a tag name) otherwise.
pub fn resolve_ref(version: &str) -> &str {
    commit_prefix(version).unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_round_trip() {
        let when = datetime!(2021-07-04 09:08:07 UTC);
        let version = pseudo_version("abcdef1234567890", when).unwrap();
        assert_eq!(version, "v0.0.0-20210704090807-abcdef123456");
        assert_eq!(commit_prefix(&version), Some("abcdef123456"));
        assert_eq!(resolve_ref(&version), "abcdef123456");
    }

    #[test]
    fn test_timestamp_is_utc() {
        let commit = Commit {
            id: "0123456789abcdef0123".into(),
            created_at: "2021-07-04T11:08:07.000+02:00".into(),
        };
        assert_eq!(
            commit_pseudo_version(&commit).unwrap(),
            "v0.0.0-20210704090807-0123456789ab"
        );
    }

    #[test]
    fn test_tags_resolve_to_themselves() {
        assert_eq!(resolve_ref("v1.2.3"), "v1.2.3");
        assert_eq!(commit_prefix("v1.2.3"), None);
        // Upper-case hex and short prefixes are not pseudo-versions.
        assert_eq!(commit_prefix("v0.0.0-20210704090807-ABCDEF123456"), None);
        assert_eq!(commit_prefix("v0.0.0-20210704090807-abcdef"), None);
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let commit = Commit {
            id: "abc".into(),
            created_at: "yesterday".into(),
        };
        assert!(commit_pseudo_version(&commit).is_err());
    }
}
