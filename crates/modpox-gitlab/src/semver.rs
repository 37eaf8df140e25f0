//! Tag ordering for version lists.
//!
//! Only tags named exactly `v<major>.<minor>.<patch>` carry a version; any
//! other tag keeps its raw name and sorts as `v0.0.0`. Sorting is stable, so
//! equal versions keep the order the API returned them in.

use crate::api::Tag;

/// A tag with its parsed version triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// The tag name as returned by the API.
    pub raw: String,
    /// Commit timestamp of the tagged commit, empty for unparsed tags.
    pub date: String,
    /// `false` when the name is not a `vX.Y.Z` version.
    pub valid: bool,
}

impl TagVersion {
    fn unversioned(raw: &str) -> Self {
        Self {
            major: 0,
            minor: 0,
            patch: 0,
            raw: raw.to_string(),
            date: String::new(),
            valid: false,
        }
    }

    pub fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

/// Digits only. Components too large for `u64` saturate instead of failing.
fn parse_number(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(part.parse().unwrap_or(u64::MAX))
}

/// Parses a tag into a [`TagVersion`].
pub fn parse_tag(tag: &Tag) -> TagVersion {
    let Some(rest) = tag.name.strip_prefix('v') else {
        return TagVersion::unversioned(&tag.name);
    };
    let parts: Vec<&str> = rest.split('.').collect();
    let [major, minor, patch] = parts.as_slice() else {
        return TagVersion::unversioned(&tag.name);
    };
    match (parse_number(major), parse_number(minor), parse_number(patch)) {
        (Some(major), Some(minor), Some(patch)) => TagVersion {
            major,
            minor,
            patch,
            raw: tag.name.clone(),
            date: tag.commit.created_at.clone(),
            valid: true,
        },
        _ => TagVersion::unversioned(&tag.name),
    }
}

/// Parses and sorts tags ascending by `(major, minor, patch)`.
pub fn sorted_tags(tags: &[Tag]) -> Vec<TagVersion> {
    let mut versions: Vec<TagVersion> = tags.iter().map(parse_tag).collect();
    versions.sort_by_key(TagVersion::triple);
    versions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Commit;

    fn tag(name: &str) -> Tag {
        Tag {
            name: name.to_string(),
            commit: Commit {
                id: "abcdef1234567890".to_string(),
                created_at: "2020-01-02T03:04:05.000Z".to_string(),
            },
        }
    }

    #[test]
    fn test_parse_tag() {
        let version = parse_tag(&tag("v1.2.3"));
        assert_eq!(version.triple(), (1, 2, 3));
        assert_eq!(version.raw, "v1.2.3");
        assert_eq!(version.date, "2020-01-02T03:04:05.000Z");
        assert!(version.valid);
    }

    #[test]
    fn test_non_version_tags_sort_as_zero() {
        for name in ["release-1", "1.2.3", "v1.2", "v1.2.3.4", "v1.x.3", "v1.2.3-rc1", "v"] {
            let version = parse_tag(&tag(name));
            assert!(!version.valid, "{name} should not parse");
            assert_eq!(version.triple(), (0, 0, 0));
            assert_eq!(version.raw, name);
            assert!(version.date.is_empty());
        }
    }

    #[test]
    fn test_oversized_components_saturate() {
        let huge = parse_tag(&tag("v99999999999999999999.0.0"));
        assert!(huge.valid);
        assert_eq!(huge.triple(), (u64::MAX, 0, 0));

        let tags = [tag("v99999999999999999999.0.0"), tag("v18446744073709551614.9.9")];
        let raw: Vec<String> = sorted_tags(&tags).into_iter().map(|v| v.raw).collect();
        assert_eq!(raw, ["v18446744073709551614.9.9", "v99999999999999999999.0.0"]);
    }

    #[test]
    fn test_sort_order() {
        let tags = [tag("v1.2.1"), tag("v1.1.5"), tag("v5.1.1"), tag("v4.5.5")];
        let raw: Vec<String> = sorted_tags(&tags).into_iter().map(|v| v.raw).collect();
        assert_eq!(raw, ["v1.1.5", "v1.2.1", "v4.5.5", "v5.1.1"]);
    }

    #[test]
    fn test_sort_by_major_minor_patch() {
        let by_major = sorted_tags(&[tag("v5.1.1"), tag("v4.5.5")]);
        assert_eq!(by_major[0].major, 4);

        let by_minor = sorted_tags(&[tag("v1.2.1"), tag("v1.1.5")]);
        assert_eq!(by_minor[0].minor, 1);

        let by_patch = sorted_tags(&[tag("v1.1.5"), tag("v1.1.1")]);
        assert_eq!(by_patch[0].patch, 1);
    }

    #[test]
    fn test_sort_is_stable_for_equal_versions() {
        let tags = [tag("nightly"), tag("v0.1.0"), tag("stable"), tag("v0.0.0")];
        let raw: Vec<String> = sorted_tags(&tags).into_iter().map(|v| v.raw).collect();
        assert_eq!(raw, ["nightly", "stable", "v0.0.0", "v0.1.0"]);
    }
}
