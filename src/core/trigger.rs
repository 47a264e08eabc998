//! Decides whether a pushed ref qualifies for release.
//!
//! A ref qualifies when its tag name matches the configured glob pattern
//! (default `v*`). Non-matching refs are a silent skip, never an error.

use glob_match::glob_match;
use semver::Version;

use crate::error::{Error, Result};

pub const DEFAULT_PATTERN: &str = "v*";

const TAG_REF_PREFIX: &str = "refs/tags/";

/// Reduce a pushed ref to its tag name.
///
/// Push events deliver fully qualified refs (`refs/tags/v1.2.3`); operators
/// typing at a shell pass bare tag names. Both forms are accepted.
pub fn tag_name(ref_name: &str) -> &str {
    ref_name.strip_prefix(TAG_REF_PREFIX).unwrap_or(ref_name)
}

/// Test whether a pushed ref matches the release pattern.
///
/// Branch refs (`refs/heads/...`) never match: only tags trigger releases.
pub fn ref_matches(ref_name: &str, pattern: &str) -> bool {
    if ref_name.starts_with("refs/") && !ref_name.starts_with(TAG_REF_PREFIX) {
        return false;
    }
    glob_match(pattern, tag_name(ref_name))
}

/// Extract the release version from a matched tag.
///
/// The leading `v` is conventional and stripped before parsing. A matched tag
/// without a parseable semver version is a validation error, not a skip: the
/// ref asked for a release and we cannot deliver one.
pub fn version_from_tag(tag: &str) -> Result<Version> {
    let bare = tag.strip_prefix('v').unwrap_or(tag);
    Version::parse(bare).map_err(|e| {
        Error::validation_invalid_argument(
            "ref",
            format!("Tag '{}' does not contain a semver version: {}", tag, e),
            Some(tag.to_string()),
        )
    })
}
