//! Recipe and package references.
//!
//! A [`RecipeReference`] is `name/version[@user/channel][#revision]`; a [`PackageReference`]
//! adds the binary package id and its own revision. Both are immutable once validated:
//! [`RecipeReference::with_revision`] and [`PackageReference::with_revision`] return copies.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::{
    constants::DEFAULT_REVISION,
    error::{ConanError, Result},
};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9_+.-]{1,50}$").unwrap());
static REVISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{1,51}$").unwrap());

fn is_valid_name(value: &str) -> bool {
    NAME_RE.is_match(value)
}

fn is_valid_revision(value: &str) -> bool {
    REVISION_RE.is_match(value)
}

/// Parses a version leniently into a [`semver::Version`].
///
/// Accepts a leading `v`, one to three numeric components (missing ones become `0`) and
/// folds any fourth or later component into the build metadata, so `1.2`, `v3` and
/// `1.2.11.4` are all accepted. Returns `None` when the text is not version-like.
pub fn parse_lenient_version(version: &str) -> Option<semver::Version> {
    let v = version.strip_prefix('v').unwrap_or(version);
    let split_at = v.find(['-', '+']).unwrap_or(v.len());
    let (core, rest) = v.split_at(split_at);

    let parts = core
        .split('.')
        .map(|p| {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                p.parse::<u64>().ok()
            }
        })
        .collect::<Option<Vec<_>>>()?;

    let (pre, build) = match rest.split_once('+') {
        Some((pre, build)) => (pre, Some(build)),
        None => (rest, None),
    };

    let mut build_parts: Vec<String> = parts.iter().skip(3).map(u64::to_string).collect();
    if let Some(build) = build {
        build_parts.push(build.to_string());
    }

    let mut normalized = format!(
        "{}.{}.{}{pre}",
        parts[0],
        parts.get(1).copied().unwrap_or(0),
        parts.get(2).copied().unwrap_or(0),
    );
    if !build_parts.is_empty() {
        normalized.push('+');
        normalized.push_str(&build_parts.join("."));
    }

    semver::Version::parse(&normalized).ok()
}

/// Identifies a recipe, optionally pinned to a revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecipeReference {
    name: String,
    version: String,
    user: String,
    channel: String,
    revision: String,
}

impl RecipeReference {
    /// Validates and builds a recipe reference.
    ///
    /// `_` for user or channel means "not set". User and channel must be set together.
    /// An empty revision is kept empty, and the default revision `0` is stored as empty;
    /// use [`Self::revision_or_default`] to resolve it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConanError`] describing the first field that fails validation.
    pub fn new(
        name: &str,
        version: &str,
        user: &str,
        channel: &str,
        revision: &str,
    ) -> Result<Self> {
        trace!("validating recipe reference {name}/{version}@{user}/{channel}#{revision}");

        let user = if user == "_" { "" } else { user };
        let channel = if channel == "_" { "" } else { channel };
        let revision = if revision == DEFAULT_REVISION { "" } else { revision };

        if user.is_empty() != channel.is_empty() {
            return Err(ConanError::IncompleteUserChannel);
        }
        if !is_valid_name(name) {
            return Err(ConanError::InvalidName(name.to_string()));
        }
        if parse_lenient_version(version).is_none() {
            return Err(ConanError::InvalidVersion(version.to_string()));
        }
        if !user.is_empty() && !is_valid_name(user) {
            return Err(ConanError::InvalidName(user.to_string()));
        }
        if !channel.is_empty() && !is_valid_name(channel) {
            return Err(ConanError::InvalidName(channel.to_string()));
        }
        if !revision.is_empty() && !is_valid_revision(revision) {
            return Err(ConanError::InvalidRevision(revision.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            user: user.to_string(),
            channel: channel.to_string(),
            revision: revision.to_string(),
        })
    }

    /// Parses the textual form `name/version[@user/channel][#revision]`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let invalid = || ConanError::InvalidReference(value.to_string());

        let (base, revision) = value.split_once('#').unwrap_or((value, ""));
        let (coordinate, user_channel) = match base.split_once('@') {
            Some((coordinate, user_channel)) => (coordinate, Some(user_channel)),
            None => (base, None),
        };
        let (name, version) = coordinate.split_once('/').ok_or_else(invalid)?;
        if version.contains('/') {
            return Err(invalid());
        }

        let (user, channel) = match user_channel {
            Some(uc) => {
                let (user, channel) = uc.split_once('/').ok_or(ConanError::IncompleteUserChannel)?;
                if channel.contains('/') {
                    return Err(invalid());
                }
                (user, channel)
            }
            None => ("", ""),
        };

        Self::new(name, version, user, channel, revision)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The revision as supplied, possibly empty.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn has_revision(&self) -> bool {
        !self.revision.is_empty()
    }

    pub fn revision_or_default(&self) -> &str {
        if self.revision.is_empty() {
            DEFAULT_REVISION
        } else {
            &self.revision
        }
    }

    /// Canonical five segment path `name/version/user/channel/revision`.
    pub fn link_name(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.name,
            self.version,
            or_placeholder(&self.user),
            or_placeholder(&self.channel),
            self.revision_or_default()
        )
    }

    /// Composite key `user|channel|revision` tagging the files of this reference.
    pub fn as_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.user,
            self.channel,
            self.revision_or_default()
        )
    }

    pub fn with_revision(&self, revision: &str) -> Self {
        Self {
            revision: revision.to_string(),
            ..self.clone()
        }
    }

    /// `name/version[@user/channel]` without the revision.
    pub fn coordinate(&self) -> String {
        if self.user.is_empty() || self.channel.is_empty() {
            format!("{}/{}", self.name, self.version)
        } else {
            format!(
                "{}/{}@{}/{}",
                self.name, self.version, self.user, self.channel
            )
        }
    }
}

impl fmt::Display for RecipeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.coordinate())?;
        if !self.revision.is_empty() {
            write!(f, "#{}", self.revision)?;
        }
        Ok(())
    }
}

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        "_"
    } else {
        value
    }
}

/// Identifies one binary package of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageReference {
    recipe: RecipeReference,
    reference: String,
    revision: String,
}

impl PackageReference {
    /// Validates and builds a package reference. The default revision `0` is stored as empty.
    ///
    /// # Errors
    ///
    /// * [`ConanError::InvalidPackageReference`] if `reference` is empty or not alphanumeric
    /// * [`ConanError::InvalidRevision`] if a non-empty `revision` is malformed
    pub fn new(recipe: RecipeReference, reference: &str, revision: &str) -> Result<Self> {
        if !is_valid_revision(reference) {
            return Err(ConanError::InvalidPackageReference(reference.to_string()));
        }
        let revision = if revision == DEFAULT_REVISION { "" } else { revision };
        if !revision.is_empty() && !is_valid_revision(revision) {
            return Err(ConanError::InvalidRevision(revision.to_string()));
        }

        Ok(Self {
            recipe,
            reference: reference.to_string(),
            revision: revision.to_string(),
        })
    }

    /// Parses `<recipe reference>:<package id>[#revision]`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let (recipe, package) = value
            .split_once(':')
            .ok_or_else(|| ConanError::InvalidReference(value.to_string()))?;
        let (reference, revision) = package.split_once('#').unwrap_or((package, ""));

        Self::new(RecipeReference::parse(recipe)?, reference, revision)
    }

    pub fn recipe(&self) -> &RecipeReference {
        &self.recipe
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn has_revision(&self) -> bool {
        !self.revision.is_empty()
    }

    pub fn revision_or_default(&self) -> &str {
        if self.revision.is_empty() {
            DEFAULT_REVISION
        } else {
            &self.revision
        }
    }

    /// `reference/revision`, relative to the recipe's link name.
    pub fn link_name(&self) -> String {
        format!("{}/{}", self.reference, self.revision_or_default())
    }

    /// Composite key `user|channel|recipe revision|reference|package revision`.
    pub fn as_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.recipe.as_key(),
            self.reference,
            self.revision_or_default()
        )
    }

    pub fn with_revision(&self, revision: &str) -> Self {
        Self {
            revision: revision.to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.recipe, self.reference)?;
        if !self.revision.is_empty() {
            write!(f, "#{}", self.revision)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_recipe_reference_validation() {
        assert_eq!(
            RecipeReference::new("", "1.0", "", "", ""),
            Err(ConanError::InvalidName(String::new()))
        );
        assert_eq!(
            RecipeReference::new("name", "1.0", "user", "", ""),
            Err(ConanError::IncompleteUserChannel)
        );
        assert_eq!(
            RecipeReference::new("name", "1.0", "", "channel", ""),
            Err(ConanError::IncompleteUserChannel)
        );
        assert!(matches!(
            RecipeReference::new("name", "not-a-version", "", "", ""),
            Err(ConanError::InvalidVersion(_))
        ));
        assert!(matches!(
            RecipeReference::new("name", "1.0", "us er", "chan", ""),
            Err(ConanError::InvalidName(_))
        ));
        assert!(matches!(
            RecipeReference::new("name", "1.0", "", "", "rev-1"),
            Err(ConanError::InvalidRevision(_))
        ));
        assert!(matches!(
            RecipeReference::new("n", "1.0", "", "", ""),
            Err(ConanError::InvalidName(_))
        ));
        assert!(RecipeReference::new(&"a".repeat(51), "1.0", "", "", "").is_ok());
        assert!(RecipeReference::new(&"a".repeat(52), "1.0", "", "", "").is_err());
        assert!(RecipeReference::new("-name", "1.0", "", "", "").is_err());
        assert!(RecipeReference::new("_name+x.y-z", "1.0", "", "", "").is_ok());
    }

    #[test]
    fn test_placeholder_user_channel_normalized() {
        let a = RecipeReference::new("name", "1.0", "_", "_", "0").unwrap();
        let b = RecipeReference::new("name", "1.0", "", "", "").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "name/1.0");
        assert!(!a.has_revision());
        assert_eq!(a.link_name(), b.link_name());
        assert_eq!(a.as_key(), b.as_key());
        assert_eq!(b.revision_or_default(), DEFAULT_REVISION);
        assert_eq!(RecipeReference::parse("name/1.0@_/_#0").unwrap(), b);
    }

    #[test]
    fn test_default_package_revision_normalized() {
        let rref = RecipeReference::parse("name/1.0").unwrap();
        let a = PackageReference::new(rref.clone(), "pkg1", "0").unwrap();
        let b = PackageReference::new(rref, "pkg1", "").unwrap();

        assert_eq!(a, b);
        assert!(!a.has_revision());
        assert_eq!(a.to_string(), "name/1.0:pkg1");
        assert_eq!(a.revision_or_default(), DEFAULT_REVISION);
    }

    #[test]
    fn test_lenient_versions() {
        for version in ["1.0", "1", "v2.3.4", "1.2.11", "1.2.3-beta.1", "1.2.3+build", "1.2.3.4"] {
            assert!(
                parse_lenient_version(version).is_some(),
                "{version} should be accepted"
            );
        }
        for version in ["", "abc", "1..2", "1.x", "v", "1.2.3-"] {
            assert!(
                parse_lenient_version(version).is_none(),
                "{version} should be rejected"
            );
        }

        let parsed = parse_lenient_version("1.2").unwrap();
        assert_eq!((parsed.major, parsed.minor, parsed.patch), (1, 2, 0));

        let reference = RecipeReference::new("zlib", "1.2", "", "", "").unwrap();
        assert_eq!(reference.version(), "1.2");
    }

    #[test]
    fn test_string_forms() {
        let rref = RecipeReference::new("zlib", "1.2.13", "conan", "stable", "abc123").unwrap();
        assert_eq!(rref.to_string(), "zlib/1.2.13@conan/stable#abc123");
        assert_eq!(rref.link_name(), "zlib/1.2.13/conan/stable/abc123");
        assert_eq!(rref.as_key(), "conan|stable|abc123");
        assert_eq!(rref.coordinate(), "zlib/1.2.13@conan/stable");

        let bare = RecipeReference::new("zlib", "1.2.13", "", "", "").unwrap();
        assert_eq!(bare.to_string(), "zlib/1.2.13");
        assert_eq!(bare.link_name(), "zlib/1.2.13/_/_/0");
        assert_eq!(bare.link_name().split('/').count(), 5);
        assert_eq!(bare.as_key(), "||0");
    }

    #[test]
    fn test_parse_round_trips_display() {
        for text in [
            "zlib/1.2.13",
            "zlib/1.2.13@conan/stable",
            "zlib/1.2.13#rev1",
            "ConanPackage/1.2@dummy/test#a1b2c3",
        ] {
            let parsed = RecipeReference::parse(text).unwrap();
            assert_eq!(parsed.to_string(), text);
            assert_eq!(RecipeReference::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            RecipeReference::parse("zlib"),
            Err(ConanError::InvalidReference(_))
        ));
        assert!(matches!(
            RecipeReference::parse("zlib/1.0/extra"),
            Err(ConanError::InvalidReference(_))
        ));
        assert_eq!(
            RecipeReference::parse("zlib/1.0@user"),
            Err(ConanError::IncompleteUserChannel)
        );
    }

    #[test]
    fn test_with_revision_returns_copy() {
        let rref = RecipeReference::new("zlib", "1.0", "", "", "").unwrap();
        let pinned = rref.with_revision("rev2");

        assert_eq!(rref.revision(), "");
        assert_eq!(pinned.revision(), "rev2");
        assert_eq!(pinned.name(), "zlib");
    }

    #[test]
    fn test_package_reference() {
        let rref = RecipeReference::new("zlib", "1.0", "u", "c", "").unwrap();

        assert!(matches!(
            PackageReference::new(rref.clone(), "", ""),
            Err(ConanError::InvalidPackageReference(_))
        ));
        assert!(matches!(
            PackageReference::new(rref.clone(), "abc", "bad rev"),
            Err(ConanError::InvalidRevision(_))
        ));

        let pref = PackageReference::new(rref, "dummyreference", "").unwrap();
        assert_eq!(pref.link_name(), "dummyreference/0");
        assert_eq!(pref.as_key(), "u|c|0|dummyreference|0");
        assert_eq!(pref.to_string(), "zlib/1.0@u/c:dummyreference");

        let pinned = pref.with_revision("prev1");
        assert_eq!(pinned.as_key(), "u|c|0|dummyreference|prev1");
        assert_eq!(pref.revision(), "");
    }

    #[test]
    fn test_package_reference_parse() {
        let pref = PackageReference::parse("zlib/1.0@u/c#rrev:pkgid#prev").unwrap();
        assert_eq!(pref.recipe().revision(), "rrev");
        assert_eq!(pref.reference(), "pkgid");
        assert_eq!(pref.revision(), "prev");
        assert_eq!(pref.to_string(), "zlib/1.0@u/c#rrev:pkgid#prev");

        assert!(PackageReference::parse("zlib/1.0").is_err());
    }
}
