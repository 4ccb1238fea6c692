use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of row a property is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Version,
    File,
    Package,
}

impl PropertyType {
    pub fn code(self) -> i32 {
        match self {
            PropertyType::Version => 0,
            PropertyType::File => 1,
            PropertyType::Package => 2,
        }
    }
}

impl TryFrom<i32> for PropertyType {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PropertyType::Version),
            1 => Ok(PropertyType::File),
            2 => Ok(PropertyType::Package),
            other => Err(other),
        }
    }
}

/// Package ecosystem a package belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Conan,
}

impl PackageType {
    pub fn as_str(self) -> &'static str {
        match self {
            PackageType::Conan => "conan",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Comparison applied to a text column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Exact(String),
    /// A SQL `LIKE` pattern escaped with `\`.
    Like(String),
}

impl TextMatch {
    /// Builds a matcher from a search criterion where `*` is a wildcard.
    pub fn from_wildcard(value: &str) -> Self {
        if hangar_utils::pattern::contains_wildcard(value) {
            TextMatch::Like(hangar_utils::pattern::to_like_pattern(value))
        } else {
            TextMatch::Exact(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_codes() {
        for ty in [PropertyType::Version, PropertyType::File, PropertyType::Package] {
            assert_eq!(PropertyType::try_from(ty.code()), Ok(ty));
        }
        assert_eq!(PropertyType::try_from(7), Err(7));
    }

    #[test]
    fn test_text_match_from_wildcard() {
        assert_eq!(
            TextMatch::from_wildcard("libfoo"),
            TextMatch::Exact("libfoo".into())
        );
        assert_eq!(TextMatch::from_wildcard("lib*"), TextMatch::Like("lib%".into()));
        assert_eq!(
            TextMatch::from_wildcard("my_lib*"),
            TextMatch::Like("my\\_lib%".into())
        );
    }
}
