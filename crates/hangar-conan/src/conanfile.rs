//! Metadata extraction from `conanfile.py`.
//!
//! Recipes are Python; only simple top level attribute assignments are recognized.

use std::{io::Read, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConanError, Result};

/// Upper bound of recipe bytes inspected for metadata.
const MAX_CONANFILE_SIZE: u64 = 1 << 20;

fn attribute_pattern(name: &str) -> Regex {
    Regex::new(&format!(r#"(?im)^\s*{name}\s*=\s*['"\(](.+)['"\)]"#)).unwrap()
}

static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| attribute_pattern("author"));
static HOMEPAGE_RE: LazyLock<Regex> = LazyLock::new(|| attribute_pattern("homepage"));
static URL_RE: LazyLock<Regex> = LazyLock::new(|| attribute_pattern("url"));
static LICENSE_RE: LazyLock<Regex> = LazyLock::new(|| attribute_pattern("license"));
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| attribute_pattern("description"));
static TOPICS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*topics\s*=\s*\((.+)\)").unwrap());
static TOPIC_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s*['"](.+?)['"]\s*,?"#).unwrap());

/// Package version metadata stored as JSON on the version row.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

fn capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts [`Metadata`] from a recipe.
pub fn parse<R: Read>(reader: R) -> Result<Metadata> {
    let mut content = String::new();
    reader
        .take(MAX_CONANFILE_SIZE)
        .read_to_string(&mut content)
        .map_err(|err| ConanError::Read(err.to_string()))?;

    Ok(parse_str(&content))
}

pub fn parse_str(content: &str) -> Metadata {
    let keywords = TOPICS_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|topics| {
            TOPIC_ITEM_RE
                .captures_iter(topics.as_str())
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                .collect()
        })
        .unwrap_or_default();

    Metadata {
        author: capture(&AUTHOR_RE, content),
        license: capture(&LICENSE_RE, content),
        project_url: capture(&HOMEPAGE_RE, content),
        repository_url: capture(&URL_RE, content),
        description: capture(&DESCRIPTION_RE, content),
        keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONANFILE: &str = r#"from conans import ConanFile, CMake, tools

class ConanPackageConan(ConanFile):
    name = "ConanPackage"
    version = "1.2"
    license = "MIT"
    author = "Gitea <info@gitea.io>"
    homepage = "https://gitea.io/"
    url = "https://gitea.com/"
    description = "Description of ConanPackage"
    topics = ("gitea", "conan")
    settings = "os", "compiler", "build_type", "arch"
    options = {"shared": [True, False], "fPIC": [True, False]}
    default_options = {"shared": False, "fPIC": True}
    generators = "cmake"
"#;

    #[test]
    fn test_parse_conanfile() {
        let metadata = parse(CONANFILE.as_bytes()).unwrap();

        assert_eq!(metadata.license.as_deref(), Some("MIT"));
        assert_eq!(metadata.author.as_deref(), Some("Gitea <info@gitea.io>"));
        assert_eq!(metadata.project_url.as_deref(), Some("https://gitea.io/"));
        assert_eq!(metadata.repository_url.as_deref(), Some("https://gitea.com/"));
        assert_eq!(
            metadata.description.as_deref(),
            Some("Description of ConanPackage")
        );
        assert_eq!(metadata.keywords, vec!["gitea", "conan"]);
    }

    #[test]
    fn test_parse_conanfile_without_metadata() {
        let metadata = parse_str("class Empty(ConanFile):\n    pass\n");
        assert_eq!(metadata, Metadata::default());

        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, "{}");
    }
}
