//! Parser for `conaninfo.txt`, the build configuration of a binary package.

use std::{
    collections::{BTreeMap, HashMap},
    io::Read,
};

use serde::{Deserialize, Serialize};

use crate::error::{ConanError, Result};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conaninfo {
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub full_settings: BTreeMap<String, String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub full_requires: Vec<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub full_options: BTreeMap<String, String>,
    #[serde(default)]
    pub recipe_hash: String,
    #[serde(default)]
    pub environment: BTreeMap<String, Vec<String>>,
}

pub fn parse<R: Read>(mut reader: R) -> Result<Conaninfo> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|err| ConanError::Read(err.to_string()))?;

    parse_str(&content)
}

pub fn parse_str(content: &str) -> Result<Conaninfo> {
    let sections = read_sections(content)?;
    let section = |name: &str| sections.get(name).map(Vec::as_slice).unwrap_or_default();

    Ok(Conaninfo {
        settings: to_map(section("settings")),
        full_settings: to_map(section("full_settings")),
        requires: section("requires").iter().map(|s| s.to_string()).collect(),
        full_requires: section("full_requires")
            .iter()
            .map(|s| s.to_string())
            .collect(),
        options: to_map(section("options")),
        full_options: to_map(section("full_options")),
        recipe_hash: section("recipe_hash")
            .first()
            .map(|s| s.to_string())
            .unwrap_or_default(),
        environment: to_environment(section("env")),
    })
}

fn read_sections(content: &str) -> Result<HashMap<&str, Vec<&str>>> {
    let mut sections: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut current: Option<&str> = None;

    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            if sections.contains_key(name) {
                return Err(ConanError::InvalidConaninfo(format!(
                    "duplicate section [{name}]"
                )));
            }
            sections.insert(name, Vec::new());
            current = Some(name);
            continue;
        }

        match current.and_then(|name| sections.get_mut(name)) {
            Some(lines) => lines.push(line),
            None => {
                return Err(ConanError::InvalidConaninfo(format!(
                    "content outside of a section: {line}"
                )))
            }
        }
    }

    Ok(sections)
}

fn to_map(lines: &[&str]) -> BTreeMap<String, String> {
    lines
        .iter()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn to_environment(lines: &[&str]) -> BTreeMap<String, Vec<String>> {
    lines
        .iter()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let values = match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                Some(list) => list
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect(),
                None => vec![value.to_string()],
            };
            (key.trim().to_string(), values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONANINFO: &str = r#"[settings]
    arch=x84_64
    build_type=Release
    compiler=gcc
    compiler.version=7
    os=Linux

[requires]
    fmt/7.Y.Z

[options]
    shared=False

[full_settings]
    arch=x84_64
    build_type=Release
    compiler=gcc
    compiler.version=7
    os=Linux

[full_requires]
    fmt/7.1.3:0123456789abcdef

[full_options]
    shared=False

[recipe_hash]
    74714915a51073acb548ca1ce29afbac

[env]
CC=gcc-10
PATH=[/usr/local/bin, /opt/bin]
"#;

    #[test]
    fn test_parse_conaninfo() {
        let info = parse(CONANINFO.as_bytes()).unwrap();

        assert_eq!(info.settings.len(), 5);
        assert_eq!(info.settings["compiler.version"], "7");
        assert_eq!(info.full_settings["os"], "Linux");
        assert_eq!(info.requires, vec!["fmt/7.Y.Z"]);
        assert_eq!(info.full_requires, vec!["fmt/7.1.3:0123456789abcdef"]);
        assert_eq!(info.options["shared"], "False");
        assert_eq!(info.full_options["shared"], "False");
        assert_eq!(info.recipe_hash, "74714915a51073acb548ca1ce29afbac");
        assert_eq!(info.environment["CC"], vec!["gcc-10"]);
        assert_eq!(info.environment["PATH"], vec!["/usr/local/bin", "/opt/bin"]);
    }

    #[test]
    fn test_parse_conaninfo_errors() {
        assert!(matches!(
            parse_str("os=Linux\n[settings]\n"),
            Err(ConanError::InvalidConaninfo(_))
        ));
        assert!(matches!(
            parse_str("[settings]\nos=Linux\n[settings]\narch=x86\n"),
            Err(ConanError::InvalidConaninfo(_))
        ));
    }

    #[test]
    fn test_parse_empty_conaninfo() {
        assert_eq!(parse_str("").unwrap(), Conaninfo::default());
    }

    #[test]
    fn test_json_shape() {
        let info = parse_str("[settings]\nos=Linux\n").unwrap();
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["settings"]["os"], "Linux");
        assert!(value["full_requires"].as_array().unwrap().is_empty());
    }
}
