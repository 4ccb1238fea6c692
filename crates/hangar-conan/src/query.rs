/// Criteria of a recipe search such as `zlib/1.*@conan/*`.
///
/// Each criterion may contain `*` wildcards; a missing, empty or `*` segment does not
/// constrain the search.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeSearchQuery {
    pub name: Option<String>,
    pub version: Option<String>,
    pub user: Option<String>,
    pub channel: Option<String>,
}

impl RecipeSearchQuery {
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() {
            return Self::default();
        }

        let normalized = query.replace('@', "/");
        let mut parts = normalized.split('/').map(|part| match part {
            "" | "*" => None,
            part => Some(part.to_string()),
        });

        Self {
            name: parts.next().flatten(),
            version: parts.next().flatten(),
            user: parts.next().flatten(),
            channel: parts.next().flatten(),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.name.is_none() && self.version.is_none() && self.user.is_none() && self.channel.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(name: Option<&str>, version: Option<&str>, user: Option<&str>, channel: Option<&str>) -> RecipeSearchQuery {
        RecipeSearchQuery {
            name: name.map(String::from),
            version: version.map(String::from),
            user: user.map(String::from),
            channel: channel.map(String::from),
        }
    }

    #[test]
    fn test_parse_query() {
        assert!(RecipeSearchQuery::parse("").is_unconstrained());
        assert!(RecipeSearchQuery::parse("*").is_unconstrained());
        assert_eq!(
            RecipeSearchQuery::parse("ConanPackage"),
            query(Some("ConanPackage"), None, None, None)
        );
        assert_eq!(
            RecipeSearchQuery::parse("ConanPackage/1*2"),
            query(Some("ConanPackage"), Some("1*2"), None, None)
        );
        assert_eq!(
            RecipeSearchQuery::parse("ConanPackage/1.2@"),
            query(Some("ConanPackage"), Some("1.2"), None, None)
        );
        assert_eq!(
            RecipeSearchQuery::parse("ConanPackage/1.2@du*/*st"),
            query(Some("ConanPackage"), Some("1.2"), Some("du*"), Some("*st"))
        );
        assert_eq!(
            RecipeSearchQuery::parse("*/*@*/final"),
            query(None, None, None, Some("final"))
        );
    }
}
