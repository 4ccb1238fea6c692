use hangar_conan::{PackageReference, RecipeReference, Result};

/// Raw segments of a request path such as
/// `/v2/conans/{name}/{version}/{user}/{channel}/revisions/{recipe_revision}/packages/{package_reference}`.
///
/// Segments that are not part of the route stay empty. `_` stands for an empty user or
/// channel.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReferencePath {
    pub name: String,
    pub version: String,
    pub user: String,
    pub channel: String,
    pub recipe_revision: String,
    pub package_reference: String,
    pub package_revision: String,
}

impl ReferencePath {
    pub fn recipe(name: &str, version: &str, user: &str, channel: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            user: user.to_string(),
            channel: channel.to_string(),
            ..Default::default()
        }
    }

    pub fn with_recipe_revision(mut self, revision: &str) -> Self {
        self.recipe_revision = revision.to_string();
        self
    }

    pub fn with_package(mut self, reference: &str, revision: &str) -> Self {
        self.package_reference = reference.to_string();
        self.package_revision = revision.to_string();
        self
    }

    pub fn recipe_reference(&self) -> Result<RecipeReference> {
        RecipeReference::new(
            &self.name,
            &self.version,
            &self.user,
            &self.channel,
            &self.recipe_revision,
        )
    }

    /// The package reference, or `None` when the route names no package.
    pub fn package_reference(&self) -> Result<Option<PackageReference>> {
        if self.package_reference.is_empty() {
            return Ok(None);
        }

        let rref = self.recipe_reference()?;
        PackageReference::new(rref, &self.package_reference, &self.package_revision).map(Some)
    }
}
