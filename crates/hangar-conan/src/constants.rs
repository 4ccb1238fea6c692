//! Names shared between the write path, the resolver and the protocol layer.

/// Revision substituted for an unspecified recipe or package revision.
pub const DEFAULT_REVISION: &str = "0";

pub const PROPERTY_RECIPE_USER: &str = "conan.recipe.user";
pub const PROPERTY_RECIPE_CHANNEL: &str = "conan.recipe.channel";
pub const PROPERTY_RECIPE_REVISION: &str = "conan.recipe.revision";
pub const PROPERTY_PACKAGE_REFERENCE: &str = "conan.package.reference";
pub const PROPERTY_PACKAGE_REVISION: &str = "conan.package.revision";
pub const PROPERTY_PACKAGE_INFO: &str = "conan.package.info";

pub const CONANFILE_FILE: &str = "conanfile.py";
pub const CONANINFO_FILE: &str = "conaninfo.txt";
pub const CONAN_MANIFEST_FILE: &str = "conanmanifest.txt";

/// Files accepted for a recipe revision.
pub const RECIPE_FILES: &[&str] = &[
    CONANFILE_FILE,
    CONAN_MANIFEST_FILE,
    "conan_sources.tgz",
    "conan_export.tgz",
];

/// Files accepted for a package revision.
pub const PACKAGE_FILES: &[&str] = &[CONANINFO_FILE, CONAN_MANIFEST_FILE, "conan_package.tgz"];

pub fn is_recipe_file(name: &str) -> bool {
    RECIPE_FILES.contains(&name)
}

pub fn is_package_file(name: &str) -> bool {
    PACKAGE_FILES.contains(&name)
}
