use hangar_conan::{PackageReference, RecipeReference};
use hangar_config::config::Config;
use tempfile::TempDir;

use crate::{
    files::{upload_package_file, upload_recipe_file},
    RegistryContext,
};

pub const BASE_URL: &str = "https://registry.example.com/api/conan";

pub struct TestContext {
    pub ctx: RegistryContext,
    _dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default_config();
        config.base_url = Some(BASE_URL.to_string());
        config.root_path = dir.path().display().to_string();

        Self {
            ctx: RegistryContext::in_memory(&config, dir.path().join("blobs")).unwrap(),
            _dir: dir,
        }
    }

    pub fn publish_recipe(&self, reference: &str) -> RecipeReference {
        let rref = RecipeReference::parse(reference).unwrap();
        upload_recipe_file(&self.ctx, &rref, "conanfile.py", b"license = \"MIT\"\n").unwrap();
        upload_recipe_file(&self.ctx, &rref, "conanmanifest.txt", reference.as_bytes()).unwrap();
        rref
    }

    pub fn publish_package(
        &self,
        rref: &RecipeReference,
        reference: &str,
        revision: &str,
    ) -> PackageReference {
        let pref = PackageReference::new(rref.clone(), reference, revision).unwrap();
        upload_package_file(&self.ctx, &pref, "conaninfo.txt", b"[settings]\nos=Linux\n").unwrap();
        upload_package_file(
            &self.ctx,
            &pref,
            "conanmanifest.txt",
            pref.to_string().as_bytes(),
        )
        .unwrap();
        pref
    }
}
