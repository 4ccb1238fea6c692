//! File operations shared by both protocol versions.

use hangar_conan::{
    constants::{is_package_file, is_recipe_file},
    PackageReference, RecipeReference,
};
use hangar_core::{
    error::RegistryError,
    package::{
        files::{read_file, reference_files, FileContent},
        upload::{UploadOutcome, UploadRequest},
    },
    RegistryResult,
};
use tracing::debug;

use crate::{FileList, RegistryContext, Snapshot, UrlMap};

/// `{base}/v1/files/{recipe link}/recipe`
pub fn recipe_files_url(ctx: &RegistryContext, rref: &RecipeReference) -> String {
    format!("{}/v1/files/{}/recipe", ctx.base_url(), rref.link_name())
}

/// `{base}/v1/files/{recipe link}/package/{package link}`
pub fn package_files_url(ctx: &RegistryContext, pref: &PackageReference) -> String {
    format!(
        "{}/v1/files/{}/package/{}",
        ctx.base_url(),
        pref.recipe().link_name(),
        pref.link_name()
    )
}

pub(crate) fn snapshot(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    composite_key: &str,
) -> RegistryResult<Snapshot> {
    let files = ctx
        .db()
        .with_conn(|conn| reference_files(conn, ctx.owner_id(), rref, composite_key))?;

    Ok(files
        .into_iter()
        .map(|(file, blob)| (file.name, blob.hash_md5))
        .collect())
}

pub(crate) fn download_urls(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    composite_key: &str,
    files_url: &str,
) -> RegistryResult<UrlMap> {
    let files = ctx
        .db()
        .with_conn(|conn| reference_files(conn, ctx.owner_id(), rref, composite_key))?;

    Ok(files
        .into_iter()
        .map(|(file, _)| {
            let url = format!("{}/{}", files_url, file.name);
            (file.name, url)
        })
        .collect())
}

/// URLs for the requested files that are accepted; others are left out.
pub(crate) fn upload_urls<'a, I>(files: I, accepts: fn(&str) -> bool, files_url: &str) -> UrlMap
where
    I: IntoIterator<Item = &'a String>,
{
    files
        .into_iter()
        .filter(|name| accepts(name))
        .map(|name| (name.clone(), format!("{}/{}", files_url, name)))
        .collect()
}

pub(crate) fn file_list(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    composite_key: &str,
) -> RegistryResult<FileList> {
    let files = ctx
        .db()
        .with_conn(|conn| reference_files(conn, ctx.owner_id(), rref, composite_key))?;

    Ok(FileList {
        files: files.into_iter().map(|(file, _)| (file.name, ())).collect(),
    })
}

pub fn upload_recipe_file(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    filename: &str,
    content: &[u8],
) -> RegistryResult<UploadOutcome> {
    ctx.uploader().upload(UploadRequest {
        recipe: rref,
        package: None,
        filename,
        content,
    })
}

pub fn upload_package_file(
    ctx: &RegistryContext,
    pref: &PackageReference,
    filename: &str,
    content: &[u8],
) -> RegistryResult<UploadOutcome> {
    ctx.uploader().upload(UploadRequest {
        recipe: pref.recipe(),
        package: Some(pref),
        filename,
        content,
    })
}

pub fn download_recipe_file(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    filename: &str,
) -> RegistryResult<FileContent> {
    if !is_recipe_file(filename) {
        return Err(RegistryError::InvalidFilename(filename.to_string()));
    }

    debug!("downloading {} of {}", filename, rref);
    read_file(
        ctx.db(),
        ctx.blobs(),
        ctx.owner_id(),
        rref,
        &rref.as_key(),
        filename,
    )
}

pub fn download_package_file(
    ctx: &RegistryContext,
    pref: &PackageReference,
    filename: &str,
) -> RegistryResult<FileContent> {
    if !is_package_file(filename) {
        return Err(RegistryError::InvalidFilename(filename.to_string()));
    }

    debug!("downloading {} of {}", filename, pref);
    read_file(
        ctx.db(),
        ctx.blobs(),
        ctx.owner_id(),
        pref.recipe(),
        &pref.as_key(),
        filename,
    )
}

#[cfg(test)]
mod tests {
    use hangar_core::package::upload::UploadOutcome;

    use super::*;
    use crate::{test_utils::TestContext, ProtocolStatus};

    #[test]
    fn test_upload_and_download() {
        let test = TestContext::new();
        let rref = RecipeReference::parse("zlib/1.3@conan/stable").unwrap();

        let outcome = upload_recipe_file(&test.ctx, &rref, "conanfile.py", b"license = \"MIT\"\n")
            .unwrap();
        assert!(matches!(outcome, UploadOutcome::Stored(_)));

        let content = download_recipe_file(&test.ctx, &rref, "conanfile.py").unwrap();
        assert_eq!(content.data, b"license = \"MIT\"\n");
        assert_eq!(content.file.name, "conanfile.py");
    }

    #[test]
    fn test_download_validates_filename() {
        let test = TestContext::new();
        let rref = test.publish_recipe("zlib/1.3");

        let result = download_recipe_file(&test.ctx, &rref, "conaninfo.txt");
        assert_eq!(ProtocolStatus::of(&result), ProtocolStatus::BadRequest);

        let result = download_recipe_file(&test.ctx, &rref, "conan_export.tgz");
        assert_eq!(ProtocolStatus::of(&result), ProtocolStatus::NotFound);

        let missing = RecipeReference::parse("zlib/2.0").unwrap();
        let result = download_recipe_file(&test.ctx, &missing, "conanfile.py");
        assert_eq!(ProtocolStatus::of(&result), ProtocolStatus::NotFound);
    }

    #[test]
    fn test_upload_rejects_wrong_list() {
        let test = TestContext::new();
        let rref = RecipeReference::parse("zlib/1.3").unwrap();
        let pref = PackageReference::new(rref.clone(), "pkg1", "").unwrap();

        let result = upload_recipe_file(&test.ctx, &rref, "conaninfo.txt", b"[settings]\n");
        assert_eq!(ProtocolStatus::of(&result), ProtocolStatus::BadRequest);

        let result = upload_package_file(&test.ctx, &pref, "conanfile.py", b"x = 1\n");
        assert_eq!(ProtocolStatus::of(&result), ProtocolStatus::BadRequest);

        let result = upload_package_file(&test.ctx, &pref, "conan_package.tgz", b"");
        assert!(matches!(result, Ok(UploadOutcome::Ignored)));
    }

    #[test]
    fn test_upload_urls_filter() {
        let files = ["conanfile.py".to_string(), "evil.sh".to_string()];
        let urls = upload_urls(&files, is_recipe_file, "http://host/v1/files/zlib/1.3/_/_/0/recipe");
        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls["conanfile.py"],
            "http://host/v1/files/zlib/1.3/_/_/0/recipe/conanfile.py"
        );
    }
}
