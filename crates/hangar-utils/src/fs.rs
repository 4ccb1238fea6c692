use std::{fs, io::Write, path::Path};

use crate::error::{FileSystemError, FileSystemResult};

/// Creates `path` and its parents unless it already is a directory.
///
/// # Errors
///
/// * [`FileSystemError::Directory`] if the directory could not be created.
/// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    fs::create_dir_all(path).map_err(|err| {
        FileSystemError::Directory {
            path: path.to_path_buf(),
            action: "create",
            source: err,
        }
    })
}

/// Removes a file, or a directory recursively. A missing path is not an error.
pub fn safe_remove<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
            Err(FileSystemError::File {
                path: path.to_path_buf(),
                action: "remove",
                source: err,
            })
        }
        _ => Ok(()),
    }
}

/// Writes `data` through a sibling `.part.<pid>` file renamed over `path`, so a blob is
/// either absent or complete.
pub fn write_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> FileSystemResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(format!(".part.{}", std::process::id()));
    let tmp_path = Path::new(&tmp_name);

    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(tmp_path, path)
    };

    write().map_err(|err| {
        let _ = fs::remove_file(tmp_path);
        FileSystemError::File {
            path: path.to_path_buf(),
            action: "write",
            source: err,
        }
    })
}
