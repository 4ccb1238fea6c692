use std::{error::Error, fmt, path::PathBuf};

#[derive(Debug)]
pub enum HashError {
    Mismatch { expected: String, actual: String },
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashError::Mismatch { expected, actual } => {
                write!(f, "Content hash mismatch: expected {expected}, got {actual}")
            }
        }
    }
}

impl Error for HashError {}

#[derive(Debug)]
pub enum PathError {
    CurrentDir { source: std::io::Error },

    Empty,

    MissingEnvVar { var: String, input: String },

    UnclosedVariable { input: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "Path is empty"),
            PathError::CurrentDir { source } => {
                write!(f, "Failed to get current directory: {source}")
            }
            PathError::UnclosedVariable { input } => {
                write!(f, "Unclosed variable expression starting at `{input}`")
            }
            PathError::MissingEnvVar { var, input } => {
                write!(f, "Environment variable `{var}` not set in `{input}`")
            }
        }
    }
}

impl Error for PathError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PathError::CurrentDir { source } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum FileSystemError {
    File {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },

    Directory {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },

    NotADirectory {
        path: PathBuf,
    },
}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSystemError::File {
                path,
                action,
                source,
            } => {
                write!(f, "Failed to {action} file `{}`: {source}", path.display())
            }
            FileSystemError::Directory {
                path,
                action,
                source,
            } => {
                write!(
                    f,
                    "Failed to {action} directory `{}`: {source}",
                    path.display()
                )
            }
            FileSystemError::NotADirectory { path } => {
                write!(f, "`{}` is not a directory", path.display())
            }
        }
    }
}

impl Error for FileSystemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FileSystemError::File { source, .. } => Some(source),
            FileSystemError::Directory { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum UtilsError {
    Hash(HashError),
    Path(PathError),
    FileSystem(FileSystemError),
}

impl fmt::Display for UtilsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilsError::Hash(err) => write!(f, "{err}"),
            UtilsError::Path(err) => write!(f, "{err}"),
            UtilsError::FileSystem(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UtilsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            UtilsError::Hash(err) => Some(err),
            UtilsError::Path(err) => Some(err),
            UtilsError::FileSystem(err) => Some(err),
        }
    }
}

impl From<HashError> for UtilsError {
    fn from(err: HashError) -> Self {
        UtilsError::Hash(err)
    }
}

impl From<PathError> for UtilsError {
    fn from(err: PathError) -> Self {
        UtilsError::Path(err)
    }
}

impl From<FileSystemError> for UtilsError {
    fn from(err: FileSystemError) -> Self {
        UtilsError::FileSystem(err)
    }
}

pub type FileSystemResult<T> = std::result::Result<T, FileSystemError>;
pub type HashResult<T> = std::result::Result<T, HashError>;
pub type PathResult<T> = std::result::Result<T, PathError>;

pub type UtilsResult<T> = std::result::Result<T, UtilsError>;
