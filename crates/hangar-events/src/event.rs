/// Events emitted by registry mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A package version was created by an upload.
    PackageCreated {
        owner_id: i64,
        name: String,
        version: String,
    },
    /// A file was stored under a package version.
    FileUploaded {
        owner_id: i64,
        name: String,
        version: String,
        file: String,
        composite_key: String,
    },
    /// Files of a package version were removed while the version kept other files.
    FilesRemoved {
        owner_id: i64,
        name: String,
        version: String,
        count: usize,
    },
    /// A package version lost its last file and was deleted.
    PackageDeleted {
        owner_id: i64,
        name: String,
        version: String,
    },
}

impl RegistryEvent {
    /// Package name and version the event refers to.
    pub fn coordinate(&self) -> (&str, &str) {
        match self {
            RegistryEvent::PackageCreated {
                name,
                version,
                ..
            }
            | RegistryEvent::FileUploaded {
                name,
                version,
                ..
            }
            | RegistryEvent::FilesRemoved {
                name,
                version,
                ..
            }
            | RegistryEvent::PackageDeleted {
                name,
                version,
                ..
            } => (name, version),
        }
    }
}
