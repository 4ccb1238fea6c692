use hangar_core::error::RegistryError;

/// Protocol status of an operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolStatus {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

impl ProtocolStatus {
    pub fn code(self) -> u16 {
        match self {
            ProtocolStatus::Ok => 200,
            ProtocolStatus::BadRequest => 400,
            ProtocolStatus::NotFound => 404,
            ProtocolStatus::InternalError => 500,
        }
    }

    pub fn from_error(err: &RegistryError) -> Self {
        if err.is_validation() || matches!(err, RegistryError::DuplicatePackageFile(_)) {
            ProtocolStatus::BadRequest
        } else if err.is_not_found() {
            ProtocolStatus::NotFound
        } else {
            ProtocolStatus::InternalError
        }
    }

    pub fn of<T>(result: &Result<T, RegistryError>) -> Self {
        match result {
            Ok(_) => ProtocolStatus::Ok,
            Err(err) => Self::from_error(err),
        }
    }
}
