use error::RegistryError;

pub mod database;
pub mod error;
pub mod package;
pub mod storage;

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Current time as unix seconds, the resolution used for every `created_unix` column.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod test_utils;
