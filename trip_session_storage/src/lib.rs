pub mod constants;
pub mod db;

pub use db::TripDatabase;

#[derive(Debug)]
pub enum StorageError {
    Database(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Database(msg) => write!(f, "database error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}
