use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// The location provider rejected the update request.
    PermissionDenied,
    /// A repository call failed. The live session is not rolled back.
    Persistence(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::PermissionDenied => write!(f, "location permission denied"),
            EngineError::Persistence(msg) => write!(f, "persistence failure: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
