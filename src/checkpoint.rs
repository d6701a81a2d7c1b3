use chrono::{DateTime, Local};
use serde::Serialize;
use std::error::Error;
use std::fmt;

/// A snapshot of session progress handed to the persistence layer.
///
/// Ownership is transient: the session builds one per save request and does
/// not retain it. `completed_words` is the absolute word offset of the cursor
/// at the moment of the save, and is the only value a later session needs in
/// order to resume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    pub project_id: i64,
    pub wpm: u32,
    pub accuracy: u32,
    pub completed_words: usize,
    pub timestamp: DateTime<Local>,
}

/// Failure to persist a checkpoint. The session keeps running when a save
/// fails; only the persisted copy goes stale.
#[derive(Debug)]
pub struct PersistenceError(pub String);

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to save progress: {}", self.0)
    }
}

impl Error for PersistenceError {}

/// Destination for progress checkpoints.
pub trait ProgressSink {
    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), PersistenceError>;
}
