#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, QuestionRepository, SnapshotStore, Storage, StorageError,
    SummaryRepository,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
