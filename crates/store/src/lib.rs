//! Vector table implementations for docqa.

pub mod in_memory;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod connection;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use in_memory::InMemoryTable;
pub use vector::{cosine_similarity, rank_by_similarity};

#[cfg(feature = "sqlite")]
pub use sqlite::{Database, SqliteTable};
