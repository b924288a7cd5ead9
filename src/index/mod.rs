pub mod build;
pub mod fingerprint;
pub mod reader;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod types;
pub mod walker;
pub mod writer;

pub use build::IndexBuilder;
pub use snapshot::{IndexSnapshot, SnapshotUpdate};
pub use stats::IndexStats;
pub use store::IndexStore;
pub use types::*;
pub use walker::{FileFilter, FileWalker};
