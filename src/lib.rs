//! # findex - local full-text search
//!
//! findex indexes a directory tree of text files and answers queries with
//! boolean, phrase, prefix and fuzzy semantics. Every match is reported as a
//! document key plus a character offset, which can be turned back into a
//! readable window of the file.
//!
//! ## Architecture
//!
//! - [`index`] - File walking, change detection, versioned snapshots, persistence
//! - [`query`] - Query compilation, term expansion, ranked execution
//! - [`chunk`] - Character-accurate text windows
//! - [`listing`] - Directory listings under the root
//! - [`engine`] - Facade tying the pieces together
//! - [`utils`] - Tokenizer, edit distance, path resolution, encoding
//!
//! ## Quick Start
//!
//! ```no_run
//! use findex::{EngineConfig, SearchEngine};
//!
//! let engine = SearchEngine::open(EngineConfig::new("/path/to/docs")).unwrap();
//! engine.refresh().unwrap();
//!
//! let page = engine.search("world~1", None, 0).unwrap();
//! for hit in page.hits {
//!     println!("{}:{} ({:.2})", hit.path, hit.char_offset, hit.score);
//! }
//! ```
//!
//! ## Concurrency
//!
//! The engine is `Sync`. Searches run against an immutable snapshot that a
//! refresh replaces atomically, so readers never observe a half-built index
//! and never wait for a build to finish.

pub mod chunk;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod listing;
pub mod output;
pub mod query;
pub mod utils;

pub use chunk::Chunk;
pub use config::{EngineConfig, PathMode};
pub use engine::{SearchEngine, SearchHit, SearchPage};
pub use error::{SearchError, SearchResult};
pub use listing::{DirEntryInfo, EntryKind};
