//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory and config file (XDG-compliant)
//! - [`distance`] - Bounded Damerau-Levenshtein distance
//! - [`encoding`] - Variable-length integer encoding (varint) and slice reader
//! - [`paths`] - Canonical keys under the search root
//! - [`progress`] - Progress bar that compiles away without the `progress` feature
//! - [`text`] - Binary detection and BOM handling
//! - [`tokenizer`] - Unicode word extraction with character offsets
//!
//! ## Key Functions
//!
//! ```no_run
//! use findex::utils::{tokenize, damerau_levenshtein_within};
//!
//! let tokens = tokenize("Hello, wörld");
//! // Returns: [hello @ 0, wörld @ 7]
//!
//! let d = damerau_levenshtein_within("world", "wrold", 2);
//! // Returns: Some(1)
//! ```

pub mod app_data;
pub mod distance;
pub mod encoding;
pub mod paths;
pub mod progress;
pub mod text;
pub mod tokenizer;

pub use app_data::*;
pub use distance::*;
pub use encoding::*;
pub use paths::*;
pub use text::*;
pub use tokenizer::*;
