//! Search engine over one directory tree.
//!
//! ```no_run
//! use findex::{EngineConfig, SearchEngine};
//!
//! let engine = SearchEngine::open(EngineConfig::new("/path/to/notes")).unwrap();
//! engine.refresh().unwrap();
//!
//! let page = engine.search("\"error handling\" OR panic*", Some("*.md"), 0).unwrap();
//! for hit in &page.hits {
//!     let chunk = engine.read_chunk(&hit.path, hit.char_offset as usize).unwrap();
//!     println!("{}: {}", hit.path, chunk.text);
//! }
//! ```

use crate::chunk::{Chunk, ChunkExtractor};
use crate::config::EngineConfig;
use crate::error::SearchResult;
use crate::index::build::{IndexBuilder, canonical_root};
use crate::index::reader::read_snapshot;
use crate::index::snapshot::IndexSnapshot;
use crate::index::stats::IndexStats;
use crate::index::store::IndexStore;
use crate::index::types::RefreshStats;
use crate::index::walker::FileFilter;
use crate::index::writer::write_snapshot;
use crate::listing::{DirEntryInfo, DirectoryLister};
use crate::query::{Matches, compile, execute};
use crate::utils::PathResolver;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// One search result with its path rendered for the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub char_offset: u32,
    pub score: f32,
}

/// A page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    /// Results across all pages
    pub total: usize,
    pub skip: usize,
    pub hits: Vec<SearchHit>,
}

impl SearchPage {
    /// Whether results remain after this page
    pub fn has_more(&self) -> bool {
        self.skip + self.hits.len() < self.total
    }
}

pub struct SearchEngine {
    config: EngineConfig,
    resolver: PathResolver,
    store: IndexStore,
    builder: IndexBuilder,
    chunks: ChunkExtractor,
    lister: DirectoryLister,
}

impl SearchEngine {
    /// Open the engine, loading the persisted snapshot if there is one.
    ///
    /// Nothing is indexed here; call [`refresh`](Self::refresh) to bring the
    /// index up to date. An unreadable snapshot is discarded, so the next
    /// refresh rebuilds from scratch.
    pub fn open(mut config: EngineConfig) -> SearchResult<Self> {
        config.root = canonical_root(&config.root)?;
        let resolver = PathResolver::new(&config.root, config.path_mode);

        let initial = match &config.index_dir {
            Some(dir) => match read_snapshot(dir, &resolver) {
                Ok(Some(snapshot)) => {
                    info!(
                        version = snapshot.version(),
                        documents = snapshot.doc_count(),
                        "loaded persisted index"
                    );
                    snapshot
                }
                Ok(None) => IndexSnapshot::empty(),
                Err(err) => {
                    warn!(error = %err, "discarding unreadable index, a full build will follow");
                    IndexSnapshot::empty()
                }
            },
            None => IndexSnapshot::empty(),
        };

        Ok(Self {
            builder: IndexBuilder::new(&config, resolver.clone()),
            chunks: ChunkExtractor::new(resolver.clone(), config.chunk_before, config.chunk_after),
            lister: DirectoryLister::new(resolver.clone()),
            store: IndexStore::new(initial),
            resolver,
            config,
        })
    }

    /// Show a progress bar while files are tokenized
    pub fn with_progress(mut self, show: bool) -> Self {
        self.builder = self.builder.with_progress(show);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Canonical search root
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Render a document key per the configured path mode
    pub fn render(&self, key: &str) -> String {
        self.resolver.render(key)
    }

    /// The current snapshot; unaffected by later refreshes
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.store.snapshot()
    }

    /// Re-index added and changed files and drop removed ones
    pub fn refresh(&self) -> SearchResult<RefreshStats> {
        let (snapshot, stats) = self.builder.refresh(&self.store)?;
        if !stats.is_noop() {
            self.persist(&snapshot);
        }
        Ok(stats)
    }

    /// Re-index every file from scratch
    pub fn rebuild(&self) -> SearchResult<RefreshStats> {
        let (snapshot, stats) = self.builder.rebuild(&self.store)?;
        self.persist(&snapshot);
        Ok(stats)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats::collect(
            &self.config.root,
            &self.store.snapshot(),
            self.config.index_dir.as_deref(),
        )
    }

    /// One page of results for `query`, optionally restricted to files
    /// matching the glob `file_pattern`, after skipping `skip` results
    pub fn search(&self, query: &str, file_pattern: Option<&str>, skip: usize) -> SearchResult<SearchPage> {
        let matches = self.matches(query, file_pattern, skip)?;
        let total = matches.total();
        let hits = matches
            .take(self.config.page_size)
            .map(|m| SearchHit {
                path: self.resolver.render(&m.key),
                char_offset: m.offset,
                score: m.score,
            })
            .collect();
        Ok(SearchPage { total, skip, hits })
    }

    /// All results for `query`, lazily, against the current snapshot
    pub fn matches(&self, query: &str, file_pattern: Option<&str>, skip: usize) -> SearchResult<Matches> {
        let node = compile(query)?;
        let filter = file_pattern.map(FileFilter::new).transpose()?.flatten();
        let snapshot = self.store.snapshot();
        Ok(execute(&node, &snapshot, filter.as_ref(), skip))
    }

    pub fn read_chunk(&self, file: &str, char_offset: usize) -> SearchResult<Chunk> {
        self.chunks.read(file, char_offset)
    }

    /// List a directory; `None` lists the root
    pub fn list_directory(&self, path: Option<&str>) -> SearchResult<Vec<DirEntryInfo>> {
        self.lister.list(path.unwrap_or(""))
    }

    fn persist(&self, snapshot: &IndexSnapshot) {
        let Some(dir) = &self.config.index_dir else {
            return;
        };
        // Already published; a failed write is not fatal
        if let Err(err) = write_snapshot(dir, &self.config.root, snapshot) {
            warn!(error = %err, "failed to persist index");
        }
    }
}
