//! `eclassdoc_core` parses the structured documentation embedded in eclass
//! comment blocks and keeps an incremental cache of the results, keyed by
//! file modification time.
//!
//! ## Processing Pipeline
//!
//! ```text
//! eclass file
//!   → Document parser (finds `# @MARKER:` comment regions)
//!   → Block parser (splits a region into tags, checks required tags)
//!   → Eclass (immutable field mapping + path + mtime)
//!   → Reconciler (drops removed, parses new and changed eclasses)
//!   → Cache store (versioned file, discarded when corrupt or outdated)
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: The closed registry of block kinds and their tags.
//! - [`config`]: Configuration loading from `eclassdoc.toml`.
//! - [`cache`]: Persisting and inspecting the cache file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::path::Path;
//! use std::path::PathBuf;
//!
//! use eclassdoc_core::CacheStore;
//! use eclassdoc_core::EclassdocConfig;
//! use eclassdoc_core::update_cache;
//!
//! let root = Path::new("/var/db/repos/gentoo");
//! let config = EclassdocConfig::load_or_default(root).unwrap();
//! let store = CacheStore::for_repo(root, &config);
//!
//! let mut live = BTreeMap::new();
//! live.insert("git-r3".to_string(), PathBuf::from("eclass/git-r3.eclass"));
//!
//! let result = update_cache(&store, &live, false).unwrap();
//! if let Some(eclass) = result.repo.get("git-r3") {
//! 	println!("{:?}", eclass.functions());
//! }
//! ```

pub use block::*;
pub use cache::*;
pub use config::*;
pub use document::*;
pub use error::*;
pub use model::*;
pub use reconcile::*;
pub use schema::*;

mod block;
pub mod cache;
pub mod config;
mod document;
#[allow(unused_assignments)]
mod error;
mod model;
mod reconcile;
pub mod schema;

#[cfg(test)]
mod __fixtures;
