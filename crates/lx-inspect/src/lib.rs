//! Static analysis of feature manifest corpora
//!
//! Reads feature and bundle manifests, resolves every declared dependency to
//! a concrete element, and assembles the corpus into a dependency graph that
//! can be queried with glob patterns:
//!
//! ```no_run
//! use lx_inspect::{Catalog, QueryEngine};
//! use std::path::Path;
//!
//! let mut catalog = Catalog::from_install(Path::new("/opt/runtime"), false)?;
//! let results = QueryEngine::bind(["servlet-*/**", "!**/test-*"], &mut catalog)?;
//! for element in results.all() {
//!     println!("{} {}", element.glyph(), element.name());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod content_spec;
pub mod element;
pub mod graph;
pub mod manifest;
pub mod pattern;
pub mod query;
pub mod version;

pub use catalog::{Catalog, IngestError, IngestResult};
pub use content_spec::{BundleSpec, ContentSpec, FeatureSpec};
pub use element::{Bundle, Element, ElementError, ElementId, ElementResult, Feature, Visibility};
pub use graph::{DependencyGraph, Direction};
pub use manifest::{parse_entries, Manifest, ManifestEntry, ManifestError, ManifestResult};
pub use pattern::NamePattern;
pub use query::{Query, QueryEngine, QueryError, QueryResult, QueryResults};
pub use version::{Version, VersionError, VersionRange, VersionResult};
