//! The element catalog
//!
//! A [`Catalog`] owns every element read from a manifest corpus, an index of
//! their lower-cased names, and the dependency graph built by resolving each
//! element's content specs against the whole element pool.
//!
//! Construction is all-or-nothing. After construction the only mutation is
//! [`Catalog::exclude`], which shrinks the graph.

mod sources;

use crate::element::{Element, ElementError, ElementId};
use crate::graph::DependencyGraph;
use crate::manifest::Manifest;
use crate::pattern::NamePattern;
use crate::query::QueryResult;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Catalog construction errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Not a valid directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record {}: {source}", .path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: ElementError,
    },

    #[error("Failed to read archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    elements: BTreeMap<ElementId, Arc<Element>>,
    /// lower-cased identity or alias -> elements bearing it
    names: BTreeMap<String, BTreeSet<ElementId>>,
    graph: DependencyGraph,
}

impl Catalog {
    /// Build a catalog from already constructed elements.
    ///
    /// Later elements replace earlier ones with the same identity.
    pub fn from_elements<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Element>,
    {
        let mut catalog = Self::default();
        for element in elements {
            catalog.insert(element);
        }
        catalog.resolve_dependencies();
        info!(
            elements = catalog.graph.vertex_count(),
            dependencies = catalog.graph.edge_count(),
            "catalog built"
        );
        catalog
    }

    /// Build a catalog from in-memory manifest records tagged with their origin
    pub fn from_records<I, P>(records: I) -> IngestResult<Self>
    where
        I: IntoIterator<Item = (P, Manifest)>,
        P: Into<PathBuf>,
    {
        let elements = records
            .into_iter()
            .map(|(path, manifest)| {
                let path = path.into();
                Element::from_manifest(&manifest, Some(path.as_path()))
                    .map_err(|source| IngestError::Record { path, source })
            })
            .collect::<IngestResult<Vec<_>>>()?;
        Ok(Self::from_elements(elements))
    }

    /// Build a catalog from every `*.mf` file in one flat directory
    pub fn from_directory(dir: &Path) -> IngestResult<Self> {
        let dir = sources::require_dir(dir)?;
        let elements = sources::read_manifest_dir(dir)?;
        Ok(Self::from_elements(elements))
    }

    /// Build a catalog from a runtime installation.
    ///
    /// Reads feature manifests from `lib/platform` (when present) and
    /// `lib/features`, and with `include_bundles` every `lib/*.jar`.
    pub fn from_install(root: &Path, include_bundles: bool) -> IngestResult<Self> {
        let root = sources::require_dir(root)?;
        let lib = root.join("lib");
        let features = lib.join("features");
        let platform = lib.join("platform");
        sources::require_dir(&lib)?;
        sources::require_dir(&features)?;

        let mut elements = Vec::new();
        if include_bundles {
            elements.extend(sources::read_jar_dir(&lib)?);
        }
        if platform.is_dir() {
            elements.extend(sources::read_manifest_dir(&platform)?);
        } else {
            debug!(path = %platform.display(), "no platform directory");
        }
        elements.extend(sources::read_manifest_dir(&features)?);

        Ok(Self::from_elements(elements))
    }

    fn insert(&mut self, element: Element) {
        let id = element.id().clone();

        if let Some(previous) = self.elements.get(&id) {
            warn!(
                id = %id,
                previous = ?previous.path(),
                replacement = ?element.path(),
                "duplicate element identity, last definition wins"
            );
            self.unindex(&id);
        }

        let identity = id.as_str().to_lowercase();
        for name in element.all_names() {
            if name != identity {
                self.claim_alias(&name, &id);
            }
            self.names.entry(name).or_default().insert(id.clone());
        }

        self.graph.add_vertex(id.clone());
        self.elements.insert(id, Arc::new(element));
    }

    /// An alias has one owner, the latest to claim it. Elements whose
    /// identity spells the same name keep their entry.
    fn claim_alias(&mut self, alias: &str, id: &ElementId) {
        let Some(owners) = self.names.get_mut(alias) else {
            return;
        };
        owners.retain(|owner| {
            let keep = owner == id || owner.as_str().to_lowercase() == alias;
            if !keep {
                warn!(name = %alias, previous = %owner, replacement = %id, "duplicate alias, last definition wins");
            }
            keep
        });
    }

    fn unindex(&mut self, id: &ElementId) {
        self.names.retain(|_, owners| {
            owners.remove(id);
            !owners.is_empty()
        });
    }

    /// Add one edge per resolved spec, from owner to best match
    fn resolve_dependencies(&mut self) {
        let pool: Vec<&Element> = self.elements.values().map(Arc::as_ref).collect();
        let mut edges = Vec::new();

        for element in &pool {
            for spec in element.specs() {
                match spec.find_best_match(pool.iter().copied()) {
                    Some(target) if target.id() == element.id() => {
                        warn!(id = %element.id(), spec = %spec, "element depends on itself, ignoring");
                    }
                    Some(target) => edges.push((element.id().clone(), target.id().clone())),
                    None => debug!(id = %element.id(), spec = %spec, "unresolved dependency"),
                }
            }
        }

        for (from, to) in edges {
            self.graph.add_edge(&from, &to);
        }
    }

    /// Elements still in the graph whose identity or any alias matches
    /// `pattern`, in natural order without duplicates.
    ///
    /// See [`NamePattern`] for the pattern syntax.
    pub fn find_matches(&self, pattern: &str) -> QueryResult<Vec<Arc<Element>>> {
        let pattern = NamePattern::compile(pattern)?;
        Ok(self.matching(&pattern))
    }

    pub(crate) fn matching(&self, pattern: &NamePattern) -> Vec<Arc<Element>> {
        let ids: BTreeSet<&ElementId> = self
            .names
            .iter()
            .filter(|(name, _)| pattern.matches(name))
            .flat_map(|(_, owners)| owners)
            .filter(|id| self.graph.contains(id))
            .collect();
        self.sorted(ids)
    }

    /// Identity lookup; excluded elements are still found here
    pub fn element(&self, id: &ElementId) -> Option<&Arc<Element>> {
        self.elements.get(id)
    }

    /// Whether `id` is still a vertex of the graph
    pub fn contains(&self, id: &ElementId) -> bool {
        self.graph.contains(id)
    }

    /// Elements still in the graph, in natural order
    pub fn elements(&self) -> Vec<Arc<Element>> {
        self.sorted(self.graph.vertices())
    }

    /// Elements nothing depends on, in natural order
    pub fn roots(&self) -> Vec<Arc<Element>> {
        self.sorted(self.graph.roots())
    }

    /// Read-only view of the current dependency graph
    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Remove an element and its edges from the graph.
    ///
    /// Returns false if it was not in the graph.
    pub fn exclude(&mut self, id: &ElementId) -> bool {
        let removed = self.graph.remove_vertex(id);
        if removed {
            debug!(id = %id, "excluded");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.graph.vertex_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    fn sorted<'a, I>(&self, ids: I) -> Vec<Arc<Element>>
    where
        I: IntoIterator<Item = &'a ElementId>,
    {
        let mut found: Vec<Arc<Element>> = ids
            .into_iter()
            .filter_map(|id| self.elements.get(id).cloned())
            .collect();
        found.sort();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{IBM_SHORT_NAME, SUBSYSTEM_CONTENT, SUBSYSTEM_SYMBOLIC_NAME};
    use pretty_assertions::assert_eq;

    fn feature(id: &str, content: &str) -> (String, Manifest) {
        let mut manifest = Manifest::new().with(SUBSYSTEM_SYMBOLIC_NAME, id);
        if !content.is_empty() {
            manifest.insert(SUBSYSTEM_CONTENT, content);
        }
        (format!("{}.mf", id), manifest)
    }

    fn names(elements: &[Arc<Element>]) -> Vec<String> {
        elements.iter().map(|e| e.symbolic_name().to_string()).collect()
    }

    fn chain() -> Catalog {
        Catalog::from_records([
            feature("a", "b; type=\"osgi.subsystem.feature\""),
            feature("b", "c; type=\"osgi.subsystem.feature\""),
            feature("c", ""),
        ])
        .unwrap()
    }

    #[test]
    fn test_edges_from_resolved_specs() {
        let catalog = chain();
        let graph = catalog.dependency_graph();

        assert_eq!(catalog.len(), 3);
        assert!(graph.has_edge(&"a".into(), &"b".into()));
        assert!(graph.has_edge(&"b".into(), &"c".into()));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_resolution_ignores_insertion_order() {
        let catalog = Catalog::from_records([
            feature("c", ""),
            feature("a", "c; type=\"osgi.subsystem.feature\""),
        ])
        .unwrap();
        assert!(catalog.dependency_graph().has_edge(&"a".into(), &"c".into()));
    }

    #[test]
    fn test_unresolved_and_self_dependencies_add_no_edges() {
        let catalog = Catalog::from_records([
            feature("a", "missing; type=\"osgi.subsystem.feature\", a; type=\"osgi.subsystem.feature\""),
        ])
        .unwrap();
        assert_eq!(catalog.dependency_graph().edge_count(), 0);
    }

    #[test]
    fn test_duplicate_identity_last_wins() {
        let catalog = Catalog::from_records([
            feature("a", "b; type=\"osgi.subsystem.feature\""),
            feature("b", ""),
            ("second.mf".to_string(), Manifest::new().with(SUBSYSTEM_SYMBOLIC_NAME, "a")),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let a = catalog.element(&"a".into()).unwrap();
        assert_eq!(a.path(), Some(Path::new("second.mf")));
        assert_eq!(catalog.dependency_graph().edge_count(), 0);
    }

    #[test]
    fn test_find_matches_by_alias() {
        let (path, manifest) = feature("com.example.servlet-4.0; visibility:=public", "");
        let catalog = Catalog::from_records([
            (path, manifest.with(IBM_SHORT_NAME, "Servlet-4.0")),
            feature("com.example.core", ""),
        ])
        .unwrap();

        let found = catalog.find_matches("servlet-*").unwrap();
        assert_eq!(names(&found), vec!["com.example.servlet-4.0"]);

        let all = catalog.find_matches("*").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name(), "Servlet-4.0");
    }

    #[test]
    fn test_alias_never_hides_an_identity() {
        let (path, manifest) = feature("com.example.b; visibility:=public", "");
        let catalog = Catalog::from_records([
            feature("core", ""),
            (path, manifest.with(IBM_SHORT_NAME, "core")),
        ])
        .unwrap();

        let both = vec!["com.example.b", "core"];
        assert_eq!(names(&catalog.find_matches("core").unwrap()), both);
        assert_eq!(names(&catalog.find_matches("*").unwrap()), both);
    }

    #[test]
    fn test_identities_differing_in_case_are_both_found() {
        let catalog = Catalog::from_records([feature("Foo", ""), feature("foo", "")]).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find_matches("*").unwrap().len(), 2);
        assert_eq!(catalog.find_matches("FOO").unwrap().len(), 2);
    }

    #[test]
    fn test_shared_alias_goes_to_the_last_claimant() {
        let (first, first_manifest) = feature("com.example.web-1.0", "");
        let (second, second_manifest) = feature("com.example.web-2.0", "");
        let catalog = Catalog::from_records([
            (first, first_manifest.with(IBM_SHORT_NAME, "web")),
            (second, second_manifest.with(IBM_SHORT_NAME, "web")),
        ])
        .unwrap();

        assert_eq!(
            names(&catalog.find_matches("web").unwrap()),
            vec!["com.example.web-2.0"]
        );
        assert_eq!(catalog.find_matches("com.example.web-*").unwrap().len(), 2);
    }

    #[test]
    fn test_replaced_element_leaves_the_index() {
        let (path, manifest) = feature("a", "");
        let catalog = Catalog::from_records([
            (path, manifest.with(IBM_SHORT_NAME, "old-alias")),
            feature("a", ""),
        ])
        .unwrap();

        assert!(catalog.find_matches("old-alias").unwrap().is_empty());
        assert_eq!(names(&catalog.find_matches("a").unwrap()), vec!["a"]);
    }

    #[test]
    fn test_exclude_hides_element_and_edges() {
        let mut catalog = chain();

        assert!(catalog.exclude(&"b".into()));
        assert!(!catalog.exclude(&"b".into()));
        assert!(!catalog.exclude(&"never".into()));

        assert!(catalog.find_matches("b").unwrap().is_empty());
        assert_eq!(catalog.dependency_graph().edge_count(), 0);
        assert_eq!(names(&catalog.elements()), vec!["a", "c"]);
        assert!(catalog.element(&"b".into()).is_some());
        assert!(!catalog.contains(&"b".into()));
    }

    #[test]
    fn test_roots() {
        assert_eq!(names(&chain().roots()), vec!["a"]);
    }

    #[test]
    fn test_record_failure_names_the_path() {
        let err = Catalog::from_records([(
            "broken.mf",
            Manifest::new().with("Manifest-Version", "1.0"),
        )])
        .unwrap_err();

        assert!(matches!(err, IngestError::Record { ref path, .. } if path == Path::new("broken.mf")));
    }
}
