//! Query patterns over a catalog
//!
//! A query is a name pattern with optional modifiers:
//!
//! | syntax        | meaning                                                   |
//! |---------------|-----------------------------------------------------------|
//! | `!pattern`    | exclude the matches from the catalog before including     |
//! | `**/pattern`  | also everything that depends on a match, transitively     |
//! | `pattern/**`  | also everything a match depends on, transitively          |
//!
//! [`QueryEngine::bind`] applies every exclude query first, then evaluates
//! the include queries against the reduced graph and returns an immutable
//! [`QueryResults`] snapshot.

use crate::catalog::Catalog;
use crate::element::{Element, ElementId};
use crate::graph::{DependencyGraph, Direction};
use crate::pattern::NamePattern;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const EXCLUDE_PREFIX: &str = "!";
const CONTAINED_BY_PREFIX: &str = "**/";
const CONTAINED_SUFFIX: &str = "/**";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown pattern syntax '{scheme}' in '{pattern}' (expected 'glob:' or 'regex:')")]
    UnknownSyntax { scheme: String, pattern: String },
}

pub type QueryResult<T> = Result<T, QueryError>;

/// One parsed query pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pattern: String,
    exclude: bool,
    contained: bool,
    contained_by: bool,
}

impl Query {
    /// Strip `!`, then `**/`, then `/**` from the text
    pub fn parse(text: &str) -> Self {
        let mut rest = text;

        let exclude = rest.starts_with(EXCLUDE_PREFIX);
        if exclude {
            rest = &rest[EXCLUDE_PREFIX.len()..];
        }
        let contained_by = rest.starts_with(CONTAINED_BY_PREFIX);
        if contained_by {
            rest = &rest[CONTAINED_BY_PREFIX.len()..];
        }
        let contained = rest.ends_with(CONTAINED_SUFFIX);
        if contained {
            rest = &rest[..rest.len() - CONTAINED_SUFFIX.len()];
        }

        Self {
            pattern: rest.to_string(),
            exclude,
            contained,
            contained_by,
        }
    }

    /// The name pattern left after stripping modifiers
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_exclude(&self) -> bool {
        self.exclude
    }

    /// Follows outgoing edges (`pattern/**`)
    pub fn includes_contained(&self) -> bool {
        self.contained
    }

    /// Follows incoming edges (`**/pattern`)
    pub fn includes_contained_by(&self) -> bool {
        self.contained_by
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exclude {
            f.write_str(EXCLUDE_PREFIX)?;
        }
        if self.contained_by {
            f.write_str(CONTAINED_BY_PREFIX)?;
        }
        f.write_str(&self.pattern)?;
        if self.contained {
            f.write_str(CONTAINED_SUFFIX)?;
        }
        Ok(())
    }
}

/// A query with its selections computed against one graph state
struct Selection {
    primary: BTreeSet<ElementId>,
    contained: BTreeSet<ElementId>,
    contained_by: BTreeSet<ElementId>,
}

impl Selection {
    fn compute(query: &Query, pattern: &NamePattern, catalog: &Catalog) -> Self {
        let graph = catalog.dependency_graph();
        let primary: BTreeSet<ElementId> = catalog
            .matching(pattern)
            .iter()
            .map(|e| e.id().clone())
            .collect();
        let walk = |enabled: bool, direction| {
            if enabled {
                graph.closure(&primary, direction)
            } else {
                BTreeSet::new()
            }
        };
        let contained = walk(query.includes_contained(), Direction::Outgoing);
        let contained_by = walk(query.includes_contained_by(), Direction::Incoming);

        Self {
            primary,
            contained,
            contained_by,
        }
    }

    fn all(&self) -> impl Iterator<Item = &ElementId> {
        self.primary
            .iter()
            .chain(&self.contained)
            .chain(&self.contained_by)
    }
}

/// Binds query patterns to a catalog
pub struct QueryEngine;

impl QueryEngine {
    /// Parse `patterns`, apply the exclude queries to `catalog` in input
    /// order, then evaluate the include queries against what remains.
    ///
    /// Every pattern is compiled before anything is excluded, so an invalid
    /// pattern leaves the catalog untouched.
    pub fn bind<I, S>(patterns: I, catalog: &mut Catalog) -> QueryResult<QueryResults>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for text in patterns {
            let query = Query::parse(text.as_ref());
            let pattern = NamePattern::compile(query.pattern())?;
            compiled.push((query, pattern));
        }

        let mut excluded = BTreeSet::new();
        for (query, pattern) in compiled.iter().filter(|(q, _)| q.is_exclude()) {
            let selection = Selection::compute(query, pattern, catalog);
            let targets: BTreeSet<ElementId> = selection.all().cloned().collect();
            debug!(query = %query, count = targets.len(), "excluding");
            for id in targets {
                if catalog.exclude(&id) {
                    excluded.insert(id);
                }
            }
        }

        let mut includes: Vec<(Query, NamePattern)> = Vec::new();
        for (query, pattern) in compiled {
            if !query.is_exclude() && !includes.iter().any(|(q, _)| q == &query) {
                includes.push((query, pattern));
            }
        }

        let graph = catalog.dependency_graph();
        let selections: Vec<Selection> = includes
            .iter()
            .map(|(query, pattern)| {
                let selection = Selection::compute(query, pattern, catalog);
                debug!(query = %query, primary = selection.primary.len(), "included");
                selection
            })
            .collect();

        let primary: BTreeSet<ElementId> = selections
            .iter()
            .flat_map(|s| s.primary.iter().cloned())
            .collect();
        let interpolated = interpolate(graph, &primary);
        let all: BTreeSet<ElementId> = selections
            .iter()
            .flat_map(|s| s.all().cloned())
            .collect();

        let mut subgraph = graph.induced(&interpolated);
        for selection in &selections {
            subgraph.union_with(&graph.induced(&selection.contained));
            subgraph.union_with(&graph.induced(&selection.contained_by));
        }

        let elements = all
            .iter()
            .chain(&interpolated)
            .filter_map(|id| catalog.element(id).map(|e| (id.clone(), Arc::clone(e))))
            .collect();

        Ok(QueryResults {
            queries: includes.into_iter().map(|(q, _)| q).collect(),
            excluded,
            primary,
            interpolated,
            all,
            subgraph,
            elements,
        })
    }
}

/// Primary elements plus every element on a simple directed path from one
/// primary element to another.
///
/// Walks every simple path leaving each primary element, pruned to vertices
/// that can still reach a primary element. A cycle back to the starting
/// element is not a path between two of them.
fn interpolate(graph: &DependencyGraph, primary: &BTreeSet<ElementId>) -> BTreeSet<ElementId> {
    let candidates = graph.closure(primary, Direction::Incoming);
    let mut found = primary.clone();
    for start in primary.iter().filter(|id| graph.contains(id)) {
        let mut path = vec![start];
        extend_paths(graph, primary, &candidates, &mut path, &mut found);
    }
    found
}

fn extend_paths<'g>(
    graph: &'g DependencyGraph,
    primary: &BTreeSet<ElementId>,
    candidates: &BTreeSet<ElementId>,
    path: &mut Vec<&'g ElementId>,
    found: &mut BTreeSet<ElementId>,
) {
    let Some(&last) = path.last() else {
        return;
    };
    for next in graph.successors(last) {
        if !candidates.contains(next) || path.contains(&next) {
            continue;
        }
        path.push(next);
        if primary.contains(next) {
            found.extend(path.iter().map(|&id| id.clone()));
        }
        extend_paths(graph, primary, candidates, path, found);
        path.pop();
    }
}

/// The outcome of binding queries to a catalog
#[derive(Debug, Clone)]
pub struct QueryResults {
    queries: Vec<Query>,
    excluded: BTreeSet<ElementId>,
    primary: BTreeSet<ElementId>,
    interpolated: BTreeSet<ElementId>,
    all: BTreeSet<ElementId>,
    subgraph: DependencyGraph,
    elements: BTreeMap<ElementId, Arc<Element>>,
}

impl QueryResults {
    /// Elements matched directly by an include query
    pub fn primary(&self) -> Vec<Arc<Element>> {
        self.sorted(&self.primary)
    }

    /// Primary elements plus those on a path between two of them
    pub fn interpolated(&self) -> Vec<Arc<Element>> {
        self.sorted(&self.interpolated)
    }

    /// Every element selected by an include query, with its modifiers applied
    pub fn all(&self) -> Vec<Arc<Element>> {
        self.sorted(&self.all)
    }

    /// The graph to render: induced on the interpolated set, plus the
    /// contained and contained-by subgraphs of each include query
    pub fn subgraph(&self) -> &DependencyGraph {
        &self.subgraph
    }

    pub fn element(&self, id: &ElementId) -> Option<&Arc<Element>> {
        self.elements.get(id)
    }

    pub fn is_primary(&self, element: &Element) -> bool {
        self.primary.contains(element.id())
    }

    /// Identities removed by exclude queries
    pub fn excluded(&self) -> &BTreeSet<ElementId> {
        &self.excluded
    }

    /// Distinct include queries in input order
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    fn sorted(&self, ids: &BTreeSet<ElementId>) -> Vec<Arc<Element>> {
        let mut found: Vec<Arc<Element>> = ids
            .iter()
            .filter_map(|id| self.elements.get(id).cloned())
            .collect();
        found.sort();
        found
    }
}
