//! Directed dependency graph over element identities
//!
//! A simple directed graph: no self loops and at most one edge per ordered
//! pair of vertices. An edge `a -> b` means `a` depends on (contains) `b`.

use crate::element::ElementId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Which way to follow edges when walking the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From an element to what it depends on
    Outgoing,
    /// From an element to what depends on it
    Incoming,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// vertex -> direct dependencies
    outgoing: BTreeMap<ElementId, BTreeSet<ElementId>>,
    /// vertex -> direct dependents
    incoming: BTreeMap<ElementId, BTreeSet<ElementId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex; returns false if it was already present
    pub fn add_vertex(&mut self, id: ElementId) -> bool {
        if self.outgoing.contains_key(&id) {
            return false;
        }
        self.incoming.insert(id.clone(), BTreeSet::new());
        self.outgoing.insert(id, BTreeSet::new());
        true
    }

    /// Add an edge between two existing vertices.
    ///
    /// Returns false for loops, missing endpoints and edges already present.
    pub fn add_edge(&mut self, from: &ElementId, to: &ElementId) -> bool {
        if from == to || !self.contains(from) || !self.contains(to) {
            return false;
        }
        let added = self
            .outgoing
            .get_mut(from)
            .is_some_and(|targets| targets.insert(to.clone()));
        if added {
            if let Some(sources) = self.incoming.get_mut(to) {
                sources.insert(from.clone());
            }
        }
        added
    }

    /// Remove a vertex and every edge touching it; returns false if absent
    pub fn remove_vertex(&mut self, id: &ElementId) -> bool {
        let Some(targets) = self.outgoing.remove(id) else {
            return false;
        };
        let sources = self.incoming.remove(id).unwrap_or_default();

        for target in &targets {
            if let Some(set) = self.incoming.get_mut(target) {
                set.remove(id);
            }
        }
        for source in &sources {
            if let Some(set) = self.outgoing.get_mut(source) {
                set.remove(id);
            }
        }
        true
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.outgoing.contains_key(id)
    }

    pub fn has_edge(&self, from: &ElementId, to: &ElementId) -> bool {
        self.outgoing
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    pub fn vertex_count(&self) -> usize {
        self.outgoing.len()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    /// Vertices in identity order
    pub fn vertices(&self) -> impl Iterator<Item = &ElementId> {
        self.outgoing.keys()
    }

    /// Every edge as `(from, to)`
    pub fn edges(&self) -> impl Iterator<Item = (&ElementId, &ElementId)> {
        self.outgoing
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
    }

    /// Direct neighbours of `id` in the given direction; empty if absent
    pub fn neighbors(
        &self,
        id: &ElementId,
        direction: Direction,
    ) -> impl Iterator<Item = &ElementId> {
        let map = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        map.get(id).into_iter().flatten()
    }

    /// What `id` directly depends on
    pub fn successors(&self, id: &ElementId) -> impl Iterator<Item = &ElementId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// What directly depends on `id`
    pub fn predecessors(&self, id: &ElementId) -> impl Iterator<Item = &ElementId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Vertices nothing depends on
    pub fn roots(&self) -> impl Iterator<Item = &ElementId> {
        self.incoming
            .iter()
            .filter(|(_, sources)| sources.is_empty())
            .map(|(id, _)| id)
    }

    /// Every vertex reachable from `seeds` in `direction`, seeds included.
    ///
    /// Breadth-first; a vertex is expanded at most once, so cycles terminate.
    /// Seeds that are not vertices are ignored.
    pub fn closure<'a, I>(&self, seeds: I, direction: Direction) -> BTreeSet<ElementId>
    where
        I: IntoIterator<Item = &'a ElementId>,
    {
        let mut seen: BTreeSet<ElementId> = BTreeSet::new();
        let mut frontier = VecDeque::new();

        for seed in seeds {
            if self.contains(seed) && seen.insert(seed.clone()) {
                frontier.push_back(seed);
            }
        }

        while let Some(current) = frontier.pop_front() {
            for next in self.neighbors(current, direction) {
                if seen.insert(next.clone()) {
                    frontier.push_back(next);
                }
            }
        }

        seen
    }

    /// The subgraph induced on `vertices`: those vertices that exist here, and
    /// every edge between two of them.
    pub fn induced(&self, vertices: &BTreeSet<ElementId>) -> DependencyGraph {
        let mut subgraph = DependencyGraph::new();
        for id in vertices.iter().filter(|id| self.contains(id)) {
            subgraph.add_vertex(id.clone());
        }
        for (from, to) in self.edges() {
            if vertices.contains(from) && vertices.contains(to) {
                subgraph.add_edge(from, to);
            }
        }
        subgraph
    }

    /// Add every vertex and edge of `other` to this graph
    pub fn union_with(&mut self, other: &DependencyGraph) {
        for id in other.vertices() {
            self.add_vertex(id.clone());
        }
        for (from, to) in other.edges() {
            self.add_edge(from, to);
        }
    }
}
