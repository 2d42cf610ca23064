//! # Relation Graph
//!
//! Deduplicated, edge-labeled graph of classified aspects.
//!
//! Labels are interned to dense `NodeIdx` values and edges are bucketed by
//! unordered pair, so `has_aspect` is one hash probe plus a scan of the
//! (tiny) per-pair aspect list. The pattern matcher calls it once per role
//! pair per candidate subset; a rescan of all edges there would dominate.
//!
//! Dedup rule: one edge per (unordered pair, aspect). The first insertion
//! wins; later ones, including their orb, are dropped.

use std::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::model::*;

// ============================================================================
// Identifiers
// ============================================================================

/// Dense node index, stable for the lifetime of one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(pub u32);

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unordered pair key, low index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PairKey(NodeIdx, NodeIdx);

impl PairKey {
    fn new(a: NodeIdx, b: NodeIdx) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

#[derive(Debug, Clone)]
struct NodeEntry {
    label: String,
    origin: Origin,
    /// Number of stored edges touching this node.
    degree: usize,
}

#[derive(Debug, Clone, Copy)]
struct EdgeSlot {
    aspect: AspectKind,
    orb: f64,
    /// Insertion sequence, for reproducible `edges()` ordering.
    seq: u64,
}

// ============================================================================
// RelationGraph
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    nodes: Vec<NodeEntry>,
    by_label: HashMap<String, NodeIdx>,
    pairs: HashMap<PairKey, SmallVec<[EdgeSlot; 2]>>,
    next_seq: u64,
    edge_count: usize,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already classified edges, e.g. a resolver's output.
    pub fn from_edges<'e>(edges: impl IntoIterator<Item = &'e AspectEdge>) -> Self {
        let mut graph = Self::new();
        for e in edges {
            graph.add(&e.a, &e.b, e.aspect, e.orb);
        }
        graph
    }

    fn intern(&mut self, label: &str) -> NodeIdx {
        if let Some(&idx) = self.by_label.get(label) {
            return idx;
        }
        let idx = NodeIdx(self.nodes.len() as u32);
        self.nodes.push(NodeEntry {
            label: label.to_string(),
            origin: Origin::Unmarked,
            degree: 0,
        });
        self.by_label.insert(label.to_string(), idx);
        idx
    }

    /// Record a point's origin. Points without edges do not appear in `nodes()`.
    pub fn register(&mut self, point: &Point) -> NodeIdx {
        let idx = self.intern(&point.label);
        self.nodes[idx.0 as usize].origin = point.origin;
        idx
    }

    /// Insert an aspect edge. Returns `false` if the same unordered pair
    /// already carries `aspect`, or if `a == b`.
    pub fn add(&mut self, a: &str, b: &str, aspect: AspectKind, orb: f64) -> bool {
        if a == b {
            debug!(label = a, "ignoring self-aspect");
            return false;
        }
        let ia = self.intern(a);
        let ib = self.intern(b);

        let slots = self.pairs.entry(PairKey::new(ia, ib)).or_default();
        if slots.iter().any(|s| s.aspect == aspect) {
            return false;
        }
        slots.push(EdgeSlot { aspect, orb, seq: self.next_seq });
        self.next_seq += 1;
        self.edge_count += 1;
        self.nodes[ia.0 as usize].degree += 1;
        self.nodes[ib.0 as usize].degree += 1;
        true
    }

    /// Remove one edge. Returns whether it existed.
    pub fn remove(&mut self, a: &str, b: &str, aspect: AspectKind) -> bool {
        let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) else {
            return false;
        };
        let key = PairKey::new(ia, ib);
        let Some(slots) = self.pairs.get_mut(&key) else {
            return false;
        };
        let before = slots.len();
        slots.retain(|s| s.aspect != aspect);
        if slots.len() == before {
            return false;
        }
        if slots.is_empty() {
            self.pairs.remove(&key);
        }
        self.edge_count -= 1;
        self.nodes[ia.0 as usize].degree -= 1;
        self.nodes[ib.0 as usize].degree -= 1;
        true
    }

    /// Whether the unordered pair carries any aspect in `accepted`.
    pub fn has_aspect(&self, a: &str, b: &str, accepted: &[AspectKind]) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(ia), Some(ib)) => self.has_aspect_idx(ia, ib, accepted),
            _ => false,
        }
    }

    /// Index-level `has_aspect`, used by the matcher's inner loop.
    pub fn has_aspect_idx(&self, a: NodeIdx, b: NodeIdx, accepted: &[AspectKind]) -> bool {
        self.pairs
            .get(&PairKey::new(a, b))
            .is_some_and(|slots| slots.iter().any(|s| accepted.contains(&s.aspect)))
    }

    /// Aspects stored between `a` and `b`, in insertion order.
    pub fn aspects_between(&self, a: &str, b: &str) -> Vec<(AspectKind, f64)> {
        let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) else {
            return Vec::new();
        };
        self.pairs
            .get(&PairKey::new(ia, ib))
            .map(|slots| slots.iter().map(|s| (s.aspect, s.orb)).collect())
            .unwrap_or_default()
    }

    /// Labels of every node with at least one edge, sorted.
    pub fn nodes(&self) -> Vec<&str> {
        self.node_indices().into_iter().map(|i| self.label(i)).collect()
    }

    /// Indices of every node with at least one edge, sorted by label.
    pub fn node_indices(&self) -> Vec<NodeIdx> {
        let mut ids: Vec<NodeIdx> = (0..self.nodes.len() as u32)
            .map(NodeIdx)
            .filter(|i| self.nodes[i.0 as usize].degree > 0)
            .collect();
        ids.sort_by(|x, y| self.label(*x).cmp(self.label(*y)));
        ids
    }

    pub fn index_of(&self, label: &str) -> Option<NodeIdx> {
        self.by_label.get(label).copied()
    }

    /// Label for an index handed out by this graph.
    pub fn label(&self, idx: NodeIdx) -> &str {
        &self.nodes[idx.0 as usize].label
    }

    pub fn origin(&self, label: &str) -> Option<Origin> {
        self.index_of(label).map(|i| self.origin_idx(i))
    }

    pub fn origin_idx(&self, idx: NodeIdx) -> Origin {
        self.nodes[idx.0 as usize].origin
    }

    /// Every stored edge in insertion order.
    pub fn edges(&self) -> Vec<AspectEdge> {
        let mut flat: Vec<(u64, AspectEdge)> = self
            .pairs
            .iter()
            .flat_map(|(key, slots)| {
                slots.iter().map(move |s| {
                    (s.seq, AspectEdge::new(self.label(key.0), self.label(key.1), s.aspect, s.orb))
                })
            })
            .collect();
        flat.sort_by_key(|(seq, _)| *seq);
        flat.into_iter().map(|(_, e)| e).collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.degree > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }
}
