//! Lineage Graph Engine
//!
//! Pure functions over an edge snapshot. Nothing here touches the store,
//! keeps state between calls or logs.

use std::collections::{BTreeMap, BTreeSet};

/// Node id → ids it points to directly
pub type Adjacency<N> = BTreeMap<N, BTreeSet<N>>;

/// Build the forward adjacency map from `(upstream, downstream)` pairs
///
/// Ordered containers make the result independent of input order, and set
/// semantics collapse duplicate pairs.
pub fn build_adjacency<N, I>(edges: I) -> Adjacency<N>
where
    N: Ord,
    I: IntoIterator<Item = (N, N)>,
{
    let mut adjacency: Adjacency<N> = BTreeMap::new();
    for (upstream, downstream) in edges {
        adjacency.entry(upstream).or_default().insert(downstream);
    }
    adjacency
}

/// Would adding `upstream → downstream` close a cycle?
///
/// True iff `upstream` is already reachable from `downstream`. A self-loop
/// is the zero-length case and is always a cycle. Iterative DFS with an
/// explicit stack, O(V+E).
pub fn would_create_cycle<N>(upstream: N, downstream: N, adjacency: &Adjacency<N>) -> bool
where
    N: Ord + Copy,
{
    if upstream == downstream {
        return true;
    }

    let mut visited = BTreeSet::new();
    let mut stack = vec![downstream];

    while let Some(node) = stack.pop() {
        if node == upstream {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        if let Some(next) = adjacency.get(&node) {
            stack.extend(next.iter().filter(|n| !visited.contains(*n)).copied());
        }
    }

    false
}

/// 1-hop neighbor lookup in both directions
///
/// Built once from an edge snapshot and queried per dataset, so search can
/// enrich many results without going back to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborIndex<N: Ord> {
    upstream: BTreeMap<N, BTreeSet<N>>,
    downstream: BTreeMap<N, BTreeSet<N>>,
}

impl<N> NeighborIndex<N>
where
    N: Ord + Copy,
{
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
    {
        let mut index = Self {
            upstream: BTreeMap::new(),
            downstream: BTreeMap::new(),
        };
        for (up, down) in edges {
            index.downstream.entry(up).or_default().insert(down);
            index.upstream.entry(down).or_default().insert(up);
        }
        index
    }

    /// Nodes with an edge into `node`
    pub fn upstream_of(&self, node: N) -> impl Iterator<Item = N> + '_ {
        self.upstream.get(&node).into_iter().flatten().copied()
    }

    /// Nodes `node` has an edge into
    pub fn downstream_of(&self, node: N) -> impl Iterator<Item = N> + '_ {
        self.downstream.get(&node).into_iter().flatten().copied()
    }

    /// Every node that appears on either side of some edge
    pub fn nodes(&self) -> BTreeSet<N> {
        self.upstream
            .keys()
            .chain(self.downstream.keys())
            .copied()
            .collect()
    }
}
