//! Resource-Allocation Graph
//!
//! Bipartite actor/fork graph derived from one [`LedgerSnapshot`]:
//!
//! ```text
//! actor --REQUEST-->    fork   (actor is waiting for the fork)
//! fork  --ALLOCATION--> actor  (actor holds the fork)
//! ```
//!
//! Edges are stored uniformly as `(actor, fork, kind)`. The graph is never
//! kept around by the engine; each call builds a fresh one.

use serde::{Deserialize, Serialize};

use crate::domain::resources::{ActorId, ActorState, ForkId, LedgerSnapshot};

/// Edge direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum EdgeKind {
    /// Actor waits for fork
    Request = 0,
    /// Fork is held by actor
    Allocation = 1,
}

impl EdgeKind {
    /// Numeric code (`0` request, `1` allocation)
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// One edge of the resource-allocation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Actor endpoint
    pub actor_id: ActorId,
    /// Fork endpoint
    pub fork_id: ForkId,
    /// Direction
    pub kind: EdgeKind,
}

/// Snapshot of every REQUEST and ALLOCATION edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceGraph {
    edges: Vec<GraphEdge>,
}

impl ResourceGraph {
    /// Build the graph from a consistent ledger snapshot.
    ///
    /// Emits one ALLOCATION edge per held fork and one REQUEST edge per
    /// outstanding fork of every hungry actor, in actor order.
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Self {
        let mut edges = Vec::new();
        for actor in &snapshot.actors {
            for fork in actor.held.iter() {
                edges.push(GraphEdge {
                    actor_id: actor.id,
                    fork_id: fork,
                    kind: EdgeKind::Allocation,
                });
            }
            if actor.state == ActorState::Hungry {
                for fork in actor.requested.iter() {
                    edges.push(GraphEdge {
                        actor_id: actor.id,
                        fork_id: fork,
                        kind: EdgeKind::Request,
                    });
                }
            }
        }
        Self { edges }
    }

    /// Build a graph from explicit edges
    pub fn from_edges(edges: impl IntoIterator<Item = GraphEdge>) -> Self {
        Self {
            edges: edges.into_iter().collect(),
        }
    }

    /// All edges
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True if there are no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges of one kind
    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> + '_ {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Actors holding `fork`; more than one would be a mutual exclusion
    /// violation
    pub fn allocations_of(&self, fork: ForkId) -> Vec<ActorId> {
        self.edges_of(EdgeKind::Allocation)
            .filter(|e| e.fork_id == fork)
            .map(|e| e.actor_id)
            .collect()
    }

    /// Numeric `[actor, fork, kind]` triples
    pub fn as_triples(&self) -> Vec<[usize; 3]> {
        self.edges
            .iter()
            .map(|e| [e.actor_id.as_usize(), e.fork_id.as_usize(), usize::from(e.kind.code())])
            .collect()
    }
}

impl<'a> IntoIterator for &'a ResourceGraph {
    type Item = &'a GraphEdge;
    type IntoIter = std::slice::Iter<'a, GraphEdge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}
