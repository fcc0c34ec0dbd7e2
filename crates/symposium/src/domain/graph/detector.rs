//! Deadlock Detection
//!
//! # Algorithm
//!
//! 1. Derive the wait-for graph: `A -> B` iff `A` requests a fork held by `B`.
//! 2. Depth-first search with three colours (unvisited, on stack, done).
//!    Reaching a node that is still on the stack closes a cycle.
//!
//! O(V + E) for a yes/no answer. Purely read-only.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::rag::{EdgeKind, ResourceGraph};
use crate::domain::resources::{ActorId, ForkId};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Actor-to-actor wait-for graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitForGraph {
    waits_on: BTreeMap<ActorId, BTreeSet<ActorId>>,
}

impl WaitForGraph {
    /// Collapse a resource-allocation graph into actor dependencies
    pub fn from_resource_graph(graph: &ResourceGraph) -> Self {
        let holders: HashMap<ForkId, ActorId> = graph
            .edges_of(EdgeKind::Allocation)
            .map(|e| (e.fork_id, e.actor_id))
            .collect();

        let mut waits_on: BTreeMap<ActorId, BTreeSet<ActorId>> = BTreeMap::new();
        for edge in graph.edges_of(EdgeKind::Request) {
            if let Some(&holder) = holders.get(&edge.fork_id) {
                waits_on.entry(edge.actor_id).or_default().insert(holder);
            }
        }
        Self { waits_on }
    }

    /// Actors `actor` is waiting on
    pub fn successors(&self, actor: ActorId) -> impl Iterator<Item = ActorId> + '_ {
        self.waits_on.get(&actor).into_iter().flatten().copied()
    }

    /// Number of actors with at least one outgoing edge
    pub fn waiting_actors(&self) -> usize {
        self.waits_on.len()
    }

    fn nodes(&self) -> BTreeSet<ActorId> {
        self.waits_on
            .iter()
            .flat_map(|(from, to)| std::iter::once(*from).chain(to.iter().copied()))
            .collect()
    }

    /// True iff the graph contains a cycle
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// One cycle as the actor sequence `a0 -> a1 -> ... -> a0` (closing node
    /// not repeated)
    pub fn find_cycle(&self) -> Option<Vec<ActorId>> {
        let mut colour: HashMap<ActorId, Colour> = HashMap::new();
        let mut stack = Vec::new();

        for start in self.nodes() {
            if colour.get(&start).copied().unwrap_or(Colour::White) == Colour::White {
                if let Some(cycle) = self.dfs(start, &mut colour, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn dfs(
        &self,
        current: ActorId,
        colour: &mut HashMap<ActorId, Colour>,
        stack: &mut Vec<ActorId>,
    ) -> Option<Vec<ActorId>> {
        colour.insert(current, Colour::Grey);
        stack.push(current);

        for next in self.successors(current) {
            match colour.get(&next).copied().unwrap_or(Colour::White) {
                Colour::Grey => {
                    let from = stack.iter().position(|&a| a == next).unwrap_or(0);
                    return Some(stack[from..].to_vec());
                }
                Colour::White => {
                    if let Some(cycle) = self.dfs(next, colour, stack) {
                        return Some(cycle);
                    }
                }
                Colour::Black => {}
            }
        }

        stack.pop();
        colour.insert(current, Colour::Black);
        None
    }

    /// Every actor that lies on some cycle
    pub fn deadlocked_actors(&self) -> Vec<ActorId> {
        self.nodes()
            .into_iter()
            .filter(|&actor| self.reaches(actor, actor))
            .collect()
    }

    fn reaches(&self, from: ActorId, target: ActorId) -> bool {
        let mut visited = BTreeSet::new();
        let mut frontier: Vec<ActorId> = self.successors(from).collect();
        while let Some(actor) = frontier.pop() {
            if actor == target {
                return true;
            }
            if visited.insert(actor) {
                frontier.extend(self.successors(actor));
            }
        }
        false
    }
}

/// Stateless deadlock detector over resource graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct DeadlockDetector;

impl DeadlockDetector {
    /// True iff the wait-for graph derived from `graph` has a cycle
    pub fn detect(graph: &ResourceGraph) -> bool {
        WaitForGraph::from_resource_graph(graph).has_cycle()
    }

    /// One deadlock cycle, for diagnostics
    pub fn find_cycle(graph: &ResourceGraph) -> Option<Vec<ActorId>> {
        WaitForGraph::from_resource_graph(graph).find_cycle()
    }

    /// All actors involved in a deadlock
    pub fn deadlocked_actors(graph: &ResourceGraph) -> Vec<ActorId> {
        WaitForGraph::from_resource_graph(graph).deadlocked_actors()
    }
}
