//! Connectivity graph of the level.
//!
//! The graph is a tree: a chain of critical path rooms, with side rooms
//! hanging off them. Nodes live in an arena owned by [`LevelGraph`] and refer
//! to each other through [`NodeId`]s.

use std::fmt::Display;

use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

use crate::{Config, Error};

/// Index of a node inside its [`LevelGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);
impl NodeId {
    #[cfg(test)]
    #[must_use]
    pub(crate) const fn from_index(idx: usize) -> Self {
        Self(idx)
    }
    #[inline(always)]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}
impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A room of the level graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    id: NodeId,
    critical: bool,
    connections: Vec<NodeId>,
    incoming: usize,
}
impl GraphNode {
    #[inline(always)]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }
    #[inline(always)]
    #[must_use]
    pub fn is_critical_path(&self) -> bool {
        self.critical
    }
    /// Children of this node, in the order they were attached
    #[inline(always)]
    #[must_use]
    pub fn connections(&self) -> &[NodeId] {
        &self.connections
    }
    #[inline(always)]
    #[must_use]
    pub fn incoming_door_count(&self) -> usize {
        self.incoming
    }
    /// Doors the placed room must have: one per child, one per parent
    #[inline(always)]
    #[must_use]
    pub fn required_door_count(&self) -> usize {
        self.incoming + self.connections.len()
    }
}

/// Parameters of a single graph build
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphParams {
    pub rooms_count: usize,
    pub crit_path_length: usize,
    pub max_doors: usize,
    pub distribution: f32,
}
impl From<&Config> for GraphParams {
    fn from(config: &Config) -> Self {
        Self {
            rooms_count: config.rooms_count,
            crit_path_length: config.crit_path_length,
            max_doors: config.max_doors,
            distribution: config.distribution,
        }
    }
}

/// The rooms of a level and how they connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelGraph {
    nodes: Vec<GraphNode>,
    /// Critical path nodes, in the shuffled order used to attach side rooms
    critical: Vec<NodeId>,
    root: NodeId,
}

impl LevelGraph {
    /// Build a new graph.
    ///
    /// Parameters are expected to be valid, see [`Config::validate`].
    pub fn generate<R>(params: GraphParams, rng: &mut R) -> Result<Self, Error>
    where
        R: Rng + ?Sized,
    {
        debug_assert!(params.crit_path_length >= 1);
        debug_assert!(params.crit_path_length <= params.rooms_count);

        let mut builder = GraphBuilder {
            params,
            rng,
            nodes: Vec::with_capacity(params.rooms_count),
        };
        let (root, mut critical) = builder.critical_path(params.crit_path_length);
        critical.shuffle(&mut *builder.rng);
        builder.attach_side_rooms(&critical);

        let GraphBuilder { nodes, .. } = builder;
        if nodes.len() != params.rooms_count {
            log::error!(
                "Graph build created {} rooms instead of {}",
                nodes.len(),
                params.rooms_count
            );
            return Err(Error::BudgetInconsistency {
                created: nodes.len(),
                expected: params.rooms_count,
            });
        }
        log::debug!(
            "Built level graph: {} rooms, {} on the critical path",
            nodes.len(),
            critical.len()
        );
        Ok(Self {
            nodes,
            critical,
            root,
        })
    }

    /// First room of the critical path
    #[inline(always)]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// All nodes, in creation order
    #[inline(always)]
    #[must_use]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Critical path nodes, in the order they received side rooms
    #[inline(always)]
    #[must_use]
    pub fn critical_path(&self) -> &[NodeId] {
        &self.critical
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parent of a node, if it is not the root
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.connections.contains(&id))
            .map(GraphNode::id)
    }
}
impl std::ops::Index<NodeId> for LevelGraph {
    type Output = GraphNode;

    fn index(&self, NodeId(idx): NodeId) -> &Self::Output {
        &self.nodes[idx]
    }
}

struct GraphBuilder<'r, R: ?Sized> {
    params: GraphParams,
    rng: &'r mut R,
    /// Arena of created nodes. Its length is the global room counter.
    nodes: Vec<GraphNode>,
}

impl<R> GraphBuilder<'_, R>
where
    R: Rng + ?Sized,
{
    fn add_node(&mut self, critical: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            id,
            critical,
            connections: vec![],
            incoming: 0,
        });
        id
    }

    fn add_connection(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].connections.push(child);
        self.nodes[child.0].incoming += 1;
    }

    /// Chain `length` critical nodes, returning the root and the chain in order
    fn critical_path(&mut self, length: usize) -> (NodeId, Vec<NodeId>) {
        let root = self.add_node(true);
        let mut path = Vec::with_capacity(length);
        path.push(root);
        let mut prev = root;
        for _ in 1..length {
            let node = self.add_node(true);
            self.add_connection(prev, node);
            path.push(node);
            prev = node;
        }
        (root, path)
    }

    /// Share the side room budget between the critical path nodes
    fn attach_side_rooms(&mut self, critical: &[NodeId]) {
        let GraphParams {
            rooms_count,
            crit_path_length,
            distribution,
            ..
        } = self.params;
        let budget = rooms_count.saturating_sub(crit_path_length);
        if budget == 0 {
            return;
        }
        let base = budget.div_ceil(crit_path_length);
        for &node in critical {
            // skew: a random share of the whole budget, limited by `distribution`
            let skew = self.rng.gen::<f32>().clamp(0., 1. - distribution);
            let jitter = (budget as f32 * skew).floor() as usize;
            let available = rooms_count.saturating_sub(self.nodes.len());
            let supply = (base + jitter).min(available);
            let created = self.side_rooms(node, supply);
            log::trace!("{node}: {created} side rooms from a supply of {supply}");
        }
    }

    /// Recursively hang side rooms below `node`, returning how many were created.
    ///
    /// Every child may receive up to `ceil(remaining / rooms)` of the supply
    /// left after this level, and `remaining` is not reduced between siblings.
    fn side_rooms(&mut self, node: NodeId, supply: usize) -> usize {
        let available_doors = self
            .params
            .max_doors
            .saturating_sub(self.nodes[node.0].required_door_count());
        if available_doors == 0 || supply == 0 || self.nodes.len() >= self.params.rooms_count {
            return 0;
        }
        let rooms = self.rng.gen_range(1..=supply.min(available_doors));
        let remaining = supply - rooms;
        let per_child = if remaining > 0 {
            remaining.div_ceil(rooms)
        } else {
            0
        };
        let mut created = 0;
        for _ in 0..rooms {
            if self.nodes.len() >= self.params.rooms_count {
                break;
            }
            let child = self.add_node(false);
            self.add_connection(node, child);
            created += 1 + self.side_rooms(child, per_child.min(remaining));
        }
        created
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::mock::StepRng, Rng, SeedableRng};
    use rand_wyrand::WyRand;

    use super::{GraphParams, LevelGraph, NodeId};

    fn params(
        rooms_count: usize,
        crit_path_length: usize,
        max_doors: usize,
        distribution: f32,
    ) -> GraphParams {
        GraphParams {
            rooms_count,
            crit_path_length,
            max_doors,
            distribution,
        }
    }

    fn random_params(rng: &mut impl Rng) -> GraphParams {
        let rooms_count = rng.gen_range(1..=20);
        params(
            rooms_count,
            rng.gen_range(1..=rooms_count),
            rng.gen_range(3..=10),
            rng.gen_range(0.05..=1.),
        )
    }

    #[test]
    fn single_room() {
        let graph =
            LevelGraph::generate(params(1, 1, 3, 0.5), &mut WyRand::seed_from_u64(0)).unwrap();
        assert_eq!(graph.len(), 1);
        let root = &graph[graph.root()];
        assert!(root.is_critical_path());
        assert_eq!(root.required_door_count(), 0);
        assert_eq!(graph.parent(graph.root()), None);
    }

    #[test]
    fn critical_path_only() {
        let graph =
            LevelGraph::generate(params(5, 5, 10, 0.5), &mut WyRand::seed_from_u64(9)).unwrap();
        assert_eq!(graph.len(), 5);
        assert!(graph.nodes().iter().all(|n| n.is_critical_path()));
        // creation order is path order
        for (i, node) in graph.nodes().iter().enumerate() {
            let expected = if i + 1 < 5 { vec![NodeId(i + 1)] } else { vec![] };
            assert_eq!(node.connections(), &expected[..]);
        }
        assert_eq!(graph.critical_path().len(), 5);
    }

    #[test]
    fn fixed_sequence_gives_one_side_room_each() {
        // all zeros: no jitter, and every draw picks the lowest option
        let graph = LevelGraph::generate(params(6, 3, 4, 0.5), &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(graph.len(), 6);
        for &path_node in graph.critical_path() {
            let side: Vec<_> = graph[path_node]
                .connections()
                .iter()
                .filter(|c| !graph[**c].is_critical_path())
                .collect();
            assert_eq!(side.len(), 1, "{path_node} should get one side room");
            assert!(graph[*side[0]].connections().is_empty());
        }
    }

    /// Size of the subtree rooted in `id`
    fn subtree(graph: &LevelGraph, id: NodeId) -> usize {
        1 + graph[id]
            .connections()
            .iter()
            .map(|c| subtree(graph, *c))
            .sum::<usize>()
    }

    #[test]
    fn full_distribution_shares_evenly() {
        let mut rng = WyRand::seed_from_u64(0xe7e7);
        for _ in 0..200 {
            let rooms_count = rng.gen_range(1..=40);
            let p = params(
                rooms_count,
                rng.gen_range(1..=rooms_count),
                rng.gen_range(3..=10),
                1.,
            );
            let graph = LevelGraph::generate(p, &mut WyRand::seed_from_u64(rng.gen())).unwrap();

            let budget = p.rooms_count - p.crit_path_length;
            let base = budget.div_ceil(p.crit_path_length);
            let mut left = budget;
            for &path_node in graph.critical_path() {
                let side: usize = graph[path_node]
                    .connections()
                    .iter()
                    .filter(|c| !graph[**c].is_critical_path())
                    .map(|c| subtree(&graph, *c))
                    .sum();
                assert_eq!(side, base.min(left), "{p:?} at {path_node}");
                left -= side;
            }
            assert_eq!(left, 0, "{p:?}");
        }
    }

    #[test]
    fn invariants() {
        let mut rng = WyRand::seed_from_u64(0xd00d);
        for _ in 0..500 {
            let p = random_params(&mut rng);
            let graph = LevelGraph::generate(p, &mut WyRand::seed_from_u64(rng.gen())).unwrap();

            assert_eq!(graph.len(), p.rooms_count, "{p:?}");
            for node in graph.nodes() {
                assert!(node.required_door_count() <= p.max_doors, "{p:?}");
                let expected_incoming = usize::from(node.id() != graph.root());
                assert_eq!(node.incoming_door_count(), expected_incoming, "{p:?}");
            }

            // the critical nodes form a single chain starting at the root
            let critical = graph.nodes().iter().filter(|n| n.is_critical_path()).count();
            assert_eq!(critical, p.crit_path_length, "{p:?}");
            let mut chain = 1;
            let mut current = graph.root();
            while let Some(next) = graph[current]
                .connections()
                .iter()
                .find(|c| graph[**c].is_critical_path())
            {
                chain += 1;
                current = *next;
            }
            assert_eq!(chain, p.crit_path_length, "{p:?}");

            // side rooms only lead to side rooms
            for node in graph.nodes().iter().filter(|n| !n.is_critical_path()) {
                assert!(node.connections().iter().all(|c| !graph[*c].is_critical_path()));
            }
        }
    }

    #[test]
    fn deterministic() {
        let mut rng = WyRand::seed_from_u64(42);
        for _ in 0..50 {
            let p = random_params(&mut rng);
            let seed = rng.gen();
            assert_eq!(
                LevelGraph::generate(p, &mut WyRand::seed_from_u64(seed)).unwrap(),
                LevelGraph::generate(p, &mut WyRand::seed_from_u64(seed)).unwrap(),
            )
        }
    }
}
