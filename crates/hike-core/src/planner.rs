//! Calorie-weighted shortest path search over a [`GeoGraph`].
//!
//! All search state (distances, predecessors, the heap) lives in the call
//! that runs the search, so one graph can serve any number of concurrent
//! queries.
//!
//! # Orientation
//!
//! When the destination lies east of the start, the search runs from the
//! destination anchor back to the start anchor over [`SearchDirection::Inbound`]
//! weights, so the cost minimised is still the cost of walking the caller's
//! way. The returned [`Route`] is flipped back to the caller's orientation and
//! its totals are summed over the edges walked in that orientation.

use crate::cost::CostModel;
use crate::error::{RouteError, RouteResult};
use crate::grid::GeoGraph;
use crate::heap::MinHeap;
use crate::models::{Edge, GeoPoint, NodeId, Route};

/// Which way an edge is walked while the search expands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    /// Edge `u -> v` costs walking from `u` to `v`. Distances are from the origin.
    #[default]
    Outbound,
    /// Edge `u -> v` costs walking from `v` to `u`. Distances are to the origin.
    Inbound,
}

/// Result of a single-source search: best weight and predecessor per node.
#[derive(Debug, Clone)]
pub struct SearchTree {
    origin: NodeId,
    direction: SearchDirection,
    ids: Vec<NodeId>,
    dist: Vec<f64>,
    prev: Vec<Option<NodeId>>,
}

impl SearchTree {
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn direction(&self) -> SearchDirection {
        self.direction
    }

    fn index(&self, id: NodeId) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    /// Best known weight between the origin and `id`; `INFINITY` when unreached.
    pub fn distance(&self, id: NodeId) -> Option<f64> {
        self.index(id).map(|idx| self.dist[idx])
    }

    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.index(id).and_then(|idx| self.prev[idx])
    }

    pub fn reached(&self, id: NodeId) -> bool {
        self.distance(id).is_some_and(f64::is_finite)
    }

    /// Node sequence from the origin to `target`, or `None` if unreached.
    pub fn path_to(&self, target: NodeId) -> Option<Vec<NodeId>> {
        if !self.reached(target) {
            return None;
        }
        let mut path = vec![target];
        let mut current = target;
        while current != self.origin {
            let previous = self.predecessor(current)?;
            path.push(previous);
            current = previous;
            if path.len() > self.ids.len() {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }
}

/// Dijkstra from `origin`, stopping early once `target` is settled.
pub fn shortest_paths(
    graph: &GeoGraph,
    origin: NodeId,
    target: Option<NodeId>,
) -> RouteResult<SearchTree> {
    shortest_paths_in(graph, origin, target, SearchDirection::Outbound)
}

/// Dijkstra from `origin` with edge weights taken in `direction`.
pub fn shortest_paths_in(
    graph: &GeoGraph,
    origin: NodeId,
    target: Option<NodeId>,
    direction: SearchDirection,
) -> RouteResult<SearchTree> {
    let layout = graph.layout();
    let slot_of = |id: NodeId| {
        layout.slot(id).ok_or_else(|| {
            RouteError::GridConstruction(format!("node {} is not part of the grid", id))
        })
    };
    let origin_slot = slot_of(origin)?;

    let count = graph.node_count();
    let ids: Vec<NodeId> = graph.nodes().map(|node| node.id).collect();
    let mut dist = vec![f64::INFINITY; count];
    let mut prev: Vec<Option<NodeId>> = vec![None; count];
    let mut queue = MinHeap::with_capacity(count);

    dist[origin_slot] = 0.0;
    for &id in &ids {
        let initial = if id == origin { 0.0 } else { f64::INFINITY };
        queue.insert(id, initial)?;
    }

    while !queue.is_empty() {
        let (current, weight) = queue.extract_min()?;
        if !weight.is_finite() {
            // Everything left in the queue is unreachable.
            break;
        }
        if Some(current) == target {
            break;
        }

        for edge in graph.edges(current) {
            let next = slot_of(edge.to)?;
            let candidate = weight + walked_weight(graph, edge, direction)?;
            if candidate < dist[next] {
                dist[next] = candidate;
                prev[next] = Some(current);
                if queue.contains(&edge.to) {
                    queue.decrease_key(edge.to, candidate)?;
                }
            }
        }
    }

    // Storage order is column-major, which is also `NodeId` order.
    Ok(SearchTree {
        origin,
        direction,
        ids,
        dist,
        prev,
    })
}

fn walked_weight(graph: &GeoGraph, edge: &Edge, direction: SearchDirection) -> RouteResult<f64> {
    match direction {
        SearchDirection::Outbound => Ok(edge.weight()),
        SearchDirection::Inbound => graph
            .edge(edge.to, edge.from)
            .map(Edge::weight)
            .ok_or_else(|| {
                RouteError::GridConstruction(format!(
                    "{} -> {} has no reverse edge",
                    edge.from, edge.to
                ))
            }),
    }
}

/// Plans routes over one immutable graph.
#[derive(Debug, Clone, Copy)]
pub struct RoutePlanner<'g> {
    graph: &'g GeoGraph,
    walking_speed_mps: f64,
}

impl<'g> RoutePlanner<'g> {
    pub fn new(graph: &'g GeoGraph, cost: &CostModel) -> Self {
        Self {
            graph,
            walking_speed_mps: cost.walking_speed_mps.max(1e-9),
        }
    }

    /// Plan from `start` to `end`, resolving both to their grid anchors.
    pub fn route(&self, start: GeoPoint, end: GeoPoint) -> RouteResult<Route> {
        let start_anchor = self.graph.anchor(&start)?;
        let end_anchor = self.graph.anchor(&end)?;
        self.route_between(start, end, start_anchor, end_anchor)
    }

    /// Plan between already resolved anchors.
    pub fn route_between(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        start_anchor: NodeId,
        end_anchor: NodeId,
    ) -> RouteResult<Route> {
        let start_node = self
            .graph
            .node(start_anchor)
            .ok_or(RouteError::NodeResolution(start))?;
        let end_node = self
            .graph
            .node(end_anchor)
            .ok_or(RouteError::NodeResolution(end))?;

        let swapped = end.lon > start.lon;
        let (from, to, direction) = if swapped {
            (end_anchor, start_anchor, SearchDirection::Inbound)
        } else {
            (start_anchor, end_anchor, SearchDirection::Outbound)
        };

        let tree = shortest_paths_in(self.graph, from, Some(to), direction)?;
        let mut nodes = tree.path_to(to).ok_or(RouteError::RouteNotFound {
            from: start_anchor,
            to: end_anchor,
        })?;
        if swapped {
            nodes.reverse();
        }

        let mut distance_m = 0.0;
        let mut calories_kcal = 0.0;
        for step in nodes.windows(2) {
            let edge = self.graph.edge(step[0], step[1]).ok_or_else(|| {
                RouteError::GridConstruction(format!("{} and {} are not linked", step[0], step[1]))
            })?;
            distance_m += edge.distance_m;
            calories_kcal += edge.calories_kcal;
        }

        let mut path = Vec::with_capacity(nodes.len() + 2);
        path.push(start);
        for &id in &nodes {
            if let Some(node) = self.graph.node(id) {
                path.push(node.position);
            }
        }
        path.push(end);

        Ok(Route {
            path,
            nodes,
            distance_m,
            calories_kcal,
            eta_secs: distance_m / self.walking_speed_mps,
            elevation_delta_m: end_node.elevation_m - start_node.elevation_m,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::{flat_graph, layout};
    use crate::grid::NodeSample;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn graph_with(cols: usize, rows: usize, elevations: &[f64]) -> GeoGraph {
        let samples = elevations.iter().copied().map(NodeSample::elevation).collect();
        GeoGraph::assemble(layout(cols, rows), samples, &CostModel::default()).unwrap()
    }

    fn position(graph: &GeoGraph, col: u32, row: u32) -> GeoPoint {
        graph.node(NodeId::new(col, row)).unwrap().position
    }

    /// Cut every edge touching `id`.
    fn isolate(graph: &mut GeoGraph, id: NodeId) {
        for edges in graph.adjacency.iter_mut() {
            edges.retain(|edge| edge.from != id && edge.to != id);
        }
    }

    /// Relax every edge until nothing changes.
    fn bellman_ford(graph: &GeoGraph, origin: NodeId) -> Vec<(NodeId, f64)> {
        let ids: Vec<NodeId> = graph.nodes().map(|node| node.id).collect();
        let mut dist: Vec<f64> = ids
            .iter()
            .map(|&id| if id == origin { 0.0 } else { f64::INFINITY })
            .collect();
        for _ in 0..ids.len() {
            let mut changed = false;
            for (idx, &id) in ids.iter().enumerate() {
                for edge in graph.edges(id) {
                    let next = ids.binary_search(&edge.to).unwrap();
                    let candidate = dist[idx] + edge.weight();
                    if candidate < dist[next] {
                        dist[next] = candidate;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        ids.into_iter().zip(dist).collect()
    }

    #[test]
    fn origin_has_zero_distance_and_no_predecessor() {
        let graph = flat_graph(3, 3);
        let origin = NodeId::new(1, 1);
        let tree = shortest_paths(&graph, origin, None).unwrap();
        assert_eq!(tree.distance(origin), Some(0.0));
        assert_eq!(tree.predecessor(origin), None);
        assert_eq!(tree.path_to(origin), Some(vec![origin]));
    }

    #[test]
    fn connected_graph_reaches_every_node() {
        let graph = flat_graph(4, 3);
        let origin = NodeId::new(0, 0);
        let tree = shortest_paths(&graph, origin, None).unwrap();
        for node in graph.nodes() {
            let distance = tree.distance(node.id).unwrap();
            assert!(distance.is_finite(), "{} unreached", node.id);
            if node.id != origin {
                assert!(tree.predecessor(node.id).is_some(), "{} has no predecessor", node.id);
            }
        }
    }

    #[test]
    fn distances_match_exhaustive_relaxation() {
        let mut rng = rand::rng();
        let elevations: Vec<f64> = (0..30).map(|_| rng.random_range(0.0..8.0)).collect();
        let graph = graph_with(6, 5, &elevations);
        let origin = NodeId::new(2, 3);

        let tree = shortest_paths(&graph, origin, None).unwrap();
        for (id, expected) in bellman_ford(&graph, origin) {
            let got = tree.distance(id).unwrap();
            assert!(
                (got - expected).abs() < 1e-9,
                "{}: dijkstra {} vs relaxation {}",
                id,
                got,
                expected
            );
        }
    }

    #[test]
    fn inbound_distances_are_costs_of_walking_to_the_origin() {
        let mut rng = StdRng::seed_from_u64(7);
        let elevations: Vec<f64> = (0..20).map(|_| rng.random_range(0.0..12.0)).collect();
        let graph = graph_with(5, 4, &elevations);
        let origin = NodeId::new(1, 2);

        let inbound = shortest_paths_in(&graph, origin, None, SearchDirection::Inbound).unwrap();
        assert_eq!(inbound.direction(), SearchDirection::Inbound);
        for node in graph.nodes() {
            let walked = shortest_paths(&graph, node.id, Some(origin))
                .unwrap()
                .distance(origin)
                .unwrap();
            let got = inbound.distance(node.id).unwrap();
            assert!(
                (got - walked).abs() < 1e-9,
                "{} -> {}: inbound {} vs outbound {}",
                node.id,
                origin,
                got,
                walked
            );
        }
    }

    #[test]
    fn routes_are_cheapest_in_the_walking_direction() {
        let cost = CostModel::default();
        for seed in 0..3000u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let elevations: Vec<f64> = (0..25).map(|_| rng.random_range(0.0..12.0)).collect();
            let graph = graph_with(5, 5, &elevations);
            let planner = RoutePlanner::new(&graph, &cost);

            let west = NodeId::new(rng.random_range(0..2), rng.random_range(0..5));
            let east = NodeId::new(rng.random_range(3..5), rng.random_range(0..5));
            for (from, to) in [(west, east), (east, west)] {
                let route = planner
                    .route(position(&graph, from.col, from.row), position(&graph, to.col, to.row))
                    .unwrap();
                let walked: f64 = route
                    .nodes
                    .windows(2)
                    .map(|step| graph.edge(step[0], step[1]).unwrap().weight())
                    .sum();
                let best = shortest_paths(&graph, from, Some(to))
                    .unwrap()
                    .distance(to)
                    .unwrap();
                assert!(
                    walked <= best + 1e-9 * (1.0 + best),
                    "seed {}: {} -> {} walked {} but best is {}",
                    seed,
                    from,
                    to,
                    walked,
                    best
                );
            }
        }
    }

    #[test]
    fn flat_square_walks_the_diagonal_at_base_rate() {
        let graph = flat_graph(2, 2);
        let cost = CostModel::default();
        let start = position(&graph, 0, 0);
        let end = position(&graph, 1, 1);

        let route = RoutePlanner::new(&graph, &cost).route(start, end).unwrap();

        assert_eq!(route.nodes, vec![NodeId::new(0, 0), NodeId::new(1, 1)]);
        let diagonal = graph.edge(NodeId::new(0, 0), NodeId::new(1, 1)).unwrap();
        assert_eq!(route.distance_m, diagonal.distance_m);
        let expected_kcal = cost.base_calories(route.distance_m);
        assert!((route.calories_kcal - expected_kcal).abs() < 1e-12);
        assert!((route.eta_secs - route.distance_m / 1.34112).abs() < 1e-12);
        assert_eq!(route.elevation_delta_m, 0.0);
        for node in graph.nodes() {
            assert!(graph.edges(node.id).iter().all(|edge| edge.grade_penalty == 1.0));
        }
    }

    #[test]
    fn steep_diagonal_is_avoided_for_cheaper_detour() {
        // Slots are column-major: 0/0, 0/1, 1/0, 1/1.
        let graph = graph_with(2, 2, &[0.0, 4.0, 4.0, 8.0]);
        let cost = CostModel::default();
        let start = position(&graph, 0, 0);
        let end = position(&graph, 1, 1);

        let diagonal = graph.edge(NodeId::new(0, 0), NodeId::new(1, 1)).unwrap();
        assert_eq!(diagonal.grade_penalty, 50.0);

        let route = RoutePlanner::new(&graph, &cost).route(start, end).unwrap();
        assert_eq!(route.nodes.len(), 3);
        assert_eq!(route.nodes[0], NodeId::new(0, 0));
        assert_eq!(route.nodes[2], NodeId::new(1, 1));
        assert!(route.distance_m > diagonal.distance_m);
        for step in route.nodes.windows(2) {
            assert_eq!(graph.edge(step[0], step[1]).unwrap().grade_penalty, 1.0);
        }
        assert!((route.elevation_delta_m - 8.0).abs() < 1e-12);
    }

    #[test]
    fn unreachable_destination_is_reported() {
        let mut graph = flat_graph(3, 1);
        isolate(&mut graph, NodeId::new(2, 0));
        let cost = CostModel::default();
        let planner = RoutePlanner::new(&graph, &cost);
        let west = position(&graph, 0, 0);
        let east = position(&graph, 2, 0);

        assert!(matches!(
            planner.route(west, east),
            Err(RouteError::RouteNotFound { .. })
        ));
        assert!(matches!(
            planner.route(east, west),
            Err(RouteError::RouteNotFound { .. })
        ));

        let tree = shortest_paths(&graph, NodeId::new(0, 0), None).unwrap();
        assert!(tree.reached(NodeId::new(1, 0)));
        assert!(!tree.reached(NodeId::new(2, 0)));
        assert_eq!(tree.path_to(NodeId::new(2, 0)), None);
    }

    #[test]
    fn route_is_reported_in_caller_orientation() {
        let graph = graph_with(3, 1, &[0.0, 2.0, 4.0]);
        let cost = CostModel::default();
        let planner = RoutePlanner::new(&graph, &cost);
        let west = GeoPoint::new(position(&graph, 0, 0).lon - 1e-6, 0.0);
        let east = GeoPoint::new(position(&graph, 2, 0).lon + 1e-6, 0.0);

        let uphill = planner.route(west, east).unwrap();
        let downhill = planner.route(east, west).unwrap();

        assert_eq!(uphill.path.first(), Some(&west));
        assert_eq!(uphill.path.last(), Some(&east));
        assert_eq!(downhill.path.first(), Some(&east));
        assert_eq!(downhill.path.last(), Some(&west));
        assert_eq!(uphill.nodes.first(), Some(&NodeId::new(0, 0)));
        assert_eq!(downhill.nodes.first(), Some(&NodeId::new(2, 0)));

        assert!((uphill.distance_m - downhill.distance_m).abs() < 1e-9);
        assert!(uphill.calories_kcal > downhill.calories_kcal);
        assert!((uphill.elevation_delta_m - 4.0).abs() < 1e-12);
        assert!((downhill.elevation_delta_m + 4.0).abs() < 1e-12);
    }

    #[test]
    fn totals_follow_the_exact_edges_walked() {
        let mut rng = rand::rng();
        let elevations: Vec<f64> = (0..25).map(|_| rng.random_range(0.0..6.0)).collect();
        let graph = graph_with(5, 5, &elevations);
        let cost = CostModel::default();
        let start = position(&graph, 4, 0);
        let end = position(&graph, 0, 4);

        let route = RoutePlanner::new(&graph, &cost).route(start, end).unwrap();
        let mut distance = 0.0;
        let mut calories = 0.0;
        for step in route.nodes.windows(2) {
            let edge = graph.edge(step[0], step[1]).unwrap();
            assert_eq!(edge.from, step[0]);
            assert_eq!(edge.to, step[1]);
            distance += edge.distance_m;
            calories += edge.calories_kcal;
        }
        assert_eq!(route.distance_m, distance);
        assert_eq!(route.calories_kcal, calories);
        assert_eq!(route.path.len(), route.nodes.len() + 2);
    }

    #[test]
    fn same_anchor_yields_empty_walk() {
        let graph = flat_graph(2, 2);
        let cost = CostModel::default();
        let start = position(&graph, 0, 0);
        let nearby = GeoPoint::new(start.lon + 1e-7, start.lat + 1e-7);
        let route = RoutePlanner::new(&graph, &cost).route(start, nearby).unwrap();
        assert_eq!(route.nodes, vec![NodeId::new(0, 0)]);
        assert_eq!(route.distance_m, 0.0);
        assert_eq!(route.calories_kcal, 0.0);
    }

    #[test]
    fn concurrent_queries_share_one_graph() {
        let elevations: Vec<f64> = (0..36).map(|i| ((i * 7) % 11) as f64).collect();
        let graph = Arc::new(graph_with(6, 6, &elevations));
        let cost = CostModel::default();
        let pairs = [((0, 0), (5, 5)), ((5, 0), (0, 5)), ((2, 3), (4, 1)), ((5, 5), (0, 0))];

        let expected: Vec<Route> = pairs
            .iter()
            .map(|&((c1, r1), (c2, r2))| {
                RoutePlanner::new(&graph, &cost)
                    .route(position(&graph, c1, r1), position(&graph, c2, r2))
                    .unwrap()
            })
            .collect();

        let handles: Vec<_> = pairs
            .iter()
            .map(|&((c1, r1), (c2, r2))| {
                let graph = Arc::clone(&graph);
                let cost = cost.clone();
                std::thread::spawn(move || {
                    RoutePlanner::new(&graph, &cost)
                        .route(position(&graph, c1, r1), position(&graph, c2, r2))
                        .unwrap()
                })
            })
            .collect();

        for (handle, expected) in handles.into_iter().zip(expected) {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
