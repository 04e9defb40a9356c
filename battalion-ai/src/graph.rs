//! Weighted directed graph and single-source shortest paths

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Directed graph with non-negative integer edge weights
#[derive(Clone, Debug, Default)]
pub struct Graph {
    adjacency: Vec<Vec<(usize, u32)>>,
}

impl Graph {
    pub fn new(vertices: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); vertices],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn add_edge(&mut self, from: usize, to: usize, weight: u32) {
        self.adjacency[from].push((to, weight));
    }

    pub fn edges_from(&self, vertex: usize) -> &[(usize, u32)] {
        &self.adjacency[vertex]
    }

    /// Dijkstra from `source`. `None` marks unreachable vertices.
    pub fn sssp(&self, source: usize) -> Vec<Option<u32>> {
        let mut dist: Vec<Option<u32>> = vec![None; self.vertex_count()];
        let mut queue: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();

        dist[source] = Some(0);
        queue.push(Reverse((0, source)));

        while let Some(Reverse((cost, vertex))) = queue.pop() {
            if dist[vertex].is_some_and(|d| cost > d) {
                continue; // Stale entry
            }
            for &(next, weight) in &self.adjacency[vertex] {
                let new_cost = cost.saturating_add(weight);
                if dist[next].map_or(true, |d| new_cost < d) {
                    dist[next] = Some(new_cost);
                    queue.push(Reverse((new_cost, next)));
                }
            }
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sssp_picks_cheapest_route() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 5);
        g.add_edge(0, 2, 1);
        g.add_edge(2, 1, 1);
        g.add_edge(1, 3, 2);
        assert_eq!(g.sssp(0), vec![Some(0), Some(2), Some(1), Some(4)]);
    }

    #[test]
    fn test_sssp_unreachable_and_direction() {
        let mut g = Graph::new(3);
        g.add_edge(1, 0, 1);
        assert_eq!(g.sssp(0), vec![Some(0), None, None]);
        assert_eq!(g.sssp(1), vec![Some(1), Some(0), None]);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_zero_weight_edges() {
        let mut g = Graph::new(3);
        g.add_edge(0, 1, 0);
        g.add_edge(1, 2, 0);
        assert_eq!(g.sssp(0), vec![Some(0), Some(0), Some(0)]);
    }
}
