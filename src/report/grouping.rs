//! Connectivity grouping over unordered id pairs
//!
//! Trivial duplicates are grouped by union-find; potential duplicates by
//! stack-based depth-first traversal. Neither recurses, so long chains are
//! safe.

use std::collections::{BTreeMap, BTreeSet};

/// Union-find over an arena of indices, with union by rank and path
/// compression.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    pub fn union(&mut self, left: usize, right: usize) {
        let left_root = self.find(left);
        let right_root = self.find(right);

        if left_root == right_root {
            return;
        }

        let left_rank = self.rank[left_root];
        let right_rank = self.rank[right_root];

        if left_rank < right_rank {
            self.parent[left_root] = right_root;
        } else if left_rank > right_rank {
            self.parent[right_root] = left_root;
        } else {
            self.parent[right_root] = left_root;
            self.rank[left_root] += 1;
        }
    }
}

/// Equivalence classes of the transitive closure of `pairs`.
///
/// Each group is sorted; groups are ordered by their smallest member.
pub fn union_find_groups(pairs: &BTreeSet<(String, String)>) -> Vec<Vec<String>> {
    let ids: Vec<&str> = pairs
        .iter()
        .flat_map(|(a, b)| [a.as_str(), b.as_str()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: BTreeMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut dsu = DisjointSet::new(ids.len());
    for (a, b) in pairs {
        dsu.union(index[a.as_str()], index[b.as_str()]);
    }

    let mut by_root: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for (i, id) in ids.iter().enumerate() {
        by_root.entry(dsu.find(i)).or_default().push(id.to_string());
    }

    let mut groups: Vec<Vec<String>> = by_root.into_values().collect();
    groups.sort();
    groups
}

/// Connected components of the undirected graph whose edges are `pairs`.
///
/// Each component is sorted; components are ordered by their smallest member.
pub fn connected_components(pairs: &BTreeSet<(String, String)>) -> Vec<Vec<String>> {
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (a, b) in pairs {
        adjacency.entry(a.as_str()).or_default().insert(b.as_str());
        adjacency.entry(b.as_str()).or_default().insert(a.as_str());
    }

    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut components = Vec::new();

    for &node in adjacency.keys() {
        if visited.contains(node) {
            continue;
        }

        let mut component: Vec<String> = Vec::new();
        let mut stack: Vec<&str> = vec![node];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            component.push(current.to_string());

            if let Some(neighbors) = adjacency.get(current) {
                stack.extend(neighbors.iter().filter(|n| !visited.contains(*n)));
            }
        }

        component.sort();
        components.push(component);
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(edges: &[(&str, &str)]) -> BTreeSet<(String, String)> {
        edges
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn disjoint_set_unions_transitively() {
        let mut dsu = DisjointSet::new(5);
        dsu.union(0, 1);
        dsu.union(1, 2);
        dsu.union(3, 4);
        assert_eq!(dsu.find(0), dsu.find(2));
        assert_eq!(dsu.find(3), dsu.find(4));
        assert_ne!(dsu.find(0), dsu.find(3));
    }

    #[test]
    fn disjoint_set_handles_long_chains_without_recursion() {
        let size = 200_000;
        let mut dsu = DisjointSet::new(size);
        // degenerate chain: each node points at the next
        for i in 1..size {
            dsu.parent[i - 1] = i;
        }
        assert_eq!(dsu.find(0), size - 1);
        assert_eq!(dsu.parent[0], size - 1);
    }

    #[test]
    fn union_find_groups_are_transitive_and_sorted() {
        let groups = union_find_groups(&pairs(&[("b", "c"), ("a", "b"), ("x", "y")]));
        assert_eq!(groups, vec![vec!["a", "b", "c"], vec!["x", "y"]]);
    }

    #[test]
    fn union_find_groups_of_nothing_is_empty() {
        assert!(union_find_groups(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn connected_components_follow_chains() {
        let components = connected_components(&pairs(&[
            ("d", "e"),
            ("a", "b"),
            ("c", "b"),
            ("e", "f"),
        ]));
        assert_eq!(
            components,
            vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]
        );
    }

    #[test]
    fn connected_components_survive_deep_paths() {
        let edges: BTreeSet<(String, String)> = (0..50_000)
            .map(|i| (format!("n{:06}", i), format!("n{:06}", i + 1)))
            .collect();
        let components = connected_components(&edges);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 50_001);
    }
}
