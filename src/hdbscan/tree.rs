//! Cluster hierarchy of the density clusterer
//!
//! Rows are the leaves `0..n`. The single linkage tree adds one node per merge, `n + i` for merge
//! `i`. The condensed tree relabels the surviving clusters `n..` with the root being `n`, so a
//! child cluster always has a larger id than its parent.
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Edge of the minimum spanning tree over mutual reachability distances
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MstEdge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
}

/// Merge of two nodes of the single linkage tree
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
    next_label: usize,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        let mut size = vec![1; n];
        size.resize(2 * n, 0);
        UnionFind {
            parent: (0..2 * n).collect(),
            size,
            next_label: n,
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let label = self.next_label;
        self.parent[a] = label;
        self.parent[b] = label;
        self.size[label] = self.size[a] + self.size[b];
        self.next_label += 1;
    }
}

/// Builds the single linkage tree out of a spanning tree
///
/// The edges are merged in ascending order of distance.
pub(crate) fn single_linkage(n_samples: usize, mst: &mut [MstEdge]) -> Vec<Merge> {
    mst.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
    });

    let mut union_find = UnionFind::new(n_samples);
    mst.iter()
        .map(|edge| {
            let left = union_find.find(edge.left);
            let right = union_find.find(edge.right);
            let size = union_find.size[left] + union_find.size[right];
            union_find.union(left, right);
            Merge {
                left,
                right,
                distance: edge.distance,
                size,
            }
        })
        .collect()
}

/// A row or a cluster leaving its parent cluster at density `lambda`
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CondensedEdge {
    pub parent: usize,
    pub child: usize,
    pub lambda: f64,
    pub child_size: usize,
}

/// Single linkage tree where splits that shed fewer than `min_cluster_size` rows are seen as
/// rows falling out of a persisting cluster
#[derive(Debug)]
pub(crate) struct CondensedTree {
    n_samples: usize,
    n_clusters: usize,
    edges: Vec<CondensedEdge>,
}

fn lambda_of(distance: f64) -> f64 {
    if distance > 0. {
        1. / distance
    } else {
        f64::INFINITY
    }
}

fn descendants(merges: &[Merge], n_samples: usize, root: usize) -> Vec<usize> {
    let mut queue = VecDeque::from(vec![root]);
    let mut nodes = Vec::new();
    while let Some(node) = queue.pop_front() {
        nodes.push(node);
        if node >= n_samples {
            let merge = &merges[node - n_samples];
            queue.push_back(merge.left);
            queue.push_back(merge.right);
        }
    }
    nodes
}

impl CondensedTree {
    /// Condenses a single linkage tree of at least two rows
    pub fn new(merges: &[Merge], n_samples: usize, min_cluster_size: usize) -> Self {
        let root = 2 * n_samples - 2;
        let size_of = |node: usize| {
            if node < n_samples {
                1
            } else {
                merges[node - n_samples].size
            }
        };

        let mut relabel = vec![0; root + 1];
        relabel[root] = n_samples;
        let mut next_label = n_samples + 1;
        let mut ignore = vec![false; root + 1];
        let mut edges = Vec::new();

        for node in descendants(merges, n_samples, root) {
            if node < n_samples || ignore[node] {
                continue;
            }
            let merge = &merges[node - n_samples];
            let lambda = lambda_of(merge.distance);
            let parent = relabel[node];
            let (left, right) = (merge.left, merge.right);
            let (left_size, right_size) = (size_of(left), size_of(right));

            let mut fall_out = |child: usize, edges: &mut Vec<CondensedEdge>| {
                for sub in descendants(merges, n_samples, child) {
                    if sub < n_samples {
                        edges.push(CondensedEdge {
                            parent,
                            child: sub,
                            lambda,
                            child_size: 1,
                        });
                    }
                    ignore[sub] = true;
                }
            };

            match (left_size >= min_cluster_size, right_size >= min_cluster_size) {
                (true, true) => {
                    for &(child, child_size) in &[(left, left_size), (right, right_size)] {
                        relabel[child] = next_label;
                        edges.push(CondensedEdge {
                            parent,
                            child: next_label,
                            lambda,
                            child_size,
                        });
                        next_label += 1;
                    }
                }
                (false, false) => {
                    fall_out(left, &mut edges);
                    fall_out(right, &mut edges);
                }
                (false, true) => {
                    fall_out(left, &mut edges);
                    relabel[right] = parent;
                }
                (true, false) => {
                    fall_out(right, &mut edges);
                    relabel[left] = parent;
                }
            }
        }

        CondensedTree {
            n_samples,
            n_clusters: next_label - n_samples,
            edges,
        }
    }

    fn root(&self) -> usize {
        self.n_samples
    }

    pub fn edges(&self) -> &[CondensedEdge] {
        &self.edges
    }

    /// Sum over the children of each cluster of `(lambda - lambda_birth) * child_size`,
    /// indexed by `cluster - n_samples`
    pub fn stabilities(&self) -> Vec<f64> {
        let mut birth = vec![0.; self.n_clusters];
        for edge in self.edges.iter().filter(|e| e.child >= self.n_samples) {
            birth[edge.child - self.n_samples] = edge.lambda;
        }

        let mut stability = vec![0.; self.n_clusters];
        for edge in &self.edges {
            let cluster = edge.parent - self.n_samples;
            // both lambdas are infinite for clusters of duplicated rows
            let excess = (edge.lambda - birth[cluster]).max(0.);
            stability[cluster] += excess * edge.child_size as f64;
        }
        stability
    }

    fn child_clusters(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.n_clusters];
        for edge in self.edges.iter().filter(|e| e.child >= self.n_samples) {
            children[edge.parent - self.n_samples].push(edge.child - self.n_samples);
        }
        children
    }

    /// Excess of mass selection: a cluster is kept when it is more stable than all of its
    /// descendants together. Returns the selected cluster ids in ascending order.
    pub fn select_clusters(&self, allow_single_cluster: bool) -> Vec<usize> {
        let mut stability = self.stabilities();
        let children = self.child_clusters();
        let mut selected = vec![true; self.n_clusters];
        let first = if allow_single_cluster {
            0
        } else {
            selected[0] = false;
            1
        };

        for cluster in (first..self.n_clusters).rev() {
            let subtree: f64 = children[cluster].iter().map(|&c| stability[c]).sum();
            if subtree > stability[cluster] {
                selected[cluster] = false;
                stability[cluster] = subtree;
            } else {
                let mut queue = children[cluster].iter().copied().collect::<VecDeque<_>>();
                while let Some(child) = queue.pop_front() {
                    selected[child] = false;
                    queue.extend(children[child].iter().copied());
                }
            }
        }

        selected
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(cluster, _)| cluster + self.n_samples)
            .collect()
    }

    /// Flat labels and membership probabilities for the `selected` clusters
    ///
    /// A row belongs to the closest selected ancestor of the cluster it fell out of. Its
    /// probability is the density at which it left, relative to the highest density at which
    /// any member left that cluster.
    pub fn assign(&self, selected: &[usize]) -> (Vec<Option<usize>>, Vec<f64>) {
        let n_nodes = self.n_samples + self.n_clusters;
        let mut parent_of = vec![None; n_nodes];
        let mut deaths = vec![0_f64; n_nodes];
        for edge in &self.edges {
            parent_of[edge.child] = Some((edge.parent, edge.lambda));
            deaths[edge.parent] = deaths[edge.parent].max(edge.lambda);
        }
        let mut label_of = vec![None; n_nodes];
        for (label, &cluster) in selected.iter().enumerate() {
            label_of[cluster] = Some(label);
        }

        let mut labels = vec![None; self.n_samples];
        let mut probabilities = vec![0.; self.n_samples];
        for row in 0..self.n_samples {
            let (mut node, lambda) = match parent_of[row] {
                Some(parent) => parent,
                None => continue,
            };
            let cluster = loop {
                if label_of[node].is_some() || node == self.root() {
                    break node;
                }
                match parent_of[node] {
                    Some((parent, _)) => node = parent,
                    None => break self.root(),
                }
            };
            let label = match label_of[cluster] {
                Some(label) => label,
                None => continue,
            };
            // rows falling out of a selected root only count when they persist until the end
            if cluster == self.root() && lambda < deaths[cluster] {
                continue;
            }

            let max_lambda = deaths[cluster];
            labels[row] = Some(label);
            probabilities[row] = if max_lambda == 0. || lambda.is_infinite() {
                1.
            } else {
                lambda.min(max_lambda) / max_lambda
            };
        }
        (labels, probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn chain(distances: &[f64]) -> Vec<MstEdge> {
        distances
            .iter()
            .enumerate()
            .map(|(i, &distance)| MstEdge {
                left: i,
                right: i + 1,
                distance,
            })
            .collect()
    }

    #[test]
    fn single_linkage_merges_in_distance_order() {
        let mut mst = chain(&[3., 1., 2.]);
        let merges = single_linkage(4, &mut mst);

        assert_eq!(merges.len(), 3);
        assert_eq!(
            merges[0],
            Merge {
                left: 1,
                right: 2,
                distance: 1.,
                size: 2
            }
        );
        assert_eq!(
            merges[1],
            Merge {
                left: 4,
                right: 3,
                distance: 2.,
                size: 3
            }
        );
        assert_eq!(
            merges[2],
            Merge {
                left: 0,
                right: 5,
                distance: 3.,
                size: 4
            }
        );
    }

    #[test]
    fn small_splits_fall_out_of_the_parent() {
        // rows 0..3 are close together, row 3 is far away
        let mut mst = chain(&[1., 1., 10.]);
        let merges = single_linkage(4, &mut mst);
        let tree = CondensedTree::new(&merges, 4, 2);

        // no split leaves two clusters of two rows, so there is only the root
        assert!(tree.edges().iter().all(|e| e.parent == 4 && e.child < 4));
        let outlier = tree.edges().iter().find(|e| e.child == 3).unwrap();
        assert_abs_diff_eq!(outlier.lambda, 0.1);
        assert!(tree.select_clusters(false).is_empty());
        assert_eq!(tree.select_clusters(true), vec![4]);
    }

    #[test]
    fn two_clusters_are_selected() {
        // {0, 1} and {2, 3} joined by a long edge
        let mut mst = chain(&[0.5, 4., 0.25]);
        let merges = single_linkage(4, &mut mst);
        let tree = CondensedTree::new(&merges, 4, 2);

        let selected = tree.select_clusters(false);
        assert_eq!(selected, vec![5, 6]);

        let (labels, probabilities) = tree.assign(&selected);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
        assert!(labels.iter().all(|l| l.is_some()));
        probabilities
            .iter()
            .for_each(|&p| assert_abs_diff_eq!(p, 1.));
    }

    #[test]
    fn stability_of_duplicates_is_finite() {
        let mut mst = chain(&[0., 0., 0.]);
        let merges = single_linkage(4, &mut mst);
        let tree = CondensedTree::new(&merges, 4, 2);
        assert!(tree.stabilities().iter().all(|s| !s.is_nan()));
    }
}
