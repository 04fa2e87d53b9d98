//! Linearization of a dataset: pairwise distances, average-linkage
//! clustering and optimal leaf ordering of the cluster tree.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use crate::error::{Error, Result};

/// A dissimilarity between two feature vectors of the same length.
/// It must be finite, non-negative and symmetric.
///
/// Closures `Fn(&[f64], &[f64]) -> f64` are metrics.
pub trait Metric {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;
}

impl<F> Metric for F where F: Fn(&[f64], &[f64]) -> f64 {
    #[inline]
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 { self(a, b) }
}

/// Usual metrics on feature vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq,
         Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    #[default]
    Euclidean,
    Manhattan,
    /// One minus the cosine of the angle between the vectors.  A null
    /// vector is at distance 1 of every non-null one.
    Cosine,
}

impl Metric for Distance {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let pairs = a.iter().zip(b);
        match self {
            Distance::Euclidean =>
                pairs.map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt(),
            Distance::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
            Distance::Cosine => {
                let (mut ab, mut aa, mut bb) = (0., 0., 0.);
                for (x, y) in pairs {
                    ab += x * y;
                    aa += x * x;
                    bb += y * y;
                }
                if aa == 0. && bb == 0. { 0. }
                else if aa == 0. || bb == 0. { 1. }
                else { (1. - ab / (aa.sqrt() * bb.sqrt())).max(0.) }
            }
        }
    }
}

/// Symmetric matrix of distances between items, with a zero diagonal.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    d: Vec<f64>, // row major, n × n
}

impl DistanceMatrix {
    /// Distances between all pairs of `items` (the rows of a data
    /// matrix).  All rows must have the same length and finite
    /// entries.
    pub fn new<R>(items: &[R], metric: &impl Metric) -> Result<Self>
    where R: AsRef<[f64]> {
        let n = items.len();
        if n == 0 {
            return Err(Error::InvalidArgument("no items to embed".into()))
        }
        let dim = items[0].as_ref().len();
        for row in items {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(Error::DimensionMismatch {
                    what: "feature vector", expected: dim, found: row.len() })
            }
            if row.iter().any(|x| !x.is_finite()) {
                return Err(Error::InvalidArgument(
                    "feature vectors must have finite entries".into()))
            }
        }
        let mut d = vec![0.; n * n];
        for i in 0 .. n {
            for j in i + 1 .. n {
                let dij = metric.distance(items[i].as_ref(), items[j].as_ref());
                if !(dij.is_finite() && dij >= 0.) {
                    return Err(Error::InvalidArgument(format!(
                        "the metric returned {dij} for items {i} and {j}")))
                }
                d[i * n + j] = dij;
                d[j * n + i] = dij;
            }
        }
        Ok(DistanceMatrix { n, d })
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize { self.n }

    pub fn is_empty(&self) -> bool { self.n == 0 }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 { self.d[i * self.n + j] }

    /// Sum of the distances between consecutive items of `order`.
    pub fn path_length(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }
}

/// Merge of two clusters.  Nodes `0 .. n` are the items, the cluster
/// created by the `m`-th merge is the node `n + m`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    /// Average distance between the items of the two clusters.
    pub height: f64,
    /// Number of items in the merged cluster.
    pub size: usize,
}

/// Binary cluster tree over `n` items.
#[derive(Clone, Debug, PartialEq)]
pub struct Dendrogram {
    n: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    /// Returns the number of leaves (items).
    pub fn len(&self) -> usize { self.n }

    pub fn is_empty(&self) -> bool { self.n == 0 }

    /// The merges, from the closest clusters to the root.
    pub fn merges(&self) -> &[Merge] { &self.merges }

    fn children(&self, node: usize) -> Option<(usize, usize)> {
        if node < self.n { None }
        else {
            let m = &self.merges[node - self.n];
            Some((m.left, m.right))
        }
    }

    fn size(&self, node: usize) -> usize {
        if node < self.n { 1 } else { self.merges[node - self.n].size }
    }
}

/// Agglomerative clustering with average linkage (UPGMA).  The two
/// closest clusters are merged first; ties go to the clusters with the
/// smallest item indices.
pub fn average_linkage(dm: &DistanceMatrix) -> Dendrogram {
    let n = dm.len();
    // Slot `i` holds the cluster whose smallest item is `i`.
    let mut d = dm.d.clone();
    let mut active = vec![true; n];
    let mut node: Vec<usize> = (0 .. n).collect();
    let mut size = vec![1; n];
    let mut merges = Vec::with_capacity(n.saturating_sub(1));
    for step in 0 .. n.saturating_sub(1) {
        let mut best: Option<(f64, usize, usize)> = None;
        for i in (0 .. n).filter(|&i| active[i]) {
            for j in (i + 1 .. n).filter(|&j| active[j]) {
                let dij = d[i * n + j];
                if best.map_or(true, |(b, _, _)| dij < b) {
                    best = Some((dij, i, j))
                }
            }
        }
        let Some((height, a, b)) = best else { break };
        let (na, nb) = (size[a] as f64, size[b] as f64);
        for x in (0 .. n).filter(|&x| active[x] && x != a && x != b) {
            let dx = (na * d[a * n + x] + nb * d[b * n + x]) / (na + nb);
            d[a * n + x] = dx;
            d[x * n + a] = dx;
        }
        active[b] = false;
        size[a] += size[b];
        trace!(step, left = node[a], right = node[b], height, "merge");
        merges.push(Merge { left: node[a], right: node[b], height,
                            size: size[a] });
        node[a] = n + step;
    }
    Dendrogram { n, merges }
}

/// Leaf order of `tree` minimizing the sum of distances between
/// adjacent leaves among all the orders obtained by flipping subtrees
/// (Bar-Joseph, Gifford and Jaakkola, 2001).
pub fn optimal_leaf_order(tree: &Dendrogram, dm: &DistanceMatrix)
                          -> Vec<usize> {
    let n = tree.len();
    if n <= 2 || tree.merges.len() != n - 1 { return (0 .. n).collect() }
    let root = 2 * n - 2;
    // Lay the leaves out in tree order so that each node covers a
    // range `start[node] .. start[node] + size`.
    let mut seq = vec![0; n];
    let mut start = vec![0; 2 * n - 1];
    let mut stack = vec![(root, 0)];
    while let Some((node, s)) = stack.pop() {
        start[node] = s;
        match tree.children(node) {
            None => seq[s] = node,
            Some((l, r)) => {
                stack.push((l, s));
                stack.push((r, s + tree.size(l)));
            }
        }
    }
    let mut pos = vec![0; n];
    for (p, &leaf) in seq.iter().enumerate() { pos[leaf] = p }
    let leaves = |node: usize| &seq[start[node] .. start[node] + tree.size(node)];
    let contains = |node: usize, leaf: usize| {
        (start[node] .. start[node] + tree.size(node)).contains(&pos[leaf]) };
    // Leaves that may end the order of `node` when it starts with `leaf`.
    let far_ends = |node: usize, leaf: usize| match tree.children(node) {
        None => leaves(node),
        Some((l, r)) => if contains(l, leaf) { leaves(r) } else { leaves(l) },
    };

    // `cost[i][j]`: best path length of the smallest subtree containing
    // both `i` and `j`, starting at `i` and ending at `j`.  `split[i][j]`
    // holds the last leaf of the half starting at `i` and the first one
    // of the half ending at `j`.
    let mut cost = vec![f64::INFINITY; n * n];
    let mut split = vec![(0, 0); n * n];
    for i in 0 .. n { cost[i * n + i] = 0. }
    let mut via = vec![(f64::INFINITY, 0); n];
    for (m, merge) in tree.merges.iter().enumerate() {
        let (a, b) = (merge.left, merge.right);
        for &i in leaves(a) {
            // via[m] = best path from `i` across `a`, then to `m` in `b`.
            for &mb in leaves(b) {
                via[mb] = (f64::INFINITY, 0);
                for &ka in far_ends(a, i) {
                    let c = cost[i * n + ka] + dm.get(ka, mb);
                    if c < via[mb].0 { via[mb] = (c, ka) }
                }
            }
            for &j in leaves(b) {
                let mut best = (f64::INFINITY, 0, 0);
                for &mb in far_ends(b, j) {
                    let c = via[mb].0 + cost[mb * n + j];
                    if c < best.0 { best = (c, via[mb].1, mb) }
                }
                let (c, ka, mb) = best;
                cost[i * n + j] = c;
                cost[j * n + i] = c;
                split[i * n + j] = (ka, mb);
                split[j * n + i] = (mb, ka);
            }
        }
        trace!(node = n + m, "ordered subtree");
    }

    let (a, b) = tree.children(root).unwrap_or((root, root));
    let mut best = (f64::INFINITY, 0, 0);
    for &i in leaves(a) {
        for &j in leaves(b) {
            let c = cost[i * n + j];
            if c < best.0 || (c == best.0 && (i, j) < (best.1, best.2)) {
                best = (c, i, j)
            }
        }
    }
    let (length, i, j) = best;
    debug!(items = n, path_length = length, "optimal leaf order");

    // Unfold the splits, first halves first.
    let mut order = Vec::with_capacity(n);
    let mut todo = vec![(root, i, j)];
    while let Some((node, i, j)) = todo.pop() {
        match tree.children(node) {
            None => order.push(i),
            Some((l, r)) => {
                let (ki, mj) = split[i * n + j];
                let (first, second) = if contains(l, i) { (l, r) }
                                      else { (r, l) };
                todo.push((second, mj, j));
                todo.push((first, i, ki));
            }
        }
    }
    order
}

/// Distances between `items` and an order of the items placing similar
/// ones next to each other.
pub fn embed<R>(items: &[R], metric: &impl Metric)
                -> Result<(DistanceMatrix, Vec<usize>)>
where R: AsRef<[f64]> {
    let dm = DistanceMatrix::new(items, metric)?;
    if dm.len() <= 2 {
        return Ok((dm.clone(), (0 .. dm.len()).collect()))
    }
    let tree = average_linkage(&dm);
    let order = optimal_leaf_order(&tree, &dm);
    Ok((dm, order))
}


#[cfg(test)]
mod tests {
    use super::*;

    fn line(xs: &[f64]) -> DistanceMatrix {
        let items: Vec<_> = xs.iter().map(|&x| [x]).collect();
        DistanceMatrix::new(&items, &Distance::Euclidean).unwrap()
    }

    // All leaf orders obtained by flipping subtrees.
    fn tree_orders(tree: &Dendrogram, node: usize) -> Vec<Vec<usize>> {
        match tree.children(node) {
            None => vec![vec![node]],
            Some((l, r)) => {
                let mut orders = vec![];
                for ol in tree_orders(tree, l) {
                    for or in tree_orders(tree, r) {
                        orders.push([ol.clone(), or.clone()].concat());
                        orders.push([or, ol.clone()].concat());
                    }
                }
                orders
            }
        }
    }

    #[test]
    fn metrics() {
        let (a, b) = ([0., 0.], [3., 4.]);
        assert_eq!(Distance::Euclidean.distance(&a, &b), 5.);
        assert_eq!(Distance::Manhattan.distance(&a, &b), 7.);
        assert_eq!(Distance::Cosine.distance(&a, &a), 0.);
        assert_eq!(Distance::Cosine.distance(&a, &b), 1.);
        assert!(Distance::Cosine.distance(&[1., 0.], &[2., 0.]).abs() < 1e-12);
        assert!((Distance::Cosine.distance(&[1., 0.], &[0., 1.]) - 1.).abs()
                < 1e-12);
    }

    #[test]
    fn distance_matrix() {
        let dm = line(&[0., 1., 3.]);
        assert_eq!(dm.len(), 3);
        for i in 0 .. 3 {
            assert_eq!(dm.get(i, i), 0.);
            for j in 0 .. 3 { assert_eq!(dm.get(i, j), dm.get(j, i)) }
        }
        assert_eq!(dm.get(0, 2), 3.);
        assert_eq!(dm.path_length(&[2, 0, 1]), 4.);
    }

    #[test]
    fn distance_matrix_errors() {
        let ragged = vec![vec![0., 1.], vec![2.]];
        assert!(matches!(DistanceMatrix::new(&ragged, &Distance::Euclidean),
                         Err(Error::DimensionMismatch { expected: 2,
                                                        found: 1, .. })));
        let nan = vec![[0.], [f64::NAN]];
        assert!(matches!(DistanceMatrix::new(&nan, &Distance::Euclidean),
                         Err(Error::InvalidArgument(_))));
        let empty: Vec<[f64; 1]> = vec![];
        assert!(DistanceMatrix::new(&empty, &Distance::Euclidean).is_err());
        let negative = |_: &[f64], _: &[f64]| -1.;
        assert!(DistanceMatrix::new(&[[0.], [1.]], &negative).is_err());
    }

    #[test]
    fn average_linkage_merges() {
        let tree = average_linkage(&line(&[0., 1., 10., 12.]));
        let m = tree.merges();
        assert_eq!(m.len(), 3);
        assert_eq!((m[0].left, m[0].right, m[0].height, m[0].size),
                   (0, 1, 1., 2));
        assert_eq!((m[1].left, m[1].right, m[1].height), (2, 3, 2.));
        assert_eq!((m[2].left, m[2].right, m[2].size), (4, 5, 4));
        assert_eq!(m[2].height, (10. + 12. + 9. + 11.) / 4.);
    }

    #[test]
    fn ties_go_to_smallest_indices() {
        let tree = average_linkage(&line(&[0., 1., 2.]));
        assert_eq!((tree.merges()[0].left, tree.merges()[0].right), (0, 1));
    }

    #[test]
    fn leaf_order_on_a_line() {
        let xs = [5., 0., 10., 1., 6., 11., 20.];
        let dm = line(&xs);
        let order = optimal_leaf_order(&average_linkage(&dm), &dm);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, (0 .. xs.len()).collect::<Vec<_>>());
        assert_eq!(dm.path_length(&order), 20.);
    }

    #[test]
    fn leaf_order_is_optimal() {
        let items = [[0.3, 2.], [4., 1.], [2.5, 2.5], [0., 0.], [3., 3.2],
                     [1.2, 0.4], [5., 5.]];
        let dm = DistanceMatrix::new(&items, &Distance::Euclidean).unwrap();
        let tree = average_linkage(&dm);
        let order = optimal_leaf_order(&tree, &dm);
        let best = tree_orders(&tree, 2 * items.len() - 2).iter()
            .map(|o| dm.path_length(o))
            .fold(f64::INFINITY, f64::min);
        assert!((dm.path_length(&order) - best).abs() < 1e-9,
                "{} > {best}", dm.path_length(&order));
        assert!(tree_orders(&tree, 2 * items.len() - 2).contains(&order));
    }

    #[test]
    fn embed_small_and_custom_metric() {
        let (dm, order) = embed(&[[1.], [2.]], &Distance::Euclidean).unwrap();
        assert_eq!((dm.len(), order), (2, vec![0, 1]));
        let (_, order) = embed(&[[7.]], &Distance::Euclidean).unwrap();
        assert_eq!(order, [0]);
        let first = |a: &[f64], b: &[f64]| (a[0] - b[0]).abs();
        let items = [[0., 100.], [10., 0.], [1., -100.]];
        let (dm, order) = embed(&items, &first).unwrap();
        assert_eq!(dm.path_length(&order), 10.);
    }
}
