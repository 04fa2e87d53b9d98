//! Assignment of palette colors to ordered items.

use tracing::debug;
use crate::error::{Error, Result};

/// A `rows × columns` matrix of finite costs.
#[derive(Clone, Debug, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    columns: usize,
    c: Vec<f64>, // row major
}

impl CostMatrix {
    /// Matrix whose entry `(i, j)` is `cost(i, j)`.
    pub fn from_fn(rows: usize, columns: usize,
                   cost: impl Fn(usize, usize) -> f64) -> Result<Self> {
        let mut c = Vec::with_capacity(rows * columns);
        for i in 0 .. rows {
            for j in 0 .. columns {
                let cij = cost(i, j);
                if !cij.is_finite() {
                    return Err(Error::InvalidArgument(format!(
                        "cost ({i}, {j}) = {cij} is not finite")))
                }
                c.push(cij);
            }
        }
        Ok(CostMatrix { rows, columns, c })
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn columns(&self) -> usize { self.columns }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 { self.c[i * self.columns + j] }
}

/// Minimum cost assignment of each row of `cost` to a distinct column
/// (Hungarian algorithm with potentials, O(rows² × columns)).  Returns
/// the column of each row.  There must not be more rows than columns.
pub fn hungarian(cost: &CostMatrix) -> Result<Vec<usize>> {
    let (n, m) = (cost.rows, cost.columns);
    if n > m {
        return Err(Error::InvalidArgument(format!(
            "cannot assign {n} rows to {m} columns")))
    }
    // 1-based; column 0 is a sentinel.
    let mut u = vec![0.; n + 1];
    let mut v = vec![0.; m + 1];
    let mut row_of = vec![0; m + 1];
    let mut way = vec![0; m + 1];
    for i in 1 ..= n {
        row_of[0] = i;
        let mut j0 = 0;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[j0] = true;
            let i0 = row_of[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1 ..= m {
                if used[j] { continue }
                let cur = cost.get(i0 - 1, j - 1) - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0 ..= m {
                if used[j] {
                    u[row_of[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if row_of[j0] == 0 { break }
        }
        // Augment along the alternating path.
        loop {
            let j1 = way[j0];
            row_of[j0] = row_of[j1];
            j0 = j1;
            if j0 == 0 { break }
        }
    }
    let mut column = vec![0; n];
    for j in 1 ..= m {
        if row_of[j] != 0 { column[row_of[j] - 1] = j - 1 }
    }
    Ok(column)
}

/// Palette index of each item.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    colors: Vec<usize>,
    cost: f64,
}

impl Assignment {
    /// Returns the number of items.
    pub fn len(&self) -> usize { self.colors.len() }

    pub fn is_empty(&self) -> bool { self.colors.is_empty() }

    /// Palette index of the item `item`.
    pub fn color_of(&self, item: usize) -> usize { self.colors[item] }

    /// Palette indices of all items, by item.
    pub fn colors(&self) -> &[usize] { &self.colors }

    /// Sum over the items of the squared difference between the
    /// normalized rank of the item and that of its color.
    pub fn cost(&self) -> f64 { self.cost }
}

/// Rank `r` of `len` scaled to \[0, 1\].
#[inline]
fn normalized_rank(r: usize, len: usize) -> f64 {
    if len <= 1 { 0. } else { r as f64 / (len - 1) as f64 }
}

/// Assign a color of a palette of `n_colors` colors to each item of
/// `ordering` (a permutation of the item indices).
///
/// When there are as many colors as items, the `r`-th item of the
/// ordering gets the `r`-th color.  Otherwise the colors are shared as
/// evenly as possible (each used ⌊k/n⌋ or ⌈k/n⌉ times for `k` items),
/// or each used at most once if there are more colors than items, so as
/// to minimize the total rank mismatch.
pub fn assign(ordering: &[usize], n_colors: usize) -> Result<Assignment> {
    let k = ordering.len();
    if k == 0 || n_colors == 0 {
        return Err(Error::InvalidArgument(format!(
            "cannot assign {n_colors} colors to {k} items")))
    }
    let mut seen = vec![false; k];
    for &item in ordering {
        if item >= k || seen[item] {
            return Err(Error::InvalidArgument(
                "the ordering is not a permutation of the items".into()))
        }
        seen[item] = true;
    }
    let mut colors = vec![0; k];
    if k == n_colors {
        for (r, &item) in ordering.iter().enumerate() { colors[item] = r }
        return Ok(Assignment { colors, cost: 0. })
    }
    // Each color has `quota` slots that must be filled and, if the
    // colors do not divide the items evenly, one optional slot costing
    // more than any complete assignment.
    let quota = k / n_colors;
    let optional = k % n_colors != 0;
    let per_color = quota + optional as usize;
    let penalty = k as f64 + 1.;
    let rank_cost = |r: usize, color: usize| {
        let d = normalized_rank(r, k) - normalized_rank(color, n_colors);
        d * d };
    let cost = CostMatrix::from_fn(k, n_colors * per_color, |r, slot| {
        let (color, s) = (slot / per_color, slot % per_color);
        let c = rank_cost(r, color);
        if s < quota { c } else { c + penalty }
    })?;
    let slots = hungarian(&cost)?;
    let mut total = 0.;
    for (r, &item) in ordering.iter().enumerate() {
        let color = slots[r] / per_color;
        colors[item] = color;
        total += rank_cost(r, color);
    }
    debug!(items = k, n_colors, cost = total, "assigned colors");
    Ok(Assignment { colors, cost: total })
}
