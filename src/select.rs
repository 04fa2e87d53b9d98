//! Selection of maximally distinct colors and their ordering into a
//! color walk.

use tracing::debug;
use crate::{RGBColor,
            error::{Error, Result},
            lab::{self, Lab},
            sampler::CandidatePool};
use rgb::RGB8;

/// A sequence of pairwise distinct colors in which consecutive colors
/// are perceptually close.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    lab: Vec<Lab>,
}

impl Palette {
    /// Returns the number of colors in the palette.
    pub fn len(&self) -> usize { self.lab.len() }

    pub fn is_empty(&self) -> bool { self.lab.is_empty() }

    /// The colors of the palette, in walk order.
    pub fn lab(&self) -> &[Lab] { &self.lab }

    /// Returns the colors of the palette, in walk order.
    ///
    /// # Example
    ///
    /// ```
    /// use rgb::RGB8;
    /// use data_colors::{distinct_palette, ColorConstraint, Sampling};
    /// let p = distinct_palette(3, &ColorConstraint::default(),
    ///                          &Sampling::default(), Some(1)).unwrap();
    /// let colors: Vec<RGB8> = p.colors();
    /// assert_eq!(colors.len(), 3);
    /// ```
    pub fn colors<Color: RGBColor>(&self) -> Vec<Color> {
        self.lab.iter().map(Color::from_lab).collect()
    }

    /// Returns the colors as uppercase `#RRGGBB` strings.
    pub fn hex(&self) -> Vec<String> {
        self.lab.iter().map(|c| lab::to_hex(RGB8::from_lab(c))).collect()
    }

    /// The smallest perceptual distance between two colors of the
    /// palette, or `None` if it has less than two colors.
    pub fn min_separation(&self) -> Option<f64> {
        let mut d = None;
        for (i, c) in self.lab.iter().enumerate() {
            for c1 in &self.lab[i + 1 ..] {
                let dc = c.distance(c1);
                if d.map_or(true, |d| dc < d) { d = Some(dc) }
            }
        }
        d
    }
}

/// Greedy max-min selection of `n` colors of `pool`, returned as a
/// color walk.  Deterministic for a given pool.
pub fn select(pool: &CandidatePool, n: usize) -> Result<Palette> {
    let cand = pool.colors();
    if n == 0 || n > cand.len() {
        return Err(Error::InsufficientColors { requested: n,
                                               available: cand.len() })
    }
    // Seed: the most saturated candidate.
    let mut seed = 0;
    for (i, c) in cand.iter().enumerate() {
        if c.saturation() > cand[seed].saturation() { seed = i }
    }
    let mut chosen = vec![seed];
    let mut taken = vec![false; cand.len()];
    taken[seed] = true;
    // Distance of each candidate to the chosen set.
    let mut dmin: Vec<f64> = cand.iter().map(|c| c.distance(&cand[seed]))
        .collect();
    while chosen.len() < n {
        let mut best: Option<usize> = None;
        for i in (0 .. cand.len()).filter(|&i| !taken[i]) {
            if best.map_or(true, |b| dmin[i] > dmin[b]) { best = Some(i) }
        }
        let Some(next) = best else { break };
        taken[next] = true;
        chosen.push(next);
        for (d, c) in dmin.iter_mut().zip(cand) {
            *d = d.min(c.distance(&cand[next]));
        }
    }
    let palette = Palette { lab: walk(chosen.iter().map(|&i| cand[i])
                                      .collect()) };
    debug!(n, candidates = cand.len(),
           min_separation = palette.min_separation(),
           "selected distinct colors");
    Ok(palette)
}

/// Nearest-neighbour walk through `colors` starting from the darkest
/// one.  Ties go to the earliest color.
fn walk(mut remaining: Vec<Lab>) -> Vec<Lab> {
    let mut order = Vec::with_capacity(remaining.len());
    if remaining.is_empty() { return order }
    let mut start = 0;
    for (i, c) in remaining.iter().enumerate() {
        if c.l < remaining[start].l { start = i }
    }
    let mut current = remaining.remove(start);
    order.push(current);
    while !remaining.is_empty() {
        let mut next = 0;
        for (i, c) in remaining.iter().enumerate() {
            if c.distance(&current) < remaining[next].distance(&current) {
                next = i
            }
        }
        current = remaining.remove(next);
        order.push(current);
    }
    order
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, seq::index, SeedableRng};
    use crate::{config::{ColorConstraint, Sampling}, sampler::sample};

    fn pool() -> CandidatePool {
        let mut rng = StdRng::seed_from_u64(5);
        sample(&ColorConstraint::default(), &Sampling::default(), &mut rng)
            .unwrap()
    }

    fn min_separation(colors: &[Lab]) -> f64 {
        Palette { lab: colors.to_vec() }.min_separation().unwrap()
    }

    #[test]
    fn count_and_bounds() {
        let pool = pool();
        assert!(matches!(select(&pool, 0),
                         Err(Error::InsufficientColors { requested: 0, .. })));
        assert!(matches!(select(&pool, pool.len() + 1),
                         Err(Error::InsufficientColors { .. })));
        let p = select(&pool, 1).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.min_separation(), None);
        let p = select(&pool, pool.len()).unwrap();
        assert_eq!(p.len(), pool.len());
    }

    #[test]
    fn first_color_is_most_saturated() {
        let pool = CandidatePool::from_colors(vec![
            Lab::new(50., 10., 0.), Lab::new(50., 0., 40.),
            Lab::new(50., -20., 0.)]);
        let p = select(&pool, 1).unwrap();
        assert_eq!(p.lab(), &[Lab::new(50., 0., 40.)]);
    }

    #[test]
    fn farthest_point() {
        let pool = CandidatePool::from_colors(vec![
            Lab::new(50., 60., 0.), Lab::new(50., 55., 0.),
            Lab::new(50., -50., 0.), Lab::new(50., 0., 50.)]);
        let p = select(&pool, 2).unwrap();
        let mut l: Vec<_> = p.lab().iter().map(|c| c.a).collect();
        l.sort_by(f64::total_cmp);
        assert_eq!(l, [-50., 60.]);
    }

    #[test]
    fn walk_starts_dark_and_steps_to_nearest() {
        let colors = vec![Lab::new(80., 0., 0.), Lab::new(20., 0., 0.),
                          Lab::new(70., 0., 0.), Lab::new(30., 0., 0.)];
        let ls: Vec<_> = walk(colors).iter().map(|c| c.l).collect();
        assert_eq!(ls, [20., 30., 70., 80.]);
    }

    #[test]
    fn deterministic() {
        let pool = pool();
        assert_eq!(select(&pool, 9).unwrap(), select(&pool, 9).unwrap());
    }

    #[test]
    fn better_than_random_subsets() {
        let pool = pool();
        let n = 8;
        let greedy = select(&pool, n).unwrap().min_separation().unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 200;
        let random: f64 = (0 .. trials).map(|_| {
            let idx = index::sample(&mut rng, pool.len(), n);
            let colors: Vec<_> = idx.iter().map(|i| pool.colors()[i])
                .collect();
            min_separation(&colors)
        }).sum::<f64>() / trials as f64;
        assert!(greedy >= random, "{greedy} < {random}");
    }
}
