//! Generation of candidate colors spanning the constrained color space.

use std::{collections::HashSet, f64::consts::PI};
use rand::Rng;
use rgb::RGB8;
use tracing::debug;
use crate::{RGBColor,
            config::{ColorConstraint, Sampling},
            error::{Error, Result},
            lab::Lab};

/// Candidate colors, all representable in 8-bit sRGB and pairwise
/// distinct.
#[derive(Clone, Debug)]
pub struct CandidatePool {
    colors: Vec<Lab>,
}

impl CandidatePool {
    /// Pool made of the given colors, in that order.
    pub fn from_colors(colors: Vec<Lab>) -> Self { CandidatePool { colors } }

    pub fn len(&self) -> usize { self.colors.len() }

    pub fn is_empty(&self) -> bool { self.colors.is_empty() }

    pub fn colors(&self) -> &[Lab] { &self.colors }
}

/// Largest chroma of the hue `h` at lightness `l` inside the sRGB
/// gamut.
fn max_chroma(l: f64, h: f64) -> f64 {
    let (mut lo, mut hi) = (0., 200.);
    for _ in 0 .. 32 {
        let mid = 0.5 * (lo + hi);
        if Lab::from_lch(l, mid, h).in_gamut() { lo = mid } else { hi = mid }
    }
    lo
}

/// Sweep the hue circle and, for each hue, a grid of lightness and
/// chroma levels within `constraint`.  The only randomness is the phase
/// of the hue sweep, drawn from `rng`, so the pool size depends on the
/// constraint and `sampling` alone.
pub fn sample(constraint: &ColorConstraint, sampling: &Sampling,
              rng: &mut impl Rng) -> Result<CandidatePool> {
    constraint.validate()?;
    sampling.validate()?;
    let &ColorConstraint { minimal_saturation: s0, minimal_lightness: l0,
                           maximal_lightness: l1 } = constraint;
    let dh = 2. * PI / sampling.hue_steps as f64;
    let phase = rng.random::<f64>() * dh;
    let nl = sampling.lightness_steps as f64;
    let ns = sampling.saturation_steps as f64;
    let mut seen = HashSet::new();
    let mut colors = vec![];
    for i in 0 .. sampling.hue_steps {
        let h = phase + i as f64 * dh;
        for j in 0 .. sampling.lightness_steps {
            let l = l0 + (l1 - l0) * (j as f64 + 0.5) / nl;
            let c1 = max_chroma(l, h);
            if c1 < s0 { continue }
            for k in 0 .. sampling.saturation_steps {
                let c = s0 + (c1 - s0) * (k as f64 + 1.) / ns;
                let rgb = RGB8::from_lab(&Lab::from_lch(l, c, h));
                let lab = rgb.to_lab();
                if constraint.admits(&lab) && seen.insert([rgb.r, rgb.g, rgb.b])
                {
                    colors.push(lab);
                }
            }
        }
    }
    debug!(candidates = colors.len(), hue_phase = phase,
           "sampled candidate colors");
    if colors.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "no color satisfies the constraint {constraint:?}")))
    }
    Ok(CandidatePool { colors })
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn pool(seed: u64, sampling: &Sampling) -> CandidatePool {
        let mut rng = StdRng::seed_from_u64(seed);
        sample(&ColorConstraint::default(), sampling, &mut rng).unwrap()
    }

    #[test]
    fn deterministic_for_a_seed() {
        let s = Sampling::default();
        assert_eq!(pool(3, &s).colors(), pool(3, &s).colors());
    }

    #[test]
    fn candidates_satisfy_constraint() {
        let c = ColorConstraint::default();
        let p = pool(11, &Sampling::default());
        assert!(p.len() >= 200, "only {} candidates", p.len());
        let mut rgbs: Vec<_> = p.colors().iter().map(|lab| {
            assert!(c.admits(lab), "{lab:?}");
            let rgb = RGB8::from_lab(lab);
            assert_eq!(&rgb.to_lab(), lab);
            [rgb.r, rgb.g, rgb.b]
        }).collect();
        rgbs.sort();
        rgbs.dedup();
        assert_eq!(rgbs.len(), p.len());
    }

    #[test]
    fn size_scales_with_density() {
        let coarse = Sampling { hue_steps: 12, lightness_steps: 2,
                                saturation_steps: 2 };
        let fine = Sampling { hue_steps: 48, ..coarse };
        let (c, f) = (pool(0, &coarse).len(), pool(0, &fine).len());
        assert!(c <= 12 * 2 * 2);
        assert!(f > 2 * c, "{c} vs {f}");
    }

    #[test]
    fn empty_pool() {
        let c = ColorConstraint { minimal_saturation: 190.,
                                  ..Default::default() };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(sample(&c, &Sampling::default(), &mut rng),
                         Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn zero_density() {
        let s = Sampling { hue_steps: 0, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample(&ColorConstraint::default(), &s, &mut rng).is_err());
    }
}
