//! Caller-configurable parameters of the color assignment.

use serde::{Deserialize, Serialize};
use crate::{embed::Distance, error::{Error, Result}, lab::Lab};

/// Bounds that every generated color must satisfy.  The defaults
/// exclude near-gray, near-black and near-white colors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConstraint {
    /// Minimal chroma (see [`Lab::saturation`]).
    pub minimal_saturation: f64,
    /// Minimal L\*, in \[0, 100\].
    pub minimal_lightness: f64,
    /// Maximal L\*, in \[0, 100\].  Must exceed `minimal_lightness`.
    pub maximal_lightness: f64,
}

impl Default for ColorConstraint {
    fn default() -> Self {
        ColorConstraint { minimal_saturation: 20.,
                          minimal_lightness: 30.,
                          maximal_lightness: 85. }
    }
}

impl ColorConstraint {
    pub fn validate(&self) -> Result<()> {
        let ColorConstraint { minimal_saturation: s, minimal_lightness: l0,
                              maximal_lightness: l1 } = *self;
        if !(s.is_finite() && s >= 0.) {
            return Err(Error::InvalidArgument(format!(
                "minimal saturation must be a non-negative number, got {s}")))
        }
        if !(0. ..= 100.).contains(&l0) || !(0. ..= 100.).contains(&l1) {
            return Err(Error::InvalidArgument(format!(
                "lightness bounds must lie in [0, 100], got [{l0}, {l1}]")))
        }
        if l0 >= l1 {
            return Err(Error::InvalidArgument(format!(
                "minimal lightness {l0} must be below maximal lightness {l1}")))
        }
        Ok(())
    }

    /// Say whether `c` satisfies the constraint.
    pub fn admits(&self, c: &Lab) -> bool {
        c.saturation() >= self.minimal_saturation
            && self.minimal_lightness <= c.l && c.l <= self.maximal_lightness
    }
}

/// Density of the sweep generating candidate colors.  The pool has at
/// most `hue_steps * lightness_steps * saturation_steps` colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sampling {
    pub hue_steps: usize,
    pub lightness_steps: usize,
    pub saturation_steps: usize,
}

impl Default for Sampling {
    fn default() -> Self {
        Sampling { hue_steps: 72, lightness_steps: 5, saturation_steps: 4 }
    }
}

impl Sampling {
    pub fn validate(&self) -> Result<()> {
        if self.hue_steps == 0 || self.lightness_steps == 0
            || self.saturation_steps == 0 {
            return Err(Error::InvalidArgument(format!(
                "sampling densities must be positive, got {self:?}")))
        }
        Ok(())
    }
}

/// Number of colors used when every row of a matrix is colored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteSize {
    /// Exactly this many colors.
    Fixed(usize),
    /// One color per row, but no more than `max` colors.
    Bounded { max: usize },
}

impl Default for PaletteSize {
    fn default() -> Self { PaletteSize::Bounded { max: 12 } }
}

impl PaletteSize {
    /// The palette size for `items` rows.
    pub fn resolve(&self, items: usize) -> usize {
        match *self {
            PaletteSize::Fixed(n) => n,
            PaletteSize::Bounded { max } => items.min(max),
        }
    }
}

/// Options of [`data_colors`][crate::data_colors] and
/// [`grouped_data_colors`][crate::grouped_data_colors].
///
/// # Example
///
/// ```
/// use data_colors::{Options, PaletteSize};
/// let opt = Options::from_json(r#"{ "palette_size": { "fixed": 5 },
///                                   "seed": 7 }"#).unwrap();
/// assert_eq!(opt.palette_size, PaletteSize::Fixed(5));
/// assert_eq!(opt.constraint, Default::default());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub constraint: ColorConstraint,
    pub sampling: Sampling,
    pub palette_size: PaletteSize,
    pub metric: Distance,
    /// Seed of the color sampling; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Options {
    /// Read options from a JSON document.  Missing fields take their
    /// default values.
    pub fn from_json(s: &str) -> Result<Options> {
        let opt: Options = serde_json::from_str(s)?;
        opt.validate()?;
        Ok(opt)
    }

    pub fn validate(&self) -> Result<()> {
        self.constraint.validate()?;
        self.sampling.validate()?;
        match self.palette_size {
            PaletteSize::Fixed(0) | PaletteSize::Bounded { max: 0 } =>
                Err(Error::InvalidArgument(
                    "the palette size must be positive".into())),
            _ => Ok(()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_constraint_is_valid() {
        assert!(ColorConstraint::default().validate().is_ok());
        assert!(Options::default().validate().is_ok());
    }

    #[test]
    fn contradictory_lightness() {
        let c = ColorConstraint { minimal_lightness: 70.,
                                  maximal_lightness: 70.,
                                  ..Default::default() };
        assert!(matches!(c.validate(), Err(Error::InvalidArgument(_))));
        let c = ColorConstraint { minimal_saturation: -1.,
                                  ..Default::default() };
        assert!(matches!(c.validate(), Err(Error::InvalidArgument(_))));
        let c = ColorConstraint { maximal_lightness: f64::NAN,
                                  ..Default::default() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn admits() {
        let c = ColorConstraint::default();
        assert!(c.admits(&Lab::new(50., 30., 0.)));
        assert!(!c.admits(&Lab::new(50., 5., 5.)));
        assert!(!c.admits(&Lab::new(95., 30., 0.)));
        assert!(!c.admits(&Lab::new(10., 30., 0.)));
    }

    #[test]
    fn palette_size() {
        assert_eq!(PaletteSize::default().resolve(4), 4);
        assert_eq!(PaletteSize::default().resolve(400), 12);
        assert_eq!(PaletteSize::Fixed(3).resolve(400), 3);
    }

    #[test]
    fn options_from_json() {
        let opt = Options::from_json(
            r#"{ "constraint": { "minimal_lightness": 40 },
                 "metric": "manhattan",
                 "palette_size": { "bounded": { "max": 6 } } }"#).unwrap();
        assert_eq!(opt.constraint.minimal_lightness, 40.);
        assert_eq!(opt.constraint.maximal_lightness, 85.);
        assert_eq!(opt.metric, Distance::Manhattan);
        assert_eq!(opt.palette_size, PaletteSize::Bounded { max: 6 });
        assert_eq!(opt.seed, None);
        assert!(matches!(Options::from_json("{ \"seed\": -3 }"),
                         Err(Error::Config(_))));
        assert!(matches!(
            Options::from_json(r#"{ "palette_size": { "fixed": 0 } }"#),
            Err(Error::InvalidArgument(_))));
    }
}
