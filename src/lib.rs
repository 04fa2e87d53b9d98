//! Perceptually distinct colors that follow the structure of your data.
//!
//! - [`distinct_colors`] returns `n` colors that are as far apart as
//!   possible in the CIE L\*a\*b\* space, ordered so that consecutive
//!   colors are close (a “color walk”).
//! - [`data_colors`] and [`grouped_data_colors`] color the rows (or
//!   groups of rows) of a data matrix so that similar rows receive
//!   similar colors and dissimilar rows distinguishable ones.
//!
//! The pipeline is made of the following steps, each available on its
//! own: candidate colors are sampled ([`sampler::sample`]), a distinct
//! subset is selected and ordered ([`select::select`]), the rows are
//! linearized by average-linkage clustering and optimal leaf ordering
//! ([`embed::embed`]) and both sequences are matched
//! ([`assign::assign`]).
//!
//! # Example
//!
//! ```
//! use data_colors::{grouped_data_colors, Options};
//! let m = [[0., 0.], [0., 1.], [10., 10.], [10., 11.]];
//! let opt = Options { seed: Some(1), ..Default::default() };
//! let colors = grouped_data_colors(&m, &["A", "A", "B", "B"], &opt)
//!     .unwrap();
//! assert_eq!(colors.len(), 2);
//! assert_ne!(colors["A"], colors["B"]);
//! ```

use std::hash::Hash;
use indexmap::IndexMap;
use rand::{rngs::StdRng, SeedableRng};
use rgb::{RGB, RGB8, RGB16, RGBA, RGBA8, RGBA16};
use tracing::debug;

pub mod assign;
mod config;
pub mod embed;
mod error;
pub mod lab;
pub mod sampler;
pub mod select;

pub use config::{ColorConstraint, Options, PaletteSize, Sampling};
pub use embed::{Distance, Metric};
pub use error::{Error, Result};
pub use lab::Lab;
pub use select::Palette;

/// Specifies the methods a RGB color encoding must provide.
pub trait RGBColor: Sized {
    /// Return the red, green and blue components of the color (in
    /// \[0, 255\]).
    fn to_rgb(&self) -> RGB<f64>;

    /// Create a color from its RGB components (in \[0, 255\]).
    fn from_rgb(rgb: RGB<f64>) -> Self;

    /// Return the color in the L\*a\*b\* color space.
    #[inline]
    fn to_lab(&self) -> Lab { Lab::from_rgb(self.to_rgb()) }

    /// Return the color closest to `lab`, clamping it to the sRGB
    /// gamut.
    ///
    /// # Example
    ///
    /// ```
    /// use rgb::RGB8;
    /// use data_colors::{RGBColor, Lab};
    /// let orange = RGB8::new(255, 128, 0);
    /// assert_eq!(RGB8::from_lab(&orange.to_lab()), orange);
    /// ```
    #[inline]
    fn from_lab(lab: &Lab) -> Self { Self::from_rgb(lab.to_rgb_clamped()) }

    /// Return the color as an uppercase `#RRGGBB` string.
    fn to_hex(&self) -> String {
        lab::to_hex(RGB8::from_rgb(self.to_rgb()))
    }

    /// Convert the color to grayscale.
    fn to_gray(&self) -> Self {
        let RGB { r, g, b } = self.to_rgb();
        let x = 0.299 * r + 0.587 * g + 0.114 * b;
        Self::from_rgb(RGB { r: x, g: x, b: x })
    }
}

#[inline]
fn to_u8(x: f64) -> u8 { x.round().clamp(0., 255.) as u8 }

#[inline]
fn to_u16(x: f64) -> u16 { (257. * x).round().clamp(0., 65535.) as u16 }

impl RGBColor for RGB<f64> {
    #[inline]
    fn to_rgb(&self) -> RGB<f64> { *self }

    #[inline]
    fn from_rgb(c: RGB<f64>) -> Self { c }
}

impl RGBColor for RGB8 {
    #[inline]
    fn to_rgb(&self) -> RGB<f64> {
        RGB { r: self.r as f64, g: self.g as f64, b: self.b as f64 }
    }

    #[inline]
    fn from_rgb(c: RGB<f64>) -> Self {
        RGB8 { r: to_u8(c.r), g: to_u8(c.g), b: to_u8(c.b) }
    }
}

impl RGBColor for RGB16 {
    #[inline]
    fn to_rgb(&self) -> RGB<f64> {
        RGB { r: self.r as f64 / 257., g: self.g as f64 / 257.,
              b: self.b as f64 / 257. }
    }

    #[inline]
    fn from_rgb(c: RGB<f64>) -> Self {
        RGB16 { r: to_u16(c.r), g: to_u16(c.g), b: to_u16(c.b) }
    }
}

impl RGBColor for RGBA8 {
    #[inline]
    fn to_rgb(&self) -> RGB<f64> {
        RGB { r: self.r as f64, g: self.g as f64, b: self.b as f64 }
    }

    /// The color is opaque.
    #[inline]
    fn from_rgb(c: RGB<f64>) -> Self {
        RGBA { r: to_u8(c.r), g: to_u8(c.g), b: to_u8(c.b), a: 255 }
    }
}

impl RGBColor for RGBA16 {
    #[inline]
    fn to_rgb(&self) -> RGB<f64> {
        RGB { r: self.r as f64 / 257., g: self.g as f64 / 257.,
              b: self.b as f64 / 257. }
    }

    /// The color is opaque.
    #[inline]
    fn from_rgb(c: RGB<f64>) -> Self {
        RGBA { r: to_u16(c.r), g: to_u16(c.g), b: to_u16(c.b), a: 65535 }
    }
}

/// Random generator of a request: reproducible when seeded.
fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Return a palette of `n` distinct colors satisfying `constraint`,
/// sampled with the density `sampling`.
pub fn distinct_palette(n: usize, constraint: &ColorConstraint,
                        sampling: &Sampling, seed: Option<u64>)
                        -> Result<Palette> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "the number of colors must be at least 1".into()))
    }
    let pool = sampler::sample(constraint, sampling, &mut rng(seed))?;
    select::select(&pool, n)
}

/// Return `n` perceptually distinct colors satisfying `constraint`, as
/// uppercase `#RRGGBB` strings, ordered so that consecutive colors are
/// close.  The result only depends on the arguments when `seed` is
/// given.
///
/// # Example
///
/// ```
/// use data_colors::{distinct_colors, ColorConstraint, Error};
/// let c = ColorConstraint::default();
/// let colors = distinct_colors(5, &c, Some(42)).unwrap();
/// assert_eq!(colors.len(), 5);
/// assert_eq!(colors, distinct_colors(5, &c, Some(42)).unwrap());
/// assert!(matches!(distinct_colors(-1, &c, None),
///                  Err(Error::InvalidArgument(_))));
/// ```
pub fn distinct_colors<N>(n: N, constraint: &ColorConstraint,
                          seed: Option<u64>) -> Result<Vec<String>>
where N: TryInto<usize> {
    let n = n.try_into().map_err(|_| Error::InvalidArgument(
        "the number of colors must be at least 1".into()))?;
    debug!(n, ?constraint, seed, "distinct colors");
    Ok(distinct_palette(n, constraint, &Sampling::default(), seed)?.hex())
}

/// Check that all rows have the same length and finite entries.
fn check_matrix<R: AsRef<[f64]>>(matrix: &[R]) -> Result<usize> {
    let Some(first) = matrix.first() else {
        return Err(Error::InvalidArgument("the matrix has no row".into()))
    };
    let dim = first.as_ref().len();
    for row in matrix {
        let row = row.as_ref();
        if row.len() != dim {
            return Err(Error::DimensionMismatch {
                what: "matrix row", expected: dim, found: row.len() })
        }
        if row.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidArgument(
                "the matrix has non-finite entries".into()))
        }
    }
    Ok(dim)
}

/// Color each of `items` with one of `n` distinct colors.
fn color_items<R: AsRef<[f64]>>(items: &[R], n: usize, options: &Options)
                                -> Result<Vec<String>> {
    if items.len() == 1 {
        return distinct_palette(1, &options.constraint, &options.sampling,
                                options.seed).map(|p| p.hex())
    }
    let palette = distinct_palette(n, &options.constraint, &options.sampling,
                                   options.seed)?;
    let hex = palette.hex();
    let (_, ordering) = embed::embed(items, &options.metric)?;
    let assignment = assign::assign(&ordering, palette.len())?;
    Ok(assignment.colors().iter().map(|&c| hex[c].clone()).collect())
}

/// Color every row of `matrix`, similar rows getting similar colors.
/// The number of colors is given by `options.palette_size`; when it is
/// smaller than the number of rows, colors are shared by neighbouring
/// rows.  The result maps each row index, in increasing order, to an
/// uppercase `#RRGGBB` string.
pub fn data_colors<R>(matrix: &[R], options: &Options)
                      -> Result<IndexMap<usize, String>>
where R: AsRef<[f64]> {
    options.validate()?;
    let dim = check_matrix(matrix)?;
    let n = options.palette_size.resolve(matrix.len());
    debug!(rows = matrix.len(), columns = dim, n_colors = n, "data colors");
    let colors = color_items(matrix, n, options)?;
    Ok(colors.into_iter().enumerate().collect())
}

/// Color the groups of rows of `matrix`, the row `i` belonging to the
/// group `group[i]`.  Each group is represented by the mean of its rows
/// and receives its own color.  The result maps the groups, in order of
/// first appearance, to uppercase `#RRGGBB` strings.
pub fn grouped_data_colors<R, K>(matrix: &[R], group: &[K], options: &Options)
                                 -> Result<IndexMap<K, String>>
where R: AsRef<[f64]>,
      K: Hash + Eq + Clone {
    options.validate()?;
    if group.len() != matrix.len() {
        return Err(Error::DimensionMismatch {
            what: "group labels", expected: matrix.len(), found: group.len() })
    }
    let dim = check_matrix(matrix)?;
    let mut index: IndexMap<K, (Vec<f64>, usize)> = IndexMap::new();
    for (row, label) in matrix.iter().zip(group) {
        let (sum, count) = index.entry(label.clone())
            .or_insert_with(|| (vec![0.; dim], 0));
        for (s, x) in sum.iter_mut().zip(row.as_ref()) { *s += x }
        *count += 1;
    }
    let centroids: Vec<Vec<f64>> = index.values()
        .map(|(sum, count)| sum.iter().map(|s| s / *count as f64).collect())
        .collect();
    debug!(rows = matrix.len(), columns = dim, groups = centroids.len(),
           "grouped data colors");
    let colors = color_items(&centroids, centroids.len(), options)?;
    Ok(index.into_keys().zip(colors).collect())
}
