//! The CIE L\*a\*b\* color space and its conversions to and from sRGB.

use std::f64::consts::PI;
use rgb::{RGB, RGB8};
use crate::error::{Error, Result};

const EPS0: f64 = 6. / 29.;
const EPS: f64 = EPS0 * EPS0 * EPS0;
const TWO_PI: f64 = 2. * PI;
// Linear channels this far outside [0, 1] are rounding noise.
const GAMUT_TOLERANCE: f64 = 1e-7;

/// A color in the CIE L\*a\*b\* color space with a D50 reference white
/// point.  Euclidean distances in this space approximate perceived
/// color differences.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lab {
    /// The lightness in the range 0. to 100.
    pub l: f64,
    /// The green (< 0) to red (> 0) opponent axis.
    pub a: f64,
    /// The blue (< 0) to yellow (> 0) opponent axis.
    pub b: f64,
}

#[inline]
fn srgb_to_linear(v: f64) -> f64 {
    if v <= 0.04045 { v / 12.92 } else { ((v + 0.055) / 1.055).powf(2.4) }
}

#[inline]
fn linear_to_srgb(v: f64) -> f64 {
    if v <= 0.0031308 { 12.92 * v }
    else { 1.055 * v.powf(1. / 2.4) - 0.055 }
}

impl Lab {
    #[inline]
    pub fn new(l: f64, a: f64, b: f64) -> Self { Lab { l, a, b } }

    /// Create a color from its lightness `l`, chroma `c` and hue `h`
    /// (in radians).
    #[inline]
    pub fn from_lch(l: f64, c: f64, h: f64) -> Self {
        Lab { l, a: c * h.cos(), b: c * h.sin() }
    }

    /// The hue angle in radians, in the range 0. to 2π.
    pub fn hue(&self) -> f64 {
        let h = self.b.atan2(self.a);
        if h < 0. { h + TWO_PI } else { h }
    }

    /// The saturation (chroma), i.e. the magnitude of the chromatic
    /// axes.
    #[inline]
    pub fn saturation(&self) -> f64 { self.a.hypot(self.b) }

    /// Perceptual distance to `other` (CIE76 ΔE, the Euclidean
    /// distance in L\*a\*b\*).
    #[inline]
    pub fn distance(&self, other: &Lab) -> f64 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        (dl * dl + da * da + db * db).sqrt()
    }

    /// Convert a sRGB color with components in \[0, 255\].
    pub fn from_rgb(c: RGB<f64>) -> Lab {
        // See https://github.com/dbuenzli/gg/blob/b8704687d669d139bb4ac7a54115afc7e5caaa55/src/gg.ml#L2926
        const C0: f64 = 1. / 3.;
        const C1: f64 = 841. / 108.;
        const C2: f64 = 4. / 29.;
        let r = srgb_to_linear(c.r / 255.);
        let g = srgb_to_linear(c.g / 255.);
        let b = srgb_to_linear(c.b / 255.);
        let xr = 0.4522795 * r + 0.3993744 * g + 0.1483460 * b;
        let yr = 0.2225105 * r + 0.7168863 * g + 0.0606032 * b;
        let zr = 0.0168820 * r + 0.1176865 * g + 0.8654315 * b;
        let fx = if xr > EPS { xr.powf(C0) } else { C1 * xr + C2 };
        let fy = if yr > EPS { yr.powf(C0) } else { C1 * yr + C2 };
        let fz = if zr > EPS { zr.powf(C0) } else { C1 * zr + C2 };
        Lab { l: 116. * fy - 16., a: 500. * (fx - fy), b: 200. * (fy - fz) }
    }

    /// Linear sRGB components, not necessarily in \[0, 1\].
    fn to_linear(self) -> [f64; 3] {
        const C0: f64 = 108. / 841.;
        const C1: f64 = 4. / 29.;
        let fy = (self.l + 16.) / 116.;
        let fx = self.a / 500. + fy;
        let fz = fy - self.b / 200.;
        let fx1 = if fx > EPS0 { fx * fx * fx } else { C0 * (fx - C1) };
        let fy1 = if fy > EPS0 { fy * fy * fy } else { C0 * (fy - C1) };
        let fz1 = if fz > EPS0 { fz * fz * fz } else { C0 * (fz - C1) };
        [3.0215932 * fx1 - 1.6168777 * fy1 - 0.4047152 * fz1,
         -0.9437222 * fx1 + 1.9161365 * fy1 + 0.0275856 * fz1,
         0.0693906 * fx1 - 0.2290271 * fy1 + 1.1596365 * fz1]
    }

    /// Say whether the color has a sRGB equivalent.
    pub fn in_gamut(&self) -> bool {
        self.to_linear().iter().all(|&v| {
            (-GAMUT_TOLERANCE ..= 1. + GAMUT_TOLERANCE).contains(&v) })
    }

    /// Convert to sRGB with components in \[0, 255\].  Fails with
    /// [`Error::OutOfGamut`] if the color is not representable.
    pub fn to_rgb(&self) -> Result<RGB<f64>> {
        if self.in_gamut() { Ok(self.to_rgb_clamped()) }
        else { Err(Error::OutOfGamut { l: self.l, a: self.a, b: self.b }) }
    }

    /// Convert to sRGB with components in \[0, 255\], clamping the
    /// colors outside the gamut.
    pub fn to_rgb_clamped(&self) -> RGB<f64> {
        let [r, g, b] = self.to_linear()
            .map(|v| 255. * linear_to_srgb(v.clamp(0., 1.)));
        RGB { r, g, b }
    }
}

/// Parse a `#RRGGBB` (or `RRGGBB`) string, case-insensitive.
pub fn parse_hex(s: &str) -> Result<RGB8> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidArgument(
            format!("“{s}” is not a #RRGGBB color")))
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i .. i + 2], 16)
        .map_err(|_| Error::InvalidArgument(
            format!("“{s}” is not a #RRGGBB color")));
    Ok(RGB8 { r: channel(0)?, g: channel(2)?, b: channel(4)? })
}

/// Format a color as an uppercase `#RRGGBB` string.
pub fn to_hex(c: RGB8) -> String {
    format!("#{:02X}{:02X}{:02X}", c.r, c.g, c.b)
}
