//! Rendering-agnostic description of a cluster plot
//!
//! The packager only decides what is drawn: coordinates, axis labels and either a category or
//! a color per point. Drawing and persisting the figure is left to a [`Renderer`](crate::render::Renderer).
use std::fmt;

use ndarray::{Array1, ArrayView1};

use crate::cluster::{ClusterResult, NOISE_LABEL};
use crate::error::{Error, Result};

/// Category prefix unless configured otherwise
pub const DEFAULT_CATEGORY_PREFIX: &str = "C";

/// A color with channels in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

// seaborn "deep"
const DEEP_PALETTE: [(u8, u8, u8); 10] = [
    (0x4C, 0x72, 0xB0),
    (0xDD, 0x84, 0x52),
    (0x55, 0xA8, 0x68),
    (0xC4, 0x4E, 0x52),
    (0x81, 0x72, 0xB3),
    (0x93, 0x78, 0x60),
    (0xDA, 0x8B, 0xC3),
    (0x8C, 0x8C, 0x8C),
    (0xCC, 0xB9, 0x74),
    (0x64, 0xB5, 0xCD),
];

/// Color of the rows the density clusterer leaves unassigned
pub const NOISE_COLOR: Rgb = Rgb {
    r: 0.5,
    g: 0.5,
    b: 0.5,
};

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Rgb { r, g, b }
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Rgb::new(r as f64 / 255., g as f64 / 255., b as f64 / 255.)
    }

    /// Channels scaled to `[0, 255]`
    pub fn to_u8(self) -> (u8, u8, u8) {
        let byte = |c: f64| (c.clamp(0., 1.) * 255.).round() as u8;
        (byte(self.r), byte(self.g), byte(self.b))
    }

    /// Base color of a cluster label, noise is gray
    pub fn for_label(label: i64) -> Self {
        if label == NOISE_LABEL {
            return NOISE_COLOR;
        }
        let (r, g, b) = DEEP_PALETTE[label.rem_euclid(DEEP_PALETTE.len() as i64) as usize];
        Rgb::from_u8(r, g, b)
    }

    /// Scale the saturation by `prop`, keeping hue and lightness
    pub fn desaturate(self, prop: f64) -> Self {
        let prop = if prop.is_nan() { 0. } else { prop.clamp(0., 1.) };
        let (h, l, s) = self.to_hls();
        Rgb::from_hls(h, l, s * prop)
    }

    /// Hue, lightness and saturation, all in `[0, 1]`
    pub fn to_hls(self) -> (f64, f64, f64) {
        let Rgb { r, g, b } = self;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (min + max) / 2.;
        if max == min {
            return (0., l, 0.);
        }

        let delta = max - min;
        let s = if l <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2. - max - min)
        };
        let (rc, gc, bc) = ((max - r) / delta, (max - g) / delta, (max - b) / delta);
        let h = if r == max {
            bc - gc
        } else if g == max {
            2. + rc - bc
        } else {
            4. + gc - rc
        };
        ((h / 6.).rem_euclid(1.), l, s)
    }

    pub fn from_hls(h: f64, l: f64, s: f64) -> Self {
        if s == 0. {
            return Rgb::new(l, l, l);
        }
        let m2 = if l <= 0.5 { l * (1. + s) } else { l + s - l * s };
        let m1 = 2. * l - m2;
        let channel = |hue: f64| {
            let hue = hue.rem_euclid(1.);
            if hue < 1. / 6. {
                m1 + (m2 - m1) * hue * 6.
            } else if hue < 0.5 {
                m2
            } else if hue < 2. / 3. {
                m1 + (m2 - m1) * (2. / 3. - hue) * 6.
            } else {
                m1
            }
        };
        Rgb::new(channel(h + 1. / 3.), channel(h), channel(h - 1. / 3.))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.to_u8();
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

/// One plotted dimension
#[derive(Clone, Debug, PartialEq)]
pub struct PlotAxis {
    pub label: String,
    pub values: Array1<f64>,
}

impl PlotAxis {
    pub fn new<S: Into<String>>(label: S, values: Array1<f64>) -> Self {
        PlotAxis {
            label: label.into(),
            values,
        }
    }
}

/// How points are told apart
#[derive(Clone, Debug, PartialEq)]
pub enum PointStyle {
    /// A discrete category per point, colored by the renderer
    Categories(Vec<String>),
    /// An explicit color per point
    Colors(Vec<Rgb>),
}

/// Everything a renderer needs to draw a cluster plot
#[derive(Clone, Debug, PartialEq)]
pub struct PlotSpec {
    pub x: PlotAxis,
    pub y: PlotAxis,
    /// Only partition plots are three dimensional
    pub z: Option<PlotAxis>,
    pub points: PointStyle,
}

impl PlotSpec {
    pub fn npoints(&self) -> usize {
        self.x.values.len()
    }

    pub fn is_3d(&self) -> bool {
        self.z.is_some()
    }
}

/// Turns cluster assignments into a [`PlotSpec`]
#[derive(Clone, Debug, PartialEq)]
pub struct PlotPackager {
    category_prefix: String,
}

impl Default for PlotPackager {
    fn default() -> Self {
        PlotPackager::new(DEFAULT_CATEGORY_PREFIX)
    }
}

fn check_len(axis: &PlotAxis, expected: usize) -> Result<()> {
    if axis.values.len() != expected {
        return Err(Error::RowMismatch {
            expected,
            found: axis.values.len(),
        });
    }
    Ok(())
}

impl PlotPackager {
    pub fn new<S: Into<String>>(category_prefix: S) -> Self {
        PlotPackager {
            category_prefix: category_prefix.into(),
        }
    }

    pub fn category_prefix(&self) -> &str {
        &self.category_prefix
    }

    /// Category of a label, `"C3"` for label 3 with the default prefix
    pub fn category(&self, label: i64) -> String {
        format!("{}{}", self.category_prefix, label)
    }

    /// Three dimensional plot with one category per label
    pub fn package_partition(
        &self,
        x: PlotAxis,
        y: PlotAxis,
        z: PlotAxis,
        labels: ArrayView1<i64>,
    ) -> Result<PlotSpec> {
        for axis in &[&x, &y, &z] {
            check_len(axis, labels.len())?;
        }
        let categories = labels.iter().map(|&label| self.category(label)).collect();

        Ok(PlotSpec {
            x,
            y,
            z: Some(z),
            points: PointStyle::Categories(categories),
        })
    }

    /// Two dimensional plot, every point in the color of its label faded by its membership
    /// probability. Noise points are drawn with a probability of 0.
    pub fn package_density(
        &self,
        x: PlotAxis,
        y: PlotAxis,
        labels: ArrayView1<i64>,
        probabilities: ArrayView1<f64>,
    ) -> Result<PlotSpec> {
        for axis in &[&x, &y] {
            check_len(axis, labels.len())?;
        }
        if probabilities.len() != labels.len() {
            return Err(Error::RowMismatch {
                expected: labels.len(),
                found: probabilities.len(),
            });
        }

        let colors = labels
            .iter()
            .zip(probabilities.iter())
            .map(|(&label, &p)| {
                let p = if label == NOISE_LABEL { 0. } else { p };
                Rgb::for_label(label).desaturate(p)
            })
            .collect();

        Ok(PlotSpec {
            x,
            y,
            z: None,
            points: PointStyle::Colors(colors),
        })
    }

    /// Package any cluster result, the third dimension is only used by partition results
    pub fn package(
        &self,
        x: PlotAxis,
        y: PlotAxis,
        z: Option<PlotAxis>,
        result: &ClusterResult,
    ) -> Result<PlotSpec> {
        let labels = result.labels();
        match (result.probabilities(), z) {
            (Some(probabilities), _) => {
                self.package_density(x, y, labels.view(), probabilities.view())
            }
            (None, Some(z)) => self.package_partition(x, y, z, labels.view()),
            (None, None) => Err(Error::InvalidParameter(
                "partition plots need a third dimension".to_string(),
            )),
        }
    }
}
