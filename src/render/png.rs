//! PNG scatter plots drawn with plotters
use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::Range;
use std::path::{Path, PathBuf};

use ndarray::Array1;
use plotters::prelude::*;

use super::{check_dimensions, create_parent, Renderer};
use crate::error::{Error, Result};
use crate::plot::{PlotSpec, PointStyle, Rgb};

fn render_error<E: Display>(err: E) -> Error {
    Error::Render(err.to_string())
}

/// Smallest range holding every finite value, widened when all values are equal
fn axis_range(values: &Array1<f64>) -> Range<f64> {
    let (min, max) = values
        .iter()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &value| {
            (min.min(value), max.max(value))
        });
    if min > max {
        return 0.0..1.0;
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1. };
    (min - pad)..(max + pad)
}

/// Color of every point; categories get palette colors in their sorted order
fn point_colors(points: &PointStyle) -> Vec<RGBColor> {
    let to_rgb = |color: Rgb| {
        let (r, g, b) = color.to_u8();
        RGBColor(r, g, b)
    };
    match points {
        PointStyle::Colors(colors) => colors.iter().map(|&color| to_rgb(color)).collect(),
        PointStyle::Categories(categories) => {
            let mut palette = BTreeMap::new();
            for category in categories {
                palette.insert(category.as_str(), 0);
            }
            for (idx, color) in palette.values_mut().enumerate() {
                *color = idx as i64;
            }
            categories
                .iter()
                .map(|category| to_rgb(Rgb::for_label(palette[category.as_str()])))
                .collect()
        }
    }
}

/// Draws cluster plots as PNG scatter plots
///
/// Plots with a third dimension are drawn in 3D with that dimension on the vertical axis.
/// Points with a non-finite coordinate are left out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PngRenderer {
    width: u32,
    height: u32,
    point_size: u32,
}

impl Default for PngRenderer {
    fn default() -> Self {
        PngRenderer {
            width: 800,
            height: 600,
            point_size: 3,
        }
    }
}

impl PngRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        PngRenderer {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn point_size(mut self, point_size: u32) -> Self {
        self.point_size = point_size;
        self
    }

    fn draw_2d<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, plotters::coord::Shift>,
        spec: &PlotSpec,
        colors: &[RGBColor],
    ) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(axis_range(&spec.x.values), axis_range(&spec.y.values))
            .map_err(render_error)?;
        chart
            .configure_mesh()
            .x_desc(spec.x.label.as_str())
            .y_desc(spec.y.label.as_str())
            .draw()
            .map_err(render_error)?;

        let size = self.point_size;
        chart
            .draw_series(
                spec.x
                    .values
                    .iter()
                    .zip(spec.y.values.iter())
                    .zip(colors.iter())
                    .filter(|((x, y), _)| x.is_finite() && y.is_finite())
                    .map(|((&x, &y), color)| Circle::new((x, y), size, color.filled())),
            )
            .map_err(render_error)?;
        Ok(())
    }

    fn draw_3d<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, plotters::coord::Shift>,
        spec: &PlotSpec,
        z: &Array1<f64>,
        colors: &[RGBColor],
    ) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .build_cartesian_3d(
                axis_range(&spec.x.values),
                axis_range(z),
                axis_range(&spec.y.values),
            )
            .map_err(render_error)?;
        chart.with_projection(|mut projection| {
            projection.yaw = 0.6;
            projection.pitch = 0.3;
            projection.scale = 0.85;
            projection.into_matrix()
        });
        chart.configure_axes().draw().map_err(render_error)?;

        let size = self.point_size;
        chart
            .draw_series(
                spec.x
                    .values
                    .iter()
                    .zip(spec.y.values.iter())
                    .zip(z.iter())
                    .zip(colors.iter())
                    .filter(|(((x, y), z), _)| x.is_finite() && y.is_finite() && z.is_finite())
                    .map(|(((&x, &y), &z), color)| Circle::new((x, z, y), size, color.filled())),
            )
            .map_err(render_error)?;
        Ok(())
    }
}

impl Renderer for PngRenderer {
    fn render(&self, spec: &PlotSpec, path: &Path) -> Result<PathBuf> {
        check_dimensions(spec)?;
        create_parent(path)?;
        let colors = point_colors(&spec.points);

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        match &spec.z {
            Some(z) => self.draw_3d(&root, spec, &z.values, &colors)?,
            None => self.draw_2d(&root, spec, &colors)?,
        }
        root.present().map_err(render_error)?;

        Ok(path.to_path_buf())
    }
}
