//! Writing plots to disk
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::explanation::ModelRef;
use crate::pipeline::Algorithm;
use crate::plot::{PlotSpec, PointStyle};

#[cfg(feature = "png")]
mod png;
#[cfg(feature = "png")]
pub use png::PngRenderer;

/// Draws a [`PlotSpec`] into a file
///
/// Implementations decide the image format, the pipeline only picks the file name.
pub trait Renderer {
    /// Write `spec` to `path` and return the path of the written file
    fn render(&self, spec: &PlotSpec, path: &Path) -> Result<PathBuf>;

    /// Extension of the files written by this renderer
    fn extension(&self) -> &str {
        "png"
    }
}

/// Location of the plot of `model` clustered with `algorithm`
///
/// The name is `{project}-{model}-{method}_{param}.png`, e.g. `p1-m1-kmeans_3.png`.
pub fn plot_path(dir: &Path, model: &ModelRef, algorithm: &Algorithm) -> PathBuf {
    dir.join(format!(
        "{}-{}-{}_{}.png",
        model.project_id,
        model.model_id,
        algorithm.method(),
        algorithm.param()
    ))
}

/// Every axis and the point styles must describe the same number of points
pub(crate) fn check_dimensions(spec: &PlotSpec) -> Result<()> {
    let npoints = spec.npoints();
    let style_len = match &spec.points {
        PointStyle::Categories(categories) => categories.len(),
        PointStyle::Colors(colors) => colors.len(),
    };
    let axes = std::iter::once(&spec.y).chain(spec.z.as_ref());
    for len in axes.map(|axis| axis.values.len()).chain(Some(style_len)) {
        if len != npoints {
            return Err(Error::Render(format!(
                "plot holds {} points but a dimension holds {}",
                npoints, len
            )));
        }
    }
    Ok(())
}

pub(crate) fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes the points of a plot as CSV, one row per point
///
/// Columns are named after the plot axes. Partition plots add a `category` column, density
/// plots the `r`, `g` and `b` color components in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    fn render(&self, spec: &PlotSpec, path: &Path) -> Result<PathBuf> {
        check_dimensions(spec)?;
        create_parent(path)?;
        let npoints = spec.npoints();
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec![spec.x.label.as_str(), spec.y.label.as_str()];
        if let Some(z) = &spec.z {
            header.push(z.label.as_str());
        }
        match spec.points {
            PointStyle::Categories(_) => header.push("category"),
            PointStyle::Colors(_) => header.extend(["r", "g", "b"]),
        }
        writer.write_record(&header)?;

        for idx in 0..npoints {
            let mut record = vec![spec.x.values[idx].to_string(), spec.y.values[idx].to_string()];
            if let Some(z) = &spec.z {
                record.push(z.values[idx].to_string());
            }
            match &spec.points {
                PointStyle::Categories(categories) => record.push(categories[idx].clone()),
                PointStyle::Colors(colors) => {
                    let color = colors[idx];
                    record.extend([color.r, color.g, color.b].iter().map(|c| c.to_string()));
                }
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;

        Ok(path.to_path_buf())
    }

    fn extension(&self) -> &str {
        "csv"
    }
}
