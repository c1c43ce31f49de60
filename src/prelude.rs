//! linfa-reasons prelude.
//!
//! This module contains the most used types, type aliases, traits and
//! functions that you can import easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{Error, Result};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::param_guard::ParamGuard;

#[doc(no_inline)]
pub use crate::explanation::{ExplanationSource, ExplanationTable, ModelRef, TaskType};

#[doc(no_inline)]
pub use crate::frame::{Cell, Frame};

#[doc(no_inline)]
pub use crate::matrix::FeatureMatrix;

#[doc(no_inline)]
pub use crate::cluster::{ClusterResult, ClusterStrategy};

#[doc(no_inline)]
pub use crate::pipeline::{Algorithm, ClusterPipeline, ClusterRequest, PipelineParams};

#[doc(no_inline)]
pub use crate::plot::{PlotPackager, PlotSpec};

#[doc(no_inline)]
pub use crate::render::{CsvRenderer, Renderer};

#[cfg(feature = "png")]
#[doc(no_inline)]
pub use crate::render::PngRenderer;
