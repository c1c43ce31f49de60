//! `linfa-reasons` groups the predictions of a model by *why* the model made them.
//!
//! Prediction explanations ("reason codes") list, for every prediction, the input features
//! which influenced it most together with a signed strength. This crate turns a batch of such
//! explanations into a dense feature matrix, clusters the rows and prepares a scatter plot of
//! the clusters over two input columns.
//!
//! ## The pipeline
//!
//! * [`Sampler`](sample::Sampler) caps the number of rows sent for explanation
//! * [`Vectorizer`](vectorize::Vectorizer) builds one column per distinct feature name
//! * [`ScoreAugmenter`](augment::ScoreAugmenter) optionally appends the model score
//! * [`KMeans`](k_means::KMeans) or [`Hdbscan`](hdbscan::Hdbscan) assign clusters
//! * [`PlotPackager`](plot::PlotPackager) maps clusters to categories or colors
//! * a [`Renderer`](render::Renderer) writes the plot, as CSV or, with the `png` feature, as a PNG scatter plot
//!
//! [`ClusterPipeline`](pipeline::ClusterPipeline) chains all of them for a single request.
//!
//! ```
//! use linfa_reasons::explanation::{ExplanationRow, ExplanationTable, Reason, TaskType};
//! use linfa_reasons::frame::{Cell, Frame};
//! use linfa_reasons::pipeline::{Algorithm, ClusterPipeline, ClusterRequest};
//! use linfa_reasons::ParamGuard;
//!
//! let rows = (0..10)
//!     .map(|i| ExplanationRow {
//!         row_id: i,
//!         prediction: Some(i as f64),
//!         reasons: vec![Reason::new(if i < 5 { "age" } else { "income" }, 1., 0.5)],
//!         ..Default::default()
//!     })
//!     .collect::<Vec<_>>();
//! let table = ExplanationTable::from_rows(TaskType::Regression, 1, &rows);
//! let display = Frame::new(
//!     vec!["age", "income"],
//!     (0..10)
//!         .map(|i| vec![Cell::Number(20. + i as f64), Cell::Number(1000. * i as f64)])
//!         .collect(),
//! )
//! .unwrap();
//!
//! let pipeline = ClusterPipeline::new(ClusterPipeline::params().n_reasons(1).check_unwrap());
//! let request = ClusterRequest::new(
//!     TaskType::Regression,
//!     Algorithm::Density { min_cluster_size: 2 },
//!     "age",
//!     "income",
//! )
//! .include_score(false);
//! let output = pipeline.cluster_explanations(&table, &display, &request).unwrap();
//!
//! assert_eq!(output.matrix.nfeatures(), 2);
//! assert_eq!(output.plot.npoints(), 10);
//! assert!(!output.plot.is_3d());
//! ```

pub mod augment;
pub mod cluster;
pub mod distance;
pub mod error;
pub mod explanation;
pub mod frame;
pub mod hdbscan;
pub mod k_means;
pub mod matrix;
pub mod metrics;
pub mod param_guard;
pub mod pipeline;
pub mod plot;
pub mod prelude;
pub mod render;
pub mod sample;
pub mod traits;
pub mod vectorize;

pub use error::{Error, Result};
pub use param_guard::ParamGuard;
