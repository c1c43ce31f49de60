//! Request level entry point: sample, vectorize, augment, cluster and package
use std::path::{Path, PathBuf};

use log::{debug, info, log_enabled, warn, Level};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use thiserror::Error;

use crate::augment::ScoreAugmenter;
use crate::cluster::{ClusterResult, ClusterStrategy};
use crate::error::{Error, Result};
use crate::explanation::{ExplanationSource, ExplanationTable, ModelRef, TaskType, DEFAULT_N_REASONS};
use crate::frame::Frame;
use crate::matrix::FeatureMatrix;
use crate::metrics::silhouette_score;
use crate::param_guard::ParamGuard;
use crate::plot::{PlotAxis, PlotPackager, PlotSpec, DEFAULT_CATEGORY_PREFIX};
use crate::render::{plot_path, Renderer};
use crate::sample::{Sampler, DEFAULT_MAX_SAMPLES};
use crate::traits::Clusterer;
use crate::vectorize::Vectorizer;

/// Seed of the partition clusterer when the pipeline is not seeded
const DEFAULT_CLUSTER_SEED: u64 = 42;

#[derive(Error, Debug)]
pub enum PipelineParamsError {
    #[error("max_samples cannot be 0")]
    MaxSamples,
    #[error("n_reasons cannot be 0")]
    NReasons,
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// Checked configuration of a [`ClusterPipeline`]
pub struct PipelineValidParams {
    max_samples: usize,
    n_reasons: usize,
    include_score: bool,
    seed: Option<u64>,
    category_prefix: String,
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// Builder of the [pipeline configuration](PipelineValidParams)
pub struct PipelineParams(PipelineValidParams);

impl Default for PipelineParams {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineParams {
    /// Defaults are provided if optional parameters are not specified:
    /// * `max_samples = 2000`
    /// * `n_reasons = 5`
    /// * `include_score = true`
    /// * `seed = None`, sampling differs from run to run
    /// * `category_prefix = "C"`
    pub fn new() -> Self {
        Self(PipelineValidParams {
            max_samples: DEFAULT_MAX_SAMPLES,
            n_reasons: DEFAULT_N_REASONS,
            include_score: true,
            seed: None,
            category_prefix: DEFAULT_CATEGORY_PREFIX.to_string(),
        })
    }

    /// Rows kept by the sampler
    pub fn max_samples(mut self, max_samples: usize) -> Self {
        self.0.max_samples = max_samples;
        self
    }

    /// Reason slots read per explanation row
    pub fn n_reasons(mut self, n_reasons: usize) -> Self {
        self.0.n_reasons = n_reasons;
        self
    }

    /// Whether the model score is appended to the feature matrix
    pub fn include_score(mut self, include_score: bool) -> Self {
        self.0.include_score = include_score;
        self
    }

    /// Makes sampling and clustering reproducible
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = Some(seed);
        self
    }

    pub fn category_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.0.category_prefix = prefix.into();
        self
    }
}

impl ParamGuard for PipelineParams {
    type Checked = PipelineValidParams;
    type Error = PipelineParamsError;

    fn check_ref(&self) -> std::result::Result<&Self::Checked, Self::Error> {
        if self.0.max_samples == 0 {
            Err(PipelineParamsError::MaxSamples)
        } else if self.0.n_reasons == 0 {
            Err(PipelineParamsError::NReasons)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> std::result::Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl PipelineValidParams {
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    pub fn n_reasons(&self) -> usize {
        self.n_reasons
    }

    pub fn include_score(&self) -> bool {
        self.include_score
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn category_prefix(&self) -> &str {
        &self.category_prefix
    }
}

/// Clustering algorithm of a request and its parameter
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// k-means with `n_clusters` clusters
    Partition { n_clusters: usize },
    /// HDBSCAN with the given minimum cluster size
    Density { min_cluster_size: usize },
}

impl Algorithm {
    /// Name used in plot file names
    pub fn method(&self) -> &'static str {
        match self {
            Algorithm::Partition { .. } => "kmeans",
            Algorithm::Density { .. } => "hdbscan",
        }
    }

    /// Number of clusters or minimum cluster size
    pub fn param(&self) -> usize {
        match *self {
            Algorithm::Partition { n_clusters } => n_clusters,
            Algorithm::Density { min_cluster_size } => min_cluster_size,
        }
    }

    /// Checks the algorithm parameter against the number of rows to cluster
    ///
    /// k-means needs at least as many rows as clusters. An empty input is left to the steps
    /// which report it as such.
    pub fn check_rows(&self, nrows: usize) -> Result<()> {
        match *self {
            Algorithm::Partition { n_clusters } if nrows > 0 && n_clusters > nrows => {
                Err(Error::InvalidParameter(format!(
                    "n_clusters ({}) cannot exceed the number of rows ({})",
                    n_clusters, nrows
                )))
            }
            _ => Ok(()),
        }
    }

    /// The clusterer for this algorithm, with its parameters checked
    pub fn strategy(&self, seed: u64) -> Result<ClusterStrategy> {
        let strategy = match *self {
            Algorithm::Partition { n_clusters } => ClusterStrategy::partition(n_clusters, seed),
            Algorithm::Density { min_cluster_size } => ClusterStrategy::density(min_cluster_size),
        };
        match &strategy {
            ClusterStrategy::Partition(params) => {
                params.check_ref()?;
            }
            ClusterStrategy::Density(params) => {
                params.check_ref()?;
            }
        }
        Ok(strategy)
    }
}

/// What to cluster and how to plot it
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterRequest {
    pub task: TaskType,
    pub algorithm: Algorithm,
    /// Input column on the horizontal axis
    pub x_column: String,
    /// Input column on the vertical axis
    pub y_column: String,
    /// Overrides [`PipelineValidParams::include_score`]
    pub include_score: Option<bool>,
    /// Label of the score axis of partition plots
    pub target: String,
}

impl ClusterRequest {
    pub fn new<X: Into<String>, Y: Into<String>>(
        task: TaskType,
        algorithm: Algorithm,
        x_column: X,
        y_column: Y,
    ) -> Self {
        ClusterRequest {
            task,
            algorithm,
            x_column: x_column.into(),
            y_column: y_column.into(),
            include_score: None,
            target: task.score_column().to_string(),
        }
    }

    pub fn include_score(mut self, include_score: bool) -> Self {
        self.include_score = Some(include_score);
        self
    }

    /// Name of the predicted target, shown on the score axis
    pub fn target<S: Into<String>>(mut self, target: S) -> Self {
        self.target = target.into();
        self
    }
}

/// Everything a request produces
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterOutput {
    pub matrix: FeatureMatrix,
    pub result: ClusterResult,
    pub plot: PlotSpec,
}

/// Clusters the explanations of a model and prepares the plot
///
/// A pipeline holds no state between requests, the feature schema is derived from each batch
/// of explanations on its own.
///
/// ```
/// use linfa_reasons::explanation::{ExplanationRow, ExplanationTable, Reason, TaskType};
/// use linfa_reasons::frame::{Cell, Frame};
/// use linfa_reasons::pipeline::{Algorithm, ClusterPipeline, ClusterRequest};
/// use linfa_reasons::ParamGuard;
///
/// let rows = (0..6)
///     .map(|i| ExplanationRow {
///         row_id: i,
///         prediction: Some(i as f64),
///         class_1_probability: None,
///         reasons: vec![Reason::new(if i < 3 { "age" } else { "income" }, 1., 1.)],
///     })
///     .collect::<Vec<_>>();
/// let table = ExplanationTable::from_rows(TaskType::Regression, 1, &rows);
/// let display = Frame::new(
///     vec!["a", "b"],
///     (0..6).map(|i| vec![Cell::Number(i as f64), Cell::Number(1.)]).collect(),
/// )
/// .unwrap();
///
/// let pipeline = ClusterPipeline::new(ClusterPipeline::params().n_reasons(1).check_unwrap());
/// let request = ClusterRequest::new(
///     TaskType::Regression,
///     Algorithm::Partition { n_clusters: 2 },
///     "a",
///     "b",
/// )
/// .include_score(false);
/// let output = pipeline.cluster_explanations(&table, &display, &request).unwrap();
///
/// let labels = output.result.labels();
/// assert_eq!(labels[0], labels[2]);
/// assert_ne!(labels[0], labels[3]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterPipeline {
    params: PipelineValidParams,
}

impl Default for ClusterPipeline {
    fn default() -> Self {
        ClusterPipeline {
            params: PipelineParams::new().0,
        }
    }
}

impl ClusterPipeline {
    pub fn params() -> PipelineParams {
        PipelineParams::new()
    }

    pub fn new(params: PipelineValidParams) -> Self {
        ClusterPipeline { params }
    }

    pub fn config(&self) -> &PipelineValidParams {
        &self.params
    }

    fn sampler(&self) -> Sampler<Xoshiro256Plus> {
        match self.params.seed {
            Some(seed) => Sampler::seeded(self.params.max_samples, seed),
            None => Sampler::new(self.params.max_samples),
        }
    }

    /// Clusters a table of explanations
    ///
    /// Row `i` of `display` holds the input values of the instance explained by row `i` of
    /// `table`; the plot axes are read from it.
    pub fn cluster_explanations(
        &self,
        table: &ExplanationTable,
        display: &Frame,
        request: &ClusterRequest,
    ) -> Result<ClusterOutput> {
        let strategy = request
            .algorithm
            .strategy(self.params.seed.unwrap_or(DEFAULT_CLUSTER_SEED))?;
        request.algorithm.check_rows(table.nrows())?;
        info!(
            "Clustering {} explanations with {} ({})",
            table.nrows(),
            strategy.method(),
            request.algorithm.param()
        );

        if display.nrows() != table.nrows() {
            return Err(Error::RowMismatch {
                expected: table.nrows(),
                found: display.nrows(),
            });
        }
        let x = PlotAxis::new(
            request.x_column.as_str(),
            display.numeric_column(&request.x_column)?,
        );
        let y = PlotAxis::new(
            request.y_column.as_str(),
            display.numeric_column(&request.y_column)?,
        );

        let matrix = Vectorizer::params(request.task)
            .n_reasons(self.params.n_reasons)
            .check()?
            .vectorize(table)?;
        debug!(
            "Vectorized {} rows into {} distinct features",
            matrix.nsamples(),
            matrix.nfeatures()
        );
        let include_score = request.include_score.unwrap_or(self.params.include_score);
        let matrix = ScoreAugmenter::new(request.task)
            .enabled(include_score)
            .augment(matrix, table)?;

        let result = strategy.cluster(&matrix)?;
        if result.n_noise() == result.nsamples() {
            warn!("Every one of the {} rows is noise", result.nsamples());
        }
        if log_enabled!(Level::Debug) {
            match silhouette_score(&matrix, &result) {
                Ok(score) => debug!("Silhouette score {:.4}", score),
                Err(err) => debug!("No silhouette score: {}", err),
            }
        }

        let z = match result {
            ClusterResult::Partition { .. } => Some(PlotAxis::new(
                request.target.as_str(),
                table.score(request.task)?,
            )),
            ClusterResult::Density { .. } => None,
        };
        let plot = PlotPackager::new(self.params.category_prefix.as_str()).package(x, y, z, &result)?;
        info!(
            "Clustered a {}x{} matrix into {} clusters",
            matrix.nsamples(),
            matrix.nfeatures(),
            result.n_clusters()
        );

        Ok(ClusterOutput {
            matrix,
            result,
            plot,
        })
    }

    /// Samples `data`, fetches the explanations of the sample and clusters them
    pub fn run<S: ExplanationSource>(
        &self,
        data: &Frame,
        source: &S,
        model: &ModelRef,
        request: &ClusterRequest,
    ) -> Result<ClusterOutput> {
        // parameters are checked before the explanations are requested
        request
            .algorithm
            .strategy(self.params.seed.unwrap_or(DEFAULT_CLUSTER_SEED))?;
        request
            .algorithm
            .check_rows(data.nrows().min(self.params.max_samples))?;

        let mut sampler = self.sampler();
        if sampler.exceeds(data.nrows()) {
            debug!(
                "Sampling {} out of {} rows",
                sampler.max_samples(),
                data.nrows()
            );
        }
        let sample = sampler.sample(data);
        let table = source.get_explanations(model, &sample, self.params.n_reasons)?;
        self.cluster_explanations(&table, &sample, request)
    }

    /// Runs the request and renders its plot into `dir`
    ///
    /// A plot rendered before for the same model and algorithm is returned as is.
    pub fn run_and_render<S: ExplanationSource, R: Renderer>(
        &self,
        data: &Frame,
        source: &S,
        model: &ModelRef,
        request: &ClusterRequest,
        renderer: &R,
        dir: &Path,
    ) -> Result<PathBuf> {
        let path = plot_path(dir, model, &request.algorithm).with_extension(renderer.extension());
        if path.exists() {
            info!("Reusing plot {}", path.display());
            return Ok(path);
        }
        let output = self.run(data, source, model, request)?;
        renderer.render(&output.plot, &path)
    }
}
