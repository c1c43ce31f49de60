use thiserror::Error;

/// An error when fitting with an invalid hyperparameter
#[derive(Error, Debug)]
pub enum KMeansParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("n_runs cannot be 0")]
    NRuns,
    #[error("tolerance must be greater than 0")]
    Tolerance,
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
}

/// An error when modeling a KMeans algorithm
#[derive(Error, Debug)]
pub enum KMeansError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] KMeansParamsError),
    /// When there are fewer observations than requested clusters
    #[error("n_clusters ({n_clusters}) cannot exceed the number of observations ({n_samples})")]
    TooFewObservations { n_clusters: usize, n_samples: usize },
    /// When the observations have no features to cluster on
    #[error("observations have no features")]
    EmptyFeatures,
}
