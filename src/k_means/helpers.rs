use ndarray::{Array1, ArrayBase, Data, Ix1};

/// The observation matrix will not be partitioned by cluster membership: we might have
/// a bunch of observations belonging to the first cluster followed by one observation
/// in the second cluster, and so on until the end of our data points.
///
/// It would be convenient if we could iterate over our observations,
/// updating the relevant new centroid one observation at a time.
///
/// In other words, we want to compute **an incremental mean**.
///
/// The formula to compute the new mean based on the mean of `n` previous observations and
/// a new observation is the following:
/// ```text
/// new_mean = current_mean + (new_observation - current_mean) / (n + 1)
/// ```
pub(crate) struct IncrementalMean {
    pub current_mean: Array1<f64>,
    pub n_observations: usize,
}

impl IncrementalMean {
    pub fn new(first_observation: Array1<f64>) -> Self {
        Self {
            current_mean: first_observation,
            n_observations: 1,
        }
    }

    pub fn update(&mut self, new_observation: &ArrayBase<impl Data<Elem = f64>, Ix1>) {
        self.n_observations += 1;
        let shift =
            (new_observation - &self.current_mean).mapv_into(|x| x / self.n_observations as f64);
        self.current_mean += &shift;
    }
}
