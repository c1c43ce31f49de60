use std::collections::HashMap;

use crate::distance::{Distance, L2Dist};
use crate::k_means::errors::KMeansError;
use crate::k_means::helpers::IncrementalMean;
use crate::k_means::{KMeansParams, KMeansValidParams};
use crate::traits::{Fit, Predict};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// K-means clustering aims to partition a set of unlabeled observations into clusters,
/// where each observation belongs to the cluster with the nearest mean.
///
/// The mean of the points within a cluster is called *centroid*.
///
/// Given the set of centroids, you can assign an observation to a cluster
/// choosing the nearest centroid.
///
/// ## Algorithm
///
/// K-means is an iterative algorithm: it progressively refines the choice of centroids.
/// It always converges, although possibly to a local minimum, so the whole procedure is
/// repeated `n_runs` times from different initial centroids and the run with the lowest
/// inertia is kept.
///
/// - initialisation step: select initial centroids with one of the [`KMeansInit`](crate::k_means::KMeansInit) strategies;
/// - assignment step: assign each observation to the nearest centroid (euclidean distance);
/// - update step: recompute the centroid of each cluster as the mean of its observations.
///   A cluster left without observations keeps its previous centroid.
///
/// Assignment and update are repeated until no observation changes cluster, the centroids
/// move by at most `tolerance`, or `max_n_iterations` is reached.
///
/// ## Example
///
/// ```
/// use linfa_reasons::k_means::KMeans;
/// use linfa_reasons::traits::{Fit, Predict};
/// use ndarray::array;
///
/// let observations = array![[0., 0.], [0.1, 0.], [10., 10.], [10.1, 10.]];
/// let model = KMeans::params(2).fit(&observations).unwrap();
///
/// let labels = model.predict(&observations);
/// assert_eq!(labels[0], labels[1]);
/// assert_eq!(labels[2], labels[3]);
/// assert_ne!(labels[0], labels[2]);
/// ```
pub struct KMeans {
    centroids: Array2<f64>,
    cluster_count: Array1<usize>,
    inertia: f64,
}

impl KMeans {
    /// Parameters with a generator seeded with a fixed value, so fits are reproducible
    pub fn params(n_clusters: usize) -> KMeansParams<Xoshiro256Plus> {
        KMeansParams::new(n_clusters, Xoshiro256Plus::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(n_clusters: usize, rng: R) -> KMeansParams<R> {
        KMeansParams::new(n_clusters, rng)
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`.
    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    /// Number of training observations assigned to each centroid
    pub fn cluster_count(&self) -> &Array1<usize> {
        &self.cluster_count
    }

    /// Sum of the squared distances of the training observations to their closest centroid
    pub fn inertia(&self) -> f64 {
        self.inertia
    }
}

impl<R: Rng + Clone, D: Data<Elem = f64>> Fit<ArrayBase<D, Ix2>, KMeansError>
    for KMeansValidParams<R>
{
    type Object = KMeans;

    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `fit` identifies `n_clusters` centroids based on the training data distribution.
    ///
    /// An instance of `KMeans` is returned.
    fn fit(&self, observations: &ArrayBase<D, Ix2>) -> Result<KMeans, KMeansError> {
        let (n_samples, n_features) = observations.dim();
        if n_features == 0 {
            return Err(KMeansError::EmptyFeatures);
        }
        if n_samples < self.n_clusters() {
            return Err(KMeansError::TooFewObservations {
                n_clusters: self.n_clusters(),
                n_samples,
            });
        }

        let mut rng = self.rng().clone();
        let observations = observations.view();
        let mut best: Option<(Array2<f64>, Array1<usize>, f64)> = None;

        for _ in 0..self.n_runs() {
            let mut centroids = self
                .init_method()
                .run(self.n_clusters(), observations, &mut rng);
            let mut memberships = Array1::from_elem(n_samples, usize::MAX);
            let mut dists = Array1::zeros(n_samples);

            for _ in 0..self.max_n_iterations() {
                let changed = update_memberships_and_dists(
                    &centroids,
                    &observations,
                    &mut memberships,
                    &mut dists,
                );
                if !changed {
                    break;
                }
                let new_centroids = compute_centroids(&centroids, &observations, &memberships);
                let shift = (&centroids - &new_centroids)
                    .mapv(|x| x * x)
                    .sum()
                    .sqrt();
                centroids = new_centroids;
                if shift <= self.tolerance() {
                    break;
                }
            }
            // memberships and distances have to describe the final centroids
            update_memberships_and_dists(&centroids, &observations, &mut memberships, &mut dists);

            let inertia = dists.sum();
            let better = best
                .as_ref()
                .map_or(true, |(_, _, min_inertia)| inertia < *min_inertia);
            if better {
                best = Some((centroids, memberships, inertia));
            }
        }

        match best {
            Some((centroids, memberships, inertia)) => {
                let mut cluster_count = Array1::zeros(self.n_clusters());
                memberships
                    .iter()
                    .for_each(|&cluster| cluster_count[cluster] += 1);
                Ok(KMeans {
                    centroids,
                    cluster_count,
                    inertia,
                })
            }
            // n_runs is checked to be positive
            None => Err(KMeansError::InvalidParams(
                crate::k_means::KMeansParamsError::NRuns,
            )),
        }
    }
}

impl<D: Data<Elem = f64>> Predict<&ArrayBase<D, Ix2>, Array1<usize>> for KMeans {
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `predict` returns, for each observation, the index of the closest cluster/centroid.
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict(&self, observations: &ArrayBase<D, Ix2>) -> Array1<usize> {
        observations
            .rows()
            .into_iter()
            .map(|observation| closest_centroid(&self.centroids, &observation).0)
            .collect()
    }
}

impl<D: Data<Elem = f64>> Predict<&ArrayBase<D, Ix1>, usize> for KMeans {
    /// Given one input observation, return the index of its closest cluster
    fn predict(&self, observation: &ArrayBase<D, Ix1>) -> usize {
        closest_centroid(&self.centroids, observation).0
    }
}

/// Assign every observation to its closest centroid, storing the squared distance to it.
/// Returns whether any membership changed.
fn update_memberships_and_dists(
    centroids: &Array2<f64>,
    observations: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    memberships: &mut Array1<usize>,
    dists: &mut Array1<f64>,
) -> bool {
    let mut changed = false;
    Zip::from(observations.axis_iter(Axis(0)))
        .and(memberships)
        .and(dists)
        .for_each(|observation, membership, dist| {
            let (closest, distance) = closest_centroid(centroids, &observation);
            if *membership != closest {
                changed = true;
                *membership = closest;
            }
            *dist = distance;
        });
    changed
}

/// K-means is an iterative algorithm.
/// We will perform the assignment and update steps until we are satisfied
/// (according to our convergence criteria).
///
/// `compute_centroids` returns a 2-dimensional array,
/// where the i-th row corresponds to the i-th cluster.
fn compute_centroids(
    old_centroids: &Array2<f64>,
    // (n_observations, n_features)
    observations: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    // (n_observations,)
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Array2<f64> {
    let mut means: HashMap<usize, IncrementalMean> = HashMap::new();
    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster| {
            means
                .entry(cluster)
                .and_modify(|mean| mean.update(&observation))
                .or_insert_with(|| IncrementalMean::new(observation.to_owned()));
        });

    let mut centroids = old_centroids.clone();
    for (cluster, mean) in means {
        centroids.row_mut(cluster).assign(&mean.current_mean);
    }
    centroids
}

/// Index of the closest centroid and the squared euclidean distance to it
///
/// `centroids` must have at least one row.
pub(crate) fn closest_centroid(
    // (n_centroids, n_features)
    centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    // (n_features)
    observation: &ArrayBase<impl Data<Elem = f64>, Ix1>,
) -> (usize, f64) {
    centroids
        .rows()
        .into_iter()
        .map(|centroid| L2Dist.rdistance(centroid, observation.view()))
        .enumerate()
        .fold((0, f64::INFINITY), |(closest, minimum), (idx, distance)| {
            if distance < minimum {
                (idx, distance)
            } else {
                (closest, minimum)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::super::KMeansInit;
    use super::*;
    use crate::param_guard::ParamGuard;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, concatenate, Array};
    use ndarray_rand::rand_distr::{Normal, Uniform};
    use ndarray_rand::RandomExt;

    fn blobs(rng: &mut Xoshiro256Plus) -> Array2<f64> {
        let blob = |x: f64, y: f64, rng: &mut Xoshiro256Plus| {
            let noise = Array::random_using((100, 2), Normal::new(0., 0.5).unwrap(), rng);
            noise + &array![x, y]
        };
        concatenate![
            Axis(0),
            blob(0., 1., &mut *rng),
            blob(-10., 20., &mut *rng),
            blob(-1., 10., &mut *rng)
        ]
    }

    #[test]
    fn oracle_test_for_closest_centroid() {
        let centroids = array![[0., 0.], [1., 2.], [20., 0.], [0., 20.],];
        let observations = array![[1., 0.6], [20., 2.], [20., 0.], [7., 20.],];
        let memberships = observations
            .rows()
            .into_iter()
            .map(|obs| closest_centroid(&centroids, &obs).0)
            .collect::<Array1<_>>();

        assert_eq!(memberships, array![0, 2, 2, 3]);
    }

    #[test]
    fn nothing_is_closer_than_self() {
        let n_centroids = 20;
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let centroids: Array2<f64> =
            Array::random_using((n_centroids, 5), Uniform::new(-100., 100.), &mut rng);

        let memberships = centroids
            .rows()
            .into_iter()
            .map(|obs| closest_centroid(&centroids, &obs))
            .collect::<Vec<_>>();
        for (idx, (closest, dist)) in memberships.into_iter().enumerate() {
            assert_eq!(closest, idx);
            assert_abs_diff_eq!(dist, 0.);
        }
    }

    #[test]
    fn compute_centroids_works() {
        let observations = array![[1., 2.], [3., 4.], [10., 10.], [12., 10.]];
        let memberships = array![0, 0, 1, 1];
        let old = array![[0., 0.], [0., 0.], [5., 5.]];
        let centroids = compute_centroids(&old, &observations, &memberships);
        // the third cluster is empty and keeps its centroid
        assert_abs_diff_eq!(centroids, array![[2., 3.], [11., 10.], [5., 5.]]);
    }

    #[test]
    fn finds_three_blobs() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let data = blobs(&mut rng);

        for init in &[KMeansInit::KMeansPlusPlus, KMeansInit::Random] {
            let model = KMeans::params_with_rng(3, rng.clone())
                .init_method(*init)
                .fit(&data)
                .unwrap();

            let mut centroids = model
                .centroids()
                .rows()
                .into_iter()
                .map(|row| (row[0], row[1]))
                .collect::<Vec<_>>();
            centroids.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
            assert_abs_diff_eq!(centroids[0].0, -10., epsilon = 0.3);
            assert_abs_diff_eq!(centroids[0].1, 20., epsilon = 0.3);
            assert_abs_diff_eq!(centroids[1].0, -1., epsilon = 0.3);
            assert_abs_diff_eq!(centroids[1].1, 10., epsilon = 0.3);
            assert_abs_diff_eq!(centroids[2].0, 0., epsilon = 0.3);
            assert_abs_diff_eq!(centroids[2].1, 1., epsilon = 0.3);

            assert_eq!(model.cluster_count().sum(), 300);
            assert!(model.cluster_count().iter().all(|&count| count == 100));
        }
    }

    #[test]
    fn predict_matches_training_assignment() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let data = blobs(&mut rng);
        let model = KMeans::params(3).fit(&data).unwrap();
        let labels = model.predict(&data);

        assert_eq!(labels.len(), 300);
        assert!(labels.iter().all(|&label| label < 3));
        let mut counts = Array1::<usize>::zeros(3);
        labels.iter().for_each(|&label| counts[label] += 1);
        assert_eq!(&counts, model.cluster_count());

        let single: usize = model.predict(&data.row(0));
        assert_eq!(single, labels[0]);
    }

    #[test]
    fn same_seed_same_model() {
        let data = blobs(&mut Xoshiro256Plus::seed_from_u64(11));
        let first = KMeans::params(3).n_runs(2).fit(&data).unwrap();
        let second = KMeans::params(3).n_runs(2).fit(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn inertia_is_zero_when_every_point_is_a_centroid() {
        let data = array![[0., 0.], [5., 5.], [10., 0.]];
        let model = KMeans::params(3).fit(&data).unwrap();
        assert_abs_diff_eq!(model.inertia(), 0.);
    }

    #[test]
    fn more_clusters_than_observations() {
        let data = array![[0., 0.], [1., 1.]];
        let res = KMeans::params(3).fit(&data);
        assert!(matches!(
            res,
            Err(KMeansError::TooFewObservations {
                n_clusters: 3,
                n_samples: 2
            })
        ));
    }

    #[test]
    fn no_features() {
        let data = Array2::<f64>::zeros((4, 0));
        assert!(matches!(
            KMeans::params(2).fit(&data),
            Err(KMeansError::EmptyFeatures)
        ));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let data = array![[0., 0.], [1., 1.]];
        assert!(matches!(
            KMeans::params(0).fit(&data),
            Err(KMeansError::InvalidParams(_))
        ));
        assert!(KMeans::params(2).tolerance(-1.).check_ref().is_err());
    }
}
