//! Distance metrics over rows of a feature matrix
use ndarray::ArrayView1;
use ndarray_stats::errors::MultiInputError;
use ndarray_stats::DeviationExt;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Rows without any feature are at distance 0 of each other
///
/// **Panics** if the rows have different lengths.
fn deviation(res: Result<f64, MultiInputError>) -> f64 {
    match res {
        Ok(distance) => distance,
        Err(MultiInputError::EmptyInput) => 0.,
        Err(MultiInputError::ShapeMismatch(err)) => panic!("{}", err),
    }
}

// Should satisfy triangle inequality (no squared Euclidean)
pub trait Distance {
    // Panics if a and b are not of equal dimension
    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64;

    // Fast distance metric that keeps the order of the distance function
    fn rdistance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        self.distance(a, b)
    }

    fn rdist_to_dist(&self, rdist: f64) -> f64 {
        rdist
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct L1Dist;
impl Distance for L1Dist {
    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        deviation(a.l1_dist(&b))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct L2Dist;
impl Distance for L2Dist {
    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        deviation(a.l2_dist(&b))
    }

    fn rdistance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        deviation(a.sq_l2_dist(&b))
    }

    fn rdist_to_dist(&self, rdist: f64) -> f64 {
        rdist.sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LInfDist;
impl Distance for LInfDist {
    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        deviation(a.linf_dist(&b))
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum CommonDistance {
    /// Manhattan distance
    L1Dist,
    /// Euclidean distance
    L2Dist,
    /// Chebyshev distance
    LInfDist,
}

impl Default for CommonDistance {
    fn default() -> Self {
        CommonDistance::L2Dist
    }
}

impl Distance for CommonDistance {
    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            Self::L1Dist => L1Dist.distance(a, b),
            Self::L2Dist => L2Dist.distance(a, b),
            Self::LInfDist => LInfDist.distance(a, b),
        }
    }

    fn rdistance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            Self::L1Dist => L1Dist.rdistance(a, b),
            Self::L2Dist => L2Dist.rdistance(a, b),
            Self::LInfDist => LInfDist.rdistance(a, b),
        }
    }

    fn rdist_to_dist(&self, rdist: f64) -> f64 {
        match self {
            Self::L1Dist => L1Dist.rdist_to_dist(rdist),
            Self::L2Dist => L2Dist.rdist_to_dist(rdist),
            Self::LInfDist => LInfDist.rdist_to_dist(rdist),
        }
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    use super::*;

    fn dist_test(dist: CommonDistance, result: f64) {
        let a = arr1(&[0.5, 6.6]);
        let b = arr1(&[4.4, 3.0]);
        let ab = dist.distance(a.view(), b.view());
        assert_abs_diff_eq!(ab, result, epsilon = 1e-3);
        assert_abs_diff_eq!(dist.rdist_to_dist(dist.rdistance(a.view(), b.view())), ab);

        // Triangle equality
        let c = arr1(&[-4.5, 3.3]);
        let bc = dist.distance(b.view(), c.view());
        let ac = dist.distance(a.view(), c.view());
        assert!(ab + bc > ac);
        assert!(ac + bc > ab);
    }

    #[test]
    fn l1_dist() {
        dist_test(CommonDistance::L1Dist, 7.5);
    }

    #[test]
    fn l2_dist() {
        dist_test(CommonDistance::L2Dist, 5.3075);
    }

    #[test]
    fn linf_dist() {
        dist_test(CommonDistance::LInfDist, 3.9);
    }

    #[test]
    fn rows_without_features() {
        let empty = arr1::<f64>(&[]);
        for dist in [
            CommonDistance::L1Dist,
            CommonDistance::L2Dist,
            CommonDistance::LInfDist,
        ] {
            assert_eq!(dist.distance(empty.view(), empty.view()), 0.);
            assert_eq!(dist.rdistance(empty.view(), empty.view()), 0.);
        }
    }

    #[test]
    #[should_panic]
    fn rows_of_different_lengths() {
        L2Dist.distance(arr1(&[1., 2.]).view(), arr1(&[1.]).view());
    }
}
