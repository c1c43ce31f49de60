//! Provide traits for different classes of algorithms
//!

use std::error::Error;

use crate::cluster::ClusterResult;
use crate::matrix::FeatureMatrix;

/// Fittable algorithms
///
/// A fittable algorithm takes a set of records and creates an object from it. For the partition
/// clusterer this is the set of centroids, for the density clusterer the flat cluster assignment.
pub trait Fit<R, E: Error> {
    type Object;

    fn fit(&self, records: &R) -> Result<Self::Object, E>;
}

/// Transform records into another representation
///
/// The vectorizer transforms explanation tables into feature matrices this way.
pub trait Transformer<R, T> {
    fn transform(&self, x: R) -> T;
}

/// Predict with a fitted model
///
/// This takes a set of records and returns the assignment of each record.
pub trait Predict<R, T> {
    fn predict(&self, x: R) -> T;
}

/// Turn a feature matrix into a cluster assignment
///
/// Both the partition and the density strategy implement this, so callers can swap them
/// without knowing which one runs.
pub trait Clusterer {
    fn cluster(&self, matrix: &FeatureMatrix) -> crate::Result<ClusterResult>;
}
