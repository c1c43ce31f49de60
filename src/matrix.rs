//! Dense feature matrices built from explanations
use std::collections::HashMap;

use ndarray::{concatenate, Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix1};

use crate::error::{Error, Result};

/// Order-preserving set of feature names
///
/// The first time a name is seen it gets the next free column index, later insertions of the
/// same name return that index again. Given the same input order, the schema is always the same.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column index of `name`, assigning a new one if it has not been seen yet
    pub fn insert(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Rows are instances, columns are feature names
///
/// The width is the number of distinct feature names of the batch it was built from, plus
/// any appended columns such as the model score.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    records: Array2<f64>,
    feature_names: Vec<String>,
}

impl FeatureMatrix {
    /// Create a matrix, checking that there is one name per column
    pub fn new(records: Array2<f64>, feature_names: Vec<String>) -> Result<Self> {
        if records.ncols() != feature_names.len() {
            return Err(Error::InvalidParameter(format!(
                "{} feature names for {} columns",
                feature_names.len(),
                records.ncols()
            )));
        }
        Ok(FeatureMatrix {
            records,
            feature_names,
        })
    }

    /// A zero-initialised matrix with the columns of `schema`
    pub fn zeros(nrows: usize, schema: FeatureSchema) -> Self {
        FeatureMatrix {
            records: Array2::zeros((nrows, schema.len())),
            feature_names: schema.into_names(),
        }
    }

    pub fn records(&self) -> &Array2<f64> {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut Array2<f64> {
        &mut self.records
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.records.view()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn nsamples(&self) -> usize {
        self.records.nrows()
    }

    pub fn nfeatures(&self) -> usize {
        self.records.ncols()
    }

    /// Values of the column called `name`
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.feature_names
            .iter()
            .position(|feature| feature == name)
            .map(|idx| self.records.column(idx))
    }

    /// Append a column at the right end of the matrix
    pub fn with_column<D: Data<Elem = f64>>(
        self,
        name: &str,
        values: &ArrayBase<D, Ix1>,
    ) -> Result<Self> {
        if values.len() != self.nsamples() {
            return Err(Error::RowMismatch {
                expected: self.nsamples(),
                found: values.len(),
            });
        }

        let column = values.view().insert_axis(Axis(1));
        let records = concatenate(Axis(1), &[self.records.view(), column])?;
        let mut feature_names = self.feature_names;
        feature_names.push(name.to_string());

        Ok(FeatureMatrix {
            records,
            feature_names,
        })
    }

    pub fn into_records(self) -> Array2<f64> {
        self.records
    }

    /// Sum of the cells of every row
    pub fn row_sums(&self) -> Array1<f64> {
        self.records.sum_axis(Axis(1))
    }
}
