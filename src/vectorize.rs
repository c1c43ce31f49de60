//! Turn ranked explanation rows into a dense feature matrix
use std::borrow::Cow;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::explanation::{
    ExplanationTable, TaskType, DEFAULT_N_REASONS, REASON_NAME_OFFSET, REASON_STRENGTH_OFFSET,
    REASON_STRIDE,
};
use crate::frame::Cell;
use crate::matrix::{FeatureMatrix, FeatureSchema};
use crate::param_guard::ParamGuard;
use crate::traits::Transformer;

/// An error when building a vectorizer with invalid parameters
#[derive(Error, Debug)]
pub enum VectorizerParamsError {
    #[error("n_reasons cannot be 0")]
    NReasons,
}

/// Converts an explanation table into a [`FeatureMatrix`]
///
/// Each distinct feature name found among the first `n_reasons` reasons of any row becomes a
/// column, in the order in which the names are first seen when walking the reason slots one
/// after the other. The cell of a row and a feature holds the strength of that feature in the
/// row's reasons, or zero if the feature is not among them. If the same feature appears in two
/// slots of one row, the later slot wins.
///
/// ```
/// use linfa_reasons::explanation::{ExplanationRow, ExplanationTable, Reason, TaskType};
/// use linfa_reasons::vectorize::Vectorizer;
/// use linfa_reasons::ParamGuard;
/// use ndarray::array;
///
/// let rows = vec![
///     ExplanationRow {
///         prediction: Some(3.5),
///         reasons: vec![Reason::new("age", 42., 0.5), Reason::new("income", 10., -0.25)],
///         ..Default::default()
///     },
///     ExplanationRow {
///         prediction: Some(1.5),
///         reasons: vec![Reason::new("income", 20., 0.75)],
///         ..Default::default()
///     },
/// ];
/// let table = ExplanationTable::from_rows(TaskType::Regression, 2, &rows);
///
/// let matrix = Vectorizer::params(TaskType::Regression)
///     .n_reasons(2)
///     .check()
///     .unwrap()
///     .vectorize(&table)
///     .unwrap();
///
/// assert_eq!(matrix.feature_names(), &["age", "income"]);
/// assert_eq!(matrix.records(), &array![[0.5, -0.25], [0., 0.75]]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Vectorizer {
    task: TaskType,
    n_reasons: usize,
}

/// Helper struct for building a [`Vectorizer`]
#[derive(Clone, Debug, PartialEq)]
pub struct VectorizerParams(Vectorizer);

impl VectorizerParams {
    /// Number of reason slots read from every row
    pub fn n_reasons(mut self, n_reasons: usize) -> Self {
        self.0.n_reasons = n_reasons;
        self
    }
}

impl ParamGuard for VectorizerParams {
    type Checked = Vectorizer;
    type Error = VectorizerParamsError;

    fn check_ref(&self) -> std::result::Result<&Self::Checked, Self::Error> {
        if self.0.n_reasons == 0 {
            Err(VectorizerParamsError::NReasons)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> std::result::Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl Vectorizer {
    /// Defaults are provided if optional parameters are not specified:
    /// * `n_reasons = 5`
    pub fn params(task: TaskType) -> VectorizerParams {
        VectorizerParams(Vectorizer {
            task,
            n_reasons: DEFAULT_N_REASONS,
        })
    }

    pub fn task(&self) -> TaskType {
        self.task
    }

    pub fn n_reasons(&self) -> usize {
        self.n_reasons
    }

    /// Positions of the `(name, strength)` columns of every reason slot
    pub fn reason_columns(&self) -> Vec<(usize, usize)> {
        let offset = self.task.reason_offset();
        (0..self.n_reasons)
            .map(|slot| {
                let start = offset + slot * REASON_STRIDE;
                (start + REASON_NAME_OFFSET, start + REASON_STRENGTH_OFFSET)
            })
            .collect()
    }

    pub fn vectorize(&self, table: &ExplanationTable) -> Result<FeatureMatrix> {
        let frame = table.frame();
        if frame.is_empty() {
            return Err(Error::EmptyInput);
        }

        let reason_columns = self.reason_columns();
        let n_columns = frame.ncols();
        if reason_columns
            .iter()
            .any(|&(name, strength)| name >= n_columns || strength >= n_columns)
        {
            return Err(Error::Schema {
                offset: self.task.reason_offset(),
                n_columns,
            });
        }

        let mut schema = FeatureSchema::new();
        // (row, column, strength) in slot order, so that later slots overwrite earlier ones
        let mut entries = Vec::with_capacity(frame.nrows() * self.n_reasons);
        for &(name_col, strength_col) in reason_columns.iter() {
            for (row, cells) in frame.rows().iter().enumerate() {
                let name = match &cells[name_col] {
                    Cell::Null => continue,
                    Cell::Text(name) if name.is_empty() => continue,
                    Cell::Text(name) => Cow::Borrowed(name.as_str()),
                    // names such as `2019` are read from CSV as numbers
                    cell @ Cell::Number(_) => Cow::Owned(cell.to_string()),
                };
                let strength =
                    cells[strength_col]
                        .as_f64()
                        .ok_or_else(|| Error::MalformedCell {
                            row,
                            column: frame.columns()[strength_col].clone(),
                        })?;
                entries.push((row, schema.insert(&name), strength));
            }
        }

        if schema.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut matrix = FeatureMatrix::zeros(frame.nrows(), schema);
        let records = matrix.records_mut();
        for (row, col, strength) in entries {
            records[(row, col)] = strength;
        }

        Ok(matrix)
    }
}

impl Transformer<&ExplanationTable, Result<FeatureMatrix>> for Vectorizer {
    fn transform(&self, table: &ExplanationTable) -> Result<FeatureMatrix> {
        self.vectorize(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::{ExplanationRow, Reason};
    use crate::frame::Frame;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn row(prediction: f64, reasons: &[(&str, f64)]) -> ExplanationRow {
        ExplanationRow {
            prediction: Some(prediction),
            class_1_probability: Some(prediction / 10.),
            reasons: reasons
                .iter()
                .map(|&(name, strength)| Reason::new(name, 1., strength))
                .collect(),
            ..Default::default()
        }
    }

    fn vectorizer(task: TaskType, n_reasons: usize) -> Vectorizer {
        Vectorizer::params(task).n_reasons(n_reasons).check_unwrap()
    }

    #[test]
    fn n_reasons_cannot_be_zero() {
        let res = Vectorizer::params(TaskType::Binary).n_reasons(0).check();
        assert!(matches!(res, Err(VectorizerParamsError::NReasons)));
    }

    #[test]
    fn reason_columns_use_stride() {
        let v = vectorizer(TaskType::Regression, 3);
        assert_eq!(v.reason_columns(), vec![(2, 6), (7, 11), (12, 16)]);
        let v = vectorizer(TaskType::Binary, 2);
        assert_eq!(v.reason_columns(), vec![(6, 10), (11, 15)]);
    }

    #[test]
    fn width_is_number_of_distinct_features() {
        let rows = vec![
            row(1., &[("a", 0.1), ("b", 0.2)]),
            row(2., &[("c", 0.3), ("a", 0.4)]),
            row(3., &[("b", 0.5), ("d", 0.6)]),
        ];
        let table = ExplanationTable::from_rows(TaskType::Binary, 2, &rows);
        let matrix = vectorizer(TaskType::Binary, 2).vectorize(&table).unwrap();

        assert_eq!(matrix.nsamples(), 3);
        assert_eq!(matrix.nfeatures(), 4);
        // first slot of every row, then the second slot
        assert_eq!(matrix.feature_names(), &["a", "c", "b", "d"]);
        assert_eq!(
            matrix.records(),
            &array![[0.1, 0., 0.2, 0.], [0.4, 0.3, 0., 0.], [0., 0., 0.5, 0.6]]
        );
        let transformed = vectorizer(TaskType::Binary, 2).transform(&table).unwrap();
        assert_eq!(transformed, matrix);
    }

    #[test]
    fn repeated_feature_in_one_row_keeps_last_slot() {
        let rows = vec![row(1., &[("a", 0.1), ("b", 0.2), ("a", 0.7)])];
        let table = ExplanationTable::from_rows(TaskType::Regression, 3, &rows);
        let matrix = vectorizer(TaskType::Regression, 3).vectorize(&table).unwrap();

        assert_eq!(matrix.feature_names(), &["a", "b"]);
        assert_abs_diff_eq!(matrix.records()[(0, 0)], 0.7);
        // 0.1 collapsed away, no accumulation
        assert_abs_diff_eq!(matrix.row_sums()[0], 0.9);
    }

    #[test]
    fn missing_reasons_stay_zero() {
        let rows = vec![row(1., &[("a", 0.1)]), row(2., &[])];
        let table = ExplanationTable::from_rows(TaskType::Regression, 5, &rows);
        let matrix = vectorizer(TaskType::Regression, 5).vectorize(&table).unwrap();

        assert_eq!(matrix.records(), &array![[0.1], [0.]]);
    }

    #[test]
    fn only_first_n_reasons_are_read() {
        let rows = vec![row(1., &[("a", 0.1), ("b", 0.2), ("c", 0.3)])];
        let table = ExplanationTable::from_rows(TaskType::Regression, 3, &rows);
        let matrix = vectorizer(TaskType::Regression, 2).vectorize(&table).unwrap();

        assert_eq!(matrix.feature_names(), &["a", "b"]);
    }

    #[test]
    fn empty_table() {
        let table = ExplanationTable::from_rows(TaskType::Regression, 5, &[]);
        let res = vectorizer(TaskType::Regression, 5).vectorize(&table);
        assert!(matches!(res, Err(Error::EmptyInput)));
    }

    #[test]
    fn rows_without_any_reason() {
        let table = ExplanationTable::from_rows(TaskType::Regression, 2, &[row(1., &[])]);
        let res = vectorizer(TaskType::Regression, 2).vectorize(&table);
        assert!(matches!(res, Err(Error::EmptyInput)));
    }

    #[test]
    fn layout_too_narrow_for_task() {
        let rows = vec![row(1., &[("a", 0.1)])];
        // a regression layout has no room for binary offsets
        let table = ExplanationTable::from_rows(TaskType::Regression, 1, &rows);
        let res = vectorizer(TaskType::Binary, 1).vectorize(&table);
        assert!(matches!(
            res,
            Err(Error::Schema {
                offset: 6,
                n_columns: 7
            })
        ));

        let res = vectorizer(TaskType::Regression, 2).vectorize(&table);
        assert!(matches!(res, Err(Error::Schema { offset: 2, .. })));
    }

    #[test]
    fn offsets_are_honored_exactly() {
        // the same raw rows read under both task types: regression reads the slot at columns
        // (2, 6), binary reads it at (6, 10)
        let columns = (0..11).map(|i| format!("c{}", i)).collect::<Vec<_>>();
        let cells = |c2: &str, c6: &str, c10: f64| {
            let mut cells = vec![Cell::Null; 11];
            cells[2] = c2.into();
            cells[6] = c6.into();
            cells[10] = Cell::Number(c10);
            cells
        };
        let frame = Frame::new(
            columns,
            vec![cells("x", "0.5", 2.), cells("y", "1.5", 4.)],
        )
        .unwrap();
        let table = ExplanationTable::from(frame);

        let regression = vectorizer(TaskType::Regression, 1)
            .vectorize(&table)
            .unwrap();
        assert_eq!(regression.feature_names(), &["x", "y"]);
        assert_eq!(regression.records(), &array![[0.5, 0.], [0., 1.5]]);

        let binary = vectorizer(TaskType::Binary, 1).vectorize(&table).unwrap();
        assert_eq!(binary.feature_names(), &["0.5", "1.5"]);
        assert_eq!(binary.records(), &array![[2., 0.], [0., 4.]]);
    }

    #[test]
    fn strength_must_be_numeric() {
        let mut cells = vec![Cell::Null; 7];
        cells[2] = "a".into();
        cells[6] = "strong".into();
        let columns = (0..7).map(|i| i.to_string()).collect::<Vec<_>>();
        let frame = Frame::new(columns, vec![cells]).unwrap();
        let res = vectorizer(TaskType::Regression, 1).vectorize(&frame.into());
        assert!(matches!(res, Err(Error::MalformedCell { row: 0, .. })));
    }

    #[test]
    fn numeric_feature_names_from_csv() {
        let csv = "row_id,prediction,reason_0_feature,reason_0_feature_value,reason_0_label,\
                   reason_0_qualitative_strength,reason_0_strength\n\
                   0,1.5,2019,3,,++,0.75\n\
                   1,2.5,age,40,,+,0.25\n";
        let frame = Frame::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(frame.cell(0, 2), Some(&Cell::Number(2019.)));

        let matrix = vectorizer(TaskType::Regression, 1)
            .vectorize(&frame.into())
            .unwrap();
        assert_eq!(matrix.feature_names(), &["2019", "age"]);
        assert_eq!(matrix.records(), &array![[0.75, 0.], [0., 0.25]]);
    }
}
