//! Append the model score to a feature matrix
use crate::error::{Error, Result};
use crate::explanation::{ExplanationTable, TaskType};
use crate::matrix::FeatureMatrix;

/// Name of the appended score column
pub const SCORE_COLUMN: &str = "dr_score";

/// Appends the model score of every row as column [`SCORE_COLUMN`]
///
/// The score is `prediction` for regression tasks and `class_1_probability` for binary ones.
/// Row `i` of the matrix must describe the same instance as row `i` of the table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreAugmenter {
    task: TaskType,
    enabled: bool,
}

impl ScoreAugmenter {
    pub fn new(task: TaskType) -> Self {
        ScoreAugmenter {
            task,
            enabled: true,
        }
    }

    /// A disabled augmenter returns matrices unchanged
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn augment(&self, matrix: FeatureMatrix, table: &ExplanationTable) -> Result<FeatureMatrix> {
        if !self.enabled {
            return Ok(matrix);
        }
        if table.nrows() != matrix.nsamples() {
            return Err(Error::RowMismatch {
                expected: matrix.nsamples(),
                found: table.nrows(),
            });
        }

        let scores = table.score(self.task)?;
        matrix.with_column(SCORE_COLUMN, &scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::{ExplanationRow, Reason};
    use crate::vectorize::Vectorizer;
    use crate::ParamGuard;
    use ndarray::array;

    fn table(task: TaskType) -> ExplanationTable {
        let rows = (0..3)
            .map(|i| ExplanationRow {
                row_id: i,
                prediction: Some(10. * i as f64),
                class_1_probability: Some(0.25 * i as f64),
                reasons: vec![Reason::new("a", 1., 1.)],
            })
            .collect::<Vec<_>>();
        ExplanationTable::from_rows(task, 1, &rows)
    }

    fn matrix(task: TaskType, table: &ExplanationTable) -> FeatureMatrix {
        Vectorizer::params(task)
            .n_reasons(1)
            .check_unwrap()
            .vectorize(table)
            .unwrap()
    }

    #[test]
    fn regression_uses_prediction() {
        let table = table(TaskType::Regression);
        let augmented = ScoreAugmenter::new(TaskType::Regression)
            .augment(matrix(TaskType::Regression, &table), &table)
            .unwrap();

        assert_eq!(augmented.feature_names(), &["a", SCORE_COLUMN]);
        assert_eq!(augmented.column(SCORE_COLUMN).unwrap(), array![0., 10., 20.]);
    }

    #[test]
    fn binary_uses_class_1_probability() {
        let table = table(TaskType::Binary);
        let augmented = ScoreAugmenter::new(TaskType::Binary)
            .augment(matrix(TaskType::Binary, &table), &table)
            .unwrap();

        assert_eq!(augmented.column(SCORE_COLUMN).unwrap(), array![0., 0.25, 0.5]);
    }

    #[test]
    fn disabled_is_a_no_op() {
        let table = table(TaskType::Binary);
        let before = matrix(TaskType::Binary, &table);
        let after = ScoreAugmenter::new(TaskType::Binary)
            .enabled(false)
            .augment(before.clone(), &table)
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn rows_must_align() {
        let table = table(TaskType::Binary);
        let short = ExplanationTable::from(table.frame().select_rows(&[0, 1]));
        let res = ScoreAugmenter::new(TaskType::Binary).augment(matrix(TaskType::Binary, &table), &short);
        assert!(matches!(
            res,
            Err(Error::RowMismatch {
                expected: 3,
                found: 2
            })
        ));
    }
}
