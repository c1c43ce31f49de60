//! Prediction explanations
//!
//! An explanation table holds one row per scored instance. Each row starts with a few score
//! columns, which depend on the task type, followed by `n_reasons` reason slots of
//! [`REASON_STRIDE`] columns each:
//!
//! | offset | column |
//! | --- | --- |
//! | `+0` | `reason_{i}_feature` |
//! | `+1` | `reason_{i}_feature_value` |
//! | `+2` | `reason_{i}_label` |
//! | `+3` | `reason_{i}_qualitative_strength` |
//! | `+4` | `reason_{i}_strength` |
//!
//! Regression rows carry `row_id, prediction` in front of the first slot, binary rows carry
//! `row_id, prediction, class_0_label, class_0_probability, class_1_label, class_1_probability`.
use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::{Cell, Frame};

/// Column of the first reason slot in regression rows
pub const REGRESSION_REASON_OFFSET: usize = 2;
/// Column of the first reason slot in binary classification rows
pub const BINARY_REASON_OFFSET: usize = 6;
/// Number of columns between two successive reason slots
pub const REASON_STRIDE: usize = 5;
/// Position of the feature name inside a reason slot
pub const REASON_NAME_OFFSET: usize = 0;
/// Position of the strength inside a reason slot
pub const REASON_STRENGTH_OFFSET: usize = 4;
/// Number of reasons requested per row unless configured otherwise
pub const DEFAULT_N_REASONS: usize = 5;

const REGRESSION_SCORE_COLUMNS: [&str; 2] = ["row_id", "prediction"];
const BINARY_SCORE_COLUMNS: [&str; 6] = [
    "row_id",
    "prediction",
    "class_0_label",
    "class_0_probability",
    "class_1_label",
    "class_1_probability",
];
const REASON_COLUMN_SUFFIXES: [&str; REASON_STRIDE] = [
    "feature",
    "feature_value",
    "label",
    "qualitative_strength",
    "strength",
];

/// Kind of model which produced the explanations
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskType {
    Regression,
    Binary,
}

impl TaskType {
    /// Column of the first reason slot in the raw row layout
    pub fn reason_offset(self) -> usize {
        match self {
            TaskType::Regression => REGRESSION_REASON_OFFSET,
            TaskType::Binary => BINARY_REASON_OFFSET,
        }
    }

    /// Name of the column holding the model score
    pub fn score_column(self) -> &'static str {
        match self {
            TaskType::Regression => "prediction",
            TaskType::Binary => "class_1_probability",
        }
    }

    fn score_columns(self) -> &'static [&'static str] {
        match self {
            TaskType::Regression => &REGRESSION_SCORE_COLUMNS,
            TaskType::Binary => &BINARY_SCORE_COLUMNS,
        }
    }
}

impl FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Regression" => Ok(TaskType::Regression),
            "Binary" => Ok(TaskType::Binary),
            other => Err(Error::InvalidParameter(format!(
                "unsupported target type `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Regression => write!(f, "Regression"),
            TaskType::Binary => write!(f, "Binary"),
        }
    }
}

/// One ranked reason of a prediction
#[derive(Clone, Debug, PartialEq)]
pub struct Reason {
    pub feature_name: String,
    pub feature_value: Cell,
    pub qualitative_strength: Option<String>,
    pub strength: f64,
}

impl Reason {
    pub fn new<S: Into<String>, V: Into<Cell>>(feature_name: S, feature_value: V, strength: f64) -> Self {
        Reason {
            feature_name: feature_name.into(),
            feature_value: feature_value.into(),
            qualitative_strength: None,
            strength,
        }
    }

    pub fn qualitative_strength<S: Into<String>>(mut self, qualitative_strength: S) -> Self {
        self.qualitative_strength = Some(qualitative_strength.into());
        self
    }
}

/// Typed view of one explanation row
///
/// `prediction` is populated for regression models, `class_1_probability` for binary ones.
/// Reasons are ordered by descending importance.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ExplanationRow {
    pub row_id: usize,
    pub prediction: Option<f64>,
    pub class_1_probability: Option<f64>,
    pub reasons: Vec<Reason>,
}

/// The raw table of explanation rows
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ExplanationTable(Frame);

impl ExplanationTable {
    pub fn new(frame: Frame) -> Self {
        ExplanationTable(frame)
    }

    /// Lay typed rows out in the raw layout of `task`
    ///
    /// Rows with fewer than `n_reasons` reasons get null slots, extra reasons are dropped.
    pub fn from_rows(task: TaskType, n_reasons: usize, rows: &[ExplanationRow]) -> Self {
        let mut columns: Vec<String> = task
            .score_columns()
            .iter()
            .map(|name| name.to_string())
            .collect();
        for slot in 0..n_reasons {
            columns.extend(
                REASON_COLUMN_SUFFIXES
                    .iter()
                    .map(|suffix| format!("reason_{}_{}", slot, suffix)),
            );
        }

        let rows = rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(columns.len());
                cells.push(Cell::Number(row.row_id as f64));
                cells.push(row.prediction.into());
                if task == TaskType::Binary {
                    cells.push("0".into());
                    cells.push(row.class_1_probability.map(|p| 1. - p).into());
                    cells.push("1".into());
                    cells.push(row.class_1_probability.into());
                }
                for slot in 0..n_reasons {
                    match row.reasons.get(slot) {
                        Some(reason) => {
                            cells.push(reason.feature_name.as_str().into());
                            cells.push(reason.feature_value.clone());
                            cells.push(Cell::Null);
                            cells.push(reason.qualitative_strength.clone().into());
                            cells.push(reason.strength.into());
                        }
                        None => cells.extend((0..REASON_STRIDE).map(|_| Cell::Null)),
                    }
                }
                cells
            })
            .collect();

        // every row is built with exactly `columns.len()` cells
        ExplanationTable(Frame::from_parts(columns, rows))
    }

    pub fn frame(&self) -> &Frame {
        &self.0
    }

    pub fn into_frame(self) -> Frame {
        self.0
    }

    pub fn nrows(&self) -> usize {
        self.0.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Model score of every row for the given task
    ///
    /// Unlike display columns, scores must be present in every row.
    pub fn score(&self, task: TaskType) -> Result<Array1<f64>> {
        let column = task.score_column();
        let scores = self.0.numeric_column(column)?;
        match scores.iter().position(|score| score.is_nan()) {
            Some(row) => Err(Error::MalformedCell {
                row,
                column: column.to_string(),
            }),
            None => Ok(scores),
        }
    }
}

impl From<Frame> for ExplanationTable {
    fn from(frame: Frame) -> Self {
        ExplanationTable(frame)
    }
}

/// Identifies the model whose predictions are explained
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRef {
    pub project_id: String,
    pub model_id: String,
}

impl ModelRef {
    pub fn new<S: Into<String>, T: Into<String>>(project_id: S, model_id: T) -> Self {
        ModelRef {
            project_id: project_id.into(),
            model_id: model_id.into(),
        }
    }
}

/// Source of explanation rows
///
/// Computing explanations may take arbitrarily long. Implementations wait for completion
/// themselves and report failures as [`Error::ExplanationUnavailable`].
pub trait ExplanationSource {
    fn get_explanations(
        &self,
        model: &ModelRef,
        dataset: &Frame,
        n_reasons: usize,
    ) -> Result<ExplanationTable>;
}

impl<F> ExplanationSource for F
where
    F: Fn(&ModelRef, &Frame, usize) -> Result<ExplanationTable>,
{
    fn get_explanations(
        &self,
        model: &ModelRef,
        dataset: &Frame,
        n_reasons: usize,
    ) -> Result<ExplanationTable> {
        self(model, dataset, n_reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn rows() -> Vec<ExplanationRow> {
        vec![
            ExplanationRow {
                row_id: 0,
                prediction: Some(1.),
                class_1_probability: Some(0.75),
                reasons: vec![
                    Reason::new("age", 31., 0.5).qualitative_strength("++"),
                    Reason::new("income", 1000., -0.25),
                ],
            },
            ExplanationRow {
                row_id: 1,
                prediction: Some(0.),
                class_1_probability: Some(0.25),
                reasons: vec![Reason::new("income", 20., 0.125)],
            },
        ]
    }

    #[test]
    fn offsets_follow_layout() {
        assert_eq!(TaskType::Regression.reason_offset(), 2);
        assert_eq!(TaskType::Binary.reason_offset(), 6);
        // typed rows are laid out with the score columns in front of the first slot
        for task in [TaskType::Regression, TaskType::Binary] {
            assert_eq!(task.score_columns().len(), task.reason_offset());
            let table = ExplanationTable::from_rows(task, 1, &rows());
            assert_eq!(table.frame().columns()[task.reason_offset()], "reason_0_feature");
        }
        assert_eq!("Binary".parse::<TaskType>().unwrap(), TaskType::Binary);
        assert!("Multiclass".parse::<TaskType>().is_err());
    }

    #[test]
    fn binary_layout() {
        let table = ExplanationTable::from_rows(TaskType::Binary, 3, &rows());
        let frame = table.frame();

        assert_eq!(frame.ncols(), 6 + 3 * REASON_STRIDE);
        assert_eq!(frame.columns()[6], "reason_0_feature");
        assert_eq!(frame.columns()[10], "reason_0_strength");
        assert_eq!(frame.columns()[11], "reason_1_feature");
        assert_eq!(frame.cell(0, 6), Some(&Cell::Text("age".into())));
        assert_eq!(frame.cell(0, 9), Some(&Cell::Text("++".into())));
        assert_eq!(frame.cell(1, 11), Some(&Cell::Null));
        assert_eq!(table.score(TaskType::Binary).unwrap(), array![0.75, 0.25]);
    }

    #[test]
    fn regression_layout() {
        let table = ExplanationTable::from_rows(TaskType::Regression, 2, &rows());
        let frame = table.frame();

        assert_eq!(frame.ncols(), 2 + 2 * REASON_STRIDE);
        assert_eq!(frame.cell(1, 2), Some(&Cell::Text("income".into())));
        assert_eq!(frame.cell(1, 6), Some(&Cell::Number(0.125)));
        assert_eq!(table.score(TaskType::Regression).unwrap(), array![1., 0.]);
        assert!(matches!(
            table.score(TaskType::Binary),
            Err(Error::UnknownColumn(_))
        ));
    }

    #[test]
    fn missing_scores_are_rejected() {
        let mut rows = rows();
        rows[1].class_1_probability = None;
        let table = ExplanationTable::from_rows(TaskType::Binary, 1, &rows);
        assert!(matches!(
            table.score(TaskType::Binary),
            Err(Error::MalformedCell { row: 1, .. })
        ));
    }

    #[test]
    fn closures_are_sources() {
        let source = |_: &ModelRef, _: &Frame, n_reasons: usize| -> Result<ExplanationTable> {
            Ok(ExplanationTable::from_rows(TaskType::Binary, n_reasons, &rows()))
        };
        let table = source
            .get_explanations(&ModelRef::new("p", "m"), &Frame::default(), 2)
            .unwrap();
        assert_eq!(table.nrows(), 2);
    }
}
