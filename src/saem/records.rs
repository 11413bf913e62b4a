//! Chain records and run output
//!
//! Both records are append-only in iteration order and every cell is
//! written at most once. Row 0 holds the initialization result, row
//! `ll + 1` the result of outer iteration `ll`.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::model::{ConfigError, ConfigResult};

/// Winning parameter value per iteration and coordinate, [L+1, P]
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
    values: DMatrix<f64>,
    written: DMatrix<bool>,
}

impl ParameterRecord {
    /// Empty record for a chain of length L over P coordinates.
    pub fn new(chain_length: usize, num_parameters: usize) -> Self {
        Self {
            values: DMatrix::zeros(chain_length + 1, num_parameters),
            written: DMatrix::from_element(chain_length + 1, num_parameters, false),
        }
    }

    /// Write cell `[row, p]`.
    pub fn record(&mut self, row: usize, p: usize, value: f64) -> ConfigResult<()> {
        check_cell("parameter record", row, p, self.values.shape())?;
        if self.written[(row, p)] {
            return Err(already_written("parameter record", row, p));
        }
        self.values[(row, p)] = value;
        self.written[(row, p)] = true;
        Ok(())
    }

    /// Write a whole row.
    pub fn record_row(&mut self, row: usize, values: &[f64]) -> ConfigResult<()> {
        if values.len() != self.values.ncols() {
            return Err(ConfigError::LengthMismatch {
                field: "parameter row".to_string(),
                expected: self.values.ncols(),
                actual: values.len(),
            });
        }
        values
            .iter()
            .enumerate()
            .try_for_each(|(p, &v)| self.record(row, p, v))
    }

    /// Row `row` as a vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.row(row).iter().copied().collect()
    }

    /// The full table.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Whether every cell has been written.
    pub fn is_complete(&self) -> bool {
        self.written.iter().all(|&w| w)
    }

    /// Chain length L.
    pub fn chain_length(&self) -> usize {
        self.values.nrows() - 1
    }

    /// Number of coordinates P.
    pub fn num_parameters(&self) -> usize {
        self.values.ncols()
    }
}

/// Input trajectory of the winning draw per iteration and coordinate.
///
/// One [P, T] matrix per row of the chain; the first K columns hold the
/// trajectory and the remaining `T - K` stay zero.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    matrices: Vec<DMatrix<f64>>,
    written: DMatrix<bool>,
    transition_steps: usize,
}

impl InputRecord {
    /// Empty record; requires `transition_steps ≤ time_steps`.
    pub fn new(
        chain_length: usize,
        num_parameters: usize,
        time_steps: usize,
        transition_steps: usize,
    ) -> ConfigResult<Self> {
        if transition_steps > time_steps {
            return Err(ConfigError::invalid(
                "transition_steps",
                format!(
                    "{} transition steps exceed {} time steps",
                    transition_steps, time_steps
                ),
            ));
        }
        Ok(Self {
            matrices: vec![DMatrix::zeros(num_parameters, time_steps); chain_length + 1],
            written: DMatrix::from_element(chain_length + 1, num_parameters, false),
            transition_steps,
        })
    }

    /// Write the trajectory for `[row, p, :]`.
    pub fn record(&mut self, row: usize, p: usize, inputs: &[f64]) -> ConfigResult<()> {
        check_cell("input record", row, p, self.written.shape())?;
        if inputs.len() != self.transition_steps {
            return Err(ConfigError::LengthMismatch {
                field: "input trajectory".to_string(),
                expected: self.transition_steps,
                actual: inputs.len(),
            });
        }
        if self.written[(row, p)] {
            return Err(already_written("input record", row, p));
        }
        for (k, &r) in inputs.iter().enumerate() {
            self.matrices[row][(p, k)] = r;
        }
        self.written[(row, p)] = true;
        Ok(())
    }

    /// The [P, T] matrix of chain row `row`.
    pub fn row(&self, row: usize) -> &DMatrix<f64> {
        &self.matrices[row]
    }

    /// Trajectory at `[row, p, :]` (length T).
    pub fn trajectory(&self, row: usize, p: usize) -> Vec<f64> {
        self.matrices[row].row(p).iter().copied().collect()
    }

    /// All rows in chain order.
    pub fn matrices(&self) -> &[DMatrix<f64>] {
        &self.matrices
    }

    /// Whether every `[row, p]` trajectory has been written.
    pub fn is_complete(&self) -> bool {
        self.written.iter().all(|&w| w)
    }
}

fn check_cell(field: &str, row: usize, p: usize, shape: (usize, usize)) -> ConfigResult<()> {
    if row >= shape.0 || p >= shape.1 {
        return Err(ConfigError::invalid(
            field,
            format!("cell [{}, {}] outside [{}, {}]", row, p, shape.0, shape.1),
        ));
    }
    Ok(())
}

fn already_written(field: &str, row: usize, p: usize) -> ConfigError {
    ConfigError::invalid(field, format!("cell [{}, {}] already written", row, p))
}

/// Result of one SAEM run
#[derive(Debug, Clone)]
pub struct SaemOutput {
    /// Parameter record, [L+1, P]
    pub parameters: ParameterRecord,
    /// Input record, L+1 × [P, T]
    pub inputs: InputRecord,
    /// Final stochastic-approximation statistic per draw
    pub final_qh: DVector<f64>,
    /// Estimated parameter identifiers, in coordinate order
    pub parameter_names: Vec<String>,
}

impl SaemOutput {
    /// Final row of the parameter record (the estimate).
    pub fn final_parameters(&self) -> Vec<f64> {
        self.parameters.row(self.parameters.chain_length())
    }

    /// Final [P, T] input matrix.
    pub fn final_inputs(&self) -> &DMatrix<f64> {
        self.inputs.row(self.parameters.chain_length())
    }

    /// Final estimate of the parameter called `name`.
    pub fn parameter(&self, name: &str) -> Option<f64> {
        let p = self.parameter_names.iter().position(|n| n == name)?;
        Some(self.parameters.values()[(self.parameters.chain_length(), p)])
    }

    /// Serializable snapshot of the run.
    pub fn summary(&self) -> SaemSummary {
        let chain = self.parameters.values();
        SaemSummary {
            parameter_names: self.parameter_names.clone(),
            final_parameters: self.final_parameters(),
            parameter_chain: (0..chain.nrows()).map(|i| self.parameters.row(i)).collect(),
            final_inputs: (0..self.parameters.num_parameters())
                .map(|p| self.inputs.trajectory(self.parameters.chain_length(), p))
                .collect(),
            final_qh: self.final_qh.iter().copied().collect(),
        }
    }
}

/// JSON-friendly view of an [`SaemOutput`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaemSummary {
    /// Estimated parameter identifiers
    pub parameter_names: Vec<String>,
    /// Final parameter estimate
    pub final_parameters: Vec<f64>,
    /// Parameter record rows, in chain order
    pub parameter_chain: Vec<Vec<f64>>,
    /// Final input trajectory per coordinate
    pub final_inputs: Vec<Vec<f64>>,
    /// Final `Qh` per draw
    pub final_qh: Vec<f64>,
}

impl SaemSummary {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
