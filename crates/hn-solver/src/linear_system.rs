//! Dense linear system rebuilt from equation rows every iteration.

use hn_components::EquationRow;
use hn_core::numeric::relative_difference;
use nalgebra::{DMatrix, DVector};

use crate::error::{SolverError, SolverResult};

/// `A·x = b` for the whole network plus the last two solutions.
///
/// Rows are appended one at a time; the row count must reach the number of
/// unknowns exactly before [`LinearSystem::solve`] is called.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    unknowns: usize,
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
    rows: usize,
    sol_new: DVector<f64>,
    sol_old: DVector<f64>,
}

impl LinearSystem {
    pub fn new(unknowns: usize) -> Self {
        Self {
            unknowns,
            matrix: DMatrix::zeros(unknowns, unknowns),
            rhs: DVector::zeros(unknowns),
            rows: 0,
            sol_new: DVector::from_element(unknowns, 1.0),
            sol_old: DVector::from_element(unknowns, 1.0),
        }
    }

    pub fn unknowns(&self) -> usize {
        self.unknowns
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Drops all rows, keeping the solution history.
    pub fn clear(&mut self) {
        self.matrix.fill(0.0);
        self.rhs.fill(0.0);
        self.rows = 0;
    }

    /// Resets both solution vectors to ones.
    pub fn reset_solution(&mut self) {
        self.sol_new.fill(1.0);
        self.sol_old.fill(1.0);
    }

    /// Expands `row` into the next dense matrix row.
    pub fn add_equation(&mut self, row: &EquationRow) -> SolverResult<()> {
        if self.rows >= self.unknowns {
            return Err(SolverError::Dimension {
                rows: self.rows + 1,
                unknowns: self.unknowns,
            });
        }
        if let Some(index) = row.max_index().filter(|i| *i >= self.unknowns) {
            return Err(SolverError::IndexOutOfRange {
                index,
                unknowns: self.unknowns,
            });
        }
        for (index, coefficient) in row.terms() {
            self.matrix[(self.rows, index)] += coefficient;
        }
        self.rhs[self.rows] = row.rhs();
        self.rows += 1;
        Ok(())
    }

    /// Clears the system and loads `rows`.
    pub fn load(&mut self, rows: &[EquationRow]) -> SolverResult<()> {
        self.clear();
        if rows.len() != self.unknowns {
            return Err(SolverError::Dimension {
                rows: rows.len(),
                unknowns: self.unknowns,
            });
        }
        rows.iter().try_for_each(|row| self.add_equation(row))
    }

    /// LU solve; the previous solution moves to `sol_old`.
    pub fn solve(&mut self) -> SolverResult<()> {
        if self.rows != self.unknowns {
            return Err(SolverError::Dimension {
                rows: self.rows,
                unknowns: self.unknowns,
            });
        }
        let x = self
            .matrix
            .clone()
            .lu()
            .solve(&self.rhs)
            .ok_or(SolverError::Singular)?;
        self.sol_old = std::mem::replace(&mut self.sol_new, x);
        Ok(())
    }

    pub fn solution(&self) -> &DVector<f64> {
        &self.sol_new
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    /// Largest relative and absolute change between the last two solutions.
    ///
    /// Any non-finite entry yields infinite changes.
    pub fn max_changes(&self) -> (f64, f64) {
        let mut max_rel: f64 = 0.0;
        let mut max_abs: f64 = 0.0;
        for (new, old) in self.sol_new.iter().zip(self.sol_old.iter()) {
            if !(new.is_finite() && old.is_finite()) {
                return (f64::INFINITY, f64::INFINITY);
            }
            max_abs = max_abs.max((new - old).abs());
            max_rel = max_rel.max(relative_difference(*new, *old));
        }
        (max_rel, max_abs)
    }

    /// Converged when either the relative or the absolute change is below
    /// its tolerance.
    pub fn is_converged(&self, rel_tol: f64, abs_tol: f64) -> bool {
        let (rel, abs) = self.max_changes();
        rel < rel_tol || abs < abs_tol
    }
}
