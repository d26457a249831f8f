//! Rectangular batched-value containers.
//!
//! A [`Matrix`] models how scalar values are packed into the parallel slots
//! of a ciphertext before encryption: a rectangular, row-major table of
//! elements in which a (1,1) matrix is the canonical representation of a
//! plain scalar. Rotation models the cyclic shift of the packed lanes and is
//! therefore only defined for single-row and single-column shapes.

use std::fmt;

use thiserror::Error;

/// Shape of a matrix: number of rows and number of columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub rows: usize,
    pub cols: usize,
}

impl Dimension {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.rows, self.cols)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("matrix rows must all have the same number of elements")]
    RaggedRows,

    #[error("a matrix needs at least one element")]
    Empty,

    #[error("cannot access {access} in a matrix of dimension {dim}")]
    OutOfBounds { access: Dimension, dim: Dimension },

    #[error("rotation is only supported for row and column vectors, got {dim}")]
    RotationShape { dim: Dimension },

    #[error(
        "dimensions {lhs} and {rhs} do not match for an elementwise operation \
         and neither operand is a scalar"
    )]
    ElementwiseShape { lhs: Dimension, rhs: Dimension },

    #[error(
        "cannot multiply {lhs} by {rhs}: the column count of the left operand \
         must equal the row count of the right operand"
    )]
    MultiplyShape { lhs: Dimension, rhs: Dimension },
}

/// A rectangular, row-major table of values with an immutable shape.
///
/// Every row has the same length; construction from ragged rows fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: Vec<Vec<T>>,
    dim: Dimension,
}

impl<T: Clone> Matrix<T> {
    /// Build a matrix from row vectors, validating that the shape is
    /// rectangular and non-empty.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, MatrixError> {
        let cols = rows.first().map(Vec::len).ok_or(MatrixError::Empty)?;
        if cols == 0 {
            return Err(MatrixError::Empty);
        }
        if rows.iter().any(|row| row.len() != cols) {
            return Err(MatrixError::RaggedRows);
        }
        let dim = Dimension::new(rows.len(), cols);
        Ok(Self { rows, dim })
    }

    /// A (1,1) matrix holding a single value.
    pub fn scalar(value: T) -> Self {
        Self {
            rows: vec![vec![value]],
            dim: Dimension::new(1, 1),
        }
    }

    /// A (1,N) row vector.
    pub fn row(values: Vec<T>) -> Result<Self, MatrixError> {
        Self::from_rows(vec![values])
    }

    pub fn dim(&self) -> Dimension {
        self.dim
    }

    pub fn is_scalar(&self) -> bool {
        self.dim.is_scalar()
    }

    /// The single element of a (1,1) matrix, if this is one.
    pub fn scalar_value(&self) -> Option<&T> {
        if self.is_scalar() {
            Some(&self.rows[0][0])
        } else {
            None
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<&T, MatrixError> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or(MatrixError::OutOfBounds {
                access: Dimension::new(row, col),
                dim: self.dim,
            })
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<(), MatrixError> {
        let dim = self.dim;
        let slot = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(MatrixError::OutOfBounds {
                access: Dimension::new(row, col),
                dim,
            })?;
        *slot = value;
        Ok(())
    }

    pub fn row_values(&self, row: usize) -> Result<&[T], MatrixError> {
        self.rows
            .get(row)
            .map(Vec::as_slice)
            .ok_or(MatrixError::OutOfBounds {
                access: Dimension::new(row, 0),
                dim: self.dim,
            })
    }

    /// Iterate over all elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter().flat_map(|row| row.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.iter_mut().flat_map(|row| row.iter_mut())
    }

    /// Apply `f` to every element, preserving the shape.
    pub fn map<U: Clone>(&self, mut f: impl FnMut(&T) -> U) -> Matrix<U> {
        Matrix {
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(&mut f).collect())
                .collect(),
            dim: self.dim,
        }
    }

    /// Transpose in place: rows become columns.
    pub fn transpose(&mut self) {
        let mut transposed: Vec<Vec<T>> = (0..self.dim.cols)
            .map(|_| Vec::with_capacity(self.dim.rows))
            .collect();
        for row in &self.rows {
            for (col, value) in row.iter().enumerate() {
                transposed[col].push(value.clone());
            }
        }
        self.dim = Dimension::new(self.dim.cols, self.dim.rows);
        self.rows = transposed;
    }

    /// Circularly rotate a row or column vector in place.
    ///
    /// A positive amount is a right rotation (the element `amount` positions
    /// from the end moves to the front); a negative amount rotates left.
    /// The amount is taken modulo the vector length, so rotating by zero or
    /// by the full length is the identity. Column vectors rotate by
    /// transposing to a row, rotating, and transposing back.
    pub fn rotate(&mut self, amount: i64) -> Result<(), MatrixError> {
        if self.dim.rows == 1 {
            rotate_slice(&mut self.rows[0], amount);
            Ok(())
        } else if self.dim.cols == 1 {
            self.transpose();
            rotate_slice(&mut self.rows[0], amount);
            self.transpose();
            Ok(())
        } else {
            Err(MatrixError::RotationShape { dim: self.dim })
        }
    }

    /// Combine two matrices position by position.
    ///
    /// The shapes must match unless exactly one operand is a scalar, in which
    /// case the scalar is broadcast to the other operand's shape.
    pub fn componentwise<U: Clone>(
        a: &Self,
        b: &Self,
        mut f: impl FnMut(&T, &T) -> U,
    ) -> Result<Matrix<U>, MatrixError> {
        let (da, db) = (a.dim, b.dim);
        if da != db && !(da.is_scalar() ^ db.is_scalar()) {
            return Err(MatrixError::ElementwiseShape { lhs: da, rhs: db });
        }
        let target = if da.is_scalar() { db } else { da };
        let mut rows = Vec::with_capacity(target.rows);
        for i in 0..target.rows {
            let mut row = Vec::with_capacity(target.cols);
            for j in 0..target.cols {
                let x = if da.is_scalar() { &a.rows[0][0] } else { &a.rows[i][j] };
                let y = if db.is_scalar() { &b.rows[0][0] } else { &b.rows[i][j] };
                row.push(f(x, y));
            }
            rows.push(row);
        }
        Ok(Matrix { rows, dim: target })
    }
}

impl<T> Matrix<T>
where
    T: Copy + Default + std::ops::Add<Output = T> + std::ops::Mul<Output = T>,
{
    /// Standard triple-sum matrix multiplication.
    ///
    /// Correctness, not speed, is the contract here: these matrices model
    /// small slot batches, not numerical workloads.
    pub fn multiply(a: &Self, b: &Self) -> Result<Self, MatrixError> {
        if a.dim.cols != b.dim.rows {
            return Err(MatrixError::MultiplyShape { lhs: a.dim, rhs: b.dim });
        }
        let mut rows = vec![vec![T::default(); b.dim.cols]; a.dim.rows];
        for k in 0..a.dim.cols {
            for i in 0..a.dim.rows {
                for j in 0..b.dim.cols {
                    rows[i][j] = rows[i][j] + a.rows[i][k] * b.rows[k][j];
                }
            }
        }
        Ok(Matrix {
            rows,
            dim: Dimension::new(a.dim.rows, b.dim.cols),
        })
    }
}

fn rotate_slice<T>(values: &mut [T], amount: i64) {
    let len = values.len();
    if len == 0 {
        return;
    }
    let by = amount.rem_euclid(len as i64) as usize;
    values.rotate_right(by);
}

impl<T: fmt::Display> fmt::Display for Matrix<T> {
    /// Scalars print bare; anything larger prints in the `[1 2; 3 4]` style.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dim.is_scalar() {
            return write!(f, "{}", self.rows[0][0]);
        }
        write!(f, "[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{value}")?;
            }
        }
        write!(f, "]")
    }
}
