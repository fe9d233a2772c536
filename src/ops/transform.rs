// High-Level Structural Operations
//
// Operations:
// - transpose: C = A^T
// - reduce: row-wise OR into a column vector
// - extract_submatrix: copy of a rectangular window

use crate::core::error::{Result, SpblaError};
use crate::core::hints::{bits_of, ReduceHints, SubMatrixHints, TransposeHints};
use crate::core::matrix::{to_index, Matrix};

/// Transpose `input` into `output`, which must be shaped A.cols x A.rows
pub fn transpose(output: &mut Matrix, input: &Matrix, hints: Option<&TransposeHints>) -> Result<()> {
    let (nrows, ncols) = input.shape();
    if output.shape() != (ncols, nrows) {
        return Err(SpblaError::InvalidArgument);
    }
    output.check_same_engine(input)?;

    let bits = bits_of(hints);
    let (out, a) = (output.handle(), input.handle());
    output.engine().call("matrix_transpose", |raw| unsafe {
        raw.matrix_transpose(out, a, bits)
    })
}

/// Row-wise OR reduction
///
/// `output` is A.rows x 1; row i is present iff row i of `input` has any
/// entry.
pub fn reduce(output: &mut Matrix, input: &Matrix, hints: Option<&ReduceHints>) -> Result<()> {
    if output.shape() != (input.shape().0, 1) {
        return Err(SpblaError::InvalidArgument);
    }
    output.check_same_engine(input)?;

    let bits = bits_of(hints);
    let (out, a) = (output.handle(), input.handle());
    output.engine().call("matrix_reduce", |raw| unsafe {
        raw.matrix_reduce(out, a, bits)
    })
}

/// Copy the window `[row, row + nrows) x [col, col + ncols)` of `input`
///
/// Entries are re-indexed relative to the window origin. `output` must be
/// shaped `nrows x ncols` and the window must lie inside `input`.
pub fn extract_submatrix(
    output: &mut Matrix,
    input: &Matrix,
    row: usize,
    col: usize,
    nrows: usize,
    ncols: usize,
    hints: Option<&SubMatrixHints>,
) -> Result<()> {
    let (src_rows, src_cols) = input.shape();
    let fits = |offset: usize, len: usize, bound: usize| {
        offset.checked_add(len).map_or(false, |end| end <= bound)
    };
    if nrows == 0 || ncols == 0 || !fits(row, nrows, src_rows) || !fits(col, ncols, src_cols) {
        return Err(SpblaError::InvalidArgument);
    }
    if output.shape() != (nrows, ncols) {
        return Err(SpblaError::InvalidArgument);
    }
    output.check_same_engine(input)?;

    let (i, j) = (to_index(row)?, to_index(col)?);
    let (m, n) = (to_index(nrows)?, to_index(ncols)?);
    let bits = bits_of(hints);
    let (out, a) = (output.handle(), input.handle());
    output.engine().call("matrix_extract_sub_matrix", |raw| unsafe {
        raw.matrix_extract_sub_matrix(out, a, i, j, m, n, bits)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::engine::Engine;

    fn sorted_pairs(m: &Matrix) -> Vec<(usize, usize)> {
        let (rows, cols) = m.extract_pairs().unwrap();
        let mut pairs: Vec<_> = rows.into_iter().zip(cols).collect();
        pairs.sort_unstable();
        pairs
    }

    #[test]
    fn test_transpose() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        let a = Matrix::from_pairs(&engine, (2, 3), &[0, 1], &[2, 0]).unwrap();
        let mut t = Matrix::new(&engine, 3, 2).unwrap();
        transpose(&mut t, &a, None).unwrap();
        assert_eq!(sorted_pairs(&t), vec![(0, 1), (2, 0)]);

        let mut wrong = Matrix::new(&engine, 2, 3).unwrap();
        assert_eq!(transpose(&mut wrong, &a, None), Err(SpblaError::InvalidArgument));
    }

    #[test]
    fn test_reduce() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        let a = Matrix::from_pairs(&engine, (3, 3), &[0, 0, 2], &[1, 2, 2]).unwrap();
        let mut r = Matrix::new(&engine, 3, 1).unwrap();
        reduce(&mut r, &a, Some(&ReduceHints::time_checked())).unwrap();
        assert_eq!(sorted_pairs(&r), vec![(0, 0), (2, 0)]);
    }

    #[test]
    fn test_extract_submatrix() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        let a = Matrix::from_pairs(&engine, (4, 4), &[0, 1, 2, 3], &[0, 2, 1, 3]).unwrap();
        let mut s = Matrix::new(&engine, 2, 3).unwrap();
        extract_submatrix(&mut s, &a, 1, 1, 2, 3, None).unwrap();
        assert_eq!(sorted_pairs(&s), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_extract_submatrix_window_outside() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        let a = Matrix::new(&engine, 4, 4).unwrap();
        let mut s = Matrix::new(&engine, 2, 2).unwrap();
        assert_eq!(
            extract_submatrix(&mut s, &a, 3, 0, 2, 2, None),
            Err(SpblaError::InvalidArgument)
        );
        assert_eq!(
            extract_submatrix(&mut s, &a, 0, 0, 3, 3, None),
            Err(SpblaError::InvalidArgument)
        );
    }
}
