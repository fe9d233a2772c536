// High-Level Matrix Multiplication Operations
//
// Operations:
// - mxm: boolean matrix product (C = A x B, or C |= A x B with accumulate)
// - mxm_self: in-place squaring (T = T x T, or T |= T x T)
// - kronecker: Kronecker product (C = A (x) B)

use crate::core::error::{Result, SpblaError};
use crate::core::hints::{bits_of, KroneckerHints, MxmHints};
use crate::core::matrix::Matrix;

/// Matrix-matrix multiplication over the boolean semiring
///
/// Entry (i, j) of the product is present iff some k has both A(i, k) and
/// B(k, j) present. With `accumulate` the product is unioned into the
/// current contents of `output`.
///
/// # Arguments
/// * `output` - Output matrix, shaped A.rows x B.cols
/// * `left` - First input matrix
/// * `right` - Second input matrix
/// * `hints` - Optional accumulate / time check hints
pub fn mxm(
    output: &mut Matrix,
    left: &Matrix,
    right: &Matrix,
    hints: Option<&MxmHints>,
) -> Result<()> {
    let (left_rows, left_cols) = left.shape();
    let (right_rows, right_cols) = right.shape();

    // Validate dimensions
    if left_cols != right_rows {
        return Err(SpblaError::InvalidArgument);
    }
    if output.shape() != (left_rows, right_cols) {
        return Err(SpblaError::InvalidArgument);
    }
    output.check_same_engine(left)?;
    output.check_same_engine(right)?;

    let bits = bits_of(hints);
    log::trace!(
        "mxm {}x{} * {}x{} (hints {:#x})",
        left_rows,
        left_cols,
        right_rows,
        right_cols,
        bits
    );
    let (out, a, b) = (output.handle(), left.handle(), right.handle());
    output
        .engine()
        .call("mxm", |raw| unsafe { raw.mxm(out, a, b, bits) })
}

/// Square a matrix in place: `T = T x T`, or `T |= T x T` with accumulate
///
/// The output aliases both inputs, which `mxm` cannot express through
/// separate borrows. The matrix must be square.
pub fn mxm_self(matrix: &mut Matrix, hints: Option<&MxmHints>) -> Result<()> {
    let (nrows, ncols) = matrix.shape();
    if nrows != ncols {
        return Err(SpblaError::InvalidArgument);
    }

    let bits = bits_of(hints);
    let handle = matrix.handle();
    matrix
        .engine()
        .call("mxm", |raw| unsafe { raw.mxm(handle, handle, handle, bits) })
}

/// Kronecker product
///
/// Block (i, j) of `output` is a copy of `right` where A(i, j) is present and
/// empty otherwise.
///
/// # Arguments
/// * `output` - Output matrix, shaped (A.rows * B.rows) x (A.cols * B.cols)
/// * `left` - First input matrix
/// * `right` - Second input matrix
/// * `hints` - Optional time check hint
pub fn kronecker(
    output: &mut Matrix,
    left: &Matrix,
    right: &Matrix,
    hints: Option<&KroneckerHints>,
) -> Result<()> {
    let (left_rows, left_cols) = left.shape();
    let (right_rows, right_cols) = right.shape();
    let expected = left_rows
        .checked_mul(right_rows)
        .zip(left_cols.checked_mul(right_cols))
        .ok_or(SpblaError::InvalidArgument)?;

    if output.shape() != expected {
        return Err(SpblaError::InvalidArgument);
    }
    output.check_same_engine(left)?;
    output.check_same_engine(right)?;

    let bits = bits_of(hints);
    let (out, a, b) = (output.handle(), left.handle(), right.handle());
    output
        .engine()
        .call("kronecker", |raw| unsafe { raw.kronecker(out, a, b, bits) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::engine::Engine;

    fn engine() -> Engine {
        Engine::initialize(&EngineConfig::host()).unwrap()
    }

    fn sorted_pairs(m: &Matrix) -> Vec<(usize, usize)> {
        let (rows, cols) = m.extract_pairs().unwrap();
        let mut pairs: Vec<_> = rows.into_iter().zip(cols).collect();
        pairs.sort_unstable();
        pairs
    }

    #[test]
    fn test_mxm_overwrites_without_accumulate() {
        let engine = engine();
        let a = Matrix::from_pairs(&engine, (2, 2), &[0], &[1]).unwrap();
        let b = Matrix::from_pairs(&engine, (2, 2), &[1], &[0]).unwrap();
        let mut c = Matrix::from_pairs(&engine, (2, 2), &[1], &[1]).unwrap();

        mxm(&mut c, &a, &b, None).unwrap();
        assert_eq!(sorted_pairs(&c), vec![(0, 0)]);
    }

    #[test]
    fn test_mxm_accumulate_keeps_existing() {
        let engine = engine();
        let a = Matrix::from_pairs(&engine, (2, 2), &[0], &[1]).unwrap();
        let b = Matrix::from_pairs(&engine, (2, 2), &[1], &[0]).unwrap();
        let mut c = Matrix::from_pairs(&engine, (2, 2), &[1], &[1]).unwrap();

        mxm(&mut c, &a, &b, Some(&MxmHints::accumulate())).unwrap();
        assert_eq!(sorted_pairs(&c), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_mxm_output_shape_mismatch() {
        let engine = engine();
        let a = Matrix::new(&engine, 2, 3).unwrap();
        let b = Matrix::new(&engine, 3, 4).unwrap();
        let mut c = Matrix::new(&engine, 2, 3).unwrap();
        assert_eq!(mxm(&mut c, &a, &b, None), Err(SpblaError::InvalidArgument));
    }

    #[test]
    fn test_mxm_shapes_checked_before_engine_call() {
        let engine = engine();
        let a = Matrix::new(&engine, 2, 3).unwrap();
        let b = Matrix::new(&engine, 4, 2).unwrap();
        let b_fits = Matrix::new(&engine, 3, 2).unwrap();
        let mut c = Matrix::new(&engine, 2, 2).unwrap();
        let mut not_square = Matrix::new(&engine, 2, 3).unwrap();
        let mut kron = Matrix::new(&engine, 3, 3).unwrap();

        // A finalized engine answers InvalidState, so InvalidArgument can
        // only come from the local shape checks
        engine.finalize().unwrap();
        assert_eq!(mxm(&mut c, &a, &b, None), Err(SpblaError::InvalidArgument));
        assert_eq!(mxm_self(&mut not_square, None), Err(SpblaError::InvalidArgument));
        assert_eq!(kronecker(&mut kron, &a, &b, None), Err(SpblaError::InvalidArgument));

        assert_eq!(mxm(&mut c, &a, &b_fits, None), Err(SpblaError::InvalidState));
    }

    #[test]
    fn test_mxm_rejects_foreign_engine() {
        let first = engine();
        let second = engine();
        let a = Matrix::new(&first, 2, 2).unwrap();
        let b = Matrix::new(&second, 2, 2).unwrap();
        let mut c = Matrix::new(&first, 2, 2).unwrap();
        assert_eq!(mxm(&mut c, &a, &b, None), Err(SpblaError::InvalidArgument));
    }

    #[test]
    fn test_mxm_self_requires_square() {
        let engine = engine();
        let mut t = Matrix::new(&engine, 2, 3).unwrap();
        assert_eq!(mxm_self(&mut t, None), Err(SpblaError::InvalidArgument));
    }

    #[test]
    fn test_mxm_self_squares() {
        let engine = engine();
        let mut t = Matrix::from_pairs(&engine, (3, 3), &[0, 1], &[1, 2]).unwrap();
        mxm_self(&mut t, None).unwrap();
        assert_eq!(sorted_pairs(&t), vec![(0, 2)]);
    }

    #[test]
    fn test_kronecker() {
        let engine = engine();
        let a = Matrix::from_pairs(&engine, (2, 2), &[0, 1], &[0, 1]).unwrap();
        let b = Matrix::from_pairs(&engine, (2, 2), &[0], &[1]).unwrap();
        let mut c = Matrix::new(&engine, 4, 4).unwrap();

        kronecker(&mut c, &a, &b, Some(&KroneckerHints::time_checked())).unwrap();
        assert_eq!(sorted_pairs(&c), vec![(0, 1), (2, 3)]);

        let mut wrong = Matrix::new(&engine, 4, 2).unwrap();
        assert_eq!(kronecker(&mut wrong, &a, &b, None), Err(SpblaError::InvalidArgument));
    }
}
