// High-Level Element-wise Operations
//
// Element-wise addition over the boolean semiring is the union of the
// present entries.

use crate::core::error::{Result, SpblaError};
use crate::core::hints::{bits_of, EwiseAddHints};
use crate::core::matrix::Matrix;

/// Element-wise addition: C = A | B
///
/// All three matrices must share one shape.
pub fn ewise_add(
    output: &mut Matrix,
    left: &Matrix,
    right: &Matrix,
    hints: Option<&EwiseAddHints>,
) -> Result<()> {
    if left.shape() != right.shape() || output.shape() != left.shape() {
        return Err(SpblaError::InvalidArgument);
    }
    output.check_same_engine(left)?;
    output.check_same_engine(right)?;

    let bits = bits_of(hints);
    let (out, a, b) = (output.handle(), left.handle(), right.handle());
    output.engine().call("matrix_ewise_add", |raw| unsafe {
        raw.matrix_ewise_add(out, a, b, bits)
    })
}

/// In-place element-wise addition: C |= B
pub fn ewise_add_assign(
    output: &mut Matrix,
    other: &Matrix,
    hints: Option<&EwiseAddHints>,
) -> Result<()> {
    if output.shape() != other.shape() {
        return Err(SpblaError::InvalidArgument);
    }
    output.check_same_engine(other)?;

    let bits = bits_of(hints);
    let (out, b) = (output.handle(), other.handle());
    output.engine().call("matrix_ewise_add", |raw| unsafe {
        raw.matrix_ewise_add(out, out, b, bits)
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
    fn test_ewise_add_union() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        let a = Matrix::from_pairs(&engine, (2, 2), &[0, 1], &[0, 1]).unwrap();
        let b = Matrix::from_pairs(&engine, (2, 2), &[0, 0], &[0, 1]).unwrap();
        let mut c = Matrix::new(&engine, 2, 2).unwrap();

        ewise_add(&mut c, &a, &b, None).unwrap();
        assert_eq!(sorted_pairs(&c), vec![(0, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_ewise_add_assign() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        let mut a = Matrix::from_pairs(&engine, (2, 2), &[1], &[0]).unwrap();
        let b = Matrix::from_pairs(&engine, (2, 2), &[0], &[1]).unwrap();

        ewise_add_assign(&mut a, &b, Some(&EwiseAddHints::time_checked())).unwrap();
        assert_eq!(sorted_pairs(&a), vec![(0, 1), (1, 0)]);
        assert_eq!(sorted_pairs(&b), vec![(0, 1)]);
    }

    #[test]
    fn test_ewise_add_shape_mismatch() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        let a = Matrix::new(&engine, 2, 2).unwrap();
        let b = Matrix::new(&engine, 2, 3).unwrap();
        let mut c = Matrix::new(&engine, 2, 2).unwrap();
        assert_eq!(ewise_add(&mut c, &a, &b, None), Err(SpblaError::InvalidArgument));
        assert_eq!(ewise_add_assign(&mut c, &b, None), Err(SpblaError::InvalidArgument));
    }

    #[test]
    fn test_ewise_shapes_checked_before_engine_call() {
        let engine = Engine::initialize(&EngineConfig::host()).unwrap();
        let a = Matrix::new(&engine, 2, 2).unwrap();
        let b = Matrix::new(&engine, 2, 3).unwrap();
        let mut c = Matrix::new(&engine, 2, 2).unwrap();

        engine.finalize().unwrap();
        assert_eq!(ewise_add(&mut c, &a, &b, None), Err(SpblaError::InvalidArgument));
        assert_eq!(ewise_add(&mut c, &a, &a, None), Err(SpblaError::InvalidState));
    }
}
