// High-Level Graph Operations: transitive closure
//
// Repeated squaring with accumulation. Over the boolean semiring `nvals`
// never decreases under `T |= T x T`, so the loop stops as soon as it stays
// unchanged.

use crate::core::error::{Result, SpblaError};
use crate::core::hints::MxmHints;
use crate::core::matrix::Matrix;
use crate::ops::matmul::mxm_self;

/// Reachability matrix of a square adjacency matrix
///
/// Entry (i, j) of the result is present iff j is reachable from i through
/// one or more edges. `adjacency` is left untouched.
pub fn transitive_closure(adjacency: &Matrix) -> Result<Matrix> {
    let (nrows, ncols) = adjacency.shape();
    if nrows != ncols {
        return Err(SpblaError::InvalidArgument);
    }

    let mut closure = adjacency.duplicate()?;
    let hints = MxmHints::accumulate();
    let mut nvals = closure.nvals()?;
    let mut iterations = 0usize;

    loop {
        mxm_self(&mut closure, Some(&hints))?;
        iterations += 1;

        let next = closure.nvals()?;
        if next < nvals {
            log::warn!(
                "Closure lost entries ({} -> {}) after {} iterations",
                nvals,
                next,
                iterations
            );
            return Err(SpblaError::InvalidState);
        }
        if next == nvals {
            break;
        }
        nvals = next;
    }

    log::debug!(
        "Transitive closure of {}x{} converged after {} iterations with {} entries",
        nrows,
        ncols,
        iterations,
        nvals
    );
    Ok(closure)
}
