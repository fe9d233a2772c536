// High-Level Operations Module
//
// Boolean semiring operations over `Matrix` handles. Every operation checks
// shapes and engine membership locally, composes its hints, then makes one
// engine call.

pub mod closure;
pub mod ewise;
pub mod matmul;
pub mod transform;

// Re-exports
pub use closure::transitive_closure;
pub use ewise::{ewise_add, ewise_add_assign};
pub use matmul::{kronecker, mxm, mxm_self};
pub use transform::{extract_submatrix, reduce, transpose};
