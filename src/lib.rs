// RustSpbla: Rust bindings for the spbla sparse boolean linear algebra engine
//
// Boolean matrices over the (OR, AND) semiring, backed either by the native
// spbla library (CPU, CUDA or OpenCL) loaded at runtime or by the in-process
// host engine.
//
// Architecture:
// - Layer 1 (ffi): C ABI types, status codes and the native library loader
// - Layer 2 (core): error translation, hints, engine lifecycle, matrix handle
// - Layer 3 (ops): multiplication, element-wise, structural and graph operations
// - host: in-process engine implementing the same call surface

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]

// Public modules
pub mod core;
pub mod ffi;
pub mod host;
pub mod ops;

// Re-export commonly used items for convenience
pub use crate::core::{
    Backend, BuildHints, Engine, EngineConfig, Library, LibraryGuard, Matrix, MxmHints, Result,
    SpblaError,
};
