// FFI Layer: spbla call surface
//
// One method per native entry point, kept in the C shape: raw pointers,
// out-parameters and a status return. The safe layer marshals through this
// trait only, so the dynamically loaded library and the in-process host
// engine are interchangeable.

use crate::ffi::error::spbla_Status;
use crate::ffi::types::{spbla_DeviceCaps, spbla_Hints, spbla_Index, spbla_Matrix};
use std::os::raw::{c_char, c_int};

/// Raw spbla engine entry points
///
/// # Safety
/// Every method follows the contract of the matching `spbla_*` C function:
/// pointers must be valid for the accesses the C function performs, and
/// output parameters are only meaningful when `SPBLA_STATUS_SUCCESS` is
/// returned.
pub trait RawEngine: Send + Sync {
    /// Human readable engine description (library path or "host")
    fn describe(&self) -> String;

    unsafe fn setup_logging(&self, log_file: *const c_char, hints: spbla_Hints) -> spbla_Status;

    unsafe fn initialize(&self, hints: spbla_Hints) -> spbla_Status;

    unsafe fn finalize(&self) -> spbla_Status;

    /// Read-only about text, valid for the lifetime of the engine
    unsafe fn get_about(&self) -> *const c_char;

    /// Read-only license text, valid for the lifetime of the engine
    unsafe fn get_license_info(&self) -> *const c_char;

    unsafe fn get_version(
        &self,
        major: *mut c_int,
        minor: *mut c_int,
        sub: *mut c_int,
    ) -> spbla_Status;

    unsafe fn get_device_caps(&self, caps: *mut spbla_DeviceCaps) -> spbla_Status;

    unsafe fn matrix_new(
        &self,
        matrix: *mut spbla_Matrix,
        nrows: spbla_Index,
        ncols: spbla_Index,
    ) -> spbla_Status;

    unsafe fn matrix_free(&self, matrix: spbla_Matrix) -> spbla_Status;

    unsafe fn matrix_build(
        &self,
        matrix: spbla_Matrix,
        rows: *const spbla_Index,
        cols: *const spbla_Index,
        nvals: spbla_Index,
        hints: spbla_Hints,
    ) -> spbla_Status;

    unsafe fn matrix_set_element(
        &self,
        matrix: spbla_Matrix,
        i: spbla_Index,
        j: spbla_Index,
    ) -> spbla_Status;

    unsafe fn matrix_set_marker(&self, matrix: spbla_Matrix, marker: *const c_char)
        -> spbla_Status;

    /// Pass a null `marker` to query only the required buffer size
    unsafe fn matrix_marker(
        &self,
        matrix: spbla_Matrix,
        marker: *mut c_char,
        size: *mut spbla_Index,
    ) -> spbla_Status;

    /// `nvals` is the buffer capacity on input and the pair count on output
    unsafe fn matrix_extract_pairs(
        &self,
        matrix: spbla_Matrix,
        rows: *mut spbla_Index,
        cols: *mut spbla_Index,
        nvals: *mut spbla_Index,
    ) -> spbla_Status;

    #[allow(clippy::too_many_arguments)]
    unsafe fn matrix_extract_sub_matrix(
        &self,
        result: spbla_Matrix,
        matrix: spbla_Matrix,
        i: spbla_Index,
        j: spbla_Index,
        nrows: spbla_Index,
        ncols: spbla_Index,
        hints: spbla_Hints,
    ) -> spbla_Status;

    unsafe fn matrix_duplicate(
        &self,
        matrix: spbla_Matrix,
        duplicated: *mut spbla_Matrix,
    ) -> spbla_Status;

    unsafe fn matrix_transpose(
        &self,
        result: spbla_Matrix,
        matrix: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status;

    unsafe fn matrix_nvals(&self, matrix: spbla_Matrix, nvals: *mut spbla_Index) -> spbla_Status;

    unsafe fn matrix_nrows(&self, matrix: spbla_Matrix, nrows: *mut spbla_Index) -> spbla_Status;

    unsafe fn matrix_ncols(&self, matrix: spbla_Matrix, ncols: *mut spbla_Index) -> spbla_Status;

    unsafe fn matrix_reduce(
        &self,
        result: spbla_Matrix,
        matrix: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status;

    unsafe fn matrix_ewise_add(
        &self,
        result: spbla_Matrix,
        left: spbla_Matrix,
        right: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status;

    unsafe fn mxm(
        &self,
        result: spbla_Matrix,
        left: spbla_Matrix,
        right: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status;

    unsafe fn kronecker(
        &self,
        result: spbla_Matrix,
        left: spbla_Matrix,
        right: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status;
}
