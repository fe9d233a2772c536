// Host Engine: in-process implementation of the spbla call surface
//
// Answers every `RawEngine` entry point with the same status contract as the
// native library, without loading anything. Matrices live in a per-engine
// handle registry; the opaque `spbla_Matrix` pointer handed out is the handle
// value itself.

pub mod csr;

use crate::core::error::{Result, SpblaError};
use crate::core::handles::HandleRegistry;
use crate::ffi::api::RawEngine;
use crate::ffi::error::*;
use crate::ffi::types::*;
use csr::BoolCsr;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Largest row or column count the host engine allocates
///
/// Row offsets are stored densely, so larger shapes are refused with
/// `SPBLA_STATUS_MEM_OP_FAILED` instead of aborting on allocation.
pub const HOST_MAX_DIMENSION: usize = 1 << 24;

const HOST_ABOUT: &[u8] = b"rustspbla host engine: in-process CSR boolean matrices over the (OR, AND) semiring\0";
const HOST_LICENSE: &[u8] = b"MIT License\0";

/// A matrix owned by the host engine
#[derive(Debug, Clone)]
struct HostMatrix {
    csr: BoolCsr,
    marker: CString,
}

impl HostMatrix {
    fn new(csr: BoolCsr) -> Self {
        Self {
            csr,
            marker: CString::default(),
        }
    }
}

#[derive(Debug, Default)]
struct HostState {
    initialized: bool,
    relaxed_finalize: bool,
    log_file: Option<PathBuf>,
    log_hints: spbla_Hints,
}

/// In-process boolean sparse engine
pub struct HostEngine {
    state: Mutex<HostState>,
    matrices: HandleRegistry<Mutex<HostMatrix>>,
}

impl HostEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState::default()),
            matrices: HandleRegistry::new(),
        }
    }

    /// Number of live matrices
    pub fn live_matrices(&self) -> usize {
        self.matrices.len()
    }

    /// Native log file recorded by `setup_logging`
    pub fn log_file(&self) -> Option<PathBuf> {
        self.state().log_file.clone()
    }

    /// Logging hints in effect after `setup_logging`
    pub fn log_hints(&self) -> spbla_Hints {
        self.state().log_hints
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state().initialized {
            Ok(())
        } else {
            Err(SpblaError::InvalidState)
        }
    }

    fn lookup(&self, matrix: spbla_Matrix) -> Result<Arc<Mutex<HostMatrix>>> {
        if matrix.is_null() {
            return Err(SpblaError::InvalidArgument);
        }
        self.matrices.get(to_handle(matrix))
    }

    /// Copy of a matrix's storage, taken so that inputs may alias the result
    fn snapshot(&self, matrix: spbla_Matrix) -> Result<BoolCsr> {
        let m = self.lookup(matrix)?;
        let guard = m.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.csr.clone())
    }

    /// Run `f` against a matrix's locked state
    fn with_matrix<R>(
        &self,
        matrix: spbla_Matrix,
        f: impl FnOnce(&mut HostMatrix) -> Result<R>,
    ) -> Result<R> {
        let m = self.lookup(matrix)?;
        let mut guard = m.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn register(&self, matrix: HostMatrix) -> spbla_Matrix {
        to_matrix(self.matrices.insert(Mutex::new(matrix)))
    }

    /// Store `value` into `result`, checking its shape first
    fn store(&self, result: spbla_Matrix, value: BoolCsr, accumulate: bool) -> Result<()> {
        self.with_matrix(result, |out| {
            if out.csr.shape() != value.shape() {
                return Err(SpblaError::InvalidArgument);
            }
            out.csr = if accumulate {
                out.csr.union(&value)
            } else {
                value
            };
            Ok(())
        })
    }
}

impl Default for HostEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute one entry point, mapping errors and panics to a status code
fn guarded<F>(op: &str, f: F) -> spbla_Status
where
    F: FnOnce() -> Result<()>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => SPBLA_STATUS_SUCCESS,
        Ok(Err(err)) => {
            log::trace!("host {} failed: {}", op, err);
            err.to_status()
        }
        Err(_) => {
            log::error!("host {} panicked", op);
            SPBLA_STATUS_ERROR
        }
    }
}

/// Run a kernel, logging its duration when the time check hint is set
fn timed<R>(op: &str, hints: spbla_Hints, kernel: impl FnOnce() -> R) -> R {
    if hints & SPBLA_HINT_TIME_CHECK == 0 {
        return kernel();
    }
    let start = Instant::now();
    let out = kernel();
    log::debug!("host {}: {:?}", op, start.elapsed());
    out
}

/// Registry key behind an opaque matrix pointer
fn to_handle(matrix: spbla_Matrix) -> usize {
    matrix as usize
}

/// Opaque matrix pointer handed out for a registry key
fn to_matrix(handle: usize) -> spbla_Matrix {
    handle as spbla_Matrix
}

fn check_dimension(dimension: spbla_Index) -> Result<usize> {
    match dimension as usize {
        0 => Err(SpblaError::InvalidArgument),
        d if d > HOST_MAX_DIMENSION => {
            log::warn!("host matrix dimension {} exceeds {}", d, HOST_MAX_DIMENSION);
            Err(SpblaError::MemOpFailed)
        }
        d => Ok(d),
    }
}

fn check_index(index: spbla_Index, bound: usize) -> Result<usize> {
    let index = index as usize;
    if index < bound {
        Ok(index)
    } else {
        Err(SpblaError::InvalidArgument)
    }
}

fn version_part(text: &str) -> c_int {
    text.parse().unwrap_or(0)
}

impl RawEngine for HostEngine {
    fn describe(&self) -> String {
        "host".to_string()
    }

    unsafe fn setup_logging(&self, log_file: *const c_char, hints: spbla_Hints) -> spbla_Status {
        guarded("setup_logging", || {
            if log_file.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            let path = CStr::from_ptr(log_file)
                .to_str()
                .map_err(|_| SpblaError::InvalidArgument)?;
            let mut state = self.state();
            let hints = if hints == SPBLA_HINT_NO {
                SPBLA_HINT_LOG_ALL
            } else {
                hints
            };
            state.log_file = Some(PathBuf::from(path));
            state.log_hints = hints;
            log::debug!("host logging into {} (hints {:#x})", path, hints);
            Ok(())
        })
    }

    unsafe fn initialize(&self, hints: spbla_Hints) -> spbla_Status {
        guarded("initialize", || {
            let mut state = self.state();
            if state.initialized {
                return Err(SpblaError::InvalidState);
            }
            if hints & (SPBLA_HINT_CUDA_BACKEND | SPBLA_HINT_OPENCL_BACKEND) != 0 {
                return Err(SpblaError::DeviceNotPresent);
            }
            state.initialized = true;
            state.relaxed_finalize = hints & SPBLA_HINT_RELAXED_FINALIZE != 0;
            log::debug!("host engine initialized (hints {:#x})", hints);
            Ok(())
        })
    }

    unsafe fn finalize(&self) -> spbla_Status {
        guarded("finalize", || {
            let mut state = self.state();
            if !state.initialized {
                return Err(SpblaError::InvalidState);
            }
            state.initialized = false;
            let live = self.matrices.clear();
            if live > 0 && !state.relaxed_finalize {
                log::warn!("host engine finalized with {} unreleased matrices", live);
                return Err(SpblaError::InvalidState);
            }
            Ok(())
        })
    }

    unsafe fn get_about(&self) -> *const c_char {
        HOST_ABOUT.as_ptr() as *const c_char
    }

    unsafe fn get_license_info(&self) -> *const c_char {
        HOST_LICENSE.as_ptr() as *const c_char
    }

    unsafe fn get_version(
        &self,
        major: *mut c_int,
        minor: *mut c_int,
        sub: *mut c_int,
    ) -> spbla_Status {
        guarded("get_version", || {
            if major.is_null() || minor.is_null() || sub.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            *major = version_part(env!("CARGO_PKG_VERSION_MAJOR"));
            *minor = version_part(env!("CARGO_PKG_VERSION_MINOR"));
            *sub = version_part(env!("CARGO_PKG_VERSION_PATCH"));
            Ok(())
        })
    }

    unsafe fn get_device_caps(&self, caps: *mut spbla_DeviceCaps) -> spbla_Status {
        guarded("get_device_caps", || {
            if caps.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            self.ensure_ready()?;
            Err(SpblaError::DeviceNotPresent)
        })
    }

    unsafe fn matrix_new(
        &self,
        matrix: *mut spbla_Matrix,
        nrows: spbla_Index,
        ncols: spbla_Index,
    ) -> spbla_Status {
        guarded("matrix_new", || {
            self.ensure_ready()?;
            if matrix.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            let csr = BoolCsr::new(check_dimension(nrows)?, check_dimension(ncols)?);
            *matrix = self.register(HostMatrix::new(csr));
            Ok(())
        })
    }

    unsafe fn matrix_free(&self, matrix: spbla_Matrix) -> spbla_Status {
        guarded("matrix_free", || {
            self.ensure_ready()?;
            if matrix.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            self.matrices.remove(to_handle(matrix)).map(|_| ())
        })
    }

    unsafe fn matrix_build(
        &self,
        matrix: spbla_Matrix,
        rows: *const spbla_Index,
        cols: *const spbla_Index,
        nvals: spbla_Index,
        hints: spbla_Hints,
    ) -> spbla_Status {
        guarded("matrix_build", || {
            self.ensure_ready()?;
            let count = nvals as usize;
            let (rows, cols) = if count == 0 {
                (&[][..], &[][..])
            } else {
                if rows.is_null() || cols.is_null() {
                    return Err(SpblaError::InvalidArgument);
                }
                (
                    std::slice::from_raw_parts(rows, count),
                    std::slice::from_raw_parts(cols, count),
                )
            };
            self.with_matrix(matrix, |m| {
                let (nrows, ncols) = m.csr.shape();
                for (&i, &j) in rows.iter().zip(cols) {
                    check_index(i, nrows)?;
                    check_index(j, ncols)?;
                }
                log::trace!("host build {} pairs (hints {:#x})", count, hints);
                m.csr = BoolCsr::from_pairs(nrows, ncols, rows, cols);
                Ok(())
            })
        })
    }

    unsafe fn matrix_set_element(
        &self,
        matrix: spbla_Matrix,
        i: spbla_Index,
        j: spbla_Index,
    ) -> spbla_Status {
        guarded("matrix_set_element", || {
            self.ensure_ready()?;
            self.with_matrix(matrix, |m| {
                let row = check_index(i, m.csr.nrows())?;
                check_index(j, m.csr.ncols())?;
                m.csr.insert(row, j);
                Ok(())
            })
        })
    }

    unsafe fn matrix_set_marker(&self, matrix: spbla_Matrix, marker: *const c_char) -> spbla_Status {
        guarded("matrix_set_marker", || {
            self.ensure_ready()?;
            if marker.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            let marker = CStr::from_ptr(marker).to_owned();
            self.with_matrix(matrix, |m| {
                m.marker = marker;
                Ok(())
            })
        })
    }

    unsafe fn matrix_marker(
        &self,
        matrix: spbla_Matrix,
        marker: *mut c_char,
        size: *mut spbla_Index,
    ) -> spbla_Status {
        guarded("matrix_marker", || {
            self.ensure_ready()?;
            if size.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            self.with_matrix(matrix, |m| {
                let bytes = m.marker.as_bytes_with_nul();
                if marker.is_null() {
                    *size = bytes.len() as spbla_Index;
                    return Ok(());
                }
                if (*size as usize) < bytes.len() {
                    return Err(SpblaError::InvalidArgument);
                }
                std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, marker, bytes.len());
                *size = bytes.len() as spbla_Index;
                Ok(())
            })
        })
    }

    unsafe fn matrix_extract_pairs(
        &self,
        matrix: spbla_Matrix,
        rows: *mut spbla_Index,
        cols: *mut spbla_Index,
        nvals: *mut spbla_Index,
    ) -> spbla_Status {
        guarded("matrix_extract_pairs", || {
            self.ensure_ready()?;
            if nvals.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            self.with_matrix(matrix, |m| {
                let count = m.csr.nvals();
                if (*nvals as usize) < count {
                    return Err(SpblaError::InvalidArgument);
                }
                if count > 0 && (rows.is_null() || cols.is_null()) {
                    return Err(SpblaError::InvalidArgument);
                }
                for (k, (i, j)) in m.csr.pairs().enumerate() {
                    *rows.add(k) = i;
                    *cols.add(k) = j;
                }
                *nvals = count as spbla_Index;
                Ok(())
            })
        })
    }

    unsafe fn matrix_extract_sub_matrix(
        &self,
        result: spbla_Matrix,
        matrix: spbla_Matrix,
        i: spbla_Index,
        j: spbla_Index,
        nrows: spbla_Index,
        ncols: spbla_Index,
        hints: spbla_Hints,
    ) -> spbla_Status {
        guarded("matrix_extract_sub_matrix", || {
            self.ensure_ready()?;
            let source = self.snapshot(matrix)?;
            let (i, j, nrows, ncols) = (i as usize, j as usize, nrows as usize, ncols as usize);
            if i + nrows > source.nrows() || j + ncols > source.ncols() {
                return Err(SpblaError::InvalidArgument);
            }
            let sub = timed("extract_sub_matrix", hints, || {
                source.sub_matrix(i, j, nrows, ncols)
            });
            self.store(result, sub, false)
        })
    }

    unsafe fn matrix_duplicate(
        &self,
        matrix: spbla_Matrix,
        duplicated: *mut spbla_Matrix,
    ) -> spbla_Status {
        guarded("matrix_duplicate", || {
            self.ensure_ready()?;
            if duplicated.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            let csr = self.snapshot(matrix)?;
            *duplicated = self.register(HostMatrix::new(csr));
            Ok(())
        })
    }

    unsafe fn matrix_transpose(
        &self,
        result: spbla_Matrix,
        matrix: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        guarded("matrix_transpose", || {
            self.ensure_ready()?;
            let source = self.snapshot(matrix)?;
            let transposed = timed("transpose", hints, || source.transpose());
            self.store(result, transposed, false)
        })
    }

    unsafe fn matrix_nvals(&self, matrix: spbla_Matrix, nvals: *mut spbla_Index) -> spbla_Status {
        guarded("matrix_nvals", || {
            self.ensure_ready()?;
            if nvals.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            *nvals = self.with_matrix(matrix, |m| Ok(m.csr.nvals() as spbla_Index))?;
            Ok(())
        })
    }

    unsafe fn matrix_nrows(&self, matrix: spbla_Matrix, nrows: *mut spbla_Index) -> spbla_Status {
        guarded("matrix_nrows", || {
            self.ensure_ready()?;
            if nrows.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            *nrows = self.with_matrix(matrix, |m| Ok(m.csr.nrows() as spbla_Index))?;
            Ok(())
        })
    }

    unsafe fn matrix_ncols(&self, matrix: spbla_Matrix, ncols: *mut spbla_Index) -> spbla_Status {
        guarded("matrix_ncols", || {
            self.ensure_ready()?;
            if ncols.is_null() {
                return Err(SpblaError::InvalidArgument);
            }
            *ncols = self.with_matrix(matrix, |m| Ok(m.csr.ncols() as spbla_Index))?;
            Ok(())
        })
    }

    unsafe fn matrix_reduce(
        &self,
        result: spbla_Matrix,
        matrix: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        guarded("matrix_reduce", || {
            self.ensure_ready()?;
            let source = self.snapshot(matrix)?;
            let reduced = timed("reduce", hints, || source.reduce_rows());
            self.store(result, reduced, false)
        })
    }

    unsafe fn matrix_ewise_add(
        &self,
        result: spbla_Matrix,
        left: spbla_Matrix,
        right: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        guarded("matrix_ewise_add", || {
            self.ensure_ready()?;
            let a = self.snapshot(left)?;
            let b = self.snapshot(right)?;
            if a.shape() != b.shape() {
                return Err(SpblaError::InvalidArgument);
            }
            let sum = timed("ewise_add", hints, || a.union(&b));
            self.store(result, sum, false)
        })
    }

    unsafe fn mxm(
        &self,
        result: spbla_Matrix,
        left: spbla_Matrix,
        right: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        guarded("mxm", || {
            self.ensure_ready()?;
            let a = self.snapshot(left)?;
            let b = self.snapshot(right)?;
            if a.ncols() != b.nrows() {
                return Err(SpblaError::InvalidArgument);
            }
            let product = timed("mxm", hints, || a.multiply(&b));
            self.store(result, product, hints & SPBLA_HINT_ACCUMULATE != 0)
        })
    }

    unsafe fn kronecker(
        &self,
        result: spbla_Matrix,
        left: spbla_Matrix,
        right: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        guarded("kronecker", || {
            self.ensure_ready()?;
            let a = self.snapshot(left)?;
            let b = self.snapshot(right)?;
            let expected = a
                .nrows()
                .checked_mul(b.nrows())
                .zip(a.ncols().checked_mul(b.ncols()))
                .ok_or(SpblaError::InvalidArgument)?;
            if self.with_matrix(result, |out| Ok(out.csr.shape()))? != expected {
                return Err(SpblaError::InvalidArgument);
            }
            let product = timed("kronecker", hints, || a.kronecker(&b));
            self.store(result, product, false)
        })
    }
}
