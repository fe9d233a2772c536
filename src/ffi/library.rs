// FFI Layer: dynamically loaded spbla library
//
// Opens the native shared library with libloading and resolves every entry
// point into a typed function table up front, so a library missing a symbol
// is rejected at load time instead of at first use.

use crate::core::error::{Result, SpblaError};
use crate::ffi::api::RawEngine;
use crate::ffi::error::spbla_Status;
use crate::ffi::types::{spbla_DeviceCaps, spbla_Hints, spbla_Index, spbla_Matrix};
use libloading::Library;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};

type SetupLoggingFn = unsafe extern "C" fn(*const c_char, spbla_Hints) -> spbla_Status;
type InitializeFn = unsafe extern "C" fn(spbla_Hints) -> spbla_Status;
type FinalizeFn = unsafe extern "C" fn() -> spbla_Status;
type InfoTextFn = unsafe extern "C" fn() -> *const c_char;
type GetVersionFn = unsafe extern "C" fn(*mut c_int, *mut c_int, *mut c_int) -> spbla_Status;
type GetDeviceCapsFn = unsafe extern "C" fn(*mut spbla_DeviceCaps) -> spbla_Status;
type MatrixNewFn = unsafe extern "C" fn(*mut spbla_Matrix, spbla_Index, spbla_Index) -> spbla_Status;
type MatrixFreeFn = unsafe extern "C" fn(spbla_Matrix) -> spbla_Status;
type MatrixBuildFn = unsafe extern "C" fn(
    spbla_Matrix,
    *const spbla_Index,
    *const spbla_Index,
    spbla_Index,
    spbla_Hints,
) -> spbla_Status;
type MatrixSetElementFn = unsafe extern "C" fn(spbla_Matrix, spbla_Index, spbla_Index) -> spbla_Status;
type MatrixSetMarkerFn = unsafe extern "C" fn(spbla_Matrix, *const c_char) -> spbla_Status;
type MatrixMarkerFn = unsafe extern "C" fn(spbla_Matrix, *mut c_char, *mut spbla_Index) -> spbla_Status;
type MatrixExtractPairsFn = unsafe extern "C" fn(
    spbla_Matrix,
    *mut spbla_Index,
    *mut spbla_Index,
    *mut spbla_Index,
) -> spbla_Status;
type MatrixExtractSubMatrixFn = unsafe extern "C" fn(
    spbla_Matrix,
    spbla_Matrix,
    spbla_Index,
    spbla_Index,
    spbla_Index,
    spbla_Index,
    spbla_Hints,
) -> spbla_Status;
type MatrixDuplicateFn = unsafe extern "C" fn(spbla_Matrix, *mut spbla_Matrix) -> spbla_Status;
type UnaryOpFn = unsafe extern "C" fn(spbla_Matrix, spbla_Matrix, spbla_Hints) -> spbla_Status;
type QueryFn = unsafe extern "C" fn(spbla_Matrix, *mut spbla_Index) -> spbla_Status;
type BinaryOpFn =
    unsafe extern "C" fn(spbla_Matrix, spbla_Matrix, spbla_Matrix, spbla_Hints) -> spbla_Status;

/// Function table of a loaded spbla shared library
pub struct SpblaLibrary {
    path: PathBuf,
    setup_logging: SetupLoggingFn,
    initialize: InitializeFn,
    finalize: FinalizeFn,
    get_about: InfoTextFn,
    get_license_info: InfoTextFn,
    get_version: GetVersionFn,
    get_device_caps: GetDeviceCapsFn,
    matrix_new: MatrixNewFn,
    matrix_free: MatrixFreeFn,
    matrix_build: MatrixBuildFn,
    matrix_set_element: MatrixSetElementFn,
    matrix_set_marker: MatrixSetMarkerFn,
    matrix_marker: MatrixMarkerFn,
    matrix_extract_pairs: MatrixExtractPairsFn,
    matrix_extract_sub_matrix: MatrixExtractSubMatrixFn,
    matrix_duplicate: MatrixDuplicateFn,
    matrix_transpose: UnaryOpFn,
    matrix_nvals: QueryFn,
    matrix_nrows: QueryFn,
    matrix_ncols: QueryFn,
    matrix_reduce: UnaryOpFn,
    matrix_ewise_add: BinaryOpFn,
    mxm: BinaryOpFn,
    kronecker: BinaryOpFn,
    // Keeps the resolved pointers above valid
    _library: Library,
}

/// Resolve one symbol and copy the function pointer out of the library
fn resolve<T: Copy>(library: &Library, name: &[u8]) -> Result<T> {
    unsafe { library.get::<T>(name) }
        .map(|symbol| *symbol)
        .map_err(|e| {
            let printable = name.strip_suffix(b"\0").unwrap_or(name);
            SpblaError::EngineLoad(format!(
                "missing symbol {}: {}",
                String::from_utf8_lossy(printable),
                e
            ))
        })
}

impl SpblaLibrary {
    /// Load the shared library at `path` and resolve the whole call surface
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading spbla library from {}", path.display());

        let library = unsafe { Library::new(path) }
            .map_err(|e| SpblaError::EngineLoad(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            path: path.to_path_buf(),
            setup_logging: resolve(&library, b"spbla_SetupLogging\0")?,
            initialize: resolve(&library, b"spbla_Initialize\0")?,
            finalize: resolve(&library, b"spbla_Finalize\0")?,
            get_about: resolve(&library, b"spbla_GetAbout\0")?,
            get_license_info: resolve(&library, b"spbla_GetLicenseInfo\0")?,
            get_version: resolve(&library, b"spbla_GetVersion\0")?,
            get_device_caps: resolve(&library, b"spbla_GetDeviceCaps\0")?,
            matrix_new: resolve(&library, b"spbla_Matrix_New\0")?,
            matrix_free: resolve(&library, b"spbla_Matrix_Free\0")?,
            matrix_build: resolve(&library, b"spbla_Matrix_Build\0")?,
            matrix_set_element: resolve(&library, b"spbla_Matrix_SetElement\0")?,
            matrix_set_marker: resolve(&library, b"spbla_Matrix_SetMarker\0")?,
            matrix_marker: resolve(&library, b"spbla_Matrix_Marker\0")?,
            matrix_extract_pairs: resolve(&library, b"spbla_Matrix_ExtractPairs\0")?,
            matrix_extract_sub_matrix: resolve(&library, b"spbla_Matrix_ExtractSubMatrix\0")?,
            matrix_duplicate: resolve(&library, b"spbla_Matrix_Duplicate\0")?,
            matrix_transpose: resolve(&library, b"spbla_Matrix_Transpose\0")?,
            matrix_nvals: resolve(&library, b"spbla_Matrix_Nvals\0")?,
            matrix_nrows: resolve(&library, b"spbla_Matrix_Nrows\0")?,
            matrix_ncols: resolve(&library, b"spbla_Matrix_Ncols\0")?,
            matrix_reduce: resolve(&library, b"spbla_Matrix_Reduce\0")?,
            matrix_ewise_add: resolve(&library, b"spbla_Matrix_EWiseAdd\0")?,
            mxm: resolve(&library, b"spbla_MxM\0")?,
            kronecker: resolve(&library, b"spbla_Kronecker\0")?,
            _library: library,
        })
    }

    /// Path the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Check whether a file name follows the spbla library naming convention
///
/// The name must contain `spbla` and carry the platform dynamic library
/// extension, optionally followed by a version suffix (`libspbla.so.1`).
pub fn is_library_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let ext = std::env::consts::DLL_EXTENSION;
    name.contains("spbla")
        && (name.ends_with(&format!(".{}", ext)) || name.contains(&format!(".{}.", ext)))
}

/// Scan `dir` for the spbla shared library
///
/// Entries are sorted so the choice is stable when several builds are
/// installed side by side.
pub fn discover_library(dir: &Path) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        SpblaError::EngineLoad(format!("cannot scan {}: {}", dir.display(), e))
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_library_name(path))
        .collect();
    candidates.sort();

    log::debug!(
        "Found {} spbla library candidate(s) in {}",
        candidates.len(),
        dir.display()
    );

    candidates.into_iter().next().ok_or_else(|| {
        SpblaError::EngineLoad(format!("no spbla library found in {}", dir.display()))
    })
}

impl RawEngine for SpblaLibrary {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    unsafe fn setup_logging(&self, log_file: *const c_char, hints: spbla_Hints) -> spbla_Status {
        (self.setup_logging)(log_file, hints)
    }

    unsafe fn initialize(&self, hints: spbla_Hints) -> spbla_Status {
        (self.initialize)(hints)
    }

    unsafe fn finalize(&self) -> spbla_Status {
        (self.finalize)()
    }

    unsafe fn get_about(&self) -> *const c_char {
        (self.get_about)()
    }

    unsafe fn get_license_info(&self) -> *const c_char {
        (self.get_license_info)()
    }

    unsafe fn get_version(
        &self,
        major: *mut c_int,
        minor: *mut c_int,
        sub: *mut c_int,
    ) -> spbla_Status {
        (self.get_version)(major, minor, sub)
    }

    unsafe fn get_device_caps(&self, caps: *mut spbla_DeviceCaps) -> spbla_Status {
        (self.get_device_caps)(caps)
    }

    unsafe fn matrix_new(
        &self,
        matrix: *mut spbla_Matrix,
        nrows: spbla_Index,
        ncols: spbla_Index,
    ) -> spbla_Status {
        (self.matrix_new)(matrix, nrows, ncols)
    }

    unsafe fn matrix_free(&self, matrix: spbla_Matrix) -> spbla_Status {
        (self.matrix_free)(matrix)
    }

    unsafe fn matrix_build(
        &self,
        matrix: spbla_Matrix,
        rows: *const spbla_Index,
        cols: *const spbla_Index,
        nvals: spbla_Index,
        hints: spbla_Hints,
    ) -> spbla_Status {
        (self.matrix_build)(matrix, rows, cols, nvals, hints)
    }

    unsafe fn matrix_set_element(
        &self,
        matrix: spbla_Matrix,
        i: spbla_Index,
        j: spbla_Index,
    ) -> spbla_Status {
        (self.matrix_set_element)(matrix, i, j)
    }

    unsafe fn matrix_set_marker(
        &self,
        matrix: spbla_Matrix,
        marker: *const c_char,
    ) -> spbla_Status {
        (self.matrix_set_marker)(matrix, marker)
    }

    unsafe fn matrix_marker(
        &self,
        matrix: spbla_Matrix,
        marker: *mut c_char,
        size: *mut spbla_Index,
    ) -> spbla_Status {
        (self.matrix_marker)(matrix, marker, size)
    }

    unsafe fn matrix_extract_pairs(
        &self,
        matrix: spbla_Matrix,
        rows: *mut spbla_Index,
        cols: *mut spbla_Index,
        nvals: *mut spbla_Index,
    ) -> spbla_Status {
        (self.matrix_extract_pairs)(matrix, rows, cols, nvals)
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
        (self.matrix_extract_sub_matrix)(result, matrix, i, j, nrows, ncols, hints)
    }

    unsafe fn matrix_duplicate(
        &self,
        matrix: spbla_Matrix,
        duplicated: *mut spbla_Matrix,
    ) -> spbla_Status {
        (self.matrix_duplicate)(matrix, duplicated)
    }

    unsafe fn matrix_transpose(
        &self,
        result: spbla_Matrix,
        matrix: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        (self.matrix_transpose)(result, matrix, hints)
    }

    unsafe fn matrix_nvals(&self, matrix: spbla_Matrix, nvals: *mut spbla_Index) -> spbla_Status {
        (self.matrix_nvals)(matrix, nvals)
    }

    unsafe fn matrix_nrows(&self, matrix: spbla_Matrix, nrows: *mut spbla_Index) -> spbla_Status {
        (self.matrix_nrows)(matrix, nrows)
    }

    unsafe fn matrix_ncols(&self, matrix: spbla_Matrix, ncols: *mut spbla_Index) -> spbla_Status {
        (self.matrix_ncols)(matrix, ncols)
    }

    unsafe fn matrix_reduce(
        &self,
        result: spbla_Matrix,
        matrix: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        (self.matrix_reduce)(result, matrix, hints)
    }

    unsafe fn matrix_ewise_add(
        &self,
        result: spbla_Matrix,
        left: spbla_Matrix,
        right: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        (self.matrix_ewise_add)(result, left, right, hints)
    }

    unsafe fn mxm(
        &self,
        result: spbla_Matrix,
        left: spbla_Matrix,
        right: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        (self.mxm)(result, left, right, hints)
    }

    unsafe fn kronecker(
        &self,
        result: spbla_Matrix,
        left: spbla_Matrix,
        right: spbla_Matrix,
        hints: spbla_Hints,
    ) -> spbla_Status {
        (self.kronecker)(result, left, right, hints)
    }
}
