// Core Layer: Matrix handle
//
// Owned wrapper around one engine-side boolean sparse matrix. The handle is
// released exactly once when the wrapper drops; copies are only made through
// `duplicate`, which allocates a fresh handle.

use crate::core::engine::Engine;
use crate::core::error::{Result, SpblaError};
use crate::core::hints::{bits_of, BuildHints};
use crate::core::library::Library;
use crate::ffi::types::{spbla_Index, spbla_Matrix};
use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_char;
use std::ptr;

/// Convert a size or index to the engine index type
pub(crate) fn to_index(value: usize) -> Result<spbla_Index> {
    spbla_Index::try_from(value).map_err(|_| SpblaError::InvalidArgument)
}

/// Sparse boolean matrix
pub struct Matrix {
    handle: spbla_Matrix,
    engine: Engine,
    shape: (usize, usize),
}

// All access to the handle goes through the engine lock
unsafe impl Send for Matrix {}
unsafe impl Sync for Matrix {}

impl Matrix {
    /// Create an empty `nrows` x `ncols` matrix on `engine`
    pub fn new(engine: &Engine, nrows: usize, ncols: usize) -> Result<Self> {
        if nrows == 0 || ncols == 0 {
            return Err(SpblaError::InvalidArgument);
        }
        let (r, c) = (to_index(nrows)?, to_index(ncols)?);

        let mut handle: spbla_Matrix = ptr::null_mut();
        engine.call("matrix_new", |raw| unsafe { raw.matrix_new(&mut handle, r, c) })?;
        log::trace!("Created {}x{} matrix {:p}", nrows, ncols, handle);

        Ok(Matrix {
            handle,
            engine: engine.clone(),
            shape: (nrows, ncols),
        })
    }

    /// Create an empty matrix on the process-wide engine
    pub fn empty(nrows: usize, ncols: usize) -> Result<Self> {
        Self::new(&Library::engine()?, nrows, ncols)
    }

    /// Create a matrix and fill it from (row, col) pairs
    pub fn from_pairs(
        engine: &Engine,
        shape: (usize, usize),
        rows: &[usize],
        cols: &[usize],
    ) -> Result<Self> {
        let mut matrix = Self::new(engine, shape.0, shape.1)?;
        matrix.build(rows, cols, None)?;
        Ok(matrix)
    }

    /// Deep copy into an independent handle
    ///
    /// The marker is not copied.
    pub fn duplicate(&self) -> Result<Matrix> {
        let mut handle: spbla_Matrix = ptr::null_mut();
        self.engine.call("matrix_duplicate", |raw| unsafe {
            raw.matrix_duplicate(self.handle, &mut handle)
        })?;
        Ok(Matrix {
            handle,
            engine: self.engine.clone(),
            shape: self.shape,
        })
    }

    /// Mark (row, col) present; setting a present entry again is a no-op
    pub fn set_element(&mut self, row: usize, col: usize) -> Result<()> {
        self.check_bounds(row, col)?;
        let (i, j) = (to_index(row)?, to_index(col)?);
        self.engine.call("matrix_set_element", |raw| unsafe {
            raw.matrix_set_element(self.handle, i, j)
        })
    }

    /// Whether (row, col) is present
    pub fn get_element(&self, row: usize, col: usize) -> Result<bool> {
        self.check_bounds(row, col)?;
        let (rows, cols) = self.extract_pairs()?;
        Ok(rows.iter().zip(&cols).any(|(&i, &j)| i == row && j == col))
    }

    /// Replace the contents with the given (row, col) pairs
    ///
    /// `rows` and `cols` are parallel sequences. The hints are promises about
    /// the input; a false promise is undefined on native engines.
    pub fn build(&mut self, rows: &[usize], cols: &[usize], hints: Option<&BuildHints>) -> Result<()> {
        if rows.len() != cols.len() {
            return Err(SpblaError::InvalidArgument);
        }
        let rows = rows
            .iter()
            .map(|&i| self.checked_index(i, self.shape.0))
            .collect::<Result<Vec<_>>>()?;
        let cols = cols
            .iter()
            .map(|&j| self.checked_index(j, self.shape.1))
            .collect::<Result<Vec<_>>>()?;
        let nvals = to_index(rows.len())?;
        let bits = bits_of(hints);

        self.engine.call("matrix_build", |raw| unsafe {
            raw.matrix_build(self.handle, rows.as_ptr(), cols.as_ptr(), nvals, bits)
        })
    }

    /// All present entries as parallel (rows, cols) sequences
    ///
    /// The order is engine-defined.
    pub fn extract_pairs(&self) -> Result<(Vec<usize>, Vec<usize>)> {
        let capacity = self.nvals()?;
        let mut rows: Vec<spbla_Index> = vec![0; capacity];
        let mut cols: Vec<spbla_Index> = vec![0; capacity];
        let mut nvals = to_index(capacity)?;

        self.engine.call("matrix_extract_pairs", |raw| unsafe {
            raw.matrix_extract_pairs(self.handle, rows.as_mut_ptr(), cols.as_mut_ptr(), &mut nvals)
        })?;

        let count = nvals as usize;
        rows.truncate(count);
        cols.truncate(count);
        Ok((
            rows.into_iter().map(|i| i as usize).collect(),
            cols.into_iter().map(|j| j as usize).collect(),
        ))
    }

    /// Attach a text label to the matrix
    pub fn set_marker(&mut self, marker: &str) -> Result<()> {
        let marker = CString::new(marker).map_err(|_| SpblaError::InvalidArgument)?;
        self.engine.call("matrix_set_marker", |raw| unsafe {
            raw.matrix_set_marker(self.handle, marker.as_ptr())
        })
    }

    /// Read the text label
    pub fn marker(&self) -> Result<String> {
        let mut size: spbla_Index = 0;
        self.engine.call("matrix_marker", |raw| unsafe {
            raw.matrix_marker(self.handle, ptr::null_mut(), &mut size)
        })?;
        if size == 0 {
            return Ok(String::new());
        }

        let mut buffer: Vec<c_char> = vec![0; size as usize];
        self.engine.call("matrix_marker", |raw| unsafe {
            raw.matrix_marker(self.handle, buffer.as_mut_ptr(), &mut size)
        })?;
        // The engine writes the terminator; keep one in place regardless
        if let Some(last) = buffer.last_mut() {
            *last = 0;
        }
        let marker = unsafe { CStr::from_ptr(buffer.as_ptr()) };
        Ok(marker.to_string_lossy().into_owned())
    }

    /// Number of rows, as reported by the engine
    pub fn nrows(&self) -> Result<usize> {
        let mut nrows: spbla_Index = 0;
        self.engine.call("matrix_nrows", |raw| unsafe {
            raw.matrix_nrows(self.handle, &mut nrows)
        })?;
        Ok(nrows as usize)
    }

    /// Number of columns, as reported by the engine
    pub fn ncols(&self) -> Result<usize> {
        let mut ncols: spbla_Index = 0;
        self.engine.call("matrix_ncols", |raw| unsafe {
            raw.matrix_ncols(self.handle, &mut ncols)
        })?;
        Ok(ncols as usize)
    }

    /// Number of present entries; never cached
    pub fn nvals(&self) -> Result<usize> {
        let mut nvals: spbla_Index = 0;
        self.engine.call("matrix_nvals", |raw| unsafe {
            raw.matrix_nvals(self.handle, &mut nvals)
        })?;
        Ok(nvals as usize)
    }

    /// Shape fixed at creation, without an engine call
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Engine this matrix lives on
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub(crate) fn handle(&self) -> spbla_Matrix {
        self.handle
    }

    /// Fail unless `other` lives on the same engine
    pub(crate) fn check_same_engine(&self, other: &Matrix) -> Result<()> {
        if self.engine.same_engine(&other.engine) {
            Ok(())
        } else {
            Err(SpblaError::InvalidArgument)
        }
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row < self.shape.0 && col < self.shape.1 {
            Ok(())
        } else {
            Err(SpblaError::InvalidArgument)
        }
    }

    fn checked_index(&self, index: usize, bound: usize) -> Result<spbla_Index> {
        if index < bound {
            to_index(index)
        } else {
            Err(SpblaError::InvalidArgument)
        }
    }
}

impl Drop for Matrix {
    fn drop(&mut self) {
        self.engine.release(self.handle);
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("shape", &self.shape)
            .field("marker", &self.marker().ok())
            .finish()
    }
}

/// Largest row or column count rendered as a dense grid
const DISPLAY_GRID_LIMIT: usize = 32;

/// Small matrices print as a grid of `1` and `.` cells. Larger ones print
/// their shape followed by one `(row, col)` line per entry, so the output
/// grows with the entry count rather than the shape.
impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (nrows, ncols) = self.shape;
        let (rows, cols) = self.extract_pairs().map_err(|_| fmt::Error)?;
        let mut pairs: Vec<(usize, usize)> = rows
            .into_iter()
            .zip(cols)
            .filter(|&(i, j)| i < nrows && j < ncols)
            .collect();
        pairs.sort_unstable();
        pairs.dedup();

        if nrows > DISPLAY_GRID_LIMIT || ncols > DISPLAY_GRID_LIMIT {
            write!(f, "{}x{} boolean matrix, {} entries", nrows, ncols, pairs.len())?;
            for (i, j) in pairs {
                write!(f, "\n({}, {})", i, j)?;
            }
            return Ok(());
        }

        let width = nrows.saturating_sub(1).to_string().len();
        let cell = ncols.saturating_sub(1).to_string().len();
        write!(f, "{:width$}", "", width = width)?;
        for j in 0..ncols {
            write!(f, " {:>cell$}", j, cell = cell)?;
        }
        let mut entries = pairs.into_iter().peekable();
        for i in 0..nrows {
            write!(f, "\n{:>width$}", i, width = width)?;
            for j in 0..ncols {
                let present = entries.next_if_eq(&(i, j)).is_some();
                write!(f, " {:>cell$}", if present { "1" } else { "." }, cell = cell)?;
            }
        }
        Ok(())
    }
}
