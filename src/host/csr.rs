// Host Engine: boolean CSR storage
//
// Row pointers plus sorted, duplicate-free column indices per row. There are
// no values: a stored index means the entry is present.

use crate::ffi::types::spbla_Index;

/// Boolean sparse matrix in compressed sparse row form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolCsr {
    nrows: usize,
    ncols: usize,
    /// Row pointer array (length = nrows + 1)
    row_ptrs: Vec<usize>,
    /// Column indices, sorted within each row
    col_indices: Vec<spbla_Index>,
}

impl BoolCsr {
    /// Create an empty matrix
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            row_ptrs: vec![0; nrows + 1],
            col_indices: Vec::new(),
        }
    }

    /// Build from (row, col) pairs in any order, duplicates allowed
    ///
    /// Indices must already be validated against the shape.
    pub fn from_pairs(nrows: usize, ncols: usize, rows: &[spbla_Index], cols: &[spbla_Index]) -> Self {
        let mut pairs: Vec<(spbla_Index, spbla_Index)> =
            rows.iter().copied().zip(cols.iter().copied()).collect();
        pairs.sort_unstable();
        pairs.dedup();
        Self::from_sorted_pairs(nrows, ncols, &pairs)
    }

    /// Build from row-major sorted, duplicate-free pairs
    fn from_sorted_pairs(nrows: usize, ncols: usize, pairs: &[(spbla_Index, spbla_Index)]) -> Self {
        let mut row_ptrs = vec![0usize; nrows + 1];
        for &(row, _) in pairs {
            row_ptrs[row as usize + 1] += 1;
        }
        for i in 0..nrows {
            row_ptrs[i + 1] += row_ptrs[i];
        }
        Self {
            nrows,
            ncols,
            row_ptrs,
            col_indices: pairs.iter().map(|&(_, col)| col).collect(),
        }
    }

    /// Assemble from per-row column lists (each sorted and unique)
    fn from_rows(nrows: usize, ncols: usize, rows: Vec<Vec<spbla_Index>>) -> Self {
        let mut row_ptrs = Vec::with_capacity(nrows + 1);
        let mut col_indices = Vec::with_capacity(rows.iter().map(Vec::len).sum());
        row_ptrs.push(0);
        for row in rows {
            col_indices.extend(row);
            row_ptrs.push(col_indices.len());
        }
        Self {
            nrows,
            ncols,
            row_ptrs,
            col_indices,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of present entries
    pub fn nvals(&self) -> usize {
        self.col_indices.len()
    }

    /// Column indices present in row `i`
    pub fn row(&self, i: usize) -> &[spbla_Index] {
        &self.col_indices[self.row_ptrs[i]..self.row_ptrs[i + 1]]
    }

    pub fn contains(&self, i: usize, j: spbla_Index) -> bool {
        self.row(i).binary_search(&j).is_ok()
    }

    /// Mark (i, j) present; no-op if it already is
    pub fn insert(&mut self, i: usize, j: spbla_Index) {
        let start = self.row_ptrs[i];
        match self.row(i).binary_search(&j) {
            Ok(_) => {}
            Err(offset) => {
                self.col_indices.insert(start + offset, j);
                for ptr in &mut self.row_ptrs[i + 1..] {
                    *ptr += 1;
                }
            }
        }
    }

    /// All present entries in row-major order
    pub fn pairs(&self) -> impl Iterator<Item = (spbla_Index, spbla_Index)> + '_ {
        (0..self.nrows).flat_map(move |i| self.row(i).iter().map(move |&j| (i as spbla_Index, j)))
    }

    /// Boolean union of two equally shaped matrices
    pub fn union(&self, other: &BoolCsr) -> BoolCsr {
        debug_assert_eq!(self.shape(), other.shape());
        let rows = (0..self.nrows)
            .map(|i| merge_sorted(self.row(i), other.row(i)))
            .collect();
        Self::from_rows(self.nrows, self.ncols, rows)
    }

    /// Boolean product over the (OR, AND) semiring
    pub fn multiply(&self, other: &BoolCsr) -> BoolCsr {
        debug_assert_eq!(self.ncols, other.nrows);
        let mut marker = vec![false; other.ncols];
        let mut rows = Vec::with_capacity(self.nrows);

        for i in 0..self.nrows {
            let mut row: Vec<spbla_Index> = Vec::new();
            for &k in self.row(i) {
                for &j in other.row(k as usize) {
                    if !marker[j as usize] {
                        marker[j as usize] = true;
                        row.push(j);
                    }
                }
            }
            for &j in &row {
                marker[j as usize] = false;
            }
            row.sort_unstable();
            rows.push(row);
        }

        Self::from_rows(self.nrows, other.ncols, rows)
    }

    /// Kronecker product: block (i, j) is `other` where (i, j) is present
    pub fn kronecker(&self, other: &BoolCsr) -> BoolCsr {
        let nrows = self.nrows * other.nrows;
        let ncols = self.ncols * other.ncols;
        let mut rows = Vec::with_capacity(nrows);

        for i in 0..self.nrows {
            for k in 0..other.nrows {
                let mut row = Vec::with_capacity(self.row(i).len() * other.row(k).len());
                for &j in self.row(i) {
                    let offset = j as usize * other.ncols;
                    row.extend(other.row(k).iter().map(|&l| (offset + l as usize) as spbla_Index));
                }
                rows.push(row);
            }
        }

        Self::from_rows(nrows, ncols, rows)
    }

    pub fn transpose(&self) -> BoolCsr {
        let mut counts = vec![0usize; self.ncols + 1];
        for &j in &self.col_indices {
            counts[j as usize + 1] += 1;
        }
        for j in 0..self.ncols {
            counts[j + 1] += counts[j];
        }

        let row_ptrs = counts.clone();
        let mut next = counts;
        let mut col_indices = vec![0; self.col_indices.len()];
        // Rows are visited in order, so every output row comes out sorted
        for i in 0..self.nrows {
            for &j in self.row(i) {
                let slot = &mut next[j as usize];
                col_indices[*slot] = i as spbla_Index;
                *slot += 1;
            }
        }

        Self {
            nrows: self.ncols,
            ncols: self.nrows,
            row_ptrs,
            col_indices,
        }
    }

    /// Column vector with row i present iff row i has any entry
    pub fn reduce_rows(&self) -> BoolCsr {
        let rows = (0..self.nrows)
            .map(|i| if self.row(i).is_empty() { vec![] } else { vec![0] })
            .collect();
        Self::from_rows(self.nrows, 1, rows)
    }

    /// Window [i, i + nrows) x [j, j + ncols) re-indexed to its origin
    pub fn sub_matrix(&self, i: usize, j: usize, nrows: usize, ncols: usize) -> BoolCsr {
        let (lo, hi) = (j as spbla_Index, (j + ncols) as spbla_Index);
        let rows = (i..i + nrows)
            .map(|r| {
                let row = self.row(r);
                let start = row.partition_point(|&c| c < lo);
                let end = row.partition_point(|&c| c < hi);
                row[start..end].iter().map(|&c| c - lo).collect()
            })
            .collect();
        Self::from_rows(nrows, ncols, rows)
    }
}

/// Merge two sorted, duplicate-free index lists into their union
fn merge_sorted(a: &[spbla_Index], b: &[spbla_Index]) -> Vec<spbla_Index> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut x, mut y) = (0, 0);
    while x < a.len() && y < b.len() {
        if a[x] < b[y] {
            out.push(a[x]);
            x += 1;
        } else if b[y] < a[x] {
            out.push(b[y]);
            y += 1;
        } else {
            out.push(a[x]);
            x += 1;
            y += 1;
        }
    }
    out.extend_from_slice(&a[x..]);
    out.extend_from_slice(&b[y..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs_of(m: &BoolCsr) -> Vec<(spbla_Index, spbla_Index)> {
        m.pairs().collect()
    }

    #[test]
    fn test_from_pairs_sorts_and_dedups() {
        let m = BoolCsr::from_pairs(3, 3, &[2, 0, 2, 0], &[1, 2, 1, 0]);
        assert_eq!(m.nvals(), 3);
        assert_eq!(pairs_of(&m), vec![(0, 0), (0, 2), (2, 1)]);
        assert!(m.row(1).is_empty());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut m = BoolCsr::new(2, 2);
        m.insert(1, 1);
        m.insert(0, 1);
        m.insert(1, 1);
        assert_eq!(m.nvals(), 2);
        assert!(m.contains(1, 1));
        assert!(!m.contains(1, 0));
        assert_eq!(pairs_of(&m), vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn test_multiply() {
        let a = BoolCsr::from_pairs(2, 3, &[0, 1], &[0, 2]);
        let b = BoolCsr::from_pairs(3, 4, &[0, 0, 1, 2], &[1, 2, 3, 1]);
        let c = a.multiply(&b);
        assert_eq!(c.shape(), (2, 4));
        assert_eq!(pairs_of(&c), vec![(0, 1), (0, 2), (1, 1)]);
    }

    #[test]
    fn test_union() {
        let a = BoolCsr::from_pairs(2, 2, &[0, 1], &[0, 1]);
        let b = BoolCsr::from_pairs(2, 2, &[0, 1], &[1, 1]);
        assert_eq!(pairs_of(&a.union(&b)), vec![(0, 0), (0, 1), (1, 1)]);
        assert_eq!(a.union(&a), a);
    }

    #[test]
    fn test_kronecker() {
        let a = BoolCsr::from_pairs(2, 2, &[0, 1], &[1, 0]);
        let b = BoolCsr::from_pairs(2, 3, &[0, 1], &[0, 2]);
        let k = a.kronecker(&b);
        assert_eq!(k.shape(), (4, 6));
        assert_eq!(pairs_of(&k), vec![(0, 3), (1, 5), (2, 0), (3, 2)]);
    }

    #[test]
    fn test_transpose() {
        let a = BoolCsr::from_pairs(2, 3, &[0, 0, 1], &[0, 2, 1]);
        let t = a.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(pairs_of(&t), vec![(0, 0), (1, 1), (2, 0)]);
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn test_reduce_rows() {
        let a = BoolCsr::from_pairs(3, 3, &[0, 0, 2], &[0, 2, 1]);
        let r = a.reduce_rows();
        assert_eq!(r.shape(), (3, 1));
        assert_eq!(pairs_of(&r), vec![(0, 0), (2, 0)]);
    }

    #[test]
    fn test_sub_matrix() {
        let a = BoolCsr::from_pairs(4, 4, &[0, 1, 1, 2, 3], &[0, 1, 3, 2, 3]);
        let s = a.sub_matrix(1, 1, 2, 2);
        assert_eq!(s.shape(), (2, 2));
        assert_eq!(pairs_of(&s), vec![(0, 0), (1, 1)]);
    }
}
