// End-to-End Matrix Tests
//
// Drives the public API against the host engine: construction, population,
// extraction and every algebraic operation.

use rustspbla::core::hints::{BuildHints, MxmHints, TransposeHints};
use rustspbla::ops::*;
use rustspbla::{Engine, EngineConfig, Matrix, SpblaError};
use std::collections::BTreeSet;

fn engine() -> Engine {
    Engine::initialize(&EngineConfig::host()).unwrap()
}

fn pair_set(m: &Matrix) -> BTreeSet<(usize, usize)> {
    let (rows, cols) = m.extract_pairs().unwrap();
    assert_eq!(rows.len(), cols.len());
    rows.into_iter().zip(cols).collect()
}

#[test]
fn test_empty_matrices_have_no_entries() {
    let engine = engine();
    for (r, c) in [(1, 1), (1, 7), (7, 1), (32, 64), (100, 3)] {
        let m = Matrix::new(&engine, r, c).unwrap();
        assert_eq!(m.nvals().unwrap(), 0);
        assert_eq!(m.nrows().unwrap(), r);
        assert_eq!(m.ncols().unwrap(), c);
    }
}

#[test]
fn test_set_element_is_idempotent() {
    let engine = engine();
    let mut m = Matrix::new(&engine, 4, 4).unwrap();

    m.set_element(2, 3).unwrap();
    let after_first = m.nvals().unwrap();
    m.set_element(2, 3).unwrap();
    let after_second = m.nvals().unwrap();

    assert_eq!(after_first, 1);
    assert_eq!(after_second, after_first);
}

#[test]
fn test_build_then_extract_round_trip() {
    let engine = engine();
    let rows = [5, 0, 3, 3, 9, 1];
    let cols = [2, 0, 7, 1, 9, 4];
    let mut m = Matrix::new(&engine, 10, 10).unwrap();
    m.build(&rows, &cols, None).unwrap();

    let expected: BTreeSet<_> = rows.iter().copied().zip(cols.iter().copied()).collect();
    assert_eq!(pair_set(&m), expected);
    assert_eq!(m.nvals().unwrap(), rows.len());
}

#[test]
fn test_build_with_hints_on_sorted_input() {
    let engine = engine();
    let mut m = Matrix::new(&engine, 3, 3).unwrap();
    m.build(&[0, 1, 2], &[2, 0, 1], Some(&BuildHints::sorted_unique()))
        .unwrap();
    assert_eq!(pair_set(&m), BTreeSet::from([(0, 2), (1, 0), (2, 1)]));
}

#[test]
fn test_build_replaces_existing_contents() {
    let engine = engine();
    let mut m = Matrix::new(&engine, 3, 3).unwrap();
    m.set_element(0, 0).unwrap();
    m.build(&[1], &[1], None).unwrap();
    assert_eq!(pair_set(&m), BTreeSet::from([(1, 1)]));
}

#[test]
fn test_duplicate_is_independent() {
    let engine = engine();
    let a = Matrix::from_pairs(&engine, (3, 3), &[0, 1], &[1, 2]).unwrap();
    let mut b = a.duplicate().unwrap();
    assert_eq!(pair_set(&b), pair_set(&a));

    b.set_element(2, 0).unwrap();
    b.set_element(0, 0).unwrap();
    assert_eq!(a.nvals().unwrap(), 2);
    assert_eq!(b.nvals().unwrap(), 4);
}

#[test]
fn test_transpose_twice_is_identity() {
    let engine = engine();
    let src = Matrix::from_pairs(&engine, (3, 5), &[0, 2, 1, 2], &[4, 0, 3, 2]).unwrap();
    let mut once = Matrix::new(&engine, 5, 3).unwrap();
    let mut twice = Matrix::new(&engine, 3, 5).unwrap();

    transpose(&mut once, &src, None).unwrap();
    transpose(&mut twice, &once, Some(&TransposeHints::time_checked())).unwrap();

    assert_eq!(pair_set(&twice), pair_set(&src));
    assert!(pair_set(&once).contains(&(4, 0)));
}

#[test]
fn test_ewise_add_with_self_is_self() {
    let engine = engine();
    let a = Matrix::from_pairs(&engine, (4, 4), &[0, 1, 3], &[3, 1, 0]).unwrap();
    let mut c = Matrix::new(&engine, 4, 4).unwrap();
    ewise_add(&mut c, &a, &a, None).unwrap();
    assert_eq!(pair_set(&c), pair_set(&a));
}

#[test]
fn test_mxm_scenario() {
    let engine = engine();
    let mut a = Matrix::new(&engine, 2, 3).unwrap();
    a.set_element(0, 0).unwrap();
    a.set_element(1, 2).unwrap();

    let mut b = Matrix::new(&engine, 3, 4).unwrap();
    for (i, j) in [(0, 1), (0, 2), (1, 3), (2, 1)] {
        b.set_element(i, j).unwrap();
    }

    let mut c = Matrix::new(&engine, 2, 4).unwrap();
    mxm(&mut c, &a, &b, None).unwrap();

    // Row 0 reaches columns 1 and 2 through index 0, row 1 reaches column 1
    // through index 2
    assert_eq!(c.shape(), (2, 4));
    assert_eq!(pair_set(&c), BTreeSet::from([(0, 1), (0, 2), (1, 1)]));
}

#[test]
fn test_mxm_dimension_mismatch() {
    let engine = engine();
    let a = Matrix::new(&engine, 2, 3).unwrap();
    let b = Matrix::new(&engine, 4, 2).unwrap();
    let mut c = Matrix::new(&engine, 2, 2).unwrap();
    assert_eq!(mxm(&mut c, &a, &b, None), Err(SpblaError::InvalidArgument));
}

#[test]
fn test_mxm_dimension_mismatch_never_reaches_engine() {
    let engine = engine();
    let a = Matrix::new(&engine, 2, 3).unwrap();
    let b = Matrix::new(&engine, 4, 2).unwrap();
    let mut c = Matrix::new(&engine, 2, 2).unwrap();

    // Any call into the finalized engine would report InvalidState
    engine.finalize().unwrap();
    assert_eq!(mxm(&mut c, &a, &b, None), Err(SpblaError::InvalidArgument));
    assert_eq!(c.nvals(), Err(SpblaError::InvalidState));
}

#[test]
fn test_accumulated_squaring_reaches_closure() {
    let engine = engine();
    let edges = [(0, 1), (1, 2), (2, 0), (2, 3), (3, 2)];
    let rows: Vec<usize> = edges.iter().map(|e| e.0).collect();
    let cols: Vec<usize> = edges.iter().map(|e| e.1).collect();
    let a = Matrix::from_pairs(&engine, (4, 4), &rows, &cols).unwrap();

    let mut t = a.duplicate().unwrap();
    let hints = MxmHints::accumulate();
    let mut history = vec![t.nvals().unwrap()];
    loop {
        mxm_self(&mut t, Some(&hints)).unwrap();
        let nvals = t.nvals().unwrap();
        if nvals == *history.last().unwrap() {
            break;
        }
        history.push(nvals);
    }

    assert!(history.windows(2).all(|w| w[0] < w[1]));
    // Every node reaches every node through the 0 -> 1 -> 2 -> 0 cycle
    let expected: BTreeSet<_> = (0..4).flat_map(|i| (0..4).map(move |j| (i, j))).collect();
    assert_eq!(pair_set(&t), expected);

    let closure = transitive_closure(&a).unwrap();
    assert_eq!(pair_set(&closure), expected);
}

#[test]
fn test_reduce_and_submatrix() {
    let engine = engine();
    let a = Matrix::from_pairs(&engine, (4, 5), &[0, 0, 3], &[1, 4, 2]).unwrap();

    let mut reduced = Matrix::new(&engine, 4, 1).unwrap();
    reduce(&mut reduced, &a, None).unwrap();
    assert_eq!(pair_set(&reduced), BTreeSet::from([(0, 0), (3, 0)]));

    let mut window = Matrix::new(&engine, 4, 2).unwrap();
    extract_submatrix(&mut window, &a, 0, 1, 4, 2, None).unwrap();
    assert_eq!(pair_set(&window), BTreeSet::from([(0, 0), (3, 1)]));
}

#[test]
fn test_kronecker_block_structure() {
    let engine = engine();
    let a = Matrix::from_pairs(&engine, (2, 2), &[0, 1], &[1, 0]).unwrap();
    let b = Matrix::from_pairs(&engine, (2, 3), &[0, 1], &[0, 2]).unwrap();
    let mut k = Matrix::new(&engine, 4, 6).unwrap();
    kronecker(&mut k, &a, &b, None).unwrap();
    assert_eq!(
        pair_set(&k),
        BTreeSet::from([(0, 3), (1, 5), (2, 0), (3, 2)])
    );
}

#[test]
fn test_matrices_move_across_threads() {
    let engine = engine();
    let mut m = Matrix::new(&engine, 8, 8).unwrap();
    let handle = std::thread::spawn(move || {
        for i in 0..8 {
            m.set_element(i, (i + 1) % 8).unwrap();
        }
        m
    });
    let m = handle.join().unwrap();
    assert_eq!(m.nvals().unwrap(), 8);
}
