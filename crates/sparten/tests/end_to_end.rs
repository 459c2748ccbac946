//! End-to-end scenarios through the facade: packing across formats,
//! binding, validation failures, and the duplicate-coordinate contract.

use anyhow::Result;
use sparten::prelude::*;

fn f64_tensor(sizes: &[usize]) -> TensorType {
    TensorType::new(ScalarKind::Float64, Shape::fixed(sizes))
}

/// Dense 1-D pack: unlisted positions are zero.
#[test]
fn dense_vector_pack() -> Result<()> {
    let a = TensorVar::new("a", f64_tensor(&[5]), "d".parse()?);
    a.insert(&[1], 1.0)?;
    a.insert(&[4], 2.0)?;

    let packed = a.pack()?;
    assert!(packed.level(0).is_dense());
    assert_eq!(packed.values(), &[0.0, 1.0, 0.0, 0.0, 2.0]);
    Ok(())
}

/// Sparse 1-D pack: a single segment over the stored coordinates.
#[test]
fn sparse_vector_pack() -> Result<()> {
    let a = TensorVar::new("a", f64_tensor(&[5]), "s".parse()?);
    a.insert(&[1], 1.0)?;
    a.insert(&[4], 2.0)?;

    let packed = a.pack()?;
    let (segments, indices) = packed.level(0).as_sparse().unwrap();
    assert_eq!(segments, &[0, 2]);
    assert_eq!(indices, &[1, 4]);
    assert_eq!(packed.values(), &[1.0, 2.0]);
    Ok(())
}

/// CSR 2-D pack.
#[test]
fn csr_matrix_pack() -> Result<()> {
    let a = TensorVar::new("A", f64_tensor(&[3, 3]), "ds".parse()?);
    a.insert(&[0, 1], 1.0)?;
    a.insert(&[2, 0], 2.0)?;
    a.insert(&[2, 2], 3.0)?;

    let packed = a.pack()?;
    assert!(packed.level(0).is_dense());
    let (segments, indices) = packed.level(1).as_sparse().unwrap();
    assert_eq!(segments, &[0, 1, 1, 3]);
    assert_eq!(indices, &[1, 0, 2]);
    assert_eq!(packed.values(), &[1.0, 2.0, 3.0]);
    Ok(())
}

/// DCSR 2-D pack: empty rows are compressed away at the outer level too.
#[test]
fn dcsr_matrix_pack() -> Result<()> {
    let a = TensorVar::new("A", f64_tensor(&[3, 3]), "ss".parse()?);
    a.insert(&[0, 1], 1.0)?;
    a.insert(&[2, 0], 2.0)?;
    a.insert(&[2, 2], 3.0)?;

    let packed = a.pack()?;
    let (segments, indices) = packed.level(0).as_sparse().unwrap();
    assert_eq!(segments, &[0, 2]);
    assert_eq!(indices, &[0, 2]);
    let (segments, indices) = packed.level(1).as_sparse().unwrap();
    assert_eq!(segments, &[0, 1, 3]);
    assert_eq!(indices, &[1, 0, 2]);
    assert_eq!(packed.values(), &[1.0, 2.0, 3.0]);
    Ok(())
}

/// 3-D pack with two dense levels over a compressed leaf.
#[test]
fn dds_tensor_pack() -> Result<()> {
    let a = TensorVar::new("A", f64_tensor(&[2, 3, 3]), "dds".parse()?);
    a.insert(&[0, 0, 0], 1.0)?;
    a.insert(&[0, 0, 1], 2.0)?;
    a.insert(&[0, 2, 2], 3.0)?;
    a.insert(&[1, 0, 1], 4.0)?;
    a.insert(&[1, 2, 0], 5.0)?;
    a.insert(&[1, 2, 2], 6.0)?;

    let packed = a.pack()?;
    let (segments, indices) = packed.level(2).as_sparse().unwrap();
    assert_eq!(segments, &[0, 2, 2, 3, 4, 4, 6]);
    assert_eq!(indices, &[0, 1, 2, 1, 0, 2]);
    assert_eq!(packed.values(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    Ok(())
}

/// Rebinding a tensor is rejected and the original binding survives.
#[test]
fn rebind_is_rejected() -> Result<()> {
    let a = TensorVar::new("A", f64_tensor(&[3, 3]), "dd".parse()?);
    let b = TensorVar::new("B", f64_tensor(&[3, 3]), "dd".parse()?);
    let c = TensorVar::new("C", f64_tensor(&[3, 3]), "dd".parse()?);
    let (i, j) = (IndexVar::named("i"), IndexVar::named("j"));

    a.assign(&[i.clone(), j.clone()], b.access(&[i.clone(), j.clone()])?)?;
    let err = a
        .assign(&[i.clone(), j.clone()], c.access(&[i, j])?)
        .unwrap_err();
    assert_eq!(
        err,
        BindError::AlreadyBound {
            tensor: "A".to_string()
        }
    );
    assert_eq!(a.index_expr().unwrap().to_string(), "B(i,j)");
    Ok(())
}

/// A dimension conflict reports the offending variable and both sizes.
#[test]
fn dimension_mismatch_is_diagnosed() -> Result<()> {
    let a = TensorVar::new("a", f64_tensor(&[3]), "d".parse()?);
    let b = TensorVar::new("B", f64_tensor(&[3]), "d".parse()?);
    let c = TensorVar::new("C", f64_tensor(&[4]), "d".parse()?);
    let i = IndexVar::named("i");

    let rhs = b.access(&[i.clone()])? + c.access(&[i.clone()])?;
    let err = a.assign(&[i.clone()], rhs).unwrap_err();
    match err {
        BindError::DimensionMismatch { conflicts } => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].var, i);
            assert_eq!(conflicts[0].expected, Dimension::Fixed(3));
            assert_eq!(conflicts[0].found, Dimension::Fixed(4));
        }
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }
    assert!(!a.is_bound());
    Ok(())
}

/// Binding, annotating, and packing compose over one tensor.
#[test]
fn bind_schedule_and_pack_compose() -> Result<()> {
    let a = TensorVar::new("a", f64_tensor(&[4]), "s".parse()?);
    let b = TensorVar::new("b", f64_tensor(&[4]), "d".parse()?);
    let c = TensorVar::new("c", f64_tensor(&[4]), "d".parse()?);
    let i = IndexVar::named("i");

    let rhs = b.access(&[i.clone()])? * c.access(&[i.clone()])?;
    rhs.split(&i, &IndexVar::named("io"), &IndexVar::named("ii"));
    a.assign(&[i.clone()], rhs)?;

    let schedule = a.schedule();
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule.splits()[0].old(), &i);

    a.insert(&[3], 9.0)?;
    let packed = a.pack()?;
    let (segments, indices) = packed.level(0).as_sparse().unwrap();
    assert_eq!(segments, &[0, 1]);
    assert_eq!(indices, &[3]);
    assert_eq!(packed.values(), &[9.0]);
    Ok(())
}

/// Duplicate coordinates: preserved at a sparse leaf, summed when the
/// caller pre-reduces through the standalone storage API.
#[test]
fn duplicate_contract() -> Result<()> {
    let a = TensorVar::new("a", f64_tensor(&[4]), "s".parse()?);
    a.insert(&[2], 1.0)?;
    a.insert(&[2], 2.0)?;

    let packed = a.pack()?;
    let (segments, indices) = packed.level(0).as_sparse().unwrap();
    assert_eq!(segments, &[0, 2]);
    assert_eq!(indices, &[2, 2]);
    assert_eq!(packed.values(), &[1.0, 2.0]);

    // Pre-reducing gives the canonical form.
    let mut set = CoordinateSet::new(1);
    set.push(&[2], 1.0).unwrap();
    set.push(&[2], 2.0).unwrap();
    set.deduplicate();
    let packed = pack(&set, &[4], &"s".parse()?)?;
    let (segments, indices) = packed.level(0).as_sparse().unwrap();
    assert_eq!(segments, &[0, 1]);
    assert_eq!(indices, &[2]);
    assert_eq!(packed.values(), &[3.0]);
    Ok(())
}

/// Packed output round-trips through the level walker.
#[test]
fn packed_entries_roundtrip() -> Result<()> {
    let a = TensorVar::new("A", f64_tensor(&[3, 3]), "ss".parse()?);
    a.insert(&[0, 1], 1.0)?;
    a.insert(&[2, 0], 2.0)?;
    a.insert(&[2, 2], 3.0)?;

    let entries = a.pack()?.entries();
    assert_eq!(
        entries,
        vec![
            (vec![0, 1], 1.0),
            (vec![2, 0], 2.0),
            (vec![2, 2], 3.0),
        ]
    );
    Ok(())
}
