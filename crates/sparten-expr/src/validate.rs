//! Bind-time semantic validation of index expressions.
//!
//! Three checks run, in order, when an expression is bound to a tensor:
//! dimension typechecking, transposition detection, and distribution
//! detection. The first failing check is the one reported; see
//! [`crate::tensor::BindError`] for the diagnostics.

use std::collections::HashMap;

use sparten_core::{Dimension, LevelType, Shape};

use crate::expr::{ExprKind, IndexExpr};
use crate::tensor::{DimensionConflict, TensorVar};
use crate::var::IndexVar;

/// Checks that every index variable is used at dimensions that agree.
///
/// The variable → dimension map is seeded from the output's free variables
/// and extended by every access in the expression. A variable bound at a
/// known size must be reused at that size; a variable-size binding refines
/// to the first known size it meets. Every conflicting pair is collected.
pub(crate) fn dimension_typecheck(
    free_vars: &[IndexVar],
    output_shape: &Shape,
    expr: &IndexExpr,
) -> Result<(), Vec<DimensionConflict>> {
    let mut ranges: HashMap<IndexVar, Dimension> = HashMap::new();
    let mut conflicts = Vec::new();

    for (var, dim) in free_vars.iter().zip(output_shape.dims()) {
        bind_range(&mut ranges, &mut conflicts, var, *dim);
    }
    expr.walk(&mut |node| {
        if let ExprKind::Access { tensor, indices } = node.kind() {
            for (var, dim) in indices.iter().zip(tensor.tensor_type().shape().dims()) {
                bind_range(&mut ranges, &mut conflicts, var, *dim);
            }
        }
    });

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(conflicts)
    }
}

fn bind_range(
    ranges: &mut HashMap<IndexVar, Dimension>,
    conflicts: &mut Vec<DimensionConflict>,
    var: &IndexVar,
    dim: Dimension,
) {
    match ranges.get(var) {
        None => {
            ranges.insert(var.clone(), dim);
        }
        Some(&existing) => {
            if existing.agrees(&dim) {
                // Refine a variable-size binding to the known size.
                if existing == Dimension::Variable && dim != Dimension::Variable {
                    ranges.insert(var.clone(), dim);
                }
            } else {
                conflicts.push(DimensionConflict {
                    var: var.clone(),
                    expected: existing,
                    found: dim,
                });
            }
        }
    }
}

/// Finds an access that would force a permuted traversal of storage
/// relative to the output's format ordering, returning the offending
/// tensor's name.
///
/// Rejected accesses are those to the output tensor itself, and those whose
/// index variables — restricted to the output's free variables — appear in
/// a different relative order than the output's storage levels iterate
/// them.
pub(crate) fn find_transposition(
    output: &TensorVar,
    free_vars: &[IndexVar],
    expr: &IndexExpr,
) -> Option<String> {
    // Position of each free variable in the output's storage order.
    let mut storage_position: HashMap<IndexVar, usize> = HashMap::new();
    for (level, &dim) in output.format().order().iter().enumerate() {
        if let Some(var) = free_vars.get(dim) {
            storage_position.insert(var.clone(), level);
        }
    }

    let mut found = None;
    expr.walk(&mut |node| {
        if found.is_some() {
            return;
        }
        if let ExprKind::Access { tensor, indices } = node.kind() {
            if tensor == output {
                found = Some(tensor.name().to_string());
                return;
            }
            let positions: Vec<usize> = indices
                .iter()
                .filter_map(|var| storage_position.get(var).copied())
                .collect();
            if positions.windows(2).any(|pair| pair[0] > pair[1]) {
                found = Some(tensor.name().to_string());
            }
        }
    });
    found
}

/// Finds a reduction variable whose result would have to be distributed
/// across several outputs: a non-free variable reaching two or more
/// accesses at positions stored sparsely.
pub(crate) fn find_distribution(free_vars: &[IndexVar], expr: &IndexExpr) -> Option<IndexVar> {
    let mut sparse_accesses: HashMap<IndexVar, usize> = HashMap::new();
    let mut found = None;

    expr.walk(&mut |node| {
        if found.is_some() {
            return;
        }
        if let ExprKind::Access { tensor, indices } = node.kind() {
            let format = tensor.format();
            // Reduction vars hitting a sparse level in this access, each
            // counted once per access.
            let mut reduced_here: Vec<&IndexVar> = Vec::new();
            for (dim, var) in indices.iter().enumerate() {
                if free_vars.contains(var) || reduced_here.contains(&var) {
                    continue;
                }
                let sparse = format
                    .level_of_dimension(dim)
                    .map(|level| format.level_types()[level] == LevelType::Sparse)
                    .unwrap_or(false);
                if sparse {
                    reduced_here.push(var);
                }
            }
            for var in reduced_here {
                let count = sparse_accesses.entry(var.clone()).or_insert(0);
                *count += 1;
                if *count >= 2 {
                    found = Some(var.clone());
                    return;
                }
            }
        }
    });
    found
}
