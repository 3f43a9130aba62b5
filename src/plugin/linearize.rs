//! Linearization of multiple inheritance.
//!
//! Strict mode is the C3 merge: every type precedes its ancestors, and the
//! local order of each type's bases is preserved. Best-effort mode takes a
//! depth-first walk and keeps the last occurrence of each type, which never
//! fails but may break local base order.

use crate::core::{Error, Result};
use crate::plugin::config::LinearizationPolicy;
use crate::plugin::descriptor::TypeHandle;
use tracing::warn;

/// Linearize the ancestors of a type with direct supertypes `bases`.
///
/// The result does not include the new type itself.
pub fn linearize(bases: &[TypeHandle], policy: LinearizationPolicy) -> Result<Vec<TypeHandle>> {
    match c3(bases) {
        Ok(order) => Ok(order),
        Err(err) if policy == LinearizationPolicy::BestEffort => {
            warn!(error = %err, "falling back to best-effort linearization");
            Ok(depth_first_last(bases))
        }
        Err(err) => Err(err),
    }
}

/// C3 linearization of `bases`.
pub fn c3(bases: &[TypeHandle]) -> Result<Vec<TypeHandle>> {
    let mut sequences: Vec<Vec<TypeHandle>> = bases.iter().map(TypeHandle::mro).collect();
    sequences.push(bases.to_vec());
    merge(sequences)
}

fn merge(mut sequences: Vec<Vec<TypeHandle>>) -> Result<Vec<TypeHandle>> {
    let mut result = Vec::new();
    // Sequences are consumed from the front; keep them reversed so pop() is the head.
    for seq in sequences.iter_mut() {
        seq.reverse();
    }

    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Ok(result);
        }

        let candidate = sequences
            .iter()
            .filter_map(|seq| seq.last())
            .find(|head| {
                !sequences
                    .iter()
                    .any(|seq| seq[..seq.len() - 1].contains(*head))
            })
            .cloned();

        let Some(next) = candidate else {
            let mut heads: Vec<String> = sequences
                .iter()
                .filter_map(|seq| seq.last())
                .map(|head| head.name().to_string())
                .collect();
            heads.sort();
            heads.dedup();
            return Err(Error::Composition(format!(
                "cannot create a consistent linearization for bases {}",
                heads.join(", ")
            )));
        };

        for seq in sequences.iter_mut() {
            if seq.last() == Some(&next) {
                seq.pop();
            }
        }
        result.push(next);
    }
}

/// Depth-first walk of each base's linearization, keeping the last occurrence.
pub fn depth_first_last(bases: &[TypeHandle]) -> Vec<TypeHandle> {
    let walk: Vec<TypeHandle> = bases.iter().flat_map(TypeHandle::mro).collect();
    walk.iter()
        .enumerate()
        .filter(|&(i, ty)| !walk[i + 1..].contains(ty))
        .map(|(_, ty)| ty.clone())
        .collect()
}
