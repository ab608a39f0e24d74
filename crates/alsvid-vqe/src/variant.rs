//! Ansatz variants for symmetry averaging and resource extrapolation.
//!
//! Each variant is one concrete construction of the ansatz, identified by a
//! lattice rotation (symmetry averaging) and a fold level (CNOT
//! multiplication for zero-noise extrapolation). The engine never builds
//! the circuits themselves — it pairs each variant with an opaque
//! [`EvalUnit`] supplied by the problem definition and keeps the pairing
//! order deterministic so raw service results can be reduced positionally.

use serde::{Deserialize, Serialize};

use alsvid_hal::EvalUnit;

use crate::error::{VqeError, VqeResult};

/// Sites on the outer ring of the lattice; rotations are ring positions.
pub const RING_SITES: usize = 12;

/// Two-site interaction gates per ansatz layer.
pub const EDGES_PER_LAYER: usize = 18;

/// Free parameters per gate.
pub const COMPONENTS_PER_EDGE: usize = 3;

/// Parameters per ansatz layer.
pub const PARAMS_PER_LAYER: usize = EDGES_PER_LAYER * COMPONENTS_PER_EDGE;

/// Rotation subset used for full symmetry averaging.
pub const FULL_ROTATIONS: [usize; 4] = [0, 3, 6, 9];

/// Fold levels encoding the CNOT multipliers 1, 3, 5.
pub const FULL_FOLDS: [usize; 3] = [0, 1, 2];

/// CNOT multiplier encoded by a fold level: each entangling gate is
/// repeated `2·fold + 1` times.
pub fn cnot_multiplier(fold: usize) -> u32 {
    2 * fold as u32 + 1
}

/// One (rotation, fold) ansatz construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    /// Ring rotation applied to the ansatz.
    pub rotation: usize,
    /// Fold level; see [`cnot_multiplier`].
    pub fold: usize,
}

impl Variant {
    /// The CNOT multiplier of this variant.
    pub fn multiplier(&self) -> u32 {
        cnot_multiplier(self.fold)
    }
}

/// The Cartesian product of a rotation subset and a fold subset.
///
/// Iteration order is rotation-major with folds ascending within each
/// rotation; every consumer of raw result blocks relies on this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSet {
    rotations: Vec<usize>,
    folds: Vec<usize>,
}

impl VariantSet {
    /// Build a set from explicit subsets. Folds are normalized to
    /// ascending order; duplicates are dropped.
    pub fn new(rotations: Vec<usize>, mut folds: Vec<usize>) -> Self {
        debug_assert!(rotations.iter().all(|&r| r < RING_SITES));
        folds.sort_unstable();
        folds.dedup();
        Self { rotations, folds }
    }

    /// The full mitigation set: rotations {0,3,6,9} × folds {0,1,2}.
    pub fn full() -> Self {
        Self::new(FULL_ROTATIONS.to_vec(), FULL_FOLDS.to_vec())
    }

    /// Build from mitigation switches: `rotation_averaging` off keeps only
    /// rotation 0, `extrapolation` off keeps only fold 0.
    pub fn from_mitigation(rotation_averaging: bool, extrapolation: bool) -> Self {
        let rotations = if rotation_averaging {
            FULL_ROTATIONS.to_vec()
        } else {
            vec![0]
        };
        let folds = if extrapolation {
            FULL_FOLDS.to_vec()
        } else {
            vec![0]
        };
        Self::new(rotations, folds)
    }

    /// Rotation subset.
    pub fn rotations(&self) -> &[usize] {
        &self.rotations
    }

    /// Fold subset, ascending.
    pub fn folds(&self) -> &[usize] {
        &self.folds
    }

    /// Number of variants.
    pub fn len(&self) -> usize {
        self.rotations.len() * self.folds.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Variants in the canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Variant> + '_ {
        self.rotations.iter().flat_map(move |&rotation| {
            self.folds.iter().map(move |&fold| Variant { rotation, fold })
        })
    }
}

/// Ready-to-evaluate ansatz variants paired with the variant set that
/// produced them, in the canonical variant order.
#[derive(Debug, Clone)]
pub struct AnsatzSet {
    variants: VariantSet,
    units: Vec<EvalUnit>,
}

impl AnsatzSet {
    /// Pair externally built units with their variant set.
    ///
    /// The units must come in the canonical variant order; only the count
    /// can be checked here.
    pub fn new(variants: VariantSet, units: Vec<EvalUnit>) -> VqeResult<Self> {
        if units.len() != variants.len() {
            return Err(VqeError::Config(format!(
                "expected {} evaluation units for the variant set, got {}",
                variants.len(),
                units.len()
            )));
        }
        Ok(Self { variants, units })
    }

    /// Label one opaque unit per variant of a `layers`-deep ansatz.
    ///
    /// The payload carries the variant coordinates so that a service which
    /// builds circuits on demand can reconstruct the request.
    pub fn labelled(variants: VariantSet, layers: usize) -> Self {
        let units = variants
            .iter()
            .map(|v| {
                EvalUnit::new(format!(
                    "hva-l{layers}-rot{}-m{}",
                    v.rotation,
                    v.multiplier()
                ))
                .with_payload(serde_json::json!({
                    "layers": layers,
                    "rotation": v.rotation,
                    "fold": v.fold,
                    "multiplier": v.multiplier(),
                }))
            })
            .collect();
        Self { variants, units }
    }

    /// The variant set.
    pub fn variants(&self) -> &VariantSet {
        &self.variants
    }

    /// The units, in canonical variant order.
    pub fn units(&self) -> &[EvalUnit] {
        &self.units
    }
}
