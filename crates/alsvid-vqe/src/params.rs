//! Initial parameter seeding.
//!
//! Fresh runs start from the dimer product state: a small uniform value on
//! every gate component, with a layer-position-dependent offset on the six
//! edges of the initial Hamiltonian to break the symmetry between layers.

use crate::variant::{COMPONENTS_PER_EDGE, EDGES_PER_LAYER, PARAMS_PER_LAYER};

/// Edges carrying the dimer bias.
const INITIAL_HAMILTONIAN_EDGES: [usize; 6] = [0, 2, 4, 6, 8, 10];

/// Seed one value per (layer, edge, component) for a `layers`-deep ansatz.
pub fn initial_parameters(layers: usize) -> Vec<f64> {
    let mut theta = Vec::with_capacity(layers * PARAMS_PER_LAYER);
    let sqp = (layers as f64).sqrt();
    for layer in 0..layers {
        let pa = 1.0 / layers as f64;
        let pb = (((1 + layer) as f64 / sqp).floor() - 0.5) / sqp / layers as f64;
        for edge in 0..EDGES_PER_LAYER {
            let p = if INITIAL_HAMILTONIAN_EDGES.contains(&edge) {
                pb
            } else {
                pa
            };
            for _ in 0..COMPONENTS_PER_EDGE {
                theta.push(p);
            }
        }
    }
    theta
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_length_scales_with_layers() {
        for layers in 1..=4 {
            assert_eq!(initial_parameters(layers).len(), layers * PARAMS_PER_LAYER);
        }
    }

    #[test]
    fn test_single_layer_values() {
        let theta = initial_parameters(1);
        // Generic edges: 1/layers = 1; dimer edges: (⌊1⌋ − ½)/1/1 = 0.5.
        assert_abs_diff_eq!(theta[0], 0.5, epsilon = 1e-12); // edge 0, dimer
        assert_abs_diff_eq!(theta[3], 1.0, epsilon = 1e-12); // edge 1, generic
        assert_abs_diff_eq!(theta[6], 0.5, epsilon = 1e-12); // edge 2, dimer
    }

    #[test]
    fn test_layer_offset_breaks_symmetry() {
        let theta = initial_parameters(4);
        // Dimer-edge value of layer 0 vs layer 3 must differ.
        let layer0 = theta[0];
        let layer3 = theta[3 * PARAMS_PER_LAYER];
        assert!((layer0 - layer3).abs() > 1e-9);
        // All three components of one edge share the value.
        assert_eq!(theta[0], theta[1]);
        assert_eq!(theta[1], theta[2]);
    }
}
