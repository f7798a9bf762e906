//! One time step of a circuit
//!
//! Gantree: L1_Circuit → Layer
//!
//! A [`Layer`] maps each qubit to the single physical operation occupying it
//! and keeps annotation markers in a separate list. Every qubit touched by a
//! multi-qubit operation maps to the same shared [`Operation`].

use crate::error::{CrumbleError, CrumbleResult};
use crate::operation::Operation;
use crate::types::{FrameValue, Pauli, QubitId};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Qubit-to-operation map plus markers
/// Gantree: Layer // 레이어
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    /// Occupying operation per qubit, in insertion order
    id_ops: IndexMap<QubitId, Arc<Operation>>,
    /// Annotations; never occupy a qubit slot
    markers: Vec<Operation>,
}

impl Layer {
    /// Create an empty layer
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Check if the layer holds no operations and no markers
    pub fn is_empty(&self) -> bool {
        self.id_ops.is_empty() && self.markers.is_empty()
    }

    /// Operation occupying `qubit`
    pub fn get(&self, qubit: QubitId) -> Option<&Operation> {
        self.id_ops.get(&qubit).map(|op| op.as_ref())
    }

    /// Marker annotations
    pub fn markers(&self) -> &[Operation] {
        &self.markers
    }

    /// Every qubit touched by an operation or marker
    pub fn touched_qubits(&self) -> HashSet<QubitId> {
        self.id_ops
            .keys()
            .copied()
            .chain(self.markers.iter().flat_map(|m| m.id_targets.iter().copied()))
            .collect()
    }

    /// Each distinct physical operation once (at its primary target), then all markers
    /// Gantree: iter_gates_and_markers() -> impl Iterator // 순회
    pub fn iter_gates_and_markers(&self) -> impl Iterator<Item = &Operation> + '_ {
        self.iter_gates().chain(self.markers.iter())
    }

    /// Each distinct physical operation once
    pub fn iter_gates(&self) -> impl Iterator<Item = &Operation> + '_ {
        self.id_ops
            .iter()
            .filter(|(q, op)| op.primary() == Some(**q))
            .map(|(_, op)| op.as_ref())
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Insert an operation
    /// Gantree: put(op, allow_overwrite) -> Result // 삽입
    ///
    /// Physical operations claim every target. A conflicting occupant is
    /// evicted from all of its qubits when `allow_overwrite`, otherwise the
    /// insertion fails with [`CrumbleError::Collision`] and the layer is left
    /// unchanged. MARKX/MARKY/MARKZ replace any Pauli marker with the same
    /// slot index on the same qubit.
    pub fn put(&mut self, op: Operation, allow_overwrite: bool) -> CrumbleResult<()> {
        if op.is_marker() {
            self.put_marker(op);
            return Ok(());
        }

        let mut seen = HashSet::new();
        for &q in &op.id_targets {
            if !seen.insert(q) {
                return Err(CrumbleError::Collision { qubit: q });
            }
        }

        let conflicts: Vec<QubitId> = op
            .id_targets
            .iter()
            .copied()
            .filter(|q| self.id_ops.contains_key(q))
            .collect();
        if let Some(&qubit) = conflicts.first() {
            if !allow_overwrite {
                return Err(CrumbleError::Collision { qubit });
            }
            for q in conflicts {
                self.evict(q);
            }
        }

        let shared = Arc::new(op);
        for &q in &shared.id_targets {
            self.id_ops.insert(q, Arc::clone(&shared));
        }
        Ok(())
    }

    fn put_marker(&mut self, op: Operation) {
        if op.marker_pauli().is_some() {
            let slot = op.marker_index();
            self.markers.retain(|m| {
                !(m.marker_pauli().is_some()
                    && m.marker_index() == slot
                    && m.id_targets.iter().any(|q| op.touches(*q)))
            });
        }
        self.markers.push(op);
    }

    /// Remove the operation at `qubit` from all of its targets
    fn evict(&mut self, qubit: QubitId) -> Option<Arc<Operation>> {
        let op = self.id_ops.shift_remove(&qubit)?;
        for q in &op.id_targets {
            self.id_ops.shift_remove(q);
        }
        Some(op)
    }

    /// Remove whatever occupies `qubit`, including markers touching it
    /// Gantree: id_pop_at(qubit) -> Option<Operation> // 제거
    ///
    /// Returns the physical operation if there was one, otherwise the last
    /// removed marker.
    pub fn id_pop_at(&mut self, qubit: QubitId) -> Option<Operation> {
        let popped = self.evict(qubit).map(|op| op.as_ref().clone());
        let mut removed_marker = None;
        let mut kept = Vec::with_capacity(self.markers.len());
        for m in self.markers.drain(..) {
            if m.touches(qubit) {
                removed_marker = Some(m);
            } else {
                kept.push(m);
            }
        }
        self.markers = kept;
        popped.or(removed_marker)
    }

    // ========================================================================
    // Scalar Propagation
    // ========================================================================

    /// Push a sparse basis assignment through this layer
    /// Gantree: id_pauli_frame_after(before, marker_index) -> Result<Map> // 스칼라 전파
    ///
    /// Each physical operation rewrites the bases of its targets via the
    /// gate's scalar rule (absent qubits read as `I`). Then every MARKX/MARKY/MARKZ
    /// marker with slot `marker_index` multiplies its Pauli in. Plain identity
    /// results are dropped from the output; error-tagged ones are kept.
    pub fn id_pauli_frame_after(
        &self,
        before: &BTreeMap<QubitId, Pauli>,
        marker_index: u32,
    ) -> CrumbleResult<BTreeMap<QubitId, FrameValue>> {
        let mut after: BTreeMap<QubitId, FrameValue> = before
            .iter()
            .map(|(&q, &p)| (q, FrameValue::Basis(p)))
            .collect();

        for op in self.iter_gates() {
            let group = op.gate.group_size(op.id_targets.len()).max(1);
            for targets in op.id_targets.chunks(group) {
                let input: Vec<Pauli> = targets
                    .iter()
                    .map(|q| before.get(q).copied().unwrap_or_default())
                    .collect();
                let transition = op.gate.scalar_transition(&input)?;
                for (&q, &p) in targets.iter().zip(&transition.bases) {
                    let value = if transition.error {
                        FrameValue::Error(p)
                    } else {
                        FrameValue::Basis(p)
                    };
                    after.insert(q, value);
                }
            }
        }

        for marker in &self.markers {
            let Some(pauli) = marker.marker_pauli() else {
                continue;
            };
            if marker.marker_index() != Some(marker_index) {
                continue;
            }
            for &q in &marker.id_targets {
                let value = after.get(&q).copied().unwrap_or_default();
                after.insert(q, value.times(pauli));
            }
        }

        after.retain(|_, v| *v != FrameValue::Basis(Pauli::I));
        Ok(after)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str, args: Vec<f64>, targets: Vec<QubitId>) -> Operation {
        Operation::named(name, args, targets).unwrap()
    }

    fn bases(pairs: &[(QubitId, Pauli)]) -> BTreeMap<QubitId, Pauli> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_put_shares_operation() {
        let mut layer = Layer::new();
        layer.put(op("CX", vec![], vec![2, 5]), false).unwrap();
        assert_eq!(layer.get(2), layer.get(5));
        assert_eq!(layer.iter_gates_and_markers().count(), 1);
    }

    #[test]
    fn test_put_collision_strict() {
        let mut layer = Layer::new();
        layer.put(op("H", vec![], vec![0]), false).unwrap();
        let err = layer.put(op("CX", vec![], vec![1, 0]), false).unwrap_err();
        assert_eq!(err, CrumbleError::Collision { qubit: 0 });
        assert!(err.is_recoverable());
        assert!(layer.get(1).is_none());
    }

    #[test]
    fn test_put_overwrite_evicts_all_targets() {
        let mut layer = Layer::new();
        layer.put(op("CX", vec![], vec![0, 1]), false).unwrap();
        layer.put(op("H", vec![], vec![1]), true).unwrap();
        assert!(layer.get(0).is_none());
        assert_eq!(layer.get(1).map(|o| o.name()), Some("H"));
    }

    #[test]
    fn test_put_rejects_repeated_target() {
        let mut layer = Layer::new();
        assert!(layer.put(op("CX", vec![], vec![3, 3]), true).is_err());
    }

    #[test]
    fn test_markers_do_not_evict() {
        let mut layer = Layer::new();
        layer.put(op("H", vec![], vec![0]), false).unwrap();
        layer.put(op("MARKX", vec![0.0], vec![0]), false).unwrap();
        layer.put(op("DETECTOR", vec![0.0], vec![0]), false).unwrap();
        assert_eq!(layer.get(0).map(|o| o.name()), Some("H"));
        assert_eq!(layer.markers().len(), 2);
    }

    #[test]
    fn test_marker_slot_exclusive() {
        let mut layer = Layer::new();
        layer.put(op("MARKX", vec![0.0], vec![0]), false).unwrap();
        layer.put(op("MARKX", vec![1.0], vec![0]), false).unwrap();
        layer.put(op("MARKZ", vec![0.0], vec![0]), false).unwrap();
        let names: Vec<(&str, Option<u32>)> = layer
            .markers()
            .iter()
            .map(|m| (m.name(), m.marker_index()))
            .collect();
        assert_eq!(names, vec![("MARKX", Some(1)), ("MARKZ", Some(0))]);
    }

    #[test]
    fn test_id_pop_at() {
        let mut layer = Layer::new();
        layer.put(op("CZ", vec![], vec![0, 1]), false).unwrap();
        layer.put(op("MARKY", vec![0.0], vec![1]), false).unwrap();
        let popped = layer.id_pop_at(1).unwrap();
        assert_eq!(popped.name(), "CZ");
        assert!(layer.is_empty());
        assert!(layer.id_pop_at(1).is_none());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut layer = Layer::new();
        layer.put(op("CX", vec![], vec![0, 1]), false).unwrap();
        layer.put(op("H", vec![], vec![2]), false).unwrap();
        layer.put(op("MARKX", vec![0.0], vec![3]), false).unwrap();
        let first: Vec<&str> = layer.iter_gates_and_markers().map(|o| o.name()).collect();
        let second: Vec<&str> = layer.iter_gates_and_markers().map(|o| o.name()).collect();
        assert_eq!(first, vec!["CX", "H", "MARKX"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_frame_after_gates() {
        let mut layer = Layer::new();
        layer.put(op("CX", vec![], vec![0, 1]), false).unwrap();
        layer.put(op("H", vec![], vec![2]), false).unwrap();
        let after = layer
            .id_pauli_frame_after(&bases(&[(0, Pauli::X), (2, Pauli::X), (4, Pauli::Y)]), 0)
            .unwrap();
        assert_eq!(after.get(&0), Some(&FrameValue::Basis(Pauli::X)));
        assert_eq!(after.get(&1), Some(&FrameValue::Basis(Pauli::X)));
        assert_eq!(after.get(&2), Some(&FrameValue::Basis(Pauli::Z)));
        assert_eq!(after.get(&4), Some(&FrameValue::Basis(Pauli::Y)));
    }

    #[test]
    fn test_frame_after_measurement_error() {
        let mut layer = Layer::new();
        layer.put(op("M", vec![], vec![0, 1]), false).unwrap();
        let after = layer
            .id_pauli_frame_after(&bases(&[(0, Pauli::X), (1, Pauli::Z)]), 0)
            .unwrap();
        assert_eq!(after.get(&0), Some(&FrameValue::Error(Pauli::X)));
        assert_eq!(after.get(&1), Some(&FrameValue::Basis(Pauli::Z)));
    }

    #[test]
    fn test_frame_after_markers_match_slot() {
        let mut layer = Layer::new();
        layer.put(op("MARKX", vec![0.0], vec![0]), false).unwrap();
        layer.put(op("MARKZ", vec![1.0], vec![1]), false).unwrap();
        layer.put(op("MARKZ", vec![0.0], vec![2]), false).unwrap();
        let after = layer.id_pauli_frame_after(&bases(&[(2, Pauli::Z)]), 0).unwrap();
        assert_eq!(after.get(&0), Some(&FrameValue::Basis(Pauli::X)));
        assert!(!after.contains_key(&1));
        // Z toggled by Z cancels to identity
        assert!(!after.contains_key(&2));
    }

    #[test]
    fn test_frame_after_product_measurement() {
        let mut layer = Layer::new();
        layer.put(op("MPP:XX", vec![], vec![0, 3]), false).unwrap();
        let after = layer.id_pauli_frame_after(&bases(&[(0, Pauli::Z)]), 0).unwrap();
        assert_eq!(after.get(&0), Some(&FrameValue::Error(Pauli::Z)));
        assert_eq!(after.get(&3), Some(&FrameValue::Error(Pauli::I)));
    }
}
