//! Propagated Pauli frames over a whole circuit
//!
//! Gantree: L2_Propagation → PropagatedPauliFrames
//!
//! Two ways to fill the result:
//!
//! - [`PropagatedPauliFrames::from_circuit`] pushes a marker slot forward
//!   layer by layer through the scalar gate rules.
//! - [`PropagatedPauliFrames::from_measurements`] runs backward from a set of
//!   measurement results on the vector frame register, giving the region that
//!   must be stabilized for those results to be deterministic.

use crate::frame_key::FrameKey;
use crate::frame_layer::{Crossing, CrossingColor, PropagatedPauliFrameLayer};
use crumble_core::{
    Circuit, CrumbleError, CrumbleResult, FrameValue, MeasurementOffset, Pauli, PauliFrame,
    QubitId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

static EMPTY_LAYER: PropagatedPauliFrameLayer = PropagatedPauliFrameLayer::empty();

/// Snapshots keyed by half-integer layer position
/// Gantree: PropagatedPauliFrames // 전파 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagatedPauliFrames {
    /// Non-empty snapshots only
    id_layers: BTreeMap<FrameKey, PropagatedPauliFrameLayer>,
}

impl PropagatedPauliFrames {
    /// Wrap existing snapshots; empty ones are dropped
    pub fn new(mut id_layers: BTreeMap<FrameKey, PropagatedPauliFrameLayer>) -> Self {
        id_layers.retain(|_, layer| !layer.is_empty());
        Self { id_layers }
    }

    // ========================================================================
    // Forward Propagation
    // ========================================================================

    /// Propagate marker slot `marker_index` forward through `circuit`
    /// Gantree: from_circuit(circuit, marker_index) -> Result<Self> // 순방향 전파
    ///
    /// Bases after layer `k` land at `k + 0.5`. Errors and crossings seen
    /// while applying layer `k` land at `k`. An errored qubit is dropped from
    /// the bases carried into the next layer.
    pub fn from_circuit(circuit: &Circuit, marker_index: u32) -> CrumbleResult<Self> {
        let mut id_layers = BTreeMap::new();
        let mut before: BTreeMap<QubitId, Pauli> = BTreeMap::new();

        for (k, layer) in circuit.layers().iter().enumerate() {
            let after = layer.id_pauli_frame_after(&before, marker_index)?;

            let mut bases = BTreeMap::new();
            let mut errors = BTreeSet::new();
            for (&q, &value) in &after {
                match value {
                    FrameValue::Error(_) => {
                        errors.insert(q);
                    }
                    FrameValue::Basis(p) => {
                        bases.insert(q, p);
                    }
                }
            }

            let pairs = layer.iter_gates().flat_map(|op| {
                let group = op.gate.group_size(op.id_targets.len()).max(1);
                op.id_targets.chunks(group)
            });
            let crossings = find_crossings(pairs, &before, &after);

            let k = k as i64;
            if !bases.is_empty() {
                id_layers.insert(
                    FrameKey::after(k),
                    PropagatedPauliFrameLayer::new(bases.clone(), BTreeSet::new(), Vec::new()),
                );
            }
            if !errors.is_empty() || !crossings.is_empty() {
                log::trace!(
                    "slot {} layer {}: {} errors, {} crossings",
                    marker_index,
                    k,
                    errors.len(),
                    crossings.len()
                );
                id_layers.insert(
                    FrameKey::at(k),
                    PropagatedPauliFrameLayer::new(BTreeMap::new(), errors, crossings),
                );
            }
            before = bases;
        }

        log::debug!(
            "Propagated marker slot {} through {} layers: {} snapshots",
            marker_index,
            circuit.num_layers(),
            id_layers.len()
        );
        Ok(Self { id_layers })
    }

    // ========================================================================
    // Backward Propagation
    // ========================================================================

    /// Propagate the observables of measurement results backward
    /// Gantree: from_measurements(circuit, offsets) -> Result<Self> // 역방향 전파
    ///
    /// `offsets` are negative record offsets (`-1` is the last result). Each
    /// selected result's observable is injected where it was measured, then
    /// carried backward through the inverse of every earlier operation. Bases
    /// before layer `k` land at `k - 0.5`; components a reset or measurement
    /// would destroy are reported as errors at `k`.
    pub fn from_measurements(
        circuit: &Circuit,
        offsets: &[MeasurementOffset],
    ) -> CrumbleResult<Self> {
        let sites = circuit.measurement_sites();
        let total = sites.len();

        let mut selected: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &offset in offsets {
            let index = total as i64 + offset;
            if offset >= 0 || index < 0 {
                return Err(CrumbleError::MeasurementOutOfRange {
                    offset,
                    count: total,
                });
            }
            let site = &sites[index as usize];
            selected.entry(site.layer).or_default().push(index as usize);
        }

        let mut frame = PauliFrame::new(1, circuit.num_qubits())?;
        let mut id_layers = BTreeMap::new();

        for (k, layer) in circuit.layers().iter().enumerate().rev() {
            let ops: Vec<_> = layer.iter_gates().collect();
            for op in ops.into_iter().rev() {
                frame.undo_gate(&op.gate, &op.id_targets);
            }
            for &index in selected.get(&k).into_iter().flatten() {
                let site = &sites[index];
                let paulis: Vec<Pauli> = site.bases.iter().map(|b| b.pauli()).collect();
                frame.inject(&paulis, &site.qubits, 1);
            }

            let mut bases = BTreeMap::new();
            let mut errors = BTreeSet::new();
            for q in 0..frame.num_qubits() {
                match frame.value(0, q) {
                    FrameValue::Error(_) => {
                        errors.insert(q);
                    }
                    FrameValue::Basis(p) if !p.is_identity() => {
                        bases.insert(q, p);
                    }
                    FrameValue::Basis(_) => {}
                }
            }

            let k = k as i64;
            if !errors.is_empty() {
                log::trace!("measurements {:?} layer {}: {} errors", offsets, k, errors.len());
                id_layers.insert(
                    FrameKey::at(k),
                    PropagatedPauliFrameLayer::new(BTreeMap::new(), errors, Vec::new()),
                );
            }
            if !bases.is_empty() {
                id_layers.insert(
                    FrameKey::before(k),
                    PropagatedPauliFrameLayer::new(bases, BTreeSet::new(), Vec::new()),
                );
            }
            frame.clear_flags();
        }

        log::debug!(
            "Propagated {} measurement(s) backward: {} snapshots",
            offsets.len(),
            id_layers.len()
        );
        Ok(Self { id_layers })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot at `key`; an empty snapshot when nothing was recorded there
    /// Gantree: at_layer(key) -> &PropagatedPauliFrameLayer // 조회
    pub fn at_layer(&self, key: FrameKey) -> &PropagatedPauliFrameLayer {
        self.id_layers.get(&key).unwrap_or(&EMPTY_LAYER)
    }

    /// Snapshot at a float key such as `1.5`
    pub fn at_layer_f64(&self, key: f64) -> CrumbleResult<&PropagatedPauliFrameLayer> {
        Ok(self.at_layer(FrameKey::from_f64(key)?))
    }

    /// Check if any snapshot has a basis or error on one of `qids`
    pub fn touches_qid_set(&self, qids: &BTreeSet<QubitId>) -> bool {
        self.id_layers.values().any(|layer| layer.touches_qid_set(qids))
    }

    /// Key-wise union; on a basis conflict `other` wins
    pub fn merge(&self, other: &PropagatedPauliFrames) -> PropagatedPauliFrames {
        let mut id_layers = self.id_layers.clone();
        for (&key, layer) in &other.id_layers {
            let merged = match id_layers.get(&key) {
                Some(existing) => existing.merged_with(layer),
                None => layer.clone(),
            };
            id_layers.insert(key, merged);
        }
        PropagatedPauliFrames { id_layers }
    }

    /// Check if no snapshot was recorded
    pub fn is_empty(&self) -> bool {
        self.id_layers.is_empty()
    }

    /// Number of recorded snapshots
    pub fn len(&self) -> usize {
        self.id_layers.len()
    }

    /// Recorded snapshots in key order
    pub fn iter(&self) -> impl Iterator<Item = (FrameKey, &PropagatedPauliFrameLayer)> + '_ {
        self.id_layers.iter().map(|(&k, v)| (k, v))
    }

    /// Recorded keys in order
    pub fn keys(&self) -> impl Iterator<Item = FrameKey> + '_ {
        self.id_layers.keys().copied()
    }

    /// Serialize to JSON (keys become strings such as `"1.5"`)
    pub fn to_json(&self) -> CrumbleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> CrumbleResult<Self> {
        let frames: PropagatedPauliFrames = serde_json::from_str(json)?;
        Ok(Self::new(frames.id_layers))
    }
}

/// Two-qubit target groups whose bases changed
fn find_crossings<'a>(
    target_lists: impl Iterator<Item = &'a [QubitId]>,
    before: &BTreeMap<QubitId, Pauli>,
    after: &BTreeMap<QubitId, FrameValue>,
) -> Vec<Crossing> {
    let b = |q: QubitId| before.get(&q).copied().unwrap_or_default();
    let a = |q: QubitId| after.get(&q).map(|v| v.pauli()).unwrap_or_default();

    let mut crossings = Vec::new();
    for targets in target_lists {
        let [q1, q2] = targets else {
            continue;
        };
        let (q1, q2) = (*q1, *q2);
        if (b(q1), b(q2)) == (a(q1), a(q2)) {
            continue;
        }
        let involved: BTreeSet<Pauli> = [b(q1), b(q2), a(q1), a(q2)].into_iter().collect();
        crossings.push(Crossing {
            q1,
            q2,
            color: CrossingColor::from_bases(&involved),
        });
    }
    crossings
}

impl fmt::Display for PropagatedPauliFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, layer) in &self.id_layers {
            writeln!(f, "{}: {}", key, layer)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crumble_core::{CircuitBuilder, Operation};
    use proptest::prelude::*;

    fn bases_at(frames: &PropagatedPauliFrames, key: f64) -> Vec<(QubitId, Pauli)> {
        frames
            .at_layer_f64(key)
            .unwrap()
            .bases()
            .iter()
            .map(|(&q, &p)| (q, p))
            .collect()
    }

    #[test]
    fn test_backward_single_qubit() {
        let circuit = Circuit::from_stim("R 0\nTICK\nH 0\nTICK\nMX 0").unwrap();
        let frames = PropagatedPauliFrames::from_measurements(&circuit, &[-1]).unwrap();
        assert_eq!(bases_at(&frames, 0.5), vec![(0, Pauli::Z)]);
        assert_eq!(bases_at(&frames, 1.5), vec![(0, Pauli::X)]);
        assert!(frames.at_layer(FrameKey::at(0)).errors().is_empty());
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_backward_reports_wrong_reset() {
        let circuit = Circuit::from_stim("RX 0\nTICK\nH 0\nTICK\nMX 0").unwrap();
        let frames = PropagatedPauliFrames::from_measurements(&circuit, &[-1]).unwrap();
        let errors: Vec<_> = frames.at_layer(FrameKey::at(0)).errors().iter().copied().collect();
        assert_eq!(errors, vec![0]);
        assert_eq!(bases_at(&frames, 0.5), vec![(0, Pauli::Z)]);
        assert_eq!(bases_at(&frames, 1.5), vec![(0, Pauli::X)]);
    }

    #[test]
    fn test_backward_through_cx() {
        let circuit = Circuit::from_stim("RX 0 1\nTICK\nCX 0 1\nTICK\nMX 0").unwrap();
        let frames = PropagatedPauliFrames::from_measurements(&circuit, &[-1]).unwrap();
        assert_eq!(bases_at(&frames, 0.5), vec![(0, Pauli::X), (1, Pauli::X)]);
        assert_eq!(bases_at(&frames, 1.5), vec![(0, Pauli::X)]);
        assert!(frames.at_layer(FrameKey::at(0)).errors().is_empty());
        assert!(frames.iter().all(|(_, l)| l.crossings().is_empty()));
    }

    #[test]
    fn test_backward_offset_out_of_range() {
        let circuit = Circuit::from_stim("M 0").unwrap();
        assert!(matches!(
            PropagatedPauliFrames::from_measurements(&circuit, &[-2]),
            Err(CrumbleError::MeasurementOutOfRange { offset: -2, count: 1 })
        ));
        assert!(PropagatedPauliFrames::from_measurements(&circuit, &[0]).is_err());
    }

    #[test]
    fn test_backward_parity_of_two_results() {
        // Z0 Z1 parity after CX 0 1 only involves qubit 1 before it
        let circuit = Circuit::from_stim("R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1").unwrap();
        let frames = PropagatedPauliFrames::from_measurements(&circuit, &[-1, -2]).unwrap();
        assert_eq!(bases_at(&frames, 1.5), vec![(0, Pauli::Z), (1, Pauli::Z)]);
        assert_eq!(bases_at(&frames, 0.5), vec![(1, Pauli::Z)]);
    }

    fn agreement_circuit() -> Circuit {
        CircuitBuilder::new(2)
            .reset(0)
            .reset(1)
            .marker(Pauli::X, 0, 0)
            .marker(Pauli::Z, 0, 1)
            .tick()
            .h(0)
            .tick()
            .cx(0, 1)
            .tick()
            .measure(1)
            .build_validated()
            .unwrap()
    }

    #[test]
    fn test_forward_marker() {
        let circuit = agreement_circuit();
        let frames = PropagatedPauliFrames::from_circuit(&circuit, 0).unwrap();
        assert_eq!(bases_at(&frames, 0.5), vec![(0, Pauli::X), (1, Pauli::Z)]);
        assert_eq!(bases_at(&frames, 1.5), vec![(0, Pauli::Z), (1, Pauli::Z)]);
        assert_eq!(bases_at(&frames, 2.5), vec![(1, Pauli::Z)]);
        assert!(PropagatedPauliFrames::from_circuit(&circuit, 1).unwrap().is_empty());
    }

    #[test]
    fn test_forward_and_backward_agree() {
        let circuit = agreement_circuit();
        let forward = PropagatedPauliFrames::from_circuit(&circuit, 0).unwrap();
        let backward = PropagatedPauliFrames::from_measurements(&circuit, &[-1]).unwrap();
        for key in [0.5, 1.5, 2.5] {
            assert_eq!(bases_at(&forward, key), bases_at(&backward, key), "key {}", key);
        }
    }

    #[test]
    fn test_forward_crossing() {
        let circuit = CircuitBuilder::new(2)
            .reset(0)
            .reset(1)
            .marker(Pauli::X, 0, 0)
            .tick()
            .cx(0, 1)
            .build_validated()
            .unwrap();
        let frames = PropagatedPauliFrames::from_circuit(&circuit, 0).unwrap();
        let crossings = frames.at_layer(FrameKey::at(1)).crossings();
        assert_eq!(
            crossings,
            &[Crossing {
                q1: 0,
                q2: 1,
                color: CrossingColor::X
            }]
        );
        assert_eq!(bases_at(&frames, 1.5), vec![(0, Pauli::X), (1, Pauli::X)]);
    }

    #[test]
    fn test_forward_crossings_of_fused_targets() {
        let start = || {
            CircuitBuilder::new(4)
                .marker(Pauli::X, 0, 0)
                .marker(Pauli::X, 0, 2)
                .tick()
        };
        let split = start().cx(0, 1).cx(2, 3).build_validated().unwrap();
        let fused = start().gate("CX", &[0, 1, 2, 3]).build_validated().unwrap();
        assert_eq!(fused.layers()[1].iter_gates().count(), 1);

        let split = PropagatedPauliFrames::from_circuit(&split, 0).unwrap();
        let fused = PropagatedPauliFrames::from_circuit(&fused, 0).unwrap();
        let expected = [
            Crossing {
                q1: 0,
                q2: 1,
                color: CrossingColor::X,
            },
            Crossing {
                q1: 2,
                q2: 3,
                color: CrossingColor::X,
            },
        ];
        assert_eq!(fused.at_layer(FrameKey::at(1)).crossings(), &expected);
        assert_eq!(fused, split);
    }

    #[test]
    fn test_forward_error_drops_qubit() {
        // X hits a Z measurement: flagged, then gone from later layers
        let circuit = CircuitBuilder::new(1)
            .marker(Pauli::X, 0, 0)
            .tick()
            .measure(0)
            .tick()
            .h(0)
            .build_validated()
            .unwrap();
        let frames = PropagatedPauliFrames::from_circuit(&circuit, 0).unwrap();
        assert!(frames.at_layer(FrameKey::at(1)).errors().contains(&0));
        assert!(frames.at_layer(FrameKey::after(2)).is_empty());
    }

    #[test]
    fn test_at_layer_unset_key_is_empty() {
        let frames = PropagatedPauliFrames::default();
        assert!(frames.at_layer(FrameKey::after(7)).is_empty());
        assert!(frames.at_layer_f64(0.3).is_err());
    }

    #[test]
    fn test_edit_with_overwrite_changes_frames() {
        let circuit = agreement_circuit();
        let op = Operation::named("S", Vec::new(), vec![0]).unwrap();
        let edited = circuit.with_operation(1, op, true).unwrap();
        let frames = PropagatedPauliFrames::from_circuit(&edited, 0).unwrap();
        assert_eq!(bases_at(&frames, 1.5), vec![(0, Pauli::Y), (1, Pauli::Z)]);
        // The original is untouched
        let original = PropagatedPauliFrames::from_circuit(&circuit, 0).unwrap();
        assert_eq!(bases_at(&original, 1.5), vec![(0, Pauli::Z), (1, Pauli::Z)]);
    }

    #[test]
    fn test_merge_and_touches() {
        let circuit = agreement_circuit();
        let forward = PropagatedPauliFrames::from_circuit(&circuit, 0).unwrap();
        let other = PropagatedPauliFrames::new(
            [(
                FrameKey::after(0),
                PropagatedPauliFrameLayer::new([(0, Pauli::Y)].into_iter().collect(), BTreeSet::new(), Vec::new()),
            )]
            .into_iter()
            .collect(),
        );
        let merged = forward.merge(&other);
        assert_eq!(bases_at(&merged, 0.5), vec![(0, Pauli::Y), (1, Pauli::Z)]);
        assert!(merged.touches_qid_set(&[1].into_iter().collect()));
        assert!(!merged.touches_qid_set(&[5].into_iter().collect()));
    }

    #[test]
    fn test_json_roundtrip() {
        let frames = PropagatedPauliFrames::from_circuit(&agreement_circuit(), 0).unwrap();
        let json = frames.to_json().unwrap();
        assert!(json.contains("\"1.5\""));
        assert_eq!(PropagatedPauliFrames::from_json(&json).unwrap(), frames);
    }

    fn two_qubit_gate() -> impl Strategy<Value = (&'static str, bool)> {
        (prop::sample::select(vec!["CX", "CZ", "SWAP", "ISWAP"]), any::<bool>())
    }

    fn single_qubit_gate() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["H", "S", "SQRT_X", "C_XYZ"])
    }

    proptest! {
        #[test]
        fn prop_backward_matches_forward_on_one_qubit(gates in prop::collection::vec(single_qubit_gate(), 1..8)) {
            let mut builder = CircuitBuilder::new(1).reset(0).tick();
            for &g in &gates {
                builder = builder.gate(g, &[0]).tick();
            }
            let circuit = builder.measure(0).build_validated().unwrap();
            let backward = PropagatedPauliFrames::from_measurements(&circuit, &[-1]).unwrap();

            // Seed the forward run with what the measurement needs at layer 0
            let start = backward.at_layer(FrameKey::after(0)).basis(0);
            prop_assert!(!start.is_identity());
            let mut builder = CircuitBuilder::new(1).reset(0).marker(start, 0, 0).tick();
            for &g in &gates {
                builder = builder.gate(g, &[0]).tick();
            }
            let seeded = builder.measure(0).build_validated().unwrap();
            let forward = PropagatedPauliFrames::from_circuit(&seeded, 0).unwrap();

            for k in 0..=gates.len() as i64 {
                let key = FrameKey::after(k);
                prop_assert_eq!(forward.at_layer(key).basis(0), backward.at_layer(key).basis(0));
            }
        }

        #[test]
        fn prop_backward_matches_forward_on_two_qubits(
            gates in prop::collection::vec(two_qubit_gate(), 1..8),
            singles in prop::collection::vec(single_qubit_gate(), 1..8),
        ) {
            // Alternate two-qubit layers (either orientation) with single-qubit layers on 0
            let body = |mut builder: CircuitBuilder| {
                for (i, &(g, flip)) in gates.iter().enumerate() {
                    let targets = if flip { [1, 0] } else { [0, 1] };
                    builder = builder.gate(g, &targets).tick();
                    builder = builder.gate(singles[i % singles.len()], &[0]).tick();
                }
                builder
            };
            let circuit = body(CircuitBuilder::new(2).reset(0).reset(1).tick())
                .measure(0)
                .build_validated()
                .unwrap();
            let backward = PropagatedPauliFrames::from_measurements(&circuit, &[-1]).unwrap();

            let mut seeded = CircuitBuilder::new(2).reset(0).reset(1);
            for (&q, &p) in backward.at_layer(FrameKey::after(0)).bases() {
                seeded = seeded.marker(p, 0, q);
            }
            let seeded = body(seeded.tick()).measure(0).build_validated().unwrap();
            let forward = PropagatedPauliFrames::from_circuit(&seeded, 0).unwrap();

            for k in 0..=2 * gates.len() as i64 {
                let key = FrameKey::after(k);
                prop_assert_eq!(forward.at_layer(key).bases(), backward.at_layer(key).bases());
            }
        }
    }
}
