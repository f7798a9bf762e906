//! Propagation overlay for one circuit revision
//!
//! Gantree: L2_Propagation → PropagationOverlay
//!
//! Everything an editor draws on top of a circuit: forward propagation of
//! each marker slot, and backward propagation of each detector and
//! observable.

use crate::config::PropagationConfig;
use crate::propagated::PropagatedPauliFrames;
use crumble_core::{Circuit, CrumbleResult, Detector, QubitId};
use std::collections::{BTreeMap, BTreeSet};

/// Propagations computed for one circuit
/// Gantree: PropagationOverlay // 오버레이
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropagationOverlay {
    markers: BTreeMap<u32, PropagatedPauliFrames>,
    detectors: Vec<(Detector, PropagatedPauliFrames)>,
    observables: BTreeMap<u32, PropagatedPauliFrames>,
}

impl PropagationOverlay {
    /// Compute every propagation selected by `config`
    /// Gantree: compute(circuit, config) -> Result<Self> // 계산
    pub fn compute(circuit: &Circuit, config: &PropagationConfig) -> CrumbleResult<Self> {
        config.validate()?;
        let keep = |frames: &PropagatedPauliFrames| !(config.skip_empty_frames && frames.is_empty());

        let mut markers = BTreeMap::new();
        for slot in 0..config.marker_slots {
            let frames = PropagatedPauliFrames::from_circuit(circuit, slot)?;
            if keep(&frames) {
                markers.insert(slot, frames);
            }
        }

        let mut detectors = Vec::new();
        let mut observables = BTreeMap::new();
        if config.include_detectors || config.include_observables {
            let found = circuit.collect_detectors_and_observables(false);
            if config.include_detectors {
                for detector in found.detectors {
                    let frames = PropagatedPauliFrames::from_measurements(circuit, &detector.mids)?;
                    if keep(&frames) {
                        detectors.push((detector, frames));
                    }
                }
            }
            if config.include_observables {
                for (index, mids) in found.observables {
                    let frames = PropagatedPauliFrames::from_measurements(circuit, &mids)?;
                    if keep(&frames) {
                        observables.insert(index, frames);
                    }
                }
            }
        }

        log::debug!(
            "Overlay: {} marker slots, {} detectors, {} observables over {} layers",
            markers.len(),
            detectors.len(),
            observables.len(),
            circuit.num_layers()
        );
        Ok(Self {
            markers,
            detectors,
            observables,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Forward propagation of marker slot `slot`
    pub fn marker_frames(&self, slot: u32) -> Option<&PropagatedPauliFrames> {
        self.markers.get(&slot)
    }

    /// Marker slots with a result
    pub fn marker_slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.markers.keys().copied()
    }

    /// Backward propagation of each detector
    pub fn detector_frames(&self) -> &[(Detector, PropagatedPauliFrames)] {
        &self.detectors
    }

    /// Backward propagation of observable `index`
    pub fn observable_frames(&self, index: u32) -> Option<&PropagatedPauliFrames> {
        self.observables.get(&index)
    }

    /// Detectors whose propagation touches any of `qids`
    /// Gantree: detectors_touching(qids) -> Vec<&Detector> // 선택 영역
    pub fn detectors_touching(&self, qids: &BTreeSet<QubitId>) -> Vec<&Detector> {
        self.detectors
            .iter()
            .filter(|(_, frames)| frames.touches_qid_set(qids))
            .map(|(detector, _)| detector)
            .collect()
    }

    /// Union of every propagation
    pub fn merged(&self) -> PropagatedPauliFrames {
        self.markers
            .values()
            .chain(self.detectors.iter().map(|(_, frames)| frames))
            .chain(self.observables.values())
            .fold(PropagatedPauliFrames::default(), |acc, frames| acc.merge(frames))
    }

    /// Check if nothing was computed
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.detectors.is_empty() && self.observables.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_key::FrameKey;
    use crumble_core::Pauli;

    fn memory_circuit() -> Circuit {
        Circuit::from_stim(
            "R 0 1 2\n\
             MARKX(1) 0\n\
             TICK\n\
             CX 0 1\n\
             TICK\n\
             CX 2 1\n\
             TICK\n\
             M 1\n\
             DETECTOR rec[-1]\n\
             TICK\n\
             M 0 2\n\
             OBSERVABLE_INCLUDE(0) rec[-2]",
        )
        .unwrap()
    }

    #[test]
    fn test_detector_extraction() {
        let circuit = Circuit::from_stim("R 0\nTICK\nM 0\nDETECTOR(0, 0, 0) rec[-1]").unwrap();
        let overlay = PropagationOverlay::compute(&circuit, &PropagationConfig::default()).unwrap();
        let detectors = overlay.detector_frames();
        assert_eq!(detectors.len(), 1);
        assert_eq!(detectors[0].0.mids, vec![-1]);
        let layer = detectors[0].1.at_layer(FrameKey::after(0));
        assert_eq!(layer.basis(0), Pauli::Z);
        // No markers in the text
        assert!(overlay.marker_slots().next().is_none());
    }

    #[test]
    fn test_compute_all() {
        let overlay = PropagationOverlay::compute(&memory_circuit(), &PropagationConfig::default()).unwrap();
        let slot = overlay.marker_frames(1).unwrap();
        assert_eq!(slot.at_layer(FrameKey::after(1)).basis(1), Pauli::X);
        assert!(overlay.marker_frames(0).is_none());
        assert_eq!(overlay.detector_frames().len(), 1);
        let observable = overlay.observable_frames(0).unwrap();
        assert_eq!(observable.at_layer(FrameKey::before(4)).basis(0), Pauli::Z);
    }

    #[test]
    fn test_detectors_touching() {
        let overlay = PropagationOverlay::compute(&memory_circuit(), &PropagationConfig::default()).unwrap();
        // The parity check on qubit 1 spreads onto 0 and 2 through the CXs
        assert_eq!(overlay.detectors_touching(&[2].into_iter().collect()).len(), 1);
        assert_eq!(overlay.detectors_touching(&[7].into_iter().collect()).len(), 0);
    }

    #[test]
    fn test_presets_limit_work() {
        let circuit = memory_circuit();
        let markers = PropagationOverlay::compute(&circuit, &PropagationConfig::markers_only()).unwrap();
        assert!(markers.detector_frames().is_empty());
        assert!(markers.marker_frames(1).is_some());

        let annotations =
            PropagationOverlay::compute(&circuit, &PropagationConfig::annotations_only()).unwrap();
        assert!(annotations.marker_frames(1).is_none());
        assert_eq!(annotations.detector_frames().len(), 1);
    }

    #[test]
    fn test_keep_empty_frames() {
        let circuit = memory_circuit();
        let config = PropagationConfig::markers_only().with_marker_slots(3).with_skip_empty_frames(false);
        let overlay = PropagationOverlay::compute(&circuit, &config).unwrap();
        assert_eq!(overlay.marker_slots().count(), 3);
        assert!(overlay.marker_frames(0).unwrap().is_empty());
    }

    #[test]
    fn test_merged() {
        let overlay = PropagationOverlay::compute(&memory_circuit(), &PropagationConfig::default()).unwrap();
        let merged = overlay.merged();
        assert!(!merged.is_empty());
        assert!(merged.touches_qid_set(&[0, 1, 2].into_iter().collect()));
        assert!(PropagationOverlay::default().merged().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PropagationConfig::default().with_marker_slots(1000);
        assert!(PropagationOverlay::compute(&memory_circuit(), &config).is_err());
    }
}
