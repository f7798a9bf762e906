//! Layered circuit structure for Crumble
//!
//! Gantree: L1_Circuit → Circuit
//!
//! A [`Circuit`] is an ordered list of [`Layer`]s plus the coordinate of each
//! qubit. Circuits are values: every edit returns a new circuit and leaves
//! the receiver untouched, so snapshots can be shared freely.

use crate::constants::markers;
use crate::error::{CrumbleError, CrumbleResult};
use crate::layer::Layer;
use crate::operation::Operation;
use crate::types::{Basis, Coord, MeasurementOffset, QubitId};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

// ============================================================================
// Measurement Sites and Detectors
// ============================================================================

/// One measurement result in the record
/// Gantree: MeasurementSite // 측정 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementSite {
    /// Layer holding the measuring operation
    pub layer: usize,
    /// Qubits measured together
    pub qubits: Vec<QubitId>,
    /// Observable measured, one basis per qubit
    pub bases: Vec<Basis>,
}

/// Detector resolved to measurement record offsets
/// Gantree: Detector // mids + qids
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Detector {
    /// Record offsets (negative), sorted descending
    pub mids: Vec<MeasurementOffset>,
    /// Qubits whose measurements the detector compares, sorted
    pub qids: Vec<QubitId>,
}

/// Result of [`Circuit::collect_detectors_and_observables`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorsAndObservables {
    /// Distinct, non-empty detectors
    pub detectors: Vec<Detector>,
    /// Observable index → record offsets, sorted descending
    pub observables: BTreeMap<u32, Vec<MeasurementOffset>>,
}

/// Accumulated dependencies of one annotation index
#[derive(Default)]
struct Dependencies {
    mids: BTreeSet<usize>,
    qids: BTreeSet<QubitId>,
}

impl Dependencies {
    /// Fold in one marker: union within it, parity across markers
    fn toggle(&mut self, marker_mids: BTreeSet<usize>, marker_qids: impl IntoIterator<Item = QubitId>) {
        self.mids = self.mids.symmetric_difference(&marker_mids).copied().collect();
        self.qids.extend(marker_qids);
    }

    fn offsets(&self, total: usize) -> Vec<MeasurementOffset> {
        self.mids
            .iter()
            .rev()
            .map(|&m| m as MeasurementOffset - total as MeasurementOffset)
            .collect()
    }
}

// ============================================================================
// Circuit
// ============================================================================

/// Layered circuit
/// Gantree: Circuit // 회로 구조체
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circuit {
    /// Coordinate per qubit id
    /// Gantree: qubit_coords: Vec<Coord> // 좌표
    qubit_coords: Vec<Coord>,

    /// Time steps
    /// Gantree: layers: Vec<Layer> // 레이어 목록
    layers: Vec<Layer>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a circuit, validating coordinates and targets
    /// Gantree: new(coords, layers) -> Result<Self> // 생성자
    pub fn new(qubit_coords: Vec<Coord>, layers: Vec<Layer>) -> CrumbleResult<Self> {
        let circuit = Self {
            qubit_coords,
            layers,
        };
        circuit.validate()?;
        Ok(circuit)
    }

    /// Create a circuit with qubits at the given coordinates and no layers
    pub fn with_qubits(qubit_coords: Vec<Coord>) -> CrumbleResult<Self> {
        Self::new(qubit_coords, Vec::new())
    }

    fn validate(&self) -> CrumbleResult<()> {
        let mut seen = HashSet::new();
        for c in &self.qubit_coords {
            if !seen.insert(c.key()) {
                return Err(CrumbleError::DuplicateCoordinate(c.key()));
            }
        }
        for layer in &self.layers {
            for op in layer.iter_gates_and_markers() {
                self.check_targets(op)?;
            }
        }
        Ok(())
    }

    fn check_targets(&self, op: &Operation) -> CrumbleResult<()> {
        match op.id_targets.iter().find(|&&q| q >= self.qubit_coords.len()) {
            Some(&qubit) => Err(CrumbleError::MissingCoordinate { qubit }),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Coordinates indexed by qubit id
    pub fn qubit_coords(&self) -> &[Coord] {
        &self.qubit_coords
    }

    /// Layers in time order
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer at `index`
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Number of qubits with coordinates
    pub fn num_qubits(&self) -> usize {
        self.qubit_coords.len()
    }

    /// Number of layers
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Check if the circuit has no layers
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Every qubit touched by an operation or marker
    /// Gantree: all_qubits() -> BTreeSet // 사용 큐비트
    pub fn all_qubits(&self) -> BTreeSet<QubitId> {
        self.layers
            .iter()
            .flat_map(|layer| layer.touched_qubits())
            .collect()
    }

    /// Coordinate key (`"x,y"`) → qubit id
    pub fn coord_to_qubit_map(&self) -> HashMap<String, QubitId> {
        self.qubit_coords
            .iter()
            .enumerate()
            .map(|(q, c)| (c.key(), q))
            .collect()
    }

    /// Total number of measurement results
    pub fn count_measurements(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|layer| layer.iter_gates())
            .map(|op| op.count_measurements())
            .sum()
    }

    /// Every measurement result in record order
    /// Gantree: measurement_sites() -> Vec<MeasurementSite> // 측정 기록
    pub fn measurement_sites(&self) -> Vec<MeasurementSite> {
        let mut sites = Vec::new();
        for (k, layer) in self.layers.iter().enumerate() {
            for op in layer.iter_gates() {
                let Some(bases) = op.gate.rule.measured_bases() else {
                    continue;
                };
                let group = op.gate.group_size(op.id_targets.len()).max(1);
                for qubits in op.id_targets.chunks(group) {
                    sites.push(MeasurementSite {
                        layer: k,
                        qubits: qubits.to_vec(),
                        bases: bases.clone(),
                    });
                }
            }
        }
        sites
    }

    /// Resolve DETECTOR and OBSERVABLE_INCLUDE markers to record offsets
    /// Gantree: collect_detectors_and_observables(bool) -> DetectorsAndObservables // 검출기 수집
    ///
    /// A marker on qubit `q` depends on the latest measurement of `q` at or
    /// before the marker's layer. Markers sharing an index combine by parity.
    /// Detectors with identical dependencies are merged and empty ones are
    /// dropped. Detectors are ordered by their dependencies (earliest
    /// completing first), or by first appearance of their index when
    /// `order_for_serialization`.
    pub fn collect_detectors_and_observables(
        &self,
        order_for_serialization: bool,
    ) -> DetectorsAndObservables {
        let mut latest: HashMap<QubitId, usize> = HashMap::new();
        let mut next_mid = 0usize;
        let mut detectors: IndexMap<u32, Dependencies> = IndexMap::new();
        let mut observables: BTreeMap<u32, Dependencies> = BTreeMap::new();

        for (k, layer) in self.layers.iter().enumerate() {
            for op in layer.iter_gates_and_markers() {
                if op.gate.is_measurement() {
                    let group = op.gate.group_size(op.id_targets.len()).max(1);
                    for qubits in op.id_targets.chunks(group) {
                        for &q in qubits {
                            latest.insert(q, next_mid);
                        }
                        next_mid += 1;
                    }
                    continue;
                }

                let is_detector = match op.name() {
                    markers::DETECTOR => true,
                    markers::OBSERVABLE_INCLUDE => false,
                    _ => continue,
                };
                let Some(index) = op.marker_index() else {
                    log::warn!("Layer {}: {} without an integer index ignored", k, op);
                    continue;
                };

                let mut mids = BTreeSet::new();
                for &q in &op.id_targets {
                    match latest.get(&q) {
                        Some(&m) => {
                            mids.insert(m);
                        }
                        None => log::warn!("Layer {}: {} references unmeasured qubit {}", k, op, q),
                    }
                }
                let deps = if is_detector {
                    detectors.entry(index).or_default()
                } else {
                    observables.entry(index).or_default()
                };
                deps.toggle(mids, op.id_targets.iter().copied());
            }
        }

        let total = next_mid;
        let mut seen = HashSet::new();
        let mut result: Vec<Detector> = detectors
            .values()
            .filter(|deps| !deps.mids.is_empty())
            .map(|deps| Detector {
                mids: deps.offsets(total),
                qids: deps.qids.iter().copied().collect(),
            })
            .filter(|d| seen.insert(d.mids.clone()))
            .collect();
        if !order_for_serialization {
            result.sort_by(|a, b| a.mids.cmp(&b.mids));
        }

        DetectorsAndObservables {
            detectors: result,
            observables: observables
                .into_iter()
                .map(|(index, deps)| (index, deps.offsets(total)))
                .collect(),
        }
    }

    // ========================================================================
    // Copy-on-Write Edits
    // ========================================================================

    /// Copy with `op` inserted into layer `layer_index`
    /// Gantree: with_operation(k, op, allow_overwrite) -> Result<Circuit> // 연산 추가
    ///
    /// Empty layers are appended as needed.
    pub fn with_operation(
        &self,
        layer_index: usize,
        op: Operation,
        allow_overwrite: bool,
    ) -> CrumbleResult<Circuit> {
        let mut result = self.clone();
        result.put_operation(layer_index, op, allow_overwrite)?;
        Ok(result)
    }

    /// Copy with whatever occupies `qubit` in layer `layer_index` removed
    pub fn without_operation_at(&self, layer_index: usize, qubit: QubitId) -> CrumbleResult<Circuit> {
        self.check_layer(layer_index, self.layers.len())?;
        let mut result = self.clone();
        result.layers[layer_index].id_pop_at(qubit);
        Ok(result)
    }

    /// Copy with an empty layer inserted before `index` (`index == len` appends)
    pub fn with_layer_inserted(&self, index: usize) -> CrumbleResult<Circuit> {
        self.check_layer(index, self.layers.len() + 1)?;
        let mut result = self.clone();
        result.layers.insert(index, Layer::new());
        Ok(result)
    }

    /// Copy with layer `index` removed
    pub fn with_layer_removed(&self, index: usize) -> CrumbleResult<Circuit> {
        self.check_layer(index, self.layers.len())?;
        let mut result = self.clone();
        result.layers.remove(index);
        Ok(result)
    }

    fn check_layer(&self, index: usize, bound: usize) -> CrumbleResult<()> {
        if index >= bound {
            return Err(CrumbleError::LayerOutOfRange {
                index,
                len: self.layers.len(),
            });
        }
        Ok(())
    }

    /// Copy containing a qubit at each of `coords`, plus their ids
    /// Gantree: with_coords_included(coords) -> (Circuit, Vec<QubitId>) // 좌표 추가
    ///
    /// Known coordinates keep their id; new ones are appended.
    pub fn with_coords_included(&self, coords: &[Coord]) -> (Circuit, Vec<QubitId>) {
        let mut result = self.clone();
        let mut index = self.coord_to_qubit_map();
        let ids = coords
            .iter()
            .map(|c| {
                *index.entry(c.key()).or_insert_with(|| {
                    result.qubit_coords.push(*c);
                    result.qubit_coords.len() - 1
                })
            })
            .collect();
        (result, ids)
    }

    /// Copy with every coordinate mapped through `transform`
    pub fn after_coord_transform(&self, transform: impl Fn(Coord) -> Coord) -> CrumbleResult<Circuit> {
        Circuit::new(
            self.qubit_coords.iter().map(|&c| transform(c)).collect(),
            self.layers.clone(),
        )
    }

    /// Copy without trailing empty layers
    pub fn after_trimming_empty_layers(&self) -> Circuit {
        let mut result = self.clone();
        while result.layers.last().is_some_and(|l| l.is_empty()) {
            result.layers.pop();
        }
        result
    }

    /// Insert in place, appending empty layers as needed (used while reading and building)
    pub(crate) fn put_operation(
        &mut self,
        layer_index: usize,
        op: Operation,
        allow_overwrite: bool,
    ) -> CrumbleResult<()> {
        self.check_targets(&op)?;
        if self.layers.len() <= layer_index {
            self.layers.resize_with(layer_index + 1, Layer::new);
        }
        self.layers[layer_index].put(op, allow_overwrite)
    }

    /// Mutable coordinate access (used while reading and building)
    pub(crate) fn coords_mut(&mut self) -> &mut Vec<Coord> {
        &mut self.qubit_coords
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit({} qubits, {} layers)",
            self.num_qubits(),
            self.num_layers()
        )?;
        writeln!(f, "  Measurements: {}", self.count_measurements())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
