//! Circuit builder for Crumble
//!
//! Gantree: L1_Circuit → CircuitBuilder
//!
//! Fluent builder for layered circuits. Operations go into the current
//! layer until [`CircuitBuilder::tick`] starts the next one.

use crate::circuit::Circuit;
use crate::constants::markers;
use crate::error::{CrumbleError, CrumbleResult};
use crate::gate_table;
use crate::operation::Operation;
use crate::types::{Basis, BasisString, Coord, Pauli, QubitId};

/// Fluent circuit builder (consuming self pattern)
/// Gantree: CircuitBuilder // 빌더 패턴
pub struct CircuitBuilder {
    /// Internal circuit being built
    /// Gantree: circuit: Circuit // 내부 회로
    circuit: Circuit,

    /// Layer receiving new operations
    layer: usize,

    /// First failure, reported by `build_validated`
    error: Option<CrumbleError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Create a builder with `num_qubits` qubits on a line (`q` at `(q, 0)`)
    /// Gantree: new(n) -> Self // 생성자
    pub fn new(num_qubits: usize) -> Self {
        let coords = (0..num_qubits).map(|q| Coord::new(q as f64, 0.0)).collect();
        Self::on_coords(coords)
    }

    /// Create a builder with explicit qubit coordinates
    pub fn on_coords(coords: Vec<Coord>) -> Self {
        let (circuit, error) = match Circuit::with_qubits(coords) {
            Ok(c) => (c, None),
            Err(e) => (Circuit::default(), Some(e)),
        };
        Self {
            circuit,
            layer: 0,
            error,
        }
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Move a qubit to a new coordinate
    /// Gantree: coords(self, q, x, y) -> Self // 좌표 지정
    pub fn coords(mut self, qubit: QubitId, x: f64, y: f64) -> Self {
        let coord = Coord::new(x, y);
        let taken = self
            .circuit
            .qubit_coords()
            .iter()
            .enumerate()
            .any(|(q, c)| q != qubit && c.key() == coord.key());
        if taken {
            self.record(Err(CrumbleError::DuplicateCoordinate(coord.key())));
            return self;
        }
        let coords = self.circuit.coords_mut();
        if coords.len() <= qubit {
            let start = coords.len();
            // Placeholder positions below every real row
            coords.extend((start..=qubit).map(|q| Coord::new(q as f64, -1.0)));
        }
        coords[qubit] = coord;
        self
    }

    /// Start the next layer
    /// Gantree: tick(self) -> Self // 다음 레이어
    pub fn tick(mut self) -> Self {
        self.layer += 1;
        self
    }

    // ========================================================================
    // Generic Insertion
    // ========================================================================

    fn record(&mut self, result: CrumbleResult<()>) {
        if let Err(e) = result {
            log::debug!("CircuitBuilder: {}", e);
            self.error.get_or_insert(e);
        }
    }

    fn put(&mut self, op: CrumbleResult<Operation>) {
        let layer = self.layer;
        let result = op.and_then(|op| self.circuit.put_operation(layer, op, false));
        self.record(result);
    }

    /// Add a gate by name
    /// Gantree: gate(self, name, targets) -> Self // 게이트 추가
    pub fn gate(mut self, name: &str, targets: &[QubitId]) -> Self {
        self.put(Operation::named(name, Vec::new(), targets.to_vec()));
        self
    }

    /// Add a gate by name with arguments
    pub fn gate_with_args(mut self, name: &str, args: &[f64], targets: &[QubitId]) -> Self {
        self.put(Operation::named(name, args.to_vec(), targets.to_vec()));
        self
    }

    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================

    /// Add Hadamard gate
    pub fn h(self, qubit: QubitId) -> Self {
        self.gate("H", &[qubit])
    }

    /// Add S gate
    pub fn s(self, qubit: QubitId) -> Self {
        self.gate("S", &[qubit])
    }

    /// Add √X gate
    pub fn sqrt_x(self, qubit: QubitId) -> Self {
        self.gate("SQRT_X", &[qubit])
    }

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================

    /// Add CNOT gate
    /// Gantree: cx(self, c, t) -> Self // CX 추가
    pub fn cx(self, control: QubitId, target: QubitId) -> Self {
        self.gate("CX", &[control, target])
    }

    /// Add CY gate
    pub fn cy(self, control: QubitId, target: QubitId) -> Self {
        self.gate("CY", &[control, target])
    }

    /// Add CZ gate
    pub fn cz(self, a: QubitId, b: QubitId) -> Self {
        self.gate("CZ", &[a, b])
    }

    /// Add SWAP gate
    pub fn swap(self, a: QubitId, b: QubitId) -> Self {
        self.gate("SWAP", &[a, b])
    }

    // ========================================================================
    // Measurement & Reset
    // ========================================================================

    /// Add Z-basis measurement
    /// Gantree: measure(self, q) -> Self // 측정
    pub fn measure(self, qubit: QubitId) -> Self {
        self.measure_in(Basis::Z, qubit)
    }

    /// Add single-qubit measurement in `basis`
    pub fn measure_in(self, basis: Basis, qubit: QubitId) -> Self {
        let name = match basis {
            Basis::X => "MX",
            Basis::Y => "MY",
            Basis::Z => "M",
        };
        self.gate(name, &[qubit])
    }

    /// Add Z-basis reset
    pub fn reset(self, qubit: QubitId) -> Self {
        self.reset_in(Basis::Z, qubit)
    }

    /// Add single-qubit reset in `basis`
    pub fn reset_in(self, basis: Basis, qubit: QubitId) -> Self {
        let name = match basis {
            Basis::X => "RX",
            Basis::Y => "RY",
            Basis::Z => "R",
        };
        self.gate(name, &[qubit])
    }

    /// Add Pauli-product measurement (one basis per target)
    /// Gantree: mpp(self, bases, targets) -> Self // 곱 측정
    pub fn mpp(mut self, bases: &BasisString, targets: &[QubitId]) -> Self {
        let gate = std::sync::Arc::new(gate_table::make_mpp_gate(bases));
        self.put(Operation::new(gate, Vec::new(), targets.to_vec()));
        self
    }

    // ========================================================================
    // Markers
    // ========================================================================

    /// Add a MARKX/MARKY/MARKZ marker in `slot`
    pub fn marker(self, pauli: Pauli, slot: u32, qubit: QubitId) -> Self {
        let name = match pauli {
            Pauli::X => markers::MARKX,
            Pauli::Y => markers::MARKY,
            Pauli::Z => markers::MARKZ,
            Pauli::I => return self,
        };
        self.gate_with_args(name, &[slot as f64], &[qubit])
    }

    /// Add DETECTOR markers comparing the latest measurements of `qubits`
    pub fn detector(self, index: u32, qubits: &[QubitId]) -> Self {
        self.annotation(markers::DETECTOR, index, qubits)
    }

    /// Add OBSERVABLE_INCLUDE markers on the latest measurements of `qubits`
    pub fn observable_include(self, index: u32, qubits: &[QubitId]) -> Self {
        self.annotation(markers::OBSERVABLE_INCLUDE, index, qubits)
    }

    fn annotation(self, name: &str, index: u32, qubits: &[QubitId]) -> Self {
        qubits.iter().fold(self, |b, &q| {
            b.gate_with_args(name, &[index as f64], &[q])
        })
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the circuit, dropping any operation that failed to insert
    /// Gantree: build(self) -> Circuit // 빌드
    pub fn build(self) -> Circuit {
        self.circuit
    }

    /// Build the circuit, failing on the first operation that failed to insert
    pub fn build_validated(self) -> CrumbleResult<Circuit> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.circuit),
        }
    }

    /// Get reference to circuit being built
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.circuit.num_qubits()
    }

    /// Index of the layer receiving new operations
    pub fn current_layer(&self) -> usize {
        self.layer
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let circuit = CircuitBuilder::new(2).h(0).tick().cx(0, 1).tick().measure(1).build();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_layers(), 3);
        assert_eq!(circuit.count_measurements(), 1);
    }

    #[test]
    fn test_builder_collision_reported() {
        let builder = CircuitBuilder::new(2).h(0).cx(0, 1);
        assert!(matches!(
            builder.build_validated(),
            Err(CrumbleError::Collision { qubit: 0 })
        ));
    }

    #[test]
    fn test_builder_unknown_gate() {
        let result = CircuitBuilder::new(1).gate("T", &[0]).build_validated();
        assert!(matches!(result, Err(CrumbleError::UnknownGate(_))));
    }

    #[test]
    fn test_builder_missing_qubit() {
        let result = CircuitBuilder::new(1).cx(0, 4).build_validated();
        assert!(matches!(result, Err(CrumbleError::MissingCoordinate { qubit: 4 })));
    }

    #[test]
    fn test_builder_coords() {
        let circuit = CircuitBuilder::new(1).coords(2, 5.0, 5.0).h(2).build_validated().unwrap();
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.qubit_coords()[2], Coord::new(5.0, 5.0));
        assert!(CircuitBuilder::new(2).coords(1, 0.0, 0.0).build_validated().is_err());
    }

    #[test]
    fn test_builder_markers_and_detectors() {
        let circuit = CircuitBuilder::new(2)
            .marker(Pauli::X, 0, 0)
            .h(0)
            .tick()
            .measure(0)
            .measure(1)
            .detector(0, &[0, 1])
            .observable_include(0, &[1])
            .build_validated()
            .unwrap();
        assert_eq!(circuit.layers()[0].markers().len(), 1);
        let found = circuit.collect_detectors_and_observables(false);
        assert_eq!(found.detectors[0].mids, vec![-1, -2]);
        assert_eq!(found.observables.get(&0), Some(&vec![-1]));
    }

    #[test]
    fn test_builder_mpp() {
        let circuit = CircuitBuilder::new(3)
            .mpp(&BasisString::parse("XYZ").unwrap(), &[0, 1, 2])
            .build_validated()
            .unwrap();
        let site = &circuit.measurement_sites()[0];
        assert_eq!(site.bases, vec![Basis::X, Basis::Y, Basis::Z]);
    }
}
