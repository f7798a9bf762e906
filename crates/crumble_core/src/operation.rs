//! Gate applications
//!
//! Gantree: L1_Circuit → Operation
//!
//! An [`Operation`] is one gate applied to an ordered tuple of qubits, plus
//! the small argument vector markers use for slot, detector and observable
//! indices (and polygon colors).

use crate::constants::markers;
use crate::error::{CrumbleError, CrumbleResult};
use crate::gate::Gate;
use crate::gate_table;
use crate::types::{Pauli, QubitId};
use std::fmt;
use std::sync::Arc;

/// Concrete gate instance
/// Gantree: Operation // gate + args + targets
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Shared gate descriptor
    pub gate: Arc<Gate>,
    /// Float arguments (marker index, polygon color, ...)
    pub args: Vec<f64>,
    /// Ordered targets; the first is the primary target
    pub id_targets: Vec<QubitId>,
}

impl Operation {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create an operation, validating the target count against the arity
    /// Gantree: new(gate, args, targets) -> Result<Self> // 생성자
    ///
    /// An empty argument vector picks up the gate's default argument.
    pub fn new(gate: Arc<Gate>, args: Vec<f64>, id_targets: Vec<QubitId>) -> CrumbleResult<Self> {
        gate.check_targets(id_targets.len())?;
        let args = match (args.is_empty(), gate.default_argument) {
            (true, Some(default)) => vec![default],
            _ => args,
        };
        Ok(Self {
            gate,
            args,
            id_targets,
        })
    }

    /// Create an operation by gate name
    pub fn named(name: &str, args: Vec<f64>, id_targets: Vec<QubitId>) -> CrumbleResult<Self> {
        Self::new(gate_table::lookup_or_err(name)?, args, id_targets)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Gate name
    pub fn name(&self) -> &str {
        &self.gate.name
    }

    /// First target; used to visit multi-qubit operations once
    pub fn primary(&self) -> Option<QubitId> {
        self.id_targets.first().copied()
    }

    /// Check if the operation targets `qubit`
    pub fn touches(&self, qubit: QubitId) -> bool {
        self.id_targets.contains(&qubit)
    }

    /// Check if annotation rather than physical operation
    pub fn is_marker(&self) -> bool {
        self.gate.is_marker
    }

    /// Number of measurement results this operation produces
    pub fn count_measurements(&self) -> usize {
        self.gate.count_measurements(self.id_targets.len())
    }

    /// First argument as a non-negative integer index
    ///
    /// Marker slots, detector indices and observable indices all live here.
    pub fn marker_index(&self) -> Option<u32> {
        let arg = *self.args.first()?;
        if arg >= 0.0 && arg.fract() == 0.0 && arg <= u32::MAX as f64 {
            Some(arg as u32)
        } else {
            None
        }
    }

    /// Pauli toggled by a MARKX/MARKY/MARKZ marker
    pub fn marker_pauli(&self) -> Option<Pauli> {
        match self.name() {
            markers::MARKX => Some(Pauli::X),
            markers::MARKY => Some(Pauli::Y),
            markers::MARKZ => Some(Pauli::Z),
            _ => None,
        }
    }

    /// Same gate and argument vector (candidates for one fused text line)
    pub fn fuses_with(&self, other: &Operation) -> bool {
        self.gate.can_fuse && self.gate.name == other.gate.name && self.args == other.args
    }

    /// Copy with every target remapped
    pub fn with_targets(&self, id_targets: Vec<QubitId>) -> CrumbleResult<Self> {
        if id_targets.len() != self.id_targets.len() {
            return Err(CrumbleError::LengthMismatch {
                expected: self.id_targets.len(),
                actual: id_targets.len(),
            });
        }
        Ok(Self {
            gate: Arc::clone(&self.gate),
            args: self.args.clone(),
            id_targets,
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.gate.name)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
            write!(f, "({})", args.join(", "))?;
        }
        for q in &self.id_targets {
            write!(f, " {}", q)?;
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

    #[test]
    fn test_new_validates_arity() {
        assert!(Operation::named("CX", vec![], vec![0, 1]).is_ok());
        assert!(Operation::named("CX", vec![], vec![0, 1, 2, 3]).is_ok());
        let err = Operation::named("CX", vec![], vec![0]).unwrap_err();
        assert!(matches!(err, CrumbleError::TargetCountMismatch { .. }));
        assert!(Operation::named("MPP:XZ", vec![], vec![0, 1]).is_ok());
        assert!(Operation::named("MPP:XZ", vec![], vec![0]).is_err());
    }

    #[test]
    fn test_default_argument_applied() {
        let op = Operation::named("MARKX", vec![], vec![3]).unwrap();
        assert_eq!(op.args, vec![0.0]);
        assert_eq!(op.marker_index(), Some(0));
        assert_eq!(op.marker_pauli(), Some(Pauli::X));
    }

    #[test]
    fn test_marker_index_rejects_fractions() {
        let op = Operation::named("MARKZ", vec![1.5], vec![0]).unwrap();
        assert_eq!(op.marker_index(), None);
        let op = Operation::named("DETECTOR", vec![7.0], vec![0]).unwrap();
        assert_eq!(op.marker_index(), Some(7));
        assert_eq!(op.marker_pauli(), None);
    }

    #[test]
    fn test_count_measurements() {
        assert_eq!(Operation::named("M", vec![], vec![0, 1, 2]).unwrap().count_measurements(), 3);
        assert_eq!(Operation::named("MXX", vec![], vec![0, 1]).unwrap().count_measurements(), 1);
        assert_eq!(Operation::named("MPP:XYZ", vec![], vec![0, 1, 2]).unwrap().count_measurements(), 1);
        assert_eq!(Operation::named("H", vec![], vec![0]).unwrap().count_measurements(), 0);
    }

    #[test]
    fn test_display() {
        let op = Operation::named("MARKY", vec![2.0], vec![5]).unwrap();
        assert_eq!(op.to_string(), "MARKY(2) 5");
        assert_eq!(op.primary(), Some(5));
    }
}
