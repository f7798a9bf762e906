//! Propagation snapshot at one layer key
//!
//! Gantree: L2_Propagation → PropagatedPauliFrameLayer

use crumble_core::{Pauli, QubitId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Color of a crossing event
/// Gantree: CrossingColor // X/Y/Z/Mixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossingColor {
    /// Only X was involved
    X,
    /// Only Y was involved
    Y,
    /// Only Z was involved
    Z,
    /// Several bases were involved
    Mixed,
}

impl CrossingColor {
    /// Color for a set of non-identity bases
    pub fn from_bases(bases: &BTreeSet<Pauli>) -> Self {
        let mut iter = bases.iter().filter(|p| !p.is_identity());
        match (iter.next(), iter.next()) {
            (Some(Pauli::X), None) => CrossingColor::X,
            (Some(Pauli::Y), None) => CrossingColor::Y,
            (Some(Pauli::Z), None) => CrossingColor::Z,
            _ => CrossingColor::Mixed,
        }
    }
}

/// A two-qubit operation that changed the bases it straddles
/// Gantree: Crossing // {q1, q2, color}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crossing {
    /// First target
    pub q1: QubitId,
    /// Second target
    pub q2: QubitId,
    /// Bases involved
    pub color: CrossingColor,
}

/// Immutable snapshot: bases, error flags and crossings at one key
/// Gantree: PropagatedPauliFrameLayer // 스냅샷
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagatedPauliFrameLayer {
    bases: BTreeMap<QubitId, Pauli>,
    errors: BTreeSet<QubitId>,
    crossings: Vec<Crossing>,
}

impl PropagatedPauliFrameLayer {
    /// Create a snapshot; identity bases are dropped
    pub fn new(
        mut bases: BTreeMap<QubitId, Pauli>,
        errors: BTreeSet<QubitId>,
        crossings: Vec<Crossing>,
    ) -> Self {
        bases.retain(|_, p| !p.is_identity());
        Self {
            bases,
            errors,
            crossings,
        }
    }

    /// Snapshot with nothing in it
    pub const fn empty() -> Self {
        Self {
            bases: BTreeMap::new(),
            errors: BTreeSet::new(),
            crossings: Vec::new(),
        }
    }

    /// Non-identity, non-error basis per qubit
    pub fn bases(&self) -> &BTreeMap<QubitId, Pauli> {
        &self.bases
    }

    /// Qubits flagged inconsistent
    pub fn errors(&self) -> &BTreeSet<QubitId> {
        &self.errors
    }

    /// Crossing events
    pub fn crossings(&self) -> &[Crossing] {
        &self.crossings
    }

    /// Basis of `qubit` (identity when absent)
    pub fn basis(&self, qubit: QubitId) -> Pauli {
        self.bases.get(&qubit).copied().unwrap_or_default()
    }

    /// Check if nothing is recorded
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty() && self.errors.is_empty() && self.crossings.is_empty()
    }

    /// Check if a basis or error entry is on one of `qids`
    pub fn touches_qid_set(&self, qids: &BTreeSet<QubitId>) -> bool {
        self.bases.keys().any(|q| qids.contains(q)) || self.errors.iter().any(|q| qids.contains(q))
    }

    /// Union with `other`; on a basis conflict `other` wins
    pub fn merged_with(&self, other: &PropagatedPauliFrameLayer) -> Self {
        let mut bases = self.bases.clone();
        bases.extend(other.bases.iter().map(|(&q, &p)| (q, p)));
        let mut errors = self.errors.clone();
        errors.extend(other.errors.iter().copied());
        let mut crossings = self.crossings.clone();
        crossings.extend(other.crossings.iter().copied());
        Self {
            bases,
            errors,
            crossings,
        }
    }
}

impl fmt::Display for PropagatedPauliFrameLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.bases.iter().map(|(q, p)| format!("{}{}", p, q)).collect();
        parts.extend(self.errors.iter().map(|q| format!("ERR{}", q)));
        parts.extend(
            self.crossings
                .iter()
                .map(|c| format!("{:?}:{}-{}", c.color, c.q1, c.q2)),
        );
        write!(f, "{{{}}}", parts.join(" "))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(bases: &[(QubitId, Pauli)], errors: &[QubitId]) -> PropagatedPauliFrameLayer {
        PropagatedPauliFrameLayer::new(
            bases.iter().copied().collect(),
            errors.iter().copied().collect(),
            Vec::new(),
        )
    }

    #[test]
    fn test_new_drops_identity() {
        let l = layer(&[(0, Pauli::I), (1, Pauli::X)], &[]);
        assert_eq!(l.bases().len(), 1);
        assert_eq!(l.basis(0), Pauli::I);
        assert_eq!(l.basis(1), Pauli::X);
    }

    #[test]
    fn test_crossing_color() {
        let set = |ps: &[Pauli]| ps.iter().copied().collect::<BTreeSet<_>>();
        assert_eq!(CrossingColor::from_bases(&set(&[Pauli::I, Pauli::Z])), CrossingColor::Z);
        assert_eq!(CrossingColor::from_bases(&set(&[Pauli::X, Pauli::Z])), CrossingColor::Mixed);
        assert_eq!(CrossingColor::from_bases(&set(&[Pauli::I])), CrossingColor::Mixed);
    }

    #[test]
    fn test_touches_qid_set() {
        let l = layer(&[(2, Pauli::Z)], &[5]);
        assert!(l.touches_qid_set(&[2].into_iter().collect()));
        assert!(l.touches_qid_set(&[5].into_iter().collect()));
        assert!(!l.touches_qid_set(&[0, 1].into_iter().collect()));
    }

    #[test]
    fn test_merged_with_other_wins() {
        let a = layer(&[(0, Pauli::X), (1, Pauli::X)], &[3]);
        let b = layer(&[(1, Pauli::Z)], &[4]);
        let m = a.merged_with(&b);
        assert_eq!(m.basis(0), Pauli::X);
        assert_eq!(m.basis(1), Pauli::Z);
        assert_eq!(m.errors().len(), 2);
    }

    #[test]
    fn test_display() {
        let l = layer(&[(0, Pauli::X)], &[2]);
        assert_eq!(l.to_string(), "{X0 ERR2}");
        assert!(PropagatedPauliFrameLayer::empty().is_empty());
    }
}
