//! Gate descriptors for Crumble
//!
//! Gantree: L1_Circuit → Gate
//!
//! A [`Gate`] carries two descriptions of the same Pauli conjugation: a
//! scalar basis-string table used for human-readable propagation, and a
//! [`FrameRule`] driving the word-parallel [`PauliFrame`] register.

use crate::constants::text::ERR_PREFIX;
use crate::error::{CrumbleError, CrumbleResult};
use crate::pauli_frame::PauliFrame;
use crate::types::{paulis_to_string, Basis, BasisString, Pauli, QubitId};
use std::fmt;

/// Scalar conjugation table: input basis substring → output basis substring
///
/// Outputs prefixed with `ERR:` mark a transition the propagation must flag.
pub type TableauMap = &'static [(&'static str, &'static str)];

// ============================================================================
// Transition
// ============================================================================

/// Result of pushing one basis string through a gate
/// Gantree: Transition // bases + error flag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transition {
    /// Output Pauli per target, in target order
    pub bases: Vec<Pauli>,
    /// True when the whole output is error-tagged
    pub error: bool,
}

impl Transition {
    /// Parse `"XZ"` or `"ERR:XZ"`
    pub fn parse(text: &str) -> CrumbleResult<Self> {
        let (error, body) = match text.strip_prefix(ERR_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let bases = crate::types::parse_paulis(body)?;
        Ok(Self { bases, error })
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.error {
            write!(f, "{}", ERR_PREFIX)?;
        }
        write!(f, "{}", paulis_to_string(&self.bases))
    }
}

// ============================================================================
// Frame Rule
// ============================================================================

/// Vectorized update applied to a [`PauliFrame`]
/// Gantree: FrameRule // 프레임 갱신 규칙
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRule {
    /// No effect on Pauli frames (Pauli gates, markers)
    Identity,
    /// X ↔ Z
    ExchangeXZ,
    /// X ↔ Y
    ExchangeXY,
    /// Y ↔ Z
    ExchangeYZ,
    /// X → Y → Z → X
    CycleXYZ,
    /// X → Z → Y → X
    CycleZYX,
    /// Controlled X
    Cx,
    /// Controlled Y
    Cy,
    /// Controlled Z
    Cz,
    /// X-controlled X
    Xcx,
    /// X-controlled Y
    Xcy,
    /// X-controlled Z
    Xcz,
    /// Y-controlled X
    Ycx,
    /// Y-controlled Y
    Ycy,
    /// Y-controlled Z
    Ycz,
    /// Exchange two qubits
    Swap,
    /// ISWAP and ISWAP_DAG (identical up to sign)
    ISwap,
    /// CX followed by SWAP
    CxSwap,
    /// SWAP followed by CX
    SwapCx,
    /// CZ followed by SWAP
    CzSwap,
    /// √(PP) on a pair, both dagger variants
    SqrtPair(Basis),
    /// Reset into the basis
    Reset(Basis),
    /// Non-demolition single-qubit measurement
    Measure(Basis),
    /// Measure then reset in the same basis
    DemolitionMeasure(Basis),
    /// Pauli-product measurement (MXX, MYY, MZZ, MPP)
    MeasureProduct(BasisString),
    /// Pauli-product rotation (SPP, SPP_DAG)
    PauliProductRotation(BasisString),
}

impl FrameRule {
    /// Apply the forward update
    pub fn apply(&self, frame: &mut PauliFrame, targets: &[QubitId]) {
        match self {
            FrameRule::Identity => {}
            FrameRule::ExchangeXZ => frame.do_exchange_xz(targets),
            FrameRule::ExchangeXY => frame.do_exchange_xy(targets),
            FrameRule::ExchangeYZ => frame.do_exchange_yz(targets),
            FrameRule::CycleXYZ => frame.do_cycle_xyz(targets),
            FrameRule::CycleZYX => frame.do_cycle_zyx(targets),
            FrameRule::Cx => frame.do_cx(targets),
            FrameRule::Cy => frame.do_cy(targets),
            FrameRule::Cz => frame.do_cz(targets),
            FrameRule::Xcx => frame.do_xcx(targets),
            FrameRule::Xcy => frame.do_xcy(targets),
            FrameRule::Xcz => frame.do_xcz(targets),
            FrameRule::Ycx => frame.do_ycx(targets),
            FrameRule::Ycy => frame.do_ycy(targets),
            FrameRule::Ycz => frame.do_ycz(targets),
            FrameRule::Swap => frame.do_swap(targets),
            FrameRule::ISwap => frame.do_iswap(targets),
            FrameRule::CxSwap => frame.do_cx_swap(targets),
            FrameRule::SwapCx => frame.do_swap_cx(targets),
            FrameRule::CzSwap => frame.do_cz_swap(targets),
            FrameRule::SqrtPair(basis) => frame.do_sqrt_pair(*basis, targets),
            FrameRule::Reset(_) => frame.do_discard(targets),
            FrameRule::Measure(basis) => frame.do_measure(*basis, targets),
            FrameRule::DemolitionMeasure(basis) => frame.do_demolition_measure(*basis, targets),
            FrameRule::MeasureProduct(bases) => frame.do_mpp(bases.as_slice(), targets),
            FrameRule::PauliProductRotation(bases) => frame.do_spp(bases.as_slice(), targets),
        }
    }

    /// Apply the inverse update (backward propagation)
    ///
    /// Exactly reverses [`FrameRule::apply`] whenever `apply` raised no flag.
    pub fn undo(&self, frame: &mut PauliFrame, targets: &[QubitId]) {
        match self {
            FrameRule::CycleXYZ => frame.do_cycle_zyx(targets),
            FrameRule::CycleZYX => frame.do_cycle_xyz(targets),
            FrameRule::CxSwap => frame.do_swap_cx(targets),
            FrameRule::SwapCx => frame.do_cx_swap(targets),
            FrameRule::Reset(basis) | FrameRule::DemolitionMeasure(basis) => {
                frame.undo_reset(*basis, targets)
            }
            // Everything else is its own inverse on Pauli frames.
            other => other.apply(frame, targets),
        }
    }

    /// Check if the rule produces measurement results
    pub fn is_measurement(&self) -> bool {
        matches!(
            self,
            FrameRule::Measure(_) | FrameRule::DemolitionMeasure(_) | FrameRule::MeasureProduct(_)
        )
    }

    /// Check if the rule resets its targets
    pub fn is_reset(&self) -> bool {
        matches!(self, FrameRule::Reset(_) | FrameRule::DemolitionMeasure(_))
    }

    /// Observable measured per result group, if this is a measurement
    pub fn measured_bases(&self) -> Option<Vec<Basis>> {
        match self {
            FrameRule::Measure(basis) | FrameRule::DemolitionMeasure(basis) => Some(vec![*basis]),
            FrameRule::MeasureProduct(bases) => Some(bases.as_slice().to_vec()),
            _ => None,
        }
    }
}

// ============================================================================
// Gate
// ============================================================================

/// Immutable gate descriptor
/// Gantree: Gate // 게이트 서술자
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    /// Case-sensitive name used for lookup
    pub name: String,
    /// Qubits per application; `None` for variable arity
    pub num_qubits: Option<usize>,
    /// Same-named same-argument instances may be written as one group
    pub can_fuse: bool,
    /// Annotation rather than a physical operation
    pub is_marker: bool,
    /// Argument used when an operation supplies none
    pub default_argument: Option<f64>,
    /// Scalar conjugation table, when the gate has a small fixed one
    pub tableau_map: Option<TableauMap>,
    /// Vectorized update
    pub rule: FrameRule,
}

impl Gate {
    /// Create a physical gate
    pub fn new(
        name: impl Into<String>,
        num_qubits: Option<usize>,
        can_fuse: bool,
        tableau_map: Option<TableauMap>,
        rule: FrameRule,
    ) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            can_fuse,
            is_marker: false,
            default_argument: None,
            tableau_map,
            rule,
        }
    }

    /// Create a marker (annotation) gate
    pub fn marker(name: impl Into<String>, num_qubits: Option<usize>) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            can_fuse: false,
            is_marker: true,
            default_argument: None,
            tableau_map: None,
            rule: FrameRule::Identity,
        }
    }

    /// Copy of this gate with a different default argument
    pub fn with_default_argument(&self, argument: f64) -> Self {
        Self {
            default_argument: Some(argument),
            ..self.clone()
        }
    }

    /// Check if the gate produces measurement results
    pub fn is_measurement(&self) -> bool {
        self.rule.is_measurement()
    }

    /// Check if the gate resets its targets
    pub fn is_reset(&self) -> bool {
        self.rule.is_reset()
    }

    /// Number of qubits in one application, given the total target count
    pub fn group_size(&self, num_targets: usize) -> usize {
        self.num_qubits.unwrap_or(num_targets)
    }

    /// Validate a target count against the gate arity
    /// Gantree: check_targets(n) -> Result // 타겟 수 검증
    pub fn check_targets(&self, num_targets: usize) -> CrumbleResult<()> {
        let expected = match (&self.num_qubits, &self.rule) {
            (Some(k), _) => *k,
            (None, FrameRule::MeasureProduct(bases))
            | (None, FrameRule::PauliProductRotation(bases)) => {
                if num_targets != bases.len() {
                    return Err(CrumbleError::TargetCountMismatch {
                        gate: self.name.clone(),
                        expected: bases.len(),
                        actual: num_targets,
                    });
                }
                return Ok(());
            }
            (None, _) => 1,
        };
        if num_targets == 0 || num_targets % expected != 0 {
            return Err(CrumbleError::TargetCountMismatch {
                gate: self.name.clone(),
                expected,
                actual: num_targets,
            });
        }
        Ok(())
    }

    /// Number of measurement results produced for `num_targets` targets
    pub fn count_measurements(&self, num_targets: usize) -> usize {
        if !self.is_measurement() {
            return 0;
        }
        match self.num_qubits {
            Some(k) if k > 0 => num_targets / k,
            _ => 1,
        }
    }

    /// Push a basis string (one Pauli per target) through the gate
    /// Gantree: scalar_transition(&[Pauli]) -> Transition // 스칼라 전파
    ///
    /// Uses the gate's table when it has an entry for the exact input and
    /// falls back to running the vectorized rule on a one-frame register.
    pub fn scalar_transition(&self, input: &[Pauli]) -> CrumbleResult<Transition> {
        self.check_targets(input.len())?;
        if input.iter().all(|p| p.is_identity()) {
            return Ok(Transition {
                bases: input.to_vec(),
                error: false,
            });
        }
        if let Some(table) = self.tableau_map {
            let key = paulis_to_string(input);
            if let Some((_, out)) = table.iter().find(|(k, _)| *k == key) {
                return Transition::parse(out);
            }
        }
        let mut frame = PauliFrame::from_paulis(&[input.to_vec()])?;
        let targets: Vec<QubitId> = (0..input.len()).collect();
        self.rule.apply(&mut frame, &targets);
        Ok(frame.transition(0))
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_parse_and_display() {
        let t = Transition::parse("ERR:XZ").unwrap();
        assert!(t.error);
        assert_eq!(t.bases, vec![Pauli::X, Pauli::Z]);
        assert_eq!(t.to_string(), "ERR:XZ");
        assert!(!Transition::parse("Y").unwrap().error);
    }

    #[test]
    fn test_check_targets() {
        let cx = Gate::new("CX", Some(2), true, None, FrameRule::Cx);
        assert!(cx.check_targets(4).is_ok());
        assert!(cx.check_targets(3).is_err());
        assert!(cx.check_targets(0).is_err());

        let mpp = Gate::new(
            "MPP:XZ",
            None,
            false,
            None,
            FrameRule::MeasureProduct(BasisString::parse("XZ").unwrap()),
        );
        assert!(mpp.check_targets(2).is_ok());
        assert!(mpp.check_targets(4).is_err());
    }

    #[test]
    fn test_with_default_argument_clones() {
        let marker = Gate::marker("MARKX", Some(1));
        let variant = marker.with_default_argument(3.0);
        assert_eq!(marker.default_argument, None);
        assert_eq!(variant.default_argument, Some(3.0));
        assert_eq!(variant.name, "MARKX");
    }

    #[test]
    fn test_scalar_fallback_without_table() {
        let cx = Gate::new("CX", Some(2), true, None, FrameRule::Cx);
        let out = cx.scalar_transition(&[Pauli::X, Pauli::I]).unwrap();
        assert_eq!(out.bases, vec![Pauli::X, Pauli::X]);
        assert!(!out.error);
    }

    #[test]
    fn test_count_measurements() {
        let m = Gate::new("M", Some(1), true, None, FrameRule::Measure(Basis::Z));
        assert_eq!(m.count_measurements(3), 3);
        let h = Gate::new("H", Some(1), true, None, FrameRule::ExchangeXZ);
        assert_eq!(h.count_measurements(3), 0);
    }
}
