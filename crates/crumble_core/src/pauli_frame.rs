//! Word-parallel Pauli frame register
//!
//! Gantree: L1_Circuit → PauliFrame
//!
//! Tracks up to 32 independent Pauli frames over `num_qubits` qubits. Bit `f`
//! of `xs[q]` / `zs[q]` is the X / Z component of frame `f` on qubit `q`, so
//! every gate update touches all frames at once with plain word operations.
//! Bit `f` of `flags[q]` marks frame `f` as inconsistent at qubit `q`.

use crate::constants::frame::MAX_FRAMES;
use crate::error::{CrumbleError, CrumbleResult};
use crate::gate::{Gate, Transition};
use crate::types::{Basis, FrameValue, Pauli, QubitId};

/// Vectorized Pauli frame register
/// Gantree: PauliFrame // 프레임 레지스터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauliFrame {
    num_frames: usize,
    num_qubits: usize,
    /// X bit-plane, one word per qubit
    pub xs: Vec<u32>,
    /// Z bit-plane, one word per qubit
    pub zs: Vec<u32>,
    /// Error flags, one word per qubit
    pub flags: Vec<u32>,
}

impl PauliFrame {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create an all-identity register
    /// Gantree: new(num_frames, num_qubits) -> Result<Self> // 생성자
    pub fn new(num_frames: usize, num_qubits: usize) -> CrumbleResult<Self> {
        if num_frames > MAX_FRAMES {
            return Err(CrumbleError::TooManyFrames {
                requested: num_frames,
                max: MAX_FRAMES,
            });
        }
        Ok(Self {
            num_frames,
            num_qubits,
            xs: vec![0; num_qubits],
            zs: vec![0; num_qubits],
            flags: vec![0; num_qubits],
        })
    }

    /// Create from one Pauli string per frame
    pub fn from_paulis(frames: &[Vec<Pauli>]) -> CrumbleResult<Self> {
        let num_qubits = frames.first().map_or(0, |f| f.len());
        let mut result = Self::new(frames.len(), num_qubits)?;
        for (f, paulis) in frames.iter().enumerate() {
            if paulis.len() != num_qubits {
                return Err(CrumbleError::LengthMismatch {
                    expected: num_qubits,
                    actual: paulis.len(),
                });
            }
            for (q, &p) in paulis.iter().enumerate() {
                result.set(f, q, p);
            }
        }
        Ok(result)
    }

    /// Create from one text string per frame (e.g. `["X_Z", "YYI"]`)
    /// Gantree: from_strings(&[&str]) -> Result<Self> // 문자열 파싱
    pub fn from_strings(strings: &[&str]) -> CrumbleResult<Self> {
        let frames = strings
            .iter()
            .map(|s| crate::types::parse_paulis(s))
            .collect::<CrumbleResult<Vec<_>>>()?;
        Self::from_paulis(&frames)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of frames
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Word with one bit set per live frame
    pub fn frame_mask(&self) -> u32 {
        if self.num_frames >= 32 {
            u32::MAX
        } else {
            (1u32 << self.num_frames) - 1
        }
    }

    /// Pauli of frame `f` at qubit `q`
    pub fn get(&self, f: usize, q: QubitId) -> Pauli {
        let bit = 1u32 << f;
        Pauli::from_bits(self.xs[q] & bit != 0, self.zs[q] & bit != 0)
    }

    /// Pauli of frame `f` at qubit `q`, tagged when flagged
    pub fn value(&self, f: usize, q: QubitId) -> FrameValue {
        let p = self.get(f, q);
        if self.is_flagged(f, q) {
            FrameValue::Error(p)
        } else {
            FrameValue::Basis(p)
        }
    }

    /// Overwrite the Pauli of frame `f` at qubit `q`
    pub fn set(&mut self, f: usize, q: QubitId, pauli: Pauli) {
        let bit = 1u32 << f;
        self.xs[q] = (self.xs[q] & !bit) | if pauli.x_bit() { bit } else { 0 };
        self.zs[q] = (self.zs[q] & !bit) | if pauli.z_bit() { bit } else { 0 };
    }

    /// Check the error flag of frame `f` at qubit `q`
    pub fn is_flagged(&self, f: usize, q: QubitId) -> bool {
        self.flags[q] & (1u32 << f) != 0
    }

    /// Check if any qubit of frame `f` is flagged
    pub fn frame_has_flags(&self, f: usize) -> bool {
        let bit = 1u32 << f;
        self.flags.iter().any(|&w| w & bit != 0)
    }

    /// Clear every error flag
    pub fn clear_flags(&mut self) {
        self.flags.fill(0);
    }

    /// Render each frame as a Pauli string (flags not shown)
    /// Gantree: to_strings() -> Vec<String> // 문자열 변환
    pub fn to_strings(&self) -> Vec<String> {
        (0..self.num_frames)
            .map(|f| (0..self.num_qubits).map(|q| self.get(f, q).to_char()).collect())
            .collect()
    }

    /// Frame `f` as a scalar transition result
    pub fn transition(&self, f: usize) -> Transition {
        Transition {
            bases: (0..self.num_qubits).map(|q| self.get(f, q)).collect(),
            error: self.frame_has_flags(f),
        }
    }

    // ========================================================================
    // Gate Dispatch
    // ========================================================================

    /// Apply a gate's forward update
    pub fn do_gate(&mut self, gate: &Gate, targets: &[QubitId]) {
        gate.rule.apply(self, targets);
    }

    /// Apply a gate's inverse update
    pub fn undo_gate(&mut self, gate: &Gate, targets: &[QubitId]) {
        gate.rule.undo(self, targets);
    }

    // ========================================================================
    // Single-Qubit Updates
    // ========================================================================

    /// Hadamard-like: X ↔ Z
    pub fn do_exchange_xz(&mut self, targets: &[QubitId]) {
        for &q in targets {
            std::mem::swap(&mut self.xs[q], &mut self.zs[q]);
        }
    }

    /// S-like: X ↔ Y
    pub fn do_exchange_xy(&mut self, targets: &[QubitId]) {
        for &q in targets {
            self.zs[q] ^= self.xs[q];
        }
    }

    /// √X-like: Y ↔ Z
    pub fn do_exchange_yz(&mut self, targets: &[QubitId]) {
        for &q in targets {
            self.xs[q] ^= self.zs[q];
        }
    }

    /// Third turn: X → Y → Z → X
    pub fn do_cycle_xyz(&mut self, targets: &[QubitId]) {
        for &q in targets {
            let (x, z) = (self.xs[q], self.zs[q]);
            self.xs[q] = x ^ z;
            self.zs[q] = x;
        }
    }

    /// Third turn: X → Z → Y → X
    pub fn do_cycle_zyx(&mut self, targets: &[QubitId]) {
        for &q in targets {
            let (x, z) = (self.xs[q], self.zs[q]);
            self.xs[q] = z;
            self.zs[q] = x ^ z;
        }
    }

    // ========================================================================
    // Two-Qubit Updates
    // ========================================================================

    /// Apply `rule(x1, z1, x2, z2) -> (x1', z1', x2', z2')` to each target pair
    fn update_pairs(&mut self, targets: &[QubitId], rule: impl Fn(u32, u32, u32, u32) -> [u32; 4]) {
        for pair in targets.chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            let [x1, z1, x2, z2] = rule(self.xs[a], self.zs[a], self.xs[b], self.zs[b]);
            self.xs[a] = x1;
            self.zs[a] = z1;
            self.xs[b] = x2;
            self.zs[b] = z2;
        }
    }

    /// CX: X_c → X_c X_t, Z_t → Z_c Z_t
    pub fn do_cx(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x1, z1 ^ z2, x2 ^ x1, z2]);
    }

    /// CY: X_c → X_c Y_t, X_t → Z_c X_t, Z_t → Z_c Z_t
    pub fn do_cy(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x1, z1 ^ x2 ^ z2, x2 ^ x1, z2 ^ x1]);
    }

    /// CZ: X_a → X_a Z_b, X_b → Z_a X_b
    pub fn do_cz(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x1, z1 ^ x2, x2, z2 ^ x1]);
    }

    /// XCX: Z_a → Z_a X_b, Z_b → X_a Z_b
    pub fn do_xcx(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x1 ^ z2, z1, x2 ^ z1, z2]);
    }

    /// XCY: Z_a → Z_a Y_b, X_b → X_a X_b, Z_b → X_a Z_b
    pub fn do_xcy(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x1 ^ x2 ^ z2, z1, x2 ^ z1, z2 ^ z1]);
    }

    /// XCZ: CX with the roles reversed
    pub fn do_xcz(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x1 ^ x2, z1, x2, z2 ^ z1]);
    }

    /// YCX: XCY with the roles reversed
    pub fn do_ycx(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x1 ^ z2, z1 ^ z2, x2 ^ x1 ^ z1, z2]);
    }

    /// YCY: anything anticommuting with Y on one side picks up Y on the other
    pub fn do_ycy(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| {
            let y1 = x1 ^ z1;
            let y2 = x2 ^ z2;
            [x1 ^ y2, z1 ^ y2, x2 ^ y1, z2 ^ y1]
        });
    }

    /// YCZ: CY with the roles reversed
    pub fn do_ycz(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x1 ^ x2, z1 ^ x2, x2, z2 ^ x1 ^ z1]);
    }

    /// SWAP
    pub fn do_swap(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x2, z2, x1, z1]);
    }

    /// ISWAP / ISWAP_DAG: swap, then Z-dress both sides by the X difference
    pub fn do_iswap(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| {
            let dx = x1 ^ x2;
            [x2, z2 ^ dx, x1, z1 ^ dx]
        });
    }

    /// CXSWAP: CX then SWAP
    pub fn do_cx_swap(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x2 ^ x1, z2, x1, z1 ^ z2]);
    }

    /// SWAPCX: SWAP then CX
    pub fn do_swap_cx(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x2, z2 ^ z1, x1 ^ x2, z1]);
    }

    /// CZSWAP: CZ then SWAP
    pub fn do_cz_swap(&mut self, targets: &[QubitId]) {
        self.update_pairs(targets, |x1, z1, x2, z2| [x2, z2 ^ x1, x1, z1 ^ x2]);
    }

    /// √XX, √YY, √ZZ and their daggers
    pub fn do_sqrt_pair(&mut self, basis: Basis, targets: &[QubitId]) {
        self.do_spp(&[basis, basis], targets);
    }

    // ========================================================================
    // Products, Measurements and Resets
    // ========================================================================

    /// Frames (as bits) whose Pauli on `qubits` anticommutes with `bases`
    fn anticommutation_mask(&self, bases: &[Basis], qubits: &[QubitId]) -> u32 {
        let mut mask = 0u32;
        for (&basis, &q) in bases.iter().zip(qubits) {
            let p = basis.pauli();
            if p.x_bit() {
                mask ^= self.zs[q];
            }
            if p.z_bit() {
                mask ^= self.xs[q];
            }
        }
        mask
    }

    /// Pauli-product rotation: frames anticommuting with the product absorb it
    pub fn do_spp(&mut self, bases: &[Basis], targets: &[QubitId]) {
        for group in targets.chunks_exact(bases.len()) {
            let mask = self.anticommutation_mask(bases, group);
            for (&basis, &q) in bases.iter().zip(group) {
                let p = basis.pauli();
                if p.x_bit() {
                    self.xs[q] ^= mask;
                }
                if p.z_bit() {
                    self.zs[q] ^= mask;
                }
            }
        }
    }

    /// Pauli-product measurement: flag every support qubit of anticommuting frames
    pub fn do_mpp(&mut self, bases: &[Basis], targets: &[QubitId]) {
        for group in targets.chunks_exact(bases.len()) {
            let mask = self.anticommutation_mask(bases, group);
            for &q in group {
                self.flags[q] |= mask;
            }
        }
    }

    /// Single-qubit measurement in `basis`
    pub fn do_measure(&mut self, basis: Basis, targets: &[QubitId]) {
        for &q in targets {
            let mask = self.anticommutation_mask(&[basis], &[q]);
            self.flags[q] |= mask;
        }
    }

    /// Reset: anything non-identity is destroyed and reported
    pub fn do_discard(&mut self, targets: &[QubitId]) {
        for &q in targets {
            self.flags[q] |= self.xs[q] | self.zs[q];
            self.xs[q] = 0;
            self.zs[q] = 0;
        }
    }

    /// Measure-and-reset: measurement followed by discard
    pub fn do_demolition_measure(&mut self, basis: Basis, targets: &[QubitId]) {
        self.do_measure(basis, targets);
        self.do_discard(targets);
    }

    /// Backward step through a reset: components not stabilized by the
    /// prepared state are reported, then the qubit is cleared
    pub fn undo_reset(&mut self, basis: Basis, targets: &[QubitId]) {
        for &q in targets {
            let mask = self.anticommutation_mask(&[basis], &[q]);
            self.flags[q] |= mask;
            self.xs[q] = 0;
            self.zs[q] = 0;
        }
    }

    /// Multiply `paulis` (one per target) into the frames selected by `frames`
    pub fn inject(&mut self, paulis: &[Pauli], targets: &[QubitId], frames: u32) {
        for (&p, &q) in paulis.iter().zip(targets) {
            if p.x_bit() {
                self.xs[q] ^= frames;
            }
            if p.z_bit() {
                self.zs[q] ^= frames;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
