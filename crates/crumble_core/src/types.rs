//! Core types for Crumble
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Pauli values, measurement bases, scalar frame values and qubit
//! coordinates shared by every layer of the workspace.

use crate::constants::text::ERR_PREFIX;
use crate::error::{CrumbleError, CrumbleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (dense, 0-indexed)
/// Gantree: QubitId // pub type QubitId = usize
pub type QubitId = usize;

/// Measurement record offset, counted from the end (-1 is the last result)
/// Gantree: MeasurementOffset // pub type MeasurementOffset = i64
pub type MeasurementOffset = i64;

// ============================================================================
// Pauli
// ============================================================================

/// Single-qubit Pauli value, ignoring sign
/// Gantree: Pauli // I/X/Y/Z
///
/// Bit encoding: `(x=0,z=0)=I`, `(x=1,z=0)=X`, `(x=0,z=1)=Z`, `(x=1,z=1)=Y`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Pauli {
    /// Identity
    #[default]
    I,
    /// Pauli X
    X,
    /// Pauli Y
    Y,
    /// Pauli Z
    Z,
}

impl Pauli {
    /// All four values, identity first
    pub const ALL: [Pauli; 4] = [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z];

    /// Parse from character (`_` is accepted as identity)
    pub fn from_char(c: char) -> CrumbleResult<Self> {
        match c.to_ascii_uppercase() {
            'I' | '_' => Ok(Pauli::I),
            'X' => Ok(Pauli::X),
            'Y' => Ok(Pauli::Y),
            'Z' => Ok(Pauli::Z),
            _ => Err(CrumbleError::InvalidPauli(c.to_string())),
        }
    }

    /// Convert to character
    pub fn to_char(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// Build from the (x, z) bit pair
    #[inline]
    pub fn from_bits(x: bool, z: bool) -> Self {
        match (x, z) {
            (false, false) => Pauli::I,
            (true, false) => Pauli::X,
            (true, true) => Pauli::Y,
            (false, true) => Pauli::Z,
        }
    }

    /// X bit of the encoding
    #[inline]
    pub fn x_bit(self) -> bool {
        matches!(self, Pauli::X | Pauli::Y)
    }

    /// Z bit of the encoding
    #[inline]
    pub fn z_bit(self) -> bool {
        matches!(self, Pauli::Z | Pauli::Y)
    }

    /// Check if identity
    #[inline]
    pub fn is_identity(self) -> bool {
        self == Pauli::I
    }

    /// Product up to phase (XOR of the bit pairs)
    #[inline]
    pub fn times(self, other: Pauli) -> Pauli {
        Pauli::from_bits(self.x_bit() ^ other.x_bit(), self.z_bit() ^ other.z_bit())
    }

    /// Symplectic product: true when the two operators anticommute
    #[inline]
    pub fn anticommutes_with(self, other: Pauli) -> bool {
        (self.x_bit() & other.z_bit()) ^ (self.z_bit() & other.x_bit())
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl From<Basis> for Pauli {
    fn from(basis: Basis) -> Self {
        basis.pauli()
    }
}

/// Parse a string of Pauli characters (e.g. "XI_Z")
pub fn parse_paulis(s: &str) -> CrumbleResult<Vec<Pauli>> {
    s.chars().map(Pauli::from_char).collect()
}

/// Render Paulis as a string (e.g. "XIIZ")
pub fn paulis_to_string(paulis: &[Pauli]) -> String {
    paulis.iter().map(|p| p.to_char()).collect()
}

// ============================================================================
// Basis
// ============================================================================

/// Measurement / reset basis for a single qubit
/// Gantree: Basis // X/Y/Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Basis {
    /// X (Hadamard) basis
    X,
    /// Y basis
    Y,
    /// Z (computational) basis
    Z,
}

impl Basis {
    /// Parse from character
    pub fn from_char(c: char) -> CrumbleResult<Self> {
        match c.to_ascii_uppercase() {
            'X' => Ok(Basis::X),
            'Y' => Ok(Basis::Y),
            'Z' => Ok(Basis::Z),
            _ => Err(CrumbleError::InvalidBasis(c.to_string())),
        }
    }

    /// Convert to character
    pub fn to_char(self) -> char {
        match self {
            Basis::X => 'X',
            Basis::Y => 'Y',
            Basis::Z => 'Z',
        }
    }

    /// The Pauli observable measured (or prepared) in this basis
    pub fn pauli(self) -> Pauli {
        match self {
            Basis::X => Pauli::X,
            Basis::Y => Pauli::Y,
            Basis::Z => Pauli::Z,
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Product basis string (e.g., "XZZX" for a 4-qubit Pauli product)
/// Gantree: BasisString // 기저 문자열
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasisString {
    bases: Vec<Basis>,
}

impl BasisString {
    /// Parse from string over {X, Y, Z}
    pub fn parse(s: &str) -> CrumbleResult<Self> {
        let bases: Result<Vec<Basis>, _> = s.chars().map(Basis::from_char).collect();
        Ok(Self { bases: bases? })
    }

    /// Create from bases
    pub fn new(bases: Vec<Basis>) -> Self {
        Self { bases }
    }

    /// Create uniform basis for n qubits
    pub fn uniform(basis: Basis, n: usize) -> Self {
        Self {
            bases: vec![basis; n],
        }
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Get basis at index
    pub fn get(&self, index: usize) -> Option<Basis> {
        self.bases.get(index).copied()
    }

    /// Borrow as slice
    pub fn as_slice(&self) -> &[Basis] {
        &self.bases
    }

    /// Iterate over bases
    pub fn iter(&self) -> impl Iterator<Item = &Basis> {
        self.bases.iter()
    }

    /// Bases as Paulis
    pub fn paulis(&self) -> Vec<Pauli> {
        self.bases.iter().map(|b| b.pauli()).collect()
    }
}

impl fmt::Display for BasisString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bases {
            write!(f, "{}", b.to_char())?;
        }
        Ok(())
    }
}

// ============================================================================
// FrameValue
// ============================================================================

/// Scalar propagation value of one qubit: a basis, or an error-tagged basis
/// Gantree: FrameValue // Basis | Error
///
/// Written as `X` or `ERR:X` in text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameValue {
    /// Consistent assignment
    Basis(Pauli),
    /// Assignment that anticommuted with a measurement or hit a reset
    Error(Pauli),
}

impl FrameValue {
    /// Underlying Pauli, tag stripped
    pub fn pauli(self) -> Pauli {
        match self {
            FrameValue::Basis(p) | FrameValue::Error(p) => p,
        }
    }

    /// Check if error-tagged
    pub fn is_error(self) -> bool {
        matches!(self, FrameValue::Error(_))
    }

    /// Same tag, Pauli multiplied by `other`
    pub fn times(self, other: Pauli) -> Self {
        match self {
            FrameValue::Basis(p) => FrameValue::Basis(p.times(other)),
            FrameValue::Error(p) => FrameValue::Error(p.times(other)),
        }
    }

    /// Parse `X` or `ERR:X`
    pub fn parse(s: &str) -> CrumbleResult<Self> {
        let (error, body) = match s.strip_prefix(ERR_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let mut chars = body.chars();
        let pauli = match (chars.next(), chars.next()) {
            (Some(c), None) => Pauli::from_char(c)?,
            _ => return Err(CrumbleError::InvalidPauli(s.to_string())),
        };
        Ok(if error {
            FrameValue::Error(pauli)
        } else {
            FrameValue::Basis(pauli)
        })
    }
}

impl Default for FrameValue {
    fn default() -> Self {
        FrameValue::Basis(Pauli::I)
    }
}

impl fmt::Display for FrameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameValue::Basis(p) => write!(f, "{}", p),
            FrameValue::Error(p) => write!(f, "{}{}", ERR_PREFIX, p),
        }
    }
}

// ============================================================================
// Coord
// ============================================================================

/// 2-D grid position of a qubit
/// Gantree: Coord // (x, y)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coord {
    /// Column position
    pub x: f64,
    /// Row position
    pub y: f64,
}

impl Coord {
    /// Create a coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Lookup key `"x,y"` used by coordinate maps
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pauli_bits_roundtrip() {
        for p in Pauli::ALL {
            assert_eq!(Pauli::from_bits(p.x_bit(), p.z_bit()), p);
        }
    }

    #[test]
    fn test_pauli_times() {
        assert_eq!(Pauli::X.times(Pauli::Z), Pauli::Y);
        assert_eq!(Pauli::Y.times(Pauli::Y), Pauli::I);
        assert_eq!(Pauli::I.times(Pauli::Z), Pauli::Z);
    }

    #[test]
    fn test_pauli_anticommutation() {
        assert!(Pauli::X.anticommutes_with(Pauli::Z));
        assert!(Pauli::Y.anticommutes_with(Pauli::X));
        assert!(!Pauli::Z.anticommutes_with(Pauli::Z));
        assert!(!Pauli::I.anticommutes_with(Pauli::Y));
    }

    #[test]
    fn test_parse_paulis() {
        assert_eq!(
            parse_paulis("X_yZ").unwrap(),
            vec![Pauli::X, Pauli::I, Pauli::Y, Pauli::Z]
        );
        assert!(parse_paulis("XQ").is_err());
        assert_eq!(paulis_to_string(&[Pauli::Z, Pauli::I]), "ZI");
    }

    #[test]
    fn test_basis_string() {
        let bs = BasisString::parse("XYZ").unwrap();
        assert_eq!(bs.len(), 3);
        assert_eq!(bs.get(1), Some(Basis::Y));
        assert_eq!(bs.to_string(), "XYZ");
        assert!(BasisString::parse("XI").is_err());
    }

    #[test]
    fn test_frame_value_text() {
        assert_eq!(FrameValue::parse("ERR:Y").unwrap(), FrameValue::Error(Pauli::Y));
        assert_eq!(FrameValue::parse("Z").unwrap(), FrameValue::Basis(Pauli::Z));
        assert!(FrameValue::parse("ERR:").is_err());
        assert!(FrameValue::parse("XX").is_err());
        assert_eq!(FrameValue::Error(Pauli::I).to_string(), "ERR:I");
    }

    #[test]
    fn test_coord_key() {
        assert_eq!(Coord::new(1.0, 2.0).key(), "1,2");
        assert_eq!(Coord::new(0.5, -3.0).key(), "0.5,-3");
    }
}
