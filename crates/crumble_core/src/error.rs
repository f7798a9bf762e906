//! Error types for Crumble
//!
//! Gantree: L0_Foundation → Errors
//!
//! Construction and decoding failures. Physical inconsistencies found while
//! propagating Pauli frames are data (error flags), never values of this enum.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use crate::types::QubitId;
use thiserror::Error;

/// Main error type for Crumble
/// Gantree: CrumbleError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrumbleError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Too many simultaneous frames requested for one register
    /// Gantree: TooManyFrames{{requested,max}} // 프레임 수 초과
    #[error("Requested {requested} frames but a register holds at most {max}")]
    TooManyFrames { requested: usize, max: usize },

    /// Invalid Pauli character
    #[error("Invalid Pauli '{0}': must be I, X, Y, Z or _")]
    InvalidPauli(String),

    /// Invalid basis character
    #[error("Invalid basis '{0}': must be X, Y, or Z")]
    InvalidBasis(String),

    /// Frame strings of different lengths
    #[error("Frame strings have mismatched lengths: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Target count inconsistent with the gate arity
    /// Gantree: TargetCountMismatch{{gate,expected,actual}} // 타겟 수
    #[error("Gate {gate} expects targets in groups of {expected}, got {actual}")]
    TargetCountMismatch {
        gate: String,
        expected: usize,
        actual: usize,
    },

    /// Half-integer layer key that is not a multiple of 0.5
    #[error("Invalid frame key {0}: must be a multiple of 0.5")]
    InvalidFrameKey(f64),

    /// Measurement record offset outside the circuit's record
    #[error("Measurement offset {offset} out of range: circuit has {count} measurements")]
    MeasurementOutOfRange { offset: i64, count: usize },

    // ========================================================================
    // Gate Table Errors
    // ========================================================================
    /// Gate name not present in the table and not synthesizable
    /// Gantree: UnknownGate(String) // 미등록 게이트
    #[error("Unknown gate '{0}'")]
    UnknownGate(String),

    // ========================================================================
    // Layer / Circuit Errors
    // ========================================================================
    /// Qubit already claimed by another operation in the layer
    /// Gantree: Collision{{qubit}} // 충돌
    #[error("Collision: qubit {qubit} is already used in this layer")]
    Collision { qubit: QubitId },

    /// Operation references a qubit with no coordinate entry
    #[error("Qubit {qubit} has no coordinate")]
    MissingCoordinate { qubit: QubitId },

    /// Two qubits share the same coordinate
    #[error("Duplicate qubit coordinate {0}")]
    DuplicateCoordinate(String),

    /// Layer index past the end of the circuit
    #[error("Layer {index} out of range: circuit has {len} layers")]
    LayerOutOfRange { index: usize, len: usize },

    // ========================================================================
    // Text Format Errors
    // ========================================================================
    /// Malformed line in circuit text
    /// Gantree: Parse{{line,message}} // 파싱
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Construct the reader understands but refuses
    #[error("Unsupported: {0}")]
    Unsupported(String),

    // ========================================================================
    // Configuration / I/O Errors
    // ========================================================================
    /// Configuration validation failure
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type alias for Crumble operations
/// Gantree: CrumbleResult<T> // type alias
pub type CrumbleResult<T> = Result<T, CrumbleError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for CrumbleError {
    fn from(err: serde_json::Error) -> Self {
        CrumbleError::JsonError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl CrumbleError {
    /// Check if error is recoverable
    ///
    /// A collision only means "start a new layer and retry".
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CrumbleError::Collision { .. })
    }

    /// Check if error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CrumbleError::TooManyFrames { .. }
                | CrumbleError::InvalidPauli(_)
                | CrumbleError::InvalidBasis(_)
                | CrumbleError::LengthMismatch { .. }
                | CrumbleError::TargetCountMismatch { .. }
                | CrumbleError::InvalidFrameKey(_)
                | CrumbleError::MeasurementOutOfRange { .. }
                | CrumbleError::InvalidConfig(_)
        )
    }

    /// Check if error came from reading circuit text
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            CrumbleError::Parse { .. } | CrumbleError::Unsupported(_) | CrumbleError::UnknownGate(_)
        )
    }

    /// Attach a line number to an error raised while reading text
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            CrumbleError::Parse { .. } => self,
            other => CrumbleError::Parse {
                line,
                message: other.to_string(),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CrumbleError::TooManyFrames {
            requested: 40,
            max: 32,
        };
        assert!(err.to_string().contains("40"));
        assert!(err.to_string().contains("32"));
    }

    #[test]
    fn test_collision_is_recoverable() {
        assert!(CrumbleError::Collision { qubit: 3 }.is_recoverable());
        assert!(!CrumbleError::UnknownGate("FOO".into()).is_recoverable());
    }

    #[test]
    fn test_is_validation_error() {
        assert!(CrumbleError::InvalidPauli("Q".into()).is_validation_error());
        assert!(!CrumbleError::Collision { qubit: 0 }.is_validation_error());
    }

    #[test]
    fn test_at_line_wraps_message() {
        let err = CrumbleError::UnknownGate("FOO".into()).at_line(7);
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("line 7"));
        assert!(err.to_string().contains("FOO"));
    }
}
