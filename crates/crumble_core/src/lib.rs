//! # Crumble Core
//!
//! Pauli values, the gate table, the word-parallel Pauli frame register and
//! layered circuits for the Crumble stabilizer-circuit editor.
//!
//! ## Gantree Architecture
//!
//! ```text
//! crumble_core // L0+L1: Foundation + Circuit (완료)
//!     L0_Foundation // 기반 타입/상수/에러 (완료)
//!         CoreTypes // Pauli, Basis, FrameValue, Coord (완료)
//!         Constants // 프레임/마커/텍스트 상수 (완료)
//!         Errors // 에러 타입 (완료)
//!     L1_Circuit // 회로 구조 (완료)
//!         PauliFrame // 벡터화 프레임 레지스터 (완료)
//!         Gate // 게이트 서술자 (완료)
//!         GateTable // 전역 게이트 표 (완료)
//!         Operation // 게이트 적용 (완료)
//!         Layer // 레이어 (완료)
//!         Circuit // 회로 구조체 (완료)
//!         CircuitBuilder // 빌더 패턴 (완료)
//!         StimText // 텍스트 입출력 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use crumble_core::prelude::*;
//!
//! let circuit = CircuitBuilder::new(2)
//!     .h(0)
//!     .tick()
//!     .cx(0, 1)
//!     .tick()
//!     .measure(1)
//!     .build();
//!
//! assert_eq!(circuit.num_layers(), 3);
//! println!("{}", circuit.to_stim());
//! ```
//!
//! ## Pauli Frames
//!
//! ```rust
//! use crumble_core::prelude::*;
//!
//! let mut frame = PauliFrame::from_strings(&["XI", "IZ"]).unwrap();
//! let cx = gate_table::lookup("CX").unwrap();
//! frame.do_gate(&cx, &[0, 1]);
//! assert_eq!(frame.to_strings(), vec!["XX", "ZZ"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Pauli frame register (Gantree: L1_Circuit → PauliFrame)
pub mod pauli_frame;

/// Gate descriptors (Gantree: L1_Circuit → Gate)
pub mod gate;

/// Gate registry (Gantree: L1_Circuit → GateTable)
pub mod gate_table;

/// Gate applications (Gantree: L1_Circuit → Operation)
pub mod operation;

/// Circuit layers (Gantree: L1_Circuit → Layer)
pub mod layer;

/// Circuit structure (Gantree: L1_Circuit → Circuit)
pub mod circuit;

/// Circuit builder (Gantree: L1_Circuit → CircuitBuilder)
pub mod builder;

/// Circuit text I/O (Gantree: L1_Circuit → StimText)
pub mod stim;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::{Circuit, Detector, DetectorsAndObservables, MeasurementSite};
pub use error::{CrumbleError, CrumbleResult};
pub use gate::{FrameRule, Gate, TableauMap, Transition};
pub use layer::Layer;
pub use operation::Operation;
pub use pauli_frame::PauliFrame;
pub use types::{Basis, BasisString, Coord, FrameValue, MeasurementOffset, Pauli, QubitId};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use crumble_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::{Circuit, Detector, DetectorsAndObservables};
    pub use crate::error::{CrumbleError, CrumbleResult};
    pub use crate::gate::{FrameRule, Gate, Transition};
    pub use crate::gate_table;
    pub use crate::layer::Layer;
    pub use crate::operation::Operation;
    pub use crate::pauli_frame::PauliFrame;
    pub use crate::types::{Basis, BasisString, Coord, FrameValue, Pauli, QubitId};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_text_to_frames() {
        // Read a circuit, then push X through its gates on the vector register
        let circuit = Circuit::from_stim("H 0\nTICK\nCX 0 1\nTICK\nS 1").unwrap();
        let mut frame = PauliFrame::from_strings(&["ZI"]).unwrap();
        for layer in circuit.layers() {
            for op in layer.iter_gates() {
                frame.do_gate(&op.gate, &op.id_targets);
            }
        }
        assert_eq!(frame.to_strings(), vec!["XY"]);
    }

    #[test]
    fn test_undo_restores_frames() {
        let circuit = Circuit::from_stim("H 0\nTICK\nCX 0 1\nTICK\nC_XYZ 1\nTICK\nCXSWAP 0 1").unwrap();
        let original = PauliFrame::from_strings(&["XI", "ZY", "YZ"]).unwrap();
        let mut frame = original.clone();
        for layer in circuit.layers() {
            for op in layer.iter_gates() {
                frame.do_gate(&op.gate, &op.id_targets);
            }
        }
        for layer in circuit.layers().iter().rev() {
            for op in layer.iter_gates() {
                frame.undo_gate(&op.gate, &op.id_targets);
            }
        }
        assert_eq!(frame, original);
    }

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "crumble_core");
    }
}
