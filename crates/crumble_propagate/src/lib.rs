//! # Crumble Propagate
//!
//! Pauli-frame propagation over layered circuits: forward from markers,
//! backward from measurements, and the per-revision overlay an editor draws.
//!
//! ## Gantree Architecture
//!
//! ```text
//! crumble_propagate // L2: Propagation (완료)
//!     FrameKey // 반정수 레이어 키 (완료)
//!     PropagatedPauliFrameLayer // 레이어 스냅샷 (완료)
//!     PropagatedPauliFrames // 순방향/역방향 전파 (완료)
//!     PropagationConfig // 설정 (완료)
//!     PropagationOverlay // 오버레이 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use crumble_propagate::prelude::*;
//!
//! let circuit = Circuit::from_stim("R 0\nTICK\nH 0\nTICK\nMX 0").unwrap();
//! let frames = PropagatedPauliFrames::from_measurements(&circuit, &[-1]).unwrap();
//! assert_eq!(frames.at_layer(FrameKey::after(0)).basis(0), Pauli::Z);
//! assert_eq!(frames.at_layer(FrameKey::after(1)).basis(0), Pauli::X);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Half-integer keys (Gantree: L2_Propagation → FrameKey)
pub mod frame_key;

/// Snapshots (Gantree: L2_Propagation → PropagatedPauliFrameLayer)
pub mod frame_layer;

/// Propagation (Gantree: L2_Propagation → PropagatedPauliFrames)
pub mod propagated;

/// Configuration (Gantree: L2_Propagation → PropagationConfig)
pub mod config;

/// Overlay (Gantree: L2_Propagation → PropagationOverlay)
pub mod overlay;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::PropagationConfig;
pub use frame_key::FrameKey;
pub use frame_layer::{Crossing, CrossingColor, PropagatedPauliFrameLayer};
pub use overlay::PropagationOverlay;
pub use propagated::PropagatedPauliFrames;

// Re-export core for convenience
pub use crumble_core;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::config::PropagationConfig;
    pub use crate::frame_key::FrameKey;
    pub use crate::frame_layer::{Crossing, CrossingColor, PropagatedPauliFrameLayer};
    pub use crate::overlay::PropagationOverlay;
    pub use crate::propagated::PropagatedPauliFrames;
    pub use crumble_core::prelude::*;
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
